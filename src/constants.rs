pub const USER_AGENT_ENV_NAME: &str = "KIRCHENJAHR_USER_AGENT";

pub(crate) const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
pub(crate) const ACCEPT_HEADER: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
pub(crate) const ACCEPT_LANGUAGE_HEADER: &str = "de,en-US;q=0.7,en;q=0.3";

pub const BIBLESERVER_BASE_URL: &str = "https://www.bibleserver.com";
pub const BIGS_BASE_URL: &str =
    "https://www.bibel-in-gerechter-sprache.de/die-bibel/bigs-online/";
pub const LOSUNGEN_URL: &str = "https://www.losungen.de/";
pub const KIRCHENJAHR_BASE_URL: &str = "https://kirchenjahr-evangelisch.de/";

pub(crate) const BIBLESERVER_SOURCE: &str = "ERF Bibleserver";
pub(crate) const BIGS_SOURCE: &str = "Bibel in gerechter Sprache";
pub(crate) const LOSUNGEN_SOURCE: &str = "Herrnhuter Losungen";

/// Sentences that open the lectionary-cycle appendix of a description.
pub(crate) const PERIKOPEN_INTRODUCTIONS: [&str; 4] = [
    "Erklärung zu den Perikopen",
    "Die biblischen Predigttexte sind aufgeteilt",
    "Jede Reihe gilt",
    "Die einzelnen Reihen haben",
];

pub(crate) const ICS_FOLD: &str = r"\r?\n[ \t]";
pub(crate) const PERIKOPEN_LINE: &str = r"^([IVX]+):\s*(.*)$";
pub(crate) const TRAILING_REFERENCE: &str = r"\s*\(([^)]+)\)\s*$";
pub(crate) const LEHRTEXT_SPEAKER: &str = r"^/[^/]+/\s*";
pub(crate) const HYMN_INDEX_LINE: &str = r"^(\d+)\s+(.+?)\s+(\d+)$";
pub(crate) const VERSE_REFERENCE: &str = r"^(.+?)\s+(\d+),(\d+)(?:-(\d+))?$";

pub(crate) const EDITORIAL_MARKS: &str =
    r"\[\[\[.*?\]\]\]|\[\[.*?\]\]|\[.*?\]|\{\{.*?\}\}|\{.*?\}|⟨.*?⟩|°";
