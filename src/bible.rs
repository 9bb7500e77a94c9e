//! The bible module holds the shared book and translation tables and the
//! parsing of German verse references like `1. Korinther 13,4-8`.

use std::collections::HashMap;
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use url::Url;

use crate::constants::{BIBLESERVER_BASE_URL, EDITORIAL_MARKS, VERSE_REFERENCE};

static VERSE_REFERENCE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(VERSE_REFERENCE).expect("Failed to compile VERSE_REFERENCE regex")
});
static PARENTHESIZED_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(([^)]+)\)").expect("Failed to compile parentheses regex"));
static VERSE_RANGE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+)[a-z]?(?:-(\d+)[a-z]?)?").expect("Failed to compile verse range regex")
});
static VERSE_SUFFIX_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)[a-z]").expect("Failed to compile verse suffix regex"));
static SPACED_HYPHEN_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*-\s*").expect("Failed to compile hyphen regex"));
static EDITORIAL_MARKS_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(EDITORIAL_MARKS).expect("Failed to compile EDITORIAL_MARKS regex")
});

/// Language of a Bible translation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Language {
    German,
    English,
    French,
    Spanish,
}

/// A Bible translation known to ERF Bibleserver or BIGS.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Translation {
    pub code: &'static str,
    pub name: &'static str,
    pub language: Language,
    /// Whether ERF Bibleserver hosts the translation and links can be built.
    #[serde(skip)]
    pub on_bibleserver: bool,
}

const fn translation(
    code: &'static str,
    name: &'static str,
    language: Language,
    on_bibleserver: bool,
) -> Translation {
    Translation {
        code,
        name,
        language,
        on_bibleserver,
    }
}

pub const BIGS_CODE: &str = "BIGS";

/// Every supported translation, German ones first.
pub static TRANSLATIONS: [Translation; 31] = [
    translation("LUT", "Lutherbibel 2017", Language::German, true),
    translation("ELB", "Elberfelder Bibel", Language::German, true),
    translation("HFA", "Hoffnung für alle", Language::German, true),
    translation("SLT", "Schlachter 2000", Language::German, true),
    translation("ZB", "Zürcher Bibel", Language::German, true),
    translation("GNB", "Gute Nachricht Bibel 2018", Language::German, true),
    translation("NGÜ", "Neue Genfer Übersetzung", Language::German, true),
    translation("EU", "Einheitsübersetzung 2016", Language::German, true),
    translation("NLB", "Neues Leben. Die Bibel", Language::German, true),
    translation("VXB", "Volxbibel", Language::German, false),
    translation("NeÜ", "Neue evangelistische Übersetzung", Language::German, true),
    translation(BIGS_CODE, "Bibel in gerechter Sprache", Language::German, false),
    translation("NIV", "New International Version", Language::English, true),
    translation("ESV", "English Standard Version", Language::English, true),
    translation("NLT", "New Living Translation", Language::English, true),
    translation("MSG", "The Message", Language::English, false),
    translation("CEV", "Contemporary English Version", Language::English, false),
    translation("GNT", "Good News Translation", Language::English, false),
    translation("NKJV", "New King James Version", Language::English, true),
    translation("KJV", "King James Version", Language::English, true),
    translation("NASB", "New American Standard Bible", Language::English, true),
    translation("CSB", "Christian Standard Bible", Language::English, true),
    translation("LSG", "Louis Segond 1910", Language::French, false),
    translation("BDS", "Bible du Semeur", Language::French, false),
    translation("S21", "Segond 21", Language::French, false),
    translation("RVR60", "Reina-Valera 1960", Language::Spanish, false),
    translation("NVI", "Nueva Versión Internacional", Language::Spanish, false),
    translation("DHH", "Dios Habla Hoy", Language::Spanish, false),
    translation("RVR95", "Reina-Valera 1995", Language::Spanish, false),
    translation("LBLA", "La Biblia de las Américas", Language::Spanish, false),
    translation("NVT", "Nueva Traducción Viviente", Language::Spanish, false),
];

impl Translation {
    /// Looks up a translation by its code, e.g. `LUT`.
    pub fn find(code: &str) -> Option<&'static Translation> {
        TRANSLATIONS.iter().find(|translation| translation.code == code)
    }

    pub fn is_bigs(&self) -> bool {
        self.code == BIGS_CODE
    }
}

/// German book names with their BIGS abbreviations.
static BIGS_BOOKS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("Genesis", "Gen"),
        ("1. Mose", "Gen"),
        ("Exodus", "Ex"),
        ("2. Mose", "Ex"),
        ("Levitikus", "Lev"),
        ("3. Mose", "Lev"),
        ("Numeri", "Num"),
        ("4. Mose", "Num"),
        ("Deuteronomium", "Dtn"),
        ("5. Mose", "Dtn"),
        ("Josua", "Jos"),
        ("Richter", "Ri"),
        ("Rut", "Rut"),
        ("1. Samuel", "1-Sam"),
        ("2. Samuel", "2-Sam"),
        ("1. Könige", "1-Koen"),
        ("2. Könige", "2-Koen"),
        ("1. Chronik", "1-Chr"),
        ("2. Chronik", "2-Chr"),
        ("Esra", "Esr"),
        ("Nehemia", "Neh"),
        ("Ester", "Est"),
        ("Hiob", "Hiob"),
        ("Job", "Hiob"),
        ("Psalm", "Ps"),
        ("Psalmen", "Ps"),
        ("Sprüche", "Spr"),
        ("Sprichwörter", "Spr"),
        ("Prediger", "Koh"),
        ("Kohelet", "Koh"),
        ("Hoheslied", "Hld"),
        ("Hohelied", "Hld"),
        ("Jesaja", "Jes"),
        ("Jeremia", "Jer"),
        ("Klagelieder", "Klgl"),
        ("Hesekiel", "Ez-Hes"),
        ("Ezechiel", "Ez-Hes"),
        ("Daniel", "Dan"),
        ("Hosea", "Hos"),
        ("Joel", "Joel"),
        ("Amos", "Am"),
        ("Obadja", "Ob"),
        ("Jona", "Jona"),
        ("Micha", "Mi"),
        ("Nahum", "Nah"),
        ("Habakuk", "Hab"),
        ("Zefanja", "Zef"),
        ("Haggai", "Hag"),
        ("Sacharja", "Sach"),
        ("Maleachi", "Mal"),
        ("Matthäus", "Mt"),
        ("Markus", "Mk"),
        ("Lukas", "Lk"),
        ("Johannes", "Joh"),
        ("Apostelgeschichte", "Apg"),
        ("Römer", "Roem"),
        ("1. Korinther", "1-Kor"),
        ("2. Korinther", "2-Kor"),
        ("Galater", "Gal"),
        ("Epheser", "Eph"),
        ("Philipper", "Phil"),
        ("Kolosser", "Kol"),
        ("1. Thessalonicher", "1-Thess"),
        ("2. Thessalonicher", "2-Thess"),
        ("1. Timotheus", "1-Tim"),
        ("2. Timotheus", "2-Tim"),
        ("Titus", "Tit"),
        ("Philemon", "Phlm"),
        ("Hebräer", "Hebr"),
        ("Jakobus", "Jak"),
        ("1. Petrus", "1-Petr"),
        ("2. Petrus", "2-Petr"),
        ("1. Johannes", "1-Joh"),
        ("2. Johannes", "2-Joh"),
        ("3. Johannes", "3-Joh"),
        ("Judas", "Jud"),
        ("Offenbarung", "Offb-Apk"),
    ])
});

const NEW_TESTAMENT_BOOKS: [&str; 27] = [
    "Matthäus",
    "Markus",
    "Lukas",
    "Johannes",
    "Apostelgeschichte",
    "Römer",
    "1. Korinther",
    "2. Korinther",
    "Galater",
    "Epheser",
    "Philipper",
    "Kolosser",
    "1. Thessalonicher",
    "2. Thessalonicher",
    "1. Timotheus",
    "2. Timotheus",
    "Titus",
    "Philemon",
    "Hebräer",
    "Jakobus",
    "1. Petrus",
    "2. Petrus",
    "1. Johannes",
    "2. Johannes",
    "3. Johannes",
    "Judas",
    "Offenbarung",
];

/// Old or New Testament, serialized the German way.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Testament {
    #[serde(rename = "AT")]
    Old,
    #[serde(rename = "NT")]
    New,
}

impl Testament {
    /// Classifies a German book name; anything not in the New Testament list
    /// counts as Old Testament.
    pub fn of_book(book: &str) -> Self {
        if NEW_TESTAMENT_BOOKS.contains(&book) {
            Testament::New
        } else {
            Testament::Old
        }
    }
}

impl FromStr for Testament {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.to_uppercase().as_str() {
            "AT" | "OT" => Ok(Testament::Old),
            "NT" => Ok(Testament::New),
            _ => Err(format!("Invalid testament: {}", input)),
        }
    }
}

impl fmt::Display for Testament {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Testament::Old => "AT",
            Testament::New => "NT",
        })
    }
}

/// A parsed reference such as `Römer 5,20-21` or `Jesaja 40,1(4b-6)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct VerseReference {
    pub book: String,
    pub chapter: u32,
    pub start_verse: u32,
    pub end_verse: u32,
    /// The reference exactly as given.
    pub original: String,
    /// Verses listed in parentheses, which may be left out when reading.
    pub optional_verses: Vec<u32>,
}

impl VerseReference {
    /// Parses `Book Chapter,Verse` or `Book Chapter,Start-End`.
    ///
    /// Verses in parentheses are recorded as optional, letter suffixes
    /// (`15a`) are dropped and en dashes count as hyphens.
    pub fn parse(reference: &str) -> Option<Self> {
        let normalized = reference.replace(['–', '—'], "-");

        let optional_verses = PARENTHESIZED_REGEX
            .captures_iter(&normalized)
            .filter_map(|captures| captures.get(1))
            .flat_map(|group| VERSE_RANGE_REGEX.captures_iter(group.as_str()))
            .flat_map(|range| {
                let start = range
                    .get(1)
                    .and_then(|start| start.as_str().parse::<u32>().ok());
                let end = range
                    .get(2)
                    .and_then(|end| end.as_str().parse::<u32>().ok());
                start.map_or(RangeInclusive::new(1, 0), |start| {
                    start..=end.unwrap_or(start).max(start)
                })
            })
            .collect();

        let stripped = PARENTHESIZED_REGEX.replace_all(&normalized, "");
        let stripped = VERSE_SUFFIX_REGEX.replace_all(&stripped, "$1");
        let stripped = SPACED_HYPHEN_REGEX.replace_all(&stripped, "-");
        let stripped = stripped.split_whitespace().collect::<Vec<_>>().join(" ");

        let captures = VERSE_REFERENCE_REGEX.captures(&stripped)?;
        let start_verse = captures.get(3)?.as_str().parse().ok()?;

        Some(VerseReference {
            book: captures.get(1)?.as_str().trim().to_owned(),
            chapter: captures.get(2)?.as_str().parse().ok()?,
            start_verse,
            end_verse: captures
                .get(4)
                .map_or(Some(start_verse), |end| end.as_str().parse().ok())?,
            original: reference.to_owned(),
            optional_verses,
        })
    }

    /// Every verse to read, including optional verses after the end verse.
    pub fn verses(&self) -> RangeInclusive<u32> {
        self.start_verse..=self.last_verse()
    }

    /// The end verse, or the last optional verse if that comes later.
    pub fn last_verse(&self) -> u32 {
        self.optional_verses
            .iter()
            .copied()
            .fold(self.end_verse, u32::max)
    }

    pub fn is_optional(&self, verse: u32) -> bool {
        self.optional_verses.contains(&verse)
    }

    pub fn testament(&self) -> Testament {
        Testament::of_book(&self.book)
    }

    /// `Book Chapter,Start[-End]` without optional verses or suffixes.
    pub fn canonical(&self) -> String {
        let mut canonical = format!("{} {},{}", self.book, self.chapter, self.start_verse);
        if self.end_verse > self.start_verse {
            canonical.push_str(&format!("-{}", self.end_verse));
        }
        canonical
    }
}

/// Replaces German umlauts and ß the way Bibleserver URLs spell them.
pub fn transliterate(text: &str) -> String {
    let mut transliterated = String::with_capacity(text.len());
    for character in text.chars() {
        match character {
            'ä' => transliterated.push_str("ae"),
            'ö' => transliterated.push_str("oe"),
            'ü' => transliterated.push_str("ue"),
            'Ä' => transliterated.push_str("Ae"),
            'Ö' => transliterated.push_str("Oe"),
            'Ü' => transliterated.push_str("Ue"),
            'ß' => transliterated.push_str("ss"),
            other => transliterated.push(other),
        }
    }
    transliterated
}

/// URL of a passage on ERF Bibleserver below `base`, e.g.
/// `https://www.bibleserver.com/LUT/Roemer5,20-21`.
///
/// # Errors
///
/// Returns an error if the resulting URL is invalid.
pub fn bibleserver_url(
    base: &str,
    reference: &VerseReference,
    translation: &str,
) -> Result<Url> {
    let passage = transliterate(&reference.canonical().replace(' ', ""));
    let base = base.trim_end_matches('/');

    Url::parse(&format!("{base}/{translation}/{passage}"))
        .context(format!("Invalid Bibleserver URL for {}", reference.original))
}

/// Link to a reference on ERF Bibleserver for display next to a text.
///
/// Returns `None` for translations Bibleserver does not host and for
/// references that are not in `Book Chapter,Verse[-Verse]` form.
pub fn bibleserver_link(reference: &str, translation: &str) -> Option<Url> {
    if !Translation::find(translation)?.on_bibleserver {
        return None;
    }

    let captures = VERSE_REFERENCE_REGEX.captures(reference.trim())?;
    let book = captures.get(1)?.as_str().trim();
    let mut passage = format!(
        "{}{},{}",
        bibleserver_book_slug(book),
        captures.get(2)?.as_str(),
        captures.get(3)?.as_str()
    );
    if let Some(end) = captures.get(4) {
        passage.push_str(&format!("-{}", end.as_str()));
    }

    Url::parse(&format!("{BIBLESERVER_BASE_URL}/{translation}/{passage}")).ok()
}

/// Bibleserver spells numbered books without the space (`1.Mose`) and
/// transliterates umlauts.
fn bibleserver_book_slug(book: &str) -> String {
    transliterate(&book.replace(". ", "."))
}

/// URL of a passage in the BIGS online edition below `base`.
///
/// # Errors
///
/// Returns an error if the resulting URL is invalid.
pub fn bigs_url(base: &str, reference: &VerseReference) -> Result<Url> {
    let book = BIGS_BOOKS
        .get(reference.book.as_str())
        .copied()
        .unwrap_or(reference.book.as_str());

    let last_verse = reference.last_verse();
    let verses = if last_verse > reference.start_verse {
        format!("{}-{}", reference.start_verse, last_verse)
    } else {
        reference.start_verse.to_string()
    };

    Url::parse(&format!(
        "{base}?{book}/{}/{verses}/",
        reference.chapter
    ))
    .context(format!("Invalid BIGS URL for {}", reference.original))
}

/// Removes editorial brackets (`[...]`, `{...}`, `⟨...⟩` and their doubled
/// forms), BIGS glossary markers and redundant whitespace from a verse.
pub fn clean_verse_text(text: &str) -> String {
    EDITORIAL_MARKS_REGEX
        .replace_all(text, "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
