//! The hymns module maps hymn titles to their numbers in the Evangelisches
//! Gesangbuch (EG).

use std::collections::BTreeMap;
use std::fs;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::constants::HYMN_INDEX_LINE;

static HYMN_INDEX_LINE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(HYMN_INDEX_LINE).expect("Failed to compile HYMN_INDEX_LINE regex")
});
static PUNCTUATION_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s]").expect("Failed to compile punctuation regex"));

/// Titles as they appear in the calendar that the index spells differently.
pub const SPECIAL_CASES: [(&str, &str); 28] = [
    ("Nun komm, der Heiden Heiland", "EG 4"),
    ("Wie soll ich dich empfangen", "EG 11"),
    ("O Heiland, reiß die Himmel auf", "EG 7"),
    ("Mit Ernst, o Menschenkinder", "EG 10"),
    ("Die Nacht ist vorgedrungen", "EG 16"),
    ("Nun jauchzet, all ihr Frommen", "EG 9"),
    ("O komm, o komm, du Morgenstern", "EG 19"),
    ("Vom Himmel hoch", "EG 24"),
    ("Lobt Gott, ihr Christen alle gleich", "EG 27"),
    ("Gelobet seist du, Jesu Christ", "EG 23"),
    ("Es ist ein Ros entsprungen", "EG 30"),
    ("Ich steh an deiner Krippen hier", "EG 37"),
    ("Herbei, o ihr Gläub'gen", "EG 45"),
    ("Zu Bethlehem geboren", "EG 32"),
    ("Kommt und lasst uns Christus ehren", "EG 39"),
    ("Nun lasst uns gehn und treten", "EG 58"),
    ("Von guten Mächten", "EG 65"),
    ("Wachet auf, ruft uns die Stimme", "EG 147"),
    ("Herr, mach uns stark im Mut, der dich bekennt", "EG 154"),
    ("Die Heiligen, uns weit voran", "EG 154"),
    ("Bewahre uns, Gott", "EG 171"),
    ("Macht hoch die Tür", "EG 1"),
    ("Herr, stärke mich, dein Leiden zu bedenken", "EG 91"),
    ("Dein König kommt in niedern Hüllen", "EG 14"),
    ("Es kommt die Zeit, in der die Träume sich erfüllen", "EG 18"),
    ("Such, wer da will, ein ander Ziel", "EG 346"),
    ("Mit dir, o Herr, die Grenzen überschreiten", "EG 225"),
    ("Der Himmel, der ist, ist nicht der Himmel, der kommt", "EG 153"),
];

/// Parses a hymn book index with lines like `4 Nun komm, der Heiden Heiland 5`
/// (number, title, verse count) into a title → number map.
///
/// Every title is also stored without punctuation so that loosely spelled
/// titles still match.
pub fn parse_hymn_index(text: &str) -> BTreeMap<String, String> {
    let mut index = BTreeMap::new();

    for line in text.lines().map(str::trim) {
        if !line.starts_with(|first: char| first.is_ascii_digit()) {
            continue;
        }

        let Some(captures) = HYMN_INDEX_LINE_REGEX.captures(line) else {
            continue;
        };
        let (Some(number), Some(title)) = (captures.get(1), captures.get(2)) else {
            continue;
        };

        let title = title.as_str();
        index.insert(title.to_owned(), number.as_str().to_owned());

        let plain_title = PUNCTUATION_REGEX.replace_all(title, "").trim().to_owned();
        if plain_title != title {
            index.insert(plain_title, number.as_str().to_owned());
        }
    }

    index
}

/// Reads and parses a hymn book index file.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn read_hymn_index(path: &str) -> Result<BTreeMap<String, String>> {
    let text = fs::read_to_string(path).context(format!("Failed to read hymn index: {path}"))?;

    Ok(parse_hymn_index(&text))
}
