//! The description module turns the free-text `DESCRIPTION` of a liturgical
//! calendar event into structured fields.
//!
//! A description looks like this once unfolded and unescaped:
//!
//! ```text
//! liturgische Farbe: Grün
//! Festzeit: Trinitatiszeit
//! Wochenspruch: So seid ihr nun nicht mehr Gäste (Eph 2,19)
//! Wochenlied: Nun laßt uns Gott dem Herren Dank sagen / Brich dem Hungrigen dein Brot
//!
//! Erklärung zu den Perikopen:
//! I: Joh 6,30–35
//! II: Hebr 13,1–3
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use log::trace;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::constants::{PERIKOPEN_INTRODUCTIONS, PERIKOPEN_LINE, TRAILING_REFERENCE};
use crate::ics::{unescape_text, unfold_lines};

static PERIKOPEN_LINE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(PERIKOPEN_LINE).expect("Failed to compile PERIKOPEN_LINE regex"));
static TRAILING_REFERENCE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(TRAILING_REFERENCE).expect("Failed to compile TRAILING_REFERENCE regex")
});

const HYMN_DELIMITER: &str = " / ";

/// One of the six lectionary cycles ("Perikopenreihen"), serialized as its
/// Roman numeral.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PerikopenRow {
    #[serde(rename = "I")]
    First,
    #[serde(rename = "II")]
    Second,
    #[serde(rename = "III")]
    Third,
    #[serde(rename = "IV")]
    Fourth,
    #[serde(rename = "V")]
    Fifth,
    #[serde(rename = "VI")]
    Sixth,
}

impl PerikopenRow {
    pub const ALL: [PerikopenRow; 6] = [
        PerikopenRow::First,
        PerikopenRow::Second,
        PerikopenRow::Third,
        PerikopenRow::Fourth,
        PerikopenRow::Fifth,
        PerikopenRow::Sixth,
    ];

    pub fn as_numeral(self) -> &'static str {
        match self {
            PerikopenRow::First => "I",
            PerikopenRow::Second => "II",
            PerikopenRow::Third => "III",
            PerikopenRow::Fourth => "IV",
            PerikopenRow::Fifth => "V",
            PerikopenRow::Sixth => "VI",
        }
    }
}

impl FromStr for PerikopenRow {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        PerikopenRow::ALL
            .into_iter()
            .find(|row| row.as_numeral() == input)
            .ok_or_else(|| format!("Invalid Perikopen row: {input}"))
    }
}

impl fmt::Display for PerikopenRow {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_numeral())
    }
}

/// Liturgical fields extracted from one event description.
///
/// Absent fields stay `None` and are left out of the serialized mapping.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiturgicalFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub liturgical_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weekly_verse: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weekly_verse_reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub psalm: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_testament_reading: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub epistle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gospel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sermon_text: Option<String>,
    /// The weekly hymn line exactly as written, e.g. `"A / B"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hymn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hymn1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hymn2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub perikopen: Option<BTreeMap<PerikopenRow, String>>,
}

#[derive(Clone, Copy, Debug)]
enum Field {
    LiturgicalColor,
    Season,
    WeeklyVerse,
    Psalm,
    OldTestamentReading,
    Epistle,
    Gospel,
    SermonText,
    Hymn,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum WritePolicy {
    Overwrite,
    IfAbsent,
}

struct FieldLabel {
    label: &'static str,
    field: Field,
    policy: WritePolicy,
}

const FIELD_LABELS: [FieldLabel; 10] = [
    FieldLabel {
        label: "liturgische Farbe",
        field: Field::LiturgicalColor,
        policy: WritePolicy::Overwrite,
    },
    FieldLabel {
        label: "Festzeit",
        field: Field::Season,
        policy: WritePolicy::Overwrite,
    },
    FieldLabel {
        label: "Wochenspruch",
        field: Field::WeeklyVerse,
        policy: WritePolicy::Overwrite,
    },
    FieldLabel {
        label: "Wochenpsalm",
        field: Field::Psalm,
        policy: WritePolicy::Overwrite,
    },
    // Only a fallback: a Wochenpsalm seen earlier keeps precedence.
    FieldLabel {
        label: "Eingangspsalm",
        field: Field::Psalm,
        policy: WritePolicy::IfAbsent,
    },
    FieldLabel {
        label: "AT-Lesung",
        field: Field::OldTestamentReading,
        policy: WritePolicy::Overwrite,
    },
    FieldLabel {
        label: "Epistel",
        field: Field::Epistle,
        policy: WritePolicy::Overwrite,
    },
    FieldLabel {
        label: "Evangelium",
        field: Field::Gospel,
        policy: WritePolicy::Overwrite,
    },
    FieldLabel {
        label: "Predigttext",
        field: Field::SermonText,
        policy: WritePolicy::Overwrite,
    },
    FieldLabel {
        label: "Wochenlied",
        field: Field::Hymn,
        policy: WritePolicy::Overwrite,
    },
];

impl LiturgicalFields {
    /// Returns `true` when no field was recognized.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    fn is_set(&self, field: Field) -> bool {
        match field {
            Field::LiturgicalColor => self.liturgical_color.is_some(),
            Field::Season => self.season.is_some(),
            Field::WeeklyVerse => {
                self.weekly_verse.is_some() || self.weekly_verse_reference.is_some()
            }
            Field::Psalm => self.psalm.is_some(),
            Field::OldTestamentReading => self.old_testament_reading.is_some(),
            Field::Epistle => self.epistle.is_some(),
            Field::Gospel => self.gospel.is_some(),
            Field::SermonText => self.sermon_text.is_some(),
            Field::Hymn => self.hymn.is_some(),
        }
    }

    fn apply_label(&mut self, key: &str, value: &str) {
        let Some(entry) = FIELD_LABELS.iter().find(|entry| entry.label == key) else {
            trace!("Ignoring unknown description label {key:?}");
            return;
        };

        if value.is_empty() || (entry.policy == WritePolicy::IfAbsent && self.is_set(entry.field))
        {
            return;
        }

        let value = value.to_owned();
        match entry.field {
            Field::LiturgicalColor => self.liturgical_color = Some(value),
            Field::Season => self.season = Some(value),
            Field::WeeklyVerse => self.set_weekly_verse(&value),
            Field::Psalm => self.psalm = Some(value),
            Field::OldTestamentReading => self.old_testament_reading = Some(value),
            Field::Epistle => self.epistle = Some(value),
            Field::Gospel => self.gospel = Some(value),
            Field::SermonText => self.sermon_text = Some(value),
            Field::Hymn => self.set_hymn(value),
        }
    }

    fn set_weekly_verse(&mut self, value: &str) {
        let (text, reference) = split_trailing_reference(value);
        self.weekly_verse = non_empty(text);
        self.weekly_verse_reference = reference.and_then(non_empty);
    }

    fn set_hymn(&mut self, value: String) {
        let mut parts = value
            .splitn(2, HYMN_DELIMITER)
            .map(str::trim)
            .filter(|part| !part.is_empty());
        self.hymn1 = parts.next().map(str::to_owned);
        self.hymn2 = parts.next().map(str::to_owned);
        self.hymn = Some(value);
    }
}

/// Splits a trailing parenthesized citation off a text.
///
/// Returns the text without the `(...)` group and the group's inner text, or
/// the untouched text and `None` when it does not end with a citation.
pub fn split_trailing_reference(text: &str) -> (&str, Option<&str>) {
    let Some(captures) = TRAILING_REFERENCE_REGEX.captures(text) else {
        return (text, None);
    };
    let (Some(whole), Some(reference)) = (captures.get(0), captures.get(1)) else {
        return (text, None);
    };

    (
        text.get(..whole.start()).unwrap_or(text).trim(),
        Some(reference.as_str().trim()),
    )
}

/// Joins folded ICS continuation lines and resolves ICS text escapes.
///
/// Unfolding happens first, so an escape sequence split across a soft wrap is
/// still recognized.
pub fn normalize(raw: &str) -> String {
    unescape_text(&unfold_lines(raw))
}

/// Parses the raw `DESCRIPTION` payload of one calendar event.
///
/// The parser is total: unknown labels, lines without a colon and stray
/// numerals are skipped, and the empty string yields empty fields.
///
/// Once a line introducing the Perikopen appendix is seen, no later line is
/// read as a flat field any more. Lines `I:` to `VI:` are collected as
/// Perikopen wherever they appear.
pub fn parse_description(raw: &str) -> LiturgicalFields {
    let normalized = normalize(raw);
    let mut fields = LiturgicalFields::default();
    let mut perikopen = BTreeMap::new();
    let mut in_perikopen = false;

    for line in normalized
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
    {
        if introduces_perikopen(line) {
            in_perikopen = true;
            continue;
        }

        if let Some((row, text)) = parse_perikopen_line(line) {
            perikopen.insert(row, text);
            continue;
        }

        if in_perikopen {
            continue;
        }

        if let Some((key, value)) = line.split_once(':') {
            fields.apply_label(key.trim(), value.trim());
        }
    }

    if !perikopen.is_empty() {
        fields.perikopen = Some(perikopen);
    }

    fields
}

fn introduces_perikopen(line: &str) -> bool {
    PERIKOPEN_INTRODUCTIONS
        .iter()
        .any(|sentence| line.contains(sentence))
}

fn parse_perikopen_line(line: &str) -> Option<(PerikopenRow, String)> {
    let captures = PERIKOPEN_LINE_REGEX.captures(line)?;
    let row = captures.get(1)?.as_str().parse().ok()?;
    let text = non_empty(captures.get(2)?.as_str())?;

    Some((row, text))
}

pub(crate) fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}
