//! The losungen module reads the yearly "Losungen" XML file published by the
//! Herrnhuter Brüdergemeine.

use std::convert::TryFrom;
use std::fs;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::constants::LEHRTEXT_SPEAKER;
use crate::description::non_empty;

static LEHRTEXT_SPEAKER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(LEHRTEXT_SPEAKER).expect("Failed to compile LEHRTEXT_SPEAKER regex")
});

/// The Losung (Old Testament) and Lehrtext (New Testament) of one day.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DailyLosung {
    pub date: NaiveDate,
    pub weekday: String,
    /// Name of the Sunday or holiday, if the day is one.
    pub holiday: Option<String>,
    pub ot_text: String,
    pub ot_reference: String,
    pub nt_text: String,
    pub nt_reference: String,
}

#[derive(Debug, Deserialize)]
struct FreeXml {
    #[serde(rename = "Losungen", default)]
    entries: Vec<LosungenRecord>,
}

/// Raw `<Losungen>` element as found in the file.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct LosungenRecord {
    #[serde(default)]
    datum: Option<String>,
    #[serde(default)]
    wtag: Option<String>,
    #[serde(default)]
    sonntag: Option<String>,
    #[serde(default)]
    losungstext: Option<String>,
    #[serde(default)]
    losungsvers: Option<String>,
    #[serde(default)]
    lehrtext: Option<String>,
    #[serde(default)]
    lehrtextvers: Option<String>,
}

impl TryFrom<LosungenRecord> for DailyLosung {
    type Error = anyhow::Error;

    fn try_from(record: LosungenRecord) -> Result<Self> {
        let datum = record.datum.context("Entry without Datum")?;
        let date = datum
            .trim()
            .get(..10)
            .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok())
            .context(format!("Invalid Datum: {datum}"))?;

        let lehrtext = record
            .lehrtext
            .as_deref()
            .map(|text| LEHRTEXT_SPEAKER_REGEX.replace(text.trim(), "").into_owned());

        Ok(DailyLosung {
            date,
            weekday: required(record.wtag, "Wtag", date)?,
            holiday: record.sonntag.as_deref().and_then(non_empty),
            ot_text: required(record.losungstext, "Losungstext", date)?,
            ot_reference: required(record.losungsvers, "Losungsvers", date)?,
            nt_text: required(lehrtext, "Lehrtext", date)?,
            nt_reference: required(record.lehrtextvers, "Lehrtextvers", date)?,
        })
    }
}

fn required(value: Option<String>, element: &str, date: NaiveDate) -> Result<String> {
    value
        .as_deref()
        .and_then(non_empty)
        .context(format!("Entry {date} without {element}"))
}

/// Parses the content of a Losungen XML file.
///
/// Entries that lack a valid date or one of the texts are skipped with a
/// warning.
///
/// # Errors
///
/// Returns an error if the document is not well-formed XML.
pub fn parse_losungen(xml: &str) -> Result<Vec<DailyLosung>> {
    let document: FreeXml = quick_xml::de::from_str(xml.trim_start_matches('\u{feff}'))
        .context("Failed to parse Losungen XML")?;

    debug!("Found {} Losungen entries", document.entries.len());

    let mut days = Vec::with_capacity(document.entries.len());
    for record in document.entries {
        match DailyLosung::try_from(record) {
            Ok(day) => days.push(day),
            Err(error) => warn!("Skipping Losungen entry: {error}"),
        }
    }

    Ok(days)
}

/// Reads and parses a Losungen XML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not well-formed XML.
pub fn read_losungen(path: &str) -> Result<Vec<DailyLosung>> {
    let xml = fs::read_to_string(path).context(format!("Failed to read Losungen file: {path}"))?;

    parse_losungen(&xml)
}
