//! The ics module splits a kirchenjahr-evangelisch.de iCalendar export into
//! liturgical events.

use std::borrow::Cow;
use std::fs;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use ical::IcalParser;
use ical::parser::ical::component::IcalEvent;
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::constants::ICS_FOLD;
use crate::description::{LiturgicalFields, non_empty, parse_description};

static ICS_FOLD_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(ICS_FOLD).expect("Failed to compile ICS_FOLD regex"));

/// One day of the liturgical calendar.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiturgicalEvent {
    pub uid: String,
    pub summary: String,
    pub event_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(flatten)]
    pub fields: LiturgicalFields,
}

/// Reads and parses an ICS file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a valid calendar.
pub fn read_calendar(path: &str) -> Result<Vec<LiturgicalEvent>> {
    let content =
        fs::read_to_string(path).context(format!("Failed to read calendar file: {path}"))?;

    parse_calendar(&content).context(format!("Failed to parse calendar file: {path}"))
}

/// Parses every `VEVENT` of a calendar, dropping events that lack a UID,
/// a summary or a start date.
///
/// # Errors
///
/// Returns an error if the content is not a `VCALENDAR` or a content line is
/// malformed.
pub fn parse_calendar(content: &str) -> Result<Vec<LiturgicalEvent>> {
    // The ICS parser trims every physical line before joining continuations,
    // which would drop a space that sits right before a fold.
    let unfolded = unfold_lines(content.trim_start_matches('\u{feff}'));

    let mut events = Vec::new();
    for calendar in IcalParser::new(unfolded.as_bytes()) {
        let calendar = calendar.context("Invalid iCalendar data")?;
        debug!("Found {} events in calendar", calendar.events.len());

        events.extend(calendar.events.iter().filter_map(parse_event));
    }

    Ok(events)
}

/// Converts one parsed `VEVENT` into a liturgical event.
///
/// The first occurrence of each property wins. Returns `None` if `UID`,
/// `SUMMARY` or a valid `DTSTART` date is missing.
pub fn parse_event(event: &IcalEvent) -> Option<LiturgicalEvent> {
    let mut uid = None;
    let mut summary = None;
    let mut event_date = None;
    let mut url = None;
    let mut description = None;

    for property in &event.properties {
        let Some(value) = property.value.as_deref() else {
            continue;
        };

        match property.name.to_ascii_uppercase().as_str() {
            "UID" => uid = uid.or_else(|| non_empty(value)),
            "SUMMARY" => {
                summary = summary.or_else(|| non_empty(&collapse_whitespace(&unescape_text(value))))
            }
            "DTSTART" => event_date = event_date.or_else(|| parse_ics_date(value)),
            "URL" => url = url.or_else(|| non_empty(value)),
            "DESCRIPTION" => description = description.or(Some(value)),
            _ => {}
        }
    }

    let (Some(uid), Some(summary), Some(event_date)) = (uid.clone(), summary, event_date) else {
        warn!(
            "Skipping event {} without UID, SUMMARY or start date",
            uid.as_deref().unwrap_or("<unknown>")
        );
        return None;
    };

    Some(LiturgicalEvent {
        uid,
        summary,
        event_date,
        url,
        fields: description.map(parse_description).unwrap_or_default(),
    })
}

/// Parses the date part of a `DTSTART` value such as `20250803` or
/// `20250803T100000Z`.
///
/// The value has to start with exactly eight digits.
pub fn parse_ics_date(value: &str) -> Option<NaiveDate> {
    let digits = value.get(..8)?;
    let rest = value.get(8..)?;

    if !digits.bytes().all(|byte| byte.is_ascii_digit())
        || rest.starts_with(|character: char| character.is_ascii_digit())
    {
        return None;
    }

    NaiveDate::parse_from_str(digits, "%Y%m%d").ok()
}

/// Removes RFC 5545 soft line breaks: a line break followed by one space or
/// tab.
pub fn unfold_lines(content: &str) -> Cow<'_, str> {
    ICS_FOLD_REGEX.replace_all(content, "")
}

/// Resolves the ICS text escapes `\n`, `\N`, `\,`, `\;` and `\\`.
///
/// Unknown escapes are kept verbatim.
pub fn unescape_text(value: &str) -> String {
    let mut unescaped = String::with_capacity(value.len());
    let mut chars = value.chars();

    while let Some(current) = chars.next() {
        if current != '\\' {
            unescaped.push(current);
            continue;
        }

        match chars.next() {
            Some('n' | 'N') => unescaped.push('\n'),
            Some(escaped @ (',' | ';' | '\\')) => unescaped.push(escaped),
            Some(other) => {
                unescaped.push('\\');
                unescaped.push(other);
            }
            None => unescaped.push('\\'),
        }
    }

    unescaped
}

fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}
