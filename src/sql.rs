//! The sql module renders parsed calendar, Losungen and hymn data as SQL
//! scripts.

use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::Write;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use log::info;

use crate::SqlMode;
use crate::description::LiturgicalFields;
use crate::hymns::SPECIAL_CASES;
use crate::ics::LiturgicalEvent;
use crate::losungen::DailyLosung;

const CHURCH_EVENTS_TABLE: &str = r#"CREATE TABLE IF NOT EXISTS church_events (
    id SERIAL PRIMARY KEY,
    uid VARCHAR(255) UNIQUE NOT NULL,
    summary TEXT NOT NULL,
    event_date DATE NOT NULL,
    url TEXT,
    liturgical_color VARCHAR(50),
    season VARCHAR(100),
    weekly_verse TEXT,
    weekly_verse_reference VARCHAR(100),
    psalm VARCHAR(100),
    old_testament_reading VARCHAR(100),
    epistle VARCHAR(100),
    gospel VARCHAR(100),
    sermon_text VARCHAR(100),
    hymn TEXT,
    hymn1 TEXT,
    hymn2 TEXT,
    hymn1_eg VARCHAR(20),
    hymn2_eg VARCHAR(20),
    perikopen JSON,
    exegesis_url TEXT,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);"#;

const LOSUNGEN_TABLE: &str = r#"CREATE TABLE IF NOT EXISTS losungen (
    id SERIAL PRIMARY KEY,
    date DATE UNIQUE NOT NULL,
    weekday VARCHAR(20) NOT NULL,
    holiday VARCHAR(200),
    ot_text TEXT NOT NULL,
    ot_reference VARCHAR(100) NOT NULL,
    nt_text TEXT NOT NULL,
    nt_reference VARCHAR(100) NOT NULL,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);"#;

/// Quotes a value as an SQL string literal, or `NULL` when absent.
pub fn escape_literal(value: Option<&str>) -> String {
    match value {
        Some(value) => format!("'{}'", value.replace('\'', "''")),
        None => "NULL".to_owned(),
    }
}

/// Liturgical columns of the `church_events` table with their values, in
/// table order.
pub fn liturgical_columns(fields: &LiturgicalFields) -> [(&'static str, Option<&str>); 12] {
    [
        ("liturgical_color", fields.liturgical_color.as_deref()),
        ("season", fields.season.as_deref()),
        ("weekly_verse", fields.weekly_verse.as_deref()),
        (
            "weekly_verse_reference",
            fields.weekly_verse_reference.as_deref(),
        ),
        ("psalm", fields.psalm.as_deref()),
        (
            "old_testament_reading",
            fields.old_testament_reading.as_deref(),
        ),
        ("epistle", fields.epistle.as_deref()),
        ("gospel", fields.gospel.as_deref()),
        ("sermon_text", fields.sermon_text.as_deref()),
        ("hymn", fields.hymn.as_deref()),
        ("hymn1", fields.hymn1.as_deref()),
        ("hymn2", fields.hymn2.as_deref()),
    ]
}

/// Serializes the Perikopen of an event as a JSON object keyed by numeral.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn perikopen_json(fields: &LiturgicalFields) -> Result<Option<String>> {
    fields
        .perikopen
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .context("Failed to serialize Perikopen")
}

fn script_header(title: &str, generated_at: NaiveDateTime) -> String {
    format!(
        "-- {title}\n-- Generated: {}\n\n",
        generated_at.format("%Y-%m-%d %H:%M:%S")
    )
}

/// Renders a script that recreates the `church_events` table content with
/// one `INSERT` per event.
///
/// # Errors
///
/// Returns an error if the Perikopen of an event cannot be serialized.
pub fn church_events_insert_script(
    events: &[LiturgicalEvent],
    generated_at: NaiveDateTime,
) -> Result<String> {
    let mut script = script_header("Church events from kirchenjahr-evangelisch.de", generated_at);
    script.push_str(CHURCH_EVENTS_TABLE);
    script.push_str("\n\nDELETE FROM church_events;\n\n");

    for event in events {
        let liturgical = liturgical_columns(&event.fields);
        let perikopen = perikopen_json(&event.fields)?;

        let columns: Vec<&str> = ["uid", "summary", "event_date", "url"]
            .into_iter()
            .chain(liturgical.iter().map(|(column, _)| *column))
            .chain(["perikopen"])
            .collect();

        let event_date = event.event_date.format("%Y-%m-%d").to_string();
        let values: Vec<String> = [
            Some(event.uid.as_str()),
            Some(event.summary.as_str()),
            Some(event_date.as_str()),
            event.url.as_deref(),
        ]
        .into_iter()
        .chain(liturgical.iter().map(|(_, value)| *value))
        .chain([perikopen.as_deref()])
        .map(escape_literal)
        .collect();

        script.push_str(&format!(
            "INSERT INTO church_events ({}) VALUES ({});\n",
            columns.join(", "),
            values.join(", ")
        ));
    }

    script.push_str("\n-- End of inserts\n");
    Ok(script)
}

/// Renders one `UPDATE` per event that sets only the fields the event has.
/// Events without any liturgical field are left out.
///
/// # Errors
///
/// Returns an error if the Perikopen of an event cannot be serialized.
pub fn church_events_update_script(
    events: &[LiturgicalEvent],
    generated_at: NaiveDateTime,
) -> Result<String> {
    let mut script = script_header("Kirchenjahr ICS data updates", generated_at);

    for event in events {
        let perikopen = perikopen_json(&event.fields)?;
        let assignments: Vec<String> = liturgical_columns(&event.fields)
            .into_iter()
            .chain([("perikopen", perikopen.as_deref())])
            .filter_map(|(column, value)| {
                value.map(|value| format!("{column} = {}", escape_literal(Some(value))))
            })
            .collect();

        if assignments.is_empty() {
            continue;
        }

        script.push_str(&format!(
            "UPDATE church_events SET {} WHERE uid = {};\n\n",
            assignments.join(", "),
            escape_literal(Some(&event.uid))
        ));
    }

    Ok(script)
}

/// Renders the script for the chosen [`SqlMode`].
///
/// # Errors
///
/// Returns an error if the Perikopen of an event cannot be serialized.
pub fn church_events_script(
    mode: &SqlMode,
    events: &[LiturgicalEvent],
    generated_at: NaiveDateTime,
) -> Result<String> {
    match mode {
        SqlMode::Insert => church_events_insert_script(events, generated_at),
        SqlMode::Update => church_events_update_script(events, generated_at),
    }
}

/// Renders a script that replaces the Losungen of the covered date range.
pub fn losungen_script(days: &[DailyLosung], source_name: &str) -> String {
    let mut script = format!("-- Losungen\n-- Generated from {source_name}\n\n");
    script.push_str(LOSUNGEN_TABLE);
    script.push_str("\n\n");

    let (Some(first), Some(last)) = (
        days.iter().map(|day| day.date).min(),
        days.iter().map(|day| day.date).max(),
    ) else {
        return script;
    };

    script.push_str(&format!(
        "DELETE FROM losungen WHERE date >= '{}' AND date <= '{}';\n\n",
        first.format("%Y-%m-%d"),
        last.format("%Y-%m-%d")
    ));

    let rows: Vec<String> = days
        .iter()
        .map(|day| {
            format!(
                "('{}', {}, {}, {}, {}, {}, {})",
                day.date.format("%Y-%m-%d"),
                escape_literal(Some(&day.weekday)),
                escape_literal(day.holiday.as_deref()),
                escape_literal(Some(&day.ot_text)),
                escape_literal(Some(&day.ot_reference)),
                escape_literal(Some(&day.nt_text)),
                escape_literal(Some(&day.nt_reference)),
            )
        })
        .collect();

    script.push_str(
        "INSERT INTO losungen (date, weekday, holiday, ot_text, ot_reference, nt_text, nt_reference) VALUES\n",
    );
    script.push_str(&rows.join(",\n"));
    script.push_str(";\n");

    script
}

/// Renders updates that attach EG numbers to the weekly hymns.
pub fn hymn_numbers_script(index: &BTreeMap<String, String>, source_name: &str) -> String {
    let mut script = format!(
        "-- Update hymn EG numbers\n-- Generated from {source_name}\n\n"
    );

    for (title, number) in index {
        let title = escape_literal(Some(title));
        let number = escape_literal(Some(&format!("EG {number}")));
        for column in ["hymn1", "hymn2"] {
            script.push_str(&format!(
                "UPDATE church_events SET {column}_eg = {number} WHERE LOWER(TRIM({column})) = LOWER({title});\n"
            ));
        }
    }

    script.push_str("\n-- Additional fuzzy matching for common variations\n");
    for (title, number) in SPECIAL_CASES {
        let pattern = escape_literal(Some(&format!("%{title}%")));
        let number = escape_literal(Some(number));
        for column in ["hymn1", "hymn2"] {
            script.push_str(&format!(
                "UPDATE church_events SET {column}_eg = {number} WHERE {column}_eg IS NULL AND LOWER({column}) LIKE LOWER({pattern});\n"
            ));
        }
    }

    script
}

/// Writes a rendered script to a file, replacing its content.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn write_script(output_path: &str, script: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(output_path)
        .context(format!("Failed to open output file: {output_path}"))?;

    file.write_all(script.as_bytes())?;

    info!("SQL file generated: {output_path}");
    Ok(())
}
