//! The storage module keeps imported church events in a SQLite database so
//! that exegesis links can be looked up incrementally.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, params};
use std::collections::BTreeMap;
use std::convert::TryFrom;
use std::sync::{Arc, Mutex};
use url::Url;

use crate::description::{LiturgicalFields, PerikopenRow};
use crate::ics::LiturgicalEvent;
use crate::sql::perikopen_json;

const EVENT_COLUMNS: &str = "uid, summary, event_date, url, liturgical_color, season, \
    weekly_verse, weekly_verse_reference, psalm, old_testament_reading, epistle, gospel, \
    sermon_text, hymn, hymn1, hymn2, perikopen, exegesis_url";

/// Storage provides database operations for church events.
pub struct Storage {
    /// The underlying SQLite connection wrapped in Arc<Mutex<>> to make it thread-safe
    conn: Arc<Mutex<Connection>>,
}

impl Storage {
    /// Creates a new Storage instance with a database at the specified path.
    ///
    /// # Arguments
    ///
    /// * `database_path` - Path where the database file should be created or opened
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized
    pub fn new(database_path: &str) -> Result<Self> {
        let conn = Connection::open(database_path)
            .context(format!("Unable to open database: {database_path}"))?;

        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Initializes the database schema with the church_events table if it doesn't exist.
    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS church_events (
                uid TEXT PRIMARY KEY,
                summary TEXT NOT NULL,
                event_date TEXT NOT NULL,
                url TEXT NULL,
                liturgical_color TEXT NULL,
                season TEXT NULL,
                weekly_verse TEXT NULL,
                weekly_verse_reference TEXT NULL,
                psalm TEXT NULL,
                old_testament_reading TEXT NULL,
                epistle TEXT NULL,
                gospel TEXT NULL,
                sermon_text TEXT NULL,
                hymn TEXT NULL,
                hymn1 TEXT NULL,
                hymn2 TEXT NULL,
                perikopen TEXT NULL,
                exegesis_url TEXT NULL
            )",
            params![],
        )?;

        Ok(())
    }

    /// Adds or updates an event. An exegesis URL found earlier is kept.
    ///
    /// # Arguments
    ///
    /// * `event` - The parsed calendar event
    ///
    /// # Errors
    ///
    /// Returns an error if the Perikopen cannot be serialized or the database operation fails
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned
    pub fn upsert_event(&self, event: &LiturgicalEvent) -> Result<()> {
        let perikopen = perikopen_json(&event.fields)?;
        let fields = &event.fields;

        let conn = self.conn.lock().expect("Storage mutex poisoned");
        conn.execute(
            "INSERT INTO church_events (
                uid, summary, event_date, url, liturgical_color, season, weekly_verse,
                weekly_verse_reference, psalm, old_testament_reading, epistle, gospel,
                sermon_text, hymn, hymn1, hymn2, perikopen
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
            ON CONFLICT(uid) DO UPDATE SET
                summary = excluded.summary,
                event_date = excluded.event_date,
                url = excluded.url,
                liturgical_color = excluded.liturgical_color,
                season = excluded.season,
                weekly_verse = excluded.weekly_verse,
                weekly_verse_reference = excluded.weekly_verse_reference,
                psalm = excluded.psalm,
                old_testament_reading = excluded.old_testament_reading,
                epistle = excluded.epistle,
                gospel = excluded.gospel,
                sermon_text = excluded.sermon_text,
                hymn = excluded.hymn,
                hymn1 = excluded.hymn1,
                hymn2 = excluded.hymn2,
                perikopen = excluded.perikopen",
            params![
                event.uid,
                event.summary,
                event.event_date.format("%Y-%m-%d").to_string(),
                event.url,
                fields.liturgical_color,
                fields.season,
                fields.weekly_verse,
                fields.weekly_verse_reference,
                fields.psalm,
                fields.old_testament_reading,
                fields.epistle,
                fields.gospel,
                fields.sermon_text,
                fields.hymn,
                fields.hymn1,
                fields.hymn2,
                perikopen,
            ],
        )?;

        Ok(())
    }

    /// Gets a stored event by its calendar UID.
    ///
    /// # Arguments
    ///
    /// * `uid` - The UID of the event
    ///
    /// # Returns
    ///
    /// Returns the event if found, None if not found
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails or the row holds invalid data
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned
    pub fn get_event(&self, uid: &str) -> Result<Option<StoredEvent>> {
        let conn = self.conn.lock().expect("Storage mutex poisoned");
        let mut stmt = conn.prepare(&format!(
            "SELECT {EVENT_COLUMNS} FROM church_events WHERE uid = ?1"
        ))?;
        let event_row: Option<EventRow> = stmt
            .query_row([uid], EventRow::from_row)
            .optional()
            .map_err(|e| anyhow::anyhow!("Unable to fetch event row: {e}"))?;

        let Some(event_row) = event_row else {
            return Ok(None);
        };

        Ok(Some(event_row.try_into()?))
    }

    /// Returns the number of stored events.
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned
    pub fn count_events(&self) -> Result<usize> {
        let conn = self.conn.lock().expect("Storage mutex poisoned");
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM church_events", [], |row| row.get(0))?;

        Ok(usize::try_from(count)?)
    }

    /// Lists `(uid, url)` of events that have a page URL but no exegesis URL yet,
    /// ordered by date.
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned
    pub fn list_events_missing_exegesis(&self) -> Result<Vec<(String, String)>> {
        let conn = self.conn.lock().expect("Storage mutex poisoned");
        let mut stmt = conn.prepare(
            "SELECT uid, url FROM church_events
             WHERE url IS NOT NULL AND url != '' AND exegesis_url IS NULL
             ORDER BY event_date ASC",
        )?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
        let events: Result<Vec<(String, String)>, rusqlite::Error> = rows.collect();

        events.map_err(|e| e.into())
    }

    /// Stores the exegesis URL of an event.
    ///
    /// # Arguments
    ///
    /// * `uid` - The UID of the event to update
    /// * `exegesis_url` - The resolved exegesis link
    ///
    /// # Returns
    ///
    /// Returns `true` if an event was updated
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned
    pub fn update_exegesis_url(&self, uid: &str, exegesis_url: &Url) -> Result<bool> {
        let conn = self.conn.lock().expect("Storage mutex poisoned");
        let updated = conn.execute(
            "UPDATE church_events SET exegesis_url = ?1 WHERE uid = ?2",
            params![exegesis_url.as_str(), uid],
        )?;

        Ok(updated > 0)
    }
}

/// Represents a church event row as stored in the database
#[derive(Debug)]
pub struct EventRow {
    pub uid: String,
    pub summary: String,
    pub event_date: String,
    pub url: Option<String>,
    pub columns: [Option<String>; 12],
    pub perikopen: Option<String>,
    pub exegesis_url: Option<String>,
}

impl EventRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        let mut columns: [Option<String>; 12] = Default::default();
        for (offset, column) in columns.iter_mut().enumerate() {
            *column = row.get(offset + 4)?;
        }

        Ok(Self {
            uid: row.get(0)?,
            summary: row.get(1)?,
            event_date: row.get(2)?,
            url: row.get(3)?,
            columns,
            perikopen: row.get(16)?,
            exegesis_url: row.get(17)?,
        })
    }
}

/// A stored event together with its exegesis link
#[derive(Debug)]
pub struct StoredEvent {
    pub event: LiturgicalEvent,
    pub exegesis_url: Option<Url>,
}

impl TryFrom<EventRow> for StoredEvent {
    type Error = anyhow::Error;

    fn try_from(event_row: EventRow) -> Result<Self> {
        let [
            liturgical_color,
            season,
            weekly_verse,
            weekly_verse_reference,
            psalm,
            old_testament_reading,
            epistle,
            gospel,
            sermon_text,
            hymn,
            hymn1,
            hymn2,
        ] = event_row.columns;

        let perikopen: Option<BTreeMap<PerikopenRow, String>> = event_row
            .perikopen
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .context("Unable to read Perikopen from database")?;

        Ok(StoredEvent {
            event: LiturgicalEvent {
                uid: event_row.uid,
                summary: event_row.summary,
                event_date: NaiveDate::parse_from_str(&event_row.event_date, "%Y-%m-%d")
                    .context("Unable to initialize event_date from database")?,
                url: event_row.url,
                fields: LiturgicalFields {
                    liturgical_color,
                    season,
                    weekly_verse,
                    weekly_verse_reference,
                    psalm,
                    old_testament_reading,
                    epistle,
                    gospel,
                    sermon_text,
                    hymn,
                    hymn1,
                    hymn2,
                    perikopen,
                },
            },
            exegesis_url: event_row
                .exegesis_url
                .as_deref()
                .map(Url::parse)
                .transpose()?,
        })
    }
}
