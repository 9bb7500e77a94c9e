//! The kirchenjahr library turns the liturgical calendar of
//! kirchenjahr-evangelisch.de, the Herrnhuter Losungen and the Evangelisches
//! Gesangbuch index into structured data and SQL scripts, and scrapes Bible
//! passages for the referenced texts.

pub mod bible;
pub mod constants;
pub mod description;
pub mod exegesis;
pub mod hymns;
pub mod ics;
pub mod losungen;
pub mod scrape;
pub mod sql;
pub mod storage;

/// Enum representing how church events are written to SQL.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub enum SqlMode {
    /// Recreate the table content with one INSERT per event
    #[default]
    Insert,
    /// Update the liturgical fields of existing rows by UID
    Update,
}

impl std::str::FromStr for SqlMode {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.to_lowercase().as_str() {
            "insert" => Ok(SqlMode::Insert),
            "update" => Ok(SqlMode::Update),
            _ => Err(format!("Invalid SQL mode: {}", input)),
        }
    }
}

pub use description::{LiturgicalFields, PerikopenRow, parse_description};
pub use exegesis::{import_calendar, update_exegesis_urls};
pub use ics::{LiturgicalEvent, parse_calendar, read_calendar};
