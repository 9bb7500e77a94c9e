//! kirchenjahr is a CLI tool that converts the liturgical calendar of
//! kirchenjahr-evangelisch.de, the Herrnhuter Losungen and the EG hymn index
//! into SQL, and scrapes Bible texts for the referenced passages.
//!
//! Offline commands:
//! 1. `ics` - Converts an ICS export into an SQL script
//! 2. `description` - Parses a single event description into JSON
//! 3. `losungen` - Converts a Losungen XML file into an SQL script
//! 4. `hymns` - Converts an EG index into hymn number updates
//! 5. `import` - Imports an ICS export into a SQLite database
//!
//! Network commands:
//! 1. `exegesis` - Looks up exegesis links for imported events
//! 2. `losung` - Prints today's Losung as JSON
//! 3. `verse` - Prints a Bible passage as JSON

use std::fs;
use std::io::{self, Read};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use env_logger::Builder;
use log::{LevelFilter, debug, error, info};
use serde::Serialize;
use serde_json::json;

use kirchenjahr::{
    SqlMode,
    bible::{Testament, Translation, VerseReference},
    constants::USER_AGENT_ENV_NAME,
    description::parse_description,
    exegesis::{import_calendar, update_exegesis_urls},
    hymns::read_hymn_index,
    ics::read_calendar,
    losungen::read_losungen,
    scrape::{FetchConfig, build_client, scrape_passage, scrape_watchword},
    sql::{church_events_script, hymn_numbers_script, losungen_script, write_script},
};

/// A CLI tool for liturgical calendar data
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// The command to execute
    #[command(subcommand)]
    command: Command,

    #[arg(long, short, action = clap::ArgAction::Count, help = "Output v(v...)erbosity: error (0), warn (1), info (2), debug (3), trace (4)", global = true, default_value_t = 2)]
    verbose: u8,

    /// HTTP timeout in seconds for network commands
    #[arg(long, global = true, default_value_t = 10)]
    timeout: u64,
}

#[derive(Subcommand)]
enum Command {
    /// Convert an ICS calendar export into an SQL script
    Ics {
        /// Path to the ICS file
        file: String,
        /// Path to the SQL file to write
        #[arg(long, short, default_value = "church_events.sql")]
        output: String,
        /// SQL mode: "insert" (default) or "update"
        #[arg(long, short, default_value = "insert")]
        mode: SqlMode,
    },
    /// Parse one event description and print its fields as JSON
    Description {
        /// Path to a file holding the raw description, "-" or nothing for stdin
        file: Option<String>,
    },
    /// Convert a Losungen XML file into an SQL script
    Losungen {
        /// Path to the Losungen XML file
        file: String,
        /// Path to the SQL file to write
        #[arg(long, short, default_value = "losungen.sql")]
        output: String,
    },
    /// Convert an EG hymn index into hymn number updates
    Hymns {
        /// Path to the hymn index text file
        file: String,
        /// Path to the SQL file to write
        #[arg(long, short, default_value = "update_hymn_eg_numbers.sql")]
        output: String,
    },
    /// Import an ICS calendar export into a SQLite database
    Import {
        /// Path to the ICS file
        file: String,
        /// Path to database file to store events
        db: String,
    },
    /// Look up exegesis links for the events stored in a database
    Exegesis {
        /// Path to database file to read events from
        db: String,
        /// Delay between requests in milliseconds (rate limiting)
        #[arg(long, short, default_value_t = 1000)]
        delay: u64,
    },
    /// Print today's Losung and Lehrtext as JSON
    Losung {
        /// Translation code of the texts
        #[arg(long, short, default_value = "LUT")]
        translation: String,
    },
    /// Print a Bible passage as JSON
    Verse {
        /// Reference such as "Joh 3,16-18"
        reference: String,
        /// Translation code such as "LUT", "ELB" or "BIGS"
        translation: String,
        /// Testament override: "AT" or "NT"
        #[arg(long)]
        testament: Option<Testament>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    Builder::new()
        .filter_level(match cli.verbose {
            0 => LevelFilter::Error,
            1 => LevelFilter::Warn,
            2 => LevelFilter::Info,
            3 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        })
        .init();

    let fetch_config = build_fetch_config(cli.timeout);

    match cli.command {
        Command::Ics { file, output, mode } => handle_ics_command(&file, &output, &mode),
        Command::Description { file } => handle_description_command(file.as_deref()),
        Command::Losungen { file, output } => {
            let days = read_losungen(&file)?;
            info!("Parsed {} Losungen entries", days.len());
            write_script(&output, &losungen_script(&days, &source_name(&file)))
        }
        Command::Hymns { file, output } => {
            let index = read_hymn_index(&file)?;
            info!("Parsed {} hymn titles", index.len());
            write_script(&output, &hymn_numbers_script(&index, &source_name(&file)))
        }
        Command::Import { file, db } => import_calendar(&file, &db).map(|_| ()),
        Command::Exegesis { db, delay } => {
            let client = build_client(&fetch_config)?;
            update_exegesis_urls(
                &db,
                &client,
                &fetch_config.sites,
                Duration::from_millis(delay),
            )
                .await
                .map(|_| ())
        }
        Command::Losung { translation } => {
            print_json_or_error(handle_losung_command(&fetch_config, &translation).await)
        }
        Command::Verse {
            reference,
            translation,
            testament,
        } => print_json_or_error(
            handle_verse_command(&fetch_config, &reference, &translation, testament).await,
        ),
    }
}

fn build_fetch_config(timeout: u64) -> FetchConfig {
    let config = FetchConfig {
        timeout: Duration::from_secs(timeout),
        ..FetchConfig::default()
    };

    match std::env::var(USER_AGENT_ENV_NAME) {
        Ok(user_agent) => {
            info!("User agent is provided {user_agent}");
            FetchConfig { user_agent, ..config }
        }
        Err(err) => {
            debug!("{err} while providing user agent");
            config
        }
    }
}

fn source_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map_or_else(|| path.to_owned(), |name| name.to_string_lossy().into_owned())
}

fn handle_ics_command(file: &str, output: &str, mode: &SqlMode) -> Result<()> {
    let events = read_calendar(file)?;
    info!("Parsed {} events from {file}", events.len());

    let script = church_events_script(mode, &events, Local::now().naive_local())?;
    write_script(output, &script)
}

fn handle_description_command(file: Option<&str>) -> Result<()> {
    let raw = match file {
        Some(path) if path != "-" => {
            fs::read_to_string(path).context(format!("Failed to read description file: {path}"))?
        }
        _ => {
            let mut raw = String::new();
            io::stdin()
                .read_to_string(&mut raw)
                .context("Failed to read description from stdin")?;
            raw
        }
    };

    println!("{}", serde_json::to_string_pretty(&parse_description(&raw))?);
    Ok(())
}

async fn handle_losung_command(
    fetch_config: &FetchConfig,
    translation: &str,
) -> Result<serde_json::Value> {
    let translation = find_translation(translation)?;
    let client = build_client(fetch_config)?;
    let watchword = scrape_watchword(&client, &fetch_config.sites, translation).await?;

    Ok(serde_json::to_value(watchword)?)
}

async fn handle_verse_command(
    fetch_config: &FetchConfig,
    reference: &str,
    translation: &str,
    testament: Option<Testament>,
) -> Result<serde_json::Value> {
    let translation = find_translation(translation)?;
    let parsed = VerseReference::parse(reference)
        .context(format!("Invalid Bible reference: {reference}"))?;
    let client = build_client(fetch_config)?;

    let passage = scrape_passage(
        &client,
        &fetch_config.sites,
        &parsed,
        translation,
        testament,
    )
    .await?
    .context(format!("No text found for {reference}"))?;

    Ok(serde_json::to_value(passage)?)
}

fn find_translation(code: &str) -> Result<&'static Translation> {
    Translation::find(code).context(format!("Unsupported translation: {code}"))
}

/// Prints the value, or `{"error": ...}` when the command failed. Both go to
/// stdout so callers can always parse the output.
fn print_json_or_error<T: Serialize>(result: Result<T>) -> Result<()> {
    let output = match result {
        Ok(value) => serde_json::to_string_pretty(&value)?,
        Err(err) => {
            error!("{err:#}");
            serde_json::to_string(&json!({ "error": format!("{err:#}") }))?
        }
    };

    println!("{output}");
    Ok(())
}
