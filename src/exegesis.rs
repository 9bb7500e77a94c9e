//! The exegesis module imports calendar events into the database and looks up
//! the exegesis link of every event page on kirchenjahr-evangelisch.de.

use std::time::Duration;

use anyhow::{Context, Result};
use log::{debug, error, info};
use reqwest::Client;
use url::Url;

use crate::ics::read_calendar;
use crate::scrape::{Sites, scrape_exegesis_url};
use crate::storage::Storage;

/// Counts of one exegesis lookup run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExegesisReport {
    pub checked: usize,
    pub found: usize,
    pub failed: usize,
}

/// Imports all events of an ICS file into the database.
///
/// # Arguments
///
/// * `ics_path` - Path to the calendar file
/// * `db_path` - Path to the database file
///
/// # Returns
///
/// Returns the number of imported events
///
/// # Errors
///
/// Returns an error if the calendar cannot be read or a database operation fails
pub fn import_calendar(ics_path: &str, db_path: &str) -> Result<usize> {
    let events = read_calendar(ics_path)?;
    let storage = Storage::new(db_path)?;

    for event in &events {
        storage.upsert_event(event)?;
        debug!("Imported event {}", event.uid);
    }

    info!(
        "Imported {} events, database {db_path} now holds {}",
        events.len(),
        storage.count_events()?
    );
    Ok(events.len())
}

/// Scrapes the exegesis link of every stored event that has a page URL but no
/// exegesis URL yet, waiting `delay` between requests. Relative links are
/// resolved against the kirchenjahr-evangelisch.de base of `sites`.
///
/// A failing page is logged and skipped, so one broken page does not stop
/// the run.
///
/// # Errors
///
/// Returns an error if a database operation fails
pub async fn update_exegesis_urls(
    db_path: &str,
    client: &Client,
    sites: &Sites,
    delay: Duration,
) -> Result<ExegesisReport> {
    let storage = Storage::new(db_path)?;
    let base = Url::parse(&sites.kirchenjahr).context("Invalid kirchenjahr base URL")?;
    let pending = storage.list_events_missing_exegesis()?;

    info!("Looking up exegesis links for {} events...", pending.len());

    let mut report = ExegesisReport::default();
    for (index, (uid, page_url)) in pending.iter().enumerate() {
        if index > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        report.checked += 1;
        match scrape_exegesis_url(client, page_url, &base).await {
            Ok(Some(exegesis_url)) => {
                storage.update_exegesis_url(uid, &exegesis_url)?;
                report.found += 1;
                debug!("Found exegesis link for {uid}: {exegesis_url}");
            }
            Ok(None) => debug!("No exegesis link on {page_url}"),
            Err(err) => {
                report.failed += 1;
                error!("Unable to look up exegesis link on {page_url}: {err:#}");
            }
        }
    }

    if report.checked == 0 {
        info!("No events without exegesis link.");
    } else {
        info!(
            "Checked {} events, found {} exegesis links, {} failed",
            report.checked, report.found, report.failed
        );
    }

    Ok(report)
}
