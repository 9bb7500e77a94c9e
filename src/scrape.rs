//! The scrape module fetches Bible passages from ERF Bibleserver and BIGS, the
//! daily Losung from losungen.de and exegesis links from
//! kirchenjahr-evangelisch.de.
//!
//! Every site has a pure `extract_*` function working on HTML and an async
//! `scrape_*` function that downloads the page first.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use log::{debug, warn};
use once_cell::sync::Lazy;
use reqwest::Client;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use scraper::{ElementRef, Html, Selector as ScraperSelector};
use serde::Serialize;
use url::Url;

use crate::bible::{
    Testament, Translation, VerseReference, bibleserver_url, bigs_url, clean_verse_text,
};
use crate::constants::{
    ACCEPT_HEADER, ACCEPT_LANGUAGE_HEADER, BIBLESERVER_BASE_URL, BIBLESERVER_SOURCE,
    BIGS_BASE_URL, BIGS_SOURCE, DEFAULT_USER_AGENT, KIRCHENJAHR_BASE_URL, LOSUNGEN_SOURCE,
    LOSUNGEN_URL,
};

macro_rules! selector {
    ($name:ident, $query:literal) => {
        static $name: Lazy<ScraperSelector> = Lazy::new(|| {
            ScraperSelector::parse($query).expect(concat!("Invalid selector: ", $query))
        });
    };
}

selector!(BIBLESERVER_VERSE, "span.verse");
selector!(BIBLESERVER_VERSE_NUMBER, "span.verse-number");
selector!(BIBLESERVER_VERSE_TEXT, ".verse-content--hover");
selector!(BIGS_PARAGRAPH, "div.bibelText p");
selector!(BIGS_VERSE_MARKER, "span.vers");
selector!(WATCHWORD_WRAPPER, "div.tx_phipfelswatchword div.watchwordWrapper");
selector!(WATCHWORD_DATE, "p.dateWrapper");
selector!(WATCHWORD, "p.watchword");
selector!(WATCHWORD_PASSAGE, "span.watchwordPassage");
selector!(INSTRUCTIVE_TEXT, "p.instructiveText");
selector!(INSTRUCTIVE_TEXT_PASSAGE, "span.instructiveTextPassage");
selector!(LINK, "a[href]");

const NOTE_CLASSES: [&str; 2] = ["footnote", "verse-references"];

/// Base URLs of the scraped sites.
#[derive(Clone, Debug)]
pub struct Sites {
    pub bibleserver: String,
    pub bigs: String,
    pub losungen: String,
    pub kirchenjahr: String,
}

impl Default for Sites {
    fn default() -> Self {
        Self {
            bibleserver: BIBLESERVER_BASE_URL.to_owned(),
            bigs: BIGS_BASE_URL.to_owned(),
            losungen: LOSUNGEN_URL.to_owned(),
            kirchenjahr: KIRCHENJAHR_BASE_URL.to_owned(),
        }
    }
}

/// HTTP settings shared by all scrapers.
#[derive(Clone, Debug)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout: Duration,
    pub sites: Sites,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            timeout: Duration::from_secs(10),
            sites: Sites::default(),
        }
    }
}

/// Builds the HTTP client used for every request.
///
/// # Errors
///
/// Returns an error if the client cannot be initialized.
pub fn build_client(config: &FetchConfig) -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HEADER));
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static(ACCEPT_LANGUAGE_HEADER),
    );

    Client::builder()
        .user_agent(config.user_agent.as_str())
        .default_headers(headers)
        .timeout(config.timeout)
        .build()
        .context("Unable to build HTTP client")
}

/// Downloads a page, returning `None` for non-success status codes.
///
/// # Errors
///
/// Returns an error if the request fails or the body cannot be read.
pub async fn fetch_html(client: &Client, url: &Url) -> Result<Option<String>> {
    let response = client.get(url.as_str()).send().await?;

    if !response.status().is_success() {
        warn!("Skipping {url} as {}", response.status());
        return Ok(None);
    }

    Ok(Some(response.text().await?))
}

/// One verse of a passage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Verse {
    pub number: u32,
    pub text: String,
    pub optional: bool,
}

/// A scraped passage in one translation.
#[derive(Clone, Debug, Serialize)]
pub struct Passage {
    pub reference: String,
    pub text: String,
    pub translation: &'static Translation,
    pub source: &'static str,
    pub url: String,
    pub testament: Testament,
    /// Individual verses, only given for passages of more than one verse.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verses: Option<Vec<Verse>>,
}

fn make_verse(reference: &VerseReference, number: u32, raw_text: &str) -> Option<Verse> {
    let cleaned = clean_verse_text(raw_text);
    if cleaned.is_empty() {
        return None;
    }

    let optional = reference.is_optional(number);
    let text = if optional {
        format!("[OPTIONAL]{cleaned}[/OPTIONAL]")
    } else {
        cleaned
    };

    Some(Verse {
        number,
        text,
        optional,
    })
}

fn assemble_passage(
    reference: &VerseReference,
    translation: &'static Translation,
    source: &'static str,
    url: &Url,
    testament: Option<Testament>,
    verses: Vec<Verse>,
) -> Option<Passage> {
    if verses.is_empty() {
        return None;
    }

    let text = verses
        .iter()
        .map(|verse| verse.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    Some(Passage {
        reference: reference.original.clone(),
        text,
        translation,
        source,
        url: url.to_string(),
        testament: testament.unwrap_or_else(|| reference.testament()),
        verses: (verses.len() > 1).then_some(verses),
    })
}

fn has_class(element: ElementRef<'_>, class: &str) -> bool {
    element.value().classes().any(|candidate| candidate == class)
}

/// Collects the text of an element, leaving out footnotes and cross
/// references.
fn text_without_notes(element: ElementRef<'_>) -> String {
    let mut text = String::new();
    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            if !NOTE_CLASSES.iter().any(|class| has_class(child_element, class)) {
                text.push_str(&text_without_notes(child_element));
            }
        } else if let Some(fragment) = child.value().as_text() {
            text.push_str(fragment);
        }
    }
    text
}

fn is_bibleserver_verse(element: ElementRef<'_>, number: u32) -> bool {
    let number_text = number.to_string();

    if has_class(element, &format!("v{number}")) {
        return true;
    }

    if let Some(vid) = element.value().attr("data-vid")
        && vid.rsplit(|c: char| !c.is_ascii_digit()).next() == Some(number_text.as_str())
    {
        return true;
    }

    element
        .select(&BIBLESERVER_VERSE_NUMBER)
        .next()
        .map(|marker| {
            marker
                .text()
                .collect::<String>()
                .chars()
                .filter(char::is_ascii_digit)
                .collect::<String>()
        })
        .is_some_and(|digits| digits == number_text)
}

/// Extracts the verses of a reference from an ERF Bibleserver chapter page.
pub fn extract_bibleserver_verses(html: &str, reference: &VerseReference) -> Vec<Verse> {
    let document = Html::parse_document(html);

    reference
        .verses()
        .filter_map(|number| {
            let verse = document
                .select(&BIBLESERVER_VERSE)
                .find(|element| is_bibleserver_verse(*element, number))?;
            let content = verse.select(&BIBLESERVER_VERSE_TEXT).next()?;

            make_verse(reference, number, &text_without_notes(content))
        })
        .collect()
}

/// Text following a BIGS verse marker up to the next marker.
fn bigs_verse_text(marker: ElementRef<'_>) -> String {
    let mut text = String::new();
    for sibling in marker.next_siblings() {
        if let Some(element) = ElementRef::wrap(sibling) {
            if element.value().name() == "span" && has_class(element, "vers") {
                break;
            }
            text.extend(element.text());
        } else if let Some(fragment) = sibling.value().as_text() {
            text.push_str(fragment);
        }
    }
    text
}

/// Extracts the verses of a reference from a BIGS online page.
pub fn extract_bigs_verses(html: &str, reference: &VerseReference) -> Vec<Verse> {
    let document = Html::parse_document(html);
    let mut verses: Vec<Verse> = Vec::new();

    for paragraph in document.select(&BIGS_PARAGRAPH) {
        for marker in paragraph.select(&BIGS_VERSE_MARKER) {
            let Ok(number) = marker.text().collect::<String>().trim().parse::<u32>() else {
                continue;
            };

            if !reference.verses().contains(&number)
                || verses.iter().any(|verse| verse.number == number)
            {
                continue;
            }

            if let Some(verse) = make_verse(reference, number, &bigs_verse_text(marker)) {
                verses.push(verse);
            }
        }
    }

    verses
}

/// Scrapes a passage from ERF Bibleserver.
///
/// # Errors
///
/// Returns an error if the URL cannot be built or the request fails.
pub async fn scrape_bibleserver(
    client: &Client,
    sites: &Sites,
    reference: &VerseReference,
    translation: &'static Translation,
    testament: Option<Testament>,
) -> Result<Option<Passage>> {
    let url = bibleserver_url(&sites.bibleserver, reference, translation.code)?;
    debug!("Fetching {url}");

    let Some(html) = fetch_html(client, &url).await? else {
        return Ok(None);
    };

    let verses = extract_bibleserver_verses(&html, reference);
    Ok(assemble_passage(
        reference,
        translation,
        BIBLESERVER_SOURCE,
        &url,
        testament,
        verses,
    ))
}

/// Scrapes a passage from the BIGS online edition.
///
/// # Errors
///
/// Returns an error if the URL cannot be built or the request fails.
pub async fn scrape_bigs(
    client: &Client,
    sites: &Sites,
    reference: &VerseReference,
    translation: &'static Translation,
    testament: Option<Testament>,
) -> Result<Option<Passage>> {
    let url = bigs_url(&sites.bigs, reference)?;
    debug!("Fetching {url}");

    let Some(html) = fetch_html(client, &url).await? else {
        return Ok(None);
    };

    let verses = extract_bigs_verses(&html, reference);
    Ok(assemble_passage(
        reference,
        translation,
        BIGS_SOURCE,
        &url,
        testament,
        verses,
    ))
}

/// Scrapes a passage from the site that hosts the translation.
///
/// # Errors
///
/// Returns an error if the URL cannot be built or the request fails.
pub async fn scrape_passage(
    client: &Client,
    sites: &Sites,
    reference: &VerseReference,
    translation: &'static Translation,
    testament: Option<Testament>,
) -> Result<Option<Passage>> {
    if translation.is_bigs() {
        scrape_bigs(client, sites, reference, translation, testament).await
    } else {
        scrape_bibleserver(client, sites, reference, translation, testament).await
    }
}

/// One half of the daily watchword: the Losung or the Lehrtext.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WatchwordText {
    pub text: Option<String>,
    pub reference: Option<String>,
    pub testament: Testament,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translation_source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bibleserver_url: Option<String>,
}

/// The daily Losung and Lehrtext as shown on losungen.de.
#[derive(Clone, Debug, Serialize)]
pub struct Watchword {
    pub date: Option<String>,
    pub losung: WatchwordText,
    pub lehrtext: WatchwordText,
    pub source: &'static str,
    pub url: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translation: Option<&'static Translation>,
}

fn extract_watchword_text(
    wrapper: ElementRef<'_>,
    paragraph: &ScraperSelector,
    passage: &ScraperSelector,
    testament: Testament,
) -> WatchwordText {
    let mut watchword_text = WatchwordText {
        text: None,
        reference: None,
        testament,
        translation_source: None,
        bibleserver_url: None,
    };

    let Some(paragraph) = wrapper.select(paragraph).next() else {
        return watchword_text;
    };

    let full_text = paragraph.text().collect::<String>().trim().to_owned();
    if let Some(passage) = paragraph.select(passage).next() {
        let reference = passage.text().collect::<String>().trim().to_owned();
        watchword_text.text = Some(full_text.replace(&reference, "").trim().to_owned());
        watchword_text.reference = Some(reference);
    } else {
        watchword_text.text = Some(full_text);
    }

    watchword_text
}

/// Extracts the daily watchword from the losungen.de start page.
///
/// # Errors
///
/// Returns an error if the page does not contain the watchword container.
pub fn extract_watchword(html: &str) -> Result<Watchword> {
    let document = Html::parse_document(html);
    let wrapper = document
        .select(&WATCHWORD_WRAPPER)
        .next()
        .context("watchwordWrapper div not found")?;

    Ok(Watchword {
        date: wrapper
            .select(&WATCHWORD_DATE)
            .next()
            .map(|date| date.text().collect::<String>().trim().to_owned()),
        losung: extract_watchword_text(wrapper, &WATCHWORD, &WATCHWORD_PASSAGE, Testament::Old),
        lehrtext: extract_watchword_text(
            wrapper,
            &INSTRUCTIVE_TEXT,
            &INSTRUCTIVE_TEXT_PASSAGE,
            Testament::New,
        ),
        source: LOSUNGEN_SOURCE,
        url: LOSUNGEN_URL,
        translation: None,
    })
}

/// Replaces the text of a watchword half with the same reference in another
/// translation. Keeps the original text when the passage cannot be found.
async fn retranslate(
    client: &Client,
    sites: &Sites,
    watchword_text: &mut WatchwordText,
    translation: &'static Translation,
) -> Result<()> {
    let Some(reference) = watchword_text
        .reference
        .as_deref()
        .and_then(VerseReference::parse)
    else {
        return Ok(());
    };

    let testament = Some(watchword_text.testament);
    let Some(passage) = scrape_passage(client, sites, &reference, translation, testament).await?
    else {
        warn!(
            "No {} text found for {}",
            translation.code, reference.original
        );
        return Ok(());
    };

    watchword_text.text = Some(passage.text);
    watchword_text.translation_source = Some(passage.source.to_owned());
    watchword_text.bibleserver_url = Some(passage.url);
    Ok(())
}

/// Scrapes today's watchword and, for translations other than the Luther
/// Bible, fetches both texts in the requested translation.
///
/// # Errors
///
/// Returns an error if losungen.de cannot be fetched or parsed, or a passage
/// request fails.
pub async fn scrape_watchword(
    client: &Client,
    sites: &Sites,
    translation: &'static Translation,
) -> Result<Watchword> {
    let url = Url::parse(&sites.losungen).context("Invalid losungen.de URL")?;
    let Some(html) = fetch_html(client, &url).await? else {
        bail!("losungen.de did not answer successfully");
    };

    let mut watchword = extract_watchword(&html)?;
    watchword.translation = Some(translation);

    if translation.code == "LUT" {
        for half in [&mut watchword.losung, &mut watchword.lehrtext] {
            half.translation_source = Some(LOSUNGEN_SOURCE.to_owned());
        }
    } else {
        retranslate(client, sites, &mut watchword.losung, translation).await?;
        retranslate(client, sites, &mut watchword.lehrtext, translation).await?;
    }

    Ok(watchword)
}

/// Finds the "Exegese zur Auslegung des Predigttextes" link on a
/// kirchenjahr-evangelisch.de page and resolves it against `base`.
pub fn extract_exegesis_link(html: &str, base: &Url) -> Option<Url> {
    let document = Html::parse_document(html);

    document
        .select(&LINK)
        .find(|link| {
            let text = link.text().collect::<String>().to_lowercase();
            text.contains("exegese") && text.contains("auslegung")
        })
        .and_then(|link| link.value().attr("href"))
        .and_then(|href| base.join(href.trim()).ok())
}

/// Scrapes the exegesis link of a church event page.
///
/// # Errors
///
/// Returns an error if the page URL is invalid or the request fails.
pub async fn scrape_exegesis_url(
    client: &Client,
    page_url: &str,
    base: &Url,
) -> Result<Option<Url>> {
    let url = Url::parse(page_url).context(format!("Invalid event URL: {page_url}"))?;

    Ok(fetch_html(client, &url)
        .await?
        .and_then(|html| extract_exegesis_link(&html, base)))
}
