use chrono::NaiveDate;
use kirchenjahr::description::{PerikopenRow, parse_description};
use kirchenjahr::exegesis::import_calendar;
use kirchenjahr::ics::LiturgicalEvent;
use kirchenjahr::storage::Storage;
use spectral::{assert_that, boolean::BooleanAssertions};
use tempfile::TempDir;
use url::Url;

fn database() -> (TempDir, String) {
    let directory = tempfile::tempdir().expect("Expected temp dir");
    let path = directory
        .path()
        .join("kirchenjahr.db")
        .to_str()
        .expect("UTF-8 path")
        .to_owned();
    (directory, path)
}

fn event(uid: &str, url: Option<&str>, day: u32) -> LiturgicalEvent {
    LiturgicalEvent {
        uid: uid.to_owned(),
        summary: format!("Sonntag {uid}"),
        event_date: NaiveDate::from_ymd_opt(2025, 8, day).expect("Valid date"),
        url: url.map(str::to_owned),
        fields: parse_description(
            "Festzeit: Trinitatiszeit\nWochenlied: A / B\nI: Joh 6,30–35\nII: Hebr 13,1–3",
        ),
    }
}

#[test]
fn stores_and_reads_events() {
    let (_directory, path) = database();
    let storage = Storage::new(&path).expect("Expected storage");
    let original = event("1430", Some("https://kirchenjahr-evangelisch.de/article.php#1430"), 3);

    storage.upsert_event(&original).expect("Expected stored event");
    let stored = storage
        .get_event("1430")
        .expect("Expected query")
        .expect("Expected event");

    assert_that(&stored.event).is_equal_to(original);
    assert_that(&stored.exegesis_url.is_none()).is_true();
    assert_that(&storage.get_event("missing").expect("Expected query").is_none()).is_true();
}

#[test]
fn upsert_replaces_fields_and_keeps_exegesis_url() {
    let (_directory, path) = database();
    let storage = Storage::new(&path).expect("Expected storage");
    let page_url = Some("https://kirchenjahr-evangelisch.de/article.php#1");
    let exegesis_url =
        Url::parse("https://kirchenjahr-evangelisch.de/exegese.php?id=1").expect("Valid URL");

    storage
        .upsert_event(&event("1", page_url, 3))
        .expect("Expected stored event");
    assert_that(&storage.update_exegesis_url("1", &exegesis_url).expect("Expected update"))
        .is_true();

    let mut changed = event("1", page_url, 3);
    changed.fields.perikopen = None;
    changed.summary = "Geändert".to_owned();
    storage.upsert_event(&changed).expect("Expected stored event");

    let stored = storage.get_event("1").expect("Expected query").expect("Expected event");
    assert_that(&stored.event.summary).is_equal_to("Geändert".to_owned());
    assert_that(&stored.event.fields.perikopen).is_equal_to(None);
    assert_that(&stored.exegesis_url).is_equal_to(Some(exegesis_url));
    assert_that(&storage.count_events().expect("Expected count")).is_equal_to(1);
}

#[test]
fn lists_events_missing_exegesis_by_date() {
    let (_directory, path) = database();
    let storage = Storage::new(&path).expect("Expected storage");

    for stored in [
        event("late", Some("https://example.org/late"), 10),
        event("early", Some("https://example.org/early"), 3),
        event("no-url", None, 4),
        event("done", Some("https://example.org/done"), 5),
    ] {
        storage.upsert_event(&stored).expect("Expected stored event");
    }
    storage
        .update_exegesis_url("done", &Url::parse("https://example.org/exegese").expect("Valid URL"))
        .expect("Expected update");

    let pending = storage.list_events_missing_exegesis().expect("Expected list");

    assert_that(&pending).is_equal_to(vec![
        ("early".to_owned(), "https://example.org/early".to_owned()),
        ("late".to_owned(), "https://example.org/late".to_owned()),
    ]);
}

#[test]
fn updating_unknown_event_changes_nothing() {
    let (_directory, path) = database();
    let storage = Storage::new(&path).expect("Expected storage");
    let url = Url::parse("https://example.org/exegese").expect("Valid URL");

    assert_that(&storage.update_exegesis_url("missing", &url).expect("Expected update")).is_false();
}

#[test]
fn reopened_database_keeps_events() {
    let (_directory, path) = database();
    Storage::new(&path)
        .expect("Expected storage")
        .upsert_event(&event("1", None, 3))
        .expect("Expected stored event");

    let storage = Storage::new(&path).expect("Expected storage");
    let stored = storage.get_event("1").expect("Expected query").expect("Expected event");

    let second_row = stored
        .event
        .fields
        .perikopen
        .and_then(|perikopen| perikopen.get(&PerikopenRow::Second).cloned());
    assert_that(&second_row).is_equal_to(Some("Hebr 13,1–3".to_owned()));
}

#[test]
fn imports_calendar_file() {
    let (directory, path) = database();
    let calendar = directory.path().join("kirchenjahr.ics");
    std::fs::write(
        &calendar,
        "BEGIN:VCALENDAR\r\nBEGIN:VEVENT\r\nUID:1\r\nSUMMARY:1. Advent\r\nDTSTART;VALUE=DATE:20251130\r\nURL:https://kirchenjahr-evangelisch.de/article.php#1\r\nDESCRIPTION:liturgische Farbe: Violett\\nFestzeit: Advent\r\nEND:VEVENT\r\nBEGIN:VEVENT\r\nSUMMARY:Ohne UID\r\nDTSTART:20251207\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n",
    )
    .expect("Expected written calendar");

    let imported =
        import_calendar(calendar.to_str().expect("UTF-8 path"), &path).expect("Expected import");

    assert_that(&imported).is_equal_to(1);

    let storage = Storage::new(&path).expect("Expected storage");
    let stored = storage.get_event("1").expect("Expected query").expect("Expected event");
    assert_that(&stored.event.fields.liturgical_color.as_deref()).is_equal_to(Some("Violett"));
    assert_that(&storage.list_events_missing_exegesis().expect("Expected list").len())
        .is_equal_to(1);
}
