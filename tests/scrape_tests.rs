use std::time::Duration;

use kirchenjahr::bible::{Testament, Translation, VerseReference};
use kirchenjahr::scrape::{
    FetchConfig, Verse, build_client, extract_bibleserver_verses, extract_bigs_verses,
    extract_exegesis_link, extract_watchword, fetch_html, scrape_exegesis_url, scrape_passage,
    scrape_watchword,
};
use spectral::{assert_that, boolean::BooleanAssertions};
use url::Url;

use crate::site_extras::{client, local_sites, serve, unreachable_url};

mod site_extras;

const BIBLESERVER_HTML: &str = r#"<html><body><article class="chapter">
<h3>Jesus und Nikodemus</h3>
<span class="verse v1" data-vid="JHN.3.1"><span class="verse-number">1 </span><span class="verse-content"><span class="verse-content--hover">Es war aber ein Mensch unter den Pharisäern mit Namen Nikodemus.</span></span></span>
<span class="verse v16" data-vid="JHN.3.16"><span class="verse-number">16 </span><span class="verse-content"><span class="verse-content--hover">Denn also hat Gott die Welt geliebt<sup class="footnote">a</sup>, dass er <span class="verse-references">(Röm 5,8)</span>seinen eingeborenen Sohn gab.</span></span></span>
<span class="verse" data-vid="JHN.3.17"><span class="verse-number">17 </span><span class="verse-content"><span class="verse-content--hover">Denn Gott hat seinen Sohn nicht in die Welt gesandt, dass er die Welt richte.</span></span></span>
<span class="verse"><span class="verse-number">18</span><span class="verse-content"><span class="verse-content--hover">Wer an ihn glaubt, der wird nicht gerichtet.</span></span></span>
</article></body></html>"#;

const BIGS_HTML: &str = r#"<html><body><div class="bibelText">
<p><span class="vers">19</span>Und es wurde ein° Zeichen gegeben. <span class="vers">20</span>Das Gesetz aber ist dazwischen gekommen, <em>damit</em> die Übertretung zunehme.</p>
<p><span class="vers">21</span>Wie die Sünde [im Tod] geherrscht hat, so soll die Gnade herrschen.</p>
</div></body></html>"#;

const LOSUNGEN_HTML: &str = r#"<html><body>
<div class="tx_phipfelswatchword"><div class="watchwordWrapper">
<p class="dateWrapper"> Mittwoch, 1. Januar 2025 </p>
<p class="watchword">Des HERRN Wort ist wahrhaftig. <span class="watchwordPassage">Psalm 33,4</span></p>
<p class="instructiveText">Gott ist's, der in euch wirkt. <span class="instructiveTextPassage">Philipper 2,13</span></p>
</div></div>
</body></html>"#;

fn reference(text: &str) -> VerseReference {
    VerseReference::parse(text).expect("Expected reference")
}

fn verse(number: u32, text: &str, optional: bool) -> Verse {
    Verse {
        number,
        text: text.to_owned(),
        optional,
    }
}

#[test]
fn extracts_bibleserver_verses_without_notes() {
    let verses = extract_bibleserver_verses(BIBLESERVER_HTML, &reference("Johannes 3,16-18"));

    assert_that(&verses).is_equal_to(vec![
        verse(
            16,
            "Denn also hat Gott die Welt geliebt, dass er seinen eingeborenen Sohn gab.",
            false,
        ),
        verse(
            17,
            "Denn Gott hat seinen Sohn nicht in die Welt gesandt, dass er die Welt richte.",
            false,
        ),
        verse(18, "Wer an ihn glaubt, der wird nicht gerichtet.", false),
    ]);
}

#[test]
fn bibleserver_verse_class_matches_exactly() {
    let verses = extract_bibleserver_verses(BIBLESERVER_HTML, &reference("Johannes 3,1"));

    assert_that(&verses).is_equal_to(vec![verse(
        1,
        "Es war aber ein Mensch unter den Pharisäern mit Namen Nikodemus.",
        false,
    )]);
}

#[test]
fn marks_optional_bibleserver_verses() {
    let verses = extract_bibleserver_verses(BIBLESERVER_HTML, &reference("Johannes 3,16(17)"));

    assert_that(&verses.len()).is_equal_to(2);
    assert_that(&verses.get(1)).is_equal_to(Some(&verse(
        17,
        "[OPTIONAL]Denn Gott hat seinen Sohn nicht in die Welt gesandt, dass er die Welt richte.[/OPTIONAL]",
        true,
    )));
}

#[test]
fn missing_bibleserver_verses_are_skipped() {
    let verses = extract_bibleserver_verses(BIBLESERVER_HTML, &reference("Johannes 3,30-31"));

    assert_that(&verses.is_empty()).is_true();
}

#[test]
fn extracts_bigs_verses_up_to_next_marker() {
    let verses = extract_bigs_verses(BIGS_HTML, &reference("Römer 5,20-21"));

    assert_that(&verses).is_equal_to(vec![
        verse(20, "Das Gesetz aber ist dazwischen gekommen, damit die Übertretung zunehme.", false),
        verse(21, "Wie die Sünde geherrscht hat, so soll die Gnade herrschen.", false),
    ]);
}

#[test]
fn cleans_bigs_glossary_markers() {
    let verses = extract_bigs_verses(BIGS_HTML, &reference("Römer 5,19"));

    assert_that(&verses).is_equal_to(vec![verse(19, "Und es wurde ein Zeichen gegeben.", false)]);
}

#[test]
fn extracts_watchword() {
    let watchword = extract_watchword(LOSUNGEN_HTML).expect("Expected watchword");

    assert_that(&watchword.date.as_deref()).is_equal_to(Some("Mittwoch, 1. Januar 2025"));
    assert_that(&watchword.losung.text.as_deref())
        .is_equal_to(Some("Des HERRN Wort ist wahrhaftig."));
    assert_that(&watchword.losung.reference.as_deref()).is_equal_to(Some("Psalm 33,4"));
    assert_that(&watchword.losung.testament).is_equal_to(Testament::Old);
    assert_that(&watchword.lehrtext.text.as_deref())
        .is_equal_to(Some("Gott ist's, der in euch wirkt."));
    assert_that(&watchword.lehrtext.reference.as_deref()).is_equal_to(Some("Philipper 2,13"));
    assert_that(&watchword.lehrtext.testament).is_equal_to(Testament::New);
}

#[test]
fn serializes_watchword_with_snake_case_keys() {
    let watchword = extract_watchword(LOSUNGEN_HTML).expect("Expected watchword");
    let json = serde_json::to_value(&watchword).expect("Expected serializable watchword");

    assert_that(&json["source"]).is_equal_to(serde_json::json!("Herrnhuter Losungen"));
    assert_that(&json["losung"]["testament"]).is_equal_to(serde_json::json!("AT"));
    assert_that(&json["lehrtext"].get("translation_source").is_none()).is_true();
}

#[test]
fn watchword_requires_wrapper() {
    assert_that(&extract_watchword("<html><body><p>Wartung</p></body></html>").is_err()).is_true();
}

#[test]
fn finds_exegesis_link() {
    let base = Url::parse("https://kirchenjahr-evangelisch.de/").expect("Valid URL");
    let html = r#"<div>
        <a href="article.php#1430">7. Sonntag nach Trinitatis</a>
        <a href="exegese.php?id=1430">Exegese zur Auslegung des Predigttextes</a>
    </div>"#;

    let link = extract_exegesis_link(html, &base);

    assert_that(&link.map(String::from))
        .is_equal_to(Some("https://kirchenjahr-evangelisch.de/exegese.php?id=1430".to_owned()));
}

#[test]
fn keeps_absolute_exegesis_link() {
    let base = Url::parse("https://kirchenjahr-evangelisch.de/").expect("Valid URL");
    let html = r#"<a href="https://example.org/auslegung">EXEGESE und Auslegung</a>"#;

    assert_that(&extract_exegesis_link(html, &base).map(String::from))
        .is_equal_to(Some("https://example.org/auslegung".to_owned()));
    assert_that(&extract_exegesis_link("<a href=\"x\">Exegese</a>", &base).is_none()).is_true();
}

#[test]
fn builds_client_with_custom_settings() {
    let config = FetchConfig {
        user_agent: "kirchenjahr-test".to_owned(),
        timeout: Duration::from_secs(2),
        ..FetchConfig::default()
    };

    assert_that(&build_client(&config).is_ok()).is_true();
    assert_that(&FetchConfig::default().timeout).is_equal_to(Duration::from_secs(10));
}

const PSALM_HTML: &str = r#"<html><body><article class="chapter">
<span class="verse v4" data-vid="PSA.33.4"><span class="verse-number">4 </span><span class="verse-content"><span class="verse-content--hover">Denn das Wort des HERRN ist gerade.</span></span></span>
</article></body></html>"#;

const PHILIPPER_HTML: &str = r#"<html><body><article class="chapter">
<span class="verse v13" data-vid="PHP.2.13"><span class="verse-number">13 </span><span class="verse-content"><span class="verse-content--hover">Denn Gott ist es, der in euch wirkt.</span></span></span>
</article></body></html>"#;

fn translation(code: &str) -> &'static Translation {
    Translation::find(code).expect("Expected known translation")
}

#[tokio::test]
async fn scrapes_bibleserver_passage() {
    let base = serve(&[("/LUT/Johannes3,16-18", BIBLESERVER_HTML)]).await;

    let passage = scrape_passage(
        &client(),
        &local_sites(&base),
        &reference("Johannes 3,16-18"),
        translation("LUT"),
        None,
    )
    .await
    .expect("Expected request")
    .expect("Expected passage");

    assert_that(&passage.source).is_equal_to("ERF Bibleserver");
    assert_that(&passage.url).is_equal_to(format!("{base}/LUT/Johannes3,16-18"));
    assert_that(&passage.testament).is_equal_to(Testament::New);
    assert_that(&passage.verses.map(|verses| verses.len())).is_equal_to(Some(3));
    assert_that(&passage.text.starts_with("Denn also hat Gott die Welt geliebt")).is_true();
}

#[tokio::test]
async fn scrapes_bigs_passage() {
    let base = serve(&[("/bigs/?Roem/5/20-21/", BIGS_HTML)]).await;

    let passage = scrape_passage(
        &client(),
        &local_sites(&base),
        &reference("Römer 5,20-21"),
        translation("BIGS"),
        Some(Testament::New),
    )
    .await
    .expect("Expected request")
    .expect("Expected passage");

    assert_that(&passage.source).is_equal_to("Bibel in gerechter Sprache");
    assert_that(&passage.text).is_equal_to(
        "Das Gesetz aber ist dazwischen gekommen, damit die Übertretung zunehme. \
         Wie die Sünde geherrscht hat, so soll die Gnade herrschen."
            .to_owned(),
    );
}

#[tokio::test]
async fn missing_page_gives_no_passage() {
    let base = serve(&[]).await;

    let passage = scrape_passage(
        &client(),
        &local_sites(&base),
        &reference("Johannes 3,16"),
        translation("ELB"),
        None,
    )
    .await
    .expect("Expected request");

    assert_that(&passage.is_none()).is_true();
}

#[tokio::test]
async fn page_without_requested_verses_gives_no_passage() {
    let base = serve(&[("/LUT/Johannes3,30-31", BIBLESERVER_HTML)]).await;

    let passage = scrape_passage(
        &client(),
        &local_sites(&base),
        &reference("Johannes 3,30-31"),
        translation("LUT"),
        None,
    )
    .await
    .expect("Expected request");

    assert_that(&passage.is_none()).is_true();
}

#[tokio::test]
async fn scrapes_luther_watchword_without_retranslation() {
    let base = serve(&[("/", LOSUNGEN_HTML)]).await;

    let watchword = scrape_watchword(&client(), &local_sites(&base), translation("LUT"))
        .await
        .expect("Expected watchword");

    assert_that(&watchword.losung.text.as_deref())
        .is_equal_to(Some("Des HERRN Wort ist wahrhaftig."));
    assert_that(&watchword.losung.translation_source.as_deref())
        .is_equal_to(Some("Herrnhuter Losungen"));
    assert_that(&watchword.lehrtext.bibleserver_url.is_none()).is_true();
}

#[tokio::test]
async fn retranslates_watchword() {
    let base = serve(&[
        ("/", LOSUNGEN_HTML),
        ("/ELB/Psalm33,4", PSALM_HTML),
        ("/ELB/Philipper2,13", PHILIPPER_HTML),
    ])
    .await;

    let watchword = scrape_watchword(&client(), &local_sites(&base), translation("ELB"))
        .await
        .expect("Expected watchword");

    assert_that(&watchword.losung.text.as_deref())
        .is_equal_to(Some("Denn das Wort des HERRN ist gerade."));
    assert_that(&watchword.losung.translation_source.as_deref())
        .is_equal_to(Some("ERF Bibleserver"));
    assert_that(&watchword.losung.bibleserver_url)
        .is_equal_to(Some(format!("{base}/ELB/Psalm33,4")));
    assert_that(&watchword.lehrtext.text.as_deref())
        .is_equal_to(Some("Denn Gott ist es, der in euch wirkt."));
    assert_that(&watchword.translation.map(|translation| translation.code))
        .is_equal_to(Some("ELB"));
}

#[tokio::test]
async fn watchword_fails_when_site_is_down() {
    let sites = local_sites(&unreachable_url().await);

    assert_that(&scrape_watchword(&client(), &sites, translation("LUT")).await.is_err()).is_true();
}

#[tokio::test]
async fn fetches_pages_and_skips_error_statuses() {
    let base = serve(&[("/seite", "<p>Hallo</p>")]).await;
    let page = Url::parse(&format!("{base}/seite")).expect("Valid URL");
    let missing = Url::parse(&format!("{base}/fehlt")).expect("Valid URL");
    let unreachable = Url::parse(&unreachable_url().await).expect("Valid URL");

    assert_that(&fetch_html(&client(), &page).await.expect("Expected page"))
        .is_equal_to(Some("<p>Hallo</p>".to_owned()));
    assert_that(&fetch_html(&client(), &missing).await.expect("Expected answer"))
        .is_equal_to(None);
    assert_that(&fetch_html(&client(), &unreachable).await.is_err()).is_true();
}

#[tokio::test]
async fn scrapes_exegesis_url_from_event_page() {
    let base = serve(&[(
        "/article.php",
        r#"<a href="/exegese.php?id=7">Exegese zur Auslegung des Predigttextes</a>"#,
    )])
    .await;
    let kirchenjahr = Url::parse("https://kirchenjahr-evangelisch.de/").expect("Valid URL");

    let link = scrape_exegesis_url(&client(), &format!("{base}/article.php#7"), &kirchenjahr)
        .await
        .expect("Expected request");

    assert_that(&link.map(String::from))
        .is_equal_to(Some("https://kirchenjahr-evangelisch.de/exegese.php?id=7".to_owned()));
    assert_that(&scrape_exegesis_url(&client(), "kein link", &kirchenjahr).await.is_err())
        .is_true();
}
