use kirchenjahr::bible::{
    Language, Testament, Translation, VerseReference, bibleserver_link, bibleserver_url, bigs_url,
    clean_verse_text, transliterate,
};
use kirchenjahr::constants::{BIBLESERVER_BASE_URL, BIGS_BASE_URL};
use spectral::{assert_that, boolean::BooleanAssertions};

mod bible_extras;

assert_references![
    single_verse:
        reference => "Johannes 3,16",
        parsed => ("Johannes", 3, 16, 16, Vec::<u32>::new()),
    verse_range:
        reference => "Römer 5,20-21",
        parsed => ("Römer", 5, 20, 21, Vec::<u32>::new()),
    en_dash_range:
        reference => "Johannes 6,30–35",
        parsed => ("Johannes", 6, 30, 35, Vec::<u32>::new()),
    numbered_book:
        reference => "1. Korinther 13,4 - 8",
        parsed => ("1. Korinther", 13, 4, 8, Vec::<u32>::new()),
    letter_suffixes:
        reference => "Lukas 2,15a-20b",
        parsed => ("Lukas", 2, 15, 20, Vec::<u32>::new()),
    optional_verses:
        reference => "Jesaja 40,1-3(4-6)",
        parsed => ("Jesaja", 40, 1, 3, vec![4, 5, 6]),
    optional_single_verse:
        reference => "Markus 1,9-11(12)",
        parsed => ("Markus", 1, 9, 11, vec![12]),
];

#[test]
fn rejects_references_without_verse() {
    assert_that(&VerseReference::parse("Psalm 23").is_none()).is_true();
    assert_that(&VerseReference::parse("").is_none()).is_true();
}

#[test]
fn optional_verses_are_reported() {
    let reference = VerseReference::parse("Jesaja 40,1-3(4-6)").expect("Expected reference");

    assert_that(&reference.is_optional(5)).is_true();
    assert_that(&reference.is_optional(2)).is_false();
    assert_that(&reference.canonical()).is_equal_to("Jesaja 40,1-3".to_owned());
}

#[test]
fn classifies_testaments() {
    assert_that(&Testament::of_book("Johannes")).is_equal_to(Testament::New);
    assert_that(&Testament::of_book("1. Korinther")).is_equal_to(Testament::New);
    assert_that(&Testament::of_book("Jesaja")).is_equal_to(Testament::Old);
    assert_that(&"nt".parse::<Testament>()).is_equal_to(Ok(Testament::New));
    assert_that(&"OT".parse::<Testament>()).is_equal_to(Ok(Testament::Old));
    assert_that(&"XT".parse::<Testament>().is_err()).is_true();
    assert_that(&Testament::Old.to_string()).is_equal_to("AT".to_owned());
}

#[test]
fn finds_translations() {
    let luther = Translation::find("LUT").expect("Expected Luther translation");

    assert_that(&luther.language).is_equal_to(Language::German);
    assert_that(&luther.on_bibleserver).is_true();
    assert_that(&Translation::find("BIGS").map(Translation::is_bigs)).is_equal_to(Some(true));
    assert_that(&Translation::find("lut").is_none()).is_true();
}

#[test]
fn transliterates_umlauts() {
    assert_that(&transliterate("Römer Könige Straße"))
        .is_equal_to("Roemer Koenige Strasse".to_owned());
}

#[test]
fn builds_bibleserver_urls() {
    let reference = VerseReference::parse("1. Könige 17,1–16").expect("Expected reference");

    let url = bibleserver_url(BIBLESERVER_BASE_URL, &reference, "ELB").expect("Expected URL");

    assert_that(&url.as_str()).is_equal_to("https://www.bibleserver.com/ELB/1.Koenige17,1-16");
    assert_that(
        &bibleserver_url("http://localhost:8080/", &reference, "LUT")
            .map(String::from)
            .ok(),
    )
    .is_equal_to(Some("http://localhost:8080/LUT/1.Koenige17,1-16".to_owned()));
}

#[test]
fn builds_bibleserver_links_for_hosted_translations() {
    assert_that(&bibleserver_link("Römer 5,20-21", "LUT").map(|url| url.to_string()))
        .is_equal_to(Some("https://www.bibleserver.com/LUT/Roemer5,20-21".to_owned()));
    assert_that(&bibleserver_link("2. Mose 3,14", "NIV").map(|url| url.to_string()))
        .is_equal_to(Some("https://www.bibleserver.com/NIV/2.Mose3,14".to_owned()));
    assert_that(&bibleserver_link("Römer 5,20-21", "BIGS").is_none()).is_true();
    assert_that(&bibleserver_link("Römer 5,20-21", "XYZ").is_none()).is_true();
    assert_that(&bibleserver_link("Psalm 23", "LUT").is_none()).is_true();
}

#[test]
fn builds_bigs_urls() {
    let single = VerseReference::parse("Johannes 3,16").expect("Expected reference");
    let range = VerseReference::parse("Römer 5,20-21").expect("Expected reference");

    assert_that(&bigs_url(BIGS_BASE_URL, &single).expect("Expected URL").as_str())
        .is_equal_to("https://www.bibel-in-gerechter-sprache.de/die-bibel/bigs-online/?Joh/3/16/");
    assert_that(&bigs_url(BIGS_BASE_URL, &range).expect("Expected URL").as_str())
        .is_equal_to("https://www.bibel-in-gerechter-sprache.de/die-bibel/bigs-online/?Roem/5/20-21/");
}

#[test]
fn cleans_verse_text() {
    assert_that(&clean_verse_text("  Gott° sprach [[Anm.]] {Gen}  zu ⟨ihm⟩:\n Es werde Licht [1] "))
        .is_equal_to("Gott sprach zu : Es werde Licht".to_owned());
}
