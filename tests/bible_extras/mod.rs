#[macro_export]
macro_rules! assert_references {
    (
        $(
            $test_name:ident : reference => $reference:expr, parsed => ($book:expr, $chapter:expr, $start:expr, $end:expr, $optional:expr)
        ),+ $(,)?
    ) => {
        $(
            #[test]
            fn $test_name() {
                let reference = kirchenjahr::bible::VerseReference::parse($reference)
                    .expect("Expected a parsed reference.");

                assert_that(&reference.book.as_str()).is_equal_to($book);
                assert_that(&reference.chapter).is_equal_to($chapter);
                assert_that(&reference.start_verse).is_equal_to($start);
                assert_that(&reference.end_verse).is_equal_to($end);
                assert_that(&reference.optional_verses).is_equal_to($optional);
                assert_that(&reference.original.as_str()).is_equal_to($reference);
            }
        )+
    }
}
