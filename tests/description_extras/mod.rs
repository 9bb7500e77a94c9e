#[macro_export]
macro_rules! assert_fields {
    (
        $(
            $test_name:ident : description => $description:expr, fields => $fields:expr
        ),+ $(,)?
    ) => {
        $(
            #[test]
            fn $test_name() {
                let fields = kirchenjahr::description::parse_description($description);
                let result = serde_json::to_value(&fields)
                    .expect("Expected serializable fields.");

                assert_that(&result).is_equal_to($fields);
            }
        )+
    }
}

/// Joins description lines with the ICS `\n` escape, as they appear in a
/// calendar export.
pub(crate) fn escaped(lines: &[&str]) -> String {
    lines.join("\\n")
}
