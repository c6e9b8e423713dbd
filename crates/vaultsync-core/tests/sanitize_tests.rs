//! Sanitizer laws and the disallowed-character table

use proptest::prelude::*;
use rstest::rstest;
use vaultsync_core::Error;
use vaultsync_core::sanitize::{MAX_LENGTH, sanitize_key, sanitize_name};

#[rstest]
fn disallowed_character_collapses_to_single_separator(
    #[values(
        '/', '\\', ':', ';', ',', '(', ')', '[', ']', '{', '}', '\'', '"', '`', '~', '!', '@',
        '#', '$', '%', '^', '&', '*', '+', '=', '|', '<', '>', '?'
    )]
    c: char,
) {
    let input = format!("a{c}b");
    assert_eq!(sanitize_name(input.as_str()).unwrap(), "a-b");
    assert_eq!(sanitize_key(input.as_str()).unwrap(), "a_b");

    let doubled = format!("a{c}{c}b");
    assert_eq!(sanitize_name(doubled.as_str()).unwrap(), "a-b");
    assert_eq!(sanitize_key(doubled.as_str()).unwrap(), "a_b");
}

#[rstest]
#[case("")]
#[case("   ")]
#[case("---")]
fn sanitize_name_degenerate_inputs_fail(#[case] input: &str) {
    assert!(matches!(
        sanitize_name(input),
        Err(Error::InvalidArgument { .. })
    ));
}

#[test]
fn sanitize_name_null_fails() {
    assert!(matches!(
        sanitize_name(None::<&str>),
        Err(Error::InvalidArgument { .. })
    ));
}

#[test]
fn key_preserves_case_name_lowers_it() {
    assert_eq!(sanitize_key("MyKey").unwrap(), "MyKey");
    assert_eq!(sanitize_name("MyKey").unwrap(), "mykey");
}

proptest! {
    #[test]
    fn sanitize_name_is_idempotent(s in "\\PC{0,300}") {
        if let Ok(once) = sanitize_name(s.as_str()) {
            let twice = sanitize_name(once.as_str()).unwrap();
            prop_assert_eq!(&once, &twice);
            prop_assert!(once.len() <= MAX_LENGTH);
            prop_assert!(once
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.'));
            prop_assert!(!once.starts_with('-') && !once.ends_with('-'));
            prop_assert!(!once.contains("--"));
        }
    }

    #[test]
    fn sanitize_key_is_idempotent(s in "\\PC{0,300}") {
        if let Ok(once) = sanitize_key(s.as_str()) {
            let twice = sanitize_key(once.as_str()).unwrap();
            prop_assert_eq!(&once, &twice);
            prop_assert!(once
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')));
        }
    }

    #[test]
    fn valid_names_pass_through_unchanged(s in "[a-z0-9]{1,10}(-[a-z0-9]{1,10}){0,4}") {
        prop_assert_eq!(sanitize_name(s.as_str()).unwrap(), s);
    }
}
