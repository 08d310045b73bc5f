use rstest::rstest;

use voxbridge::domain::{LanguageCode, LanguageCodeError, LanguagePair};

#[rstest]
#[case("en", "en")]
#[case("ES", "es")]
#[case(" fr ", "fr")]
#[case("yue", "yue")]
fn given_iso_shaped_code_when_parsing_then_normalized(#[case] raw: &str, #[case] expected: &str) {
    assert_eq!(LanguageCode::parse(raw).unwrap().as_str(), expected);
}

#[rstest]
#[case("e")]
#[case("engl")]
#[case("e1")]
#[case("en-US")]
fn given_malformed_code_when_parsing_then_rejected(#[case] raw: &str) {
    assert!(matches!(
        LanguageCode::parse(raw),
        Err(LanguageCodeError::Malformed(_))
    ));
}

#[test]
fn given_blank_code_when_parsing_then_empty_error() {
    assert_eq!(LanguageCode::parse("  "), Err(LanguageCodeError::Empty));
}

#[rstest]
#[case("en-es")]
#[case("en:es")]
fn given_pair_notation_when_parsing_then_direction_kept(#[case] raw: &str) {
    let pair = LanguagePair::parse(raw).unwrap();
    assert_eq!(pair.source.as_str(), "en");
    assert_eq!(pair.target.as_str(), "es");
    assert_eq!(pair.to_string(), "en-es");
}

#[test]
fn given_pair_without_separator_when_parsing_then_rejected() {
    assert!(LanguagePair::parse("enes").is_err());
}

#[test]
fn given_code_when_serializing_then_plain_string() {
    let code = LanguageCode::parse("de").unwrap();
    assert_eq!(serde_json::to_string(&code).unwrap(), "\"de\"");

    let parsed: LanguageCode = serde_json::from_str("\"DE\"").unwrap();
    assert_eq!(parsed, code);
    assert!(serde_json::from_str::<LanguageCode>("\"german\"").is_err());
}
