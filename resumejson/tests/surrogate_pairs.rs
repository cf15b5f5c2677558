// SPDX-License-Identifier: Apache-2.0

//! UTF-16 surrogate pairs in `\u` escapes
//!
//! A high surrogate followed directly by a low surrogate escape decodes to
//! one supplementary-plane character. Either half on its own is rejected.
//! Every case is checked with the escape split at each byte.

use resumejson::{from_str, to_string, ParseError, PushParser, Variant};
use test_log::test;

fn parse_split_everywhere(doc: &str) -> Result<String, ParseError> {
    let whole = from_str::<String>(doc);
    let data = doc.as_bytes();
    for cut in 0..=data.len() {
        let mut parser = PushParser::<String>::new();
        let split = parser
            .feed(&data[..cut])
            .and_then(|()| parser.feed(&data[cut..]))
            .and_then(|()| parser.finish());
        assert_eq!(
            split.is_ok(),
            whole.is_ok(),
            "split at {cut} disagrees on {doc:?}: {split:?} vs {whole:?}"
        );
        if let (Ok(split), Ok(whole)) = (&split, &whole) {
            assert_eq!(split, whole, "split at {cut}");
        }
    }
    whole
}

#[test]
fn test_musical_symbol() {
    assert_eq!(parse_split_everywhere(r#""\uD834\uDD1E""#).unwrap(), "\u{1D11E}");
}

#[test]
fn test_emoji_among_text() {
    assert_eq!(
        parse_split_everywhere(r#""Hello \uD83D\uDE00 World""#).unwrap(),
        "Hello \u{1F600} World"
    );
}

#[test]
fn test_consecutive_pairs() {
    assert_eq!(
        parse_split_everywhere(r#""\uD83D\uDE00\uD83D\uDE01""#).unwrap(),
        "\u{1F600}\u{1F601}"
    );
}

#[test]
fn test_lowercase_hex() {
    assert_eq!(parse_split_everywhere(r#""\ud834\udd1e""#).unwrap(), "\u{1D11E}");
}

#[test]
fn test_boundary_codepoints() {
    assert_eq!(parse_split_everywhere(r#""\uD800\uDC00""#).unwrap(), "\u{10000}");
    assert_eq!(parse_split_everywhere(r#""\uDBFF\uDFFF""#).unwrap(), "\u{10FFFF}");
}

#[test]
fn test_lone_high_surrogate() {
    for doc in [
        r#""\uD834""#,
        r#""\uD834x""#,
        r#""\uD834\n""#,
        r#""\uD834A""#,
        r#""\uD834\uD834""#,
    ] {
        assert_eq!(
            parse_split_everywhere(doc),
            Err(ParseError::InvalidUnicodeCodepoint),
            "{doc}"
        );
    }
}

#[test]
fn test_lone_low_surrogate() {
    assert_eq!(
        parse_split_everywhere(r#""\uDD1E""#),
        Err(ParseError::InvalidUnicodeCodepoint)
    );
    assert_eq!(
        parse_split_everywhere(r#""a\uDD1E\uD834""#),
        Err(ParseError::InvalidUnicodeCodepoint)
    );
}

#[test]
fn test_pairs_in_member_names() {
    let doc: Variant = from_str(r#"{"\uD83D\uDE00":"\uD834\uDD1E"}"#).unwrap();
    let map = doc.as_object().unwrap();
    assert_eq!(map.get("\u{1F600}").and_then(Variant::as_str), Some("\u{1D11E}"));
}

#[test]
fn test_supplementary_characters_generate_raw() {
    let text = String::from("\u{1F600}");
    assert_eq!(to_string(&text).unwrap(), "\"\u{1F600}\"");
}
