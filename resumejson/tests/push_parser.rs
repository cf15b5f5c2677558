// SPDX-License-Identifier: Apache-2.0

//! End-to-end behaviour of PushParser on typed targets.

use resumejson::{
    from_slice, from_str, record, to_string, ErrorKind, Json, ParseError, ParserState, PushParser,
    ValueRef, Variant,
};
use test_log::test;

record! {
    #[derive(Debug, PartialEq)]
    struct Single {
        a: i64,
    }
}

record! {
    #[derive(Debug)]
    struct Wide {
        int_: i64,
    }
}

#[test]
fn test_whitespace_around_object() {
    let mut parser = PushParser::<Single>::new();
    parser.feed(b"  {  \"a\"  :  1  }  ").unwrap();
    assert_eq!(parser.state(), ParserState::Finished);
    let value = parser.finish().unwrap();
    assert_eq!(value.a, 1);
    assert_eq!(to_string(&value).unwrap(), r#"{"a":1}"#);
}

#[test]
fn test_array_one_byte_at_a_time() {
    let mut parser = PushParser::<Vec<i64>>::new();
    for byte in b"[1,2,3]" {
        parser.feed(core::slice::from_ref(byte)).unwrap();
    }
    let value = parser.finish().unwrap();
    assert_eq!(value.len(), 3);
    assert_eq!(value, vec![1, 2, 3]);
}

#[test]
fn test_unicode_escape_to_utf8() {
    let value: String = from_str(r#""\u00e9""#).unwrap();
    assert_eq!(value.as_bytes(), &[0xc3, 0xa9]);
}

#[test]
fn test_signed_overflow() {
    let err = from_str::<Wide>(r#"{"int_":9223372036854775808}"#).unwrap_err();
    assert_eq!(err, ParseError::NumericOverflow);
    assert_eq!(err.kind(), ErrorKind::Overflow);

    let value: Wide = from_str(r#"{"int_":9223372036854775807}"#).unwrap();
    assert_eq!(value.int_, i64::MAX);
}

#[test]
fn test_path_resolution() {
    let doc: Variant = from_str(r#"{"a":{"b":true}}"#).unwrap();
    let root = ValueRef::new(&doc);
    assert_eq!(root.resolve_path("/a/b").and_then(|v| v.as_bool()), Some(true));
    assert!(root.resolve_path("/a/z").is_none());
}

#[test]
fn test_destroy_incomplete_object() {
    let mut parser = PushParser::<Variant>::new();
    parser.feed(br#"{"a":"#).unwrap();
    assert_eq!(parser.state(), ParserState::Paused);
    parser.destroy();

    let mut parser = PushParser::<Single>::new();
    parser.feed(br#"{"a":"#).unwrap();
    drop(parser);
}

#[test]
fn test_root_scalars() {
    assert_eq!(from_str::<i32>(" 17 "), Ok(17));
    assert_eq!(from_str::<bool>("false"), Ok(false));
    assert_eq!(from_str::<String>(r#""x""#), Ok("x".to_string()));
    assert_eq!(from_str::<Variant>("null"), Ok(Variant::Null));

    let mut parser = PushParser::<i32>::new();
    parser.feed(b"12").unwrap();
    parser.feed(b"34").unwrap();
    assert_eq!(parser.state(), ParserState::Paused);
    assert_eq!(parser.finish(), Ok(1234));
}

#[test]
fn test_type_mismatch_kinds() {
    let err = from_str::<Vec<i32>>(r#"{"a":1}"#).unwrap_err();
    assert!(matches!(err, ParseError::TypeMismatch { offset: 0, .. }));
    assert_eq!(err.kind(), ErrorKind::Syntax);

    let err = from_str::<Vec<i32>>("[1.5]").unwrap_err();
    assert_eq!(err, ParseError::FloatNotAllowed);
    assert_eq!(err.kind(), ErrorKind::Syntax);

    let err = from_str::<Single>(r#"{"b":1}"#).unwrap_err();
    assert_eq!(err, ParseError::UnknownMember("b".into()));
    assert_eq!(err.kind(), ErrorKind::Syntax);
}

#[test]
fn test_empty_document() {
    assert_eq!(from_str::<Variant>(""), Err(ParseError::EndOfData));
    assert_eq!(from_str::<Variant>("   "), Err(ParseError::EndOfData));
}

#[test]
fn test_finalize_is_idempotent() {
    let mut doc: Variant = from_str(r#"{"a":[1,"two",{"three":null}]}"#).unwrap();
    doc.finalize();
    assert_eq!(doc, Variant::Unset);
    doc.finalize();
    assert_eq!(doc, Variant::Unset);

    let mut single: Single = from_str(r#"{"a":4}"#).unwrap();
    single.finalize();
    single.finalize();
    assert_eq!(single, Single::default());
}

fn nested(depth: usize, open: &[u8], leaf: &[u8], close: &[u8]) -> Vec<u8> {
    let mut doc = Vec::with_capacity(depth * (open.len() + close.len()) + leaf.len());
    for _ in 0..depth {
        doc.extend_from_slice(open);
    }
    doc.extend_from_slice(leaf);
    for _ in 0..depth {
        doc.extend_from_slice(close);
    }
    doc
}

#[test]
fn test_deep_document_parses_and_drops() {
    let doc = nested(200_000, b"[", b"", b"]");
    let value: Variant = from_slice(&doc).unwrap();
    let mut depth = 0;
    let mut current = &value;
    while let Some(items) = current.as_array() {
        depth += 1;
        match items.first() {
            Some(inner) => current = inner,
            None => break,
        }
    }
    assert_eq!(depth, 200_000);
    drop(value);

    let doc = nested(200_000, br#"{"k":"#, b"null", b"}");
    let mut value: Variant = from_slice(&doc).unwrap();
    assert!(value.as_object().is_some());
    value.finalize();
    assert!(value.is_unset());
}

#[test]
fn test_deep_document_abandoned_midway() {
    let doc = nested(200_000, b"[", b"", b"]");
    let mut parser = PushParser::<Variant>::new();
    parser.feed(&doc[..doc.len() - 10]).unwrap();
    parser.destroy();

    let err = from_slice::<Variant>(&doc[..doc.len() - 1]).unwrap_err();
    assert_eq!(err, ParseError::EndOfData);
}
