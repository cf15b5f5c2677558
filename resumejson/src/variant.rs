// SPDX-License-Identifier: Apache-2.0

//! A value whose JSON type is decided by the document.

use core::any::Any;

use crate::continuation::{Scratch, Step};
use crate::frame::{deliver_into, GenFrame, ParseFrame};
use crate::input_cursor::InputCursor;
use crate::json_number::Number;
use crate::literal::{LiteralGen, Null};
use crate::metadata::{Json, JsonType, Metadata};
use crate::object::Map;
use crate::parse_error::{GenerateError, ParseError, UnexpectedState};
use crate::value::{Members, ValueRef};

/// Any JSON value.
///
/// A freshly created variant is [`Unset`](Variant::Unset): it holds nothing
/// and cannot be written out.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Variant {
    #[default]
    Unset,
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<Variant>),
    Object(Map),
}

impl Variant {
    pub fn is_unset(&self) -> bool {
        matches!(self, Variant::Unset)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Variant::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<Number> {
        match self {
            Variant::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Variant::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Variant]> {
        match self {
            Variant::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Map> {
        match self {
            Variant::Object(map) => Some(map),
            _ => None,
        }
    }

    /// The held value as a view, or `None` while unset.
    pub fn view(&self) -> Option<ValueRef<'_>> {
        Some(match self {
            Variant::Unset => return None,
            Variant::Null => ValueRef::new(&Null),
            Variant::Bool(b) => ValueRef::new(b),
            Variant::Number(n) => ValueRef::new(n),
            Variant::String(s) => ValueRef::new(s),
            Variant::Array(items) => ValueRef::new(items),
            Variant::Object(map) => ValueRef::new(map),
        })
    }
}

impl Variant {
    /// Moves the children of an array or object onto `pending`, leaving it empty.
    fn detach_children(&mut self, pending: &mut Vec<Variant>) {
        match self {
            Variant::Array(items) => pending.append(items),
            Variant::Object(map) => pending.extend(map.drain_values()),
            _ => {}
        }
    }
}

// Releases nested arrays and objects through a work list, not one host
// stack frame per level.
impl Drop for Variant {
    fn drop(&mut self) {
        if !matches!(self, Variant::Array(_) | Variant::Object(_)) {
            return;
        }
        let mut pending = Vec::new();
        self.detach_children(&mut pending);
        while let Some(mut child) = pending.pop() {
            child.detach_children(&mut pending);
        }
    }
}

macro_rules! variant_from {
    ($($source:ty => $arm:ident),* $(,)?) => {
        $(
            impl From<$source> for Variant {
                fn from(value: $source) -> Self {
                    Variant::$arm(value.into())
                }
            }
        )*
    };
}

variant_from!(
    bool => Bool,
    i32 => Number,
    i64 => Number,
    u64 => Number,
    Number => Number,
    String => String,
    &str => String,
    Vec<Variant> => Array,
    Map => Object,
);

#[cfg(feature = "float")]
variant_from!(f64 => Number);

impl From<Null> for Variant {
    fn from(_: Null) -> Self {
        Variant::Null
    }
}

/// Payload under construction, tagged by the type chosen from the first byte.
enum Payload {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<Variant>),
    Object(Map),
}

/// Looks at the first significant byte and parses the value with the
/// matching type's frame.
pub struct VariantFrame {
    payload: Option<Payload>,
}

impl VariantFrame {
    pub fn new() -> Self {
        Self { payload: None }
    }
}

impl Default for VariantFrame {
    fn default() -> Self {
        Self::new()
    }
}

fn dispatch(byte: u8) -> Option<(Payload, &'static Metadata)> {
    Some(match byte {
        b'"' => (Payload::String(String::new()), String::metadata()),
        b'{' => (Payload::Object(Map::default()), Map::metadata()),
        b'[' => (Payload::Array(Vec::new()), Vec::<Variant>::metadata()),
        b'-' | b'0'..=b'9' => (Payload::Number(Number::default()), Number::metadata()),
        b't' | b'f' => (Payload::Bool(false), bool::metadata()),
        b'n' => (Payload::Null, Null::metadata()),
        _ => return None,
    })
}

impl ParseFrame for VariantFrame {
    fn resume(
        &mut self,
        input: &mut InputCursor<'_>,
        _scratch: &mut Scratch,
    ) -> Result<Step<dyn ParseFrame>, ParseError> {
        if self.payload.is_some() {
            return Ok(Step::Complete);
        }
        let Some(byte) = input.significant()? else {
            return Ok(Step::Pause);
        };
        let (payload, meta) = dispatch(byte).ok_or_else(|| input.unexpected(byte))?;
        self.payload = Some(payload);
        Ok(Step::Call((meta.parse)()))
    }

    fn accept(&mut self, child: Box<dyn ParseFrame>) -> Result<(), ParseError> {
        match &mut self.payload {
            Some(Payload::Null) => child.deliver(&mut Null),
            Some(Payload::Bool(b)) => child.deliver(b),
            Some(Payload::Number(n)) => child.deliver(n),
            Some(Payload::String(s)) => child.deliver(s),
            Some(Payload::Array(items)) => child.deliver(items),
            Some(Payload::Object(map)) => child.deliver(map),
            None => {
                drop(child);
                Err(UnexpectedState::StrayChild.into())
            }
        }
    }

    fn deliver(self: Box<Self>, slot: &mut dyn Any) -> Result<(), ParseError> {
        let value = match self.payload {
            Some(Payload::Null) => Variant::Null,
            Some(Payload::Bool(b)) => Variant::Bool(b),
            Some(Payload::Number(n)) => Variant::Number(n),
            Some(Payload::String(s)) => Variant::String(s),
            Some(Payload::Array(items)) => Variant::Array(items),
            Some(Payload::Object(map)) => Variant::Object(map),
            None => return Err(UnexpectedState::ResumedAfterCompletion.into()),
        };
        deliver_into(slot, value)
    }
}

impl Json for Variant {
    const JSON_TYPE: JsonType = JsonType::Variant;

    fn parse_frame() -> Box<dyn ParseFrame> {
        Box::new(VariantFrame::new())
    }

    fn generate_frame(&self) -> Result<GenFrame<'_>, GenerateError> {
        match self {
            Variant::Unset => Err(GenerateError::UnsetVariant),
            Variant::Null => Ok(Box::new(LiteralGen::new(b"null"))),
            Variant::Bool(b) => b.generate_frame(),
            Variant::Number(n) => n.generate_frame(),
            Variant::String(s) => s.generate_frame(),
            Variant::Array(items) => items.generate_frame(),
            Variant::Object(map) => map.generate_frame(),
        }
    }

    /// Releases the held value and returns to [`Variant::Unset`]. Nested
    /// arrays and objects are released without recursion.
    fn finalize(&mut self) {
        *self = Variant::Unset;
    }

    fn member(&self, name: &str) -> Option<ValueRef<'_>> {
        match self {
            Variant::Array(items) => items.member(name),
            Variant::Object(map) => map.member(name),
            _ => None,
        }
    }

    fn members(&self) -> Members<'_> {
        match self {
            Variant::Array(items) => items.members(),
            Variant::Object(map) => map.members(),
            _ => Members::empty(),
        }
    }

    fn member_count(&self) -> usize {
        match self {
            Variant::Array(items) => items.len(),
            Variant::Object(map) => map.len(),
            _ => 0,
        }
    }

    fn to_number(&self) -> Option<Number> {
        self.as_number()
    }

    fn concrete(&self) -> Option<ValueRef<'_>> {
        self.view()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{from_str, to_string, GenerateError, PushParser};
    use test_log::test;

    #[test]
    fn test_dispatch_on_first_byte() {
        assert_eq!(from_str::<Variant>("null"), Ok(Variant::Null));
        assert_eq!(from_str::<Variant>(" true"), Ok(Variant::Bool(true)));
        assert_eq!(
            from_str::<Variant>("-12"),
            Ok(Variant::Number(Number::Int(-12)))
        );
        assert_eq!(
            from_str::<Variant>(r#""hi""#),
            Ok(Variant::String("hi".into()))
        );
        assert!(matches!(
            from_str::<Variant>("?"),
            Err(ParseError::UnexpectedByte { byte: b'?', offset: 0 })
        ));
    }

    #[test]
    fn test_nested_document() {
        let doc: Variant = from_str(r#"{"a":[1,"two",{"b":null}],"c":false}"#).unwrap();
        let object = doc.as_object().unwrap();
        assert_eq!(object.len(), 2);
        let items = object.get("a").and_then(Variant::as_array).unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[1].as_str(), Some("two"));
        assert_eq!(
            items[2].as_object().and_then(|m| m.get("b")),
            Some(&Variant::Null)
        );
        assert_eq!(object.get("c").and_then(Variant::as_bool), Some(false));
    }

    #[test]
    fn test_variant_split_everywhere() {
        let doc = br#"[{"k":"v"},12.5e1,true,null,"x"]"#;
        let expected: Variant = from_str(core::str::from_utf8(doc).unwrap()).unwrap();
        for split in 0..=doc.len() {
            let mut parser = PushParser::<Variant>::new();
            parser.feed(&doc[..split]).unwrap();
            parser.feed(&doc[split..]).unwrap();
            assert_eq!(parser.finish().unwrap(), expected, "split at {split}");
        }
    }

    #[test]
    fn test_generate_unset_fails() {
        assert_eq!(to_string(&Variant::Unset), Err(GenerateError::UnsetVariant));
        let items = Variant::Array(vec![Variant::Bool(true), Variant::Unset]);
        assert_eq!(to_string(&items), Err(GenerateError::UnsetVariant));
    }

    #[test]
    fn test_generate_variant() {
        let mut map = Map::new();
        map.insert("n", Variant::from(7));
        map.insert("s", Variant::from("x"));
        map.insert("z", Variant::Null);
        let doc = Variant::Array(vec![Variant::Object(map), Variant::from(false)]);
        assert_eq!(
            to_string(&doc).unwrap(),
            r#"[{"n":7,"s":"x","z":null},false]"#
        );
    }

    fn nested_arrays(depth: usize) -> Variant {
        let mut value = Variant::Array(Vec::new());
        for _ in 1..depth {
            value = Variant::Array(vec![value]);
        }
        value
    }

    #[test]
    fn test_drop_deep_value_built_in_code() {
        let value = nested_arrays(300_000);
        drop(value);

        let mut value = Variant::Null;
        for _ in 0..300_000 {
            let mut map = Map::new();
            map.insert("k", value);
            value = Variant::Object(map);
        }
        drop(value);
    }

    #[test]
    fn test_finalize_deep_value() {
        let mut value = nested_arrays(300_000);
        value.finalize();
        assert!(value.is_unset());
    }

    #[test]
    fn test_finalize_returns_to_unset() {
        let mut doc: Variant = from_str(r#"{"a":["b"]}"#).unwrap();
        doc.finalize();
        assert!(doc.is_unset());
        doc.finalize();
        assert!(doc.is_unset());
    }
}
