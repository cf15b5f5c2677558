// SPDX-License-Identifier: Apache-2.0

//! Objects: records with a fixed member table, and open-ended [`Extras`].

use core::any::Any;
use std::borrow::Cow;

use indexmap::IndexMap;
use log::trace;

use crate::continuation::{Scratch, Step};
use crate::frame::{deliver_into, GenFrame, GenerateFrame, Output, ParseFrame};
use crate::input_cursor::InputCursor;
use crate::json_string::{Scan, StrEmit, StringScanner};
use crate::metadata::{Json, JsonType, Metadata};
use crate::parse_error::{GenerateError, ParseError, UnexpectedState};
use crate::value::{Members, ValueRef};
use crate::variant::Variant;

/// How a record tells whether a member is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// A bit in the record's presence set.
    Bit(usize),
    /// The member value itself knows, as an `Option` does.
    Pointer,
}

impl Presence {
    /// Pointer presence for optional member types, bit `index` otherwise.
    pub const fn of<T: Json>(index: usize) -> Self {
        if T::POINTER_PRESENCE {
            Presence::Pointer
        } else {
            Presence::Bit(index)
        }
    }
}

/// Descriptor of one record member.
pub struct Field<R> {
    /// Member name as it appears in JSON.
    pub name: &'static str,
    /// Table of the member type. Deferred so that recursive records work.
    pub meta: fn() -> &'static Metadata,
    pub presence: Presence,
    pub slot: fn(&mut R) -> &mut dyn Any,
    pub read: fn(&R) -> &dyn Any,
}

impl<R> core::fmt::Debug for Field<R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("presence", &self.presence)
            .finish()
    }
}

/// A JSON object with a fixed set of named members.
///
/// Usually implemented through [`record!`](crate::record).
pub trait Record: Json {
    /// Type of members outside the fixed table. Unused without extras.
    type Extra: Json;

    /// Members in declaration order.
    const FIELDS: &'static [Field<Self>];

    fn presence_bit(&self, _index: usize) -> bool {
        false
    }

    fn set_presence_bit(&mut self, _index: usize, _value: bool) {}

    /// Storage for unknown members. Without it, unknown members are an error.
    fn extras(&self) -> Option<&Extras<Self::Extra>> {
        None
    }

    fn extras_mut(&mut self) -> Option<&mut Extras<Self::Extra>> {
        None
    }

    /// True if the member called `name` is present.
    fn has(&self, name: &str) -> bool {
        match Self::FIELDS.iter().find(|field| field.name == name) {
            Some(field) => field_present(self, field),
            None => self
                .extras()
                .is_some_and(|extras| extras.map.contains_key(name)),
        }
    }

    /// Marks the fixed member `name` as present or absent, returning false
    /// if there is no such member. Optional members track presence by value
    /// and are left alone.
    fn set_present(&mut self, name: &str, present: bool) -> bool {
        match Self::FIELDS.iter().find(|field| field.name == name) {
            Some(field) => {
                if let Presence::Bit(bit) = field.presence {
                    self.set_presence_bit(bit, present);
                }
                true
            }
            None => false,
        }
    }

    /// Marks every fixed member present, so that all of them are written out.
    fn mark_all_present(&mut self) {
        for field in Self::FIELDS {
            if let Presence::Bit(bit) = field.presence {
                self.set_presence_bit(bit, true);
            }
        }
    }
}

fn field_present<R: Record>(value: &R, field: &Field<R>) -> bool {
    match field.presence {
        Presence::Bit(bit) => value.presence_bit(bit),
        Presence::Pointer => ((field.meta)().present)((field.read)(value)),
    }
}

/// Finds a fixed member whose name is `prefix` followed by `suffix`.
fn find_field<R: Record>(prefix: &[u8], suffix: &[u8]) -> Option<usize> {
    let len = prefix.len() + suffix.len();
    R::FIELDS.iter().position(|field| {
        let name = field.name.as_bytes();
        name.len() == len
            && name.get(..prefix.len()) == Some(prefix)
            && name.get(prefix.len()..) == Some(suffix)
    })
}

fn joined_name(prefix: &[u8], suffix: &[u8]) -> Result<String, ParseError> {
    let mut bytes = Vec::new();
    bytes
        .try_reserve(prefix.len() + suffix.len())
        .map_err(|_| ParseError::AllocationFailed)?;
    bytes.extend_from_slice(prefix);
    bytes.extend_from_slice(suffix);
    String::from_utf8(bytes).map_err(|e| ParseError::InvalidUtf8(e.utf8_error()))
}

/// Releases every member through its table, then resets presence.
pub fn finalize<R: Record>(value: &mut R) {
    for field in R::FIELDS {
        (field.meta)().finalize((field.slot)(value));
    }
    if let Some(extras) = value.extras_mut() {
        extras.finalize();
    }
    *value = R::default();
}

pub fn member<'a, R: Record>(value: &'a R, name: &str) -> Option<ValueRef<'a>> {
    match R::FIELDS.iter().find(|field| field.name == name) {
        Some(field) if field_present(value, field) => Some(ValueRef::from_parts(
            (field.read)(value),
            (field.meta)(),
        )),
        Some(_) => None,
        None => value.extras()?.map.get(name).map(ValueRef::new),
    }
}

pub fn members<'a, R: Record>(value: &'a R) -> Members<'a> {
    let fields = R::FIELDS
        .iter()
        .filter(move |field| field_present(value, field))
        .map(move |field| {
            (
                Cow::Borrowed(field.name),
                ValueRef::from_parts((field.read)(value), (field.meta)()),
            )
        });
    let extras = value
        .extras()
        .into_iter()
        .flat_map(|extras| extras.map.iter())
        .map(|(name, item)| (Cow::Borrowed(name.as_str()), ValueRef::new(item)));
    Members::new(fields.chain(extras))
}

pub fn member_count<R: Record>(value: &R) -> usize {
    let fixed = R::FIELDS
        .iter()
        .filter(|field| field_present(value, field))
        .count();
    fixed + value.extras().map_or(0, Extras::len)
}

pub fn parse_frame<R: Record>() -> Box<dyn ParseFrame> {
    Box::new(ObjectFrame::<R>::new())
}

pub fn generate_frame<R: Record>(value: &R) -> Result<GenFrame<'_>, GenerateError> {
    Ok(Box::new(ObjectGen::new(value)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ObjectState {
    /// Expecting `{`.
    Open,
    /// Expecting a member name, or `}` right after `{`.
    Name { first: bool },
    /// Inside a member name.
    InName,
    /// Expecting `:`.
    Colon,
    /// Waiting for the member value.
    Pending,
    /// Expecting `,` or `}`.
    Comma,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Field(usize),
    Extra(usize),
}

/// Resumable parse of a JSON object into a [`Record`].
///
/// Member names are matched against the fixed table first. A name cut by a
/// chunk boundary is collected in scratch and matched in two parts, so
/// names are never copied when they lie inside one chunk.
pub struct ObjectFrame<R> {
    state: ObjectState,
    scanner: StringScanner,
    target: Option<Target>,
    value: R,
}

impl<R: Record> ObjectFrame<R> {
    pub fn new() -> Self {
        Self {
            state: ObjectState::Open,
            scanner: StringScanner::new(),
            target: None,
            value: R::default(),
        }
    }

    fn resolve(&mut self, prefix: &[u8], suffix: &[u8]) -> Result<Target, ParseError> {
        if let Some(index) = find_field::<R>(prefix, suffix) {
            return Ok(Target::Field(index));
        }
        let name = joined_name(prefix, suffix)?;
        match self.value.extras_mut() {
            Some(extras) => {
                let entry = extras.map.entry(name);
                let index = entry.index();
                entry.or_default();
                Ok(Target::Extra(index))
            }
            None => Err(ParseError::UnknownMember(name)),
        }
    }
}

impl<R: Record> Default for ObjectFrame<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Record> ParseFrame for ObjectFrame<R> {
    fn resume(
        &mut self,
        input: &mut InputCursor<'_>,
        scratch: &mut Scratch,
    ) -> Result<Step<dyn ParseFrame>, ParseError> {
        loop {
            if self.state == ObjectState::InName {
                let Scan::Done { tail } = self.scanner.scan(input, scratch)? else {
                    return Ok(Step::Pause);
                };
                let target = self.resolve(scratch.as_slice(), tail);
                scratch.clear();
                self.target = Some(target?);
                self.state = ObjectState::Colon;
                continue;
            }
            let Some(byte) = input.significant()? else {
                return Ok(Step::Pause);
            };
            match self.state {
                ObjectState::Open => {
                    if byte != b'{' {
                        return Err(ParseError::TypeMismatch {
                            expected: JsonType::Object,
                            offset: input.offset(),
                        });
                    }
                    input.bump();
                    self.state = ObjectState::Name { first: true };
                }
                ObjectState::Name { first } => match byte {
                    b'"' => {
                        input.bump();
                        self.scanner = StringScanner::new();
                        self.state = ObjectState::InName;
                    }
                    b'}' if first => {
                        input.bump();
                        return Ok(Step::Complete);
                    }
                    _ => return Err(input.unexpected(byte)),
                },
                ObjectState::Colon => {
                    if byte != b':' {
                        return Err(input.unexpected(byte));
                    }
                    input.bump();
                    let meta = match self.target {
                        Some(Target::Field(index)) => R::FIELDS
                            .get(index)
                            .map(|field| (field.meta)())
                            .ok_or(UnexpectedState::SlotTypeMismatch)?,
                        Some(Target::Extra(_)) => R::Extra::metadata(),
                        None => return Err(UnexpectedState::ResumedAfterCompletion.into()),
                    };
                    self.state = ObjectState::Pending;
                    return Ok(Step::Call((meta.parse)()));
                }
                ObjectState::Comma => {
                    input.bump();
                    match byte {
                        b',' => self.state = ObjectState::Name { first: false },
                        b'}' => return Ok(Step::Complete),
                        _ => {
                            return Err(ParseError::UnexpectedByte {
                                byte,
                                offset: input.offset() - 1,
                            })
                        }
                    }
                }
                ObjectState::InName | ObjectState::Pending => {
                    return Err(UnexpectedState::ResumedAfterCompletion.into());
                }
            }
        }
    }

    fn accept(&mut self, child: Box<dyn ParseFrame>) -> Result<(), ParseError> {
        match self.target.take() {
            Some(Target::Field(index)) => {
                let field = R::FIELDS
                    .get(index)
                    .ok_or(UnexpectedState::SlotTypeMismatch)?;
                child.deliver((field.slot)(&mut self.value))?;
                if let Presence::Bit(bit) = field.presence {
                    self.value.set_presence_bit(bit, true);
                }
                trace!("member {} set", field.name);
            }
            Some(Target::Extra(index)) => {
                let (_, slot) = self
                    .value
                    .extras_mut()
                    .and_then(|extras| extras.map.get_index_mut(index))
                    .ok_or(UnexpectedState::SlotTypeMismatch)?;
                child.deliver(slot)?;
            }
            None => return Err(UnexpectedState::StrayChild.into()),
        }
        self.state = ObjectState::Comma;
        Ok(())
    }

    fn deliver(self: Box<Self>, slot: &mut dyn Any) -> Result<(), ParseError> {
        deliver_into(slot, self.value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ObjectGenState {
    Open,
    Next,
    Name,
    Colon,
    Close,
}

/// Writes present members in declaration order, then the extras.
pub struct ObjectGen<'a, R: Record> {
    value: &'a R,
    state: ObjectGenState,
    next_field: usize,
    next_extra: usize,
    wrote_member: bool,
    name: &'a str,
    emit: StrEmit,
    pending: Option<(&'a dyn Any, &'static Metadata)>,
}

impl<'a, R: Record> ObjectGen<'a, R> {
    pub fn new(value: &'a R) -> Self {
        Self {
            value,
            state: ObjectGenState::Open,
            next_field: 0,
            next_extra: 0,
            wrote_member: false,
            name: "",
            emit: StrEmit::new(),
            pending: None,
        }
    }

    /// Picks the next member to write, if any remain.
    fn advance(&mut self) -> bool {
        while let Some(field) = R::FIELDS.get(self.next_field) {
            self.next_field += 1;
            if field_present(self.value, field) {
                self.name = field.name;
                self.pending = Some(((field.read)(self.value), (field.meta)()));
                return true;
            }
        }
        let Some((name, item)) = self
            .value
            .extras()
            .and_then(|extras| extras.map.get_index(self.next_extra))
        else {
            return false;
        };
        self.next_extra += 1;
        self.name = name.as_str();
        self.pending = Some((item as &dyn Any, R::Extra::metadata()));
        true
    }
}

impl<'a, R: Record> GenerateFrame<'a> for ObjectGen<'a, R> {
    fn resume(
        &mut self,
        out: &mut Output<'_>,
    ) -> Result<Step<dyn GenerateFrame<'a> + 'a>, GenerateError> {
        loop {
            if out.is_full() {
                return Ok(Step::Pause);
            }
            match self.state {
                ObjectGenState::Open => {
                    out.token(b"{")?;
                    self.state = ObjectGenState::Next;
                }
                ObjectGenState::Next => {
                    if !self.advance() {
                        self.state = ObjectGenState::Close;
                        continue;
                    }
                    if self.wrote_member {
                        out.token(b",")?;
                    }
                    self.emit = StrEmit::new();
                    self.state = ObjectGenState::Name;
                }
                ObjectGenState::Name => {
                    if !self.emit.emit(self.name.as_bytes(), out)? {
                        return Ok(Step::Pause);
                    }
                    self.state = ObjectGenState::Colon;
                }
                ObjectGenState::Colon => {
                    out.token(b":")?;
                    self.wrote_member = true;
                    self.state = ObjectGenState::Next;
                    let (item, meta) = self
                        .pending
                        .take()
                        .ok_or(UnexpectedState::ResumedAfterCompletion)?;
                    return Ok(Step::Call((meta.generate)(item)?));
                }
                ObjectGenState::Close => {
                    out.token(b"}")?;
                    return Ok(Step::Complete);
                }
            }
        }
    }
}

/// Insertion-ordered members with names outside a record's fixed table.
///
/// On its own it is a free-form object; [`Map`] holds values of any type.
/// A repeated name keeps its first position and takes the last value.
#[derive(Debug, Clone, PartialEq)]
pub struct Extras<V> {
    map: IndexMap<String, V>,
}

/// A JSON object with members of any type.
pub type Map = Extras<Variant>;

impl<V> Default for Extras<V> {
    fn default() -> Self {
        Self {
            map: IndexMap::new(),
        }
    }
}

impl<V> Extras<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&V> {
        self.map.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut V> {
        self.map.get_mut(name)
    }

    /// Inserts or replaces `name`, returning the previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: V) -> Option<V> {
        self.map.insert(name.into(), value)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.map.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Removes every member, yielding the values in insertion order.
    pub(crate) fn drain_values(&mut self) -> impl Iterator<Item = V> + '_ {
        self.map.drain(..).map(|(_, value)| value)
    }
}

impl<V, K: Into<String>> FromIterator<(K, V)> for Extras<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            map: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl<V: Json> Json for Extras<V> {
    const JSON_TYPE: JsonType = JsonType::Object;

    fn parse_frame() -> Box<dyn ParseFrame> {
        parse_frame::<Self>()
    }

    fn generate_frame(&self) -> Result<GenFrame<'_>, GenerateError> {
        generate_frame(self)
    }

    fn finalize(&mut self) {
        for value in self.map.values_mut() {
            value.finalize();
        }
        self.map = IndexMap::new();
    }

    fn member(&self, name: &str) -> Option<ValueRef<'_>> {
        self.map.get(name).map(ValueRef::new)
    }

    fn members(&self) -> Members<'_> {
        members(self)
    }

    fn member_count(&self) -> usize {
        self.map.len()
    }
}

impl<V: Json> Record for Extras<V> {
    type Extra = V;
    const FIELDS: &'static [Field<Self>] = &[];

    fn extras(&self) -> Option<&Extras<V>> {
        Some(self)
    }

    fn extras_mut(&mut self) -> Option<&mut Extras<V>> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{from_str, to_string, PushParser};
    use test_log::test;

    #[test]
    fn test_map_keeps_insertion_order() {
        let map: Extras<i32> = from_str(r#"{"z":1,"a":2,"m":3}"#).unwrap();
        let names: Vec<_> = map.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["z", "a", "m"]);
        assert_eq!(to_string(&map).unwrap(), r#"{"z":1,"a":2,"m":3}"#);
    }

    #[test]
    fn test_duplicate_member_last_wins_first_position() {
        let map: Extras<String> = from_str(r#"{"a":"x","b":"y","a":"z"}"#).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("a").map(String::as_str), Some("z"));
        assert_eq!(to_string(&map).unwrap(), r#"{"a":"z","b":"y"}"#);
    }

    #[test]
    fn test_member_name_split_across_chunks() {
        let doc = br#"{"first_name":1,"name":2}"#;
        for split in 0..=doc.len() {
            let mut parser = PushParser::<Extras<u8>>::new();
            parser.feed(&doc[..split]).unwrap();
            parser.feed(&doc[split..]).unwrap();
            let map = parser.finish().unwrap();
            assert_eq!(map.get("first_name"), Some(&1), "split at {split}");
            assert_eq!(map.get("name"), Some(&2), "split at {split}");
        }
    }

    #[test]
    fn test_malformed_objects() {
        assert!(matches!(
            from_str::<Map>(r#"{"a":1,}"#),
            Err(ParseError::UnexpectedByte { byte: b'}', .. })
        ));
        assert!(matches!(
            from_str::<Map>(r#"{"a" 1}"#),
            Err(ParseError::UnexpectedByte { byte: b'1', .. })
        ));
        assert!(matches!(
            from_str::<Map>(r#"{a:1}"#),
            Err(ParseError::UnexpectedByte { byte: b'a', .. })
        ));
        assert_eq!(from_str::<Map>(r#"{"a":1"#), Err(ParseError::EndOfData));
        assert!(matches!(
            from_str::<Map>("[]"),
            Err(ParseError::TypeMismatch {
                expected: JsonType::Object,
                ..
            })
        ));
    }

    #[test]
    fn test_generate_escapes_member_names() {
        let map: Extras<bool> = [("a\"b", true), ("c\nd", false)].into_iter().collect();
        assert_eq!(
            to_string(&map).unwrap(),
            r#"{"a\"b":true,"c\nd":false}"#
        );
    }

    #[test]
    fn test_empty_object() {
        let map: Map = from_str(" { } ").unwrap();
        assert!(map.is_empty());
        assert_eq!(to_string(&map).unwrap(), "{}");
    }

    #[test]
    fn test_finalize_extras() {
        let mut map: Map = from_str(r#"{"a":[1,{"b":"c"}]}"#).unwrap();
        map.finalize();
        assert!(map.is_empty());
        map.finalize();
        assert!(map.is_empty());
    }
}
