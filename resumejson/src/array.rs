// SPDX-License-Identifier: Apache-2.0

use core::any::Any;
use std::borrow::Cow;

use crate::continuation::{Scratch, Step};
use crate::frame::{deliver_into, GenFrame, GenerateFrame, Output, ParseFrame};
use crate::input_cursor::InputCursor;
use crate::metadata::{Json, JsonType, Metadata};
use crate::parse_error::{GenerateError, ParseError, UnexpectedState};
use crate::value::{Members, ValueRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArrayState {
    /// Expecting `[`.
    Open,
    /// Expecting an element, or `]` if the array is still empty.
    Element,
    /// Waiting for the element frame to complete.
    Pending,
    /// Expecting `,` or `]`.
    Comma,
}

/// Resumable parse of a JSON array into a `Vec<T>`.
///
/// Only fully parsed elements are ever stored, so dropping the frame midway
/// releases exactly the elements read so far.
pub struct ArrayFrame<T> {
    state: ArrayState,
    items: Vec<T>,
    meta: &'static Metadata,
}

impl<T: Json> ArrayFrame<T> {
    pub fn new() -> Self {
        Self {
            state: ArrayState::Open,
            items: Vec::new(),
            meta: T::metadata(),
        }
    }
}

impl<T: Json> Default for ArrayFrame<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Json> ParseFrame for ArrayFrame<T> {
    fn resume(
        &mut self,
        input: &mut InputCursor<'_>,
        _scratch: &mut Scratch,
    ) -> Result<Step<dyn ParseFrame>, ParseError> {
        loop {
            let Some(byte) = input.significant()? else {
                return Ok(Step::Pause);
            };
            match self.state {
                ArrayState::Open => {
                    if byte != b'[' {
                        return Err(ParseError::TypeMismatch {
                            expected: JsonType::Array,
                            offset: input.offset(),
                        });
                    }
                    input.bump();
                    self.state = ArrayState::Element;
                }
                ArrayState::Element if byte == b']' && self.items.is_empty() => {
                    input.bump();
                    return Ok(Step::Complete);
                }
                ArrayState::Element => {
                    self.state = ArrayState::Pending;
                    return Ok(Step::Call((self.meta.parse)()));
                }
                ArrayState::Comma => {
                    input.bump();
                    match byte {
                        b',' => self.state = ArrayState::Element,
                        b']' => return Ok(Step::Complete),
                        _ => {
                            return Err(ParseError::UnexpectedByte {
                                byte,
                                offset: input.offset() - 1,
                            })
                        }
                    }
                }
                ArrayState::Pending => {
                    return Err(UnexpectedState::ResumedAfterCompletion.into());
                }
            }
        }
    }

    fn accept(&mut self, child: Box<dyn ParseFrame>) -> Result<(), ParseError> {
        let mut item = T::default();
        child.deliver(&mut item)?;
        self.items
            .try_reserve(1)
            .map_err(|_| ParseError::AllocationFailed)?;
        self.items.push(item);
        self.state = ArrayState::Comma;
        Ok(())
    }

    fn deliver(self: Box<Self>, slot: &mut dyn Any) -> Result<(), ParseError> {
        deliver_into(slot, self.items)
    }
}

/// Parses an array index segment. Leading zeros, signs and overflow are refused.
fn parse_index(name: &str) -> Option<usize> {
    let bytes = name.as_bytes();
    match bytes {
        [] => None,
        [b'0'] => Some(0),
        [b'0', ..] => None,
        _ => bytes.iter().try_fold(0usize, |acc, &b| {
            let digit = (b as char).to_digit(10)?;
            acc.checked_mul(10)?.checked_add(digit as usize)
        }),
    }
}

impl<T: Json> Json for Vec<T> {
    const JSON_TYPE: JsonType = JsonType::Array;

    fn parse_frame() -> Box<dyn ParseFrame> {
        Box::new(ArrayFrame::<T>::new())
    }

    fn generate_frame(&self) -> Result<GenFrame<'_>, GenerateError> {
        Ok(Box::new(ArrayGen {
            items: self,
            next: 0,
            state: ArrayGenState::Open,
            meta: T::metadata(),
        }))
    }

    /// Finalizes each element in order, then frees the buffer.
    fn finalize(&mut self) {
        for item in self.iter_mut() {
            item.finalize();
        }
        *self = Vec::new();
    }

    fn member(&self, name: &str) -> Option<ValueRef<'_>> {
        let item = self.as_slice().get(parse_index(name)?)?;
        Some(ValueRef::new(item))
    }

    fn members(&self) -> Members<'_> {
        if self.is_empty() {
            return Members::empty();
        }
        Members::new(
            self.iter()
                .enumerate()
                .map(|(i, item)| (Cow::Owned(i.to_string()), ValueRef::new(item))),
        )
    }

    fn member_count(&self) -> usize {
        self.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArrayGenState {
    Open,
    Next,
    Close,
}

/// Writes `[`, each element through its own frame, and `]`.
pub struct ArrayGen<'a, T> {
    items: &'a [T],
    next: usize,
    state: ArrayGenState,
    meta: &'static Metadata,
}

impl<'a, T: Json> GenerateFrame<'a> for ArrayGen<'a, T> {
    fn resume(
        &mut self,
        out: &mut Output<'_>,
    ) -> Result<Step<dyn GenerateFrame<'a> + 'a>, GenerateError> {
        if out.is_full() {
            return Ok(Step::Pause);
        }
        match self.state {
            ArrayGenState::Open => {
                out.token(b"[")?;
                self.state = ArrayGenState::Next;
                self.resume(out)
            }
            ArrayGenState::Next => match self.items.get(self.next) {
                Some(item) => {
                    if self.next > 0 {
                        out.token(b",")?;
                    }
                    self.next += 1;
                    Ok(Step::Call((self.meta.generate)(item)?))
                }
                None => {
                    self.state = ArrayGenState::Close;
                    self.resume(out)
                }
            },
            ArrayGenState::Close => {
                out.token(b"]")?;
                Ok(Step::Complete)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{from_str, to_string, PushParser, Variant};
    use test_log::test;

    #[test]
    fn test_array_one_byte_at_a_time() {
        let mut parser = PushParser::<Vec<i64>>::new();
        for byte in b"[1,2,3]" {
            parser.feed(core::slice::from_ref(byte)).unwrap();
        }
        let items = parser.finish().unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items, vec![1, 2, 3]);
    }

    #[test]
    fn test_empty_array_does_not_allocate() {
        let items: Vec<String> = from_str(" [ ] ").unwrap();
        assert!(items.is_empty());
        assert_eq!(items.capacity(), 0);
    }

    #[test]
    fn test_nested_arrays() {
        let items: Vec<Vec<bool>> = from_str("[[true],[],[false,true]]").unwrap();
        assert_eq!(items, vec![vec![true], vec![], vec![false, true]]);
    }

    #[test]
    fn test_malformed_arrays() {
        assert!(matches!(
            from_str::<Vec<i64>>("[1,]"),
            Err(ParseError::TypeMismatch { .. })
        ));
        assert_eq!(
            from_str::<Vec<i64>>("[1 2]"),
            Err(ParseError::UnexpectedByte {
                byte: b'2',
                offset: 3
            })
        );
        assert_eq!(from_str::<Vec<i64>>("[1,2"), Err(ParseError::EndOfData));
        assert!(matches!(
            from_str::<Vec<i64>>("{}"),
            Err(ParseError::TypeMismatch {
                expected: JsonType::Array,
                ..
            })
        ));
    }

    #[test]
    fn test_parse_index() {
        assert_eq!(parse_index("0"), Some(0));
        assert_eq!(parse_index("42"), Some(42));
        assert_eq!(parse_index(""), None);
        assert_eq!(parse_index("007"), None);
        assert_eq!(parse_index("-1"), None);
        assert_eq!(parse_index("1a"), None);
        assert_eq!(parse_index("99999999999999999999999999"), None);
    }

    #[test]
    fn test_get_by_index() {
        let items = vec![10i64, 20, 30];
        let view = ValueRef::new(&items);
        assert_eq!(view.get("1").and_then(|v| v.to_i64()), Some(20));
        assert!(view.get("3").is_none());
        assert!(view.get("x").is_none());
    }

    #[test]
    fn test_finalize_twice() {
        let mut items: Vec<Variant> = from_str(r#"["a", [1, 2], {"k": null}]"#).unwrap();
        items.finalize();
        assert!(items.is_empty());
        assert_eq!(items.capacity(), 0);
        items.finalize();
        assert!(items.is_empty());
    }

    #[test]
    fn test_generate_arrays() {
        assert_eq!(to_string(&Vec::<i32>::new()).unwrap(), "[]");
        assert_eq!(
            to_string(&vec![vec![1, 2], vec![], vec![3]]).unwrap(),
            "[[1,2],[],[3]]"
        );
    }
}
