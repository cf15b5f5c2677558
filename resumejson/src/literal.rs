// SPDX-License-Identifier: Apache-2.0

//! `true`, `false` and `null`.

use core::any::Any;

use crate::continuation::{Scratch, Step};
use crate::frame::{deliver_into, GenFrame, GenerateFrame, Output, ParseFrame};
use crate::input_cursor::InputCursor;
use crate::metadata::{Json, JsonType};
use crate::parse_error::{GenerateError, ParseError};

/// The JSON `null` value.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Null;

/// Matches one fixed literal, resumable at any byte.
#[derive(Debug, Clone, Copy)]
pub struct LiteralMatcher {
    literal: &'static [u8],
    matched: usize,
}

impl LiteralMatcher {
    pub fn new(literal: &'static [u8]) -> Self {
        Self {
            literal,
            matched: 0,
        }
    }

    /// Consumes literal bytes. Returns true once the whole literal was seen.
    pub fn advance(&mut self, input: &mut InputCursor<'_>) -> Result<bool, ParseError> {
        let literal = self.literal;
        let rest = literal.get(self.matched..).unwrap_or_default();
        if input.remaining().starts_with(rest) {
            input.advance(rest.len());
            self.matched = literal.len();
            return Ok(true);
        }
        for &expected in rest {
            match input.peek() {
                Some(byte) if byte == expected => {
                    input.bump();
                    self.matched += 1;
                }
                Some(byte) => return Err(input.unexpected(byte)),
                None => {
                    return match input.starved() {
                        Some(err) => Err(err),
                        None => Ok(false),
                    }
                }
            }
        }
        Ok(true)
    }
}

enum LiteralState {
    Start,
    Matching(LiteralMatcher),
}

/// Parses `true` or `false`.
pub struct BoolFrame {
    state: LiteralState,
    value: bool,
}

impl ParseFrame for BoolFrame {
    fn resume(
        &mut self,
        input: &mut InputCursor<'_>,
        _scratch: &mut Scratch,
    ) -> Result<Step<dyn ParseFrame>, ParseError> {
        if let LiteralState::Start = self.state {
            let Some(byte) = input.significant()? else {
                return Ok(Step::Pause);
            };
            let literal: &'static [u8] = match byte {
                b't' => b"true",
                b'f' => b"false",
                _ => {
                    return Err(ParseError::TypeMismatch {
                        expected: JsonType::Bool,
                        offset: input.offset(),
                    })
                }
            };
            self.value = byte == b't';
            self.state = LiteralState::Matching(LiteralMatcher::new(literal));
        }
        if let LiteralState::Matching(matcher) = &mut self.state {
            if !matcher.advance(input)? {
                return Ok(Step::Pause);
            }
        }
        Ok(Step::Complete)
    }

    fn deliver(self: Box<Self>, slot: &mut dyn Any) -> Result<(), ParseError> {
        deliver_into(slot, self.value)
    }
}

/// Parses `null`.
pub struct NullFrame {
    state: LiteralState,
}

impl ParseFrame for NullFrame {
    fn resume(
        &mut self,
        input: &mut InputCursor<'_>,
        _scratch: &mut Scratch,
    ) -> Result<Step<dyn ParseFrame>, ParseError> {
        if let LiteralState::Start = self.state {
            match input.significant()? {
                None => return Ok(Step::Pause),
                Some(b'n') => self.state = LiteralState::Matching(LiteralMatcher::new(b"null")),
                Some(_) => {
                    return Err(ParseError::TypeMismatch {
                        expected: JsonType::Null,
                        offset: input.offset(),
                    })
                }
            }
        }
        if let LiteralState::Matching(matcher) = &mut self.state {
            if !matcher.advance(input)? {
                return Ok(Step::Pause);
            }
        }
        Ok(Step::Complete)
    }

    fn deliver(self: Box<Self>, slot: &mut dyn Any) -> Result<(), ParseError> {
        deliver_into(slot, Null)
    }
}

/// Writes a fixed literal as one token.
pub struct LiteralGen {
    text: &'static [u8],
}

impl LiteralGen {
    pub fn new(text: &'static [u8]) -> Self {
        Self { text }
    }
}

impl<'a> GenerateFrame<'a> for LiteralGen {
    fn resume(
        &mut self,
        out: &mut Output<'_>,
    ) -> Result<Step<dyn GenerateFrame<'a> + 'a>, GenerateError> {
        if out.is_full() {
            return Ok(Step::Pause);
        }
        out.token(self.text)?;
        Ok(Step::Complete)
    }
}

impl Json for bool {
    const JSON_TYPE: JsonType = JsonType::Bool;

    fn parse_frame() -> Box<dyn ParseFrame> {
        Box::new(BoolFrame {
            state: LiteralState::Start,
            value: false,
        })
    }

    fn generate_frame(&self) -> Result<GenFrame<'_>, GenerateError> {
        let text: &'static [u8] = if *self { b"true" } else { b"false" };
        Ok(Box::new(LiteralGen::new(text)))
    }
}

impl Json for Null {
    const JSON_TYPE: JsonType = JsonType::Null;

    fn parse_frame() -> Box<dyn ParseFrame> {
        Box::new(NullFrame {
            state: LiteralState::Start,
        })
    }

    fn generate_frame(&self) -> Result<GenFrame<'_>, GenerateError> {
        Ok(Box::new(LiteralGen::new(b"null")))
    }
}
