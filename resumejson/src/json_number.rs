// SPDX-License-Identifier: Apache-2.0

use core::any::Any;

use crate::continuation::{Scratch, Step};
use crate::frame::{deliver_into, GenFrame, GenerateFrame, Output, ParseFrame};
use crate::input_cursor::InputCursor;
use crate::metadata::{Json, JsonType};
use crate::number_parser::{Lex, Lexeme, NumberLexer};
use crate::parse_error::{GenerateError, ParseError};

/// A JSON number of any shape, as held by a [`Variant`](crate::Variant).
///
/// Integers that fit `i64` are `Int`, larger non-negative integers that fit
/// `u64` are `UInt`, and everything else is `Float`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    UInt(u64),
    #[cfg(feature = "float")]
    Float(f64),
}

impl Default for Number {
    fn default() -> Self {
        Number::Int(0)
    }
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Int(v) => v as f64,
            Number::UInt(v) => v as f64,
            #[cfg(feature = "float")]
            Number::Float(v) => v,
        }
    }

    /// Integer value, if the number is integral and fits.
    pub fn as_i64(self) -> Option<i64> {
        match self {
            Number::Int(v) => Some(v),
            Number::UInt(v) => i64::try_from(v).ok(),
            #[cfg(feature = "float")]
            Number::Float(v) => {
                let in_range = v >= i64::MIN as f64 && v < i64::MAX as f64;
                (v.fract() == 0.0 && in_range).then_some(v as i64)
            }
        }
    }

    pub fn is_float(self) -> bool {
        #[cfg(feature = "float")]
        if let Number::Float(_) = self {
            return true;
        }
        false
    }
}

macro_rules! number_from_int {
    ($($int_ty:ty),*) => {
        $(
            impl From<$int_ty> for Number {
                fn from(v: $int_ty) -> Self {
                    Number::Int(i64::from(v))
                }
            }
        )*
    };
}

number_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<u64> for Number {
    fn from(v: u64) -> Self {
        match i64::try_from(v) {
            Ok(v) => Number::Int(v),
            Err(_) => Number::UInt(v),
        }
    }
}

#[cfg(feature = "float")]
impl From<f64> for Number {
    fn from(v: f64) -> Self {
        Number::Float(v)
    }
}

/// Conversion from a complete number literal to a target type.
pub trait FromLexeme: Sized {
    fn from_lexeme(lexeme: &Lexeme<'_>) -> Result<Self, ParseError>;
}

impl FromLexeme for Number {
    fn from_lexeme(lexeme: &Lexeme<'_>) -> Result<Self, ParseError> {
        match lexeme.integer() {
            Ok(v) => {
                if let Ok(v) = i64::try_from(v) {
                    return Ok(Number::Int(v));
                }
                if let Ok(v) = u64::try_from(v) {
                    return Ok(Number::UInt(v));
                }
                float_number(lexeme)
            }
            Err(ParseError::FloatNotAllowed | ParseError::NumericOverflow) => float_number(lexeme),
            Err(e) => Err(e),
        }
    }
}

#[cfg(feature = "float")]
fn float_number(lexeme: &Lexeme<'_>) -> Result<Number, ParseError> {
    f64::from_lexeme(lexeme).map(Number::Float)
}

#[cfg(not(feature = "float"))]
fn float_number(_lexeme: &Lexeme<'_>) -> Result<Number, ParseError> {
    Err(ParseError::FloatNotAllowed)
}

#[cfg(feature = "float")]
macro_rules! impl_float {
    ($($float_ty:ty => $gen:ident),*) => {
        $(
            impl FromLexeme for $float_ty {
                fn from_lexeme(lexeme: &Lexeme<'_>) -> Result<Self, ParseError> {
                    let value: $float_ty = lexeme
                        .text
                        .parse()
                        .map_err(|_| ParseError::InvalidNumber)?;
                    if value.is_finite() {
                        Ok(value)
                    } else {
                        Err(ParseError::NumericOverflow)
                    }
                }
            }

            impl Json for $float_ty {
                const JSON_TYPE: JsonType = JsonType::Number;

                fn parse_frame() -> Box<dyn ParseFrame> {
                    Box::new(NumberFrame::<$float_ty>::new())
                }

                fn generate_frame(&self) -> Result<GenFrame<'_>, GenerateError> {
                    Ok(Box::new(NumberGen::$gen(*self)?))
                }

                fn to_number(&self) -> Option<Number> {
                    Some(Number::Float(f64::from(*self)))
                }
            }
        )*
    };
}

#[cfg(feature = "float")]
impl_float!(f32 => float32, f64 => float);

impl Json for Number {
    const JSON_TYPE: JsonType = JsonType::Number;

    fn parse_frame() -> Box<dyn ParseFrame> {
        Box::new(NumberFrame::<Number>::new())
    }

    fn generate_frame(&self) -> Result<GenFrame<'_>, GenerateError> {
        let frame = match *self {
            Number::Int(v) => NumberGen::integer(v),
            Number::UInt(v) => NumberGen::integer(v),
            #[cfg(feature = "float")]
            Number::Float(v) => NumberGen::float(v)?,
        };
        Ok(Box::new(frame))
    }

    fn to_number(&self) -> Option<Number> {
        Some(*self)
    }
}

/// Resumable number parse.
///
/// While the literal lies inside one chunk it is converted straight from the
/// input. A literal cut by a chunk boundary is collected in scratch first.
pub struct NumberFrame<N> {
    lexer: NumberLexer,
    spilled: bool,
    value: Option<N>,
}

impl<N> NumberFrame<N> {
    pub fn new() -> Self {
        Self {
            lexer: NumberLexer::new(),
            spilled: false,
            value: None,
        }
    }
}

impl<N> Default for NumberFrame<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: FromLexeme + Any> ParseFrame for NumberFrame<N> {
    fn resume(
        &mut self,
        input: &mut InputCursor<'_>,
        scratch: &mut Scratch,
    ) -> Result<Step<dyn ParseFrame>, ParseError> {
        if self.lexer.is_fresh() {
            match input.significant()? {
                None => return Ok(Step::Pause),
                Some(b'-' | b'0'..=b'9') => {}
                Some(_) => {
                    return Err(ParseError::TypeMismatch {
                        expected: JsonType::Number,
                        offset: input.offset(),
                    })
                }
            }
        }

        let start = input.pos();
        loop {
            match input.peek() {
                Some(byte) => match self.lexer.step(byte)? {
                    Lex::Continue => input.bump(),
                    Lex::End => break,
                },
                None if input.is_eof() => break,
                None => {
                    scratch.extend(input.since(start))?;
                    self.spilled = true;
                    return Ok(Step::Pause);
                }
            }
        }

        let value = if self.spilled {
            scratch.extend(input.since(start))?;
            let value = N::from_lexeme(&self.lexer.lexeme(scratch.as_slice())?);
            scratch.clear();
            self.spilled = false;
            value?
        } else {
            N::from_lexeme(&self.lexer.lexeme(input.since(start))?)?
        };
        self.value = Some(value);
        Ok(Step::Complete)
    }

    fn deliver(self: Box<Self>, slot: &mut dyn Any) -> Result<(), ParseError> {
        match self.value {
            Some(value) => deliver_into(slot, value),
            None => Err(ParseError::EndOfData),
        }
    }
}

/// Writes one formatted number as a single token.
pub struct NumberGen {
    text: [u8; 40],
    len: usize,
}

impl NumberGen {
    pub fn integer<I: itoa::Integer>(value: I) -> Self {
        let mut buffer = itoa::Buffer::new();
        Self::from_text(buffer.format(value).as_bytes())
    }

    #[cfg(feature = "float")]
    pub fn float(value: f64) -> Result<Self, GenerateError> {
        if !value.is_finite() {
            return Err(GenerateError::NonFiniteNumber);
        }
        Ok(Self::shortest(value))
    }

    /// Formats at `f32` precision, so `0.1f32` is written as `0.1`.
    #[cfg(feature = "float")]
    pub fn float32(value: f32) -> Result<Self, GenerateError> {
        if !value.is_finite() {
            return Err(GenerateError::NonFiniteNumber);
        }
        Ok(Self::shortest(value))
    }

    #[cfg(feature = "float")]
    fn shortest<F: ryu::Float>(value: F) -> Self {
        let mut buffer = ryu::Buffer::new();
        Self::from_text(buffer.format_finite(value).as_bytes())
    }

    fn from_text(text: &[u8]) -> Self {
        let mut gen = Self {
            text: [0; 40],
            len: text.len().min(40),
        };
        if let (Some(dst), Some(src)) = (gen.text.get_mut(..gen.len), text.get(..gen.len)) {
            dst.copy_from_slice(src);
        }
        gen
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.text.get(..self.len).unwrap_or_default()
    }
}

impl<'a> GenerateFrame<'a> for NumberGen {
    fn resume(
        &mut self,
        out: &mut Output<'_>,
    ) -> Result<Step<dyn GenerateFrame<'a> + 'a>, GenerateError> {
        if out.is_full() {
            return Ok(Step::Pause);
        }
        out.token(self.as_bytes())?;
        Ok(Step::Complete)
    }
}
