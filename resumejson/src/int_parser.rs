// SPDX-License-Identifier: Apache-2.0

// Fixed-width integer targets. Every width goes through the same exact
// i128 value from the lexer and a checked narrowing conversion.

use crate::frame::{GenFrame, ParseFrame};
use crate::json_number::{FromLexeme, Number, NumberFrame, NumberGen};
use crate::metadata::{Json, JsonType};
use crate::number_parser::Lexeme;
use crate::parse_error::{GenerateError, ParseError};

macro_rules! impl_integer {
    ($($int_ty:ty),*) => {
        $(
            impl FromLexeme for $int_ty {
                /// Refuses fraction or exponent literals and values out of range.
                fn from_lexeme(lexeme: &Lexeme<'_>) -> Result<Self, ParseError> {
                    <$int_ty>::try_from(lexeme.integer()?)
                        .map_err(|_| ParseError::NumericOverflow)
                }
            }

            impl Json for $int_ty {
                const JSON_TYPE: JsonType = JsonType::Number;

                fn parse_frame() -> Box<dyn ParseFrame> {
                    Box::new(NumberFrame::<$int_ty>::new())
                }

                fn generate_frame(&self) -> Result<GenFrame<'_>, GenerateError> {
                    Ok(Box::new(NumberGen::integer(*self)))
                }

                fn to_number(&self) -> Option<Number> {
                    Some(Number::from(*self))
                }
            }
        )*
    };
}

impl_integer!(i8, i16, i32, i64, u8, u16, u32, u64);
