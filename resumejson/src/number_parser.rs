// SPDX-License-Identifier: Apache-2.0

use crate::ParseError;

/// Lexer phase, named after the part of the literal read so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Phase {
    #[default]
    Begin,
    Minus,
    Zero,
    Integer,
    Point,
    Fraction,
    Exp,
    ExpSign,
    ExpDigits,
}

/// Result of offering one byte to the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lex {
    /// The byte belongs to the number.
    Continue,
    /// The byte is not part of the number and was not consumed.
    End,
}

/// Digit-by-digit recogniser for JSON number literals.
///
/// Integer digits are folded into a `u64` accumulator as they arrive, so
/// integer targets never have to re-scan the text.
#[derive(Debug, Clone, Default)]
pub struct NumberLexer {
    phase: Phase,
    negative: bool,
    mantissa: u64,
    overflow: bool,
}

impl NumberLexer {
    pub fn new() -> Self {
        Self::default()
    }

    /// True before the first byte was accepted.
    pub fn is_fresh(&self) -> bool {
        self.phase == Phase::Begin
    }

    pub fn step(&mut self, byte: u8) -> Result<Lex, ParseError> {
        use Phase::*;
        let next = match (self.phase, byte) {
            (Begin, b'-') => {
                self.negative = true;
                Minus
            }
            (Begin | Minus, b'0') => Zero,
            (Begin | Minus, b'1'..=b'9') | (Integer, b'0'..=b'9') => {
                self.accumulate(byte);
                Integer
            }
            (Zero | Integer, b'.') => Point,
            (Zero | Integer | Fraction, b'e' | b'E') => Exp,
            (Point | Fraction, b'0'..=b'9') => Fraction,
            (Exp, b'+' | b'-') => ExpSign,
            (Exp | ExpSign | ExpDigits, b'0'..=b'9') => ExpDigits,
            (Zero | Integer | Fraction | ExpDigits, _) => return Ok(Lex::End),
            _ => return Err(ParseError::InvalidNumber),
        };
        self.phase = next;
        Ok(Lex::Continue)
    }

    fn accumulate(&mut self, byte: u8) {
        let digit = u64::from(byte - b'0');
        match self
            .mantissa
            .checked_mul(10)
            .and_then(|m| m.checked_add(digit))
        {
            Some(m) => self.mantissa = m,
            None => self.overflow = true,
        }
    }

    /// True if the bytes seen so far form a complete literal.
    pub fn can_end(&self) -> bool {
        matches!(
            self.phase,
            Phase::Zero | Phase::Integer | Phase::Fraction | Phase::ExpDigits
        )
    }

    /// True once a fraction or exponent was seen.
    pub fn is_float(&self) -> bool {
        matches!(
            self.phase,
            Phase::Point | Phase::Fraction | Phase::Exp | Phase::ExpSign | Phase::ExpDigits
        )
    }

    /// Describes the finished literal whose exact text is `text`.
    pub fn lexeme<'t>(&self, text: &'t [u8]) -> Result<Lexeme<'t>, ParseError> {
        if !self.can_end() {
            return Err(ParseError::InvalidNumber);
        }
        Ok(Lexeme {
            negative: self.negative,
            mantissa: self.mantissa,
            overflow: self.overflow,
            is_float: self.is_float(),
            text: core::str::from_utf8(text)?,
        })
    }
}

/// A complete number literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lexeme<'t> {
    pub negative: bool,
    /// Magnitude of the integer part, valid when neither `overflow` nor `is_float`.
    pub mantissa: u64,
    pub overflow: bool,
    pub is_float: bool,
    /// The literal exactly as it appeared in the input.
    pub text: &'t str,
}

impl Lexeme<'_> {
    /// Exact integer value. Fractional or exponent literals are refused.
    pub fn integer(&self) -> Result<i128, ParseError> {
        if self.is_float {
            return Err(ParseError::FloatNotAllowed);
        }
        if self.overflow {
            return Err(ParseError::NumericOverflow);
        }
        let magnitude = i128::from(self.mantissa);
        Ok(if self.negative { -magnitude } else { magnitude })
    }
}
