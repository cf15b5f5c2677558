// SPDX-License-Identifier: Apache-2.0

use crate::continuation::StackError;
use crate::metadata::JsonType;

/// Broad classification of a [`ParseError`] or [`GenerateError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed input for the target: unexpected bytes, bad escapes,
    /// unknown members, a value of the wrong JSON type.
    Syntax,
    /// A number does not fit the target representation.
    Overflow,
    /// Growing the continuation stack or a value buffer failed.
    Resource,
    /// The value being generated has no JSON text.
    Unrepresentable,
    /// The engine reached a state it should never be in.
    Internal,
}

/// Internal states that indicate a broken engine invariant rather than bad input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnexpectedState {
    /// A completed frame delivered a value into a slot of a different type.
    SlotTypeMismatch,
    /// A frame received a child value it never asked for.
    StrayChild,
    /// A frame was resumed after it had already completed.
    ResumedAfterCompletion,
    /// A `\u` escape was processed before all four hex digits arrived.
    InvalidUnicodeEscape,
    /// Generated output was not valid UTF-8.
    InvalidOutput,
}

/// Errors that can occur during JSON parsing
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    /// A byte that cannot start or continue the current token.
    #[error("unexpected byte 0x{byte:02x} at offset {offset}")]
    UnexpectedByte { byte: u8, offset: usize },
    /// Input ended in the middle of a value.
    #[error("unexpected end of input")]
    EndOfData,
    /// A raw control character inside a string.
    #[error("unescaped control character 0x{byte:02x} at offset {offset}")]
    UnescapedControlCharacter { byte: u8, offset: usize },
    /// Invalid escape sequence character.
    #[error("invalid escape sequence")]
    InvalidEscapeSequence,
    /// Invalid hex digits in Unicode escape sequence.
    #[error("invalid hex digit in unicode escape")]
    InvalidUnicodeHex,
    /// Valid hex but invalid Unicode codepoint, including unpaired surrogates.
    #[error("invalid unicode codepoint")]
    InvalidUnicodeCodepoint,
    /// A string was not valid UTF-8.
    #[error("invalid UTF-8: {0}")]
    InvalidUtf8(#[from] core::str::Utf8Error),
    /// An object member that the target record does not declare and has no extras for.
    #[error("unknown member {0:?}")]
    UnknownMember(String),
    /// A number literal that is not valid JSON.
    #[error("invalid number")]
    InvalidNumber,
    /// A fractional or exponent literal where an integer was expected.
    #[error("floating point value not allowed here")]
    FloatNotAllowed,
    /// A well-formed value of the wrong JSON type for its target.
    #[error("expected {expected:?} at offset {offset}")]
    TypeMismatch { expected: JsonType, offset: usize },
    /// Numeric overflow
    #[error("numeric overflow")]
    NumericOverflow,
    /// Nesting exceeded the configured stack depth.
    #[error("maximum nesting depth of {0} reached")]
    MaxDepthReached(usize),
    /// Memory for the stack, scratch area or a value could not be reserved.
    #[error("allocation failed")]
    AllocationFailed,
    /// The parser entered an unexpected internal state.
    #[error("unexpected internal state: {0:?}")]
    Unexpected(UnexpectedState),
}

impl ParseError {
    /// Classifies this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ParseError::UnexpectedByte { .. }
            | ParseError::EndOfData
            | ParseError::UnescapedControlCharacter { .. }
            | ParseError::InvalidEscapeSequence
            | ParseError::InvalidUnicodeHex
            | ParseError::InvalidUnicodeCodepoint
            | ParseError::InvalidUtf8(_)
            | ParseError::UnknownMember(_)
            | ParseError::InvalidNumber
            | ParseError::FloatNotAllowed
            | ParseError::TypeMismatch { .. } => ErrorKind::Syntax,
            ParseError::NumericOverflow => ErrorKind::Overflow,
            ParseError::MaxDepthReached(_) | ParseError::AllocationFailed => ErrorKind::Resource,
            ParseError::Unexpected(_) => ErrorKind::Internal,
        }
    }
}

impl From<UnexpectedState> for ParseError {
    fn from(info: UnexpectedState) -> Self {
        ParseError::Unexpected(info)
    }
}

impl From<StackError> for ParseError {
    fn from(err: StackError) -> Self {
        match err {
            StackError::AllocationFailed => ParseError::AllocationFailed,
            StackError::DepthExceeded(depth) => ParseError::MaxDepthReached(depth),
        }
    }
}

/// Errors that can occur while generating JSON text.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GenerateError {
    /// A variant that was never assigned has no JSON representation.
    #[error("cannot generate an unset variant")]
    UnsetVariant,
    /// NaN and infinities have no JSON representation.
    #[error("cannot generate a non-finite number")]
    NonFiniteNumber,
    /// Nesting exceeded the configured stack depth.
    #[error("maximum nesting depth of {0} reached")]
    MaxDepthReached(usize),
    /// Memory for the stack or pending output could not be reserved.
    #[error("allocation failed")]
    AllocationFailed,
    /// The generator entered an unexpected internal state.
    #[error("unexpected internal state: {0:?}")]
    Unexpected(UnexpectedState),
}

impl GenerateError {
    /// Classifies this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            GenerateError::UnsetVariant | GenerateError::NonFiniteNumber => {
                ErrorKind::Unrepresentable
            }
            GenerateError::MaxDepthReached(_) | GenerateError::AllocationFailed => {
                ErrorKind::Resource
            }
            GenerateError::Unexpected(_) => ErrorKind::Internal,
        }
    }
}

impl From<UnexpectedState> for GenerateError {
    fn from(info: UnexpectedState) -> Self {
        GenerateError::Unexpected(info)
    }
}

impl From<StackError> for GenerateError {
    fn from(err: StackError) -> Self {
        match err {
            StackError::AllocationFailed => GenerateError::AllocationFailed,
            StackError::DepthExceeded(depth) => GenerateError::MaxDepthReached(depth),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_constructors() {
        let error: ParseError = UnexpectedState::SlotTypeMismatch.into();
        match error {
            ParseError::Unexpected(info) => {
                assert_eq!(info, UnexpectedState::SlotTypeMismatch);
            }
            _ => panic!("Expected UnexpectedState error"),
        }

        let error: GenerateError = UnexpectedState::InvalidOutput.into();
        assert_eq!(
            error,
            GenerateError::Unexpected(UnexpectedState::InvalidOutput)
        );
    }

    #[test]
    fn test_stack_error_conversion() {
        assert_eq!(
            ParseError::from(StackError::DepthExceeded(8)),
            ParseError::MaxDepthReached(8)
        );
        assert_eq!(
            GenerateError::from(StackError::AllocationFailed),
            GenerateError::AllocationFailed
        );
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(ParseError::EndOfData.kind(), ErrorKind::Syntax);
        assert_eq!(ParseError::UnknownMember("x".into()).kind(), ErrorKind::Syntax);
        assert_eq!(ParseError::NumericOverflow.kind(), ErrorKind::Overflow);
        assert_eq!(ParseError::AllocationFailed.kind(), ErrorKind::Resource);
        assert_eq!(ParseError::MaxDepthReached(3).kind(), ErrorKind::Resource);
        assert_eq!(
            ParseError::TypeMismatch {
                expected: JsonType::String,
                offset: 0
            }
            .kind(),
            ErrorKind::Syntax
        );
        assert_eq!(ParseError::FloatNotAllowed.kind(), ErrorKind::Syntax);
        assert_eq!(
            GenerateError::UnsetVariant.kind(),
            ErrorKind::Unrepresentable
        );
        assert_eq!(
            GenerateError::NonFiniteNumber.kind(),
            ErrorKind::Unrepresentable
        );
    }

    #[test]
    fn test_display() {
        let err = ParseError::UnexpectedByte {
            byte: b'x',
            offset: 12,
        };
        assert_eq!(err.to_string(), "unexpected byte 0x78 at offset 12");
        assert_eq!(
            ParseError::MaxDepthReached(4).to_string(),
            "maximum nesting depth of 4 reached"
        );
    }

    #[test]
    fn test_utf8_error_conversion() {
        // Lone continuation byte, built at runtime to avoid a literal warning
        let mut invalid_utf8_array = [0u8; 1];
        invalid_utf8_array[0] = 0b10000000u8;

        match core::str::from_utf8(&invalid_utf8_array) {
            Err(utf8_error) => {
                let parse_error: ParseError = utf8_error.into();
                assert!(matches!(parse_error, ParseError::InvalidUtf8(_)));
            }
            Ok(_) => panic!("Expected UTF-8 validation to fail"),
        }
    }
}
