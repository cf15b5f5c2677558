// SPDX-License-Identifier: Apache-2.0

use crate::continuation::Scratch;
use crate::parse_error::{ParseError, UnexpectedState};

/// Byte that follows `\` in an input escape, mapped to the byte it stands for.
/// Zero marks an invalid escape; `u` is handled separately.
static UNESCAPE: [u8; 256] = {
    let mut table = [0u8; 256];
    table[b'"' as usize] = b'"';
    table[b'\\' as usize] = b'\\';
    table[b'/' as usize] = b'/';
    table[b'b' as usize] = 0x08;
    table[b'f' as usize] = 0x0C;
    table[b'n' as usize] = b'\n';
    table[b'r' as usize] = b'\r';
    table[b't' as usize] = b'\t';
    table
};

/// Output byte mapped to the character written after `\`.
/// Zero means the byte is written verbatim; `u` means `\u00XX`.
static ESCAPE: [u8; 256] = {
    let mut table = [0u8; 256];
    let mut byte = 0;
    while byte < 0x20 {
        table[byte] = b'u';
        byte += 1;
    }
    table[b'"' as usize] = b'"';
    table[b'\\' as usize] = b'\\';
    table[0x08] = b'b';
    table[0x0C] = b'f';
    table[b'\n' as usize] = b'n';
    table[b'\r' as usize] = b'r';
    table[b'\t' as usize] = b't';
    table
};

const HEX: &[u8; 16] = b"0123456789abcdef";

/// Destination for unescaped string bytes.
pub trait ByteSink {
    fn put(&mut self, bytes: &[u8]) -> Result<(), ParseError>;
}

impl ByteSink for Vec<u8> {
    fn put(&mut self, bytes: &[u8]) -> Result<(), ParseError> {
        self.try_reserve(bytes.len())
            .map_err(|_| ParseError::AllocationFailed)?;
        self.extend_from_slice(bytes);
        Ok(())
    }
}

impl ByteSink for Scratch {
    fn put(&mut self, bytes: &[u8]) -> Result<(), ParseError> {
        self.extend(bytes).map_err(ParseError::from)
    }
}

/// Shared utilities for processing JSON escape sequences.
pub struct EscapeProcessor;

impl EscapeProcessor {
    /// Process a simple escape sequence character and return the unescaped byte.
    ///
    /// # Examples
    /// ```ignore
    /// // Internal API - see unit tests for usage examples
    /// assert_eq!(EscapeProcessor::process_simple_escape(b'n').unwrap(), b'\n');
    /// ```
    pub fn process_simple_escape(escape_char: u8) -> Result<u8, ParseError> {
        match UNESCAPE[escape_char as usize] {
            0 => Err(ParseError::InvalidEscapeSequence),
            byte => Ok(byte),
        }
    }

    /// Escape sequence to write in place of `byte`, or `None` if it is written as is.
    ///
    /// Returns the sequence in a fixed buffer together with its length.
    pub fn escape_byte(byte: u8) -> Option<([u8; 6], usize)> {
        match ESCAPE[byte as usize] {
            0 => None,
            b'u' => Some((
                [
                    b'\\',
                    b'u',
                    b'0',
                    b'0',
                    HEX[(byte >> 4) as usize],
                    HEX[(byte & 0xF) as usize],
                ],
                6,
            )),
            ch => Some(([b'\\', ch, 0, 0, 0, 0], 2)),
        }
    }

    /// True if `byte` must be escaped in output.
    pub fn needs_escape(byte: u8) -> bool {
        ESCAPE[byte as usize] != 0
    }

    /// Validate that a byte represents a valid hexadecimal digit.
    ///
    /// # Returns
    /// The numeric value (0-15) of the hex digit, or an error if invalid.
    pub fn validate_hex_digit(byte: u8) -> Result<u32, ParseError> {
        match byte {
            b'0'..=b'9' => Ok((byte - b'0') as u32),
            b'a'..=b'f' => Ok((byte - b'a' + 10) as u32),
            b'A'..=b'F' => Ok((byte - b'A' + 10) as u32),
            _ => Err(ParseError::InvalidUnicodeHex),
        }
    }

    /// Check if a Unicode codepoint is a high surrogate (0xD800-0xDBFF)
    pub fn is_high_surrogate(codepoint: u32) -> bool {
        (0xD800..=0xDBFF).contains(&codepoint)
    }

    /// Check if a Unicode codepoint is a low surrogate (0xDC00-0xDFFF)
    pub fn is_low_surrogate(codepoint: u32) -> bool {
        (0xDC00..=0xDFFF).contains(&codepoint)
    }

    /// Combine a high and low surrogate pair into a single Unicode codepoint
    pub fn combine_surrogate_pair(high: u32, low: u32) -> Result<u32, ParseError> {
        if !Self::is_high_surrogate(high) || !Self::is_low_surrogate(low) {
            return Err(ParseError::InvalidUnicodeCodepoint);
        }
        Ok(0x10000 + ((high & 0x3FF) << 10) + (low & 0x3FF))
    }

    /// Decode one `\uXXXX` code unit, given the high surrogate left pending by
    /// the previous escape, if any.
    ///
    /// # Returns
    /// A tuple containing:
    /// - the UTF-8 bytes to append (`None` while a high surrogate waits for its pair)
    /// - the high surrogate to carry into the next escape
    pub fn process_unicode_escape<'a>(
        hex: &[u8; 4],
        utf8_buffer: &'a mut [u8; 4],
        pending_high_surrogate: Option<u32>,
    ) -> Result<(Option<&'a [u8]>, Option<u32>), ParseError> {
        let mut codepoint = 0u32;
        for &byte in hex {
            codepoint = (codepoint << 4) | Self::validate_hex_digit(byte)?;
        }

        let scalar = match pending_high_surrogate {
            Some(high) => Self::combine_surrogate_pair(high, codepoint)?,
            None if Self::is_high_surrogate(codepoint) => return Ok((None, Some(codepoint))),
            None if Self::is_low_surrogate(codepoint) => {
                return Err(ParseError::InvalidUnicodeCodepoint)
            }
            None => codepoint,
        };
        let ch = char::from_u32(scalar).ok_or(ParseError::InvalidUnicodeCodepoint)?;
        Ok((Some(ch.encode_utf8(utf8_buffer).as_bytes()), None))
    }
}

/// Collects the four hex digits of a `\uXXXX` sequence, one byte at a time,
/// and remembers a high surrogate between consecutive escapes.
#[derive(Debug, Default)]
pub struct UnicodeEscapeCollector {
    hex_buffer: [u8; 4],
    hex_pos: usize,
    pending_high_surrogate: Option<u32>,
}

impl UnicodeEscapeCollector {
    /// Reset the digit buffer for a new `\u` sequence. A pending high
    /// surrogate is kept.
    pub fn reset(&mut self) {
        self.hex_pos = 0;
    }

    /// Add a hex digit to the collector.
    /// Returns true if this completes the 4-digit sequence.
    pub fn add_hex_digit(&mut self, digit: u8) -> Result<bool, ParseError> {
        EscapeProcessor::validate_hex_digit(digit)?;
        let slot = self
            .hex_buffer
            .get_mut(self.hex_pos)
            .ok_or(UnexpectedState::InvalidUnicodeEscape)?;
        *slot = digit;
        self.hex_pos += 1;
        Ok(self.hex_pos == 4)
    }

    /// Decode the collected digits into `sink`.
    pub fn flush_to(&mut self, sink: &mut dyn ByteSink) -> Result<(), ParseError> {
        if self.hex_pos != 4 {
            return Err(UnexpectedState::InvalidUnicodeEscape.into());
        }
        let mut utf8 = [0u8; 4];
        let (bytes, pending) = EscapeProcessor::process_unicode_escape(
            &self.hex_buffer,
            &mut utf8,
            self.pending_high_surrogate,
        )?;
        self.pending_high_surrogate = pending;
        self.hex_pos = 0;
        match bytes {
            Some(bytes) => sink.put(bytes),
            None => Ok(()),
        }
    }

    /// Check if there's a pending high surrogate waiting for a low surrogate
    pub fn has_pending_high_surrogate(&self) -> bool {
        self.pending_high_surrogate.is_some()
    }
}
