// SPDX-License-Identifier: Apache-2.0

use crate::ParseError;

/// The chunk of input currently being parsed, with a read position.
///
/// Offsets reported in errors are absolute: `base` is the number of bytes
/// fed in earlier chunks.
#[derive(Debug)]
pub struct InputCursor<'a> {
    data: &'a [u8],
    pos: usize,
    base: usize,
    eof: bool,
}

impl<'a> InputCursor<'a> {
    /// Creates a cursor over `data`. `eof` marks the last chunk of the document.
    pub fn new(data: &'a [u8], base: usize, eof: bool) -> Self {
        Self {
            data,
            pos: 0,
            base,
            eof,
        }
    }

    pub fn peek(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    /// Consumes one byte. Does nothing at the end of the chunk.
    pub fn bump(&mut self) {
        if self.pos < self.data.len() {
            self.pos += 1;
        }
    }

    pub fn next_byte(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        Some(byte)
    }

    /// Unread bytes of the current chunk.
    pub fn remaining(&self) -> &'a [u8] {
        self.data.get(self.pos..).unwrap_or_default()
    }

    pub fn advance(&mut self, n: usize) {
        self.pos = self.pos.saturating_add(n).min(self.data.len());
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Bytes consumed since `start`, a position previously returned by [`pos`](Self::pos).
    pub fn since(&self, start: usize) -> &'a [u8] {
        self.data.get(start..self.pos).unwrap_or_default()
    }

    /// Absolute offset of the next unread byte.
    pub fn offset(&self) -> usize {
        self.base + self.pos
    }

    /// True when no more chunks will follow this one.
    pub fn is_eof(&self) -> bool {
        self.eof
    }

    pub fn is_exhausted(&self) -> bool {
        self.pos >= self.data.len()
    }

    pub fn skip_whitespace(&mut self) {
        while let Some(b' ' | b'\t' | b'\n' | b'\r') = self.peek() {
            self.pos += 1;
        }
    }

    /// Skips whitespace and peeks at the next significant byte.
    ///
    /// Returns `Ok(None)` when the chunk ran out and more input may follow,
    /// and [`ParseError::EndOfData`] when the document itself ended.
    pub fn significant(&mut self) -> Result<Option<u8>, ParseError> {
        self.skip_whitespace();
        match self.peek() {
            Some(byte) => Ok(Some(byte)),
            None if self.eof => Err(ParseError::EndOfData),
            None => Ok(None),
        }
    }

    /// Error for `byte` found at the current position.
    pub fn unexpected(&self, byte: u8) -> ParseError {
        ParseError::UnexpectedByte {
            byte,
            offset: self.offset(),
        }
    }

    /// Error for running out of bytes mid-token, or `None` if more may follow.
    pub fn starved(&self) -> Option<ParseError> {
        self.eof.then_some(ParseError::EndOfData)
    }
}
