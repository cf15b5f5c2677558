// SPDX-License-Identifier: Apache-2.0

//! Frame protocols shared by every codec.

use core::any::Any;

use crate::continuation::{Scratch, Step};
use crate::input_cursor::InputCursor;
use crate::parse_error::{GenerateError, ParseError, UnexpectedState};

/// Suspended state of one value being parsed.
///
/// A frame owns the value it is building. Dropping a frame at any point
/// releases whatever part of that value exists.
pub trait ParseFrame {
    /// Consumes bytes from `input` until the value is complete, a child
    /// value is needed, or the chunk runs out.
    fn resume(
        &mut self,
        input: &mut InputCursor<'_>,
        scratch: &mut Scratch,
    ) -> Result<Step<dyn ParseFrame>, ParseError>;

    /// Receives a completed child that this frame asked for with [`Step::Call`].
    fn accept(&mut self, child: Box<dyn ParseFrame>) -> Result<(), ParseError> {
        drop(child);
        Err(UnexpectedState::StrayChild.into())
    }

    /// Moves the finished value into `slot`, which must hold the same type.
    fn deliver(self: Box<Self>, slot: &mut dyn Any) -> Result<(), ParseError>;
}

/// Boxed generate frame borrowing the value it writes out.
pub type GenFrame<'a> = Box<dyn GenerateFrame<'a> + 'a>;

/// Suspended state of one value being written out.
pub trait GenerateFrame<'a> {
    /// Writes bytes into `out` until the value is complete, a child value
    /// has to be written, or `out` is full.
    fn resume(
        &mut self,
        out: &mut Output<'_>,
    ) -> Result<Step<dyn GenerateFrame<'a> + 'a>, GenerateError>;
}

/// Stores `value` in `slot`.
pub fn deliver_into<T: Any>(slot: &mut dyn Any, value: T) -> Result<(), ParseError> {
    match slot.downcast_mut::<T>() {
        Some(target) => {
            *target = value;
            Ok(())
        }
        None => Err(UnexpectedState::SlotTypeMismatch.into()),
    }
}

/// Caller-supplied output buffer plus the spill area for a token that did not fit.
pub struct Output<'o> {
    buf: &'o mut [u8],
    written: &'o mut usize,
    spill: &'o mut Scratch,
}

impl<'o> Output<'o> {
    pub fn new(buf: &'o mut [u8], written: &'o mut usize, spill: &'o mut Scratch) -> Self {
        Self {
            buf,
            written,
            spill,
        }
    }

    /// True when nothing more can be written in this call. Frames check this
    /// before starting a token and pause if it holds.
    pub fn is_full(&self) -> bool {
        *self.written >= self.buf.len() || !self.spill.is_empty()
    }

    pub fn room(&self) -> usize {
        if self.spill.is_empty() {
            self.buf.len().saturating_sub(*self.written)
        } else {
            0
        }
    }

    /// Copies as much of `bytes` as fits, returning the count.
    pub fn put_partial(&mut self, bytes: &[u8]) -> usize {
        let n = bytes.len().min(self.room());
        let start = *self.written;
        if let (Some(dst), Some(src)) = (self.buf.get_mut(start..start + n), bytes.get(..n)) {
            dst.copy_from_slice(src);
            *self.written += n;
            n
        } else {
            0
        }
    }

    /// Writes a whole token, spilling whatever does not fit. The spill is
    /// drained at the start of the next call.
    pub fn token(&mut self, bytes: &[u8]) -> Result<(), GenerateError> {
        let n = self.put_partial(bytes);
        if let Some(rest) = bytes.get(n..).filter(|rest| !rest.is_empty()) {
            self.spill.extend(rest)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deliver_into_checks_type() {
        let mut slot = 0u32;
        deliver_into(&mut slot, 7u32).unwrap();
        assert_eq!(slot, 7);
        assert_eq!(
            deliver_into(&mut slot, "x"),
            Err(ParseError::Unexpected(UnexpectedState::SlotTypeMismatch))
        );
    }

    #[test]
    fn test_token_spills() {
        let mut buf = [0u8; 4];
        let mut written = 0;
        let mut spill = Scratch::default();
        let mut out = Output::new(&mut buf, &mut written, &mut spill);
        out.token(b"ab").unwrap();
        assert!(!out.is_full());
        out.token(b"cdef").unwrap();
        assert!(out.is_full());
        assert_eq!(out.room(), 0);
        assert_eq!(written, 4);
        assert_eq!(&buf, b"abcd");
        assert_eq!(spill.as_slice(), b"ef");
    }

    #[test]
    fn test_put_partial() {
        let mut buf = [0u8; 3];
        let mut written = 1;
        let mut spill = Scratch::default();
        let mut out = Output::new(&mut buf, &mut written, &mut spill);
        assert_eq!(out.put_partial(b"xyz"), 2);
        assert_eq!(out.put_partial(b"xyz"), 0);
        assert_eq!(written, 3);
    }
}
