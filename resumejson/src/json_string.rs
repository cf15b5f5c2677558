// SPDX-License-Identifier: Apache-2.0

use core::any::Any;

use crate::continuation::{Scratch, Step};
use crate::escape_processor::{ByteSink, EscapeProcessor, UnicodeEscapeCollector};
use crate::frame::{deliver_into, GenFrame, GenerateFrame, Output, ParseFrame};
use crate::input_cursor::InputCursor;
use crate::metadata::{Json, JsonType};
use crate::parse_error::{GenerateError, ParseError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum ScanState {
    #[default]
    Body,
    Escape,
    Unicode,
}

/// Result of one [`StringScanner::scan`] call.
#[derive(Debug, PartialEq, Eq)]
pub enum Scan<'i> {
    /// The chunk ran out. Everything read so far is in the sink.
    Pending,
    /// The closing quote was consumed. `tail` holds the trailing run of
    /// plain bytes that has not been copied to the sink.
    Done { tail: &'i [u8] },
}

/// Resumable unescaper for string bodies, positioned after the opening quote.
///
/// Runs of plain bytes are copied only when an escape or the end of the
/// chunk forces it, so a string without escapes that lies inside one chunk
/// is never copied by the scanner at all.
#[derive(Debug, Default)]
pub struct StringScanner {
    state: ScanState,
    unicode: UnicodeEscapeCollector,
}

impl StringScanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scan<'i>(
        &mut self,
        input: &mut InputCursor<'i>,
        sink: &mut dyn ByteSink,
    ) -> Result<Scan<'i>, ParseError> {
        let mut run_start = input.pos();
        loop {
            let Some(byte) = input.peek() else {
                sink.put(input.since(run_start))?;
                return match input.starved() {
                    Some(err) => Err(err),
                    None => Ok(Scan::Pending),
                };
            };
            match self.state {
                ScanState::Body => match byte {
                    b'"' | b'\\' | 0x00..=0x1F if self.unicode.has_pending_high_surrogate() => {
                        if byte != b'\\' {
                            return Err(ParseError::InvalidUnicodeCodepoint);
                        }
                        sink.put(input.since(run_start))?;
                        input.bump();
                        run_start = input.pos();
                        self.state = ScanState::Escape;
                    }
                    b'"' => {
                        let tail = input.since(run_start);
                        input.bump();
                        return Ok(Scan::Done { tail });
                    }
                    b'\\' => {
                        sink.put(input.since(run_start))?;
                        input.bump();
                        run_start = input.pos();
                        self.state = ScanState::Escape;
                    }
                    0x00..=0x1F => {
                        return Err(ParseError::UnescapedControlCharacter {
                            byte,
                            offset: input.offset(),
                        })
                    }
                    _ if self.unicode.has_pending_high_surrogate() => {
                        return Err(ParseError::InvalidUnicodeCodepoint)
                    }
                    _ => input.bump(),
                },
                ScanState::Escape => {
                    input.bump();
                    run_start = input.pos();
                    if byte == b'u' {
                        self.unicode.reset();
                        self.state = ScanState::Unicode;
                    } else {
                        if self.unicode.has_pending_high_surrogate() {
                            return Err(ParseError::InvalidUnicodeCodepoint);
                        }
                        sink.put(&[EscapeProcessor::process_simple_escape(byte)?])?;
                        self.state = ScanState::Body;
                    }
                }
                ScanState::Unicode => {
                    input.bump();
                    run_start = input.pos();
                    if self.unicode.add_hex_digit(byte)? {
                        self.unicode.flush_to(sink)?;
                        self.state = ScanState::Body;
                    }
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StringState {
    Start,
    InBody,
    Done,
}

/// Resumable parse of a string value into an owned buffer.
pub struct StringFrame {
    state: StringState,
    scanner: StringScanner,
    buf: Vec<u8>,
}

impl StringFrame {
    pub fn new() -> Self {
        Self {
            state: StringState::Start,
            scanner: StringScanner::new(),
            buf: Vec::new(),
        }
    }
}

impl Default for StringFrame {
    fn default() -> Self {
        Self::new()
    }
}

impl ParseFrame for StringFrame {
    fn resume(
        &mut self,
        input: &mut InputCursor<'_>,
        _scratch: &mut Scratch,
    ) -> Result<Step<dyn ParseFrame>, ParseError> {
        if self.state == StringState::Start {
            match input.significant()? {
                None => return Ok(Step::Pause),
                Some(b'"') => {
                    input.bump();
                    self.state = StringState::InBody;
                }
                Some(_) => {
                    return Err(ParseError::TypeMismatch {
                        expected: JsonType::String,
                        offset: input.offset(),
                    })
                }
            }
        }
        match self.scanner.scan(input, &mut self.buf)? {
            Scan::Pending => Ok(Step::Pause),
            Scan::Done { tail } => {
                self.buf.put(tail)?;
                self.state = StringState::Done;
                Ok(Step::Complete)
            }
        }
    }

    fn deliver(self: Box<Self>, slot: &mut dyn Any) -> Result<(), ParseError> {
        let mut value =
            String::from_utf8(self.buf).map_err(|e| ParseError::InvalidUtf8(e.utf8_error()))?;
        trim(&mut value);
        deliver_into(slot, value)
    }
}

/// Gives back spare capacity once it exceeds a quarter of the allocation.
fn trim(value: &mut String) {
    let capacity = value.capacity();
    if capacity - value.len() > capacity / 4 {
        value.shrink_to_fit();
    }
}

impl Json for String {
    const JSON_TYPE: JsonType = JsonType::String;

    fn parse_frame() -> Box<dyn ParseFrame> {
        Box::new(StringFrame::new())
    }

    fn generate_frame(&self) -> Result<GenFrame<'_>, GenerateError> {
        Ok(Box::new(StringGen {
            text: self.as_bytes(),
            emit: StrEmit::new(),
        }))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EmitPhase {
    Open,
    Body,
    Close,
}

/// Incremental writer for a quoted, escaped string.
///
/// Plain runs are copied up to the space left in the output; only an escape
/// sequence or a quote can be spilled.
#[derive(Debug, Clone)]
pub struct StrEmit {
    phase: EmitPhase,
    pos: usize,
}

impl StrEmit {
    pub fn new() -> Self {
        Self {
            phase: EmitPhase::Open,
            pos: 0,
        }
    }

    /// Writes as much of `text` as fits. Returns true once the closing quote is out.
    pub fn emit(&mut self, text: &[u8], out: &mut Output<'_>) -> Result<bool, GenerateError> {
        loop {
            if out.is_full() {
                return Ok(false);
            }
            match self.phase {
                EmitPhase::Open => {
                    out.token(b"\"")?;
                    self.phase = EmitPhase::Body;
                }
                EmitPhase::Body => {
                    let rest = text.get(self.pos..).unwrap_or_default();
                    let Some(&first) = rest.first() else {
                        self.phase = EmitPhase::Close;
                        continue;
                    };
                    match EscapeProcessor::escape_byte(first) {
                        Some((seq, len)) => {
                            out.token(seq.get(..len).unwrap_or_default())?;
                            self.pos += 1;
                        }
                        None => {
                            let run = rest
                                .iter()
                                .position(|&b| EscapeProcessor::needs_escape(b))
                                .unwrap_or(rest.len());
                            self.pos += out.put_partial(rest.get(..run).unwrap_or_default());
                        }
                    }
                }
                EmitPhase::Close => {
                    out.token(b"\"")?;
                    return Ok(true);
                }
            }
        }
    }
}

impl Default for StrEmit {
    fn default() -> Self {
        Self::new()
    }
}

/// Generate frame for a string value.
pub struct StringGen<'a> {
    text: &'a [u8],
    emit: StrEmit,
}

impl<'a> GenerateFrame<'a> for StringGen<'a> {
    fn resume(
        &mut self,
        out: &mut Output<'_>,
    ) -> Result<Step<dyn GenerateFrame<'a> + 'a>, GenerateError> {
        if self.emit.emit(self.text, out)? {
            Ok(Step::Complete)
        } else {
            Ok(Step::Pause)
        }
    }
}
