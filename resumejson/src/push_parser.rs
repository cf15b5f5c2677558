// SPDX-License-Identifier: Apache-2.0

//! The incremental parse engine.

use core::any::Any;
use core::marker::PhantomData;

use log::debug;

use crate::continuation::{
    ContinuationStack, DefaultConfig, Driver, RunState, Scratch, StackConfig, Step,
};
use crate::frame::ParseFrame;
use crate::input_cursor::InputCursor;
use crate::metadata::Json;
use crate::parse_error::ParseError;

/// Lifecycle of a [`PushParser`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    /// Nothing fed yet.
    Created,
    /// Inside [`PushParser::feed`].
    Running,
    /// Waiting for more input in the middle of the document.
    Paused,
    /// The root value is complete. Only whitespace may follow.
    Finished,
    /// A feed failed. Every later call returns the same error.
    Errored,
}

/// Runs parse frames against one chunk of input.
struct ParseDriver<'i, 'r> {
    input: InputCursor<'i>,
    root: &'r mut dyn Any,
}

impl Driver for ParseDriver<'_, '_> {
    type Frame = dyn ParseFrame;
    type Error = ParseError;

    fn resume(
        &mut self,
        frame: &mut Self::Frame,
        scratch: &mut Scratch,
    ) -> Result<Step<dyn ParseFrame>, ParseError> {
        frame.resume(&mut self.input, scratch)
    }

    fn complete(
        &mut self,
        done: Box<dyn ParseFrame>,
        parent: Option<&mut Self::Frame>,
    ) -> Result<(), ParseError> {
        match parent {
            Some(parent) => parent.accept(done),
            None => done.deliver(self.root),
        }
    }
}

/// Parses a `T` from input delivered in chunks of any size.
///
/// Nothing is buffered beyond the partial token at the end of a chunk, and
/// nesting depth is limited only by `C`, never by the host stack. Dropping
/// the parser at any point releases everything built so far.
///
/// ```
/// use resumejson::PushParser;
///
/// let mut parser = PushParser::<Vec<u32>>::new();
/// parser.feed(b"[1, 2").unwrap();
/// parser.feed(b"3, 4]").unwrap();
/// assert_eq!(parser.finish().unwrap(), vec![1, 23, 4]);
/// ```
pub struct PushParser<T: Json, C: StackConfig = DefaultConfig> {
    stack: ContinuationStack<dyn ParseFrame>,
    value: T,
    state: ParserState,
    error: Option<ParseError>,
    /// Bytes fed so far.
    offset: usize,
    _config: PhantomData<C>,
}

impl<T: Json, C: StackConfig> PushParser<T, C> {
    /// Creates a parser with the root frame for `T` queued.
    pub fn new() -> Self {
        debug!("new parser for {}", T::metadata().name());
        let mut parser = Self {
            stack: ContinuationStack::unreserved::<C>(),
            value: T::default(),
            state: ParserState::Created,
            error: None,
            offset: 0,
            _config: PhantomData,
        };
        let queued = ContinuationStack::new::<C>().and_then(|mut stack| {
            stack.push((T::metadata().parse)())?;
            Ok(stack)
        });
        match queued {
            Ok(stack) => parser.stack = stack,
            Err(e) => {
                parser.fail(e.into());
            }
        }
        parser
    }

    /// Parses the next chunk of the document.
    ///
    /// Bytes after the end of the root value must be whitespace.
    pub fn feed(&mut self, data: &[u8]) -> Result<(), ParseError> {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }
        self.state = ParserState::Running;
        let mut driver = ParseDriver {
            input: InputCursor::new(data, self.offset, false),
            root: &mut self.value,
        };
        let outcome = if self.stack.is_empty() {
            Ok(RunState::Done)
        } else {
            self.stack.run(&mut driver)
        };
        let result = match outcome {
            Ok(RunState::Paused) => {
                self.state = ParserState::Paused;
                Ok(())
            }
            Ok(RunState::Done) => {
                driver.input.skip_whitespace();
                match driver.input.peek() {
                    Some(byte) => Err(driver.input.unexpected(byte)),
                    None => {
                        self.state = ParserState::Finished;
                        Ok(())
                    }
                }
            }
            Err(e) => Err(e),
        };
        self.offset += data.len();
        result.map_err(|e| self.fail(e))
    }

    /// Ends the document and hands over the parsed value.
    ///
    /// Fails if the document is incomplete or any feed failed.
    pub fn finish(mut self) -> Result<T, ParseError> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        if !self.stack.is_empty() {
            let mut driver = ParseDriver {
                input: InputCursor::new(&[], self.offset, true),
                root: &mut self.value,
            };
            match self.stack.run(&mut driver) {
                Ok(RunState::Done) => {}
                Ok(RunState::Paused) => return Err(self.fail(ParseError::EndOfData)),
                Err(e) => return Err(self.fail(e)),
            }
        }
        self.state = ParserState::Finished;
        debug!("parse complete after {} bytes", self.offset);
        Ok(core::mem::take(&mut self.value))
    }

    /// Abandons the parse, releasing the partially built value.
    pub fn destroy(self) {
        debug!(
            "parser destroyed in state {:?} with {} live frames",
            self.state,
            self.stack.depth()
        );
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    /// Total bytes fed so far.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Live continuation frames.
    pub fn depth(&self) -> usize {
        self.stack.depth()
    }

    /// Records the first error and releases every frame. Returns the error.
    fn fail(&mut self, err: ParseError) -> ParseError {
        debug!("parse failed: {}", err);
        self.state = ParserState::Errored;
        self.stack.teardown();
        self.error = Some(err.clone());
        err
    }
}

impl<T: Json, C: StackConfig> Default for PushParser<T, C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DepthLimit, JsonType, Variant};
    use test_log::test;

    #[test]
    fn test_lifecycle() {
        let mut parser = PushParser::<Vec<bool>>::new();
        assert_eq!(parser.state(), ParserState::Created);
        parser.feed(b"[tr").unwrap();
        assert_eq!(parser.state(), ParserState::Paused);
        parser.feed(b"ue]").unwrap();
        assert_eq!(parser.state(), ParserState::Finished);
        parser.feed(b"  \n").unwrap();
        assert_eq!(parser.offset(), 9);
        assert_eq!(parser.finish(), Ok(vec![true]));
    }

    #[test]
    fn test_errors_are_sticky() {
        let mut parser = PushParser::<Vec<bool>>::new();
        let err = parser.feed(b"[x").unwrap_err();
        assert_eq!(
            err,
            ParseError::TypeMismatch {
                expected: JsonType::Bool,
                offset: 1
            }
        );
        assert_eq!(parser.state(), ParserState::Errored);
        assert_eq!(parser.depth(), 0);
        assert_eq!(parser.feed(b"true]"), Err(err.clone()));
        assert_eq!(parser.finish(), Err(err));
    }

    #[test]
    fn test_trailing_garbage() {
        let mut parser = PushParser::<bool>::new();
        assert_eq!(
            parser.feed(b"true x"),
            Err(ParseError::UnexpectedByte {
                byte: b'x',
                offset: 5
            })
        );

        let mut parser = PushParser::<bool>::new();
        parser.feed(b"false").unwrap();
        assert!(parser.feed(b" ,").is_err());
    }

    #[test]
    fn test_empty_feeds() {
        let mut parser = PushParser::<String>::new();
        parser.feed(b"").unwrap();
        parser.feed(b"\"a").unwrap();
        parser.feed(b"").unwrap();
        parser.feed(b"\"").unwrap();
        assert_eq!(parser.finish().unwrap(), "a");
    }

    #[test]
    fn test_incomplete_document() {
        let mut parser = PushParser::<Variant>::new();
        parser.feed(br#"{"a":"#).unwrap();
        assert_eq!(parser.finish(), Err(ParseError::EndOfData));

        let parser = PushParser::<Variant>::new();
        assert_eq!(parser.finish(), Err(ParseError::EndOfData));
    }

    #[test]
    fn test_depth_limit() {
        let mut parser = PushParser::<Vec<Vec<Vec<i32>>>, DepthLimit<3>>::new();
        assert!(parser.feed(b"[[[1]]]").is_err_and(|e| e == ParseError::MaxDepthReached(3)));

        let mut parser = PushParser::<Vec<Vec<i32>>, DepthLimit<3>>::new();
        parser.feed(b"[[1],[2]]").unwrap();
        assert_eq!(parser.finish(), Ok(vec![vec![1], vec![2]]));
    }

    #[test]
    fn test_destroy_mid_parse() {
        let mut parser = PushParser::<Variant>::new();
        parser.feed(br#"{"a":[1,{"b":"par"#).unwrap();
        assert!(parser.depth() > 3);
        parser.destroy();
    }
}
