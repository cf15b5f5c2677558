// SPDX-License-Identifier: Apache-2.0

//! The incremental generate engine.

use core::marker::PhantomData;

use log::debug;

use crate::continuation::{ContinuationStack, DefaultConfig, Driver, Scratch, StackConfig, Step};
use crate::frame::{GenerateFrame, Output};
use crate::metadata::Json;
use crate::parse_error::GenerateError;

/// Runs generate frames against one output buffer.
struct GenDriver<'a, 'o> {
    buf: &'o mut [u8],
    written: usize,
    _value: PhantomData<&'a ()>,
}

impl<'a> Driver for GenDriver<'a, '_> {
    type Frame = dyn GenerateFrame<'a> + 'a;
    type Error = GenerateError;

    fn resume(
        &mut self,
        frame: &mut (dyn GenerateFrame<'a> + 'a),
        scratch: &mut Scratch,
    ) -> Result<Step<dyn GenerateFrame<'a> + 'a>, GenerateError> {
        let mut out = Output::new(self.buf, &mut self.written, scratch);
        frame.resume(&mut out)
    }

    fn complete(
        &mut self,
        done: Box<dyn GenerateFrame<'a> + 'a>,
        _parent: Option<&mut (dyn GenerateFrame<'a> + 'a)>,
    ) -> Result<(), GenerateError> {
        drop(done);
        Ok(())
    }
}

/// Writes a value as compact JSON into caller-supplied buffers of any size.
///
/// ```
/// use resumejson::Generator;
///
/// let value = vec![String::from("a"), String::from("b")];
/// let mut gen = Generator::new(&value);
/// let mut text = Vec::new();
/// let mut buf = [0u8; 3];
/// while !gen.is_finished() {
///     let n = gen.generate(&mut buf).unwrap();
///     text.extend_from_slice(&buf[..n]);
/// }
/// assert_eq!(text, br#"["a","b"]"#);
/// ```
pub struct Generator<'a, C: StackConfig = DefaultConfig> {
    stack: ContinuationStack<dyn GenerateFrame<'a> + 'a>,
    error: Option<GenerateError>,
    produced: usize,
    _config: PhantomData<C>,
}

impl<'a> Generator<'a> {
    /// Creates a generator for `value` with the default configuration.
    pub fn new<T: Json>(value: &'a T) -> Self {
        Self::with_config(value)
    }
}

impl<'a, C: StackConfig> Generator<'a, C> {
    /// Creates a generator for `value` with the root frame queued.
    pub fn with_config<T: Json>(value: &'a T) -> Self {
        debug!("new generator for {}", T::metadata().name());
        let mut gen = Self {
            stack: ContinuationStack::unreserved::<C>(),
            error: None,
            produced: 0,
            _config: PhantomData,
        };
        let queued = value.generate_frame().and_then(|frame| {
            let mut stack = ContinuationStack::new::<C>()?;
            stack.push(frame)?;
            Ok(stack)
        });
        match queued {
            Ok(stack) => gen.stack = stack,
            Err(e) => {
                gen.fail(e);
            }
        }
        gen
    }

    /// Fills `out` with the next part of the document, returning the number
    /// of bytes written. Fewer than `out.len()` bytes means the document is
    /// complete.
    pub fn generate(&mut self, out: &mut [u8]) -> Result<usize, GenerateError> {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }
        let pending = self.stack.scratch_mut().drain_into(out);
        let mut driver = GenDriver {
            buf: out,
            written: pending,
            _value: PhantomData,
        };
        if !self.stack.is_empty() && self.stack.scratch().is_empty() {
            if let Err(e) = self.stack.run(&mut driver) {
                return Err(self.fail(e));
            }
        }
        let written = driver.written;
        self.produced += written;
        if self.is_finished() {
            debug!("generation complete after {} bytes", self.produced);
        }
        Ok(written)
    }

    /// True once every byte of the document has been handed out.
    pub fn is_finished(&self) -> bool {
        self.error.is_none() && self.stack.is_empty() && self.stack.scratch().is_empty()
    }

    /// Total bytes handed out so far.
    pub fn produced(&self) -> usize {
        self.produced
    }

    fn fail(&mut self, err: GenerateError) -> GenerateError {
        debug!("generation failed: {}", err);
        self.stack.teardown();
        self.error = Some(err.clone());
        err
    }
}
