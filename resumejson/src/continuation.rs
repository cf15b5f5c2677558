// SPDX-License-Identifier: Apache-2.0

//! Explicit continuation stack.
//!
//! Every nested parse or generate operation lives here as a boxed frame
//! instead of a host stack frame, so an operation can stop after any byte
//! and pick up again on the next buffer. Frames pushed since the last pause
//! form the "new" zone; frames carried across a pause form the "old" zone
//! beneath them. A separate scratch region holds partial tokens that have to
//! outlive the input chunk they were read from.

use log::trace;

/// Errors raised by the stack itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackError {
    /// Reserving room for a frame or scratch bytes failed.
    AllocationFailed,
    /// Pushing another frame would exceed the configured depth.
    DepthExceeded(usize),
}

/// What a frame asks the trampoline to do after it returns.
pub enum Step<F: ?Sized> {
    /// The frame finished; pop it and hand it to its parent.
    Complete,
    /// Push a child frame and run it before resuming this one.
    Call(Box<F>),
    /// Out of input or output; keep this frame and stop the run.
    Pause,
}

/// Outcome of [`ContinuationStack::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// A frame paused; the stack holds resumable state.
    Paused,
    /// Every frame completed.
    Done,
}

/// Per-operation context that knows how to resume frames and wire up results.
pub trait Driver {
    type Frame: ?Sized;
    type Error: From<StackError>;

    /// Runs one slice of `frame`.
    fn resume(
        &mut self,
        frame: &mut Self::Frame,
        scratch: &mut Scratch,
    ) -> Result<Step<Self::Frame>, Self::Error>;

    /// Consumes a completed frame, passing its result to `parent` or, at the
    /// bottom of the stack, to the operation itself.
    fn complete(
        &mut self,
        done: Box<Self::Frame>,
        parent: Option<&mut Self::Frame>,
    ) -> Result<(), Self::Error>;
}

/// Compile-time limits for a continuation stack.
pub trait StackConfig {
    /// Maximum number of live frames.
    const MAX_DEPTH: usize;
    /// Bytes reserved for the scratch region up front.
    const SCRATCH_CAPACITY: usize = 64;
}

/// Unbounded depth with a small initial scratch reservation.
pub struct DefaultConfig;

impl StackConfig for DefaultConfig {
    const MAX_DEPTH: usize = usize::MAX;
}

/// Caps nesting at `N` live frames.
///
/// Each JSON container and each pending member value takes one frame, plus
/// one for the scalar being read.
pub struct DepthLimit<const N: usize>;

impl<const N: usize> StackConfig for DepthLimit<N> {
    const MAX_DEPTH: usize = N;
}

/// Growable byte region for partial tokens and pending output.
#[derive(Debug, Default)]
pub struct Scratch {
    bytes: Vec<u8>,
}

impl Scratch {
    pub fn with_capacity(capacity: usize) -> Result<Self, StackError> {
        let mut scratch = Self::default();
        scratch.reserve(capacity)?;
        Ok(scratch)
    }

    /// Makes room for `additional` more bytes without moving existing ones.
    pub fn reserve(&mut self, additional: usize) -> Result<(), StackError> {
        self.bytes
            .try_reserve(additional)
            .map_err(|_| StackError::AllocationFailed)
    }

    pub fn push(&mut self, byte: u8) -> Result<(), StackError> {
        self.reserve(1)?;
        self.bytes.push(byte);
        Ok(())
    }

    pub fn extend(&mut self, bytes: &[u8]) -> Result<(), StackError> {
        self.reserve(bytes.len())?;
        self.bytes.extend_from_slice(bytes);
        Ok(())
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    /// Moves as many leading bytes as fit into `out`, returning the count.
    pub fn drain_into(&mut self, out: &mut [u8]) -> usize {
        let n = self.bytes.len().min(out.len());
        if let (Some(dst), Some(src)) = (out.get_mut(..n), self.bytes.get(..n)) {
            dst.copy_from_slice(src);
        }
        self.bytes.drain(..n);
        n
    }
}

/// Owner of every suspended frame of one operation.
pub struct ContinuationStack<F: ?Sized> {
    scratch: Scratch,
    frames: Vec<Box<F>>,
    /// `frames[..old_top]` survived the last pause.
    old_top: usize,
    max_depth: usize,
}

impl<F: ?Sized> ContinuationStack<F> {
    pub fn new<C: StackConfig>() -> Result<Self, StackError> {
        let mut stack = Self::unreserved::<C>();
        stack.scratch.reserve(C::SCRATCH_CAPACITY)?;
        Ok(stack)
    }

    /// A stack that has not allocated anything yet.
    pub fn unreserved<C: StackConfig>() -> Self {
        Self {
            scratch: Scratch::default(),
            frames: Vec::new(),
            old_top: 0,
            max_depth: C::MAX_DEPTH,
        }
    }

    /// Queues `frame` on top of the new zone.
    pub fn push(&mut self, frame: Box<F>) -> Result<(), StackError> {
        if self.frames.len() >= self.max_depth {
            return Err(StackError::DepthExceeded(self.max_depth));
        }
        self.frames
            .try_reserve(1)
            .map_err(|_| StackError::AllocationFailed)?;
        self.frames.push(frame);
        trace!("push frame, depth {}", self.frames.len());
        Ok(())
    }

    /// Folds the new zone into the old one. A no-op when nothing new was pushed.
    pub fn begin_pause(&mut self) {
        if self.old_top != self.frames.len() {
            trace!(
                "pause: {} new frames join {} old",
                self.frames.len() - self.old_top,
                self.old_top
            );
            self.old_top = self.frames.len();
        }
    }

    /// Resumes frames, newest first, until one pauses, one fails, or none remain.
    pub fn run<D>(&mut self, driver: &mut D) -> Result<RunState, D::Error>
    where
        D: Driver<Frame = F>,
    {
        loop {
            let Some(top) = self.frames.last_mut() else {
                return Ok(RunState::Done);
            };
            match driver.resume(&mut **top, &mut self.scratch)? {
                Step::Call(child) => self.push(child)?,
                Step::Pause => {
                    self.begin_pause();
                    return Ok(RunState::Paused);
                }
                Step::Complete => {
                    let Some(done) = self.frames.pop() else {
                        return Ok(RunState::Done);
                    };
                    self.old_top = self.old_top.min(self.frames.len());
                    let parent = self.frames.last_mut().map(|frame| &mut **frame);
                    driver.complete(done, parent)?;
                }
            }
        }
    }

    /// Drops every remaining frame, newest first, along with whatever
    /// partially built value each one owns.
    pub fn teardown(&mut self) {
        if !self.frames.is_empty() {
            trace!("teardown: releasing {} frames", self.frames.len());
        }
        while let Some(frame) = self.frames.pop() {
            drop(frame);
        }
        self.old_top = 0;
        self.scratch.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Frames carried over from before the last pause.
    pub fn old_len(&self) -> usize {
        self.old_top
    }

    /// Frames pushed since the last pause.
    pub fn new_len(&self) -> usize {
        self.frames.len() - self.old_top
    }

    pub fn scratch(&self) -> &Scratch {
        &self.scratch
    }

    pub fn scratch_mut(&mut self) -> &mut Scratch {
        &mut self.scratch
    }
}

impl<F: ?Sized> Drop for ContinuationStack<F> {
    fn drop(&mut self) {
        self.teardown();
    }
}
