//! Call-frame tracking for the evaluator.
//!
//! `CallStack` records one `CallFrame` per active user-function call. The
//! depth check lives in `push()`, so the recursion limit is enforced in one
//! place, and `capture()` snapshots the frames into an `EvalBacktrace` when
//! an error escapes a call.

use prefix_ir::Location;

use crate::errors::{recursion_limit_exceeded, BacktraceFrame, EvalBacktrace, EvalError};

/// Default frame limit for interpreters built without an explicit one.
pub const DEFAULT_MAX_DEPTH: usize = 1_000;

/// A single frame in the live call stack.
#[derive(Clone, Debug)]
pub struct CallFrame {
    /// Called function.
    pub name: String,
    /// Call site (where the call was made, not the definition).
    pub call_site: Location,
}

/// Live call stack of one interpreter.
///
/// # Example
///
/// ```text
/// let mut stack = CallStack::new(Some(200));
/// stack.push(CallFrame { name, call_site })?;
/// // ... evaluate function body ...
/// stack.pop();
/// ```
#[derive(Clone, Debug)]
pub struct CallStack {
    frames: Vec<CallFrame>,
    max_depth: Option<usize>,
}

impl CallStack {
    /// `max_depth` is `None` for unlimited recursion.
    pub fn new(max_depth: Option<usize>) -> Self {
        Self {
            frames: Vec::new(),
            max_depth,
        }
    }

    /// Push a call frame, checking the depth limit. The frame is not pushed
    /// on overflow.
    pub fn push(&mut self, frame: CallFrame) -> Result<(), EvalError> {
        if let Some(max) = self.max_depth {
            if self.frames.len() >= max {
                return Err(recursion_limit_exceeded(max));
            }
        }
        self.frames.push(frame);
        Ok(())
    }

    pub fn pop(&mut self) {
        debug_assert!(
            !self.frames.is_empty(),
            "CallStack::pop() called on empty stack"
        );
        self.frames.pop();
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    #[inline]
    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    /// Snapshot of the live frames, outermost first.
    pub fn capture(&self) -> EvalBacktrace {
        EvalBacktrace::new(
            self.frames
                .iter()
                .map(|f| BacktraceFrame {
                    name: f.name.clone(),
                    location: f.call_site,
                })
                .collect(),
        )
    }

    /// Attach a backtrace from this call stack to an error.
    pub fn attach_backtrace(&self, err: EvalError) -> EvalError {
        if self.frames.is_empty() {
            return err;
        }
        err.with_backtrace(self.capture())
    }
}

impl Default for CallStack {
    fn default() -> Self {
        Self::new(Some(DEFAULT_MAX_DEPTH))
    }
}
