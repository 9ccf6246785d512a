//! Runtime errors.
//!
//! `EvalErrorKind` is the structured category; the factory functions below
//! are the public way to build errors and keep `kind` and `message` in
//! sync. Errors are plain data: `TRY` blocks catch them by message.

use std::fmt;

use prefix_ir::Location;

use crate::environment::EnvError;
use crate::value::{TensorError, Value};

/// Result of evaluating an expression or a builtin.
pub type EvalResult = Result<Value, EvalError>;

/// Typed error category.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EvalErrorKind {
    // Bindings
    #[error("Undefined identifier '{name}'")]
    UndefinedIdentifier { name: String },
    #[error("Identifier '{name}' declared but not initialized")]
    Uninitialized { name: String },
    #[error("Cannot assign to undeclared identifier '{name}'")]
    UndeclaredIdentifier { name: String },
    #[error("Cannot assign to frozen identifier '{name}'")]
    FrozenIdentifier { name: String },
    #[error("Type mismatch: expected {expected} but got {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    // Calls
    #[error("Unknown function '{name}'")]
    UnknownFunction { name: String },
    #[error("{name} expects {expected} arguments, got {got}")]
    ArityMismatch {
        name: String,
        expected: String,
        got: usize,
    },
    #[error("Maximum recursion depth {depth} exceeded")]
    StackOverflow { depth: usize },

    // Control flow
    #[error("BREAK({count}) exceeds loop depth {depth}")]
    BreakDepthExceeded { count: i64, depth: usize },
    #[error("CONTINUE outside of loop")]
    ContinueOutsideLoop,
    #[error("GOTO target {label} not found")]
    LabelNotFound { label: String },

    // Arithmetic
    #[error("Division by zero")]
    DivisionByZero,

    #[error("Assertion failed")]
    AssertionFailed,

    /// Everything without a dedicated category, including `THROW` messages.
    #[error("{message}")]
    Custom { message: String },
}

/// A single frame in an error backtrace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BacktraceFrame {
    /// Called function.
    pub name: String,
    /// Call site.
    pub location: Location,
}

/// Snapshot of the call stack where an error was raised.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EvalBacktrace {
    frames: Vec<BacktraceFrame>,
}

impl EvalBacktrace {
    pub fn new(frames: Vec<BacktraceFrame>) -> Self {
        Self { frames }
    }

    pub fn frames(&self) -> &[BacktraceFrame] {
        &self.frames
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }
}

impl fmt::Display for EvalBacktrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.frames.is_empty() {
            return Ok(());
        }
        writeln!(f, "call stack (innermost first):")?;
        for (i, frame) in self.frames.iter().rev().enumerate() {
            writeln!(f, "  {i}: {} called at {}", frame.name, frame.location)?;
        }
        Ok(())
    }
}

/// Runtime error with its source location.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EvalError {
    pub kind: EvalErrorKind,
    /// Human-readable message; equals `kind.to_string()`.
    pub message: String,
    /// Where the error was raised. Filled in by the evaluator when the
    /// raising code did not know its location.
    pub location: Option<Location>,
    pub backtrace: Option<EvalBacktrace>,
}

impl EvalError {
    /// Uncategorized error.
    pub fn new(message: impl Into<String>) -> Self {
        Self::from_kind(EvalErrorKind::Custom {
            message: message.into(),
        })
    }

    fn from_kind(kind: EvalErrorKind) -> Self {
        let message = kind.to_string();
        Self {
            kind,
            message,
            location: None,
            backtrace: None,
        }
    }

    /// Set the location unless a real one is already recorded.
    #[must_use]
    pub fn at(mut self, loc: Location) -> Self {
        if self.location.is_none_or(Location::is_dummy) {
            self.location = Some(loc);
        }
        self
    }

    /// Attach a backtrace unless one is already recorded.
    #[must_use]
    pub fn with_backtrace(mut self, backtrace: EvalBacktrace) -> Self {
        if self.backtrace.is_none() && !backtrace.is_empty() {
            self.backtrace = Some(backtrace);
        }
        self
    }

    /// `message` or `message at line:col`.
    pub fn describe(&self) -> String {
        match self.location {
            Some(loc) if !loc.is_dummy() => format!("{} at {loc}", self.message),
            _ => self.message.clone(),
        }
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for EvalError {}

impl From<TensorError> for EvalError {
    fn from(e: TensorError) -> Self {
        EvalError::new(e.to_string())
    }
}

// Bindings

#[cold]
pub fn undefined_identifier(name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UndefinedIdentifier {
        name: name.to_string(),
    })
}

#[cold]
pub fn uninitialized(name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::Uninitialized {
        name: name.to_string(),
    })
}

#[cold]
pub fn undeclared_identifier(name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UndeclaredIdentifier {
        name: name.to_string(),
    })
}

#[cold]
pub fn frozen_identifier(name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::FrozenIdentifier {
        name: name.to_string(),
    })
}

#[cold]
pub fn type_mismatch(expected: &'static str, found: &'static str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::TypeMismatch { expected, found })
}

/// Translate an environment failure on `name` into a runtime error.
#[cold]
pub fn from_env(name: &str, err: &EnvError) -> EvalError {
    match err {
        EnvError::NotFound(_) => undeclared_identifier(name),
        EnvError::Frozen(_) | EnvError::Permafrozen(_) => frozen_identifier(name),
        EnvError::TypeMismatch {
            expected, found, ..
        } => type_mismatch(*expected, *found),
        other => EvalError::new(other.to_string()),
    }
}

// Calls

#[cold]
pub fn unknown_function(name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UnknownFunction {
        name: name.to_string(),
    })
}

#[cold]
pub fn arity_mismatch(name: &str, min: usize, max: Option<usize>, got: usize) -> EvalError {
    let expected = match max {
        Some(max) if max == min => min.to_string(),
        Some(max) => format!("{min} to {max}"),
        None => format!("at least {min}"),
    };
    EvalError::from_kind(EvalErrorKind::ArityMismatch {
        name: name.to_string(),
        expected,
        got,
    })
}

#[cold]
pub fn recursion_limit_exceeded(limit: usize) -> EvalError {
    EvalError::from_kind(EvalErrorKind::StackOverflow { depth: limit })
}

// Control flow

#[cold]
pub fn break_depth_exceeded(count: i64, depth: usize) -> EvalError {
    EvalError::from_kind(EvalErrorKind::BreakDepthExceeded { count, depth })
}

#[cold]
pub fn continue_outside_loop() -> EvalError {
    EvalError::from_kind(EvalErrorKind::ContinueOutsideLoop)
}

#[cold]
pub fn label_not_found(label: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::LabelNotFound {
        label: label.to_string(),
    })
}

// Builtins

#[cold]
pub fn division_by_zero() -> EvalError {
    EvalError::from_kind(EvalErrorKind::DivisionByZero)
}

#[cold]
pub fn assertion_failed() -> EvalError {
    EvalError::from_kind(EvalErrorKind::AssertionFailed)
}
