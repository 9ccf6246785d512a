//! Tree-walking interpreter for Prefix.
//!
//! # Architecture
//!
//! - `stmt` - statement execution, blocks with labels, loops, try/catch
//! - `expr` - literals, identifier reads, tensor/map literals, indexing
//! - `call` - builtin and user-function calls, keyword binding
//!
//! Statements produce a [`Flow`]; runtime errors travel as `Err(EvalError)`
//! and are caught by the nearest `TRY`. Every environment access goes
//! through the [`Namespace`] so the same evaluator runs unchanged whether
//! the write-buffer is active or not.
//!
//! Builtins may also report failure through the sticky error slot
//! ([`Interpreter::raise`]); the evaluator drains it after every builtin
//! call.

mod builder;
mod call;
mod expr;
mod stmt;

pub use builder::InterpreterBuilder;

use std::sync::Arc;

use prefix_ir::{Location, Program};
use rustc_hash::FxHashMap;

use crate::builtins::BuiltinRegistry;
use crate::diagnostics::CallStack;
use crate::environment::Scope;
use crate::errors::{label_not_found, EvalError};
use crate::extensions::Hooks;
use crate::namespace::Namespace;
use crate::print_handler::SharedPrintHandler;
use crate::value::{FuncValue, MapKey, Value};

/// Event fired before a program's first statement.
pub const EVENT_START: &str = "start";
/// Event fired after a program finishes, successfully or not.
pub const EVENT_EXIT: &str = "exit";

/// Key of a `GOTOPOINT` label.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum LabelKey {
    Int(i64),
    Str(String),
}

impl LabelKey {
    fn from_value(v: &Value) -> Option<Self> {
        match v {
            Value::Int(n) => Some(LabelKey::Int(*n)),
            Value::Str(s) => Some(LabelKey::Str(s.clone())),
            _ => None,
        }
    }

    fn display(&self) -> String {
        match self {
            LabelKey::Int(n) => Value::Int(*n).to_string(),
            LabelKey::Str(s) => s.clone(),
        }
    }
}

/// How a statement finished.
#[derive(Debug)]
pub enum Flow {
    Normal,
    Return(Value),
    /// Leave this many enclosing loops.
    Break(i64),
    Continue,
    /// Jump to a label; resolved by the innermost block that defines it.
    Goto(LabelKey),
}

/// The evaluator state for one logical script thread.
///
/// Interpreters sharing a global [`Scope`] and a [`Namespace`] may run on
/// different OS threads at the same time.
pub struct Interpreter {
    ns: Namespace,
    globals: Scope,
    /// Scope new bindings land in: the globals, or a function call's frame.
    scope: Scope,
    builtins: Arc<BuiltinRegistry>,
    hooks: Arc<Hooks>,
    functions: FxHashMap<String, FuncValue>,
    print: SharedPrintHandler,
    call_stack: CallStack,
    error: Option<EvalError>,
    loop_depth: usize,
    executed: u64,
}

impl Interpreter {
    /// Interpreter with a fresh global scope, direct namespace, core
    /// builtins and stdout output.
    pub fn new() -> Self {
        InterpreterBuilder::new().build()
    }

    pub fn builder() -> InterpreterBuilder {
        InterpreterBuilder::new()
    }

    #[inline]
    pub fn namespace(&self) -> &Namespace {
        &self.ns
    }

    #[inline]
    pub fn globals(&self) -> &Scope {
        &self.globals
    }

    /// The scope currently receiving bindings.
    #[inline]
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    #[inline]
    pub fn builtins(&self) -> &BuiltinRegistry {
        &self.builtins
    }

    #[inline]
    pub fn print_handler(&self) -> &SharedPrintHandler {
        &self.print
    }

    #[inline]
    pub fn call_depth(&self) -> usize {
        self.call_stack.depth()
    }

    /// Statements executed so far.
    #[inline]
    pub fn executed_statements(&self) -> u64 {
        self.executed
    }

    /// Captured `PRINT` output (empty unless a buffer handler is installed).
    pub fn get_print_output(&self) -> String {
        self.print.get_output()
    }

    /// Record a failure from inside a builtin. The first error wins until
    /// the evaluator drains the slot.
    pub fn raise(&mut self, err: EvalError) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }

    #[inline]
    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    /// Drain the sticky error slot.
    fn take_error(&mut self) -> Option<EvalError> {
        self.error.take()
    }

    /// Run a whole program in the global scope.
    ///
    /// Fires the `start` and `exit` events around the run. A `RETURN` at top
    /// level ends the program with its value.
    pub fn run(&mut self, program: &Program) -> Result<Value, EvalError> {
        tracing::debug!(statements = program.body.len(), "program start");
        self.fire_event(EVENT_START)?;
        let result = self.exec_program(program);
        let exit = self.fire_event(EVENT_EXIT);
        tracing::debug!(
            ok = result.is_ok(),
            executed = self.executed,
            "program exit"
        );
        let value = result?;
        exit?;
        Ok(value)
    }

    fn exec_program(&mut self, program: &Program) -> Result<Value, EvalError> {
        match self.exec_block(&program.body)? {
            Flow::Return(v) => Ok(v),
            Flow::Goto(key) => Err(label_not_found(&key.display())),
            Flow::Normal | Flow::Break(_) | Flow::Continue => Ok(Value::Null),
        }
    }

    /// Call every handler registered for `event`.
    pub fn fire_event(&mut self, event: &str) -> Result<(), EvalError> {
        let hooks = Arc::clone(&self.hooks);
        for handler in hooks.event_handlers(event) {
            handler(self, event)?;
        }
        Ok(())
    }

    /// Count one executed statement and run any periodic hook that is due.
    fn tick(&mut self) -> Result<(), EvalError> {
        self.executed += 1;
        if self.hooks.has_periodic() {
            let hooks = Arc::clone(&self.hooks);
            for hook in hooks.due_periodic(self.executed) {
                hook(self)?;
            }
        }
        Ok(())
    }

    /// Run `f` with one more enclosing loop.
    fn in_loop<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        self.loop_depth += 1;
        let out = f(self);
        self.loop_depth -= 1;
        out
    }

    /// Attach `loc` and drain a pending sticky error into `result`.
    fn settle(&mut self, result: Result<Value, EvalError>, loc: Location) -> Result<Value, EvalError> {
        if let Some(err) = self.take_error() {
            return Err(err.at(loc));
        }
        result.map_err(|e| e.at(loc))
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

/// Map key from an evaluated value.
pub(crate) fn map_key(v: &Value) -> Result<MapKey, EvalError> {
    MapKey::from_value(v).ok_or_else(|| {
        EvalError::new(format!(
            "Map keys must be INT, FLT or STR, got {}",
            v.type_name()
        ))
    })
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
