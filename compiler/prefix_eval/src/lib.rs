//! Prefix Eval - runtime for the Prefix scripting language.
//!
//! # Architecture
//!
//! - `value`: runtime values; tensors and maps are shared handles
//! - `environment`: lexical scopes with typed, freezable, aliasable bindings
//! - `namespace`: the service every binding mutation goes through, either
//!   applied directly or queued through the write-buffer dispatcher
//! - `interpreter`: the tree-walking evaluator
//! - `builtins`: the operator table consulted before user functions
//! - `extensions`: registration of extra operators, event handlers and
//!   periodic hooks
//!
//! Several [`Interpreter`]s may share one global [`Scope`] and one
//! [`Namespace`] to run script threads concurrently.

pub mod builtins;
pub mod diagnostics;
pub mod environment;
pub mod errors;
pub mod extensions;
pub mod interpreter;
pub mod namespace;
pub mod print_handler;
pub mod value;

pub use builtins::{BuiltinCall, BuiltinEntry, BuiltinFn, BuiltinRegistry};
pub use diagnostics::{CallFrame, CallStack, DEFAULT_MAX_DEPTH};
pub use environment::{Binding, EnvError, EnvResult, Entry, FrozenState, Scope};
pub use errors::{EvalBacktrace, EvalError, EvalErrorKind, EvalResult};
pub use extensions::{
    extension_name, Extension, ExtensionContext, ExtensionError, ExtensionHost, Hooks,
    OperatorFlags,
};
pub use interpreter::{Flow, Interpreter, InterpreterBuilder, LabelKey, EVENT_EXIT, EVENT_START};
pub use namespace::{Namespace, NsOp};
pub use print_handler::{
    buffer_handler, silent_handler, stdout_handler, PrintHandlerImpl, SharedPrintHandler,
};
pub use value::{FuncValue, MapData, MapKey, Tensor, ThreadHandle, Value};
