//! `InterpreterBuilder` for creating Interpreter instances with various configurations.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use super::Interpreter;
use crate::builtins::BuiltinRegistry;
use crate::diagnostics::{CallStack, DEFAULT_MAX_DEPTH};
use crate::environment::Scope;
use crate::extensions::{ExtensionHost, Hooks};
use crate::namespace::Namespace;
use crate::print_handler::{stdout_handler, SharedPrintHandler};

/// Builder for [`Interpreter`].
///
/// Several interpreters that should share one environment tree (one per
/// script thread) are built with clones of the same `globals` scope and
/// `namespace`.
pub struct InterpreterBuilder {
    namespace: Option<Namespace>,
    globals: Option<Scope>,
    max_depth: Option<usize>,
    print_handler: Option<SharedPrintHandler>,
    builtins: Option<Arc<BuiltinRegistry>>,
    hooks: Option<Arc<Hooks>>,
}

impl InterpreterBuilder {
    pub fn new() -> Self {
        Self {
            namespace: None,
            globals: None,
            max_depth: Some(DEFAULT_MAX_DEPTH),
            print_handler: None,
            builtins: None,
            hooks: None,
        }
    }

    /// Namespace service to route environment writes through. Defaults to
    /// direct (unbuffered) operation.
    #[must_use]
    pub fn namespace(mut self, ns: Namespace) -> Self {
        self.namespace = Some(ns);
        self
    }

    /// Global scope to run in. Defaults to a fresh one.
    #[must_use]
    pub fn globals(mut self, scope: Scope) -> Self {
        self.globals = Some(scope);
        self
    }

    /// Maximum user-function call depth; `None` for unlimited.
    #[must_use]
    pub fn max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set the print handler for `PRINT`. Default is stdout.
    #[must_use]
    pub fn print_handler(mut self, handler: SharedPrintHandler) -> Self {
        self.print_handler = Some(handler);
        self
    }

    /// Builtin table. Defaults to the core builtins.
    #[must_use]
    pub fn builtins(mut self, builtins: Arc<BuiltinRegistry>) -> Self {
        self.builtins = Some(builtins);
        self
    }

    /// Take builtins and hooks from an extension host.
    #[must_use]
    pub fn extensions(mut self, host: ExtensionHost) -> Self {
        let (builtins, hooks) = host.into_parts();
        self.builtins = Some(Arc::new(builtins));
        self.hooks = Some(Arc::new(hooks));
        self
    }

    pub fn build(self) -> Interpreter {
        let globals = self.globals.unwrap_or_else(Scope::global);
        Interpreter {
            ns: self.namespace.unwrap_or_default(),
            scope: globals.clone(),
            globals,
            builtins: self
                .builtins
                .unwrap_or_else(|| Arc::new(BuiltinRegistry::core())),
            hooks: self.hooks.unwrap_or_default(),
            functions: FxHashMap::default(),
            print: self.print_handler.unwrap_or_else(stdout_handler),
            call_stack: CallStack::new(self.max_depth),
            error: None,
            loop_depth: 0,
            executed: 0,
        }
    }
}

impl Default for InterpreterBuilder {
    fn default() -> Self {
        Self::new()
    }
}
