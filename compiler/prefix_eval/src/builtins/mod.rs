//! Builtin operator table.
//!
//! A flat map from operator name to [`BuiltinEntry`]. The evaluator looks
//! a call target up here before trying user functions. Extensions add to
//! the same table through [`ExtensionHost`](crate::extensions::ExtensionHost).
//!
//! A builtin receives the evaluated arguments plus their AST nodes, so
//! operators like `DEL(x)` can see the identifier instead of its value.
//! Positions listed in `lazy` are not evaluated at all and arrive as
//! `Null`, as do optional parameters skipped over by keyword arguments.

mod arith;
mod collections;
mod compare;
mod convert;
mod io;
mod ns_ops;

use std::fmt;
use std::sync::Arc;

use prefix_ir::{Expr, ExprKind, Location};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::environment::Scope;
use crate::errors::{EvalError, EvalResult};
use crate::interpreter::Interpreter;
use crate::value::Value;

/// Builtin implementation.
pub type BuiltinFn = Arc<dyn Fn(&mut Interpreter, &BuiltinCall<'_>) -> EvalResult + Send + Sync>;

/// Arguments and context handed to a builtin.
pub struct BuiltinCall<'a> {
    /// Name the builtin was called by.
    pub name: &'a str,
    pub args: SmallVec<[Value; 4]>,
    /// Argument expressions, aligned with `args`. `None` for an optional
    /// parameter skipped by a later keyword argument.
    pub nodes: SmallVec<[Option<&'a Expr>; 4]>,
    /// Scope of the call site.
    pub scope: Scope,
    pub loc: Location,
}

impl BuiltinCall<'_> {
    #[inline]
    pub fn arg(&self, i: usize) -> &Value {
        &self.args[i]
    }

    #[inline]
    pub fn argc(&self) -> usize {
        self.args.len()
    }

    /// Expression written at position `i`.
    pub fn node(&self, i: usize) -> Option<&Expr> {
        self.nodes.get(i).copied().flatten()
    }

    /// The identifier written at position `i`, if it is a plain name.
    pub fn ident(&self, i: usize) -> Option<&str> {
        self.node(i).and_then(Expr::as_ident)
    }

    /// The name behind a pointer literal `@name` at position `i`.
    pub fn ptr_target(&self, i: usize) -> Option<&str> {
        match &self.node(i)?.kind {
            ExprKind::Ptr(name) => Some(name),
            _ => None,
        }
    }

    pub fn int(&self, i: usize) -> Result<i64, EvalError> {
        match self.arg(i) {
            Value::Int(n) => Ok(*n),
            _ => Err(EvalError::new(format!("{} expects INT argument", self.name))),
        }
    }

    pub fn str(&self, i: usize) -> Result<&str, EvalError> {
        match self.arg(i) {
            Value::Str(s) => Ok(s),
            _ => Err(EvalError::new(format!("{} expects STR argument", self.name))),
        }
    }
}

/// One operator: arity bounds, keyword names, unevaluated positions.
#[derive(Clone)]
pub struct BuiltinEntry {
    pub min: usize,
    /// `None` for variadic.
    pub max: Option<usize>,
    /// Parameter names accepted as keywords, by position.
    pub params: &'static [&'static str],
    /// Argument positions passed unevaluated.
    pub lazy: &'static [usize],
    pub func: BuiltinFn,
}

impl BuiltinEntry {
    pub fn new(
        min: usize,
        max: Option<usize>,
        func: impl Fn(&mut Interpreter, &BuiltinCall<'_>) -> EvalResult + Send + Sync + 'static,
    ) -> Self {
        Self {
            min,
            max,
            params: &[],
            lazy: &[],
            func: Arc::new(func),
        }
    }

    #[must_use]
    pub fn with_params(mut self, params: &'static [&'static str]) -> Self {
        self.params = params;
        self
    }

    #[must_use]
    pub fn with_lazy(mut self, lazy: &'static [usize]) -> Self {
        self.lazy = lazy;
        self
    }

    #[inline]
    pub fn is_lazy(&self, position: usize) -> bool {
        self.lazy.contains(&position)
    }

    pub fn param_index(&self, name: &str) -> Option<usize> {
        self.params.iter().position(|p| *p == name)
    }
}

impl fmt::Debug for BuiltinEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuiltinEntry")
            .field("min", &self.min)
            .field("max", &self.max)
            .field("params", &self.params)
            .field("lazy", &self.lazy)
            .finish_non_exhaustive()
    }
}

/// Name-keyed builtin table.
#[derive(Clone, Default)]
pub struct BuiltinRegistry {
    entries: FxHashMap<String, BuiltinEntry>,
}

impl BuiltinRegistry {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The operators every interpreter ships with.
    pub fn core() -> Self {
        let mut reg = Self::new();
        arith::register(&mut reg);
        compare::register(&mut reg);
        convert::register(&mut reg);
        collections::register(&mut reg);
        io::register(&mut reg);
        ns_ops::register(&mut reg);
        reg
    }

    /// Add `name`. Returns `false` (and leaves the table alone) if the name
    /// is taken.
    pub fn insert(&mut self, name: impl Into<String>, entry: BuiltinEntry) -> bool {
        let name = name.into();
        if self.entries.contains_key(&name) {
            return false;
        }
        self.entries.insert(name, entry);
        true
    }

    /// Static registration; names in the core table are unique.
    fn add(&mut self, name: &str, entry: BuiltinEntry) {
        let inserted = self.insert(name, entry);
        debug_assert!(inserted, "duplicate core builtin {name}");
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<&BuiltinEntry> {
        self.entries.get(name)
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for BuiltinRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuiltinRegistry")
            .field("len", &self.entries.len())
            .finish_non_exhaustive()
    }
}

/// Both operands numeric and of the same type.
#[derive(Copy, Clone)]
enum NumPair {
    Int(i64, i64),
    Flt(f64, f64),
}

fn num_pair(call: &BuiltinCall<'_>) -> Result<NumPair, EvalError> {
    let name = call.name;
    match (call.arg(0), call.arg(1)) {
        (Value::Int(a), Value::Int(b)) => Ok(NumPair::Int(*a, *b)),
        (Value::Float(a), Value::Float(b)) => Ok(NumPair::Flt(*a, *b)),
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => Err(EvalError::new(
            format!("{name} cannot mix INT and FLT"),
        )),
        _ => Err(EvalError::new(format!(
            "{name} expects INT or FLT argument"
        ))),
    }
}
