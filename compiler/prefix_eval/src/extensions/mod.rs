//! Extension registration.
//!
//! An [`Extension`] contributes operators, event handlers and periodic
//! hooks. Registration happens once, before any interpreter is built:
//! the [`ExtensionHost`] runs each extension's `init` against a staging
//! [`ExtensionContext`], validates what was staged, and commits it into
//! the builtin table and the [`Hooks`] the interpreter consults.
//!
//! Extensions are compiled in and offered to the host through a catalog;
//! a pointer file (`.prex`) names which of them to enable.

mod pointer_file;

pub use pointer_file::{collect_libraries, parse_pointer_file, PointerEntry};

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bitflags::bitflags;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::builtins::{BuiltinCall, BuiltinEntry, BuiltinRegistry};
use crate::errors::{EvalError, EvalResult};
use crate::interpreter::Interpreter;

bitflags! {
    /// How an operator is registered.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct OperatorFlags: u8 {
        /// Register as `<extension>.<name>`.
        const MODULE = 1;
    }
}

/// Handler for a named interpreter event (`start`, `exit`).
pub type EventHandler = Arc<dyn Fn(&mut Interpreter, &str) -> Result<(), EvalError> + Send + Sync>;

/// Hook run every `n` executed statements.
pub type PeriodicHook = Arc<dyn Fn(&mut Interpreter) -> Result<(), EvalError> + Send + Sync>;

/// Extension registration failures.
#[derive(Debug, thiserror::Error)]
pub enum ExtensionError {
    #[error("Extension not found: {0}")]
    NotFound(String),
    #[error("Operator '{0}' is already registered")]
    DuplicateOperator(String),
    #[error("Extension '{0}' registered an operator with an empty name")]
    EmptyOperatorName(String),
    #[error("Extension '{0}' registered a periodic hook with period 0")]
    ZeroPeriod(String),
    #[error("Extension '{extension}' failed to initialize: {message}")]
    Init { extension: String, message: String },
    #[error("Failed to open .prex file: {}", .path.display())]
    PointerFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(".prex file includes itself: {}", .0.display())]
    PointerCycle(PathBuf),
    #[error("{source} (from {}:{line})", .path.display())]
    InPointerFile {
        path: PathBuf,
        line: usize,
        #[source]
        source: Box<ExtensionError>,
    },
}

/// A unit of optional functionality.
pub trait Extension: Send + Sync {
    /// Name used for `MODULE` prefixes and for de-duplicating loads.
    fn name(&self) -> &str;

    /// Register operators and hooks. An `Err` discards everything staged.
    fn init(&self, ctx: &mut ExtensionContext) -> Result<(), String>;
}

/// Staging area handed to [`Extension::init`].
pub struct ExtensionContext {
    extension: String,
    operators: Vec<(String, BuiltinEntry)>,
    events: Vec<(String, EventHandler)>,
    periodic: Vec<(u64, PeriodicHook)>,
}

impl ExtensionContext {
    fn new(extension: &str) -> Self {
        Self {
            extension: extension.to_owned(),
            operators: Vec::new(),
            events: Vec::new(),
            periodic: Vec::new(),
        }
    }

    /// Name of the extension being initialized.
    pub fn extension_name(&self) -> &str {
        &self.extension
    }

    /// Stage an operator taking `min..=max` arguments (`max = None` for
    /// variadic).
    pub fn register_operator(
        &mut self,
        name: &str,
        min: usize,
        max: Option<usize>,
        flags: OperatorFlags,
        func: impl Fn(&mut Interpreter, &BuiltinCall<'_>) -> EvalResult + Send + Sync + 'static,
    ) {
        self.register_entry(name, flags, BuiltinEntry::new(min, max, func));
    }

    /// Stage a fully described operator (keyword names, lazy positions).
    pub fn register_entry(&mut self, name: &str, flags: OperatorFlags, entry: BuiltinEntry) {
        let full = if flags.contains(OperatorFlags::MODULE) && !name.is_empty() {
            format!("{}.{name}", self.extension)
        } else {
            name.to_owned()
        };
        self.operators.push((full, entry));
    }

    pub fn register_event_handler(
        &mut self,
        event: &str,
        handler: impl Fn(&mut Interpreter, &str) -> Result<(), EvalError> + Send + Sync + 'static,
    ) {
        self.events.push((event.to_owned(), Arc::new(handler)));
    }

    /// Run `hook` after every `every` executed statements.
    pub fn register_periodic_hook(
        &mut self,
        every: u64,
        hook: impl Fn(&mut Interpreter) -> Result<(), EvalError> + Send + Sync + 'static,
    ) {
        self.periodic.push((every, Arc::new(hook)));
    }
}

/// Event handlers and periodic hooks, read by the interpreter.
#[derive(Clone, Default)]
pub struct Hooks {
    events: FxHashMap<String, Vec<EventHandler>>,
    periodic: Vec<(u64, PeriodicHook)>,
}

impl Hooks {
    /// Handlers for `event` in registration order.
    pub fn event_handlers<'a>(&'a self, event: &str) -> impl Iterator<Item = &'a EventHandler> {
        self.events.get(event).into_iter().flatten()
    }

    #[inline]
    pub fn has_periodic(&self) -> bool {
        !self.periodic.is_empty()
    }

    /// Hooks due after `executed` statements.
    pub fn due_periodic(&self, executed: u64) -> impl Iterator<Item = &PeriodicHook> {
        self.periodic
            .iter()
            .filter(move |(every, _)| executed % every == 0)
            .map(|(_, hook)| hook)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && self.periodic.is_empty()
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut events: Vec<(&str, usize)> = self
            .events
            .iter()
            .map(|(name, handlers)| (name.as_str(), handlers.len()))
            .collect();
        events.sort_unstable();
        f.debug_struct("Hooks")
            .field("events", &events)
            .field("periodic", &self.periodic.len())
            .finish()
    }
}

/// Extension name for a library path: the file name without its
/// extension. `/opt/ext/foo.so` is `foo`; an empty stem is `extension`.
pub fn extension_name(path: &str) -> String {
    let base = path.rsplit(['/', '\\']).next().unwrap_or(path);
    let stem = match base.rfind('.') {
        Some(dot) => &base[..dot],
        None => base,
    };
    if stem.is_empty() {
        "extension".to_owned()
    } else {
        stem.to_owned()
    }
}

/// Collects extensions into a builtin table and a hook set.
pub struct ExtensionHost {
    builtins: BuiltinRegistry,
    hooks: Hooks,
    catalog: FxHashMap<String, Arc<dyn Extension>>,
    loaded: FxHashSet<String>,
}

impl ExtensionHost {
    /// Host starting from the core builtins.
    pub fn new() -> Self {
        Self::with_builtins(BuiltinRegistry::core())
    }

    pub fn with_builtins(builtins: BuiltinRegistry) -> Self {
        Self {
            builtins,
            hooks: Hooks::default(),
            catalog: FxHashMap::default(),
            loaded: FxHashSet::default(),
        }
    }

    /// Make `ext` loadable by name through [`load_library`](Self::load_library)
    /// or a pointer file. Does not initialize it.
    pub fn provide(&mut self, ext: Arc<dyn Extension>) {
        self.catalog.insert(ext.name().to_owned(), ext);
    }

    /// Initialize `ext` and commit its registrations.
    ///
    /// Returns `Ok(false)` if an extension of that name is already loaded.
    /// On error nothing the extension staged is kept.
    pub fn register(&mut self, ext: &dyn Extension) -> Result<bool, ExtensionError> {
        let name = ext.name().to_owned();
        if self.loaded.contains(&name) {
            tracing::debug!(extension = %name, "extension already loaded");
            return Ok(false);
        }

        let mut ctx = ExtensionContext::new(&name);
        ext.init(&mut ctx).map_err(|message| ExtensionError::Init {
            extension: name.clone(),
            message,
        })?;
        self.validate(&ctx)?;

        let ExtensionContext {
            operators,
            events,
            periodic,
            ..
        } = ctx;
        let operator_count = operators.len();
        for (op, entry) in operators {
            self.builtins.insert(op, entry);
        }
        for (event, handler) in events {
            self.hooks.events.entry(event).or_default().push(handler);
        }
        self.hooks.periodic.extend(periodic);
        self.loaded.insert(name.clone());

        tracing::debug!(extension = %name, operators = operator_count, "extension loaded");
        Ok(true)
    }

    fn validate(&self, ctx: &ExtensionContext) -> Result<(), ExtensionError> {
        let mut staged = FxHashSet::default();
        for (op, _) in &ctx.operators {
            if op.is_empty() {
                return Err(ExtensionError::EmptyOperatorName(ctx.extension.clone()));
            }
            if self.builtins.contains(op) || !staged.insert(op.as_str()) {
                return Err(ExtensionError::DuplicateOperator(op.clone()));
            }
        }
        if ctx.periodic.iter().any(|(every, _)| *every == 0) {
            return Err(ExtensionError::ZeroPeriod(ctx.extension.clone()));
        }
        Ok(())
    }

    /// Load the catalog extension a library path refers to.
    pub fn load_library(&mut self, path: &str) -> Result<bool, ExtensionError> {
        let name = extension_name(path);
        let ext = self
            .catalog
            .get(&name)
            .cloned()
            .ok_or_else(|| ExtensionError::NotFound(path.to_owned()))?;
        self.register(ext.as_ref())
    }

    /// Load every library listed by a pointer file (following nested
    /// pointer files). Returns how many extensions were newly loaded.
    pub fn load_pointer_file(&mut self, path: &Path) -> Result<usize, ExtensionError> {
        let mut loaded = 0;
        for entry in collect_libraries(path)? {
            let newly = self
                .load_library(&entry.target)
                .map_err(|e| ExtensionError::InPointerFile {
                    path: entry.source.clone(),
                    line: entry.line,
                    source: Box::new(e),
                })?;
            loaded += usize::from(newly);
        }
        Ok(loaded)
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.loaded.contains(name)
    }

    pub fn builtins(&self) -> &BuiltinRegistry {
        &self.builtins
    }

    pub fn hooks(&self) -> &Hooks {
        &self.hooks
    }

    pub fn into_parts(self) -> (BuiltinRegistry, Hooks) {
        (self.builtins, self.hooks)
    }
}

impl Default for ExtensionHost {
    fn default() -> Self {
        Self::new()
    }
}
