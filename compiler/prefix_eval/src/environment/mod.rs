//! Scoped variable store.
//!
//! A [`Scope`] is one lexical frame: a growable list of named entries plus
//! an optional parent. Scopes are shared (`Arc`) because closures keep their
//! defining scope alive, and because several script threads may hold the
//! same chain.
//!
//! This is the direct layer: every operation here mutates immediately. The
//! evaluator goes through [`Namespace`](crate::namespace::Namespace), which
//! routes writes through the write-buffer when it is active.
//!
//! Invariants:
//! - a name appears at most once per scope; lookups resolve innermost-first
//! - slots are never removed (`delete` clears them), so an index into a
//!   scope stays valid for the scope's lifetime
//! - an alias entry holds no value; reads and writes land on the terminal
//!   entry of its chain, which is at most [`MAX_ALIAS_DEPTH`] hops away
//! - `permafrozen` implies `frozen`
//! - reads hand out owned copies, never references into the entry list

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use prefix_ir::DeclType;
use smallvec::SmallVec;

use crate::value::Value;

/// Longest alias chain followed before giving up.
pub const MAX_ALIAS_DEPTH: usize = 256;

/// Why an environment operation was rejected.
///
/// Failures are data: callers decide whether a rejection is an error.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EnvError {
    #[error("identifier '{0}' not found")]
    NotFound(String),
    #[error("identifier '{0}' already exists in this scope")]
    AlreadyDefined(String),
    #[error("identifier '{0}' is frozen")]
    Frozen(String),
    #[error("identifier '{0}' is permanently frozen")]
    Permafrozen(String),
    #[error("type mismatch for '{name}': expected {expected} but got {found}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("alias '{0}' would form a cycle")]
    AliasCycle(String),
    #[error("alias chain from '{0}' exceeds {MAX_ALIAS_DEPTH} hops")]
    AliasTooDeep(String),
    #[error("namespace dispatcher is not running")]
    Disconnected,
}

impl EnvError {
    /// Numeric status: `-1` not found, `-2` permanently frozen, other
    /// rejections below that.
    pub fn code(&self) -> i32 {
        match self {
            EnvError::NotFound(_) => -1,
            EnvError::Permafrozen(_) => -2,
            EnvError::Frozen(_) => -3,
            EnvError::TypeMismatch { .. } => -4,
            EnvError::AliasCycle(_) => -5,
            EnvError::AliasTooDeep(_) => -6,
            EnvError::AlreadyDefined(_) => -7,
            EnvError::Disconnected => -8,
        }
    }
}

/// Result of a direct environment operation.
pub type EnvResult = Result<(), EnvError>;

/// Write protection of a binding.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FrozenState {
    Thawed,
    Frozen,
    Permafrozen,
}

impl FrozenState {
    /// `0` thawed, `1` frozen, `-1` permanently frozen.
    pub fn code(self) -> i64 {
        match self {
            FrozenState::Thawed => 0,
            FrozenState::Frozen => 1,
            FrozenState::Permafrozen => -1,
        }
    }
}

/// One binding slot. Reads return clones of this.
#[derive(Clone, Debug)]
pub struct Entry {
    pub name: String,
    pub declared_type: DeclType,
    pub value: Value,
    pub alias_target: Option<String>,
    pub initialized: bool,
    pub frozen: bool,
    pub permafrozen: bool,
}

impl Entry {
    fn new(name: &str, declared_type: DeclType) -> Self {
        Entry {
            name: name.to_owned(),
            declared_type,
            value: Value::Null,
            alias_target: None,
            initialized: false,
            frozen: false,
            permafrozen: false,
        }
    }

    pub fn frozen_state(&self) -> FrozenState {
        if self.permafrozen {
            FrozenState::Permafrozen
        } else if self.frozen {
            FrozenState::Frozen
        } else {
            FrozenState::Thawed
        }
    }

    fn check_writable(&self) -> EnvResult {
        match self.frozen_state() {
            FrozenState::Thawed => Ok(()),
            FrozenState::Frozen => Err(EnvError::Frozen(self.name.clone())),
            FrozenState::Permafrozen => Err(EnvError::Permafrozen(self.name.clone())),
        }
    }

    /// Type gate for storing `value` under a write that claims type `ty`.
    fn check_types(&self, value: &Value, ty: DeclType) -> EnvResult {
        let declared = self.declared_type;
        if ty.is_known() && declared.is_known() && ty != declared {
            return Err(EnvError::TypeMismatch {
                name: self.name.clone(),
                expected: declared.keyword(),
                found: ty.keyword(),
            });
        }
        if !value.matches_decl(declared) {
            return Err(EnvError::TypeMismatch {
                name: self.name.clone(),
                expected: declared.keyword(),
                found: value.type_name(),
            });
        }
        Ok(())
    }
}

/// A binding read through its alias chain.
#[derive(Clone, Debug)]
pub struct Binding {
    pub value: Value,
    pub declared_type: DeclType,
    pub initialized: bool,
}

struct ScopeData {
    parent: Option<Scope>,
    entries: RwLock<Vec<Entry>>,
}

/// A lexical frame. Cloning shares the frame.
#[derive(Clone)]
pub struct Scope(Arc<ScopeData>);

impl Scope {
    /// A root scope with no parent.
    pub fn global() -> Self {
        Scope(Arc::new(ScopeData {
            parent: None,
            entries: RwLock::new(Vec::new()),
        }))
    }

    /// A new frame whose lookups fall back to `self`.
    #[must_use]
    pub fn child(&self) -> Self {
        Scope(Arc::new(ScopeData {
            parent: Some(self.clone()),
            entries: RwLock::new(Vec::new()),
        }))
    }

    pub fn parent(&self) -> Option<&Scope> {
        self.0.parent.as_ref()
    }

    #[inline]
    pub fn ptr_eq(&self, other: &Scope) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Names of this frame's slots, in definition order.
    pub fn local_names(&self) -> Vec<String> {
        self.0.entries.read().iter().map(|e| e.name.clone()).collect()
    }

    fn local_index(&self, name: &str) -> Option<usize> {
        self.0.entries.read().iter().position(|e| e.name == name)
    }

    /// Innermost frame holding `name`, and the slot index within it.
    fn find(&self, name: &str) -> Option<(Scope, usize)> {
        let mut scope = self;
        loop {
            if let Some(i) = scope.local_index(name) {
                return Some((scope.clone(), i));
            }
            scope = scope.parent()?;
        }
    }

    fn entry_at(&self, index: usize) -> Entry {
        self.0.entries.read()[index].clone()
    }

    /// Follow the alias chain starting at `name` (looked up from `self`)
    /// to its terminal entry. Returns the names passed through on the way.
    fn resolve_chain(&self, name: &str) -> Result<(Scope, usize, Vec<String>), EnvError> {
        let mut visited: SmallVec<[String; 4]> = SmallVec::new();
        let mut current = name.to_owned();
        for _ in 0..=MAX_ALIAS_DEPTH {
            let (scope, index) = self
                .find(&current)
                .ok_or_else(|| EnvError::NotFound(current.clone()))?;
            let next = scope.0.entries.read()[index].alias_target.clone();
            match next {
                None => {
                    visited.push(current);
                    return Ok((scope, index, visited.into_vec()));
                }
                Some(target) => {
                    if target == current || visited.contains(&target) {
                        return Err(EnvError::AliasCycle(name.to_owned()));
                    }
                    visited.push(std::mem::replace(&mut current, target));
                }
            }
        }
        Err(EnvError::AliasTooDeep(name.to_owned()))
    }

    fn resolve_terminal(&self, name: &str) -> Result<(Scope, usize), EnvError> {
        self.resolve_chain(name).map(|(scope, index, _)| (scope, index))
    }

    /// Create an uninitialized binding in this frame.
    pub fn define(&self, name: &str, ty: DeclType) -> EnvResult {
        let mut entries = self.0.entries.write();
        if entries.iter().any(|e| e.name == name) {
            return Err(EnvError::AlreadyDefined(name.to_owned()));
        }
        entries.push(Entry::new(name, ty));
        Ok(())
    }

    /// Store `value` into `name`, writing through aliases.
    ///
    /// Rejected when the terminal entry is frozen, when a known `ty`
    /// disagrees with its declared type, or when the value's runtime type
    /// disagrees with it. A missing name is defined in this frame only when
    /// `declare_if_missing` is set and `ty` is known.
    pub fn assign(&self, name: &str, value: Value, ty: DeclType, declare_if_missing: bool) -> EnvResult {
        let Some((scope, index)) = self.find(name) else {
            if !(declare_if_missing && ty.is_known()) {
                return Err(EnvError::NotFound(name.to_owned()));
            }
            if !value.matches_decl(ty) {
                return Err(EnvError::TypeMismatch {
                    name: name.to_owned(),
                    expected: ty.keyword(),
                    found: value.type_name(),
                });
            }
            let mut entries = self.0.entries.write();
            if entries.iter().any(|e| e.name == name) {
                return Err(EnvError::AlreadyDefined(name.to_owned()));
            }
            let mut entry = Entry::new(name, ty);
            entry.value = value;
            entry.initialized = true;
            entries.push(entry);
            return Ok(());
        };

        let is_alias = scope.0.entries.read()[index].alias_target.is_some();
        let (scope, index) = if is_alias {
            self.resolve_terminal(name)?
        } else {
            (scope, index)
        };

        let mut entries = scope.0.entries.write();
        let entry = &mut entries[index];
        entry.check_writable()?;
        entry.check_types(&value, ty)?;
        entry.value = value;
        entry.initialized = true;
        Ok(())
    }

    /// Clear the binding: no value, no alias, uninitialized. The slot stays.
    pub fn delete(&self, name: &str) -> EnvResult {
        let (scope, index) = self
            .find(name)
            .ok_or_else(|| EnvError::NotFound(name.to_owned()))?;
        let mut entries = scope.0.entries.write();
        let entry = &mut entries[index];
        entry.check_writable()?;
        entry.value = Value::Null;
        entry.alias_target = None;
        entry.initialized = false;
        Ok(())
    }

    /// Make `name` (in this frame) an alias of `target`'s terminal entry.
    ///
    /// All validation runs before the local entry is touched: a rejected
    /// alias leaves no trace.
    pub fn set_alias(&self, name: &str, target: &str, ty: DeclType, declare_if_missing: bool) -> EnvResult {
        if name == target {
            return Err(EnvError::AliasCycle(name.to_owned()));
        }
        let (term_scope, term_index, chain) = self.resolve_chain(target)?;
        if chain.iter().any(|n| n == name) {
            return Err(EnvError::AliasCycle(name.to_owned()));
        }
        let terminal = term_scope.entry_at(term_index);
        terminal.check_writable()?;
        if ty.is_known() && ty != terminal.declared_type {
            return Err(EnvError::TypeMismatch {
                name: name.to_owned(),
                expected: ty.keyword(),
                found: terminal.declared_type.keyword(),
            });
        }

        let mut entries = self.0.entries.write();
        let index = match entries.iter().position(|e| e.name == name) {
            Some(i) => {
                entries[i].check_writable()?;
                i
            }
            None if declare_if_missing => {
                entries.push(Entry::new(name, ty));
                entries.len() - 1
            }
            None => return Err(EnvError::NotFound(name.to_owned())),
        };
        let entry = &mut entries[index];
        entry.declared_type = terminal.declared_type;
        entry.value = Value::Null;
        entry.alias_target = Some(terminal.name);
        entry.initialized = true;
        Ok(())
    }

    fn update_flags(&self, name: &str, f: impl FnOnce(&mut Entry) -> EnvResult) -> EnvResult {
        let (scope, index) = self
            .find(name)
            .ok_or_else(|| EnvError::NotFound(name.to_owned()))?;
        let mut entries = scope.0.entries.write();
        f(&mut entries[index])
    }

    pub fn freeze(&self, name: &str) -> EnvResult {
        self.update_flags(name, |e| {
            e.frozen = true;
            Ok(())
        })
    }

    /// Fails with `Permafrozen` (distinct from `NotFound`) on a permanently
    /// frozen binding.
    pub fn thaw(&self, name: &str) -> EnvResult {
        self.update_flags(name, |e| {
            if e.permafrozen {
                return Err(EnvError::Permafrozen(e.name.clone()));
            }
            e.frozen = false;
            Ok(())
        })
    }

    pub fn permafreeze(&self, name: &str) -> EnvResult {
        self.update_flags(name, |e| {
            e.frozen = true;
            e.permafrozen = true;
            Ok(())
        })
    }

    /// Read `name` through its alias chain.
    pub fn get(&self, name: &str) -> Option<Binding> {
        let (scope, index) = self.resolve_terminal(name).ok()?;
        let entries = scope.0.entries.read();
        let entry = &entries[index];
        Some(Binding {
            value: entry.value.clone(),
            declared_type: entry.declared_type,
            initialized: entry.initialized,
        })
    }

    /// The raw entry for `name`, without following aliases.
    pub fn get_entry(&self, name: &str) -> Option<Entry> {
        self.find(name).map(|(scope, index)| scope.entry_at(index))
    }

    /// Whether `name` is bound to a value (or to an alias).
    pub fn exists(&self, name: &str) -> bool {
        self.get_entry(name).is_some_and(|e| e.initialized)
    }

    pub fn frozen_state(&self, name: &str) -> Option<FrozenState> {
        self.get_entry(name).map(|e| e.frozen_state())
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("names", &self.local_names())
            .field("has_parent", &self.0.parent.is_some())
            .finish()
    }
}
