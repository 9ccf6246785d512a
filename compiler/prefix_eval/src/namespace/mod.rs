//! Namespace service: the one entry point for environment mutation.
//!
//! A [`Namespace`] is built once and handed to every interpreter that
//! shares an environment tree. It routes each mutation either straight to
//! the [`Scope`] (direct mode) or through the [`NsBuffer`] dispatcher
//! (buffered mode), and makes reads wait for in-flight writes to the symbol
//! they query. Callers never need to know which mode is active.

mod buffer;
mod symbol_queue;

use std::io;
use std::sync::Arc;

use prefix_ir::DeclType;

use crate::environment::{Binding, EnvResult, Entry, FrozenState, Scope};
use crate::value::Value;

pub use buffer::{NsBuffer, ReadGuard};
pub use symbol_queue::SymbolQueue;

/// A mutating environment operation.
#[derive(Clone, Debug)]
pub enum NsOp {
    Define {
        name: String,
        ty: DeclType,
    },
    Assign {
        name: String,
        value: Value,
        ty: DeclType,
        declare_if_missing: bool,
    },
    Delete {
        name: String,
    },
    Alias {
        name: String,
        target: String,
        ty: DeclType,
        declare_if_missing: bool,
    },
    Freeze {
        name: String,
    },
    Thaw {
        name: String,
    },
    Permafreeze {
        name: String,
    },
}

impl NsOp {
    /// The symbol this operation writes.
    pub fn symbol(&self) -> &str {
        match self {
            NsOp::Define { name, .. }
            | NsOp::Assign { name, .. }
            | NsOp::Delete { name }
            | NsOp::Alias { name, .. }
            | NsOp::Freeze { name }
            | NsOp::Thaw { name }
            | NsOp::Permafreeze { name } => name,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            NsOp::Define { .. } => "define",
            NsOp::Assign { .. } => "assign",
            NsOp::Delete { .. } => "delete",
            NsOp::Alias { .. } => "alias",
            NsOp::Freeze { .. } => "freeze",
            NsOp::Thaw { .. } => "thaw",
            NsOp::Permafreeze { .. } => "permafreeze",
        }
    }

    /// Run the operation on the direct layer.
    pub fn apply(self, scope: &Scope) -> EnvResult {
        match self {
            NsOp::Define { name, ty } => scope.define(&name, ty),
            NsOp::Assign {
                name,
                value,
                ty,
                declare_if_missing,
            } => scope.assign(&name, value, ty, declare_if_missing),
            NsOp::Delete { name } => scope.delete(&name),
            NsOp::Alias {
                name,
                target,
                ty,
                declare_if_missing,
            } => scope.set_alias(&name, &target, ty, declare_if_missing),
            NsOp::Freeze { name } => scope.freeze(&name),
            NsOp::Thaw { name } => scope.thaw(&name),
            NsOp::Permafreeze { name } => scope.permafreeze(&name),
        }
    }
}

/// Handle to the namespace service. Clones share the same buffer.
#[derive(Clone, Default)]
pub struct Namespace {
    buffer: Option<Arc<NsBuffer>>,
}

impl Namespace {
    /// Unbuffered: every operation runs on the caller's thread.
    pub fn direct() -> Self {
        Namespace { buffer: None }
    }

    /// Start a dispatcher and serialize all writes through it.
    pub fn buffered() -> io::Result<Self> {
        Ok(Namespace {
            buffer: Some(Arc::new(NsBuffer::start()?)),
        })
    }

    /// Whether writes currently go through the dispatcher.
    pub fn is_buffered(&self) -> bool {
        self.buffer.as_ref().is_some_and(|b| b.is_active())
    }

    /// Operations applied by the dispatcher so far (0 in direct mode).
    pub fn applied_ops(&self) -> u64 {
        self.buffer.as_ref().map_or(0, |b| b.applied_ops())
    }

    /// Drain pending writes and revert to direct mode.
    pub fn shutdown(&self) {
        if let Some(buffer) = &self.buffer {
            buffer.shutdown();
        }
    }

    pub fn submit(&self, scope: &Scope, op: NsOp) -> EnvResult {
        match &self.buffer {
            Some(buffer) => buffer.submit(scope, op),
            None => op.apply(scope),
        }
    }

    pub fn define(&self, scope: &Scope, name: &str, ty: DeclType) -> EnvResult {
        self.submit(
            scope,
            NsOp::Define {
                name: name.to_owned(),
                ty,
            },
        )
    }

    pub fn assign(
        &self,
        scope: &Scope,
        name: &str,
        value: Value,
        ty: DeclType,
        declare_if_missing: bool,
    ) -> EnvResult {
        self.submit(
            scope,
            NsOp::Assign {
                name: name.to_owned(),
                value,
                ty,
                declare_if_missing,
            },
        )
    }

    pub fn delete(&self, scope: &Scope, name: &str) -> EnvResult {
        self.submit(
            scope,
            NsOp::Delete {
                name: name.to_owned(),
            },
        )
    }

    pub fn set_alias(
        &self,
        scope: &Scope,
        name: &str,
        target: &str,
        ty: DeclType,
        declare_if_missing: bool,
    ) -> EnvResult {
        self.submit(
            scope,
            NsOp::Alias {
                name: name.to_owned(),
                target: target.to_owned(),
                ty,
                declare_if_missing,
            },
        )
    }

    pub fn freeze(&self, scope: &Scope, name: &str) -> EnvResult {
        self.submit(
            scope,
            NsOp::Freeze {
                name: name.to_owned(),
            },
        )
    }

    pub fn thaw(&self, scope: &Scope, name: &str) -> EnvResult {
        self.submit(
            scope,
            NsOp::Thaw {
                name: name.to_owned(),
            },
        )
    }

    pub fn permafreeze(&self, scope: &Scope, name: &str) -> EnvResult {
        self.submit(
            scope,
            NsOp::Permafreeze {
                name: name.to_owned(),
            },
        )
    }

    /// Wait for in-flight writes to `name`, then hold off structural
    /// mutation until the guard is dropped.
    ///
    /// Never submit a write while holding the guard: the dispatcher needs
    /// the structural lock to make progress.
    pub fn read_lock(&self, name: &str) -> ReadGuard<'_> {
        match &self.buffer {
            Some(buffer) => buffer.read_lock(name),
            None => ReadGuard::unlocked(),
        }
    }

    pub fn get(&self, scope: &Scope, name: &str) -> Option<Binding> {
        let _guard = self.read_lock(name);
        scope.get(name)
    }

    pub fn get_entry(&self, scope: &Scope, name: &str) -> Option<Entry> {
        let _guard = self.read_lock(name);
        scope.get_entry(name)
    }

    pub fn exists(&self, scope: &Scope, name: &str) -> bool {
        let _guard = self.read_lock(name);
        scope.exists(name)
    }

    pub fn frozen_state(&self, scope: &Scope, name: &str) -> Option<FrozenState> {
        let _guard = self.read_lock(name);
        scope.frozen_state(name)
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
