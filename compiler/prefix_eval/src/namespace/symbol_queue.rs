//! Per-symbol in-flight counters.

use parking_lot::{Condvar, Mutex};

/// Count of writes to one symbol that are submitted but not yet applied.
///
/// Readers of the symbol block in [`SymbolQueue::wait_drained`] until the
/// count is back to zero.
#[derive(Default)]
pub struct SymbolQueue {
    pending: Mutex<usize>,
    drained: Condvar,
}

impl SymbolQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// A write for this symbol entered the pipeline.
    pub fn enter(&self) {
        *self.pending.lock() += 1;
    }

    /// A write for this symbol was applied. Wakes readers when the last one
    /// leaves.
    pub fn leave(&self) {
        let mut pending = self.pending.lock();
        *pending = pending.saturating_sub(1);
        if *pending == 0 {
            self.drained.notify_all();
        }
    }

    /// Block until no write for this symbol is in flight.
    pub fn wait_drained(&self) {
        let mut pending = self.pending.lock();
        while *pending > 0 {
            self.drained.wait(&mut pending);
        }
    }

    pub fn pending(&self) -> usize {
        *self.pending.lock()
    }
}
