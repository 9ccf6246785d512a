//! The write-buffer: one dispatcher thread applying every environment
//! mutation in submission order.

use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Receiver, SendError, Sender};
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock, RwLockReadGuard};

use super::symbol_queue::SymbolQueue;
use super::NsOp;
use crate::environment::{EnvError, EnvResult, Scope};

/// One submitted operation plus its completion channel.
struct Request {
    scope: Scope,
    op: NsOp,
    queue: Arc<SymbolQueue>,
    reply: Sender<EnvResult>,
}

/// State shared between submitters, readers and the dispatcher.
#[derive(Default)]
struct Shared {
    symbols: DashMap<String, Arc<SymbolQueue>>,
    /// Write side held by the dispatcher while it mutates a scope; read
    /// side held by readers while they copy a binding out.
    structural: RwLock<()>,
    applied: AtomicU64,
}

/// Held while reading a symbol. Dropping it releases the structural lock.
pub struct ReadGuard<'a> {
    _structural: Option<RwLockReadGuard<'a, ()>>,
}

impl ReadGuard<'_> {
    /// Guard for the unbuffered path: nothing to hold.
    pub(super) fn unlocked() -> Self {
        ReadGuard { _structural: None }
    }
}

/// Serializes environment writes through a single dispatcher thread.
///
/// While active, [`NsBuffer::submit`] enqueues the operation and blocks on
/// that operation's own reply; the dispatcher applies operations strictly
/// in FIFO order. After [`NsBuffer::shutdown`] every call falls through to
/// the direct path.
pub struct NsBuffer {
    shared: Arc<Shared>,
    sender: Mutex<Option<Sender<Request>>>,
    dispatcher: Mutex<Option<JoinHandle<()>>>,
}

impl NsBuffer {
    /// Spawn the dispatcher and activate buffering.
    pub fn start() -> io::Result<Self> {
        let shared = Arc::new(Shared::default());
        let (tx, rx) = channel::unbounded();
        let worker_shared = Arc::clone(&shared);
        let handle = thread::Builder::new()
            .name("prefix-ns-dispatch".to_string())
            .spawn(move || dispatch(&worker_shared, &rx))?;
        tracing::debug!("namespace write-buffer started");
        Ok(NsBuffer {
            shared,
            sender: Mutex::new(Some(tx)),
            dispatcher: Mutex::new(Some(handle)),
        })
    }

    pub fn is_active(&self) -> bool {
        self.sender.lock().is_some()
    }

    /// Number of operations the dispatcher has applied.
    pub fn applied_ops(&self) -> u64 {
        self.shared.applied.load(Ordering::Acquire)
    }

    fn queue_for(&self, name: &str) -> Arc<SymbolQueue> {
        if let Some(q) = self.shared.symbols.get(name) {
            return Arc::clone(q.value());
        }
        Arc::clone(
            self.shared
                .symbols
                .entry(name.to_owned())
                .or_insert_with(|| Arc::new(SymbolQueue::new()))
                .value(),
        )
    }

    /// Apply `op` to `scope` through the dispatcher and wait for its result.
    ///
    /// The symbol's in-flight count is raised before the operation is
    /// enqueued, so a read issued after this call starts waits for it.
    pub fn submit(&self, scope: &Scope, op: NsOp) -> EnvResult {
        let Some(tx) = self.sender.lock().clone() else {
            return op.apply(scope);
        };
        let queue = self.queue_for(op.symbol());
        queue.enter();
        let (reply, done) = channel::bounded(1);
        let request = Request {
            scope: scope.clone(),
            op,
            queue: Arc::clone(&queue),
            reply,
        };
        if let Err(SendError(request)) = tx.send(request) {
            queue.leave();
            return request.op.apply(&request.scope);
        }
        drop(tx);
        done.recv().unwrap_or(Err(EnvError::Disconnected))
    }

    /// Wait until no write to `name` is in flight, then take the structural
    /// read lock.
    pub fn read_lock(&self, name: &str) -> ReadGuard<'_> {
        let queue = self.shared.symbols.get(name).map(|q| Arc::clone(q.value()));
        if let Some(queue) = queue {
            queue.wait_drained();
        }
        ReadGuard {
            _structural: Some(self.shared.structural.read()),
        }
    }

    /// Drain everything already submitted, stop the dispatcher and revert
    /// to direct operation. Idempotent.
    pub fn shutdown(&self) {
        let Some(sender) = self.sender.lock().take() else {
            return;
        };
        drop(sender);
        if let Some(handle) = self.dispatcher.lock().take() {
            if handle.join().is_err() {
                tracing::error!("namespace dispatcher panicked");
            }
        }
        tracing::debug!(
            applied = self.applied_ops(),
            "namespace write-buffer shut down"
        );
    }
}

impl Drop for NsBuffer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Dispatcher loop. Ends once every sender is gone and the FIFO is empty.
fn dispatch(shared: &Shared, rx: &Receiver<Request>) {
    for request in rx {
        let Request {
            scope,
            op,
            queue,
            reply,
        } = request;
        let kind = op.kind();
        let symbol = op.symbol().to_owned();
        let result = {
            let _structural = shared.structural.write();
            op.apply(&scope)
        };
        shared.applied.fetch_add(1, Ordering::Release);
        tracing::trace!(op = kind, %symbol, ok = result.is_ok(), "namespace op applied");
        queue.leave();
        // The submitter is blocked on this reply; it cannot have gone away.
        let _ = reply.send(result);
    }
}
