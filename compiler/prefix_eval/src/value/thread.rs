//! Thread handles.
//!
//! Only the handle's data lives here: lifecycle flags plus the body and
//! scope needed to restart it. Spawning and joining belong to whoever
//! drives language-level threads.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use prefix_ir::Stmt;

use crate::environment::Scope;

/// Lifecycle state behind a [`ThreadHandle`].
#[derive(Default)]
pub struct ThreadState {
    pub started: bool,
    pub finished: bool,
    pub paused: bool,
    body: Option<Arc<Vec<Stmt>>>,
    scope: Option<Scope>,
}

/// Shared handle to a script thread.
#[derive(Clone)]
pub struct ThreadHandle(Arc<Mutex<ThreadState>>);

impl ThreadHandle {
    /// A handle for `body`, to run in `scope`. Not yet started.
    pub fn new(body: Arc<Vec<Stmt>>, scope: Scope) -> Self {
        ThreadHandle(Arc::new(Mutex::new(ThreadState {
            body: Some(body),
            scope: Some(scope),
            ..ThreadState::default()
        })))
    }

    /// Started and not finished.
    pub fn is_running(&self) -> bool {
        let s = self.0.lock();
        s.started && !s.finished
    }

    pub fn is_finished(&self) -> bool {
        self.0.lock().finished
    }

    pub fn is_paused(&self) -> bool {
        self.0.lock().paused
    }

    pub fn mark_started(&self) {
        let mut s = self.0.lock();
        s.started = true;
        s.finished = false;
    }

    pub fn mark_finished(&self) {
        let mut s = self.0.lock();
        s.finished = true;
        s.paused = false;
    }

    pub fn set_paused(&self, paused: bool) {
        self.0.lock().paused = paused;
    }

    /// Body and scope for re-running a finished thread. Resets the flags to
    /// "started" and returns `None` while the thread is still running.
    pub fn restart(&self) -> Option<(Arc<Vec<Stmt>>, Scope)> {
        let mut s = self.0.lock();
        if s.started && !s.finished {
            return None;
        }
        let payload = (Arc::clone(s.body.as_ref()?), s.scope.clone()?);
        s.started = true;
        s.finished = false;
        s.paused = false;
        Some(payload)
    }

    #[inline]
    pub fn ptr_eq(a: &ThreadHandle, b: &ThreadHandle) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }
}

impl fmt::Debug for ThreadHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.0.lock();
        f.debug_struct("ThreadHandle")
            .field("started", &s.started)
            .field("finished", &s.finished)
            .field("paused", &s.paused)
            .finish_non_exhaustive()
    }
}
