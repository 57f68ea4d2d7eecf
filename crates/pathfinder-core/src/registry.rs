//! In-memory registry of sessions with an orchestration run in flight.
//!
//! The registry answers status and duplicate-run questions; it plays no part
//! in the correctness of a run itself. Its lifetime is the process.

use std::{
    collections::BTreeSet,
    sync::{Arc, Mutex, MutexGuard},
};

/// Set of session IDs currently being orchestrated.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    active: Arc<Mutex<BTreeSet<String>>>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeSet<String>> {
        // A panic while holding the lock cannot leave the set half-updated
        self.active.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Marks a session as in flight. Returns `false` if it already was.
    pub fn mark_active(&self, session_id: &str) -> bool {
        self.lock().insert(session_id.to_string())
    }

    /// Forgets a session. Returns `false` if it was not marked.
    pub fn clear(&self, session_id: &str) -> bool {
        self.lock().remove(session_id)
    }

    pub fn is_active(&self, session_id: &str) -> bool {
        self.lock().contains(session_id)
    }

    /// Snapshot of the in-flight session IDs, sorted.
    pub fn list_active(&self) -> BTreeSet<String> {
        self.lock().clone()
    }

    /// Marks a session as in flight for as long as the returned guard lives.
    ///
    /// Returns `None` when a run for the session is already registered.
    pub fn acquire(&self, session_id: &str) -> Option<ActiveRun> {
        self.mark_active(session_id).then(|| ActiveRun {
            registry: self.clone(),
            session_id: session_id.to_string(),
        })
    }
}

/// Registration of one in-flight run; clears itself when dropped, whichever
/// way the run ends.
#[derive(Debug)]
pub struct ActiveRun {
    registry: Registry,
    session_id: String,
}

impl ActiveRun {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

impl Drop for ActiveRun {
    fn drop(&mut self) {
        self.registry.clear(&self.session_id);
    }
}
