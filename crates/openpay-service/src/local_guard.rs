//! In-process idempotency guard.
//!
//! Best-effort mutual exclusion over `tenant:key` that sheds redundant
//! encryption and persistence work during request bursts. Advisory only:
//! it is process-local, loses all state on restart, and is never relied on
//! for correctness — the durable ledger is.
//!
//! One instance is created per process and injected into the orchestrator;
//! it is not a hidden singleton.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Per-key guard state. Keys start *absent*.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GuardState {
    Pending,
    Completed,
}

/// Process-wide map of in-flight and completed keys.
#[derive(Debug, Default)]
pub struct LocalGuard {
    states: Mutex<HashMap<String, GuardState>>,
}

/// Composite guard key for a `(tenant, idempotency key)` pair.
#[must_use]
pub fn composite_key(tenant_id: &str, idempotency_key: &str) -> String {
    format!("{tenant_id}:{idempotency_key}")
}

impl LocalGuard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // The guard is advisory; a panic while holding the lock must not wedge
    // every future request, so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, GuardState>> {
        self.states.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Atomic insert-if-absent: exactly one concurrent caller observes
    /// `true` for a fresh key. The winner's entry starts as *pending*.
    pub fn try_acquire(&self, key: &str) -> bool {
        let mut states = self.lock();
        match states.get(key) {
            Some(_) => false,
            None => {
                states.insert(key.to_string(), GuardState::Pending);
                true
            }
        }
    }

    pub fn mark_pending(&self, key: &str) {
        self.lock().insert(key.to_string(), GuardState::Pending);
    }

    pub fn mark_completed(&self, key: &str) {
        self.lock().insert(key.to_string(), GuardState::Completed);
    }

    #[must_use]
    pub fn is_pending(&self, key: &str) -> bool {
        self.lock().get(key) == Some(&GuardState::Pending)
    }

    #[must_use]
    pub fn is_completed(&self, key: &str) -> bool {
        self.lock().get(key) == Some(&GuardState::Completed)
    }

    /// Clear the *pending* marker. A *completed* marker survives: replays
    /// should keep short-circuiting through the fast path.
    pub fn release(&self, key: &str) {
        let mut states = self.lock();
        if states.get(key) == Some(&GuardState::Pending) {
            states.remove(key);
        }
    }

    /// Remove whatever marker exists, including *completed*.
    ///
    /// Reconciliation fallback only: used when the local flag says
    /// completed but the durable side has no payment row (restart or crash
    /// artifact), so truth must be re-derived from the ledger.
    pub fn clear(&self, key: &str) {
        self.lock().remove(key);
    }
}

/// Releases the guard on drop — the finally-semantics of the orchestrator.
/// `release` only clears *pending*, so dropping after `mark_completed`
/// leaves the completed marker intact.
pub(crate) struct ReleaseOnDrop<'a> {
    guard: &'a LocalGuard,
    key: &'a str,
}

impl<'a> ReleaseOnDrop<'a> {
    pub(crate) fn new(guard: &'a LocalGuard, key: &'a str) -> Self {
        Self { guard, key }
    }
}

impl Drop for ReleaseOnDrop<'_> {
    fn drop(&mut self) {
        self.guard.release(self.key);
        tracing::debug!(key = %self.key, "Released local idempotency guard");
    }
}
