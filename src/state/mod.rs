//! Run exclusivity and processing status.

mod types;

pub use types::*;

use chrono::Utc;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Grants at most one processing run at a time.
///
/// Clones share the same gate.
#[derive(Debug, Clone, Default)]
pub struct RunGate {
    busy: Arc<AtomicBool>,
}

impl RunGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the gate, or `None` if a run holds it.
    pub fn try_acquire(&self) -> Option<RunPermit> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunPermit {
                busy: Arc::clone(&self.busy),
            })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Proof of holding the [`RunGate`]. Dropping it releases the gate.
#[derive(Debug)]
pub struct RunPermit {
    busy: Arc<AtomicBool>,
}

impl Drop for RunPermit {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

/// Shared, concurrently readable processing status.
#[derive(Debug, Clone, Default)]
pub struct StatusTracker {
    inner: Arc<RwLock<StatusSnapshot>>,
}

impl StatusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        self.inner.read().clone()
    }

    pub fn status(&self) -> RunStatus {
        self.inner.read().status
    }

    /// Mark a run as started now.
    pub fn start(&self, message: impl Into<String>) {
        let mut state = self.inner.write();
        state.status = RunStatus::Processing;
        state.last_message = message.into();
        state.last_run_time = Some(Utc::now());
    }

    /// Update the message without changing the status.
    pub fn message(&self, message: impl Into<String>) {
        self.inner.write().last_message = message.into();
    }

    pub fn finish(&self, status: RunStatus, message: impl Into<String>) {
        let mut state = self.inner.write();
        state.status = status;
        state.last_message = message.into();
    }
}
