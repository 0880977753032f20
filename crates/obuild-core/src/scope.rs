//! Per-subtree barriers for asynchronously running shell tasks.

use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};
use tokio::task::JoinHandle;

/// A wait scope: the join handles of every task enqueued under it, plus a
/// first-error slot shared with those tasks.
///
/// Scopes are pushed when a target's dependencies start expanding and
/// drained before the target's own body runs, so a parent never observes
/// its subtree's tasks as incomplete.
#[derive(Debug)]
pub struct WaitScope {
    handles: Vec<JoinHandle<()>>,
    failure: Arc<AtomicI32>,
}

impl WaitScope {
    #[must_use]
    pub fn new() -> Self {
        Self {
            handles: Vec::new(),
            failure: Arc::new(AtomicI32::new(0)),
        }
    }

    /// The shared exit-status slot handed to each task.
    #[must_use]
    pub fn failure_slot(&self) -> Arc<AtomicI32> {
        Arc::clone(&self.failure)
    }

    /// Attach a running task to this scope.
    pub fn attach(&mut self, handle: JoinHandle<()>) {
        self.handles.push(handle);
    }

    /// Record a non-zero exit status in a scope's failure slot.
    ///
    /// Compare-and-swap against the zero sentinel: concurrent failing tasks
    /// cannot clobber one another, the first failure wins.
    pub fn record_failure(slot: &AtomicI32, status: i32) {
        if status != 0 {
            let _ = slot.compare_exchange(0, status, Ordering::AcqRel, Ordering::Acquire);
        }
    }

    /// Wait for every attached task to finish, then report the first
    /// recorded non-zero exit status.
    ///
    /// Queued tasks are never cancelled: a failure is only reported after
    /// the whole scope has run to completion.
    pub async fn drain(self) -> Option<i32> {
        for handle in self.handles {
            if let Err(err) = handle.await {
                tracing::error!(%err, "build task panicked");
                Self::record_failure(&self.failure, 1);
            }
        }
        match self.failure.load(Ordering::Acquire) {
            0 => None,
            status => Some(status),
        }
    }
}

impl Default for WaitScope {
    fn default() -> Self {
        Self::new()
    }
}
