//! Bounded pool for externally spawned shell commands.

use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::scope::WaitScope;

/// Fixed-capacity executor for `shell` tasks.
///
/// Each enqueued command becomes a task that first acquires one of `jobs`
/// permits, so at most `jobs` commands run at once; permits are granted in
/// FIFO order. Commands inherit the driver's stdio; nothing is captured.
#[derive(Debug, Clone)]
pub struct TaskPool {
    permits: Arc<Semaphore>,
    jobs: usize,
}

impl TaskPool {
    /// Create a pool with `jobs` workers (clamped to at least one).
    #[must_use]
    pub fn new(jobs: usize) -> Self {
        let jobs = jobs.max(1);
        Self {
            permits: Arc::new(Semaphore::new(jobs)),
            jobs,
        }
    }

    #[must_use]
    pub fn jobs(&self) -> usize {
        self.jobs
    }

    /// Enqueue `command` against `scope`.
    ///
    /// A non-zero exit status lands in the scope's first-error slot; the
    /// scope's `drain` reports it once every sibling task has finished.
    pub fn spawn_shell(&self, scope: &mut WaitScope, command: String) {
        let permits = Arc::clone(&self.permits);
        let failure = scope.failure_slot();
        scope.attach(tokio::spawn(async move {
            let Ok(_permit) = permits.acquire_owned().await else {
                // The pool lives as long as the engine; a closed semaphore
                // means shutdown already began.
                WaitScope::record_failure(&failure, 1);
                return;
            };
            tracing::debug!(%command, "running shell command");
            let status = run_shell(&command).await;
            if status != 0 {
                tracing::warn!(%command, status, "shell command failed");
            }
            WaitScope::record_failure(&failure, status);
        }));
    }
}

/// Run one command through the platform shell, returning its exit status.
///
/// Spawn failures report 127, signal terminations report 1.
async fn run_shell(command: &str) -> i32 {
    let mut cmd = if cfg!(windows) {
        let mut cmd = tokio::process::Command::new("cmd");
        cmd.arg("/C").arg(command);
        cmd
    } else {
        let mut cmd = tokio::process::Command::new("/bin/sh");
        cmd.arg("-c").arg(command);
        cmd
    };
    match cmd.status().await {
        Ok(status) => status.code().unwrap_or(1),
        Err(err) => {
            tracing::error!(%err, %command, "failed to spawn shell");
            127
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn successful_command_leaves_scope_clean() {
        let pool = TaskPool::new(2);
        let mut scope = WaitScope::new();
        pool.spawn_shell(&mut scope, "true".to_string());
        assert_eq!(scope.drain().await, None);
    }

    #[tokio::test]
    async fn failing_command_reports_exit_status() {
        let pool = TaskPool::new(1);
        let mut scope = WaitScope::new();
        pool.spawn_shell(&mut scope, "exit 3".to_string());
        assert_eq!(scope.drain().await, Some(3));
    }

    #[tokio::test]
    async fn queued_tasks_run_to_completion_after_a_failure() {
        let dir = TempDir::new().unwrap();
        let marker = dir.path().join("marker");
        let pool = TaskPool::new(1);
        let mut scope = WaitScope::new();
        pool.spawn_shell(&mut scope, "false".to_string());
        pool.spawn_shell(&mut scope, format!("touch {}", marker.display()));
        assert_eq!(scope.drain().await, Some(1));
        assert!(marker.exists(), "later task must still run");
    }

    #[tokio::test]
    async fn pool_bound_limits_concurrency() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("log");
        fs::write(&log, "").unwrap();
        let pool = TaskPool::new(1);
        let mut scope = WaitScope::new();
        // With a single worker these run strictly in order.
        for i in 0..3 {
            pool.spawn_shell(&mut scope, format!("echo {i} >> {}", log.display()));
        }
        assert_eq!(scope.drain().await, None);
        assert_eq!(fs::read_to_string(&log).unwrap(), "0\n1\n2\n");
    }
}
