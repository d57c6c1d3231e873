//! Tokio task that drives a shared queue.

use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::core::{LicenseGate, NetworkClient};
use crate::runtime::shared::SharedGenerationQueue;

/// Ticks a [`SharedGenerationQueue`] from a tokio task.
///
/// The task awaits a `Notify` while the queue is empty and ticks every `interval` while
/// it has work. Dropping the driver aborts the task.
#[derive(Debug)]
pub struct TokioTickDriver {
    task: JoinHandle<()>,
}

impl TokioTickDriver {
    /// Spawn the driver on `runtime`.
    #[must_use]
    pub fn spawn<C, G>(runtime: &Handle, queue: SharedGenerationQueue<C, G>, interval: Duration) -> Self
    where
        C: NetworkClient + 'static,
        G: LicenseGate + 'static,
    {
        let task = runtime.spawn(async move {
            let wake = queue.wake();
            loop {
                if !queue.is_active() {
                    wake.notify.notified().await;
                }
                while queue.is_active() {
                    if let Some(outcome) = queue.tick() {
                        tracing::debug!(target_id = %outcome.target, state = ?outcome.state, "tick finished job");
                    }
                    tokio::time::sleep(interval).await;
                }
            }
        });
        Self { task }
    }

    /// Spawn the driver on the current runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    #[must_use]
    pub fn spawn_current<C, G>(queue: SharedGenerationQueue<C, G>, interval: Duration) -> Self
    where
        C: NetworkClient + 'static,
        G: LicenseGate + 'static,
    {
        Self::spawn(&Handle::current(), queue, interval)
    }

    /// Abort the driver task.
    pub fn stop(&self) {
        self.task.abort();
    }

    /// Whether the task has ended.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for TokioTickDriver {
    fn drop(&mut self) {
        self.task.abort();
    }
}
