//! Serializable status snapshot for observers such as an editor panel.

use serde::{Deserialize, Serialize};

use crate::core::{
    GenerationQueue, JobCategory, LicenseGate, NetworkClient, ProgressSnapshot, TargetId,
};

/// Job currently holding the network slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunningJob {
    /// Target being generated.
    pub target: TargetId,
    /// Its category.
    pub category: JobCategory,
}

/// Point-in-time view of a queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStatus {
    /// Jobs in the queue, including the running one.
    pub length: usize,
    /// Whether the tick loop still has work.
    pub active: bool,
    /// Job in flight, if any.
    pub running: Option<RunningJob>,
    /// Progress of every category, idle ones included.
    pub progress: Vec<ProgressSnapshot>,
}

impl QueueStatus {
    /// Progress entry for `category`.
    #[must_use]
    pub fn progress_of(&self, category: JobCategory) -> Option<&ProgressSnapshot> {
        self.progress.iter().find(|p| p.category == category)
    }
}

/// Take a status snapshot of `queue`.
#[must_use]
pub fn status<C, G>(queue: &GenerationQueue<C, G>) -> QueueStatus
where
    C: NetworkClient,
    G: LicenseGate,
{
    QueueStatus {
        length: queue.len(),
        active: queue.is_active(),
        running: queue
            .running()
            .map(|(target, category)| RunningJob { target, category }),
        progress: JobCategory::ALL
            .into_iter()
            .map(|category| queue.progress(category))
            .collect(),
    }
}
