//! Queue notifications.
//!
//! Every accepted, started, finished, failed, aborted or rejected job produces a
//! [`QueueEvent`]. Failures carry their error so nothing is dropped silently.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::core::{JobCategory, JobError, TargetId};
use crate::util::clock::now_ms;

/// What happened to a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueEventKind {
    /// Accepted into the queue.
    Enqueued,
    /// Request dispatched.
    Started,
    /// Result applied to the sink.
    Completed,
    /// Job failed.
    Failed(JobError),
    /// Job cancelled by an abort.
    Aborted,
    /// Submission refused at enqueue.
    Rejected(String),
}

/// Notification emitted by the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEvent {
    /// Target the job belongs to.
    pub target: TargetId,
    /// Job category.
    pub category: JobCategory,
    /// What happened.
    pub kind: QueueEventKind,
    /// Timestamp milliseconds.
    pub created_at_ms: u128,
}

/// Receiver of queue notifications.
pub trait EventSink: Send {
    /// Record an event.
    fn record(&mut self, event: QueueEvent);
}

impl<F> EventSink for F
where
    F: FnMut(QueueEvent) + Send,
{
    fn record(&mut self, event: QueueEvent) {
        self(event);
    }
}

/// Bounded in-memory sink; clones share the same buffer.
#[derive(Debug, Clone)]
pub struct InMemoryEventSink {
    events: Arc<Mutex<VecDeque<QueueEvent>>>,
    max_events: usize,
}

impl InMemoryEventSink {
    /// Create a sink keeping at most `max_events`, dropping the oldest first.
    #[must_use]
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Arc::new(Mutex::new(VecDeque::with_capacity(max_events.min(1024)))),
            max_events,
        }
    }

    /// Snapshot of stored events.
    #[must_use]
    pub fn events(&self) -> Vec<QueueEvent> {
        self.events.lock().iter().cloned().collect()
    }

    /// Stored failures, oldest first.
    #[must_use]
    pub fn failures(&self) -> Vec<(TargetId, JobError)> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match &e.kind {
                QueueEventKind::Failed(err) => Some((e.target, err.clone())),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for InMemoryEventSink {
    fn record(&mut self, event: QueueEvent) {
        let mut events = self.events.lock();
        if events.len() >= self.max_events {
            events.pop_front();
        }
        events.push_back(event);
    }
}

/// Helper to build an event stamped with the current time.
#[must_use]
pub fn build_event(target: TargetId, category: JobCategory, kind: QueueEventKind) -> QueueEvent {
    QueueEvent {
        target,
        category,
        kind,
        created_at_ms: now_ms(),
    }
}
