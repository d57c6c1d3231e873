//! Per-category progress counters with a cancellation hook for observers.
//!
//! A tracker exists only while its category has work: it is created by the first
//! accepted job and torn down when `remaining` drops back to zero, at which point the
//! reporter is told to release its display.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::JobCategory;

/// Read-only progress readout for one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    /// Category the counters belong to.
    pub category: JobCategory,
    /// Jobs finished since the tracker was created.
    pub completed: usize,
    /// Jobs of this category still in the queue.
    pub remaining: usize,
}

impl ProgressSnapshot {
    /// Idle readout.
    #[must_use]
    pub const fn idle(category: JobCategory) -> Self {
        Self {
            category,
            completed: 0,
            remaining: 0,
        }
    }

    /// Jobs accepted since the tracker was created.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.completed + self.remaining
    }

    /// Completed fraction in `0.0..=1.0`; `0.0` when idle.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn fraction(&self) -> f32 {
        if self.total() == 0 {
            return 0.0;
        }
        self.completed as f32 / self.total() as f32
    }
}

/// Cloneable cancellation hook handed to observers.
///
/// Triggering it requests an abort of the whole category; the queue honours the request
/// at the start of its next tick.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    category: JobCategory,
    requested: Arc<AtomicBool>,
}

impl CancelHandle {
    fn new(category: JobCategory) -> Self {
        Self {
            category,
            requested: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Category this handle cancels.
    #[must_use]
    pub const fn category(&self) -> JobCategory {
        self.category
    }

    /// Request cancellation of the category.
    pub fn cancel(&self) {
        self.requested.store(true, Ordering::Release);
    }

    /// Whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }

    fn take(&self) -> bool {
        self.requested.swap(false, Ordering::AcqRel)
    }
}

/// External progress display.
pub trait ProgressReporter: Send {
    /// A tracker was created; show an indicator with `label`.
    fn started(&mut self, category: JobCategory, label: &str, cancel: CancelHandle);

    /// Counters changed or the queue ticked while the category is active.
    fn report(&mut self, snapshot: ProgressSnapshot);

    /// The tracker was torn down; release the indicator.
    fn finished(&mut self, category: JobCategory);
}

/// Counters for one category.
#[derive(Debug)]
pub struct ProgressTracker {
    category: JobCategory,
    completed: usize,
    remaining: usize,
    cancel: CancelHandle,
}

impl ProgressTracker {
    fn new(category: JobCategory) -> Self {
        Self {
            category,
            completed: 0,
            remaining: 0,
            cancel: CancelHandle::new(category),
        }
    }

    /// Current counters.
    #[must_use]
    pub const fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            category: self.category,
            completed: self.completed,
            remaining: self.remaining,
        }
    }

    /// Cancellation hook registered for this tracker's lifetime.
    #[must_use]
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }
}

/// Tracker slots for every category, owned by the queue.
#[derive(Default)]
pub(crate) struct ProgressTrackers {
    mesh: Option<ProgressTracker>,
    skinned: Option<ProgressTracker>,
    reporter: Option<Box<dyn ProgressReporter>>,
}

impl ProgressTrackers {
    pub(crate) fn set_reporter(&mut self, reporter: Box<dyn ProgressReporter>) {
        self.reporter = Some(reporter);
    }

    const fn slot(&self, category: JobCategory) -> Option<&ProgressTracker> {
        match category {
            JobCategory::Mesh => self.mesh.as_ref(),
            JobCategory::Skinned => self.skinned.as_ref(),
        }
    }

    fn slot_mut(&mut self, category: JobCategory) -> &mut Option<ProgressTracker> {
        match category {
            JobCategory::Mesh => &mut self.mesh,
            JobCategory::Skinned => &mut self.skinned,
        }
    }

    pub(crate) fn snapshot(&self, category: JobCategory) -> ProgressSnapshot {
        self.slot(category)
            .map_or_else(|| ProgressSnapshot::idle(category), ProgressTracker::snapshot)
    }

    pub(crate) fn cancel_handle(&self, category: JobCategory) -> Option<CancelHandle> {
        self.slot(category).map(ProgressTracker::cancel_handle)
    }

    /// Count a newly accepted job, creating the tracker on first use.
    pub(crate) fn add_task(&mut self, category: JobCategory) {
        let slot = self.slot_mut(category);
        let created = slot.is_none();
        let tracker = slot.get_or_insert_with(|| ProgressTracker::new(category));
        tracker.remaining += 1;
        let snapshot = tracker.snapshot();
        let cancel = tracker.cancel_handle();

        if let Some(reporter) = self.reporter.as_mut() {
            if created {
                reporter.started(category, category.progress_label(), cancel);
            }
            reporter.report(snapshot);
        }
    }

    /// Count a job leaving the queue after finishing; tears the tracker down when drained.
    pub(crate) fn finish_task(&mut self, category: JobCategory) {
        let slot = self.slot_mut(category);
        let Some(tracker) = slot.as_mut() else {
            debug!(%category, "finish for a category without tracker");
            return;
        };
        tracker.completed += 1;
        tracker.remaining = tracker.remaining.saturating_sub(1);
        let snapshot = tracker.snapshot();
        let drained = snapshot.remaining == 0;
        if drained {
            *slot = None;
        }

        if let Some(reporter) = self.reporter.as_mut() {
            reporter.report(snapshot);
            if drained {
                reporter.finished(category);
            }
        }
    }

    /// Tear down a category's tracker regardless of its counters.
    pub(crate) fn reset(&mut self, category: JobCategory) {
        if self.slot_mut(category).take().is_some() {
            if let Some(reporter) = self.reporter.as_mut() {
                reporter.finished(category);
            }
        }
    }

    pub(crate) fn reset_all(&mut self) {
        for category in JobCategory::ALL {
            self.reset(category);
        }
    }

    /// Categories whose cancel hook fired since the last call.
    pub(crate) fn take_cancel_requests(&self) -> Vec<JobCategory> {
        JobCategory::ALL
            .into_iter()
            .filter(|c| self.slot(*c).is_some_and(|t| t.cancel.take()))
            .collect()
    }

    /// Re-report every active tracker.
    pub(crate) fn refresh(&mut self) {
        let Some(reporter) = self.reporter.as_mut() else {
            return;
        };
        for tracker in [self.mesh.as_ref(), self.skinned.as_ref()].into_iter().flatten() {
            reporter.report(tracker.snapshot());
        }
    }
}
