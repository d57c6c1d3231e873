//! Thread-safe handle around a [`GenerationQueue`].
//!
//! All operations take the same `parking_lot::Mutex`, so `enqueue`, `tick` and the aborts
//! stay serialized exactly as on a single thread. Accepted submissions signal the wake
//! state so idle drivers resume ticking.

use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use crate::core::{
    CancelHandle, GenerationQueue, GenerationTarget, JobCategory, JobOutcome, JobState,
    LicenseGate, NetworkClient, ProgressSnapshot, TargetId, ValidationError,
};
use crate::runtime::api::{status, QueueStatus};

/// Wake signal shared between a queue and its drivers.
#[derive(Debug, Default)]
pub(crate) struct Wake {
    /// Set when work was accepted since the last driver wake-up.
    pub(crate) work_available: Mutex<bool>,
    pub(crate) condvar: Condvar,
    #[cfg(feature = "tokio-runtime")]
    pub(crate) notify: tokio::sync::Notify,
}

impl Wake {
    fn signal(&self) {
        *self.work_available.lock() = true;
        self.condvar.notify_all();
        #[cfg(feature = "tokio-runtime")]
        self.notify.notify_one();
    }

    /// Wake every thread waiting on the condvar without marking work.
    pub(crate) fn interrupt(&self) {
        let _guard = self.work_available.lock();
        self.condvar.notify_all();
    }
}

/// Cloneable, lock-protected generation queue.
pub struct SharedGenerationQueue<C, G>
where
    C: NetworkClient,
    G: LicenseGate,
{
    queue: Arc<Mutex<GenerationQueue<C, G>>>,
    wake: Arc<Wake>,
}

impl<C, G> Clone for SharedGenerationQueue<C, G>
where
    C: NetworkClient,
    G: LicenseGate,
{
    fn clone(&self) -> Self {
        Self {
            queue: Arc::clone(&self.queue),
            wake: Arc::clone(&self.wake),
        }
    }
}

impl<C, G> SharedGenerationQueue<C, G>
where
    C: NetworkClient,
    G: LicenseGate,
{
    /// Share `queue`.
    #[must_use]
    pub fn new(queue: GenerationQueue<C, G>) -> Self {
        Self {
            queue: Arc::new(Mutex::new(queue)),
            wake: Arc::new(Wake::default()),
        }
    }

    pub(crate) fn wake(&self) -> Arc<Wake> {
        Arc::clone(&self.wake)
    }

    /// See [`GenerationQueue::enqueue`]. Wakes idle drivers on success.
    ///
    /// # Errors
    ///
    /// The [`ValidationError`] explaining the refusal.
    pub fn enqueue(&self, target: &impl GenerationTarget) -> Result<(), ValidationError> {
        self.queue.lock().enqueue(target)?;
        self.wake.signal();
        Ok(())
    }

    /// See [`GenerationQueue::tick`].
    pub fn tick(&self) -> Option<JobOutcome> {
        self.queue.lock().tick()
    }

    /// See [`GenerationQueue::abort_category`].
    pub fn abort_category(&self, category: JobCategory) -> usize {
        self.queue.lock().abort_category(category)
    }

    /// See [`GenerationQueue::abort_all`].
    pub fn abort_all(&self) {
        self.queue.lock().abort_all();
    }

    /// See [`GenerationQueue::contains`].
    #[must_use]
    pub fn contains(&self, id: TargetId) -> bool {
        self.queue.lock().contains(id)
    }

    /// See [`GenerationQueue::len`].
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    /// See [`GenerationQueue::is_empty`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }

    /// See [`GenerationQueue::is_active`].
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.queue.lock().is_active()
    }

    /// See [`GenerationQueue::progress`].
    #[must_use]
    pub fn progress(&self, category: JobCategory) -> ProgressSnapshot {
        self.queue.lock().progress(category)
    }

    /// See [`GenerationQueue::cancel_handle`].
    #[must_use]
    pub fn cancel_handle(&self, category: JobCategory) -> Option<CancelHandle> {
        self.queue.lock().cancel_handle(category)
    }

    /// See [`GenerationQueue::pending_targets`].
    #[must_use]
    pub fn pending_targets(&self) -> Vec<TargetId> {
        self.queue.lock().pending_targets()
    }

    /// See [`GenerationQueue::job_state`].
    #[must_use]
    pub fn job_state(&self, id: TargetId) -> Option<JobState> {
        self.queue.lock().job_state(id)
    }

    /// Status snapshot taken under the lock.
    #[must_use]
    pub fn status(&self) -> QueueStatus {
        status(&self.queue.lock())
    }

    /// Run `f` with exclusive access to the queue.
    pub fn with_queue<R>(&self, f: impl FnOnce(&mut GenerationQueue<C, G>) -> R) -> R {
        f(&mut self.queue.lock())
    }
}
