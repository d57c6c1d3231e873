//! FIFO generation queue with at most one request in flight.
//!
//! The queue is a plain owned value: every mutation goes through `&mut self` from
//! [`GenerationQueue::enqueue`], [`GenerationQueue::tick`] or the abort operations, so it
//! needs no internal locking. Multi-threaded hosts wrap it in
//! [`crate::runtime::SharedGenerationQueue`].
//!
//! The head of `pending` is always the running job. When it reaches a terminal state it
//! is removed and the next job is started within the same tick.

use std::collections::VecDeque;

use tracing::{debug, error, info, warn};

use crate::core::job::{Job, RequestPolicy, Step, Submitter};
use crate::core::progress::ProgressTrackers;
use crate::core::{
    build_event, validate, CancelHandle, EventSink, GenerationParams, GenerationTarget,
    JobCategory, JobError, JobOutput, JobState, LicenseGate, MeshResult, NetworkClient,
    PayloadLimits, ProgressReporter, ProgressSnapshot, QueueEventKind, ResultSink,
    SkinnedResult, TargetId, ValidationError, WireCodec,
};
use crate::infra::codec::JsonCodec;

/// What happened to the job that left the queue during a tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOutcome {
    /// Target of the finished job.
    pub target: TargetId,
    /// Category of the finished job.
    pub category: JobCategory,
    /// Terminal state reached.
    pub state: JobState,
    /// Failure reason when `state` is [`JobState::Failed`].
    pub error: Option<JobError>,
}

/// Scheduler for SDF generation jobs.
pub struct GenerationQueue<C, G>
where
    C: NetworkClient,
    G: LicenseGate,
{
    pending: VecDeque<Job<C::Handle>>,
    submitter: Submitter<C, G>,
    mesh_sink: Box<dyn ResultSink<MeshResult>>,
    skinned_sink: Box<dyn ResultSink<SkinnedResult>>,
    progress: ProgressTrackers,
    events: Option<Box<dyn EventSink>>,
    params: Option<GenerationParams>,
}

impl<C, G> GenerationQueue<C, G>
where
    C: NetworkClient,
    G: LicenseGate,
{
    /// Create an empty queue with default limits, the JSON codec and no timeout or retry.
    pub fn new(
        client: C,
        gate: G,
        mesh_sink: impl ResultSink<MeshResult> + 'static,
        skinned_sink: impl ResultSink<SkinnedResult> + 'static,
    ) -> Self {
        Self {
            pending: VecDeque::new(),
            submitter: Submitter {
                client,
                gate,
                codec: Box::new(JsonCodec),
                limits: PayloadLimits::default(),
                policy: RequestPolicy::default(),
            },
            mesh_sink: Box::new(mesh_sink),
            skinned_sink: Box::new(skinned_sink),
            progress: ProgressTrackers::default(),
            events: None,
            params: None,
        }
    }

    /// Replace the payload limits.
    #[must_use]
    pub fn with_limits(mut self, limits: PayloadLimits) -> Self {
        self.submitter.limits = limits;
        self
    }

    /// Replace the timeout and retry policy.
    #[must_use]
    pub fn with_policy(mut self, policy: RequestPolicy) -> Self {
        self.submitter.policy = policy;
        self
    }

    /// Replace the wire codec.
    #[must_use]
    pub fn with_codec(mut self, codec: impl WireCodec + 'static) -> Self {
        self.submitter.codec = Box::new(codec);
        self
    }

    /// Force these generation parameters onto every accepted payload.
    #[must_use]
    pub fn with_generation_params(mut self, params: GenerationParams) -> Self {
        self.params = Some(params);
        self
    }

    /// Attach an event sink.
    #[must_use]
    pub fn with_events(mut self, events: impl EventSink + 'static) -> Self {
        self.events = Some(Box::new(events));
        self
    }

    /// Attach a progress display.
    #[must_use]
    pub fn with_progress_reporter(mut self, reporter: impl ProgressReporter + 'static) -> Self {
        self.progress.set_reporter(Box::new(reporter));
        self
    }

    /// Submit a target for generation.
    ///
    /// Submitting a target that is already queued is a no-op. A refused submission leaves
    /// the queue untouched and never reaches the network. When the queue was empty the new
    /// job is started immediately, so a failure at submission time is also returned here.
    ///
    /// # Errors
    ///
    /// The [`ValidationError`] explaining the refusal.
    pub fn enqueue(&mut self, target: &impl GenerationTarget) -> Result<(), ValidationError> {
        let id = target.target_id();
        if self.contains(id) {
            debug!(target_id = %id, "target already queued");
            return Ok(());
        }

        let mut payload = target.snapshot().inspect_err(|err| {
            warn!(target_id = %id, error = %err, "target snapshot failed");
        })?;
        if let Some(params) = self.params {
            payload = payload.with_params(params);
        }
        let category = payload.category();

        let checked = self.submitter.authorize().and_then(|_| {
            validate(&payload, &self.submitter.limits, self.submitter.codec.as_ref())
        });
        if let Err(err) = checked {
            warn!(target_id = %id, %category, error = %err, "submission rejected");
            self.emit(id, category, QueueEventKind::Rejected(err.to_string()));
            return Err(err);
        }

        let mut job = Job::new(id, payload);
        let start_now = self.pending.is_empty();
        if start_now {
            if let Err(err) = job.start(&mut self.submitter) {
                self.emit(id, category, QueueEventKind::Rejected(err.to_string()));
                return Err(err);
            }
        }

        self.pending.push_back(job);
        self.progress.add_task(category);
        info!(target_id = %id, %category, queued = self.pending.len(), "job enqueued");
        self.emit(id, category, QueueEventKind::Enqueued);
        if start_now {
            self.emit(id, category, QueueEventKind::Started);
        }
        Ok(())
    }

    /// Run one scheduling step.
    ///
    /// Honours pending cancel requests, then polls the running job. Returns the outcome
    /// when a job finished during this tick; `None` otherwise, including on an empty queue.
    pub fn tick(&mut self) -> Option<JobOutcome> {
        for category in self.progress.take_cancel_requests() {
            info!(%category, "cancel requested by observer");
            self.abort_category(category);
        }

        let head = self.pending.front_mut()?;
        let step = head.poll(&mut self.submitter);
        let (target, category, state) = (head.target(), head.category(), head.state());

        let outcome = match step {
            Step::Pending => {
                self.progress.refresh();
                return None;
            }
            Step::Completed(output) => {
                match output {
                    JobOutput::Mesh(result) => self.mesh_sink.apply(target, result),
                    JobOutput::Skinned(result) => self.skinned_sink.apply(target, result),
                }
                info!(target_id = %target, %category, "job completed");
                self.emit(target, category, QueueEventKind::Completed);
                JobOutcome {
                    target,
                    category,
                    state,
                    error: None,
                }
            }
            Step::Failed(err) => {
                error!(target_id = %target, %category, error = %err, "job failed");
                self.emit(target, category, QueueEventKind::Failed(err.clone()));
                JobOutcome {
                    target,
                    category,
                    state,
                    error: Some(err),
                }
            }
        };

        self.pending.pop_front();
        self.progress.finish_task(category);
        self.start_head();
        Some(outcome)
    }

    /// Start the head job, dropping any that fail at submission.
    fn start_head(&mut self) {
        while let Some(head) = self.pending.front_mut() {
            if head.state() != JobState::Queued {
                return;
            }
            let (target, category) = (head.target(), head.category());
            match head.start(&mut self.submitter) {
                Ok(()) => {
                    self.emit(target, category, QueueEventKind::Started);
                    return;
                }
                Err(err) => {
                    let err = JobError::from(err);
                    error!(target_id = %target, %category, error = %err, "job failed at submission");
                    self.emit(target, category, QueueEventKind::Failed(err));
                    self.pending.pop_front();
                    self.progress.finish_task(category);
                }
            }
        }
    }

    /// Remove every job of `category`, cancelling it if it is running.
    ///
    /// Jobs of other categories keep their order; if the running job was removed the new
    /// head is started. Returns the number of jobs removed.
    pub fn abort_category(&mut self, category: JobCategory) -> usize {
        let head_removed = self
            .pending
            .front()
            .is_some_and(|job| job.category() == category);

        let mut removed = Vec::new();
        let mut kept = VecDeque::with_capacity(self.pending.len());
        for mut job in self.pending.drain(..) {
            if job.category() == category {
                job.abort();
                removed.push(job.target());
            } else {
                kept.push_back(job);
            }
        }
        self.pending = kept;
        self.progress.reset(category);

        for target in &removed {
            self.emit(*target, category, QueueEventKind::Aborted);
        }
        if !removed.is_empty() {
            warn!(%category, removed = removed.len(), "category aborted");
        }
        if head_removed {
            self.start_head();
        }
        removed.len()
    }

    /// Cancel the running job and drop everything queued.
    pub fn abort_all(&mut self) {
        let jobs: Vec<_> = self.pending.drain(..).collect();
        for mut job in jobs {
            job.abort();
            self.emit(job.target(), job.category(), QueueEventKind::Aborted);
        }
        self.progress.reset_all();
        warn!("queue aborted");
    }

    /// Whether a job for `id` is queued or running.
    #[must_use]
    pub fn contains(&self, id: TargetId) -> bool {
        self.pending.iter().any(|job| job.target() == id)
    }

    /// Number of queued jobs, including the running one.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether the queue holds no jobs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Whether the tick loop still has work.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.is_empty()
    }

    /// Progress counters of `category`.
    #[must_use]
    pub fn progress(&self, category: JobCategory) -> ProgressSnapshot {
        self.progress.snapshot(category)
    }

    /// Cancellation hook for `category`, present while the category has work.
    #[must_use]
    pub fn cancel_handle(&self, category: JobCategory) -> Option<CancelHandle> {
        self.progress.cancel_handle(category)
    }

    /// Queued targets in service order.
    #[must_use]
    pub fn pending_targets(&self) -> Vec<TargetId> {
        self.pending.iter().map(Job::target).collect()
    }

    /// State of the job for `id`, if queued.
    #[must_use]
    pub fn job_state(&self, id: TargetId) -> Option<JobState> {
        self.pending
            .iter()
            .find(|job| job.target() == id)
            .map(Job::state)
    }

    /// The job currently holding the network slot.
    #[must_use]
    pub fn running(&self) -> Option<(TargetId, JobCategory)> {
        self.pending
            .front()
            .filter(|job| job.state().is_in_flight())
            .map(|job| (job.target(), job.category()))
    }

    /// Payload limits in force.
    #[must_use]
    pub const fn limits(&self) -> &PayloadLimits {
        &self.submitter.limits
    }

    /// Timeout and retry policy in force.
    #[must_use]
    pub const fn policy(&self) -> &RequestPolicy {
        &self.submitter.policy
    }

    fn emit(&mut self, target: TargetId, category: JobCategory, kind: QueueEventKind) {
        if let Some(events) = self.events.as_mut() {
            events.record(build_event(target, category, kind));
        }
    }
}
