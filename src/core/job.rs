//! Job state machine and the submitter that talks to the service on its behalf.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::core::result::{interpret_mesh, interpret_skinned};
use crate::core::{
    JobCategory, JobError, JobOutput, JobPayload, JobState, LicenseGate, NetworkClient,
    PayloadLimits, PollStatus, RequestHandle, TargetId, ValidationError, WireCodec,
};

/// Scheduler-side request policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RequestPolicy {
    /// Fail a job still awaiting its response after this long; `None` waits forever.
    pub request_timeout: Option<Duration>,
    /// Extra submissions allowed after a transport failure.
    pub max_retries: u32,
}

/// Everything a job needs to submit and interpret a request.
pub(crate) struct Submitter<C, G> {
    pub(crate) client: C,
    pub(crate) gate: G,
    pub(crate) codec: Box<dyn WireCodec>,
    pub(crate) limits: PayloadLimits,
    pub(crate) policy: RequestPolicy,
}

impl<C, G> Submitter<C, G>
where
    C: NetworkClient,
    G: LicenseGate,
{
    /// Check the license gate.
    pub(crate) fn authorize(&self) -> Result<String, ValidationError> {
        if !self.gate.is_generation_available() {
            return Err(ValidationError::LicenseUnavailable(self.gate.error_message()));
        }
        self.gate
            .generation_url()
            .ok_or_else(|| ValidationError::LicenseUnavailable(self.gate.error_message()))
    }

    /// Encode and size-check the final request body.
    fn encode(&self, payload: &JobPayload) -> Result<Vec<u8>, ValidationError> {
        let body = self.codec.encode_request(payload)?;
        self.limits.check_request_size(body.len())?;
        Ok(body)
    }

    fn dispatch(&mut self, body: &[u8]) -> Result<C::Handle, ValidationError> {
        let url = self.authorize()?;
        Ok(self.client.submit(&url, body.to_vec()))
    }
}

/// Result of polling the running job once.
#[derive(Debug)]
pub(crate) enum Step {
    /// Still waiting.
    Pending,
    /// Finished successfully.
    Completed(JobOutput),
    /// Finished with an error.
    Failed(JobError),
}

/// One generation request and its lifecycle.
pub(crate) struct Job<H> {
    target: TargetId,
    payload: JobPayload,
    state: JobState,
    handle: Option<H>,
    body: Option<Vec<u8>>,
    attempts: u32,
    submitted_at: Option<Instant>,
}

impl<H: RequestHandle> Job<H> {
    pub(crate) const fn new(target: TargetId, payload: JobPayload) -> Self {
        Self {
            target,
            payload,
            state: JobState::Queued,
            handle: None,
            body: None,
            attempts: 0,
            submitted_at: None,
        }
    }

    pub(crate) const fn target(&self) -> TargetId {
        self.target
    }

    pub(crate) const fn category(&self) -> JobCategory {
        self.payload.category()
    }

    pub(crate) const fn state(&self) -> JobState {
        self.state
    }

    /// `Queued -> Running -> AwaitingNetworkResult`, or `Failed` when the final body or
    /// the license check refuses the submission. No request is sent on failure.
    pub(crate) fn start<C, G>(&mut self, submitter: &mut Submitter<C, G>) -> Result<(), ValidationError>
    where
        C: NetworkClient<Handle = H>,
        G: LicenseGate,
    {
        debug_assert_eq!(self.state, JobState::Queued);
        self.state = JobState::Running;

        let dispatched = submitter
            .encode(&self.payload)
            .and_then(|body| submitter.dispatch(&body).map(|handle| (body, handle)));

        match dispatched {
            Ok((body, handle)) => {
                info!(target_id = %self.target, category = %self.category(), bytes = body.len(), "generation request sent");
                self.body = Some(body);
                self.handle = Some(handle);
                self.attempts = 1;
                self.submitted_at = Some(Instant::now());
                self.state = JobState::AwaitingNetworkResult;
                Ok(())
            }
            Err(err) => {
                warn!(target_id = %self.target, error = %err, "generation request refused at submission");
                self.state = JobState::Failed;
                Err(err)
            }
        }
    }

    /// Check the outstanding request once without blocking.
    pub(crate) fn poll<C, G>(&mut self, submitter: &mut Submitter<C, G>) -> Step
    where
        C: NetworkClient<Handle = H>,
        G: LicenseGate,
    {
        if self.state != JobState::AwaitingNetworkResult {
            return Step::Pending;
        }
        let Some(handle) = self.handle.as_mut() else {
            return Step::Pending;
        };

        match handle.poll() {
            PollStatus::Pending => self.check_timeout(submitter.policy),
            PollStatus::Failed(message) => {
                self.handle = None;
                if self.attempts <= submitter.policy.max_retries {
                    return self.retry(submitter, &message);
                }
                self.fail(JobError::Transport(message))
            }
            PollStatus::Done(bytes) => {
                self.handle = None;
                let output = submitter
                    .codec
                    .decode_response(&bytes)
                    .and_then(|response| match &self.payload {
                        JobPayload::Mesh(p) => interpret_mesh(p, response).map(JobOutput::Mesh),
                        JobPayload::Skinned(p) => {
                            interpret_skinned(p, response).map(JobOutput::Skinned)
                        }
                    });
                match output {
                    Ok(output) => {
                        self.state = JobState::Completed;
                        self.body = None;
                        Step::Completed(output)
                    }
                    Err(err) => self.fail(err),
                }
            }
        }
    }

    fn check_timeout(&mut self, policy: RequestPolicy) -> Step {
        let (Some(timeout), Some(at)) = (policy.request_timeout, self.submitted_at) else {
            return Step::Pending;
        };
        if at.elapsed() < timeout {
            return Step::Pending;
        }
        if let Some(mut handle) = self.handle.take() {
            handle.cancel();
        }
        self.fail(JobError::TimedOut(timeout))
    }

    fn retry<C, G>(&mut self, submitter: &mut Submitter<C, G>, message: &str) -> Step
    where
        C: NetworkClient<Handle = H>,
        G: LicenseGate,
    {
        let Some(body) = self.body.as_deref() else {
            return self.fail(JobError::Transport(message.to_owned()));
        };
        match submitter.dispatch(body) {
            Ok(handle) => {
                self.attempts += 1;
                warn!(target_id = %self.target, attempt = self.attempts, error = message, "retrying generation request");
                self.handle = Some(handle);
                self.submitted_at = Some(Instant::now());
                Step::Pending
            }
            Err(err) => self.fail(err.into()),
        }
    }

    fn fail(&mut self, err: JobError) -> Step {
        self.state = JobState::Failed;
        self.body = None;
        Step::Failed(err)
    }

    /// Cancel the job, disposing the outstanding request if any.
    pub(crate) fn abort(&mut self) {
        if self.state.is_terminal() {
            return;
        }
        if let Some(mut handle) = self.handle.take() {
            handle.cancel();
        }
        debug!(target_id = %self.target, "job aborted");
        self.body = None;
        self.state = JobState::Aborted;
    }
}
