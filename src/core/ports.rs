//! Collaborator traits the queue is wired to.
//!
//! The queue owns one implementation of each: a license gate, a network client, a wire
//! codec and one result sink per category. Bundled implementations live in `infra`.

use crate::core::{GenerationResponse, JobError, JobPayload, TargetId, ValidationError};

/// Authorization check consulted before any submission.
pub trait LicenseGate: Send {
    /// Whether generation requests may be sent.
    fn is_generation_available(&self) -> bool;

    /// Human readable reason generation is unavailable.
    fn error_message(&self) -> String;

    /// Endpoint to submit to; `None` when generation is unavailable.
    fn generation_url(&self) -> Option<String>;
}

/// State of an outstanding request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStatus {
    /// No response yet.
    Pending,
    /// Response body received.
    Done(Vec<u8>),
    /// Transport failure with a message.
    Failed(String),
}

/// A single outstanding request.
///
/// Dropping a handle disposes it; a disposed handle never delivers a response.
pub trait RequestHandle: Send {
    /// Non-blocking completion check.
    fn poll(&mut self) -> PollStatus;

    /// Cancel the request.
    fn cancel(&mut self);
}

/// Issues requests to the remote generation service.
pub trait NetworkClient: Send {
    /// Handle type returned per request.
    type Handle: RequestHandle;

    /// Dispatch a request body to `url`.
    fn submit(&mut self, url: &str, body: Vec<u8>) -> Self::Handle;
}

/// Converts payloads to request bodies and response bodies to [`GenerationResponse`].
pub trait WireCodec: Send {
    /// Encode a payload into a request body.
    ///
    /// # Errors
    ///
    /// [`ValidationError::Encoding`] when the payload cannot be represented.
    fn encode_request(&self, payload: &JobPayload) -> Result<Vec<u8>, ValidationError>;

    /// Exact size [`WireCodec::encode_request`] would produce, without building the body.
    ///
    /// # Errors
    ///
    /// [`ValidationError::Encoding`] when the payload cannot be represented.
    fn encoded_len(&self, payload: &JobPayload) -> Result<usize, ValidationError> {
        self.encode_request(payload).map(|body| body.len())
    }

    /// Decode a response body.
    ///
    /// # Errors
    ///
    /// [`JobError::MalformedResponse`] when the body is not a valid response.
    fn decode_response(&self, body: &[u8]) -> Result<GenerationResponse, JobError>;
}

/// Applies a completed job's result to the object that requested it.
pub trait ResultSink<R>: Send {
    /// Called exactly once per successfully completed job.
    fn apply(&mut self, target: TargetId, result: R);
}

impl<R, F> ResultSink<R> for F
where
    F: FnMut(TargetId, R) + Send,
{
    fn apply(&mut self, target: TargetId, result: R) {
        self(target, result);
    }
}
