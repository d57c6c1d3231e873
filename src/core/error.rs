//! Error types for generation queue operations.

use std::time::Duration;

use thiserror::Error;

/// Reasons a payload is refused before it may consume a network slot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Mesh has more triangles than the service accepts.
    #[error("mesh is too large: {count} triangles exceeds the limit of {limit}")]
    TooManyTriangles {
        /// Triangle count of the submitted mesh.
        count: usize,
        /// Configured triangle limit.
        limit: usize,
    },
    /// Encoded request body is larger than the service accepts.
    #[error("request is too large: {size} bytes exceeds the limit of {limit} bytes")]
    PayloadTooLarge {
        /// Size of the encoded request in bytes.
        size: usize,
        /// Configured byte limit.
        limit: usize,
    },
    /// The license gate refused generation.
    #[error("generation unavailable: {0}")]
    LicenseUnavailable(String),
    /// Mesh has no triangles to submit.
    #[error("mesh has no triangles")]
    EmptyGeometry,
    /// Skinning data does not cover every vertex.
    #[error("skinned mesh has {influences} bone influences for {vertices} vertices")]
    InfluenceMismatch {
        /// Vertex count of the mesh.
        vertices: usize,
        /// Number of per-vertex influence records.
        influences: usize,
    },
    /// Skinned mesh has an empty bone list.
    #[error("skinned mesh has no bones")]
    NoBones,
    /// The request body could not be produced.
    #[error("failed to encode request: {0}")]
    Encoding(String),
}

/// Job-level failures surfaced once a job has been accepted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobError {
    /// Payload failed validation at submission time.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Network or HTTP failure.
    #[error("transport error: {0}")]
    Transport(String),
    /// Transport succeeded but the service returned nothing usable.
    #[error("server returned empty result")]
    EmptyResult,
    /// Response body could not be decoded.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    /// No response arrived within the configured timeout.
    #[error("request timed out after {0:?}")]
    TimedOut(Duration),
}

impl JobError {
    /// Whether this failure came from the transport layer (and may be retried).
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// Configuration loading and validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A value is out of range.
    #[error("config invalid: {0}")]
    Invalid(String),
    /// An environment variable could not be parsed.
    #[error("environment variable `{key}` invalid: {message}")]
    Env {
        /// Variable name.
        key: String,
        /// Parse failure description.
        message: String,
    },
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
