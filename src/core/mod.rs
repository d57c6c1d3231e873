//! Scheduling core: payloads, validation, the job state machine and the queue.

pub mod error;
pub mod events;
mod job;
pub mod payload;
pub mod ports;
pub mod progress;
pub mod queue;
pub mod result;
pub mod types;
pub mod validator;

pub use error::{AppResult, ConfigError, JobError, ValidationError};
pub use events::{build_event, EventSink, InMemoryEventSink, QueueEvent, QueueEventKind};
pub use job::RequestPolicy;
pub use payload::{
    Aabb, BoneInfluence, BoneRef, GenerationParams, GenerationTarget, JobPayload, MeshGeometry,
    MeshPayload, MeshTarget, SkinnedGeometry, SkinnedPayload, SkinnedTarget,
};
pub use ports::{LicenseGate, NetworkClient, PollStatus, RequestHandle, ResultSink, WireCodec};
pub use progress::{CancelHandle, ProgressReporter, ProgressSnapshot, ProgressTracker};
pub use queue::{GenerationQueue, JobOutcome};
pub use result::{
    interpret_mesh, interpret_skinned, BoneRepresentation, GenerationResponse, JobOutput,
    MeshResult, ObjectTransform, SkinnedResult, VoxelRepresentation,
};
pub use types::{JobCategory, JobState, TargetId};
pub use validator::{validate, PayloadLimits, DEFAULT_MAX_REQUEST_BYTES, DEFAULT_MAX_TRIANGLES};
