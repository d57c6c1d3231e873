//! Identity, category and lifecycle types shared across the queue.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque identity of the object a job generates a representation for.
///
/// Used for deduplication and membership queries; callers never hold job references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetId(Uuid);

impl TargetId {
    /// Create a fresh random identity.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TargetId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for TargetId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Kind of generation job; selects the result sink and progress tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobCategory {
    /// A single static mesh.
    Mesh,
    /// A skinned mesh split into per-bone sub-meshes.
    Skinned,
}

impl JobCategory {
    /// Every category, in display order.
    pub const ALL: [Self; 2] = [Self::Mesh, Self::Skinned];

    /// Human readable progress title.
    #[must_use]
    pub const fn progress_label(self) -> &'static str {
        match self {
            Self::Mesh => "Generating mesh SDFs",
            Self::Skinned => "Generating skinned mesh SDFs",
        }
    }
}

impl fmt::Display for JobCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mesh => f.write_str("mesh"),
            Self::Skinned => f.write_str("skinned"),
        }
    }
}

/// Lifecycle of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Waiting behind the running job.
    Queued,
    /// Head of the queue, request being prepared.
    Running,
    /// Request dispatched; waiting for the service.
    AwaitingNetworkResult,
    /// Result applied to its sink.
    Completed,
    /// Failed with a surfaced error.
    Failed,
    /// Cancelled by an abort.
    Aborted,
}

impl JobState {
    /// Terminal states never transition again.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Aborted)
    }

    /// States that occupy the single in-flight slot.
    #[must_use]
    pub const fn is_in_flight(self) -> bool {
        matches!(self, Self::Running | Self::AwaitingNetworkResult)
    }
}
