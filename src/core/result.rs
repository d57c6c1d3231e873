//! Decoded service responses and the per-category results handed to sinks.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::{Aabb, BoneRef, GenerationParams, JobError, MeshPayload, SkinnedPayload};

/// Encoded object transform returned alongside a representation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ObjectTransform {
    /// Rotation quaternion, base64.
    #[serde(rename = "Q", default)]
    pub rotation: String,
    /// Translation, base64.
    #[serde(rename = "T", default)]
    pub translation: String,
    /// Scale, base64.
    #[serde(rename = "S", default)]
    pub scale: String,
}

/// One approximate distance field as returned by the service.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VoxelRepresentation {
    /// Embedding grid, base64.
    #[serde(default)]
    pub embeds: String,
    /// Signed distance grid, base64.
    #[serde(default)]
    pub sd_grid: String,
    /// Optional transform of the represented object.
    #[serde(default)]
    pub transform: Option<ObjectTransform>,
}

impl VoxelRepresentation {
    /// A representation missing either field carries nothing usable.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.embeds.is_empty() || self.sd_grid.is_empty()
    }
}

/// Decoded response body.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// One entry per generated mesh; `None` when the service sent none.
    #[serde(default)]
    pub meshes_data: Option<Vec<VoxelRepresentation>>,
}

/// Result of a completed mesh job.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshResult {
    /// Generated representation.
    pub representation: VoxelRepresentation,
    /// Bounding box of the submitted mesh.
    pub bounds: Aabb,
    /// Parameters the representation was generated with.
    pub params: GenerationParams,
}

/// Representation generated for one bone.
#[derive(Debug, Clone, PartialEq)]
pub struct BoneRepresentation {
    /// Bone the sub-object is re-parented to.
    pub bone: BoneRef,
    /// Generated representation.
    pub representation: VoxelRepresentation,
}

/// Result of a completed skinned job.
#[derive(Debug, Clone, PartialEq)]
pub struct SkinnedResult {
    /// Bones that received a representation, in bone order.
    pub bones: Vec<BoneRepresentation>,
    /// Bones without a representation; their placeholder objects are discarded.
    pub discarded: Vec<BoneRef>,
    /// Parameters the representations were generated with.
    pub params: GenerationParams,
}

/// Output of a completed job, routed to the sink of its category.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutput {
    /// Mesh job output.
    Mesh(MeshResult),
    /// Skinned job output.
    Skinned(SkinnedResult),
}

/// Interpret a response for a mesh job.
///
/// # Errors
///
/// [`JobError::EmptyResult`] when the service returned no usable representation.
pub fn interpret_mesh(
    payload: &MeshPayload,
    response: GenerationResponse,
) -> Result<MeshResult, JobError> {
    let representation = response
        .meshes_data
        .and_then(|meshes| meshes.into_iter().next())
        .filter(|r| !r.is_empty())
        .ok_or(JobError::EmptyResult)?;

    Ok(MeshResult {
        representation,
        bounds: payload.geometry.bounds(),
        params: payload.params,
    })
}

/// Interpret a response for a skinned job.
///
/// Bones with an empty entry, and bones past the returned count, are discarded rather
/// than failing the job.
///
/// # Errors
///
/// [`JobError::EmptyResult`] when the service sent no entries list at all.
pub fn interpret_skinned(
    payload: &SkinnedPayload,
    response: GenerationResponse,
) -> Result<SkinnedResult, JobError> {
    let meshes = response.meshes_data.ok_or(JobError::EmptyResult)?;
    let bones = &payload.geometry.bones;

    if meshes.len() > bones.len() {
        warn!(
            returned = meshes.len(),
            bones = bones.len(),
            "service returned more representations than bones; extras ignored"
        );
    }

    let mut applied = Vec::with_capacity(bones.len());
    let mut discarded = Vec::new();
    let mut returned = meshes.into_iter();

    for bone in bones {
        match returned.next() {
            Some(representation) if !representation.is_empty() => {
                applied.push(BoneRepresentation {
                    bone: bone.clone(),
                    representation,
                });
            }
            Some(_) => {
                debug!(bone = %bone.name, "no representation for bone");
                discarded.push(bone.clone());
            }
            None => discarded.push(bone.clone()),
        }
    }

    Ok(SkinnedResult {
        bones: applied,
        discarded,
        params: payload.params,
    })
}
