//! JSON wire codec for the generation service.
//!
//! Geometry arrays travel as base64 strings of little-endian values: vertices as three
//! `f32` per vertex, faces as `i32` indices, bone ids as four `i32` per vertex and bone
//! weights as four `f32` per vertex.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Serialize;

use crate::core::{
    BoneInfluence, GenerationParams, GenerationResponse, JobError, JobPayload, MeshGeometry,
    ValidationError, WireCodec,
};

/// Stateless JSON codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[derive(Serialize)]
struct MeshRequest {
    faces: String,
    vertices: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    bone_ids: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    bone_weights: Option<String>,
    vox_dim: u32,
    sdf_dim: u32,
    cutoff_weight: f32,
    static_quantization: bool,
}

/// Raw little-endian arrays of one payload.
struct RawArrays {
    faces: Vec<u8>,
    vertices: Vec<u8>,
    skin: Option<(Vec<u8>, Vec<u8>)>,
}

impl RawArrays {
    fn collect(payload: &JobPayload) -> Result<Self, ValidationError> {
        let mesh = payload.mesh_geometry();
        let skin = match payload {
            JobPayload::Mesh(_) => None,
            JobPayload::Skinned(p) => Some(skin_bytes(&p.geometry.influences)),
        };
        Ok(Self {
            faces: face_bytes(mesh)?,
            vertices: vertex_bytes(mesh),
            skin,
        })
    }

    fn byte_lens(&self) -> impl Iterator<Item = usize> + '_ {
        let skin = self
            .skin
            .iter()
            .flat_map(|(ids, weights)| [ids.len(), weights.len()]);
        [self.faces.len(), self.vertices.len()].into_iter().chain(skin)
    }
}

fn face_bytes(mesh: &MeshGeometry) -> Result<Vec<u8>, ValidationError> {
    let mut out = Vec::with_capacity(mesh.indices.len() * 4);
    for &index in &mesh.indices {
        let index = i32::try_from(index)
            .map_err(|_| ValidationError::Encoding(format!("face index {index} out of range")))?;
        out.extend_from_slice(&index.to_le_bytes());
    }
    Ok(out)
}

fn vertex_bytes(mesh: &MeshGeometry) -> Vec<u8> {
    mesh.vertices
        .iter()
        .flatten()
        .flat_map(|v| v.to_le_bytes())
        .collect()
}

fn skin_bytes(influences: &[BoneInfluence]) -> (Vec<u8>, Vec<u8>) {
    let ids = influences
        .iter()
        .flat_map(|i| i.indices)
        .flat_map(i32::to_le_bytes)
        .collect();
    let weights = influences
        .iter()
        .flat_map(|i| i.weights)
        .flat_map(f32::to_le_bytes)
        .collect();
    (ids, weights)
}

fn request(
    params: &GenerationParams,
    mut encode: impl FnMut(&[u8]) -> String,
    raw: &RawArrays,
) -> MeshRequest {
    MeshRequest {
        faces: encode(&raw.faces),
        vertices: encode(&raw.vertices),
        bone_ids: raw.skin.as_ref().map(|(ids, _)| encode(ids)),
        bone_weights: raw.skin.as_ref().map(|(_, weights)| encode(weights)),
        vox_dim: params.embedding_grid_dim,
        sdf_dim: params.sdf_dim,
        cutoff_weight: params.cutoff_weight,
        static_quantization: params.static_quantization,
    }
}

fn to_json(request: &MeshRequest) -> Result<Vec<u8>, ValidationError> {
    serde_json::to_vec(request).map_err(|e| ValidationError::Encoding(e.to_string()))
}

impl WireCodec for JsonCodec {
    fn encode_request(&self, payload: &JobPayload) -> Result<Vec<u8>, ValidationError> {
        let raw = RawArrays::collect(payload)?;
        to_json(&request(payload.params(), |bytes| STANDARD.encode(bytes), &raw))
    }

    /// Sizes the JSON skeleton with empty strings and adds the base64 lengths, which
    /// serialize without escaping.
    fn encoded_len(&self, payload: &JobPayload) -> Result<usize, ValidationError> {
        let raw = RawArrays::collect(payload)?;
        let skeleton = to_json(&request(payload.params(), |_| String::new(), &raw))?.len();
        let total = raw.byte_lens().try_fold(skeleton, |total, len| {
            base64::encoded_len(len, true)
                .and_then(|encoded| total.checked_add(encoded))
                .ok_or_else(|| ValidationError::Encoding("request size overflow".into()))
        });
        total
    }

    fn decode_response(&self, body: &[u8]) -> Result<GenerationResponse, JobError> {
        serde_json::from_slice(body).map_err(|e| JobError::MalformedResponse(e.to_string()))
    }
}
