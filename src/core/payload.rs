//! Geometry snapshots captured at enqueue time and the targets that produce them.

use serde::{Deserialize, Serialize};

use crate::core::{JobCategory, TargetId, ValidationError};

/// Default embedding grid dimension requested from the service.
pub const DEFAULT_EMBEDDING_GRID_DIMENSION: u32 = 21;
/// Default SDF approximation dimension requested from the service.
pub const DEFAULT_SDF_APPROX_DIMENSION: u32 = 32;
/// Default cutoff weight requested from the service.
pub const DEFAULT_CUTOFF_WEIGHT: f32 = 0.1;

/// Fixed generation parameters sent with every request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationParams {
    /// Embedding grid dimension.
    pub embedding_grid_dim: u32,
    /// SDF approximation dimension.
    pub sdf_dim: u32,
    /// Cutoff weight.
    pub cutoff_weight: f32,
    /// Whether the service quantizes statically.
    pub static_quantization: bool,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            embedding_grid_dim: DEFAULT_EMBEDDING_GRID_DIMENSION,
            sdf_dim: DEFAULT_SDF_APPROX_DIMENSION,
            cutoff_weight: DEFAULT_CUTOFF_WEIGHT,
            static_quantization: true,
        }
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Aabb {
    /// Box center.
    pub center: [f32; 3],
    /// Box extent along each axis.
    pub size: [f32; 3],
}

/// Vertex and triangle arrays of a single mesh.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MeshGeometry {
    /// Vertex positions.
    pub vertices: Vec<[f32; 3]>,
    /// Triangle list, three vertex indices per triangle.
    pub indices: Vec<u32>,
}

impl MeshGeometry {
    /// Build geometry from positions and a triangle index list.
    #[must_use]
    pub const fn new(vertices: Vec<[f32; 3]>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Number of whole triangles.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Bounding box of the vertices; zero-sized at the origin for an empty mesh.
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        let Some(first) = self.vertices.first() else {
            return Aabb::default();
        };
        let (min, max) = self.vertices.iter().fold((*first, *first), |(mut lo, mut hi), v| {
            for axis in 0..3 {
                lo[axis] = lo[axis].min(v[axis]);
                hi[axis] = hi[axis].max(v[axis]);
            }
            (lo, hi)
        });
        Aabb {
            center: std::array::from_fn(|axis| (min[axis] + max[axis]) * 0.5),
            size: std::array::from_fn(|axis| max[axis] - min[axis]),
        }
    }
}

/// Up to four bone influences on one vertex.
///
/// Unused slots carry index `-1` and weight `0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoneInfluence {
    /// Bone indices into the skeleton's bone list.
    pub indices: [i32; 4],
    /// Matching weights.
    pub weights: [f32; 4],
}

impl BoneInfluence {
    /// Build from raw skin weights.
    ///
    /// Slot 0 always keeps its index; slots 1..3 with zero weight get index `-1`.
    #[must_use]
    pub fn new(indices: [i32; 4], weights: [f32; 4]) -> Self {
        let mut out = indices;
        for slot in 1..4 {
            if weights[slot] == 0.0 {
                out[slot] = -1;
            }
        }
        Self {
            indices: out,
            weights,
        }
    }

    /// Vertex fully bound to a single bone.
    #[must_use]
    pub const fn single(bone: i32) -> Self {
        Self {
            indices: [bone, -1, -1, -1],
            weights: [1.0, 0.0, 0.0, 0.0],
        }
    }
}

/// A skeleton bone that may receive a per-bone representation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoneRef {
    /// Position in the skeleton's bone list.
    pub index: usize,
    /// Bone transform name.
    pub name: String,
}

impl BoneRef {
    /// Create a bone reference.
    pub fn new(index: usize, name: impl Into<String>) -> Self {
        Self {
            index,
            name: name.into(),
        }
    }
}

/// Skinned mesh geometry with per-vertex skinning data and the full bone list.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SkinnedGeometry {
    /// Bind-pose mesh.
    pub mesh: MeshGeometry,
    /// One record per vertex.
    pub influences: Vec<BoneInfluence>,
    /// Skeleton bones, in skin index order.
    pub bones: Vec<BoneRef>,
}

/// Payload of a mesh job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshPayload {
    /// Mesh to approximate.
    pub geometry: MeshGeometry,
    /// Generation parameters.
    pub params: GenerationParams,
}

/// Payload of a skinned job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkinnedPayload {
    /// Skinned mesh to approximate per bone.
    pub geometry: SkinnedGeometry,
    /// Generation parameters.
    pub params: GenerationParams,
}

/// Immutable snapshot of what a job submits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum JobPayload {
    /// Single mesh.
    Mesh(MeshPayload),
    /// Skinned mesh.
    Skinned(SkinnedPayload),
}

impl JobPayload {
    /// Mesh payload with default parameters.
    #[must_use]
    pub fn mesh(geometry: MeshGeometry) -> Self {
        Self::Mesh(MeshPayload {
            geometry,
            params: GenerationParams::default(),
        })
    }

    /// Skinned payload with default parameters.
    #[must_use]
    pub fn skinned(geometry: SkinnedGeometry) -> Self {
        Self::Skinned(SkinnedPayload {
            geometry,
            params: GenerationParams::default(),
        })
    }

    /// Replace the generation parameters.
    #[must_use]
    pub fn with_params(mut self, params: GenerationParams) -> Self {
        match &mut self {
            Self::Mesh(p) => p.params = params,
            Self::Skinned(p) => p.params = params,
        }
        self
    }

    /// Category this payload belongs to.
    #[must_use]
    pub const fn category(&self) -> JobCategory {
        match self {
            Self::Mesh(_) => JobCategory::Mesh,
            Self::Skinned(_) => JobCategory::Skinned,
        }
    }

    /// Geometry submitted to the service.
    #[must_use]
    pub const fn mesh_geometry(&self) -> &MeshGeometry {
        match self {
            Self::Mesh(p) => &p.geometry,
            Self::Skinned(p) => &p.geometry.mesh,
        }
    }

    /// Generation parameters.
    #[must_use]
    pub const fn params(&self) -> &GenerationParams {
        match self {
            Self::Mesh(p) => &p.params,
            Self::Skinned(p) => &p.params,
        }
    }

    /// Triangle count of the submitted geometry.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.mesh_geometry().triangle_count()
    }
}

/// Source of a generation request: the object whose geometry is captured.
pub trait GenerationTarget {
    /// Identity used for deduplication.
    fn target_id(&self) -> TargetId;

    /// Capture the payload to submit.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when the object has nothing that can be submitted.
    fn snapshot(&self) -> Result<JobPayload, ValidationError>;
}

/// Static mesh target holding its geometry directly.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshTarget {
    /// Target identity.
    pub id: TargetId,
    /// Mesh geometry.
    pub geometry: MeshGeometry,
    /// Generation parameters.
    pub params: GenerationParams,
}

impl MeshTarget {
    /// Create a mesh target with default parameters.
    #[must_use]
    pub fn new(id: TargetId, geometry: MeshGeometry) -> Self {
        Self {
            id,
            geometry,
            params: GenerationParams::default(),
        }
    }
}

impl GenerationTarget for MeshTarget {
    fn target_id(&self) -> TargetId {
        self.id
    }

    fn snapshot(&self) -> Result<JobPayload, ValidationError> {
        Ok(JobPayload::Mesh(MeshPayload {
            geometry: self.geometry.clone(),
            params: self.params,
        }))
    }
}

/// Skinned mesh target holding its geometry and skeleton directly.
#[derive(Debug, Clone, PartialEq)]
pub struct SkinnedTarget {
    /// Target identity.
    pub id: TargetId,
    /// Skinned geometry.
    pub geometry: SkinnedGeometry,
    /// Generation parameters.
    pub params: GenerationParams,
}

impl SkinnedTarget {
    /// Create a skinned target with default parameters.
    #[must_use]
    pub fn new(id: TargetId, geometry: SkinnedGeometry) -> Self {
        Self {
            id,
            geometry,
            params: GenerationParams::default(),
        }
    }
}

impl GenerationTarget for SkinnedTarget {
    fn target_id(&self) -> TargetId {
        self.id
    }

    fn snapshot(&self) -> Result<JobPayload, ValidationError> {
        Ok(JobPayload::Skinned(SkinnedPayload {
            geometry: self.geometry.clone(),
            params: self.params,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_weight_slots_drop_their_index() {
        let influence = BoneInfluence::new([3, 4, 5, 6], [0.5, 0.5, 0.0, 0.0]);
        assert_eq!(influence.indices, [3, 4, -1, -1]);
        assert_eq!(influence.weights, [0.5, 0.5, 0.0, 0.0]);
    }

    #[test]
    fn slot_zero_keeps_index_even_without_weight() {
        let influence = BoneInfluence::new([7, 1, 2, 3], [0.0, 0.0, 0.0, 0.0]);
        assert_eq!(influence.indices, [7, -1, -1, -1]);
    }

    #[test]
    fn bounds_cover_all_vertices() {
        let mesh = MeshGeometry::new(
            vec![[-1.0, 0.0, 2.0], [3.0, 4.0, 2.0], [1.0, -2.0, 6.0]],
            vec![0, 1, 2],
        );
        let bounds = mesh.bounds();
        assert_eq!(bounds.center, [1.0, 1.0, 4.0]);
        assert_eq!(bounds.size, [4.0, 6.0, 4.0]);
    }

    #[test]
    fn empty_mesh_has_empty_bounds() {
        assert_eq!(MeshGeometry::default().bounds(), Aabb::default());
    }

    #[test]
    fn partial_triangles_are_not_counted() {
        let mesh = MeshGeometry::new(vec![[0.0; 3]; 3], vec![0, 1, 2, 0, 1]);
        assert_eq!(mesh.triangle_count(), 1);
    }

    #[test]
    fn payload_category_follows_variant() {
        let mesh = JobPayload::mesh(MeshGeometry::default());
        assert_eq!(mesh.category(), JobCategory::Mesh);
        let skinned = JobPayload::skinned(SkinnedGeometry::default());
        assert_eq!(skinned.category(), JobCategory::Skinned);
    }

    #[test]
    fn with_params_replaces_defaults() {
        let params = GenerationParams {
            sdf_dim: 16,
            ..GenerationParams::default()
        };
        let payload = JobPayload::mesh(MeshGeometry::default()).with_params(params);
        assert_eq!(payload.params().sdf_dim, 16);
        assert_eq!(payload.params().embedding_grid_dim, DEFAULT_EMBEDDING_GRID_DIMENSION);
    }
}
