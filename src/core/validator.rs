//! Payload limits checked before a job may consume a network slot.

use serde::{Deserialize, Serialize};

use crate::core::{JobPayload, ValidationError, WireCodec};

/// Default triangle limit per request.
pub const DEFAULT_MAX_TRIANGLES: usize = 100_000;
/// Default request body limit (3 MiB).
pub const DEFAULT_MAX_REQUEST_BYTES: usize = 3 << 20;

/// Limits a payload must satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadLimits {
    /// Maximum triangle count.
    pub max_triangles: usize,
    /// Maximum encoded request size in bytes.
    pub max_request_bytes: usize,
}

impl Default for PayloadLimits {
    fn default() -> Self {
        Self {
            max_triangles: DEFAULT_MAX_TRIANGLES,
            max_request_bytes: DEFAULT_MAX_REQUEST_BYTES,
        }
    }
}

impl PayloadLimits {
    /// Reject meshes above the triangle limit.
    ///
    /// # Errors
    ///
    /// [`ValidationError::TooManyTriangles`].
    pub fn check_triangles(&self, count: usize) -> Result<(), ValidationError> {
        if count > self.max_triangles {
            return Err(ValidationError::TooManyTriangles {
                count,
                limit: self.max_triangles,
            });
        }
        Ok(())
    }

    /// Reject request bodies above the byte limit.
    ///
    /// # Errors
    ///
    /// [`ValidationError::PayloadTooLarge`].
    pub fn check_request_size(&self, size: usize) -> Result<(), ValidationError> {
        if size > self.max_request_bytes {
            return Err(ValidationError::PayloadTooLarge {
                size,
                limit: self.max_request_bytes,
            });
        }
        Ok(())
    }
}

/// Check that a payload is well formed and inside `limits`.
///
/// Structure and triangle count are checked first so oversized meshes are refused
/// without sizing their encoded body.
///
/// # Errors
///
/// The first [`ValidationError`] found.
pub fn validate(
    payload: &JobPayload,
    limits: &PayloadLimits,
    codec: &dyn WireCodec,
) -> Result<(), ValidationError> {
    check_structure(payload)?;
    limits.check_triangles(payload.triangle_count())?;
    limits.check_request_size(codec.encoded_len(payload)?)
}

fn check_structure(payload: &JobPayload) -> Result<(), ValidationError> {
    if payload.triangle_count() == 0 {
        return Err(ValidationError::EmptyGeometry);
    }
    if let JobPayload::Skinned(skinned) = payload {
        let geometry = &skinned.geometry;
        if geometry.bones.is_empty() {
            return Err(ValidationError::NoBones);
        }
        if geometry.influences.len() != geometry.mesh.vertex_count() {
            return Err(ValidationError::InfluenceMismatch {
                vertices: geometry.mesh.vertex_count(),
                influences: geometry.influences.len(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{BoneInfluence, BoneRef, GenerationResponse, JobError, MeshGeometry, SkinnedGeometry};

    /// Codec that reports a fixed body size.
    struct FixedLen(usize);

    impl WireCodec for FixedLen {
        fn encode_request(&self, _payload: &JobPayload) -> Result<Vec<u8>, ValidationError> {
            Ok(vec![0; self.0])
        }

        fn decode_response(&self, _body: &[u8]) -> Result<GenerationResponse, JobError> {
            Ok(GenerationResponse::default())
        }
    }

    fn triangles(count: usize) -> MeshGeometry {
        MeshGeometry::new(vec![[0.0; 3]; 3], vec![0, 1, 2].repeat(count))
    }

    #[test]
    fn accepts_small_mesh() {
        let payload = JobPayload::mesh(triangles(10));
        assert_eq!(validate(&payload, &PayloadLimits::default(), &FixedLen(1024)), Ok(()));
    }

    #[test]
    fn rejects_triangle_overflow() {
        let limits = PayloadLimits {
            max_triangles: 4,
            ..PayloadLimits::default()
        };
        let payload = JobPayload::mesh(triangles(5));
        assert_eq!(
            validate(&payload, &limits, &FixedLen(10)),
            Err(ValidationError::TooManyTriangles { count: 5, limit: 4 })
        );
    }

    #[test]
    fn triangle_limit_is_inclusive() {
        let limits = PayloadLimits {
            max_triangles: 5,
            ..PayloadLimits::default()
        };
        assert!(limits.check_triangles(5).is_ok());
        assert!(limits.check_triangles(6).is_err());
    }

    #[test]
    fn rejects_oversized_body() {
        let payload = JobPayload::mesh(triangles(1));
        let err = validate(&payload, &PayloadLimits::default(), &FixedLen(DEFAULT_MAX_REQUEST_BYTES + 1));
        assert_eq!(
            err,
            Err(ValidationError::PayloadTooLarge {
                size: DEFAULT_MAX_REQUEST_BYTES + 1,
                limit: DEFAULT_MAX_REQUEST_BYTES,
            })
        );
    }

    #[test]
    fn rejects_empty_mesh() {
        let payload = JobPayload::mesh(MeshGeometry::default());
        assert_eq!(
            validate(&payload, &PayloadLimits::default(), &FixedLen(1)),
            Err(ValidationError::EmptyGeometry)
        );
    }

    #[test]
    fn rejects_skinning_mismatch() {
        let payload = JobPayload::skinned(SkinnedGeometry {
            mesh: triangles(1),
            influences: vec![BoneInfluence::single(0)],
            bones: vec![BoneRef::new(0, "root")],
        });
        assert_eq!(
            validate(&payload, &PayloadLimits::default(), &FixedLen(1)),
            Err(ValidationError::InfluenceMismatch {
                vertices: 3,
                influences: 1,
            })
        );
    }

    #[test]
    fn rejects_skeleton_without_bones() {
        let payload = JobPayload::skinned(SkinnedGeometry {
            mesh: triangles(1),
            influences: vec![BoneInfluence::single(0); 3],
            bones: Vec::new(),
        });
        assert_eq!(
            validate(&payload, &PayloadLimits::default(), &FixedLen(1)),
            Err(ValidationError::NoBones)
        );
    }
}
