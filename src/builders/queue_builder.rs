//! Build a generation queue from configuration.

use crate::config::QueueConfig;
use crate::core::{
    ConfigError, GenerationQueue, LicenseGate, MeshResult, NetworkClient, ResultSink,
    SkinnedResult,
};

/// Validate `cfg` and assemble a queue with its limits, policy and generation parameters.
///
/// # Errors
///
/// [`ConfigError::Invalid`] when the configuration does not validate.
pub fn build_queue<C, G>(
    cfg: &QueueConfig,
    client: C,
    gate: G,
    mesh_sink: impl ResultSink<MeshResult> + 'static,
    skinned_sink: impl ResultSink<SkinnedResult> + 'static,
) -> Result<GenerationQueue<C, G>, ConfigError>
where
    C: NetworkClient,
    G: LicenseGate,
{
    cfg.validate()?;

    Ok(GenerationQueue::new(client, gate, mesh_sink, skinned_sink)
        .with_limits(cfg.limits())
        .with_policy(cfg.policy())
        .with_generation_params(cfg.generation))
}
