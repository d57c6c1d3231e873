//! Logging setup.

use tracing_subscriber::EnvFilter;

/// Install a `RUST_LOG`-driven fmt subscriber unless one is already set.
///
/// Falls back to `info` for this crate when `RUST_LOG` is unset or invalid.
pub fn init_tracing() {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("sdf_generation_queue=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
