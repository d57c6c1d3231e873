//! Configuration models for the queue and the generation endpoint.

pub mod endpoint;
pub mod queue;

pub use endpoint::EndpointConfig;
pub use queue::{QueueConfig, DEFAULT_TICK_INTERVAL_MS};
