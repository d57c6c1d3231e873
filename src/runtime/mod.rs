//! Host integration: status snapshots, a thread-safe queue handle and tick drivers.

pub mod api;
pub mod shared;
pub mod thread_driver;
#[cfg(feature = "tokio-runtime")]
pub mod tokio_driver;

pub use api::{status, QueueStatus, RunningJob};
pub use shared::SharedGenerationQueue;
pub use thread_driver::ThreadTickDriver;
#[cfg(feature = "tokio-runtime")]
pub use tokio_driver::TokioTickDriver;
