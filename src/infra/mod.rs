//! Bundled collaborator implementations: codec, network clients, license gate and sinks.

pub mod codec;
pub mod license;
pub mod network;
pub mod sink;

pub use codec::JsonCodec;
pub use license::StaticLicenseGate;
pub use network::{MockNetworkClient, MockRequestHandle, Submission};
#[cfg(feature = "http-client")]
pub use network::{HttpNetworkClient, HttpRequestHandle};
pub use sink::RecordingSink;
