//! Network client implementations.

#[cfg(feature = "http-client")]
pub mod http;
pub mod memory;

#[cfg(feature = "http-client")]
pub use http::{HttpNetworkClient, HttpRequestHandle};
pub use memory::{MockNetworkClient, MockRequestHandle, Submission};
