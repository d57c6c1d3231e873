//! License gate built from endpoint configuration.

use crate::config::EndpointConfig;
use crate::core::LicenseGate;

const MISSING_KEY: &str = "generation requires a valid API key";

/// Gate that is open whenever an API key is configured.
///
/// The generation URL carries the hardware id and API key as query parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticLicenseGate {
    endpoint: EndpointConfig,
}

impl StaticLicenseGate {
    /// Gate for the given endpoint.
    #[must_use]
    pub const fn new(endpoint: EndpointConfig) -> Self {
        Self { endpoint }
    }

    /// Open gate for `url` with a placeholder key, for tests and local services.
    #[must_use]
    pub fn available(url: impl Into<String>) -> Self {
        Self::new(EndpointConfig {
            url: url.into(),
            api_key: Some("local".into()),
            hardware_id: String::new(),
        })
    }

    /// Closed gate.
    #[must_use]
    pub fn unavailable() -> Self {
        Self::new(EndpointConfig::default())
    }

    /// Endpoint configuration backing the gate.
    #[must_use]
    pub const fn endpoint(&self) -> &EndpointConfig {
        &self.endpoint
    }

    fn api_key(&self) -> Option<&str> {
        self.endpoint
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
    }
}

impl LicenseGate for StaticLicenseGate {
    fn is_generation_available(&self) -> bool {
        self.api_key().is_some() && !self.endpoint.url.is_empty()
    }

    fn error_message(&self) -> String {
        if self.endpoint.url.is_empty() {
            return "generation endpoint is not configured".to_owned();
        }
        MISSING_KEY.to_owned()
    }

    fn generation_url(&self) -> Option<String> {
        if !self.is_generation_available() {
            return None;
        }
        let key = self.api_key()?;
        let separator = if self.endpoint.url.contains('?') { '&' } else { '?' };
        Some(format!(
            "{}{separator}hardware_id={}&api_key={key}",
            self.endpoint.url, self.endpoint.hardware_id
        ))
    }
}
