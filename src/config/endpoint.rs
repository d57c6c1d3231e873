//! Generation service endpoint and credentials.

use serde::{Deserialize, Serialize};

use crate::core::{AppResult, ConfigError};

/// Where and as whom generation requests are sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// Service URL without query parameters.
    pub url: String,
    /// API key; generation is unavailable without one.
    pub api_key: Option<String>,
    /// Machine identifier sent with each request.
    pub hardware_id: String,
}

impl EndpointConfig {
    /// Read `SDF_GENERATION_URL`, `SDF_GENERATION_API_KEY` and `SDF_HARDWARE_ID`,
    /// loading `.env` first if present.
    ///
    /// # Errors
    ///
    /// Fails when `SDF_GENERATION_URL` is unset or empty.
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();
        let url = std::env::var("SDF_GENERATION_URL").unwrap_or_default();
        if url.trim().is_empty() {
            return Err(ConfigError::Env {
                key: "SDF_GENERATION_URL".into(),
                message: "must be set".into(),
            }
            .into());
        }
        Ok(Self {
            url,
            api_key: std::env::var("SDF_GENERATION_API_KEY").ok(),
            hardware_id: std::env::var("SDF_HARDWARE_ID").unwrap_or_default(),
        })
    }
}
