//! Queue limits, generation parameters and scheduling policy.

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::{
    ConfigError, GenerationParams, PayloadLimits, RequestPolicy, DEFAULT_MAX_REQUEST_BYTES,
    DEFAULT_MAX_TRIANGLES,
};

/// Default interval between driver ticks.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 50;

/// Queue configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Maximum triangles per request.
    pub max_triangles: usize,
    /// Maximum request body size in bytes.
    pub max_request_bytes: usize,
    /// Parameters forced onto every payload.
    pub generation: GenerationParams,
    /// Scheduler timeout for an outstanding request; `None` waits indefinitely.
    pub request_timeout_ms: Option<u64>,
    /// Resubmissions allowed after a transport failure.
    pub max_retries: u32,
    /// Interval between driver ticks while the queue is active.
    pub tick_interval_ms: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_triangles: DEFAULT_MAX_TRIANGLES,
            max_request_bytes: DEFAULT_MAX_REQUEST_BYTES,
            generation: GenerationParams::default(),
            request_timeout_ms: None,
            max_retries: 0,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
        }
    }
}

impl QueueConfig {
    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] naming the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_triangles == 0 {
            return Err(ConfigError::Invalid("max_triangles must be greater than 0".into()));
        }
        if self.max_request_bytes == 0 {
            return Err(ConfigError::Invalid("max_request_bytes must be greater than 0".into()));
        }
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid("tick_interval_ms must be greater than 0".into()));
        }
        if self.request_timeout_ms == Some(0) {
            return Err(ConfigError::Invalid("request_timeout_ms must be greater than 0".into()));
        }
        let params = &self.generation;
        if params.embedding_grid_dim == 0 || params.sdf_dim == 0 {
            return Err(ConfigError::Invalid("generation dimensions must be greater than 0".into()));
        }
        if !(params.cutoff_weight.is_finite() && params.cutoff_weight >= 0.0) {
            return Err(ConfigError::Invalid("cutoff_weight must be a non-negative number".into()));
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] on parse or validation failure.
    pub fn from_json_str(input: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(input)
            .map_err(|e| ConfigError::Invalid(format!("parse error: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load from `SDF_QUEUE_*` environment variables after reading `.env`, if present.
    ///
    /// # Errors
    ///
    /// [`ConfigError`] when a variable does not parse or the result is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup; unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// [`ConfigError`] when a variable does not parse or the result is invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut cfg = Self::default();
        if let Some(v) = parse_var(&lookup, "SDF_QUEUE_MAX_TRIANGLES")? {
            cfg.max_triangles = v;
        }
        if let Some(v) = parse_var(&lookup, "SDF_QUEUE_MAX_REQUEST_BYTES")? {
            cfg.max_request_bytes = v;
        }
        if let Some(v) = parse_var(&lookup, "SDF_QUEUE_REQUEST_TIMEOUT_MS")? {
            cfg.request_timeout_ms = Some(v);
        }
        if let Some(v) = parse_var(&lookup, "SDF_QUEUE_MAX_RETRIES")? {
            cfg.max_retries = v;
        }
        if let Some(v) = parse_var(&lookup, "SDF_QUEUE_TICK_INTERVAL_MS")? {
            cfg.tick_interval_ms = v;
        }
        if let Some(v) = parse_var(&lookup, "SDF_QUEUE_VOX_DIM")? {
            cfg.generation.embedding_grid_dim = v;
        }
        if let Some(v) = parse_var(&lookup, "SDF_QUEUE_SDF_DIM")? {
            cfg.generation.sdf_dim = v;
        }
        if let Some(v) = parse_var(&lookup, "SDF_QUEUE_CUTOFF_WEIGHT")? {
            cfg.generation.cutoff_weight = v;
        }
        if let Some(v) = parse_var(&lookup, "SDF_QUEUE_STATIC_QUANTIZATION")? {
            cfg.generation.static_quantization = v;
        }
        cfg.validate()?;
        Ok(cfg)
    }

    /// Payload limits derived from this configuration.
    #[must_use]
    pub const fn limits(&self) -> PayloadLimits {
        PayloadLimits {
            max_triangles: self.max_triangles,
            max_request_bytes: self.max_request_bytes,
        }
    }

    /// Timeout and retry policy derived from this configuration.
    #[must_use]
    pub fn policy(&self) -> RequestPolicy {
        RequestPolicy {
            request_timeout: self.request_timeout_ms.map(Duration::from_millis),
            max_retries: self.max_retries,
        }
    }

    /// Driver tick interval.
    #[must_use]
    pub const fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    raw.trim()
        .parse()
        .map(Some)
        .map_err(|e: T::Err| ConfigError::Env {
            key: key.to_owned(),
            message: e.to_string(),
        })
}
