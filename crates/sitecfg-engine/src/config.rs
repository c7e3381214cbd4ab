//! Engine configuration.
//!
//! Provides [`EngineConfig`] for configuring the website reconciliation
//! engine. Values are loaded from environment variables, falling back to
//! defaults.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use sitecfg_core::{AwsRegion, CoreResult};
use tracing::warn;
use typed_builder::TypedBuilder;

/// Default deadline for a single remote call, in milliseconds.
const DEFAULT_OPERATION_TIMEOUT_MS: u64 = 30_000;

/// Reconciliation engine configuration.
///
/// # Examples
///
/// ```
/// use sitecfg_engine::config::EngineConfig;
///
/// let config = EngineConfig::default();
/// assert_eq!(config.default_region, "us-east-1");
/// assert_eq!(config.operation_timeout_ms, 30_000);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// Region the managed buckets live in; decides the website endpoint.
    #[builder(default = String::from(AwsRegion::DEFAULT))]
    pub default_region: String,

    /// Log level filter string (e.g. `"info"`, `"debug"`).
    #[builder(default = String::from("info"))]
    pub log_level: String,

    /// Deadline applied to every remote call. An elapsed deadline is reported
    /// as a transient failure.
    #[builder(default = DEFAULT_OPERATION_TIMEOUT_MS)]
    pub operation_timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_region: String::from(AwsRegion::DEFAULT),
            log_level: String::from("info"),
            operation_timeout_ms: DEFAULT_OPERATION_TIMEOUT_MS,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `DEFAULT_REGION` (or `AWS_REGION`) | `us-east-1` |
    /// | `LOG_LEVEL` | `info` |
    /// | `SITECFG_OPERATION_TIMEOUT_MS` | `30000` |
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("DEFAULT_REGION").or_else(|_| std::env::var("AWS_REGION")) {
            match AwsRegion::parse(&v) {
                Ok(region) => config.default_region = region.as_str().to_owned(),
                Err(e) => warn!(error = %e, "ignoring region from environment"),
            }
        }
        if let Ok(v) = std::env::var("LOG_LEVEL") {
            config.log_level = v;
        }
        if let Ok(v) = std::env::var("SITECFG_OPERATION_TIMEOUT_MS") {
            if let Ok(n) = v.parse::<u64>() {
                config.operation_timeout_ms = n;
            }
        }

        config
    }

    /// The configured region.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidRegion` when `default_region` is empty or
    /// contains whitespace.
    pub fn region(&self) -> CoreResult<AwsRegion> {
        AwsRegion::parse(&self.default_region)
    }

    /// The per-call remote deadline.
    #[must_use]
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }
}
