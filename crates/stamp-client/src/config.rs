//! Gateway configuration
//!
//! Loaded from an optional TOML file, then overridden from the environment:
//!
//! ```toml
//! base_url = "http://localhost:8000"
//! timeout_secs = 30
//! stamp_path = "/pdf/stamp"
//! multi_stamp_path = "/pdf/stamp-multi"
//! health_path = "/"
//! ```

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const URL_ENV: &str = "STAMP_GATEWAY_URL";
pub const TIMEOUT_ENV: &str = "STAMP_GATEWAY_TIMEOUT_SECS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Root of the stamping service, without a trailing slash
    pub base_url: String,
    /// Whole-request timeout
    pub timeout_secs: u64,
    pub health_path: String,
    pub stamp_path: String,
    pub multi_stamp_path: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 30,
            health_path: "/".to_string(),
            stamp_path: "/pdf/stamp".to_string(),
            multi_stamp_path: "/pdf/stamp-multi".to_string(),
        }
    }
}

impl GatewayConfig {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the TOML is malformed,
    /// or the resulting values fail validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// Parse configuration from a TOML string; missing keys use defaults
    pub fn parse(s: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(s).context("Failed to parse TOML configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `STAMP_GATEWAY_URL` / `STAMP_GATEWAY_TIMEOUT_SECS`
    pub fn with_env_overrides(self) -> anyhow::Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        if let Some(url) = lookup(URL_ENV) {
            self.base_url = url;
        }
        if let Some(timeout) = lookup(TIMEOUT_ENV) {
            self.timeout_secs = timeout
                .trim()
                .parse()
                .with_context(|| format!("{} must be a whole number of seconds", TIMEOUT_ENV))?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            bail!("base_url must be an http(s) URL, got '{}'", self.base_url);
        }
        if self.timeout_secs == 0 {
            bail!("timeout_secs must be greater than zero");
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Join the base URL with one of the configured paths
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}
