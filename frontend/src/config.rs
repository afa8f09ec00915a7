//! # Client Configuration
//!
//! Connection and interaction settings for the form core, with defaults that
//! match a locally running API and optional overrides from the environment.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const API_URL_VAR: &str = "CLINICAL_API_URL";
pub const API_TIMEOUT_VAR: &str = "CLINICAL_API_TIMEOUT_SECS";
pub const BLUR_GRACE_VAR: &str = "CLINICAL_BLUR_GRACE_MS";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the REST API, without a trailing slash
    pub base_url: String,
    pub request_timeout_secs: u64,
    /// Delay between a search field losing focus and its panel closing
    pub blur_grace_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            request_timeout_secs: 10,
            blur_grace_ms: 150,
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by any of the `CLINICAL_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup, used by `from_env` and tests
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(API_URL_VAR) {
            let url = url.trim().trim_end_matches('/').to_string();
            if !url.is_empty() {
                config.base_url = url;
            }
        }

        if let Some(raw) = lookup(API_TIMEOUT_VAR) {
            config.request_timeout_secs = raw
                .trim()
                .parse()
                .with_context(|| format!("{} must be a whole number of seconds, got '{}'", API_TIMEOUT_VAR, raw))?;
        }

        if let Some(raw) = lookup(BLUR_GRACE_VAR) {
            config.blur_grace_ms = raw
                .trim()
                .parse()
                .with_context(|| format!("{} must be a whole number of milliseconds, got '{}'", BLUR_GRACE_VAR, raw))?;
        }

        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn blur_grace(&self) -> Duration {
        Duration::from_millis(self.blur_grace_ms)
    }
}
