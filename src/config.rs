//! Layered configuration loading using figment.
//!
//! Sources, highest priority first:
//! 1. Environment variables (`LISTING_*` prefix, `__` between section and key)
//! 2. A TOML file, when one is given
//! 3. Built-in defaults
//!
//! `LISTING_FETCH__TIMEOUT_SECS=10` maps to `fetch.timeout_secs`.
//!
//! The loaded values are handed to [`crate::SchemaExtractor`] and
//! [`crate::HttpSource`] when they are constructed; nothing reads
//! configuration from global state.

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const ENV_PREFIX: &str = "LISTING_";

fn default_invisible_tags() -> Vec<String> {
    ["script", "style", "noscript", "template"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_user_agent() -> String {
    format!("listing-extract/{}", env!("CARGO_PKG_VERSION"))
}

const fn default_timeout_secs() -> u64 {
    30
}

/// Settings for the record extractor.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ExtractorConfig {
    /// Elements whose text never counts as visible text
    #[serde(default = "default_invisible_tags")]
    pub invisible_tags: Vec<String>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            invisible_tags: default_invisible_tags(),
        }
    }
}

/// Settings for HTTP document fetching.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FetchConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Whole-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct DisplayConfig {
    /// Fields reported as missing when null or empty. Empty means every
    /// schema field.
    #[serde(default)]
    pub required_fields: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub extract: ExtractorConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

impl AppConfig {
    /// Load defaults, then `path` (if any), then environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config: Self = Self::figment(path).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Build the provider chain without extracting it.
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.fetch.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "fetch.timeout_secs".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.fetch.user_agent.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "fetch.user_agent".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}
