//! Gateway configuration, loaded from TOML.
//!
//! ```toml
//! failure_policy = "SKIP_AS_EMPTY"
//! parallel = true
//!
//! [paging]
//! default_size = 50
//! max_size = 1000
//!
//! [sources]
//! enabled = ["ETHEREUM", "FLOW"]
//! ```
//!
//! Every field has a default, so an empty file is a valid config.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use thiserror::Error;

use nftunion_core::is_wire_safe_source_id;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file: {0}")]
    Read(#[from] std::io::Error),
    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("serialize config TOML: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// What to do when one source fails during fan-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailurePolicy {
    /// Fail the whole request.
    #[default]
    Abort,
    /// Treat the source as having nothing this round; its cursor is kept.
    SkipAsEmpty,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PagingConfig {
    /// Page size when the request names none.
    pub default_size: usize,
    /// Largest page size a client may request.
    pub max_size: usize,
    /// Upper bound on pages fetched by `drain`.
    pub max_drain_pages: usize,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            default_size: 50,
            max_size: 1000,
            max_drain_pages: 10_000,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// Source ids allowed to participate. Empty means every registered source.
    pub enabled: Vec<String>,
}

impl SourcesConfig {
    pub fn is_enabled(&self, source_id: &str) -> bool {
        self.enabled.is_empty() || self.enabled.iter().any(|id| id == source_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub failure_policy: FailurePolicy,
    /// Fan out source fetches on the rayon pool.
    pub parallel: bool,
    pub paging: PagingConfig,
    pub sources: SourcesConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            failure_policy: FailurePolicy::default(),
            parallel: true,
            paging: PagingConfig::default(),
            sources: SourcesConfig::default(),
        }
    }
}

impl GatewayConfig {
    /// Load and validate a config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let paging = &self.paging;
        if paging.default_size == 0 {
            return Err(ConfigError::Invalid("paging.default_size must be > 0".into()));
        }
        if paging.default_size > paging.max_size {
            return Err(ConfigError::Invalid(format!(
                "paging.default_size ({}) exceeds paging.max_size ({})",
                paging.default_size, paging.max_size
            )));
        }
        if paging.max_drain_pages == 0 {
            return Err(ConfigError::Invalid("paging.max_drain_pages must be > 0".into()));
        }

        let mut seen = BTreeSet::new();
        for id in &self.sources.enabled {
            if !is_wire_safe_source_id(id) {
                return Err(ConfigError::Invalid(format!(
                    "source id '{id}' is empty or contains ':' or ';'"
                )));
            }
            if !seen.insert(id.as_str()) {
                return Err(ConfigError::Invalid(format!("source id '{id}' listed twice")));
            }
        }
        Ok(())
    }
}
