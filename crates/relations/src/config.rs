//! Relation layer configuration
//!
//! Defaults can be overridden through environment variables:
//!
//! | Variable | Field |
//! |---|---|
//! | `ELIF_DB_CONNECTION` | `default_connection` |
//! | `ELIF_PRELOAD_MAX_DEPTH` | `preload.max_depth` |
//! | `ELIF_PRELOAD_CONCURRENT` | `preload.concurrent_siblings` |

use std::env;

use serde::Deserialize;

use crate::error::{ModelError, ModelResult};

/// Configuration for preload execution
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PreloadConfig {
    /// Maximum number of relations in a single dotted path
    pub max_depth: usize,
    /// Issue the queries of one depth concurrently
    pub concurrent_siblings: bool,
}

impl Default for PreloadConfig {
    fn default() -> Self {
        Self {
            max_depth: 10,
            concurrent_siblings: false,
        }
    }
}

/// Top-level configuration for the relation layer
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RelationsConfig {
    /// Connection used when a query does not name one
    pub default_connection: String,
    pub preload: PreloadConfig,
}

impl Default for RelationsConfig {
    fn default() -> Self {
        Self {
            default_connection: "primary".to_string(),
            preload: PreloadConfig::default(),
        }
    }
}

impl RelationsConfig {
    /// Load configuration from environment variables on top of the defaults
    pub fn from_env() -> ModelResult<Self> {
        let mut config = Self::default();

        if let Ok(connection) = env::var("ELIF_DB_CONNECTION") {
            config.default_connection = connection;
        }

        if let Ok(depth_str) = env::var("ELIF_PRELOAD_MAX_DEPTH") {
            config.preload.max_depth = depth_str.parse().map_err(|_| {
                ModelError::Configuration(format!(
                    "ELIF_PRELOAD_MAX_DEPTH must be a positive integer, got '{}'",
                    depth_str
                ))
            })?;
        }

        if let Ok(concurrent_str) = env::var("ELIF_PRELOAD_CONCURRENT") {
            config.preload.concurrent_siblings = parse_bool(&concurrent_str).ok_or_else(|| {
                ModelError::Configuration(format!(
                    "ELIF_PRELOAD_CONCURRENT must be true or false, got '{}'",
                    concurrent_str
                ))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> ModelResult<()> {
        if self.default_connection.trim().is_empty() {
            return Err(ModelError::Configuration(
                "default_connection cannot be empty".to_string(),
            ));
        }

        if self.preload.max_depth == 0 {
            return Err(ModelError::Configuration(
                "preload.max_depth must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
