//! Service configuration
//!
//! Every field has a default, so an empty JSON object is a valid config.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::delta::UpdaterConfig;
use crate::publisher::PublisherConfig;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MarketDataConfig {
    pub updater: UpdaterConfig,
    pub publisher: PublisherConfig,
    /// Levels per side shown in book summaries.
    pub depth: usize,
}

impl Default for MarketDataConfig {
    fn default() -> Self {
        Self {
            updater: UpdaterConfig::default(),
            publisher: PublisherConfig::default(),
            depth: 10,
        }
    }
}

impl MarketDataConfig {
    /// Load and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        config.validate()?;

        info!(
            path = %path.display(),
            version_policy = ?config.updater.version_policy,
            max_batch_size = config.publisher.max_batch_size,
            depth = config.depth,
            "Loaded market data config"
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.publisher.max_batch_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "publisher.maxBatchSize",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
