use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// How `move_section` / `move_row` relocate cached content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveStrategy {
    /// Exchange the contents of the source and destination slots.
    #[default]
    Exchange,
    /// Remove the source slot and reinsert it at the destination,
    /// sliding everything in between.
    Shift,
}

/// Cache behaviour knobs, loadable from TOML.
///
/// ```toml
/// automatically_invalidate = true
/// move_strategy = "exchange"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Drop every cached height when the host posts a reconfiguration
    /// notification (orientation change, viewport resize, ...).
    pub automatically_invalidate: bool,
    pub move_strategy: MoveStrategy,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            automatically_invalidate: true,
            move_strategy: MoveStrategy::Exchange,
        }
    }
}

impl CacheConfig {
    /// Parse a config from TOML text. Missing keys keep their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string(self)?)
    }
}
