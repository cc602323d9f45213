use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures while loading or writing a [`CacheConfig`](crate::CacheConfig).
///
/// The cache itself has no failure path; only configuration I/O can fail.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid cache config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize cache config: {0}")]
    Serialize(#[from] toml::ser::Error),
}
