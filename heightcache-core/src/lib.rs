pub mod index_path;
pub mod cache;
pub mod config;
pub mod error;

pub use index_path::IndexPath;
pub use cache::{Height, IndexPathHeightCache, INVALIDATED_HEIGHT, PRESENCE_THRESHOLD};
pub use config::{CacheConfig, MoveStrategy};
pub use error::ConfigError;
