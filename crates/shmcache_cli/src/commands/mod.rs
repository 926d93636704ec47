//! CLI command implementations.

pub mod delete;
pub mod destroy;
pub mod inspect;
pub mod read;
pub mod save;
pub mod verify;

use shmcache_core::{CacheError, Config, HashAlgorithm, SharedCache};
use shmcache_storage::FileSegmentStore;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors reported by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// Cache operation failed.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// A value argument was not valid JSON.
    #[error("value is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// A mode argument was not an octal permission mask.
    #[error("invalid mode {0:?}: expected octal bits such as 600 or 0o644")]
    InvalidMode(String),

    /// The requested name does not exist.
    #[error("{name:?} not found")]
    NotFound {
        /// Name that was looked up.
        name: String,
    },

    /// Verification found problems.
    #[error("verification failed with {0} problem(s)")]
    VerifyFailed(usize),
}

/// Result type for CLI commands.
pub type CliResult<T> = Result<T, CliError>;

/// Where and how commands open the cache.
pub struct Target {
    path: PathBuf,
    hash: HashAlgorithm,
}

impl Target {
    /// Resolves the segment directory, falling back to the platform default.
    pub fn new(path: Option<PathBuf>, hash: HashAlgorithm) -> Self {
        Self {
            path: path.unwrap_or_else(FileSegmentStore::default_dir),
            hash,
        }
    }

    /// Returns the segment directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Opens the cache with default settings.
    pub fn open(&self) -> CliResult<SharedCache> {
        self.open_with(Config::new())
    }

    /// Opens the cache, applying the selected hash function to `config`.
    pub fn open_with(&self, config: Config) -> CliResult<SharedCache> {
        Ok(SharedCache::open_with_config(&self.path, config.hash(self.hash))?)
    }
}
