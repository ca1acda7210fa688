//! Durable key-value storage.
//!
//! The history log lives under a single key as one serialized value.
//! Backends:
//! - file: one json file per key in the data directory
//! - sqlite: a `kv` table in `scanlog.db`
//! - memory: process-local map with failure injection, only built for
//!   tests and the `test-util` feature
//!
//! No transactional guarantee beyond a single writer.

pub mod file;
#[cfg(any(test, feature = "test-util"))]
pub mod memory;
pub mod sqlite;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::Backend;
use crate::error::StoreError;

pub use file::FileStore;
#[cfg(any(test, feature = "test-util"))]
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns the stored value, or `None` when the key was never set.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Replaces the value under `key`.
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

#[async_trait]
impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value).await
    }
}

/// Get the data directory (~/.local/share/scanlog or platform equivalent)
pub fn default_data_dir() -> Result<PathBuf, StoreError> {
    directories::ProjectDirs::from("", "", "scanlog")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or(StoreError::NoDataDir)
}

/// Open the configured backend rooted at `data_dir` (or the platform default).
pub fn open(backend: Backend, data_dir: Option<&Path>) -> Result<Box<dyn KeyValueStore>, StoreError> {
    let dir = match data_dir {
        Some(dir) => dir.to_path_buf(),
        None => default_data_dir()?,
    };

    std::fs::create_dir_all(&dir)?;

    let store: Box<dyn KeyValueStore> = match backend {
        Backend::File => Box::new(FileStore::new(dir)),
        Backend::Sqlite => Box::new(SqliteStore::open(&dir.join("scanlog.db"))?),
    };

    Ok(store)
}
