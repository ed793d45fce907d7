//! Local durable storage for citadelle.
//!
//! Values are addressed by keys made of path segments, e.g.
//! `["citadelle-versions"]`, and serialized as JSON. Two backends:
//! - JSON files on disk (default)
//! - In-memory (for tests and ephemeral sessions)

pub mod error;
pub mod json;
pub mod memory;

pub use error::{StorageError, StorageResult};
pub use json::JsonStorage;
pub use memory::MemoryStorage;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

/// A key-value storage backend.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Read a value. Returns `None` if the key doesn't exist.
    async fn read<T: DeserializeOwned + Send>(&self, key: &[&str]) -> StorageResult<Option<T>>;

    /// Write a value, replacing any previous one.
    ///
    /// Writes to the same backend complete in the order they were issued.
    async fn write<T: Serialize + Send + Sync>(&self, key: &[&str], value: &T)
        -> StorageResult<()>;

    /// Remove a value. Removing a missing key is not an error.
    async fn remove(&self, key: &[&str]) -> StorageResult<()>;

    /// Check if a key exists.
    async fn exists(&self, key: &[&str]) -> StorageResult<bool>;
}

/// Reject empty keys and path-like components.
pub(crate) fn validate_key(key: &[&str]) -> StorageResult<()> {
    if key.is_empty() {
        return Err(StorageError::invalid_key("Key cannot be empty"));
    }
    for component in key {
        if component.is_empty()
            || component.contains('/')
            || component.contains('\\')
            || *component == "."
            || *component == ".."
        {
            return Err(StorageError::invalid_key(format!(
                "Invalid key component: {component}"
            )));
        }
    }
    Ok(())
}
