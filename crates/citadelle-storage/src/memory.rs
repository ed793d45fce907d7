//! In-memory storage.

use crate::{validate_key, Storage, StorageError, StorageResult};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory storage. Values are kept as serialized JSON so that reads hand
/// back fresh copies, like the file backend does.
#[derive(Default)]
pub struct MemoryStorage {
    data: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw JSON stored under a key, if any.
    pub fn raw(&self, key: &[&str]) -> StorageResult<Option<String>> {
        let data = self
            .data
            .read()
            .map_err(|e| StorageError::LockPoisoned(e.to_string()))?;
        Ok(data.get(&key.join("/")).cloned())
    }

    /// Store raw JSON under a key without validating its shape.
    pub fn insert_raw(&self, key: &[&str], json: impl Into<String>) -> StorageResult<()> {
        validate_key(key)?;
        let mut data = self
            .data
            .write()
            .map_err(|e| StorageError::LockPoisoned(e.to_string()))?;
        data.insert(key.join("/"), json.into());
        Ok(())
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn read<T: DeserializeOwned + Send>(&self, key: &[&str]) -> StorageResult<Option<T>> {
        validate_key(key)?;
        match self.raw(key)? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn write<T: Serialize + Send + Sync>(
        &self,
        key: &[&str],
        value: &T,
    ) -> StorageResult<()> {
        let json = serde_json::to_string(value)?;
        self.insert_raw(key, json)
    }

    async fn remove(&self, key: &[&str]) -> StorageResult<()> {
        validate_key(key)?;
        let mut data = self
            .data
            .write()
            .map_err(|e| StorageError::LockPoisoned(e.to_string()))?;
        data.remove(&key.join("/"));
        Ok(())
    }

    async fn exists(&self, key: &[&str]) -> StorageResult<bool> {
        validate_key(key)?;
        Ok(self.raw(key)?.is_some())
    }
}
