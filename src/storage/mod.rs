//! Key/value persistence against a synchronized storage area
//!
//! [`StorageArea`] is the host-provided store (browser sync storage, a file,
//! memory). [`Store`] is the adapter the models use: `try_*` methods report
//! failures, while `get_item`/`set_item` fall back to the caller's default or
//! a no-op so the extension keeps working when storage is broken.

pub mod memory;
pub mod file;

pub use file::JsonFileStorage;
pub use memory::{MemoryStorage, Quota};

use crate::error::StorageError;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Capacity of the change-event channel each storage area keeps
pub const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// A key written by any context sharing the storage area
#[derive(Debug, Clone, PartialEq)]
pub struct StorageChange {
    pub key: String,
    pub old_value: Option<Value>,
    pub new_value: Option<Value>,
}

#[async_trait]
pub trait StorageArea: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError>;

    async fn set(&self, key: &str, value: Value) -> Result<(), StorageError>;

    async fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Change notifications. Areas that cannot observe changes return a
    /// receiver that is already closed.
    fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        broadcast::channel(1).1
    }
}

/// Stand-in for contexts that run outside the extension host
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableStorage;

#[async_trait]
impl StorageArea for UnavailableStorage {
    async fn get(&self, _key: &str) -> Result<Option<Value>, StorageError> {
        Err(StorageError::Unavailable)
    }

    async fn set(&self, _key: &str, _value: Value) -> Result<(), StorageError> {
        Err(StorageError::Unavailable)
    }

    async fn remove(&self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable)
    }
}

/// Stateless adapter over a shared storage area
#[derive(Clone)]
pub struct Store {
    area: Arc<dyn StorageArea>,
}

impl Store {
    pub fn new(area: Arc<dyn StorageArea>) -> Self {
        Self { area }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    pub fn unavailable() -> Self {
        Self::new(Arc::new(UnavailableStorage))
    }

    pub async fn try_get_item<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match self.area.get(key).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    pub async fn try_set_item<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let value = serde_json::to_value(value)?;
        self.area.set(key, value).await
    }

    /// Stored value for `key`, or `default` when unset, unreadable or the
    /// store is unavailable
    pub async fn get_item<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        match self.try_get_item(key).await {
            Ok(Some(value)) => value,
            Ok(None) => {
                debug!(key, "storage key unset, using default");
                default
            }
            Err(err) => {
                warn!(key, error = %err, "storage read failed, using default");
                default
            }
        }
    }

    /// Write `value`; failures are logged and otherwise ignored
    pub async fn set_item<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        if let Err(err) = self.try_set_item(key, value).await {
            warn!(key, error = %err, "storage write failed, change not persisted");
        }
    }

    pub async fn remove_item(&self, key: &str) {
        if let Err(err) = self.area.remove(key).await {
            warn!(key, error = %err, "storage remove failed");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.area.subscribe()
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").finish_non_exhaustive()
    }
}
