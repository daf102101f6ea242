//! In-memory storage area with optional sync-storage quotas

use super::{StorageArea, StorageChange, CHANGE_CHANNEL_CAPACITY};
use crate::error::StorageError;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::broadcast;

/// Byte limits applied the way browser sync storage counts them:
/// key length plus the JSON length of the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quota {
    pub bytes_per_item: usize,
    pub total_bytes: usize,
}

impl Default for Quota {
    fn default() -> Self {
        Self {
            bytes_per_item: 8192,
            total_bytes: 102_400,
        }
    }
}

pub struct MemoryStorage {
    data: Mutex<HashMap<String, Value>>,
    quota: Option<Quota>,
    events: broadcast::Sender<StorageChange>,
}

fn item_size(key: &str, value: &Value) -> usize {
    key.len() + value.to_string().len()
}

impl MemoryStorage {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            data: Mutex::new(HashMap::new()),
            quota: None,
            events,
        }
    }

    pub fn with_quota(quota: Quota) -> Self {
        Self {
            quota: Some(quota),
            ..Self::new()
        }
    }

    fn check_quota(&self, data: &HashMap<String, Value>, key: &str, value: &Value) -> Result<(), StorageError> {
        let Some(quota) = self.quota else {
            return Ok(());
        };

        let bytes = item_size(key, value);
        if bytes > quota.bytes_per_item {
            return Err(StorageError::QuotaExceeded {
                key: key.to_string(),
                bytes,
                limit: quota.bytes_per_item,
            });
        }

        let others: usize = data
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| item_size(k, v))
            .sum();
        if others + bytes > quota.total_bytes {
            return Err(StorageError::QuotaExceeded {
                key: key.to_string(),
                bytes: others + bytes,
                limit: quota.total_bytes,
            });
        }

        Ok(())
    }

    fn notify(&self, change: StorageChange) {
        // No receivers is fine
        let _ = self.events.send(change);
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageArea for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let data = self.data.lock().map_err(|e| StorageError::Host(e.to_string()))?;
        Ok(data.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        let old_value = {
            let mut data = self.data.lock().map_err(|e| StorageError::Host(e.to_string()))?;
            self.check_quota(&data, key, &value)?;
            data.insert(key.to_string(), value.clone())
        };

        self.notify(StorageChange {
            key: key.to_string(),
            old_value,
            new_value: Some(value),
        });
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let old_value = {
            let mut data = self.data.lock().map_err(|e| StorageError::Host(e.to_string()))?;
            data.remove(key)
        };

        if old_value.is_some() {
            self.notify(StorageChange {
                key: key.to_string(),
                old_value,
                new_value: None,
            });
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_set_emits_change() {
        let storage = MemoryStorage::new();
        let mut changes = storage.subscribe();

        storage.set("settings", json!({"theme": "dark"})).await.unwrap();
        storage.set("settings", json!({"theme": "light"})).await.unwrap();

        let first = changes.recv().await.unwrap();
        assert_eq!(first.key, "settings");
        assert_eq!(first.old_value, None);

        let second = changes.recv().await.unwrap();
        assert_eq!(second.old_value, Some(json!({"theme": "dark"})));
        assert_eq!(second.new_value, Some(json!({"theme": "light"})));
    }

    #[tokio::test]
    async fn test_per_item_quota() {
        let storage = MemoryStorage::with_quota(Quota {
            bytes_per_item: 16,
            total_bytes: 1024,
        });

        storage.set("k", json!("short")).await.unwrap();
        let err = storage.set("k", json!("far too long for the quota")).await.unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { limit: 16, .. }));
        assert_eq!(storage.get("k").await.unwrap(), Some(json!("short")));
    }

    #[tokio::test]
    async fn test_total_quota_counts_other_keys() {
        let storage = MemoryStorage::with_quota(Quota {
            bytes_per_item: 100,
            total_bytes: 20,
        });

        storage.set("a", json!("0123456789")).await.unwrap();
        assert!(storage.set("b", json!("0123456789")).await.is_err());
        // Overwriting the same key only counts the new value
        storage.set("a", json!("9876543210")).await.unwrap();
    }

    #[tokio::test]
    async fn test_remove() {
        let storage = MemoryStorage::new();
        storage.set("k", json!(1)).await.unwrap();
        storage.remove("k").await.unwrap();
        assert_eq!(storage.get("k").await.unwrap(), None);
    }
}
