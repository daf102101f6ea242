//! JSON file storage area used by the command-line front end

use super::{StorageArea, StorageChange, CHANGE_CHANNEL_CAPACITY};
use crate::error::StorageError;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::{broadcast, Mutex};

/// All keys live in one pretty-printed JSON object on disk
pub struct JsonFileStorage {
    path: PathBuf,
    write_lock: Mutex<()>,
    events: broadcast::Sender<StorageChange>,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let (events, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
            events,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<Map<String, Value>, StorageError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(err) => return Err(err.into()),
        };

        if content.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str(&content)? {
            Value::Object(map) => Ok(map),
            _ => Err(StorageError::Host(format!(
                "{} does not contain a JSON object",
                self.path.display()
            ))),
        }
    }

    async fn write_all(&self, map: &Map<String, Value>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        // Readers see either the old file or the new one, never a partial write
        let content = serde_json::to_string_pretty(map)?;
        let staging = self.staging_path();
        tokio::fs::write(&staging, content).await?;
        tokio::fs::rename(&staging, &self.path).await?;
        Ok(())
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl StorageArea for JsonFileStorage {
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        Ok(self.read_all().await?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut map = self.read_all().await?;
        let old_value = map.insert(key.to_string(), value.clone());
        self.write_all(&map).await?;

        let _ = self.events.send(StorageChange {
            key: key.to_string(),
            old_value,
            new_value: Some(value),
        });
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut map = self.read_all().await?;
        if let Some(old_value) = map.remove(key) {
            self.write_all(&map).await?;
            let _ = self.events.send(StorageChange {
                key: key.to_string(),
                old_value: Some(old_value),
                new_value: None,
            });
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.events.subscribe()
    }
}
