//! Settings record: validation, persistence and change notification

use crate::models::{SettingKey, Settings};
use crate::storage::Store;
use crate::utils::listeners::{Listeners, Subscription};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// Storage key of the settings object
pub const SETTINGS_KEY: &str = "settings";

pub type SettingsListener = dyn Fn(&Settings) + Send + Sync;

pub struct SettingsModel {
    store: Store,
    settings: Settings,
    listeners: Listeners<SettingsListener>,
}

impl SettingsModel {
    pub fn new(store: Store) -> Self {
        Self {
            store,
            settings: Settings::default(),
            listeners: Listeners::new(),
        }
    }

    /// Load from the store; missing or invalid fields take their defaults
    pub async fn initialize(&mut self) -> &mut Self {
        self.settings = Self::load(&self.store).await;
        debug!(model = %self.settings.model, "settings loaded");
        self.notify();
        self
    }

    /// Current persisted settings without keeping a model around
    pub async fn load(store: &Store) -> Settings {
        let stored: Value = store.get_item(SETTINGS_KEY, Value::Null).await;
        Settings::from_value(&stored)
    }

    pub fn get_settings(&self) -> Settings {
        self.settings.clone()
    }

    /// Set one field. Values outside an allow-list keep the previous value.
    pub async fn update_setting(&mut self, key: SettingKey, value: &str) -> Settings {
        if !self.settings.apply(key, value) {
            warn!(key = key.as_str(), value, "rejected invalid setting value");
        }
        self.persist().await;
        self.notify();
        self.get_settings()
    }

    /// Replace the record with `record` merged over the defaults
    pub async fn import_settings(&mut self, record: &Value) {
        self.settings = Settings::from_value(record);
        self.persist().await;
        self.notify();
    }

    pub fn on_change<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Settings) + Send + Sync + 'static,
    {
        self.listeners.subscribe(Arc::new(listener))
    }

    async fn persist(&self) {
        self.store.set_item(SETTINGS_KEY, &self.settings).await;
    }

    fn notify(&self) {
        let settings = self.get_settings();
        for listener in self.listeners.snapshot() {
            listener(&settings);
        }
    }
}
