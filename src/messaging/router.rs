//! Delivery of messages from the background process to page content scripts
//!
//! A tab may not host a content script yet (freshly opened, or opened before
//! the extension was installed). Delivery tries the tab directly and, on
//! failure, injects the script, waits briefly and retries once. Tabs that
//! answered once are remembered as ready until they navigate or close.

use crate::error::DeliveryError;
use crate::models::{Message, ReadyReply, TabId};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, warn};

/// Host side of tab messaging (`tabs.sendMessage`, `scripting.executeScript`)
#[async_trait]
pub trait TabHost: Send + Sync {
    async fn send_message(&self, tab_id: TabId, message: &Message) -> Result<Value, DeliveryError>;

    async fn inject_content_script(&self, tab_id: TabId) -> Result<(), DeliveryError>;
}

#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Pause between injecting the content script and retrying delivery
    pub retry_delay: Duration,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            retry_delay: Duration::from_millis(100),
        }
    }
}

pub struct MessageRouter<H: TabHost> {
    host: H,
    config: RouterConfig,
    ready_tabs: HashSet<TabId>,
}

impl<H: TabHost> MessageRouter<H> {
    pub fn new(host: H, config: RouterConfig) -> Self {
        Self {
            host,
            config,
            ready_tabs: HashSet::new(),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn mark_ready(&mut self, tab_id: TabId) {
        self.ready_tabs.insert(tab_id);
    }

    pub fn forget(&mut self, tab_id: TabId) {
        self.ready_tabs.remove(&tab_id);
    }

    pub fn is_ready(&self, tab_id: TabId) -> bool {
        self.ready_tabs.contains(&tab_id)
    }

    /// Tab closed
    pub fn on_tab_removed(&mut self, tab_id: TabId) {
        self.forget(tab_id);
    }

    /// Navigation started; only a top-level frame replaces the content script
    pub fn on_navigation_started(&mut self, tab_id: TabId, frame_id: i64) {
        if frame_id == 0 {
            self.forget(tab_id);
        }
    }

    /// Make sure `tab_id` hosts a live content script, injecting it if needed.
    /// The tab must answer a ping after injection.
    pub async fn ensure_content_script(&mut self, tab_id: TabId) -> Result<(), DeliveryError> {
        if self.is_ready(tab_id) {
            return Ok(());
        }

        if !self.ping(tab_id).await {
            debug!(tab_id, "content script missing, injecting");
            self.host.inject_content_script(tab_id).await?;
            tokio::time::sleep(self.config.retry_delay).await;

            if !self.ping(tab_id).await {
                return Err(DeliveryError::NoReceiver(tab_id));
            }
        }

        self.mark_ready(tab_id);
        Ok(())
    }

    async fn ping(&self, tab_id: TabId) -> bool {
        match self.host.send_message(tab_id, &Message::Ping).await {
            Ok(reply) => serde_json::from_value::<ReadyReply>(reply).is_ok(),
            Err(_) => false,
        }
    }

    /// Send `message` to `tab_id`, injecting the content script and retrying
    /// once when the first attempt finds no receiver
    pub async fn deliver(&mut self, tab_id: TabId, message: &Message) -> Result<Value, DeliveryError> {
        match self.host.send_message(tab_id, message).await {
            Ok(reply) => {
                self.mark_ready(tab_id);
                return Ok(reply);
            }
            Err(err) => {
                warn!(tab_id, action = message.action(), error = %err, "delivery failed, injecting content script");
                self.forget(tab_id);
            }
        }

        self.host.inject_content_script(tab_id).await?;
        tokio::time::sleep(self.config.retry_delay).await;

        let reply = self.host.send_message(tab_id, message).await?;
        self.mark_ready(tab_id);
        Ok(reply)
    }

    /// [`deliver`](Self::deliver) and decode the reply
    pub async fn request<R: DeserializeOwned>(&mut self, tab_id: TabId, message: &Message) -> Result<R, DeliveryError> {
        let reply = self.deliver(tab_id, message).await?;
        serde_json::from_value(reply).map_err(|e| DeliveryError::InvalidReply {
            action: message.action().to_string(),
            reason: e.to_string(),
        })
    }
}
