//! Background process: menu of available templates, message dispatch and
//! text generation

use super::menu::{build_menu, template_id_from_menu_item, MenuItem};
use super::router::{MessageRouter, RouterConfig, TabHost};
use crate::api::{ChatClient, GenerateRequest};
use crate::models::{GenerateResult, Message, PageContentReply, Reply, StatusReply, TabId};
use crate::state::{SettingsModel, TemplateModel};
use crate::storage::Store;
use crate::utils::domain::extract_domain;
use anyhow::{Context, Result};
use serde_json::Value;
use tracing::{debug, info, warn};

pub struct Background<H: TabHost> {
    store: Store,
    templates: TemplateModel,
    router: MessageRouter<H>,
    active_domain: Option<String>,
    menu: Vec<MenuItem>,
}

impl<H: TabHost> Background<H> {
    /// Load templates from `store` and build the initial menu
    pub async fn start(store: Store, host: H, config: RouterConfig) -> Self {
        let mut templates = TemplateModel::new(store.clone());
        templates.initialize().await;

        let mut background = Self {
            store,
            templates,
            router: MessageRouter::new(host, config),
            active_domain: None,
            menu: Vec::new(),
        };
        background.rebuild_menu();
        background
    }

    pub fn menu(&self) -> Vec<MenuItem> {
        self.menu.clone()
    }

    pub fn router(&self) -> &MessageRouter<H> {
        &self.router
    }

    pub fn active_domain(&self) -> Option<&str> {
        self.active_domain.as_deref()
    }

    /// Single dispatch point for messages arriving at the background
    pub async fn handle_message(&mut self, message: Message, sender: Option<TabId>) -> Option<Reply> {
        let action = message.action();
        match message {
            Message::ContentScriptReady => {
                if let Some(tab_id) = sender {
                    debug!(tab_id, "content script ready");
                    self.router.mark_ready(tab_id);
                }
                None
            }
            Message::TemplatesUpdated => {
                self.templates.reload().await;
                self.rebuild_menu();
                Some(Reply::Status(StatusReply::ok()))
            }
            Message::GenerateText {
                system_prompt,
                user_prompt,
                page_content,
            } => {
                let request = GenerateRequest {
                    system_prompt,
                    user_prompt,
                    page_content,
                    timeout: None,
                };
                Some(Reply::Generated(self.generate_text(&request).await))
            }
            Message::FillTemplate { .. } | Message::Ping | Message::GetPageContent => {
                debug!(action, "ignoring message addressed to content scripts");
                None
            }
        }
    }

    /// Entry point for JSON coming from the host; unknown actions are ignored
    pub async fn handle_raw(&mut self, raw: Value, sender: Option<TabId>) -> Option<Value> {
        match serde_json::from_value::<Message>(raw) {
            Ok(message) => self
                .handle_message(message, sender)
                .await
                .map(|reply| reply.to_value()),
            Err(err) => {
                warn!(error = %err, "dropping unrecognized message");
                None
            }
        }
    }

    /// Generate with the settings currently in the store
    pub async fn generate_text(&self, request: &GenerateRequest) -> GenerateResult {
        let settings = SettingsModel::load(&self.store).await;
        ChatClient::from_settings(&settings).generate(request).await
    }

    /// Active tab changed; returns the rebuilt menu
    pub fn on_tab_activated(&mut self, url: &str) -> Vec<MenuItem> {
        self.active_domain = extract_domain(url);
        self.rebuild_menu();
        self.menu()
    }

    pub fn on_tab_removed(&mut self, tab_id: TabId) {
        self.router.on_tab_removed(tab_id);
    }

    pub fn on_navigation_started(&mut self, tab_id: TabId, frame_id: i64) {
        self.router.on_navigation_started(tab_id, frame_id);
    }

    /// A template was picked from the context menu in `tab_id`
    pub async fn handle_menu_click(&mut self, tab_id: TabId, menu_item_id: &str) -> Result<StatusReply> {
        let template_id = template_id_from_menu_item(menu_item_id)
            .with_context(|| format!("'{}' is not a template menu item", menu_item_id))?;
        let template = self
            .templates
            .get_template(template_id)
            .with_context(|| format!("template '{}' no longer exists", template_id))?;

        info!(tab_id, template_id, "filling template");
        self.router
            .ensure_content_script(tab_id)
            .await
            .context("content script unavailable")?;

        let reply: StatusReply = self
            .router
            .request(tab_id, &Message::FillTemplate { template })
            .await
            .context("failed to deliver template to page")?;
        Ok(reply)
    }

    pub async fn request_page_content(&mut self, tab_id: TabId) -> Result<String> {
        let reply: PageContentReply = self
            .router
            .request(tab_id, &Message::GetPageContent)
            .await
            .context("failed to read page content")?;
        Ok(reply.content)
    }

    fn rebuild_menu(&mut self) {
        let templates = match &self.active_domain {
            Some(domain) => self.templates.get_enabled_templates_for_domain(domain),
            None => self.templates.get_universal_templates(),
        };
        self.menu = build_menu(&templates);
        debug!(entries = self.menu.len(), domain = ?self.active_domain, "menu rebuilt");
    }
}
