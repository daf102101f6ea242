//! Template collection: invariants, persistence and change notification

use crate::models::{Template, TemplatePatch, DEFAULT_TEMPLATE_ID};
use crate::parser::import::template_from_value;
use crate::storage::Store;
use crate::utils::listeners::{Listeners, Subscription};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Storage key of the template array
pub const TEMPLATES_KEY: &str = "templates";

/// Called with the active template id and a snapshot of the collection
pub type TemplateListener = dyn Fn(&str, &[Template]) + Send + Sync;

/// Owns the template list of one context (popup or background).
///
/// Every mutation persists immediately and notifies listeners. Read
/// accessors return owned copies.
pub struct TemplateModel {
    store: Store,
    templates: Vec<Template>,
    active_id: String,
    listeners: Listeners<TemplateListener>,
}

impl TemplateModel {
    pub fn new(store: Store) -> Self {
        Self {
            store,
            templates: vec![Template::default_template()],
            active_id: DEFAULT_TEMPLATE_ID.to_string(),
            listeners: Listeners::new(),
        }
    }

    /// Load the collection, restoring the default template if it is missing
    pub async fn initialize(&mut self) -> &mut Self {
        let fallback = serde_json::to_value(vec![Template::default_template()])
            .unwrap_or(Value::Array(Vec::new()));
        let stored: Value = self.store.get_item(TEMPLATES_KEY, fallback).await;

        let entries = match stored {
            Value::Array(entries) => entries,
            _ => Vec::new(),
        };

        let mut seen = HashSet::new();
        let mut templates: Vec<Template> = entries
            .iter()
            .filter_map(template_from_value)
            .filter(|template| seen.insert(template.id.clone()))
            .collect();

        let mut repaired = false;
        match templates.iter_mut().find(|t| t.is_default()) {
            Some(default) if !default.associated_domains.is_empty() => {
                default.associated_domains.clear();
                repaired = true;
            }
            Some(_) => {}
            None => {
                templates.insert(0, Template::default_template());
                repaired = true;
            }
        }

        self.templates = templates;
        if !self.contains(&self.active_id) {
            self.active_id = DEFAULT_TEMPLATE_ID.to_string();
        }

        if repaired {
            info!("default template restored");
            self.persist().await;
        }

        debug!(count = self.templates.len(), "templates loaded");
        self.notify();
        self
    }

    /// Re-read after another context wrote to the shared store
    pub async fn reload(&mut self) {
        self.initialize().await;
    }

    pub fn get_templates(&self) -> Vec<Template> {
        self.templates.clone()
    }

    pub fn get_template(&self, id: &str) -> Option<Template> {
        self.templates.iter().find(|t| t.id == id).cloned()
    }

    pub fn default_template(&self) -> Template {
        self.get_template(DEFAULT_TEMPLATE_ID)
            .unwrap_or_else(Template::default_template)
    }

    pub fn active_template_id(&self) -> String {
        self.active_id.clone()
    }

    pub fn get_active_template(&self) -> Template {
        self.get_template(&self.active_id)
            .unwrap_or_else(|| self.default_template())
    }

    pub fn set_active_template(&mut self, id: &str) -> bool {
        if !self.contains(id) {
            return false;
        }
        self.active_id = id.to_string();
        self.notify();
        true
    }

    /// Append a template seeded from the current default template and select it
    pub async fn create_new_template(&mut self) -> Template {
        let mut id = Uuid::new_v4().to_string();
        while self.contains(&id) {
            id = Uuid::new_v4().to_string();
        }

        let template = Template::seeded_from(id, &self.default_template());
        self.templates.push(template.clone());
        self.active_id = template.id.clone();

        info!(template_id = %template.id, "template created");
        self.persist().await;
        self.notify();
        template
    }

    /// Merge `patch` into the template with `id`. The default template never
    /// keeps a domain restriction.
    pub async fn update_template(&mut self, id: &str, patch: TemplatePatch) -> Option<Template> {
        let template = self.templates.iter_mut().find(|t| t.id == id)?;
        patch.apply_to(template);
        if template.is_default() {
            template.associated_domains.clear();
        }
        let updated = template.clone();

        debug!(template_id = id, "template updated");
        self.persist().await;
        self.notify();
        Some(updated)
    }

    /// Remove a template. The default template and unknown ids are ignored.
    pub async fn delete_template(&mut self, id: &str) {
        if id == DEFAULT_TEMPLATE_ID {
            return;
        }
        let Some(index) = self.templates.iter().position(|t| t.id == id) else {
            return;
        };

        self.templates.remove(index);
        if self.active_id == id {
            self.active_id = match index.checked_sub(1) {
                Some(previous) => self.templates[previous].id.clone(),
                None => DEFAULT_TEMPLATE_ID.to_string(),
            };
        }

        info!(template_id = id, "template deleted");
        self.persist().await;
        self.notify();
    }

    /// Move a template to `to_index` (clamped to the end of the list)
    pub async fn move_template(&mut self, id: &str, to_index: usize) -> bool {
        let Some(from) = self.templates.iter().position(|t| t.id == id) else {
            return false;
        };

        let template = self.templates.remove(from);
        let to_index = to_index.min(self.templates.len());
        self.templates.insert(to_index, template);

        self.persist().await;
        self.notify();
        true
    }

    pub fn get_templates_for_domain(&self, domain: &str) -> Vec<Template> {
        self.templates
            .iter()
            .filter(|t| t.applies_to(domain))
            .cloned()
            .collect()
    }

    pub fn get_enabled_templates_for_domain(&self, domain: &str) -> Vec<Template> {
        self.templates
            .iter()
            .filter(|t| t.enabled && t.applies_to(domain))
            .cloned()
            .collect()
    }

    /// Enabled templates without a domain restriction
    pub fn get_universal_templates(&self) -> Vec<Template> {
        self.templates
            .iter()
            .filter(|t| t.enabled && t.associated_domains.is_empty())
            .cloned()
            .collect()
    }

    pub fn export_templates(&self) -> Vec<Template> {
        self.get_templates()
    }

    /// Replace every non-default template with the valid entries of
    /// `entries`. A default-id entry replaces the current default template;
    /// malformed entries are dropped.
    pub async fn import_templates(&mut self, entries: &[Value]) {
        let mut default = self.default_template();
        let mut others: Vec<Template> = Vec::new();
        let mut dropped = 0usize;

        for entry in entries {
            match template_from_value(entry) {
                Some(mut template) if template.is_default() => {
                    template.associated_domains.clear();
                    default = template;
                }
                Some(template) => {
                    if others.iter().all(|t| t.id != template.id) {
                        others.push(template);
                    }
                }
                None => dropped += 1,
            }
        }

        let mut templates = Vec::with_capacity(others.len() + 1);
        templates.push(default);
        templates.extend(others);
        self.templates = templates;

        if !self.contains(&self.active_id) {
            self.active_id = DEFAULT_TEMPLATE_ID.to_string();
        }

        info!(count = self.templates.len(), dropped, "templates imported");
        self.persist().await;
        self.notify();
    }

    pub fn on_change<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&str, &[Template]) + Send + Sync + 'static,
    {
        self.listeners.subscribe(Arc::new(listener))
    }

    fn contains(&self, id: &str) -> bool {
        self.templates.iter().any(|t| t.id == id)
    }

    async fn persist(&self) {
        self.store.set_item(TEMPLATES_KEY, &self.templates).await;
    }

    fn notify(&self) {
        let templates = self.get_templates();
        for listener in self.listeners.snapshot() {
            listener(&self.active_id, &templates);
        }
    }
}
