//! Prompt Injector
//!
//! Reusable prompt templates (system/user prompt pairs, optionally scoped to
//! domains and aware of page content) that are filled into the focused field
//! of a web page, optionally expanded through an OpenAI-compatible
//! chat-completion endpoint first.

pub mod models;
pub mod parser;
pub mod utils;
pub mod storage;
pub mod state;
pub mod messaging;
pub mod api;
pub mod error;
#[cfg(feature = "cli")]
pub mod cli;

pub use api::{ChatClient, GenerateRequest};
pub use error::{ApiError, DeliveryError, ImportError, StorageError};
pub use models::{GenerateResult, Message, Settings, Template, TemplatePatch, TemplateVariable};
pub use state::{SettingsModel, TemplateModel};
pub use storage::Store;

use anyhow::Result;
use messaging::VariablePrompter;
use std::time::Duration;

/// Run one template end to end outside a browser page
pub async fn run_template<V: VariablePrompter + ?Sized>(
    template: &Template,
    settings: &Settings,
    page_content: Option<&str>,
    prompter: &V,
    options: &RunOptions,
) -> Result<GenerateResult> {
    // 1. Ask for every placeholder once
    let values = messaging::prompt_for_values(prompter, template)
        .await
        .ok_or_else(|| anyhow::anyhow!("Cancelled"))?;

    // 2. Substitute into both prompts
    let resolved = parser::resolve_template(template, &values);

    // 3. Generate
    let mut request = GenerateRequest::new(resolved.system_prompt, resolved.user_prompt)
        .with_timeout(options.timeout);
    if resolved.include_page_content {
        request.page_content = page_content.map(str::to_string);
    }

    Ok(ChatClient::from_settings(settings).generate(&request).await)
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub timeout: Duration,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            timeout: api::DEFAULT_TIMEOUT,
        }
    }
}
