//! Terminal prompts for template placeholders

use crate::messaging::VariablePrompter;
use crate::models::TemplateVariable;
use async_trait::async_trait;
use dialoguer::{theme::ColorfulTheme, Input};

/// Asks for each placeholder on the terminal, pre-filled with its default
pub struct DialoguerPrompter;

#[async_trait]
impl VariablePrompter for DialoguerPrompter {
    async fn prompt(&self, variable: &TemplateVariable) -> Option<String> {
        Input::<String>::with_theme(&ColorfulTheme::default())
            .with_prompt(format!("✏️  {}", variable.name))
            .with_initial_text(variable.default_value.clone())
            .allow_empty(true)
            .interact_text()
            .ok()
    }
}
