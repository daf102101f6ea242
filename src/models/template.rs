//! Prompt template records and partial updates

use crate::utils::domain::{normalize_domains, template_applies_to};
use serde::{Deserialize, Serialize};

/// Reserved id of the template that can never be deleted
pub const DEFAULT_TEMPLATE_ID: &str = "default";

/// Name given to templates created from the editor
pub const NEW_TEMPLATE_NAME: &str = "New Template";

const DEFAULT_TEMPLATE_NAME: &str = "Default Template";
const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: String,
    pub name: String,

    #[serde(default = "enabled_by_default")]
    pub enabled: bool,

    pub system_prompt: String,
    pub user_prompt: String,

    #[serde(default)]
    pub include_page_content: bool,

    /// Exact hostnames or `*.`-prefixed wildcards. Empty means every domain.
    #[serde(default)]
    pub associated_domains: Vec<String>,
}

fn enabled_by_default() -> bool {
    true
}

impl Template {
    /// The built-in template seeded into every fresh store
    pub fn default_template() -> Self {
        Self {
            id: DEFAULT_TEMPLATE_ID.to_string(),
            name: DEFAULT_TEMPLATE_NAME.to_string(),
            enabled: true,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            user_prompt: String::new(),
            include_page_content: false,
            associated_domains: Vec::new(),
        }
    }

    /// A new record that copies the prompts of `seed`
    pub fn seeded_from(id: impl Into<String>, seed: &Template) -> Self {
        Self {
            id: id.into(),
            name: NEW_TEMPLATE_NAME.to_string(),
            enabled: true,
            system_prompt: seed.system_prompt.clone(),
            user_prompt: seed.user_prompt.clone(),
            include_page_content: false,
            associated_domains: Vec::new(),
        }
    }

    pub fn is_default(&self) -> bool {
        self.id == DEFAULT_TEMPLATE_ID
    }

    pub fn applies_to(&self, domain: &str) -> bool {
        template_applies_to(&self.associated_domains, domain)
    }
}

/// Field-level update coming from the editor. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplatePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_prompt: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_page_content: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub associated_domains: Option<Vec<String>>,
}

impl TemplatePatch {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn user_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.user_prompt = Some(prompt.into());
        self
    }

    pub fn include_page_content(mut self, include: bool) -> Self {
        self.include_page_content = Some(include);
        self
    }

    pub fn associated_domains<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.associated_domains = Some(domains.into_iter().map(Into::into).collect());
        self
    }

    /// Merge into `template`, keeping the domain set an ordered set
    pub fn apply_to(self, template: &mut Template) {
        if let Some(name) = self.name {
            template.name = name;
        }
        if let Some(enabled) = self.enabled {
            template.enabled = enabled;
        }
        if let Some(prompt) = self.system_prompt {
            template.system_prompt = prompt;
        }
        if let Some(prompt) = self.user_prompt {
            template.user_prompt = prompt;
        }
        if let Some(include) = self.include_page_content {
            template.include_page_content = include;
        }
        if let Some(domains) = self.associated_domains {
            template.associated_domains = normalize_domains(domains);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_fills_optional_fields() {
        let json = r#"{
            "id": "t1",
            "name": "Reply",
            "systemPrompt": "Be brief",
            "userPrompt": "Answer {{question}}"
        }"#;

        let template: Template = serde_json::from_str(json).unwrap();
        assert!(template.enabled);
        assert!(!template.include_page_content);
        assert!(template.associated_domains.is_empty());
    }

    #[test]
    fn test_serialize_uses_camel_case() {
        let json = serde_json::to_value(Template::default_template()).unwrap();
        assert_eq!(json["id"], DEFAULT_TEMPLATE_ID);
        assert!(json.get("systemPrompt").is_some());
        assert!(json.get("associatedDomains").is_some());
        assert!(json.get("includePageContent").is_some());
    }

    #[test]
    fn test_patch_dedups_domains() {
        let mut template = Template::default_template();
        TemplatePatch::default()
            .name("Mail")
            .associated_domains(["Mail.Example.com", "mail.example.com", " *.b.com "])
            .apply_to(&mut template);

        assert_eq!(template.name, "Mail");
        assert_eq!(template.associated_domains, vec!["mail.example.com", "*.b.com"]);
    }
}
