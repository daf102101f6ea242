//! Subcommand implementations shared by the argument parser and the
//! interactive menu

use super::DialoguerPrompter;
use crate::messaging::{prompt_for_values, VariablePrompter};
use crate::models::{SettingKey, Settings, Template, TemplatePatch, TemplateVariable};
use crate::parser::{parse_settings, parse_templates};
use crate::state::{SettingsModel, TemplateModel};
use crate::storage::Store;
use crate::utils::domain::{matches, normalize_domain_list};
use crate::{run_template, RunOptions};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// Editable template fields, by their stored names
pub const TEMPLATE_FIELDS: [&str; 6] = [
    "name",
    "enabled",
    "systemPrompt",
    "userPrompt",
    "includePageContent",
    "associatedDomains",
];

pub async fn load_templates(store: &Store) -> TemplateModel {
    let mut model = TemplateModel::new(store.clone());
    model.initialize().await;
    model
}

pub async fn load_settings(store: &Store) -> SettingsModel {
    let mut model = SettingsModel::new(store.clone());
    model.initialize().await;
    model
}

/// Build a single-field patch from command-line text
pub fn patch_from_field(field: &str, value: &str) -> Result<TemplatePatch> {
    let patch = TemplatePatch::default();
    Ok(match field {
        "name" => patch.name(value),
        "enabled" => patch.enabled(parse_flag(value)?),
        "systemPrompt" => patch.system_prompt(value),
        "userPrompt" => patch.user_prompt(value),
        "includePageContent" => patch.include_page_content(parse_flag(value)?),
        "associatedDomains" | "domains" => patch.associated_domains(normalize_domain_list(value)),
        other => bail!(
            "unknown template field '{}' (expected one of: {})",
            other,
            TEMPLATE_FIELDS.join(", ")
        ),
    })
}

fn parse_flag(value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        other => bail!("expected true or false, got '{}'", other),
    }
}

/// Shows only the last four characters of a key
pub fn mask_api_key(key: &str) -> String {
    if key.is_empty() {
        return "(not set)".to_string();
    }
    let chars: Vec<char> = key.chars().collect();
    let visible = chars.len().min(4);
    let tail: String = chars[chars.len() - visible..].iter().collect();
    format!("{}{}", "*".repeat(8), tail)
}

pub fn print_template_row(template: &Template, active: bool) {
    let marker = if active { "▶".green().bold() } else { " ".normal() };
    let status = if template.enabled {
        "on ".green()
    } else {
        "off".red()
    };
    let scope = if template.associated_domains.is_empty() {
        "all sites".dimmed().to_string()
    } else {
        template.associated_domains.join(", ")
    };
    println!(
        "{} [{}] {} {} {}",
        marker,
        status,
        template.name.bold(),
        format!("({})", template.id).dimmed(),
        scope
    );
}

pub fn print_template(template: &Template) {
    println!("{}", template.name.bold().blue());
    println!("{}", "=".repeat(50).blue());
    println!("id:                 {}", template.id);
    println!("enabled:            {}", template.enabled);
    println!("includePageContent: {}", template.include_page_content);
    println!(
        "associatedDomains:  {}",
        if template.associated_domains.is_empty() {
            "(all sites)".to_string()
        } else {
            template.associated_domains.join(", ")
        }
    );
    println!();
    println!("{}", "System prompt:".bold());
    println!("{}", template.system_prompt);
    println!();
    println!("{}", "User prompt:".bold());
    println!("{}", template.user_prompt);
}

pub fn print_settings(settings: &Settings) {
    println!("{}", "⚙️  Settings".bold().blue());
    println!("{}", "=".repeat(50).blue());
    for key in SettingKey::ALL {
        let value = match key {
            SettingKey::ApiKey => mask_api_key(&settings.api_key),
            SettingKey::BaseUrl => settings.base_url.clone(),
            SettingKey::Model => settings.model.clone(),
            SettingKey::Theme => settings.theme.to_string(),
            SettingKey::ThemeColor => settings.theme_color.to_string(),
            SettingKey::Language => settings.language.to_string(),
        };
        println!("{:<12} {}", key.as_str(), value);
    }
}

pub async fn list_templates(store: &Store, domain: Option<&str>) -> Result<()> {
    let model = load_templates(store).await;
    let templates = match domain {
        Some(domain) => model.get_templates_for_domain(domain),
        None => model.get_templates(),
    };

    if templates.is_empty() {
        println!("{}", "No templates apply here.".yellow());
        return Ok(());
    }

    let active = model.active_template_id();
    for template in &templates {
        print_template_row(template, template.id == active);
    }
    Ok(())
}

pub async fn show_template(store: &Store, id: &str) -> Result<()> {
    let model = load_templates(store).await;
    let template = model
        .get_template(id)
        .with_context(|| format!("no template with id '{}'", id))?;
    print_template(&template);
    Ok(())
}

pub async fn new_template(store: &Store) -> Result<Template> {
    let mut model = load_templates(store).await;
    let template = model.create_new_template().await;
    println!("{} {}", "✅ Created".green().bold(), template.id);
    Ok(template)
}

pub async fn set_template_field(store: &Store, id: &str, field: &str, value: &str) -> Result<Template> {
    let patch = patch_from_field(field, value)?;
    let mut model = load_templates(store).await;
    let updated = model
        .update_template(id, patch)
        .await
        .with_context(|| format!("no template with id '{}'", id))?;
    println!("{} {}.{}", "✅ Updated".green().bold(), updated.id, field);
    Ok(updated)
}

pub async fn delete_template(store: &Store, id: &str) -> Result<()> {
    let mut model = load_templates(store).await;
    let template = model
        .get_template(id)
        .with_context(|| format!("no template with id '{}'", id))?;
    if template.is_default() {
        bail!("the default template cannot be deleted");
    }
    model.delete_template(id).await;
    println!("{} {}", "🗑️  Deleted".green().bold(), template.name);
    Ok(())
}

pub async fn move_template(store: &Store, id: &str, index: usize) -> Result<()> {
    let mut model = load_templates(store).await;
    if !model.move_template(id, index).await {
        bail!("cannot move '{}' to position {}", id, index);
    }
    println!("{} {} -> {}", "✅ Moved".green().bold(), id, index);
    Ok(())
}

pub async fn export_templates(store: &Store, path: &Path) -> Result<usize> {
    let model = load_templates(store).await;
    let templates = model.export_templates();
    let content = serde_json::to_string_pretty(&templates)?;
    tokio::fs::write(path, content)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!(
        "{} {} templates to {}",
        "📤 Exported".green().bold(),
        templates.len(),
        path.display()
    );
    Ok(templates.len())
}

pub async fn import_templates(store: &Store, path: &Path) -> Result<usize> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let entries = parse_templates(&content)?;

    let mut model = load_templates(store).await;
    model.import_templates(&entries).await;
    let count = model.get_templates().len();
    println!("{} {} templates", "📥 Imported".green().bold(), count);
    Ok(count)
}

pub async fn show_settings(store: &Store) -> Result<()> {
    print_settings(&SettingsModel::load(store).await);
    Ok(())
}

pub async fn set_setting(store: &Store, key: &str, value: &str) -> Result<Settings> {
    let key: SettingKey = key
        .parse()
        .with_context(|| format!("unknown setting (expected one of: {})", setting_names()))?;
    let mut model = load_settings(store).await;
    let valid = model.get_settings().apply(key, value);
    let after = model.update_setting(key, value).await;
    if !valid {
        println!("{} '{}' is not a valid {}", "⚠️".yellow(), value, key.as_str());
    } else {
        println!("{} {}", "✅ Saved".green().bold(), key.as_str());
    }
    Ok(after)
}

fn setting_names() -> String {
    SettingKey::ALL
        .iter()
        .map(|key| key.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

pub async fn import_settings(store: &Store, path: &Path) -> Result<Settings> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let record = parse_settings(&content)?;
    let mut model = load_settings(store).await;
    model.import_settings(&record).await;
    println!("{}", "📥 Settings imported".green().bold());
    Ok(model.get_settings())
}

pub fn check_match(pattern: &str, domain: &str) -> bool {
    let matched = matches(pattern, domain);
    if matched {
        println!("{} '{}' matches '{}'", "✅".green(), pattern, domain);
    } else {
        println!("{} '{}' does not match '{}'", "❌".red(), pattern, domain);
    }
    matched
}

/// Replays values collected before generation started
struct Answered(HashMap<String, String>);

#[async_trait]
impl VariablePrompter for Answered {
    async fn prompt(&self, variable: &TemplateVariable) -> Option<String> {
        self.0.get(&variable.name).cloned()
    }
}

/// Resolve and expand a template, printing the text it would insert
pub async fn run(
    store: &Store,
    id: &str,
    domain: Option<&str>,
    page_file: Option<&Path>,
    timeout: Duration,
) -> Result<String> {
    let templates = load_templates(store).await;
    let template = templates
        .get_template(id)
        .with_context(|| format!("no template with id '{}'", id))?;
    if let Some(domain) = domain {
        if !template.enabled || !template.applies_to(domain) {
            bail!("'{}' is not offered on {}", template.name, domain);
        }
    }
    let settings = SettingsModel::load(store).await;

    let page_content = match page_file {
        Some(path) => Some(
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?,
        ),
        None => None,
    };

    // Ask up front so the spinner never covers a prompt
    let values = prompt_for_values(&DialoguerPrompter, &template)
        .await
        .context("Cancelled")?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(format!("Generating with {}...", settings.model));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let options = RunOptions { timeout };
    let result = run_template(&template, &settings, page_content.as_deref(), &Answered(values), &options).await?;

    spinner.finish_and_clear();

    match (result.success, result.text, result.error) {
        (true, Some(text), _) => {
            println!("{}", text);
            Ok(text)
        }
        (_, _, error) => bail!(error.unwrap_or_else(|| "Unknown error".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_patch_from_field() {
        let patch = patch_from_field("associatedDomains", "Mail.com, *.mail.com\nmail.com").unwrap();
        assert_eq!(
            patch.associated_domains,
            Some(vec!["mail.com".to_string(), "*.mail.com".to_string()])
        );
        assert_eq!(patch_from_field("enabled", "no").unwrap().enabled, Some(false));
        assert!(patch_from_field("enabled", "maybe").is_err());
        assert!(patch_from_field("color", "red").is_err());
    }

    #[test]
    fn test_mask_api_key() {
        assert_eq!(mask_api_key(""), "(not set)");
        assert_eq!(mask_api_key("sk-abcdef"), "********cdef");
        assert_eq!(mask_api_key("ab"), "********ab");
    }

    #[tokio::test]
    async fn test_delete_refuses_default() {
        let store = Store::in_memory();
        assert!(delete_template(&store, "default").await.is_err());
        assert!(delete_template(&store, "missing").await.is_err());
    }

    #[tokio::test]
    async fn test_export_then_import_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("templates.json");

        let store = Store::in_memory();
        let created = new_template(&store).await.unwrap();
        set_template_field(&store, &created.id, "name", "Reply").await.unwrap();
        assert_eq!(export_templates(&store, &path).await.unwrap(), 2);

        let other = Store::in_memory();
        assert_eq!(import_templates(&other, &path).await.unwrap(), 2);
        let model = load_templates(&other).await;
        assert_eq!(model.get_template(&created.id).unwrap().name, "Reply");
    }

    #[tokio::test]
    async fn test_set_setting_rejects_unknown_key() {
        let store = Store::in_memory();
        assert!(set_setting(&store, "fontSize", "12").await.is_err());
        let settings = set_setting(&store, "model", "gpt-4o").await.unwrap();
        assert_eq!(settings.model, "gpt-4o");
    }
}
