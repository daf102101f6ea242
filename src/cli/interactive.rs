//! Interactive menu for editing templates and settings from a terminal

use super::commands;
use crate::models::{SettingKey, Template};
use crate::storage::Store;
use crate::utils::domain::normalize_domain_list;
use crate::TemplatePatch;
use anyhow::Result;
use colored::*;
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Select};
use std::path::PathBuf;

/// Run the interactive CLI mode
pub async fn run_interactive_mode(store: &Store) -> Result<()> {
    print_banner();

    loop {
        println!();
        let options = vec![
            "📋 List templates",
            "➕ New template",
            "✏️  Edit template",
            "🗑️  Delete template",
            "▶️  Run template",
            "⚙️  Settings",
            "❌ Exit",
        ];

        let selection = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("What would you like to do?")
            .items(&options)
            .default(0)
            .interact()?;

        let outcome = match selection {
            0 => commands::list_templates(store, None).await,
            1 => handle_new(store).await,
            2 => handle_edit(store).await,
            3 => handle_delete(store).await,
            4 => handle_run(store).await,
            5 => handle_settings(store).await,
            6 => {
                println!("\n{}", "Bye! 👋".green().bold());
                break;
            }
            _ => unreachable!(),
        };

        // Stay in the menu after a failed action
        if let Err(e) = outcome {
            println!("{}", format!("❌ {:#}", e).red());
        }
    }

    Ok(())
}

fn print_banner() {
    println!("{}", "╔═══════════════════════════════════════════════╗".blue());
    println!("{}", "║                                               ║".blue());
    println!("{}", "║     ✨ Prompt Injector                        ║".blue().bold());
    println!("{}", "║                                               ║".blue());
    println!("{}", "║     Reusable prompt templates for any field   ║".blue());
    println!("{}", "║                                               ║".blue());
    println!("{}", "╚═══════════════════════════════════════════════╝".blue());
}

/// Let the user pick one template; `None` when the list is empty
async fn pick_template(store: &Store, prompt: &str, include_default: bool) -> Result<Option<Template>> {
    let model = commands::load_templates(store).await;
    let templates: Vec<Template> = model
        .get_templates()
        .into_iter()
        .filter(|t| include_default || !t.is_default())
        .collect();

    if templates.is_empty() {
        println!("{}", "No templates to choose from.".yellow());
        return Ok(None);
    }

    let labels: Vec<String> = templates
        .iter()
        .map(|t| {
            let status = if t.enabled { "" } else { " (disabled)" };
            format!("{}{}", t.name, status)
        })
        .collect();

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .items(&labels)
        .default(0)
        .interact()?;

    Ok(templates.into_iter().nth(selection))
}

async fn handle_new(store: &Store) -> Result<()> {
    let template = commands::new_template(store).await?;
    if Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt("Edit it now?")
        .default(true)
        .interact()?
    {
        edit_fields(store, &template).await?;
    }
    Ok(())
}

async fn handle_edit(store: &Store) -> Result<()> {
    match pick_template(store, "✏️  Select a template to edit", true).await? {
        Some(template) => edit_fields(store, &template).await,
        None => Ok(()),
    }
}

/// Prompt for every field, pre-filled with the current value
async fn edit_fields(store: &Store, template: &Template) -> Result<()> {
    let theme = ColorfulTheme::default();

    let name: String = Input::with_theme(&theme)
        .with_prompt("Name")
        .with_initial_text(template.name.clone())
        .interact_text()?;

    let enabled = Confirm::with_theme(&theme)
        .with_prompt("Enabled?")
        .default(template.enabled)
        .interact()?;

    let system_prompt: String = Input::with_theme(&theme)
        .with_prompt("System prompt (optional)")
        .with_initial_text(template.system_prompt.clone())
        .allow_empty(true)
        .interact_text()?;

    let user_prompt: String = Input::with_theme(&theme)
        .with_prompt("User prompt")
        .with_initial_text(template.user_prompt.clone())
        .allow_empty(true)
        .interact_text()?;

    let include_page_content = Confirm::with_theme(&theme)
        .with_prompt("Include page content?")
        .default(template.include_page_content)
        .interact()?;

    let mut patch = TemplatePatch::default()
        .name(name)
        .enabled(enabled)
        .system_prompt(system_prompt)
        .user_prompt(user_prompt)
        .include_page_content(include_page_content);

    // The default template always applies everywhere
    if !template.is_default() {
        let domains: String = Input::with_theme(&theme)
            .with_prompt("Domains (comma or newline separated, empty for all sites)")
            .with_initial_text(template.associated_domains.join(", "))
            .allow_empty(true)
            .interact_text()?;
        patch = patch.associated_domains(normalize_domain_list(&domains));
    }

    let mut model = commands::load_templates(store).await;
    if model.update_template(&template.id, patch).await.is_some() {
        println!("{}", "✅ Template saved".green().bold());
    }
    Ok(())
}

async fn handle_delete(store: &Store) -> Result<()> {
    let Some(template) = pick_template(store, "🗑️  Select a template to delete", false).await? else {
        return Ok(());
    };

    let confirmed = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(format!("Delete '{}'?", template.name))
        .default(false)
        .interact()?;
    if confirmed {
        commands::delete_template(store, &template.id).await?;
    }
    Ok(())
}

async fn handle_run(store: &Store) -> Result<()> {
    let Some(template) = pick_template(store, "▶️  Select a template to run", true).await? else {
        return Ok(());
    };

    let mut page_file = None;
    if template.include_page_content {
        let path: String = Input::with_theme(&ColorfulTheme::default())
            .with_prompt("📄 File to use as page content (empty for none)")
            .allow_empty(true)
            .interact_text()?;
        if !path.trim().is_empty() {
            page_file = Some(PathBuf::from(path.trim()));
        }
    }

    println!();
    commands::run(store, &template.id, None, page_file.as_deref(), crate::api::DEFAULT_TIMEOUT).await?;
    Ok(())
}

async fn handle_settings(store: &Store) -> Result<()> {
    commands::show_settings(store).await?;
    println!();

    let labels: Vec<&str> = SettingKey::ALL.iter().map(|key| key.as_str()).collect();
    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Change which setting?")
        .items(&labels)
        .default(0)
        .interact()?;

    let value: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt(labels[selection])
        .allow_empty(true)
        .interact_text()?;

    commands::set_setting(store, labels[selection], value.trim()).await?;
    Ok(())
}
