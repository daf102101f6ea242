//! Prompt Injector CLI

use clap::{Parser, Subcommand};
use colored::*;
use prompt_injector::cli::{self, commands};
use prompt_injector::storage::{JsonFileStorage, Store};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "prompt-injector")]
#[command(about = "Manage and run reusable prompt templates", long_about = None)]
#[command(version)]
struct Cli {
    /// JSON file holding templates and settings
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create, edit and share templates
    #[command(subcommand)]
    Templates(TemplateCommand),

    /// Show or change settings
    #[command(subcommand)]
    Settings(SettingsCommand),

    /// Check whether a domain pattern matches a domain
    Match { pattern: String, domain: String },

    /// Fill a template's placeholders and print the text it produces
    Run {
        id: String,

        /// Refuse unless the template is offered on this domain
        #[arg(short, long)]
        domain: Option<String>,

        /// File whose contents stand in for the page text
        #[arg(long)]
        page_file: Option<PathBuf>,

        /// Request timeout in seconds
        #[arg(long, default_value_t = 30)]
        timeout: u64,
    },

    /// Menu-driven editor (the default without a command)
    Interactive,
}

#[derive(Subcommand)]
enum TemplateCommand {
    /// List templates, optionally only those applying to a domain
    List {
        #[arg(short, long)]
        domain: Option<String>,
    },
    Show { id: String },
    New,
    /// Set one field, e.g. `set <id> associatedDomains "*.mail.com, mail.com"`
    Set { id: String, field: String, value: String },
    Delete { id: String },
    /// Move a template to a new position in the list
    Move { id: String, index: usize },
    Export { file: PathBuf },
    /// Replace all non-default templates with a JSON or JSON5 file
    Import { file: PathBuf },
}

#[derive(Subcommand)]
enum SettingsCommand {
    Show,
    Set { key: String, value: String },
    Import { file: PathBuf },
}

fn main() {
    let args = Cli::parse();
    cli::init_logging(args.verbose);

    let path = args.store.clone().unwrap_or_else(cli::default_store_path);
    let store = Store::new(Arc::new(JsonFileStorage::new(path)));

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => fail("Failed to initialize async runtime", e.into()),
    };

    if let Err(e) = runtime.block_on(dispatch(args.command, &store)) {
        fail("Command failed", e);
    }
}

async fn dispatch(command: Option<Commands>, store: &Store) -> anyhow::Result<()> {
    match command.unwrap_or(Commands::Interactive) {
        Commands::Templates(command) => match command {
            TemplateCommand::List { domain } => commands::list_templates(store, domain.as_deref()).await,
            TemplateCommand::Show { id } => commands::show_template(store, &id).await,
            TemplateCommand::New => commands::new_template(store).await.map(drop),
            TemplateCommand::Set { id, field, value } => {
                commands::set_template_field(store, &id, &field, &value).await.map(drop)
            }
            TemplateCommand::Delete { id } => commands::delete_template(store, &id).await,
            TemplateCommand::Move { id, index } => commands::move_template(store, &id, index).await,
            TemplateCommand::Export { file } => commands::export_templates(store, &file).await.map(drop),
            TemplateCommand::Import { file } => commands::import_templates(store, &file).await.map(drop),
        },
        Commands::Settings(command) => match command {
            SettingsCommand::Show => commands::show_settings(store).await,
            SettingsCommand::Set { key, value } => commands::set_setting(store, &key, &value).await.map(drop),
            SettingsCommand::Import { file } => commands::import_settings(store, &file).await.map(drop),
        },
        Commands::Match { pattern, domain } => {
            if !commands::check_match(&pattern, &domain) {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Run {
            id,
            domain,
            page_file,
            timeout,
        } => commands::run(
            store,
            &id,
            domain.as_deref(),
            page_file.as_deref(),
            Duration::from_secs(timeout),
        )
        .await
        .map(drop),
        Commands::Interactive => cli::run_interactive_mode(store).await,
    }
}

fn fail(headline: &str, error: anyhow::Error) -> ! {
    eprintln!("{}", format!("❌ {}!", headline).red().bold());
    eprintln!("{}", format!("Error: {:#}", error).red());
    std::process::exit(1);
}
