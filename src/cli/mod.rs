//! Command-line front end over a JSON file store

pub mod commands;
pub mod interactive;
pub mod logging;
pub mod prompter;

pub use interactive::run_interactive_mode;
pub use logging::init_logging;
pub use prompter::DialoguerPrompter;

use std::path::PathBuf;

/// `~/.prompt-injector/storage.json`, or the current directory without a home
pub fn default_store_path() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".prompt-injector").join("storage.json"))
        .unwrap_or_else(|| PathBuf::from("prompt-injector.json"))
}
