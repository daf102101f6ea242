//! Models owning the persisted template collection and settings record

pub mod templates;
pub mod settings;

pub use settings::{SettingsModel, SETTINGS_KEY};
pub use templates::{TemplateModel, TEMPLATES_KEY};
