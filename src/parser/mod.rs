//! Parsing of prompt placeholders and import files

pub mod variables;
pub mod import;

pub use variables::{collect_variables, extract, resolve_template, substitute};
pub use import::{parse_settings, parse_templates, template_from_value};
