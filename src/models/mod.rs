//! Core data models for templates, settings and cross-context messages

pub mod template;
pub mod variable;
pub mod settings;
pub mod message;

pub use template::*;
pub use variable::*;
pub use settings::*;
pub use message::*;
