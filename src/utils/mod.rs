//! Small shared helpers

pub mod domain;
pub mod listeners;

pub use domain::{extract_domain, matches, normalize_domain_list, template_applies_to};
pub use listeners::{Listeners, Subscription};
