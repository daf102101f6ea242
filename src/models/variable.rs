//! Placeholder variables found in prompt text

use serde::{Deserialize, Serialize};

/// A `{{name:default}}` occurrence. Derived at invocation time, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateVariable {
    pub name: String,
    pub default_value: String,
    pub full_match: String,
}
