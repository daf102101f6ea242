//! Placeholder extraction and substitution for prompt text
//!
//! Grammar: `{{name}}` or `{{name:default}}`. The name may not contain `:` or
//! `}`; the default may not contain `}`. Every occurrence is collected,
//! scanning left to right.

use crate::models::{Template, TemplateVariable};
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use std::collections::HashMap;

lazy_static! {
    static ref PLACEHOLDER_PATTERN: Regex = Regex::new(
        r"\{\{([^:}]+?)(?::([^}]*?))?\}\}"
    ).unwrap();
}

/// Trimmed placeholder name; blank names are not placeholders
fn name_of<'t>(caps: &Captures<'t>) -> Option<&'t str> {
    caps.get(1)
        .map(|m| m.as_str().trim())
        .filter(|name| !name.is_empty())
}

fn variable_from(caps: &Captures) -> Option<TemplateVariable> {
    Some(TemplateVariable {
        name: name_of(caps)?.to_string(),
        default_value: caps.get(2).map(|m| m.as_str().to_string()).unwrap_or_default(),
        full_match: caps[0].to_string(),
    })
}

/// All placeholders in `text`, in order, duplicates included
pub fn extract(text: &str) -> Vec<TemplateVariable> {
    PLACEHOLDER_PATTERN
        .captures_iter(text)
        .filter_map(|caps| variable_from(&caps))
        .collect()
}

/// Variables across several texts, de-duplicated by name (first occurrence wins)
pub fn collect_variables(texts: &[&str]) -> Vec<TemplateVariable> {
    let mut collected: Vec<TemplateVariable> = Vec::new();
    for text in texts {
        for variable in extract(text) {
            if !collected.iter().any(|seen| seen.name == variable.name) {
                collected.push(variable);
            }
        }
    }
    collected
}

/// Replace each placeholder whose name has a bound value; leave the rest as written
pub fn substitute(text: &str, values: &HashMap<String, String>) -> String {
    PLACEHOLDER_PATTERN
        .replace_all(text, |caps: &Captures| {
            match name_of(caps).and_then(|name| values.get(name)) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Both prompts of `template` with the same resolved values applied
pub fn resolve_template(template: &Template, values: &HashMap<String, String>) -> Template {
    let mut resolved = template.clone();
    resolved.system_prompt = substitute(&template.system_prompt, values);
    resolved.user_prompt = substitute(&template.user_prompt, values);
    resolved
}
