//! Lenient parsing of exported template and settings files

use crate::error::ImportError;
use crate::models::Template;
use crate::utils::domain::normalize_domains;
use serde_json::Value;

/// Parse an export file into raw template entries.
///
/// Accepts JSON or JSON5 (comments, trailing commas), either a bare array or
/// an object with a `templates` array. Entries are validated later by
/// [`template_from_value`] so that one bad record does not reject the file.
pub fn parse_templates(content: &str) -> Result<Vec<Value>, ImportError> {
    let value: Value =
        json5::from_str(content).map_err(|e| ImportError::Syntax(e.to_string()))?;

    match value {
        Value::Array(entries) => Ok(entries),
        Value::Object(mut object) => match object.remove("templates") {
            Some(Value::Array(entries)) => Ok(entries),
            _ => Err(ImportError::NotACollection),
        },
        _ => Err(ImportError::NotACollection),
    }
}

/// Parse a settings export into a raw object for validation by the model
pub fn parse_settings(content: &str) -> Result<Value, ImportError> {
    let value: Value =
        json5::from_str(content).map_err(|e| ImportError::Syntax(e.to_string()))?;

    match value {
        Value::Object(mut object) => match object.remove("settings") {
            Some(inner @ Value::Object(_)) => Ok(inner),
            Some(_) => Err(ImportError::NotAnObject),
            None => Ok(Value::Object(object)),
        },
        _ => Err(ImportError::NotAnObject),
    }
}

/// Validate one raw entry.
///
/// `id`, `name`, `systemPrompt` and `userPrompt` must be strings. Optional
/// fields fall back to their defaults; the older single-string
/// `associatedDomain` field is adopted as a one-element domain set.
pub fn template_from_value(value: &Value) -> Option<Template> {
    let object = value.as_object()?;
    let text = |key: &str| object.get(key).and_then(Value::as_str).map(str::to_string);

    let id = text("id")?;
    if id.is_empty() {
        return None;
    }

    let domains: Vec<String> = match object.get("associatedDomains") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => text("associatedDomain").into_iter().collect(),
    };

    Some(Template {
        id,
        name: text("name")?,
        enabled: object.get("enabled").and_then(Value::as_bool).unwrap_or(true),
        system_prompt: text("systemPrompt")?,
        user_prompt: text("userPrompt")?,
        include_page_content: object
            .get("includePageContent")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        associated_domains: normalize_domains(domains),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_bare_array_and_wrapped_object() {
        let bare = parse_templates(r#"[{"id": "a"}]"#).unwrap();
        assert_eq!(bare.len(), 1);

        let wrapped = parse_templates(r#"{"templates": [{"id": "a"}, {"id": "b"}]}"#).unwrap();
        assert_eq!(wrapped.len(), 2);
    }

    #[test]
    fn test_parse_accepts_json5() {
        let content = r#"[
            // exported by hand
            { id: "a", name: "A", systemPrompt: "", userPrompt: "hi", },
        ]"#;
        let entries = parse_templates(content).unwrap();
        assert!(template_from_value(&entries[0]).is_some());
    }

    #[test]
    fn test_parse_rejects_non_collections() {
        assert!(matches!(parse_templates("42"), Err(ImportError::NotACollection)));
        assert!(matches!(parse_templates(r#"{"x": 1}"#), Err(ImportError::NotACollection)));
        assert!(matches!(parse_templates("{oops"), Err(ImportError::Syntax(_))));
    }

    #[test]
    fn test_template_requires_core_fields() {
        assert!(template_from_value(&json!({"id": "a", "name": "A", "systemPrompt": ""})).is_none());
        assert!(template_from_value(&json!({"id": 1, "name": "A", "systemPrompt": "", "userPrompt": ""})).is_none());
        assert!(template_from_value(&json!("not an object")).is_none());
    }

    #[test]
    fn test_template_defaults_and_legacy_domain() {
        let template = template_from_value(&json!({
            "id": "a",
            "name": "A",
            "systemPrompt": "s",
            "userPrompt": "u",
            "associatedDomain": "Example.com"
        }))
        .unwrap();

        assert!(template.enabled);
        assert!(!template.include_page_content);
        assert_eq!(template.associated_domains, vec!["example.com"]);
    }

    #[test]
    fn test_parse_settings_unwraps_settings_key() {
        let value = parse_settings(r#"{"settings": {"theme": "dark"}}"#).unwrap();
        assert_eq!(value["theme"], "dark");

        let value = parse_settings(r#"{"model": "gpt-4"}"#).unwrap();
        assert_eq!(value["model"], "gpt-4");

        assert!(parse_settings("[]").is_err());
    }
}
