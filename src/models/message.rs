//! Message vocabulary shared by the background process, content scripts and popup
//!
//! Every message is a JSON object with an `action` discriminator:
//! - `contentScriptReady`: content → background, no reply
//! - `templatesUpdated`: any → background, replies `{success: true}`
//! - `generateText`: popup/content → background, replies a [`GenerateResult`]
//! - `fillTemplate`: background → content, replies `{success, error?}`
//! - `ping`: background → content, replies `{status: "ready"}`
//! - `getPageContent`: background/popup → content, replies `{content}`

use super::template::Template;
use serde::{Deserialize, Serialize};

/// Opaque host tab identifier
pub type TabId = i32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Message {
    ContentScriptReady,
    TemplatesUpdated,
    #[serde(rename_all = "camelCase")]
    GenerateText {
        system_prompt: String,
        user_prompt: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        page_content: Option<String>,
    },
    FillTemplate {
        template: Template,
    },
    Ping,
    GetPageContent,
}

impl Message {
    pub fn action(&self) -> &'static str {
        match self {
            Message::ContentScriptReady => "contentScriptReady",
            Message::TemplatesUpdated => "templatesUpdated",
            Message::GenerateText { .. } => "generateText",
            Message::FillTemplate { .. } => "fillTemplate",
            Message::Ping => "ping",
            Message::GetPageContent => "getPageContent",
        }
    }
}

/// `{success, error?}` reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReply {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StatusReply {
    pub fn ok() -> Self {
        Self { success: true, error: None }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Outcome of a chat-completion request, also the `generateText` reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GenerateResult {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            success: true,
            text: Some(text.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            text: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadyReply {
    pub status: String,
}

impl ReadyReply {
    pub fn ready() -> Self {
        Self {
            status: "ready".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageContentReply {
    pub content: String,
}

/// Any reply a dispatcher can send back. Serialized without a tag; the
/// requester knows which shape to decode from the action it sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Reply {
    Status(StatusReply),
    Generated(GenerateResult),
    Ready(ReadyReply),
    PageContent(PageContentReply),
}

impl Reply {
    pub fn to_value(&self) -> serde_json::Value {
        // Serializing these plain structs cannot fail
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_unit_messages_carry_only_action() {
        assert_eq!(
            serde_json::to_value(Message::Ping).unwrap(),
            json!({"action": "ping"})
        );
        assert_eq!(
            serde_json::to_value(Message::ContentScriptReady).unwrap(),
            json!({"action": "contentScriptReady"})
        );
    }

    #[test]
    fn test_generate_text_wire_shape() {
        let message: Message = serde_json::from_value(json!({
            "action": "generateText",
            "systemPrompt": "sys",
            "userPrompt": "user"
        }))
        .unwrap();

        assert_eq!(
            message,
            Message::GenerateText {
                system_prompt: "sys".to_string(),
                user_prompt: "user".to_string(),
                page_content: None,
            }
        );
        assert_eq!(message.action(), "generateText");
    }

    #[test]
    fn test_fill_template_carries_template() {
        let message = Message::FillTemplate {
            template: Template::default_template(),
        };
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["action"], "fillTemplate");
        assert_eq!(value["template"]["id"], "default");
    }

    #[test]
    fn test_unknown_action_is_rejected() {
        let result = serde_json::from_value::<Message>(json!({"action": "selfDestruct"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_replies_serialize_untagged() {
        assert_eq!(Reply::Status(StatusReply::ok()).to_value(), json!({"success": true}));
        assert_eq!(Reply::Ready(ReadyReply::ready()).to_value(), json!({"status": "ready"}));
        assert_eq!(
            Reply::Generated(GenerateResult::failed("nope")).to_value(),
            json!({"success": false, "error": "nope"})
        );
    }
}
