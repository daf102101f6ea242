//! Per-page content script: answers pings, reads page text and fills the
//! focused field with a template

use crate::error::DeliveryError;
use crate::models::{
    GenerateResult, Message, PageContentReply, ReadyReply, Reply, StatusReply, Template, TemplateVariable,
};
use crate::parser::variables::{collect_variables, resolve_template};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, warn};

/// The page's DOM as seen by the content script
pub trait PageHost: Send + Sync {
    /// Visible text of the document body
    fn visible_text(&self) -> String;

    fn has_focused_editable(&self) -> bool;

    /// Insert at the caret of the focused editable element
    fn insert_text(&self, text: &str) -> Result<()>;
}

/// Asks the user for a placeholder value, seeded with its default.
/// `None` cancels the fill.
#[async_trait]
pub trait VariablePrompter: Send + Sync {
    async fn prompt(&self, variable: &TemplateVariable) -> Option<String>;
}

/// Channel from the content script to the background process
#[async_trait]
pub trait BackgroundChannel: Send + Sync {
    async fn send(&self, message: Message) -> Result<Value, DeliveryError>;
}

/// Prompts each variable once, in order, and returns the resolved values.
/// `None` if the user cancelled.
pub async fn prompt_for_values<V: VariablePrompter + ?Sized>(
    prompter: &V,
    template: &Template,
) -> Option<HashMap<String, String>> {
    let variables = collect_variables(&[&template.system_prompt, &template.user_prompt]);
    let mut values = HashMap::with_capacity(variables.len());
    for variable in &variables {
        let value = prompter.prompt(variable).await?;
        values.insert(variable.name.clone(), value);
    }
    Some(values)
}

pub struct ContentScript<P, V, B> {
    page: P,
    prompter: V,
    background: B,
}

impl<P: PageHost, V: VariablePrompter, B: BackgroundChannel> ContentScript<P, V, B> {
    pub fn new(page: P, prompter: V, background: B) -> Self {
        Self {
            page,
            prompter,
            background,
        }
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    /// Tell the background this tab can receive messages
    pub async fn announce_ready(&self) {
        if let Err(err) = self.background.send(Message::ContentScriptReady).await {
            warn!(error = %err, "could not announce content script");
        }
    }

    /// Single dispatch point for messages arriving at the page
    pub async fn handle_message(&self, message: Message) -> Option<Reply> {
        match message {
            Message::Ping => Some(Reply::Ready(ReadyReply::ready())),
            Message::GetPageContent => Some(Reply::PageContent(PageContentReply {
                content: self.page.visible_text(),
            })),
            Message::FillTemplate { template } => Some(Reply::Status(match self.fill_template(&template).await {
                Ok(()) => StatusReply::ok(),
                Err(error) => StatusReply::failed(error),
            })),
            Message::ContentScriptReady | Message::TemplatesUpdated | Message::GenerateText { .. } => None,
        }
    }

    pub async fn handle_raw(&self, raw: Value) -> Option<Value> {
        match serde_json::from_value::<Message>(raw) {
            Ok(message) => self.handle_message(message).await.map(|reply| reply.to_value()),
            Err(err) => {
                debug!(error = %err, "ignoring unrecognized message");
                None
            }
        }
    }

    /// Resolve placeholders, expand through the background and write the
    /// outcome into the focused field. Generation failures are written into
    /// the field as well.
    pub async fn fill_template(&self, template: &Template) -> Result<(), String> {
        if !self.page.has_focused_editable() {
            return Err("No editable field is focused".to_string());
        }

        let values = prompt_for_values(&self.prompter, template)
            .await
            .ok_or_else(|| "Cancelled".to_string())?;
        let resolved = resolve_template(template, &values);

        match self.generate(&resolved).await {
            GenerateResult {
                success: true,
                text: Some(text),
                ..
            } => self.insert(&text),
            GenerateResult { error, .. } => {
                let error = error.unwrap_or_else(|| "Unknown error".to_string());
                self.insert(&format!("Error: {}", error))?;
                Err(error)
            }
        }
    }

    async fn generate(&self, template: &Template) -> GenerateResult {
        let message = Message::GenerateText {
            system_prompt: template.system_prompt.clone(),
            user_prompt: template.user_prompt.clone(),
            page_content: template
                .include_page_content
                .then(|| self.page.visible_text()),
        };

        match self.background.send(message).await {
            Ok(reply) => serde_json::from_value(reply)
                .unwrap_or_else(|e| GenerateResult::failed(format!("Invalid reply from background: {}", e))),
            Err(err) => GenerateResult::failed(err.to_string()),
        }
    }

    fn insert(&self, text: &str) -> Result<(), String> {
        self.page.insert_text(text).map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    struct FakePage {
        focused: bool,
        inserted: Mutex<Vec<String>>,
    }

    impl FakePage {
        fn focused() -> Self {
            Self {
                focused: true,
                inserted: Mutex::new(Vec::new()),
            }
        }

        fn inserted(&self) -> Vec<String> {
            self.inserted.lock().unwrap().clone()
        }
    }

    impl PageHost for FakePage {
        fn visible_text(&self) -> String {
            "Article body".to_string()
        }

        fn has_focused_editable(&self) -> bool {
            self.focused
        }

        fn insert_text(&self, text: &str) -> Result<()> {
            self.inserted.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    /// Answers with fixed values, or cancels when empty
    struct FixedAnswers(HashMap<&'static str, &'static str>);

    #[async_trait]
    impl VariablePrompter for FixedAnswers {
        async fn prompt(&self, variable: &TemplateVariable) -> Option<String> {
            if self.0.is_empty() {
                return None;
            }
            Some(
                self.0
                    .get(variable.name.as_str())
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| variable.default_value.clone()),
            )
        }
    }

    /// Background that echoes the request back as generated text
    #[derive(Default)]
    struct EchoBackground {
        received: Mutex<Vec<Message>>,
        fail_with: Option<String>,
    }

    #[async_trait]
    impl BackgroundChannel for EchoBackground {
        async fn send(&self, message: Message) -> Result<Value, DeliveryError> {
            self.received.lock().unwrap().push(message.clone());
            if let Some(error) = &self.fail_with {
                return Ok(json!({"success": false, "error": error}));
            }
            match message {
                Message::GenerateText { system_prompt, user_prompt, page_content } => Ok(json!({
                    "success": true,
                    "text": format!("{}|{}|{}", system_prompt, user_prompt, page_content.unwrap_or_default())
                })),
                _ => Ok(Value::Null),
            }
        }
    }

    fn answers(pairs: &[(&'static str, &'static str)]) -> FixedAnswers {
        FixedAnswers(pairs.iter().copied().collect())
    }

    fn template(system: &str, user: &str, include_page: bool) -> Template {
        Template {
            system_prompt: system.to_string(),
            user_prompt: user.to_string(),
            include_page_content: include_page,
            ..Template::default_template()
        }
    }

    #[tokio::test]
    async fn test_ping_and_page_content() {
        let script = ContentScript::new(FakePage::focused(), answers(&[]), EchoBackground::default());
        assert_eq!(script.handle_raw(json!({"action": "ping"})).await, Some(json!({"status": "ready"})));
        assert_eq!(
            script.handle_raw(json!({"action": "getPageContent"})).await,
            Some(json!({"content": "Article body"}))
        );
        assert_eq!(script.handle_raw(json!({"action": "templatesUpdated"})).await, None);
    }

    #[tokio::test]
    async fn test_fill_resolves_variables_and_generates() {
        let script = ContentScript::new(
            FakePage::focused(),
            answers(&[("tone", "dry"), ("topic", "rust")]),
            EchoBackground::default(),
        );

        let reply = script
            .handle_message(Message::FillTemplate {
                template: template("Be {{tone:warm}}", "On {{topic}} in a {{tone}} way", true),
            })
            .await;

        assert_eq!(reply, Some(Reply::Status(StatusReply::ok())));
        assert_eq!(script.page().inserted(), vec!["Be dry|On rust in a dry way|Article body"]);
    }

    #[tokio::test]
    async fn test_empty_system_prompt_still_generates() {
        let script = ContentScript::new(
            FakePage::focused(),
            answers(&[("topic", "rust")]),
            EchoBackground::default(),
        );

        script
            .fill_template(&template("", "Write a haiku about {{topic:go}}", false))
            .await
            .unwrap();

        assert_eq!(script.page().inserted(), vec!["|Write a haiku about rust|"]);
        assert_eq!(
            *script.background.received.lock().unwrap(),
            vec![Message::GenerateText {
                system_prompt: String::new(),
                user_prompt: "Write a haiku about rust".to_string(),
                page_content: None,
            }]
        );
    }

    #[tokio::test]
    async fn test_generation_error_written_to_field() {
        let background = EchoBackground {
            fail_with: Some("bad key".to_string()),
            ..EchoBackground::default()
        };
        let script = ContentScript::new(FakePage::focused(), answers(&[("x", "1")]), background);

        let err = script.fill_template(&template("sys", "user", false)).await.unwrap_err();
        assert_eq!(err, "bad key");
        assert_eq!(script.page().inserted(), vec!["Error: bad key"]);
    }

    #[tokio::test]
    async fn test_fill_requires_focus() {
        let page = FakePage {
            focused: false,
            inserted: Mutex::new(Vec::new()),
        };
        let script = ContentScript::new(page, answers(&[("x", "1")]), EchoBackground::default());

        let reply = script
            .handle_message(Message::FillTemplate {
                template: template("sys", "user", false),
            })
            .await;
        assert_eq!(reply, Some(Reply::Status(StatusReply::failed("No editable field is focused"))));
    }

    #[tokio::test]
    async fn test_cancelled_prompt_inserts_nothing() {
        let script = ContentScript::new(FakePage::focused(), answers(&[]), EchoBackground::default());
        let err = script.fill_template(&template("sys", "{{x}}", false)).await.unwrap_err();
        assert_eq!(err, "Cancelled");
        assert!(script.page().inserted().is_empty());
    }

    #[tokio::test]
    async fn test_announce_ready() {
        let script = ContentScript::new(FakePage::focused(), answers(&[]), EchoBackground::default());
        script.announce_ready().await;
        assert_eq!(
            *script.background.received.lock().unwrap(),
            vec![Message::ContentScriptReady]
        );
    }
}
