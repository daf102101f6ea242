//! Client for an OpenAI-compatible `/chat/completions` endpoint

use crate::error::ApiError;
use crate::models::{GenerateResult, Settings};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Applied when a request does not set its own timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const PAGE_CONTENT_SEPARATOR: &str = "\n\nPage Content:\n";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub page_content: Option<String>,
    pub timeout: Option<Duration>,
}

impl GenerateRequest {
    pub fn new(system_prompt: impl Into<String>, user_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            user_prompt: user_prompt.into(),
            ..Self::default()
        }
    }

    pub fn with_page_content(mut self, content: impl Into<String>) -> Self {
        self.page_content = Some(content.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
}

/// Messages sent for `request`: an optional system message, then the user
/// message with page content appended when supplied
pub fn build_messages(request: &GenerateRequest) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(2);

    if !request.system_prompt.is_empty() {
        messages.push(ChatMessage {
            role: "system".to_string(),
            content: request.system_prompt.clone(),
        });
    }

    let mut user_content = request.user_prompt.clone();
    if let Some(page) = &request.page_content {
        user_content.push_str(PAGE_CONTENT_SEPARATOR);
        user_content.push_str(page);
    }
    messages.push(ChatMessage {
        role: "user".to_string(),
        content: user_content,
    });

    messages
}

pub struct ChatClient {
    http: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl ChatClient {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into(),
            model: model.into(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(&settings.api_key, &settings.base_url, &settings.model)
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    /// Run one completion. Every failure is folded into the result.
    pub async fn generate(&self, request: &GenerateRequest) -> GenerateResult {
        match self.try_generate(request).await {
            Ok(text) => GenerateResult::text(text),
            Err(err) => {
                warn!(error = %err, "text generation failed");
                GenerateResult::failed(err.to_string())
            }
        }
    }

    pub async fn try_generate(&self, request: &GenerateRequest) -> Result<String, ApiError> {
        if self.api_key.trim().is_empty() {
            return Err(ApiError::MissingApiKey);
        }

        let timeout = request.timeout.unwrap_or(DEFAULT_TIMEOUT);
        let body = ChatRequest {
            model: &self.model,
            messages: build_messages(request),
        };

        debug!(endpoint = %self.endpoint(), model = %self.model, "sending chat completion");

        // Dropping the in-flight future on expiry aborts the request
        match tokio::time::timeout(timeout, self.exchange(&body)).await {
            Ok(result) => result,
            Err(_) => Err(ApiError::Timeout {
                ms: timeout.as_millis(),
            }),
        }
    }

    async fn exchange(&self, body: &ChatRequest<'_>) -> Result<String, ApiError> {
        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status();
        let payload: Option<Value> = response.json().await.ok();

        if !status.is_success() {
            let message = payload
                .as_ref()
                .and_then(|p| p.pointer("/error/message"))
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| {
                    format!(
                        "API error ({}): {}",
                        status.as_u16(),
                        status.canonical_reason().unwrap_or("Unknown")
                    )
                });
            return Err(ApiError::Http(message));
        }

        payload
            .as_ref()
            .and_then(|p| p.pointer("/choices/0/message/content"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or(ApiError::MissingContent)
    }
}
