//! Running a template outside a page through the library entry point

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use prompt_injector::messaging::VariablePrompter;
use prompt_injector::{run_template, RunOptions, Settings, Template, TemplateVariable};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Scripted answers; records which placeholders were asked for
#[derive(Default)]
struct Scripted {
    answers: HashMap<&'static str, &'static str>,
    asked: Mutex<Vec<String>>,
    cancel: bool,
}

#[async_trait]
impl VariablePrompter for Scripted {
    async fn prompt(&self, variable: &TemplateVariable) -> Option<String> {
        self.asked.lock().unwrap().push(variable.name.clone());
        if self.cancel {
            return None;
        }
        Some(
            self.answers
                .get(variable.name.as_str())
                .map(|v| v.to_string())
                .unwrap_or_else(|| variable.default_value.clone()),
        )
    }
}

fn template(system: &str, user: &str, include_page_content: bool) -> Template {
    Template {
        id: "t".to_string(),
        name: "T".to_string(),
        system_prompt: system.to_string(),
        user_prompt: user.to_string(),
        include_page_content,
        ..Template::default_template()
    }
}

fn settings_for(server: &MockServer) -> Settings {
    Settings {
        api_key: "sk-test".to_string(),
        base_url: server.uri(),
        model: "gpt-4o-mini".to_string(),
        ..Settings::default()
    }
}

#[tokio::test]
async fn test_empty_system_prompt_sends_only_user_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "messages": [{"role": "user", "content": "Thanks Grace, see Grace soon"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "Thank you, Grace!"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let prompter = Scripted {
        answers: HashMap::from([("name", "Grace")]),
        ..Scripted::default()
    };

    let result = run_template(
        &template("", "Thanks {{name}}, see {{name}} soon", false),
        &settings_for(&server),
        None,
        &prompter,
        &RunOptions::default(),
    )
    .await
    .unwrap();

    assert_eq!(result.text.as_deref(), Some("Thank you, Grace!"));
    assert_eq!(*prompter.asked.lock().unwrap(), vec!["name"]);

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["messages"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_generation_sends_resolved_prompts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "model": "gpt-4o-mini",
            "messages": [
                {"role": "system", "content": "Answer in French"},
                {"role": "user", "content": "Explain ownership\n\nPage Content:\nThe Rust Book"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "La possession..."}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let prompter = Scripted {
        answers: HashMap::from([("lang", "French"), ("topic", "ownership")]),
        ..Scripted::default()
    };

    let result = run_template(
        &template("Answer in {{lang:English}}", "Explain {{topic}}", true),
        &settings_for(&server),
        Some("The Rust Book"),
        &prompter,
        &RunOptions::default(),
    )
    .await
    .unwrap();

    assert!(result.success);
    assert_eq!(result.text.as_deref(), Some("La possession..."));
}

#[tokio::test]
async fn test_page_content_only_sent_when_enabled() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "messages": [{"role": "system", "content": "sys"}, {"role": "user", "content": "user"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "ok"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = run_template(
        &template("sys", "user", false),
        &settings_for(&server),
        Some("ignored page"),
        &Scripted::default(),
        &RunOptions::default(),
    )
    .await
    .unwrap();

    assert_eq!(result.text.as_deref(), Some("ok"));
}

#[tokio::test]
async fn test_timeout_is_reported_in_result() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"choices": [{"message": {"content": "late"}}]}))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let result = run_template(
        &template("sys", "user", false),
        &settings_for(&server),
        None,
        &Scripted::default(),
        &RunOptions {
            timeout: Duration::from_millis(150),
        },
    )
    .await
    .unwrap();

    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("Request timed out after 150ms"));
}

#[tokio::test]
async fn test_cancelled_prompt_stops_the_run() {
    let prompter = Scripted {
        cancel: true,
        ..Scripted::default()
    };
    let err = run_template(
        &template("", "{{a}} {{b}}", false),
        &Settings::default(),
        None,
        &prompter,
        &RunOptions::default(),
    )
    .await
    .unwrap_err();

    assert_eq!(err.to_string(), "Cancelled");
    assert_eq!(*prompter.asked.lock().unwrap(), vec!["a"]);
}
