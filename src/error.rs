//! Error types for storage, message delivery, the chat endpoint and imports

use thiserror::Error;

/// Failures reported by a storage area
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage is not available in this context")]
    Unavailable,

    #[error("storage host error: {0}")]
    Host(String),

    #[error("quota exceeded for '{key}': {bytes} bytes over a limit of {limit}")]
    QuotaExceeded {
        key: String,
        bytes: usize,
        limit: usize,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures delivering a message to another context
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("no content script is listening in tab {0}")]
    NoReceiver(i32),

    #[error("failed to inject content script into tab {tab_id}: {reason}")]
    Injection { tab_id: i32, reason: String },

    #[error("unexpected reply to '{action}': {reason}")]
    InvalidReply { action: String, reason: String },

    #[error("messaging host error: {0}")]
    Host(String),
}

/// Failures talking to the chat-completion endpoint.
///
/// The `Display` strings are the user-facing messages.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("API key is not configured. Please add your API key in the settings.")]
    MissingApiKey,

    #[error("Request timed out after {ms}ms")]
    Timeout { ms: u128 },

    #[error("{0}")]
    Http(String),

    #[error("API response is missing expected content")]
    MissingContent,

    #[error("Network error: {0}")]
    Transport(String),
}

/// Failures reading an import file
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("invalid file: {0}")]
    Syntax(String),

    #[error("invalid file: expected a list of templates")]
    NotACollection,

    #[error("invalid file: expected a settings object")]
    NotAnObject,
}
