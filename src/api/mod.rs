//! Chat-completion API access

pub mod client;

pub use client::{build_messages, ChatClient, ChatMessage, GenerateRequest, DEFAULT_TIMEOUT};
