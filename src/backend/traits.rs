//! Backend trait definitions
//!
//! Defines the `ChatBackend` trait every chat target implements, plus the
//! request/reply types the trial executor exchanges with it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};
use crate::tiers::ModelTierConfig;

// ─────────────────────────────────────────────────────────────────
// Request / Reply
// ─────────────────────────────────────────────────────────────────

/// Chat message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// A single chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: ChatRole::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: ChatRole::User, content: content.into() }
    }
}

/// One non-streaming chat turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
}

impl ChatRequest {
    /// System prompt from the persona, user message from the probe.
    pub fn probe(system_prompt: &str, prompt: &str) -> Self {
        Self {
            messages: vec![ChatMessage::system(system_prompt), ChatMessage::user(prompt)],
        }
    }

    /// Text of the last user message, if any.
    pub fn user_prompt(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == ChatRole::User)
            .map(|m| m.content.as_str())
    }
}

/// Backend answer with usage already defaulted
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChatReply {
    pub content: String,
    /// Prompt tokens, 0 when the backend does not report usage
    pub input_tokens: u64,
    /// Generated tokens, 0 when the backend does not report usage
    pub output_tokens: u64,
}

// ─────────────────────────────────────────────────────────────────
// Chat Backend Trait
// ─────────────────────────────────────────────────────────────────

/// A chat target the harness can probe.
///
/// Implementations must not retry internally: every call is one timed
/// measurement.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Get the backend name
    fn name(&self) -> &'static str;

    /// Verify a tier can be addressed before any request is made.
    fn check_target(&self, tier: &ModelTierConfig) -> Result<()> {
        validate_endpoint(tier).map(|_| ())
    }

    /// Send one chat turn to `tier` and wait for the full reply.
    async fn chat(&self, tier: &ModelTierConfig, request: &ChatRequest) -> Result<ChatReply>;
}

/// Parse a tier endpoint, accepting only http(s) URLs.
pub fn validate_endpoint(tier: &ModelTierConfig) -> Result<Url> {
    let invalid = |reason: String| Error::InvalidEndpoint {
        tier: tier.code.clone(),
        endpoint: tier.endpoint.clone(),
        reason,
    };

    let url = Url::parse(&tier.endpoint).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(invalid(format!("unsupported scheme '{}'", other))),
    }
}
