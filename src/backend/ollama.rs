//! Ollama chat backend
//!
//! Implements `ChatBackend` with one non-streaming `POST {endpoint}/api/chat`
//! per call. Every call is bounded by the client timeout so a hung server
//! cannot stall the sweep forever.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::tiers::ModelTierConfig;

use super::{ChatBackend, ChatMessage, ChatReply, ChatRequest};

// ─────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────

/// HTTP settings for the Ollama backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Whole-request timeout in seconds
    pub timeout_secs: u64,

    /// TCP connect timeout in seconds
    pub connect_timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 120,
            connect_timeout_secs: 10,
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Wire types
// ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

/// Usage counters are optional on the wire and defaulted here, once.
#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: OllamaMessage,
    #[serde(default)]
    prompt_eval_count: u64,
    #[serde(default)]
    eval_count: u64,
}

#[derive(Debug, Deserialize)]
struct OllamaMessage {
    #[serde(default)]
    content: String,
}

impl From<OllamaChatResponse> for ChatReply {
    fn from(resp: OllamaChatResponse) -> Self {
        ChatReply {
            content: resp.message.content,
            input_tokens: resp.prompt_eval_count,
            output_tokens: resp.eval_count,
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Ollama Backend
// ─────────────────────────────────────────────────────────────────

/// reqwest-based client for Ollama's chat API
pub struct OllamaBackend {
    config: OllamaConfig,
    client: Client,
}

impl OllamaBackend {
    /// Create a new backend with the given configuration
    pub fn new(config: OllamaConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            timeout_secs = config.timeout_secs,
            connect_timeout_secs = config.connect_timeout_secs,
            "Ollama backend created"
        );

        Ok(Self { config, client })
    }

    /// Chat URL for an endpoint, tolerating a trailing slash
    fn chat_url(endpoint: &str) -> String {
        format!("{}/api/chat", endpoint.trim_end_matches('/'))
    }
}

#[async_trait]
impl ChatBackend for OllamaBackend {
    fn name(&self) -> &'static str {
        "ollama"
    }

    async fn chat(&self, tier: &ModelTierConfig, request: &ChatRequest) -> Result<ChatReply> {
        let url = Self::chat_url(&tier.endpoint);
        let body = OllamaChatRequest {
            model: &tier.model,
            messages: &request.messages,
            stream: false,
        };

        debug!(url = %url, model = %tier.model, "Sending chat request");

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::ConnectionTimeout {
                        url: url.clone(),
                        timeout_secs: self.config.timeout_secs,
                    }
                } else {
                    Error::connection_failed(&url, e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::BackendStatus {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: OllamaChatResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                Error::ConnectionTimeout {
                    url: url.clone(),
                    timeout_secs: self.config.timeout_secs,
                }
            } else {
                Error::BackendMalformed { message: e.to_string() }
            }
        })?;

        Ok(parsed.into())
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────
