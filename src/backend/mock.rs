//! Mock backend for testing
//!
//! Scripted `ChatBackend` with failure injection and call recording.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::tiers::ModelTierConfig;

use super::{ChatBackend, ChatReply, ChatRequest};

// ─────────────────────────────────────────────────────────────────
// Mock Backend Configuration
// ─────────────────────────────────────────────────────────────────

/// Configuration for mock backend behavior
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Text returned by every successful call
    pub fixed_response: String,

    /// Simulated latency per call
    pub latency: Duration,

    /// Zero-based call indices that fail with a connection error
    pub fail_calls: HashSet<usize>,

    /// Tier codes whose `check_target` fails
    pub unreachable_tiers: HashSet<String>,

    /// Usage counters to report, `None` to omit usage
    pub usage: Option<(u64, u64)>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            fixed_response: "A".repeat(50),
            latency: Duration::from_millis(1),
            fail_calls: HashSet::new(),
            unreachable_tiers: HashSet::new(),
            usage: None,
        }
    }
}

/// One recorded call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub tier: String,
    pub model: String,
    pub user_prompt: String,
}

// ─────────────────────────────────────────────────────────────────
// Mock Backend
// ─────────────────────────────────────────────────────────────────

/// Deterministic in-process chat backend
pub struct MockBackend {
    config: MockConfig,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockBackend {
    /// Create a mock that always answers with 50 `A`s
    pub fn new() -> Self {
        Self::with_config(MockConfig::default())
    }

    pub fn with_config(config: MockConfig) -> Self {
        Self {
            config,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Always answer with `text`
    pub fn answering(text: impl Into<String>) -> Self {
        Self::with_config(MockConfig {
            fixed_response: text.into(),
            ..Default::default()
        })
    }

    /// Number of `chat` calls so far, failed ones included
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Every `chat` call in arrival order
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatBackend for MockBackend {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn check_target(&self, tier: &ModelTierConfig) -> Result<()> {
        if self.config.unreachable_tiers.contains(&tier.code) {
            return Err(Error::InvalidEndpoint {
                tier: tier.code.clone(),
                endpoint: tier.endpoint.clone(),
                reason: "marked unreachable by mock".to_string(),
            });
        }
        Ok(())
    }

    async fn chat(&self, tier: &ModelTierConfig, request: &ChatRequest) -> Result<ChatReply> {
        let index = {
            let mut calls = self.calls.lock();
            calls.push(RecordedCall {
                tier: tier.code.clone(),
                model: tier.model.clone(),
                user_prompt: request.user_prompt().unwrap_or_default().to_string(),
            });
            calls.len() - 1
        };

        if self.config.fail_calls.contains(&index) {
            return Err(Error::connection_failed(&tier.endpoint, "mock network error"));
        }

        if !self.config.latency.is_zero() {
            tokio::time::sleep(self.config.latency).await;
        }

        let (input_tokens, output_tokens) = self.config.usage.unwrap_or((0, 0));
        Ok(ChatReply {
            content: self.config.fixed_response.clone(),
            input_tokens,
            output_tokens,
        })
    }
}
