//! Per-query and per-trial result types
//!
//! Results are built once and never mutated. The pass/fail fields are
//! derived in the constructors, so the invariants hold by construction:
//! - `TestQueryResult::passed == violations.is_empty() && response > 10 chars`
//! - `ModelTierSummary::total_tests == passed_tests + failed_tests`
//! - `ModelTierSummary::passed == (failed_tests == 0)`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::backend::ChatReply;
use crate::detector::{self, SafetyViolation, MIN_RESPONSE_CHARS};
use crate::error::Error;
use crate::queries::TestQuery;

// ─────────────────────────────────────────────────────────────────
// Test Query Result
// ─────────────────────────────────────────────────────────────────

/// Outcome of one probe against one (persona, tier) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestQueryResult {
    pub test_id: String,
    pub test_prompt: String,
    /// Backend answer, truncated for storage
    pub response: String,
    pub latency_ms: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub safety_violations: Vec<SafetyViolation>,
    pub passed: bool,
}

impl TestQueryResult {
    /// Score a backend answer.
    ///
    /// Heuristics run on the full text; only the stored copy is truncated.
    pub fn answered(query: &TestQuery, reply: ChatReply, latency_ms: u64, max_response_chars: usize) -> Self {
        let safety_violations = detector::detect(&reply.content);
        let passed = detector::is_passing(&reply.content, &safety_violations);

        Self {
            test_id: query.id.clone(),
            test_prompt: query.prompt.clone(),
            response: truncate_response(&reply.content, max_response_chars),
            latency_ms,
            input_tokens: reply.input_tokens,
            output_tokens: reply.output_tokens,
            safety_violations,
            passed,
        }
    }

    /// Synthesize the record for a request that never produced an answer.
    pub fn failed(query: &TestQuery, error: &Error, max_response_chars: usize) -> Self {
        let message = format!("ERROR: {}", error);
        Self {
            test_id: query.id.clone(),
            test_prompt: query.prompt.clone(),
            response: truncate_response(&message, max_response_chars),
            latency_ms: 0,
            input_tokens: 0,
            output_tokens: 0,
            safety_violations: vec![SafetyViolation::QueryFailed],
            passed: false,
        }
    }
}

/// Cut `text` to at most `max_chars` chars on a char boundary.
///
/// The bound never drops below what a passing response needs, so truncation
/// cannot flip the pass invariant.
pub fn truncate_response(text: &str, max_chars: usize) -> String {
    let limit = max_chars.max(MIN_RESPONSE_CHARS + 1);
    match text.char_indices().nth(limit) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}

// ─────────────────────────────────────────────────────────────────
// Model Tier Summary
// ─────────────────────────────────────────────────────────────────

/// Aggregate of one trial's query results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelTierSummary {
    pub total_tests: usize,
    pub passed_tests: usize,
    pub failed_tests: usize,
    /// Rounded mean over all results; failed queries count as 0ms
    pub average_latency_ms: u64,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub safety_violations_count: usize,
    pub passed: bool,
}

impl ModelTierSummary {
    pub fn from_results(results: &[TestQueryResult]) -> Self {
        let total_tests = results.len();
        let passed_tests = results.iter().filter(|r| r.passed).count();
        let failed_tests = total_tests - passed_tests;

        let total_latency: u64 = results.iter().map(|r| r.latency_ms).sum();
        // failed queries stay in the mean at 0ms
        let average_latency_ms = if total_tests == 0 {
            0
        } else {
            (total_latency as f64 / total_tests as f64).round() as u64
        };

        Self {
            total_tests,
            passed_tests,
            failed_tests,
            average_latency_ms,
            total_input_tokens: results.iter().map(|r| r.input_tokens).sum(),
            total_output_tokens: results.iter().map(|r| r.output_tokens).sum(),
            safety_violations_count: results.iter().map(|r| r.safety_violations.len()).sum(),
            passed: failed_tests == 0,
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Simulation Result
// ─────────────────────────────────────────────────────────────────

/// One trial: the full catalog against one (persona, tier) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    pub maestro_id: String,
    pub maestro_name: String,
    pub model_tier: String,
    pub model_name: String,
    pub test_query_results: Vec<TestQueryResult>,
    pub summary: ModelTierSummary,
    pub timestamp: DateTime<Utc>,
    pub duration_ms: u64,
}
