//! Trial executor
//!
//! Runs the whole query catalog against one (persona, tier) pair. Queries go
//! out one at a time: tiers may share an inference server, and overlapping
//! requests would corrupt the latency numbers. A failed request becomes a
//! failed `TestQueryResult` and the trial moves on to the next query.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, warn};

use crate::backend::{ChatBackend, ChatReply, ChatRequest};
use crate::error::{Error, Result};
use crate::persona::Persona;
use crate::queries::{QueryCatalog, TestQuery};
use crate::results::{ModelTierSummary, SimulationResult, TestQueryResult};
use crate::tiers::ModelTierConfig;

/// Default cap on stored response length, in chars
pub const DEFAULT_MAX_RESPONSE_CHARS: usize = 500;

/// What happened to a single chat request
#[derive(Debug)]
pub enum QueryOutcome {
    Answered { reply: ChatReply, latency_ms: u64 },
    Failed { error: Error },
}

/// Executes trials against a shared backend
#[derive(Clone)]
pub struct TrialExecutor {
    backend: Arc<dyn ChatBackend>,
    catalog: Arc<QueryCatalog>,
    max_response_chars: usize,
}

impl TrialExecutor {
    pub fn new(backend: Arc<dyn ChatBackend>, catalog: Arc<QueryCatalog>) -> Self {
        Self {
            backend,
            catalog,
            max_response_chars: DEFAULT_MAX_RESPONSE_CHARS,
        }
    }

    /// Override the stored response cap
    pub fn with_max_response_chars(mut self, max_response_chars: usize) -> Self {
        self.max_response_chars = max_response_chars;
        self
    }

    pub fn catalog(&self) -> &QueryCatalog {
        &self.catalog
    }

    /// Run every catalog query, in order, for one pair.
    ///
    /// Returns `Err` only when the tier cannot be addressed at all; request
    /// failures are folded into the result.
    pub async fn run_trial(
        &self,
        persona: &Persona,
        tier: &ModelTierConfig,
        verbose: bool,
    ) -> Result<SimulationResult> {
        self.backend.check_target(tier)?;

        let timestamp = Utc::now();
        let started = Instant::now();
        let mut results = Vec::with_capacity(self.catalog.len());

        for query in self.catalog.iter() {
            let outcome = self.execute_query(persona, tier, query).await;
            let result = match outcome {
                QueryOutcome::Answered { reply, latency_ms } => {
                    TestQueryResult::answered(query, reply, latency_ms, self.max_response_chars)
                }
                QueryOutcome::Failed { error } => {
                    warn!(
                        persona = %persona.id,
                        tier = %tier.code,
                        query = %query.id,
                        backend = error.is_backend_error(),
                        error = %error.format_for_log(),
                        "Query failed"
                    );
                    TestQueryResult::failed(query, &error, self.max_response_chars)
                }
            };

            if verbose {
                println!("{}", format_query_line(&result));
            }
            results.push(result);
        }

        let summary = ModelTierSummary::from_results(&results);
        debug!(
            persona = %persona.id,
            tier = %tier.code,
            passed = summary.passed_tests,
            failed = summary.failed_tests,
            "Trial finished"
        );

        Ok(SimulationResult {
            maestro_id: persona.id.clone(),
            maestro_name: persona.display_name.clone(),
            model_tier: tier.code.clone(),
            model_name: tier.model.clone(),
            test_query_results: results,
            summary,
            timestamp,
            duration_ms: started.elapsed().as_millis() as u64,
        })
    }

    /// Issue one timed request
    async fn execute_query(&self, persona: &Persona, tier: &ModelTierConfig, query: &TestQuery) -> QueryOutcome {
        let request = ChatRequest::probe(&persona.system_prompt, &query.prompt);
        let start = Instant::now();

        match self.backend.chat(tier, &request).await {
            Ok(reply) => QueryOutcome::Answered {
                reply,
                latency_ms: start.elapsed().as_millis() as u64,
            },
            Err(error) => QueryOutcome::Failed { error },
        }
    }
}

/// One progress line per query, used in verbose mode
fn format_query_line(result: &TestQueryResult) -> String {
    let mark = if result.passed { "✓" } else { "✗" };
    let mut line = format!("    {} {} ({}ms)", mark, result.test_id, result.latency_ms);
    if !result.safety_violations.is_empty() {
        let tags: Vec<&str> = result.safety_violations.iter().map(|v| v.as_str()).collect();
        line.push_str(&format!(" [{}]", tags.join(", ")));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MockBackend, MockConfig};
    use crate::detector::SafetyViolation;
    use std::time::Duration;

    fn persona() -> Persona {
        Persona::new("euclide", "Euclide", "Sei Euclide, professore di matematica.")
    }

    fn tier() -> ModelTierConfig {
        ModelTierConfig::new("3b", "llama3.2:3b", "Llama 3.2 3B", "", "http://localhost:11434")
    }

    fn executor(backend: Arc<MockBackend>) -> TrialExecutor {
        TrialExecutor::new(backend, Arc::new(QueryCatalog::standard()))
    }

    #[test]
    fn test_all_queries_pass() {
        let backend = Arc::new(MockBackend::new());
        let result = tokio_test::block_on(executor(backend.clone()).run_trial(&persona(), &tier(), false)).unwrap();

        assert_eq!(result.summary.total_tests, 3);
        assert_eq!(result.summary.passed_tests, 3);
        assert_eq!(result.summary.failed_tests, 0);
        assert!(result.summary.passed);
        assert_eq!(result.maestro_id, "euclide");
        assert_eq!(result.model_name, "llama3.2:3b");
        assert_eq!(backend.call_count(), 3);
    }

    #[test]
    fn test_queries_run_in_catalog_order() {
        let backend = Arc::new(MockBackend::new());
        let exec = executor(backend.clone());
        let result = tokio_test::block_on(exec.run_trial(&persona(), &tier(), false)).unwrap();

        let expected: Vec<String> = exec.catalog().iter().map(|q| q.prompt.clone()).collect();
        let sent: Vec<String> = backend.calls().into_iter().map(|c| c.user_prompt).collect();
        assert_eq!(sent, expected);

        let ids: Vec<&str> = result.test_query_results.iter().map(|r| r.test_id.as_str()).collect();
        assert_eq!(ids, vec!["subject-clarity", "student-struggling", "lesson-structure"]);
    }

    #[tokio::test]
    async fn test_one_failed_query_is_contained() {
        let backend = Arc::new(MockBackend::with_config(MockConfig {
            latency: Duration::from_millis(5),
            fail_calls: [1].into_iter().collect(),
            ..Default::default()
        }));
        let result = executor(backend.clone()).run_trial(&persona(), &tier(), false).await.unwrap();

        assert_eq!(backend.call_count(), 3);
        assert_eq!(result.summary.total_tests, 3);
        assert_eq!(result.summary.failed_tests, 1);
        assert!(!result.summary.passed);

        let failed = &result.test_query_results[1];
        assert!(failed.response.starts_with("ERROR: "));
        assert_eq!(failed.safety_violations, vec![SafetyViolation::QueryFailed]);
        assert_eq!(failed.latency_ms, 0);

        for ok in [&result.test_query_results[0], &result.test_query_results[2]] {
            assert!(ok.passed);
            assert!(ok.latency_ms >= 5, "real latency expected, got {}", ok.latency_ms);
        }
    }

    #[tokio::test]
    async fn test_unreachable_tier_fails_whole_trial() {
        let backend = Arc::new(MockBackend::with_config(MockConfig {
            unreachable_tiers: ["3b".to_string()].into_iter().collect(),
            ..Default::default()
        }));
        let err = executor(backend.clone()).run_trial(&persona(), &tier(), false).await.unwrap_err();

        assert!(matches!(err, Error::InvalidEndpoint { .. }));
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_stored_response_is_truncated() {
        let backend = Arc::new(MockBackend::answering("x".repeat(2000)));
        let result = executor(backend)
            .with_max_response_chars(200)
            .run_trial(&persona(), &tier(), true)
            .await
            .unwrap();

        assert!(result.test_query_results.iter().all(|r| r.response.chars().count() == 200));
        assert!(result.summary.passed);
    }

    #[tokio::test]
    async fn test_hung_backend_fails_each_query_and_finishes() {
        use crate::backend::{OllamaBackend, OllamaConfig};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                held.push(stream);
            }
        });

        let backend = Arc::new(
            OllamaBackend::new(OllamaConfig {
                timeout_secs: 1,
                connect_timeout_secs: 1,
            })
            .unwrap(),
        );
        let tier = ModelTierConfig::new("3b", "llama3.2:3b", "Llama 3.2 3B", "", endpoint);
        let exec = TrialExecutor::new(backend, Arc::new(QueryCatalog::standard()));

        let result = exec.run_trial(&persona(), &tier, false).await.unwrap();

        assert_eq!(result.summary.total_tests, 3);
        assert_eq!(result.summary.failed_tests, 3);
        assert!(!result.summary.passed);
        for r in &result.test_query_results {
            assert!(r.response.starts_with("ERROR: Request to "), "got {}", r.response);
            assert!(r.response.contains("timed out after 1s"));
            assert_eq!(r.safety_violations, vec![SafetyViolation::QueryFailed]);
        }
    }

    #[test]
    fn test_format_query_line() {
        let query = TestQuery::new("q", "p", "d");
        let ok = TestQueryResult::answered(&query, ChatReply { content: "A".repeat(20), ..Default::default() }, 42, 500);
        assert_eq!(format_query_line(&ok), "    ✓ q (42ms)");

        let bad = TestQueryResult::failed(&query, &Error::Internal("x".into()), 500);
        assert!(format_query_line(&bad).contains("[query_failed]"));
    }
}
