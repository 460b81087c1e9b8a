//! Sweep orchestrator
//!
//! Drives the (persona x tier) double loop, persona-major and tier-minor,
//! and assembles the [`NightlyReport`]. A trial that cannot run is counted
//! as failed and the sweep moves on; nothing below this level aborts a run.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{error, info, warn};

use crate::cli::RunConfiguration;
use crate::error::{Error, Result};
use crate::persona::{Persona, PersonaLookup};
use crate::report::{NightlyReport, RunSummary};
use crate::results::SimulationResult;
use crate::tiers::{ModelTierConfig, TierRegistry};
use crate::trial::TrialExecutor;

/// What happened to one (persona, tier) pair
#[derive(Debug)]
pub enum TrialOutcome {
    Completed(SimulationResult),
    Failed {
        persona_id: String,
        tier: String,
        error: Error,
    },
}

impl TrialOutcome {
    pub fn passed(&self) -> bool {
        matches!(self, TrialOutcome::Completed(result) if result.summary.passed)
    }
}

/// Running counters for progress lines
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct SweepCounters {
    completed: usize,
    passed: usize,
    failed: usize,
}

impl SweepCounters {
    fn record(&mut self, outcome: &TrialOutcome) {
        self.completed += 1;
        if outcome.passed() {
            self.passed += 1;
        } else {
            self.failed += 1;
        }
    }
}

pub struct SweepOrchestrator {
    executor: TrialExecutor,
    tiers: TierRegistry,
    personas: Arc<dyn PersonaLookup>,
}

impl SweepOrchestrator {
    pub fn new(executor: TrialExecutor, tiers: TierRegistry, personas: Arc<dyn PersonaLookup>) -> Self {
        Self {
            executor,
            tiers,
            personas,
        }
    }

    /// Run the whole sweep. Never fails; every problem ends up in the counters.
    pub async fn run(&self, config: &RunConfiguration) -> NightlyReport {
        let started_at = Utc::now();
        let started = Instant::now();

        let personas = self.select_personas(&config.selected_maestri_ids);
        let total = personas.len() * config.selected_tiers.len();

        let resolution = self.tiers.resolve(&config.selected_tiers);
        for code in &resolution.unknown {
            error!(tier = %code, known = ?self.tiers.codes(), "Unknown model tier, its trials will fail");
        }

        info!(
            personas = personas.len(),
            tiers = config.selected_tiers.len(),
            queries = self.executor.catalog().len(),
            dry_run = config.dry_run,
            "Starting nightly sweep"
        );

        let mut counters = SweepCounters::default();
        let mut results = Vec::new();

        for persona in &personas {
            for code in &config.selected_tiers {
                let position = counters.completed + 1;
                if config.verbose {
                    println!("[{}/{}] {} × {}", position, total, persona.display_name, code);
                }

                let outcome = self.run_pair(persona, code, config.verbose).await;
                counters.record(&outcome);
                println!("{}", format_progress_line(position, total, persona, code, &outcome));

                match outcome {
                    TrialOutcome::Completed(result) => results.push(result),
                    TrialOutcome::Failed { persona_id, tier, error } => {
                        error!(
                            persona = %persona_id,
                            tier = %tier,
                            error = %error.format_for_log(),
                            "Trial failed"
                        );
                    }
                }
            }
        }

        let summary = RunSummary {
            total_simulations: counters.passed + counters.failed,
            passed_simulations: counters.passed,
            failed_simulations: counters.failed,
            total_duration_ms: started.elapsed().as_millis() as u64,
        };

        info!(
            total = summary.total_simulations,
            passed = summary.passed_simulations,
            failed = summary.failed_simulations,
            duration_ms = summary.total_duration_ms,
            "Nightly sweep finished"
        );

        NightlyReport::new(started_at, config.clone(), results, summary)
    }

    /// Personas in request order; unknown ids are logged and skipped.
    fn select_personas(&self, ids: &[String]) -> Vec<Persona> {
        if ids.is_empty() {
            return self.personas.get_all_personas();
        }

        ids.iter()
            .filter_map(|id| {
                let persona = self.personas.get_persona_by_id(id);
                if persona.is_none() {
                    error!(persona = %id, "{}", Error::PersonaNotFound { id: id.clone() });
                }
                persona
            })
            .collect()
    }

    async fn run_pair(&self, persona: &Persona, code: &str, verbose: bool) -> TrialOutcome {
        match self.try_run_pair(persona, code, verbose).await {
            Ok(result) => TrialOutcome::Completed(result),
            Err(error) => TrialOutcome::Failed {
                persona_id: persona.id.clone(),
                tier: code.to_string(),
                error,
            },
        }
    }

    async fn try_run_pair(&self, persona: &Persona, code: &str, verbose: bool) -> Result<SimulationResult> {
        let tier: &ModelTierConfig = self.tiers.get(code)?;
        let result = self.executor.run_trial(persona, tier, verbose).await?;
        if !result.summary.passed {
            warn!(
                persona = %persona.id,
                tier = %code,
                failed = result.summary.failed_tests,
                "Simulation failed"
            );
        }
        Ok(result)
    }
}

fn format_progress_line(position: usize, total: usize, persona: &Persona, code: &str, outcome: &TrialOutcome) -> String {
    match outcome {
        TrialOutcome::Completed(result) => format!(
            "[{}/{}] {} × {} {} {}/{} ({}ms)",
            position,
            total,
            persona.display_name,
            code,
            if result.summary.passed { "✓" } else { "✗" },
            result.summary.passed_tests,
            result.summary.total_tests,
            result.duration_ms
        ),
        TrialOutcome::Failed { error, .. } => format!(
            "[{}/{}] {} × {} ✗ error: {}",
            position, total, persona.display_name, code, error
        ),
    }
}
