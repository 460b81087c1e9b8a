//! Nightly report, persistence and exit policy
//!
//! The report is written to `<dir>/nightly-sim-<YYYY-MM-DD>.json` unless the
//! run is a dry run. Same-day runs overwrite the file. Persistence is best
//! effort: a write failure is logged and never changes the exit code.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::cli::RunConfiguration;
use crate::error::{Error, Result};
use crate::results::SimulationResult;

/// Run-level aggregate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub total_simulations: usize,
    pub passed_simulations: usize,
    pub failed_simulations: usize,
    pub total_duration_ms: u64,
}

/// The document written for one nightly run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NightlyReport {
    pub timestamp: DateTime<Utc>,
    /// Calendar date of the run start, UTC
    pub date: String,
    pub configuration: RunConfiguration,
    pub results: Vec<SimulationResult>,
    pub summary: RunSummary,
}

impl NightlyReport {
    pub fn new(
        started_at: DateTime<Utc>,
        configuration: RunConfiguration,
        results: Vec<SimulationResult>,
        summary: RunSummary,
    ) -> Self {
        Self {
            timestamp: started_at,
            date: started_at.format("%Y-%m-%d").to_string(),
            configuration,
            results,
            summary,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Writes reports into one directory
#[derive(Debug, Clone)]
pub struct ReportWriter {
    dir: PathBuf,
}

impl ReportWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Report path for a run date
    pub fn path_for(&self, date: &str) -> PathBuf {
        self.dir.join(format!("nightly-sim-{}.json", date))
    }

    /// Create the directory if needed and write the pretty-printed report.
    pub fn write(&self, report: &NightlyReport) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir).map_err(|e| Error::IoWrite {
            path: self.dir.clone(),
            source: e,
        })?;

        let path = self.path_for(&report.date);
        let json = report.to_json()?;
        fs::write(&path, json).map_err(|e| Error::IoWrite {
            path: path.clone(),
            source: e,
        })?;

        Ok(path)
    }
}

/// Where the report ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistOutcome {
    Written(PathBuf),
    DryRun,
    Failed(String),
}

/// Write the report unless `dry_run`. Failures are logged, never returned.
pub fn persist(report: &NightlyReport, dry_run: bool, writer: &ReportWriter) -> PersistOutcome {
    if dry_run {
        info!("Dry run, report not written");
        return PersistOutcome::DryRun;
    }

    match writer.write(report) {
        Ok(path) => {
            info!(path = %path.display(), "Report written");
            PersistOutcome::Written(path)
        }
        Err(e) => {
            error!(error = %e.format_for_log(), "Failed to write report");
            PersistOutcome::Failed(e.to_string())
        }
    }
}

/// Human summary block for stdout
pub fn render_summary(report: &NightlyReport, outcome: &PersistOutcome) -> String {
    let rule = "=".repeat(50);
    let report_line = match outcome {
        PersistOutcome::Written(path) => format!("Report:   {}", path.display()),
        PersistOutcome::DryRun => "Report:   not written (dry run)".to_string(),
        PersistOutcome::Failed(message) => format!("Report:   write failed ({})", message),
    };

    let s = &report.summary;
    format!(
        "\n{rule}\nNIGHTLY SIMULATION SUMMARY\n{rule}\n\
         Total:    {}\n\
         Passed:   {}\n\
         Failed:   {}\n\
         Duration: {:.1}s\n\
         {}\n\
         {rule}\n",
        s.total_simulations,
        s.passed_simulations,
        s.failed_simulations,
        s.total_duration_ms as f64 / 1000.0,
        report_line,
        rule = rule,
    )
}

/// 0 when no simulation failed, else 1
pub fn exit_code(report: &NightlyReport) -> i32 {
    if report.summary.failed_simulations == 0 {
        0
    } else {
        1
    }
}
