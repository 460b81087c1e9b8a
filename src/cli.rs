//! CLI argument parsing using clap v4
//!
//! The harness runs unattended from cron/CI, so parsing is forgiving:
//! unknown tokens are dropped before clap sees them, and anything clap
//! still rejects falls back to the defaults. Only `--help` and
//! `--version` short-circuit.

use std::ffi::OsStr;

use clap::error::ErrorKind;
use clap::Parser;
use serde::{Deserialize, Serialize};

use crate::tiers::TierRegistry;
use crate::version;

const BIN_NAME: &str = "nightly-sim";

/// Flags that take a value
const VALUE_FLAGS: &[&str] = &["--models", "--maestri", "--config", "--report-dir"];

/// Flags that stand alone
const SWITCH_FLAGS: &[&str] = &["--verbose", "--dry-run", "--quiet", "--help", "-h", "--version", "-V"];

/// Nightly persona simulation - probes every persona against every model tier
///
/// Runs a fixed battery of questions for each (persona x tier) pair, applies
/// lexical safety checks, writes reports/nightly-sim-<date>.json and exits
/// non-zero if any simulation failed.
#[derive(Parser, Debug, Clone, Default, PartialEq, Eq)]
#[command(name = "nightly-sim")]
#[command(author, version, long_version = version::LONG_VERSION, about, long_about = None)]
#[command(args_override_self = true)]
pub struct Cli {
    /// Comma-separated tier codes to run (default: every tier)
    #[arg(long, value_name = "CSV", allow_hyphen_values = true)]
    pub models: Option<String>,

    /// Comma-separated persona ids to run (default: every persona)
    #[arg(long, value_name = "CSV", allow_hyphen_values = true)]
    pub maestri: Option<String>,

    /// Print one line per query and enable debug logging
    #[arg(long)]
    pub verbose: bool,

    /// Run the full sweep but write nothing to disk
    #[arg(long)]
    pub dry_run: bool,

    /// Path to configuration file
    #[arg(long, env = "NIGHTLY_SIM_CONFIG")]
    pub config: Option<String>,

    /// Directory for the JSON report (overrides [report] dir)
    #[arg(long, value_name = "DIR")]
    pub report_dir: Option<String>,

    /// Only log errors
    #[arg(long)]
    pub quiet: bool,
}

/// Immutable settings for one sweep
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunConfiguration {
    /// Tier codes in run order; duplicates are kept
    pub selected_tiers: Vec<String>,
    /// Persona ids in run order; empty means every persona
    pub selected_maestri_ids: Vec<String>,
    pub verbose: bool,
    pub dry_run: bool,
}

impl Cli {
    /// Parse `args` (without the program name) tolerantly.
    ///
    /// `Err` is returned only for help/version requests, which the caller
    /// should display with `clap::Error::exit`.
    pub fn try_parse_lenient<S: AsRef<OsStr>>(args: &[S]) -> Result<Self, clap::Error> {
        let argv = std::iter::once(BIN_NAME.to_string()).chain(sanitize_args(args));
        match Cli::try_parse_from(argv) {
            Ok(cli) => Ok(cli),
            Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => Err(e),
            Err(_) => Ok(Cli::default()),
        }
    }

    /// Resolve the run configuration, defaulting tiers to the whole table.
    pub fn run_configuration(&self, tiers: &TierRegistry) -> RunConfiguration {
        RunConfiguration {
            selected_tiers: self
                .models
                .as_deref()
                .map(split_csv)
                .unwrap_or_else(|| tiers.codes()),
            selected_maestri_ids: self.maestri.as_deref().map(split_csv).unwrap_or_default(),
            verbose: self.verbose,
            dry_run: self.dry_run,
        }
    }
}

/// Parse `args` straight into a run configuration. Never fails.
pub fn parse<S: AsRef<OsStr>>(args: &[S], tiers: &TierRegistry) -> RunConfiguration {
    Cli::try_parse_lenient(args)
        .unwrap_or_default()
        .run_configuration(tiers)
}

/// Keep only recognized flags (and their values).
///
/// A value flag with no following value, or followed by another `--flag`,
/// is dropped. Tokens that are not valid UTF-8 are never recognized.
fn sanitize_args<S: AsRef<OsStr>>(args: &[S]) -> Vec<String> {
    let mut kept = Vec::with_capacity(args.len());
    let mut iter = args.iter().map(|a| a.as_ref().to_str()).peekable();

    while let Some(token) = iter.next() {
        let Some(arg) = token else {
            continue;
        };

        if let Some((flag, _)) = arg.split_once('=') {
            if arg.starts_with("--") && VALUE_FLAGS.contains(&flag) {
                kept.push(arg.to_string());
            }
            continue;
        }

        if VALUE_FLAGS.contains(&arg) {
            if let Some(Some(value)) = iter.peek().copied() {
                if !value.starts_with("--") {
                    kept.push(arg.to_string());
                    kept.push(value.to_string());
                    iter.next();
                }
            }
        } else if SWITCH_FLAGS.contains(&arg) {
            kept.push(arg.to_string());
        }
    }

    kept
}

/// Split a comma list, trimming entries and dropping empty ones.
fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
