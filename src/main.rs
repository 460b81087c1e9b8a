//! Nightly persona simulation - entry point
//!
//! Runs the full (persona x tier) sweep against the configured chat backend,
//! writes the nightly report and exits 0 only when every simulation passed.

use std::ffi::OsString;
use std::path::Path;
use std::sync::Arc;

use tracing::info;

use nightly_sim::backend::OllamaBackend;
use nightly_sim::cli::Cli;
use nightly_sim::config::HarnessConfig;
use nightly_sim::error::{Error, Result};
use nightly_sim::orchestrator::SweepOrchestrator;
use nightly_sim::persona::{PersonaLookup, PersonaRegistry};
use nightly_sim::queries::QueryCatalog;
use nightly_sim::report::{self, ReportWriter};
use nightly_sim::trial::TrialExecutor;
use nightly_sim::{logging, version};

fn main() {
    let args: Vec<OsString> = std::env::args_os().skip(1).collect();

    // Only --help and --version come back as errors
    let cli = match Cli::try_parse_lenient(&args) {
        Ok(cli) => cli,
        Err(e) => e.exit(),
    };

    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprint!("{}", e.format_for_terminal());
            std::process::exit(1);
        }
    }
}

/// Run one nightly sweep and return the process exit code
fn run(cli: Cli) -> Result<i32> {
    let config = HarnessConfig::load(cli.config.as_deref())?;

    // The guards must be kept alive until the report is out
    let _log_guards = logging::init_logging(&config.logging, cli.verbose, cli.quiet)?;

    let build = version::build_info();
    info!(
        version = %build.full_version(),
        target = %build.target,
        profile = %build.profile,
        "Starting nightly simulation"
    );

    let personas: Arc<dyn PersonaLookup> = Arc::new(match config.personas.dir {
        Some(ref dir) => PersonaRegistry::from_dir(Path::new(dir))?,
        None => PersonaRegistry::bundled()?,
    });

    let tiers = config.tier_registry();
    let run_config = cli.run_configuration(&tiers);
    info!(
        tiers = ?run_config.selected_tiers,
        maestri = ?run_config.selected_maestri_ids,
        dry_run = run_config.dry_run,
        "Run configuration resolved"
    );

    let backend = Arc::new(OllamaBackend::new(config.backend.ollama_config())?);
    let executor = TrialExecutor::new(backend, Arc::new(QueryCatalog::standard()))
        .with_max_response_chars(config.report.max_response_chars);
    let orchestrator = SweepOrchestrator::new(executor, tiers, personas);

    // Trials run one after another; a single thread is all the sweep needs
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| Error::Execution(format!("Failed to create runtime: {}", e)))?;
    let report = runtime.block_on(orchestrator.run(&run_config));

    let report_dir = cli.report_dir.unwrap_or(config.report.dir);
    let outcome = report::persist(&report, run_config.dry_run, &ReportWriter::new(report_dir));

    print!("{}", report::render_summary(&report, &outcome));
    Ok(report::exit_code(&report))
}
