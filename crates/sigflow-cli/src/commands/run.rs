use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};

use sigflow_engine::{orchestrator, ComponentCatalog, Environment, ExecutionOptions, RunReport};

/// Execute the `run` command: load signals, run them, print the report.
///
/// Configuration errors abort before any signal runs; everything else ends
/// up in the report and the exit code.
pub async fn execute(
    config: &[PathBuf],
    selected: &[String],
    dry_run: bool,
    json: bool,
) -> Result<ExitCode> {
    let signals = orchestrator::load_signals(config, selected)?;
    if signals.is_empty() {
        tracing::warn!("No signals configured");
    }

    let catalog = ComponentCatalog::with_builtins();
    let env = Environment::capture();
    let options = ExecutionOptions { dry_run };
    let report = orchestrator::run_signals(&signals, &catalog, &env, &options).await;

    if json {
        let out = serde_json::to_string_pretty(&report).context("Failed to serialize run report")?;
        println!("{out}");
    } else {
        print_report(&report);
    }

    let code = report.exit_code();
    Ok(ExitCode::from(u8::try_from(code).unwrap_or(1)))
}

fn print_report(report: &RunReport) {
    for outcome in &report.outcomes {
        println!("{}", outcome.line());
        for warning in &outcome.warnings {
            println!("         warning: {warning}");
        }
        if let Some(preview) = &outcome.preview {
            match serde_json::to_string_pretty(preview) {
                Ok(text) => {
                    for line in text.lines() {
                        println!("         {line}");
                    }
                }
                Err(e) => println!("         (preview unavailable: {e})"),
            }
        }
    }
    println!();
    println!("{}", report.summary());
}
