//! Batch orchestration: load the store, run or check the selected signals.

use std::path::PathBuf;

use crate::config::{SignalDefinition, SignalStore};
use crate::env::Environment;
use crate::error::PipelineError;
use crate::execution::ExecutionOptions;
use crate::resolve::ComponentCatalog;
use crate::result::RunReport;
use crate::runner::{SignalCheck, SignalRunner};

/// Load the configured fragments and pick the signals to work on.
///
/// # Errors
///
/// Returns [`PipelineError::Config`] for any structural problem, including
/// unknown signal names in `selected`.
pub fn load_signals(paths: &[PathBuf], selected: &[String]) -> Result<Vec<SignalDefinition>, PipelineError> {
    let store = SignalStore::load(paths)?;
    let signals = store.select(selected)?;
    Ok(signals.into_iter().cloned().collect())
}

/// Run signals one after another in the given order. Per-signal failures
/// are recorded in the report and never stop the batch.
pub async fn run_signals(
    signals: &[SignalDefinition],
    catalog: &ComponentCatalog,
    env: &Environment,
    options: &ExecutionOptions,
) -> RunReport {
    let runner = SignalRunner::new(catalog, env, options);
    let mut report = RunReport::start(options.dry_run);
    tracing::info!(signals = signals.len(), dry_run = options.dry_run, "Starting run");

    for signal in signals {
        let outcome = runner.run(signal).await;
        report.record(outcome);
    }

    report.finish();
    let summary = report.summary();
    tracing::info!(
        total = summary.total,
        succeeded = summary.succeeded,
        partial = summary.partial,
        failed = summary.failed,
        duration_ms = summary.total_duration.as_millis() as u64,
        "Run complete"
    );
    report
}

/// Load configuration and run the selected signals.
///
/// # Errors
///
/// Only configuration errors are returned; they happen before any signal
/// runs.
pub async fn run_batch(
    paths: &[PathBuf],
    selected: &[String],
    catalog: &ComponentCatalog,
    env: &Environment,
    options: &ExecutionOptions,
) -> Result<RunReport, PipelineError> {
    let signals = load_signals(paths, selected)?;
    Ok(run_signals(&signals, catalog, env, options).await)
}

/// Resolve every component of each signal without running it.
#[must_use]
pub fn check_signals(
    signals: &[SignalDefinition],
    catalog: &ComponentCatalog,
    env: &Environment,
) -> Vec<SignalCheck> {
    let options = ExecutionOptions::default();
    let runner = SignalRunner::new(catalog, env, &options);
    signals
        .iter()
        .map(|signal| {
            let check = runner.check(signal);
            if check.ok() {
                tracing::debug!(signal = signal.name, "Check passed");
            } else {
                tracing::warn!(signal = signal.name, problems = check.problems.len(), "Check failed");
            }
            check
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_selection_is_fatal_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("signals.yaml");
        std::fs::write(&path, "a:\n  extractor: x\n").unwrap();

        let err = load_signals(&[path], &["b".into()]).unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("Unknown signal(s): b"));
    }

    #[test]
    fn malformed_yaml_is_fatal_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("signals.yaml");
        std::fs::write(&path, "a: [unclosed\n").unwrap();

        let err = load_signals(&[path.clone()], &[]).unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains(&path.display().to_string()));
    }

    #[tokio::test]
    async fn empty_selection_runs_nothing() {
        let report = run_signals(
            &[],
            &ComponentCatalog::with_builtins(),
            &Environment::default(),
            &ExecutionOptions::default(),
        )
        .await;
        assert!(report.outcomes.is_empty());
        assert_eq!(report.exit_code(), 0);
        assert!(report.finished_at.is_some());
    }
}
