//! Runs a single signal: prepare, extract, transform, load.
//!
//! Every error is turned into the signal's [`RunOutcome`] here; nothing is
//! re-raised to the caller. Component panics are caught and recorded the
//! same way.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Instant;

use futures_util::FutureExt;
use serde::Serialize;
use serde_json::Value;
use sigflow_sdk::record_count;

use crate::config::SignalDefinition;
use crate::env::Environment;
use crate::error::{ErrorKind, PipelineError};
use crate::execution::ExecutionOptions;
use crate::resolve::ComponentCatalog;
use crate::result::{
    classify_loads, LoaderOutcome, OutcomeError, OutcomeStatus, RunOutcome, Stage,
};
use crate::secrets::{resolve_secrets, ResolvedSecrets};
use crate::template::{render_spec, RenderedSpec};

/// Lifecycle of one signal run. Terminal states are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalState {
    Pending,
    Extracting,
    ExtractFailed,
    Transforming,
    TransformFailed,
    Loading,
    LoadFailed,
    Partial,
    Success,
}

impl SignalState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::ExtractFailed | Self::TransformFailed | Self::LoadFailed | Self::Partial | Self::Success
        )
    }

    /// States reachable in one step.
    #[must_use]
    pub fn can_advance_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Extracting)
                | (Self::Extracting, Self::ExtractFailed | Self::Transforming)
                | (Self::Transforming, Self::TransformFailed | Self::Loading)
                | (Self::Loading, Self::LoadFailed | Self::Partial | Self::Success)
        )
    }

    /// The failure state of the stage this state belongs to.
    #[must_use]
    pub fn failed(self) -> Self {
        match self.stage() {
            Stage::Extract => Self::ExtractFailed,
            Stage::Transform => Self::TransformFailed,
            Stage::Load => Self::LoadFailed,
        }
    }

    fn stage(self) -> Stage {
        match self {
            Self::Pending | Self::Extracting | Self::ExtractFailed => Stage::Extract,
            Self::Transforming | Self::TransformFailed => Stage::Transform,
            Self::Loading | Self::LoadFailed | Self::Partial | Self::Success => Stage::Load,
        }
    }
}

/// A signal's specs rendered against the environment plus its secrets.
#[derive(Debug, Clone)]
pub(crate) struct PreparedSignal {
    pub extractor: RenderedSpec,
    pub transformer: Option<RenderedSpec>,
    pub loaders: Vec<RenderedSpec>,
    pub secrets: ResolvedSecrets,
}

/// Render every spec and resolve secrets. Missing secrets and missing
/// template variables are reported together, secrets first.
pub(crate) fn prepare(
    signal: &SignalDefinition,
    env: &Environment,
) -> Result<PreparedSignal, PipelineError> {
    let mut missing_vars = Vec::new();
    let extractor = render_spec(&signal.extractor, env, &mut missing_vars);
    let transformer = signal
        .transformer
        .as_ref()
        .map(|spec| render_spec(spec, env, &mut missing_vars));
    let loaders: Vec<RenderedSpec> = signal
        .loaders
        .iter()
        .map(|spec| render_spec(spec, env, &mut missing_vars))
        .collect();

    let (secrets, mut missing) = match resolve_secrets(&signal.secrets, &signal.secret_mapping, env) {
        Ok(secrets) => (secrets, Vec::new()),
        Err(PipelineError::MissingSecret { names }) => (ResolvedSecrets::default(), names),
        Err(other) => return Err(other),
    };
    for name in missing_vars {
        if !missing.contains(&name) {
            missing.push(name);
        }
    }
    if !missing.is_empty() {
        return Err(PipelineError::MissingSecret { names: missing });
    }

    Ok(PreparedSignal {
        extractor,
        transformer,
        loaders,
        secrets,
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string())
}

/// Run `f`, turning a panic into [`PipelineError::Panicked`].
fn guarded<T>(
    component: &str,
    f: impl FnOnce() -> Result<T, PipelineError>,
) -> Result<T, PipelineError> {
    std::panic::catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|payload| {
        Err(PipelineError::Panicked {
            component: component.to_string(),
            message: panic_message(payload.as_ref()),
        })
    })
}

/// Problems found by a dry resolution of one signal.
#[derive(Debug, Clone, Serialize)]
pub struct SignalCheck {
    pub signal_name: String,
    pub problems: Vec<String>,
}

impl SignalCheck {
    #[must_use]
    pub fn ok(&self) -> bool {
        self.problems.is_empty()
    }
}

/// How a run ended, before timing is attached.
struct Ending {
    status: OutcomeStatus,
    error: Option<OutcomeError>,
    preview: Option<Value>,
}

/// Bookkeeping for one run: state, timing, warnings and loader results.
struct Tracker<'s> {
    signal: &'s str,
    state: SignalState,
    started: Instant,
    warnings: Vec<String>,
    loaders: Vec<LoaderOutcome>,
    records_processed: Option<u64>,
}

impl<'s> Tracker<'s> {
    fn new(signal: &'s str) -> Self {
        Self {
            signal,
            state: SignalState::Pending,
            started: Instant::now(),
            warnings: Vec::new(),
            loaders: Vec::new(),
            records_processed: None,
        }
    }

    fn advance(&mut self, next: SignalState) {
        debug_assert!(
            self.state.can_advance_to(next),
            "invalid transition {:?} -> {next:?}",
            self.state
        );
        tracing::debug!(signal = self.signal, from = ?self.state, to = ?next, "Signal state changed");
        self.state = next;
    }

    fn warn(&mut self, message: String) {
        tracing::warn!(signal = self.signal, "{message}");
        self.warnings.push(message);
    }

    /// Fail at the stage the run is currently in.
    fn fail(&mut self, err: &PipelineError) -> Ending {
        let terminal = self.state.failed();
        tracing::error!(signal = self.signal, stage = %terminal.stage(), error = %err, "Signal failed");
        if !self.state.is_terminal() {
            self.advance(terminal);
        }
        Ending {
            status: OutcomeStatus::Failed,
            error: Some(OutcomeError::from(err)),
            preview: None,
        }
    }

    fn finish(self, ending: Ending) -> RunOutcome {
        let duration = self.started.elapsed();
        tracing::info!(
            signal = self.signal,
            status = %ending.status,
            stage = %self.state.stage(),
            duration_ms = duration.as_millis() as u64,
            "Signal finished"
        );
        RunOutcome {
            signal_name: self.signal.to_string(),
            status: ending.status,
            stage_reached: self.state.stage(),
            error: ending.error,
            duration,
            records_processed: self.records_processed,
            loaders: self.loaders,
            warnings: self.warnings,
            preview: ending.preview,
        }
    }
}

/// Executes signals against a catalog and an environment snapshot.
pub struct SignalRunner<'a> {
    catalog: &'a ComponentCatalog,
    env: &'a Environment,
    options: &'a ExecutionOptions,
}

impl<'a> SignalRunner<'a> {
    #[must_use]
    pub fn new(
        catalog: &'a ComponentCatalog,
        env: &'a Environment,
        options: &'a ExecutionOptions,
    ) -> Self {
        Self {
            catalog,
            env,
            options,
        }
    }

    /// Run one signal to a terminal state.
    ///
    /// A component that panics fails the signal at the stage it was in,
    /// with an `internal` category.
    pub async fn run(&self, signal: &SignalDefinition) -> RunOutcome {
        let mut run = Tracker::new(&signal.name);
        run.advance(SignalState::Extracting);
        tracing::info!(signal = signal.name, "Running signal");

        let attempt = AssertUnwindSafe(self.execute(signal, &mut run))
            .catch_unwind()
            .await;
        let ending = match attempt {
            Ok(ending) => ending,
            Err(payload) => {
                let component = match run.state.stage() {
                    Stage::Extract => signal.extractor.reference.to_string(),
                    Stage::Transform => signal
                        .transformer
                        .as_ref()
                        .map_or_else(|| "transformer".to_string(), |t| t.reference.to_string()),
                    Stage::Load => "loaders".to_string(),
                };
                run.fail(&PipelineError::Panicked {
                    component,
                    message: panic_message(payload.as_ref()),
                })
            }
        };
        run.finish(ending)
    }

    async fn execute(&self, signal: &SignalDefinition, run: &mut Tracker<'_>) -> Ending {
        // Prepare counts as part of extraction.
        let prepared = match prepare(signal, self.env) {
            Ok(prepared) => prepared,
            Err(err) => return run.fail(&err),
        };
        let mut extractor = match self
            .catalog
            .resolve_extractor(&prepared.extractor, &prepared.secrets)
        {
            Ok(extractor) => extractor,
            Err(err) => return run.fail(&err),
        };

        let fetched = extractor.fetch().await;
        if let Err(err) = extractor.close().await {
            run.warn(format!("extractor close failed: {err}"));
        }
        drop(extractor);
        let raw = match fetched {
            Ok(raw) => raw,
            Err(err) => return run.fail(&PipelineError::Extract(err)),
        };

        run.advance(SignalState::Transforming);
        let mut data = match &prepared.transformer {
            Some(spec) => {
                let transformed = self
                    .catalog
                    .resolve_transformer(spec, &prepared.secrets)
                    .and_then(|t| t.transform(raw).map_err(PipelineError::Transform));
                match transformed {
                    Ok(data) => data,
                    Err(err) => return run.fail(&err),
                }
            }
            None => raw,
        };
        if let Value::Object(fields) = &mut data {
            fields.insert("signal_name".into(), Value::String(signal.name.clone()));
        }

        run.advance(SignalState::Loading);
        run.records_processed = Some(record_count(&data));

        if self.options.dry_run {
            run.warn(format!(
                "dry run: skipped {} loader(s)",
                prepared.loaders.len()
            ));
            run.advance(SignalState::Success);
            return Ending {
                status: OutcomeStatus::Success,
                error: None,
                preview: Some(data),
            };
        }
        if prepared.loaders.is_empty() {
            run.warn("no loaders configured; data was not persisted".to_string());
        }

        for spec in &prepared.loaders {
            let outcome = self.load_one(signal, spec, &prepared.secrets, &data).await;
            run.loaders.push(outcome);
        }

        let status = classify_loads(&run.loaders);
        let failures: Vec<&LoaderOutcome> = run.loaders.iter().filter(|l| !l.succeeded()).collect();
        let error = (!failures.is_empty()).then(|| OutcomeError {
            kind: ErrorKind::Load,
            category: failures
                .first()
                .and_then(|l| l.error.as_ref())
                .and_then(|e| e.category),
            message: format!(
                "{} of {} loader(s) failed: {}",
                failures.len(),
                run.loaders.len(),
                failures
                    .iter()
                    .filter_map(|l| l.error.as_ref().map(|e| e.message.as_str()))
                    .collect::<Vec<_>>()
                    .join("; ")
            ),
        });

        let terminal = match status {
            OutcomeStatus::Success => SignalState::Success,
            OutcomeStatus::Partial => SignalState::Partial,
            OutcomeStatus::Failed => SignalState::LoadFailed,
        };
        run.advance(terminal);
        Ending {
            status,
            error,
            preview: None,
        }
    }

    /// Resolve and run one loader. A panicking loader only fails itself.
    async fn load_one(
        &self,
        signal: &SignalDefinition,
        spec: &RenderedSpec,
        secrets: &ResolvedSecrets,
        data: &Value,
    ) -> LoaderOutcome {
        let label = spec.reference.to_string();
        let started = Instant::now();
        let attempt = AssertUnwindSafe(async {
            match self.catalog.resolve_loader(spec, secrets) {
                Ok(mut loader) => loader.load(data).await.map_err(|source| PipelineError::Load {
                    loader: label.clone(),
                    source,
                }),
                Err(err) => Err(err),
            }
        })
        .catch_unwind()
        .await;
        let result = attempt.unwrap_or_else(|payload| {
            Err(PipelineError::Panicked {
                component: label.clone(),
                message: panic_message(payload.as_ref()),
            })
        });

        let duration_ms = started.elapsed().as_millis() as u64;
        match result {
            Ok(written) => {
                tracing::info!(
                    signal = signal.name,
                    loader = label,
                    records = written.records_written,
                    duration_ms,
                    "Loader succeeded"
                );
                LoaderOutcome {
                    loader: label,
                    records_written: Some(written.records_written),
                    error: None,
                }
            }
            Err(err) => {
                tracing::error!(
                    signal = signal.name,
                    loader = label,
                    error = %err,
                    duration_ms,
                    "Loader failed"
                );
                LoaderOutcome {
                    loader: label,
                    records_written: None,
                    error: Some(OutcomeError::from(&err)),
                }
            }
        }
    }

    /// Resolve and construct every component of a signal without running
    /// anything.
    #[must_use]
    pub fn check(&self, signal: &SignalDefinition) -> SignalCheck {
        let mut problems = Vec::new();
        match prepare(signal, self.env) {
            Ok(prepared) => {
                let extractor = &prepared.extractor;
                if let Err(err) = guarded(&extractor.reference.to_string(), || {
                    self.catalog.resolve_extractor(extractor, &prepared.secrets)
                }) {
                    problems.push(format!("extractor: {err}"));
                }
                if let Some(spec) = &prepared.transformer {
                    if let Err(err) = guarded(&spec.reference.to_string(), || {
                        self.catalog.resolve_transformer(spec, &prepared.secrets)
                    }) {
                        problems.push(format!("transformer: {err}"));
                    }
                }
                for (i, spec) in prepared.loaders.iter().enumerate() {
                    if let Err(err) = guarded(&spec.reference.to_string(), || {
                        self.catalog.resolve_loader(spec, &prepared.secrets)
                    }) {
                        problems.push(format!("loaders[{i}]: {err}"));
                    }
                }
            }
            Err(err) => problems.push(err.to_string()),
        }
        SignalCheck {
            signal_name: signal.name.clone(),
            problems,
        }
    }
}
