//! Per-signal outcomes and the batch run report.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use serde_json::Value;
use sigflow_sdk::errors::ErrorCategory;

use crate::error::{ErrorKind, PipelineError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Success,
    Partial,
    Failed,
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Success => "OK",
            Self::Partial => "PARTIAL",
            Self::Failed => "FAILED",
        })
    }
}

/// Pipeline stage a signal reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Extract,
    Transform,
    Load,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Extract => "extract",
            Self::Transform => "transform",
            Self::Load => "load",
        })
    }
}

/// Error summary carried in an outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutcomeError {
    pub kind: ErrorKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<ErrorCategory>,
    pub message: String,
}

impl From<&PipelineError> for OutcomeError {
    fn from(err: &PipelineError) -> Self {
        Self {
            kind: err.kind(),
            category: err.category(),
            message: err.to_string(),
        }
    }
}

/// Result of one loader within a signal run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoaderOutcome {
    /// Alias or `module.class` of the loader.
    pub loader: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records_written: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<OutcomeError>,
}

impl LoaderOutcome {
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Overall status from per-loader results: no loaders or no failures is a
/// success, some failures a partial, all failures a failure.
#[must_use]
pub fn classify_loads(loaders: &[LoaderOutcome]) -> OutcomeStatus {
    let failed = loaders.iter().filter(|l| !l.succeeded()).count();
    match failed {
        0 => OutcomeStatus::Success,
        n if n == loaders.len() => OutcomeStatus::Failed,
        _ => OutcomeStatus::Partial,
    }
}

fn serialize_secs<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}

/// Result of running one signal. Built by the runner, never changed after.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub signal_name: String,
    pub status: OutcomeStatus,
    pub stage_reached: Stage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<OutcomeError>,
    #[serde(rename = "duration_secs", serialize_with = "serialize_secs")]
    pub duration: Duration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records_processed: Option<u64>,
    pub loaders: Vec<LoaderOutcome>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    /// Normalized data, dry runs only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<Value>,
}

impl RunOutcome {
    /// One summary line: `OK name`, `PARTIAL name (load): reason`, ...
    #[must_use]
    pub fn line(&self) -> String {
        let secs = self.duration.as_secs_f64();
        match (&self.status, &self.error) {
            (OutcomeStatus::Success, _) => {
                let records = self
                    .records_processed
                    .map(|n| format!(", {n} record(s)"))
                    .unwrap_or_default();
                format!("{:8} {} ({secs:.2}s{records})", self.status, self.signal_name)
            }
            (_, Some(err)) => format!(
                "{:8} {} at {} ({secs:.2}s): {}",
                self.status, self.signal_name, self.stage_reached, err.message
            ),
            (_, None) => format!(
                "{:8} {} at {} ({secs:.2}s)",
                self.status, self.signal_name, self.stage_reached
            ),
        }
    }
}

/// Counts and problems derived from a [`RunReport`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub succeeded: usize,
    pub partial: usize,
    pub failed: usize,
    #[serde(rename = "duration_secs", serialize_with = "serialize_secs")]
    pub total_duration: Duration,
    /// `(signal_name, message)` for every partial or failed signal.
    pub problems: Vec<(String, String)>,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} signal(s): {} succeeded, {} partial, {} failed in {:.2}s",
            self.total,
            self.succeeded,
            self.partial,
            self.failed,
            self.total_duration.as_secs_f64()
        )
    }
}

/// Outcomes of a batch in completion order.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    pub dry_run: bool,
    pub outcomes: Vec<RunOutcome>,
}

impl RunReport {
    #[must_use]
    pub fn start(dry_run: bool) -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            dry_run,
            outcomes: Vec::new(),
        }
    }

    pub fn record(&mut self, outcome: RunOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    #[must_use]
    pub fn summary(&self) -> RunSummary {
        let count = |status| self.outcomes.iter().filter(|o| o.status == status).count();
        RunSummary {
            total: self.outcomes.len(),
            succeeded: count(OutcomeStatus::Success),
            partial: count(OutcomeStatus::Partial),
            failed: count(OutcomeStatus::Failed),
            total_duration: self.outcomes.iter().map(|o| o.duration).sum(),
            problems: self
                .outcomes
                .iter()
                .filter(|o| o.status != OutcomeStatus::Success)
                .map(|o| {
                    let message = o
                        .error
                        .as_ref()
                        .map_or_else(|| o.status.to_string(), |e| e.message.clone());
                    (o.signal_name.clone(), message)
                })
                .collect(),
        }
    }

    /// 0 when every signal succeeded, 1 when any failed, 2 when there were
    /// partial outcomes but no failures.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        let summary = self.summary();
        if summary.failed > 0 {
            1
        } else if summary.partial > 0 {
            2
        } else {
            0
        }
    }

    #[must_use]
    pub fn outcome(&self, signal_name: &str) -> Option<&RunOutcome> {
        self.outcomes.iter().find(|o| o.signal_name == signal_name)
    }
}
