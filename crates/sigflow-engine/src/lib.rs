//! Signal pipeline engine: configuration store, secret and template
//! resolution, component catalog, per-signal runner and batch report.

pub mod config;
pub mod env;
pub mod error;
pub mod execution;
pub mod orchestrator;
pub mod resolve;
pub mod result;
pub mod runner;
pub mod secrets;
pub mod template;

// Re-export public API for convenience
pub use config::{ComponentRef, ComponentSpec, SignalDefinition, SignalStore};
pub use env::Environment;
pub use error::{ErrorKind, PipelineError};
pub use execution::ExecutionOptions;
pub use orchestrator::{check_signals, load_signals, run_batch, run_signals};
pub use resolve::{AliasInfo, ComponentCatalog};
pub use result::{LoaderOutcome, OutcomeStatus, RunOutcome, RunReport, RunSummary, Stage};
pub use runner::{SignalCheck, SignalRunner, SignalState};
