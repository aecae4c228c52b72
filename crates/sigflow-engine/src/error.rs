//! Pipeline error taxonomy.

use serde::{Deserialize, Serialize};
use sigflow_sdk::errors::{ComponentError, ErrorCategory};

/// Everything that can go wrong while running a batch of signals.
///
/// `Config` is the only fatal variant: it aborts the batch before any signal
/// runs. Every other variant is caught at the signal boundary and recorded
/// in that signal's outcome.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Structural configuration problem.
    #[error("{0:#}")]
    Config(anyhow::Error),

    #[error("missing secret(s): {}", names.join(", "))]
    MissingSecret { names: Vec<String> },

    #[error("unknown component alias '{alias}'")]
    UnknownAlias { alias: String },

    #[error("cannot load component {reference}: {reason}")]
    ComponentLoad { reference: String, reason: String },

    #[error("failed to initialize {reference}: {source}")]
    ComponentInit {
        reference: String,
        #[source]
        source: ComponentError,
    },

    #[error("extract failed: {0}")]
    Extract(#[source] ComponentError),

    #[error("transform failed: {0}")]
    Transform(#[source] ComponentError),

    #[error("loader {loader} failed: {source}")]
    Load {
        loader: String,
        #[source]
        source: ComponentError,
    },

    /// A component panicked instead of returning an error.
    #[error("{component} panicked: {message}")]
    Panicked { component: String, message: String },
}

impl From<anyhow::Error> for PipelineError {
    fn from(e: anyhow::Error) -> Self {
        Self::Config(e)
    }
}

/// Serializable tag for a [`PipelineError`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Config,
    MissingSecret,
    UnknownAlias,
    ComponentLoad,
    ComponentInit,
    Extract,
    Transform,
    Load,
    Panicked,
}

impl PipelineError {
    /// Only configuration errors abort the batch.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::Config,
            Self::MissingSecret { .. } => ErrorKind::MissingSecret,
            Self::UnknownAlias { .. } => ErrorKind::UnknownAlias,
            Self::ComponentLoad { .. } => ErrorKind::ComponentLoad,
            Self::ComponentInit { .. } => ErrorKind::ComponentInit,
            Self::Extract(_) => ErrorKind::Extract,
            Self::Transform(_) => ErrorKind::Transform,
            Self::Load { .. } => ErrorKind::Load,
            Self::Panicked { .. } => ErrorKind::Panicked,
        }
    }

    /// The wrapped component error, if any.
    #[must_use]
    pub fn component_error(&self) -> Option<&ComponentError> {
        match self {
            Self::ComponentInit { source, .. } | Self::Load { source, .. } => Some(source),
            Self::Extract(e) | Self::Transform(e) => Some(e),
            _ => None,
        }
    }

    #[must_use]
    pub fn category(&self) -> Option<ErrorCategory> {
        match self {
            Self::Panicked { .. } => Some(ErrorCategory::Internal),
            _ => self.component_error().map(|e| e.category),
        }
    }
}
