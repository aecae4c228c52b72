//! Capability traits and export helpers for sigflow plugin authors.

pub mod component;
pub mod export;
pub mod prelude;

/// Error model shared with the engine.
pub mod errors {
    pub use sigflow_types::error::{ComponentError, ErrorCategory};
}

pub use component::{Component, Extractor, Loader, Transformer};
pub use sigflow_types::{record_count, LoadResult, NormalizedData, Params, RawData};
