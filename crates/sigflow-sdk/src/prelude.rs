//! Convenience re-exports for plugin authors.
//!
//! ```ignore
//! use sigflow_sdk::prelude::*;
//! ```

// Capability traits
pub use crate::component::{parse_params, Component, Extractor, Loader, Transformer};

// Export tables
pub use crate::export::{AliasEntry, ClassExport, Constructor, ModuleExport, Role};

// Errors
pub use crate::errors::{ComponentError, ErrorCategory};

// Payloads
pub use crate::{record_count, LoadResult, NormalizedData, Params, RawData};

pub use async_trait::async_trait;
