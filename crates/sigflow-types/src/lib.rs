//! Shared sigflow data and error model types.
//!
//! This crate is dependency-boundary-safe for both the engine and plugin
//! crates.

pub mod data;
pub mod error;

pub use data::{record_count, LoadResult, NormalizedData, Params, RawData};
pub use error::{ComponentError, ErrorCategory};
