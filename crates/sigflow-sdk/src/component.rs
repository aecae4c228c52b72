//! Capability traits implemented by extractors, transformers and loaders.

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::errors::ComponentError;
use crate::{LoadResult, NormalizedData, Params, RawData};

/// Fetches raw data from an external source.
///
/// `fetch` takes no runtime arguments: everything it needs arrives through
/// construction-time parameters.
#[async_trait]
pub trait Extractor: Send {
    async fn fetch(&mut self) -> Result<RawData, ComponentError>;

    /// Release sessions or handles held by the extractor.
    async fn close(&mut self) -> Result<(), ComponentError> {
        Ok(())
    }
}

/// Normalizes raw data into a signal's canonical shape.
///
/// Transformers are synchronous and must not perform I/O.
pub trait Transformer: Send {
    fn transform(&self, raw: RawData) -> Result<NormalizedData, ComponentError>;
}

/// Persists normalized data to a sink.
#[async_trait]
pub trait Loader: Send {
    async fn load(&mut self, data: &NormalizedData) -> Result<LoadResult, ComponentError>;
}

/// A concrete component class constructed from typed parameters.
///
/// The merged parameter map is deserialized into [`Component::Config`]
/// before [`Component::init`] runs, so unknown keys are ignored and missing
/// required keys surface as a `config` error.
pub trait Component: Sized + Send + 'static {
    type Config: DeserializeOwned;

    /// Class name under which the component is exported from its module.
    const CLASS: &'static str;

    fn init(config: Self::Config) -> Result<Self, ComponentError>;

    /// Lowest-precedence parameter layer.
    fn defaults() -> Params {
        Params::new()
    }
}

/// Deserialize merged parameters into a typed config.
///
/// # Errors
///
/// Returns a `config` error describing the first field that failed.
pub fn parse_params<C: DeserializeOwned>(class: &str, params: Params) -> Result<C, ComponentError> {
    serde_json::from_value(serde_json::Value::Object(params)).map_err(|e| {
        ComponentError::config("INVALID_PARAMS", format!("{class}: invalid parameters: {e}"))
    })
}
