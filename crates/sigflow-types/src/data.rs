//! Payload types exchanged between pipeline stages.

use serde::{Deserialize, Serialize};

/// Opaque structured value produced by an extractor.
pub type RawData = serde_json::Value;

/// Canonical signal shape produced by a transformer (or passed through raw).
pub type NormalizedData = serde_json::Value;

/// Constructor parameters for a component.
pub type Params = serde_json::Map<String, serde_json::Value>;

/// Outcome of a single loader write.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadResult {
    pub records_written: u64,
}

impl LoadResult {
    #[must_use]
    pub fn written(records_written: u64) -> Self {
        Self { records_written }
    }
}

/// Number of records carried by a normalized payload.
///
/// Arrays count their elements, `null` counts as nothing, anything else is
/// a single record.
#[must_use]
pub fn record_count(data: &NormalizedData) -> u64 {
    match data {
        serde_json::Value::Null => 0,
        serde_json::Value::Array(items) => items.len() as u64,
        _ => 1,
    }
}
