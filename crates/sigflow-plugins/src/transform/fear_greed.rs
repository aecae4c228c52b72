//! Normalizes the Alternative.me Fear & Greed payload.

use serde::Deserialize;
use serde_json::{json, Value};
use sigflow_sdk::prelude::*;

use super::unix_timestamp;

pub const MODULE: &str = "sigflow_plugins::transform::fear_greed";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {}

/// Emits `{date, value, units: "index", classification, metadata}` for the
/// most recent reading.
pub struct FearGreedTransformer;

impl Component for FearGreedTransformer {
    type Config = Config;
    const CLASS: &'static str = "FearGreedTransformer";

    fn init(_config: Self::Config) -> Result<Self, ComponentError> {
        Ok(Self)
    }
}

impl Transformer for FearGreedTransformer {
    fn transform(&self, raw: RawData) -> Result<NormalizedData, ComponentError> {
        let latest = raw
            .get("data")
            .and_then(Value::as_array)
            .and_then(|readings| readings.first())
            .ok_or_else(|| {
                ComponentError::data(
                    "EMPTY_READINGS",
                    "FearGreedTransformer: invalid or empty 'data' array",
                )
            })?;

        let value = match latest.get("value") {
            Some(Value::Number(n)) => n.as_i64(),
            Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        let classification = latest.get("value_classification").and_then(Value::as_str);
        let timestamp = latest.get("timestamp").and_then(unix_timestamp);

        let (Some(value), Some(classification), Some(timestamp)) = (value, classification, timestamp)
        else {
            return Err(ComponentError::data(
                "MISSING_FIELD",
                format!(
                    "FearGreedTransformer: missing value, value_classification or timestamp in {latest}"
                ),
            ));
        };

        Ok(json!({
            "date": timestamp.date_naive().to_string(),
            "value": value,
            "units": "index",
            "classification": classification,
            "metadata": {
                "source": "alternative.me",
                "last_updated_at_source": timestamp.to_rfc3339(),
            },
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_latest_reading() {
        let raw = json!({
            "data": [
                {"value": "72", "value_classification": "Greed", "timestamp": "1704067200"},
                {"value": "10", "value_classification": "Extreme Fear", "timestamp": "1703980800"}
            ]
        });
        let out = FearGreedTransformer.transform(raw).unwrap();
        assert_eq!(out["value"], 72);
        assert_eq!(out["classification"], "Greed");
        assert_eq!(out["date"], "2024-01-01");
        assert_eq!(out["units"], "index");
        assert_eq!(out["metadata"]["source"], "alternative.me");
    }

    #[test]
    fn missing_classification_is_data_error() {
        let raw = json!({"data": [{"value": "72", "timestamp": "1704067200"}]});
        let err = FearGreedTransformer.transform(raw).unwrap_err();
        assert_eq!(err.category, ErrorCategory::Data);
        assert_eq!(err.code, "MISSING_FIELD");
    }

    #[test]
    fn empty_payload_is_data_error() {
        let err = FearGreedTransformer.transform(json!({"data": []})).unwrap_err();
        assert_eq!(err.code, "EMPTY_READINGS");
    }
}
