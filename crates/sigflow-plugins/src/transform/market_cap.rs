//! Total crypto market capitalisation from Alternative.me's global endpoint.

use serde::Deserialize;
use serde_json::json;
use sigflow_sdk::prelude::*;

use super::{lookup, today, unix_timestamp};

pub const MODULE: &str = "sigflow_plugins::transform::market_cap";

const MARKET_CAP_PATH: &str = "data.quotes.USD.total_market_cap";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {}

pub struct TotalMarketCapTransformer;

impl Component for TotalMarketCapTransformer {
    type Config = Config;
    const CLASS: &'static str = "TotalMarketCapTransformer";

    fn init(_config: Self::Config) -> Result<Self, ComponentError> {
        Ok(Self)
    }
}

impl Transformer for TotalMarketCapTransformer {
    fn transform(&self, raw: RawData) -> Result<NormalizedData, ComponentError> {
        let market_cap = lookup(Self::CLASS, &raw, MARKET_CAP_PATH)?;
        if !market_cap.is_number() {
            return Err(ComponentError::data(
                "INVALID_FIELD",
                format!("{}: '{MARKET_CAP_PATH}' is not a number", Self::CLASS),
            ));
        }

        let updated = raw
            .pointer("/data/last_updated")
            .and_then(unix_timestamp)
            .map_or_else(|| chrono::Utc::now().to_rfc3339(), |ts| ts.to_rfc3339());

        Ok(json!({
            "date": today(),
            "value": market_cap,
            "units": "USD",
            "metadata": {
                "source": "alternative.me",
                "last_updated_at_source": updated,
            },
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_total_market_cap() {
        let raw = json!({
            "data": {
                "quotes": {"USD": {"total_market_cap": 2.4e12}},
                "last_updated": 1704067200
            }
        });
        let out = TotalMarketCapTransformer.transform(raw).unwrap();
        assert_eq!(out["value"], 2.4e12);
        assert_eq!(out["units"], "USD");
        assert!(out["metadata"]["last_updated_at_source"]
            .as_str()
            .unwrap()
            .starts_with("2024-01-01T00:00:00"));
    }

    #[test]
    fn missing_quote_is_data_error() {
        let err = TotalMarketCapTransformer
            .transform(json!({"data": {"quotes": {}}}))
            .unwrap_err();
        assert_eq!(err.code, "MISSING_FIELD");
    }
}
