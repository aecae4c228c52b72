//! Picks a single key out of a flat quote object.
//!
//! Useful when several signals come from the same response, e.g. CoinGecko's
//! `usd`, `usd_market_cap` and `usd_24h_vol`.

use serde::Deserialize;
use serde_json::json;
use sigflow_sdk::prelude::*;

use super::today;

pub const MODULE: &str = "sigflow_plugins::transform::key";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub key: String,
    /// Overrides the units inferred from the key name.
    #[serde(default)]
    pub units: Option<String>,
}

pub struct KeyTransformer {
    key: String,
    units: String,
}

impl Component for KeyTransformer {
    type Config = Config;
    const CLASS: &'static str = "KeyTransformer";

    fn init(config: Self::Config) -> Result<Self, ComponentError> {
        if config.key.trim().is_empty() {
            return Err(ComponentError::config(
                "MISSING_KEY",
                "KeyTransformer requires a non-empty 'key' parameter",
            ));
        }
        let units = config.units.unwrap_or_else(|| {
            if config.key.to_lowercase().contains("usd") {
                "USD".to_string()
            } else {
                String::new()
            }
        });
        Ok(Self {
            key: config.key,
            units,
        })
    }
}

impl Transformer for KeyTransformer {
    fn transform(&self, raw: RawData) -> Result<NormalizedData, ComponentError> {
        let value = raw.get(&self.key).cloned().ok_or_else(|| {
            ComponentError::data(
                "MISSING_FIELD",
                format!("KeyTransformer: key '{}' not found in data", self.key),
            )
        })?;

        Ok(json!({
            "date": today(),
            "value": value,
            "units": self.units,
        }))
    }
}
