//! Latest valid observation of a FRED series (M2 money supply by default).

use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use sigflow_sdk::prelude::*;

pub const MODULE: &str = "sigflow_plugins::transform::m2";

fn default_units() -> String {
    "USD".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_units")]
    pub units: String,
}

pub struct M2Transformer {
    units: String,
}

impl Component for M2Transformer {
    type Config = Config;
    const CLASS: &'static str = "M2Transformer";

    fn init(config: Self::Config) -> Result<Self, ComponentError> {
        Ok(Self {
            units: config.units,
        })
    }
}

impl M2Transformer {
    /// Most recent observation dated no later than `today` with a numeric
    /// value. FRED reports missing values as `"."`; those are skipped.
    fn latest(observations: &[Value], today: NaiveDate) -> Option<(NaiveDate, f64)> {
        observations
            .iter()
            .filter_map(|obs| {
                let date = obs.get("date")?.as_str()?;
                let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
                if date > today {
                    tracing::warn!(date = %date, "Skipping future-dated observation");
                    return None;
                }
                let value = match obs.get("value")? {
                    Value::String(s) => s.trim().parse::<f64>().ok()?,
                    Value::Number(n) => n.as_f64()?,
                    _ => return None,
                };
                Some((date, value))
            })
            .max_by_key(|(date, _)| *date)
    }
}

impl Transformer for M2Transformer {
    fn transform(&self, raw: RawData) -> Result<NormalizedData, ComponentError> {
        let observations = raw
            .get("observations")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                ComponentError::data("MISSING_FIELD", "M2Transformer: no 'observations' array")
            })?;

        let now = Utc::now();
        let (date, value) = Self::latest(observations, now.date_naive()).ok_or_else(|| {
            ComponentError::data(
                "NO_VALID_OBSERVATIONS",
                format!(
                    "M2Transformer: none of {} observations has a valid date and value",
                    observations.len()
                ),
            )
        })?;

        Ok(json!({
            "date": date.to_string(),
            "value": value,
            "updated_at": now.to_rfc3339(),
            "units": self.units,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transformer() -> M2Transformer {
        M2Transformer::init(Config {
            units: default_units(),
        })
        .unwrap()
    }

    #[test]
    fn picks_latest_past_observation() {
        let raw = json!({
            "observations": [
                {"date": "2023-11-01", "value": "20700.1"},
                {"date": "2023-12-01", "value": "20800.5"},
                {"date": "2023-10-01", "value": "20600.0"},
                {"date": "2999-01-01", "value": "99999.0"},
            ]
        });
        let out = transformer().transform(raw).unwrap();
        assert_eq!(out["date"], "2023-12-01");
        assert_eq!(out["value"], 20800.5);
        assert_eq!(out["units"], "USD");
    }

    #[test]
    fn skips_missing_values_and_bad_dates() {
        let raw = json!({
            "observations": [
                {"date": "2024-01-01", "value": "."},
                {"date": "not-a-date", "value": "1.0"},
                {"date": "2023-12-01", "value": "20800.5"},
            ]
        });
        let out = transformer().transform(raw).unwrap();
        assert_eq!(out["date"], "2023-12-01");
    }

    #[test]
    fn no_valid_observation_is_data_error() {
        let raw = json!({"observations": [{"date": "2024-01-01", "value": "."}]});
        let err = transformer().transform(raw).unwrap_err();
        assert_eq!(err.code, "NO_VALID_OBSERVATIONS");
    }
}
