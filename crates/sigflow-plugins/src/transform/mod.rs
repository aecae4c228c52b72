//! Built-in transformers.

pub mod fear_greed;
pub mod key;
pub mod m2;
pub mod market_cap;

use chrono::{DateTime, Utc};
use serde_json::Value;
use sigflow_sdk::errors::ComponentError;

/// Today's UTC date as `YYYY-MM-DD`.
pub(crate) fn today() -> String {
    Utc::now().date_naive().to_string()
}

/// Interpret a unix-seconds timestamp given as a number or numeric string.
pub(crate) fn unix_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    let secs = match value {
        Value::Number(n) => n.as_i64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    DateTime::from_timestamp(secs, 0)
}

/// Look up a dotted path such as `data.quotes.USD.total_market_cap`.
pub(crate) fn lookup<'a>(
    component: &str,
    raw: &'a Value,
    path: &str,
) -> Result<&'a Value, ComponentError> {
    path.split('.')
        .try_fold(raw, |node, segment| node.get(segment))
        .ok_or_else(|| {
            ComponentError::data(
                "MISSING_FIELD",
                format!("{component}: '{path}' not found in raw data"),
            )
        })
}
