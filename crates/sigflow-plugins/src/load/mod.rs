//! Built-in loaders and the signal record shape they share.

pub mod file;
pub mod sqlite;
pub mod supabase;

use serde_json::{Map, Value};
use sigflow_sdk::prelude::*;

const CORE_FIELDS: [&str; 4] = ["date", "signal_name", "value", "units"];
const DEFAULT_UNITS: &str = "USD";

/// One row in a signals table: `{date, signal_name, value, units, metadata}`.
///
/// `date` defaults to today (UTC) and `units` to `USD`. Every other field of
/// the input ends up under `metadata`; an input `metadata` object is merged
/// in rather than nested.
pub(crate) fn build_signal_record(
    component: &str,
    data: &Value,
) -> Result<Map<String, Value>, ComponentError> {
    let Value::Object(fields) = data else {
        return Err(ComponentError::data(
            "INVALID_RECORD",
            format!("{component}: expected a JSON object, got {}", type_name(data)),
        ));
    };

    let signal_name = fields
        .get("signal_name")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty());
    let value = fields.get("value").filter(|v| !v.is_null());
    let (Some(signal_name), Some(value)) = (signal_name, value) else {
        return Err(ComponentError::data(
            "MISSING_FIELD",
            format!("{component}: record requires 'signal_name' and 'value': {data}"),
        ));
    };

    let date = fields
        .get("date")
        .and_then(Value::as_str)
        .map_or_else(crate::transform::today, str::to_string);
    let units = fields
        .get("units")
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_UNITS);

    let mut metadata = Map::new();
    for (key, field) in fields {
        if CORE_FIELDS.contains(&key.as_str()) {
            continue;
        }
        match (key.as_str(), field) {
            ("metadata", Value::Object(nested)) => {
                metadata.extend(nested.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
            _ => {
                metadata.insert(key.clone(), field.clone());
            }
        }
    }

    let mut record = Map::new();
    record.insert("date".into(), Value::String(date));
    record.insert("signal_name".into(), Value::String(signal_name.to_string()));
    record.insert("value".into(), value.clone());
    record.insert("units".into(), Value::String(units.to_string()));
    record.insert("metadata".into(), Value::Object(metadata));
    Ok(record)
}

/// Records for a payload that may be a single object or an array of them.
pub(crate) fn build_signal_records(
    component: &str,
    data: &Value,
) -> Result<Vec<Map<String, Value>>, ComponentError> {
    match data {
        Value::Array(items) => items
            .iter()
            .map(|item| build_signal_record(component, item))
            .collect(),
        Value::Null => Err(ComponentError::data(
            "EMPTY_DATA",
            format!("{component}: no data to load"),
        )),
        other => Ok(vec![build_signal_record(component, other)?]),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_moves_extra_fields_into_metadata() {
        let record = build_signal_record(
            "Test",
            &json!({
                "signal_name": "fear_and_greed",
                "value": 45,
                "date": "2024-01-01",
                "units": "index",
                "classification": "Fear",
                "metadata": {"source": "alternative.me"}
            }),
        )
        .unwrap();

        assert_eq!(record["date"], "2024-01-01");
        assert_eq!(record["units"], "index");
        assert_eq!(
            Value::Object(record)["metadata"],
            json!({"classification": "Fear", "source": "alternative.me"})
        );
    }

    #[test]
    fn record_defaults_date_and_units() {
        let record = build_signal_record("Test", &json!({"signal_name": "m2", "value": 1.5})).unwrap();
        assert_eq!(record["units"], DEFAULT_UNITS);
        assert_eq!(record["date"], crate::transform::today());
        assert_eq!(record["metadata"], json!({}));
    }

    #[test]
    fn record_requires_signal_name_and_value() {
        let err = build_signal_record("Test", &json!({"value": 1})).unwrap_err();
        assert_eq!(err.code, "MISSING_FIELD");
        let err = build_signal_record("Test", &json!({"signal_name": "x", "value": null})).unwrap_err();
        assert_eq!(err.code, "MISSING_FIELD");
    }

    #[test]
    fn arrays_become_one_record_each() {
        let records = build_signal_records(
            "Test",
            &json!([
                {"signal_name": "a", "value": 1},
                {"signal_name": "b", "value": 2}
            ]),
        )
        .unwrap();
        assert_eq!(records.len(), 2);
        assert!(build_signal_records("Test", &Value::Null).is_err());
    }
}
