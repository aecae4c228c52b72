//! `{{ VAR }}` and `${VAR}` placeholders in component parameters.
//!
//! Every string leaf of a spec's `params` is rendered against the
//! environment snapshot. Top-level parameters that contained a placeholder
//! are kept apart from plain ones because they take precedence over
//! injected secrets when parameters are merged.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::Value;
use sigflow_sdk::Params;

use crate::config::{ComponentRef, ComponentSpec};
use crate::env::Environment;

static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}|\$\{([A-Za-z_][A-Za-z0-9_]*)\}")
        .expect("valid placeholder regex")
});

/// A component spec with its parameters rendered and split by precedence.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedSpec {
    pub reference: ComponentRef,
    /// Parameters that contained no placeholder.
    pub plain: Params,
    /// Parameters that contained a placeholder, after substitution.
    pub templated: Params,
}

/// True if any string leaf of `value` contains a placeholder.
#[must_use]
pub fn contains_placeholder(value: &Value) -> bool {
    match value {
        Value::String(s) => PLACEHOLDER_RE.is_match(s),
        Value::Array(items) => items.iter().any(contains_placeholder),
        Value::Object(map) => map.values().any(contains_placeholder),
        _ => false,
    }
}

fn render_str(input: &str, env: &Environment, missing: &mut Vec<String>) -> String {
    PLACEHOLDER_RE
        .replace_all(input, |caps: &Captures| {
            let name = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map_or("", |m| m.as_str());
            match env.get(name) {
                Some(value) => value.to_string(),
                None => {
                    if !missing.iter().any(|m| m == name) {
                        missing.push(name.to_string());
                    }
                    caps[0].to_string()
                }
            }
        })
        .into_owned()
}

/// Substitute placeholders in every string leaf, recording unset variables
/// in `missing` (first occurrence order, no duplicates).
pub fn render_value(value: &Value, env: &Environment, missing: &mut Vec<String>) -> Value {
    match value {
        Value::String(s) => Value::String(render_str(s, env, missing)),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| render_value(item, env, missing))
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), render_value(v, env, missing)))
                .collect(),
        ),
        other => other.clone(),
    }
}

pub fn render_spec(spec: &ComponentSpec, env: &Environment, missing: &mut Vec<String>) -> RenderedSpec {
    let mut plain = Params::new();
    let mut templated = Params::new();
    for (key, value) in &spec.params {
        if contains_placeholder(value) {
            templated.insert(key.clone(), render_value(value, env, missing));
        } else {
            plain.insert(key.clone(), value.clone());
        }
    }
    RenderedSpec {
        reference: spec.reference.clone(),
        plain,
        templated,
    }
}
