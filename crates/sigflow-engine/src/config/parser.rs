//! Signal YAML parsing.

use std::path::Path;

use anyhow::{Context, Result};
use indexmap::IndexMap;

use crate::config::types::{SignalDefinition, SignalDocument};

fn is_blank_or_comment(line: &str) -> bool {
    let line = line.trim();
    line.is_empty() || line.starts_with('#') || line == "---"
}

/// Parse one signal fragment from a YAML string.
///
/// A document with nothing but blank lines and comments is an empty fragment.
///
/// # Errors
///
/// Returns an error if the YAML is invalid, a spec has an unsupported shape,
/// a record has unknown keys, or a signal name appears twice.
pub fn parse_signals_str(yaml_str: &str) -> Result<IndexMap<String, SignalDefinition>> {
    if yaml_str.lines().all(is_blank_or_comment) {
        return Ok(IndexMap::new());
    }
    let document: SignalDocument =
        serde_yaml::from_str(yaml_str).context("Failed to parse signal YAML")?;
    Ok(document
        .signals
        .into_iter()
        .map(|(name, raw)| (name.clone(), SignalDefinition::from_raw(name, raw)))
        .collect())
}

/// Parse a signal fragment file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or its content is invalid.
pub fn parse_signals_file(path: &Path) -> Result<IndexMap<String, SignalDefinition>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read signal file: {}", path.display()))?;
    parse_signals_str(&content).with_context(|| format!("In signal file: {}", path.display()))
}
