//! The signal definition store: every fragment merged in order.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use indexmap::IndexMap;

use crate::config::parser::{parse_signals_file, parse_signals_str};
use crate::config::types::SignalDefinition;
use crate::config::validator::validate_signals;

/// All configured signals in declaration order.
#[derive(Debug, Clone, Default)]
pub struct SignalStore {
    signals: IndexMap<String, SignalDefinition>,
    /// Fragment each signal came from, for error messages.
    origins: IndexMap<String, String>,
}

impl SignalStore {
    /// Load and merge fragments. Directories contribute every `*.yaml` and
    /// `*.yml` file inside them, sorted by file name.
    ///
    /// # Errors
    ///
    /// Returns an error if a fragment cannot be read, parsed or validated,
    /// or if a signal name is defined in more than one fragment.
    pub fn load(paths: &[PathBuf]) -> Result<Self> {
        let mut store = Self::default();
        for path in paths {
            for file in expand_fragment(path)? {
                let fragment = parse_signals_file(&file)?;
                validate_signals(&fragment)
                    .with_context(|| format!("In signal file: {}", file.display()))?;
                store.merge(fragment, &file.display().to_string())?;
            }
        }
        tracing::debug!(signals = store.len(), fragments = paths.len(), "Loaded signal store");
        Ok(store)
    }

    /// Build a store from a single YAML document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is invalid.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let fragment = parse_signals_str(yaml)?;
        validate_signals(&fragment)?;
        let mut store = Self::default();
        store.merge(fragment, "<inline>")?;
        Ok(store)
    }

    fn merge(&mut self, fragment: IndexMap<String, SignalDefinition>, origin: &str) -> Result<()> {
        for (name, signal) in fragment {
            if let Some(previous) = self.origins.get(&name) {
                bail!("Signal '{name}' is defined in both {previous} and {origin}");
            }
            self.origins.insert(name.clone(), origin.to_string());
            self.signals.insert(name, signal);
        }
        Ok(())
    }

    /// Signals to run: all of them when `names` is empty, otherwise the named
    /// ones in store order.
    ///
    /// # Errors
    ///
    /// Returns an error naming every requested signal that does not exist.
    pub fn select(&self, names: &[String]) -> Result<Vec<&SignalDefinition>> {
        if names.is_empty() {
            return Ok(self.signals.values().collect());
        }
        let unknown: Vec<&str> = names
            .iter()
            .filter(|n| !self.signals.contains_key(n.as_str()))
            .map(String::as_str)
            .collect();
        if !unknown.is_empty() {
            bail!(
                "Unknown signal(s): {} (configured: {})",
                unknown.join(", "),
                self.names().collect::<Vec<_>>().join(", ")
            );
        }
        Ok(self
            .signals
            .values()
            .filter(|s| names.contains(&s.name))
            .collect())
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SignalDefinition> {
        self.signals.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.signals.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SignalDefinition> {
        self.signals.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.signals.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml")
    )
}

fn expand_fragment(path: &Path) -> Result<Vec<PathBuf>> {
    if !path.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }
    let mut files = Vec::new();
    let entries = std::fs::read_dir(path)
        .with_context(|| format!("Failed to read signal directory: {}", path.display()))?;
    for entry in entries {
        let entry = entry
            .with_context(|| format!("Failed to read signal directory: {}", path.display()))?;
        let file = entry.path();
        if file.is_file() && is_yaml(&file) {
            files.push(file);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}
