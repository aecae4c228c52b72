//! Secret resolution from the environment snapshot.
//!
//! A `secret_mapping` target is either a bare parameter name, injected into
//! the extractor, or `component.param`, injected only into the components
//! the signal names `component` (an alias, or the class of an explicit
//! reference).

use std::fmt;

use indexmap::IndexMap;
use serde_json::Value;
use sigflow_sdk::export::Role;
use sigflow_sdk::Params;

use crate::config::ComponentRef;
use crate::env::Environment;
use crate::error::PipelineError;

/// Where one secret is injected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretTarget {
    /// `None` targets the extractor.
    pub component: Option<String>,
    pub param: String,
}

impl SecretTarget {
    /// Parse a mapping target such as `api_key` or `supabase_loader.key`.
    #[must_use]
    pub fn parse(target: &str) -> Self {
        match target.split_once('.') {
            Some((component, param)) => Self {
                component: Some(component.trim().to_string()),
                param: param.trim().to_string(),
            },
            None => Self {
                component: None,
                param: target.trim().to_string(),
            },
        }
    }

    /// Target of `secret` under `mapping`; unmapped secrets keep their name.
    #[must_use]
    pub fn of(secret: &str, mapping: &IndexMap<String, String>) -> Self {
        Self::parse(mapping.get(secret).map_or(secret, String::as_str))
    }

    /// Whether the component resolved as `role` from `reference` receives
    /// this secret.
    #[must_use]
    pub fn applies_to(&self, reference: &ComponentRef, role: Role) -> bool {
        match &self.component {
            Some(name) => reference.name() == name,
            None => role == Role::Extractor,
        }
    }
}

impl fmt::Display for SecretTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.component {
            Some(component) => write!(f, "{component}.{}", self.param),
            None => f.write_str(&self.param),
        }
    }
}

/// Secret values of one signal, each with its injection target.
#[derive(Clone, Default)]
pub struct ResolvedSecrets {
    entries: Vec<(SecretTarget, String)>,
}

impl ResolvedSecrets {
    /// Parameters injected into one component.
    #[must_use]
    pub fn for_component(&self, reference: &ComponentRef, role: Role) -> Params {
        self.entries
            .iter()
            .filter(|(target, _)| target.applies_to(reference, role))
            .map(|(target, value)| (target.param.clone(), Value::String(value.clone())))
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for ResolvedSecrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(target, _)| (target.to_string(), "***")))
            .finish()
    }
}

/// Look up every required secret and attach its injection target.
///
/// An unset or empty variable counts as missing.
///
/// # Errors
///
/// Returns [`PipelineError::MissingSecret`] naming every missing secret in
/// declaration order.
pub fn resolve_secrets(
    secrets: &[String],
    mapping: &IndexMap<String, String>,
    env: &Environment,
) -> Result<ResolvedSecrets, PipelineError> {
    let mut resolved = ResolvedSecrets::default();
    let mut missing = Vec::new();

    for name in secrets {
        match env.get(name).filter(|v| !v.is_empty()) {
            Some(value) => resolved
                .entries
                .push((SecretTarget::of(name, mapping), value.to_string())),
            None => missing.push(name.clone()),
        }
    }

    if missing.is_empty() {
        Ok(resolved)
    } else {
        Err(PipelineError::MissingSecret { names: missing })
    }
}
