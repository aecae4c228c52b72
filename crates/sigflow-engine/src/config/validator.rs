//! Semantic validation for parsed signal definitions.

use anyhow::{bail, Result};
use indexmap::IndexMap;

use crate::config::types::SignalDefinition;
use crate::secrets::SecretTarget;

fn is_env_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn validate_signal(signal: &SignalDefinition, errors: &mut Vec<String>) {
    let name = &signal.name;

    for secret in &signal.secrets {
        if !is_env_name(secret) {
            errors.push(format!(
                "Signal '{name}': secret '{secret}' is not a valid environment variable name"
            ));
        }
    }

    for (secret, target) in &signal.secret_mapping {
        if !signal.secrets.contains(secret) {
            errors.push(format!(
                "Signal '{name}': secret_mapping entry '{secret}' is not listed in secrets"
            ));
        }
        let parsed = SecretTarget::parse(target);
        if parsed.param.is_empty() || parsed.component.as_deref().is_some_and(str::is_empty) {
            errors.push(format!(
                "Signal '{name}': secret_mapping for '{secret}' has an empty parameter key"
            ));
            continue;
        }
        if let Some(component) = &parsed.component {
            if !signal
                .components()
                .any(|(_, spec)| spec.reference.name() == component)
            {
                errors.push(format!(
                    "Signal '{name}': secret_mapping for '{secret}' targets '{target}', \
                     but the signal has no component named '{component}'"
                ));
            }
        }
    }

    let targets: Vec<SecretTarget> = signal
        .secrets
        .iter()
        .map(|secret| SecretTarget::of(secret, &signal.secret_mapping))
        .collect();
    for (role, spec) in signal.components() {
        let mut seen: Vec<&str> = Vec::new();
        for target in targets.iter().filter(|t| t.applies_to(&spec.reference, role)) {
            if seen.contains(&target.param.as_str()) {
                let message = format!(
                    "Signal '{name}': more than one secret is injected as '{}' into {}",
                    target.param, spec.reference
                );
                if !errors.contains(&message) {
                    errors.push(message);
                }
            }
            seen.push(&target.param);
        }
    }
}

/// Validate parsed signal definitions.
/// Returns `Ok(())` if valid, Err with all validation errors if not.
///
/// # Errors
///
/// Returns an error listing every problem found.
pub fn validate_signals(signals: &IndexMap<String, SignalDefinition>) -> Result<()> {
    let mut errors = Vec::new();

    for signal in signals.values() {
        validate_signal(signal, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        bail!("Signal validation failed:\n  - {}", errors.join("\n  - "));
    }
}
