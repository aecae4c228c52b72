//! Execution mode types for signal runs.

/// Runtime execution options (not part of the signal YAML).
#[derive(Debug, Clone, Default)]
pub struct ExecutionOptions {
    /// Run extract and transform only; loaders are skipped and the
    /// normalized data is kept in the outcome's `preview`.
    pub dry_run: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execution_options_default_is_normal_mode() {
        assert!(!ExecutionOptions::default().dry_run);
    }
}
