use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;

use sigflow_engine::{orchestrator, ComponentCatalog, Environment, SignalCheck};

/// Execute the `check` command: structural validation plus per-signal
/// component resolution.
pub fn execute(config: &[PathBuf], selected: &[String]) -> Result<ExitCode> {
    let signals = orchestrator::load_signals(config, selected)?;
    println!("Signal configuration: OK ({} signal(s))", signals.len());

    let catalog = ComponentCatalog::with_builtins();
    let env = Environment::capture();
    let checks = orchestrator::check_signals(&signals, &catalog, &env);

    for check in &checks {
        print_check(check);
    }

    if checks.iter().all(SignalCheck::ok) {
        println!("\nAll checks passed.");
        Ok(ExitCode::SUCCESS)
    } else {
        let failed = checks.iter().filter(|c| !c.ok()).count();
        println!("\n{failed} signal(s) failed checks.");
        Ok(ExitCode::FAILURE)
    }
}

fn print_check(check: &SignalCheck) {
    let status = if check.ok() { "OK" } else { "FAILED" };
    println!("{:24} {}", format!("{}:", check.signal_name), status);
    for problem in &check.problems {
        println!("  {problem}");
    }
}
