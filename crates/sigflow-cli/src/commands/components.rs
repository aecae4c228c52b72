use std::process::ExitCode;

use anyhow::{Context, Result};

use sigflow_engine::ComponentCatalog;

/// Execute the `components` command: list built-in aliases.
pub fn execute(json: bool) -> Result<ExitCode> {
    let aliases = ComponentCatalog::with_builtins().aliases();

    if json {
        let out = serde_json::to_string_pretty(&aliases).context("Failed to serialize aliases")?;
        println!("{out}");
        return Ok(ExitCode::SUCCESS);
    }

    println!("{:32} {:12} CLASS", "ALIAS", "ROLE");
    for info in &aliases {
        let role = info
            .role
            .map_or_else(|| "unresolved".to_string(), |r| r.to_string());
        println!("{:32} {:12} {}::{}", info.alias, role, info.module, info.class);
    }
    Ok(ExitCode::SUCCESS)
}
