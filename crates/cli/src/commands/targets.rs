use anyhow::{Context, Result};

use crate::commands::open_context;

/// List the targets in the workspace catalog.
pub fn list_targets_command(root: &str, json: bool) -> Result<()> {
    let ctx = open_context(root)?;
    let catalog = ctx.catalog().context("Failed to load target catalog")?;

    if json {
        let serialized = serde_json::to_string_pretty(&catalog)
            .context("Failed to serialize targets to JSON")?;
        println!("{}", serialized);
        return Ok(());
    }

    println!("Targets ({}):", catalog.len());
    if catalog.is_empty() {
        println!("  (none)");
        return Ok(());
    }

    for target in &catalog.targets {
        println!("  - {} [{}] {}", target.id, target.region, target.display_name());
        if let Some(page) = &target.page {
            println!("      {page}");
        }
    }

    Ok(())
}
