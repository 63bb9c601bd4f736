use std::fs;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use chrono::Utc;
use rompatch_core::db::SaveEntry;
use rompatch_core::save::SaveRecord;

use crate::commands::open_context;
use crate::display_file_name;

/// Store a save file for a catalog target.
pub fn save_import_command(root: &str, target: &str, file: &str) -> Result<()> {
    let ctx = open_context(root)?;
    let catalog = ctx.catalog().context("Failed to load target catalog")?;
    catalog.get(target)?;

    let path = Path::new(file);
    let bytes =
        fs::read(path).with_context(|| format!("Failed to read save file: {}", path.display()))?;
    let record = SaveRecord::read(&bytes).map_err(|e| anyhow!("{}: {e}", path.display()))?;

    let entry = SaveEntry {
        target: target.to_string(),
        name: display_file_name(path),
        bytes,
        stored_at: Utc::now().to_rfc3339(),
    };
    ctx.cache.store_save(&entry).context("Failed to store save")?;

    println!("Imported save for {target}:");
    print_record(&record);
    Ok(())
}

/// Show the summary of a stored save or a save file on disk.
pub fn save_info_command(
    root: &str,
    target: Option<&str>,
    file: Option<&str>,
    json: bool,
) -> Result<()> {
    let bytes = match (target, file) {
        (_, Some(file)) => fs::read(file).with_context(|| format!("Failed to read save file: {file}"))?,
        (Some(target), None) => {
            let ctx = open_context(root)?;
            match ctx.cache.load_save(target).context("Failed to load save")? {
                Some(entry) => entry.bytes,
                None => bail!("No save stored for target '{target}'"),
            }
        }
        (None, None) => bail!("Pass --target <id> or --file <path>"),
    };
    let record = SaveRecord::read(&bytes)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        print_record(&record);
    }
    Ok(())
}

/// List stored saves.
pub fn save_list_command(root: &str, json: bool) -> Result<()> {
    let ctx = open_context(root)?;
    let saves = ctx.cache.list_saves().context("Failed to list saves")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&saves)?);
        return Ok(());
    }

    println!("Saves ({}):", saves.len());
    if saves.is_empty() {
        println!("  (none)");
    }
    for save in saves {
        println!("  - {} ({}) stored={}", save.target, save.name, save.stored_at);
    }
    Ok(())
}

/// Delete the stored save for a target.
pub fn save_remove_command(root: &str, target: &str) -> Result<()> {
    let ctx = open_context(root)?;
    if !ctx.cache.remove_save(target).context("Failed to remove save")? {
        bail!("No save stored for target '{target}'");
    }
    println!("Removed save for {target}");
    Ok(())
}

fn print_record(record: &SaveRecord) {
    println!("  Hero: {}", record.hero_name);
    println!("  Partner: {}", record.partner_name);
    println!("  Team: {}", record.team_name);
    println!("  Adventures: {}", record.adventures);
    println!("  Play time: {}", record.play_time_hms());
}
