//! One-shot library management commands.

use super::{location_for, open_vault};
use crate::config::RecorderConfig;
use crate::storage::FileVault;

fn vault() -> anyhow::Result<FileVault> {
    open_vault(&RecorderConfig::load()?)
}

/// Moves an active recording to the trash.
pub fn handle_trash(id: &str) -> anyhow::Result<()> {
    let entry = vault()?.move_to_trash(id)?;
    if entry.id == id {
        println!("Moved '{id}' to the trash.");
    } else {
        println!("Moved '{id}' to the trash as '{}'.", entry.id);
    }
    Ok(())
}

/// Moves a trashed recording back to the active recordings.
pub fn handle_restore(id: &str) -> anyhow::Result<()> {
    let entry = vault()?.restore(id)?;
    if entry.id == id {
        println!("Restored '{id}'.");
    } else {
        println!("Restored '{id}' as '{}'.", entry.id);
    }
    Ok(())
}

/// Permanently deletes a trashed recording.
pub fn handle_purge(id: &str) -> anyhow::Result<()> {
    vault()?.purge(id)?;
    println!("Deleted '{id}' permanently.");
    Ok(())
}

pub fn handle_rename(id: &str, new_name: &str, trash: bool) -> anyhow::Result<()> {
    let entry = vault()?.rename(id, new_name, location_for(trash))?;
    println!("Renamed '{id}' to '{}'.", entry.id);
    Ok(())
}

/// Deletes everything in the trash, reporting entries that could not be removed.
pub fn handle_empty_trash() -> anyhow::Result<()> {
    let report = vault()?.empty_trash();
    println!("Deleted {} recording(s) from the trash.", report.purged.len());

    if report.is_complete() {
        return Ok(());
    }
    for (id, reason) in &report.failed {
        eprintln!("  could not delete '{id}': {reason}");
    }
    Err(anyhow::anyhow!(
        "{} recording(s) could not be deleted",
        report.failed.len()
    ))
}
