//! Prints the recordings or the trash as a table.

use super::{location_for, open_vault};
use crate::config::RecorderConfig;
use crate::storage::{EntryStatus, RecordingEntry, SortKey, SortOrder};

/// Lists one vault area.
///
/// `sort` and `descending` override the configured defaults.
pub fn handle_list(
    trash: bool,
    sort: Option<SortKey>,
    descending: Option<bool>,
) -> anyhow::Result<()> {
    let config = RecorderConfig::load()?;
    let vault = open_vault(&config)?;
    let location = location_for(trash);

    let key = sort.unwrap_or(config.ui.default_sort);
    let order = descending
        .map(SortOrder::from_descending)
        .unwrap_or_else(|| config.ui.sort_order());
    let entries = vault.list(location).sorted(key, order);

    if entries.is_empty() {
        println!("No recordings in {} ({}).", location, vault.dir(location).display());
        return Ok(());
    }

    let id_width = entries.iter().map(|e| e.id.chars().count()).max().unwrap_or(0).max(2);
    println!(
        "{:<id_width$}  {:<16}  {:>8}  {:>10}  {:<6}",
        "ID", "CREATED", "DURATION", "SIZE", "PRESET"
    );
    for entry in &entries {
        println!("{}", format_row(entry, id_width));
    }
    println!();
    println!("{} in {}", entries.len(), vault.dir(location).display());
    Ok(())
}

fn format_row(entry: &RecordingEntry, id_width: usize) -> String {
    let created = entry.created_at.format("%Y-%m-%d %H:%M").to_string();
    match &entry.status {
        EntryStatus::Ok => format!(
            "{:<id_width$}  {created:<16}  {:>8}  {:>10}  {:<6}",
            entry.id,
            entry.duration_label(),
            entry.size_label(),
            entry
                .preset
                .map(|p| p.to_string())
                .unwrap_or_else(|| "-".to_string()),
        ),
        EntryStatus::Damaged(reason) => {
            format!("{:<id_width$}  {created:<16}  damaged: {reason}", entry.id)
        }
    }
}
