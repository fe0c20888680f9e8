//! Browsing and managing saved recordings.
//!
//! [`Browser`] keeps the selection, tab and ordering for the library screen and
//! applies management actions to the vault, so the terminal layer in [`ui`] only
//! draws and forwards keys.

pub mod ui;

use crate::error::{RecorderError, Result};
use crate::recording::{AudioDevice, PlaybackControl};
use crate::storage::{FileVault, Location, RecordingEntry, SortKey, SortOrder};

pub use ui::LibraryViewer;

/// Library state for one vault.
pub struct Browser<'v> {
    vault: &'v FileVault,
    tab: Location,
    sort: SortKey,
    order: SortOrder,
    entries: Vec<RecordingEntry>,
    selected: Option<usize>,
}

impl<'v> Browser<'v> {
    /// Opens on the active recordings.
    pub fn new(vault: &'v FileVault, sort: SortKey, order: SortOrder) -> Self {
        let mut browser = Self {
            vault,
            tab: Location::Active,
            sort,
            order,
            entries: Vec::new(),
            selected: None,
        };
        browser.refresh();
        browser
    }

    pub fn tab(&self) -> Location {
        self.tab
    }

    pub fn sort(&self) -> (SortKey, SortOrder) {
        (self.sort, self.order)
    }

    pub fn entries(&self) -> &[RecordingEntry] {
        &self.entries
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected(&self) -> Option<&RecordingEntry> {
        self.selected.and_then(|i| self.entries.get(i))
    }

    /// Re-reads the current tab, keeping the selection on the same id when possible.
    pub fn refresh(&mut self) {
        let keep = self.selected().map(|e| e.id.clone());
        self.entries = self.vault.list(self.tab).sorted(self.sort, self.order);

        self.selected = match keep.and_then(|id| self.entries.iter().position(|e| e.id == id)) {
            Some(index) => Some(index),
            None if self.entries.is_empty() => None,
            None => Some(
                self.selected
                    .unwrap_or(0)
                    .min(self.entries.len() - 1),
            ),
        };
    }

    pub fn select_next(&mut self) {
        if let Some(i) = self.selected {
            self.selected = Some((i + 1).min(self.entries.len().saturating_sub(1)));
        }
    }

    pub fn select_previous(&mut self) {
        if let Some(i) = self.selected {
            self.selected = Some(i.saturating_sub(1));
        }
    }

    pub fn switch_tab(&mut self) {
        self.tab = self.tab.other();
        self.selected = None;
        self.refresh();
    }

    pub fn cycle_sort(&mut self) {
        self.sort = self.sort.next();
        self.refresh();
    }

    pub fn toggle_order(&mut self) {
        self.order = self.order.toggled();
        self.refresh();
    }

    /// Moves the selected entry to the other area: trash from the active tab,
    /// restore from the trash tab.
    pub fn move_selected(&mut self) -> Result<String> {
        let id = self.selected_id()?;
        let message = match self.tab {
            Location::Active => {
                let entry = self.vault.move_to_trash(&id)?;
                format!("Moved '{}' to trash", entry.id)
            }
            Location::Trash => {
                let entry = self.vault.restore(&id)?;
                format!("Restored '{}'", entry.id)
            }
        };
        self.refresh();
        Ok(message)
    }

    /// Permanently deletes the selected entry. Only valid on the trash tab.
    pub fn purge_selected(&mut self) -> Result<String> {
        let id = self.selected_id()?;
        self.vault.purge(&id)?;
        self.refresh();
        Ok(format!("Deleted '{id}' permanently"))
    }

    pub fn rename_selected(&mut self, new_name: &str) -> Result<String> {
        let id = self.selected_id()?;
        let entry = self.vault.rename(&id, new_name, self.tab)?;
        self.selected = None;
        self.entries.clear();
        self.refresh();
        self.selected = self.entries.iter().position(|e| e.id == entry.id);
        Ok(format!("Renamed '{id}' to '{}'", entry.id))
    }

    pub fn empty_trash(&mut self) -> String {
        let report = self.vault.empty_trash();
        self.refresh();
        match report.failed.as_slice() {
            [] => format!("Emptied trash ({} deleted)", report.purged.len()),
            [(id, reason), ..] => format!(
                "Deleted {}, {} failed (first: {id}: {reason})",
                report.purged.len(),
                report.failed.len()
            ),
        }
    }

    /// Plays the selected entry, blocking until it ends or `control` stops it.
    pub fn play_selected(
        &self,
        device: &mut impl AudioDevice,
        control: &PlaybackControl,
    ) -> Result<()> {
        let entry = self
            .selected()
            .ok_or_else(|| RecorderError::NotFound("nothing selected".to_string()))?;
        play_entry(self.vault, entry, device, control)
    }

    fn selected_id(&self) -> Result<String> {
        self.selected()
            .map(|e| e.id.clone())
            .ok_or_else(|| RecorderError::NotFound("nothing selected".to_string()))
    }
}

/// Decodes a saved recording and plays it on `device`.
///
/// # Errors
/// - `Unreadable` if the artifact cannot be decoded
/// - `DeviceUnavailable` if playback cannot start
pub fn play_entry(
    vault: &FileVault,
    entry: &RecordingEntry,
    device: &mut impl AudioDevice,
    control: &PlaybackControl,
) -> Result<()> {
    let (samples, info) = vault
        .codec()
        .decode(&entry.path)
        .map_err(|e| RecorderError::Unreadable {
            id: entry.id.clone(),
            reason: format!("{e:#}"),
        })?;

    tracing::info!(
        "Playing {} ({:.2}s, {}Hz, {}ch)",
        entry.id,
        info.duration_secs(),
        info.sample_rate,
        info.channels
    );
    device.play(&samples, info.sample_rate, info.channels, control)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::recording::device::mock::MockDevice;
    use crate::recording::{FinishedRecording, QualityPreset};
    use chrono::Local;
    use tempfile::TempDir;

    fn vault_with(names: &[&str]) -> (TempDir, FileVault) {
        let root = tempfile::tempdir().unwrap();
        let vault =
            FileVault::open(root.path().join("recordings"), root.path().join("trash")).unwrap();
        for (i, name) in names.iter().enumerate() {
            let samples = vec![0i16; 100 * (i + 1)];
            let recording = FinishedRecording {
                samples: &samples,
                preset: QualityPreset::Low,
                started_at: Local::now(),
                duration_secs: QualityPreset::Low.duration_secs(samples.len()),
            };
            vault.save(&recording, Some(name)).unwrap();
        }
        (root, vault)
    }

    fn ids(browser: &Browser<'_>) -> Vec<String> {
        browser.entries().iter().map(|e| e.id.clone()).collect()
    }

    #[test]
    fn test_sort_cycle_and_toggle() {
        let (_root, vault) = vault_with(&["b", "a", "c"]);
        let mut browser = Browser::new(&vault, SortKey::Name, SortOrder::Ascending);
        assert_eq!(ids(&browser), ["a", "b", "c"]);

        browser.toggle_order();
        assert_eq!(ids(&browser), ["c", "b", "a"]);

        browser.cycle_sort();
        assert_eq!(browser.sort().0, SortKey::Duration);
        assert_eq!(ids(&browser), ["c", "a", "b"]);
    }

    #[test]
    fn test_trash_restore_and_purge_through_tabs() {
        let (_root, vault) = vault_with(&["keep", "drop"]);
        let mut browser = Browser::new(&vault, SortKey::Name, SortOrder::Ascending);
        assert_eq!(browser.selected().unwrap().id, "drop");

        browser.move_selected().unwrap();
        assert_eq!(ids(&browser), ["keep"]);
        assert_eq!(browser.selected().unwrap().id, "keep");

        browser.switch_tab();
        assert_eq!(browser.tab(), Location::Trash);
        assert_eq!(ids(&browser), ["drop"]);

        browser.purge_selected().unwrap();
        assert!(browser.entries().is_empty());
        assert_eq!(browser.selected_index(), None);
        assert_eq!(
            browser.purge_selected().unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_purge_refused_on_active_tab() {
        let (_root, vault) = vault_with(&["live"]);
        let mut browser = Browser::new(&vault, SortKey::Name, SortOrder::Ascending);
        assert_eq!(
            browser.purge_selected().unwrap_err().kind(),
            ErrorKind::NotFound
        );
        assert_eq!(ids(&browser), ["live"]);
    }

    #[test]
    fn test_rename_keeps_selection_on_renamed_entry() {
        let (_root, vault) = vault_with(&["a", "m"]);
        let mut browser = Browser::new(&vault, SortKey::Name, SortOrder::Ascending);

        browser.rename_selected("z").unwrap();
        assert_eq!(ids(&browser), ["m", "z"]);
        assert_eq!(browser.selected().unwrap().id, "z");

        let err = browser.rename_selected("m").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateName);
    }

    #[test]
    fn test_empty_trash_message() {
        let (_root, vault) = vault_with(&["one", "two"]);
        vault.move_to_trash("one").unwrap();
        vault.move_to_trash("two").unwrap();

        let mut browser = Browser::new(&vault, SortKey::Name, SortOrder::Ascending);
        browser.switch_tab();
        assert_eq!(browser.empty_trash(), "Emptied trash (2 deleted)");
        assert!(browser.entries().is_empty());
    }

    #[test]
    fn test_play_selected_uses_artifact_format() {
        let (_root, vault) = vault_with(&["tone"]);
        let browser = Browser::new(&vault, SortKey::Name, SortOrder::Ascending);
        let (mut device, feed) = MockDevice::new();

        browser
            .play_selected(&mut device, &PlaybackControl::new())
            .unwrap();
        feed.with(|state| assert_eq!(state.played, vec![(100, 44_100, 1)]));
    }

    #[test]
    fn test_damaged_entry_cannot_play() {
        let (_root, vault) = vault_with(&[]);
        std::fs::write(vault.dir(Location::Active).join("broken.wav"), b"nope").unwrap();
        let browser = Browser::new(&vault, SortKey::Name, SortOrder::Ascending);
        assert!(browser.selected().unwrap().is_damaged());

        let (mut device, feed) = MockDevice::new();
        let err = browser
            .play_selected(&mut device, &PlaybackControl::new())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unreadable);
        assert!(err.to_string().starts_with("recording broken cannot be read"));
        feed.with(|state| assert!(state.played.is_empty()));
    }
}
