//! The recordings and trash directories.
//!
//! The directories themselves are the index: an entry exists exactly when its
//! artifact file exists, and every field of a [`RecordingEntry`] is derived from
//! that file. Files that cannot be read show up as damaged entries instead of
//! failing the whole listing.

use super::codec::{AudioCodec, WavCodec};
use super::entry::{sort_entries, EntryStatus, Location, RecordingEntry, SortKey, SortOrder};
use super::naming::{disambiguate, sanitize_name, timestamp_id};
use super::transfer;
use crate::error::{RecorderError, Result};
use crate::recording::FinishedRecording;
use chrono::{DateTime, Local};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Outcome of emptying the trash. Each id is purged independently.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PurgeReport {
    pub purged: Vec<String>,
    /// Ids that could not be removed, with the reason
    pub failed: Vec<(String, String)>,
}

impl PurgeReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Manages saved recordings across the active and trash areas.
pub struct FileVault {
    recordings_dir: PathBuf,
    trash_dir: PathBuf,
    codec: Box<dyn AudioCodec>,
}

impl FileVault {
    /// Opens the vault with WAV artifacts, creating both directories if needed.
    ///
    /// # Errors
    /// - If either directory cannot be created
    pub fn open(
        recordings_dir: impl Into<PathBuf>,
        trash_dir: impl Into<PathBuf>,
    ) -> io::Result<Self> {
        Self::with_codec(recordings_dir, trash_dir, Box::new(WavCodec))
    }

    /// Opens the vault with a custom codec.
    ///
    /// Also removes temporary files left by an earlier crash.
    pub fn with_codec(
        recordings_dir: impl Into<PathBuf>,
        trash_dir: impl Into<PathBuf>,
        codec: Box<dyn AudioCodec>,
    ) -> io::Result<Self> {
        let vault = Self {
            recordings_dir: recordings_dir.into(),
            trash_dir: trash_dir.into(),
            codec,
        };

        for location in [Location::Active, Location::Trash] {
            let dir = vault.dir(location);
            fs::create_dir_all(dir)?;
            transfer::sweep_temp_files(dir);
        }

        tracing::debug!(
            "Vault opened: recordings={}, trash={}",
            vault.recordings_dir.display(),
            vault.trash_dir.display()
        );
        Ok(vault)
    }

    pub fn dir(&self, location: Location) -> &Path {
        match location {
            Location::Active => &self.recordings_dir,
            Location::Trash => &self.trash_dir,
        }
    }

    pub fn codec(&self) -> &dyn AudioCodec {
        self.codec.as_ref()
    }

    /// Whether `id` exists in `location`.
    pub fn contains(&self, location: Location, id: &str) -> bool {
        self.existing_artifact(location, id).is_ok()
    }

    /// Looks up a single entry.
    ///
    /// # Errors
    /// `NotFound` if `id` is not in `location`.
    pub fn get(&self, id: &str, location: Location) -> Result<RecordingEntry> {
        let path = self.existing_artifact(location, id)?;
        Ok(self.describe(&path, location))
    }

    /// Encodes and stores a finished recording in the active area.
    ///
    /// Without a name the id is the current timestamp; a clash at the same second
    /// gets a numeric suffix. A user-chosen name is never altered to dodge a clash.
    ///
    /// # Errors
    /// - `InvalidName` if `name` sanitizes to nothing
    /// - `DuplicateName` if the sanitized name is already taken
    /// - `WriteFailed` if encoding or writing fails; nothing is left behind
    pub fn save(
        &self,
        recording: &FinishedRecording<'_>,
        name: Option<&str>,
    ) -> Result<RecordingEntry> {
        let id = match name {
            Some(raw) => {
                let id = sanitize_name(raw)?;
                if self.contains(Location::Active, &id) {
                    return Err(RecorderError::DuplicateName(id));
                }
                id
            }
            None => disambiguate(&timestamp_id(Local::now()), |candidate| {
                self.contains(Location::Active, candidate)
            }),
        };

        let bytes = self
            .codec
            .encode(recording.samples, recording.preset)
            .map_err(|e| RecorderError::write_failed(&id, e))?;

        let path = self.artifact_path(Location::Active, &id)?;
        transfer::write_new_file(&path, &bytes).map_err(|e| {
            if name.is_some() && e.kind() == io::ErrorKind::AlreadyExists && path.exists() {
                // Something took the name after the check above.
                return RecorderError::DuplicateName(id.clone());
            }
            tracing::error!("Failed to save recording {}: {}", id, e);
            RecorderError::write_failed(&id, e)
        })?;

        tracing::info!(
            "Recording saved: {} ({:.2}s, {} bytes, preset {})",
            path.display(),
            recording.duration_secs,
            bytes.len(),
            recording.preset
        );
        Ok(self.describe(&path, Location::Active))
    }

    /// The current contents of `location`.
    pub fn list(&self, location: Location) -> Listing<'_> {
        Listing {
            vault: self,
            location,
        }
    }

    /// Moves a recording from the active area to the trash.
    ///
    /// The entry keeps its id unless the trash already has one by that name, in
    /// which case it gets a numeric suffix.
    ///
    /// # Errors
    /// - `NotFound` if `id` is not an active recording
    /// - `MoveFailed` if the file could not be relocated; nothing changes
    pub fn move_to_trash(&self, id: &str) -> Result<RecordingEntry> {
        self.relocate(id, Location::Active, Location::Trash)
    }

    /// Moves a recording from the trash back to the active area.
    ///
    /// # Errors
    /// - `NotFound` if `id` is not in the trash
    /// - `MoveFailed` if the file could not be relocated; nothing changes
    pub fn restore(&self, id: &str) -> Result<RecordingEntry> {
        self.relocate(id, Location::Trash, Location::Active)
    }

    /// Permanently deletes a recording from the trash.
    ///
    /// Only the trash is ever touched: an id that exists only among active
    /// recordings is reported as not found.
    ///
    /// # Errors
    /// - `NotFound` if `id` is not in the trash
    /// - `DeleteFailed` if the file could not be removed
    pub fn purge(&self, id: &str) -> Result<()> {
        let path = match self.existing_artifact(Location::Trash, id) {
            Ok(path) => path,
            Err(_) if self.contains(Location::Active, id) => {
                return Err(RecorderError::NotFound(format!(
                    "'{id}' is not in the trash; move it to the trash before deleting it"
                )));
            }
            Err(e) => return Err(e),
        };

        fs::remove_file(&path).map_err(|e| RecorderError::DeleteFailed {
            id: id.to_string(),
            source: e,
        })?;
        tracing::info!("Recording permanently deleted: {}", path.display());
        Ok(())
    }

    /// Renames a recording within its area.
    ///
    /// # Errors
    /// - `InvalidName` if `new_name` sanitizes to nothing
    /// - `NotFound` if `id` is not in `location`
    /// - `DuplicateName` if the new id is taken in `location`
    /// - `MoveFailed` if the rename itself fails
    pub fn rename(&self, id: &str, new_name: &str, location: Location) -> Result<RecordingEntry> {
        let new_id = sanitize_name(new_name)?;
        let source = self.existing_artifact(location, id)?;
        if new_id == id {
            return Ok(self.describe(&source, location));
        }
        if self.contains(location, &new_id) {
            return Err(RecorderError::DuplicateName(new_id));
        }

        let target = self.artifact_path(location, &new_id)?;
        transfer::rename_no_clobber(&source, &target)
            .map_err(|e| RecorderError::move_failed(id, e))?;

        tracing::info!("Recording renamed in {}: {} -> {}", location, id, new_id);
        Ok(self.describe(&target, location))
    }

    /// Purges everything in the trash, continuing past failures.
    pub fn empty_trash(&self) -> PurgeReport {
        let ids: Vec<String> = self.list(Location::Trash).iter().map(|e| e.id).collect();
        let mut report = PurgeReport::default();

        for id in ids {
            match self.purge(&id) {
                Ok(()) => report.purged.push(id),
                Err(e) => {
                    tracing::warn!("Failed to purge {}: {}", id, e);
                    report.failed.push((id, e.to_string()));
                }
            }
        }

        tracing::info!(
            "Trash emptied: {} purged, {} failed",
            report.purged.len(),
            report.failed.len()
        );
        report
    }

    fn relocate(&self, id: &str, from: Location, to: Location) -> Result<RecordingEntry> {
        let source = self.existing_artifact(from, id)?;
        let target_id = disambiguate(id, |candidate| self.contains(to, candidate));
        let target = self.artifact_path(to, &target_id)?;

        transfer::move_file(&source, &target).map_err(|e| {
            tracing::error!("Failed to move {} from {} to {}: {}", id, from, to, e);
            RecorderError::move_failed(id, e)
        })?;

        tracing::info!("Recording moved from {} to {}: {} -> {}", from, to, id, target_id);
        Ok(self.describe(&target, to))
    }

    /// Where the artifact for `id` lives in `location`.
    ///
    /// Ids are bare file stems; anything that would resolve outside the
    /// location's directory is reported as not found.
    fn artifact_path(&self, location: Location, id: &str) -> Result<PathBuf> {
        if !is_plain_id(id) {
            tracing::warn!("Rejected recording id {:?}", id);
            return Err(not_found(id, location));
        }
        Ok(self
            .dir(location)
            .join(format!("{id}.{}", self.codec.extension())))
    }

    /// The path of `id` in `location` if the artifact is there.
    fn existing_artifact(&self, location: Location, id: &str) -> Result<PathBuf> {
        let path = self.artifact_path(location, id)?;
        if path.is_file() {
            Ok(path)
        } else {
            Err(not_found(id, location))
        }
    }

    /// Listing uses the same exact `<id>.<ext>` shape that lookups build, so
    /// every listed id can be acted on.
    fn is_artifact(&self, path: &Path) -> bool {
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            return false;
        };
        is_plain_id(stem)
            && path
                .extension()
                .is_some_and(|ext| ext == self.codec.extension())
            && path.is_file()
    }

    /// Builds an entry from whatever the file on disk says.
    fn describe(&self, path: &Path, location: Location) -> RecordingEntry {
        let id = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let metadata = fs::metadata(path);
        let size_bytes = metadata.as_ref().map(|m| m.len()).unwrap_or(0);
        let created_at = metadata
            .as_ref()
            .ok()
            .and_then(|m| m.created().or_else(|_| m.modified()).ok())
            .map(DateTime::<Local>::from)
            .unwrap_or_else(|| DateTime::<Local>::from(std::time::UNIX_EPOCH));

        let (duration_seconds, preset, status) = match (&metadata, self.codec.probe(path)) {
            (Err(e), _) => (0.0, None, EntryStatus::Damaged(e.to_string())),
            (Ok(_), Ok(info)) => (info.duration_secs(), info.preset(), EntryStatus::Ok),
            (Ok(_), Err(e)) => {
                tracing::debug!("Unreadable recording {}: {}", path.display(), e);
                (0.0, None, EntryStatus::Damaged(e.to_string()))
            }
        };

        RecordingEntry {
            id,
            path: path.to_path_buf(),
            created_at,
            duration_seconds,
            preset,
            size_bytes,
            location,
            status,
        }
    }
}

/// A single visible file-name component: no separators, no `.`/`..`, not hidden.
fn is_plain_id(id: &str) -> bool {
    !id.is_empty()
        && !id.starts_with('.')
        && !id.contains(['/', '\\', '\0'])
        && Path::new(id).file_name() == Some(std::ffi::OsStr::new(id))
}

fn not_found(id: &str, location: Location) -> RecorderError {
    RecorderError::NotFound(format!("no recording '{id}' in {location}"))
}

/// A view of one vault area. Every iteration re-reads the directory.
pub struct Listing<'a> {
    vault: &'a FileVault,
    location: Location,
}

impl<'a> Listing<'a> {
    pub fn location(&self) -> Location {
        self.location
    }

    /// Lazily yields the entries currently on disk, in directory order.
    pub fn iter(&self) -> impl Iterator<Item = RecordingEntry> + 'a {
        let vault = self.vault;
        let location = self.location;
        let dir = vault.dir(location);

        fs::read_dir(dir)
            .inspect_err(|e| tracing::warn!("Failed to read {}: {}", dir.display(), e))
            .into_iter()
            .flatten()
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(move |path| vault.is_artifact(path))
            .map(move |path| vault.describe(&path, location))
    }

    /// Collects the entries ordered by `key`. Storage is not touched.
    pub fn sorted(&self, key: SortKey, order: SortOrder) -> Vec<RecordingEntry> {
        let mut entries: Vec<_> = self.iter().collect();
        sort_entries(&mut entries, key, order);
        entries
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}

impl<'a> IntoIterator for &Listing<'a> {
    type Item = RecordingEntry;
    type IntoIter = Box<dyn Iterator<Item = RecordingEntry> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::recording::QualityPreset;
    use crate::storage::ArtifactInfo;
    use tempfile::TempDir;

    fn vault() -> (TempDir, FileVault) {
        let root = tempfile::tempdir().unwrap();
        let vault =
            FileVault::open(root.path().join("recordings"), root.path().join("trash")).unwrap();
        (root, vault)
    }

    fn silence(samples: &[i16], preset: QualityPreset) -> FinishedRecording<'_> {
        FinishedRecording {
            samples,
            preset,
            started_at: Local::now(),
            duration_secs: preset.duration_secs(samples.len()),
        }
    }

    fn ids(vault: &FileVault, location: Location) -> Vec<String> {
        vault
            .list(location)
            .sorted(SortKey::Name, SortOrder::Ascending)
            .into_iter()
            .map(|e| e.id)
            .collect()
    }

    #[test]
    fn test_open_creates_directories() {
        let root = tempfile::tempdir().unwrap();
        let recordings = root.path().join("a").join("recordings");
        let trash = root.path().join("a").join("trash");
        FileVault::open(&recordings, &trash).unwrap();
        assert!(recordings.is_dir());
        assert!(trash.is_dir());
    }

    #[test]
    fn test_save_then_list_contains_entry() {
        let (_root, vault) = vault();
        let samples = vec![0i16; 44_100 * 2 * 2];
        let saved = vault
            .save(&silence(&samples, QualityPreset::Medium), Some("test1"))
            .unwrap();

        assert_eq!(saved.id, "test1");
        assert_eq!(saved.location, Location::Active);
        assert_eq!(saved.preset, Some(QualityPreset::Medium));
        assert!((saved.duration_seconds - 2.0).abs() <= 1.0 / 44_100.0);

        let listed: Vec<_> = vault.list(Location::Active).iter().collect();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, "test1");
        assert_eq!(listed[0].duration_seconds, saved.duration_seconds);
        assert_eq!(listed[0].preset, Some(QualityPreset::Medium));
        assert_eq!(listed[0].status, EntryStatus::Ok);
    }

    #[test]
    fn test_default_name_is_timestamp_and_unique() {
        let (_root, vault) = vault();
        let samples = vec![0i16; 10];
        let first = vault.save(&silence(&samples, QualityPreset::Low), None).unwrap();
        let second = vault.save(&silence(&samples, QualityPreset::Low), None).unwrap();

        assert!(first.id.starts_with("recording_"));
        assert_ne!(first.id, second.id);
        assert_eq!(vault.list(Location::Active).iter().count(), 2);
    }

    #[test]
    fn test_duplicate_name_is_rejected() {
        let (_root, vault) = vault();
        let samples = vec![1i16; 20];
        vault.save(&silence(&samples, QualityPreset::Low), Some("demo")).unwrap();

        let other = vec![2i16; 40];
        let err = vault
            .save(&silence(&other, QualityPreset::Low), Some("demo"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateName);
        assert_eq!(ids(&vault, Location::Active), ["demo"]);

        let (decoded, _) = vault
            .codec()
            .decode(&vault.get("demo", Location::Active).unwrap().path)
            .unwrap();
        assert_eq!(decoded, samples);
    }

    #[test]
    fn test_invalid_name_writes_nothing() {
        let (_root, vault) = vault();
        let err = vault
            .save(&silence(&[0; 4], QualityPreset::Low), Some("///"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidName);
        assert!(vault.list(Location::Active).is_empty());
    }

    #[test]
    fn test_trash_and_restore_round_trip() {
        let (_root, vault) = vault();
        let samples: Vec<i16> = (0..400).collect();
        let saved = vault
            .save(&silence(&samples, QualityPreset::High), Some("take"))
            .unwrap();
        let original_bytes = fs::read(&saved.path).unwrap();

        let trashed = vault.move_to_trash("take").unwrap();
        assert_eq!(trashed.location, Location::Trash);
        assert!(!vault.contains(Location::Active, "take"));
        assert!(vault.contains(Location::Trash, "take"));

        let restored = vault.restore(&trashed.id).unwrap();
        assert_eq!(restored.id, "take");
        assert_eq!(restored.location, Location::Active);
        assert_eq!(restored.duration_seconds, saved.duration_seconds);
        assert_eq!(restored.preset, saved.preset);
        assert_eq!(fs::read(&restored.path).unwrap(), original_bytes);
        assert!(vault.list(Location::Trash).is_empty());
    }

    #[test]
    fn test_trash_collision_gets_suffix() {
        let (_root, vault) = vault();
        let samples = vec![0i16; 8];
        vault.save(&silence(&samples, QualityPreset::Low), Some("memo")).unwrap();
        vault.move_to_trash("memo").unwrap();
        vault.save(&silence(&samples, QualityPreset::Low), Some("memo")).unwrap();

        let second = vault.move_to_trash("memo").unwrap();
        assert_eq!(second.id, "memo-2");
        assert_eq!(ids(&vault, Location::Trash), ["memo", "memo-2"]);

        // Restoring into an area that has a "memo" again also disambiguates.
        vault.save(&silence(&samples, QualityPreset::Low), Some("memo")).unwrap();
        let restored = vault.restore("memo").unwrap();
        assert_eq!(restored.id, "memo-2");
    }

    #[test]
    fn test_move_missing_id_changes_nothing() {
        let (_root, vault) = vault();
        vault.save(&silence(&[0; 8], QualityPreset::Low), Some("kept")).unwrap();

        let err = vault.move_to_trash("ghost").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(ids(&vault, Location::Active), ["kept"]);
        assert!(vault.list(Location::Trash).is_empty());
        assert_eq!(vault.restore("ghost").unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_purge_is_final() {
        let (_root, vault) = vault();
        vault.save(&silence(&[0; 8], QualityPreset::Low), Some("gone")).unwrap();
        vault.move_to_trash("gone").unwrap();

        vault.purge("gone").unwrap();
        assert_eq!(vault.restore("gone").unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(vault.purge("gone").unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_purge_never_touches_active() {
        let (_root, vault) = vault();
        vault.save(&silence(&[0; 8], QualityPreset::Low), Some("live")).unwrap();

        let err = vault.purge("live").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(vault.contains(Location::Active, "live"));
    }

    #[test]
    fn test_rename_rules() {
        let (_root, vault) = vault();
        let samples = vec![0i16; 8];
        vault.save(&silence(&samples, QualityPreset::Low), Some("a")).unwrap();
        vault.save(&silence(&samples, QualityPreset::Low), Some("b")).unwrap();

        assert_eq!(
            vault.rename("a", "b", Location::Active).unwrap_err().kind(),
            ErrorKind::DuplicateName
        );
        assert_eq!(
            vault.rename("a", "??", Location::Active).unwrap_err().kind(),
            ErrorKind::InvalidName
        );
        assert_eq!(
            vault.rename("zzz", "c", Location::Active).unwrap_err().kind(),
            ErrorKind::NotFound
        );

        let renamed = vault.rename("a", "Interview: part 1", Location::Active).unwrap();
        assert_eq!(renamed.id, "Interview part 1");
        assert_eq!(ids(&vault, Location::Active), ["Interview part 1", "b"]);

        vault.move_to_trash("b").unwrap();
        vault.rename("b", "old b", Location::Trash).unwrap();
        assert_eq!(ids(&vault, Location::Trash), ["old b"]);
    }

    #[test]
    fn test_empty_trash_reports_each_id() {
        let (_root, vault) = vault();
        let samples = vec![0i16; 8];
        for name in ["one", "two", "three"] {
            vault.save(&silence(&samples, QualityPreset::Low), Some(name)).unwrap();
            vault.move_to_trash(name).unwrap();
        }

        let mut report = vault.empty_trash();
        report.purged.sort();
        assert_eq!(report.purged, ["one", "three", "two"]);
        assert!(report.is_complete());
        assert!(vault.list(Location::Trash).is_empty());
    }

    #[test]
    fn test_damaged_files_are_listed_not_fatal() {
        let (_root, vault) = vault();
        vault.save(&silence(&[0; 8], QualityPreset::Low), Some("good")).unwrap();
        fs::write(vault.dir(Location::Active).join("bad.wav"), b"garbage").unwrap();
        fs::write(vault.dir(Location::Active).join("notes.txt"), b"ignored").unwrap();

        let entries = vault
            .list(Location::Active)
            .sorted(SortKey::Name, SortOrder::Ascending);
        assert_eq!(entries.len(), 2);
        assert!(entries[0].is_damaged());
        assert_eq!(entries[0].id, "bad");
        assert!(!entries[1].is_damaged());

        // Damaged entries can still be trashed and purged.
        vault.move_to_trash("bad").unwrap();
        vault.purge("bad").unwrap();
    }

    #[test]
    fn test_listing_reflects_external_changes() {
        let (_root, vault) = vault();
        let listing = vault.list(Location::Active);
        assert_eq!(listing.iter().count(), 0);

        vault.save(&silence(&[0; 8], QualityPreset::Low), Some("late")).unwrap();
        assert_eq!(listing.iter().count(), 1);

        fs::remove_file(vault.dir(Location::Active).join("late.wav")).unwrap();
        assert_eq!((&listing).into_iter().count(), 0);
    }

    #[test]
    fn test_sort_by_duration() {
        let (_root, vault) = vault();
        vault.save(&silence(&[0; 300], QualityPreset::Low), Some("mid")).unwrap();
        vault.save(&silence(&[0; 100], QualityPreset::Low), Some("short")).unwrap();
        vault.save(&silence(&[0; 900], QualityPreset::Low), Some("long")).unwrap();

        let order: Vec<_> = vault
            .list(Location::Active)
            .sorted(SortKey::Duration, SortOrder::Descending)
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(order, ["long", "mid", "short"]);
    }

    #[test]
    fn test_stale_temp_files_swept_on_open() {
        let root = tempfile::tempdir().unwrap();
        let recordings = root.path().join("recordings");
        fs::create_dir_all(&recordings).unwrap();
        fs::write(recordings.join(".half.wav.partial"), b"x").unwrap();

        let vault = FileVault::open(&recordings, root.path().join("trash")).unwrap();
        assert!(!recordings.join(".half.wav.partial").exists());
        assert!(vault.list(Location::Active).is_empty());
    }

    struct BrokenEncoder;

    impl AudioCodec for BrokenEncoder {
        fn extension(&self) -> &'static str {
            "wav"
        }

        fn encode(&self, _samples: &[i16], _preset: QualityPreset) -> io::Result<Vec<u8>> {
            Err(io::Error::other("encoder crashed"))
        }

        fn probe(&self, path: &Path) -> anyhow::Result<ArtifactInfo> {
            WavCodec.probe(path)
        }

        fn decode(&self, path: &Path) -> anyhow::Result<(Vec<i16>, ArtifactInfo)> {
            WavCodec.decode(path)
        }
    }

    fn dir_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_path_like_ids_are_not_found() {
        let (_root, vault) = vault();
        vault.save(&silence(&[0; 8], QualityPreset::Low), Some("live")).unwrap();

        for id in ["../recordings/live", "..", ".", "a/b", "a\\b", ""] {
            assert_eq!(vault.purge(id).unwrap_err().kind(), ErrorKind::NotFound, "{id}");
            assert_eq!(vault.restore(id).unwrap_err().kind(), ErrorKind::NotFound, "{id}");
            assert!(!vault.contains(Location::Trash, id));
        }
        assert_eq!(
            vault.get("../recordings/live", Location::Trash).unwrap_err().kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            vault
                .rename("../recordings/live", "x", Location::Trash)
                .unwrap_err()
                .kind(),
            ErrorKind::NotFound
        );

        assert_eq!(ids(&vault, Location::Active), ["live"]);
        assert!(vault.list(Location::Trash).is_empty());
    }

    #[test]
    fn test_only_exact_extension_is_listed() {
        let (_root, vault) = vault();
        let saved = vault.save(&silence(&[0; 8], QualityPreset::Low), Some("memo")).unwrap();
        fs::copy(&saved.path, vault.dir(Location::Active).join("Memo.WAV")).unwrap();

        assert_eq!(ids(&vault, Location::Active), ["memo"]);
        for entry in vault.list(Location::Active).iter() {
            vault.move_to_trash(&entry.id).unwrap();
        }
        assert_eq!(dir_names(vault.dir(Location::Active)), ["Memo.WAV"]);
    }

    #[test]
    fn test_encoder_failure_leaves_nothing() {
        let root = tempfile::tempdir().unwrap();
        let vault = FileVault::with_codec(
            root.path().join("recordings"),
            root.path().join("trash"),
            Box::new(BrokenEncoder),
        )
        .unwrap();

        for name in [Some("take"), None] {
            let err = vault
                .save(&silence(&[0; 8], QualityPreset::Low), name)
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::WriteFailed);
        }
        assert!(vault.list(Location::Active).is_empty());
        assert!(dir_names(vault.dir(Location::Active)).is_empty());
    }

    #[test]
    fn test_blocked_temp_file_is_write_failed() {
        let (_root, vault) = vault();
        fs::create_dir(vault.dir(Location::Active).join(".take.wav.partial")).unwrap();

        let err = vault
            .save(&silence(&[0; 8], QualityPreset::Low), Some("take"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::WriteFailed);
        assert!(!vault.contains(Location::Active, "take"));
        assert!(vault.list(Location::Active).is_empty());
    }

    #[test]
    fn test_name_taken_during_save_is_duplicate() {
        let (_root, vault) = vault();
        // A directory occupies the target, so the pre-check passes but the rename cannot.
        fs::create_dir(vault.dir(Location::Active).join("take.wav")).unwrap();

        let err = vault
            .save(&silence(&[0; 8], QualityPreset::Low), Some("take"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateName);
        assert_eq!(dir_names(vault.dir(Location::Active)), ["take.wav"]);
    }

    #[test]
    fn test_blocked_destination_is_move_failed() {
        let (root, vault) = vault();
        let samples: Vec<i16> = (0..64).collect();
        let saved = vault
            .save(&silence(&samples, QualityPreset::Low), Some("keep"))
            .unwrap();
        let bytes = fs::read(&saved.path).unwrap();

        let trash = root.path().join("trash");
        fs::remove_dir(&trash).unwrap();
        fs::write(&trash, b"not a directory").unwrap();

        let err = vault.move_to_trash("keep").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MoveFailed);
        assert_eq!(ids(&vault, Location::Active), ["keep"]);
        assert_eq!(fs::read(&saved.path).unwrap(), bytes);
    }

    #[test]
    fn test_blocked_restore_leaves_trash_intact() {
        let (root, vault) = vault();
        vault.save(&silence(&[3; 16], QualityPreset::Low), Some("back")).unwrap();
        vault.move_to_trash("back").unwrap();

        let recordings = root.path().join("recordings");
        fs::remove_dir(&recordings).unwrap();
        fs::write(&recordings, b"not a directory").unwrap();

        let err = vault.restore("back").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MoveFailed);
        assert_eq!(ids(&vault, Location::Trash), ["back"]);
    }
}
