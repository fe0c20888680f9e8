//! Configuration file management for voicerec.
//!
//! The configuration lives in `~/.config/voicerec/voicerec.toml`. Every field has a
//! default, so a partial or older file still loads.

use crate::recording::QualityPreset;
use crate::storage::{SortKey, SortOrder};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Capture settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Input device. Options:
    /// - "default" for the system default device
    /// - numeric index (0, 1, 2, etc.)
    /// - exact device name
    pub device: String,
    /// Quality preset used when `record` is not given `--preset`
    pub preset: QualityPreset,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: "default".to_string(),
            preset: QualityPreset::default(),
        }
    }
}

/// Where recordings are kept. Empty paths mean the platform data directory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub recordings_dir: String,
    pub trash_dir: String,
}

/// Display preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Initial sort key for listings and the browser
    pub default_sort: SortKey,
    pub descending: bool,
    /// Reference level in dBFS for a full meter (typical: -20 to -6 dBFS)
    pub reference_level_db: i8,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            default_sort: SortKey::Created,
            descending: true,
            reference_level_db: -20,
        }
    }
}

impl UiConfig {
    pub fn sort_order(&self) -> SortOrder {
        SortOrder::from_descending(self.descending)
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// Version of the template the file was created from
    pub config_version: Option<String>,
    pub audio: AudioConfig,
    pub storage: StorageConfig,
    pub ui: UiConfig,
}

impl RecorderConfig {
    /// Loads configuration from the user's config directory.
    ///
    /// # Errors
    /// - If the config directory cannot be determined
    /// - If the config file cannot be read
    /// - If the TOML is malformed
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&get_config_path()?)
    }

    /// Loads configuration from an explicit path.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Invalid configuration in {}", path.display()))
    }

    /// Saves configuration to the user's config directory.
    ///
    /// # Errors
    /// - If the config directory cannot be determined or created
    /// - If the file cannot be written
    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = get_config_path()?;
        let config_content = toml::to_string_pretty(self)?;
        fs::write(&config_path, config_content)?;
        tracing::info!("Configuration saved");
        Ok(())
    }

    /// Resolved recordings directory.
    pub fn recordings_dir(&self) -> anyhow::Result<PathBuf> {
        resolve_dir(&self.storage.recordings_dir, "recordings")
    }

    /// Resolved trash directory.
    pub fn trash_dir(&self) -> anyhow::Result<PathBuf> {
        resolve_dir(&self.storage.trash_dir, "trash")
    }
}

/// Expands a configured directory, falling back to `<data_dir>/voicerec/<fallback>`.
fn resolve_dir(configured: &str, fallback: &str) -> anyhow::Result<PathBuf> {
    let configured = configured.trim();
    if configured.is_empty() {
        return Ok(data_dir()?.join(fallback));
    }
    if let Some(rest) = configured.strip_prefix("~/") {
        let home = dirs::home_dir().context("Could not find home directory")?;
        return Ok(home.join(rest));
    }
    Ok(PathBuf::from(configured))
}

/// `~/.local/share/voicerec` or the platform equivalent.
pub fn data_dir() -> anyhow::Result<PathBuf> {
    let base = dirs::data_local_dir().context("Could not determine data directory")?;
    Ok(base.join("voicerec"))
}

/// Retrieves the path to the config file, creating its directory.
///
/// # Errors
/// - If the home directory cannot be determined
/// - If the config directory cannot be created
pub fn get_config_path() -> Result<PathBuf, std::io::Error> {
    let home = dirs::home_dir().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Could not find home directory",
        )
    })?;
    let config_dir = home.join(".config").join("voicerec");
    fs::create_dir_all(&config_dir)?;

    Ok(config_dir.join("voicerec.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: RecorderConfig = toml::from_str(
            r#"
            [audio]
            preset = "low"
            "#,
        )
        .unwrap();

        assert_eq!(config.audio.preset, QualityPreset::Low);
        assert_eq!(config.audio.device, "default");
        assert_eq!(config.ui.default_sort, SortKey::Created);
        assert!(config.ui.descending);
        assert_eq!(config.ui.reference_level_db, -20);
    }

    #[test]
    fn test_full_file_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("voicerec.toml");
        fs::write(
            &path,
            r#"
            config_version = "0.1.0"

            [audio]
            device = "USB Mic"
            preset = "high"

            [storage]
            recordings_dir = "/tmp/rec"
            trash_dir = ""

            [ui]
            default_sort = "duration"
            descending = false
            reference_level_db = -12
            "#,
        )
        .unwrap();

        let config = RecorderConfig::load_from(&path).unwrap();
        assert_eq!(config.config_version.as_deref(), Some("0.1.0"));
        assert_eq!(config.audio.device, "USB Mic");
        assert_eq!(config.ui.sort_order(), SortOrder::Ascending);
        assert_eq!(config.recordings_dir().unwrap(), PathBuf::from("/tmp/rec"));
        assert!(config.trash_dir().unwrap().ends_with("voicerec/trash"));
    }

    #[test]
    fn test_unknown_preset_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("voicerec.toml");
        fs::write(&path, "[audio]\npreset = \"ultra\"\n").unwrap();
        assert!(RecorderConfig::load_from(&path).is_err());
    }
}
