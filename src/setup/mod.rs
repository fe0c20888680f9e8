//! First-run setup.
//!
//! Writes the default config file when it is missing and refreshes the version
//! stamp when an older release wrote it.

pub mod version;

use std::path::Path;
use version::SetupStatus;

/// Embedded default configuration template.
const DEFAULT_CONFIG: &str = include_str!("../../environments/voicerec.toml");

/// Current application version from Cargo.toml
const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Brings the config file at `config_path` up to date.
///
/// A missing file is created from the template. An existing file is never
/// overwritten; only its version stamp is updated.
///
/// # Errors
/// Returns an error if any file operation fails.
pub fn run_setup(config_path: &Path) -> anyhow::Result<()> {
    match version::check_setup_needed(config_path)? {
        SetupStatus::Missing => {
            if let Some(parent) = config_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let full_config = format!(r#"config_version = "{CURRENT_VERSION}""#) + DEFAULT_CONFIG;
            std::fs::write(config_path, full_config)?;
            tracing::info!("Created default config at {}", config_path.display());
        }
        SetupStatus::Outdated(found) => {
            version::stamp_current_version(config_path)?;
            tracing::info!(
                "Config version updated from {} to {}",
                found.as_deref().unwrap_or("unknown (legacy config)"),
                CURRENT_VERSION
            );
        }
        SetupStatus::Current => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RecorderConfig;

    #[test]
    fn test_template_parses_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("voicerec.toml");
        run_setup(&path).unwrap();

        let config = RecorderConfig::load_from(&path).unwrap();
        assert_eq!(config.config_version.as_deref(), Some(CURRENT_VERSION));
        assert_eq!(
            RecorderConfig {
                config_version: None,
                ..config
            },
            RecorderConfig::default()
        );
    }

    #[test]
    fn test_existing_config_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("voicerec.toml");
        std::fs::write(&path, "[ui]\nreference_level_db = -6\n").unwrap();

        run_setup(&path).unwrap();
        let config = RecorderConfig::load_from(&path).unwrap();
        assert_eq!(config.ui.reference_level_db, -6);
        assert_eq!(config.config_version.as_deref(), Some(CURRENT_VERSION));
    }
}
