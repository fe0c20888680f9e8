//! Configuration management for voicerec.
//!
//! This module handles loading and saving application configuration from a TOML
//! file in the user's config directory, and resolving where recordings are stored.

pub mod file;

pub use file::{data_dir, get_config_path, AudioConfig, RecorderConfig, StorageConfig, UiConfig};
