//! Application command handlers for voicerec.
//!
//! Each submodule handles one command; helpers shared by several of them live here.
//!
//! # Commands
//! - `record`: Capture audio, then preview, save or discard it
//! - `list`: Print recordings or trash contents
//! - `browse`: Interactive library with trash management
//! - `manage`: Trash, restore, purge, rename and empty-trash
//! - `play`: Play a saved recording
//! - `config`: Open configuration file in user's preferred editor
//! - `logs`: Display recent log entries

pub mod browse;
pub mod config;
pub mod list;
pub mod logs;
pub mod manage;
pub mod play;
pub mod record;

pub use browse::handle_browse;
pub use config::handle_config;
pub use list::handle_list;
pub use logs::handle_logs;
pub use manage::{handle_empty_trash, handle_purge, handle_rename, handle_restore, handle_trash};
pub use play::handle_play;
pub use record::handle_record;

use crate::config::RecorderConfig;
use crate::storage::{FileVault, Location};
use anyhow::Context;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Opens the vault at the configured directories.
pub(crate) fn open_vault(config: &RecorderConfig) -> anyhow::Result<FileVault> {
    let recordings_dir = config.recordings_dir()?;
    let trash_dir = config.trash_dir()?;
    FileVault::open(&recordings_dir, &trash_dir).with_context(|| {
        format!(
            "Failed to open recordings at {} and {}",
            recordings_dir.display(),
            trash_dir.display()
        )
    })
}

pub(crate) fn location_for(trash: bool) -> Location {
    if trash {
        Location::Trash
    } else {
        Location::Active
    }
}

/// Routes SIGINT and SIGTERM into a shared flag.
///
/// Long-running loops poll the flag and wind down cleanly instead of dying with
/// the terminal in raw mode.
pub(crate) fn install_interrupt_flag() -> anyhow::Result<Arc<AtomicBool>> {
    let interrupt = Arc::new(AtomicBool::new(false));

    let on_sigint = Arc::clone(&interrupt);
    ctrlc::set_handler(move || {
        on_sigint.store(true, Ordering::Release);
    })
    .context("Failed to register Ctrl-C handler")?;

    signal_hook::flag::register(signal_hook::consts::SIGTERM, Arc::clone(&interrupt))
        .context("Failed to register SIGTERM handler")?;

    Ok(interrupt)
}
