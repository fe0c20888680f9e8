//! Interactive library browser.

use super::{install_interrupt_flag, open_vault};
use crate::config::RecorderConfig;
use crate::library::{Browser, LibraryViewer};
use crate::recording::CpalDevice;

/// Opens the library screen on the active recordings.
///
/// # Errors
/// - If the configuration cannot be loaded
/// - If the terminal UI fails
pub async fn handle_browse() -> anyhow::Result<()> {
    tracing::info!("=== voicerec Library ===");

    let config = RecorderConfig::load()?;
    let vault = open_vault(&config)?;
    let interrupt = install_interrupt_flag()?;

    let browser = Browser::new(&vault, config.ui.default_sort, config.ui.sort_order());
    let device = CpalDevice::new(config.audio.device.clone());
    let mut viewer = LibraryViewer::new(browser, device, &interrupt)?;
    viewer.run()?;

    tracing::debug!("Library closed");
    Ok(())
}
