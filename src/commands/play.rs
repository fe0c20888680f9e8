//! Plays a saved recording on the default output device.

use super::{install_interrupt_flag, location_for, open_vault};
use crate::config::RecorderConfig;
use crate::library::play_entry;
use crate::recording::CpalDevice;
use crate::ui::play_until_key;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};

/// Plays `id` from the recordings, or from the trash when `trash` is set.
///
/// Space pauses and resumes; any other key stops playback early.
pub async fn handle_play(id: &str, trash: bool) -> anyhow::Result<()> {
    let config = RecorderConfig::load()?;
    let vault = open_vault(&config)?;
    let entry = vault.get(id, location_for(trash))?;
    let interrupt = install_interrupt_flag()?;

    println!(
        "Playing '{}' ({}). Space pauses, any other key stops.",
        entry.id,
        entry.duration_label()
    );
    let mut device = CpalDevice::new(config.audio.device.clone());

    enable_raw_mode()?;
    let result = play_until_key(&interrupt, |control| {
        play_entry(&vault, &entry, &mut device, control)
    });
    disable_raw_mode()?;
    result?;

    tracing::info!("Playback finished for {}", entry.id);
    Ok(())
}
