//! Interactive recording.
//!
//! Captures from the configured input device with a live level meter, then lets
//! the user preview, save or discard the take. SIGINT, SIGTERM and Ctrl+C stop
//! capture and ask what to do with the audio; SIGUSR1 stops and saves straight
//! away, so window managers can bind a key to "finish recording".

use super::{install_interrupt_flag, open_vault};
use crate::config::RecorderConfig;
use crate::error::RecorderError;
use crate::recording::ui::SessionView;
use crate::recording::{
    AudioDevice, CpalDevice, QualityPreset, Recorder, RecorderTui, RecordingCommand,
    RecordingSession, SessionState,
};
use crate::storage::{FileVault, RecordingEntry};
use crate::ui::{play_until_key, show_error_screen};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Samples per channel fed to the level meter each frame (50 ms at 44.1 kHz).
const METER_WINDOW_FRAMES: usize = 2205;

/// How an interactive session ended.
enum Outcome {
    Saved(RecordingEntry),
    Discarded,
}

/// Records one take and saves or discards it.
///
/// # Errors
/// - If the configuration cannot be loaded
/// - If the input device cannot be opened
/// - If the terminal UI fails
pub async fn handle_record(
    preset: Option<QualityPreset>,
    name: Option<String>,
) -> anyhow::Result<()> {
    tracing::info!("=== voicerec Recorder Started ===");

    let config = match RecorderConfig::load() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("Failed to load configuration: {err:#}");
            show_error_screen(&format!(
                "Configuration Error:\n\n{err:#}\n\nPlease check your ~/.config/voicerec/voicerec.toml file and try again."
            ))?;
            return Err(err.context("Configuration error"));
        }
    };
    let preset = preset.unwrap_or(config.audio.preset);
    tracing::info!(
        "Configuration loaded: device={}, preset={}, reference_level={}dBFS",
        config.audio.device,
        preset,
        config.ui.reference_level_db
    );

    let vault = open_vault(&config)?;
    let interrupt = install_interrupt_flag()?;
    let save_now = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGUSR1, Arc::clone(&save_now))
        .map_err(|e| anyhow::anyhow!("Failed to register signal handler: {e}"))?;

    let recorder = Recorder::new();
    let mut session = recorder.session(CpalDevice::new(config.audio.device.clone()))?;

    if let Err(e) = session.start(preset) {
        show_error_screen(&format!(
            "Recording Error:\n\n{e}\n\nPlease check the audio device in your configuration and try again."
        ))?;
        return Err(e.into());
    }

    let mut tui = RecorderTui::new(config.ui.reference_level_db)?;
    if let Some(name) = &name {
        tui.set_default_name(name);
    }

    let controls = Controls {
        vault: &vault,
        name: name.as_deref(),
        interrupt: &interrupt,
        save_now: &save_now,
    };
    let outcome = controls.run(&mut session, &mut tui);
    tui.cleanup()?;

    match outcome? {
        Outcome::Saved(entry) => {
            println!(
                "Saved {} ({}, {})",
                entry.path.display(),
                entry.duration_label(),
                entry.size_label()
            );
        }
        Outcome::Discarded => println!("Recording discarded."),
    }
    Ok(())
}

/// Everything the recording loop reacts to besides the session itself.
struct Controls<'a> {
    vault: &'a FileVault,
    /// Name given on the command line
    name: Option<&'a str>,
    interrupt: &'a AtomicBool,
    save_now: &'a AtomicBool,
}

impl Controls<'_> {
    fn run<D: AudioDevice>(
        &self,
        session: &mut RecordingSession<D>,
        tui: &mut RecorderTui,
    ) -> anyhow::Result<Outcome> {
        let meter_window = METER_WINDOW_FRAMES * session.preset().channels() as usize;
        let mut asked_after_interrupt = false;
        let mut frame_count = 0u64;

        loop {
            session.pump()?;

            if self.save_now.swap(false, Ordering::AcqRel) {
                tracing::info!("Received SIGUSR1: stopping and saving");
                return self.save_without_prompt(session);
            }

            if self.interrupt.swap(false, Ordering::AcqRel) {
                if !session.interrupt()? {
                    return Ok(Outcome::Discarded);
                }
                if asked_after_interrupt {
                    // A second interrupt while the decision is pending keeps the audio.
                    tracing::info!("Repeated interrupt: saving with default name");
                    return self.save_without_prompt(session);
                }
                asked_after_interrupt = true;
                tui.set_status("Interrupted. Save (s) or discard (d)? Interrupt again to save.");
            }

            frame_count += 1;
            if frame_count % 200 == 0 && session.state() == SessionState::Recording {
                tracing::debug!("Recording: {:.1}s captured", session.captured_secs());
            }

            let recent = session.recent_samples(meter_window);
            tui.render(&SessionView {
                state: session.state(),
                elapsed: session.elapsed(),
                captured_secs: session.captured_secs(),
                recent: &recent,
            })?;

            match tui.handle_input(session.state())? {
                RecordingCommand::Continue => {}
                RecordingCommand::TogglePause => {
                    if session.state() == SessionState::Paused {
                        session.resume()?;
                    } else {
                        session.pause()?;
                    }
                }
                RecordingCommand::Stop => {
                    session.stop()?;
                    tui.clear_status();
                }
                RecordingCommand::Preview => self.preview(session, tui)?,
                RecordingCommand::Save(entered) => {
                    let name = entered.as_deref().or(self.name);
                    match self.save(session, name) {
                        Ok(entry) => return Ok(Outcome::Saved(entry)),
                        Err(e) if e.kind().is_name_problem() => {
                            tui.set_status(e.to_string());
                            tui.prompt_for_name(name.unwrap_or_default());
                        }
                        Err(e) => {
                            tracing::error!("Save failed: {}", e);
                            tui.set_status(format!("{e}. Try again or discard."));
                        }
                    }
                }
                RecordingCommand::Discard => {
                    session.cancel()?;
                    return Ok(Outcome::Discarded);
                }
                RecordingCommand::Interrupt => self.interrupt.store(true, Ordering::Release),
            }
        }
    }

    fn preview<D: AudioDevice>(
        &self,
        session: &mut RecordingSession<D>,
        tui: &mut RecorderTui,
    ) -> anyhow::Result<()> {
        tui.clear_status();
        tui.render(&SessionView {
            state: SessionState::Previewing,
            elapsed: session.elapsed(),
            captured_secs: session.captured_secs(),
            recent: &[],
        })?;

        if let Err(e) = play_until_key(self.interrupt, |control| session.preview(control)) {
            tracing::warn!("Preview failed: {}", e);
            tui.set_status(format!("Preview failed: {e}"));
        }
        Ok(())
    }

    fn save<D: AudioDevice>(
        &self,
        session: &mut RecordingSession<D>,
        name: Option<&str>,
    ) -> Result<RecordingEntry, RecorderError> {
        let recording = session.recording()?;
        self.vault.save(&recording, name)
    }

    /// Stops if needed and saves, falling back to a timestamp id when the
    /// command-line name cannot be used.
    fn save_without_prompt<D: AudioDevice>(
        &self,
        session: &mut RecordingSession<D>,
    ) -> anyhow::Result<Outcome> {
        if session.state().is_capturing() {
            session.stop()?;
        }
        let entry = match self.save(session, self.name) {
            Err(e) if e.kind().is_name_problem() => {
                tracing::warn!("{}; saving under a timestamp instead", e);
                self.save(session, None)?
            }
            other => other?,
        };
        Ok(Outcome::Saved(entry))
    }
}
