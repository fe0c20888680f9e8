//! Recording session state machine.
//!
//! ```text
//! Idle ──start──▶ Recording ◀──resume── Paused
//!                    │  └──────pause──────▲ │
//!                    └──stop──▶ Stopped ◀─stop
//!                               │   ▲
//!                       preview ▼   │ playback ends
//!                             Previewing
//! Recording | Paused | Stopped ──cancel──▶ Cancelled
//! ```
//!
//! Sessions come from a [`Recorder`], which hands out at most one at a time.

use super::buffer::CaptureBuffer;
use super::device::{AudioDevice, FrameRead, InputHandle, PlaybackControl};
use super::preset::QualityPreset;
use crate::error::{RecorderError, Result};
use chrono::{DateTime, Local};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Upper bound on chunks drained per `pump` so a flooding device cannot starve the UI.
const MAX_CHUNKS_PER_PUMP: usize = 1024;

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Recording,
    Paused,
    /// Capture finished; audio is finalized and awaits save, preview or cancel.
    Stopped,
    Previewing,
    /// Audio was thrown away.
    Cancelled,
}

impl SessionState {
    pub fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Recording => "recording",
            Self::Paused => "paused",
            Self::Stopped => "stopped",
            Self::Previewing => "previewing",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether the input stream is (or may be) delivering frames.
    pub fn is_capturing(self) -> bool {
        matches!(self, Self::Recording | Self::Paused)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Hands out recording sessions, at most one at a time.
#[derive(Debug, Default, Clone)]
pub struct Recorder {
    active: Arc<AtomicBool>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an idle session bound to `device`.
    ///
    /// # Errors
    /// `SessionAlreadyActive` while another session from this recorder is alive.
    pub fn session<D: AudioDevice>(&self, device: D) -> Result<RecordingSession<D>> {
        if self
            .active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(RecorderError::SessionAlreadyActive);
        }

        Ok(RecordingSession::new(
            device,
            SessionGuard {
                active: Arc::clone(&self.active),
            },
        ))
    }

    #[cfg(test)]
    pub fn has_active_session(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

/// Releases the recorder's slot when the session is dropped.
#[derive(Debug)]
struct SessionGuard {
    active: Arc<AtomicBool>,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.active.store(false, Ordering::Release);
    }
}

/// Finalized audio of a stopped session, ready to be saved.
#[derive(Debug, Clone, Copy)]
pub struct FinishedRecording<'a> {
    pub samples: &'a [i16],
    pub preset: QualityPreset,
    pub started_at: DateTime<Local>,
    pub duration_secs: f64,
}

/// One capture cycle: record, pause/resume, stop, preview, then save or cancel.
pub struct RecordingSession<D: AudioDevice> {
    device: D,
    state: SessionState,
    preset: QualityPreset,
    buffer: Option<CaptureBuffer>,
    input: Option<InputHandle>,
    started_at: Option<DateTime<Local>>,
    started_instant: Option<Instant>,
    /// Total time spent paused, excluding any pause in progress
    paused_total: Duration,
    paused_since: Option<Instant>,
    /// Active time frozen at stop
    final_elapsed: Option<Duration>,
    duration_secs: f64,
    _guard: SessionGuard,
}

impl<D: AudioDevice> RecordingSession<D> {
    fn new(device: D, guard: SessionGuard) -> Self {
        Self {
            device,
            state: SessionState::Idle,
            preset: QualityPreset::default(),
            buffer: None,
            input: None,
            started_at: None,
            started_instant: None,
            paused_total: Duration::ZERO,
            paused_since: None,
            final_elapsed: None,
            duration_secs: 0.0,
            _guard: guard,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn preset(&self) -> QualityPreset {
        self.preset
    }

    pub fn started_at(&self) -> Option<DateTime<Local>> {
        self.started_at
    }

    /// Opens the input stream and begins capturing.
    ///
    /// # Errors
    /// - `SessionAlreadyActive` if this session has already been started
    /// - `DeviceUnavailable` if the input cannot be opened; the session stays idle
    pub fn start(&mut self, preset: QualityPreset) -> Result<()> {
        if self.state != SessionState::Idle {
            return Err(RecorderError::SessionAlreadyActive);
        }

        let handle = self
            .device
            .open_input(preset.sample_rate(), preset.channels())
            .inspect_err(|e| tracing::error!("Failed to start recording: {}", e))?;

        self.preset = preset;
        self.input = Some(handle);
        self.buffer = Some(CaptureBuffer::new(preset.channels()));
        self.started_at = Some(Local::now());
        self.started_instant = Some(Instant::now());
        self.state = SessionState::Recording;

        tracing::info!(
            "Recording started: preset={}, {}Hz, {} channels",
            preset,
            preset.sample_rate(),
            preset.channels()
        );
        Ok(())
    }

    /// Drains every chunk the device has delivered into the buffer.
    ///
    /// While paused the chunks are read and dropped so nothing queues up behind
    /// the pause. Returns the number of samples kept.
    pub fn pump(&mut self) -> Result<usize> {
        if !self.state.is_capturing() {
            return Ok(0);
        }
        let (Some(input), Some(buffer)) = (self.input.as_ref(), self.buffer.as_mut()) else {
            return Ok(0);
        };

        let mut kept = 0;
        for _ in 0..MAX_CHUNKS_PER_PUMP {
            match self.device.read_frames(input) {
                FrameRead::Chunk(chunk) => {
                    let len = chunk.len();
                    if buffer.append(chunk)? {
                        kept += len;
                    }
                }
                FrameRead::Idle => break,
                FrameRead::EndOfStream => {
                    tracing::warn!("Input stream ended unexpectedly");
                    break;
                }
            }
        }
        Ok(kept)
    }

    /// Stops accepting frames without closing the device.
    ///
    /// # Errors
    /// `InvalidTransition` unless recording.
    pub fn pause(&mut self) -> Result<()> {
        self.expect_state("pause", &[SessionState::Recording])?;

        // Keep what was captured before the pause.
        self.pump()?;
        self.buffer_mut()?.close_for_pause()?;
        self.paused_since = Some(Instant::now());
        self.state = SessionState::Paused;
        tracing::debug!("Recording paused");
        Ok(())
    }

    /// Accepts frames again; the new audio directly follows the old.
    ///
    /// # Errors
    /// `InvalidTransition` unless paused.
    pub fn resume(&mut self) -> Result<()> {
        self.expect_state("resume", &[SessionState::Paused])?;

        // Discard whatever arrived while paused.
        self.pump()?;
        self.buffer_mut()?.reopen()?;
        if let Some(since) = self.paused_since.take() {
            self.paused_total += since.elapsed();
        }
        self.state = SessionState::Recording;
        tracing::debug!("Recording resumed");
        Ok(())
    }

    /// Closes the input stream and finalizes the buffer. Returns the duration in seconds.
    ///
    /// # Errors
    /// `InvalidTransition` unless recording or paused.
    pub fn stop(&mut self) -> Result<f64> {
        self.expect_state("stop", &[SessionState::Recording, SessionState::Paused])?;

        if self.state == SessionState::Recording {
            self.pump()?;
        }
        self.close_input();
        if let Some(since) = self.paused_since.take() {
            self.paused_total += since.elapsed();
        }
        self.final_elapsed = Some(self.active_elapsed());

        let preset = self.preset;
        let buffer = self.buffer_mut()?;
        let sample_count = buffer.finalize()?.len();
        self.duration_secs = preset.duration_secs(sample_count);
        self.state = SessionState::Stopped;

        tracing::info!(
            "Recording stopped: {:.2}s ({} samples at {}Hz)",
            self.duration_secs,
            sample_count,
            preset.sample_rate()
        );
        Ok(self.duration_secs)
    }

    /// Plays the finalized audio without touching the disk.
    ///
    /// Blocks until playback ends or `control` is stopped, then returns to `Stopped`.
    /// Pausing through `control` holds playback in `Previewing`.
    ///
    /// # Errors
    /// - `InvalidTransition` unless stopped
    /// - `DeviceUnavailable` if playback cannot start
    pub fn preview(&mut self, control: &PlaybackControl) -> Result<()> {
        self.expect_state("preview", &[SessionState::Stopped])?;

        self.state = SessionState::Previewing;
        let preset = self.preset;
        let result = match self.buffer.as_mut() {
            Some(buffer) => buffer.finalize().and_then(|samples| {
                tracing::debug!("Previewing {} samples", samples.len());
                self.device
                    .play(samples, preset.sample_rate(), preset.channels(), control)
            }),
            None => Err(RecorderError::BufferDisposed),
        };
        self.state = SessionState::Stopped;
        result
    }

    /// Throws the audio away.
    ///
    /// # Errors
    /// `InvalidTransition` unless recording, paused or stopped.
    pub fn cancel(&mut self) -> Result<()> {
        self.expect_state(
            "cancel",
            &[
                SessionState::Recording,
                SessionState::Paused,
                SessionState::Stopped,
            ],
        )?;

        self.close_input();
        if let Some(buffer) = self.buffer.as_mut() {
            buffer.discard();
        }
        self.paused_since = None;
        self.state = SessionState::Cancelled;
        tracing::info!("Recording discarded");
        Ok(())
    }

    /// Brings the session to a safe stopping point after an interrupt request.
    ///
    /// Returns `true` when captured audio is waiting for a save-or-discard decision.
    pub fn interrupt(&mut self) -> Result<bool> {
        match self.state {
            SessionState::Recording | SessionState::Paused => {
                tracing::info!("Interrupt received while {}: stopping", self.state);
                self.stop()?;
                Ok(true)
            }
            SessionState::Stopped | SessionState::Previewing => Ok(true),
            SessionState::Idle | SessionState::Cancelled => Ok(false),
        }
    }

    /// The stopped session's audio.
    ///
    /// # Errors
    /// `InvalidTransition` unless stopped.
    pub fn recording(&mut self) -> Result<FinishedRecording<'_>> {
        self.expect_state("save", &[SessionState::Stopped])?;

        let preset = self.preset;
        let duration_secs = self.duration_secs;
        let started_at = self.started_at.unwrap_or_else(Local::now);
        let samples = self.buffer_mut()?.finalize()?;
        Ok(FinishedRecording {
            samples,
            preset,
            started_at,
            duration_secs,
        })
    }

    /// Wall-clock recording time, excluding pauses.
    pub fn elapsed(&self) -> Duration {
        self.final_elapsed.unwrap_or_else(|| self.active_elapsed())
    }

    /// Seconds of audio captured so far.
    pub fn captured_secs(&self) -> f64 {
        match self.state {
            SessionState::Stopped | SessionState::Previewing => self.duration_secs,
            _ => self
                .buffer
                .as_ref()
                .map(|b| self.preset.duration_secs(b.sample_count()))
                .unwrap_or(0.0),
        }
    }

    /// The most recent samples, for the level meter.
    pub fn recent_samples(&self, count: usize) -> Vec<i16> {
        self.buffer
            .as_ref()
            .map(|b| b.tail(count))
            .unwrap_or_default()
    }

    fn active_elapsed(&self) -> Duration {
        let Some(started) = self.started_instant else {
            return Duration::ZERO;
        };
        let mut paused = self.paused_total;
        if let Some(since) = self.paused_since {
            paused += since.elapsed();
        }
        started.elapsed().saturating_sub(paused)
    }

    fn close_input(&mut self) {
        if let Some(handle) = self.input.take() {
            self.device.close(handle);
        }
    }

    fn buffer_mut(&mut self) -> Result<&mut CaptureBuffer> {
        self.buffer.as_mut().ok_or(RecorderError::BufferDisposed)
    }

    fn expect_state(&self, action: &'static str, allowed: &[SessionState]) -> Result<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(RecorderError::InvalidTransition {
                action,
                state: self.state.name(),
            })
        }
    }
}

impl<D: AudioDevice> Drop for RecordingSession<D> {
    fn drop(&mut self) {
        self.close_input();
    }
}
