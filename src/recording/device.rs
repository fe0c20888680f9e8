//! The audio hardware boundary consumed by [`crate::recording::RecordingSession`].
//!
//! A device opens input streams that deliver chunks of interleaved i16 samples and
//! plays finished audio back. The real implementation lives in `cpal_device`; tests
//! drive sessions through the scripted device in [`mock`].

use crate::error::Result;
use std::sync::atomic::{AtomicBool, Ordering};

/// Owned handle to an open input stream. Closing consumes it.
#[derive(Debug, PartialEq, Eq)]
pub struct InputHandle {
    id: u64,
}

impl InputHandle {
    pub fn new(id: u64) -> Self {
        Self { id }
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

/// Outcome of polling an input stream.
#[derive(Debug, PartialEq, Eq)]
pub enum FrameRead {
    /// Interleaved samples delivered since the last read.
    Chunk(Vec<i16>),
    /// Nothing buffered right now; poll again later.
    Idle,
    /// The stream is gone and will never deliver again.
    EndOfStream,
}

/// Steers a blocking [`AudioDevice::play`] from another thread.
///
/// While paused the device outputs silence and keeps its position; stopping ends
/// playback at the next poll.
#[derive(Debug, Default)]
pub struct PlaybackControl {
    stop: AtomicBool,
    paused: AtomicBool,
}

impl PlaybackControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }

    /// Flips between playing and paused, returning whether playback is now paused.
    pub fn toggle_pause(&self) -> bool {
        !self.paused.fetch_xor(true, Ordering::AcqRel)
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }
}

/// Capture and playback capability.
pub trait AudioDevice {
    /// Opens an input stream at the given format.
    ///
    /// # Errors
    /// `DeviceUnavailable` if no device can be opened at this format.
    fn open_input(&mut self, sample_rate: u32, channels: u16) -> Result<InputHandle>;

    /// Polls the stream without blocking.
    fn read_frames(&mut self, handle: &InputHandle) -> FrameRead;

    /// Closes the stream and releases the hardware.
    fn close(&mut self, handle: InputHandle);

    /// Plays interleaved samples, blocking until playback ends or `control` is
    /// stopped. Pausing through `control` holds the position until resumed.
    ///
    /// # Errors
    /// `DeviceUnavailable` if no output device can be opened.
    fn play(
        &mut self,
        samples: &[i16],
        sample_rate: u32,
        channels: u16,
        control: &PlaybackControl,
    ) -> Result<()>;
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playback_control_pause_toggles() {
        let control = PlaybackControl::new();
        assert!(!control.is_paused());
        assert!(control.toggle_pause());
        assert!(control.is_paused());
        assert!(!control.toggle_pause());
        assert!(!control.is_paused());
        assert!(!control.is_stopped());
    }

    #[test]
    fn test_stop_is_independent_of_pause() {
        let control = PlaybackControl::new();
        control.toggle_pause();
        control.stop();
        assert!(control.is_stopped());
        assert!(control.is_paused());
    }
}
