//! Audio capture for voicerec.
//!
//! Provides the session state machine, the capture buffer, the device seam with
//! its cpal implementation, and the terminal screens used while recording.

pub mod buffer;
pub mod cpal_device;
pub mod device;
pub mod preset;
pub mod session;
pub mod ui;

pub use buffer::CaptureBuffer;
pub use cpal_device::CpalDevice;
pub use device::{AudioDevice, FrameRead, InputHandle, PlaybackControl};
pub use preset::QualityPreset;
pub use session::{FinishedRecording, Recorder, RecordingSession, SessionState};
pub use ui::{RecordingCommand, RecorderTui};
