//! System audio device backed by cpal.
//!
//! Input callbacks hand each chunk to a bounded channel with `try_send` so the
//! real-time thread never blocks; when the consumer falls behind, chunks are
//! dropped and counted. Playback streams from a shared copy of the samples and
//! outputs silence without advancing while paused.

use super::device::{AudioDevice, FrameRead, InputHandle, PlaybackControl};
use crate::error::{RecorderError, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::time::Duration;

#[cfg(target_os = "linux")]
use std::fs::OpenOptions;
#[cfg(target_os = "linux")]
use std::os::unix::io::AsRawFd;

/// Chunks buffered between the audio callback and the session. At typical
/// callback sizes this is several seconds of audio.
const CHANNEL_CAPACITY: usize = 512;

/// Poll interval while waiting for playback to finish.
const PLAYBACK_POLL: Duration = Duration::from_millis(20);

struct OpenInput {
    id: u64,
    // Held to keep the stream alive; dropping it stops capture.
    _stream: cpal::Stream,
    receiver: Receiver<Vec<i16>>,
}

/// Audio device that records from and plays to the host's devices.
///
/// Features:
/// - Captures from a named input device or the system default
/// - Requests the preset's exact sample rate and channel count
/// - Plays previews on the default output device
pub struct CpalDevice {
    /// Device name or "default" to use the system default device
    device_name: String,
    input: Option<OpenInput>,
    next_id: u64,
    /// Chunks dropped because the session did not drain fast enough
    dropped_chunks: Arc<AtomicU64>,
}

impl CpalDevice {
    pub fn new(device_name: String) -> Self {
        Self {
            device_name,
            input: None,
            next_id: 0,
            dropped_chunks: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Number of chunks lost to a full hand-off channel since creation.
    pub fn dropped_chunks(&self) -> u64 {
        self.dropped_chunks.load(Ordering::Relaxed)
    }

    fn input_device(&self) -> anyhow::Result<cpal::Device> {
        suppress_alsa_warnings(|| {
            let host = cpal::default_host();

            if self.device_name == "default" {
                host.default_input_device()
                    .ok_or_else(|| anyhow::anyhow!("No audio input device available"))
            } else {
                find_device_by_name(&host, &self.device_name)
            }
        })
    }
}

impl AudioDevice for CpalDevice {
    fn open_input(&mut self, sample_rate: u32, channels: u16) -> Result<InputHandle> {
        let device = self
            .input_device()
            .map_err(|e| RecorderError::DeviceUnavailable(e.to_string()))?;

        let device_name = device
            .name()
            .unwrap_or_else(|_| "Unknown device".to_string());
        tracing::info!("Recording device: {}", device_name);

        let config = cpal::StreamConfig {
            channels,
            sample_rate: cpal::SampleRate(sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let (sender, receiver) = mpsc::sync_channel::<Vec<i16>>(CHANNEL_CAPACITY);
        let dropped = Arc::clone(&self.dropped_chunks);

        let stream = device
            .build_input_stream(
                &config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    if sender.try_send(data.to_vec()).is_err() {
                        dropped.fetch_add(1, Ordering::Relaxed);
                    }
                },
                |err| {
                    tracing::error!("Audio stream error: {}", err);
                },
                None,
            )
            .map_err(|e| {
                RecorderError::DeviceUnavailable(format!(
                    "{device_name} cannot record at {sample_rate}Hz/{channels}ch: {e}"
                ))
            })?;

        stream
            .play()
            .map_err(|e| RecorderError::DeviceUnavailable(e.to_string()))?;

        self.next_id += 1;
        let id = self.next_id;
        self.input = Some(OpenInput {
            id,
            _stream: stream,
            receiver,
        });

        tracing::debug!(
            "Audio input stream started: {}Hz, {} channels",
            sample_rate,
            channels
        );
        Ok(InputHandle::new(id))
    }

    fn read_frames(&mut self, handle: &InputHandle) -> FrameRead {
        let Some(input) = self.input.as_ref().filter(|i| i.id == handle.id()) else {
            return FrameRead::EndOfStream;
        };

        match input.receiver.try_recv() {
            Ok(chunk) => FrameRead::Chunk(chunk),
            Err(TryRecvError::Empty) => FrameRead::Idle,
            Err(TryRecvError::Disconnected) => FrameRead::EndOfStream,
        }
    }

    fn close(&mut self, handle: InputHandle) {
        if self.input.as_ref().is_some_and(|i| i.id == handle.id()) {
            self.input = None;
            tracing::debug!("Audio input stream closed");
        }
        let dropped = self.dropped_chunks();
        if dropped > 0 {
            tracing::warn!("{} audio chunks were dropped during capture", dropped);
        }
    }

    fn play(
        &mut self,
        samples: &[i16],
        sample_rate: u32,
        channels: u16,
        control: &PlaybackControl,
    ) -> Result<()> {
        if samples.is_empty() {
            return Ok(());
        }

        let device = suppress_alsa_warnings(|| {
            cpal::default_host()
                .default_output_device()
                .ok_or_else(|| anyhow::anyhow!("No audio output device available"))
        })
        .map_err(|e| RecorderError::DeviceUnavailable(e.to_string()))?;

        let config = cpal::StreamConfig {
            channels,
            sample_rate: cpal::SampleRate(sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let shared: Arc<Vec<i16>> = Arc::new(samples.to_vec());
        let position = Arc::new(AtomicUsize::new(0));
        let finished = Arc::new(AtomicBool::new(false));
        let paused = Arc::new(AtomicBool::new(control.is_paused()));

        let callback_samples = Arc::clone(&shared);
        let callback_position = Arc::clone(&position);
        let callback_finished = Arc::clone(&finished);
        let callback_paused = Arc::clone(&paused);

        let stream = device
            .build_output_stream(
                &config,
                move |out: &mut [i16], _: &cpal::OutputCallbackInfo| {
                    if callback_paused.load(Ordering::Relaxed) {
                        out.fill(0);
                        return;
                    }
                    let start = callback_position.load(Ordering::Relaxed);
                    let available = callback_samples.len().saturating_sub(start);
                    let count = available.min(out.len());
                    out[..count].copy_from_slice(&callback_samples[start..start + count]);
                    out[count..].fill(0);
                    callback_position.store(start + count, Ordering::Relaxed);
                    if count < out.len() {
                        callback_finished.store(true, Ordering::Relaxed);
                    }
                },
                |err| {
                    tracing::error!("Playback stream error: {}", err);
                },
                None,
            )
            .map_err(|e| RecorderError::DeviceUnavailable(format!("cannot open playback: {e}")))?;

        stream
            .play()
            .map_err(|e| RecorderError::DeviceUnavailable(e.to_string()))?;

        tracing::debug!(
            "Playback started: {} samples at {}Hz/{}ch",
            shared.len(),
            sample_rate,
            channels
        );

        while !finished.load(Ordering::Relaxed) {
            if control.is_stopped() {
                tracing::debug!("Playback stopped");
                break;
            }
            let now_paused = control.is_paused();
            if paused.swap(now_paused, Ordering::Relaxed) != now_paused {
                tracing::debug!(
                    "Playback {} at sample {}",
                    if now_paused { "paused" } else { "resumed" },
                    position.load(Ordering::Relaxed)
                );
            }
            std::thread::sleep(PLAYBACK_POLL);
        }

        drop(stream);
        tracing::debug!(
            "Playback finished after {} of {} samples",
            position.load(Ordering::Relaxed),
            shared.len()
        );
        Ok(())
    }
}

/// Finds an audio input device by name or numeric index.
///
/// # Errors
/// - If no device with the specified name/index is found
fn find_device_by_name(host: &cpal::Host, device_spec: &str) -> anyhow::Result<cpal::Device> {
    let devices: Vec<_> = host
        .input_devices()
        .map_err(|e| anyhow::anyhow!("Failed to enumerate devices: {e}"))?
        .collect();

    if let Ok(index) = device_spec.parse::<usize>() {
        let count = devices.len();
        return devices.into_iter().nth(index).ok_or_else(|| {
            anyhow::anyhow!(
                "Device index {} is out of range (0-{})",
                index,
                count.saturating_sub(1)
            )
        });
    }

    devices
        .into_iter()
        .find(|device| device.name().is_ok_and(|name| name == device_spec))
        .ok_or_else(|| {
            anyhow::anyhow!(
                "Audio input device '{device_spec}' not found. Set audio.device = \"default\" in the config."
            )
        })
}

/// Temporarily redirects stderr to /dev/null to suppress ALSA library warnings on Linux.
#[cfg(target_os = "linux")]
fn suppress_alsa_warnings<F, T>(f: F) -> anyhow::Result<T>
where
    F: FnOnce() -> anyhow::Result<T>,
{
    let dev_null = OpenOptions::new()
        .write(true)
        .open("/dev/null")
        .map_err(|e| anyhow::anyhow!("Failed to open /dev/null: {e}"))?;

    let dev_null_fd = dev_null.as_raw_fd();

    let old_stderr = unsafe { libc::dup(libc::STDERR_FILENO) };
    if old_stderr == -1 {
        return Err(anyhow::anyhow!("Failed to duplicate stderr"));
    }

    let redirect_result = unsafe { libc::dup2(dev_null_fd, libc::STDERR_FILENO) };
    if redirect_result == -1 {
        unsafe { libc::close(old_stderr) };
        return Err(anyhow::anyhow!("Failed to redirect stderr"));
    }

    let result = f();

    unsafe {
        libc::dup2(old_stderr, libc::STDERR_FILENO);
        libc::close(old_stderr);
    }

    result
}

/// On non-Linux platforms, no stderr suppression is needed since ALSA doesn't exist.
#[cfg(not(target_os = "linux"))]
fn suppress_alsa_warnings<F, T>(f: F) -> anyhow::Result<T>
where
    F: FnOnce() -> anyhow::Result<T>,
{
    f()
}
