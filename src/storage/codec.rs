//! Artifact encoding and inspection.
//!
//! The vault never keeps a metadata index: everything it reports about a recording
//! is read back from the artifact through [`AudioCodec::probe`].

use crate::recording::QualityPreset;
use anyhow::Result;
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::io::{self, Cursor};
use std::path::Path;

/// Format facts recovered from an artifact on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArtifactInfo {
    pub sample_rate: u32,
    pub channels: u16,
    /// Samples per channel
    pub frame_count: u64,
}

impl ArtifactInfo {
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frame_count as f64 / self.sample_rate as f64
    }

    pub fn preset(&self) -> Option<QualityPreset> {
        QualityPreset::from_format(self.sample_rate, self.channels)
    }
}

/// Turns finalized audio into file bytes and reads files back.
pub trait AudioCodec: Send + Sync {
    /// File extension (without the dot) of artifacts this codec writes.
    fn extension(&self) -> &'static str;

    /// Encodes interleaved samples recorded with `preset`.
    fn encode(&self, samples: &[i16], preset: QualityPreset) -> io::Result<Vec<u8>>;

    /// Reads the format and length of an artifact without decoding the audio.
    fn probe(&self, path: &Path) -> Result<ArtifactInfo>;

    /// Decodes an artifact into interleaved samples.
    fn decode(&self, path: &Path) -> Result<(Vec<i16>, ArtifactInfo)>;
}

/// 16-bit PCM WAV via hound.
#[derive(Debug, Default, Clone, Copy)]
pub struct WavCodec;

impl AudioCodec for WavCodec {
    fn extension(&self) -> &'static str {
        "wav"
    }

    fn encode(&self, samples: &[i16], preset: QualityPreset) -> io::Result<Vec<u8>> {
        let spec = WavSpec {
            channels: preset.channels(),
            sample_rate: preset.sample_rate(),
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };

        let mut cursor = Cursor::new(Vec::with_capacity(44 + samples.len() * 2));
        {
            let mut writer = WavWriter::new(&mut cursor, spec).map_err(hound_to_io)?;
            for &sample in samples {
                writer.write_sample(sample).map_err(hound_to_io)?;
            }
            writer.finalize().map_err(hound_to_io)?;
        }

        tracing::debug!(
            "Encoded {} samples as WAV ({}Hz, {}ch)",
            samples.len(),
            spec.sample_rate,
            spec.channels
        );
        Ok(cursor.into_inner())
    }

    fn probe(&self, path: &Path) -> Result<ArtifactInfo> {
        let reader = WavReader::open(path)?;
        let spec = reader.spec();
        Ok(ArtifactInfo {
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            frame_count: u64::from(reader.duration()),
        })
    }

    fn decode(&self, path: &Path) -> Result<(Vec<i16>, ArtifactInfo)> {
        let mut reader = WavReader::open(path)?;
        let spec = reader.spec();
        if spec.sample_format != SampleFormat::Int || spec.bits_per_sample != 16 {
            return Err(anyhow::anyhow!(
                "Unsupported WAV format: {} bit {:?}",
                spec.bits_per_sample,
                spec.sample_format
            ));
        }
        let info = ArtifactInfo {
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            frame_count: u64::from(reader.duration()),
        };
        let samples = reader.samples::<i16>().collect::<Result<Vec<_>, _>>()?;
        Ok((samples, info))
    }
}

fn hound_to_io(err: hound::Error) -> io::Error {
    match err {
        hound::Error::IoError(e) => e,
        other => io::Error::other(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_reports_preset_and_duration() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.wav");
        let bytes = WavCodec
            .encode(&vec![0; 48_000 * 2], QualityPreset::High)
            .unwrap();
        std::fs::write(&path, bytes).unwrap();

        let info = WavCodec.probe(&path).unwrap();
        assert_eq!(info.preset(), Some(QualityPreset::High));
        assert_eq!(info.frame_count, 48_000);
        assert_eq!(info.duration_secs(), 1.0);
    }

    #[test]
    fn test_decode_returns_written_samples() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.wav");
        let samples: Vec<i16> = (0..200).map(|i| i * 7 - 500).collect();
        std::fs::write(&path, WavCodec.encode(&samples, QualityPreset::Low).unwrap()).unwrap();

        let (decoded, info) = WavCodec.decode(&path).unwrap();
        assert_eq!(decoded, samples);
        assert_eq!(info.channels, 1);
    }

    #[test]
    fn test_probe_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.wav");
        std::fs::write(&path, b"definitely not a riff header").unwrap();
        assert!(WavCodec.probe(&path).is_err());
    }
}
