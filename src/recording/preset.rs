//! Capture quality presets.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Named sample-rate/channel-count configuration used for capture and encoding.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum QualityPreset {
    /// 48 kHz stereo
    High,
    /// 44.1 kHz stereo
    #[default]
    Medium,
    /// 44.1 kHz mono
    Low,
}

impl QualityPreset {
    pub const ALL: [QualityPreset; 3] = [Self::High, Self::Medium, Self::Low];

    pub fn sample_rate(self) -> u32 {
        match self {
            Self::High => 48_000,
            Self::Medium | Self::Low => 44_100,
        }
    }

    pub fn channels(self) -> u16 {
        match self {
            Self::High | Self::Medium => 2,
            Self::Low => 1,
        }
    }

    /// Finds the preset that records with exactly this format, if any.
    pub fn from_format(sample_rate: u32, channels: u16) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.sample_rate() == sample_rate && p.channels() == channels)
    }

    /// Converts an interleaved sample count into seconds of audio.
    pub fn duration_secs(self, sample_count: usize) -> f64 {
        let frames = sample_count / self.channels() as usize;
        frames as f64 / self.sample_rate() as f64
    }
}

impl fmt::Display for QualityPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::High => write!(f, "high"),
            Self::Medium => write!(f, "medium"),
            Self::Low => write!(f, "low"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_formats() {
        assert_eq!(QualityPreset::High.sample_rate(), 48_000);
        assert_eq!(QualityPreset::High.channels(), 2);
        assert_eq!(QualityPreset::Medium.sample_rate(), 44_100);
        assert_eq!(QualityPreset::Medium.channels(), 2);
        assert_eq!(QualityPreset::Low.sample_rate(), 44_100);
        assert_eq!(QualityPreset::Low.channels(), 1);
        assert_eq!(QualityPreset::default(), QualityPreset::Medium);
    }

    #[test]
    fn test_from_format() {
        assert_eq!(QualityPreset::from_format(44_100, 1), Some(QualityPreset::Low));
        assert_eq!(QualityPreset::from_format(48_000, 2), Some(QualityPreset::High));
        assert_eq!(QualityPreset::from_format(16_000, 1), None);
    }

    #[test]
    fn test_duration_counts_frames_not_samples() {
        // 44100 stereo frames = 88200 interleaved samples = 1 second
        assert_eq!(QualityPreset::Medium.duration_secs(88_200), 1.0);
        assert_eq!(QualityPreset::Low.duration_secs(44_100), 1.0);
    }
}
