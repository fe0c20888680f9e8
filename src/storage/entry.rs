//! Persisted recordings as seen through a directory listing.

use crate::recording::QualityPreset;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::path::PathBuf;

/// Which of the two vault areas an entry lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Location {
    Active,
    Trash,
}

impl Location {
    pub fn other(self) -> Self {
        match self {
            Self::Active => Self::Trash,
            Self::Trash => Self::Active,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "recordings"),
            Self::Trash => write!(f, "trash"),
        }
    }
}

/// Whether the artifact behind an entry could be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryStatus {
    Ok,
    /// Missing, truncated or otherwise unreadable; the reason is kept for display.
    Damaged(String),
}

/// One recording on disk plus the metadata derived from it.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingEntry {
    /// File stem; unique within its location
    pub id: String,
    pub path: PathBuf,
    pub created_at: DateTime<Local>,
    pub duration_seconds: f64,
    /// `None` when the artifact's format matches no preset
    pub preset: Option<QualityPreset>,
    pub size_bytes: u64,
    pub location: Location,
    pub status: EntryStatus,
}

impl RecordingEntry {
    pub fn is_damaged(&self) -> bool {
        matches!(self.status, EntryStatus::Damaged(_))
    }

    /// Duration as `m:ss`.
    pub fn duration_label(&self) -> String {
        format_duration(self.duration_seconds)
    }

    /// Size in human units.
    pub fn size_label(&self) -> String {
        const KIB: f64 = 1024.0;
        let bytes = self.size_bytes as f64;
        if bytes >= KIB * KIB {
            format!("{:.1} MiB", bytes / (KIB * KIB))
        } else if bytes >= KIB {
            format!("{:.1} KiB", bytes / KIB)
        } else {
            format!("{} B", self.size_bytes)
        }
    }
}

/// Formats seconds as `m:ss`, or `h:mm:ss` past an hour.
pub fn format_duration(secs: f64) -> String {
    let total = secs.max(0.0).round() as u64;
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}

/// Field a listing is ordered by.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Created,
    Name,
    Duration,
}

impl SortKey {
    /// The next key in display order, wrapping around.
    pub fn next(self) -> Self {
        match self {
            Self::Created => Self::Name,
            Self::Name => Self::Duration,
            Self::Duration => Self::Created,
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Name => write!(f, "name"),
            Self::Duration => write!(f, "duration"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn from_descending(descending: bool) -> Self {
        if descending {
            Self::Descending
        } else {
            Self::Ascending
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

/// Sorts entries in place. Ties fall back to the id so the order is stable.
pub fn sort_entries(entries: &mut [RecordingEntry], key: SortKey, order: SortOrder) {
    entries.sort_by(|a, b| {
        let primary = match key {
            SortKey::Created => a.created_at.cmp(&b.created_at),
            SortKey::Name => a.id.cmp(&b.id),
            SortKey::Duration => a
                .duration_seconds
                .partial_cmp(&b.duration_seconds)
                .unwrap_or(Ordering::Equal),
        };
        let ordering = primary.then_with(|| a.id.cmp(&b.id));
        match order {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        }
    });
}
