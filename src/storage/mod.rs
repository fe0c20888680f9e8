//! On-disk library of saved recordings.
//!
//! Recordings live as individual audio files in two directories, the active
//! recordings and the trash. [`FileVault`] is the only thing that writes there.

pub mod codec;
pub mod entry;
pub mod naming;
pub mod transfer;
pub mod vault;

pub use codec::{ArtifactInfo, AudioCodec, WavCodec};
pub use entry::{format_duration, EntryStatus, Location, RecordingEntry, SortKey, SortOrder};
pub use naming::sanitize_name;
pub use vault::{FileVault, Listing, PurgeReport};
