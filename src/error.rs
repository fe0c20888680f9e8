//! Typed failures surfaced by the recording core and the file vault.
//!
//! Every fallible core operation returns [`RecorderError`]. The UI layer inspects
//! [`RecorderError::kind`] to decide whether to re-prompt (name problems) or to
//! report and move on, and uses the `Display` text as the human-readable message.

use std::fmt;
use thiserror::Error;

/// Coarse classification of a [`RecorderError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    DeviceUnavailable,
    SessionAlreadyActive,
    InvalidTransition,
    BufferDisposed,
    InvalidName,
    DuplicateName,
    NotFound,
    Unreadable,
    WriteFailed,
    MoveFailed,
    DeleteFailed,
}

impl ErrorKind {
    /// Whether the user can fix this by entering a different name.
    pub fn is_name_problem(self) -> bool {
        matches!(self, Self::InvalidName | Self::DuplicateName)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::DeviceUnavailable => "device unavailable",
            Self::SessionAlreadyActive => "session already active",
            Self::InvalidTransition => "invalid transition",
            Self::BufferDisposed => "buffer disposed",
            Self::InvalidName => "invalid name",
            Self::DuplicateName => "duplicate name",
            Self::NotFound => "not found",
            Self::Unreadable => "unreadable",
            Self::WriteFailed => "write failed",
            Self::MoveFailed => "move failed",
            Self::DeleteFailed => "delete failed",
        };
        f.write_str(name)
    }
}

/// Errors produced by [`crate::recording`] and [`crate::storage`].
#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("audio device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("a recording session is already active")]
    SessionAlreadyActive,

    #[error("cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },

    #[error("capture buffer has been discarded")]
    BufferDisposed,

    #[error("invalid recording name '{0}'")]
    InvalidName(String),

    #[error("a recording named '{0}' already exists")]
    DuplicateName(String),

    #[error("{0}")]
    NotFound(String),

    /// The artifact exists but its audio cannot be decoded.
    #[error("recording {id} cannot be read: {reason}")]
    Unreadable { id: String, reason: String },

    #[error("failed to write recording {id}: {source}")]
    WriteFailed {
        id: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to move recording {id}: {reason}")]
    MoveFailed { id: String, reason: String },

    #[error("failed to delete recording {id}: {source}")]
    DeleteFailed {
        id: String,
        #[source]
        source: std::io::Error,
    },
}

impl RecorderError {
    /// Returns the classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DeviceUnavailable(_) => ErrorKind::DeviceUnavailable,
            Self::SessionAlreadyActive => ErrorKind::SessionAlreadyActive,
            Self::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            Self::BufferDisposed => ErrorKind::BufferDisposed,
            Self::InvalidName(_) => ErrorKind::InvalidName,
            Self::DuplicateName(_) => ErrorKind::DuplicateName,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Unreadable { .. } => ErrorKind::Unreadable,
            Self::WriteFailed { .. } => ErrorKind::WriteFailed,
            Self::MoveFailed { .. } => ErrorKind::MoveFailed,
            Self::DeleteFailed { .. } => ErrorKind::DeleteFailed,
        }
    }

    pub(crate) fn write_failed(id: &str, source: std::io::Error) -> Self {
        Self::WriteFailed {
            id: id.to_string(),
            source,
        }
    }

    pub(crate) fn move_failed(id: &str, reason: impl fmt::Display) -> Self {
        Self::MoveFailed {
            id: id.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Result alias for core operations.
pub type Result<T, E = RecorderError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_matches_variant() {
        let err = RecorderError::DuplicateName("demo".to_string());
        assert_eq!(err.kind(), ErrorKind::DuplicateName);
        assert!(err.kind().is_name_problem());
        assert_eq!(err.to_string(), "a recording named 'demo' already exists");
    }

    #[test]
    fn test_transition_message_names_state() {
        let err = RecorderError::InvalidTransition {
            action: "pause",
            state: "stopped",
        };
        assert_eq!(err.to_string(), "cannot pause while stopped");
        assert!(!err.kind().is_name_problem());
    }
}
