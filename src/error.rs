//! Error handling for peak alignment
//!
//! Per-item failures are collected into the pass report; only the
//! pass-level variants end an alignment pass early.

use std::path::PathBuf;

use thiserror::Error;

use crate::session::ItemId;

/// Result type alias for alignment operations
pub type Result<T> = std::result::Result<T, AlignError>;

/// Main error type for alignment operations
#[derive(Error, Debug)]
pub enum AlignError {
    // Target Errors
    #[error("Nothing to align: no hovered or selected item")]
    NoTarget,

    #[error("Item {item} not found in session")]
    ItemNotFound { item: ItemId },

    // Take Errors
    #[error("Item {item} has an unsupported take ({kind})")]
    UnsupportedTake { item: ItemId, kind: String },

    #[error("Item {item} has no resolvable audio source")]
    MissingAudioSource { item: ItemId },

    // Track Errors
    #[error("Could not allocate track {index}: {reason}")]
    TrackAllocationFailure { index: usize, reason: String },

    #[error("Track {index} does not exist")]
    TrackNotFound { index: usize },

    // Audio Errors
    #[error("Invalid audio: {reason}")]
    InvalidAudio {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Unsupported audio format: {format}")]
    UnsupportedFormat { format: String },

    // File and Configuration Errors
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    // Undo/Redo Errors
    #[error("Nothing to undo")]
    NothingToUndo,

    #[error("Nothing to redo")]
    NothingToRedo,

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AlignError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            AlignError::NoTarget => "NO_TARGET",
            AlignError::ItemNotFound { .. } => "ITEM_NOT_FOUND",
            AlignError::UnsupportedTake { .. } => "UNSUPPORTED_TAKE",
            AlignError::MissingAudioSource { .. } => "MISSING_AUDIO_SOURCE",
            AlignError::TrackAllocationFailure { .. } => "TRACK_ALLOCATION_FAILURE",
            AlignError::TrackNotFound { .. } => "TRACK_NOT_FOUND",
            AlignError::InvalidAudio { .. } => "INVALID_AUDIO",
            AlignError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            AlignError::FileNotFound { .. } => "FILE_NOT_FOUND",
            AlignError::InvalidConfig { .. } => "INVALID_CONFIG",
            AlignError::NothingToUndo => "NOTHING_TO_UNDO",
            AlignError::NothingToRedo => "NOTHING_TO_REDO",
            AlignError::Io(_) => "IO_ERROR",
            AlignError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Whether this error only concerns a single item of a batch.
    ///
    /// Item-local errors are recorded against that item and the rest of
    /// the batch keeps going.
    pub fn is_item_local(&self) -> bool {
        matches!(
            self,
            AlignError::ItemNotFound { .. }
                | AlignError::UnsupportedTake { .. }
                | AlignError::MissingAudioSource { .. }
                | AlignError::TrackAllocationFailure { .. }
                | AlignError::TrackNotFound { .. }
                | AlignError::InvalidAudio { .. }
        )
    }

    /// Whether the item was skipped rather than failed
    pub fn is_skip(&self) -> bool {
        matches!(
            self,
            AlignError::UnsupportedTake { .. } | AlignError::MissingAudioSource { .. }
        )
    }

    /// Get a user-facing recovery suggestion
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            AlignError::NoTarget => Some("Select an item or hover over one, then try again."),
            AlignError::UnsupportedTake { .. } => {
                Some("Only audio takes can be aligned; switch the item to an audio take.")
            }
            AlignError::MissingAudioSource { .. } => {
                Some("The take's media is offline; relink the source file.")
            }
            AlignError::TrackAllocationFailure { .. } => {
                Some("Raise max_tracks or free up track slots below the source track.")
            }
            AlignError::FileNotFound { .. } => Some("Check the file path and try again."),
            AlignError::NothingToUndo => Some("There are no alignment passes to undo."),
            AlignError::NothingToRedo => Some("There are no undone passes to redo."),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(AlignError::NoTarget.error_code(), "NO_TARGET");
        let err = AlignError::TrackAllocationFailure {
            index: 4,
            reason: "limit".to_string(),
        };
        assert_eq!(err.error_code(), "TRACK_ALLOCATION_FAILURE");
        assert!(err.to_string().contains("track 4"));
    }

    #[test]
    fn test_item_local_errors() {
        let skipped = AlignError::UnsupportedTake {
            item: ItemId(3),
            kind: "midi".to_string(),
        };
        assert!(skipped.is_item_local());
        assert!(skipped.is_skip());
        assert!(skipped.recovery_suggestion().is_some());

        assert!(!AlignError::NoTarget.is_item_local());
        assert!(!AlignError::InvalidConfig {
            reason: "block_size".to_string()
        }
        .is_item_local());
    }
}
