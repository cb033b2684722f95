//! Alignment configuration
//!
//! Every field has a default, so an empty JSON object is a valid config.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AlignError, Result};
use crate::session::FadeShape;

/// Samples read per scanner block.
pub const DEFAULT_BLOCK_SIZE: usize = 4096;

/// Overlaps at or below this length count as touching, not overlapping.
pub const DEFAULT_MIN_OVERLAP_SECS: f64 = 1e-9;

/// Highest number of tracks the placement resolver may allocate.
pub const DEFAULT_MAX_TRACKS: usize = 1024;

/// Default maximum number of undo levels to keep.
pub const DEFAULT_MAX_UNDO_LEVELS: usize = 50;

/// Tunables for an alignment pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignConfig {
    /// Number of mono samples read per block by the peak scanner.
    pub block_size: usize,

    /// Shape given to an extended fade whose current shape is linear.
    pub crossfade_shape: FadeShape,

    /// Minimum overlap (seconds) before a crossfade is synthesized.
    pub min_overlap_secs: f64,

    /// Track indices at or above this value cannot be created.
    pub max_tracks: usize,

    /// Number of passes kept in the undo history.
    pub max_undo_levels: usize,
}

impl Default for AlignConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            crossfade_shape: FadeShape::EqualPower,
            min_overlap_secs: DEFAULT_MIN_OVERLAP_SECS,
            max_tracks: DEFAULT_MAX_TRACKS,
            max_undo_levels: DEFAULT_MAX_UNDO_LEVELS,
        }
    }
}

impl AlignConfig {
    /// Load a config from a JSON file and validate it.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(AlignError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = fs::read_to_string(path)?;
        let config: AlignConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that all values are usable.
    pub fn validate(&self) -> Result<()> {
        if self.block_size == 0 {
            return Err(AlignError::InvalidConfig {
                reason: "block_size must be greater than zero".to_string(),
            });
        }
        if !self.min_overlap_secs.is_finite() || self.min_overlap_secs < 0.0 {
            return Err(AlignError::InvalidConfig {
                reason: format!(
                    "min_overlap_secs must be a non-negative number, got {}",
                    self.min_overlap_secs
                ),
            });
        }
        if self.max_tracks == 0 {
            return Err(AlignError::InvalidConfig {
                reason: "max_tracks must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}
