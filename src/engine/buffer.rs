//! Audio Buffer Management
//!
//! Decoded audio held in memory, non-interleaved, at the source's own
//! sample rate. Alignment never resamples: peak offsets are computed in
//! the source's time base.

use crate::error::{AlignError, Result};

// ============================================================================
// Audio Buffer
// ============================================================================

/// Decoded audio for one source
///
/// # Example
/// ```
/// use peak_align::engine::AudioBuffer;
///
/// let buffer = AudioBuffer::silent(2, 44100, 44100);
/// assert_eq!(buffer.channels(), 2);
/// assert_eq!(buffer.duration_secs(), 1.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    /// Sample data: outer Vec is channels, inner Vec is samples
    pub samples: Vec<Vec<f32>>,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl AudioBuffer {
    /// Create a silent buffer
    ///
    /// # Arguments
    /// * `channels` - Number of channels
    /// * `num_samples` - Number of samples per channel
    /// * `sample_rate` - Sample rate in Hz
    pub fn silent(channels: usize, num_samples: usize, sample_rate: u32) -> Self {
        Self {
            samples: vec![vec![0.0_f32; num_samples]; channels],
            sample_rate,
        }
    }

    /// Create a mono buffer from a sample vector
    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples: vec![samples],
            sample_rate,
        }
    }

    /// Create a buffer from per-channel sample vectors
    ///
    /// All channels must have the same length.
    pub fn from_channels(samples: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self> {
        if let Some(first) = samples.first() {
            let len = first.len();
            if let Some((ch, other)) = samples.iter().enumerate().find(|(_, c)| c.len() != len) {
                return Err(AlignError::InvalidAudio {
                    reason: format!(
                        "Channel {} has {} samples, expected {}",
                        ch,
                        other.len(),
                        len
                    ),
                    source: None,
                });
            }
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Create an audio buffer from interleaved sample data
    ///
    /// # Arguments
    /// * `interleaved` - Interleaved sample data (L, R, L, R, ... for stereo)
    /// * `channels` - Channel count
    /// * `sample_rate` - Sample rate in Hz
    pub fn from_interleaved(interleaved: &[f32], channels: usize, sample_rate: u32) -> Result<Self> {
        if channels == 0 {
            return Err(AlignError::InvalidAudio {
                reason: "Audio must have at least one channel".to_string(),
                source: None,
            });
        }

        if interleaved.len() % channels != 0 {
            return Err(AlignError::InvalidAudio {
                reason: format!(
                    "Interleaved data length {} is not divisible by channel count {}",
                    interleaved.len(),
                    channels
                ),
                source: None,
            });
        }

        let num_samples = interleaved.len() / channels;
        let mut samples = vec![Vec::with_capacity(num_samples); channels];

        for frame in interleaved.chunks_exact(channels) {
            for (ch, &sample) in frame.iter().enumerate() {
                samples[ch].push(sample);
            }
        }

        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Convert the buffer to interleaved format
    pub fn to_interleaved(&self) -> Vec<f32> {
        let num_channels = self.channels();
        let num_samples = self.len();

        let mut interleaved = Vec::with_capacity(num_channels * num_samples);
        for sample_idx in 0..num_samples {
            for channel in &self.samples {
                interleaved.push(channel[sample_idx]);
            }
        }

        interleaved
    }

    /// Get the number of channels
    #[inline]
    pub fn channels(&self) -> usize {
        self.samples.len()
    }

    /// Get the number of samples per channel
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.first().map(|ch| ch.len()).unwrap_or(0)
    }

    /// Check if the buffer is empty (no samples)
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the duration in seconds
    #[inline]
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.len() as f64 / self.sample_rate as f64
    }

    /// Mono mix of one frame: the mean across channels
    ///
    /// Frames past the end read as silence.
    #[inline]
    pub fn mono_sample(&self, frame: usize) -> f32 {
        let channels = self.channels();
        if channels == 0 {
            return 0.0;
        }
        let sum: f32 = self
            .samples
            .iter()
            .map(|ch| ch.get(frame).copied().unwrap_or(0.0))
            .sum();
        sum / channels as f32
    }

    /// Fill `out` with mono-mixed samples starting at `start_frame`
    ///
    /// Returns the number of samples that came from the buffer; the rest of
    /// `out` is zeroed.
    pub fn read_mono(&self, start_frame: usize, out: &mut [f32]) -> usize {
        let available = self.len().saturating_sub(start_frame).min(out.len());
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = if i < available {
                self.mono_sample(start_frame + i)
            } else {
                0.0
            };
        }
        available
    }
}

// ============================================================================
// Tests
// ============================================================================
