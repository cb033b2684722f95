//! Sample Scanner
//!
//! Streams mono-mixed blocks from a take's source and finds the time
//! offset of the sample with the largest absolute amplitude.

use crate::error::Result;
use crate::session::{ItemId, SampleAccess, Take};

/// One scanned sample: offset from the take start and absolute amplitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplePoint {
    pub offset: f64,
    pub amplitude: f32,
}

/// Lazy, finite sequence of [`SamplePoint`]s over a source.
///
/// Reads one block of `block_size` samples at a time, starting at
/// `block_index * block_size / sample_rate` seconds, until the block start
/// reaches the source duration. The last block is zero-padded past the end.
pub struct AmplitudeScan<'a, A: SampleAccess> {
    access: &'a mut A,
    block: Vec<f32>,
    block_size: usize,
    current_block: usize,
    next_block: usize,
    cursor: usize,
    sample_rate: f64,
    duration: f64,
}

impl<'a, A: SampleAccess> AmplitudeScan<'a, A> {
    pub fn new(access: &'a mut A, block_size: usize) -> Self {
        let block_size = block_size.max(1);
        let sample_rate = access.sample_rate() as f64;
        let duration = access.duration_secs();
        Self {
            access,
            block: vec![0.0; block_size],
            block_size,
            current_block: 0,
            next_block: 0,
            cursor: block_size,
            sample_rate,
            duration,
        }
    }

    fn load_next_block(&mut self) -> bool {
        if self.sample_rate <= 0.0 {
            return false;
        }
        let start = (self.next_block * self.block_size) as f64 / self.sample_rate;
        if start >= self.duration {
            return false;
        }

        let read = self.access.read_mono(start, &mut self.block);
        log::trace!(
            "Block {} at {:.6}s: {} samples from source",
            self.next_block,
            start,
            read
        );

        self.current_block = self.next_block;
        self.next_block += 1;
        self.cursor = 0;
        true
    }
}

impl<A: SampleAccess> Iterator for AmplitudeScan<'_, A> {
    type Item = SamplePoint;

    fn next(&mut self) -> Option<SamplePoint> {
        if self.cursor >= self.block_size && !self.load_next_block() {
            return None;
        }

        let sample_index = self.current_block * self.block_size + self.cursor;
        let point = SamplePoint {
            offset: sample_index as f64 / self.sample_rate,
            amplitude: self.block[self.cursor].abs(),
        };
        self.cursor += 1;
        Some(point)
    }
}

/// Offset in seconds of the first sample with maximum absolute amplitude.
///
/// Silent or empty sources yield `0.0`.
pub fn scan_peak<A: SampleAccess>(access: &mut A, block_size: usize) -> f64 {
    let mut best: Option<SamplePoint> = None;
    for point in AmplitudeScan::new(access, block_size) {
        // strict comparison keeps the first occurrence on ties
        let louder = match best {
            Some(b) => point.amplitude > b.amplitude,
            None => point.amplitude > 0.0,
        };
        if louder {
            best = Some(point);
        }
    }
    best.map(|p| p.offset).unwrap_or(0.0)
}

/// Peak offset of a take's audio, relative to the take start.
///
/// The source accessor lives only for the scan and is released on every
/// exit path.
///
/// # Errors
/// * `UnsupportedTake` - the take is not audio
/// * `MissingAudioSource` - the audio source is unresolved
/// * `InvalidAudio` - the source cannot be opened for reading
pub fn find_peak_offset(item: ItemId, take: &Take, block_size: usize) -> Result<f64> {
    let source = take.audio_source(item)?;
    let mut accessor = source.accessor()?;
    let offset = scan_peak(&mut accessor, block_size);

    log::debug!(
        "Peak of item {} ({}) at {:.6}s of {:.3}s",
        item,
        take.name,
        offset,
        source.duration_secs()
    );
    Ok(offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::AudioBuffer;
    use crate::error::AlignError;
    use crate::session::AudioSource;
    use approx::assert_abs_diff_eq;
    use test_case::test_case;

    const RATE: u32 = 48000;

    fn impulse(len: usize, at: usize, value: f32) -> Take {
        let mut samples = vec![0.0_f32; len];
        samples[at] = value;
        Take::audio("impulse", AudioSource::new(AudioBuffer::mono(samples, RATE)))
    }

    /// Counts accessor reads and lets tests check the scan bounds.
    struct CountingAccess {
        buffer: AudioBuffer,
        reads: Vec<f64>,
    }

    impl SampleAccess for CountingAccess {
        fn sample_rate(&self) -> u32 {
            self.buffer.sample_rate
        }

        fn duration_secs(&self) -> f64 {
            self.buffer.duration_secs()
        }

        fn read_mono(&mut self, start_secs: f64, out: &mut [f32]) -> usize {
            self.reads.push(start_secs);
            let frame = (start_secs * self.buffer.sample_rate as f64).round() as usize;
            self.buffer.read_mono(frame, out)
        }
    }

    #[test]
    fn test_silence_yields_zero() {
        let take = Take::audio(
            "silence",
            AudioSource::new(AudioBuffer::silent(2, RATE as usize, RATE)),
        );
        assert_eq!(find_peak_offset(ItemId(0), &take, 4096).unwrap(), 0.0);
    }

    #[test]
    fn test_zero_length_yields_zero() {
        let take = Take::audio("empty", AudioSource::new(AudioBuffer::mono(vec![], RATE)));
        assert_eq!(find_peak_offset(ItemId(0), &take, 4096).unwrap(), 0.0);
    }

    #[test_case(0 ; "first sample")]
    #[test_case(4095 ; "end of first block")]
    #[test_case(4096 ; "start of second block")]
    #[test_case(23_999 ; "mid file")]
    #[test_case(47_999 ; "last sample in padded block")]
    fn test_single_impulse(at: usize) {
        let take = impulse(RATE as usize, at, 0.8);
        let offset = find_peak_offset(ItemId(0), &take, 4096).unwrap();
        assert_abs_diff_eq!(offset, at as f64 / RATE as f64, epsilon = 1e-9);
    }

    #[test]
    fn test_negative_peak_counts_by_magnitude() {
        let mut samples = vec![0.0_f32; 10_000];
        samples[100] = 0.5;
        samples[9_000] = -0.9;
        let take = Take::audio("neg", AudioSource::new(AudioBuffer::mono(samples, RATE)));
        let offset = find_peak_offset(ItemId(0), &take, 4096).unwrap();
        assert_abs_diff_eq!(offset, 9_000.0 / RATE as f64, epsilon = 1e-9);
    }

    #[test]
    fn test_ties_resolve_to_first_occurrence() {
        let mut samples = vec![0.0_f32; 10_000];
        samples[300] = -0.7;
        samples[5_000] = 0.7;
        samples[8_000] = 0.7;
        let take = Take::audio("tie", AudioSource::new(AudioBuffer::mono(samples, RATE)));
        let offset = find_peak_offset(ItemId(0), &take, 4096).unwrap();
        assert_abs_diff_eq!(offset, 300.0 / RATE as f64, epsilon = 1e-9);
    }

    #[test]
    fn test_stereo_is_mono_mixed() {
        // Left peak cancels against the right channel; the louder mix is later.
        let mut left = vec![0.0_f32; 2_000];
        let mut right = vec![0.0_f32; 2_000];
        left[100] = 1.0;
        right[100] = -1.0;
        left[1_500] = 0.6;
        right[1_500] = 0.6;
        let buffer = AudioBuffer::from_channels(vec![left, right], RATE).unwrap();
        let take = Take::audio("stereo", AudioSource::new(buffer));
        let offset = find_peak_offset(ItemId(0), &take, 512).unwrap();
        assert_abs_diff_eq!(offset, 1_500.0 / RATE as f64, epsilon = 1e-9);
    }

    #[test]
    fn test_scan_reads_whole_blocks_until_duration() {
        let mut access = CountingAccess {
            buffer: AudioBuffer::mono(vec![0.1; 10_000], RATE),
            reads: Vec::new(),
        };
        let points = AmplitudeScan::new(&mut access, 4096).count();
        assert_eq!(points, 3 * 4096);
        assert_eq!(access.reads.len(), 3);
        assert_abs_diff_eq!(access.reads[2], 8192.0 / RATE as f64, epsilon = 1e-12);
    }

    #[test]
    fn test_scan_is_restartable() {
        let mut access = CountingAccess {
            buffer: AudioBuffer::mono(vec![0.0, 0.2, 0.9, 0.1], 4),
            reads: Vec::new(),
        };
        let first = scan_peak(&mut access, 2);
        let second = scan_peak(&mut access, 2);
        assert_eq!(first, 0.5);
        assert_eq!(first, second);
    }

    #[test]
    fn test_non_audio_takes_rejected() {
        assert!(matches!(
            find_peak_offset(ItemId(1), &Take::midi("m"), 4096),
            Err(AlignError::UnsupportedTake { .. })
        ));
        assert!(matches!(
            find_peak_offset(ItemId(1), &Take::missing("x"), 4096),
            Err(AlignError::MissingAudioSource { .. })
        ));
    }

    #[test]
    fn test_unreadable_source() {
        let take = Take::audio("bad", AudioSource::new(AudioBuffer::mono(vec![1.0], 0)));
        assert!(matches!(
            find_peak_offset(ItemId(1), &take, 4096),
            Err(AlignError::InvalidAudio { .. })
        ));
    }
}
