//! Timeline data model
//!
//! Tracks own their items. Tracks are keyed by index in a sparse ordered
//! map, so a track can be created at any free index without renumbering
//! the rest.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::engine::AudioBuffer;
use crate::error::{AlignError, Result};

// ============================================================================
// Identifiers
// ============================================================================

/// Stable identifier of an item within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u32);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ============================================================================
// Fades
// ============================================================================

/// Fade curve, stored as the host's numeric shape code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FadeShape {
    #[default]
    Linear,
    FastStart,
    FastEnd,
    EqualPower,
    SlowStartEnd,
    Bezier,
}

impl FadeShape {
    /// Numeric shape code. `0` is the default (linear) shape.
    pub fn code(&self) -> u8 {
        match self {
            FadeShape::Linear => 0,
            FadeShape::FastStart => 1,
            FadeShape::FastEnd => 2,
            FadeShape::EqualPower => 3,
            FadeShape::SlowStartEnd => 4,
            FadeShape::Bezier => 5,
        }
    }

    /// Shape for a numeric code, if known.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(FadeShape::Linear),
            1 => Some(FadeShape::FastStart),
            2 => Some(FadeShape::FastEnd),
            3 => Some(FadeShape::EqualPower),
            4 => Some(FadeShape::SlowStartEnd),
            5 => Some(FadeShape::Bezier),
            _ => None,
        }
    }

    /// Whether this is the default shape.
    pub fn is_default(&self) -> bool {
        *self == FadeShape::Linear
    }

    /// Fade-in gain at normalized position `t` in `[0, 1]`.
    ///
    /// A fade-out uses `gain_at(1.0 - t)`.
    pub fn gain_at(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            FadeShape::Linear => t,
            FadeShape::FastStart => 1.0 - (1.0 - t).powi(2),
            FadeShape::FastEnd => t * t,
            FadeShape::EqualPower => (t * std::f64::consts::FRAC_PI_2).sin(),
            FadeShape::SlowStartEnd => t * t * (3.0 - 2.0 * t),
            FadeShape::Bezier => {
                // cubic with control points 0, 0.1, 0.9, 1
                let u = 1.0 - t;
                3.0 * u * u * t * 0.1 + 3.0 * u * t * t * 0.9 + t * t * t
            }
        }
    }
}

/// Length and shape of one item edge fade.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Fade {
    /// Fade length in seconds; `0.0` means no fade.
    #[serde(default)]
    pub length: f64,
    #[serde(default)]
    pub shape: FadeShape,
}

impl Fade {
    pub fn new(length: f64, shape: FadeShape) -> Self {
        Self { length, shape }
    }
}

// ============================================================================
// Sources and Takes
// ============================================================================

/// Immutable handle to decoded audio.
///
/// Cloning is cheap; the samples are shared.
#[derive(Debug, Clone)]
pub struct AudioSource {
    buffer: Arc<AudioBuffer>,
    path: Option<PathBuf>,
}

impl AudioSource {
    pub fn new(buffer: AudioBuffer) -> Self {
        Self {
            buffer: Arc::new(buffer),
            path: None,
        }
    }

    pub fn from_file(buffer: AudioBuffer, path: PathBuf) -> Self {
        Self {
            buffer: Arc::new(buffer),
            path: Some(path),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.buffer.sample_rate
    }

    pub fn duration_secs(&self) -> f64 {
        self.buffer.duration_secs()
    }

    pub fn path(&self) -> Option<&PathBuf> {
        self.path.as_ref()
    }

    /// Open a scoped reader over the source.
    ///
    /// The accessor is released when dropped.
    pub fn accessor(&self) -> Result<SourceAccessor<'_>> {
        if self.buffer.sample_rate == 0 {
            return Err(AlignError::InvalidAudio {
                reason: "source has a sample rate of 0 Hz".to_string(),
                source: None,
            });
        }
        log::trace!("Opened accessor on {:?}", self.path);
        Ok(SourceAccessor {
            buffer: &self.buffer,
        })
    }
}

/// Read access to mono-mixed samples of a source.
pub trait SampleAccess {
    /// Sample rate in Hz.
    fn sample_rate(&self) -> u32;

    /// Source length in seconds.
    fn duration_secs(&self) -> f64;

    /// Fill `out` with mono-mixed samples starting at `start_secs`.
    ///
    /// Samples past the end of the source read as silence. Returns the
    /// number of samples taken from the source.
    fn read_mono(&mut self, start_secs: f64, out: &mut [f32]) -> usize;
}

/// Scoped accessor returned by [`AudioSource::accessor`].
#[derive(Debug)]
pub struct SourceAccessor<'a> {
    buffer: &'a AudioBuffer,
}

impl SampleAccess for SourceAccessor<'_> {
    fn sample_rate(&self) -> u32 {
        self.buffer.sample_rate
    }

    fn duration_secs(&self) -> f64 {
        self.buffer.duration_secs()
    }

    fn read_mono(&mut self, start_secs: f64, out: &mut [f32]) -> usize {
        let start_frame = (start_secs * self.buffer.sample_rate as f64).round().max(0.0) as usize;
        self.buffer.read_mono(start_frame, out)
    }
}

impl Drop for SourceAccessor<'_> {
    fn drop(&mut self) {
        log::trace!("Released source accessor");
    }
}

/// Media bound to a take.
#[derive(Debug, Clone)]
pub enum TakeMedia {
    Audio(AudioSource),
    /// Symbolic (MIDI) data, never scanned.
    Midi,
    /// Audio take whose source could not be resolved.
    Missing,
}

/// The active media binding of an item.
#[derive(Debug, Clone)]
pub struct Take {
    pub name: String,
    pub media: TakeMedia,
}

impl Take {
    pub fn audio(name: impl Into<String>, source: AudioSource) -> Self {
        Self {
            name: name.into(),
            media: TakeMedia::Audio(source),
        }
    }

    pub fn midi(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            media: TakeMedia::Midi,
        }
    }

    pub fn missing(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            media: TakeMedia::Missing,
        }
    }

    /// The audio source, or the reason `item` cannot be scanned.
    pub fn audio_source(&self, item: ItemId) -> Result<&AudioSource> {
        match &self.media {
            TakeMedia::Audio(source) => Ok(source),
            TakeMedia::Missing => Err(AlignError::MissingAudioSource { item }),
            TakeMedia::Midi => Err(AlignError::UnsupportedTake {
                item,
                kind: "midi".to_string(),
            }),
        }
    }
}

// ============================================================================
// Items and Tracks
// ============================================================================

/// A placed clip on a track.
#[derive(Debug, Clone)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    /// Timeline start in seconds. May be negative.
    pub position: f64,
    /// Length in seconds.
    pub length: f64,
    pub mute: bool,
    pub fade_in: Fade,
    pub fade_out: Fade,
    pub take: Option<Take>,
}

impl Item {
    pub fn new(id: ItemId, position: f64, length: f64) -> Self {
        Self {
            id,
            name: String::new(),
            position,
            length,
            mute: false,
            fade_in: Fade::default(),
            fade_out: Fade::default(),
            take: None,
        }
    }

    pub fn with_take(mut self, take: Take) -> Self {
        self.take = Some(take);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// End of the item's half-open interval `[position, position + length)`.
    pub fn end(&self) -> f64 {
        self.position + self.length
    }

    /// The audio source of the active take.
    ///
    /// # Errors
    /// * `UnsupportedTake` - no active take, or a non-audio take
    /// * `MissingAudioSource` - an audio take whose source is unresolved
    pub fn audio_source(&self) -> Result<&AudioSource> {
        self.active_take()?.audio_source(self.id)
    }

    /// The active take.
    ///
    /// # Errors
    /// * `UnsupportedTake` - the item has no active take
    pub fn active_take(&self) -> Result<&Take> {
        self.take.as_ref().ok_or_else(|| AlignError::UnsupportedTake {
            item: self.id,
            kind: "no active take".to_string(),
        })
    }
}

/// An ordered container of items.
#[derive(Debug, Clone, Default)]
pub struct Track {
    pub name: String,
    pub mute: bool,
    pub items: Vec<Item>,
}

impl Track {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn item_mut(&mut self, id: ItemId) -> Option<&mut Item> {
        self.items.iter_mut().find(|i| i.id == id)
    }
}

// ============================================================================
// Layout snapshot
// ============================================================================

/// Editable state of one item, as captured for undo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemLayout {
    pub id: ItemId,
    pub track: usize,
    pub position: f64,
    pub length: f64,
    pub mute: bool,
    pub fade_in: Fade,
    pub fade_out: Fade,
}

/// Editable state of one track, as captured for undo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackLayout {
    pub index: usize,
    pub name: String,
    pub mute: bool,
}

/// Everything an alignment pass can change. Sources are immutable and
/// never part of a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub tracks: Vec<TrackLayout>,
    pub items: Vec<ItemLayout>,
}

// ============================================================================
// Session
// ============================================================================

/// All tracks of a timeline.
#[derive(Debug, Clone, Default)]
pub struct Session {
    tracks: BTreeMap<usize, Track>,
    next_item_id: u32,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a track after the highest existing index.
    pub fn add_track(&mut self, track: Track) -> usize {
        let index = self.tracks.keys().next_back().map(|i| i + 1).unwrap_or(0);
        self.tracks.insert(index, track);
        index
    }

    /// Insert a track at a specific index.
    ///
    /// # Errors
    /// * `TrackAllocationFailure` - the index is already occupied
    pub fn insert_track(&mut self, index: usize, track: Track) -> Result<()> {
        if self.tracks.contains_key(&index) {
            return Err(AlignError::TrackAllocationFailure {
                index,
                reason: "index already occupied".to_string(),
            });
        }
        self.tracks.insert(index, track);
        Ok(())
    }

    /// Return the track at `index`, creating an empty one if the slot is
    /// free. Returns whether a track was created.
    ///
    /// # Errors
    /// * `TrackAllocationFailure` - `index >= max_tracks`
    pub fn ensure_track(&mut self, index: usize, max_tracks: usize) -> Result<bool> {
        if self.tracks.contains_key(&index) {
            return Ok(false);
        }
        if index >= max_tracks {
            return Err(AlignError::TrackAllocationFailure {
                index,
                reason: format!("track limit is {}", max_tracks),
            });
        }
        self.tracks
            .insert(index, Track::new(format!("Track {}", index + 1)));
        log::debug!("Created track {}", index);
        Ok(true)
    }

    pub fn track(&self, index: usize) -> Option<&Track> {
        self.tracks.get(&index)
    }

    pub fn track_mut(&mut self, index: usize) -> Option<&mut Track> {
        self.tracks.get_mut(&index)
    }

    /// Tracks in index order.
    pub fn tracks(&self) -> impl Iterator<Item = (usize, &Track)> {
        self.tracks.iter().map(|(i, t)| (*i, t))
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// Add an item to a track, assigning a fresh id if `item.id` is taken.
    pub fn add_item(&mut self, track: usize, mut item: Item) -> Result<ItemId> {
        if self.locate(item.id).is_some() {
            item.id = ItemId(self.next_item_id);
        }
        self.next_item_id = self.next_item_id.max(item.id.0 + 1);
        let id = item.id;
        self.tracks
            .get_mut(&track)
            .ok_or(AlignError::TrackNotFound { index: track })?
            .items
            .push(item);
        Ok(id)
    }

    /// Index of the track holding `id`.
    pub fn locate(&self, id: ItemId) -> Option<usize> {
        self.tracks
            .iter()
            .find(|(_, t)| t.items.iter().any(|i| i.id == id))
            .map(|(index, _)| *index)
    }

    pub fn item(&self, id: ItemId) -> Result<&Item> {
        self.tracks
            .values()
            .find_map(|t| t.item(id))
            .ok_or(AlignError::ItemNotFound { item: id })
    }

    pub fn item_mut(&mut self, id: ItemId) -> Result<&mut Item> {
        self.tracks
            .values_mut()
            .find_map(|t| t.item_mut(id))
            .ok_or(AlignError::ItemNotFound { item: id })
    }

    /// Move an item to another existing track.
    pub fn move_item(&mut self, id: ItemId, destination: usize) -> Result<()> {
        if !self.tracks.contains_key(&destination) {
            return Err(AlignError::TrackNotFound { index: destination });
        }
        let origin = self.locate(id).ok_or(AlignError::ItemNotFound { item: id })?;
        if origin == destination {
            return Ok(());
        }

        let item = {
            let track = self
                .tracks
                .get_mut(&origin)
                .ok_or(AlignError::TrackNotFound { index: origin })?;
            let pos = track
                .items
                .iter()
                .position(|i| i.id == id)
                .ok_or(AlignError::ItemNotFound { item: id })?;
            track.items.remove(pos)
        };

        if let Some(track) = self.tracks.get_mut(&destination) {
            track.items.push(item);
        }
        log::debug!("Moved item {} from track {} to {}", id, origin, destination);
        Ok(())
    }

    /// Snapshot of every editable field.
    pub fn layout(&self) -> Layout {
        let tracks = self
            .tracks
            .iter()
            .map(|(index, t)| TrackLayout {
                index: *index,
                name: t.name.clone(),
                mute: t.mute,
            })
            .collect();
        let mut items: Vec<ItemLayout> = self
            .tracks
            .iter()
            .flat_map(|(index, t)| {
                t.items.iter().map(move |i| ItemLayout {
                    id: i.id,
                    track: *index,
                    position: i.position,
                    length: i.length,
                    mute: i.mute,
                    fade_in: i.fade_in,
                    fade_out: i.fade_out,
                })
            })
            .collect();
        items.sort_by_key(|i| i.id);
        Layout { tracks, items }
    }

    /// Restore a snapshot taken with [`Session::layout`].
    ///
    /// Tracks absent from the snapshot are removed once empty; items keep
    /// their takes.
    pub fn apply_layout(&mut self, layout: &Layout) -> Result<()> {
        for t in &layout.tracks {
            let track = self.tracks.entry(t.index).or_default();
            track.name = t.name.clone();
            track.mute = t.mute;
        }

        for entry in &layout.items {
            self.move_item(entry.id, entry.track)?;
            let item = self.item_mut(entry.id)?;
            item.position = entry.position;
            item.length = entry.length;
            item.mute = entry.mute;
            item.fade_in = entry.fade_in;
            item.fade_out = entry.fade_out;
        }

        let keep: Vec<usize> = layout.tracks.iter().map(|t| t.index).collect();
        self.tracks
            .retain(|index, track| keep.contains(index) || !track.items.is_empty());
        Ok(())
    }
}
