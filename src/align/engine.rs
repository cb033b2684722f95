//! Alignment Engine
//!
//! Moves an item so its detected peak lands on a target instant, optionally
//! onto another track, then repairs overlaps at the final position.

use crate::align::crossfade::repair_overlaps;
use crate::align::scanner::find_peak_offset;
use crate::config::AlignConfig;
use crate::error::{AlignError, Result};
use crate::session::{ItemId, Session};

/// Where an item ended up after alignment.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedItem {
    pub item: ItemId,
    /// Track index after the move.
    pub track: usize,
    pub previous_position: f64,
    pub position: f64,
    /// Peak offset from the take start, in seconds.
    pub peak_offset: f64,
    pub moved_track: bool,
    /// Number of fade edges extended by crossfade repair.
    pub fades_changed: usize,
}

/// Result of aligning one item of a pass.
#[derive(Debug)]
pub struct ItemOutcome {
    pub item: ItemId,
    pub result: Result<AlignedItem>,
}

impl ItemOutcome {
    pub fn new(item: ItemId, result: Result<AlignedItem>) -> Self {
        Self { item, result }
    }

    pub fn is_aligned(&self) -> bool {
        self.result.is_ok()
    }
}

/// Item and track mute flags saved before analysis.
#[derive(Debug, Clone, Copy)]
struct MuteState {
    item: ItemId,
    track: usize,
    item_mute: bool,
    track_mute: bool,
}

impl MuteState {
    fn capture(session: &Session, item: ItemId, track: usize) -> Result<Self> {
        let item_mute = session.item(item)?.mute;
        let track_mute = session
            .track(track)
            .ok_or(AlignError::TrackNotFound { index: track })?
            .mute;
        Ok(Self {
            item,
            track,
            item_mute,
            track_mute,
        })
    }

    fn clear(&self, session: &mut Session) {
        self.apply(session, false, false);
    }

    fn restore(&self, session: &mut Session) {
        self.apply(session, self.item_mute, self.track_mute);
    }

    fn apply(&self, session: &mut Session, item_mute: bool, track_mute: bool) {
        // The item may have changed tracks in between; look it up again.
        if let Ok(item) = session.item_mut(self.item) {
            item.mute = item_mute;
        }
        if let Some(track) = session.track_mut(self.track) {
            track.mute = track_mute;
        }
    }
}

/// Align `id` so that its peak sits at `target_time`.
///
/// With a `destination` different from the item's track, the item is also
/// moved to that (existing) track. Mute flags of the item and its original
/// track are cleared for the analysis and restored on every path.
/// Crossfade repair runs on the final track after a successful move.
///
/// # Errors
/// * `ItemNotFound` - `id` is not in the session
/// * `UnsupportedTake` / `MissingAudioSource` - nothing to scan
/// * `TrackNotFound` - `destination` does not exist; the item is untouched
pub fn align_to_instant(
    session: &mut Session,
    id: ItemId,
    target_time: f64,
    destination: Option<usize>,
    config: &AlignConfig,
) -> Result<AlignedItem> {
    let origin = session
        .locate(id)
        .ok_or(AlignError::ItemNotFound { item: id })?;
    let previous_position = session.item(id)?.position;

    let saved = MuteState::capture(session, id, origin)?;
    saved.clear(session);
    let moved = reposition(session, id, origin, target_time, destination, config);
    saved.restore(session);

    let (peak_offset, track) = moved?;
    let fades_changed = repair_overlaps(session, id, config)?;
    let position = session.item(id)?.position;

    log::debug!(
        "Aligned item {}: {:.6}s -> {:.6}s on track {} (peak at +{:.6}s)",
        id,
        previous_position,
        position,
        track,
        peak_offset
    );

    Ok(AlignedItem {
        item: id,
        track,
        previous_position,
        position,
        peak_offset,
        moved_track: track != origin,
        fades_changed,
    })
}

/// Scan, set the new start and reassign the track. Returns the peak offset
/// and the final track index.
fn reposition(
    session: &mut Session,
    id: ItemId,
    origin: usize,
    target_time: f64,
    destination: Option<usize>,
    config: &AlignConfig,
) -> Result<(f64, usize)> {
    let peak_offset = {
        let item = session.item(id)?;
        find_peak_offset(id, item.active_take()?, config.block_size)?
    };

    let track = match destination {
        Some(dest) if dest != origin => {
            if session.track(dest).is_none() {
                return Err(AlignError::TrackNotFound { index: dest });
            }
            dest
        }
        _ => origin,
    };

    session.item_mut(id)?.position = target_time - peak_offset;
    if track != origin {
        session.move_item(id, track)?;
    }
    Ok((peak_offset, track))
}
