//! Crossfade Synthesizer
//!
//! After an item moves, every overlap with another item on its track gets a
//! crossfade: the left item's fade-out and the right item's fade-in are
//! extended to cover the overlap. Existing longer fades are never shortened.

use crate::config::AlignConfig;
use crate::error::{AlignError, Result};
use crate::session::{Fade, FadeShape, Item, ItemId, Session};

/// Length of the intersection of two items' intervals, `0.0` if disjoint.
pub fn overlap_between(a: &Item, b: &Item) -> f64 {
    (a.end().min(b.end()) - a.position.max(b.position)).max(0.0)
}

/// Extend `fade` to `overlap` if it is absent or shorter.
///
/// A linear (default) shape is replaced by `shape`; any other shape is
/// kept. Returns whether the fade changed.
pub fn extend_fade(fade: &mut Fade, overlap: f64, shape: FadeShape) -> bool {
    if fade.length > 0.0 && fade.length >= overlap {
        return false;
    }
    fade.length = overlap;
    if fade.shape.is_default() {
        fade.shape = shape;
    }
    true
}

/// Extend fades between `id` and every overlapping item on its track.
///
/// Returns the number of fade edges changed. Running it again with
/// unchanged positions changes nothing.
pub fn repair_overlaps(session: &mut Session, id: ItemId, config: &AlignConfig) -> Result<usize> {
    let index = session
        .locate(id)
        .ok_or(AlignError::ItemNotFound { item: id })?;
    let track = session
        .track_mut(index)
        .ok_or(AlignError::TrackNotFound { index })?;
    let me = track
        .items
        .iter()
        .position(|i| i.id == id)
        .ok_or(AlignError::ItemNotFound { item: id })?;

    let mut changed = 0;
    for other in 0..track.items.len() {
        if other == me {
            continue;
        }

        let overlap = overlap_between(&track.items[me], &track.items[other]);
        if overlap <= config.min_overlap_secs {
            continue;
        }

        let (left, right) = if track.items[me].position < track.items[other].position {
            (me, other)
        } else {
            (other, me)
        };

        if extend_fade(&mut track.items[left].fade_out, overlap, config.crossfade_shape) {
            changed += 1;
        }
        if extend_fade(&mut track.items[right].fade_in, overlap, config.crossfade_shape) {
            changed += 1;
        }

        log::debug!(
            "Crossfade {:.6}s between items {} and {} on track {}",
            overlap,
            track.items[left].id,
            track.items[right].id,
            index
        );
    }

    Ok(changed)
}
