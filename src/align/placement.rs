//! Placement Resolver
//!
//! Decides how a multi-item target set is laid out. Items spread over
//! several tracks are aligned independently in place. Items that all come
//! from one track would collide on it, so they are stacked: the leftmost
//! stays, each later one moves to the next track down, and every peak ends
//! up on the same instant.

use serde::Serialize;

use crate::align::engine::{align_to_instant, ItemOutcome};
use crate::config::AlignConfig;
use crate::error::AlignError;
use crate::session::{ItemId, Session};

/// Layout decision taken for a set of items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "strategy")]
pub enum PlacementStrategy {
    /// Fewer than two alignable items: aligned where they are.
    InPlace,
    /// Items on different tracks, each aligned on its own track.
    Independent,
    /// Items from one track, stacked onto consecutive tracks.
    Stacked {
        origin: usize,
        created_tracks: Vec<usize>,
    },
}

/// Strategy plus the per-item outcomes, in processing order.
#[derive(Debug)]
pub struct Resolution {
    pub strategy: PlacementStrategy,
    pub outcomes: Vec<ItemOutcome>,
}

/// Align every item in `items` to `target_time`.
///
/// Items that cannot be scanned are reported and left out before stack
/// slots are handed out, so they never cause a track to be created.
/// A failure on one item never stops the others.
pub fn resolve(
    session: &mut Session,
    items: &[ItemId],
    target_time: f64,
    config: &AlignConfig,
) -> Resolution {
    let mut outcomes = Vec::with_capacity(items.len());

    if items.len() < 2 {
        for &id in items {
            let result = align_to_instant(session, id, target_time, None, config);
            outcomes.push(ItemOutcome::new(id, result));
        }
        return Resolution {
            strategy: PlacementStrategy::InPlace,
            outcomes,
        };
    }

    // (id, track, start position) of every item that can be aligned
    let mut eligible: Vec<(ItemId, usize, f64)> = Vec::with_capacity(items.len());
    for &id in items {
        if eligible.iter().any(|(seen, _, _)| *seen == id) {
            continue;
        }
        let checked = session
            .locate(id)
            .ok_or(AlignError::ItemNotFound { item: id })
            .and_then(|track| {
                let item = session.item(id)?;
                item.audio_source()?;
                Ok((track, item.position))
            });
        match checked {
            Ok((track, position)) => eligible.push((id, track, position)),
            Err(e) => {
                log::warn!("Skipping item {}: {}", id, e);
                outcomes.push(ItemOutcome::new(id, Err(e)));
            }
        }
    }

    let same_track = eligible.windows(2).all(|w| w[0].1 == w[1].1);

    if eligible.len() < 2 {
        for (id, _, _) in eligible {
            let result = align_to_instant(session, id, target_time, None, config);
            outcomes.push(ItemOutcome::new(id, result));
        }
        return Resolution {
            strategy: PlacementStrategy::InPlace,
            outcomes,
        };
    }

    if !same_track {
        for (id, _, _) in eligible {
            let result = align_to_instant(session, id, target_time, None, config);
            outcomes.push(ItemOutcome::new(id, result));
        }
        return Resolution {
            strategy: PlacementStrategy::Independent,
            outcomes,
        };
    }

    // stable sort keeps source order for equal starts
    eligible.sort_by(|a, b| a.2.total_cmp(&b.2));
    let origin = eligible[0].1;
    let mut created_tracks = Vec::new();

    // Later slots leave the origin track before the leftmost item is
    // aligned, so every crossfade is repaired against final positions.
    let mut stacked: Vec<(usize, ItemOutcome)> = Vec::with_capacity(eligible.len());
    for slot in (1..eligible.len()).chain(std::iter::once(0)) {
        let id = eligible[slot].0;
        let result = if slot == 0 {
            align_to_instant(session, id, target_time, None, config)
        } else {
            let destination = origin + slot;
            match session.ensure_track(destination, config.max_tracks) {
                Ok(created) => {
                    if created {
                        log::info!("Created track {} for stacked item {}", destination, id);
                        created_tracks.push(destination);
                    }
                    align_to_instant(session, id, target_time, Some(destination), config)
                }
                Err(e) => Err(e),
            }
        };

        if let Err(e) = &result {
            log::warn!("Item {} not aligned: {}", id, e);
        }
        stacked.push((slot, ItemOutcome::new(id, result)));
    }
    stacked.sort_by_key(|(slot, _)| *slot);
    outcomes.extend(stacked.into_iter().map(|(_, outcome)| outcome));

    Resolution {
        strategy: PlacementStrategy::Stacked {
            origin,
            created_tracks,
        },
        outcomes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::AudioBuffer;
    use crate::session::{AudioSource, Fade, Item, Take, Track};
    use approx::assert_abs_diff_eq;
    use pretty_assertions::assert_eq;

    const RATE: u32 = 1000;

    fn hit(peak_ms: usize) -> Take {
        let mut samples = vec![0.0_f32; 500];
        samples[peak_ms] = 0.9;
        Take::audio("hit", AudioSource::new(AudioBuffer::mono(samples, RATE)))
    }

    fn peak_time(session: &Session, id: ItemId, peak_ms: usize) -> f64 {
        session.item(id).unwrap().position + peak_ms as f64 / RATE as f64
    }

    #[test]
    fn test_same_track_items_are_stacked() {
        let mut session = Session::new();
        let t = session.add_track(Track::new("Snare"));
        let ids: Vec<ItemId> = [(0.0, 100), (1.0, 200), (2.0, 300)]
            .iter()
            .enumerate()
            .map(|(n, &(pos, peak))| {
                session
                    .add_item(t, Item::new(ItemId(n as u32), pos, 0.5).with_take(hit(peak)))
                    .unwrap()
            })
            .collect();

        // hand the items over out of order; stacking follows start position
        let order = [ids[2], ids[0], ids[1]];
        let resolution = resolve(&mut session, &order, 5.0, &AlignConfig::default());

        assert_eq!(
            resolution.strategy,
            PlacementStrategy::Stacked {
                origin: 0,
                created_tracks: vec![1, 2],
            }
        );
        assert!(resolution.outcomes.iter().all(|o| o.is_aligned()));
        assert_eq!(session.locate(ids[0]), Some(0));
        assert_eq!(session.locate(ids[1]), Some(1));
        assert_eq!(session.locate(ids[2]), Some(2));
        for (id, peak) in ids.iter().zip([100, 200, 300]) {
            assert_abs_diff_eq!(peak_time(&session, *id, peak), 5.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_stacked_items_get_no_fades_from_each_other() {
        let mut session = Session::new();
        let t = session.add_track(Track::new("Drums"));
        let ids: Vec<ItemId> = [(0.0, 100), (3.0, 200), (6.0, 300)]
            .iter()
            .enumerate()
            .map(|(n, &(pos, peak))| {
                session
                    .add_item(t, Item::new(ItemId(n as u32), pos, 2.0).with_take(hit(peak)))
                    .unwrap()
            })
            .collect();

        let resolution = resolve(&mut session, &ids, 5.0, &AlignConfig::default());
        assert!(resolution.outcomes.iter().all(|o| o.is_aligned()));
        let order: Vec<ItemId> = resolution.outcomes.iter().map(|o| o.item).collect();
        assert_eq!(order, ids);

        for &id in &ids {
            let item = session.item(id).unwrap();
            assert_eq!(item.fade_in, Fade::default());
            assert_eq!(item.fade_out, Fade::default());
        }
    }

    #[test]
    fn test_stacked_leftmost_fades_against_staying_items() {
        let mut session = Session::new();
        let t = session.add_track(Track::new("Drums"));
        let a = session.add_item(t, Item::new(ItemId(0), 0.0, 2.0).with_take(hit(100))).unwrap();
        let b = session.add_item(t, Item::new(ItemId(1), 3.0, 2.0).with_take(hit(100))).unwrap();
        // not part of the batch; lands under the leftmost item's new span
        let stays = session.add_item(t, Item::new(ItemId(2), 5.5, 1.0)).unwrap();

        let resolution = resolve(&mut session, &[a, b], 5.0, &AlignConfig::default());
        assert!(resolution.outcomes.iter().all(|o| o.is_aligned()));
        assert_eq!(session.locate(b), Some(1));

        // a spans 4.9..6.9 and covers all of 5.5..6.5
        let a_item = session.item(a).unwrap();
        assert_abs_diff_eq!(a_item.fade_out.length, 1.0, epsilon = 1e-9);
        assert_eq!(a_item.fade_in, Fade::default());
        assert_abs_diff_eq!(session.item(stays).unwrap().fade_in.length, 1.0, epsilon = 1e-9);
        let b_item = session.item(b).unwrap();
        assert_eq!(b_item.fade_in, Fade::default());
        assert_eq!(b_item.fade_out, Fade::default());
    }

    #[test]
    fn test_stack_reuses_existing_tracks() {
        let mut session = Session::new();
        let t = session.add_track(Track::new("Snare"));
        session.add_track(Track::new("Existing"));
        let a = session.add_item(t, Item::new(ItemId(0), 0.0, 0.5).with_take(hit(0))).unwrap();
        let b = session.add_item(t, Item::new(ItemId(1), 1.0, 0.5).with_take(hit(0))).unwrap();

        let resolution = resolve(&mut session, &[a, b], 2.0, &AlignConfig::default());
        assert_eq!(
            resolution.strategy,
            PlacementStrategy::Stacked {
                origin: 0,
                created_tracks: vec![],
            }
        );
        assert_eq!(session.track(1).unwrap().name, "Existing");
        assert_eq!(session.locate(b), Some(1));
    }

    #[test]
    fn test_different_tracks_align_independently() {
        let mut session = Session::new();
        let t0 = session.add_track(Track::new("Kick"));
        let t1 = session.add_track(Track::new("Snare"));
        let a = session.add_item(t0, Item::new(ItemId(0), 0.0, 0.5).with_take(hit(50))).unwrap();
        let b = session.add_item(t1, Item::new(ItemId(1), 3.0, 0.5).with_take(hit(150))).unwrap();

        let resolution = resolve(&mut session, &[a, b], 1.0, &AlignConfig::default());
        assert_eq!(resolution.strategy, PlacementStrategy::Independent);
        assert_eq!(session.track_count(), 2);
        assert_eq!(session.locate(a), Some(t0));
        assert_eq!(session.locate(b), Some(t1));
        assert_abs_diff_eq!(peak_time(&session, a, 50), 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(peak_time(&session, b, 150), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_single_item_in_place() {
        let mut session = Session::new();
        let t = session.add_track(Track::new("Kick"));
        let a = session.add_item(t, Item::new(ItemId(0), 0.0, 0.5).with_take(hit(10))).unwrap();
        let resolution = resolve(&mut session, &[a], 1.0, &AlignConfig::default());
        assert_eq!(resolution.strategy, PlacementStrategy::InPlace);
        assert_eq!(resolution.outcomes.len(), 1);
    }

    #[test]
    fn test_unsupported_items_do_not_take_stack_slots() {
        let mut session = Session::new();
        let t = session.add_track(Track::new("Mixed"));
        let a = session.add_item(t, Item::new(ItemId(0), 0.0, 0.5).with_take(hit(0))).unwrap();
        let midi = session
            .add_item(t, Item::new(ItemId(1), 0.5, 0.5).with_take(Take::midi("pad")))
            .unwrap();
        let b = session.add_item(t, Item::new(ItemId(2), 1.0, 0.5).with_take(hit(0))).unwrap();

        let resolution = resolve(&mut session, &[a, midi, b], 4.0, &AlignConfig::default());
        assert_eq!(session.locate(midi), Some(0));
        assert_eq!(session.locate(b), Some(1));
        assert_eq!(session.track_count(), 2);

        let failed: Vec<ItemId> = resolution
            .outcomes
            .iter()
            .filter(|o| !o.is_aligned())
            .map(|o| o.item)
            .collect();
        assert_eq!(failed, vec![midi]);
    }

    #[test]
    fn test_track_allocation_failure_is_per_item() {
        let mut session = Session::new();
        let t = session.add_track(Track::new("Snare"));
        let ids: Vec<ItemId> = (0..3)
            .map(|n| {
                session
                    .add_item(t, Item::new(ItemId(n), n as f64, 0.5).with_take(hit(0)))
                    .unwrap()
            })
            .collect();
        let config = AlignConfig {
            max_tracks: 2,
            ..AlignConfig::default()
        };

        let resolution = resolve(&mut session, &ids, 8.0, &config);
        assert!(resolution.outcomes[0].is_aligned());
        assert!(resolution.outcomes[1].is_aligned());
        assert!(matches!(
            resolution.outcomes[2].result,
            Err(AlignError::TrackAllocationFailure { index: 2, .. })
        ));
        // the failed item is neither moved nor reassigned
        assert_eq!(session.locate(ids[2]), Some(0));
        assert_eq!(session.item(ids[2]).unwrap().position, 2.0);
    }

    #[test]
    fn test_unknown_ids_reported() {
        let mut session = Session::new();
        let t = session.add_track(Track::new("Kick"));
        let a = session.add_item(t, Item::new(ItemId(0), 0.0, 0.5).with_take(hit(0))).unwrap();
        let resolution = resolve(&mut session, &[a, ItemId(42)], 1.0, &AlignConfig::default());
        assert_eq!(resolution.strategy, PlacementStrategy::InPlace);
        assert_eq!(resolution.outcomes.len(), 2);
        assert!(matches!(
            resolution.outcomes[0].result,
            Err(AlignError::ItemNotFound { .. })
        ));
        assert!(resolution.outcomes[1].is_aligned());
    }
}
