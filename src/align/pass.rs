//! Alignment pass
//!
//! The single synchronous entry point: pick the targets, align them, and
//! record the whole pass as one undoable action.

use serde::Serialize;

use crate::align::engine::{align_to_instant, AlignedItem, ItemOutcome};
use crate::align::placement::{resolve, PlacementStrategy};
use crate::align::targets::{resolve_targets, TargetMode};
use crate::config::AlignConfig;
use crate::error::{AlignError, Result};
use crate::session::{
    ActionType, ItemId, SelectionState, Session, TimelineCursor, Transaction, UndoManager,
};

/// What a pass did.
#[derive(Debug)]
pub struct AlignReport {
    pub target_time: f64,
    pub mode: TargetMode,
    pub strategy: PlacementStrategy,
    pub outcomes: Vec<ItemOutcome>,
    /// Undo action id, if the pass changed the session.
    pub undo_id: Option<String>,
}

/// Serializable per-item summary for printing.
#[derive(Debug, Clone, Serialize)]
pub struct OutcomeSummary {
    pub item: ItemId,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peak_offset: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AlignReport {
    /// Items that were aligned.
    pub fn aligned(&self) -> impl Iterator<Item = &AlignedItem> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok())
    }

    /// Items that were skipped or failed, with the reason.
    pub fn failures(&self) -> impl Iterator<Item = (ItemId, &AlignError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.item, e)))
    }

    /// True when no item was aligned.
    pub fn is_noop(&self) -> bool {
        self.aligned().next().is_none()
    }

    pub fn summaries(&self) -> Vec<OutcomeSummary> {
        self.outcomes
            .iter()
            .map(|o| match &o.result {
                Ok(a) => OutcomeSummary {
                    item: o.item,
                    status: "aligned",
                    track: Some(a.track),
                    position: Some(a.position),
                    peak_offset: Some(a.peak_offset),
                    error: None,
                },
                Err(e) => OutcomeSummary {
                    item: o.item,
                    status: if e.is_skip() { "skipped" } else { "failed" },
                    track: None,
                    position: None,
                    peak_offset: None,
                    error: Some(e.to_string()),
                },
            })
            .collect()
    }
}

/// Run one alignment pass against the cursor.
///
/// Per-item problems end up in the report; the pass itself only fails when
/// there is nothing to align or the configuration is unusable. The changes
/// of the whole pass are committed to `undo` as a single action.
///
/// # Errors
/// * `NoTarget` - nothing hovered and nothing selected; the session is untouched
/// * `InvalidConfig` - `config` failed validation
pub fn run_pass(
    session: &mut Session,
    selection: &mut SelectionState,
    cursor: TimelineCursor,
    undo: &mut UndoManager,
    config: &AlignConfig,
) -> Result<AlignReport> {
    config.validate()?;

    let targets = match resolve_targets(selection) {
        Ok(targets) => targets,
        Err(e) => {
            log::info!("{}", e);
            return Err(e);
        }
    };
    let target_time = cursor.seconds();

    log::info!(
        "Aligning {} item(s) to {:.6}s ({:?})",
        targets.items.len(),
        target_time,
        targets.mode
    );

    let action_type = match targets.mode {
        TargetMode::Single => ActionType::AlignItem,
        TargetMode::Batch => ActionType::AlignBatch,
    };
    let transaction = Transaction::begin(session, action_type);

    let (strategy, outcomes) = match targets.mode {
        TargetMode::Single => {
            let outcomes: Vec<ItemOutcome> = targets
                .items
                .iter()
                .map(|&id| {
                    ItemOutcome::new(id, align_to_instant(session, id, target_time, None, config))
                })
                .collect();
            (PlacementStrategy::InPlace, outcomes)
        }
        TargetMode::Batch => {
            let resolution = resolve(session, &targets.items, target_time, config);
            (resolution.strategy, resolution.outcomes)
        }
    };

    let aligned = outcomes.iter().filter(|o| o.is_aligned()).count();
    for outcome in &outcomes {
        if let Err(e) = &outcome.result {
            log::warn!("Item {}: {} [{}]", outcome.item, e, e.error_code());
        }
    }

    let description = format!("Align {} item(s) to peak at {:.3}s", aligned, target_time);
    let undo_id = undo.commit(transaction, session, description)?;

    log::info!(
        "Pass complete: {} aligned, {} not aligned",
        aligned,
        outcomes.len() - aligned
    );

    Ok(AlignReport {
        target_time,
        mode: targets.mode,
        strategy,
        outcomes,
        undo_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::AudioBuffer;
    use crate::session::{AudioSource, Item, Take, Track};

    fn hit() -> Take {
        let mut samples = vec![0.0_f32; 100];
        samples[20] = 1.0;
        Take::audio("hit", AudioSource::new(AudioBuffer::mono(samples, 100)))
    }

    #[test]
    fn test_no_target_leaves_history_empty() {
        let mut session = Session::new();
        session.add_track(Track::new("Empty"));
        let mut selection = SelectionState::default();
        let mut undo = UndoManager::default();

        let err = run_pass(
            &mut session,
            &mut selection,
            TimelineCursor(1.0),
            &mut undo,
            &AlignConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, AlignError::NoTarget));
        assert!(!undo.can_undo());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut session = Session::new();
        let mut selection = SelectionState::new(vec![ItemId(0)], None);
        let config = AlignConfig {
            block_size: 0,
            ..AlignConfig::default()
        };
        let err = run_pass(
            &mut session,
            &mut selection,
            TimelineCursor(0.0),
            &mut UndoManager::default(),
            &config,
        )
        .unwrap_err();
        assert!(matches!(err, AlignError::InvalidConfig { .. }));
    }

    #[test]
    fn test_single_pass_recorded_once() {
        let mut session = Session::new();
        let t = session.add_track(Track::new("Kick"));
        let id = session
            .add_item(t, Item::new(ItemId(0), 0.0, 1.0).with_take(hit()))
            .unwrap();
        let mut selection = SelectionState::new(vec![id], None);
        let mut undo = UndoManager::default();

        let report = run_pass(
            &mut session,
            &mut selection,
            TimelineCursor(2.0),
            &mut undo,
            &AlignConfig::default(),
        )
        .unwrap();

        assert_eq!(report.mode, TargetMode::Single);
        assert_eq!(report.strategy, PlacementStrategy::InPlace);
        assert!(!report.is_noop());
        assert!(report.undo_id.is_some());
        assert_eq!(undo.undo_count(), 1);
        assert_eq!(undo.peek_undo().unwrap().action_type, ActionType::AlignItem);

        let summaries = report.summaries();
        assert_eq!(summaries[0].status, "aligned");
        approx::assert_abs_diff_eq!(summaries[0].position.unwrap(), 1.8, epsilon = 1e-9);
    }

    #[test]
    fn test_skipped_only_pass_records_nothing() {
        let mut session = Session::new();
        let t = session.add_track(Track::new("Keys"));
        let id = session
            .add_item(t, Item::new(ItemId(0), 0.0, 1.0).with_take(Take::midi("pad")))
            .unwrap();
        let mut selection = SelectionState::new(vec![id], None);
        let mut undo = UndoManager::default();

        let report = run_pass(
            &mut session,
            &mut selection,
            TimelineCursor(2.0),
            &mut undo,
            &AlignConfig::default(),
        )
        .unwrap();
        assert!(report.is_noop());
        assert!(report.undo_id.is_none());
        assert_eq!(report.failures().count(), 1);
        assert_eq!(report.summaries()[0].status, "skipped");
    }
}
