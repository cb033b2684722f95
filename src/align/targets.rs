//! Selection/Hover Disambiguator
//!
//! Picks the operative item set from the hover and selection snapshot.

use serde::Serialize;

use crate::error::{AlignError, Result};
use crate::session::{ItemId, SelectionState};

/// Whether a pass handles one item or a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetMode {
    Single,
    /// Multi-item handling; same-track batches may be stacked.
    Batch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Targets {
    pub items: Vec<ItemId>,
    pub mode: TargetMode,
}

impl Targets {
    fn single(id: ItemId) -> Self {
        Self {
            items: vec![id],
            mode: TargetMode::Single,
        }
    }

    /// Deduplicated selection; batch mode only with more than one item.
    fn from_selection(selected: &[ItemId]) -> Self {
        let mut items: Vec<ItemId> = Vec::with_capacity(selected.len());
        for id in selected {
            if !items.contains(id) {
                items.push(*id);
            }
        }
        let mode = if items.len() > 1 {
            TargetMode::Batch
        } else {
            TargetMode::Single
        };
        Self { items, mode }
    }
}

/// Decide which items a pass operates on.
///
/// In priority order:
/// 1. hovered item outside the selection: that item alone, and it becomes
///    the only selected item
/// 2. hovered item inside a selection of several distinct items: the
///    whole selection
/// 3. hovered item that is the only distinct selected item: that item
/// 4. no hover, one selected item: that item
/// 5. no hover, several distinct selected items: the whole selection
///
/// # Errors
/// * `NoTarget` - nothing hovered and nothing selected
pub fn resolve_targets(selection: &mut SelectionState) -> Result<Targets> {
    if let Some(hovered) = selection.hovered {
        if !selection.is_selected(hovered) {
            selection.select_exclusive(hovered);
            return Ok(Targets::single(hovered));
        }
        return Ok(Targets::from_selection(&selection.selected));
    }

    if selection.is_empty() {
        return Err(AlignError::NoTarget);
    }
    Ok(Targets::from_selection(&selection.selected))
}
