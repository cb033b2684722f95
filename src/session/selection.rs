//! Selection and cursor snapshots handed to an alignment pass.

use serde::{Deserialize, Serialize};

use super::model::ItemId;

/// Selected items plus the item under the pointer, if any.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectionState {
    #[serde(default)]
    pub selected: Vec<ItemId>,
    #[serde(default)]
    pub hovered: Option<ItemId>,
}

impl SelectionState {
    pub fn new(selected: Vec<ItemId>, hovered: Option<ItemId>) -> Self {
        Self { selected, hovered }
    }

    pub fn is_selected(&self, id: ItemId) -> bool {
        self.selected.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Clear the selection and select only `id`.
    pub fn select_exclusive(&mut self, id: ItemId) {
        self.selected.clear();
        self.selected.push(id);
    }
}

/// The alignment target instant, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimelineCursor(pub f64);

impl TimelineCursor {
    pub fn seconds(&self) -> f64 {
        self.0
    }
}
