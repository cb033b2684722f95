//! Undo/Redo System
//!
//! Each alignment pass is one undoable action holding complete layout
//! snapshots from before and after the pass, so a pass with partial
//! per-item failures still reverts atomically.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::DEFAULT_MAX_UNDO_LEVELS;
use crate::error::{AlignError, Result};
use crate::session::model::{Layout, Session};

/// Types of actions that can be undone/redone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// A single item aligned in place.
    AlignItem,

    /// A multi-item pass, possibly stacking items onto new tracks.
    AlignBatch,
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionType::AlignItem => write!(f, "Align Item"),
            ActionType::AlignBatch => write!(f, "Align Items"),
        }
    }
}

/// A single undoable action with complete layout snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UndoAction {
    /// Unique identifier for this action.
    pub id: String,

    pub action_type: ActionType,

    /// Human-readable description of the action.
    pub description: String,

    pub timestamp: DateTime<Utc>,

    /// Session layout before the action.
    pub state_before: serde_json::Value,

    /// Session layout after the action.
    pub state_after: serde_json::Value,
}

impl UndoAction {
    /// Create a new undo action with a generated UUID.
    pub fn new(
        action_type: ActionType,
        description: impl Into<String>,
        before: &Layout,
        after: &Layout,
    ) -> Result<Self> {
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            action_type,
            description: description.into(),
            timestamp: Utc::now(),
            state_before: serde_json::to_value(before)?,
            state_after: serde_json::to_value(after)?,
        })
    }
}

/// An open undo block: the layout captured when the block began.
///
/// Commit it with [`UndoManager::commit`] once the edit is done.
#[derive(Debug)]
pub struct Transaction {
    action_type: ActionType,
    before: Layout,
}

impl Transaction {
    pub fn begin(session: &Session, action_type: ActionType) -> Self {
        Self {
            action_type,
            before: session.layout(),
        }
    }
}

/// Manages undo/redo operations for a session.
#[derive(Debug, Clone)]
pub struct UndoManager {
    undo_stack: Vec<UndoAction>,
    redo_stack: Vec<UndoAction>,
    max_undo_levels: usize,
    /// IDs of actions dropped when history was trimmed.
    discarded_action_ids: Vec<String>,
}

impl Default for UndoManager {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_UNDO_LEVELS)
    }
}

impl UndoManager {
    /// Create a new undo manager with the specified maximum undo levels.
    pub fn new(max_levels: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_undo_levels: max_levels,
            discarded_action_ids: Vec::new(),
        }
    }

    /// Close a transaction.
    ///
    /// Records an action only if the layout changed; returns its id.
    pub fn commit(
        &mut self,
        transaction: Transaction,
        session: &Session,
        description: impl Into<String>,
    ) -> Result<Option<String>> {
        let after = session.layout();
        if after == transaction.before {
            log::debug!("Transaction left the session unchanged, nothing recorded");
            return Ok(None);
        }

        let action = UndoAction::new(
            transaction.action_type,
            description,
            &transaction.before,
            &after,
        )?;
        let id = action.id.clone();
        self.push(action);
        Ok(Some(id))
    }

    /// Push a new action onto the undo stack.
    ///
    /// This clears the redo stack (since the history has diverged)
    /// and trims the undo stack if it exceeds max_undo_levels.
    pub fn push(&mut self, action: UndoAction) {
        self.redo_stack.clear();
        self.undo_stack.push(action);
        self.trim_history();
    }

    /// Undo the last action, restoring the session to its previous layout.
    pub fn undo(&mut self, session: &mut Session) -> Result<UndoAction> {
        let action = self.undo_stack.pop().ok_or(AlignError::NothingToUndo)?;

        let layout: Layout = serde_json::from_value(action.state_before.clone())?;
        session.apply_layout(&layout)?;

        self.redo_stack.push(action.clone());
        Ok(action)
    }

    /// Redo the last undone action.
    pub fn redo(&mut self, session: &mut Session) -> Result<UndoAction> {
        let action = self.redo_stack.pop().ok_or(AlignError::NothingToRedo)?;

        let layout: Layout = serde_json::from_value(action.state_after.clone())?;
        session.apply_layout(&layout)?;

        self.undo_stack.push(action.clone());
        Ok(action)
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Get the most recent action that can be undone (if any).
    pub fn peek_undo(&self) -> Option<&UndoAction> {
        self.undo_stack.last()
    }

    pub fn max_undo_levels(&self) -> usize {
        self.max_undo_levels
    }

    /// Set the maximum number of undo levels, trimming if needed.
    pub fn set_max_undo_levels(&mut self, max_levels: usize) {
        self.max_undo_levels = max_levels;
        self.trim_history();
    }

    pub fn discarded_action_ids(&self) -> &[String] {
        &self.discarded_action_ids
    }

    fn trim_history(&mut self) {
        while self.undo_stack.len() > self.max_undo_levels {
            let removed = self.undo_stack.remove(0);
            self.discarded_action_ids.push(removed.id);
        }
    }
}
