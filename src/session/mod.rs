//! Session Module
//!
//! The timeline model an alignment pass edits: tracks, items, takes and
//! sources, plus the selection snapshot, the undo history and the JSON
//! session description used by the command-line front end.

pub mod file;
pub mod model;
pub mod selection;
pub mod undo;

pub use file::SessionFile;
pub use model::{
    AudioSource, Fade, FadeShape, Item, ItemId, Layout, SampleAccess, Session, SourceAccessor,
    Take, TakeMedia, Track,
};
pub use selection::{SelectionState, TimelineCursor};
pub use undo::{ActionType, Transaction, UndoAction, UndoManager};
