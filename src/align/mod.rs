//! Alignment Module
//!
//! Peak-based alignment of audio items:
//! - `scanner`: streaming search for the peak sample of a take
//! - `engine`: moves one item so its peak sits on the target instant
//! - `placement`: lays out multi-item batches, stacking same-track items
//! - `crossfade`: extends fades over overlaps after every move
//! - `targets`: picks the items to work on from hover and selection
//! - `pass`: runs all of the above as one undoable operation

pub mod crossfade;
pub mod engine;
pub mod pass;
pub mod placement;
pub mod scanner;
pub mod targets;

pub use crossfade::{extend_fade, overlap_between, repair_overlaps};
pub use engine::{align_to_instant, AlignedItem, ItemOutcome};
pub use pass::{run_pass, AlignReport, OutcomeSummary};
pub use placement::{resolve, PlacementStrategy, Resolution};
pub use scanner::{find_peak_offset, scan_peak, AmplitudeScan, SamplePoint};
pub use targets::{resolve_targets, TargetMode, Targets};
