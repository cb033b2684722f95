//! Peak Align - transient alignment for timeline audio items
//!
//! Moves audio items so the sample of peak amplitude inside each item lands
//! on a target timeline instant, then repairs overlaps with neighbouring
//! items by extending crossfades.
//!
//! # Architecture
//!
//! - `engine`: in-memory audio buffers and WAV decoding
//! - `session`: tracks, items, takes, selection and the undo history
//! - `align`: peak scanning, alignment, track stacking, crossfade repair
//!   and the single synchronous pass that ties them together

pub mod align;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod session;

pub use config::AlignConfig;
pub use error::{AlignError, Result};
