//! Audio Engine Module
//!
//! - Audio buffer management
//! - WAV file I/O

pub mod buffer;
pub mod io;

pub use buffer::AudioBuffer;
pub use io::{export_wav, import_wav};
