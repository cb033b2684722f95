//! CLI Module
//!
//! Command-line interface for peak alignment.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Peak Align - line up audio items on their loudest transient
#[derive(Parser, Debug)]
#[command(name = "peak-align")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Alignment config file (JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the peak offset of a WAV file
    #[command(name = "peak")]
    Peak {
        /// Path to the WAV file
        path: PathBuf,
    },

    /// List the tracks and items of a session file
    #[command(name = "inspect")]
    Inspect {
        /// Path to the session file
        session: PathBuf,
    },

    /// Run one alignment pass over a session file
    #[command(name = "align")]
    Align {
        /// Path to the session file
        session: PathBuf,

        /// Target instant in seconds (defaults to the file's cursor)
        #[arg(short, long)]
        target: Option<f64>,

        /// Hovered item id (overrides the file's hover)
        #[arg(long)]
        hover: Option<u32>,

        /// Selected item ids, comma separated (overrides the file's selection)
        #[arg(short, long, value_delimiter = ',')]
        select: Vec<u32>,

        /// Where to write the updated session (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the per-item report as JSON
        #[arg(long)]
        json: bool,
    },
}
