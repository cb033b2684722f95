//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::align::{run_pass, scan_peak, AlignReport, PlacementStrategy};
use crate::config::AlignConfig;
use crate::engine::import_wav;
use crate::error::Result;
use crate::session::{
    AudioSource, ItemId, SelectionState, SessionFile, TakeMedia, TimelineCursor, UndoManager,
};

/// Options for the `align` command.
#[derive(Debug, Clone, Default)]
pub struct AlignOptions {
    pub target: Option<f64>,
    pub hover: Option<u32>,
    pub select: Vec<u32>,
    pub output: Option<PathBuf>,
    pub json: bool,
}

/// Print the peak offset of a WAV file.
pub fn peak(path: &Path, config: &AlignConfig) -> Result<f64> {
    info!("Scanning {}", path.display());

    let buffer = import_wav(path)?;
    let duration = buffer.duration_secs();
    let source = AudioSource::from_file(buffer, path.to_path_buf());
    let mut accessor = source.accessor()?;
    let offset = scan_peak(&mut accessor, config.block_size);

    println!("{}: peak at {:.6}s (duration {:.3}s)", path.display(), offset, duration);
    Ok(offset)
}

/// List tracks and items of a session file.
pub fn inspect(path: &Path) -> Result<()> {
    let mut file = SessionFile::load(path)?;
    let session = file.to_session(&base_dir(path))?;

    println!("Cursor: {:.3}s", file.cursor.seconds());
    println!("{:-<60}", "");
    for (index, track) in session.tracks() {
        let mute = if track.mute { " [muted]" } else { "" };
        println!("Track {}: {}{}", index, track.name, mute);
        for item in &track.items {
            let media = match item.take.as_ref().map(|t| &t.media) {
                Some(TakeMedia::Audio(source)) => format!(
                    "audio {} Hz, {:.3}s",
                    source.sample_rate(),
                    source.duration_secs()
                ),
                Some(TakeMedia::Midi) => "midi".to_string(),
                Some(TakeMedia::Missing) => "offline".to_string(),
                None => "no take".to_string(),
            };
            let marker = if file.selection.is_selected(item.id) {
                "*"
            } else {
                " "
            };
            println!(
                "  {}{} {:>9.3}s +{:.3}s  {}",
                marker, item.id, item.position, item.length, media
            );
        }
    }
    println!("{:-<60}", "");
    println!("Selected: {}", file.selection.len());

    Ok(())
}

/// Run one alignment pass and write the updated session.
pub fn align(path: &Path, options: &AlignOptions, config: &AlignConfig) -> Result<AlignReport> {
    info!("Aligning session: {}", path.display());

    let mut file = SessionFile::load(path)?;
    let mut session = file.to_session(&base_dir(path))?;

    let mut selection = override_selection(&file.selection, options);
    let cursor = options.target.map(TimelineCursor).unwrap_or(file.cursor);

    let mut undo = UndoManager::new(config.max_undo_levels);
    let report = match run_pass(&mut session, &mut selection, cursor, &mut undo, config) {
        Ok(report) => report,
        Err(e) => {
            warn!("{}", e);
            if let Some(hint) = e.recovery_suggestion() {
                println!("{}", hint);
            }
            return Err(e);
        }
    };

    print_report(&report, options.json)?;

    let updated = file.with_layout(&session, &selection);
    match &options.output {
        Some(output) => {
            updated.save(output)?;
            println!("Session written: {}", output.display());
        }
        None if !options.json => println!("{}", updated.to_json()?),
        None => {}
    }

    Ok(report)
}

/// The file's selection with `--select` and `--hover` applied on top.
/// Each flag replaces only its own part.
fn override_selection(file: &SelectionState, options: &AlignOptions) -> SelectionState {
    let mut selection = file.clone();
    if !options.select.is_empty() {
        selection.selected = options.select.iter().map(|&id| ItemId(id)).collect();
    }
    if let Some(hovered) = options.hover {
        selection.hovered = Some(ItemId(hovered));
    }
    selection
}

fn print_report(report: &AlignReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&report.summaries())?);
        return Ok(());
    }

    let strategy = match &report.strategy {
        PlacementStrategy::InPlace => "in place".to_string(),
        PlacementStrategy::Independent => "independent".to_string(),
        PlacementStrategy::Stacked {
            origin,
            created_tracks,
        } => format!(
            "stacked below track {} ({} new track(s))",
            origin,
            created_tracks.len()
        ),
    };
    println!("Target: {:.6}s, {}", report.target_time, strategy);

    for summary in report.summaries() {
        match (summary.track, summary.position, summary.peak_offset) {
            (Some(track), Some(position), Some(peak)) => println!(
                "  {} aligned: track {}, start {:.6}s, peak +{:.6}s",
                summary.item, track, position, peak
            ),
            _ => println!(
                "  {} {}: {}",
                summary.item,
                summary.status,
                summary.error.unwrap_or_default()
            ),
        }
    }

    if report.is_noop() {
        println!("Nothing was aligned.");
    }
    Ok(())
}

fn base_dir(path: &Path) -> PathBuf {
    path.parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_select_flag_keeps_file_hover() {
        let file = SelectionState::new(vec![ItemId(1)], Some(ItemId(7)));
        let options = AlignOptions {
            select: vec![2, 3],
            ..AlignOptions::default()
        };
        let selection = override_selection(&file, &options);
        assert_eq!(selection.selected, vec![ItemId(2), ItemId(3)]);
        assert_eq!(selection.hovered, Some(ItemId(7)));
    }

    #[test]
    fn test_hover_flag_keeps_file_selection() {
        let file = SelectionState::new(vec![ItemId(1), ItemId(2)], None);
        let options = AlignOptions {
            hover: Some(5),
            ..AlignOptions::default()
        };
        let selection = override_selection(&file, &options);
        assert_eq!(selection.selected, vec![ItemId(1), ItemId(2)]);
        assert_eq!(selection.hovered, Some(ItemId(5)));
    }

    #[test]
    fn test_no_flags_use_file_selection() {
        let file = SelectionState::new(vec![ItemId(4)], Some(ItemId(4)));
        assert_eq!(override_selection(&file, &AlignOptions::default()), file);
    }
}
