//! Session description files
//!
//! A JSON document describing tracks, items, the selection and the cursor.
//! Audio takes point at WAV files, resolved relative to the document.
//!
//! ```json
//! {
//!   "cursor": 5.0,
//!   "selection": { "selected": [1, 2], "hovered": null },
//!   "tracks": [
//!     { "index": 0, "name": "Kick", "items": [
//!       { "id": 1, "position": 0.0, "length": 1.0,
//!         "take": { "kind": "audio", "path": "kick.wav" } }
//!     ] }
//!   ]
//! }
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::engine::import_wav;
use crate::error::{AlignError, Result};
use crate::session::model::{AudioSource, Fade, Item, ItemId, Session, Take, Track};
use crate::session::selection::{SelectionState, TimelineCursor};

/// Take binding as written in a session file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TakeEntry {
    Audio {
        path: PathBuf,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    Midi {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemEntry {
    pub id: ItemId,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    pub position: f64,
    pub length: f64,
    #[serde(default)]
    pub mute: bool,
    #[serde(default)]
    pub fade_in: Fade,
    #[serde(default)]
    pub fade_out: Fade,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub take: Option<TakeEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackEntry {
    /// Explicit index; tracks without one are appended in file order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mute: bool,
    #[serde(default)]
    pub items: Vec<ItemEntry>,
}

/// Parsed session description.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SessionFile {
    #[serde(default)]
    pub cursor: TimelineCursor,
    #[serde(default)]
    pub selection: SelectionState,
    #[serde(default)]
    pub tracks: Vec<TrackEntry>,
}

impl SessionFile {
    /// Read and parse a session file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(AlignError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Write the session file as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Build a [`Session`], decoding every referenced WAV once.
    ///
    /// Audio files that cannot be found or decoded become missing takes, so
    /// their items are skipped by alignment instead of failing the load.
    /// Duplicate item ids are renumbered in the session and in this file
    /// alike, so [`SessionFile::with_layout`] finds each item's own take.
    pub fn to_session(&mut self, base_dir: &Path) -> Result<Session> {
        let mut session = Session::new();
        let mut sources: HashMap<PathBuf, Option<AudioSource>> = HashMap::new();

        for entry in &mut self.tracks {
            let mut track = Track::new(entry.name.clone());
            track.mute = entry.mute;
            let index = match entry.index {
                Some(index) => {
                    session.insert_track(index, track)?;
                    index
                }
                None => session.add_track(track),
            };

            for item_entry in &mut entry.items {
                let mut item = Item::new(item_entry.id, item_entry.position, item_entry.length)
                    .with_name(item_entry.name.clone());
                item.mute = item_entry.mute;
                item.fade_in = item_entry.fade_in;
                item.fade_out = item_entry.fade_out;
                item.take = item_entry
                    .take
                    .as_ref()
                    .map(|t| resolve_take(t, base_dir, &mut sources));

                let assigned = session.add_item(index, item)?;
                if assigned != item_entry.id {
                    log::warn!(
                        "Duplicate item id {} in session file, renumbered to {}",
                        item_entry.id,
                        assigned
                    );
                    item_entry.id = assigned;
                }
            }
        }

        Ok(session)
    }

    /// A copy of this file describing `session`'s current layout.
    ///
    /// Take bindings are carried over by item id.
    pub fn with_layout(&self, session: &Session, selection: &SelectionState) -> Self {
        let takes: HashMap<ItemId, &TakeEntry> = self
            .tracks
            .iter()
            .flat_map(|t| t.items.iter())
            .filter_map(|i| i.take.as_ref().map(|take| (i.id, take)))
            .collect();

        let tracks = session
            .tracks()
            .map(|(index, track)| TrackEntry {
                index: Some(index),
                name: track.name.clone(),
                mute: track.mute,
                items: track
                    .items
                    .iter()
                    .map(|item| ItemEntry {
                        id: item.id,
                        name: item.name.clone(),
                        position: item.position,
                        length: item.length,
                        mute: item.mute,
                        fade_in: item.fade_in,
                        fade_out: item.fade_out,
                        take: takes.get(&item.id).map(|t| (*t).clone()),
                    })
                    .collect(),
            })
            .collect();

        Self {
            cursor: self.cursor,
            selection: selection.clone(),
            tracks,
        }
    }
}

fn resolve_take(
    entry: &TakeEntry,
    base_dir: &Path,
    sources: &mut HashMap<PathBuf, Option<AudioSource>>,
) -> Take {
    match entry {
        TakeEntry::Midi { name } => Take::midi(name.clone().unwrap_or_default()),
        TakeEntry::Audio { path, name } => {
            let full = base_dir.join(path);
            let name = name
                .clone()
                .unwrap_or_else(|| path.display().to_string());
            let source = sources
                .entry(full.clone())
                .or_insert_with(|| match import_wav(&full) {
                    Ok(buffer) => Some(AudioSource::from_file(buffer, full.clone())),
                    Err(e) => {
                        log::warn!("Audio source {} unavailable: {}", full.display(), e);
                        None
                    }
                });
            match source {
                Some(source) => Take::audio(name, source.clone()),
                None => Take::missing(name),
            }
        }
    }
}
