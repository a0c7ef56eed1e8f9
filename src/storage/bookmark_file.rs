//! Structured bookmark file (`bookmarks.ini`).
//!
//! One `[id]` table per bookmark plus a top-level `recentfolder` key. Loading
//! falls back to the legacy `bookmarks.txt` when the structured file cannot be
//! read. Saving always writes the structured format and leaves out bookmarks
//! tagged `remote`.

use std::fmt::Write as _;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use tracing::{debug, info, warn};

use super::legacy;
use super::toml_events::{self, escape_string, TomlHandler, TomlValue};
use crate::managers::bookmark_manager::{BookmarkManager, BookmarkManagerTrait};
use crate::types::bookmark::{cmp_title_ascending, tag_pattern, Bookmark, REMOTE_TAG};
use crate::types::errors::StorageError;

pub const FILE_NAME: &str = "bookmarks.ini";

/// Which file a load populated the store from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    Structured,
    Legacy,
    /// Neither file could be read; the store is empty.
    Empty,
}

/// Feeds parse events into the store.
struct BookmarkLoader<'a> {
    store: &'a BookmarkManager,
    current: Option<u32>,
}

impl TomlHandler for BookmarkLoader<'_> {
    fn table(&mut self, name: &str, is_start: bool) {
        if !is_start {
            self.current = None;
            return;
        }
        match name.parse::<u32>() {
            Ok(id) if id > 0 => {
                self.store.insert_loaded(Bookmark::new(id));
                self.current = Some(id);
            }
            _ => {
                warn!(table = name, "ignoring bookmark table without a valid id");
                self.current = None;
            }
        }
    }

    fn key_value(&mut self, _table: &str, key: &str, value: &TomlValue) {
        match self.current {
            Some(id) => {
                self.store.modify(id, |bm| apply_field(bm, key, value));
            }
            None => {
                if let ("recentfolder", TomlValue::Int64(folder)) = (key, value) {
                    self.store
                        .set_recent_folder_unchecked(u32::try_from(*folder).unwrap_or(0));
                }
            }
        }
    }
}

/// Sets a bookmark field. Unknown keys and values of the wrong type are ignored.
fn apply_field(bm: &mut Bookmark, key: &str, value: &TomlValue) {
    match (key, value) {
        ("url", TomlValue::String(s)) => bm.url = s.clone(),
        ("title", TomlValue::String(s)) => bm.title = s.clone(),
        ("tags", TomlValue::String(s)) => bm.tags = s.clone(),
        ("icon", TomlValue::Int64(code)) => {
            bm.icon = u32::try_from(*code)
                .ok()
                .filter(|&c| c != 0)
                .and_then(char::from_u32);
        }
        ("created", TomlValue::Int64(secs)) => bm.created_at = *secs,
        ("parent", TomlValue::Int64(parent)) => {
            if let Ok(parent) = u32::try_from(*parent) {
                bm.parent_id = parent;
            }
        }
        ("order", TomlValue::Int64(order)) => {
            if let Ok(order) = i32::try_from(*order) {
                bm.order = order;
            }
        }
        _ => debug!(key, "skipping bookmark field"),
    }
}

/// Replaces the store's contents with the bookmarks saved in `dir`.
///
/// Never fails: syntax errors are logged and whatever was read before them is
/// kept; a structured file that cannot be opened falls back to the legacy file, whose
/// entries are then ordered alphabetically.
pub fn load_bookmarks(store: &BookmarkManager, dir: &Path) -> LoadSource {
    store.clear();
    store.set_recent_folder_unchecked(0);

    let path = dir.join(FILE_NAME);
    match fs::read(&path) {
        Ok(bytes) => {
            // Undecodable bytes become U+FFFD; the rest of the file still loads.
            let src = String::from_utf8_lossy(&bytes);
            let mut loader = BookmarkLoader {
                store,
                current: None,
            };
            if let Err(err) = toml_events::parse(&src, &mut loader) {
                warn!(path = %path.display(), error = %err, "syntax error(s) in bookmark file");
            }
            info!(path = %path.display(), count = store.count(), "loaded bookmarks");
            LoadSource::Structured
        }
        Err(err) => {
            if err.kind() != ErrorKind::NotFound {
                warn!(path = %path.display(), error = %err, "cannot read bookmark file");
            }
            let source = match legacy::load_legacy(store, dir) {
                Ok(count) => {
                    info!(count, "imported legacy bookmarks");
                    LoadSource::Legacy
                }
                Err(err) => {
                    debug!(error = %err, "no legacy bookmarks");
                    LoadSource::Empty
                }
            };
            store.sort(0, cmp_title_ascending);
            source
        }
    }
}

/// Serializes the store in the structured format.
pub fn render_bookmarks(store: &BookmarkManager) -> String {
    let remote = tag_pattern(REMOTE_TAG);
    let (recent_folder, records) = store.snapshot_with_recent();

    let mut out = String::new();
    let _ = write!(out, "recentfolder = {}\n\n", recent_folder);
    for bm in &records {
        if remote.as_ref().is_some_and(|p| p.is_match(&bm.tags)) {
            continue;
        }
        let _ = write!(
            out,
            "[{}]\nurl = \"{}\"\ntitle = \"{}\"\ntags = \"{}\"\nicon = 0x{:x}\ncreated = {}  # {}\n",
            bm.id,
            escape_string(&bm.url),
            escape_string(&bm.title),
            escape_string(&bm.tags),
            bm.icon.map_or(0, u32::from),
            bm.created_at,
            bm.created_date(),
        );
        if bm.parent_id != 0 {
            let _ = writeln!(out, "parent = {}", bm.parent_id);
        }
        if bm.order != 0 {
            let _ = writeln!(out, "order = {}", bm.order);
        }
        out.push('\n');
    }
    out
}

/// Writes the store to `dir/bookmarks.ini`, creating `dir` if needed.
pub fn save_bookmarks(store: &BookmarkManager, dir: &Path) -> Result<(), StorageError> {
    let contents = render_bookmarks(store);
    fs::create_dir_all(dir)?;
    let path = dir.join(FILE_NAME);
    fs::write(&path, contents)?;
    debug!(path = %path.display(), "saved bookmarks");
    Ok(())
}
