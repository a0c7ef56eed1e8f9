// Legacy bookmark file (`bookmarks.txt`), read-only.
// Three lines per record: `<hex icon> <seconds> <url>`, title, tags.
// Blank lines between records are skipped.

use std::fs;
use std::path::Path;

use crate::managers::bookmark_manager::BookmarkManager;
use crate::services::url_canon::canonical_url;
use crate::types::bookmark::Bookmark;
use crate::types::errors::StorageError;

pub const LEGACY_FILE_NAME: &str = "bookmarks.txt";

/// Splits off the first whitespace-delimited token.
fn split_token(text: &str) -> (&str, &str) {
    let text = text.trim_start();
    match text.find(char::is_whitespace) {
        Some(end) => (&text[..end], text[end..].trim_start()),
        None => (text, ""),
    }
}

/// Parses legacy records in file order. Ids are left at 0.
pub fn parse_legacy(src: &str) -> Vec<Bookmark> {
    let mut records = Vec::new();
    let mut lines = src.lines();
    while let Some(header) = lines.next() {
        if header.trim().is_empty() {
            continue;
        }
        let (icon, rest) = split_token(header);
        let (when, url) = split_token(rest);

        let mut bm = Bookmark::new(0);
        bm.icon = u32::from_str_radix(icon, 16)
            .ok()
            .filter(|&c| c != 0)
            .and_then(char::from_u32);
        bm.created_at = when.parse::<f64>().map(|secs| secs as i64).unwrap_or(0);
        bm.url = canonical_url(url.trim_end());
        bm.title = lines.next().unwrap_or_default().to_string();
        bm.tags = lines.next().unwrap_or_default().to_string();
        records.push(bm);
    }
    records
}

/// Inserts the legacy records from `dir` with freshly allocated ids.
/// Returns how many were read.
pub fn load_legacy(store: &BookmarkManager, dir: &Path) -> Result<usize, StorageError> {
    let bytes = fs::read(dir.join(LEGACY_FILE_NAME))?;
    let records = parse_legacy(&String::from_utf8_lossy(&bytes));
    let count = records.len();
    for bm in records {
        store.insert_next(bm);
    }
    Ok(count)
}
