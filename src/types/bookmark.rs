use std::cmp::Ordering;

use chrono::{Local, TimeZone};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Entry was imported from a remote source. Never saved; replaced on every refresh.
pub const REMOTE_TAG: &str = "remote";
/// Entry's URL is a link list whose links are imported as `remote` children.
pub const REMOTE_SOURCE_TAG: &str = "remotesource";
/// Icon was chosen by the user and must not be updated automatically.
pub const USER_ICON_TAG: &str = "usericon";

/// Icon given to bookmarks imported from a remote source.
pub const IMPORTED_ICON: char = '\u{2913}';

/// Represents a saved bookmark or a bookmark folder.
///
/// A folder is a bookmark with an empty URL; other bookmarks refer to it
/// through `parent_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: u32,
    pub url: String,
    pub title: String,
    /// Space-separated tag words.
    pub tags: String,
    pub icon: Option<char>,
    /// Creation time in UNIX seconds.
    pub created_at: i64,
    /// Containing folder, or 0 for top level.
    pub parent_id: u32,
    pub order: i32,
}

impl Bookmark {
    /// Creates an empty bookmark record with the given id.
    pub fn new(id: u32) -> Self {
        Self {
            id,
            url: String::new(),
            title: String::new(),
            tags: String::new(),
            icon: None,
            created_at: 0,
            parent_id: 0,
            order: 0,
        }
    }

    pub fn is_folder(&self) -> bool {
        self.url.is_empty()
    }

    /// Returns true if `parent_id` is this bookmark's direct parent.
    pub fn has_parent(&self, parent_id: u32) -> bool {
        parent_id != 0 && self.parent_id == parent_id
    }

    /// Whole-word, case-sensitive tag test.
    pub fn has_tag(&self, tag: &str) -> bool {
        tag_pattern(tag).is_some_and(|pattern| pattern.is_match(&self.tags))
    }

    /// Appends a tag, separated by a single space when tags already exist.
    pub fn add_tag(&mut self, tag: &str) {
        if !self.tags.is_empty() {
            self.tags.push(' ');
        }
        self.tags.push_str(tag);
    }

    /// Removes the first literal occurrence of `tag` and trims the result.
    ///
    /// This is a substring removal: removing `"mote"` from `"remote"` leaves `"re"`.
    pub fn remove_tag(&mut self, tag: &str) {
        if tag.is_empty() {
            return;
        }
        if let Some(pos) = self.tags.find(tag) {
            self.tags.replace_range(pos..pos + tag.len(), "");
            self.tags = self.tags.trim().to_string();
        }
    }

    /// Creation date as `YYYY-MM-DD` in local time.
    pub fn created_date(&self) -> String {
        Local
            .timestamp_opt(self.created_at, 0)
            .single()
            .map(|t| t.format("%Y-%m-%d").to_string())
            .unwrap_or_default()
    }

    /// Iterates the individual tag words.
    pub fn tag_words(&self) -> impl Iterator<Item = &str> {
        self.tags.split(' ').filter(|t| !t.is_empty())
    }
}

/// Whole-word matcher for a tag, for testing many bookmarks against one tag.
pub fn tag_pattern(tag: &str) -> Option<Regex> {
    if tag.is_empty() {
        return None;
    }
    Regex::new(&format!(r"\b{}\b", regex::escape(tag))).ok()
}

/// Comparison function used for listing and sorting bookmarks.
pub type BookmarkCompare = fn(&Bookmark, &Bookmark) -> Ordering;

/// Newest first. Equal timestamps fall back to the newer id first.
pub fn cmp_time_descending(a: &Bookmark, b: &Bookmark) -> Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| b.id.cmp(&a.id))
}

/// Case-insensitive alphabetical order by title.
pub fn cmp_title_ascending(a: &Bookmark, b: &Bookmark) -> Ordering {
    a.title.to_lowercase().cmp(&b.title.to_lowercase())
}

/// Display order among siblings: `order`, then title.
pub fn cmp_sibling_order(a: &Bookmark, b: &Bookmark) -> Ordering {
    a.order
        .cmp(&b.order)
        .then_with(|| cmp_title_ascending(a, b))
}

/// Partial update applied by the store's `update` operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookmarkEdit {
    pub url: Option<String>,
    pub title: Option<String>,
    pub tags: Option<String>,
    /// `Some(None)` clears the icon.
    pub icon: Option<Option<char>>,
    pub parent_id: Option<u32>,
}

/// Grouping used when exporting the store as a link-list page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookmarkListType {
    ByFolder,
    ByTag,
    ByCreationTime,
}
