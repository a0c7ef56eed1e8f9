//! Bookmark Manager for gemmarks.
//!
//! Implements `BookmarkManagerTrait` for the in-memory bookmark store. All records
//! live in a single id-keyed table behind one mutex; every public operation
//! locks it only for the duration of the map access. Snapshots are copied out
//! under the lock and sorted or filtered after it is released.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::services::url_canon::{canonical_url, url_root};
use crate::types::bookmark::{
    cmp_time_descending, tag_pattern, Bookmark, BookmarkCompare, BookmarkEdit, REMOTE_TAG,
    USER_ICON_TAG,
};

/// Trait defining bookmark store operations.
pub trait BookmarkManagerTrait {
    fn add(&self, url: &str, title: &str, tags: &str, icon: Option<char>) -> u32;
    fn add_folder(&self, title: &str, parent_id: u32) -> u32;
    fn remove(&self, id: u32) -> bool;
    fn get(&self, id: u32) -> Option<Bookmark>;
    fn update(&self, id: u32, edit: &BookmarkEdit) -> bool;
    fn find_by_url(&self, url: &str) -> Option<u32>;
    fn update_icon(&self, url: &str, icon: Option<char>) -> bool;
    fn reorder(&self, id: u32, new_order: i32);
    fn sort(&self, parent_id: u32, cmp: BookmarkCompare);
    fn list(
        &self,
        cmp: Option<BookmarkCompare>,
        filter: Option<&dyn Fn(&Bookmark) -> bool>,
    ) -> Vec<Bookmark>;
    /// Lists in folder-tree order: siblings by `order`, contents after their folder.
    fn list_tree(&self, filter: Option<&dyn Fn(&Bookmark) -> bool>) -> Vec<Bookmark>;
    fn site_icon(&self, url: &str) -> Option<char>;
    fn recent_folder(&self) -> u32;
    fn set_recent_folder(&self, folder_id: u32);
    fn count(&self) -> usize;
    fn clear(&self);
    fn remove_tagged(&self, tag: &str) -> usize;
    fn import_link(
        &self,
        url: &str,
        title: &str,
        tags: &str,
        icon: Option<char>,
        parent_id: u32,
    ) -> Option<u32>;
}

/// Store state guarded by the manager's mutex.
///
/// Methods here assume the lock is already held and never lock again.
struct BookmarkTable {
    bookmarks: BTreeMap<u32, Bookmark>,
    id_enum: u32,
    recent_folder_id: u32,
    add_to_bottom: bool,
}

impl BookmarkTable {
    fn insert_with_id(&mut self, mut bookmark: Bookmark, id: u32) {
        bookmark.id = id;
        self.id_enum = self.id_enum.max(id);
        self.bookmarks.insert(id, bookmark);
    }

    fn insert_next(&mut self, bookmark: Bookmark) -> u32 {
        // Past u32::MAX the lowest free id is reused instead.
        let id = match self.id_enum.checked_add(1) {
            Some(id) => id,
            None => (1..u32::MAX)
                .find(|id| !self.bookmarks.contains_key(id))
                .unwrap_or(u32::MAX),
        };
        self.insert_with_id(bookmark, id);
        id
    }

    /// Half-open range spanning every `order` value in the table, clamped
    /// at the ends of `i32`.
    fn order_range(&self) -> (i32, i32) {
        let mut range: Option<(i32, i32)> = None;
        for bm in self.bookmarks.values() {
            let after = bm.order.saturating_add(1);
            range = Some(match range {
                None => (bm.order, after),
                Some((start, end)) => (start.min(bm.order), end.max(after)),
            });
        }
        range.unwrap_or((0, 0))
    }

    fn next_order(&self) -> i32 {
        let (start, end) = self.order_range();
        if self.add_to_bottom {
            end
        } else {
            start.saturating_sub(1)
        }
    }

    fn find_url(&self, canonical: &str) -> Option<u32> {
        if canonical.is_empty() {
            return None;
        }
        self.bookmarks
            .values()
            .find(|bm| bm.url == canonical)
            .map(|bm| bm.id)
    }

    /// Removes a record and every record directly inside it.
    fn remove_with_children(&mut self, id: u32) -> bool {
        if self.bookmarks.remove(&id).is_none() {
            return false;
        }
        self.bookmarks.retain(|_, bm| !bm.has_parent(id));
        if self.recent_folder_id == id {
            self.recent_folder_id = 0;
        }
        true
    }
}

/// In-memory bookmark store shared between the UI context and the sync engine.
pub struct BookmarkManager {
    table: Mutex<BookmarkTable>,
}

impl BookmarkManager {
    /// Creates an empty store that appends new bookmarks to the end of lists.
    pub fn new() -> Self {
        Self {
            table: Mutex::new(BookmarkTable {
                bookmarks: BTreeMap::new(),
                id_enum: 0,
                recent_folder_id: 0,
                add_to_bottom: true,
            }),
        }
    }

    /// Returns the current UNIX timestamp in seconds.
    fn now() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64
    }

    fn lock(&self) -> MutexGuard<'_, BookmarkTable> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn snapshot(&self) -> Vec<Bookmark> {
        self.lock().bookmarks.values().cloned().collect()
    }

    /// The recent folder id and every record in id order, read under one lock.
    pub(crate) fn snapshot_with_recent(&self) -> (u32, Vec<Bookmark>) {
        let table = self.lock();
        (
            table.recent_folder_id,
            table.bookmarks.values().cloned().collect(),
        )
    }

    /// Chooses between appending (`true`) and prepending new bookmarks.
    pub fn set_add_to_bottom(&self, add_to_bottom: bool) {
        self.lock().add_to_bottom = add_to_bottom;
    }

    /// Number of ancestors of `id` that exist in the store.
    pub fn depth(&self, id: u32) -> usize {
        let snapshot = self.snapshot();
        let by_id: HashMap<u32, &Bookmark> = snapshot.iter().map(|bm| (bm.id, bm)).collect();
        ancestors(id, &by_id).len()
    }

    /// Inserts a record under its own id, advancing the id counter past it.
    pub(crate) fn insert_loaded(&self, bookmark: Bookmark) {
        let id = bookmark.id;
        self.lock().insert_with_id(bookmark, id);
    }

    /// Inserts a record under a freshly allocated id.
    pub(crate) fn insert_next(&self, bookmark: Bookmark) -> u32 {
        self.lock().insert_next(bookmark)
    }

    /// Applies `f` to the record with `id`, returning false if there is none.
    pub(crate) fn modify(&self, id: u32, f: impl FnOnce(&mut Bookmark)) -> bool {
        match self.lock().bookmarks.get_mut(&id) {
            Some(bm) => {
                f(bm);
                true
            }
            None => false,
        }
    }

    /// Sets the recent folder without checking that it exists yet.
    pub(crate) fn set_recent_folder_unchecked(&self, folder_id: u32) {
        self.lock().recent_folder_id = folder_id;
    }
}

impl Default for BookmarkManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Ancestor ids of `id`, nearest first. Stops at a missing parent or a cycle.
fn ancestors(id: u32, by_id: &HashMap<u32, &Bookmark>) -> Vec<u32> {
    let mut chain = Vec::new();
    let mut seen = HashSet::from([id]);
    let mut parent = by_id.get(&id).map(|bm| bm.parent_id).unwrap_or(0);
    while parent != 0 && seen.insert(parent) {
        match by_id.get(&parent) {
            Some(bm) => {
                chain.push(parent);
                parent = bm.parent_id;
            }
            None => break,
        }
    }
    chain
}

/// Sorts records so that each folder's contents follow it and siblings are
/// ordered by `order`, then title.
fn sort_tree(records: &mut [Bookmark], all: &[Bookmark]) {
    let by_id: HashMap<u32, &Bookmark> = all.iter().map(|bm| (bm.id, bm)).collect();
    let key_of = |bm: &Bookmark| -> Vec<(i32, String, u32)> {
        let mut path: Vec<(i32, String, u32)> = ancestors(bm.id, &by_id)
            .into_iter()
            .rev()
            .filter_map(|id| by_id.get(&id))
            .map(|p| (p.order, p.title.to_lowercase(), p.id))
            .collect();
        path.push((bm.order, bm.title.to_lowercase(), bm.id));
        path
    };
    records.sort_by_cached_key(|bm| key_of(bm));
}

impl BookmarkManagerTrait for BookmarkManager {
    /// Adds a bookmark and returns its id. The URL is canonicalized and never rejected.
    fn add(&self, url: &str, title: &str, tags: &str, icon: Option<char>) -> u32 {
        let mut bm = Bookmark::new(0);
        bm.url = canonical_url(url);
        bm.title = title.to_string();
        bm.tags = tags.to_string();
        bm.icon = icon;
        bm.created_at = Self::now();

        let mut table = self.lock();
        bm.order = table.next_order();
        table.insert_next(bm)
    }

    /// Adds an empty folder under `parent_id` (0 for top level).
    fn add_folder(&self, title: &str, parent_id: u32) -> u32 {
        let mut bm = Bookmark::new(0);
        bm.title = title.to_string();
        bm.parent_id = parent_id;
        bm.created_at = Self::now();

        let mut table = self.lock();
        bm.order = table.next_order();
        table.insert_next(bm)
    }

    /// Removes a bookmark and the bookmarks directly inside it.
    ///
    /// Only one level is removed: grandchildren keep their (now dangling) parent.
    fn remove(&self, id: u32) -> bool {
        self.lock().remove_with_children(id)
    }

    fn get(&self, id: u32) -> Option<Bookmark> {
        self.lock().bookmarks.get(&id).cloned()
    }

    /// Applies the set fields of `edit`. URL edits are canonicalized.
    fn update(&self, id: u32, edit: &BookmarkEdit) -> bool {
        let url = edit.url.as_deref().map(canonical_url);
        self.modify(id, |bm| {
            if let Some(url) = url {
                bm.url = url;
            }
            if let Some(title) = &edit.title {
                bm.title = title.clone();
            }
            if let Some(tags) = &edit.tags {
                bm.tags = tags.clone();
            }
            if let Some(icon) = edit.icon {
                bm.icon = icon;
            }
            if let Some(parent_id) = edit.parent_id {
                bm.parent_id = parent_id;
            }
        })
    }

    /// Linear search for a bookmark whose URL equals the canonical form of `url`.
    fn find_by_url(&self, url: &str) -> Option<u32> {
        let canonical = canonical_url(url);
        self.lock().find_url(&canonical)
    }

    /// Updates the icon of the bookmark at `url` unless it is remote or user-set.
    fn update_icon(&self, url: &str, icon: Option<char>) -> bool {
        let canonical = canonical_url(url);
        let mut table = self.lock();
        let Some(id) = table.find_url(&canonical) else {
            return false;
        };
        let Some(bm) = table.bookmarks.get_mut(&id) else {
            return false;
        };
        if bm.has_tag(REMOTE_TAG) || bm.has_tag(USER_ICON_TAG) || bm.icon == icon {
            return false;
        }
        bm.icon = icon;
        true
    }

    /// Gives `id` the order `new_order`, shifting every other record at or
    /// above that order up by one.
    fn reorder(&self, id: u32, new_order: i32) {
        let mut table = self.lock();
        for bm in table.bookmarks.values_mut() {
            if bm.id == id {
                bm.order = new_order;
            } else if bm.order >= new_order {
                bm.order = bm.order.saturating_add(1);
            }
        }
    }

    /// Renumbers the direct children of `parent_id` to 1..N in `cmp` order.
    fn sort(&self, parent_id: u32, cmp: BookmarkCompare) {
        let children = self.list(Some(cmp), Some(&|bm: &Bookmark| bm.parent_id == parent_id));
        let mut table = self.lock();
        for (index, child) in children.iter().enumerate() {
            if let Some(bm) = table.bookmarks.get_mut(&child.id) {
                bm.order = i32::try_from(index + 1).unwrap_or(i32::MAX);
            }
        }
    }

    /// Returns a snapshot of matching bookmarks, newest first unless `cmp` is given.
    fn list(
        &self,
        cmp: Option<BookmarkCompare>,
        filter: Option<&dyn Fn(&Bookmark) -> bool>,
    ) -> Vec<Bookmark> {
        let mut records = self.snapshot();
        if let Some(filter) = filter {
            records.retain(|bm| filter(bm));
        }
        records.sort_by(cmp.unwrap_or(cmp_time_descending));
        records
    }

    fn list_tree(&self, filter: Option<&dyn Fn(&Bookmark) -> bool>) -> Vec<Bookmark> {
        let all = self.snapshot();
        let mut records: Vec<Bookmark> = match filter {
            Some(filter) => all.iter().filter(|bm| filter(bm)).cloned().collect(),
            None => all.clone(),
        };
        sort_tree(&mut records, &all);
        records
    }

    /// Icon of the shortest-URL `usericon` bookmark on the same site as `url`.
    fn site_icon(&self, url: &str) -> Option<char> {
        let root = url_root(url);
        if root.is_empty() {
            return None;
        }
        let pattern = tag_pattern(USER_ICON_TAG)?;
        let table = self.lock();
        let mut best: Option<(usize, char)> = None;
        for bm in table.bookmarks.values() {
            let Some(icon) = bm.icon else { continue };
            if !pattern.is_match(&bm.tags) || !url_root(&bm.url).eq_ignore_ascii_case(root) {
                continue;
            }
            if best.map_or(true, |(len, _)| bm.url.len() < len) {
                best = Some((bm.url.len(), icon));
            }
        }
        best.map(|(_, icon)| icon)
    }

    fn recent_folder(&self) -> u32 {
        self.lock().recent_folder_id
    }

    /// Remembers `folder_id` if it is an existing folder, otherwise resets to 0.
    fn set_recent_folder(&self, folder_id: u32) {
        let mut table = self.lock();
        let is_folder = table
            .bookmarks
            .get(&folder_id)
            .is_some_and(Bookmark::is_folder);
        table.recent_folder_id = if is_folder { folder_id } else { 0 };
    }

    /// Number of bookmarks that are not folders.
    fn count(&self) -> usize {
        self.lock()
            .bookmarks
            .values()
            .filter(|bm| !bm.is_folder())
            .count()
    }

    /// Removes every record and resets the id counter.
    fn clear(&self) {
        let mut table = self.lock();
        table.bookmarks.clear();
        table.id_enum = 0;
    }

    /// Removes every bookmark carrying `tag`. Returns how many were removed.
    fn remove_tagged(&self, tag: &str) -> usize {
        let Some(pattern) = tag_pattern(tag) else {
            return 0;
        };
        let mut table = self.lock();
        let before = table.bookmarks.len();
        table.bookmarks.retain(|_, bm| !pattern.is_match(&bm.tags));
        before - table.bookmarks.len()
    }

    /// Adds a bookmark under `parent_id` unless one with the same canonical
    /// URL already exists. The lookup and insert happen under one lock.
    fn import_link(
        &self,
        url: &str,
        title: &str,
        tags: &str,
        icon: Option<char>,
        parent_id: u32,
    ) -> Option<u32> {
        let mut bm = Bookmark::new(0);
        bm.url = canonical_url(url);
        bm.title = title.to_string();
        bm.tags = tags.to_string();
        bm.icon = icon;
        bm.parent_id = parent_id;
        bm.created_at = Self::now();

        let mut table = self.lock();
        if table.find_url(&bm.url).is_some() {
            return None;
        }
        bm.order = table.next_order();
        Some(table.insert_next(bm))
    }
}
