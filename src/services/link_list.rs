// gemmarks link-list documents
// Extracts `=> url label` link lines from fetched pages and renders the store
// back into a link-list page grouped by folder, tag, or creation time.

use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::sync::OnceLock;

use regex::Regex;

use crate::managers::bookmark_manager::{BookmarkManager, BookmarkManagerTrait};
use crate::types::bookmark::{
    cmp_time_descending, cmp_title_ascending, Bookmark, BookmarkListType,
};

/// One link line of a link-list document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkLine {
    /// Link target as written, possibly relative.
    pub url: String,
    /// Label text, empty when the line has none.
    pub label: String,
}

fn link_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^=>\s*(\S+)(\s+(.*))?").ok())
        .as_ref()
}

/// Extracts every link line from `body`, in document order.
pub fn parse_link_lines(body: &str) -> Vec<LinkLine> {
    let Some(pattern) = link_pattern() else {
        return Vec::new();
    };
    body.lines()
        .filter_map(|line| {
            let captures = pattern.captures(line.trim_end())?;
            Some(LinkLine {
                url: captures.get(1)?.as_str().to_string(),
                label: captures
                    .get(3)
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_default(),
            })
        })
        .collect()
}

fn push_link(out: &mut String, bm: &Bookmark) {
    let _ = writeln!(out, "=> {} {}", bm.url, bm.title);
}

/// Renders the whole store as a link-list page.
pub fn bookmark_list_page(store: &BookmarkManager, list_type: BookmarkListType) -> String {
    let mut out = String::new();
    let heading = match list_type {
        BookmarkListType::ByFolder => "Bookmarks",
        BookmarkListType::ByTag => "Bookmark tags",
        BookmarkListType::ByCreationTime => "Bookmarks by creation time",
    };
    let _ = write!(out, "# {}\n\n", heading);

    match list_type {
        BookmarkListType::ByFolder => {
            let count = store.count();
            let _ = write!(
                out,
                "You have {} bookmark{}.\n\nSave this page to keep a copy of your bookmarks or to import them elsewhere.\n\n",
                count,
                if count == 1 { "" } else { "s" }
            );
        }
        BookmarkListType::ByTag => {
            out.push_str("Each bookmark is listed under every one of its tags.\n\n");
        }
        BookmarkListType::ByCreationTime => {}
    }

    let records = match list_type {
        BookmarkListType::ByFolder => store.list_tree(None),
        BookmarkListType::ByTag => store.list(Some(cmp_title_ascending), None),
        BookmarkListType::ByCreationTime => store.list(Some(cmp_time_descending), None),
    };

    if list_type == BookmarkListType::ByFolder {
        for bm in records.iter().filter(|bm| !bm.is_folder() && bm.parent_id == 0) {
            push_link(&mut out, bm);
        }
    }

    let mut tags = BTreeSet::new();
    for bm in &records {
        if bm.is_folder() {
            if list_type == BookmarkListType::ByFolder {
                let marker = if store.depth(bm.id) == 0 { "##" } else { "###" };
                let _ = write!(out, "\n{} {}\n", marker, bm.title);
            }
            continue;
        }
        match list_type {
            BookmarkListType::ByFolder if bm.parent_id != 0 => push_link(&mut out, bm),
            BookmarkListType::ByCreationTime => {
                let _ = writeln!(out, "=> {} {} - {}", bm.url, bm.created_date(), bm.title);
            }
            _ => {}
        }
        tags.extend(bm.tag_words());
    }

    if list_type == BookmarkListType::ByTag {
        for tag in &tags {
            let _ = write!(out, "\n## {}\n", tag);
            for bm in records
                .iter()
                .filter(|bm| !bm.is_folder() && bm.tag_words().any(|t| t == *tag))
            {
                push_link(&mut out, bm);
            }
        }
    }

    match list_type {
        BookmarkListType::ByCreationTime => {
            out.push_str("\nSubscribe to this page to follow newly added bookmarks.\n");
        }
        BookmarkListType::ByFolder => {
            out.push_str("\nLink lines are bookmarks. Headings are folders. Other lines are ignored.\n");
        }
        BookmarkListType::ByTag => {
            out.push_str("\nLink lines are bookmarks. Headings are tags. Other lines are ignored.\n");
        }
    }
    out
}
