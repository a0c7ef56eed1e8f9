//! Unit tests for link-line parsing and link-list page export.

use gemmarks::managers::bookmark_manager::{BookmarkManager, BookmarkManagerTrait};
use gemmarks::services::link_list::{bookmark_list_page, parse_link_lines, LinkLine};
use gemmarks::types::bookmark::{BookmarkEdit, BookmarkListType};

fn link(url: &str, label: &str) -> LinkLine {
    LinkLine {
        url: url.to_string(),
        label: label.to_string(),
    }
}

#[test]
fn test_parse_link_lines() {
    let body = "# Heading\n\
                => gemini://a.org/ Alpha capsule\n\
                =>/relative.gmi\n\
                =>   gemini://b.org/page   Beta   \r\n\
                not => a link\n\
                =>\n\
                * => bullet\n";
    assert_eq!(
        parse_link_lines(body),
        vec![
            link("gemini://a.org/", "Alpha capsule"),
            link("/relative.gmi", ""),
            link("gemini://b.org/page", "Beta"),
        ]
    );
}

#[test]
fn test_parse_link_lines_empty_body() {
    assert!(parse_link_lines("").is_empty());
}

fn sample_store() -> BookmarkManager {
    let store = BookmarkManager::new();
    store.add("gemini://top.org/", "Top", "news", None);
    let folder = store.add_folder("Reading", 0);
    let inner = store.add("gemini://inner.org/", "Inner", "news tech", None);
    store.update(inner, &BookmarkEdit { parent_id: Some(folder), ..Default::default() });
    store
}

#[test]
fn test_export_by_folder() {
    let page = bookmark_list_page(&sample_store(), BookmarkListType::ByFolder);
    assert!(page.starts_with("# Bookmarks\n"));
    assert!(page.contains("You have 2 bookmarks."));

    let top = page.find("=> gemini://top.org/ Top").unwrap();
    let heading = page.find("## Reading").unwrap();
    let inner = page.find("=> gemini://inner.org/ Inner").unwrap();
    assert!(top < heading && heading < inner);
    assert!(page.contains("Headings are folders."));
}

#[test]
fn test_export_by_tag_lists_bookmark_under_each_tag() {
    let page = bookmark_list_page(&sample_store(), BookmarkListType::ByTag);
    assert!(page.starts_with("# Bookmark tags\n"));
    let news = page.find("## news").unwrap();
    let tech = page.find("## tech").unwrap();
    assert!(news < tech);
    assert_eq!(page.matches("=> gemini://inner.org/ Inner").count(), 2);
    assert_eq!(page.matches("=> gemini://top.org/ Top").count(), 1);
}

#[test]
fn test_export_by_creation_time_includes_dates() {
    let page = bookmark_list_page(&sample_store(), BookmarkListType::ByCreationTime);
    assert!(page.starts_with("# Bookmarks by creation time\n"));
    let line = page
        .lines()
        .find(|l| l.starts_with("=> gemini://top.org/ "))
        .unwrap();
    assert!(line.ends_with(" - Top"));
    assert!(!page.contains("Reading"));
    assert!(page.contains("Subscribe to this page"));
}

/// An exported page parses back into the same links.
#[test]
fn test_exported_links_parse_back() {
    let page = bookmark_list_page(&sample_store(), BookmarkListType::ByFolder);
    let urls: Vec<String> = parse_link_lines(&page).into_iter().map(|l| l.url).collect();
    assert_eq!(urls, vec!["gemini://top.org/", "gemini://inner.org/"]);
}
