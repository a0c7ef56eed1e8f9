//! Unit tests for the RPC handler, covering the JSON-RPC methods dispatched by `handle_method`.
//!
//! These exercise the same code path as the `gemmarks-rpc` binary, against a
//! temporary profile directory and an in-memory fetcher.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedReceiver;

use gemmarks::app::App;
use gemmarks::managers::bookmark_manager::BookmarkManagerTrait;
use gemmarks::rpc_handler::handle_method;
use gemmarks::services::link_fetcher::{FetchResponse, LinkFetcher, ResponseStatus};
use gemmarks::services::settings_engine::SettingsEngine;
use gemmarks::types::errors::FetchError;
use gemmarks::types::event::{BookmarkEvent, Notifier};

/// Every URL serves the same one-link page.
struct OneLinkFetcher;

#[async_trait]
impl LinkFetcher for OneLinkFetcher {
    async fn fetch(&self, _url: &str) -> Result<FetchResponse, FetchError> {
        Ok(FetchResponse {
            status: ResponseStatus::Gemini(20),
            meta: "text/gemini".to_string(),
            body: b"=> gemini://linked.org/ Linked\n".to_vec(),
        })
    }
}

/// Create a fresh App backed by a temp profile directory.
fn setup() -> (App, UnboundedReceiver<BookmarkEvent>, TempDir) {
    let tmp = TempDir::new().expect("Failed to create temp dir");
    let settings_path = tmp.path().join("settings.json").to_string_lossy().to_string();
    let (notifier, events) = Notifier::channel();
    let app = App::new(
        tmp.path().join("profile"),
        SettingsEngine::new(Some(settings_path)),
        Arc::new(OneLinkFetcher),
        notifier,
        Handle::current(),
    );
    (app, events, tmp)
}

fn call(app: &mut App, method: &str, params: Value) -> Value {
    handle_method(app, method, &params).unwrap()
}

// ─── Protocol ───

#[tokio::test]
async fn test_ping() {
    let (mut app, _events, _tmp) = setup();
    assert_eq!(call(&mut app, "ping", json!({})), json!({"pong": true}));
}

#[tokio::test]
async fn test_unknown_method_returns_error() {
    let (mut app, _events, _tmp) = setup();
    let res = handle_method(&mut app, "nonexistent.method", &json!({}));
    assert!(res.unwrap_err().contains("unknown method"));
}

// ─── Bookmarks ───

#[tokio::test]
async fn test_bookmark_add_get_and_list() {
    let (mut app, mut events, _tmp) = setup();

    let res = call(&mut app, "bookmark.add", json!({
        "url": "gemini://Example.org",
        "title": "Example",
        "tags": "news",
        "icon": "★"
    }));
    let id = res["id"].as_u64().unwrap();
    assert_eq!(events.try_recv().ok(), Some(BookmarkEvent::Changed));

    let bm = call(&mut app, "bookmark.get", json!({"id": id}));
    assert_eq!(bm["url"], "gemini://example.org/");
    assert_eq!(bm["icon"], "★");
    assert_eq!(bm["is_folder"], false);

    let list = call(&mut app, "bookmark.list", json!({"tag": "news"}));
    assert_eq!(list.as_array().unwrap().len(), 1);
    let none = call(&mut app, "bookmark.list", json!({"tag": "other"}));
    assert!(none.as_array().unwrap().is_empty());

    assert_eq!(call(&mut app, "bookmark.count", json!({})), json!(1));
    assert_eq!(call(&mut app, "bookmark.get", json!({"id": 999})), Value::Null);
}

#[tokio::test]
async fn test_bookmark_add_requires_url() {
    let (mut app, _events, _tmp) = setup();
    assert!(handle_method(&mut app, "bookmark.add", &json!({"title": "x"})).is_err());
    assert!(handle_method(&mut app, "bookmark.add", &json!({"url": "  "})).is_err());
}

#[tokio::test]
async fn test_folder_and_cascade_remove() {
    let (mut app, _events, _tmp) = setup();
    let folder = call(&mut app, "bookmark.add_folder", json!({"title": "Folder"}))["id"].clone();
    let child = call(&mut app, "bookmark.add", json!({
        "url": "gemini://child.org/",
        "parent_id": folder
    }))["id"].clone();

    assert_eq!(call(&mut app, "bookmark.get", json!({"id": child}))["parent_id"], folder);
    assert_eq!(call(&mut app, "bookmark.remove", json!({"id": folder})), json!({"removed": true}));
    assert_eq!(call(&mut app, "bookmark.get", json!({"id": child})), Value::Null);
}

#[tokio::test]
async fn test_find_update_and_update_icon() {
    let (mut app, _events, _tmp) = setup();
    let id = call(&mut app, "bookmark.add", json!({"url": "gemini://a.org/"}))["id"].clone();

    assert_eq!(call(&mut app, "bookmark.find", json!({"url": "gemini://A.org:1965"}))["id"], id);
    assert_eq!(call(&mut app, "bookmark.find", json!({"url": "gemini://b.org/"}))["id"], Value::Null);

    let res = call(&mut app, "bookmark.update", json!({"id": id, "title": "Renamed", "icon": 9733}));
    assert_eq!(res, json!({"updated": true}));
    let bm = call(&mut app, "bookmark.get", json!({"id": id}));
    assert_eq!(bm["title"], "Renamed");
    assert_eq!(bm["icon"], "★");

    let res = call(&mut app, "bookmark.update_icon", json!({"url": "gemini://a.org/", "icon": "☆"}));
    assert_eq!(res, json!({"updated": true}));
}

#[tokio::test]
async fn test_reorder_and_sort() {
    let (mut app, _events, _tmp) = setup();
    for (url, title) in [("gemini://c.org/", "C"), ("gemini://a.org/", "A"), ("gemini://b.org/", "B")] {
        call(&mut app, "bookmark.add", json!({"url": url, "title": title}));
    }
    call(&mut app, "bookmark.sort", json!({"by": "title"}));
    let list = call(&mut app, "bookmark.list", json!({"sort": "order"}));
    let titles: Vec<&str> = list.as_array().unwrap().iter().map(|b| b["title"].as_str().unwrap()).collect();
    assert_eq!(titles, vec!["A", "B", "C"]);

    assert!(handle_method(&mut app, "bookmark.sort", &json!({"by": "color"})).is_err());
    assert!(handle_method(&mut app, "bookmark.reorder", &json!({"id": 1})).is_err());
}

#[tokio::test]
async fn test_recent_folder() {
    let (mut app, _events, _tmp) = setup();
    let folder = call(&mut app, "bookmark.add_folder", json!({"title": "F"}))["id"].clone();
    assert_eq!(call(&mut app, "bookmark.set_recent_folder", json!({"id": folder})), folder);
    assert_eq!(call(&mut app, "bookmark.recent_folder", json!({})), folder);
    assert_eq!(call(&mut app, "bookmark.set_recent_folder", json!({"id": 77})), json!(0));
}

#[tokio::test]
async fn test_site_icon() {
    let (mut app, _events, _tmp) = setup();
    call(&mut app, "bookmark.add", json!({"url": "gemini://site.org/", "tags": "usericon", "icon": "♜"}));
    assert_eq!(call(&mut app, "bookmark.site_icon", json!({"url": "gemini://site.org/x"})), json!("♜"));
    assert_eq!(call(&mut app, "bookmark.site_icon", json!({"url": "gemini://none.org/"})), Value::Null);
}

#[tokio::test]
async fn test_export_types() {
    let (mut app, _events, _tmp) = setup();
    call(&mut app, "bookmark.add", json!({"url": "gemini://a.org/", "title": "A", "tags": "t"}));

    let page = call(&mut app, "bookmark.export", json!({}))["page"].as_str().unwrap().to_string();
    assert!(page.starts_with("# Bookmarks\n"));
    let page = call(&mut app, "bookmark.export", json!({"type": "by_tag"}))["page"].as_str().unwrap().to_string();
    assert!(page.contains("## t\n"));
    assert!(handle_method(&mut app, "bookmark.export", &json!({"type": "by_color"})).is_err());
}

#[tokio::test]
async fn test_save_and_load_roundtrip() {
    let (mut app, _events, _tmp) = setup();
    call(&mut app, "bookmark.add", json!({"url": "gemini://keep.org/", "title": "Keep"}));
    call(&mut app, "bookmark.add", json!({"url": "gemini://drop.org/", "title": "Drop", "tags": "remote"}));
    assert_eq!(call(&mut app, "bookmark.save", json!({})), json!({"ok": true}));

    let res = call(&mut app, "bookmark.load", json!({}));
    assert_eq!(res, json!({"source": "structured", "count": 1}));
    assert!(app.bookmarks.find_by_url("gemini://drop.org/").is_none());
}

#[tokio::test]
async fn test_fetch_remote_round() {
    let (mut app, _events, _tmp) = setup();
    call(&mut app, "bookmark.add", json!({"url": "gemini://list.org/", "tags": "remotesource"}));

    let res = call(&mut app, "bookmark.fetch_remote", json!({}));
    assert_eq!(res, json!({"started": true, "outstanding": 1}));
    let again = call(&mut app, "bookmark.fetch_remote", json!({}));
    assert_eq!(again["started"], false);

    app.remote_sync.run_until_idle().await;
    assert!(app.bookmarks.find_by_url("gemini://linked.org/").is_some());
}

// ─── Settings ───

#[tokio::test]
async fn test_settings_get_and_set() {
    let (mut app, _events, _tmp) = setup();
    let all = call(&mut app, "settings.get", json!({}));
    assert_eq!(all["bookmarks"]["add_to_bottom"], true);

    call(&mut app, "settings.set", json!({"key": "bookmarks.add_to_bottom", "value": false}));
    assert_eq!(call(&mut app, "settings.get", json!({"key": "bookmarks.add_to_bottom"})), json!(false));

    // New bookmarks now go to the top.
    let first = call(&mut app, "bookmark.add", json!({"url": "gemini://1.org/"}))["id"].clone();
    let second = call(&mut app, "bookmark.add", json!({"url": "gemini://2.org/"}))["id"].clone();
    let order = |app: &mut App, id: &Value| call(app, "bookmark.get", json!({"id": id}))["order"].as_i64().unwrap();
    assert!(order(&mut app, &second) < order(&mut app, &first));

    assert!(handle_method(&mut app, "settings.set", &json!({"key": "nope", "value": 1})).is_err());
}
