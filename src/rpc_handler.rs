//! RPC method handler for the gemmarks JSON-RPC protocol.
//!
//! Kept apart from `rpc_server.rs` so it can be unit-tested without stdio.
//! `handle_method` dispatches one call to the store, the refresh engine or
//! the settings engine. Mutating calls post `bookmarks.changed`.

use serde_json::{json, Value};

use crate::app::App;
use crate::managers::bookmark_manager::BookmarkManagerTrait;
use crate::services::link_list::bookmark_list_page;
use crate::services::settings_engine::SettingsEngineTrait;
use crate::storage::LoadSource;
use crate::types::bookmark::{
    cmp_sibling_order, cmp_time_descending, cmp_title_ascending, tag_pattern, Bookmark,
    BookmarkCompare, BookmarkEdit, BookmarkListType,
};
use crate::types::event::BookmarkEvent;

fn str_param<'a>(params: &'a Value, name: &str) -> Option<&'a str> {
    params.get(name).and_then(|v| v.as_str())
}

fn id_param(params: &Value, name: &str) -> Result<Option<u32>, String> {
    match params.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| format!("invalid {}", name)),
    }
}

fn required_id(params: &Value, name: &str) -> Result<u32, String> {
    id_param(params, name)?.ok_or_else(|| format!("missing {}", name))
}

/// Icons are given as a one-character string or a code point; null clears.
fn parse_icon(value: &Value) -> Result<Option<char>, String> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(s.chars().next()),
        Value::Number(n) => n
            .as_u64()
            .and_then(|code| u32::try_from(code).ok())
            .map(|code| if code == 0 { None } else { char::from_u32(code) })
            .ok_or_else(|| "invalid icon".to_string()),
        _ => Err("invalid icon".to_string()),
    }
}

fn parse_edit(params: &Value) -> Result<BookmarkEdit, String> {
    Ok(BookmarkEdit {
        url: str_param(params, "url").map(str::to_string),
        title: str_param(params, "title").map(str::to_string),
        tags: str_param(params, "tags").map(str::to_string),
        icon: params.get("icon").map(parse_icon).transpose()?,
        parent_id: id_param(params, "parent_id")?,
    })
}

fn parse_compare(name: Option<&str>) -> Result<Option<BookmarkCompare>, String> {
    match name {
        None | Some("time") => Ok(None),
        Some("title") => Ok(Some(cmp_title_ascending)),
        Some("order") => Ok(Some(cmp_sibling_order)),
        Some(other) => Err(format!("unknown sort: {}", other)),
    }
}

fn to_json(bm: &Bookmark) -> Value {
    json!({
        "id": bm.id,
        "url": bm.url,
        "title": bm.title,
        "tags": bm.tags,
        "icon": bm.icon,
        "created": bm.created_at,
        "parent_id": bm.parent_id,
        "order": bm.order,
        "is_folder": bm.is_folder(),
    })
}

fn changed(app: &App) {
    app.notifier.notify(BookmarkEvent::Changed);
}

/// Dispatch a JSON-RPC method call.
///
/// Returns `Ok(Value)` on success or `Err(String)` with an error message.
pub fn handle_method(app: &mut App, method: &str, params: &Value) -> Result<Value, String> {
    let store = app.bookmarks.clone();
    match method {
        "ping" => Ok(json!({"pong": true})),

        // ─── Bookmarks ───
        "bookmark.add" => {
            let url = str_param(params, "url").ok_or("missing url")?;
            if url.trim().is_empty() {
                return Err("missing url".to_string());
            }
            let title = str_param(params, "title").unwrap_or_default();
            let tags = str_param(params, "tags").unwrap_or_default();
            let icon = params.get("icon").map(parse_icon).transpose()?.flatten();
            let parent_id = id_param(params, "parent_id")?;

            let id = store.add(url, title, tags, icon);
            if let Some(parent_id) = parent_id {
                store.update(id, &BookmarkEdit { parent_id: Some(parent_id), ..Default::default() });
            }
            changed(app);
            Ok(json!({"id": id}))
        }
        "bookmark.add_folder" => {
            let title = str_param(params, "title").ok_or("missing title")?;
            let parent_id = id_param(params, "parent_id")?.unwrap_or(0);
            let id = store.add_folder(title, parent_id);
            changed(app);
            Ok(json!({"id": id}))
        }
        "bookmark.remove" => {
            let id = required_id(params, "id")?;
            let removed = store.remove(id);
            if removed {
                changed(app);
            }
            Ok(json!({"removed": removed}))
        }
        "bookmark.get" => {
            let id = required_id(params, "id")?;
            Ok(store.get(id).as_ref().map(to_json).unwrap_or(Value::Null))
        }
        "bookmark.find" => {
            let url = str_param(params, "url").ok_or("missing url")?;
            Ok(json!({"id": store.find_by_url(url)}))
        }
        "bookmark.update" => {
            let id = required_id(params, "id")?;
            let edit = parse_edit(params)?;
            let updated = store.update(id, &edit);
            if updated {
                changed(app);
            }
            Ok(json!({"updated": updated}))
        }
        "bookmark.update_icon" => {
            let url = str_param(params, "url").ok_or("missing url")?;
            let icon = parse_icon(params.get("icon").unwrap_or(&Value::Null))?;
            let updated = store.update_icon(url, icon);
            if updated {
                changed(app);
            }
            Ok(json!({"updated": updated}))
        }
        "bookmark.reorder" => {
            let id = required_id(params, "id")?;
            let order = params
                .get("order")
                .and_then(|v| v.as_i64())
                .and_then(|n| i32::try_from(n).ok())
                .ok_or("missing order")?;
            store.reorder(id, order);
            changed(app);
            Ok(json!({"ok": true}))
        }
        "bookmark.sort" => {
            let parent_id = id_param(params, "parent_id")?.unwrap_or(0);
            let cmp = parse_compare(str_param(params, "by"))?.unwrap_or(cmp_time_descending);
            store.sort(parent_id, cmp);
            changed(app);
            Ok(json!({"ok": true}))
        }
        "bookmark.list" => {
            let tag = str_param(params, "tag").and_then(tag_pattern);
            let parent_id = id_param(params, "parent_id")?;
            let filter = |bm: &Bookmark| {
                tag.as_ref().map_or(true, |p| p.is_match(&bm.tags))
                    && parent_id.map_or(true, |pid| bm.parent_id == pid)
            };
            let records = match str_param(params, "sort") {
                Some("tree") => store.list_tree(Some(&filter)),
                other => store.list(parse_compare(other)?, Some(&filter)),
            };
            Ok(Value::Array(records.iter().map(to_json).collect()))
        }
        "bookmark.count" => Ok(json!(store.count())),
        "bookmark.recent_folder" => Ok(json!(store.recent_folder())),
        "bookmark.set_recent_folder" => {
            let id = id_param(params, "id")?.unwrap_or(0);
            store.set_recent_folder(id);
            Ok(json!(store.recent_folder()))
        }
        "bookmark.site_icon" => {
            let url = str_param(params, "url").ok_or("missing url")?;
            Ok(json!(store.site_icon(url)))
        }
        "bookmark.export" => {
            let list_type = match params.get("type") {
                None | Some(Value::Null) => BookmarkListType::ByFolder,
                Some(v) => serde_json::from_value(v.clone())
                    .map_err(|_| format!("unknown export type: {}", v))?,
            };
            Ok(json!({"page": bookmark_list_page(&store, list_type)}))
        }
        "bookmark.fetch_remote" => {
            let started = app.remote_sync.fetch_remote();
            Ok(json!({"started": started, "outstanding": app.remote_sync.outstanding()}))
        }
        "bookmark.load" => {
            let source = match app.load() {
                LoadSource::Structured => "structured",
                LoadSource::Legacy => "legacy",
                LoadSource::Empty => "empty",
            };
            Ok(json!({"source": source, "count": store.count()}))
        }
        "bookmark.save" => {
            app.save().map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }

        // ─── Settings ───
        "settings.get" => match str_param(params, "key") {
            Some(key) => app.settings_engine.get_value(key).map_err(|e| e.to_string()),
            None => serde_json::to_value(app.settings_engine.get_settings())
                .map_err(|e| e.to_string()),
        },
        "settings.set" => {
            let key = str_param(params, "key").ok_or("missing key")?;
            let value = params.get("value").cloned().ok_or("missing value")?;
            app.settings_engine
                .set_value(key, value)
                .map_err(|e| e.to_string())?;
            store.set_add_to_bottom(app.settings_engine.get_settings().bookmarks.add_to_bottom);
            Ok(json!({"ok": true}))
        }

        _ => Err(format!("unknown method: {}", method)),
    }
}
