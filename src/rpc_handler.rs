//! RPC method handler for the Acme JSON-RPC protocol.
//!
//! Kept apart from `rpc_server.rs` so it can be unit-tested independently.
//! The `handle_method` function dispatches JSON-RPC method calls to the
//! `App`. The UI shell owns the rendering engine, so renderer output such as
//! snapshots arrives as method parameters.

use std::sync::Mutex;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde_json::{json, Value};
use url::Url;

use crate::app::App;
use crate::managers::page_tracker::ReportedPage;
use crate::services::settings_engine::SettingsEngineTrait;
use crate::types::bookmark::Bookmark;
use crate::types::search_engine::SearchEngine;
use crate::types::tab::TabBadge;

/// Encode bytes to base64 string.
pub fn base64_encode(data: &[u8]) -> String {
    BASE64.encode(data)
}

/// Decode base64 string to bytes.
pub fn base64_decode(input: &str) -> Result<Vec<u8>, String> {
    BASE64
        .decode(input)
        .map_err(|e| format!("base64 decode error: {}", e))
}

fn str_param<'a>(params: &'a Value, name: &str) -> Option<&'a str> {
    params.get(name).and_then(|v| v.as_str())
}

fn index_param(params: &Value) -> Result<usize, String> {
    params
        .get("index")
        .and_then(|v| v.as_u64())
        .map(|i| i as usize)
        .ok_or_else(|| "missing index".to_string())
}

fn any_url(raw: &str) -> Result<Url, String> {
    Url::parse(raw).map_err(|e| format!("invalid url: {}", e))
}

/// Saved tabs and bookmarks must point at a web page.
fn web_url(raw: &str) -> Result<Url, String> {
    let url = any_url(raw)?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err("invalid url: must start with http:// or https://".to_string()),
    }
}

/// `url`/`title` params if given, otherwise the page on screen.
fn bookmark_param(app: &App, params: &Value) -> Result<Bookmark, String> {
    match str_param(params, "url") {
        Some(raw) => {
            let title = str_param(params, "title").ok_or("missing title")?;
            Ok(Bookmark::new(web_url(raw)?, title))
        }
        None => Ok(app.current_bookmark().clone()),
    }
}

fn entry_json(index: usize, b: &Bookmark) -> Value {
    json!({"index": index, "url": b.url.as_str(), "title": b.title})
}

fn list_json(entries: &[Bookmark]) -> Value {
    let items: Vec<Value> = entries
        .iter()
        .enumerate()
        .map(|(i, b)| entry_json(i, b))
        .collect();
    json!({"items": items, "count": entries.len()})
}

fn badge_json(badge: TabBadge) -> Value {
    match badge {
        TabBadge::Count(n) => json!(n),
        TabBadge::Overflow => json!("overflow"),
    }
}

/// Dispatch a JSON-RPC method call to the appropriate handler.
///
/// Returns `Ok(Value)` on success or `Err(String)` with an error message.
pub fn handle_method(app: &Mutex<App>, method: &str, params: &Value) -> Result<Value, String> {
    match method {
        "ping" => Ok(json!({"pong": true})),

        // ─── Page state ───
        "state.current" => {
            let a = app.lock().map_err(|e| e.to_string())?;
            let current = a.current_bookmark();
            Ok(json!({
                "url": current.url.as_str(),
                "title": current.title,
                "can_go_back": a.page_tracker.can_go_back(),
                "can_go_forward": a.page_tracker.can_go_forward(),
                "tab_count": a.tabs().len(),
                "badge": badge_json(a.tab_badge()),
            }))
        }
        "startup.url" => {
            let a = app.lock().map_err(|e| e.to_string())?;
            Ok(json!({"url": a.startup_url().as_str()}))
        }

        // ─── Tabs ───
        "tab.list" => {
            let a = app.lock().map_err(|e| e.to_string())?;
            Ok(list_json(a.tabs()))
        }
        "tab.add" => {
            let mut a = app.lock().map_err(|e| e.to_string())?;
            let tab = bookmark_param(&a, params)?;
            a.add_tab(tab);
            Ok(json!({"tab_count": a.tabs().len()}))
        }
        "tab.delete" => {
            let index = index_param(params)?;
            let mut a = app.lock().map_err(|e| e.to_string())?;
            let removed = a.delete_tab(index).map_err(|e| e.to_string())?;
            Ok(json!({"removed": entry_json(index, &removed), "tab_count": a.tabs().len()}))
        }
        "tab.open_new" => {
            let mut a = app.lock().map_err(|e| e.to_string())?;
            let load = a.open_new_tab();
            Ok(json!({"load": load.as_str(), "tab_count": a.tabs().len()}))
        }

        // ─── Bookmarks ───
        "bookmark.list" => {
            let a = app.lock().map_err(|e| e.to_string())?;
            Ok(list_json(a.bookmarks()))
        }
        "bookmark.add" => {
            let mut a = app.lock().map_err(|e| e.to_string())?;
            let bookmark = bookmark_param(&a, params)?;
            let added = json!({"url": bookmark.url.as_str(), "title": bookmark.title});
            a.add_bookmark(bookmark);
            Ok(added)
        }
        "bookmark.delete" => {
            let index = index_param(params)?;
            let mut a = app.lock().map_err(|e| e.to_string())?;
            let removed = a.delete_bookmark(index).map_err(|e| e.to_string())?;
            Ok(json!({"removed": entry_json(index, &removed)}))
        }

        // ─── Renderer callbacks ───
        "navigation.finished" => {
            // The renderer may settle on pages such as about:blank.
            let url = any_url(str_param(params, "url").ok_or("missing url")?)?;
            let title = str_param(params, "title").ok_or("missing title")?;
            let snapshot = str_param(params, "snapshot").map(base64_decode).transpose()?;
            let page = ReportedPage {
                snapshot,
                can_go_back: params.get("can_go_back").and_then(|v| v.as_bool()).unwrap_or(false),
                can_go_forward: params
                    .get("can_go_forward")
                    .and_then(|v| v.as_bool())
                    .unwrap_or(false),
            };
            let mut a = app.lock().map_err(|e| e.to_string())?;
            let transition = a.navigation_finished(&page, url, title);
            Ok(json!({"transition": transition, "tab_count": a.tabs().len()}))
        }
        "navigation.failed" => {
            let error = str_param(params, "error").unwrap_or("unknown error");
            let mut a = app.lock().map_err(|e| e.to_string())?;
            let load = a.navigation_failed(error);
            Ok(json!({"load": load.map(|u| u.to_string())}))
        }
        "search.submit" => {
            let input = str_param(params, "input").ok_or("missing input")?;
            let mut a = app.lock().map_err(|e| e.to_string())?;
            Ok(json!({"load": a.submit_search(input).as_str()}))
        }

        // ─── Images ───
        "image.load" => {
            let key = str_param(params, "key").ok_or("missing key")?;
            let mut a = app.lock().map_err(|e| e.to_string())?;
            let data = a.load_image(key).map(|bytes| base64_encode(&bytes));
            Ok(json!({"key": key, "data": data}))
        }
        "favicon.drain" => {
            let mut a = app.lock().map_err(|e| e.to_string())?;
            Ok(json!({"applied": a.drain_favicons()}))
        }

        // ─── Settings ───
        "search.engines" => {
            let a = app.lock().map_err(|e| e.to_string())?;
            let selected = a.settings_engine.get_settings().general.search_engine;
            let engines: Vec<Value> = SearchEngine::ALL
                .iter()
                .map(|e| json!({"value": e.raw_value(), "name": e.display_name()}))
                .collect();
            Ok(json!({"engines": engines, "selected": selected.raw_value()}))
        }
        "settings.get" => {
            let a = app.lock().map_err(|e| e.to_string())?;
            serde_json::to_value(a.settings_engine.get_settings()).map_err(|e| e.to_string())
        }
        "settings.set" => {
            let key = str_param(params, "key").ok_or("missing key")?;
            let value = params.get("value").cloned().ok_or("missing value")?;
            let mut a = app.lock().map_err(|e| e.to_string())?;
            a.settings_engine
                .set_value(key, value)
                .map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }

        _ => Err(format!("unknown method: {}", method)),
    }
}
