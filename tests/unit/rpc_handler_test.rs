//! Unit tests for the RPC handler: the JSON-RPC methods dispatched by `handle_method`.
//!
//! These tests exercise every RPC method through the same code path used by the
//! real `acme-rpc` binary, with the data directory in a temp dir and favicons
//! answered locally.

use std::sync::{Arc, Mutex};

use serde_json::json;
use tempfile::TempDir;
use url::Url;

use acme::app::App;
use acme::rpc_handler::{base64_decode, base64_encode, handle_method};
use acme::services::favicon_service::FaviconFetcher;
use acme::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use acme::types::errors::FetchError;

struct StubFetcher;

impl FaviconFetcher for StubFetcher {
    fn fetch(&self, _page_url: &Url) -> Result<Vec<u8>, FetchError> {
        Ok(b"ico".to_vec())
    }
}

/// Create a fresh App backed by a temp directory.
fn setup() -> (Mutex<App>, TempDir) {
    let tmp = TempDir::new().expect("Failed to create temp dir");
    let config = tmp.path().join("settings.json").to_string_lossy().to_string();
    let mut engine = SettingsEngine::new(Some(config));
    engine.load().expect("Failed to load settings");
    let app = App::with_fetcher(engine, Some(tmp.path().join("data")), Arc::new(StubFetcher))
        .expect("Failed to init App");
    (Mutex::new(app), tmp)
}

fn finished(app: &Mutex<App>, url: &str, title: &str) -> serde_json::Value {
    handle_method(app, "navigation.finished", &json!({
        "url": url,
        "title": title,
        "snapshot": base64_encode(format!("shot:{}", title).as_bytes()),
        "can_go_back": true,
        "can_go_forward": false,
    }))
    .unwrap()
}

// ─── Ping ───

#[test]
fn test_ping() {
    let (app, _tmp) = setup();
    let res = handle_method(&app, "ping", &json!({})).unwrap();
    assert_eq!(res, json!({"pong": true}));
}

// ─── Unknown method ───

#[test]
fn test_unknown_method_returns_error() {
    let (app, _tmp) = setup();
    let res = handle_method(&app, "nonexistent.method", &json!({}));
    assert!(res.is_err());
    assert!(res.unwrap_err().contains("unknown method"));
}

// ─── State ───

#[test]
fn test_state_current_on_startup() {
    let (app, _tmp) = setup();
    let res = handle_method(&app, "state.current", &json!({})).unwrap();
    assert_eq!(res["url"], "https://www.google.com/");
    assert_eq!(res["title"], "Google");
    assert_eq!(res["can_go_back"], false);
    assert_eq!(res["tab_count"], 0);
    assert_eq!(res["badge"], 1);
}

#[test]
fn test_startup_url() {
    let (app, _tmp) = setup();
    let res = handle_method(&app, "startup.url", &json!({})).unwrap();
    assert_eq!(res["url"], "https://www.google.com/");
}

// ─── Tabs ───

#[test]
fn test_tab_add_and_list() {
    let (app, _tmp) = setup();

    let res = handle_method(&app, "tab.add", &json!({
        "url": "https://example.com/",
        "title": "Example"
    }))
    .unwrap();
    assert_eq!(res["tab_count"], 1);

    let list = handle_method(&app, "tab.list", &json!({})).unwrap();
    assert_eq!(list["count"], 1);
    assert_eq!(list["items"][0]["url"], "https://example.com/");
    assert_eq!(list["items"][0]["title"], "Example");
    assert_eq!(list["items"][0]["index"], 0);
}

#[test]
fn test_tab_add_without_params_uses_current_page() {
    let (app, _tmp) = setup();
    handle_method(&app, "tab.add", &json!({})).unwrap();
    let list = handle_method(&app, "tab.list", &json!({})).unwrap();
    assert_eq!(list["items"][0]["title"], "Google");
}

#[test]
fn test_tab_add_rejects_non_web_url() {
    let (app, _tmp) = setup();
    let res = handle_method(&app, "tab.add", &json!({
        "url": "javascript:alert(1)",
        "title": "x"
    }));
    assert!(res.unwrap_err().contains("invalid url"));
}

#[test]
fn test_tab_delete() {
    let (app, _tmp) = setup();
    handle_method(&app, "tab.add", &json!({"url": "https://a.com/", "title": "A"})).unwrap();
    handle_method(&app, "tab.add", &json!({"url": "https://b.com/", "title": "B"})).unwrap();

    let res = handle_method(&app, "tab.delete", &json!({"index": 0})).unwrap();
    assert_eq!(res["removed"]["title"], "A");
    assert_eq!(res["tab_count"], 1);
}

#[test]
fn test_tab_delete_out_of_range() {
    let (app, _tmp) = setup();
    let err = handle_method(&app, "tab.delete", &json!({"index": 0})).unwrap_err();
    assert!(err.contains("out of range"));

    let err = handle_method(&app, "tab.delete", &json!({})).unwrap_err();
    assert!(err.contains("missing index"));
}

#[test]
fn test_tab_open_new() {
    let (app, _tmp) = setup();
    let res = handle_method(&app, "tab.open_new", &json!({})).unwrap();
    assert_eq!(res["load"], "https://www.google.com/");
    assert_eq!(res["tab_count"], 1);
}

// ─── Bookmarks ───

#[test]
fn test_bookmark_add_list_delete() {
    let (app, _tmp) = setup();

    let res = handle_method(&app, "bookmark.add", &json!({
        "url": "https://example.com/",
        "title": "Example"
    }))
    .unwrap();
    assert_eq!(res["url"], "https://example.com/");

    let list = handle_method(&app, "bookmark.list", &json!({})).unwrap();
    assert_eq!(list["count"], 1);

    let res = handle_method(&app, "bookmark.delete", &json!({"index": 0})).unwrap();
    assert_eq!(res["removed"]["title"], "Example");
    let list = handle_method(&app, "bookmark.list", &json!({})).unwrap();
    assert_eq!(list["count"], 0);
}

#[test]
fn test_bookmark_add_requires_title_with_url() {
    let (app, _tmp) = setup();
    let err = handle_method(&app, "bookmark.add", &json!({"url": "https://a.com/"})).unwrap_err();
    assert!(err.contains("missing title"));
}

// ─── Navigation ───

#[test]
fn test_navigation_finished_reports_transition() {
    let (app, _tmp) = setup();

    let res = finished(&app, "https://a.com/", "A");
    assert_eq!(res["transition"], "created");
    assert_eq!(res["tab_count"], 1);

    let res = finished(&app, "https://b.com/", "B");
    assert_eq!(res["transition"], "unchanged");

    let state = handle_method(&app, "state.current", &json!({})).unwrap();
    assert_eq!(state["url"], "https://b.com/");
    assert_eq!(state["can_go_back"], true);
}

#[test]
fn test_navigation_finished_snapshot_loadable() {
    let (app, _tmp) = setup();
    finished(&app, "https://a.com/", "A");

    let res = handle_method(&app, "image.load", &json!({"key": "A"})).unwrap();
    let data = base64_decode(res["data"].as_str().unwrap()).unwrap();
    assert_eq!(data, b"shot:A");
}

#[test]
fn test_navigation_finished_rejects_bad_snapshot() {
    let (app, _tmp) = setup();
    let err = handle_method(&app, "navigation.finished", &json!({
        "url": "https://a.com/",
        "title": "A",
        "snapshot": "%%%"
    }))
    .unwrap_err();
    assert!(err.contains("base64"));
}

#[test]
fn test_navigation_finished_accepts_non_web_page() {
    let (app, _tmp) = setup();

    let res = finished(&app, "about:blank", "Blank");
    assert_eq!(res["transition"], "created");

    let state = handle_method(&app, "state.current", &json!({})).unwrap();
    assert_eq!(state["url"], "about:blank");
}

#[test]
fn test_navigation_finished_rejects_unparseable_url() {
    let (app, _tmp) = setup();
    let err = handle_method(&app, "navigation.finished", &json!({
        "url": "not a url",
        "title": "X"
    }))
    .unwrap_err();
    assert!(err.starts_with("invalid url"));
}

#[test]
fn test_search_submit_then_failure_falls_back() {
    let (app, _tmp) = setup();

    let res = handle_method(&app, "search.submit", &json!({"input": "github"})).unwrap();
    assert_eq!(res["load"], "https://www.github.com/");

    let res = handle_method(&app, "navigation.failed", &json!({"error": "offline"})).unwrap();
    assert_eq!(res["load"], "https://www.google.com/search?q=github");
}

#[test]
fn test_navigation_failed_without_search_loads_nothing() {
    let (app, _tmp) = setup();
    let res = handle_method(&app, "navigation.failed", &json!({"error": "offline"})).unwrap();
    assert!(res["load"].is_null());
}

// ─── Images ───

#[test]
fn test_image_load_missing_is_null() {
    let (app, _tmp) = setup();
    let res = handle_method(&app, "image.load", &json!({"key": "nothing"})).unwrap();
    assert!(res["data"].is_null());
}

#[test]
fn test_favicon_drain_returns_count() {
    let (app, _tmp) = setup();
    let res = handle_method(&app, "favicon.drain", &json!({})).unwrap();
    assert!(res["applied"].as_u64().is_some());
}

// ─── Settings ───

#[test]
fn test_settings_get_and_set() {
    let (app, _tmp) = setup();

    let res = handle_method(&app, "settings.get", &json!({})).unwrap();
    assert_eq!(res["general"]["search_engine"], 0);

    handle_method(&app, "settings.set", &json!({
        "key": "general.search_engine",
        "value": 1
    }))
    .unwrap();
    let res = handle_method(&app, "settings.get", &json!({})).unwrap();
    assert_eq!(res["general"]["search_engine"], 1);
}

#[test]
fn test_search_engines_lists_raw_values() {
    let (app, _tmp) = setup();
    handle_method(&app, "settings.set", &json!({"key": "general.search_engine", "value": 3}))
        .unwrap();

    let res = handle_method(&app, "search.engines", &json!({})).unwrap();
    assert_eq!(res["engines"].as_array().unwrap().len(), 4);
    assert_eq!(res["engines"][2], json!({"value": 2, "name": "DuckDuckGo"}));
    assert_eq!(res["selected"], 3);
}

#[test]
fn test_settings_set_invalid_key() {
    let (app, _tmp) = setup();
    let res = handle_method(&app, "settings.set", &json!({"key": "nope.nope", "value": 1}));
    assert!(res.is_err());
}
