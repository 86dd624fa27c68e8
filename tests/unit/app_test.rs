//! Unit tests for the App core: wiring, delete policies and tab count events.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use acme::app::App;
use acme::managers::page_tracker::{ReportedPage, TabTransition};
use acme::services::favicon_service::FaviconFetcher;
use acme::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use acme::types::bookmark::Bookmark;
use acme::types::errors::{AppError, FetchError, SessionError};
use acme::types::tab::{TabBadge, MAX_BADGE_COUNT};
use serde_json::json;
use tempfile::TempDir;
use url::Url;

struct StubFetcher;

impl FaviconFetcher for StubFetcher {
    fn fetch(&self, _page_url: &Url) -> Result<Vec<u8>, FetchError> {
        Ok(b"ico".to_vec())
    }
}

fn engine(dir: &TempDir) -> SettingsEngine {
    let path = dir.path().join("settings.json").to_string_lossy().to_string();
    let mut engine = SettingsEngine::new(Some(path));
    engine.load().unwrap();
    engine
}

fn setup_with(dir: &TempDir, overrides: &[(&str, serde_json::Value)]) -> App {
    let mut engine = engine(dir);
    for (key, value) in overrides {
        engine.set_value(key, value.clone()).unwrap();
    }
    App::with_fetcher(engine, Some(dir.path().join("data")), Arc::new(StubFetcher)).unwrap()
}

fn setup(dir: &TempDir) -> App {
    setup_with(dir, &[])
}

fn finish(app: &mut App, url: &str, title: &str) -> TabTransition {
    let page = ReportedPage {
        snapshot: Some(format!("shot:{}", title).into_bytes()),
        can_go_back: true,
        can_go_forward: false,
    };
    app.navigation_finished(&page, Url::parse(url).unwrap(), title)
}

/// Visits `X`, bookmarks it, waits for its favicon, then moves on to `Y`.
fn bookmark_and_leave(app: &mut App) -> Bookmark {
    finish(app, "https://x.com/", "X");
    app.favicon_service
        .drain_within(&mut app.image_cache, 1, Duration::from_secs(5));
    app.bookmark_current_page();
    let x = app.current_bookmark().clone();
    finish(app, "https://y.com/", "Y");
    x
}

// ─── Wiring ───

#[test]
fn test_starts_on_configured_homepage() {
    let dir = TempDir::new().unwrap();
    let app = setup_with(
        &dir,
        &[
            ("general.homepage_url", json!("https://start.example/")),
            ("general.homepage_title", json!("Start")),
        ],
    );
    assert_eq!(app.current_bookmark().url.as_str(), "https://start.example/");
    assert_eq!(app.current_bookmark().title, "Start");
    assert_eq!(app.startup_url().as_str(), "https://start.example/");
    assert_eq!(app.data_dir(), dir.path().join("data"));
}

#[test]
fn test_invalid_homepage_is_an_error() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine(&dir);
    engine
        .set_value("general.homepage_url", json!("not a url"))
        .unwrap();

    let result = App::with_fetcher(engine, Some(dir.path().to_path_buf()), Arc::new(StubFetcher));
    assert!(matches!(result, Err(AppError::InvalidHomepage(_))));
}

#[test]
fn test_new_uses_config_and_data_dir_overrides() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("settings.json").to_string_lossy().to_string();
    let app = App::new(Some(config), Some(dir.path().join("data"))).unwrap();
    assert_eq!(app.data_dir(), dir.path().join("data"));
    assert!(app.tabs().is_empty());
}

#[test]
fn test_new_falls_back_to_defaults_on_malformed_config() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("settings.json");
    std::fs::write(&config, "{ not json").unwrap();

    let app = App::new(
        Some(config.to_string_lossy().to_string()),
        Some(dir.path().join("data")),
    )
    .unwrap();
    assert_eq!(app.current_bookmark().url.as_str(), "https://www.google.com/");
    assert_eq!(
        app.settings_engine.get_settings().general,
        acme::types::settings::AcmeSettings::default().general
    );
}

#[test]
fn test_session_survives_restart() {
    let dir = TempDir::new().unwrap();
    {
        let mut app = setup(&dir);
        finish(&mut app, "https://a.com/", "A");
        app.bookmark_current_page();
    }

    let app = setup(&dir);
    assert_eq!(app.tabs().len(), 1);
    assert_eq!(app.bookmarks()[0].title, "A");
    assert_eq!(app.startup_url().as_str(), "https://www.google.com/");
}

// ─── Delete policies ───

#[test]
fn test_bookmark_delete_keeps_images_by_default() {
    let dir = TempDir::new().unwrap();
    let mut app = setup(&dir);
    let x = bookmark_and_leave(&mut app);

    app.delete_bookmark(0).unwrap();
    assert!(app.snapshot_for(&x).is_some());
    assert!(app.favicon_for(&x).is_some());
}

#[test]
fn test_bookmark_delete_evicts_when_enabled() {
    let dir = TempDir::new().unwrap();
    let mut app = setup_with(&dir, &[("cache.evict_images_on_bookmark_delete", json!(true))]);
    let x = bookmark_and_leave(&mut app);
    assert!(app.snapshot_for(&x).is_some());

    app.delete_bookmark(0).unwrap();
    assert!(app.snapshot_for(&x).is_none());
    assert!(app.favicon_for(&x).is_none());
}

#[test]
fn test_eviction_spares_images_still_in_use() {
    let dir = TempDir::new().unwrap();
    let mut app = setup_with(&dir, &[("cache.evict_images_on_bookmark_delete", json!(true))]);
    let x = bookmark_and_leave(&mut app);
    app.add_tab(x.clone());

    app.delete_bookmark(0).unwrap();
    assert!(app.snapshot_for(&x).is_some());
    assert!(app.favicon_for(&x).is_some());
}

#[test]
fn test_tab_delete_evicts_when_enabled() {
    let dir = TempDir::new().unwrap();
    let mut app = setup_with(&dir, &[("cache.evict_images_on_tab_delete", json!(true))]);
    let x = bookmark_and_leave(&mut app);
    app.delete_bookmark(0).unwrap();
    app.add_tab(x.clone());

    let index = app.tabs().len() - 1;
    app.delete_tab(index).unwrap();
    assert!(app.snapshot_for(&x).is_none());
}

#[test]
fn test_delete_out_of_range_is_reported() {
    let dir = TempDir::new().unwrap();
    let mut app = setup(&dir);
    assert!(matches!(
        app.delete_tab(0),
        Err(SessionError::IndexOutOfRange { index: 0, len: 0 })
    ));
}

// ─── Tab count ───

#[test]
fn test_tab_count_listener_tracks_changes() {
    let dir = TempDir::new().unwrap();
    let mut app = setup(&dir);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    app.on_tab_count_changed(Box::new(move |n: usize| sink.lock().unwrap().push(n)));

    app.add_tab(Bookmark::parse("https://a.com/", "A").unwrap());
    app.open_new_tab();
    app.delete_tab(0).unwrap();

    assert_eq!(*seen.lock().unwrap(), vec![1, 2, 1]);
}

#[test]
fn test_tab_badge_caps_at_overflow() {
    let dir = TempDir::new().unwrap();
    let mut app = setup(&dir);
    assert_eq!(app.tab_badge(), TabBadge::Count(1));

    for i in 0..MAX_BADGE_COUNT {
        app.add_tab(Bookmark::parse(&format!("https://t{}.com/", i), "T").unwrap());
    }
    assert_eq!(app.tab_badge(), TabBadge::Count(MAX_BADGE_COUNT));

    app.add_tab(Bookmark::parse("https://one-more.com/", "T").unwrap());
    assert_eq!(app.tab_badge(), TabBadge::Overflow);
}

// ─── Search ───

#[test]
fn test_search_fallback_uses_configured_engine() {
    let dir = TempDir::new().unwrap();
    let mut app = setup_with(&dir, &[("general.search_engine", json!(2))]);

    app.submit_search("two words");
    let fallback = app.navigation_failed("dns failure").unwrap();
    assert_eq!(fallback.as_str(), "https://duckduckgo.com/?q=two+words");
}
