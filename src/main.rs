//! Acme — session core of a minimal mobile web browser.
//!
//! The UI shell drives the core through the `acme-rpc` binary. This entry
//! point runs a console demo of each component against a scratch directory.

use std::sync::Arc;
use std::time::Duration;

use acme::app::App;
use acme::managers::page_tracker::ReportedPage;
use acme::services::favicon_service::FaviconFetcher;
use acme::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use acme::types::bookmark::Bookmark;
use acme::types::errors::FetchError;
use url::Url;

/// Answers every favicon request locally so the demo runs offline.
struct OfflineFetcher;

impl FaviconFetcher for OfflineFetcher {
    fn fetch(&self, page_url: &Url) -> Result<Vec<u8>, FetchError> {
        Ok(format!("icon:{}", page_url.host_str().unwrap_or("?")).into_bytes())
    }
}

fn main() {
    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                  Acme v{} — Demo Mode                     ║", env!("CARGO_PKG_VERSION"));
    println!("║        Tabs, bookmarks and a disk-backed image cache         ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    let scratch = std::env::temp_dir().join(format!("acme-demo-{}", std::process::id()));
    let config = scratch.join("settings.json").to_string_lossy().to_string();

    demo_settings(&config);
    demo_bookmark_identity();
    demo_address_resolver();

    let mut settings = SettingsEngine::new(Some(config));
    settings.load().expect("Failed to load demo settings");
    let mut app = App::with_fetcher(settings, Some(scratch.join("data")), Arc::new(OfflineFetcher))
        .expect("Failed to initialize Acme");

    demo_navigation(&mut app);
    demo_tabs_and_bookmarks(&mut app);
    demo_image_cache(&mut app);

    let _ = std::fs::remove_dir_all(&scratch);

    println!();
    println!("═══════════════════════════════════════════════════════════════");
    println!("  ✅ All components demonstrated successfully!");
    println!("═══════════════════════════════════════════════════════════════");
}

fn section(name: &str) {
    println!("───────────────────────────────────────────────────────────────");
    println!("  📦 {}", name);
    println!("───────────────────────────────────────────────────────────────");
}

fn demo_settings(config: &str) {
    section("Settings Engine");

    let mut engine = SettingsEngine::new(Some(config.to_string()));
    let settings = engine.load().expect("Failed to load settings");
    println!("  Homepage: {} ({})", settings.general.homepage_url, settings.general.homepage_title);
    println!("  Search engine: {}", settings.general.search_engine.display_name());
    println!("  Memory cache limit: {}", settings.cache.memory_limit);

    engine
        .set_value("general.search_engine", serde_json::json!(2))
        .expect("Failed to set search engine");
    println!(
        "  Switched search engine to {}",
        engine.get_settings().general.search_engine.display_name()
    );
    println!("  ✓ Settings persisted to {}", engine.get_config_path());
    println!();
}

fn demo_bookmark_identity() {
    section("Bookmark Identity");

    let loading = Bookmark::parse("https://example.com/", "Loading…").expect("valid url");
    let loaded = Bookmark::parse("https://example.com/", "Example Domain").expect("valid url");
    println!("  Same page, different titles equal: {}", loading == loaded);
    println!("  Identical: {}", loading.identical(&loaded));
    println!("  Snapshot key: {:?}", loaded.snapshot_key());
    println!("  Favicon key:  {:?}", loaded.favicon_key());
    println!("  ✓ Identity is the URL");
    println!();
}

fn demo_address_resolver() {
    use acme::services::address_resolver::resolve_input;
    use acme::types::search_engine::SearchEngine;
    section("Address Resolver");

    let home = Url::parse("https://www.google.com").expect("valid url");
    for input in ["https://www.rust-lang.org/", "github", "rust borrow checker"] {
        let url = resolve_input(input, SearchEngine::Bing, &home);
        println!("  {:<28} → {}", format!("{:?}", input), url);
    }
    println!("  ✓ Address resolution OK");
    println!();
}

fn demo_navigation(app: &mut App) {
    section("Page Tracker");

    println!("  Startup URL: {}", app.startup_url());
    let pages = [
        ("https://www.rust-lang.org/", "Rust"),
        ("https://doc.rust-lang.org/book/", "The Book"),
        ("https://doc.rust-lang.org/book/", "The Rust Programming Language"),
    ];
    for (url, title) in pages {
        let page = ReportedPage {
            snapshot: Some(format!("snapshot of {}", title).into_bytes()),
            can_go_back: true,
            can_go_forward: false,
        };
        let url = Url::parse(url).expect("valid url");
        let transition = app.navigation_finished(&page, url, title);
        println!("  Loaded {:<32} → {:?}, {} tab(s)", title, transition, app.tabs().len());
    }

    let applied = app
        .favicon_service
        .drain_within(&mut app.image_cache, pages.len(), Duration::from_secs(2));
    println!("  Favicons cached: {}", applied);

    let search = app.submit_search("rust ownership");
    println!("  Search bar → {}", search);
    if let Some(fallback) = app.navigation_failed("host not found") {
        println!("  Navigation failed, falling back to {}", fallback);
    }
    println!("  ✓ Navigation OK");
    println!();
}

fn demo_tabs_and_bookmarks(app: &mut App) {
    section("Session Store");

    app.on_tab_count_changed(Box::new(|count: usize| println!("  [event] tab count is now {}", count)));
    let home = app.open_new_tab();
    println!("  Opened new tab, loading {}", home);
    println!("  Tab badge: {:?}", app.tab_badge());

    app.bookmark_current_page();
    for (i, b) in app.bookmarks().iter().enumerate() {
        println!("  Bookmark {}: {} ({})", i, b.title, b.url);
    }

    let removed = app.delete_tab(0).expect("Failed to delete tab");
    println!("  Closed tab {:?}", removed.title);
    match app.delete_tab(99) {
        Err(e) => println!("  Closing tab 99: {}", e),
        Ok(_) => println!("  Closing tab 99 unexpectedly succeeded"),
    }
    println!("  ✓ Tabs persisted under {}", app.data_dir().display());
    println!();
}

fn demo_image_cache(app: &mut App) {
    section("Image Cache");

    let current = app.current_bookmark().clone();
    let snapshot = app.snapshot_for(&current).map(|b| b.len()).unwrap_or(0);
    let favicon = app.favicon_for(&current).map(|b| b.len()).unwrap_or(0);
    println!("  {}: snapshot {} bytes, favicon {} bytes", current.title, snapshot, favicon);
    println!(
        "  In memory: {} of {} before flush",
        app.image_cache.memory_len(),
        app.image_cache.memory_limit()
    );
    println!("  ✓ Image cache OK");
    println!();
}
