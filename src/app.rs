//! App Core for Acme.
//!
//! Owns one instance of every component and exposes the operations a UI
//! shell needs: read-only views of tabs and bookmarks, add/delete, and the
//! renderer callbacks.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};
use url::Url;

use crate::logging;
use crate::managers::page_tracker::{PageTracker, Renderer, TabTransition};
use crate::managers::session_store::{SessionStore, SessionStoreTrait, TabCountListener};
use crate::platform;
use crate::services::favicon_service::{FaviconFetcher, FaviconService, HttpFaviconFetcher};
use crate::services::image_cache::{FsImageStore, ImageCache};
use crate::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use crate::types::bookmark::Bookmark;
use crate::types::errors::{AppError, SessionError};
use crate::types::tab::TabBadge;

/// Central application struct holding all managers and services.
pub struct App {
    pub settings_engine: SettingsEngine,
    pub session_store: SessionStore,
    pub image_cache: ImageCache,
    pub page_tracker: PageTracker,
    pub favicon_service: FaviconService,
    data_dir: PathBuf,
}

impl App {
    /// Loads settings, installs logging and opens the data directory.
    ///
    /// `data_dir` overrides both the configured and the platform directory.
    pub fn new(config_path: Option<String>, data_dir: Option<PathBuf>) -> Result<Self, AppError> {
        let mut settings_engine = SettingsEngine::new(config_path);
        let loaded = settings_engine.load();
        logging::init(&settings_engine.get_settings().logging);
        if let Err(e) = loaded {
            warn!(error = %e, "Failed to load settings, using defaults");
        }

        let fetcher = HttpFaviconFetcher::new(&settings_engine.get_settings().network)
            .map_err(|e| AppError::Runtime(e.to_string()))?;
        Self::with_fetcher(settings_engine, data_dir, Arc::new(fetcher))
    }

    /// Builds the app from an already loaded settings engine.
    pub fn with_fetcher(
        settings_engine: SettingsEngine,
        data_dir: Option<PathBuf>,
        fetcher: Arc<dyn FaviconFetcher>,
    ) -> Result<Self, AppError> {
        let settings = settings_engine.get_settings().clone();
        let data_dir = data_dir
            .unwrap_or_else(|| platform::resolve_data_dir(settings.storage.data_dir.as_deref()));

        let home_url = Url::parse(&settings.general.homepage_url)
            .map_err(|e| AppError::InvalidHomepage(format!("{}: {}", settings.general.homepage_url, e)))?;
        let home = Bookmark::new(home_url, settings.general.homepage_title.clone());

        let session_store = SessionStore::open(&data_dir);
        let image_cache =
            ImageCache::with_store(FsImageStore::new(&data_dir), settings.cache.memory_limit);
        let favicon_service = FaviconService::new(fetcher)?;

        info!(
            data_dir = %data_dir.display(),
            tabs = session_store.tab_count(),
            bookmarks = session_store.bookmarks().len(),
            "Acme core ready"
        );

        Ok(Self {
            settings_engine,
            session_store,
            image_cache,
            page_tracker: PageTracker::new(home),
            favicon_service,
            data_dir,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn current_bookmark(&self) -> &Bookmark {
        self.page_tracker.current()
    }

    pub fn tabs(&self) -> &[Bookmark] {
        self.session_store.tabs()
    }

    pub fn bookmarks(&self) -> &[Bookmark] {
        self.session_store.bookmarks()
    }

    pub fn tab_badge(&self) -> TabBadge {
        TabBadge::for_count(self.session_store.tab_count())
    }

    pub fn on_tab_count_changed(&mut self, listener: TabCountListener) {
        self.session_store.on_tab_count_changed(listener);
    }

    pub fn add_tab(&mut self, tab: Bookmark) {
        self.session_store.add_tab(tab);
    }

    pub fn add_bookmark(&mut self, bookmark: Bookmark) {
        self.session_store.add_bookmark(bookmark);
    }

    /// Bookmarks the page on screen.
    pub fn bookmark_current_page(&mut self) {
        let current = self.page_tracker.current().clone();
        self.session_store.add_bookmark(current);
    }

    pub fn delete_tab(&mut self, index: usize) -> Result<Bookmark, SessionError> {
        let removed = self.session_store.delete_tab(index)?;
        if self.settings_engine.get_settings().cache.evict_images_on_tab_delete {
            self.evict_images_for(&removed);
        }
        Ok(removed)
    }

    pub fn delete_bookmark(&mut self, index: usize) -> Result<Bookmark, SessionError> {
        let removed = self.session_store.delete_bookmark(index)?;
        if self.settings_engine.get_settings().cache.evict_images_on_bookmark_delete {
            self.evict_images_for(&removed);
        }
        Ok(removed)
    }

    /// Drops the cached images of a removed entry unless something still
    /// displays them: a tab, a bookmark, or the page on screen.
    fn evict_images_for(&mut self, removed: &Bookmark) {
        let remaining = self
            .session_store
            .tabs()
            .iter()
            .chain(self.session_store.bookmarks())
            .chain(std::iter::once(self.page_tracker.current()));

        let (mut url_in_use, mut title_in_use) = (false, false);
        for entry in remaining {
            url_in_use |= entry.same_entity(removed);
            title_in_use |= entry.title == removed.title;
        }

        if !title_in_use {
            self.image_cache.delete(removed.snapshot_key());
        }
        if !url_in_use {
            self.image_cache.delete(&removed.favicon_key());
        }
    }

    /// Renderer callback: a navigation finished on `url` titled `title`.
    pub fn navigation_finished(
        &mut self,
        renderer: &dyn Renderer,
        url: Url,
        title: &str,
    ) -> TabTransition {
        self.page_tracker.navigation_finished(
            &mut self.session_store,
            &mut self.image_cache,
            &self.favicon_service,
            renderer,
            url,
            title,
        )
    }

    /// Renderer callback: a navigation failed. Returns a fallback to load, if any.
    pub fn navigation_failed(&mut self, error: &str) -> Option<Url> {
        let engine = self.settings_engine.get_settings().general.search_engine;
        self.page_tracker.navigation_failed(error, engine)
    }

    /// Resolves search bar input to the URL to load.
    pub fn submit_search(&mut self, input: &str) -> Url {
        let engine = self.settings_engine.get_settings().general.search_engine;
        self.page_tracker.submit_search(input, engine)
    }

    /// Saves the page on screen as a tab; returns the home page to load.
    pub fn open_new_tab(&mut self) -> Url {
        self.page_tracker.open_new_tab(&mut self.session_store)
    }

    pub fn startup_url(&self) -> Url {
        self.page_tracker.startup_url(&self.session_store)
    }

    /// Writes finished favicon fetches into the image cache.
    pub fn drain_favicons(&mut self) -> usize {
        self.favicon_service.drain(&mut self.image_cache)
    }

    pub fn load_image(&mut self, key: &str) -> Option<Vec<u8>> {
        self.image_cache.load(key)
    }

    pub fn snapshot_for(&mut self, bookmark: &Bookmark) -> Option<Vec<u8>> {
        self.image_cache.load(bookmark.snapshot_key())
    }

    pub fn favicon_for(&mut self, bookmark: &Bookmark) -> Option<Vec<u8>> {
        self.image_cache.load(&bookmark.favicon_key())
    }
}
