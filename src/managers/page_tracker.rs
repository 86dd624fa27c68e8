//! Active Page Tracker for Acme.
//!
//! Holds the bookmark of the page on screen and decides, each time the
//! renderer reports a finished navigation, whether that changes the tab list:
//!
//! - the page on screen is a known tab: that tab is updated to the new page;
//! - there are no tabs yet: the page being left becomes the first tab;
//! - otherwise the tab list is left alone.
//!
//! Tabs are therefore created lazily: the first page only turns into a tab
//! once the browser navigates away from it.

use serde::Serialize;
use tracing::{debug, info, warn};
use url::Url;

use crate::managers::session_store::{CollectionStore, SessionStore, SessionStoreTrait};
use crate::services::address_resolver::{fallback_search, resolve_input};
use crate::services::favicon_service::FaviconService;
use crate::services::image_cache::{ImageCache, ImageStore};
use crate::types::bookmark::Bookmark;
use crate::types::errors::RenderError;
use crate::types::search_engine::SearchEngine;

/// The rendering engine, as seen by the tracker.
pub trait Renderer {
    /// Image of the currently rendered page.
    fn capture_snapshot(&self) -> Result<Vec<u8>, RenderError>;
    fn can_go_back(&self) -> bool;
    fn can_go_forward(&self) -> bool;
}

/// Renderer state reported by a UI shell alongside a finished navigation.
#[derive(Debug, Clone, Default)]
pub struct ReportedPage {
    pub snapshot: Option<Vec<u8>>,
    pub can_go_back: bool,
    pub can_go_forward: bool,
}

impl Renderer for ReportedPage {
    fn capture_snapshot(&self) -> Result<Vec<u8>, RenderError> {
        self.snapshot.clone().ok_or(RenderError::NoPage)
    }

    fn can_go_back(&self) -> bool {
        self.can_go_back
    }

    fn can_go_forward(&self) -> bool {
        self.can_go_forward
    }
}

/// Effect of a finished navigation on the tab list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TabTransition {
    /// The tab showing the previous page now holds the new page.
    Updated,
    /// The tab list was empty and the previous page became its first tab.
    Created,
    /// Nothing to write.
    Unchanged,
}

/// Tracks the page currently on screen.
pub struct PageTracker {
    current: Bookmark,
    home: Bookmark,
    last_search: Option<String>,
    can_go_back: bool,
    can_go_forward: bool,
}

impl PageTracker {
    /// Starts on `home`.
    pub fn new(home: Bookmark) -> Self {
        Self {
            current: home.clone(),
            home,
            last_search: None,
            can_go_back: false,
            can_go_forward: false,
        }
    }

    pub fn current(&self) -> &Bookmark {
        &self.current
    }

    pub fn home(&self) -> &Bookmark {
        &self.home
    }

    pub fn last_search(&self) -> Option<&str> {
        self.last_search.as_deref()
    }

    pub fn can_go_back(&self) -> bool {
        self.can_go_back
    }

    pub fn can_go_forward(&self) -> bool {
        self.can_go_forward
    }

    /// Makes `next` the current page and updates the tab list accordingly.
    pub fn transition<C: CollectionStore>(
        &mut self,
        store: &mut SessionStore<C>,
        next: Bookmark,
    ) -> TabTransition {
        let outcome = if store.contains_tab(&self.current) {
            if store.update_tab(&self.current, &next) {
                TabTransition::Updated
            } else {
                TabTransition::Unchanged
            }
        } else if store.tab_count() == 0 {
            store.add_tab(self.current.clone());
            TabTransition::Created
        } else {
            TabTransition::Unchanged
        };

        debug!(from = %self.current.url, to = %next.url, ?outcome, "Page changed");
        self.current = next;
        outcome
    }

    /// Handles a finished navigation: updates the tab list, then caches a
    /// snapshot under the new title and asks for the new page's favicon.
    ///
    /// Capture failures are logged and otherwise ignored.
    pub fn navigation_finished<C: CollectionStore, S: ImageStore>(
        &mut self,
        store: &mut SessionStore<C>,
        cache: &mut ImageCache<S>,
        favicons: &FaviconService,
        renderer: &dyn Renderer,
        url: Url,
        title: &str,
    ) -> TabTransition {
        self.can_go_back = renderer.can_go_back();
        self.can_go_forward = renderer.can_go_forward();

        let next = Bookmark::new(url, title);
        let outcome = self.transition(store, next);

        match renderer.capture_snapshot() {
            Ok(image) => {
                if let Err(e) = cache.save(self.current.snapshot_key(), image) {
                    warn!(title, error = %e, "Failed to cache snapshot");
                }
            }
            Err(e) => warn!(title, error = %e, "Snapshot capture failed"),
        }
        favicons.request(&self.current.url);

        outcome
    }

    /// Handles a failed navigation. Returns the search to load instead, if
    /// the failed load came from a search bar entry.
    pub fn navigation_failed(&mut self, error: &str, engine: SearchEngine) -> Option<Url> {
        warn!(error, "Navigation failed");
        self.last_search
            .as_deref()
            .and_then(|term| fallback_search(term, engine))
    }

    /// Records `input` as the last search and returns the URL to load.
    pub fn submit_search(&mut self, input: &str, engine: SearchEngine) -> Url {
        let url = resolve_input(input, engine, &self.home.url);
        info!(input, url = %url, "Search submitted");
        self.last_search = Some(input.to_string());
        url
    }

    /// Saves the page on screen as a new tab and returns the home page to load.
    pub fn open_new_tab<C: CollectionStore>(&mut self, store: &mut SessionStore<C>) -> Url {
        store.add_tab(self.current.clone());
        self.can_go_back = false;
        self.home.url.clone()
    }

    /// Page to load at launch: the first saved tab, or the current page.
    pub fn startup_url<C: CollectionStore>(&self, store: &SessionStore<C>) -> Url {
        store
            .first_tab()
            .map(|tab| tab.url.clone())
            .unwrap_or_else(|| self.current.url.clone())
    }
}
