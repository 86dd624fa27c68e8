//! Session Store for Acme.
//!
//! Owns the two ordered collections the browser persists (saved bookmarks
//! and open tabs) and rewrites the affected collection's file after every
//! mutation. Load and write failures never escape: they are logged, a failed
//! load leaves the collection empty, and a failed write leaves the in-memory
//! collection authoritative until the next successful write.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, error, warn};

use crate::types::bookmark::Bookmark;
use crate::types::errors::SessionError;

/// Which persisted collection an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    Bookmarks,
    Tabs,
}

impl CollectionKind {
    pub fn file_name(self) -> &'static str {
        match self {
            CollectionKind::Bookmarks => "bookmarks.json",
            CollectionKind::Tabs => "tabs.json",
        }
    }
}

/// Persistence backend for the bookmark and tab collections.
pub trait CollectionStore {
    /// Returns an empty collection when nothing has been persisted yet.
    fn load(&self, kind: CollectionKind) -> Result<Vec<Bookmark>, SessionError>;
    fn save(&mut self, kind: CollectionKind, items: &[Bookmark]) -> Result<(), SessionError>;
}

/// Stores each collection as an ordered JSON array of `{url, urlTitle}` records.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn path_for(&self, kind: CollectionKind) -> PathBuf {
        self.dir.join(kind.file_name())
    }
}

impl CollectionStore for JsonFileStore {
    fn load(&self, kind: CollectionKind) -> Result<Vec<Bookmark>, SessionError> {
        let path = self.path_for(kind);
        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(SessionError::PersistenceRead(format!(
                    "{}: {}",
                    path.display(),
                    e
                )))
            }
        };

        serde_json::from_slice(&data)
            .map_err(|e| SessionError::PersistenceRead(format!("{}: {}", path.display(), e)))
    }

    /// Writes to a sibling temp file first so a failed write never truncates
    /// the previous contents.
    fn save(&mut self, kind: CollectionKind, items: &[Bookmark]) -> Result<(), SessionError> {
        let path = self.path_for(kind);
        let json = serde_json::to_vec_pretty(items)
            .map_err(|e| SessionError::PersistenceWrite(e.to_string()))?;

        fs::create_dir_all(&self.dir).map_err(|e| {
            SessionError::PersistenceWrite(format!("{}: {}", self.dir.display(), e))
        })?;

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .and_then(|_| fs::rename(&tmp, &path))
            .map_err(|e| SessionError::PersistenceWrite(format!("{}: {}", path.display(), e)))
    }
}

/// Listener invoked with the new tab count.
pub type TabCountListener = Box<dyn FnMut(usize) + Send>;

/// Trait defining the bookmark and tab collection operations.
pub trait SessionStoreTrait {
    fn add_bookmark(&mut self, bookmark: Bookmark);
    fn add_tab(&mut self, tab: Bookmark);
    fn delete_bookmark(&mut self, index: usize) -> Result<Bookmark, SessionError>;
    fn delete_tab(&mut self, index: usize) -> Result<Bookmark, SessionError>;
    fn update_tab(&mut self, old: &Bookmark, new: &Bookmark) -> bool;
    fn bookmarks(&self) -> &[Bookmark];
    fn tabs(&self) -> &[Bookmark];
    fn tab_count(&self) -> usize;
    fn contains_tab(&self, tab: &Bookmark) -> bool;
    fn first_tab(&self) -> Option<&Bookmark>;
    fn on_tab_count_changed(&mut self, listener: TabCountListener);
}

/// In-memory bookmark and tab collections mirrored to a [`CollectionStore`].
pub struct SessionStore<C: CollectionStore = JsonFileStore> {
    store: C,
    bookmarks: Vec<Bookmark>,
    tabs: Vec<Bookmark>,
    load_errors: Vec<SessionError>,
    tab_listeners: Vec<TabCountListener>,
}

impl SessionStore<JsonFileStore> {
    /// Opens the collections persisted under `dir`.
    pub fn open<P: AsRef<Path>>(dir: P) -> Self {
        Self::new(JsonFileStore::new(dir))
    }
}

impl<C: CollectionStore> SessionStore<C> {
    /// Creates the store and loads both collections from `store`.
    pub fn new(store: C) -> Self {
        let mut session = Self {
            store,
            bookmarks: Vec::new(),
            tabs: Vec::new(),
            load_errors: Vec::new(),
            tab_listeners: Vec::new(),
        };
        session.bookmarks = session.load_collection(CollectionKind::Bookmarks);
        session.tabs = session.load_collection(CollectionKind::Tabs);
        session
    }

    /// Non-fatal errors hit while loading; the affected collections started empty.
    pub fn last_load_errors(&self) -> &[SessionError] {
        &self.load_errors
    }

    pub fn store(&self) -> &C {
        &self.store
    }

    fn load_collection(&mut self, kind: CollectionKind) -> Vec<Bookmark> {
        match self.store.load(kind) {
            Ok(items) => {
                debug!(collection = ?kind, count = items.len(), "Collection loaded");
                items
            }
            Err(e) => {
                warn!(collection = ?kind, error = %e, "Failed to load collection, starting empty");
                self.load_errors.push(e);
                Vec::new()
            }
        }
    }

    fn persist(&mut self, kind: CollectionKind) {
        let items = match kind {
            CollectionKind::Bookmarks => &self.bookmarks,
            CollectionKind::Tabs => &self.tabs,
        };
        if let Err(e) = self.store.save(kind, items) {
            error!(collection = ?kind, error = %e, "Failed to persist collection");
        }
    }

    fn notify_tab_count(&mut self) {
        let count = self.tabs.len();
        for listener in self.tab_listeners.iter_mut() {
            listener(count);
        }
    }

    fn check_index(index: usize, len: usize) -> Result<(), SessionError> {
        if index < len {
            Ok(())
        } else {
            Err(SessionError::IndexOutOfRange { index, len })
        }
    }
}

impl<C: CollectionStore> SessionStoreTrait for SessionStore<C> {
    fn add_bookmark(&mut self, bookmark: Bookmark) {
        self.bookmarks.push(bookmark);
        self.persist(CollectionKind::Bookmarks);
    }

    fn add_tab(&mut self, tab: Bookmark) {
        self.tabs.push(tab);
        self.persist(CollectionKind::Tabs);
        self.notify_tab_count();
    }

    /// Removes and returns the bookmark at `index`.
    fn delete_bookmark(&mut self, index: usize) -> Result<Bookmark, SessionError> {
        Self::check_index(index, self.bookmarks.len())?;
        let removed = self.bookmarks.remove(index);
        self.persist(CollectionKind::Bookmarks);
        Ok(removed)
    }

    /// Removes and returns the tab at `index`.
    fn delete_tab(&mut self, index: usize) -> Result<Bookmark, SessionError> {
        Self::check_index(index, self.tabs.len())?;
        let removed = self.tabs.remove(index);
        self.persist(CollectionKind::Tabs);
        self.notify_tab_count();
        Ok(removed)
    }

    /// Replaces the first tab with `old`'s URL by `new`.
    ///
    /// Returns false without writing when no tab matches or the stored tab is
    /// already identical to `new` (same URL and title). Any other tab already
    /// holding `new`'s URL is dropped so the list keeps one entry per URL.
    fn update_tab(&mut self, old: &Bookmark, new: &Bookmark) -> bool {
        let Some(index) = self.tabs.iter().position(|t| t.same_entity(old)) else {
            return false;
        };
        if self.tabs[index].identical(new) {
            return false;
        }
        self.tabs[index] = new.clone();

        let before = self.tabs.len();
        let mut position = 0;
        self.tabs.retain(|t| {
            let keep = position == index || !t.same_entity(new);
            position += 1;
            keep
        });
        let dropped = before - self.tabs.len();
        if dropped > 0 {
            warn!(url = %new.url, dropped, "Dropped duplicate tab after update");
        }

        self.persist(CollectionKind::Tabs);
        if dropped > 0 {
            self.notify_tab_count();
        }
        true
    }

    fn bookmarks(&self) -> &[Bookmark] {
        &self.bookmarks
    }

    fn tabs(&self) -> &[Bookmark] {
        &self.tabs
    }

    fn tab_count(&self) -> usize {
        self.tabs.len()
    }

    fn contains_tab(&self, tab: &Bookmark) -> bool {
        self.tabs.iter().any(|t| t.same_entity(tab))
    }

    /// The tab the browser reopens at launch.
    fn first_tab(&self) -> Option<&Bookmark> {
        self.tabs.first()
    }

    fn on_tab_count_changed(&mut self, listener: TabCountListener) {
        self.tab_listeners.push(listener);
    }
}
