//! Image Cache for Acme.
//!
//! Page snapshots and favicons are stored as one file per key in the
//! application data directory and fronted by an in-memory map. The map is
//! flushed entirely once it holds more than `memory_limit` entries; disk is
//! never touched by the flush, so later loads simply read through again.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::types::errors::CacheError;

/// High-water mark of the in-memory map.
pub const DEFAULT_MEMORY_LIMIT: usize = 100;

/// Backing store for cached images, addressed by key.
pub trait ImageStore {
    fn exists(&self, key: &str) -> bool;
    /// Returns `Ok(None)` when nothing is stored under `key`.
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;
    fn write(&mut self, key: &str, bytes: &[u8]) -> Result<(), CacheError>;
    fn remove(&mut self, key: &str) -> Result<(), CacheError>;
}

/// Stores each image as a file named after its key.
#[derive(Debug, Clone)]
pub struct FsImageStore {
    dir: PathBuf,
}

impl FsImageStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Maps a key to its file, rejecting keys that are not a plain file name.
    fn path_for(&self, key: &str) -> Result<PathBuf, CacheError> {
        let invalid = key.is_empty()
            || key == "."
            || key == ".."
            || key.contains(['/', '\\', '\0']);
        if invalid {
            return Err(CacheError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(key))
    }
}

impl ImageStore for FsImageStore {
    fn exists(&self, key: &str) -> bool {
        self.path_for(key).map(|p| p.is_file()).unwrap_or(false)
    }

    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let path = self.path_for(key)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CacheError::Io(format!("{}: {}", path.display(), e))),
        }
    }

    fn write(&mut self, key: &str, bytes: &[u8]) -> Result<(), CacheError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir)
            .map_err(|e| CacheError::Io(format!("{}: {}", self.dir.display(), e)))?;
        fs::write(&path, bytes).map_err(|e| CacheError::Io(format!("{}: {}", path.display(), e)))
    }

    fn remove(&mut self, key: &str) -> Result<(), CacheError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CacheError::Io(format!("{}: {}", path.display(), e))),
        }
    }
}

/// Disk-backed image cache with a bounded read-through memory front.
pub struct ImageCache<S: ImageStore = FsImageStore> {
    store: S,
    memory: HashMap<String, Vec<u8>>,
    memory_limit: usize,
}

impl ImageCache<FsImageStore> {
    /// Cache rooted at `dir` with the default memory limit.
    pub fn open<P: AsRef<Path>>(dir: P) -> Self {
        Self::with_store(FsImageStore::new(dir), DEFAULT_MEMORY_LIMIT)
    }
}

impl<S: ImageStore> ImageCache<S> {
    pub fn with_store(store: S, memory_limit: usize) -> Self {
        Self {
            store,
            memory: HashMap::new(),
            memory_limit,
        }
    }

    /// Stores `image` under `key`, replacing whatever was there.
    pub fn save(&mut self, key: &str, image: Vec<u8>) -> Result<(), CacheError> {
        if self.store.exists(key) {
            match self.store.remove(key) {
                Ok(()) => {
                    self.memory.remove(key);
                }
                Err(e) => warn!(key, error = %e, "Failed to remove previous image"),
            }
        }

        self.store.write(key, &image)?;
        self.remember(key.to_string(), image);
        debug!(key, "Image saved");
        Ok(())
    }

    /// Returns the image under `key`, reading through to disk on a memory miss.
    ///
    /// A miss on disk as well is a normal outcome and yields `None`.
    pub fn load(&mut self, key: &str) -> Option<Vec<u8>> {
        if let Some(image) = self.memory.get(key) {
            return Some(image.clone());
        }

        match self.store.read(key) {
            Ok(Some(image)) => {
                self.remember(key.to_string(), image.clone());
                Some(image)
            }
            Ok(None) => None,
            Err(e) => {
                warn!(key, error = %e, "Failed to read cached image");
                None
            }
        }
    }

    /// Removes `key` from disk and memory. Absent keys are a no-op.
    pub fn delete(&mut self, key: &str) {
        if self.store.exists(key) {
            if let Err(e) = self.store.remove(key) {
                warn!(key, error = %e, "Failed to remove cached image");
            }
        }
        self.memory.remove(key);
    }

    pub fn memory_len(&self) -> usize {
        self.memory.len()
    }

    pub fn is_in_memory(&self, key: &str) -> bool {
        self.memory.contains_key(key)
    }

    pub fn memory_limit(&self) -> usize {
        self.memory_limit
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn remember(&mut self, key: String, image: Vec<u8>) {
        self.memory.insert(key, image);
        if self.memory.len() > self.memory_limit {
            debug!(limit = self.memory_limit, "Image memory cache over limit, flushing");
            self.memory.clear();
        }
    }
}
