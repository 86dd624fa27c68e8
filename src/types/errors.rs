use thiserror::Error;

// === SessionError ===

/// Errors related to the tab and bookmark collections.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Delete was called with an index outside `0..len`.
    #[error("Index {index} out of range for collection of length {len}")]
    IndexOutOfRange { index: usize, len: usize },
    /// A persisted collection could not be read or decoded.
    #[error("Failed to read persisted collection: {0}")]
    PersistenceRead(String),
    /// A collection could not be encoded or written to disk.
    #[error("Failed to write persisted collection: {0}")]
    PersistenceWrite(String),
}

// === CacheError ===

/// Errors related to the image cache's backing store.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The key cannot be used as a file name.
    #[error("Invalid cache key: {0:?}")]
    InvalidKey(String),
    /// A file system operation failed.
    #[error("Image cache I/O error: {0}")]
    Io(String),
}

// === FetchError ===

/// Errors related to fetching favicons over the network.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The favicon service URL could not be built from the page URL.
    #[error("Invalid favicon URL: {0}")]
    InvalidUrl(String),
    /// The request failed in transport.
    #[error("Favicon network error: {0}")]
    Network(String),
    /// The server answered but returned no bytes.
    #[error("Favicon response was empty")]
    EmptyBody,
    /// The fetch worker is gone.
    #[error("Favicon service unavailable")]
    ServiceUnavailable,
}

// === RenderError ===

/// Errors reported by the rendering collaborator.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Capturing a snapshot of the rendered page failed.
    #[error("Snapshot failed: {0}")]
    SnapshotFailed(String),
    /// There is no page loaded to capture.
    #[error("No page is loaded")]
    NoPage,
}

// === SettingsError ===

/// Errors related to settings management.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// An I/O error occurred while reading or writing settings.
    #[error("Settings I/O error: {0}")]
    IoError(String),
    /// Failed to serialize or deserialize settings.
    #[error("Settings serialization error: {0}")]
    SerializationError(String),
    /// The provided settings key is invalid.
    #[error("Invalid settings key: {0}")]
    InvalidKey(String),
    /// The provided settings value is invalid.
    #[error("Invalid settings value: {0}")]
    InvalidValue(String),
}

// === AppError ===

/// Errors raised while assembling the application core.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid homepage URL: {0}")]
    InvalidHomepage(String),
    #[error("Failed to start favicon worker: {0}")]
    Runtime(String),
}
