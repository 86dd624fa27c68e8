use serde::{Deserialize, Serialize};

use super::search_engine::SearchEngine;

/// Top-level settings container, persisted as `settings.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AcmeSettings {
    #[serde(default)]
    pub general: GeneralSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub network: NetworkSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Home page and search preferences.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneralSettings {
    pub homepage_url: String,
    pub homepage_title: String,
    pub search_engine: SearchEngine,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            homepage_url: "https://www.google.com".to_string(),
            homepage_title: "Google".to_string(),
            search_engine: SearchEngine::Google,
        }
    }
}

/// Where tabs, bookmarks and cached images live.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct StorageSettings {
    /// Overrides the platform data directory when set.
    pub data_dir: Option<String>,
}

/// Image cache tuning and delete policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheSettings {
    /// In-memory entry count above which the whole memory cache is flushed.
    pub memory_limit: usize,
    pub evict_images_on_bookmark_delete: bool,
    pub evict_images_on_tab_delete: bool,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            memory_limit: 100,
            evict_images_on_bookmark_delete: false,
            evict_images_on_tab_delete: false,
        }
    }
}

/// Favicon fetch settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkSettings {
    /// The page URL is appended to this prefix.
    pub favicon_service_url: String,
    pub timeout_secs: u64,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            favicon_service_url: "https://s2.googleusercontent.com/s2/favicons?domain_url="
                .to_string(),
            timeout_secs: 10,
        }
    }
}

/// Log output settings. `RUST_LOG` takes precedence over `level`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingSettings {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}
