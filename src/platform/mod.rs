// Acme platform paths.
//
// Linux follows the XDG base directory variables, macOS uses ~/Library,
// Windows uses %APPDATA% / %LOCALAPPDATA%.

use std::env;
use std::path::PathBuf;

const APP_DIR_UNIX: &str = "acme";
#[cfg(any(target_os = "macos", target_os = "windows"))]
const APP_DIR_NAMED: &str = "Acme";

#[cfg(not(target_os = "windows"))]
fn home_dir() -> PathBuf {
    PathBuf::from(env::var("HOME").unwrap_or_else(|_| String::from("/tmp")))
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn xdg_dir(var: &str, fallback: &[&str]) -> PathBuf {
    match env::var(var) {
        Ok(dir) if !dir.is_empty() => PathBuf::from(dir).join(APP_DIR_UNIX),
        _ => fallback
            .iter()
            .fold(home_dir(), |path, part| path.join(part))
            .join(APP_DIR_UNIX),
    }
}

/// Directory holding `settings.json`.
pub fn get_config_dir() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        home_dir()
            .join("Library")
            .join("Application Support")
            .join(APP_DIR_NAMED)
    }
    #[cfg(target_os = "windows")]
    {
        let appdata = env::var("APPDATA")
            .unwrap_or_else(|_| String::from("C:\\Users\\Default\\AppData\\Roaming"));
        PathBuf::from(appdata).join(APP_DIR_NAMED)
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        xdg_dir("XDG_CONFIG_HOME", &[".config"])
    }
}

/// Application-private directory for `bookmarks.json`, `tabs.json` and cached images.
pub fn get_data_dir() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        home_dir()
            .join("Library")
            .join("Application Support")
            .join(APP_DIR_NAMED)
            .join("Data")
    }
    #[cfg(target_os = "windows")]
    {
        let local = env::var("LOCALAPPDATA")
            .unwrap_or_else(|_| String::from("C:\\Users\\Default\\AppData\\Local"));
        PathBuf::from(local).join(APP_DIR_NAMED).join("Data")
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        xdg_dir("XDG_DATA_HOME", &[".local", "share"])
    }
}

/// Picks the configured data directory, or the platform default.
pub fn resolve_data_dir(configured: Option<&str>) -> PathBuf {
    match configured {
        Some(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
        _ => get_data_dir(),
    }
}
