// gemmarks platform paths
// Settings live in the platform config directory; bookmark files live in the
// profile directory, which defaults to the platform data directory.
//
// Uses `cfg(target_os)` to pick the implementation at compile time.

use std::env;
use std::path::PathBuf;

#[cfg(target_os = "linux")]
mod linux;

#[cfg(target_os = "macos")]
mod macos;

#[cfg(target_os = "windows")]
mod windows;

/// Environment variable that overrides the profile directory.
pub const PROFILE_DIR_ENV: &str = "GEMMARKS_PROFILE_DIR";

/// Returns the platform-specific configuration directory.
///
/// - **Linux**: `$XDG_CONFIG_HOME/gemmarks` or `~/.config/gemmarks`
/// - **macOS**: `~/Library/Application Support/Gemmarks`
/// - **Windows**: `%APPDATA%/Gemmarks`
pub fn get_config_dir() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        linux::get_config_dir()
    }
    #[cfg(target_os = "macos")]
    {
        macos::get_config_dir()
    }
    #[cfg(target_os = "windows")]
    {
        windows::get_config_dir()
    }
}

/// Returns the platform-specific data directory.
///
/// - **Linux**: `$XDG_DATA_HOME/gemmarks` or `~/.local/share/gemmarks`
/// - **macOS**: `~/Library/Application Support/Gemmarks`
/// - **Windows**: `%APPDATA%/Gemmarks`
pub fn get_data_dir() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        linux::get_data_dir()
    }
    #[cfg(target_os = "macos")]
    {
        macos::get_data_dir()
    }
    #[cfg(target_os = "windows")]
    {
        windows::get_data_dir()
    }
}

/// Picks the profile directory from an explicit override, if non-empty.
pub fn profile_dir_from(overridden: Option<String>) -> PathBuf {
    match overridden {
        Some(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
        _ => get_data_dir(),
    }
}

/// Directory holding `bookmarks.ini` (and any legacy `bookmarks.txt`).
pub fn get_profile_dir() -> PathBuf {
    profile_dir_from(env::var(PROFILE_DIR_ENV).ok())
}
