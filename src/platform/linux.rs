// Linux paths follow the XDG base directory layout.

use std::env;
use std::path::PathBuf;

const APP_DIR: &str = "gemmarks";

/// `$<var>/gemmarks` when the variable is set, otherwise `$HOME/<fallback>/gemmarks`.
fn xdg_dir(var: Option<String>, home: Option<String>, fallback: &[&str]) -> PathBuf {
    match var.filter(|v| !v.is_empty()) {
        Some(base) => PathBuf::from(base).join(APP_DIR),
        None => {
            let mut path = PathBuf::from(home.unwrap_or_else(|| String::from("/tmp")));
            path.extend(fallback);
            path.join(APP_DIR)
        }
    }
}

pub fn get_config_dir() -> PathBuf {
    xdg_dir(
        env::var("XDG_CONFIG_HOME").ok(),
        env::var("HOME").ok(),
        &[".config"],
    )
}

pub fn get_data_dir() -> PathBuf {
    xdg_dir(
        env::var("XDG_DATA_HOME").ok(),
        env::var("HOME").ok(),
        &[".local", "share"],
    )
}
