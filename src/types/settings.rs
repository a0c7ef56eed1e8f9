use serde::{Deserialize, Serialize};

/// Top-level application settings container.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AppSettings {
    #[serde(default)]
    pub bookmarks: BookmarkSettings,
    #[serde(default)]
    pub network: NetworkSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Bookmark store behavior.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookmarkSettings {
    /// New bookmarks go last in lists (true) or first (false).
    #[serde(default = "default_true")]
    pub add_to_bottom: bool,
    /// Start a remote refresh round right after loading.
    #[serde(default)]
    pub refresh_on_startup: bool,
}

fn default_true() -> bool {
    true
}

impl Default for BookmarkSettings {
    fn default() -> Self {
        Self {
            add_to_bottom: true,
            refresh_on_startup: false,
        }
    }
}

/// Remote fetch settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkSettings {
    /// Per-request timeout in seconds; 0 disables it.
    pub request_timeout_secs: u64,
    pub max_response_bytes: usize,
    pub user_agent: String,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            max_response_bytes: 4 * 1024 * 1024,
            user_agent: format!("gemmarks/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingSettings {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
