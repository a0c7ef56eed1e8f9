//! gemmarks storage layer.
//!
//! Reads and writes the per-profile bookmark files.
//!
//! # Usage
//!
//! ```no_run
//! use std::path::Path;
//! use gemmarks::managers::bookmark_manager::BookmarkManager;
//! use gemmarks::storage::{load_bookmarks, save_bookmarks};
//!
//! let store = BookmarkManager::new();
//! let profile = Path::new("profile");
//!
//! // Structured file first, legacy file as a fallback
//! let source = load_bookmarks(&store, profile);
//!
//! // Always writes the structured format
//! save_bookmarks(&store, profile).expect("failed to save bookmarks");
//! ```

pub mod bookmark_file;
pub mod legacy;
pub mod toml_events;

pub use bookmark_file::{load_bookmarks, save_bookmarks, LoadSource};
