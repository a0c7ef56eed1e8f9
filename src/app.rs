//! App Core for gemmarks.
//!
//! Owns the bookmark store, the remote refresh engine and the settings, and
//! runs the load-on-startup / save-on-shutdown lifecycle.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::runtime::Handle;
use tracing::{info, warn};

use crate::managers::bookmark_manager::BookmarkManager;
use crate::managers::remote_sync::RemoteSync;
use crate::platform;
use crate::services::link_fetcher::{LinkFetcher, NetworkFetcher};
use crate::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use crate::storage::{self, LoadSource};
use crate::types::errors::StorageError;
use crate::types::event::{BookmarkEvent, Notifier};

/// Central application struct.
pub struct App {
    pub profile_dir: PathBuf,
    pub bookmarks: Arc<BookmarkManager>,
    pub remote_sync: RemoteSync,
    pub settings_engine: SettingsEngine,
    pub notifier: Notifier,
}

impl App {
    /// Assembles an app around an already-loaded settings engine. Nothing is
    /// read from the profile until `startup` or `load`.
    pub fn new(
        profile_dir: PathBuf,
        settings_engine: SettingsEngine,
        fetcher: Arc<dyn LinkFetcher>,
        notifier: Notifier,
        runtime: Handle,
    ) -> Self {
        let bookmarks = Arc::new(BookmarkManager::new());
        let remote_sync = RemoteSync::new(
            Arc::clone(&bookmarks),
            fetcher,
            notifier.clone(),
            runtime,
        );
        Self {
            profile_dir,
            bookmarks,
            remote_sync,
            settings_engine,
            notifier,
        }
    }

    /// Builds the app from the platform settings file and profile directory
    /// (`GEMMARKS_PROFILE_DIR` overrides the latter).
    pub fn from_environment(
        notifier: Notifier,
        runtime: Handle,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let mut settings_engine = SettingsEngine::new(None);
        if let Err(err) = settings_engine.load() {
            warn!(error = %err, "using default settings");
        }
        let fetcher = NetworkFetcher::new(&settings_engine.get_settings().network)?;
        Ok(Self::new(
            platform::get_profile_dir(),
            settings_engine,
            Arc::new(fetcher),
            notifier,
            runtime,
        ))
    }

    /// Startup sequence: apply settings, load bookmarks, optionally start a refresh.
    pub fn startup(&mut self) -> LoadSource {
        let settings = self.settings_engine.get_settings().bookmarks.clone();
        self.bookmarks.set_add_to_bottom(settings.add_to_bottom);

        let source = self.load();
        if settings.refresh_on_startup {
            self.remote_sync.fetch_remote();
        }
        source
    }

    /// Reloads the store from the profile directory. Any refresh in progress
    /// is cancelled first.
    pub fn load(&mut self) -> LoadSource {
        self.remote_sync.cancel_all();
        let source = storage::load_bookmarks(&self.bookmarks, &self.profile_dir);
        self.notifier.notify(BookmarkEvent::Changed);
        source
    }

    pub fn save(&self) -> Result<(), StorageError> {
        storage::save_bookmarks(&self.bookmarks, &self.profile_dir)
    }

    /// Shutdown sequence: cancel fetches, then save.
    pub fn shutdown(&mut self) {
        self.remote_sync.cancel_all();
        match self.save() {
            Ok(()) => info!(profile = %self.profile_dir.display(), "bookmarks saved"),
            Err(err) => warn!(error = %err, "failed to save bookmarks on shutdown"),
        }
    }
}
