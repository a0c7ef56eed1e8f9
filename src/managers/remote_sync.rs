//! Remote refresh engine.
//!
//! A refresh round deletes the previous round's `remote` imports, then fetches
//! every `remotesource` bookmark concurrently on the tokio runtime. Fetch tasks
//! never touch the store: each reports a `FetchCompletion` over a channel and
//! the owner of the `RemoteSync` merges it with `request_finished`, so merges
//! happen one at a time on the owner's context.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::managers::bookmark_manager::{BookmarkManager, BookmarkManagerTrait};
use crate::services::link_fetcher::{FetchResponse, LinkFetcher};
use crate::services::link_list::parse_link_lines;
use crate::services::url_canon::{absolute_url, canonical_url, url_host};
use crate::types::bookmark::{tag_pattern, Bookmark, IMPORTED_ICON, REMOTE_SOURCE_TAG, REMOTE_TAG};
use crate::types::errors::FetchError;
use crate::types::event::{BookmarkEvent, Notifier};

/// Result of one fetch, delivered back to the engine's owner.
#[derive(Debug)]
pub struct FetchCompletion {
    pub request_id: u64,
    pub result: Result<FetchResponse, FetchError>,
}

/// An outstanding fetch and the source bookmark it will populate.
struct PendingRequest {
    request_id: u64,
    source_id: u32,
    url: String,
    task: JoinHandle<()>,
}

pub struct RemoteSync {
    store: Arc<BookmarkManager>,
    fetcher: Arc<dyn LinkFetcher>,
    notifier: Notifier,
    runtime: Handle,
    pending: Vec<PendingRequest>,
    next_request_id: u64,
    completions_tx: UnboundedSender<FetchCompletion>,
    completions_rx: UnboundedReceiver<FetchCompletion>,
}

/// Imports the link lines of `body` as `remote` children of `source_id`.
///
/// Links are resolved against `base_url` and skipped when any bookmark already
/// has the same canonical URL. Returns the number of bookmarks added.
pub fn merge_link_list(store: &BookmarkManager, source_id: u32, base_url: &str, body: &str) -> usize {
    let mut added = 0;
    for link in parse_link_lines(body) {
        let url = canonical_url(&absolute_url(base_url, &link.url));
        let title = if link.label.is_empty() {
            url_host(&url)
        } else {
            link.label
        };
        if store
            .import_link(&url, &title, REMOTE_TAG, Some(IMPORTED_ICON), source_id)
            .is_some()
        {
            added += 1;
        }
    }
    added
}

impl RemoteSync {
    /// Creates an idle engine. Fetch tasks are spawned on `runtime`.
    pub fn new(
        store: Arc<BookmarkManager>,
        fetcher: Arc<dyn LinkFetcher>,
        notifier: Notifier,
        runtime: Handle,
    ) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            store,
            fetcher,
            notifier,
            runtime,
            pending: Vec::new(),
            next_request_id: 0,
            completions_tx,
            completions_rx,
        }
    }

    pub fn is_fetching(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Number of fetches still outstanding in the current round.
    pub fn outstanding(&self) -> usize {
        self.pending.len()
    }

    /// Starts a refresh round. Returns false, changing nothing, while a
    /// previous round still has fetches outstanding.
    pub fn fetch_remote(&mut self) -> bool {
        if self.is_fetching() {
            debug!(outstanding = self.pending.len(), "refresh already in progress");
            return false;
        }

        let removed = self.store.remove_tagged(REMOTE_TAG);
        if removed > 0 {
            debug!(removed, "removed previous remote bookmarks");
            self.notifier.notify(BookmarkEvent::Changed);
        }

        let Some(source_tag) = tag_pattern(REMOTE_SOURCE_TAG) else {
            return true;
        };
        let is_source = |bm: &Bookmark| !bm.is_folder() && source_tag.is_match(&bm.tags);
        let sources = self.store.list(None, Some(&is_source));

        for source in sources {
            self.next_request_id += 1;
            let request_id = self.next_request_id;
            let fetcher = Arc::clone(&self.fetcher);
            let completions = self.completions_tx.clone();
            let url = source.url.clone();
            let task = self.runtime.spawn(async move {
                let result = fetcher.fetch(&url).await;
                // The receiver lives as long as the engine; a send error only
                // means the engine is gone.
                let _ = completions.send(FetchCompletion { request_id, result });
            });
            self.pending.push(PendingRequest {
                request_id,
                source_id: source.id,
                url: source.url,
                task,
            });
        }

        info!(sources = self.pending.len(), "started remote refresh");
        true
    }

    /// Merges one completed fetch. Ends the round when it was the last one.
    pub fn request_finished(&mut self, completion: FetchCompletion) {
        let Some(index) = self
            .pending
            .iter()
            .position(|request| request.request_id == completion.request_id)
        else {
            warn!(request_id = completion.request_id, "ignoring completion of unknown request");
            return;
        };
        let request = self.pending.remove(index);

        match completion.result {
            Ok(response) if response.status.is_success() => {
                let added = merge_link_list(
                    &self.store,
                    request.source_id,
                    &request.url,
                    &response.body_text(),
                );
                debug!(url = %request.url, added, "merged remote link list");
            }
            Ok(response) => {
                warn!(url = %request.url, status = ?response.status, meta = %response.meta, "remote source request failed");
            }
            Err(err) => {
                warn!(url = %request.url, error = %err, "remote source fetch failed");
            }
        }

        if self.pending.is_empty() {
            info!("remote refresh finished");
            self.notifier.notify(BookmarkEvent::Changed);
            self.notifier.notify(BookmarkEvent::RefreshFinished);
        }
    }

    /// Waits for the next completion. Never resolves while idle.
    pub async fn next_completion(&mut self) -> Option<FetchCompletion> {
        self.completions_rx.recv().await
    }

    /// Merges every completion that has already arrived, without waiting.
    /// Returns how many were processed.
    pub fn process_pending(&mut self) -> usize {
        let mut processed = 0;
        while let Ok(completion) = self.completions_rx.try_recv() {
            self.request_finished(completion);
            processed += 1;
        }
        processed
    }

    /// Merges completions until no fetch is outstanding.
    pub async fn run_until_idle(&mut self) {
        while self.is_fetching() {
            match self.completions_rx.recv().await {
                Some(completion) => self.request_finished(completion),
                None => break,
            }
        }
    }

    /// Aborts every outstanding fetch without waiting for it. No events are
    /// posted; completions that still arrive are ignored.
    pub fn cancel_all(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        debug!(count = self.pending.len(), "cancelling remote fetches");
        for request in self.pending.drain(..) {
            request.task.abort();
        }
    }
}

impl Drop for RemoteSync {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
