use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

/// Notifications sent to collaborators observing the bookmark store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookmarkEvent {
    /// Bookmarks were added, removed, reordered or edited.
    Changed,
    /// All fetches of a refresh round have completed.
    RefreshFinished,
}

impl BookmarkEvent {
    /// Command name used on the JSON-RPC event stream.
    pub fn command(&self) -> &'static str {
        match self {
            BookmarkEvent::Changed => "bookmarks.changed",
            BookmarkEvent::RefreshFinished => "bookmarks.refresh.finished",
        }
    }
}

/// Posts `BookmarkEvent`s to an observer. Delivery is best-effort.
#[derive(Debug, Clone, Default)]
pub struct Notifier {
    sender: Option<UnboundedSender<BookmarkEvent>>,
}

impl Notifier {
    /// Creates a notifier together with the receiving end of its channel.
    pub fn channel() -> (Self, UnboundedReceiver<BookmarkEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { sender: Some(tx) }, rx)
    }

    /// A notifier that drops every event.
    pub fn disconnected() -> Self {
        Self { sender: None }
    }

    pub fn notify(&self, event: BookmarkEvent) {
        if let Some(sender) = &self.sender {
            if sender.send(event).is_err() {
                debug!(event = event.command(), "no observer for bookmark event");
            }
        }
    }
}
