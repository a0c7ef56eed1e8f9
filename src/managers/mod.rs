// gemmarks state managers
// Managers own shared state: the bookmark store and the remote refresh engine.

pub mod bookmark_manager;
pub mod remote_sync;
