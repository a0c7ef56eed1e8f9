// gemmarks services
// URL canonicalization, link-list documents, network fetchers and settings.

pub mod link_fetcher;
pub mod link_list;
pub mod settings_engine;
pub mod url_canon;
