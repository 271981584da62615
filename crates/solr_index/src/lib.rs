//! Solr backend for `index_cursor`.

pub mod config;
pub mod fetcher;
pub mod render;

pub use config::SolrConfig;
pub use fetcher::SolrFetcher;
