use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct SolrConfig {
    /// e.g. `http://localhost:8983/solr`, no trailing collection
    pub base_url: String,
    /// Field Solr uses as uniqueKey; cursor pagination needs it as the last sort key.
    #[serde(default = "default_unique_key")]
    pub unique_key: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_base_url() -> String { "http://localhost:8983/solr".into() }
fn default_unique_key() -> String { "uuid".into() }
fn default_request_timeout_ms() -> u64 { 30_000 }

impl Default for SolrConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            unique_key: default_unique_key(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl SolrConfig {
    pub fn from_env() -> Self {
        let base_url = std::env::var("RC_SOLR_URL").unwrap_or_else(|_| default_base_url());
        let unique_key = std::env::var("RC_UNIQUE_KEY").unwrap_or_else(|_| default_unique_key());
        let request_timeout_ms = std::env::var("RC_REQUEST_TIMEOUT_MS").ok().and_then(|s| s.parse().ok()).unwrap_or(default_request_timeout_ms());

        Self { base_url, unique_key, request_timeout_ms }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// `{base_url}/{collection}/select`
    pub fn select_url(&self, collection: &str) -> String {
        format!("{}/{}/select", self.base_url.trim_end_matches('/'), collection)
    }
}
