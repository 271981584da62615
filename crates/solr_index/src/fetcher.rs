use std::marker::PhantomData;

use anyhow::Result;
use async_trait::async_trait;
use index_cursor::{CursorMark, FetchError, Page, PageFetcher, QuerySpec};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::config::SolrConfig;
use crate::render::to_params;

#[derive(Debug, Deserialize)]
struct SelectResponse<R> {
    response: SelectBody<R>,
    #[serde(rename = "nextCursorMark")]
    next_cursor_mark: String,
}

#[derive(Debug, Deserialize)]
struct SelectBody<R> {
    #[serde(rename = "numFound")]
    num_found: u64,
    docs: Vec<R>,
}

/// Fetches pages from Solr's `select` handler using `cursorMark` paging.
/// Rows are decoded from the returned documents as `R`.
pub struct SolrFetcher<R> {
    client: reqwest::Client,
    cfg: SolrConfig,
    _row: PhantomData<fn() -> R>,
}

impl<R> SolrFetcher<R> {
    pub fn new(cfg: SolrConfig) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(cfg.request_timeout()).build()?;
        Ok(Self { client, cfg, _row: PhantomData })
    }

    pub fn config(&self) -> &SolrConfig {
        &self.cfg
    }
}

#[async_trait]
impl<R: DeserializeOwned + Send + 'static> PageFetcher for SolrFetcher<R> {
    type Row = R;

    async fn fetch_page(
        &self,
        query: &QuerySpec,
        page_size: usize,
        cursor: &CursorMark,
    ) -> Result<Page<R>, FetchError> {
        let url = self.cfg.select_url(&query.collection);
        let params = to_params(query, page_size, cursor, &self.cfg.unique_key);
        debug!(%url, cursor = %cursor, rows = page_size, "solr select");

        let resp = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(from_reqwest)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let msg = format!("solr returned {status} for {url}: {}", solr_error_message(&body));
            return Err(if is_retryable_status(status) {
                FetchError::transient(msg)
            } else {
                FetchError::fatal(msg)
            });
        }

        let body: SelectResponse<R> = resp.json().await.map_err(from_reqwest)?;
        Ok(Page::new(
            body.response.docs,
            body.response.num_found,
            CursorMark::from_token(body.next_cursor_mark),
        ))
    }
}

fn is_retryable_status(status: StatusCode) -> bool {
    status.is_server_error()
        || status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
}

fn from_reqwest(err: reqwest::Error) -> FetchError {
    if err.is_decode() || err.is_builder() {
        FetchError::fatal(err.to_string())
    } else {
        // connect, timeout, reset mid-body
        FetchError::transient(err.to_string())
    }
}

/// Solr wraps failures as `{"error":{"msg":..}}`; fall back to the raw body.
fn solr_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error")?.get("msg")?.as_str().map(str::to_string))
        .unwrap_or_else(|| body.chars().take(200).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_its_config() {
        let cfg = SolrConfig { unique_key: "id".into(), ..SolrConfig::default() };
        let f = SolrFetcher::<serde_json::Value>::new(cfg.clone()).unwrap();
        assert_eq!(f.config().unique_key, "id");
        assert_eq!(f.config().base_url, cfg.base_url);
    }

    #[test]
    fn status_classification() {
        assert!(is_retryable_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(!is_retryable_status(StatusCode::BAD_REQUEST));
        assert!(!is_retryable_status(StatusCode::NOT_FOUND));
    }

    #[test]
    fn error_message_prefers_solr_msg() {
        let body = r#"{"responseHeader":{"status":400},"error":{"msg":"undefined field col_9","code":400}}"#;
        assert_eq!(solr_error_message(body), "undefined field col_9");
        assert_eq!(solr_error_message("gateway down"), "gateway down");
    }
}
