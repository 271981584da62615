use async_trait::async_trait;

use crate::cursor::{CursorMark, Page};
use crate::error::FetchError;
use crate::query::QuerySpec;

/// The one capability the iterator needs from an index: fetch the page of
/// `query` that starts at `cursor`.
///
/// Implementations are shared read-only between iterators, so they must
/// not keep per-iteration state.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    type Row: Send;

    async fn fetch_page(
        &self,
        query: &QuerySpec,
        page_size: usize,
        cursor: &CursorMark,
    ) -> Result<Page<Self::Row>, FetchError>;
}

