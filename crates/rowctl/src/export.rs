use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use index_cursor::{IndexResultIterator, IterError, PageFetcher, QuerySpec, RetryBudget};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[derive(Debug)]
pub struct ExportSummary {
    pub written: u64,
    /// As reported by the index, `-1` if no page was fetched.
    pub total: i64,
    /// Set when the index stopped answering before the end of the rows.
    pub failure: Option<IterError>,
}

/// Streams every row of `query` into `out` as JSON lines.
///
/// Write errors abort immediately; an iterator failure is reported in the
/// summary after the rows received so far have been written.
pub async fn export_rows<F, W>(
    index: Arc<F>,
    query: QuerySpec,
    budget: RetryBudget,
    cancel: CancellationToken,
    out: &mut W,
) -> Result<ExportSummary>
where
    F: PageFetcher + ?Sized,
    F::Row: Serialize,
    W: Write,
{
    let collection = query.collection.clone();
    let mut it = IndexResultIterator::open_with_cancel(index, query, budget, cancel).await;
    info!(
        %collection,
        total = it.total_count(),
        page_size = it.page_size(),
        stall_limit_s = it.budget().worst_case_stall().as_secs(),
        "export started"
    );

    let mut written = 0u64;
    while it.has_next() {
        let row = it.next().await?;
        serde_json::to_writer(&mut *out, &row)?;
        out.write_all(b"\n")?;
        written += 1;
    }
    out.flush()?;

    info!(%collection, written, fetches = it.fetches(), "export finished");
    Ok(ExportSummary {
        written,
        total: it.total_count(),
        failure: it.failure().cloned(),
    })
}

/// Reads a single row's worth of page to learn the total.
pub async fn count_rows<F>(
    index: Arc<F>,
    query: QuerySpec,
    budget: RetryBudget,
    cancel: CancellationToken,
) -> Result<i64>
where
    F: PageFetcher + ?Sized,
{
    let it = IndexResultIterator::open_with_cancel(index, query, budget.with_page_size(1), cancel).await;
    if let Some(err) = it.failure() {
        return Err(err.clone().into());
    }
    Ok(it.total_count())
}
