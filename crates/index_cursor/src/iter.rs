use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::config::RetryBudget;
use crate::cursor::{CursorMark, Page};
use crate::error::IterError;
use crate::fetcher::PageFetcher;
use crate::query::QuerySpec;

/// Returned by [`IndexResultIterator::total_count`] before any page arrived.
pub const UNKNOWN_TOTAL: i64 = -1;

enum Phase {
    /// Nothing fetched yet; the first request uses [`CursorMark::Start`].
    NotStarted,
    /// Holds the mark of the page after the buffered one.
    InProgress(CursorMark),
    /// The index returned an empty page.
    Exhausted,
    /// Gave up; no further fetches are attempted.
    Failed(IterError),
}

/// Forward-only iterator over every row matching a [`QuerySpec`].
///
/// One row is always buffered ahead, so [`has_next`](Self::has_next) is
/// answered without I/O. Pages are requested lazily as the buffer drains.
/// A transient fetch failure is retried with a fixed delay up to
/// `max_retries` times; a fatal one, an exhausted budget or cancellation
/// ends the iteration for good and is reported by [`failure`](Self::failure).
pub struct IndexResultIterator<F: PageFetcher + ?Sized> {
    index: Arc<F>,
    query: QuerySpec,
    budget: RetryBudget,
    cancel: CancellationToken,

    phase: Phase,
    page: std::vec::IntoIter<F::Row>,
    next: Option<F::Row>,
    total_count: Option<u64>,
    fetches: u64,
}

impl<F: PageFetcher + ?Sized> IndexResultIterator<F> {
    pub async fn open(index: Arc<F>, query: QuerySpec, budget: RetryBudget) -> Self {
        Self::open_with_cancel(index, query, budget, CancellationToken::new()).await
    }

    /// Like [`open`](Self::open); firing `cancel` stops the iterator before
    /// its next fetch, while a fetch is in flight or during a retry delay.
    pub async fn open_with_cancel(
        index: Arc<F>,
        query: QuerySpec,
        budget: RetryBudget,
        cancel: CancellationToken,
    ) -> Self {
        let mut it = Self::unstarted(index, query, budget, cancel);
        it.prepare_next().await;
        it
    }

    fn unstarted(index: Arc<F>, query: QuerySpec, budget: RetryBudget, cancel: CancellationToken) -> Self {
        Self {
            index,
            query,
            budget: budget.normalized(),
            cancel,
            phase: Phase::NotStarted,
            page: Vec::new().into_iter(),
            next: None,
            total_count: None,
            fetches: 0,
        }
    }

    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    /// Hands out the buffered row and buffers the following one, fetching a
    /// page if the current one is used up.
    pub async fn next(&mut self) -> Result<F::Row, IterError> {
        let current = self.next.take().ok_or(IterError::Exhausted)?;
        self.prepare_next().await;
        Ok(current)
    }

    /// Total reported by the last successful fetch, or [`UNKNOWN_TOTAL`].
    /// Saturates at `i64::MAX`.
    pub fn total_count(&self) -> i64 {
        self.total_count.map_or(UNKNOWN_TOTAL, |n| i64::try_from(n).unwrap_or(i64::MAX))
    }

    pub fn page_size(&self) -> usize {
        self.budget.page_size
    }

    pub fn budget(&self) -> &RetryBudget {
        &self.budget
    }

    pub fn query(&self) -> &QuerySpec {
        &self.query
    }

    /// Successful page round-trips so far.
    pub fn fetches(&self) -> u64 {
        self.fetches
    }

    /// Why iteration stopped early, if it did. `None` while rows remain and
    /// after a clean end of data.
    pub fn failure(&self) -> Option<&IterError> {
        match &self.phase {
            Phase::Failed(err) => Some(err),
            _ => None,
        }
    }

    async fn prepare_next(&mut self) {
        if let Some(row) = self.page.next() {
            self.next = Some(row);
            return;
        }
        self.next = None;

        let cursor = match &self.phase {
            Phase::NotStarted => CursorMark::Start,
            Phase::InProgress(mark) => mark.clone(),
            Phase::Exhausted | Phase::Failed(_) => return,
        };

        let fetched =
            fetch_page_with_retries(&*self.index, &self.query, &self.budget, &self.cancel, &cursor).await;

        match fetched {
            Ok(page) => {
                self.fetches += 1;
                self.total_count = Some(page.total_count);
                debug!(
                    collection = %self.query.collection,
                    cursor = %cursor,
                    rows = page.len(),
                    total = page.total_count,
                    "fetched page"
                );

                if page.is_empty() {
                    self.phase = Phase::Exhausted;
                    return;
                }
                self.phase = Phase::InProgress(page.next_cursor);
                self.page = page.rows.into_iter();
                self.next = self.page.next();
            }
            Err(err) => {
                self.phase = Phase::Failed(err);
            }
        }
    }
}

/// One attempt plus up to `budget.max_retries` retries for transient errors.
async fn fetch_page_with_retries<F: PageFetcher + ?Sized>(
    index: &F,
    query: &QuerySpec,
    budget: &RetryBudget,
    cancel: &CancellationToken,
    cursor: &CursorMark,
) -> Result<Page<F::Row>, IterError> {
    let mut retries_left = budget.max_retries;
    let mut attempt: u32 = 0;

    loop {
        if cancel.is_cancelled() {
            return Err(IterError::Cancelled);
        }
        attempt += 1;

        let res = tokio::select! {
            _ = cancel.cancelled() => return Err(IterError::Cancelled),
            res = index.fetch_page(query, budget.page_size, cursor) => res,
        };

        let err = match res {
            Ok(page) => return Ok(page),
            Err(err) => err,
        };

        if !err.is_retryable() {
            error!(collection = %query.collection, cursor = %cursor, error = %err, "error getting next page from index, not retrying");
            return Err(err.into());
        }
        if retries_left == 0 {
            error!(collection = %query.collection, cursor = %cursor, attempts = attempt, error = %err, "error getting next page from index, no more retries");
            return Err(err.into());
        }
        retries_left -= 1;

        warn!(
            collection = %query.collection,
            attempt,
            retry_in_ms = budget.sleep_between_retries_ms,
            error = %err,
            "error getting next page from index, retrying"
        );
        tokio::select! {
            _ = cancel.cancelled() => return Err(IterError::Cancelled),
            _ = tokio::time::sleep(budget.sleep_between_retries()) => {}
        }
    }
}
