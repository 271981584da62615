use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::cursor::{CursorMark, Page};
use crate::error::FetchError;
use crate::fetcher::PageFetcher;
use crate::query::QuerySpec;

/// In-memory index over a fixed row set.
///
/// Ignores the filter and sort; the cursor token is the offset of the next
/// row. Failures can be queued up front to exercise retry paths.
pub struct MemIndex<R> {
    rows: Vec<R>,
    calls: AtomicUsize,
    failures: Mutex<VecDeque<FetchError>>,
    cursors: Mutex<Vec<CursorMark>>,
}

impl<R> MemIndex<R> {
    pub fn new(rows: Vec<R>) -> Self {
        Self {
            rows,
            calls: AtomicUsize::new(0),
            failures: Mutex::new(VecDeque::new()),
            cursors: Mutex::new(Vec::new()),
        }
    }

    /// The next `n` calls fail with `err`, whatever they ask for.
    pub fn fail_next(&self, n: usize, err: FetchError) {
        let mut q = self.failures.lock().unwrap_or_else(|e| e.into_inner());
        q.extend(std::iter::repeat(err).take(n));
    }

    /// Every `fetch_page` call so far, successful or not.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    /// Cursor marks of the calls that returned a page, in order.
    pub fn cursors(&self) -> Vec<CursorMark> {
        self.cursors.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl<R: Clone + Send + Sync> PageFetcher for MemIndex<R> {
    type Row = R;

    async fn fetch_page(
        &self,
        _query: &QuerySpec,
        page_size: usize,
        cursor: &CursorMark,
    ) -> Result<Page<R>, FetchError> {
        self.calls.fetch_add(1, Ordering::Relaxed);

        let scripted = self.failures.lock().unwrap_or_else(|e| e.into_inner()).pop_front();
        if let Some(err) = scripted {
            return Err(err);
        }

        let offset = match cursor {
            CursorMark::Start => 0,
            CursorMark::Token(t) => t
                .parse::<usize>()
                .map_err(|_| FetchError::fatal(format!("invalid cursor mark {t:?}")))?,
        };
        let start = offset.min(self.rows.len());
        let end = start.saturating_add(page_size).min(self.rows.len());

        self.cursors.lock().unwrap_or_else(|e| e.into_inner()).push(cursor.clone());

        Ok(Page::new(
            self.rows[start..end].to_vec(),
            self.rows.len() as u64,
            CursorMark::Token(end.to_string()),
        ))
    }
}
