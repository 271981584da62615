use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Page size and retry policy of an iterator. Fixed once the iterator is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct RetryBudget {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Retries after the first failed attempt of a page fetch.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_sleep_ms")]
    pub sleep_between_retries_ms: u64,
}

pub const DEFAULT_PAGE_SIZE: usize = 1000;
pub const DEFAULT_MAX_RETRIES: u32 = 100;
pub const DEFAULT_SLEEP_BETWEEN_RETRIES_MS: u64 = 10_000;

fn default_page_size() -> usize { DEFAULT_PAGE_SIZE }
fn default_max_retries() -> u32 { DEFAULT_MAX_RETRIES }
fn default_sleep_ms() -> u64 { DEFAULT_SLEEP_BETWEEN_RETRIES_MS }

impl Default for RetryBudget {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            max_retries: default_max_retries(),
            sleep_between_retries_ms: default_sleep_ms(),
        }
    }
}

impl RetryBudget {
    /// Reads `RC_PAGE_SIZE`, `RC_MAX_RETRIES` and `RC_RETRY_SLEEP_MS`,
    /// falling back to the defaults for anything missing or unparsable.
    pub fn from_env() -> Self {
        let page_size = std::env::var("RC_PAGE_SIZE").ok().and_then(|s| s.parse().ok()).unwrap_or(default_page_size());
        let max_retries = std::env::var("RC_MAX_RETRIES").ok().and_then(|s| s.parse().ok()).unwrap_or(default_max_retries());
        let sleep_between_retries_ms = std::env::var("RC_RETRY_SLEEP_MS").ok().and_then(|s| s.parse().ok()).unwrap_or(default_sleep_ms());

        Self { page_size, max_retries, sleep_between_retries_ms }.normalized()
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self.normalized()
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_sleep_between_retries(mut self, sleep: Duration) -> Self {
        self.sleep_between_retries_ms = sleep.as_millis() as u64;
        self
    }

    /// Page size of zero would never advance the cursor.
    pub fn normalized(mut self) -> Self {
        self.page_size = self.page_size.max(1);
        self
    }

    pub fn sleep_between_retries(&self) -> Duration {
        Duration::from_millis(self.sleep_between_retries_ms)
    }

    /// Longest time a single page boundary can stall before giving up.
    pub fn worst_case_stall(&self) -> Duration {
        self.sleep_between_retries().checked_mul(self.max_retries).unwrap_or(Duration::MAX)
    }
}
