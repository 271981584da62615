//! Forward-only, cursor-paged iteration over rows stored in a search index.
//!
//! The index is reached through [`PageFetcher`]; [`IndexResultIterator`]
//! hides page boundaries and transient fetch failures from the caller.

pub mod config;
pub mod cursor;
pub mod error;
pub mod fetcher;
pub mod iter;
pub mod mem;
pub mod query;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use config::RetryBudget;
pub use cursor::{CursorMark, Page};
pub use error::{FetchError, FetchErrorKind, IterError};
pub use fetcher::PageFetcher;
pub use iter::{IndexResultIterator, UNKNOWN_TOTAL};
pub use query::{Filter, FilterParameter, QuerySpec, SortParameter, Sorter, TABLE_ID_FIELD};

/// One table row as stored in the index: the row document id plus
/// every other stored field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewerRow {
    pub uuid: String,
    #[serde(flatten)]
    pub fields: BTreeMap<String, serde_json::Value>,
}
