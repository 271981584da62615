//! Error types for page fetching and iteration.

use std::fmt;

/// Whether a failed fetch is worth repeating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// Network trouble, timeouts, index temporarily unavailable.
    Transient,
    /// Malformed query, rejected request, undecodable response.
    Fatal,
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transient => f.write_str("transient"),
            Self::Fatal => f.write_str("fatal"),
        }
    }
}

/// A single failed page fetch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} fetch error: {message}")]
pub struct FetchError {
    kind: FetchErrorKind,
    message: String,
}

impl FetchError {
    pub fn new(kind: FetchErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Transient, message)
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Fatal, message)
    }

    pub fn kind(&self) -> FetchErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_retryable(&self) -> bool {
        self.kind == FetchErrorKind::Transient
    }
}

/// Errors surfaced by [`IndexResultIterator`](crate::IndexResultIterator).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IterError {
    /// `next()` was called with no row buffered.
    #[error("no more elements")]
    Exhausted,

    /// A page could not be fetched: the error was fatal, or the retry
    /// budget ran out on a transient one.
    #[error("error getting next page from index: {0}")]
    Fetch(#[from] FetchError),

    /// The cancellation token fired before the page was fetched.
    #[error("iteration cancelled")]
    Cancelled,
}
