use serde::{Deserialize, Serialize};
use std::fmt;

/// Where the next page should resume.
///
/// Tokens are opaque and backend-issued; `Start` is the start-of-sequence
/// sentinel, written as `*` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CursorMark {
    Start,
    Token(String),
}

impl CursorMark {
    pub const START_TOKEN: &'static str = "*";

    pub fn from_token(token: impl Into<String>) -> Self {
        let token = token.into();
        if token == Self::START_TOKEN {
            Self::Start
        } else {
            Self::Token(token)
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Start => Self::START_TOKEN,
            Self::Token(t) => t,
        }
    }

    pub fn is_start(&self) -> bool {
        matches!(self, Self::Start)
    }
}

impl Default for CursorMark {
    fn default() -> Self {
        Self::Start
    }
}

impl fmt::Display for CursorMark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for CursorMark {
    fn from(token: String) -> Self {
        Self::from_token(token)
    }
}

impl From<CursorMark> for String {
    fn from(mark: CursorMark) -> Self {
        match mark {
            CursorMark::Start => CursorMark::START_TOKEN.to_string(),
            CursorMark::Token(t) => t,
        }
    }
}

/// One round-trip worth of rows.
#[derive(Debug, Clone)]
pub struct Page<R> {
    pub rows: Vec<R>,
    /// Total matching rows as estimated by the index at fetch time.
    pub total_count: u64,
    pub next_cursor: CursorMark,
}

impl<R> Page<R> {
    pub fn new(rows: Vec<R>, total_count: u64, next_cursor: CursorMark) -> Self {
        Self {
            rows,
            total_count,
            next_cursor,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_sentinel_is_star() {
        assert_eq!(CursorMark::from_token("*"), CursorMark::Start);
        assert_eq!(CursorMark::Start.to_string(), "*");
        assert!(CursorMark::default().is_start());
    }

    #[test]
    fn token_survives_json() {
        let mark = CursorMark::from_token("AoEjZG9jLTQy");
        let j = serde_json::to_string(&mark).unwrap();
        assert_eq!(j, r#""AoEjZG9jLTQy""#);
        let back: CursorMark = serde_json::from_str(&j).unwrap();
        assert_eq!(back, mark);

        let start: CursorMark = serde_json::from_str(r#""*""#).unwrap();
        assert!(start.is_start());
    }
}
