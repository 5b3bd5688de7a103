use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Prefix used in the string form of virtual bookmark ids
const VIRTUAL_PREFIX: char = 'v';

/// Whether a node lives in the user's own tree or is provided by a filter/partner source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookmarkType {
    Normal,
    Virtual,
}

/// Type-tagged handle for a node in the bookmark tree store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BookmarkId {
    pub id: i64,
    pub kind: BookmarkType,
}

impl BookmarkId {
    pub fn new(id: i64, kind: BookmarkType) -> Self {
        Self { id, kind }
    }

    pub fn normal(id: i64) -> Self {
        Self::new(id, BookmarkType::Normal)
    }

    pub fn virtual_node(id: i64) -> Self {
        Self::new(id, BookmarkType::Virtual)
    }

    pub fn is_normal(&self) -> bool {
        self.kind == BookmarkType::Normal
    }
}

impl fmt::Display for BookmarkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            BookmarkType::Normal => write!(f, "{}", self.id),
            BookmarkType::Virtual => write!(f, "{}{}", VIRTUAL_PREFIX, self.id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid bookmark id: {0:?}")]
pub struct ParseBookmarkIdError(pub String);

impl FromStr for BookmarkId {
    type Err = ParseBookmarkIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, digits) = match s.strip_prefix(VIRTUAL_PREFIX) {
            Some(rest) => (BookmarkType::Virtual, rest),
            None => (BookmarkType::Normal, s),
        };
        // i64 parsing accepts a leading '+', which is not a valid id string
        if digits.is_empty() || digits.starts_with('+') {
            return Err(ParseBookmarkIdError(s.to_string()));
        }
        digits
            .parse::<i64>()
            .map(|id| BookmarkId::new(id, kind))
            .map_err(|_| ParseBookmarkIdError(s.to_string()))
    }
}
