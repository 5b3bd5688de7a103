use serde::{Deserialize, Serialize};
use std::fmt;

use super::BookmarkId;

/// Namespace under which offline snapshots of bookmarks are saved
pub const BOOKMARK_NAMESPACE: &str = "bookmark";

/// Offline-snapshot client identifier: a namespace plus an opaque id string.
///
/// The offline store knows nothing about bookmark ids; only snapshots in
/// [`BOOKMARK_NAMESPACE`] carry the string form of a [`BookmarkId`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientId {
    pub namespace: String,
    pub id: String,
}

impl ClientId {
    pub fn new(namespace: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            id: id.into(),
        }
    }

    /// Client id under which the snapshot of `bookmark` is stored
    pub fn for_bookmark(bookmark: BookmarkId) -> Self {
        Self::new(BOOKMARK_NAMESPACE, bookmark.to_string())
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.id)
    }
}

/// Map an offline client id back to the bookmark it was saved for.
///
/// Returns `None` for foreign namespaces and for ids that do not parse.
pub fn translate_client_id(client_id: &ClientId) -> Option<BookmarkId> {
    if client_id.namespace != BOOKMARK_NAMESPACE {
        return None;
    }
    client_id.id.parse().ok()
}
