use serde::{Deserialize, Serialize};

use super::BookmarkId;

/// Snapshot of one node of the bookmark tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookmarkItem {
    pub id: BookmarkId,
    pub title: String,
    /// Empty for folders
    pub url: String,
    pub parent: Option<BookmarkId>,
    pub is_folder: bool,
    pub is_editable: bool,
    /// Monotonic creation stamp; orders the "all bookmarks" view
    pub date_added: u64,
}

impl BookmarkItem {
    pub fn is_bookmark(&self) -> bool {
        !self.is_folder
    }
}

/// Filtered views that are not backed by a folder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BookmarkFilter {
    OfflinePages,
}

/// Outcome reported when a bookmark is added, with or without an offline copy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddBookmarkResult {
    Saved,
    Skipped,
    Error,
}
