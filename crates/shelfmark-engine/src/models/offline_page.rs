use serde::{Deserialize, Serialize};

use super::{AddBookmarkResult, ClientId};

/// One saved page snapshot as reported by the offline store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfflinePageItem {
    pub offline_id: i64,
    pub client_id: ClientId,
    pub url: String,
    pub file_size: u64,
    pub creation_time_ms: i64,
    pub last_access_time_ms: i64,
}

/// Result code of the offline store's save operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SavePageResult {
    Success,
    Cancelled,
    DeviceFull,
    ContentUnavailable,
    ArchiveCreationFailed,
    StoreFailure,
    AlreadyExists,
    Skipped,
}

impl From<SavePageResult> for AddBookmarkResult {
    fn from(result: SavePageResult) -> Self {
        match result {
            SavePageResult::Success => AddBookmarkResult::Saved,
            SavePageResult::Skipped => AddBookmarkResult::Skipped,
            _ => AddBookmarkResult::Error,
        }
    }
}

/// The page a snapshot would be taken of.
///
/// Stands in for the live page handle the offline store captures from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSnapshotSource {
    pub url: String,
    pub title: String,
    pub is_incognito: bool,
}

impl PageSnapshotSource {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            is_incognito: false,
        }
    }
}
