pub mod bookmark_id;
pub mod bookmark_item;
pub mod client_id;
pub mod offline_page;

pub use bookmark_id::{BookmarkId, BookmarkType, ParseBookmarkIdError};
pub use bookmark_item::{AddBookmarkResult, BookmarkFilter, BookmarkItem};
pub use client_id::{BOOKMARK_NAMESPACE, ClientId, translate_client_id};
pub use offline_page::{OfflinePageItem, PageSnapshotSource, SavePageResult};
