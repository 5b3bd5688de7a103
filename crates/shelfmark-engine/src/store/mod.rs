//! Interfaces of the two backing stores, plus in-memory implementations.
//!
//! The bookmark tree store and the offline-page store are owned elsewhere;
//! the rest of the engine only observes and calls them through these traits.

pub mod memory;
pub mod memory_offline;
pub mod offline;

use std::rc::Rc;

use crate::models::{BookmarkId, BookmarkItem};
use crate::observer::ObserverId;

pub use memory::MemoryBookmarkStore;
pub use memory_offline::MemoryOfflineStore;
pub use offline::{GetAllPagesCallback, OfflinePageModelObserver, OfflinePageStore, SavePageCallback};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Bookmark model is not loaded")]
    NotLoaded,
    #[error("Unknown bookmark node: {0}")]
    UnknownNode(BookmarkId),
    #[error("Node is not a folder: {0}")]
    NotAFolder(BookmarkId),
    #[error("Index {index} out of range for folder with {len} children")]
    InvalidIndex { index: usize, len: usize },
    #[error("Invalid url: {0:?}")]
    InvalidUrl(String),
    #[error("Node is read-only: {0}")]
    ReadOnly(BookmarkId),
    #[error("Cannot move {0} into its own subtree")]
    CyclicMove(BookmarkId),
}

/// Structural change notifications emitted by a [`BookmarkStore`]
pub trait BookmarkModelObserver {
    fn bookmark_node_changed(&self, _node: &BookmarkItem) {}

    fn bookmark_node_removed(
        &self,
        _parent: &BookmarkItem,
        _old_index: usize,
        _node: &BookmarkItem,
        _is_doing_extensive_changes: bool,
    ) {
    }

    /// Anything may have changed; observers should re-read what they show
    fn bookmark_model_changed(&self) {}

    fn bookmark_model_loaded(&self) {}
}

/// The bookmark tree store
pub trait BookmarkStore {
    fn is_loaded(&self) -> bool;

    fn get_bookmark_by_id(&self, id: BookmarkId) -> Option<BookmarkItem>;

    fn add_bookmark(
        &self,
        parent: BookmarkId,
        index: usize,
        title: &str,
        url: &str,
    ) -> Result<BookmarkId, StoreError>;

    fn add_folder(&self, parent: BookmarkId, index: usize, title: &str)
    -> Result<BookmarkId, StoreError>;

    fn delete_bookmark(&self, id: BookmarkId) -> Result<(), StoreError>;

    fn move_bookmark(
        &self,
        id: BookmarkId,
        new_parent: BookmarkId,
        index: usize,
    ) -> Result<(), StoreError>;

    fn child_count(&self, folder: BookmarkId) -> usize;

    /// Direct children of `folder`, in tree order, restricted by kind
    fn child_ids(&self, folder: BookmarkId, get_folders: bool, get_bookmarks: bool)
    -> Vec<BookmarkId>;

    /// Every non-folder node, oldest first
    fn all_bookmark_ids_by_creation_date(&self) -> Vec<BookmarkId>;

    fn mobile_folder_id(&self) -> BookmarkId;

    /// Open an undo group; groups nest and only the outermost close seals it
    fn start_grouping_undos(&self);

    fn end_grouping_undos(&self);

    /// Revert the most recent undo unit; returns false if there was none
    fn undo(&self) -> bool;

    fn add_observer(&self, observer: Rc<dyn BookmarkModelObserver>) -> ObserverId;

    fn remove_observer(&self, id: ObserverId);
}
