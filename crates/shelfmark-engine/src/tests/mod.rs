//! Shared test fixtures

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::coordinator::BookmarkDeleteObserver;
use crate::list::{ListChange, RenderSink};
use crate::models::{AddBookmarkResult, BookmarkId, ClientId, OfflinePageItem};

/// Offline page with only the fields the filter looks at
pub fn page(namespace: &str, id: &str, last_access_time_ms: i64) -> OfflinePageItem {
    OfflinePageItem {
        offline_id: last_access_time_ms,
        client_id: ClientId::new(namespace, id),
        url: format!("https://{id}.example"),
        file_size: 1,
        creation_time_ms: 0,
        last_access_time_ms,
    }
}

/// Records every render signal as a [`ListChange`]
#[derive(Default)]
pub struct RecordingSink {
    changes: RefCell<Vec<ListChange>>,
}

impl RecordingSink {
    pub fn take(&self) -> Vec<ListChange> {
        self.changes.take()
    }
}

impl RenderSink for RecordingSink {
    fn full_reset(&self) {
        self.changes.borrow_mut().push(ListChange::FullReset);
    }

    fn item_changed_at(&self, position: usize) {
        self.changes.borrow_mut().push(ListChange::ItemChanged(position));
    }

    fn item_inserted_at(&self, position: usize) {
        self.changes.borrow_mut().push(ListChange::ItemInserted(position));
    }

    fn item_removed_at(&self, position: usize) {
        self.changes.borrow_mut().push(ListChange::ItemRemoved(position));
    }
}

#[derive(Default)]
pub struct RecordingDeleteObserver {
    pub calls: RefCell<Vec<(Vec<String>, bool)>>,
}

impl BookmarkDeleteObserver for RecordingDeleteObserver {
    fn on_delete_bookmarks(&self, titles: &[String], is_undoable: bool) {
        self.calls.borrow_mut().push((titles.to_vec(), is_undoable));
    }
}

/// Captures the result of a create-bookmark callback
#[derive(Clone, Default)]
pub struct Outcome(Rc<Cell<Option<(Option<BookmarkId>, AddBookmarkResult)>>>);

impl Outcome {
    pub fn callback(&self) -> impl FnOnce(Option<BookmarkId>, AddBookmarkResult) + 'static {
        let slot = Rc::clone(&self.0);
        move |id, result| {
            assert!(slot.get().is_none(), "callback delivered twice");
            slot.set(Some((id, result)));
        }
    }

    pub fn get(&self) -> Option<(Option<BookmarkId>, AddBookmarkResult)> {
        self.0.get()
    }
}
