use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use super::model::{BannerPolicy, ListChange, ListModel, RenderSink, RowKind, UiState};
use super::sections::RowRef;
use crate::coordinator::BookmarkCoordinator;
use crate::models::{BookmarkFilter, BookmarkId, BookmarkItem, ClientId, translate_client_id};
use crate::observer::ObserverId;
use crate::store::{BookmarkModelObserver, OfflinePageModelObserver};

/// Keeps a [`ListModel`] in step with the stores and forwards every change
/// to a [`RenderSink`].
///
/// The model is never borrowed while the sink runs, so the sink may read
/// back through the adapter.
pub struct BookmarkListAdapter {
    inner: Rc<AdapterInner>,
}

struct AdapterInner {
    this: Weak<AdapterInner>,
    model: RefCell<ListModel>,
    coordinator: Rc<BookmarkCoordinator>,
    sink: Rc<dyn RenderSink>,
    destroyed: Cell<bool>,
    /// Bumped on every state change; stale filter results are ignored
    generation: Cell<u64>,
    store_observer: Cell<Option<ObserverId>>,
    offline_observer: Cell<Option<ObserverId>>,
}

impl BookmarkListAdapter {
    pub fn new(
        coordinator: Rc<BookmarkCoordinator>,
        policy: Rc<dyn BannerPolicy>,
        sink: Rc<dyn RenderSink>,
    ) -> Self {
        let inner = Rc::new_cyclic(|this| AdapterInner {
            this: this.clone(),
            model: RefCell::new(ListModel::new(policy)),
            coordinator,
            sink,
            destroyed: Cell::new(false),
            generation: Cell::new(0),
            store_observer: Cell::new(None),
            offline_observer: Cell::new(None),
        });

        let store_observer = inner.coordinator.store().add_observer(inner.clone());
        inner.store_observer.set(Some(store_observer));
        if let Some(offline) = inner.coordinator.offline_store() {
            inner.offline_observer.set(Some(offline.add_observer(inner.clone())));
        }

        Self { inner }
    }

    pub fn ui_state(&self) -> UiState {
        self.inner.model.borrow().ui_state()
    }

    /// Switch to `state` and load its contents
    pub fn show(&self, state: UiState) {
        self.inner.show(state);
    }

    pub fn show_all_bookmarks(&self) {
        self.show(UiState::AllBookmarks);
    }

    pub fn show_folder(&self, folder: BookmarkId) {
        self.show(UiState::Folder(folder));
    }

    /// Clear the list, then fill it with the offline-available bookmarks
    /// once the catalog arrives
    pub fn show_offline_filter(&self) {
        self.show(UiState::Filter(BookmarkFilter::OfflinePages));
    }

    /// Reload the contents of the current state
    pub fn refresh(&self) {
        self.inner.refresh();
    }

    /// Re-evaluate banners after the policy's answers changed
    pub fn banner_policy_changed(&self) {
        let inner = &self.inner;
        if inner.destroyed.get() || inner.model.borrow().ui_state() == UiState::Loading {
            return;
        }
        inner.apply(ListModel::refresh_decorations);
    }

    pub fn total_count(&self) -> usize {
        self.inner.model.borrow().total_count()
    }

    pub fn row_kind_at(&self, position: usize) -> RowKind {
        self.inner.model.borrow().row_kind_at(position)
    }

    pub fn item_at(&self, position: usize) -> RowRef {
        *self.inner.model.borrow().item_at(position)
    }

    pub fn bookmark_at(&self, position: usize) -> Option<BookmarkId> {
        self.inner.model.borrow().bookmark_at(position)
    }

    pub fn with_model<R>(&self, f: impl FnOnce(&ListModel) -> R) -> R {
        f(&self.inner.model.borrow())
    }

    pub fn coordinator(&self) -> &Rc<BookmarkCoordinator> {
        &self.inner.coordinator
    }

    /// Stop following the stores; pending filter results are dropped
    pub fn destroy(&self) {
        let inner = &self.inner;
        if inner.destroyed.replace(true) {
            return;
        }
        if let Some(id) = inner.store_observer.take() {
            inner.coordinator.store().remove_observer(id);
        }
        if let (Some(offline), Some(id)) =
            (inner.coordinator.offline_store(), inner.offline_observer.take())
        {
            offline.remove_observer(id);
        }
    }
}

impl Drop for BookmarkListAdapter {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl AdapterInner {
    /// Run one model mutation, then signal the sink with no borrow held
    fn apply(&self, mutate: impl FnOnce(&mut ListModel) -> ListChange) {
        let change = mutate(&mut *self.model.borrow_mut());
        change.dispatch(self.sink.as_ref());
    }

    fn show(&self, state: UiState) {
        if self.destroyed.get() {
            return;
        }
        self.generation.set(self.generation.get() + 1);
        let store = self.coordinator.store();

        match state {
            UiState::Loading => self.apply(|model| {
                model.set_ui_state(state);
                model.set_contents(Vec::new(), Vec::new())
            }),
            UiState::AllBookmarks => {
                let bookmarks = store.all_bookmark_ids_by_creation_date();
                self.apply(|model| {
                    model.set_ui_state(state);
                    model.set_contents(Vec::new(), bookmarks)
                });
            }
            UiState::Folder(folder) => {
                if store.get_bookmark_by_id(folder).is_none() {
                    let fallback = self.coordinator.default_folder();
                    log::debug!("folder {folder} is gone, showing {fallback}");
                    return self.show(UiState::Folder(fallback));
                }
                let folders = store.child_ids(folder, true, false);
                let bookmarks = store.child_ids(folder, false, true);
                self.apply(|model| {
                    model.set_ui_state(state);
                    model.set_contents(folders, bookmarks)
                });
            }
            UiState::Filter(filter) => {
                // Rows of a filter already shown stay until the new result lands
                if self.model.borrow().ui_state() != state {
                    self.apply(|model| {
                        model.set_ui_state(state);
                        model.set_contents(Vec::new(), Vec::new())
                    });
                }
                let this = self.this.clone();
                let generation = self.generation.get();
                self.coordinator
                    .filter_by_offline_availability(filter, move |bookmarks| {
                        let Some(inner) = this.upgrade() else {
                            return;
                        };
                        if inner.destroyed.get() || inner.generation.get() != generation {
                            log::debug!("dropping stale offline filter result");
                            return;
                        }
                        inner.apply(|model| model.replace_bookmarks(bookmarks));
                    });
            }
        }
    }

    fn refresh(&self) {
        let state = self.model.borrow().ui_state();
        if state != UiState::Loading {
            self.show(state);
        }
    }

    fn remove_if_shown(&self, id: BookmarkId) {
        let position = self.model.borrow().find_position(id);
        if let Some(position) = position {
            self.apply(|model| model.remove_single(position));
        }
    }

    fn is_live(&self) -> bool {
        !self.destroyed.get() && self.model.borrow().ui_state() != UiState::Loading
    }
}

impl BookmarkModelObserver for AdapterInner {
    fn bookmark_node_changed(&self, node: &BookmarkItem) {
        if !self.is_live() {
            return;
        }
        let position = self.model.borrow().find_position(node.id);
        if let Some(position) = position {
            ListChange::ItemChanged(position).dispatch(self.sink.as_ref());
        }
    }

    fn bookmark_node_removed(
        &self,
        _parent: &BookmarkItem,
        _old_index: usize,
        node: &BookmarkItem,
        _is_doing_extensive_changes: bool,
    ) {
        if !self.is_live() {
            return;
        }
        if node.is_folder {
            self.refresh();
        } else {
            self.remove_if_shown(node.id);
        }
    }

    fn bookmark_model_changed(&self) {
        if self.is_live() {
            self.refresh();
        }
    }
}

impl OfflinePageModelObserver for AdapterInner {
    fn offline_page_model_changed(&self) {
        if self.is_live() {
            self.refresh();
        }
    }

    fn offline_page_deleted(&self, _offline_id: i64, client_id: &ClientId) {
        if !self.is_live() {
            return;
        }
        if !matches!(self.model.borrow().ui_state(), UiState::Filter(_)) {
            return;
        }
        if let Some(id) = translate_client_id(client_id) {
            self.remove_if_shown(id);
        }
    }
}
