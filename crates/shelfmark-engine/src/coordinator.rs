//! Bookmark operations that span the tree store and the offline-page store.

use std::cell::Cell;
use std::collections::HashSet;
use std::rc::Rc;

use crate::models::{
    AddBookmarkResult, BookmarkFilter, BookmarkId, ClientId, OfflinePageItem, PageSnapshotSource,
};
use crate::observer::{ObserverId, ObserverList};
use crate::store::{BookmarkModelObserver, BookmarkStore, OfflinePageModelObserver, OfflinePageStore};
use crate::task_runner::TaskRunner;
use crate::url::original_url_from_distiller_url;

pub use crate::models::translate_client_id;

/// Told once per `delete_many` call, after the store operations
pub trait BookmarkDeleteObserver {
    fn on_delete_bookmarks(&self, titles: &[String], is_undoable: bool);
}

/// Told once, when both stores have finished loading
pub trait ModelLoadedObserver {
    fn bookmark_model_loaded(&self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// The bookmark tree has not loaded
    Uninitialized,
    /// The tree is loaded; the offline-page store is still loading
    SnapshotLoading,
    Ready,
}

/// State reachable from store notifications and posted callbacks
struct Shared {
    store: Rc<dyn BookmarkStore>,
    offline: Option<Rc<dyn OfflinePageStore>>,
    destroyed: Cell<bool>,
    loaded_notified: Cell<bool>,
    loaded_observers: ObserverList<dyn ModelLoadedObserver>,
}

impl Shared {
    fn readiness(&self) -> Readiness {
        if !self.store.is_loaded() {
            return Readiness::Uninitialized;
        }
        match &self.offline {
            Some(offline) if !offline.is_loaded() => Readiness::SnapshotLoading,
            _ => Readiness::Ready,
        }
    }

    fn maybe_notify_loaded(&self) {
        if self.destroyed.get() || self.loaded_notified.get() {
            return;
        }
        let readiness = self.readiness();
        log::debug!("coordinator readiness: {readiness:?}");
        if readiness != Readiness::Ready {
            return;
        }
        self.loaded_notified.set(true);
        log::info!("bookmark and offline page models ready");
        for observer in self.loaded_observers.snapshot() {
            observer.bookmark_model_loaded();
        }
    }
}

impl BookmarkModelObserver for Shared {
    fn bookmark_model_loaded(&self) {
        self.maybe_notify_loaded();
    }
}

impl OfflinePageModelObserver for Shared {
    fn offline_page_model_loaded(&self) {
        self.maybe_notify_loaded();
    }
}

/// Facade over the bookmark tree store and the optional offline-page store.
///
/// Offline-page support is enabled exactly when an offline store is
/// supplied. All asynchronous outcomes are delivered through the shared
/// [`TaskRunner`] and dropped once [`BookmarkCoordinator::destroy`] ran.
pub struct BookmarkCoordinator {
    shared: Rc<Shared>,
    runner: TaskRunner,
    delete_observers: ObserverList<dyn BookmarkDeleteObserver>,
    store_observer: Cell<Option<ObserverId>>,
    offline_observer: Cell<Option<ObserverId>>,
}

impl BookmarkCoordinator {
    pub fn new(
        store: Rc<dyn BookmarkStore>,
        offline: Option<Rc<dyn OfflinePageStore>>,
        runner: TaskRunner,
    ) -> Self {
        let shared = Rc::new(Shared {
            store,
            offline,
            destroyed: Cell::new(false),
            loaded_notified: Cell::new(false),
            loaded_observers: ObserverList::new(),
        });
        // Loaded before anyone could subscribe: nothing to announce
        if shared.readiness() == Readiness::Ready {
            shared.loaded_notified.set(true);
        }

        let store_observer = shared.store.add_observer(shared.clone());
        let offline_observer = shared
            .offline
            .as_ref()
            .map(|offline| offline.add_observer(shared.clone()));

        Self {
            shared,
            runner,
            delete_observers: ObserverList::new(),
            store_observer: Cell::new(Some(store_observer)),
            offline_observer: Cell::new(offline_observer),
        }
    }

    pub fn readiness(&self) -> Readiness {
        self.shared.readiness()
    }

    /// Tree loaded and, with offline pages enabled, the offline store too
    pub fn is_loaded(&self) -> bool {
        self.readiness() == Readiness::Ready
    }

    pub fn is_offline_enabled(&self) -> bool {
        self.shared.offline.is_some()
    }

    pub fn is_destroyed(&self) -> bool {
        self.shared.destroyed.get()
    }

    pub fn store(&self) -> &Rc<dyn BookmarkStore> {
        &self.shared.store
    }

    pub fn offline_store(&self) -> Option<&Rc<dyn OfflinePageStore>> {
        self.shared.offline.as_ref()
    }

    pub fn runner(&self) -> &TaskRunner {
        &self.runner
    }

    pub fn add_delete_observer(&self, observer: Rc<dyn BookmarkDeleteObserver>) -> ObserverId {
        self.delete_observers.add(observer)
    }

    pub fn remove_delete_observer(&self, id: ObserverId) {
        self.delete_observers.remove(id);
    }

    pub fn add_loaded_observer(&self, observer: Rc<dyn ModelLoadedObserver>) -> ObserverId {
        self.shared.loaded_observers.add(observer)
    }

    pub fn remove_loaded_observer(&self, id: ObserverId) {
        self.shared.loaded_observers.remove(id);
    }

    pub fn bookmark_title(&self, id: BookmarkId) -> Option<String> {
        self.shared.store.get_bookmark_by_id(id).map(|item| item.title)
    }

    /// Folder new bookmarks land in when the caller does not choose one
    pub fn default_folder(&self) -> BookmarkId {
        self.shared.store.mobile_folder_id()
    }

    /// Delete every id, as one undo unit when there is more than one.
    ///
    /// Titles are read before anything is deleted. Delete observers are
    /// told once, afterwards; the batch is undoable only if every id is a
    /// normal node.
    ///
    /// # Panics
    /// If `ids` is empty or the bookmark tree is not loaded yet.
    pub fn delete_many(&self, ids: &[BookmarkId]) {
        assert!(!ids.is_empty(), "delete_many requires at least one bookmark");
        assert!(
            self.shared.store.is_loaded(),
            "delete_many called before the bookmark tree loaded"
        );

        let titles: Vec<String> = ids
            .iter()
            .map(|id| {
                self.bookmark_title(*id).unwrap_or_else(|| {
                    log::warn!("deleting unknown bookmark {id}");
                    String::new()
                })
            })
            .collect();
        let is_undoable = ids.iter().all(BookmarkId::is_normal);

        let store = &self.shared.store;
        if let [only] = ids {
            self.delete_one(*only);
        } else {
            store.start_grouping_undos();
            for id in ids {
                self.delete_one(*id);
            }
            store.end_grouping_undos();
        }

        for observer in self.delete_observers.snapshot() {
            observer.on_delete_bookmarks(&titles, is_undoable);
        }
    }

    fn delete_one(&self, id: BookmarkId) {
        if let Err(err) = self.shared.store.delete_bookmark(id) {
            log::warn!("failed to delete bookmark {id}: {err}");
        }
    }

    /// Append every id to `new_parent`, keeping their relative order.
    ///
    /// Ids already under `new_parent` move to its end too.
    ///
    /// # Panics
    /// If the bookmark tree is not loaded yet.
    pub fn move_many(&self, ids: &[BookmarkId], new_parent: BookmarkId) {
        let store = &self.shared.store;
        assert!(
            store.is_loaded(),
            "move_many called before the bookmark tree loaded"
        );
        for id in ids {
            // re-read: a same-parent move does not grow the folder
            let index = store.child_count(new_parent);
            if let Err(err) = store.move_bookmark(*id, new_parent, index) {
                log::warn!("failed to move bookmark {id} to {new_parent}: {err}");
            }
        }
    }

    /// Add a bookmark, then save an offline copy of `source` when offline
    /// pages are enabled.
    ///
    /// Reader-mode URLs are rewritten to their original first. `callback`
    /// runs exactly once, later, on the task runner: with `Error` if the
    /// tree write failed, `Skipped` if no snapshot was attempted, else the
    /// mapped save result.
    pub fn create_bookmark_async(
        &self,
        parent: BookmarkId,
        index: usize,
        title: &str,
        url: &str,
        source: Option<&PageSnapshotSource>,
        callback: impl FnOnce(Option<BookmarkId>, AddBookmarkResult) + 'static,
    ) {
        let url = original_url_from_distiller_url(url);
        let id = match self.shared.store.add_bookmark(parent, index, title, &url) {
            Ok(id) => id,
            Err(err) => {
                log::warn!("failed to add bookmark {url:?} to {parent}: {err}");
                self.post_unless_destroyed(move || callback(None, AddBookmarkResult::Error));
                return;
            }
        };

        match source {
            Some(source) if self.is_offline_enabled() => {
                self.save_offline_page(id, source, callback);
            }
            _ => self.post_unless_destroyed(move || callback(Some(id), AddBookmarkResult::Skipped)),
        }
    }

    /// Save an offline copy of `source` for the existing bookmark `id`
    pub fn save_offline_page(
        &self,
        id: BookmarkId,
        source: &PageSnapshotSource,
        callback: impl FnOnce(Option<BookmarkId>, AddBookmarkResult) + 'static,
    ) {
        let Some(offline) = &self.shared.offline else {
            self.post_unless_destroyed(move || callback(Some(id), AddBookmarkResult::Skipped));
            return;
        };

        let shared = Rc::clone(&self.shared);
        offline.save_page(
            source,
            ClientId::for_bookmark(id),
            Box::new(move |result, _url, _offline_id| {
                if shared.destroyed.get() {
                    log::debug!("dropping save result for {id}: coordinator destroyed");
                    return;
                }
                callback(Some(id), result.into());
            }),
        );
    }

    /// Ids of live bookmarks that have an offline copy, most recently
    /// accessed copy first.
    ///
    /// # Panics
    /// If offline pages are disabled or the models are not loaded yet.
    pub fn filter_by_offline_availability(
        &self,
        filter: BookmarkFilter,
        callback: impl FnOnce(Vec<BookmarkId>) + 'static,
    ) {
        let BookmarkFilter::OfflinePages = filter;
        let Some(offline) = &self.shared.offline else {
            panic!("offline page filter requested without offline page support");
        };
        assert!(
            self.is_loaded(),
            "offline page filter requested before the models loaded"
        );

        let shared = Rc::clone(&self.shared);
        offline.get_all_pages(Box::new(move |pages| {
            if shared.destroyed.get() {
                log::debug!("dropping offline page catalog: coordinator destroyed");
                return;
            }
            let existing: HashSet<BookmarkId> = shared
                .store
                .all_bookmark_ids_by_creation_date()
                .into_iter()
                .collect();
            callback(filter_bookmark_ids_by_offline_pages(pages, &existing));
        }));
    }

    /// URL to open for a bookmark, preferring its offline copy
    pub fn launch_url_and_mark_accessed(&self, id: BookmarkId) -> Option<String> {
        let item = self.shared.store.get_bookmark_by_id(id)?;
        let url = match &self.shared.offline {
            Some(offline) => offline.launch_url_for_online_url(&item.url),
            None => item.url,
        };
        Some(url)
    }

    /// Unsubscribe from both stores; later async outcomes are dropped
    pub fn destroy(&self) {
        if self.shared.destroyed.replace(true) {
            return;
        }
        if let Some(id) = self.store_observer.take() {
            self.shared.store.remove_observer(id);
        }
        if let (Some(offline), Some(id)) = (&self.shared.offline, self.offline_observer.take()) {
            offline.remove_observer(id);
        }
        log::debug!("bookmark coordinator destroyed");
    }

    fn post_unless_destroyed(&self, task: impl FnOnce() + 'static) {
        let shared = Rc::clone(&self.shared);
        self.runner.post(move || {
            if shared.destroyed.get() {
                log::debug!("dropping late callback: coordinator destroyed");
                return;
            }
            task();
        });
    }
}

impl Drop for BookmarkCoordinator {
    fn drop(&mut self) {
        self.destroy();
    }
}

/// Order snapshots by most recent access and keep those whose bookmark is
/// still in `existing`.
///
/// Snapshots from other namespaces are skipped. Equal access times keep
/// catalog order.
pub fn filter_bookmark_ids_by_offline_pages(
    mut pages: Vec<OfflinePageItem>,
    existing: &HashSet<BookmarkId>,
) -> Vec<BookmarkId> {
    pages.sort_by(|a, b| b.last_access_time_ms.cmp(&a.last_access_time_ms));
    pages
        .iter()
        .filter_map(|page| translate_client_id(&page.client_id))
        .filter(|id| existing.contains(id))
        .collect()
}
