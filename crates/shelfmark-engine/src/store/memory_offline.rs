use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use super::{GetAllPagesCallback, OfflinePageModelObserver, OfflinePageStore, SavePageCallback};
use crate::models::{ClientId, OfflinePageItem, PageSnapshotSource, SavePageResult};
use crate::observer::{ObserverId, ObserverList};
use crate::task_runner::TaskRunner;

/// Size recorded for snapshots created through `save_page`
const DEFAULT_SNAPSHOT_SIZE: u64 = 64 * 1024;

#[derive(Debug, Default)]
struct OfflineState {
    pages: BTreeMap<i64, OfflinePageItem>,
    next_offline_id: i64,
    /// Logical clock for access/creation stamps
    clock_ms: i64,
    loaded: bool,
}

impl OfflineState {
    fn insert(&mut self, client_id: ClientId, url: &str, file_size: u64, time_ms: i64) -> i64 {
        self.next_offline_id += 1;
        let offline_id = self.next_offline_id;
        self.clock_ms = self.clock_ms.max(time_ms);
        self.pages.insert(
            offline_id,
            OfflinePageItem {
                offline_id,
                client_id,
                url: url.to_string(),
                file_size,
                creation_time_ms: time_ms,
                last_access_time_ms: time_ms,
            },
        );
        offline_id
    }

    fn tick(&mut self) -> i64 {
        self.clock_ms += 1;
        self.clock_ms
    }
}

/// Offline-page store kept in memory.
///
/// Saves and catalog queries complete on the shared [`TaskRunner`]. The
/// outcome of later saves can be forced with
/// [`MemoryOfflineStore::set_save_result`].
pub struct MemoryOfflineStore {
    state: Rc<RefCell<OfflineState>>,
    observers: Rc<ObserverList<dyn OfflinePageModelObserver>>,
    save_result: Cell<SavePageResult>,
    runner: TaskRunner,
}

impl MemoryOfflineStore {
    /// A store that is loaded from the start
    pub fn new(runner: TaskRunner) -> Self {
        Self::with_loaded(runner, true)
    }

    /// A store that reports loaded only after [`MemoryOfflineStore::finish_loading`]
    pub fn new_unloaded(runner: TaskRunner) -> Self {
        Self::with_loaded(runner, false)
    }

    fn with_loaded(runner: TaskRunner, loaded: bool) -> Self {
        Self {
            state: Rc::new(RefCell::new(OfflineState {
                loaded,
                ..OfflineState::default()
            })),
            observers: Rc::new(ObserverList::new()),
            save_result: Cell::new(SavePageResult::Success),
            runner,
        }
    }

    pub fn finish_loading(&self) {
        {
            let mut state = self.state.borrow_mut();
            if state.loaded {
                return;
            }
            state.loaded = true;
        }
        log::info!("offline page store loaded");
        for observer in self.observers.snapshot() {
            observer.offline_page_model_loaded();
        }
    }

    /// Result reported by every following `save_page`
    pub fn set_save_result(&self, result: SavePageResult) {
        self.save_result.set(result);
    }

    /// Insert a snapshot directly, as if it had been saved earlier
    pub fn insert_page(
        &self,
        client_id: ClientId,
        url: &str,
        file_size: u64,
        last_access_time_ms: i64,
    ) -> i64 {
        self.state
            .borrow_mut()
            .insert(client_id, url, file_size, last_access_time_ms)
    }

    pub fn page(&self, offline_id: i64) -> Option<OfflinePageItem> {
        self.state.borrow().pages.get(&offline_id).cloned()
    }

    pub fn page_for_client_id(&self, client_id: &ClientId) -> Option<OfflinePageItem> {
        self.state
            .borrow()
            .pages
            .values()
            .find(|page| page.client_id == *client_id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.state.borrow().pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl OfflinePageStore for MemoryOfflineStore {
    fn is_loaded(&self) -> bool {
        self.state.borrow().loaded
    }

    fn save_page(&self, source: &PageSnapshotSource, client_id: ClientId, callback: SavePageCallback) {
        let result = self.save_result.get();
        let url = source.url.clone();
        let state = Rc::clone(&self.state);
        let observers = Rc::clone(&self.observers);
        log::debug!("saving offline copy of {url} as {client_id}");
        self.runner.post(move || {
            let offline_id = if result == SavePageResult::Success {
                let offline_id = {
                    let mut state = state.borrow_mut();
                    let now = state.tick();
                    state.insert(client_id, &url, DEFAULT_SNAPSHOT_SIZE, now)
                };
                for observer in observers.snapshot() {
                    observer.offline_page_model_changed();
                }
                offline_id
            } else {
                log::warn!("offline save of {url} finished with {result:?}");
                0
            };
            callback(result, url, offline_id);
        });
    }

    fn get_all_pages(&self, callback: GetAllPagesCallback) {
        let state = Rc::clone(&self.state);
        self.runner.post(move || {
            let pages: Vec<OfflinePageItem> = state.borrow().pages.values().cloned().collect();
            callback(pages);
        });
    }

    fn delete_pages(&self, offline_ids: &[i64]) {
        let removed: Vec<OfflinePageItem> = {
            let mut state = self.state.borrow_mut();
            offline_ids
                .iter()
                .filter_map(|id| state.pages.remove(id))
                .collect()
        };
        for page in &removed {
            log::debug!("deleted offline page {} ({})", page.offline_id, page.client_id);
            for observer in self.observers.snapshot() {
                observer.offline_page_deleted(page.offline_id, &page.client_id);
            }
        }
    }

    fn launch_url_for_online_url(&self, online_url: &str) -> String {
        let mut state = self.state.borrow_mut();
        let now = state.tick();
        let page = state
            .pages
            .values_mut()
            .filter(|page| page.url == online_url)
            .max_by_key(|page| page.creation_time_ms);
        match page {
            Some(page) => {
                page.last_access_time_ms = now;
                format!("file:///offline-pages/{}.mhtml", page.offline_id)
            }
            None => online_url.to_string(),
        }
    }

    fn total_size_bytes(&self) -> u64 {
        self.state.borrow().pages.values().map(|page| page.file_size).sum()
    }

    fn add_observer(&self, observer: Rc<dyn OfflinePageModelObserver>) -> ObserverId {
        self.observers.add(observer)
    }

    fn remove_observer(&self, id: ObserverId) {
        self.observers.remove(id);
    }
}
