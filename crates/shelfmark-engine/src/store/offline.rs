use std::rc::Rc;

use crate::models::{ClientId, OfflinePageItem, PageSnapshotSource, SavePageResult};
use crate::observer::ObserverId;

/// Receives `(result, online url, offline id)` once a save finishes
pub type SavePageCallback = Box<dyn FnOnce(SavePageResult, String, i64)>;

pub type GetAllPagesCallback = Box<dyn FnOnce(Vec<OfflinePageItem>)>;

/// Notifications emitted by an [`OfflinePageStore`]
pub trait OfflinePageModelObserver {
    fn offline_page_model_loaded(&self) {}

    fn offline_page_model_changed(&self) {}

    fn offline_page_deleted(&self, _offline_id: i64, _client_id: &ClientId) {}
}

/// The offline-page snapshot store.
///
/// Both query and save are asynchronous: callbacks arrive later on the
/// shared task runner, never from inside the call.
pub trait OfflinePageStore {
    fn is_loaded(&self) -> bool;

    fn save_page(&self, source: &PageSnapshotSource, client_id: ClientId, callback: SavePageCallback);

    fn get_all_pages(&self, callback: GetAllPagesCallback);

    fn delete_pages(&self, offline_ids: &[i64]);

    /// URL to open for an online URL: the snapshot if one exists, else the URL itself
    fn launch_url_for_online_url(&self, online_url: &str) -> String;

    fn total_size_bytes(&self) -> u64;

    fn add_observer(&self, observer: Rc<dyn OfflinePageModelObserver>) -> ObserverId;

    fn remove_observer(&self, id: ObserverId);
}
