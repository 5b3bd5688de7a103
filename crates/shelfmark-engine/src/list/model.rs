use std::cell::Cell;
use std::rc::Rc;

use super::sections::{RowRef, SectionKind, SectionRegistry};
use crate::models::{BookmarkFilter, BookmarkId};
use crate::store::OfflinePageStore;

/// What the bookmark surface is currently showing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiState {
    Loading,
    AllBookmarks,
    Folder(BookmarkId),
    Filter(BookmarkFilter),
}

/// Row type handed to the rendering layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    PromoBanner,
    StorageBanner,
    Divider,
    Folder,
    Bookmark,
}

impl From<SectionKind> for RowKind {
    fn from(kind: SectionKind) -> Self {
        match kind {
            SectionKind::PromoBanner => RowKind::PromoBanner,
            SectionKind::StorageBanner => RowKind::StorageBanner,
            SectionKind::FolderDivider | SectionKind::BookmarkDivider => RowKind::Divider,
            SectionKind::Folders => RowKind::Folder,
            SectionKind::Bookmarks => RowKind::Bookmark,
        }
    }
}

/// External predicates deciding banner visibility
pub trait BannerPolicy {
    fn should_show_promo(&self) -> bool;

    fn should_show_storage_warning(&self) -> bool;
}

/// Banner policy with directly settable answers
#[derive(Debug, Default)]
pub struct StaticBannerPolicy {
    pub promo: Cell<bool>,
    pub storage_warning: Cell<bool>,
}

impl StaticBannerPolicy {
    pub fn new(promo: bool, storage_warning: bool) -> Self {
        Self {
            promo: Cell::new(promo),
            storage_warning: Cell::new(storage_warning),
        }
    }
}

impl BannerPolicy for StaticBannerPolicy {
    fn should_show_promo(&self) -> bool {
        self.promo.get()
    }

    fn should_show_storage_warning(&self) -> bool {
        self.storage_warning.get()
    }
}

/// Promo per configuration; storage warning once offline pages reach a size threshold
pub struct StorageSpacePolicy {
    offline: Rc<dyn OfflinePageStore>,
    threshold_bytes: u64,
    promo_enabled: bool,
}

impl StorageSpacePolicy {
    pub fn new(offline: Rc<dyn OfflinePageStore>, threshold_bytes: u64, promo_enabled: bool) -> Self {
        Self {
            offline,
            threshold_bytes,
            promo_enabled,
        }
    }
}

impl BannerPolicy for StorageSpacePolicy {
    fn should_show_promo(&self) -> bool {
        self.promo_enabled
    }

    fn should_show_storage_warning(&self) -> bool {
        self.offline.total_size_bytes() >= self.threshold_bytes
    }
}

/// Render signal produced by a list mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListChange {
    /// Every row may have changed
    FullReset,
    ItemChanged(usize),
    ItemInserted(usize),
    ItemRemoved(usize),
}

impl ListChange {
    pub fn dispatch(self, sink: &dyn RenderSink) {
        match self {
            ListChange::FullReset => sink.full_reset(),
            ListChange::ItemChanged(position) => sink.item_changed_at(position),
            ListChange::ItemInserted(position) => sink.item_inserted_at(position),
            ListChange::ItemRemoved(position) => sink.item_removed_at(position),
        }
    }
}

/// Notifications consumed by the rendering layer
pub trait RenderSink {
    fn full_reset(&self);

    fn item_changed_at(&self, position: usize);

    fn item_inserted_at(&self, _position: usize) {
        self.full_reset();
    }

    fn item_removed_at(&self, position: usize);
}

/// The bookmark list: six fixed sections plus the visibility rules tying
/// banners and dividers to the current contents and [`UiState`].
pub struct ListModel {
    registry: SectionRegistry,
    state: UiState,
    policy: Rc<dyn BannerPolicy>,
}

impl ListModel {
    pub fn new(policy: Rc<dyn BannerPolicy>) -> Self {
        Self {
            registry: SectionRegistry::new(),
            state: UiState::Loading,
            policy,
        }
    }

    pub fn ui_state(&self) -> UiState {
        self.state
    }

    /// Change state without touching contents; banners follow on the next recompute
    pub fn set_ui_state(&mut self, state: UiState) {
        log::debug!("list state {:?} -> {state:?}", self.state);
        self.state = state;
    }

    pub fn registry(&self) -> &SectionRegistry {
        &self.registry
    }

    pub fn total_count(&self) -> usize {
        self.registry.total_count()
    }

    pub fn item_at(&self, position: usize) -> &RowRef {
        self.registry.item_at(position)
    }

    pub fn section_kind_at(&self, position: usize) -> SectionKind {
        self.registry.section_kind_at(position)
    }

    pub fn row_kind_at(&self, position: usize) -> RowKind {
        self.section_kind_at(position).into()
    }

    /// Bookmark or folder id at `position`, `None` for decorative rows
    pub fn bookmark_at(&self, position: usize) -> Option<BookmarkId> {
        self.item_at(position).bookmark_id()
    }

    /// Linear scan; folders shown at once are few
    pub fn find_position(&self, id: BookmarkId) -> Option<usize> {
        (0..self.total_count()).find(|position| self.registry.item_at(*position) == &RowRef::Item(id))
    }

    pub fn replace_folders(&mut self, folders: Vec<BookmarkId>) -> ListChange {
        self.registry.replace(SectionKind::Folders, folders);
        self.refresh_decorations()
    }

    pub fn replace_bookmarks(&mut self, bookmarks: Vec<BookmarkId>) -> ListChange {
        self.registry.replace(SectionKind::Bookmarks, bookmarks);
        self.refresh_decorations()
    }

    /// Replace both item sections with a single reset
    pub fn set_contents(&mut self, folders: Vec<BookmarkId>, bookmarks: Vec<BookmarkId>) -> ListChange {
        self.registry.replace(SectionKind::Folders, folders);
        self.registry.replace(SectionKind::Bookmarks, bookmarks);
        self.refresh_decorations()
    }

    /// Insert one item at `local` within the folders or bookmarks section
    pub fn insert_single(&mut self, kind: SectionKind, local: usize, id: BookmarkId) -> ListChange {
        assert!(
            matches!(kind, SectionKind::Folders | SectionKind::Bookmarks),
            "cannot insert into {kind:?}"
        );
        self.registry.insert(kind, local, id);
        ListChange::ItemInserted(self.registry.global_position(kind, local))
    }

    /// Remove the item row at `position`.
    ///
    /// # Panics
    /// If `position` is out of range or not inside the folders or bookmarks section.
    pub fn remove_single(&mut self, position: usize) -> ListChange {
        let (kind, local) = match self.registry.position_to_local(position) {
            Some(found) => found,
            None => panic!(
                "invalid list position {position} (total count {})",
                self.total_count()
            ),
        };
        assert!(
            matches!(kind, SectionKind::Folders | SectionKind::Bookmarks),
            "cannot remove a {kind:?} row"
        );
        self.registry.remove(kind, local);
        ListChange::ItemRemoved(position)
    }

    /// Re-evaluate banners for the current state, then dividers
    pub fn refresh_decorations(&mut self) -> ListChange {
        self.recompute_banners();
        self.recompute_dividers();
        ListChange::FullReset
    }

    pub fn recompute_dividers(&mut self) {
        let header_present = !self.registry.is_empty(SectionKind::PromoBanner)
            || !self.registry.is_empty(SectionKind::StorageBanner);
        let has_folders = !self.registry.is_empty(SectionKind::Folders);
        let has_bookmarks = !self.registry.is_empty(SectionKind::Bookmarks);

        self.registry
            .set_marker(SectionKind::FolderDivider, header_present && has_folders);
        self.registry.set_marker(
            SectionKind::BookmarkDivider,
            (header_present || has_folders) && has_bookmarks,
        );
    }

    /// Promo and storage banners are mutually exclusive by state.
    ///
    /// While loading the banners are left as they are.
    pub fn recompute_banners(&mut self) {
        let (promo, storage) = match self.state {
            UiState::Loading => return,
            UiState::Filter(_) => (false, self.policy.should_show_storage_warning()),
            UiState::AllBookmarks | UiState::Folder(_) => (self.policy.should_show_promo(), false),
        };
        self.registry.set_marker(SectionKind::PromoBanner, promo);
        self.registry.set_marker(SectionKind::StorageBanner, storage);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn ids(values: &[i64]) -> Vec<BookmarkId> {
        values.iter().copied().map(BookmarkId::normal).collect()
    }

    fn model(promo: bool, storage: bool, state: UiState) -> (ListModel, Rc<StaticBannerPolicy>) {
        let policy = Rc::new(StaticBannerPolicy::new(promo, storage));
        let mut model = ListModel::new(policy.clone());
        model.set_ui_state(state);
        (model, policy)
    }

    fn kinds(model: &ListModel) -> Vec<RowKind> {
        (0..model.total_count()).map(|p| model.row_kind_at(p)).collect()
    }

    #[test]
    fn test_promo_folders_and_bookmarks_layout() {
        let (mut model, _) = model(true, false, UiState::Folder(BookmarkId::normal(1)));
        let change = model.set_contents(ids(&[11, 12]), ids(&[21]));

        assert_eq!(change, ListChange::FullReset);
        assert_eq!(model.total_count(), 6);
        assert_eq!(model.section_kind_at(0), SectionKind::PromoBanner);
        assert_eq!(model.section_kind_at(5), SectionKind::Bookmarks);
        assert!(!model.registry().is_empty(SectionKind::FolderDivider));
        assert!(!model.registry().is_empty(SectionKind::BookmarkDivider));
        assert_eq!(
            kinds(&model),
            vec![
                RowKind::PromoBanner,
                RowKind::Divider,
                RowKind::Folder,
                RowKind::Folder,
                RowKind::Divider,
                RowKind::Bookmark,
            ]
        );
        assert_eq!(model.bookmark_at(5), Some(BookmarkId::normal(21)));
        assert_eq!(model.bookmark_at(1), None);
    }

    #[rstest]
    // (banner, folders, bookmarks) -> (folder divider, bookmark divider)
    #[case(false, false, false, false, false)]
    #[case(false, false, true, false, false)]
    #[case(false, true, false, false, false)]
    #[case(false, true, true, false, true)]
    #[case(true, false, false, false, false)]
    #[case(true, false, true, false, true)]
    #[case(true, true, false, true, false)]
    #[case(true, true, true, true, true)]
    fn test_divider_rules(
        #[case] banner: bool,
        #[case] has_folders: bool,
        #[case] has_bookmarks: bool,
        #[case] folder_divider: bool,
        #[case] bookmark_divider: bool,
    ) {
        let (mut model, _) = model(banner, false, UiState::AllBookmarks);
        let folders = if has_folders { ids(&[1]) } else { Vec::new() };
        let bookmarks = if has_bookmarks { ids(&[2]) } else { Vec::new() };
        model.set_contents(folders, bookmarks);

        assert_eq!(!model.registry().is_empty(SectionKind::FolderDivider), folder_divider);
        assert_eq!(!model.registry().is_empty(SectionKind::BookmarkDivider), bookmark_divider);

        // Idempotent with no intervening mutation
        model.recompute_dividers();
        assert_eq!(!model.registry().is_empty(SectionKind::FolderDivider), folder_divider);
        assert_eq!(!model.registry().is_empty(SectionKind::BookmarkDivider), bookmark_divider);
    }

    #[rstest]
    #[case(UiState::AllBookmarks, true, true, true, false)]
    #[case(UiState::Folder(BookmarkId::normal(3)), true, true, true, false)]
    #[case(UiState::AllBookmarks, false, true, false, false)]
    #[case(UiState::Filter(BookmarkFilter::OfflinePages), true, true, false, true)]
    #[case(UiState::Filter(BookmarkFilter::OfflinePages), true, false, false, false)]
    fn test_banners_are_mutually_exclusive(
        #[case] state: UiState,
        #[case] promo_policy: bool,
        #[case] storage_policy: bool,
        #[case] promo_shown: bool,
        #[case] storage_shown: bool,
    ) {
        let (mut model, _) = model(promo_policy, storage_policy, state);
        model.recompute_banners();

        let promo = !model.registry().is_empty(SectionKind::PromoBanner);
        let storage = !model.registry().is_empty(SectionKind::StorageBanner);
        assert_eq!((promo, storage), (promo_shown, storage_shown));
        assert!(!(promo && storage));
    }

    #[test]
    fn test_switching_state_swaps_banner() {
        let (mut model, _) = model(true, true, UiState::AllBookmarks);
        model.replace_bookmarks(ids(&[1]));
        assert_eq!(model.row_kind_at(0), RowKind::PromoBanner);

        model.set_ui_state(UiState::Filter(BookmarkFilter::OfflinePages));
        model.replace_bookmarks(ids(&[1]));
        assert_eq!(model.row_kind_at(0), RowKind::StorageBanner);
        assert!(model.registry().is_empty(SectionKind::PromoBanner));
    }

    #[test]
    fn test_loading_leaves_banners_untouched() {
        let (mut model, policy) = model(true, false, UiState::AllBookmarks);
        model.replace_bookmarks(ids(&[1]));
        policy.promo.set(false);

        model.set_ui_state(UiState::Loading);
        model.recompute_banners();
        assert!(!model.registry().is_empty(SectionKind::PromoBanner));
    }

    #[test]
    fn test_dividers_follow_post_mutation_banner() {
        let (mut model, policy) = model(true, false, UiState::AllBookmarks);
        model.set_contents(ids(&[1]), Vec::new());
        assert!(!model.registry().is_empty(SectionKind::FolderDivider));

        policy.promo.set(false);
        model.refresh_decorations();
        assert!(model.registry().is_empty(SectionKind::PromoBanner));
        assert!(model.registry().is_empty(SectionKind::FolderDivider));
    }

    #[test]
    fn test_find_and_remove_single() {
        let (mut model, _) = model(false, false, UiState::AllBookmarks);
        model.set_contents(ids(&[1, 2]), ids(&[3, 4]));
        // folders, divider, bookmarks
        assert_eq!(model.find_position(BookmarkId::normal(4)), Some(4));
        assert_eq!(model.find_position(BookmarkId::normal(99)), None);
        assert_eq!(model.find_position(BookmarkId::virtual_node(4)), None);

        assert_eq!(model.remove_single(4), ListChange::ItemRemoved(4));
        assert_eq!(model.find_position(BookmarkId::normal(4)), None);
        assert_eq!(model.total_count(), 4);

        assert_eq!(model.remove_single(0), ListChange::ItemRemoved(0));
        assert_eq!(model.bookmark_at(0), Some(BookmarkId::normal(2)));
    }

    #[test]
    fn test_insert_single_reports_global_position() {
        let (mut model, _) = model(true, false, UiState::AllBookmarks);
        model.set_contents(Vec::new(), ids(&[1, 2]));
        // promo, divider, 1, 2
        let change = model.insert_single(SectionKind::Bookmarks, 1, BookmarkId::normal(7));
        assert_eq!(change, ListChange::ItemInserted(3));
        assert_eq!(model.bookmark_at(3), Some(BookmarkId::normal(7)));
    }

    #[test]
    #[should_panic(expected = "cannot remove a PromoBanner row")]
    fn test_remove_single_rejects_banner() {
        let (mut model, _) = model(true, false, UiState::AllBookmarks);
        model.replace_bookmarks(ids(&[1]));
        model.remove_single(0);
    }

    #[test]
    #[should_panic(expected = "invalid list position")]
    fn test_remove_single_rejects_out_of_range() {
        let (mut model, _) = model(false, false, UiState::AllBookmarks);
        model.replace_bookmarks(ids(&[1]));
        model.remove_single(1);
    }

    #[test]
    fn test_dispatch_reaches_sink() {
        use std::cell::RefCell;

        #[derive(Default)]
        struct Log(RefCell<Vec<String>>);
        impl RenderSink for Log {
            fn full_reset(&self) {
                self.0.borrow_mut().push("reset".into());
            }
            fn item_changed_at(&self, position: usize) {
                self.0.borrow_mut().push(format!("changed {position}"));
            }
            fn item_removed_at(&self, position: usize) {
                self.0.borrow_mut().push(format!("removed {position}"));
            }
        }

        let log = Log::default();
        ListChange::FullReset.dispatch(&log);
        ListChange::ItemChanged(2).dispatch(&log);
        ListChange::ItemRemoved(3).dispatch(&log);
        ListChange::ItemInserted(1).dispatch(&log);
        assert_eq!(
            *log.0.borrow(),
            vec!["reset", "changed 2", "removed 3", "reset"]
        );
    }
}
