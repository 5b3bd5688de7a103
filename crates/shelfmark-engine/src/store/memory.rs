use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::{BookmarkModelObserver, BookmarkStore, StoreError};
use crate::models::{BookmarkId, BookmarkItem, BookmarkType};
use crate::observer::{ObserverId, ObserverList};

const ROOT_TITLE: &str = "Bookmarks";
const MOBILE_TITLE: &str = "Mobile bookmarks";
const OTHER_TITLE: &str = "Other bookmarks";

#[derive(Debug, Clone)]
struct Node {
    item: BookmarkItem,
    children: Vec<BookmarkId>,
}

/// One reversible step; a group of these forms one undo unit
#[derive(Debug)]
enum UndoEntry {
    Added {
        id: BookmarkId,
    },
    /// `subtree[0]` is the removed node, followed by its descendants
    Removed {
        parent: BookmarkId,
        index: usize,
        subtree: Vec<Node>,
    },
    Moved {
        id: BookmarkId,
        old_parent: BookmarkId,
        old_index: usize,
    },
}

struct Removal {
    parent: BookmarkItem,
    index: usize,
    subtree: Vec<Node>,
}

#[derive(Debug)]
struct TreeState {
    nodes: HashMap<BookmarkId, Node>,
    root: BookmarkId,
    mobile: BookmarkId,
    other: BookmarkId,
    next_id: i64,
    next_stamp: u64,
    loaded: bool,
    group_depth: usize,
    groups_opened: usize,
    open_group: Vec<UndoEntry>,
    undo_stack: Vec<Vec<UndoEntry>>,
}

impl TreeState {
    fn new(loaded: bool) -> Self {
        let mut state = Self {
            nodes: HashMap::new(),
            root: BookmarkId::normal(0),
            mobile: BookmarkId::normal(1),
            other: BookmarkId::normal(2),
            next_id: 0,
            next_stamp: 0,
            loaded,
            group_depth: 0,
            groups_opened: 0,
            open_group: Vec::new(),
            undo_stack: Vec::new(),
        };
        let root = state.create_node(None, ROOT_TITLE, "", true, BookmarkType::Normal);
        let mobile = state.create_node(Some(root), MOBILE_TITLE, "", true, BookmarkType::Normal);
        let other = state.create_node(Some(root), OTHER_TITLE, "", true, BookmarkType::Normal);
        for child in [mobile, other] {
            if let Some(node) = state.nodes.get_mut(&root) {
                node.children.push(child);
            }
        }
        state.root = root;
        state.mobile = mobile;
        state.other = other;
        state
    }

    fn is_permanent(&self, id: BookmarkId) -> bool {
        id == self.root || id == self.mobile || id == self.other
    }

    fn create_node(
        &mut self,
        parent: Option<BookmarkId>,
        title: &str,
        url: &str,
        is_folder: bool,
        kind: BookmarkType,
    ) -> BookmarkId {
        let id = BookmarkId::new(self.next_id, kind);
        self.next_id += 1;
        let date_added = self.next_stamp;
        self.next_stamp += 1;
        self.nodes.insert(
            id,
            Node {
                item: BookmarkItem {
                    id,
                    title: title.to_string(),
                    url: url.to_string(),
                    parent,
                    is_folder,
                    is_editable: kind == BookmarkType::Normal,
                    date_added,
                },
                children: Vec::new(),
            },
        );
        id
    }

    fn folder(&self, id: BookmarkId) -> Result<&Node, StoreError> {
        let node = self.nodes.get(&id).ok_or(StoreError::UnknownNode(id))?;
        if !node.item.is_folder {
            return Err(StoreError::NotAFolder(id));
        }
        Ok(node)
    }

    fn insert(
        &mut self,
        parent: BookmarkId,
        index: usize,
        title: &str,
        url: &str,
        is_folder: bool,
        kind: BookmarkType,
    ) -> Result<BookmarkId, StoreError> {
        if !self.loaded {
            return Err(StoreError::NotLoaded);
        }
        let len = self.folder(parent)?.children.len();
        if index > len {
            return Err(StoreError::InvalidIndex { index, len });
        }
        let id = self.create_node(Some(parent), title, url, is_folder, kind);
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.insert(index, id);
        }
        if kind == BookmarkType::Normal {
            self.record(UndoEntry::Added { id });
        }
        Ok(id)
    }

    fn detach(&mut self, id: BookmarkId) -> Result<Removal, StoreError> {
        if !self.loaded {
            return Err(StoreError::NotLoaded);
        }
        if self.is_permanent(id) {
            return Err(StoreError::ReadOnly(id));
        }
        let parent_id = self
            .nodes
            .get(&id)
            .ok_or(StoreError::UnknownNode(id))?
            .item
            .parent
            .ok_or(StoreError::ReadOnly(id))?;
        let parent = self
            .nodes
            .get_mut(&parent_id)
            .ok_or(StoreError::UnknownNode(parent_id))?;
        let index = parent
            .children
            .iter()
            .position(|child| *child == id)
            .ok_or(StoreError::UnknownNode(id))?;
        parent.children.remove(index);
        let parent = parent.item.clone();

        let mut subtree = Vec::new();
        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            if let Some(node) = self.nodes.remove(&next) {
                pending.extend(node.children.iter().rev().copied());
                subtree.push(node);
            }
        }
        Ok(Removal {
            parent,
            index,
            subtree,
        })
    }

    fn is_in_subtree(&self, candidate: BookmarkId, ancestor: BookmarkId) -> bool {
        let mut current = Some(candidate);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.nodes.get(&id).and_then(|node| node.item.parent);
        }
        false
    }

    /// Move `id` under `new_parent`; `index` is counted before the node is
    /// taken out of its old position. Returns the node's old position.
    fn relocate(
        &mut self,
        id: BookmarkId,
        new_parent: BookmarkId,
        index: usize,
    ) -> Result<(BookmarkId, usize), StoreError> {
        let node = self.nodes.get(&id).ok_or(StoreError::UnknownNode(id))?;
        if !node.item.is_editable || self.is_permanent(id) {
            return Err(StoreError::ReadOnly(id));
        }
        let old_parent = node.item.parent.ok_or(StoreError::ReadOnly(id))?;
        let len = self.folder(new_parent)?.children.len();
        if index > len {
            return Err(StoreError::InvalidIndex { index, len });
        }
        if self.is_in_subtree(new_parent, id) {
            return Err(StoreError::CyclicMove(id));
        }

        let old_index = self
            .nodes
            .get(&old_parent)
            .and_then(|parent| parent.children.iter().position(|child| *child == id))
            .ok_or(StoreError::UnknownNode(id))?;
        let mut index = index;
        if old_parent == new_parent && index > old_index {
            index -= 1;
        }
        if let Some(parent) = self.nodes.get_mut(&old_parent) {
            parent.children.remove(old_index);
        }
        if let Some(parent) = self.nodes.get_mut(&new_parent) {
            let at = index.min(parent.children.len());
            parent.children.insert(at, id);
        }
        if let Some(node) = self.nodes.get_mut(&id) {
            node.item.parent = Some(new_parent);
        }
        Ok((old_parent, old_index))
    }

    fn record(&mut self, entry: UndoEntry) {
        if self.group_depth > 0 {
            self.open_group.push(entry);
        } else {
            self.undo_stack.push(vec![entry]);
        }
    }

    fn revert(&mut self, entry: UndoEntry) {
        match entry {
            UndoEntry::Added { id } => {
                // Reverting an add drops the node without recording anything
                let _ = self.detach(id);
            }
            UndoEntry::Removed {
                parent,
                index,
                subtree,
            } => {
                let Some(top) = subtree.first().map(|node| node.item.id) else {
                    return;
                };
                for node in subtree {
                    self.nodes.insert(node.item.id, node);
                }
                if let Some(parent) = self.nodes.get_mut(&parent) {
                    let at = index.min(parent.children.len());
                    parent.children.insert(at, top);
                }
            }
            UndoEntry::Moved {
                id,
                old_parent,
                old_index,
            } => {
                let current_parent = self.nodes.get(&id).and_then(|node| node.item.parent);
                if let Some(current_parent) = current_parent
                    && let Some(parent) = self.nodes.get_mut(&current_parent)
                {
                    parent.children.retain(|child| *child != id);
                }
                if let Some(parent) = self.nodes.get_mut(&old_parent) {
                    let at = old_index.min(parent.children.len());
                    parent.children.insert(at, id);
                }
                if let Some(node) = self.nodes.get_mut(&id) {
                    node.item.parent = Some(old_parent);
                }
            }
        }
    }
}

/// Bookmark tree kept entirely in memory, with grouped undo.
///
/// Starts with a root holding two permanent folders ("Mobile bookmarks" and
/// "Other bookmarks"). Virtual nodes are read-only and their deletions are
/// not recorded for undo.
pub struct MemoryBookmarkStore {
    state: RefCell<TreeState>,
    observers: ObserverList<dyn BookmarkModelObserver>,
}

impl Default for MemoryBookmarkStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBookmarkStore {
    /// A store that is loaded from the start
    pub fn new() -> Self {
        Self::with_loaded(true)
    }

    /// A store that reports loaded only after [`MemoryBookmarkStore::finish_loading`]
    pub fn new_unloaded() -> Self {
        Self::with_loaded(false)
    }

    fn with_loaded(loaded: bool) -> Self {
        Self {
            state: RefCell::new(TreeState::new(loaded)),
            observers: ObserverList::new(),
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
        log::info!("bookmark tree loaded");
        self.notify(|observer| observer.bookmark_model_loaded());
    }

    pub fn root_folder_id(&self) -> BookmarkId {
        self.state.borrow().root
    }

    pub fn other_folder_id(&self) -> BookmarkId {
        self.state.borrow().other
    }

    /// Add a read-only bookmark of type [`BookmarkType::Virtual`]
    pub fn add_virtual_bookmark(
        &self,
        parent: BookmarkId,
        title: &str,
        url: &str,
    ) -> Result<BookmarkId, StoreError> {
        validate_url(url)?;
        let result = {
            let mut state = self.state.borrow_mut();
            let index = state.folder(parent)?.children.len();
            state.insert(parent, index, title, url, false, BookmarkType::Virtual)
        };
        if result.is_ok() {
            self.notify(|observer| observer.bookmark_model_changed());
        }
        result
    }

    pub fn set_title(&self, id: BookmarkId, title: &str) -> Result<(), StoreError> {
        let item = {
            let mut state = self.state.borrow_mut();
            let node = state.nodes.get_mut(&id).ok_or(StoreError::UnknownNode(id))?;
            if !node.item.is_editable {
                return Err(StoreError::ReadOnly(id));
            }
            node.item.title = title.to_string();
            node.item.clone()
        };
        self.notify(|observer| observer.bookmark_node_changed(&item));
        Ok(())
    }

    /// Number of undo units currently available
    pub fn undo_depth(&self) -> usize {
        self.state.borrow().undo_stack.len()
    }

    /// How many outermost undo groups have been opened so far
    pub fn groups_opened(&self) -> usize {
        self.state.borrow().groups_opened
    }

    fn notify(&self, f: impl Fn(&dyn BookmarkModelObserver)) {
        for observer in self.observers.snapshot() {
            f(observer.as_ref());
        }
    }
}

fn validate_url(url: &str) -> Result<(), StoreError> {
    if url.trim().is_empty() {
        return Err(StoreError::InvalidUrl(url.to_string()));
    }
    Ok(())
}

impl BookmarkStore for MemoryBookmarkStore {
    fn is_loaded(&self) -> bool {
        self.state.borrow().loaded
    }

    fn get_bookmark_by_id(&self, id: BookmarkId) -> Option<BookmarkItem> {
        self.state.borrow().nodes.get(&id).map(|node| node.item.clone())
    }

    fn add_bookmark(
        &self,
        parent: BookmarkId,
        index: usize,
        title: &str,
        url: &str,
    ) -> Result<BookmarkId, StoreError> {
        validate_url(url)?;
        let id = self
            .state
            .borrow_mut()
            .insert(parent, index, title, url, false, BookmarkType::Normal)?;
        log::debug!("added bookmark {id} under {parent} at {index}");
        self.notify(|observer| observer.bookmark_model_changed());
        Ok(id)
    }

    fn add_folder(
        &self,
        parent: BookmarkId,
        index: usize,
        title: &str,
    ) -> Result<BookmarkId, StoreError> {
        let id = self
            .state
            .borrow_mut()
            .insert(parent, index, title, "", true, BookmarkType::Normal)?;
        log::debug!("added folder {id} under {parent} at {index}");
        self.notify(|observer| observer.bookmark_model_changed());
        Ok(id)
    }

    fn delete_bookmark(&self, id: BookmarkId) -> Result<(), StoreError> {
        let (parent, index, node, extensive) = {
            let mut state = self.state.borrow_mut();
            let removal = state.detach(id)?;
            let node = removal
                .subtree
                .first()
                .map(|node| node.item.clone())
                .ok_or(StoreError::UnknownNode(id))?;
            if id.is_normal() {
                state.record(UndoEntry::Removed {
                    parent: removal.parent.id,
                    index: removal.index,
                    subtree: removal.subtree,
                });
            }
            (removal.parent, removal.index, node, state.group_depth > 0)
        };
        log::debug!("deleted {id} from {} at {index}", parent.id);
        self.notify(|observer| observer.bookmark_node_removed(&parent, index, &node, extensive));
        Ok(())
    }

    fn move_bookmark(
        &self,
        id: BookmarkId,
        new_parent: BookmarkId,
        index: usize,
    ) -> Result<(), StoreError> {
        {
            let mut state = self.state.borrow_mut();
            if !state.loaded {
                return Err(StoreError::NotLoaded);
            }
            let (old_parent, old_index) = state.relocate(id, new_parent, index)?;
            state.record(UndoEntry::Moved {
                id,
                old_parent,
                old_index,
            });
        }
        self.notify(|observer| observer.bookmark_model_changed());
        Ok(())
    }

    fn child_count(&self, folder: BookmarkId) -> usize {
        self.state
            .borrow()
            .nodes
            .get(&folder)
            .map_or(0, |node| node.children.len())
    }

    fn child_ids(
        &self,
        folder: BookmarkId,
        get_folders: bool,
        get_bookmarks: bool,
    ) -> Vec<BookmarkId> {
        let state = self.state.borrow();
        let Some(node) = state.nodes.get(&folder) else {
            return Vec::new();
        };
        node.children
            .iter()
            .filter_map(|child| state.nodes.get(child))
            .filter(|child| {
                if child.item.is_folder {
                    get_folders
                } else {
                    get_bookmarks
                }
            })
            .map(|child| child.item.id)
            .collect()
    }

    fn all_bookmark_ids_by_creation_date(&self) -> Vec<BookmarkId> {
        let state = self.state.borrow();
        if !state.loaded {
            return Vec::new();
        }
        let mut bookmarks: Vec<&BookmarkItem> = state
            .nodes
            .values()
            .map(|node| &node.item)
            .filter(|item| item.is_bookmark())
            .collect();
        bookmarks.sort_by_key(|item| item.date_added);
        bookmarks.into_iter().map(|item| item.id).collect()
    }

    fn mobile_folder_id(&self) -> BookmarkId {
        self.state.borrow().mobile
    }

    fn start_grouping_undos(&self) {
        let mut state = self.state.borrow_mut();
        if state.group_depth == 0 {
            state.groups_opened += 1;
        }
        state.group_depth += 1;
    }

    fn end_grouping_undos(&self) {
        let mut state = self.state.borrow_mut();
        if state.group_depth == 0 {
            log::warn!("end_grouping_undos called without an open group");
            return;
        }
        state.group_depth -= 1;
        if state.group_depth == 0 && !state.open_group.is_empty() {
            let group = std::mem::take(&mut state.open_group);
            log::debug!("sealed undo group of {} step(s)", group.len());
            state.undo_stack.push(group);
        }
    }

    fn undo(&self) -> bool {
        {
            let mut state = self.state.borrow_mut();
            let Some(group) = state.undo_stack.pop() else {
                return false;
            };
            log::debug!("undoing group of {} step(s)", group.len());
            for entry in group.into_iter().rev() {
                state.revert(entry);
            }
        }
        self.notify(|observer| observer.bookmark_model_changed());
        true
    }

    fn add_observer(&self, observer: Rc<dyn BookmarkModelObserver>) -> ObserverId {
        self.observers.add(observer)
    }

    fn remove_observer(&self, id: ObserverId) {
        self.observers.remove(id);
    }
}
