//! Fixed set of named sections flattened into one addressable row sequence.

use crate::models::BookmarkId;

/// The section a row belongs to, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    PromoBanner,
    StorageBanner,
    FolderDivider,
    Folders,
    BookmarkDivider,
    Bookmarks,
}

impl SectionKind {
    /// Every section, in the order they are laid out
    pub const ALL: [SectionKind; 6] = [
        SectionKind::PromoBanner,
        SectionKind::StorageBanner,
        SectionKind::FolderDivider,
        SectionKind::Folders,
        SectionKind::BookmarkDivider,
        SectionKind::Bookmarks,
    ];

    fn slot(self) -> usize {
        match self {
            SectionKind::PromoBanner => 0,
            SectionKind::StorageBanner => 1,
            SectionKind::FolderDivider => 2,
            SectionKind::Folders => 3,
            SectionKind::BookmarkDivider => 4,
            SectionKind::Bookmarks => 5,
        }
    }

    /// Sections holding at most one decorative marker
    pub fn is_single_marker(self) -> bool {
        !matches!(self, SectionKind::Folders | SectionKind::Bookmarks)
    }
}

/// One addressable row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowRef {
    /// Decorative banner or divider row with no payload
    Marker,
    Item(BookmarkId),
}

impl RowRef {
    pub fn bookmark_id(&self) -> Option<BookmarkId> {
        match self {
            RowRef::Marker => None,
            RowRef::Item(id) => Some(*id),
        }
    }
}

/// Ordered sections whose concatenation is the flat row list.
///
/// Membership and order are fixed at construction. Global positions are
/// derived from section sizes on every lookup; nothing positional is cached.
#[derive(Debug, Clone, Default)]
pub struct SectionRegistry {
    sections: [Vec<RowRef>; 6],
}

impl SectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Translate a global position into (section, index within section)
    pub fn position_to_local(&self, position: usize) -> Option<(SectionKind, usize)> {
        let mut local = position;
        for kind in SectionKind::ALL {
            let len = self.section_len(kind);
            if local < len {
                return Some((kind, local));
            }
            local -= len;
        }
        None
    }

    /// Inverse of [`SectionRegistry::position_to_local`]
    pub fn global_position(&self, kind: SectionKind, local: usize) -> usize {
        let before: usize = SectionKind::ALL
            .iter()
            .take_while(|k| **k != kind)
            .map(|k| self.section_len(*k))
            .sum();
        before + local
    }

    /// # Panics
    /// If `position` is not below [`SectionRegistry::total_count`].
    pub fn item_at(&self, position: usize) -> &RowRef {
        let (kind, local) = self.expect_local(position);
        &self.sections[kind.slot()][local]
    }

    /// # Panics
    /// If `position` is not below [`SectionRegistry::total_count`].
    pub fn section_kind_at(&self, position: usize) -> SectionKind {
        self.expect_local(position).0
    }

    pub fn total_count(&self) -> usize {
        self.sections.iter().map(Vec::len).sum()
    }

    pub fn section(&self, kind: SectionKind) -> &[RowRef] {
        &self.sections[kind.slot()]
    }

    pub fn section_len(&self, kind: SectionKind) -> usize {
        self.sections[kind.slot()].len()
    }

    pub fn is_empty(&self, kind: SectionKind) -> bool {
        self.sections[kind.slot()].is_empty()
    }

    /// Clear `kind` and fill it with `ids` in the given order
    pub fn replace(&mut self, kind: SectionKind, ids: impl IntoIterator<Item = BookmarkId>) {
        assert!(
            !kind.is_single_marker(),
            "{kind:?} holds a marker, not bookmark ids"
        );
        let section = &mut self.sections[kind.slot()];
        section.clear();
        section.extend(ids.into_iter().map(RowRef::Item));
    }

    pub fn clear(&mut self, kind: SectionKind) {
        self.sections[kind.slot()].clear();
    }

    /// Show or hide the single marker of a banner/divider section
    pub fn set_marker(&mut self, kind: SectionKind, visible: bool) {
        assert!(kind.is_single_marker(), "{kind:?} has no marker row");
        let section = &mut self.sections[kind.slot()];
        section.clear();
        if visible {
            section.push(RowRef::Marker);
        }
    }

    pub fn insert(&mut self, kind: SectionKind, local: usize, id: BookmarkId) {
        assert!(
            !kind.is_single_marker(),
            "cannot insert items into {kind:?}"
        );
        let section = &mut self.sections[kind.slot()];
        assert!(
            local <= section.len(),
            "insert index {local} out of range for {kind:?} of length {}",
            section.len()
        );
        section.insert(local, RowRef::Item(id));
    }

    pub fn remove(&mut self, kind: SectionKind, local: usize) -> RowRef {
        let section = &mut self.sections[kind.slot()];
        assert!(
            local < section.len(),
            "remove index {local} out of range for {kind:?} of length {}",
            section.len()
        );
        section.remove(local)
    }

    fn expect_local(&self, position: usize) -> (SectionKind, usize) {
        match self.position_to_local(position) {
            Some(found) => found,
            None => panic!(
                "invalid list position {position} (total count {})",
                self.total_count()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ids(range: std::ops::Range<i64>) -> Vec<BookmarkId> {
        range.map(BookmarkId::normal).collect()
    }

    fn populated() -> SectionRegistry {
        let mut registry = SectionRegistry::new();
        registry.set_marker(SectionKind::PromoBanner, true);
        registry.set_marker(SectionKind::FolderDivider, true);
        registry.replace(SectionKind::Folders, ids(10..12));
        registry.set_marker(SectionKind::BookmarkDivider, true);
        registry.replace(SectionKind::Bookmarks, ids(20..23));
        registry
    }

    #[test]
    fn test_empty_registry() {
        let registry = SectionRegistry::new();
        assert_eq!(registry.total_count(), 0);
        assert_eq!(registry.position_to_local(0), None);
    }

    #[test]
    fn test_position_walks_sections_in_order() {
        let registry = populated();
        assert_eq!(registry.total_count(), 8);
        assert_eq!(registry.position_to_local(0), Some((SectionKind::PromoBanner, 0)));
        assert_eq!(registry.position_to_local(1), Some((SectionKind::FolderDivider, 0)));
        assert_eq!(registry.position_to_local(3), Some((SectionKind::Folders, 1)));
        assert_eq!(registry.position_to_local(4), Some((SectionKind::BookmarkDivider, 0)));
        assert_eq!(registry.position_to_local(7), Some((SectionKind::Bookmarks, 2)));
        assert_eq!(registry.position_to_local(8), None);
        assert_eq!(*registry.item_at(6), RowRef::Item(BookmarkId::normal(21)));
    }

    #[test]
    fn test_every_position_maps_back_to_itself() {
        let registry = populated();
        for position in 0..registry.total_count() {
            let (kind, local) = registry.position_to_local(position).unwrap();
            let before: usize = SectionKind::ALL
                .iter()
                .take_while(|k| **k != kind)
                .map(|k| registry.section_len(*k))
                .sum();
            assert!(local < registry.section_len(kind));
            assert_eq!(before + local, position);
            assert_eq!(registry.global_position(kind, local), position);
        }
    }

    #[test]
    fn test_empty_sections_are_skipped() {
        let mut registry = SectionRegistry::new();
        registry.replace(SectionKind::Bookmarks, ids(1..3));
        assert_eq!(registry.section_kind_at(0), SectionKind::Bookmarks);
        assert_eq!(registry.global_position(SectionKind::Bookmarks, 1), 1);
    }

    #[test]
    fn test_set_marker_is_single_instance() {
        let mut registry = SectionRegistry::new();
        registry.set_marker(SectionKind::StorageBanner, true);
        registry.set_marker(SectionKind::StorageBanner, true);
        assert_eq!(registry.section_len(SectionKind::StorageBanner), 1);
        registry.set_marker(SectionKind::StorageBanner, false);
        assert!(registry.is_empty(SectionKind::StorageBanner));
    }

    #[test]
    fn test_insert_and_remove() {
        let mut registry = SectionRegistry::new();
        registry.replace(SectionKind::Folders, ids(1..3));
        registry.insert(SectionKind::Folders, 1, BookmarkId::normal(9));
        assert_eq!(
            registry.section(SectionKind::Folders),
            &[
                RowRef::Item(BookmarkId::normal(1)),
                RowRef::Item(BookmarkId::normal(9)),
                RowRef::Item(BookmarkId::normal(2)),
            ]
        );
        assert_eq!(
            registry.remove(SectionKind::Folders, 0),
            RowRef::Item(BookmarkId::normal(1))
        );
        assert_eq!(registry.section_len(SectionKind::Folders), 2);
    }

    #[test]
    #[should_panic(expected = "invalid list position")]
    fn test_item_at_out_of_range_panics() {
        populated().item_at(8);
    }

    #[test]
    #[should_panic(expected = "holds a marker")]
    fn test_replace_on_marker_section_panics() {
        SectionRegistry::new().replace(SectionKind::FolderDivider, ids(0..1));
    }
}
