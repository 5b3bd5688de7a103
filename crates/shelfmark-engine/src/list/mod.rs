//! The flat, sectioned row list shown by the bookmark surface.

pub mod adapter;
pub mod model;
pub mod sections;

pub use adapter::BookmarkListAdapter;
pub use model::{
    BannerPolicy, ListChange, ListModel, RenderSink, RowKind, StaticBannerPolicy,
    StorageSpacePolicy, UiState,
};
pub use sections::{RowRef, SectionKind, SectionRegistry};
