use crate::models::{BookmarkId, ClientId};
use crate::store::{BookmarkStore, MemoryBookmarkStore, MemoryOfflineStore, StoreError};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid seed file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Unknown folder key: {0}")]
    UnknownFolder(String),
    #[error("Store rejected seed entry: {0}")]
    Store(#[from] StoreError),
}

/// Bookmark tree and offline pages to start from, read from TOML.
///
/// ```toml
/// [[folders]]
/// key = "news"
/// title = "News"
///
/// [[bookmarks]]
/// title = "Story"
/// url = "https://news.example/story"
/// folder = "news"
/// offline = { last_access_ms = 1200, size = 40960 }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Seed {
    #[serde(default)]
    pub folders: Vec<SeedFolder>,
    #[serde(default)]
    pub bookmarks: Vec<SeedBookmark>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedFolder {
    pub key: String,
    pub title: String,
    /// Key of an earlier folder; the mobile folder when absent
    pub parent: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedBookmark {
    pub key: Option<String>,
    pub title: String,
    pub url: String,
    pub folder: Option<String>,
    pub offline: Option<SeedOfflinePage>,
    /// Read-only partner bookmark
    #[serde(default, rename = "virtual")]
    pub is_virtual: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedOfflinePage {
    pub last_access_ms: i64,
    pub size: u64,
}

/// Read and parse a seed file
pub fn load_seed(path: &Path) -> Result<Seed, IoError> {
    if !path.exists() {
        return Err(IoError::NotFound(path.to_path_buf()));
    }
    let content = fs::read_to_string(path)?;
    Seed::parse(&content)
}

impl Seed {
    pub fn parse(content: &str) -> Result<Self, IoError> {
        Ok(toml::from_str(content)?)
    }

    /// Add every folder and bookmark in file order, recording offline
    /// copies under the new bookmark's client id.
    ///
    /// Returns the id created for each keyed entry.
    pub fn populate(
        &self,
        store: &MemoryBookmarkStore,
        offline: &MemoryOfflineStore,
    ) -> Result<HashMap<String, BookmarkId>, IoError> {
        let mut keys: HashMap<String, BookmarkId> = HashMap::new();

        for folder in &self.folders {
            let parent = resolve_folder(store, &keys, folder.parent.as_deref())?;
            let id = store.add_folder(parent, store.child_count(parent), &folder.title)?;
            keys.insert(folder.key.clone(), id);
        }

        for bookmark in &self.bookmarks {
            let parent = resolve_folder(store, &keys, bookmark.folder.as_deref())?;
            let id = if bookmark.is_virtual {
                store.add_virtual_bookmark(parent, &bookmark.title, &bookmark.url)?
            } else {
                store.add_bookmark(
                    parent,
                    store.child_count(parent),
                    &bookmark.title,
                    &bookmark.url,
                )?
            };
            if let Some(page) = bookmark.offline {
                offline.insert_page(
                    ClientId::for_bookmark(id),
                    &bookmark.url,
                    page.size,
                    page.last_access_ms,
                );
            }
            if let Some(key) = &bookmark.key {
                keys.insert(key.clone(), id);
            }
        }

        log::info!(
            "seeded {} folders, {} bookmarks, {} offline pages",
            self.folders.len(),
            self.bookmarks.len(),
            offline.len()
        );
        Ok(keys)
    }
}

fn resolve_folder(
    store: &MemoryBookmarkStore,
    keys: &HashMap<String, BookmarkId>,
    key: Option<&str>,
) -> Result<BookmarkId, IoError> {
    match key {
        None => Ok(store.mobile_folder_id()),
        Some(key) => keys
            .get(key)
            .copied()
            .ok_or_else(|| IoError::UnknownFolder(key.to_string())),
    }
}
