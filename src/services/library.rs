//! Host library index.
//!
//! The resolver only asks the host two things: whether it knows an item
//! at a path, and which top-level library folder a path lives under. Both
//! are used to discover media roots the first time a path is seen.

use crate::utils::paths;
use std::path::Path;

/// An item known to the host library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryItem {
    pub path: String,
    pub is_folder: bool,
}

/// Read access to the host's library index.
pub trait LibraryIndex: Send + Sync {
    /// Item at exactly this path, if the host knows it.
    fn find_item_by_path(&self, path: &str) -> Option<LibraryItem>;

    /// Top-level library folder containing `path`.
    fn top_level_ancestor(&self, path: &str) -> Option<String>;
}

/// Library index backed by a fixed list of library folders.
#[derive(Debug, Clone, Default)]
pub struct StaticLibraryIndex {
    folders: Vec<String>,
}

impl StaticLibraryIndex {
    pub fn new<I, S>(folders: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            folders: folders
                .into_iter()
                .map(|f| paths::normalize(f.as_ref()))
                .collect(),
        }
    }

    fn containing_folder(&self, path: &str) -> Option<&String> {
        self.folders
            .iter()
            .filter(|folder| paths::is_under(path, folder))
            .max_by_key(|folder| folder.len())
    }
}

impl LibraryIndex for StaticLibraryIndex {
    fn find_item_by_path(&self, path: &str) -> Option<LibraryItem> {
        self.containing_folder(path)?;
        let on_disk = Path::new(path);
        if !on_disk.exists() {
            return None;
        }
        Some(LibraryItem {
            path: paths::normalize(path),
            is_folder: on_disk.is_dir(),
        })
    }

    fn top_level_ancestor(&self, path: &str) -> Option<String> {
        self.containing_folder(path).cloned()
    }
}
