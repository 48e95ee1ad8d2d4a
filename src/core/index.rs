//! Reverse lookup tables.
//!
//! Filled lazily by the resolver once a result is fully assembled and
//! emptied in bulk on [`ReverseIndex::clear`]. Lookups never block on I/O.

use crate::models::ids::Identifier;
use crate::models::info::ShowKey;
use crate::utils::paths;
use dashmap::DashMap;
use parking_lot::Mutex;

/// File and series a path resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PathTarget {
    pub file_id: u32,
    pub series_id: u32,
}

/// Concurrent reverse indices shared by all resolutions.
#[derive(Debug, Default)]
pub struct ReverseIndex {
    path_to_file: DashMap<String, PathTarget>,
    path_to_episodes: DashMap<String, Vec<Identifier>>,
    episode_to_season: DashMap<Identifier, Identifier>,
    season_to_show: DashMap<Identifier, ShowKey>,
    media_roots: Mutex<Vec<String>>,
}

impl ReverseIndex {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(path: &str) -> String {
        paths::normalize(path)
    }

    /// Record what a path resolved to.
    pub fn register_path(&self, path: &str, target: PathTarget, episodes: Vec<Identifier>) {
        let key = Self::key(path);
        tracing::debug!(
            "Indexing {} -> file {} / series {}",
            key,
            target.file_id,
            target.series_id
        );
        self.path_to_file.insert(key.clone(), target);
        self.path_to_episodes.insert(key, episodes);
    }

    pub fn path_target(&self, path: &str) -> Option<PathTarget> {
        self.path_to_file.get(&Self::key(path)).map(|t| *t)
    }

    pub fn path_episodes(&self, path: &str) -> Option<Vec<Identifier>> {
        self.path_to_episodes.get(&Self::key(path)).map(|e| e.clone())
    }

    pub fn register_episode(&self, episode_id: Identifier, season_id: Identifier) {
        self.episode_to_season.insert(episode_id, season_id);
    }

    pub fn season_of(&self, episode_id: &Identifier) -> Option<Identifier> {
        self.episode_to_season.get(episode_id).map(|s| *s)
    }

    pub fn register_season(&self, season_id: Identifier, show: ShowKey) {
        tracing::trace!("Indexing season {} -> {}", season_id, show);
        self.season_to_show.insert(season_id, show);
    }

    pub fn show_of(&self, season_id: &Identifier) -> Option<ShowKey> {
        self.season_to_show.get(season_id).map(|s| *s)
    }

    /// Longest known media root containing `path`.
    pub fn media_root_for(&self, path: &str) -> Option<String> {
        self.media_roots
            .lock()
            .iter()
            .filter(|root| paths::is_under(path, root))
            .max_by_key(|root| root.len())
            .cloned()
    }

    /// Remember a media root. Returns `false` when it was already known.
    ///
    /// Check and append happen under one lock so racing discoveries of the
    /// same root add it once.
    pub fn add_media_root(&self, root: &str) -> bool {
        let root = Self::key(root);
        let mut roots = self.media_roots.lock();
        if roots.iter().any(|r| *r == root) {
            return false;
        }
        tracing::info!("Discovered media root {}", root);
        roots.push(root);
        true
    }

    pub fn media_roots(&self) -> Vec<String> {
        self.media_roots.lock().clone()
    }

    /// Number of indexed paths.
    pub fn path_count(&self) -> usize {
        self.path_to_file.len()
    }

    /// Drop every entry. Discovered media roots are kept since they are
    /// properties of the host library, not of catalogue data.
    pub fn clear(&self) {
        self.path_to_file.clear();
        self.path_to_episodes.clear();
        self.episode_to_season.clear();
        self.season_to_show.clear();
    }
}
