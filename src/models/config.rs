//! Configuration model.

use super::catalog::SeriesType;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Which namespace governs how a series is split into shows and seasons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StructureType {
    /// Native groups become shows, series (optionally merged) become seasons.
    Shoko,
    /// Every series is its own show with a single season.
    AniDb,
    /// Shows, seasons and movies come from the external service.
    Tmdb,
}

impl StructureType {
    /// Parse a structure name as used in override tags.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "shoko" | "shoko groups" => Some(StructureType::Shoko),
            "anidb" | "anidb anime" => Some(StructureType::AniDb),
            "tmdb" | "tmdb shows" => Some(StructureType::Tmdb),
            _ => None,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Catalogue server configuration.
    pub server: ServerConfig,
    /// Library layout configuration.
    pub library: LibraryConfig,
    /// Season merging configuration.
    pub merge: MergeConfig,
    /// Tag filtering configuration.
    pub tags: TagConfig,
    /// Cache expiry configuration.
    pub cache: CacheConfig,
    /// Idle detection configuration.
    pub usage: UsageConfig,
}

/// Catalogue server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL of the server.
    pub url: String,
    /// API key.
    pub api_key: Option<String>,
}

/// Library layout configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Known library folders.
    pub folders: Vec<String>,
    /// Root of the generated virtual tree, whose file names embed ids.
    pub virtual_root: Option<String>,
    /// Structure used when a series has no override.
    pub default_structure: StructureType,
    /// Per-series structure overrides keyed by series id.
    pub structure_overrides: BTreeMap<String, StructureType>,
    /// Show external movies grouped by their collection.
    pub collections_as_shows: bool,
}

/// Season merging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Whether related series may be merged into one season.
    pub enabled: bool,
    /// Series types that take part in merging.
    pub mergeable_types: Vec<SeriesType>,
    /// Maximum number of days between two series for an automatic merge.
    pub max_day_gap: i64,
}

/// Tag filtering configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TagConfig {
    /// Minimum weight for weighted tags.
    pub min_weight: u8,
    /// Include tags flagged as spoilers.
    pub include_spoilers: bool,
    /// Namespaces whose descendants are exposed as tags.
    pub include_namespaces: Vec<String>,
}

/// Cache expiry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Sliding expiry in seconds, reset on every access.
    pub sliding_secs: Option<u64>,
    /// Absolute expiry in seconds, counted from creation.
    pub absolute_secs: Option<u64>,
}

/// Idle detection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UsageConfig {
    /// Seconds without activity before the caches are dropped.
    pub stall_after_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8111".to_string(),
            api_key: None,
        }
    }
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            folders: Vec::new(),
            virtual_root: None,
            default_structure: StructureType::Shoko,
            structure_overrides: BTreeMap::new(),
            collections_as_shows: true,
        }
    }
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            mergeable_types: vec![SeriesType::Tv, SeriesType::Web, SeriesType::Ova],
            max_day_gap: 7,
        }
    }
}

impl Default for TagConfig {
    fn default() -> Self {
        Self {
            min_weight: 0,
            include_spoilers: false,
            include_namespaces: vec![
                "/elements".to_string(),
                "/setting".to_string(),
                "/themes".to_string(),
                "/custom user tags".to_string(),
            ],
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            sliding_secs: Some(15 * 60),
            absolute_secs: None,
        }
    }
}

impl Default for UsageConfig {
    fn default() -> Self {
        Self {
            stall_after_secs: 60 * 60,
        }
    }
}

impl LibraryConfig {
    /// Structure override configured for a series, if any.
    pub fn structure_override(&self, series_id: u32) -> Option<StructureType> {
        self.structure_overrides.get(&series_id.to_string()).copied()
    }
}

impl CacheConfig {
    /// Sliding expiry as a duration.
    pub fn sliding(&self) -> Option<Duration> {
        self.sliding_secs.map(Duration::from_secs)
    }

    /// Absolute expiry as a duration.
    pub fn absolute(&self) -> Option<Duration> {
        self.absolute_secs.map(Duration::from_secs)
    }
}

/// Shared, swappable configuration snapshot.
///
/// Components hold a handle and take a fresh snapshot per call, so a
/// reload is picked up by the next lookup without restarting anything.
#[derive(Debug, Clone)]
pub struct ConfigHandle {
    inner: Arc<RwLock<Arc<Config>>>,
}

impl ConfigHandle {
    pub fn new(config: Config) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(config))),
        }
    }

    /// Current configuration.
    pub fn snapshot(&self) -> Arc<Config> {
        Arc::clone(&self.inner.read())
    }

    /// Replace the configuration for all holders of this handle.
    pub fn replace(&self, config: Config) {
        *self.inner.write() = Arc::new(config);
    }
}

impl Default for ConfigHandle {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

/// Get the configuration directory path.
fn dirs_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("anime_resolver")
}

/// Default location of the configuration file.
pub fn default_config_path() -> PathBuf {
    dirs_config_path().join("config.toml")
}

/// Load configuration from a file, falling back to defaults when it is missing.
///
/// Environment variables `SHOKO_URL` and `SHOKO_API_KEY` override the file.
pub fn load_config_from(path: &Path) -> crate::Result<Config> {
    let mut config = if path.exists() {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)?
    } else {
        tracing::debug!("No config at {}, using defaults", path.display());
        Config::default()
    };

    if let Ok(url) = std::env::var("SHOKO_URL") {
        config.server.url = url;
    }
    if let Ok(key) = std::env::var("SHOKO_API_KEY") {
        config.server.api_key = Some(key);
    }

    Ok(config)
}

/// Load configuration from the default location.
pub fn load_config() -> crate::Result<Config> {
    load_config_from(&default_config_path())
}
