//! Path and entity resolver.
//!
//! Turns file paths and identifiers into [`FileInfo`], [`EpisodeInfo`],
//! [`SeasonInfo`] and [`ShowInfo`] objects. Every remote lookup goes through
//! an [`IdentityCache`], and every fully assembled result is written back
//! into the [`ReverseIndex`] so repeated lookups for the same path never
//! reach the catalogue again until [`CatalogResolver::clear`] is called.

use super::cache::{Expiration, IdentityCache};
use super::index::{PathTarget, ReverseIndex};
use super::merge::{MergeChain, MergeSource, SeasonMergeWalker};
use super::series_config::resolve_configuration;
use super::tags::TagTree;
use super::usage::{UsageEvent, UsageTracker};
use crate::models::catalog::{EpisodeCrossReference, File, Relation, Series};
use crate::models::config::{ConfigHandle, StructureType};
use crate::models::ids::{IdPrefix, Identifier};
use crate::models::info::{
    EpisodeInfo, EpisodeKind, EpisodeSource, ExternalLink, FileInfo, SeasonInfo, SeasonSource,
    SeriesConfiguration, ShowInfo, ShowKey, ShowSource,
};
use crate::services::catalog::CatalogClient;
use crate::services::library::LibraryIndex;
use crate::utils::paths;
use crate::{Error, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use regex::Regex;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, OnceLock};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

/// Everything a path resolved to.
#[derive(Debug, Clone)]
pub struct PathResolution {
    pub file: Arc<FileInfo>,
    pub season: Option<Arc<SeasonInfo>>,
    pub show: Option<Arc<ShowInfo>>,
}

struct ResolverInner {
    client: Arc<dyn CatalogClient>,
    library: Arc<dyn LibraryIndex>,
    config: ConfigHandle,
    index: ReverseIndex,
    merge: SeasonMergeWalker,
    series: IdentityCache<u32, Option<Arc<Series>>>,
    series_by_anime: IdentityCache<u32, Option<Arc<Series>>>,
    relations: IdentityCache<u32, Arc<Vec<Relation>>>,
    tags: IdentityCache<u32, Arc<TagTree>>,
    unique_paths: IdentityCache<u32, Arc<HashSet<String>>>,
    files: IdentityCache<(u32, u32), Option<Arc<FileInfo>>>,
    episodes: IdentityCache<Identifier, Option<Arc<EpisodeInfo>>>,
    seasons: IdentityCache<Identifier, Option<Arc<SeasonInfo>>>,
    shows: IdentityCache<ShowKey, Option<Arc<ShowInfo>>>,
    usage: RwLock<Option<UsageTracker>>,
}

/// Resolver over the remote catalogue. Cheap to clone; clones share all
/// caches and indices.
#[derive(Clone)]
pub struct CatalogResolver {
    inner: Arc<ResolverInner>,
}

fn virtual_series_id() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[(?:shoko-)?series[-=](\d+)\]").expect("valid regex"))
}

fn virtual_file_id() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[(?:shoko-)?file[-=](\d+)\]").expect("valid regex"))
}

fn capture_id(re: &Regex, text: &str) -> Option<u32> {
    re.captures(text)?.get(1)?.as_str().parse().ok()
}

impl CatalogResolver {
    pub fn new(
        client: Arc<dyn CatalogClient>,
        library: Arc<dyn LibraryIndex>,
        config: ConfigHandle,
    ) -> Self {
        let snapshot = config.snapshot();
        let expiration = Expiration::from_windows(snapshot.cache.sliding(), snapshot.cache.absolute());

        let index = ReverseIndex::new();
        for folder in &snapshot.library.folders {
            index.add_media_root(folder);
        }

        Self {
            inner: Arc::new(ResolverInner {
                client,
                library,
                merge: SeasonMergeWalker::new(config.clone(), expiration),
                config,
                index,
                series: IdentityCache::new("series", expiration),
                series_by_anime: IdentityCache::new("series-by-anime", expiration),
                relations: IdentityCache::new("relations", expiration),
                tags: IdentityCache::new("tags", expiration),
                unique_paths: IdentityCache::new("unique-paths", expiration),
                files: IdentityCache::new("file", expiration),
                episodes: IdentityCache::new("episode", expiration),
                seasons: IdentityCache::new("season", expiration),
                shows: IdentityCache::new("show", expiration),
                usage: RwLock::new(None),
            }),
        }
    }

    /// Drop every cached object and reverse index entry.
    ///
    /// Resolutions already in flight finish, but their results are not
    /// kept.
    pub fn clear(&self) {
        tracing::info!("Clearing resolver caches");
        let inner = &self.inner;
        inner.series.clear();
        inner.series_by_anime.clear();
        inner.relations.clear();
        inner.tags.clear();
        inner.unique_paths.clear();
        inner.files.clear();
        inner.episodes.clear();
        inner.seasons.clear();
        inner.shows.clear();
        inner.merge.clear();
        inner.index.clear();
    }

    /// Clear all caches whenever `tracker` reports a stall, and report
    /// every lookup to it.
    pub fn watch_stalls(&self, tracker: UsageTracker) -> JoinHandle<()> {
        let mut events = tracker.subscribe();
        *self.inner.usage.write() = Some(tracker);
        let inner = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(UsageEvent::Stalled) | Err(RecvError::Lagged(_)) => {
                        let Some(inner) = inner.upgrade() else {
                            break;
                        };
                        CatalogResolver { inner }.clear();
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }

    fn touch(&self) {
        if let Some(tracker) = self.inner.usage.read().as_ref() {
            tracker.touch();
        }
    }

    pub fn index(&self) -> &ReverseIndex {
        &self.inner.index
    }

    // Non-blocking lookups backed only by the reverse indices.

    pub fn try_get_file_ids_for_path(&self, path: &str) -> Option<PathTarget> {
        self.inner.index.path_target(path)
    }

    pub fn try_get_episode_ids_for_path(&self, path: &str) -> Option<Vec<Identifier>> {
        self.inner.index.path_episodes(path)
    }

    pub fn try_get_season_id_for_episode(&self, episode_id: &Identifier) -> Option<Identifier> {
        self.inner.index.season_of(episode_id)
    }

    pub fn try_get_show_key_for_season(&self, season_id: &Identifier) -> Option<ShowKey> {
        self.inner.index.show_of(season_id)
    }

    // Public lookups.

    /// Resolve a file path to its file, season and show.
    ///
    /// Returns `Ok(None)` when the catalogue does not know the file. A file
    /// shared by several series whose folder belongs to none of them is an
    /// error.
    pub async fn resolve_by_path(&self, path: &str) -> Result<Option<PathResolution>> {
        self.touch();
        let path = paths::normalize(path);

        if let Some(target) = self.inner.index.path_target(&path) {
            tracing::debug!("Path index hit for {}", path);
            return self.resolve_target(target).await;
        }

        if let Some(target) = self.virtual_target(&path) {
            let Some(file) = self.file(target.file_id, target.series_id).await? else {
                return Ok(None);
            };
            return self.finish(&path, file).await;
        }

        let Some(partial) = self.partial_path(&path) else {
            tracing::debug!("{} is not below any media root", path);
            return Ok(None);
        };

        let mut files = self.inner.client.get_files_by_path(&partial).await?;
        if files.is_empty() {
            tracing::debug!("No file matches {}", partial);
            return Ok(None);
        }
        if files.len() > 1 {
            tracing::warn!(
                "{} files match {}, using file {}",
                files.len(),
                partial,
                files[0].id
            );
        }
        let file = files.swap_remove(0);

        let series_id = self.select_series(&file, &partial).await?;
        let Some(series_id) = series_id else {
            tracing::debug!("File {} is not linked to any series", file.id);
            return Ok(None);
        };

        let this = self.clone();
        let file_id = file.id;
        let info = self
            .inner
            .files
            .get_or_create((file_id, series_id), move || async move {
                this.build_file_info(file, series_id).await
            })
            .await?;
        let Some(info) = info else {
            return Ok(None);
        };
        self.finish(&path, info).await
    }

    /// Resolve a file as seen through one of its series.
    pub async fn get_file(&self, file_id: u32, series_id: u32) -> Result<Option<Arc<FileInfo>>> {
        self.touch();
        self.file(file_id, series_id).await
    }

    pub async fn get_episode(&self, id: &Identifier) -> Result<Option<Arc<EpisodeInfo>>> {
        self.touch();
        self.episode(*id).await
    }

    /// Resolve a season. Native ids of merged series resolve to the season
    /// of their primary.
    pub async fn get_season(&self, id: &Identifier) -> Result<Option<Arc<SeasonInfo>>> {
        self.touch();
        self.season(*id).await
    }

    pub async fn get_season_by_path(&self, path: &str) -> Result<Option<Arc<SeasonInfo>>> {
        Ok(self.resolve_by_path(path).await?.and_then(|r| r.season))
    }

    pub async fn get_season_by_episode_id(
        &self,
        episode_id: &Identifier,
    ) -> Result<Option<Arc<SeasonInfo>>> {
        self.touch();
        if let Some(season_id) = self.inner.index.season_of(episode_id) {
            return self.season(season_id).await;
        }
        match self.episode(*episode_id).await? {
            Some(episode) => self.season(episode.season_id).await,
            None => Ok(None),
        }
    }

    pub async fn get_show_by_season_id(&self, season_id: &Identifier) -> Result<Option<Arc<ShowInfo>>> {
        self.touch();
        if let Some(key) = self.inner.index.show_of(season_id) {
            return self.show(key).await;
        }
        match self.season(*season_id).await? {
            Some(season) => self.show_for_season(&season).await,
            None => Ok(None),
        }
    }

    pub async fn get_show_by_path(&self, path: &str) -> Result<Option<Arc<ShowInfo>>> {
        Ok(self.resolve_by_path(path).await?.and_then(|r| r.show))
    }

    /// Resolve a show by key: a native group, an external show or a
    /// collection.
    ///
    /// A standalone key names a season, so it resolves to whichever show
    /// that season belongs to. Collections resolve only while they are
    /// shown as shows.
    pub async fn get_show(&self, key: ShowKey) -> Result<Option<Arc<ShowInfo>>> {
        self.touch();
        match key {
            ShowKey::Standalone(season_id) => match self.season(season_id).await? {
                Some(season) => self.show_for_season(&season).await,
                None => Ok(None),
            },
            ShowKey::TmdbCollection(collection_id)
                if !self.inner.config.snapshot().library.collections_as_shows =>
            {
                tracing::debug!("Collection {} is not shown as a show", collection_id);
                Ok(None)
            }
            _ => self.show(key).await,
        }
    }

    pub async fn get_group(&self, group_id: u32) -> Result<Option<Arc<ShowInfo>>> {
        self.get_show(ShowKey::Group(group_id)).await
    }

    pub async fn get_collection(&self, collection_id: u32) -> Result<Option<Arc<ShowInfo>>> {
        self.get_show(ShowKey::TmdbCollection(collection_id)).await
    }

    /// Resolved tag tree of a native series.
    pub async fn get_tag_tree(&self, series_id: u32) -> Result<Arc<TagTree>> {
        self.touch();
        self.tag_tree(series_id).await
    }

    pub async fn get_series_configuration(
        &self,
        series_id: u32,
    ) -> Result<Option<SeriesConfiguration>> {
        self.touch();
        match self.series(series_id).await? {
            Some(series) => Ok(Some(self.series_configuration(&series).await?)),
            None => Ok(None),
        }
    }

    /// Merge chain a native series belongs to.
    pub async fn get_merge_chain(&self, series_id: u32) -> Result<Option<Arc<MergeChain>>> {
        self.touch();
        match self.series(series_id).await? {
            Some(series) => Ok(Some(self.merge_chain(&series).await?)),
            None => Ok(None),
        }
    }

    // Path handling

    /// File and series ids embedded in a generated file name.
    fn virtual_target(&self, path: &str) -> Option<PathTarget> {
        let config = self.inner.config.snapshot();
        let root = config.library.virtual_root.as_deref()?;
        if !paths::is_under(path, root) {
            return None;
        }
        let name = paths::file_name(path);
        let target = PathTarget {
            file_id: capture_id(virtual_file_id(), name)?,
            series_id: capture_id(virtual_series_id(), name)?,
        };
        tracing::debug!("{} names file {} in series {}", path, target.file_id, target.series_id);
        Some(target)
    }

    /// Path relative to its media root, discovering the root if needed.
    fn partial_path(&self, path: &str) -> Option<String> {
        let index = &self.inner.index;
        if let Some(root) = index.media_root_for(path) {
            return paths::strip_root(path, &root);
        }

        let Some(item) = self.inner.library.find_item_by_path(path) else {
            tracing::debug!("Host library does not know {}", path);
            return None;
        };
        let root = self.inner.library.top_level_ancestor(&item.path)?;
        index.add_media_root(&root);
        let root = index.media_root_for(path)?;
        paths::strip_root(path, &root)
    }

    /// Pick the series a file should be resolved through.
    async fn select_series(&self, file: &File, partial: &str) -> Result<Option<u32>> {
        if file.locations.is_empty() {
            return Err(Error::MissingFileLocation { file_id: file.id });
        }
        let matching: Vec<_> = file
            .locations
            .iter()
            .filter(|l| paths::ends_with_path(&l.relative_path, partial))
            .collect();
        let Some(location) = matching.first() else {
            return Err(Error::UnmatchedFileLocation {
                file_id: file.id,
                path: partial.to_string(),
            });
        };
        if matching.len() > 1 {
            tracing::warn!(
                "File {} has {} locations matching {}, using {}",
                file.id,
                matching.len(),
                partial,
                location.relative_path
            );
        }

        let mut candidates: Vec<u32> = Vec::new();
        for xref in &file.cross_references {
            if !candidates.contains(&xref.series_id) {
                candidates.push(xref.series_id);
            }
        }
        match candidates.len() {
            0 => return Ok(None),
            1 => return Ok(Some(candidates[0])),
            _ => {}
        }

        let folder = paths::parent_dir(&location.relative_path);
        for &series_id in &candidates {
            let unique = self.unique_paths(series_id).await?;
            if unique.contains(&folder) {
                tracing::debug!("Folder {} belongs to series {}", folder, series_id);
                return Ok(Some(series_id));
            }
        }

        Err(Error::AmbiguousFolder {
            file_id: file.id,
            path: location.relative_path.clone(),
            candidates,
        })
    }

    async fn resolve_target(&self, target: PathTarget) -> Result<Option<PathResolution>> {
        let Some(file) = self.file(target.file_id, target.series_id).await? else {
            return Ok(None);
        };
        let (season, show) = self.season_and_show(&file).await?;
        Ok(Some(PathResolution { file, season, show }))
    }

    /// Assemble the season and show of a file, then index the path.
    async fn finish(&self, path: &str, file: Arc<FileInfo>) -> Result<Option<PathResolution>> {
        let (season, show) = self.season_and_show(&file).await?;
        self.inner.index.register_path(
            path,
            PathTarget {
                file_id: file.id,
                series_id: file.series_id,
            },
            file.episode_ids(),
        );
        Ok(Some(PathResolution { file, season, show }))
    }

    async fn season_and_show(
        &self,
        file: &FileInfo,
    ) -> Result<(Option<Arc<SeasonInfo>>, Option<Arc<ShowInfo>>)> {
        let Some(season_id) = file.episodes.first().map(|e| e.season_id) else {
            tracing::debug!("File {} has no usable episodes", file.id);
            return Ok((None, None));
        };
        let Some(season) = self.season(season_id).await? else {
            return Ok((None, None));
        };
        let show = self.show_for_season(&season).await?;
        Ok((Some(season), show))
    }

    // Cached building blocks

    async fn series(&self, series_id: u32) -> Result<Option<Arc<Series>>> {
        let client = Arc::clone(&self.inner.client);
        self.inner
            .series
            .get_or_create(series_id, move || async move {
                Ok(client.get_series(series_id).await?.map(Arc::new))
            })
            .await
    }

    async fn series_by_anime(&self, anime_id: u32) -> Result<Option<Arc<Series>>> {
        let client = Arc::clone(&self.inner.client);
        self.inner
            .series_by_anime
            .get_or_create(anime_id, move || async move {
                Ok(client.get_series_by_anime_id(anime_id).await?.map(Arc::new))
            })
            .await
    }

    async fn relations_of(&self, series_id: u32) -> Result<Arc<Vec<Relation>>> {
        let client = Arc::clone(&self.inner.client);
        self.inner
            .relations
            .get_or_create(series_id, move || async move {
                Ok(Arc::new(client.get_relations_for_series(series_id).await?))
            })
            .await
    }

    async fn tag_tree(&self, series_id: u32) -> Result<Arc<TagTree>> {
        let client = Arc::clone(&self.inner.client);
        self.inner
            .tags
            .get_or_create(series_id, move || async move {
                let tags = client.get_tags_for_series(series_id).await?;
                Ok(Arc::new(TagTree::resolve(&tags)))
            })
            .await
    }

    async fn series_configuration(&self, series: &Series) -> Result<SeriesConfiguration> {
        let tree = self.tag_tree(series.id).await?;
        Ok(resolve_configuration(series, &tree, &self.inner.config.snapshot()))
    }

    async fn merge_chain(&self, series: &Series) -> Result<Arc<MergeChain>> {
        let source: Arc<dyn MergeSource> = Arc::new(self.clone());
        self.inner.merge.resolve(source, series).await
    }

    /// Folders holding files that belong to this series alone.
    async fn unique_paths(&self, series_id: u32) -> Result<Arc<HashSet<String>>> {
        let client = Arc::clone(&self.inner.client);
        self.inner
            .unique_paths
            .get_or_create(series_id, move || async move {
                let files = client.get_files_for_series(series_id).await?;
                let folders: HashSet<String> = files
                    .iter()
                    .filter(|f| {
                        f.cross_references.len() == 1 && f.cross_references[0].series_id == series_id
                    })
                    .flat_map(|f| f.locations.iter())
                    .map(|l| paths::parent_dir(&l.relative_path))
                    .collect();
                tracing::debug!("Series {} owns {} folders", series_id, folders.len());
                Ok(Arc::new(folders))
            })
            .await
    }

    async fn file(&self, file_id: u32, series_id: u32) -> Result<Option<Arc<FileInfo>>> {
        let this = self.clone();
        self.inner
            .files
            .get_or_create((file_id, series_id), move || async move {
                match this.inner.client.get_file(file_id).await? {
                    Some(file) => this.build_file_info(file, series_id).await,
                    None => Ok(None),
                }
            })
            .await
    }

    async fn episode(&self, id: Identifier) -> Result<Option<Arc<EpisodeInfo>>> {
        let this = self.clone();
        self.inner
            .episodes
            .get_or_create(id, move || async move { this.build_episode(id).await })
            .await
    }

    async fn season(&self, id: Identifier) -> Result<Option<Arc<SeasonInfo>>> {
        let this = self.clone();
        match id.prefix() {
            IdPrefix::Native => {
                let Some(series) = self.series(id.value()).await? else {
                    return Ok(None);
                };
                let chain = self.merge_chain(&series).await?;
                let key = Identifier::native(chain.primary_id);
                self.inner
                    .seasons
                    .get_or_create(key, move || async move { this.build_native_season(chain).await })
                    .await
            }
            IdPrefix::TmdbShow => {
                self.inner
                    .seasons
                    .get_or_create(id, move || async move { this.build_tmdb_season(id.value()).await })
                    .await
            }
            IdPrefix::TmdbMovie => {
                self.inner
                    .seasons
                    .get_or_create(id, move || async move { this.build_movie_season(id.value()).await })
                    .await
            }
            IdPrefix::TmdbMovieCollection => {
                tracing::debug!("{} names a collection show, not a season", id);
                Ok(None)
            }
        }
    }

    async fn show(&self, key: ShowKey) -> Result<Option<Arc<ShowInfo>>> {
        let this = self.clone();
        self.inner
            .shows
            .get_or_create(key, move || async move { this.build_show(key).await })
            .await
    }

    async fn show_for_season(&self, season: &SeasonInfo) -> Result<Option<Arc<ShowInfo>>> {
        if let Some(key) = self.inner.index.show_of(&season.id) {
            return self.show(key).await;
        }
        let key = self.show_key_for(season);
        self.show(key).await
    }

    fn show_key_for(&self, season: &SeasonInfo) -> ShowKey {
        match &season.source {
            SeasonSource::Series { series, .. } => match season.structure_type {
                StructureType::Shoko => ShowKey::Group(series.top_level_group_id),
                StructureType::AniDb | StructureType::Tmdb => ShowKey::Standalone(season.id),
            },
            SeasonSource::TmdbSeason(tmdb) => ShowKey::TmdbShow(tmdb.show_id),
            SeasonSource::TmdbMovie(movie) => {
                let as_shows = self.inner.config.snapshot().library.collections_as_shows;
                match movie.collection_id {
                    Some(collection_id) if as_shows => ShowKey::TmdbCollection(collection_id),
                    _ => ShowKey::Standalone(season.id),
                }
            }
            SeasonSource::TmdbCollection(collection) => ShowKey::TmdbCollection(collection.id),
        }
    }

    // Builders. These run inside cache factories.

    async fn build_episode(&self, id: Identifier) -> Result<Option<Arc<EpisodeInfo>>> {
        let season_id = match id.prefix() {
            IdPrefix::Native => match self.inner.index.season_of(&id) {
                Some(season_id) => season_id,
                None => match self.inner.client.get_series_for_episode(id.value()).await? {
                    Some(series) => Identifier::native(series.id),
                    None => return Ok(None),
                },
            },
            IdPrefix::TmdbShow => match self.inner.client.get_tmdb_episode(id.value()).await? {
                Some(episode) => Identifier::tmdb_show(episode.season_id),
                None => return Ok(None),
            },
            IdPrefix::TmdbMovie => id,
            IdPrefix::TmdbMovieCollection => return Ok(None),
        };
        Ok(self
            .season(season_id)
            .await?
            .and_then(|season| season.find_episode(&id)))
    }

    async fn build_file_info(&self, file: File, series_id: u32) -> Result<Option<Arc<FileInfo>>> {
        let Some(xref) = file
            .cross_references
            .iter()
            .find(|x| x.series_id == series_id)
            .cloned()
        else {
            tracing::debug!("File {} is not linked to series {}", file.id, series_id);
            return Ok(None);
        };
        let Some(series) = self.series(series_id).await? else {
            return Ok(None);
        };
        let external = self.series_configuration(&series).await?.structure_type == StructureType::Tmdb;

        let mut seen = HashSet::new();
        let mut groups: BTreeMap<(u8, u8, bool), Vec<Arc<EpisodeInfo>>> = BTreeMap::new();
        for link in &xref.episodes {
            let Some(episode) = self.episode(Identifier::native(link.episode_id)).await? else {
                tracing::warn!(
                    "File {} references unknown or hidden episode {}, skipping",
                    file.id,
                    link.episode_id
                );
                continue;
            };

            let resolved = if external {
                let translated = self.translate_episode(&episode, link).await?;
                if translated.is_empty() {
                    tracing::warn!(
                        "File {} episode {} has no external match, skipping",
                        file.id,
                        episode.id
                    );
                    continue;
                }
                translated
            } else {
                vec![episode]
            };

            let part_group = link.percentage.map_or(1, |p| p.group);
            let standalone = link.percentage.map_or(true, |p| p.is_full());
            for episode in resolved {
                if !seen.insert(episode.id) {
                    continue;
                }
                groups
                    .entry((episode.kind.priority(), part_group, !standalone))
                    .or_default()
                    .push(episode);
            }
        }

        let mut ordered = groups.into_values().map(|mut group| {
            group.sort_by_key(|e| (e.season_number, e.episode_number));
            group
        });
        let episodes = ordered.next().unwrap_or_default();
        let alternate_groups: Vec<_> = ordered.collect();
        if !alternate_groups.is_empty() {
            tracing::debug!(
                "File {} touches {} additional episode groups",
                file.id,
                alternate_groups.len()
            );
        }

        Ok(Some(Arc::new(FileInfo {
            id: file.id,
            series_id,
            episodes,
            alternate_groups,
            file,
        })))
    }

    /// External episodes and movies a native episode maps to.
    async fn translate_episode(
        &self,
        episode: &EpisodeInfo,
        link: &EpisodeCrossReference,
    ) -> Result<Vec<Arc<EpisodeInfo>>> {
        let (mut episode_ids, mut movie_ids) = (link.tmdb_episode_ids.clone(), link.tmdb_movie_ids.clone());
        if episode_ids.is_empty() && movie_ids.is_empty() {
            if let EpisodeSource::Native(native) = &episode.source {
                episode_ids = native.tmdb_episode_ids.clone();
                movie_ids = native.tmdb_movie_ids.clone();
            }
        }

        let ids = episode_ids
            .into_iter()
            .map(Identifier::tmdb_show)
            .chain(movie_ids.into_iter().map(Identifier::tmdb_movie));
        let mut translated = Vec::new();
        for id in ids {
            match self.episode(id).await? {
                Some(external) => translated.push(external),
                None => tracing::warn!("Episode {} links to missing {}", episode.id, id),
            }
        }
        Ok(translated)
    }

    async fn build_native_season(&self, chain: Arc<MergeChain>) -> Result<Option<Arc<SeasonInfo>>> {
        let Some(series) = self.series(chain.primary_id).await? else {
            return Ok(None);
        };
        let mut extras = Vec::new();
        for &id in &chain.extra_ids {
            match self.series(id).await? {
                Some(extra) => extras.push(extra),
                None => tracing::warn!("Merged series {} no longer exists", id),
            }
        }

        let config = self.series_configuration(&series).await?;
        let tree = self.tag_tree(series.id).await?;
        let settings = self.inner.config.snapshot();
        let season_id = Identifier::native(series.id);

        let mut episodes = Vec::new();
        let mut specials = Vec::new();
        let mut other = Vec::new();
        let mut external_links = Vec::new();
        let members = std::iter::once(&series).chain(extras.iter());
        for (position, member) in members.enumerate() {
            for id in &member.tmdb_show_ids {
                push_unique(&mut external_links, ExternalLink::Show(*id));
            }
            for id in &member.tmdb_movie_ids {
                push_unique(&mut external_links, ExternalLink::Movie(*id));
            }

            for episode in self.inner.client.get_episodes_in_series(member.id).await? {
                if episode.is_hidden {
                    tracing::trace!("Skipping hidden episode {}", episode.id);
                    continue;
                }
                let kind = EpisodeKind::from(episode.episode_type);
                let info = Arc::new(EpisodeInfo {
                    id: Identifier::native(episode.id),
                    season_id,
                    kind,
                    season_number: if kind == EpisodeKind::Special {
                        0
                    } else {
                        position as u32 + 1
                    },
                    episode_number: episode.number,
                    title: episode.title.clone(),
                    overview: episode.description.clone(),
                    air_date: episode.air_date,
                    source: EpisodeSource::Native(episode),
                });
                match kind {
                    EpisodeKind::Normal => episodes.push((position, info)),
                    EpisodeKind::Special => specials.push((position, info)),
                    EpisodeKind::Other => other.push((position, info)),
                }
            }
        }

        let season = SeasonInfo {
            id: season_id,
            extra_ids: extras.iter().map(|s| Identifier::native(s.id)).collect(),
            title: series.title.clone(),
            structure_type: config.structure_type,
            air_date: series.air_date,
            episodes: sorted_episodes(episodes),
            specials: sorted_episodes(specials),
            extras: sorted_episodes(other),
            external_links,
            genres: tree.genres(settings.tags.min_weight),
            tags: tree.tags(&settings.tags),
            content_rating: tree.content_rating(),
            production_locations: tree.production_locations(),
            configuration: Some(config),
            source: SeasonSource::Series {
                series: series.as_ref().clone(),
                extras: extras.iter().map(|s| s.as_ref().clone()).collect(),
            },
        };
        Ok(Some(self.register_season_episodes(season)))
    }

    async fn build_tmdb_season(&self, season_id: u32) -> Result<Option<Arc<SeasonInfo>>> {
        let Some(tmdb) = self.inner.client.get_tmdb_season(season_id).await? else {
            return Ok(None);
        };
        let id = Identifier::tmdb_show(season_id);
        let mut episodes = Vec::new();
        let mut specials = Vec::new();
        for episode in self.inner.client.get_tmdb_episodes_in_season(season_id).await? {
            let kind = if episode.season_number == 0 {
                EpisodeKind::Special
            } else {
                EpisodeKind::Normal
            };
            let info = Arc::new(EpisodeInfo {
                id: Identifier::tmdb_show(episode.id),
                season_id: id,
                kind,
                season_number: episode.season_number,
                episode_number: episode.episode_number,
                title: episode.title.clone(),
                overview: episode.overview.clone(),
                air_date: episode.aired_at,
                source: EpisodeSource::TmdbEpisode(episode),
            });
            match kind {
                EpisodeKind::Special => specials.push((0, info)),
                _ => episodes.push((0, info)),
            }
        }
        let episodes = sorted_episodes(episodes);
        let specials = sorted_episodes(specials);

        let season = SeasonInfo {
            id,
            extra_ids: Vec::new(),
            title: tmdb.title.clone(),
            structure_type: StructureType::Tmdb,
            configuration: None,
            air_date: episodes.iter().chain(specials.iter()).filter_map(|e| e.air_date).min(),
            episodes,
            specials,
            extras: Vec::new(),
            external_links: vec![ExternalLink::Show(tmdb.show_id)],
            genres: Vec::new(),
            tags: Vec::new(),
            content_rating: None,
            production_locations: Vec::new(),
            source: SeasonSource::TmdbSeason(tmdb),
        };
        Ok(Some(self.register_season_episodes(season)))
    }

    async fn build_movie_season(&self, movie_id: u32) -> Result<Option<Arc<SeasonInfo>>> {
        let Some(movie) = self.inner.client.get_tmdb_movie(movie_id).await? else {
            return Ok(None);
        };
        let id = Identifier::tmdb_movie(movie_id);
        let episode = Arc::new(EpisodeInfo {
            id,
            season_id: id,
            kind: EpisodeKind::Normal,
            season_number: 1,
            episode_number: 1,
            title: movie.title.clone(),
            overview: movie.overview.clone(),
            air_date: movie.released_at,
            source: EpisodeSource::TmdbMovie(movie.clone()),
        });

        let season = SeasonInfo {
            id,
            extra_ids: Vec::new(),
            title: movie.title.clone(),
            structure_type: StructureType::Tmdb,
            configuration: None,
            air_date: movie.released_at,
            episodes: vec![episode],
            specials: Vec::new(),
            extras: Vec::new(),
            external_links: vec![ExternalLink::Movie(movie_id)],
            genres: Vec::new(),
            tags: Vec::new(),
            content_rating: None,
            production_locations: Vec::new(),
            source: SeasonSource::TmdbMovie(movie),
        };
        Ok(Some(self.register_season_episodes(season)))
    }

    fn register_season_episodes(&self, season: SeasonInfo) -> Arc<SeasonInfo> {
        for episode in season.all_episodes() {
            self.inner.index.register_episode(episode.id, season.id);
        }
        Arc::new(season)
    }

    async fn build_show(&self, key: ShowKey) -> Result<Option<Arc<ShowInfo>>> {
        let show = match key {
            ShowKey::Standalone(season_id) => {
                let Some(season) = self.season(season_id).await? else {
                    return Ok(None);
                };
                ShowInfo {
                    key,
                    title: season.title.clone(),
                    default_season_id: season.id,
                    external: season.external_links.first().copied(),
                    seasons: vec![season],
                    source: ShowSource::Standalone,
                }
            }
            ShowKey::Group(group_id) => match self.build_group_show(group_id).await? {
                Some(show) => show,
                None => return Ok(None),
            },
            ShowKey::TmdbShow(show_id) => {
                let Some(tmdb) = self.inner.client.get_tmdb_show(show_id).await? else {
                    return Ok(None);
                };
                let mut seasons = Vec::new();
                for season in self.inner.client.get_tmdb_seasons_in_show(show_id).await? {
                    if let Some(season) = self.season(Identifier::tmdb_show(season.id)).await? {
                        seasons.push(season);
                    }
                }
                seasons.sort_by_key(|s| match &s.source {
                    SeasonSource::TmdbSeason(t) if t.season_number > 0 => (0, t.season_number),
                    SeasonSource::TmdbSeason(t) => (1, t.season_number),
                    _ => (2, 0),
                });
                let Some(default_season_id) = seasons.first().map(|s| s.id) else {
                    return Ok(None);
                };
                ShowInfo {
                    key,
                    title: tmdb.title.clone(),
                    seasons,
                    default_season_id,
                    external: Some(ExternalLink::Show(show_id)),
                    source: ShowSource::TmdbShow(tmdb),
                }
            }
            ShowKey::TmdbCollection(collection_id) => {
                let Some(collection) = self
                    .inner
                    .client
                    .get_tmdb_movie_collection(collection_id)
                    .await?
                else {
                    return Ok(None);
                };
                let mut seasons = Vec::new();
                for movie_id in &collection.movie_ids {
                    if let Some(season) = self.season(Identifier::tmdb_movie(*movie_id)).await? {
                        seasons.push(season);
                    }
                }
                sort_by_air_date(&mut seasons);
                let Some(default_season_id) = seasons.first().map(|s| s.id) else {
                    return Ok(None);
                };
                ShowInfo {
                    key,
                    title: collection.title.clone(),
                    seasons,
                    default_season_id,
                    external: Some(ExternalLink::Collection(collection_id)),
                    source: ShowSource::TmdbCollection(collection),
                }
            }
        };

        for season in &show.seasons {
            self.inner.index.register_season(season.id, show.key);
        }
        tracing::debug!("Built show {} with {} seasons", show.key, show.seasons.len());
        Ok(Some(Arc::new(show)))
    }

    async fn build_group_show(&self, group_id: u32) -> Result<Option<ShowInfo>> {
        let Some(group) = self.inner.client.get_group(group_id).await? else {
            return Ok(None);
        };

        // Walk the group and its subgroups.
        let mut members = Vec::new();
        let mut pending = vec![group_id];
        let mut visited = HashSet::new();
        while let Some(current) = pending.pop() {
            if !visited.insert(current) {
                continue;
            }
            members.extend(self.inner.client.get_series_in_group(current).await?);
            pending.extend(
                self.inner
                    .client
                    .get_groups_in_group(current)
                    .await?
                    .into_iter()
                    .map(|g| g.id),
            );
        }

        let mut seasons: Vec<Arc<SeasonInfo>> = Vec::new();
        for series in members {
            let Some(season) = self.season(Identifier::native(series.id)).await? else {
                continue;
            };
            if season.structure_type != StructureType::Shoko {
                tracing::debug!(
                    "Season {} uses {:?} structure, not listing it in group {}",
                    season.id,
                    season.structure_type,
                    group_id
                );
                continue;
            }
            if !seasons.iter().any(|s| s.id == season.id) {
                seasons.push(season);
            }
        }
        sort_by_air_date(&mut seasons);

        let default_season_id = seasons
            .iter()
            .find(|s| s.series_ids().contains(&group.main_series_id))
            .or_else(|| seasons.first())
            .map(|s| s.id);
        let Some(default_season_id) = default_season_id else {
            tracing::debug!("Group {} has no seasons", group_id);
            return Ok(None);
        };

        let external = self.pick_external(&seasons).await?;
        Ok(Some(ShowInfo {
            key: ShowKey::Group(group_id),
            title: group.title.clone(),
            seasons,
            default_season_id,
            external,
            source: ShowSource::Group(group),
        }))
    }

    /// External show or collection referenced by the most seasons.
    ///
    /// Movies count towards their collection. Each season counts once per
    /// link.
    async fn pick_external(&self, seasons: &[Arc<SeasonInfo>]) -> Result<Option<ExternalLink>> {
        let mut counts: HashMap<ExternalLink, usize> = HashMap::new();
        for season in seasons {
            let mut distinct = HashSet::new();
            for link in &season.external_links {
                match *link {
                    ExternalLink::Show(_) | ExternalLink::Collection(_) => {
                        distinct.insert(*link);
                    }
                    ExternalLink::Movie(movie_id) => {
                        if let Some(movie) = self.inner.client.get_tmdb_movie(movie_id).await? {
                            distinct.extend(movie.collection_id.map(ExternalLink::Collection));
                        }
                    }
                }
            }
            for link in distinct {
                *counts.entry(link).or_default() += 1;
            }
        }
        Ok(most_referenced(&counts))
    }
}

#[async_trait]
impl MergeSource for CatalogResolver {
    async fn series_by_anime_id(&self, anime_id: u32) -> Result<Option<Series>> {
        Ok(self
            .series_by_anime(anime_id)
            .await?
            .map(|s| s.as_ref().clone()))
    }

    async fn relations(&self, series_id: u32) -> Result<Vec<Relation>> {
        Ok(self.relations_of(series_id).await?.as_ref().clone())
    }

    async fn configuration(&self, series: &Series) -> Result<SeriesConfiguration> {
        self.series_configuration(series).await
    }
}

fn push_unique(links: &mut Vec<ExternalLink>, link: ExternalLink) {
    if !links.contains(&link) {
        links.push(link);
    }
}

/// Order episodes by merge position, then number.
fn sorted_episodes(mut episodes: Vec<(usize, Arc<EpisodeInfo>)>) -> Vec<Arc<EpisodeInfo>> {
    episodes.sort_by_key(|(position, e)| (*position, e.season_number, e.episode_number));
    episodes.into_iter().map(|(_, e)| e).collect()
}

/// Order seasons by air date, undated ones last.
fn sort_by_air_date(seasons: &mut [Arc<SeasonInfo>]) {
    seasons.sort_by_key(|s| (s.air_date.is_none(), s.air_date, s.id));
}

/// Key with the highest count; ties go to the lowest key.
fn most_referenced<K: Ord + Copy>(counts: &HashMap<K, usize>) -> Option<K> {
    counts
        .iter()
        .max_by_key(|(key, count)| (**count, std::cmp::Reverse(**key)))
        .map(|(key, _)| *key)
}
