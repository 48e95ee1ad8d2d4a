//! Shared fixtures for integration tests.
//!
//! `MockCatalog` is an in-memory catalogue that counts every call, so tests
//! can assert when the resolver does or does not reach the server.

#![allow(dead_code)]

use anime_resolver::models::catalog::{
    CrossReference, Episode, EpisodeCrossReference, EpisodeType, File, FileLocation, Group,
    Percentage, Relation, RelationType, Series, SeriesType, Tag, TagSource, TmdbEpisode, TmdbMovie,
    TmdbMovieCollection, TmdbSeason, TmdbShow,
};
use anime_resolver::models::config::{Config, ConfigHandle};
use anime_resolver::core::resolver::CatalogResolver;
use anime_resolver::services::catalog::CatalogClient;
use anime_resolver::services::library::StaticLibraryIndex;
use anime_resolver::utils::paths;
use anime_resolver::{Error, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

pub const LIBRARY_ROOT: &str = "/mnt/anime";

#[derive(Default)]
pub struct MockCatalog {
    pub series: HashMap<u32, Series>,
    pub episodes: HashMap<u32, Episode>,
    pub files: Vec<File>,
    pub relations: HashMap<u32, Vec<Relation>>,
    pub tags: HashMap<u32, Vec<Tag>>,
    pub groups: HashMap<u32, Group>,
    pub tmdb_shows: HashMap<u32, TmdbShow>,
    pub tmdb_seasons: HashMap<u32, TmdbSeason>,
    pub tmdb_episodes: HashMap<u32, TmdbEpisode>,
    pub tmdb_movies: HashMap<u32, TmdbMovie>,
    pub tmdb_collections: HashMap<u32, TmdbMovieCollection>,
    /// Extra files returned for a partial path regardless of locations.
    pub path_overrides: HashMap<String, Vec<u32>>,
    calls: Mutex<HashMap<&'static str, usize>>,
    failures: Mutex<HashMap<&'static str, usize>>,
}

impl MockCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, method: &'static str) -> Result<()> {
        *self.calls.lock().entry(method).or_default() += 1;
        let mut failures = self.failures.lock();
        if let Some(remaining) = failures.get_mut(method) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(Error::Server {
                    status: 503,
                    url: format!("mock://{}", method),
                });
            }
        }
        Ok(())
    }

    /// Make the next `times` calls to `method` fail.
    pub fn fail(&self, method: &'static str, times: usize) {
        self.failures.lock().insert(method, times);
    }

    pub fn calls(&self, method: &str) -> usize {
        self.calls.lock().get(method).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().values().sum()
    }

    // Fixture builders

    pub fn add_group(&mut self, id: u32, main_series_id: u32, title: &str) {
        self.groups.insert(
            id,
            Group {
                id,
                parent_id: None,
                main_series_id,
                title: title.to_string(),
                size: 0,
            },
        );
    }

    pub fn add_series(&mut self, id: u32, group_id: u32, title: &str, air_date: Option<NaiveDate>) -> &mut Series {
        self.series.entry(id).or_insert(Series {
            id,
            anime_id: id + 10_000,
            group_id,
            top_level_group_id: group_id,
            title: title.to_string(),
            series_type: SeriesType::Tv,
            air_date,
            end_date: None,
            description: None,
            tmdb_show_ids: Vec::new(),
            tmdb_movie_ids: Vec::new(),
        })
    }

    pub fn add_episode(&mut self, id: u32, series_id: u32, number: u32, episode_type: EpisodeType) -> &mut Episode {
        self.episodes.entry(id).or_insert(Episode {
            id,
            series_id,
            episode_type,
            number,
            title: format!("Episode {}", number),
            description: None,
            air_date: None,
            is_hidden: false,
            tmdb_episode_ids: Vec::new(),
            tmdb_movie_ids: Vec::new(),
        })
    }

    /// Add a file at `relative_path` linked to `(series, episodes)` pairs.
    pub fn add_file(&mut self, id: u32, relative_path: &str, links: &[(u32, &[u32])]) -> &mut File {
        let cross_references = links
            .iter()
            .map(|(series_id, episodes)| CrossReference {
                series_id: *series_id,
                episodes: episodes
                    .iter()
                    .map(|episode_id| EpisodeCrossReference {
                        episode_id: *episode_id,
                        percentage: None,
                        tmdb_episode_ids: Vec::new(),
                        tmdb_movie_ids: Vec::new(),
                    })
                    .collect(),
            })
            .collect();
        self.files.push(File {
            id,
            size: 1024,
            locations: vec![FileLocation {
                import_folder_id: 1,
                relative_path: relative_path.to_string(),
            }],
            cross_references,
        });
        self.files.last_mut().expect("just pushed")
    }

    /// Set the part a file plays in one of its linked episodes.
    pub fn set_percentage(&mut self, file_id: u32, episode_id: u32, percentage: Percentage) {
        let link = self
            .files
            .iter_mut()
            .filter(|f| f.id == file_id)
            .flat_map(|f| f.cross_references.iter_mut())
            .flat_map(|x| x.episodes.iter_mut())
            .find(|e| e.episode_id == episode_id)
            .expect("linked episode");
        link.percentage = Some(percentage);
    }

    pub fn add_tmdb_movie(&mut self, id: u32, collection_id: Option<u32>, title: &str, released_at: Option<NaiveDate>) {
        self.tmdb_movies.insert(
            id,
            TmdbMovie {
                id,
                collection_id,
                title: title.to_string(),
                overview: None,
                released_at,
            },
        );
    }

    /// Link two series as prequel and sequel.
    pub fn add_sequel(&mut self, earlier: u32, later: u32) {
        self.add_relation(earlier, later, RelationType::Sequel);
        self.add_relation(later, earlier, RelationType::Prequel);
    }

    pub fn add_relation(&mut self, from: u32, to: u32, relation_type: RelationType) {
        let related_anime_id = self.series[&to].anime_id;
        self.relations.entry(from).or_default().push(Relation {
            related_anime_id,
            relation_type,
        });
    }

    pub fn add_user_tag(&mut self, series_id: u32, id: u32, name: &str) {
        self.tags.entry(series_id).or_default().push(tag(id, None, name, TagSource::User));
    }
}

pub fn tag(id: u32, parent_id: Option<u32>, name: &str, source: TagSource) -> Tag {
    Tag {
        id,
        parent_id,
        name: name.to_string(),
        description: None,
        weight: None,
        is_verified: None,
        is_spoiler: false,
        source,
    }
}

pub fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d)
}

/// Configuration with the test library root.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.library.folders = vec![LIBRARY_ROOT.to_string()];
    config
}

pub fn resolver_with(catalog: Arc<MockCatalog>, config: Config) -> CatalogResolver {
    let library = StaticLibraryIndex::new(&config.library.folders);
    resolver_with_library(catalog, config, library)
}

/// Resolver whose host library differs from the configured media roots.
pub fn resolver_with_library(
    catalog: Arc<MockCatalog>,
    config: Config,
    library: StaticLibraryIndex,
) -> CatalogResolver {
    CatalogResolver::new(catalog, Arc::new(library), ConfigHandle::new(config))
}

pub fn library_path(relative: &str) -> String {
    format!("{}/{}", LIBRARY_ROOT, relative)
}

#[async_trait]
impl CatalogClient for MockCatalog {
    async fn get_series(&self, series_id: u32) -> Result<Option<Series>> {
        self.record("get_series")?;
        Ok(self.series.get(&series_id).cloned())
    }

    async fn get_series_by_anime_id(&self, anime_id: u32) -> Result<Option<Series>> {
        self.record("get_series_by_anime_id")?;
        Ok(self.series.values().find(|s| s.anime_id == anime_id).cloned())
    }

    async fn get_series_for_episode(&self, episode_id: u32) -> Result<Option<Series>> {
        self.record("get_series_for_episode")?;
        Ok(self
            .episodes
            .get(&episode_id)
            .and_then(|e| self.series.get(&e.series_id))
            .cloned())
    }

    async fn get_episodes_in_series(&self, series_id: u32) -> Result<Vec<Episode>> {
        self.record("get_episodes_in_series")?;
        let mut episodes: Vec<Episode> = self
            .episodes
            .values()
            .filter(|e| e.series_id == series_id)
            .cloned()
            .collect();
        episodes.sort_by_key(|e| e.id);
        Ok(episodes)
    }

    async fn get_files_for_series(&self, series_id: u32) -> Result<Vec<File>> {
        self.record("get_files_for_series")?;
        Ok(self
            .files
            .iter()
            .filter(|f| f.cross_references.iter().any(|x| x.series_id == series_id))
            .cloned()
            .collect())
    }

    async fn get_relations_for_series(&self, series_id: u32) -> Result<Vec<Relation>> {
        self.record("get_relations_for_series")?;
        Ok(self.relations.get(&series_id).cloned().unwrap_or_default())
    }

    async fn get_tags_for_series(&self, series_id: u32) -> Result<Vec<Tag>> {
        self.record("get_tags_for_series")?;
        Ok(self.tags.get(&series_id).cloned().unwrap_or_default())
    }

    async fn get_episode(&self, episode_id: u32) -> Result<Option<Episode>> {
        self.record("get_episode")?;
        Ok(self.episodes.get(&episode_id).cloned())
    }

    async fn get_file(&self, file_id: u32) -> Result<Option<File>> {
        self.record("get_file")?;
        Ok(self.files.iter().find(|f| f.id == file_id).cloned())
    }

    async fn get_files_by_path(&self, partial_path: &str) -> Result<Vec<File>> {
        self.record("get_files_by_path")?;
        let forced = self.path_overrides.get(partial_path).cloned().unwrap_or_default();
        Ok(self
            .files
            .iter()
            .filter(|f| {
                forced.contains(&f.id)
                    || f.locations
                        .iter()
                        .any(|l| paths::ends_with_path(&l.relative_path, partial_path))
            })
            .cloned()
            .collect())
    }

    async fn get_group(&self, group_id: u32) -> Result<Option<Group>> {
        self.record("get_group")?;
        Ok(self.groups.get(&group_id).cloned())
    }

    async fn get_groups_in_group(&self, group_id: u32) -> Result<Vec<Group>> {
        self.record("get_groups_in_group")?;
        Ok(self
            .groups
            .values()
            .filter(|g| g.parent_id == Some(group_id))
            .cloned()
            .collect())
    }

    async fn get_series_in_group(&self, group_id: u32) -> Result<Vec<Series>> {
        self.record("get_series_in_group")?;
        let mut series: Vec<Series> = self
            .series
            .values()
            .filter(|s| s.group_id == group_id)
            .cloned()
            .collect();
        series.sort_by_key(|s| s.id);
        Ok(series)
    }

    async fn get_tmdb_show(&self, show_id: u32) -> Result<Option<TmdbShow>> {
        self.record("get_tmdb_show")?;
        Ok(self.tmdb_shows.get(&show_id).cloned())
    }

    async fn get_tmdb_seasons_in_show(&self, show_id: u32) -> Result<Vec<TmdbSeason>> {
        self.record("get_tmdb_seasons_in_show")?;
        Ok(self
            .tmdb_seasons
            .values()
            .filter(|s| s.show_id == show_id)
            .cloned()
            .collect())
    }

    async fn get_tmdb_season(&self, season_id: u32) -> Result<Option<TmdbSeason>> {
        self.record("get_tmdb_season")?;
        Ok(self.tmdb_seasons.get(&season_id).cloned())
    }

    async fn get_tmdb_episodes_in_season(&self, season_id: u32) -> Result<Vec<TmdbEpisode>> {
        self.record("get_tmdb_episodes_in_season")?;
        Ok(self
            .tmdb_episodes
            .values()
            .filter(|e| e.season_id == season_id)
            .cloned()
            .collect())
    }

    async fn get_tmdb_episode(&self, episode_id: u32) -> Result<Option<TmdbEpisode>> {
        self.record("get_tmdb_episode")?;
        Ok(self.tmdb_episodes.get(&episode_id).cloned())
    }

    async fn get_tmdb_movie(&self, movie_id: u32) -> Result<Option<TmdbMovie>> {
        self.record("get_tmdb_movie")?;
        Ok(self.tmdb_movies.get(&movie_id).cloned())
    }

    async fn get_tmdb_movie_collection(
        &self,
        collection_id: u32,
    ) -> Result<Option<TmdbMovieCollection>> {
        self.record("get_tmdb_movie_collection")?;
        Ok(self.tmdb_collections.get(&collection_id).cloned())
    }
}
