//! Catalogue collaborator interface.
//!
//! The resolver never talks HTTP itself; it goes through this trait so it
//! can be backed by the REST client in [`super::shoko`] or by an in-memory
//! catalogue in tests. Every method is idempotent from the resolver's
//! point of view and may be re-issued after a cache eviction.

use crate::models::catalog::{
    Episode, File, Group, Relation, Series, Tag, TmdbEpisode, TmdbMovie, TmdbMovieCollection,
    TmdbSeason, TmdbShow,
};
use crate::Result;
use async_trait::async_trait;

/// Read access to the remote catalogue.
///
/// Lookups by id return `Ok(None)` when the record does not exist; list
/// lookups return an empty list.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    // Native series
    async fn get_series(&self, series_id: u32) -> Result<Option<Series>>;
    async fn get_series_by_anime_id(&self, anime_id: u32) -> Result<Option<Series>>;
    async fn get_series_for_episode(&self, episode_id: u32) -> Result<Option<Series>>;
    async fn get_episodes_in_series(&self, series_id: u32) -> Result<Vec<Episode>>;
    async fn get_files_for_series(&self, series_id: u32) -> Result<Vec<File>>;
    async fn get_relations_for_series(&self, series_id: u32) -> Result<Vec<Relation>>;
    async fn get_tags_for_series(&self, series_id: u32) -> Result<Vec<Tag>>;

    // Native episodes and files
    async fn get_episode(&self, episode_id: u32) -> Result<Option<Episode>>;
    async fn get_file(&self, file_id: u32) -> Result<Option<File>>;
    /// Files with a location whose relative path ends with `partial_path`.
    async fn get_files_by_path(&self, partial_path: &str) -> Result<Vec<File>>;

    // Native groups
    async fn get_group(&self, group_id: u32) -> Result<Option<Group>>;
    async fn get_groups_in_group(&self, group_id: u32) -> Result<Vec<Group>>;
    async fn get_series_in_group(&self, group_id: u32) -> Result<Vec<Series>>;

    // External shows and movies
    async fn get_tmdb_show(&self, show_id: u32) -> Result<Option<TmdbShow>>;
    async fn get_tmdb_seasons_in_show(&self, show_id: u32) -> Result<Vec<TmdbSeason>>;
    async fn get_tmdb_season(&self, season_id: u32) -> Result<Option<TmdbSeason>>;
    async fn get_tmdb_episodes_in_season(&self, season_id: u32) -> Result<Vec<TmdbEpisode>>;
    async fn get_tmdb_episode(&self, episode_id: u32) -> Result<Option<TmdbEpisode>>;
    async fn get_tmdb_movie(&self, movie_id: u32) -> Result<Option<TmdbMovie>>;
    async fn get_tmdb_movie_collection(&self, collection_id: u32)
        -> Result<Option<TmdbMovieCollection>>;
}
