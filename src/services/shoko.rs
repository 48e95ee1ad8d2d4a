//! Catalogue server REST client.

use super::catalog::CatalogClient;
use crate::models::catalog::{
    Episode, File, Group, Relation, Series, Tag, TmdbEpisode, TmdbMovie, TmdbMovieCollection,
    TmdbSeason, TmdbShow,
};
use crate::models::config::ServerConfig;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;

const API_PREFIX: &str = "api/v3";

/// Catalogue client configuration.
#[derive(Debug, Clone)]
pub struct ShokoConfig {
    pub base_url: String,
    pub api_key: String,
}

impl ShokoConfig {
    /// Build from the server section of the configuration.
    pub fn from_server(server: &ServerConfig) -> Result<Self> {
        let api_key = server
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or(Error::ApiKeyMissing)?;
        if server.url.trim().is_empty() {
            return Err(Error::Config("server.url is empty".to_string()));
        }
        Ok(Self {
            base_url: server.url.trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

/// Paged list wrapper used by list endpoints.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListResult<T> {
    #[allow(dead_code)]
    total: u64,
    list: Vec<T>,
}

/// Server version info.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServerVersion {
    pub version: String,
}

/// Catalogue API client.
pub struct ShokoClient {
    config: ShokoConfig,
    client: reqwest::Client,
}

impl ShokoClient {
    /// Create a new catalogue client.
    pub fn new(config: ShokoConfig) -> Self {
        let client = reqwest::Client::new();
        Self { config, client }
    }

    /// Create a new client from the server configuration.
    pub fn from_server(server: &ServerConfig) -> Result<Self> {
        Ok(Self::new(ShokoConfig::from_server(server)?))
    }

    /// Build a request with proper authentication.
    fn build_request(&self, url: &str) -> reqwest::RequestBuilder {
        self.client.get(url).header("apikey", &self.config.api_key)
    }

    /// Build URL for an API path.
    fn build_url(&self, path: &str, query: &str) -> String {
        if query.is_empty() {
            format!("{}/{}/{}", self.config.base_url, API_PREFIX, path)
        } else {
            format!("{}/{}/{}?{}", self.config.base_url, API_PREFIX, path, query)
        }
    }

    /// GET a JSON document, mapping 404 to `None`.
    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &str) -> Result<Option<T>> {
        let url = self.build_url(path, query);
        tracing::trace!("GET {}", url);
        let resp = self.build_request(&url).send().await?;
        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(Error::Server {
                status: status.as_u16(),
                url,
            });
        }
        Ok(Some(resp.json().await?))
    }

    async fn get_list<T: DeserializeOwned>(&self, path: &str, query: &str) -> Result<Vec<T>> {
        Ok(self.get_json(path, query).await?.unwrap_or_default())
    }

    async fn get_paged<T: DeserializeOwned>(&self, path: &str, query: &str) -> Result<Vec<T>> {
        let paged: Option<ListResult<T>> = self.get_json(path, query).await?;
        Ok(paged.map(|p| p.list).unwrap_or_default())
    }

    /// Check that the server is reachable and accepts the API key.
    pub async fn ping(&self) -> Result<ServerVersion> {
        self.get_json("Init/Version", "")
            .await?
            .ok_or_else(|| Error::other("Server did not report a version"))
    }
}

#[async_trait]
impl CatalogClient for ShokoClient {
    async fn get_series(&self, series_id: u32) -> Result<Option<Series>> {
        self.get_json(&format!("Series/{}", series_id), "").await
    }

    async fn get_series_by_anime_id(&self, anime_id: u32) -> Result<Option<Series>> {
        self.get_json(&format!("Series/AniDB/{}/Series", anime_id), "")
            .await
    }

    async fn get_series_for_episode(&self, episode_id: u32) -> Result<Option<Series>> {
        match self.get_episode(episode_id).await? {
            Some(episode) => self.get_series(episode.series_id).await,
            None => Ok(None),
        }
    }

    async fn get_episodes_in_series(&self, series_id: u32) -> Result<Vec<Episode>> {
        self.get_paged(
            &format!("Series/{}/Episode", series_id),
            "pageSize=0&includeHidden=true",
        )
        .await
    }

    async fn get_files_for_series(&self, series_id: u32) -> Result<Vec<File>> {
        self.get_paged(
            &format!("Series/{}/File", series_id),
            "pageSize=0&include=XRefs",
        )
        .await
    }

    async fn get_relations_for_series(&self, series_id: u32) -> Result<Vec<Relation>> {
        self.get_list(&format!("Series/{}/AniDB/Relations", series_id), "")
            .await
    }

    async fn get_tags_for_series(&self, series_id: u32) -> Result<Vec<Tag>> {
        self.get_list(
            &format!("Series/{}/Tags", series_id),
            "filter=0&excludeDescriptions=false",
        )
        .await
    }

    async fn get_episode(&self, episode_id: u32) -> Result<Option<Episode>> {
        self.get_json(&format!("Episode/{}", episode_id), "").await
    }

    async fn get_file(&self, file_id: u32) -> Result<Option<File>> {
        self.get_json(&format!("File/{}", file_id), "include=XRefs")
            .await
    }

    async fn get_files_by_path(&self, partial_path: &str) -> Result<Vec<File>> {
        self.get_list(
            "File/PathEndsWith",
            &format!("path={}&limit=0", urlencoding::encode(partial_path)),
        )
        .await
    }

    async fn get_group(&self, group_id: u32) -> Result<Option<Group>> {
        self.get_json(&format!("Group/{}", group_id), "").await
    }

    async fn get_groups_in_group(&self, group_id: u32) -> Result<Vec<Group>> {
        self.get_list(&format!("Group/{}/Group", group_id), "").await
    }

    async fn get_series_in_group(&self, group_id: u32) -> Result<Vec<Series>> {
        self.get_list(&format!("Group/{}/Series", group_id), "recursive=false")
            .await
    }

    async fn get_tmdb_show(&self, show_id: u32) -> Result<Option<TmdbShow>> {
        self.get_json(&format!("TMDB/Show/{}", show_id), "").await
    }

    async fn get_tmdb_seasons_in_show(&self, show_id: u32) -> Result<Vec<TmdbSeason>> {
        self.get_paged(&format!("TMDB/Show/{}/Season", show_id), "pageSize=0")
            .await
    }

    async fn get_tmdb_season(&self, season_id: u32) -> Result<Option<TmdbSeason>> {
        self.get_json(&format!("TMDB/Season/{}", season_id), "").await
    }

    async fn get_tmdb_episodes_in_season(&self, season_id: u32) -> Result<Vec<TmdbEpisode>> {
        self.get_paged(&format!("TMDB/Season/{}/Episode", season_id), "pageSize=0")
            .await
    }

    async fn get_tmdb_episode(&self, episode_id: u32) -> Result<Option<TmdbEpisode>> {
        self.get_json(&format!("TMDB/Episode/{}", episode_id), "").await
    }

    async fn get_tmdb_movie(&self, movie_id: u32) -> Result<Option<TmdbMovie>> {
        self.get_json(&format!("TMDB/Movie/{}", movie_id), "").await
    }

    async fn get_tmdb_movie_collection(
        &self,
        collection_id: u32,
    ) -> Result<Option<TmdbMovieCollection>> {
        self.get_json(&format!("TMDB/Movie/Collection/{}", collection_id), "")
            .await
    }
}
