//! Raw records returned by the catalogue server.
//!
//! These mirror what the remote backend hands out for series, episodes,
//! files, groups, relations and tags, plus the records of the secondary
//! movie/TV metadata service it links to.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Kind of anime series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeriesType {
    #[serde(rename = "TV")]
    Tv,
    #[serde(rename = "TVSpecial")]
    TvSpecial,
    #[serde(rename = "OVA")]
    Ova,
    Movie,
    Web,
    MusicVideo,
    Other,
    #[serde(other)]
    Unknown,
}

impl SeriesType {
    /// Parse a lowercase type name as used in override tags and config.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().replace([' ', '-', '_'], "").as_str() {
            "tv" => Some(SeriesType::Tv),
            "tvspecial" => Some(SeriesType::TvSpecial),
            "ova" => Some(SeriesType::Ova),
            "movie" => Some(SeriesType::Movie),
            "web" => Some(SeriesType::Web),
            "musicvideo" => Some(SeriesType::MusicVideo),
            "other" => Some(SeriesType::Other),
            "unknown" => Some(SeriesType::Unknown),
            _ => None,
        }
    }
}

/// Kind of episode as recorded in the catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EpisodeType {
    Normal,
    Special,
    ThemeSong,
    Trailer,
    Parody,
    Other,
    #[serde(other)]
    Unknown,
}

/// A native series.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Series {
    pub id: u32,
    /// External anime id, the key used by relations.
    pub anime_id: u32,
    /// Direct parent group.
    pub group_id: u32,
    pub top_level_group_id: u32,
    pub title: String,
    #[serde(rename = "Type")]
    pub series_type: SeriesType,
    pub air_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub description: Option<String>,
    /// Linked external show ids.
    #[serde(default)]
    pub tmdb_show_ids: Vec<u32>,
    /// Linked external movie ids.
    #[serde(default)]
    pub tmdb_movie_ids: Vec<u32>,
}

/// A native episode.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Episode {
    pub id: u32,
    pub series_id: u32,
    #[serde(rename = "Type")]
    pub episode_type: EpisodeType,
    pub number: u32,
    pub title: String,
    pub description: Option<String>,
    pub air_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_hidden: bool,
    #[serde(default)]
    pub tmdb_episode_ids: Vec<u32>,
    #[serde(default)]
    pub tmdb_movie_ids: Vec<u32>,
}

/// Where a file lives on disk, relative to an import folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FileLocation {
    pub import_folder_id: u32,
    pub relative_path: String,
}

/// How much of an episode a file covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Percentage {
    pub start: u8,
    pub end: u8,
    /// Files split across multiple parts share a group number.
    pub group: u8,
}

impl Percentage {
    /// Whether the file covers the whole episode on its own.
    pub fn is_full(&self) -> bool {
        self.start == 0 && self.end >= 100
    }
}

/// One episode a file is linked to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EpisodeCrossReference {
    pub episode_id: u32,
    pub percentage: Option<Percentage>,
    #[serde(default)]
    pub tmdb_episode_ids: Vec<u32>,
    #[serde(default)]
    pub tmdb_movie_ids: Vec<u32>,
}

/// All episodes of one series a file is linked to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CrossReference {
    pub series_id: u32,
    pub episodes: Vec<EpisodeCrossReference>,
}

/// A physical media file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct File {
    pub id: u32,
    pub size: u64,
    pub locations: Vec<FileLocation>,
    pub cross_references: Vec<CrossReference>,
}

/// Relation between two anime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RelationType {
    Prequel,
    Sequel,
    MainStory,
    SideStory,
    FullStory,
    Summary,
    AlternativeSetting,
    AlternativeVersion,
    SameSetting,
    Character,
    Other,
}

/// A relation from a series to another anime.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Relation {
    pub related_anime_id: u32,
    #[serde(rename = "Type")]
    pub relation_type: RelationType,
}

/// Where a tag came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TagSource {
    /// Anime database tags, organised by parent pointers.
    AniDb,
    /// User tags, organised by slash-delimited names.
    User,
}

/// A flat tag record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Tag {
    pub id: u32,
    pub parent_id: Option<u32>,
    pub name: String,
    pub description: Option<String>,
    pub weight: Option<u8>,
    pub is_verified: Option<bool>,
    #[serde(default)]
    pub is_spoiler: bool,
    pub source: TagSource,
}

/// A native group of series.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Group {
    pub id: u32,
    pub parent_id: Option<u32>,
    pub main_series_id: u32,
    pub title: String,
    pub size: u32,
}

/// External show.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TmdbShow {
    pub id: u32,
    pub title: String,
    pub overview: Option<String>,
    pub first_aired_at: Option<NaiveDate>,
}

/// External show season.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TmdbSeason {
    pub id: u32,
    pub show_id: u32,
    pub season_number: u32,
    pub title: String,
    pub overview: Option<String>,
}

/// External show episode.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TmdbEpisode {
    pub id: u32,
    pub show_id: u32,
    pub season_id: u32,
    pub season_number: u32,
    pub episode_number: u32,
    pub title: String,
    pub overview: Option<String>,
    pub aired_at: Option<NaiveDate>,
}

/// External movie.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TmdbMovie {
    pub id: u32,
    pub collection_id: Option<u32>,
    pub title: String,
    pub overview: Option<String>,
    pub released_at: Option<NaiveDate>,
}

/// External movie collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TmdbMovieCollection {
    pub id: u32,
    pub title: String,
    pub overview: Option<String>,
    pub movie_ids: Vec<u32>,
}
