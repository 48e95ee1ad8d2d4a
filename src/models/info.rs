//! Resolved domain objects: files, episodes, seasons and shows.
//!
//! Everything here is built once by the resolver, shared through `Arc`
//! and never mutated afterwards.

use super::catalog::{
    EpisodeType, File, FileLocation, Group, Series, SeriesType, TmdbEpisode, TmdbMovie,
    TmdbMovieCollection, TmdbSeason, TmdbShow,
};
use super::config::StructureType;
use super::ids::Identifier;
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Coarse episode classification used when ranking episode groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum EpisodeKind {
    Normal,
    Special,
    Other,
}

impl EpisodeKind {
    /// Rank used to pick the authoritative episode group of a file.
    /// Lower ranks win.
    pub fn priority(self) -> u8 {
        match self {
            EpisodeKind::Special => 0,
            EpisodeKind::Normal => 1,
            EpisodeKind::Other => 2,
        }
    }
}

impl From<EpisodeType> for EpisodeKind {
    fn from(value: EpisodeType) -> Self {
        match value {
            EpisodeType::Normal => EpisodeKind::Normal,
            EpisodeType::Special => EpisodeKind::Special,
            _ => EpisodeKind::Other,
        }
    }
}

/// Record an episode was built from.
#[derive(Debug, Clone, Serialize)]
pub enum EpisodeSource {
    Native(super::catalog::Episode),
    TmdbEpisode(TmdbEpisode),
    TmdbMovie(TmdbMovie),
}

/// A logical episode.
#[derive(Debug, Clone, Serialize)]
pub struct EpisodeInfo {
    pub id: Identifier,
    /// Season this episode is listed under.
    pub season_id: Identifier,
    pub kind: EpisodeKind,
    /// For native episodes: 1-based position of the owning series in its
    /// merge chain, 0 for specials. For external episodes: the external
    /// season number.
    pub season_number: u32,
    pub episode_number: u32,
    pub title: String,
    pub overview: Option<String>,
    pub air_date: Option<NaiveDate>,
    pub source: EpisodeSource,
}

impl EpisodeInfo {
    /// Native series backing this episode, if any.
    pub fn series_id(&self) -> Option<u32> {
        match &self.source {
            EpisodeSource::Native(episode) => Some(episode.series_id),
            _ => None,
        }
    }
}

/// Link from a season or show to an entity of the external service.
///
/// Ordered shows first, then by id, which settles ties between equally
/// referenced links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ExternalLink {
    Show(u32),
    Movie(u32),
    Collection(u32),
}

/// TV-style content rating derived from tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum ContentRating {
    TvY,
    TvY7,
    TvG,
    TvPg,
    Tv14,
    TvMa,
    Xxx,
}

impl fmt::Display for ContentRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ContentRating::TvY => "TV-Y",
            ContentRating::TvY7 => "TV-Y7",
            ContentRating::TvG => "TV-G",
            ContentRating::TvPg => "TV-PG",
            ContentRating::Tv14 => "TV-14",
            ContentRating::TvMa => "TV-MA",
            ContentRating::Xxx => "XXX",
        };
        f.write_str(label)
    }
}

/// Per-series behaviour resolved from configuration and override tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeriesConfiguration {
    pub structure_type: StructureType,
    /// Effective type, after a type override.
    pub series_type: SeriesType,
    pub no_merge: bool,
    pub merge_forward: bool,
    pub merge_backward: bool,
    pub merge_with_main_story: bool,
}

/// Record a season was built from.
#[derive(Debug, Clone, Serialize)]
pub enum SeasonSource {
    /// A native series plus the series merged into it.
    Series { series: Series, extras: Vec<Series> },
    TmdbSeason(TmdbSeason),
    TmdbMovie(TmdbMovie),
    TmdbCollection(TmdbMovieCollection),
}

/// A season: the unit a show's children are divided into.
#[derive(Debug, Clone, Serialize)]
pub struct SeasonInfo {
    /// For native seasons, the earliest series of the merge chain.
    pub id: Identifier,
    /// Native series merged into this season, in visitation order.
    pub extra_ids: Vec<Identifier>,
    pub title: String,
    pub structure_type: StructureType,
    pub configuration: Option<SeriesConfiguration>,
    pub air_date: Option<NaiveDate>,
    pub episodes: Vec<Arc<EpisodeInfo>>,
    pub specials: Vec<Arc<EpisodeInfo>>,
    pub extras: Vec<Arc<EpisodeInfo>>,
    /// External entities this season is linked to.
    pub external_links: Vec<ExternalLink>,
    pub genres: Vec<String>,
    pub tags: Vec<String>,
    pub content_rating: Option<ContentRating>,
    pub production_locations: Vec<String>,
    pub source: SeasonSource,
}

impl SeasonInfo {
    /// Native series backing this season, primary first.
    pub fn series_ids(&self) -> Vec<u32> {
        match &self.source {
            SeasonSource::Series { series, extras } => std::iter::once(series.id)
                .chain(extras.iter().map(|s| s.id))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// All episodes of the season, regular ones first.
    pub fn all_episodes(&self) -> impl Iterator<Item = &Arc<EpisodeInfo>> {
        self.episodes
            .iter()
            .chain(self.specials.iter())
            .chain(self.extras.iter())
    }

    /// Find an episode of this season by id.
    pub fn find_episode(&self, id: &Identifier) -> Option<Arc<EpisodeInfo>> {
        self.all_episodes().find(|e| &e.id == id).cloned()
    }
}

/// Key a show is registered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ShowKey {
    /// A season shown on its own.
    Standalone(Identifier),
    /// A native group.
    Group(u32),
    /// An external show.
    TmdbShow(u32),
    /// An external movie collection.
    TmdbCollection(u32),
}

impl fmt::Display for ShowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShowKey::Standalone(id) => write!(f, "season:{}", id),
            ShowKey::Group(id) => write!(f, "group:{}", id),
            ShowKey::TmdbShow(id) => write!(f, "show:{}", id),
            ShowKey::TmdbCollection(id) => write!(f, "collection:{}", id),
        }
    }
}

/// Record a show was built from.
#[derive(Debug, Clone, Serialize)]
pub enum ShowSource {
    Standalone,
    Group(Group),
    TmdbShow(TmdbShow),
    TmdbCollection(TmdbMovieCollection),
}

/// The top-level aggregate exposed to callers.
#[derive(Debug, Clone, Serialize)]
pub struct ShowInfo {
    pub key: ShowKey,
    pub title: String,
    /// Seasons ordered by air date.
    pub seasons: Vec<Arc<SeasonInfo>>,
    pub default_season_id: Identifier,
    /// External show or collection best representing the whole show.
    pub external: Option<ExternalLink>,
    pub source: ShowSource,
}

impl ShowInfo {
    pub fn season_ids(&self) -> Vec<Identifier> {
        self.seasons.iter().map(|s| s.id).collect()
    }
}

/// A physical file as seen through one of the series it is linked to.
#[derive(Debug, Clone, Serialize)]
pub struct FileInfo {
    pub id: u32,
    pub series_id: u32,
    /// The authoritative episode list.
    pub episodes: Vec<Arc<EpisodeInfo>>,
    /// Every other episode group the file touches.
    pub alternate_groups: Vec<Vec<Arc<EpisodeInfo>>>,
    pub file: File,
}

impl FileInfo {
    pub fn episode_ids(&self) -> Vec<Identifier> {
        self.episodes.iter().map(|e| e.id).collect()
    }

    /// First location whose relative path ends with the given suffix.
    pub fn location_for(&self, suffix: &str) -> Option<&FileLocation> {
        self.file
            .locations
            .iter()
            .find(|l| crate::utils::paths::ends_with_path(&l.relative_path, suffix))
    }
}
