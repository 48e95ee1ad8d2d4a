//! CLI command implementations.

pub mod config;
pub mod path;
pub mod season;
pub mod show;
pub mod tags;

use crate::core::resolver::CatalogResolver;
use crate::models::config::{Config, ConfigHandle};
use crate::models::ids::Identifier;
use crate::models::info::{EpisodeInfo, SeasonInfo, ShowInfo};
use crate::services::library::StaticLibraryIndex;
use crate::services::shoko::ShokoClient;
use crate::{Error, Result};
use colored::Colorize;
use std::sync::Arc;

/// Build a resolver talking to the configured catalogue server.
pub fn build_resolver(config: Config) -> Result<CatalogResolver> {
    let client = ShokoClient::from_server(&config.server)?;
    let library = StaticLibraryIndex::new(&config.library.folders);
    Ok(CatalogResolver::new(
        Arc::new(client),
        Arc::new(library),
        ConfigHandle::new(config),
    ))
}

/// Parse an identifier argument.
pub fn parse_id(input: &str) -> Result<Identifier> {
    input.trim().parse()
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_episode(episode: &EpisodeInfo) {
    println!(
        "    {:<8} S{:02}E{:02} {}",
        episode.id.to_string().dimmed(),
        episode.season_number,
        episode.episode_number,
        episode.title
    );
}

fn print_season(season: &SeasonInfo) {
    println!("{} {} ({})", "Season".bold(), season.title.bold(), season.id);
    println!("  Structure: {:?}", season.structure_type);
    if let Some(date) = season.air_date {
        println!("  Aired:     {}", date);
    }
    if !season.extra_ids.is_empty() {
        let extras: Vec<String> = season.extra_ids.iter().map(|id| id.to_string()).collect();
        println!("  Merged:    {}", extras.join(", "));
    }
    if !season.genres.is_empty() {
        println!("  Genres:    {}", season.genres.join(", "));
    }
    if !season.tags.is_empty() {
        println!("  Tags:      {}", season.tags.join(", "));
    }
    if let Some(rating) = season.content_rating {
        println!("  Rating:    {}", rating);
    }
    if !season.production_locations.is_empty() {
        println!("  Origin:    {}", season.production_locations.join(", "));
    }

    for (label, episodes) in [
        ("Episodes", &season.episodes),
        ("Specials", &season.specials),
        ("Extras", &season.extras),
    ] {
        if episodes.is_empty() {
            continue;
        }
        println!("  {} ({})", label.cyan(), episodes.len());
        for episode in episodes {
            print_episode(episode);
        }
    }
}

fn print_show(show: &ShowInfo) {
    println!("{} {} ({})", "Show".bold(), show.title.bold(), show.key);
    if let Some(external) = show.external {
        println!("  External:  {:?}", external);
    }
    for season in &show.seasons {
        let marker = if season.id == show.default_season_id {
            "*".green().to_string()
        } else {
            " ".to_string()
        };
        println!(
            "  {} {:<8} {} ({} episodes)",
            marker,
            season.id.to_string(),
            season.title,
            season.episodes.len()
        );
    }
}

fn not_found(what: &str, id: &str) -> Error {
    Error::other(format!("{} {} not found", what, id))
}
