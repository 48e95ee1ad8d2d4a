//! Season command implementation.

use super::{not_found, parse_id, print_json, print_season};
use crate::models::config::Config;
use crate::Result;

/// Resolve a season and print its merge chain and episodes.
pub async fn show_season(config: Config, id: &str, json: bool) -> Result<()> {
    let id = parse_id(id)?;
    let resolver = super::build_resolver(config)?;

    let season = resolver
        .get_season(&id)
        .await?
        .ok_or_else(|| not_found("Season", &id.to_string()))?;

    if json {
        return print_json(season.as_ref());
    }
    if season.id != id {
        println!("{} is merged into season {}", id, season.id);
        println!();
    }
    print_season(&season);
    Ok(())
}
