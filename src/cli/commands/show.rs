//! Show command implementation.

use super::{not_found, parse_id, print_json, print_show};
use crate::models::config::Config;
use crate::Result;

/// Resolve the show a season belongs to.
pub async fn show_show(config: Config, season_id: &str, json: bool) -> Result<()> {
    let season_id = parse_id(season_id)?;
    let resolver = super::build_resolver(config)?;

    let show = resolver
        .get_show_by_season_id(&season_id)
        .await?
        .ok_or_else(|| not_found("Show for season", &season_id.to_string()))?;

    if json {
        return print_json(show.as_ref());
    }
    print_show(&show);
    Ok(())
}
