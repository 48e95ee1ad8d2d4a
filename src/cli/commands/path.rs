//! Path command implementation.

use super::{print_json, print_season, print_show};
use crate::models::config::Config;
use crate::Result;
use colored::Colorize;

/// Resolve a file path and print what it maps to.
pub async fn resolve_path(config: Config, path: &str, json: bool) -> Result<()> {
    let resolver = super::build_resolver(config)?;

    let Some(resolution) = resolver.resolve_by_path(path).await? else {
        println!("{} {}", "Not in catalogue:".yellow(), path);
        return Ok(());
    };

    if json {
        let value = serde_json::json!({
            "file": resolution.file.as_ref(),
            "season": resolution.season.as_deref(),
            "show": resolution.show.as_deref(),
        });
        return print_json(&value);
    }

    let file = &resolution.file;
    println!("{} {} (series {})", "File".bold(), file.id, file.series_id);
    for location in &file.file.locations {
        println!("  {}", location.relative_path.dimmed());
    }
    println!("  Episodes:");
    for episode in &file.episodes {
        super::print_episode(episode);
    }
    if !file.alternate_groups.is_empty() {
        println!(
            "  {} {} other episode group(s) ignored",
            "Note:".yellow(),
            file.alternate_groups.len()
        );
    }
    println!();

    if let Some(season) = &resolution.season {
        print_season(season);
        println!();
    }
    if let Some(show) = &resolution.show {
        print_show(show);
    }

    Ok(())
}
