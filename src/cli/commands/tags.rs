//! Tags command implementation.

use super::not_found;
use crate::core::tags::ResolvedTag;
use crate::models::config::Config;
use crate::Result;
use colored::Colorize;

fn print_tag(tag: &ResolvedTag, depth: usize) {
    let mut line = format!("{}{}", "  ".repeat(depth), tag.name);
    if let Some(weight) = tag.weight {
        line.push_str(&format!(" [{}]", weight));
    }
    if tag.is_spoiler {
        println!("{} {}", line, "(spoiler)".red());
    } else {
        println!("{}", line);
    }
    for child in tag.children.values() {
        print_tag(child, depth + 1);
    }
}

/// Print the resolved tag tree of a series and its projections.
pub async fn show_tags(config: Config, series_id: u32) -> Result<()> {
    let tag_config = config.tags.clone();
    let resolver = super::build_resolver(config)?;

    let series_config = resolver
        .get_series_configuration(series_id)
        .await?
        .ok_or_else(|| not_found("Series", &series_id.to_string()))?;
    let tree = resolver.get_tag_tree(series_id).await?;

    println!("{} {} ({} tags)", "Tags of series".bold(), series_id, tree.len());
    for root in tree.roots().values() {
        print_tag(root, 1);
    }
    println!();

    println!("{}", "Projections".bold());
    println!("  Genres:    {}", tree.genres(tag_config.min_weight).join(", "));
    println!("  Tags:      {}", tree.tags(&tag_config).join(", "));
    println!(
        "  Rating:    {}",
        tree.content_rating()
            .map(|r| r.to_string())
            .unwrap_or_else(|| "-".to_string())
    );
    println!("  Origin:    {}", tree.production_locations().join(", "));
    println!();

    println!("{}", "Configuration".bold());
    println!("  Structure: {:?}", series_config.structure_type);
    println!("  Type:      {:?}", series_config.series_type);
    println!(
        "  Merge:     no merge={} forward={} backward={} main story={}",
        series_config.no_merge,
        series_config.merge_forward,
        series_config.merge_backward,
        series_config.merge_with_main_story
    );

    Ok(())
}
