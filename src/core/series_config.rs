//! Per-series behaviour resolution.
//!
//! Configuration provides the defaults; override tags under
//! `/custom user tags/overrides` in the series' tag tree take precedence.

use super::tags::{TagTree, OVERRIDE_NAMESPACE};
use crate::models::catalog::{Series, SeriesType};
use crate::models::config::{Config, StructureType};
use crate::models::info::SeriesConfiguration;

/// Resolve the effective configuration of a series.
pub fn resolve_configuration(series: &Series, tree: &TagTree, config: &Config) -> SeriesConfiguration {
    let mut resolved = SeriesConfiguration {
        structure_type: config
            .library
            .structure_override(series.id)
            .unwrap_or(config.library.default_structure),
        series_type: series.series_type,
        no_merge: false,
        merge_forward: false,
        merge_backward: false,
        merge_with_main_story: false,
    };

    let Some(overrides) = tree.get(OVERRIDE_NAMESPACE) else {
        return resolved;
    };

    for tag in overrides.children.values() {
        match tag.name.to_lowercase().as_str() {
            "no merge" => resolved.no_merge = true,
            "merge forward" => resolved.merge_forward = true,
            "merge backward" => resolved.merge_backward = true,
            "merge with main story" => resolved.merge_with_main_story = true,
            "structure" => {
                for value in tag.children.values() {
                    match StructureType::from_name(&value.name) {
                        Some(structure) => resolved.structure_type = structure,
                        None => tracing::warn!(
                            "Series {} has unknown structure override '{}'",
                            series.id,
                            value.name
                        ),
                    }
                }
            }
            "type" => {
                for value in tag.children.values() {
                    match SeriesType::from_name(&value.name) {
                        Some(series_type) => resolved.series_type = series_type,
                        None => tracing::warn!(
                            "Series {} has unknown type override '{}'",
                            series.id,
                            value.name
                        ),
                    }
                }
            }
            other => tracing::warn!("Series {} has unknown override tag '{}'", series.id, other),
        }
    }

    if resolved.no_merge && (resolved.merge_forward || resolved.merge_backward) {
        tracing::warn!(
            "Series {} is tagged both 'no merge' and a merge direction; 'no merge' wins",
            series.id
        );
        resolved.merge_forward = false;
        resolved.merge_backward = false;
        resolved.merge_with_main_story = false;
    }

    resolved
}
