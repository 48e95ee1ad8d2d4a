//! Season merge walker.
//!
//! Decides which native series are fused into one season. The walk first
//! follows prequel and main-story relations back to the earliest eligible
//! series (the primary), then collects sequels and side stories forward
//! from it using an explicit stack of resumable frames.
//!
//! Results are cached per primary, and every member of a chain is
//! redirected to that entry, so any member resolves the same chain.

use super::cache::{Expiration, IdentityCache};
use crate::models::catalog::{Relation, RelationType, Series};
use crate::models::config::{ConfigHandle, MergeConfig, StructureType};
use crate::models::info::SeriesConfiguration;
use crate::utils::text::{same_base_title, strip_year_suffix};
use crate::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;

/// What the walker needs to know about series.
#[async_trait]
pub trait MergeSource: Send + Sync {
    async fn series_by_anime_id(&self, anime_id: u32) -> Result<Option<Series>>;
    async fn relations(&self, series_id: u32) -> Result<Vec<Relation>>;
    async fn configuration(&self, series: &Series) -> Result<SeriesConfiguration>;
}

/// The native series forming one season.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeChain {
    pub primary_id: u32,
    /// Merged series in visitation order.
    pub extra_ids: Vec<u32>,
}

impl MergeChain {
    pub fn single(series_id: u32) -> Self {
        Self {
            primary_id: series_id,
            extra_ids: Vec::new(),
        }
    }

    pub fn contains(&self, series_id: u32) -> bool {
        self.primary_id == series_id || self.extra_ids.contains(&series_id)
    }

    pub fn is_merged(&self) -> bool {
        !self.extra_ids.is_empty()
    }
}

/// Cached merge walker.
#[derive(Clone)]
pub struct SeasonMergeWalker {
    config: ConfigHandle,
    chains: IdentityCache<u32, Arc<MergeChain>>,
    primaries: Arc<DashMap<u32, u32>>,
}

impl SeasonMergeWalker {
    pub fn new(config: ConfigHandle, expiration: Expiration) -> Self {
        Self {
            config,
            chains: IdentityCache::new("merge", expiration),
            primaries: Arc::new(DashMap::new()),
        }
    }

    /// Primary series a member was last resolved to, without any I/O.
    pub fn primary_of(&self, series_id: u32) -> Option<u32> {
        self.primaries.get(&series_id).map(|p| *p)
    }

    /// Resolve the merge chain containing `series`.
    pub async fn resolve(&self, source: Arc<dyn MergeSource>, series: &Series) -> Result<Arc<MergeChain>> {
        if let Some(chain) = self.primary_of(series.id).and_then(|p| self.chains.get(&p)) {
            if chain.contains(series.id) {
                tracing::trace!("Series {} redirected to chain of {}", series.id, chain.primary_id);
                return Ok(chain);
            }
        }

        let settings = self.config.snapshot().merge.clone();
        let config = source.configuration(series).await?;
        if !is_eligible(series, &config, &settings) {
            return Ok(Arc::new(MergeChain::single(series.id)));
        }

        let (primary, primary_config) =
            find_primary(source.as_ref(), &settings, series.clone(), config).await?;
        if primary.id != series.id {
            tracing::debug!("Series {} merges into primary {}", series.id, primary.id);
        }

        let primaries = Arc::clone(&self.primaries);
        let factory_source = Arc::clone(&source);
        let chain = self
            .chains
            .get_or_create(primary.id, move || async move {
                let extra_ids =
                    collect_extras(factory_source.as_ref(), &settings, primary.clone(), primary_config)
                        .await?;
                let chain = MergeChain {
                    primary_id: primary.id,
                    extra_ids,
                };
                for id in std::iter::once(chain.primary_id).chain(chain.extra_ids.iter().copied()) {
                    primaries.insert(id, chain.primary_id);
                }
                Ok(Arc::new(chain))
            })
            .await?;

        if chain.contains(series.id) {
            Ok(chain)
        } else {
            // Reached the primary backwards but not forwards again.
            tracing::debug!(
                "Series {} is not part of the chain of {}, keeping it separate",
                series.id,
                chain.primary_id
            );
            Ok(Arc::new(MergeChain::single(series.id)))
        }
    }

    pub fn clear(&self) {
        self.chains.clear();
        self.primaries.clear();
    }
}

/// Preconditions a series must meet before it can take part in a merge.
fn is_eligible(series: &Series, config: &SeriesConfiguration, settings: &MergeConfig) -> bool {
    settings.enabled
        && config.structure_type == StructureType::Shoko
        && !config.no_merge
        && settings.mergeable_types.contains(&config.series_type)
        && series.air_date.is_some()
}

/// Whether `later` starts within the day-gap window after `earlier` ends.
fn within_window(earlier: &Series, later_date: NaiveDate, settings: &MergeConfig) -> bool {
    let Some(earlier_end) = earlier.end_date.or(earlier.air_date) else {
        return false;
    };
    later_date.signed_duration_since(earlier_end).num_days() <= settings.max_day_gap
}

fn sorted_relations(relations: Vec<Relation>, kinds: &[RelationType]) -> Vec<Relation> {
    let mut relations: Vec<Relation> = relations
        .into_iter()
        .filter(|r| kinds.contains(&r.relation_type))
        .collect();
    relations.sort_by_key(|r| (r.relation_type, r.related_anime_id));
    relations
}

/// A related series that passed the structural checks.
async fn candidate(
    source: &dyn MergeSource,
    settings: &MergeConfig,
    current: &Series,
    anime_id: u32,
    visited: &HashSet<u32>,
) -> Result<Option<(Series, SeriesConfiguration, NaiveDate)>> {
    let Some(series) = source.series_by_anime_id(anime_id).await? else {
        return Ok(None);
    };
    if visited.contains(&series.id) || series.group_id != current.group_id {
        return Ok(None);
    }
    let config = source.configuration(&series).await?;
    if !is_eligible(&series, &config, settings) {
        return Ok(None);
    }
    match series.air_date {
        Some(date) => Ok(Some((series, config, date))),
        None => Ok(None),
    }
}

/// Follow prequel and main-story links back to the earliest eligible series.
async fn find_primary(
    source: &dyn MergeSource,
    settings: &MergeConfig,
    series: Series,
    config: SeriesConfiguration,
) -> Result<(Series, SeriesConfiguration)> {
    let mut current = series;
    let mut current_config = config;
    let mut anchor_title: Option<String> = None;
    let mut visited = HashSet::from([current.id]);

    loop {
        let Some(current_date) = current.air_date else {
            break;
        };
        let relations = sorted_relations(
            source.relations(current.id).await?,
            &[RelationType::Prequel, RelationType::MainStory],
        );

        let mut next = None;
        for relation in relations {
            let Some((cand, cand_config, cand_date)) =
                candidate(source, settings, &current, relation.related_anime_id, &visited).await?
            else {
                continue;
            };
            if let Some(anchor) = &anchor_title {
                if !same_base_title(anchor, &cand.title) {
                    continue;
                }
            }

            let accepted = match relation.relation_type {
                RelationType::Prequel => {
                    cand_date <= current_date
                        && (current_config.merge_backward
                            || cand_config.merge_forward
                            || within_window(&cand, current_date, settings))
                }
                _ => {
                    if current_config.merge_with_main_story || cand_config.merge_with_main_story {
                        true
                    } else if same_base_title(&current.title, &cand.title) {
                        anchor_title = Some(strip_year_suffix(&cand.title).to_string());
                        true
                    } else {
                        false
                    }
                }
            };
            if accepted {
                next = Some((cand, cand_config));
                break;
            }
        }

        match next {
            Some((cand, cand_config)) => {
                tracing::trace!("Series {} steps back to {}", current.id, cand.id);
                visited.insert(cand.id);
                current = cand;
                current_config = cand_config;
            }
            None => break,
        }
    }

    Ok((current, current_config))
}

/// Resumable position in the forward walk.
struct Frame {
    anchor_title: Option<String>,
    series: Series,
    config: SeriesConfiguration,
    relations: Vec<Relation>,
    offset: usize,
}

impl Frame {
    async fn open(
        source: &dyn MergeSource,
        series: Series,
        config: SeriesConfiguration,
        anchor_title: Option<String>,
    ) -> Result<Self> {
        let relations = sorted_relations(
            source.relations(series.id).await?,
            &[RelationType::Sequel, RelationType::SideStory],
        );
        Ok(Self {
            anchor_title,
            series,
            config,
            relations,
            offset: 0,
        })
    }
}

/// Collect sequels and side stories forward from the primary.
async fn collect_extras(
    source: &dyn MergeSource,
    settings: &MergeConfig,
    primary: Series,
    config: SeriesConfiguration,
) -> Result<Vec<u32>> {
    let mut visited = HashSet::from([primary.id]);
    let mut extras = Vec::new();
    let mut stack = vec![Frame::open(source, primary, config, None).await?];

    'frames: while let Some(mut frame) = stack.pop() {
        let Some(anchor_date) = frame.series.air_date else {
            continue;
        };
        while frame.offset < frame.relations.len() {
            let relation = frame.relations[frame.offset].clone();
            frame.offset += 1;

            let Some((cand, cand_config, cand_date)) =
                candidate(source, settings, &frame.series, relation.related_anime_id, &visited)
                    .await?
            else {
                continue;
            };
            if let Some(anchor) = &frame.anchor_title {
                if !same_base_title(anchor, &cand.title) {
                    continue;
                }
            }

            let mut child_anchor = frame.anchor_title.clone();
            let accepted = match relation.relation_type {
                RelationType::Sequel => {
                    cand_date >= anchor_date
                        && (frame.config.merge_forward
                            || cand_config.merge_backward
                            || within_window(&frame.series, cand_date, settings))
                }
                _ => {
                    if frame.config.merge_forward
                        || cand_config.merge_backward
                        || cand_config.merge_with_main_story
                    {
                        true
                    } else if same_base_title(&frame.series.title, &cand.title) {
                        child_anchor = Some(strip_year_suffix(&cand.title).to_string());
                        true
                    } else {
                        false
                    }
                }
            };
            if !accepted {
                continue;
            }

            tracing::trace!("Series {} merges {} forward", frame.series.id, cand.id);
            visited.insert(cand.id);
            extras.push(cand.id);
            let child = Frame::open(source, cand, cand_config, child_anchor).await?;
            stack.push(frame);
            stack.push(child);
            continue 'frames;
        }
    }

    Ok(extras)
}
