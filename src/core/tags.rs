//! Tag hierarchy builder.
//!
//! Turns the flat tag list of a series into a tree. Anime database tags
//! point at their parent by id; user tags encode their position in a
//! slash-delimited name. Both kinds end up in one tree keyed by
//! case-insensitive full names such as `/elements/time travel`.
//!
//! Building happens in an arena of mutable nodes; once every node is
//! placed the arena is frozen bottom-up into shared [`ResolvedTag`]s.

use crate::models::catalog::{Tag, TagSource};
use crate::models::config::TagConfig;
use crate::models::info::ContentRating;
use crate::utils::text::origin_to_country;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

/// Namespace user tags without a leading `/` are placed under.
pub const USER_TAG_ROOT: &str = "custom user tags";

/// Namespace holding per-series override tags.
pub const OVERRIDE_NAMESPACE: &str = "/custom user tags/overrides";

/// A node of the resolved tag tree.
#[derive(Debug, Clone)]
pub struct ResolvedTag {
    pub id: u32,
    pub name: String,
    /// Full path of this tag, e.g. `/elements/time travel`.
    pub full_name: String,
    /// Full path of the parent, `/` for top-level tags.
    pub namespace: String,
    pub description: Option<String>,
    pub weight: Option<u8>,
    pub is_verified: Option<bool>,
    pub is_spoiler: bool,
    pub source: TagSource,
    /// Direct children keyed by lowercase name.
    pub children: BTreeMap<String, Arc<ResolvedTag>>,
    /// Every descendant keyed by its lowercase path relative to this node,
    /// e.g. `/y/z`.
    pub recursive_namespaced_children: BTreeMap<String, Arc<ResolvedTag>>,
}

impl ResolvedTag {
    /// Direct child by name, case-insensitive.
    pub fn child(&self, name: &str) -> Option<&Arc<ResolvedTag>> {
        self.children.get(&name.to_lowercase())
    }

    /// Descendant by relative path such as `/y/z`, case-insensitive.
    pub fn descendant(&self, path: &str) -> Option<&Arc<ResolvedTag>> {
        let key = if path.starts_with('/') {
            path.to_lowercase()
        } else {
            format!("/{}", path.to_lowercase())
        };
        self.recursive_namespaced_children.get(&key)
    }

    fn passes_weight(&self, min_weight: u8) -> bool {
        self.weight.map_or(true, |w| w >= min_weight)
    }
}

#[derive(Debug, Clone)]
struct Node {
    id: u32,
    name: String,
    description: Option<String>,
    weight: Option<u8>,
    is_verified: Option<bool>,
    is_spoiler: bool,
    source: TagSource,
    synthetic: bool,
    parent: Option<usize>,
    children: Vec<usize>,
    removed: bool,
}

impl Node {
    fn from_tag(tag: &Tag) -> Self {
        Self {
            id: tag.id,
            name: tag.name.trim().to_string(),
            description: tag.description.clone(),
            weight: tag.weight,
            is_verified: tag.is_verified,
            is_spoiler: tag.is_spoiler,
            source: tag.source,
            synthetic: false,
            parent: None,
            children: Vec::new(),
            removed: false,
        }
    }

    fn synthetic(id: u32, name: &str, source: TagSource) -> Self {
        Self {
            id,
            name: name.to_string(),
            description: None,
            weight: None,
            is_verified: None,
            is_spoiler: false,
            source,
            synthetic: true,
            parent: None,
            children: Vec::new(),
            removed: false,
        }
    }

    /// Take over the descriptive fields of a real record.
    fn absorb(&mut self, other: &Node) {
        if self.synthetic {
            self.id = other.id;
            self.synthetic = other.synthetic;
        }
        self.description = self.description.take().or_else(|| other.description.clone());
        self.weight = self.weight.or(other.weight);
        self.is_verified = self.is_verified.or(other.is_verified);
        self.is_spoiler |= other.is_spoiler;
    }
}

#[derive(Default)]
struct Arena {
    nodes: Vec<Node>,
    roots: Vec<usize>,
    next_synthetic_id: u32,
}

impl Arena {
    fn push(&mut self, node: Node, parent: Option<usize>) -> usize {
        let idx = self.nodes.len();
        self.nodes.push(Node { parent, ..node });
        match parent {
            Some(p) => self.nodes[p].children.push(idx),
            None => self.roots.push(idx),
        }
        idx
    }

    fn synthetic_id(&mut self) -> u32 {
        let id = self.next_synthetic_id;
        self.next_synthetic_id += 1;
        id
    }

    fn find_child(&self, parent: Option<usize>, name: &str) -> Option<usize> {
        let candidates = match parent {
            Some(p) => &self.nodes[p].children,
            None => &self.roots,
        };
        candidates
            .iter()
            .copied()
            .find(|&idx| !self.nodes[idx].removed && same_name(&self.nodes[idx].name, name))
    }

    fn full_name(&self, idx: usize) -> String {
        let mut parts = Vec::new();
        let mut current = Some(idx);
        while let Some(i) = current {
            parts.push(self.nodes[i].name.as_str());
            current = self.nodes[i].parent;
        }
        parts.reverse();
        format!("/{}", parts.join("/"))
    }

    fn depth(&self, idx: usize) -> usize {
        let mut depth = 0;
        let mut current = self.nodes[idx].parent;
        while let Some(i) = current {
            depth += 1;
            current = self.nodes[i].parent;
        }
        depth
    }

    fn detach(&mut self, idx: usize) {
        match self.nodes[idx].parent {
            Some(p) => self.nodes[p].children.retain(|&c| c != idx),
            None => self.roots.retain(|&r| r != idx),
        }
    }

    fn reparent(&mut self, idx: usize, new_parent: usize) {
        self.detach(idx);
        self.nodes[idx].parent = Some(new_parent);
        self.nodes[new_parent].children.push(idx);
    }
}

/// A resolved tag tree.
#[derive(Debug, Clone, Default)]
pub struct TagTree {
    roots: BTreeMap<String, Arc<ResolvedTag>>,
    by_full_name: HashMap<String, Arc<ResolvedTag>>,
}

impl TagTree {
    /// Build a tree from a flat tag list.
    pub fn resolve(tags: &[Tag]) -> Self {
        let mut arena = Arena {
            next_synthetic_id: tags.iter().map(|t| t.id).max().map_or(1, |m| m.saturating_add(1)),
            ..Arena::default()
        };

        let (pointer_tags, slash_tags): (Vec<&Tag>, Vec<&Tag>) =
            tags.iter().partition(|t| t.source == TagSource::AniDb);

        place_pointer_tags(&mut arena, &pointer_tags);
        place_slash_tags(&mut arena, &slash_tags);
        rehome_duplicates(&mut arena);

        freeze(&arena)
    }

    /// Tag by full name such as `/elements/time travel`, case-insensitive.
    pub fn get(&self, full_name: &str) -> Option<&Arc<ResolvedTag>> {
        let key = crate::utils::paths::rooted(full_name.trim()).to_lowercase();
        self.by_full_name.get(&key)
    }

    /// Top-level tags keyed by lowercase name.
    pub fn roots(&self) -> &BTreeMap<String, Arc<ResolvedTag>> {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.by_full_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_full_name.is_empty()
    }

    /// Whether a tag with the given full name exists.
    pub fn contains(&self, full_name: &str) -> bool {
        self.get(full_name).is_some()
    }

    /// Names of the direct children of a namespace.
    pub fn child_names(&self, namespace: &str) -> Vec<String> {
        self.get(namespace)
            .map(|tag| tag.children.values().map(|c| c.name.clone()).collect())
            .unwrap_or_default()
    }

    /// Genre names, taken from the `/genre` branch.
    pub fn genres(&self, min_weight: u8) -> Vec<String> {
        let Some(genre) = self.get("/genre") else {
            return Vec::new();
        };
        let names: BTreeSet<String> = genre
            .recursive_namespaced_children
            .values()
            .filter(|tag| tag.passes_weight(min_weight))
            .map(|tag| tag.name.clone())
            .collect();
        names.into_iter().collect()
    }

    /// Free-form tag names from the configured namespaces.
    pub fn tags(&self, config: &TagConfig) -> Vec<String> {
        let mut names = BTreeSet::new();
        for namespace in &config.include_namespaces {
            let Some(root) = self.get(namespace) else {
                continue;
            };
            for tag in root.recursive_namespaced_children.values() {
                if is_under_namespace(&tag.full_name, OVERRIDE_NAMESPACE) {
                    continue;
                }
                if tag.is_spoiler && !config.include_spoilers {
                    continue;
                }
                if !tag.passes_weight(config.min_weight) {
                    continue;
                }
                names.insert(tag.name.clone());
            }
        }
        names.into_iter().collect()
    }

    /// Content rating derived from audience and content indicator tags.
    pub fn content_rating(&self) -> Option<ContentRating> {
        let mut rating = None;

        if let Some(audience) = self.get("/target audience") {
            for tag in audience.children.values() {
                let level = match tag.name.to_lowercase().as_str() {
                    "kodomo" => Some(ContentRating::TvY),
                    "mina" => Some(ContentRating::TvG),
                    "shoujo" | "shounen" => Some(ContentRating::TvPg),
                    "josei" | "seinen" => Some(ContentRating::Tv14),
                    _ => None,
                };
                rating = rating.max(level);
            }
        }

        if let Some(indicators) = self.get("/content indicators") {
            for tag in indicators.recursive_namespaced_children.values() {
                let weight = tag.weight.unwrap_or(0);
                let level = match tag.name.to_lowercase().as_str() {
                    "sex" | "violence" if weight >= 4 => Some(ContentRating::TvMa),
                    _ if weight >= 3 => Some(ContentRating::Tv14),
                    _ => None,
                };
                rating = rating.max(level);
            }
        }

        if self.contains("/elements/sexual content/18 restricted") {
            rating = Some(ContentRating::Xxx);
        }

        rating
    }

    /// Production countries from the `/origin` branch.
    pub fn production_locations(&self) -> Vec<String> {
        let Some(origin) = self.get("/origin") else {
            return Vec::new();
        };
        let mut countries = BTreeSet::new();
        for tag in origin.recursive_namespaced_children.values() {
            let name = tag.name.to_lowercase();
            let origins = if let Some(rest) = name.strip_suffix(" co-production") {
                rest.split('-').map(str::to_string).collect::<Vec<_>>()
            } else if let Some(rest) = name.strip_suffix(" production") {
                vec![rest.to_string()]
            } else {
                continue;
            };
            for origin in origins {
                match origin_to_country(&origin) {
                    Some(country) => {
                        countries.insert(country.to_string());
                    }
                    None => tracing::debug!("Unknown production origin: {}", origin),
                }
            }
        }
        countries.into_iter().collect()
    }
}

fn same_name(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

fn is_under_namespace(full_name: &str, namespace: &str) -> bool {
    let full_name = full_name.to_lowercase();
    full_name == namespace || full_name.starts_with(&format!("{}/", namespace))
}

/// Place tags that reference their parent by id.
fn place_pointer_tags(arena: &mut Arena, tags: &[&Tag]) {
    let known: HashMap<u32, &Tag> = tags.iter().map(|t| (t.id, *t)).collect();

    // Bucket children under (source, parent id); tags without a known parent are roots.
    let mut buckets: HashMap<(TagSource, u32), Vec<&Tag>> = HashMap::new();
    let mut roots = Vec::new();
    for tag in tags {
        match tag.parent_id {
            Some(parent) if known.contains_key(&parent) => {
                buckets.entry((tag.source, parent)).or_default().push(*tag);
            }
            Some(parent) => {
                tracing::debug!("Tag {} references unknown parent {}, placing at root", tag.id, parent);
                roots.push(*tag);
            }
            None => roots.push(*tag),
        }
    }

    let mut queue: Vec<(&Tag, Option<usize>)> = roots.into_iter().map(|t| (t, None)).collect();
    while let Some((tag, parent)) = queue.pop() {
        let idx = arena.push(Node::from_tag(tag), parent);
        if let Some(children) = buckets.remove(&(tag.source, tag.id)) {
            queue.extend(children.into_iter().map(|c| (c, Some(idx))));
        }
    }

    // Whatever is left forms a parent cycle; keep the tags rather than drop them.
    for (_, children) in buckets {
        for tag in children {
            tracing::warn!("Tag {} is part of a parent cycle, placing at root", tag.id);
            arena.push(Node::from_tag(tag), None);
        }
    }
}

/// Place tags whose position is encoded in a slash-delimited name.
fn place_slash_tags(arena: &mut Arena, tags: &[&Tag]) {
    let first_slash_root = arena.roots.len();
    let mut user_root: Option<usize> = None;

    for tag in tags {
        let absolute = tag.name.trim_start().starts_with('/');
        let segments: Vec<&str> = tag
            .name
            .split('/')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        let Some((leaf, intermediate)) = segments.split_last() else {
            continue;
        };

        let mut parent = if absolute {
            None
        } else {
            Some(*user_root.get_or_insert_with(|| {
                let id = arena.synthetic_id();
                arena.push(Node::synthetic(id, USER_TAG_ROOT, tag.source), None)
            }))
        };

        for segment in intermediate {
            let existing = match parent {
                // Top-level lookups only see nodes created by this pass;
                // collisions with pointer tags are merged afterwards.
                None => arena.roots[first_slash_root..]
                    .iter()
                    .copied()
                    .find(|&idx| same_name(&arena.nodes[idx].name, segment)),
                Some(_) => arena.find_child(parent, segment),
            };
            parent = Some(match existing {
                Some(idx) => idx,
                None => {
                    let id = arena.synthetic_id();
                    arena.push(Node::synthetic(id, segment, tag.source), parent)
                }
            });
        }

        let mut node = Node::from_tag(tag);
        node.name = leaf.to_string();
        let existing = match parent {
            None => arena.roots[first_slash_root..]
                .iter()
                .copied()
                .find(|&idx| same_name(&arena.nodes[idx].name, leaf)),
            Some(_) => arena.find_child(parent, leaf),
        };
        match existing {
            Some(idx) => arena.nodes[idx].absorb(&node),
            None => {
                arena.push(node, parent);
            }
        }
    }
}

/// Merge nodes whose full name is already taken by an earlier node.
///
/// The children of a duplicate have a namespace equal to the surviving
/// node's full name, so they are re-assigned as its children. Nodes are
/// visited shallowest first, so re-homed children are checked again
/// against the surviving node's existing children.
fn rehome_duplicates(arena: &mut Arena) {
    let mut canonical: HashMap<String, usize> = HashMap::new();
    let mut order: Vec<usize> = (0..arena.nodes.len()).collect();
    order.sort_by_key(|&idx| (arena.depth(idx), arena.nodes[idx].synthetic, idx));

    let mut i = 0;
    while i < order.len() {
        let idx = order[i];
        i += 1;
        if arena.nodes[idx].removed {
            continue;
        }
        let key = arena.full_name(idx).to_lowercase();
        match canonical.get(&key).copied() {
            None => {
                canonical.insert(key, idx);
            }
            Some(survivor) => {
                tracing::debug!("Re-homing children of duplicate tag {}", key);
                let duplicate = arena.nodes[idx].clone();
                arena.nodes[survivor].absorb(&duplicate);
                for child in duplicate.children {
                    arena.reparent(child, survivor);
                }
                arena.detach(idx);
                arena.nodes[idx].removed = true;
                arena.nodes[idx].children.clear();
            }
        }
    }
}

/// Freeze the arena into shared nodes, deepest first.
fn freeze(arena: &Arena) -> TagTree {
    let live: Vec<usize> = (0..arena.nodes.len())
        .filter(|&idx| !arena.nodes[idx].removed)
        .collect();
    let mut by_depth = live.clone();
    by_depth.sort_by_key(|&idx| std::cmp::Reverse(arena.depth(idx)));

    let mut built: HashMap<usize, Arc<ResolvedTag>> = HashMap::new();
    for idx in by_depth {
        let node = &arena.nodes[idx];
        let mut children = BTreeMap::new();
        let mut recursive = BTreeMap::new();
        for child_idx in &node.children {
            let Some(child) = built.get(child_idx) else {
                continue;
            };
            let prefix = format!("/{}", child.name.to_lowercase());
            recursive.insert(prefix.clone(), Arc::clone(child));
            for (suffix, descendant) in &child.recursive_namespaced_children {
                recursive.insert(format!("{}{}", prefix, suffix), Arc::clone(descendant));
            }
            children.insert(child.name.to_lowercase(), Arc::clone(child));
        }

        let full_name = arena.full_name(idx);
        let namespace = match node.parent {
            Some(p) => arena.full_name(p),
            None => "/".to_string(),
        };
        built.insert(
            idx,
            Arc::new(ResolvedTag {
                id: node.id,
                name: node.name.clone(),
                full_name,
                namespace,
                description: node.description.clone(),
                weight: node.weight,
                is_verified: node.is_verified,
                is_spoiler: node.is_spoiler,
                source: node.source,
                children,
                recursive_namespaced_children: recursive,
            }),
        );
    }

    let mut tree = TagTree::default();
    for idx in live {
        let Some(tag) = built.get(&idx) else {
            continue;
        };
        tree.by_full_name
            .insert(tag.full_name.to_lowercase(), Arc::clone(tag));
        if arena.nodes[idx].parent.is_none() {
            tree.roots.insert(tag.name.to_lowercase(), Arc::clone(tag));
        }
    }
    tree
}
