//! Structural Pattern Detector
//!
//! Chain, hub, cluster and bridge detection over a [`GraphIndex`]. The four
//! detectors are independent and deterministic for a given input order.

use std::collections::{BTreeMap, HashSet, VecDeque};

use crate::config::MiningConfig;
use crate::models::entity::{Entity, EntityType, RelationshipType};
use crate::models::pattern::{Pattern, PatternType};
use crate::services::graph_index::GraphIndex;

/// Structural pattern detector
pub struct StructureDetector<'c> {
    config: &'c MiningConfig,
}

impl<'c> StructureDetector<'c> {
    pub fn new(config: &'c MiningConfig) -> Self {
        Self { config }
    }

    /// Run all four detectors, in chain, hub, cluster, bridge order
    pub fn detect_all(&self, index: &GraphIndex<'_>) -> Vec<Pattern> {
        let chains = self.detect_chains(index);
        let hubs = self.detect_hubs(index);
        let clusters = self.detect_clusters(index);
        let bridges = self.detect_bridges(index);

        tracing::debug!(
            "Structural detection: {} chains, {} hubs, {} clusters, {} bridges",
            chains.len(),
            hubs.len(),
            clusters.len(),
            bridges.len()
        );

        let mut patterns = chains;
        patterns.extend(hubs);
        patterns.extend(clusters);
        patterns.extend(bridges);
        patterns
    }

    /// Concept → model → trade pipelines
    pub fn detect_chains(&self, index: &GraphIndex<'_>) -> Vec<Pattern> {
        let mut patterns = Vec::new();

        for concept in index.entities_of(EntityType::Concept) {
            let models = index
                .outgoing(&concept.id, RelationshipType::ConceptUsedInModel)
                .into_iter()
                .filter(|m| m.is(EntityType::Model));

            for model in models {
                let trades: Vec<&Entity> = index
                    .outgoing(&model.id, RelationshipType::ModelProducesTrade)
                    .into_iter()
                    .filter(|t| t.is(EntityType::Trade))
                    .collect();
                if trades.is_empty() {
                    continue;
                }

                let mut members = vec![concept, model];
                members.extend(trades.iter().copied());
                let ids: HashSet<&str> = members.iter().map(|e| e.id.as_str()).collect();
                let trade_count = trades.len();

                patterns.push(Pattern {
                    id: format!("chain-{}-{}", concept.id, model.id),
                    pattern_type: PatternType::Chain,
                    name: format!("{} → {} Chain", concept.name, model.name),
                    description: format!(
                        "Concept \"{}\" flows through model \"{}\" to produce {} trade(s)",
                        concept.name, model.name, trade_count
                    ),
                    member_entities: owned(&members),
                    member_relationships: owned(&index.relationships_within(&ids)),
                    strength: trade_count as f64 / 10.0,
                    insights: vec![
                        "This concept is actively used in trading".to_string(),
                        format!(
                            "Model \"{}\" applies this concept {} time(s)",
                            model.name, trade_count
                        ),
                        if trade_count > 3 {
                            "High-frequency pattern".to_string()
                        } else {
                            "Emerging pattern".to_string()
                        },
                    ],
                });
            }
        }

        patterns
    }

    /// Threshold used by hub detection for this index
    pub fn hub_threshold(&self, index: &GraphIndex<'_>) -> f64 {
        let entities = index.entity_count();
        if entities == 0 {
            return self.config.hub_min_degree;
        }
        let average = index.relationship_count() as f64 / entities as f64;
        self.config.hub_min_degree.max(average)
    }

    /// Entities whose degree reaches the hub threshold
    pub fn detect_hubs(&self, index: &GraphIndex<'_>) -> Vec<Pattern> {
        let threshold = self.hub_threshold(index);
        let entity_count = index.entity_count() as f64;
        let mut patterns = Vec::new();

        for hub in index.entities() {
            let degree = index.degree(&hub.id);
            if degree == 0 || (degree as f64) < threshold {
                continue;
            }

            let mut ids: HashSet<&str> = index.neighbors_of(&hub.id).into_iter().collect();
            ids.insert(hub.id.as_str());
            let members = index.in_entity_order(&ids);

            patterns.push(Pattern {
                id: format!("hub-{}", hub.id),
                pattern_type: PatternType::Hub,
                name: format!("{} Hub", hub.name),
                description: format!(
                    "\"{}\" is a central {} connected to {} other entities",
                    hub.name, hub.entity_type, degree
                ),
                member_entities: owned(&members),
                member_relationships: owned(index.relationships_of(&hub.id)),
                strength: degree as f64 / (entity_count * 0.5),
                insights: vec![
                    format!("This {} is highly interconnected", hub.entity_type),
                    format!("Connected to {} entities", members.len()),
                    "Consider this a foundational element in your trading system".to_string(),
                ],
            });
        }

        patterns
    }

    /// Size-capped breadth-first components
    pub fn detect_clusters(&self, index: &GraphIndex<'_>) -> Vec<Pattern> {
        let mut traversal = ClusterTraversal::new(self.config.cluster_max_size);
        let mut patterns = Vec::new();

        for &start in index.entities() {
            if patterns.len() >= self.config.max_clusters {
                break;
            }
            if traversal.is_visited(&start.id) {
                continue;
            }

            let cluster = traversal.grow(index, &start.id);
            if cluster.len() < self.config.cluster_min_size {
                continue;
            }

            let ids: HashSet<&str> = cluster.iter().copied().collect();
            let members = index.in_entity_order(&ids);
            let relationships = index.relationships_within(&ids);
            let size = members.len();
            let dominant = dominant_kind(&members);
            let pairs = (size * (size - 1)) as f64 / 2.0;

            patterns.push(Pattern {
                id: format!("cluster-{}", start.id),
                pattern_type: PatternType::Cluster,
                name: format!("{} Cluster", capitalize(&dominant)),
                description: format!("A group of {} closely related entities", size),
                member_entities: owned(&members),
                member_relationships: owned(&relationships),
                strength: if pairs > 0.0 {
                    relationships.len() as f64 / pairs
                } else {
                    0.0
                },
                insights: vec![
                    format!("Contains {} interconnected entities", size),
                    format!("Primarily {} entities", dominant),
                    "These entities form a cohesive knowledge unit".to_string(),
                ],
            });
        }

        patterns
    }

    /// Entities connecting at least two distinct neighbor kinds
    pub fn detect_bridges(&self, index: &GraphIndex<'_>) -> Vec<Pattern> {
        let mut patterns = Vec::new();

        for entity in index.entities() {
            let relationships = index.relationships_of(&entity.id);
            if relationships.len() < 2 {
                continue;
            }

            let ids: HashSet<&str> = index.neighbors_of(&entity.id).into_iter().collect();
            let neighbors = index.in_entity_order(&ids);
            let mut kinds: Vec<&EntityType> =
                neighbors.iter().map(|e| &e.entity_type).collect();
            kinds.sort();
            kinds.dedup();
            if kinds.len() < self.config.min_bridge_kinds {
                continue;
            }

            let kind_names: Vec<String> = kinds.iter().map(ToString::to_string).collect();
            let mut members = vec![*entity];
            members.extend(neighbors);

            patterns.push(Pattern {
                id: format!("bridge-{}", entity.id),
                pattern_type: PatternType::Bridge,
                name: format!("{} Bridge", entity.name),
                description: format!(
                    "\"{}\" connects {} different types of entities",
                    entity.name,
                    kinds.len()
                ),
                member_entities: owned(&members),
                member_relationships: owned(relationships),
                strength: kinds.len() as f64 / 5.0,
                insights: vec![
                    format!("Bridges {} entities", kind_names.join(", ")),
                    "Critical connection point in knowledge graph".to_string(),
                    "Removing this entity would fragment the graph".to_string(),
                ],
            });
        }

        // stable: equal strengths keep entity order
        patterns.sort_by(|a, b| b.strength.total_cmp(&a.strength));
        patterns.truncate(self.config.max_bridges);
        patterns
    }
}

/// Visited set shared by all clusters of one detection run
struct ClusterTraversal<'a> {
    visited: HashSet<&'a str>,
    max_size: usize,
}

impl<'a> ClusterTraversal<'a> {
    fn new(max_size: usize) -> Self {
        Self {
            visited: HashSet::new(),
            max_size,
        }
    }

    fn is_visited(&self, id: &str) -> bool {
        self.visited.contains(id)
    }

    /// Grow one component from `start`, in discovery order
    fn grow(&mut self, index: &GraphIndex<'a>, start: &'a str) -> Vec<&'a str> {
        let mut cluster = vec![start];
        let mut members: HashSet<&'a str> = HashSet::from([start]);
        let mut queue = VecDeque::from([start]);

        while let Some(current) = queue.pop_front() {
            self.visited.insert(current);

            for neighbor in index.neighbors_of(current) {
                if self.visited.contains(neighbor) || members.contains(neighbor) {
                    continue;
                }
                if cluster.len() >= self.max_size {
                    break;
                }
                members.insert(neighbor);
                cluster.push(neighbor);
                queue.push_back(neighbor);
            }
        }

        cluster
    }
}

/// Most frequent kind; ties go to the kind seen first
fn dominant_kind(members: &[&Entity]) -> String {
    let mut counts: BTreeMap<&EntityType, (usize, usize)> = BTreeMap::new();
    for (position, entity) in members.iter().enumerate() {
        counts.entry(&entity.entity_type).or_insert((0, position)).0 += 1;
    }

    counts
        .into_iter()
        .max_by(|(_, (count_a, first_a)), (_, (count_b, first_b))| {
            count_a.cmp(count_b).then(first_b.cmp(first_a))
        })
        .map(|(kind, _)| kind.to_string())
        .unwrap_or_else(|| "mixed".to_string())
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn owned<T: Clone>(items: &[&T]) -> Vec<T> {
    items.iter().map(|item| (*item).clone()).collect()
}
