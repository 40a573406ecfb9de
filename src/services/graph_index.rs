//! Graph Index
//!
//! Adjacency lookups over one snapshot, built once per mining pass in
//! O(E + R). Relationships whose endpoints do not resolve are recorded as
//! dangling and never participate in traversal.

use std::collections::{HashMap, HashSet};

use crate::models::entity::{Entity, EntityType, Relationship, RelationshipType};

/// Borrowed adjacency index over entities and relationships
#[derive(Debug, Clone)]
pub struct GraphIndex<'a> {
    entities: Vec<&'a Entity>,
    by_id: HashMap<&'a str, &'a Entity>,
    /// Relationships incident to each entity, in input order. A self-loop is
    /// listed once.
    incident: HashMap<&'a str, Vec<&'a Relationship>>,
    resolved: Vec<&'a Relationship>,
    dangling: Vec<&'a Relationship>,
}

impl<'a> GraphIndex<'a> {
    /// Build the index
    ///
    /// Duplicate entity ids keep their first occurrence.
    pub fn build(entities: &'a [Entity], relationships: &'a [Relationship]) -> Self {
        let mut by_id = HashMap::with_capacity(entities.len());
        let mut unique = Vec::with_capacity(entities.len());
        for entity in entities {
            if !by_id.contains_key(entity.id.as_str()) {
                by_id.insert(entity.id.as_str(), entity);
                unique.push(entity);
            }
        }

        let mut incident: HashMap<&'a str, Vec<&'a Relationship>> = HashMap::new();
        let mut resolved = Vec::with_capacity(relationships.len());
        let mut dangling = Vec::new();

        for relationship in relationships {
            let source = by_id.get_key_value(relationship.source_id.as_str());
            let target = by_id.get_key_value(relationship.target_id.as_str());
            let (Some((source_id, _)), Some((target_id, _))) = (source, target) else {
                dangling.push(relationship);
                continue;
            };

            incident.entry(*source_id).or_default().push(relationship);
            if source_id != target_id {
                incident.entry(*target_id).or_default().push(relationship);
            }
            resolved.push(relationship);
        }

        if !dangling.is_empty() {
            tracing::debug!(
                "Graph index skipped {} dangling relationship(s)",
                dangling.len()
            );
        }

        Self {
            entities: unique,
            by_id,
            incident,
            resolved,
            dangling,
        }
    }

    /// Look up an entity by id
    pub fn resolve(&self, id: &str) -> Option<&'a Entity> {
        self.by_id.get(id).copied()
    }

    /// Entities in input order
    pub fn entities(&self) -> &[&'a Entity] {
        &self.entities
    }

    /// Entities of one kind, in input order
    pub fn entities_of(&self, entity_type: EntityType) -> impl Iterator<Item = &'a Entity> + '_ {
        self.entities
            .iter()
            .copied()
            .filter(move |e| e.entity_type == entity_type)
    }

    /// Relationships whose endpoints both resolved
    pub fn relationships(&self) -> &[&'a Relationship] {
        &self.resolved
    }

    /// Relationships excluded from adjacency
    pub fn dangling(&self) -> &[&'a Relationship] {
        &self.dangling
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn relationship_count(&self) -> usize {
        self.resolved.len()
    }

    /// Relationships touching `id`, in input order
    pub fn relationships_of(&self, id: &str) -> &[&'a Relationship] {
        self.incident.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Distinct neighbor ids of `id` (excluding itself), in relationship order
    pub fn neighbors_of(&self, id: &str) -> Vec<&'a str> {
        let mut seen = HashSet::new();
        self.relationships_of(id)
            .iter()
            .filter_map(|r| r.other_end(id))
            .filter(|other| *other != id && seen.insert(*other))
            .collect()
    }

    /// In-degree plus out-degree; a self-loop counts on both sides
    pub fn degree(&self, id: &str) -> usize {
        self.relationships_of(id)
            .iter()
            .map(|r| if r.source_id == r.target_id { 2 } else { 1 })
            .sum()
    }

    /// Targets of outgoing edges of one kind, deduplicated, in relationship order
    pub fn outgoing(&self, id: &str, relationship_type: RelationshipType) -> Vec<&'a Entity> {
        let mut seen = HashSet::new();
        self.relationships_of(id)
            .iter()
            .filter(|r| r.relationship_type == relationship_type && r.source_id == id)
            .filter_map(|r| self.resolve(&r.target_id))
            .filter(|e| seen.insert(e.id.as_str()))
            .collect()
    }

    /// Sources of incoming edges of one kind, deduplicated, in relationship order
    pub fn incoming(&self, id: &str, relationship_type: RelationshipType) -> Vec<&'a Entity> {
        let mut seen = HashSet::new();
        self.relationships_of(id)
            .iter()
            .filter(|r| r.relationship_type == relationship_type && r.target_id == id)
            .filter_map(|r| self.resolve(&r.source_id))
            .filter(|e| seen.insert(e.id.as_str()))
            .collect()
    }

    /// Number of edges of one kind from `source` to `target`
    pub fn count_edges(
        &self,
        source: &str,
        target: &str,
        relationship_type: RelationshipType,
    ) -> usize {
        self.relationships_of(source)
            .iter()
            .filter(|r| {
                r.relationship_type == relationship_type
                    && r.source_id == source
                    && r.target_id == target
            })
            .count()
    }

    /// Members of `ids` in entity input order
    pub fn in_entity_order(&self, ids: &HashSet<&str>) -> Vec<&'a Entity> {
        self.entities
            .iter()
            .copied()
            .filter(|e| ids.contains(e.id.as_str()))
            .collect()
    }

    /// Resolved relationships with both endpoints inside `ids`
    pub fn relationships_within(&self, ids: &HashSet<&str>) -> Vec<&'a Relationship> {
        self.resolved
            .iter()
            .copied()
            .filter(|r| ids.contains(r.source_id.as_str()) && ids.contains(r.target_id.as_str()))
            .collect()
    }
}
