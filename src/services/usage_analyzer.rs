//! Concept/Model Usage Analyzer
//!
//! Aggregates how concepts and models are used across trades: win rates,
//! sample sizes, average setup quality and concept co-occurrence.

use std::collections::{BTreeMap, HashSet};

use crate::models::entity::{Entity, EntityType, RelationshipType};
use crate::models::metadata::TradeOutcome;
use crate::models::training::{ConceptPairing, ConceptUsage, UsageScore};
use crate::services::graph_index::GraphIndex;
use crate::services::labeler::TradeLabeler;

/// Usage statistics for one pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UsageReport {
    pub concept_scores: BTreeMap<String, UsageScore>,
    pub model_scores: BTreeMap<String, UsageScore>,
    pub concept_usage: Vec<ConceptUsage>,
}

/// Usage analyzer
pub struct UsageAnalyzer<'l> {
    labeler: &'l dyn TradeLabeler,
}

impl<'l> UsageAnalyzer<'l> {
    pub fn new(labeler: &'l dyn TradeLabeler) -> Self {
        Self { labeler }
    }

    pub fn analyze(&self, index: &GraphIndex<'_>) -> UsageReport {
        UsageReport {
            concept_scores: self.concept_scores(index),
            model_scores: self.model_scores(index),
            concept_usage: self.concept_usage(index),
        }
    }

    /// Trades reached from a concept, via its models or directly, each once
    pub fn trades_for_concept<'a>(
        &self,
        index: &GraphIndex<'a>,
        concept: &Entity,
    ) -> Vec<&'a Entity> {
        let mut seen = HashSet::new();
        let mut trades = Vec::new();

        for model in self.models_for_concept(index, concept) {
            for trade in self.trades_for_model(index, model) {
                if seen.insert(trade.id.as_str()) {
                    trades.push(trade);
                }
            }
        }

        for trade in index.incoming(&concept.id, RelationshipType::TradeUsesConcept) {
            if trade.is(EntityType::Trade) && seen.insert(trade.id.as_str()) {
                trades.push(trade);
            }
        }

        trades
    }

    pub fn models_for_concept<'a>(
        &self,
        index: &GraphIndex<'a>,
        concept: &Entity,
    ) -> Vec<&'a Entity> {
        index
            .outgoing(&concept.id, RelationshipType::ConceptUsedInModel)
            .into_iter()
            .filter(|m| m.is(EntityType::Model))
            .collect()
    }

    pub fn trades_for_model<'a>(&self, index: &GraphIndex<'a>, model: &Entity) -> Vec<&'a Entity> {
        index
            .outgoing(&model.id, RelationshipType::ModelProducesTrade)
            .into_iter()
            .filter(|t| t.is(EntityType::Trade))
            .collect()
    }

    /// Per-concept scores keyed by concept name
    pub fn concept_scores(&self, index: &GraphIndex<'_>) -> BTreeMap<String, UsageScore> {
        let mut scores = BTreeMap::new();
        for concept in index.entities_of(EntityType::Concept) {
            let trades = self.trades_for_concept(index, concept);
            self.insert_score(&mut scores, concept, &trades);
        }
        scores
    }

    /// Per-model scores keyed by model name
    pub fn model_scores(&self, index: &GraphIndex<'_>) -> BTreeMap<String, UsageScore> {
        let mut scores = BTreeMap::new();
        for model in index.entities_of(EntityType::Model) {
            let trades = self.trades_for_model(index, model);
            self.insert_score(&mut scores, model, &trades);
        }
        scores
    }

    fn insert_score(
        &self,
        scores: &mut BTreeMap<String, UsageScore>,
        subject: &Entity,
        trades: &[&Entity],
    ) {
        let Some(score) = self.score(&subject.name, trades) else {
            return;
        };
        if scores.contains_key(&subject.name) {
            tracing::debug!(
                "Duplicate subject name '{}' ({}); keeping the first score",
                subject.name,
                subject.id
            );
            return;
        }
        scores.insert(subject.name.clone(), score);
    }

    /// Score over labeled trades; `None` when none are labeled
    pub fn score(&self, subject_name: &str, trades: &[&Entity]) -> Option<UsageScore> {
        let mut sample_size = 0usize;
        let mut wins = 0usize;
        let mut grades = Vec::new();

        for trade in trades {
            let Some(outcome) = self.labeler.outcome(trade) else {
                continue;
            };
            sample_size += 1;
            if outcome == TradeOutcome::Win {
                wins += 1;
            }
            if let Some(grade) = self.labeler.quality_grade(trade) {
                grades.push(grade);
            }
        }

        if sample_size == 0 {
            return None;
        }

        Some(UsageScore {
            subject_name: subject_name.to_string(),
            win_rate: wins as f64 / sample_size as f64,
            sample_size,
            avg_quality: mean(&grades),
        })
    }

    /// Concept profiles sorted by usage frequency, most used first
    pub fn concept_usage(&self, index: &GraphIndex<'_>) -> Vec<ConceptUsage> {
        let mut usage: Vec<ConceptUsage> = index
            .entities_of(EntityType::Concept)
            .map(|concept| {
                let models = self.models_for_concept(index, concept);
                let trades = self.trades_for_concept(index, concept);
                let labeled: Vec<TradeOutcome> =
                    trades.iter().filter_map(|t| self.labeler.outcome(t)).collect();
                let success_rate = (!labeled.is_empty()).then(|| {
                    labeled.iter().filter(|o| **o == TradeOutcome::Win).count() as f64
                        / labeled.len() as f64
                });

                ConceptUsage {
                    concept: concept.clone(),
                    related_models: models.into_iter().cloned().collect(),
                    usage_frequency: trades.len(),
                    related_trades: trades.into_iter().cloned().collect(),
                    success_rate,
                    common_pairings: self.pairings(index, concept),
                }
            })
            .collect();

        usage.sort_by(|a, b| b.usage_frequency.cmp(&a.usage_frequency));
        usage
    }

    /// Co-occurring concepts with the number of CONCEPT_RELATED_TO edges in
    /// either direction
    pub fn pairings(&self, index: &GraphIndex<'_>, concept: &Entity) -> Vec<ConceptPairing> {
        let mut seen = HashSet::new();
        let mut pairings = Vec::new();

        for relationship in index.relationships_of(&concept.id) {
            if relationship.relationship_type != RelationshipType::ConceptRelatedTo {
                continue;
            }
            let Some(partner) = relationship
                .other_end(&concept.id)
                .filter(|id| *id != concept.id)
                .and_then(|id| index.resolve(id))
            else {
                continue;
            };
            if !partner.is(EntityType::Concept) || !seen.insert(partner.id.as_str()) {
                continue;
            }

            let related = RelationshipType::ConceptRelatedTo;
            let count = index.count_edges(&concept.id, &partner.id, related)
                + index.count_edges(&partner.id, &concept.id, related);
            pairings.push(ConceptPairing {
                concept_id: partner.id.clone(),
                concept_name: partner.name.clone(),
                count,
            });
        }

        pairings
    }
}

pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::entity::Relationship;
    use crate::services::labeler::MetadataLabeler;
    use serde_json::json;

    fn rel(source: &str, target: &str, kind: RelationshipType) -> Relationship {
        let mut relationship = Relationship::new(source, target, kind);
        relationship.id = format!("{}-{}-{}", source, kind, target);
        relationship
    }

    fn trade(id: &str, result: Option<&str>, grade: Option<f64>) -> Entity {
        let mut trade = Entity::with_id(id, &id.to_uppercase(), EntityType::Trade);
        if let Some(result) = result {
            trade.set_metadata("result", json!(result));
        }
        if let Some(grade) = grade {
            trade.set_metadata("grading", json!({"total_score": grade}));
        }
        trade
    }

    #[test]
    fn test_fvg_scenario_scores() {
        let entities = vec![
            Entity::with_id("c", "FVG", EntityType::Concept),
            Entity::with_id("m", "Silver Bullet", EntityType::Model),
            trade("t1", Some("win"), Some(8.0)),
            trade("t2", Some("win"), None),
        ];
        let relationships = vec![
            rel("c", "m", RelationshipType::ConceptUsedInModel),
            rel("m", "t1", RelationshipType::ModelProducesTrade),
            rel("m", "t2", RelationshipType::ModelProducesTrade),
        ];
        let index = GraphIndex::build(&entities, &relationships);
        let report = UsageAnalyzer::new(&MetadataLabeler).analyze(&index);

        let fvg = &report.concept_scores["FVG"];
        assert_eq!(fvg.win_rate, 1.0);
        assert_eq!(fvg.sample_size, 2);
        assert_eq!(fvg.avg_quality, Some(8.0));

        let model = &report.model_scores["Silver Bullet"];
        assert_eq!(model.sample_size, 2);
    }

    #[test]
    fn test_direct_and_indirect_trades_counted_once() {
        let entities = vec![
            Entity::with_id("c", "OTE", EntityType::Concept),
            Entity::with_id("m", "2022 Model", EntityType::Model),
            trade("t1", Some("win"), None),
            trade("t2", Some("loss"), None),
        ];
        let relationships = vec![
            rel("c", "m", RelationshipType::ConceptUsedInModel),
            rel("m", "t1", RelationshipType::ModelProducesTrade),
            rel("t1", "c", RelationshipType::TradeUsesConcept),
            rel("t2", "c", RelationshipType::TradeUsesConcept),
        ];
        let index = GraphIndex::build(&entities, &relationships);
        let scores = UsageAnalyzer::new(&MetadataLabeler).concept_scores(&index);

        assert_eq!(scores["OTE"].sample_size, 2);
        assert!((scores["OTE"].win_rate - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_unlabeled_trades_excluded() {
        let entities = vec![
            Entity::with_id("m", "Unicorn", EntityType::Model),
            trade("t1", Some("loss"), Some(4.0)),
            trade("t2", None, Some(9.0)),
            Entity::with_id("m2", "Idle", EntityType::Model),
            Entity::with_id("m3", "Unlabeled Only", EntityType::Model),
            trade("t3", None, None),
        ];
        let relationships = vec![
            rel("m", "t1", RelationshipType::ModelProducesTrade),
            rel("m", "t2", RelationshipType::ModelProducesTrade),
            rel("m3", "t3", RelationshipType::ModelProducesTrade),
        ];
        let index = GraphIndex::build(&entities, &relationships);
        let scores = UsageAnalyzer::new(&MetadataLabeler).model_scores(&index);

        assert_eq!(scores.len(), 1);
        let unicorn = &scores["Unicorn"];
        assert_eq!(unicorn.sample_size, 1);
        assert_eq!(unicorn.win_rate, 0.0);
        assert_eq!(unicorn.avg_quality, Some(4.0));
    }

    #[test]
    fn test_pairings_count_both_directions() {
        let entities = vec![
            Entity::with_id("a", "FVG", EntityType::Concept),
            Entity::with_id("b", "Order Block", EntityType::Concept),
            Entity::with_id("c", "Liquidity", EntityType::Concept),
        ];
        let relationships = vec![
            rel("a", "b", RelationshipType::ConceptRelatedTo),
            rel("b", "a", RelationshipType::ConceptRelatedTo),
            rel("c", "a", RelationshipType::ConceptRelatedTo),
        ];
        let index = GraphIndex::build(&entities, &relationships);
        let analyzer = UsageAnalyzer::new(&MetadataLabeler);

        let pairings = analyzer.pairings(&index, &entities[0]);
        assert_eq!(pairings.len(), 2);
        assert_eq!(pairings[0].concept_name, "Order Block");
        assert_eq!(pairings[0].count, 2);
        assert_eq!(pairings[1].concept_name, "Liquidity");
        assert_eq!(pairings[1].count, 1);
    }

    #[test]
    fn test_concept_usage_sorted_by_frequency() {
        let entities = vec![
            Entity::with_id("quiet", "Breaker", EntityType::Concept),
            Entity::with_id("busy", "FVG", EntityType::Concept),
            trade("t1", Some("win"), None),
            trade("t2", None, None),
        ];
        let relationships = vec![
            rel("t1", "busy", RelationshipType::TradeUsesConcept),
            rel("t2", "busy", RelationshipType::TradeUsesConcept),
        ];
        let index = GraphIndex::build(&entities, &relationships);
        let usage = UsageAnalyzer::new(&MetadataLabeler).concept_usage(&index);

        assert_eq!(usage[0].concept.name, "FVG");
        assert_eq!(usage[0].usage_frequency, 2);
        assert_eq!(usage[0].success_rate, Some(1.0));
        assert_eq!(usage[1].concept.name, "Breaker");
        assert_eq!(usage[1].success_rate, None);
    }

    #[test]
    fn test_no_trades_no_scores() {
        let entities = vec![Entity::with_id("c", "FVG", EntityType::Concept)];
        let index = GraphIndex::build(&entities, &[]);
        let report = UsageAnalyzer::new(&MetadataLabeler).analyze(&index);
        assert!(report.concept_scores.is_empty());
        assert!(report.model_scores.is_empty());
        assert_eq!(report.concept_usage.len(), 1);
    }
}
