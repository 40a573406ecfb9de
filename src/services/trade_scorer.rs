//! Trade setup scoring
//!
//! Rates a single trade against the patterns and model scores of a finished
//! mining pass.

use std::collections::BTreeSet;

use crate::models::entity::{Entity, EntityType, RelationshipType};
use crate::models::training::{TradeSetupScore, TrainingPattern, TrainingPatternType};
use crate::services::graph_index::GraphIndex;
use crate::services::knowledge_miner::MiningPass;
use crate::services::labeler::TradeLabeler;

const BASE_SCORE: f64 = 5.0;
const MAX_SCORE: f64 = 10.0;

pub struct TradeScorer<'p, 'l> {
    pass: &'p MiningPass,
    labeler: &'l dyn TradeLabeler,
}

impl<'p, 'l> TradeScorer<'p, 'l> {
    pub fn new(pass: &'p MiningPass, labeler: &'l dyn TradeLabeler) -> Self {
        Self { pass, labeler }
    }

    pub fn score(&self, index: &GraphIndex<'_>, trade: &Entity) -> TradeSetupScore {
        let concepts = trade_concepts(index, trade);
        let mut score = BASE_SCORE;
        let mut feedback = Vec::new();
        let mut warnings = Vec::new();

        if concepts.len() >= 3 {
            score += 1.5;
            feedback.push("✓ Strong concept confluence (3+ concepts)".to_string());
        } else if concepts.len() < 2 {
            score -= 1.0;
            warnings.push(
                "⚠ Low concept confluence - consider additional confirmation".to_string(),
            );
        }

        for pattern in &self.pass.training_patterns {
            if pattern.concepts.is_empty() {
                continue;
            }
            let matched = matched_concepts(pattern, &concepts);
            match pattern.pattern_type {
                TrainingPatternType::Success if matched == pattern.concepts.len() => {
                    score += 2.0;
                    feedback.push(format!("✓ Matches proven success pattern: {}", pattern.name));
                }
                TrainingPatternType::Failure if matched * 2 >= pattern.concepts.len() => {
                    score -= 1.5;
                    warnings.push(format!("⚠ Similar to failure pattern: {}", pattern.name));
                }
                _ => {}
            }
        }

        if let Some(model) = self
            .labeler
            .model_name(trade)
            .and_then(|name| self.pass.model_scores.get(&name))
        {
            if model.win_rate >= 0.6 {
                score += 1.0;
                feedback.push(format!(
                    "✓ Using high-performance model ({:.0}% win rate)",
                    model.win_rate * 100.0
                ));
            } else if model.win_rate < 0.4 {
                score -= 1.0;
                warnings.push(format!(
                    "⚠ Model has low historical win rate ({:.0}%)",
                    model.win_rate * 100.0
                ));
            }
        }

        tracing::debug!(
            "Scored trade {}: {:.1} ({} feedback, {} warnings)",
            trade.id,
            score,
            feedback.len(),
            warnings.len()
        );

        TradeSetupScore {
            score: score.clamp(0.0, MAX_SCORE),
            feedback,
            warnings,
        }
    }
}

/// Lowercased distinct names of the concepts a trade uses
fn trade_concepts(index: &GraphIndex<'_>, trade: &Entity) -> BTreeSet<String> {
    index
        .outgoing(&trade.id, RelationshipType::TradeUsesConcept)
        .into_iter()
        .filter(|c| c.is(EntityType::Concept))
        .map(|c| c.name.to_lowercase())
        .collect()
}

fn matched_concepts(pattern: &TrainingPattern, concepts: &BTreeSet<String>) -> usize {
    pattern
        .concepts
        .iter()
        .filter(|name| concepts.contains(&name.to_lowercase()))
        .count()
}
