//! Knowledge Miner
//!
//! Entry point for one mining pass. The deterministic part ([`KnowledgeMiner::mine`])
//! runs the graph index, structural detectors, usage analyzer and outcome miner
//! over an immutable snapshot. [`KnowledgeMiner::run`] adds insight synthesis
//! and wraps everything in a [`MiningReport`].

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use crate::config::{AppConfig, InsightConfig, MiningConfig};
use crate::error::Result;
use crate::generation::create_insight_generator;
use crate::models::pattern::{Pattern, PatternSummary};
use crate::models::report::{InsightSource, MiningReport};
use crate::models::snapshot::GraphSnapshot;
use crate::models::training::{
    ConceptUsage, QualityFactor, TradeSetupScore, TrainingPattern, UsageScore,
};
use crate::observability::MiningMetrics;
use crate::services::graph_index::GraphIndex;
use crate::services::insight_synthesizer::{InsightGenerator, InsightInputs, InsightSynthesizer};
use crate::services::labeler::TradeLabeler;
use crate::services::outcome_miner::OutcomeMiner;
use crate::services::structure_detector::StructureDetector;
use crate::services::trade_scorer::TradeScorer;
use crate::services::usage_analyzer::UsageAnalyzer;

/// Deterministic output of one pass
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MiningPass {
    pub trades_analyzed: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub structural_patterns: Vec<Pattern>,
    pub concept_usage: Vec<ConceptUsage>,
    pub concept_scores: BTreeMap<String, UsageScore>,
    pub model_scores: BTreeMap<String, UsageScore>,
    pub training_patterns: Vec<TrainingPattern>,
    pub quality_factors: Vec<QualityFactor>,
}

impl MiningPass {
    /// Statistics view handed to the insight synthesizer
    pub fn insight_inputs<'a>(&'a self, summaries: &'a [PatternSummary]) -> InsightInputs<'a> {
        InsightInputs {
            total_trades: self.trades_analyzed,
            winning_trades: self.winning_trades,
            losing_trades: self.losing_trades,
            concept_scores: &self.concept_scores,
            model_scores: &self.model_scores,
            training_patterns: &self.training_patterns,
            quality_factors: &self.quality_factors,
            structural_patterns: summaries,
        }
    }
}

/// Knowledge graph mining service
pub struct KnowledgeMiner {
    labeler: Arc<dyn TradeLabeler>,
    synthesizer: InsightSynthesizer,
    has_generator: bool,
    mining: MiningConfig,
    metrics: Arc<MiningMetrics>,
}

impl KnowledgeMiner {
    pub fn new(
        labeler: Arc<dyn TradeLabeler>,
        generator: Option<Arc<dyn InsightGenerator>>,
        mining: MiningConfig,
        insight: InsightConfig,
    ) -> Self {
        Self {
            labeler,
            has_generator: generator.is_some(),
            synthesizer: InsightSynthesizer::new(generator, insight),
            mining,
            metrics: Arc::new(MiningMetrics::default()),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MiningMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> &Arc<MiningMetrics> {
        &self.metrics
    }

    /// Structural patterns only
    pub fn analyze_structure(&self, snapshot: &GraphSnapshot) -> Vec<Pattern> {
        let index = GraphIndex::build(snapshot.entities(), snapshot.relationships());
        StructureDetector::new(&self.mining).detect_all(&index)
    }

    /// Run the deterministic part of a pass
    pub fn mine(&self, snapshot: &GraphSnapshot) -> MiningPass {
        let started = Instant::now();
        let index = GraphIndex::build(snapshot.entities(), snapshot.relationships());
        tracing::info!(
            "Mining pass over {} entities, {} relationships ({} dangling)",
            index.entity_count(),
            index.relationship_count(),
            index.dangling().len()
        );

        let structural_patterns = StructureDetector::new(&self.mining).detect_all(&index);
        let usage = UsageAnalyzer::new(self.labeler.as_ref()).analyze(&index);
        let outcomes = OutcomeMiner::new(&self.mining, self.labeler.as_ref()).mine(&index);

        self.metrics.record_pass(
            structural_patterns.len(),
            outcomes.training_patterns.len(),
            started.elapsed().as_millis() as u64,
        );
        tracing::info!(
            "Mining pass complete: {} structural patterns, {} training patterns, {} quality factors",
            structural_patterns.len(),
            outcomes.training_patterns.len(),
            outcomes.quality_factors.len()
        );

        MiningPass {
            trades_analyzed: outcomes.trades_analyzed,
            winning_trades: outcomes.winning_trades,
            losing_trades: outcomes.losing_trades,
            structural_patterns,
            concept_usage: usage.concept_usage,
            concept_scores: usage.concept_scores,
            model_scores: usage.model_scores,
            training_patterns: outcomes.training_patterns,
            quality_factors: outcomes.quality_factors,
        }
    }

    /// Full pass including insight synthesis
    pub async fn run(&self, snapshot: &GraphSnapshot) -> MiningReport {
        let pass = self.mine(snapshot);
        let summaries: Vec<PatternSummary> =
            pass.structural_patterns.iter().map(PatternSummary::from).collect();
        let synthesis = self
            .synthesizer
            .synthesize(&pass.insight_inputs(&summaries))
            .await;

        match &synthesis.source {
            InsightSource::Generator { .. } => self.metrics.record_generator_success(),
            InsightSource::Fallback { .. } => {
                self.metrics.record_fallback();
                if self.has_generator {
                    self.metrics.record_generator_failure();
                }
            }
        }

        let generated_at = Utc::now();
        MiningReport {
            version: format!("v1-{}", generated_at.timestamp_millis()),
            generated_at,
            trades_analyzed: pass.trades_analyzed,
            winning_trades: pass.winning_trades,
            losing_trades: pass.losing_trades,
            structural_patterns: pass.structural_patterns,
            concept_usage: pass.concept_usage,
            concept_scores: pass.concept_scores,
            model_scores: pass.model_scores,
            training_patterns: pass.training_patterns,
            quality_factors: pass.quality_factors,
            insights: synthesis.insights,
            insight_source: synthesis.source,
        }
    }

    /// Score a trade in the snapshot against a finished pass
    pub fn score_trade(
        &self,
        snapshot: &GraphSnapshot,
        pass: &MiningPass,
        trade_id: &str,
    ) -> Option<TradeSetupScore> {
        let index = GraphIndex::build(snapshot.entities(), snapshot.relationships());
        let trade = index.resolve(trade_id)?;
        Some(TradeScorer::new(pass, self.labeler.as_ref()).score(&index, trade))
    }
}

/// 创建挖掘服务，按配置接入文本生成后端
pub fn create_knowledge_miner(
    config: &AppConfig,
    labeler: Arc<dyn TradeLabeler>,
) -> Result<KnowledgeMiner> {
    let generator = create_insight_generator(&config.insight)?;
    Ok(KnowledgeMiner::new(
        labeler,
        generator,
        config.mining.clone(),
        config.insight.clone(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::entity::{Entity, EntityType, Relationship, RelationshipType};
    use crate::services::labeler::MetadataLabeler;
    use serde_json::json;

    fn rel(source: &str, target: &str, kind: RelationshipType) -> Relationship {
        let mut relationship = Relationship::new(source, target, kind);
        relationship.id = format!("{}-{}-{}", source, kind, target);
        relationship
    }

    fn winning_trade(id: &str) -> Entity {
        let mut trade = Entity::with_id(id, &id.to_uppercase(), EntityType::Trade);
        trade.set_metadata("result", json!("win"));
        trade
    }

    fn fvg_snapshot() -> GraphSnapshot {
        GraphSnapshot::new(
            vec![
                Entity::with_id("c", "FVG", EntityType::Concept),
                Entity::with_id("m", "Silver Bullet", EntityType::Model),
                winning_trade("t1"),
                winning_trade("t2"),
            ],
            vec![
                rel("c", "m", RelationshipType::ConceptUsedInModel),
                rel("m", "t1", RelationshipType::ModelProducesTrade),
                rel("m", "t2", RelationshipType::ModelProducesTrade),
            ],
        )
        .unwrap()
    }

    fn miner() -> KnowledgeMiner {
        KnowledgeMiner::new(
            Arc::new(MetadataLabeler),
            None,
            MiningConfig::default(),
            InsightConfig::default(),
        )
    }

    #[test]
    fn test_mine_fvg_scenario() {
        let pass = miner().mine(&fvg_snapshot());

        assert_eq!(pass.concept_scores["FVG"].win_rate, 1.0);
        assert_eq!(pass.concept_scores["FVG"].sample_size, 2);
        let chains: Vec<_> = pass
            .structural_patterns
            .iter()
            .filter(|p| p.pattern_type == crate::models::PatternType::Chain)
            .collect();
        assert_eq!(chains.len(), 1);
        assert_eq!(chains[0].member_entities.len(), 4);
        assert_eq!(pass.trades_analyzed, 2);
        assert_eq!(pass.winning_trades, 2);
    }

    #[tokio::test]
    async fn test_run_without_generator_uses_fallback() {
        let miner = miner();
        let report = miner.run(&fvg_snapshot()).await;

        assert!(report.version.starts_with("v1-"));
        assert!(!report.insights.is_empty());
        assert_eq!(
            report.insight_source,
            InsightSource::Fallback {
                reason: "generator disabled".to_string()
            }
        );
        let metrics = miner.metrics().gather();
        assert!(metrics.contains("insight_fallback_total 1"));
        assert!(metrics.contains("insight_generator_failures_total 0"));
    }

    #[test]
    fn test_score_trade() {
        let miner = miner();
        let snapshot = fvg_snapshot();
        let pass = miner.mine(&snapshot);

        assert!(miner.score_trade(&snapshot, &pass, "missing").is_none());
        let score = miner.score_trade(&snapshot, &pass, "t1").unwrap();
        assert!((0.0..=10.0).contains(&score.score));
    }

    #[test]
    fn test_create_knowledge_miner_from_config() {
        let config = AppConfig::development();
        let miner = create_knowledge_miner(&config, Arc::new(MetadataLabeler)).unwrap();
        assert!(!miner.has_generator);
    }
}
