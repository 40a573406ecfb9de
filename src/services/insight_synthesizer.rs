//! Insight Synthesizer
//!
//! Turns usage scores, training patterns and quality factors into
//! [`TrainingInsight`] records. Prose comes from an optional external
//! [`InsightGenerator`]; when it is absent, fails, times out or returns
//! something that does not look like insights, a deterministic fallback
//! derives the insights from the statistics alone.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use crate::config::InsightConfig;
use crate::error::{AppError, Result};
use crate::models::pattern::PatternSummary;
use crate::models::report::InsightSource;
use crate::models::training::{
    InsightCategory, InsightPriority, QualityFactor, TrainingInsight, TrainingPattern,
    TrainingPatternType, UsageScore,
};

/// External text-generation collaborator
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InsightGenerator: Send + Sync {
    /// Produce raw text that should contain a JSON list of insights
    async fn generate(&self, request: &InsightRequest) -> Result<String>;

    /// Identifier recorded in the insight source
    fn name(&self) -> String;
}

/// Aggregate statistics handed to the generator. Carries names and numbers
/// only, never raw trade metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightRequest {
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: f64,
    pub concept_scores: Vec<UsageScore>,
    pub model_scores: Vec<UsageScore>,
    pub patterns: Vec<PatternDigest>,
    pub quality_factors: Vec<QualityFactor>,
    pub structural_patterns: Vec<PatternSummary>,
}

/// Training pattern reduced to what the generator needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternDigest {
    pub pattern_type: TrainingPatternType,
    pub name: String,
    pub confidence: f64,
    pub supporting_trades: usize,
}

impl From<&TrainingPattern> for PatternDigest {
    fn from(pattern: &TrainingPattern) -> Self {
        Self {
            pattern_type: pattern.pattern_type,
            name: pattern.name.clone(),
            confidence: pattern.confidence,
            supporting_trades: pattern.supporting_trade_ids.len(),
        }
    }
}

/// Borrowed view of one pass's statistics
#[derive(Debug, Clone, Copy)]
pub struct InsightInputs<'a> {
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub concept_scores: &'a BTreeMap<String, UsageScore>,
    pub model_scores: &'a BTreeMap<String, UsageScore>,
    pub training_patterns: &'a [TrainingPattern],
    pub quality_factors: &'a [QualityFactor],
    pub structural_patterns: &'a [PatternSummary],
}

impl InsightInputs<'_> {
    pub fn has_statistics(&self) -> bool {
        !self.concept_scores.is_empty()
            || !self.model_scores.is_empty()
            || !self.training_patterns.is_empty()
    }

    pub fn to_request(&self) -> InsightRequest {
        let labeled = self.winning_trades + self.losing_trades;
        InsightRequest {
            total_trades: self.total_trades,
            winning_trades: self.winning_trades,
            losing_trades: self.losing_trades,
            win_rate: if labeled == 0 {
                0.0
            } else {
                self.winning_trades as f64 / labeled as f64
            },
            concept_scores: self.concept_scores.values().cloned().collect(),
            model_scores: self.model_scores.values().cloned().collect(),
            patterns: self.training_patterns.iter().map(PatternDigest::from).collect(),
            quality_factors: self.quality_factors.to_vec(),
            structural_patterns: self.structural_patterns.to_vec(),
        }
    }
}

impl InsightRequest {
    /// Render the request as a coaching prompt asking for JSON output
    pub fn to_prompt(&self) -> String {
        let mut prompt = String::from(
            "You are an expert ICT trading coach analyzing a trader's historical performance.\n\n",
        );

        prompt.push_str("TRADER'S DATA:\n");
        prompt.push_str(&format!("- Total trades: {}\n", self.total_trades));
        prompt.push_str(&format!("- Winning trades: {}\n", self.winning_trades));
        prompt.push_str(&format!("- Losing trades: {}\n", self.losing_trades));
        prompt.push_str(&format!("- Overall win rate: {:.1}%\n\n", self.win_rate * 100.0));

        prompt.push_str("CONCEPT PERFORMANCE:\n");
        for score in &self.concept_scores {
            prompt.push_str(&score_line(score));
        }
        prompt.push_str("\nMODEL PERFORMANCE:\n");
        for score in &self.model_scores {
            prompt.push_str(&score_line(score));
        }

        prompt.push_str("\nDISCOVERED PATTERNS:\n");
        for pattern in &self.patterns {
            prompt.push_str(&format!(
                "- {}: {} ({:.0}% confidence, {} trades)\n",
                pattern.pattern_type.to_string().to_uppercase(),
                pattern.name,
                pattern.confidence * 100.0,
                pattern.supporting_trades
            ));
        }

        prompt.push_str("\nQUALITY FACTORS:\n");
        for factor in &self.quality_factors {
            prompt.push_str(&format!("- {}: +{:.1}% impact\n", factor.factor, factor.impact));
        }

        prompt.push_str("\nGRAPH STRUCTURE:\n");
        for pattern in &self.structural_patterns {
            prompt.push_str(&format!(
                "- {} {}: {} entities, strength {:.2}\n",
                pattern.pattern_type, pattern.name, pattern.entity_count, pattern.strength
            ));
        }

        prompt.push_str(
            "\nReturn a JSON object with a single \"insights\" property containing an array of \
             objects with these fields:\n\
             - category: one of \"concept_effectiveness\", \"model_performance\", \
             \"setup_quality\", \"execution\", \"market_conditions\"\n\
             - insight: a clear, specific insight statement\n\
             - evidence: array of 2-4 data points supporting this insight\n\
             - actionable: specific action the trader should take\n\
             - priority: \"high\", \"medium\", or \"low\"\n",
        );
        prompt
    }
}

fn score_line(score: &UsageScore) -> String {
    let quality = score
        .avg_quality
        .map(|q| format!(" - avg quality {:.1}/10", q))
        .unwrap_or_default();
    format!(
        "- {}: {:.0}% win rate ({} trades){}\n",
        score.subject_name,
        score.win_rate * 100.0,
        score.sample_size,
        quality
    )
}

#[derive(Deserialize)]
struct RawInsight {
    category: InsightCategory,
    #[serde(alias = "insight")]
    statement: String,
    #[serde(default)]
    evidence: Vec<String>,
    #[serde(alias = "actionable")]
    action: String,
    priority: InsightPriority,
}

/// Validate a generator response
///
/// Accepts `{"insights": [...]}` or a bare array. Items that do not match the
/// insight shape are dropped; a response with no valid item is malformed.
pub fn parse_insights(raw: &str) -> Result<Vec<TrainingInsight>> {
    let value: Value = serde_json::from_str(raw.trim())
        .map_err(|e| AppError::MalformedResponse(format!("not JSON: {}", e)))?;

    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut object) => match object.remove("insights") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(AppError::MalformedResponse(
                    "missing \"insights\" array".to_string(),
                ));
            }
        },
        _ => {
            return Err(AppError::MalformedResponse(
                "expected an object or an array".to_string(),
            ));
        }
    };

    let insights: Vec<TrainingInsight> = items
        .into_iter()
        .filter_map(|item| serde_json::from_value::<RawInsight>(item).ok())
        .filter(|raw| !raw.statement.trim().is_empty())
        .map(|raw| TrainingInsight {
            category: raw.category,
            statement: raw.statement,
            evidence: raw.evidence,
            action: raw.action,
            priority: raw.priority,
        })
        .collect();

    if insights.is_empty() {
        return Err(AppError::MalformedResponse(
            "no valid insight objects".to_string(),
        ));
    }
    Ok(insights)
}

/// Result of one synthesis
#[derive(Debug, Clone, PartialEq)]
pub struct Synthesis {
    pub insights: Vec<TrainingInsight>,
    pub source: InsightSource,
}

/// Insight synthesizer
pub struct InsightSynthesizer {
    generator: Option<Arc<dyn InsightGenerator>>,
    config: InsightConfig,
}

impl InsightSynthesizer {
    pub fn new(generator: Option<Arc<dyn InsightGenerator>>, config: InsightConfig) -> Self {
        Self { generator, config }
    }

    /// Generate insights, falling back to local derivation on any failure
    pub async fn synthesize(&self, inputs: &InsightInputs<'_>) -> Synthesis {
        let Some(generator) = &self.generator else {
            return self.fallback_synthesis(inputs, "generator disabled".to_string());
        };

        match self.generate_with(generator.as_ref(), inputs).await {
            Ok(insights) => {
                tracing::info!(
                    "Generator {} produced {} insights",
                    generator.name(),
                    insights.len()
                );
                Synthesis {
                    insights,
                    source: InsightSource::Generator {
                        name: generator.name(),
                    },
                }
            }
            Err(e) => {
                tracing::warn!("Insight generation failed, using fallback: {}", e);
                self.fallback_synthesis(inputs, format!("{}: {}", e.code(), e))
            }
        }
    }

    async fn generate_with(
        &self,
        generator: &dyn InsightGenerator,
        inputs: &InsightInputs<'_>,
    ) -> Result<Vec<TrainingInsight>> {
        let request = inputs.to_request();
        let timeout = Duration::from_secs(self.config.timeout_secs);

        let raw = tokio::time::timeout(timeout, generator.generate(&request))
            .await
            .map_err(|_| {
                AppError::Timeout(format!(
                    "insight generation exceeded {}s",
                    self.config.timeout_secs
                ))
            })??;

        parse_insights(&raw)
    }

    fn fallback_synthesis(&self, inputs: &InsightInputs<'_>, reason: String) -> Synthesis {
        let insights = self.fallback(inputs);
        tracing::debug!("Fallback produced {} insights ({})", insights.len(), reason);
        Synthesis {
            insights,
            source: InsightSource::Fallback { reason },
        }
    }

    /// Deterministic insights derived from the statistics alone
    pub fn fallback(&self, inputs: &InsightInputs<'_>) -> Vec<TrainingInsight> {
        let mut insights = Vec::new();

        let concepts = ranked(inputs.concept_scores, 2);

        if let Some(top) = concepts.first() {
            insights.push(TrainingInsight {
                category: InsightCategory::ConceptEffectiveness,
                statement: format!(
                    "\"{}\" shows highest effectiveness with {:.0}% win rate",
                    top.subject_name,
                    top.win_rate * 100.0
                ),
                evidence: with_quality(
                    vec![format!("Sample size: {} trades", top.sample_size)],
                    top.avg_quality.map(|q| format!("Average setup quality: {:.1}/10", q)),
                    vec![format!(
                        "Outperforms other concepts by {:.0}%",
                        (top.win_rate - 0.5) * 100.0
                    )],
                ),
                action: format!(
                    "Prioritize identifying \"{}\" in your pre-trade analysis. Look for \
                     high-probability setups featuring this concept.",
                    top.subject_name
                ),
                priority: InsightPriority::High,
            });
        }

        if let Some(weak) = concepts.iter().rev().find(|s| s.win_rate < 0.4) {
            insights.push(TrainingInsight {
                category: InsightCategory::ConceptEffectiveness,
                statement: format!(
                    "\"{}\" shows low effectiveness with only {:.0}% win rate",
                    weak.subject_name,
                    weak.win_rate * 100.0
                ),
                evidence: with_quality(
                    vec![
                        format!("Sample size: {} trades", weak.sample_size),
                        "Below 50% win rate threshold".to_string(),
                    ],
                    weak.avg_quality.map(|q| format!("Lower setup quality: {:.1}/10", q)),
                    Vec::new(),
                ),
                action: format!(
                    "Review your identification and application of \"{}\". Consider additional \
                     confluence factors when using this concept.",
                    weak.subject_name
                ),
                priority: InsightPriority::Medium,
            });
        }

        if let Some(model) = ranked(inputs.model_scores, 2).first() {
            insights.push(TrainingInsight {
                category: InsightCategory::ModelPerformance,
                statement: format!(
                    "\"{}\" model demonstrates strong performance with {:.0}% win rate",
                    model.subject_name,
                    model.win_rate * 100.0
                ),
                evidence: with_quality(
                    vec![format!("{} trades executed", model.sample_size)],
                    model.avg_quality.map(|q| format!("Average quality: {:.1}/10", q)),
                    vec!["Consistent execution across sample".to_string()],
                ),
                action: format!(
                    "Focus on mastering \"{}\" setup identification. This model aligns well \
                     with your trading style.",
                    model.subject_name
                ),
                priority: InsightPriority::High,
            });
        }

        if let Some(factor) = inputs.quality_factors.first() {
            insights.push(TrainingInsight {
                category: InsightCategory::SetupQuality,
                statement: format!("{} significantly improves outcomes", factor.factor),
                evidence: vec![
                    factor.description.clone(),
                    format!("Impact: +{:.1}% improvement", factor.impact),
                ],
                action: format!(
                    "Always verify {} before entering trades. Make this a mandatory checkpoint \
                     in your trading plan.",
                    factor.factor.to_lowercase()
                ),
                priority: InsightPriority::High,
            });
        }

        let failure = inputs
            .training_patterns
            .iter()
            .filter(|p| p.pattern_type == TrainingPatternType::Failure)
            .fold(None::<&TrainingPattern>, |best, p| match best {
                Some(b) if b.supporting_trade_ids.len() >= p.supporting_trade_ids.len() => Some(b),
                _ => Some(p),
            });
        if let Some(failure) = failure {
            insights.push(TrainingInsight {
                category: InsightCategory::Execution,
                statement: failure.name.clone(),
                evidence: vec![
                    failure.description.clone(),
                    format!("Occurred in {} trades", failure.supporting_trade_ids.len()),
                    format!("Confidence: {:.0}%", failure.confidence * 100.0),
                ],
                action: failure
                    .recommendations
                    .first()
                    .cloned()
                    .unwrap_or_else(|| format!("Screen setups for \"{}\"", failure.name)),
                priority: InsightPriority::High,
            });
        }

        if insights.is_empty() {
            if let Some(insight) = self.last_resort(inputs) {
                insights.push(insight);
            }
        }

        insights.truncate(self.config.max_fallback_insights.max(1));
        insights
    }

    /// Used when none of the primary rules fired
    fn last_resort(&self, inputs: &InsightInputs<'_>) -> Option<TrainingInsight> {
        let strongest = inputs
            .training_patterns
            .iter()
            .filter(|p| p.pattern_type == TrainingPatternType::Success)
            .fold(None::<&TrainingPattern>, |best, p| match best {
                Some(b) if b.confidence >= p.confidence => Some(b),
                _ => Some(p),
            });
        if let Some(pattern) = strongest {
            let category = if pattern.concepts.is_empty() {
                InsightCategory::MarketConditions
            } else {
                InsightCategory::ConceptEffectiveness
            };
            return Some(TrainingInsight {
                category,
                statement: pattern.name.clone(),
                evidence: vec![
                    pattern.description.clone(),
                    format!("Confidence: {:.0}%", pattern.confidence * 100.0),
                ],
                action: pattern
                    .recommendations
                    .first()
                    .cloned()
                    .unwrap_or_else(|| format!("Look for more \"{}\" setups", pattern.name)),
                priority: InsightPriority::Medium,
            });
        }

        let (category, score) = match ranked(inputs.concept_scores, 1).first() {
            Some(score) => (InsightCategory::ConceptEffectiveness, *score),
            None => (
                InsightCategory::ModelPerformance,
                *ranked(inputs.model_scores, 1).first()?,
            ),
        };
        Some(TrainingInsight {
            category,
            statement: format!(
                "\"{}\" leads with {:.0}% win rate on a limited sample",
                score.subject_name,
                score.win_rate * 100.0
            ),
            evidence: vec![format!("Sample size: {} trades", score.sample_size)],
            action: format!(
                "Log more trades using \"{}\" before drawing conclusions",
                score.subject_name
            ),
            priority: InsightPriority::Low,
        })
    }
}

/// Scores with enough samples, best win rate first; ties keep name order
fn ranked(scores: &BTreeMap<String, UsageScore>, min_samples: usize) -> Vec<&UsageScore> {
    let mut ranked: Vec<&UsageScore> = scores
        .values()
        .filter(|s| s.sample_size >= min_samples)
        .collect();
    ranked.sort_by(|a, b| b.win_rate.total_cmp(&a.win_rate));
    ranked
}

fn with_quality(mut head: Vec<String>, quality: Option<String>, tail: Vec<String>) -> Vec<String> {
    head.extend(quality);
    head.extend(tail);
    head
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::always;

    fn score(name: &str, win_rate: f64, sample_size: usize) -> UsageScore {
        UsageScore {
            subject_name: name.to_string(),
            win_rate,
            sample_size,
            avg_quality: None,
        }
    }

    fn failure(name: &str, trades: usize) -> TrainingPattern {
        TrainingPattern {
            id: format!("failure-{}", name),
            pattern_type: TrainingPatternType::Failure,
            name: format!("Common Failure: {}", name),
            description: format!("{} trades failed due to: {}", trades, name),
            confidence: 0.5,
            supporting_trade_ids: (0..trades).map(|i| format!("t{}", i)).collect(),
            concepts: vec![],
            models: vec![],
            conditions: vec![],
            recommendations: vec![format!("Avoid setups when {}", name)],
        }
    }

    struct Fixture {
        concepts: BTreeMap<String, UsageScore>,
        models: BTreeMap<String, UsageScore>,
        patterns: Vec<TrainingPattern>,
        factors: Vec<QualityFactor>,
    }

    impl Fixture {
        fn rich() -> Self {
            let concepts = [
                score("FVG", 0.8, 5),
                score("Breaker", 0.25, 4),
                score("OTE", 0.5, 1),
            ]
            .into_iter()
            .map(|s| (s.subject_name.clone(), s))
            .collect();
            let models = [score("Silver Bullet", 0.7, 10)]
                .into_iter()
                .map(|s| (s.subject_name.clone(), s))
                .collect();
            Self {
                concepts,
                models,
                patterns: vec![failure("late", 2), failure("news", 3)],
                factors: vec![QualityFactor {
                    factor: "High Concept Confluence".to_string(),
                    impact: 20.0,
                    description: "Trades with 3+ concepts win more".to_string(),
                }],
            }
        }

        fn empty() -> Self {
            Self {
                concepts: BTreeMap::new(),
                models: BTreeMap::new(),
                patterns: vec![],
                factors: vec![],
            }
        }

        fn inputs(&self) -> InsightInputs<'_> {
            InsightInputs {
                total_trades: 10,
                winning_trades: 6,
                losing_trades: 4,
                concept_scores: &self.concepts,
                model_scores: &self.models,
                training_patterns: &self.patterns,
                quality_factors: &self.factors,
                structural_patterns: &[],
            }
        }
    }

    fn synthesizer(generator: Option<Arc<dyn InsightGenerator>>) -> InsightSynthesizer {
        InsightSynthesizer::new(generator, InsightConfig::default())
    }

    const VALID_RESPONSE: &str = r#"{"insights": [{
        "category": "model_performance",
        "insight": "Silver Bullet is your edge",
        "evidence": ["70% over 10 trades"],
        "actionable": "Trade it more",
        "priority": "high"
    }]}"#;

    #[test]
    fn test_fallback_rules_in_order() {
        let fixture = Fixture::rich();
        let insights = synthesizer(None).fallback(&fixture.inputs());

        assert_eq!(insights.len(), 5);
        assert!(insights[0].statement.contains("\"FVG\""));
        assert_eq!(insights[0].priority, InsightPriority::High);
        assert!(insights[1].statement.contains("\"Breaker\""));
        assert_eq!(insights[1].priority, InsightPriority::Medium);
        assert_eq!(insights[2].category, InsightCategory::ModelPerformance);
        assert_eq!(insights[3].category, InsightCategory::SetupQuality);
        assert_eq!(insights[4].category, InsightCategory::Execution);
        assert_eq!(insights[4].statement, "Common Failure: news");
        assert_eq!(insights[4].action, "Avoid setups when news");
    }

    #[test]
    fn test_fallback_respects_cap() {
        let fixture = Fixture::rich();
        let config = InsightConfig {
            max_fallback_insights: 2,
            ..InsightConfig::default()
        };
        let insights = InsightSynthesizer::new(None, config).fallback(&fixture.inputs());
        assert_eq!(insights.len(), 2);
    }

    #[test]
    fn test_fallback_keeps_one_insight_when_cap_is_zero() {
        let fixture = Fixture::rich();
        let config = InsightConfig {
            max_fallback_insights: 0,
            ..InsightConfig::default()
        };
        let insights = InsightSynthesizer::new(None, config).fallback(&fixture.inputs());
        assert_eq!(insights.len(), 1);
        assert!(insights[0].statement.contains("\"FVG\""));
    }

    #[test]
    fn test_fallback_non_empty_with_single_small_score() {
        let mut fixture = Fixture::empty();
        fixture
            .concepts
            .insert("FVG".to_string(), score("FVG", 1.0, 1));
        let insights = synthesizer(None).fallback(&fixture.inputs());

        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].priority, InsightPriority::Low);
        assert!(insights[0].statement.contains("limited sample"));
    }

    #[test]
    fn test_fallback_empty_without_statistics() {
        let fixture = Fixture::empty();
        assert!(!fixture.inputs().has_statistics());
        assert!(synthesizer(None).fallback(&fixture.inputs()).is_empty());
    }

    #[test]
    fn test_parse_insights_accepts_aliases_and_bare_arrays() {
        let insights = parse_insights(VALID_RESPONSE).unwrap();
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].statement, "Silver Bullet is your edge");
        assert_eq!(insights[0].action, "Trade it more");

        let bare = r#"[{"category": "execution", "statement": "s", "action": "a", "priority": "low"},
                       {"category": "nonsense", "statement": "s", "action": "a", "priority": "low"}]"#;
        assert_eq!(parse_insights(bare).unwrap().len(), 1);
    }

    #[test]
    fn test_parse_insights_rejects_malformed() {
        for raw in ["not json", r#"{"answer": 42}"#, r#"{"insights": []}"#, "42"] {
            assert!(matches!(
                parse_insights(raw),
                Err(AppError::MalformedResponse(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_generator_success() {
        let mut generator = MockInsightGenerator::new();
        generator
            .expect_generate()
            .with(always())
            .times(1)
            .returning(|_| Ok(VALID_RESPONSE.to_string()));
        generator.expect_name().returning(|| "mock".to_string());

        let fixture = Fixture::rich();
        let synthesis = synthesizer(Some(Arc::new(generator)))
            .synthesize(&fixture.inputs())
            .await;

        assert_eq!(synthesis.insights.len(), 1);
        assert_eq!(
            synthesis.source,
            InsightSource::Generator {
                name: "mock".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_generator_error_falls_back() {
        let mut generator = MockInsightGenerator::new();
        generator
            .expect_generate()
            .returning(|_| Err(AppError::Generation("upstream 500".to_string())));
        generator.expect_name().returning(|| "mock".to_string());

        let fixture = Fixture::rich();
        let synthesis = synthesizer(Some(Arc::new(generator)))
            .synthesize(&fixture.inputs())
            .await;

        assert!(!synthesis.insights.is_empty());
        match synthesis.source {
            InsightSource::Fallback { reason } => assert!(reason.starts_with("GENERATION")),
            other => panic!("unexpected source: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_response_falls_back() {
        let mut generator = MockInsightGenerator::new();
        generator
            .expect_generate()
            .returning(|_| Ok("Here are some thoughts about your trading".to_string()));
        generator.expect_name().returning(|| "mock".to_string());

        let fixture = Fixture::rich();
        let synthesis = synthesizer(Some(Arc::new(generator)))
            .synthesize(&fixture.inputs())
            .await;

        assert_eq!(synthesis.insights, synthesizer(None).fallback(&fixture.inputs()));
        assert!(synthesis.source.is_fallback());
    }

    struct SlowGenerator;

    #[async_trait]
    impl InsightGenerator for SlowGenerator {
        async fn generate(&self, _request: &InsightRequest) -> Result<String> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(VALID_RESPONSE.to_string())
        }

        fn name(&self) -> String {
            "slow".to_string()
        }
    }

    #[tokio::test]
    async fn test_timeout_falls_back() {
        let config = InsightConfig {
            timeout_secs: 1,
            ..InsightConfig::default()
        };
        let fixture = Fixture::rich();
        let synthesis = InsightSynthesizer::new(Some(Arc::new(SlowGenerator)), config)
            .synthesize(&fixture.inputs())
            .await;

        match synthesis.source {
            InsightSource::Fallback { reason } => assert!(reason.starts_with("TIMEOUT")),
            other => panic!("unexpected source: {:?}", other),
        }
    }

    #[test]
    fn test_request_carries_aggregates_only() {
        let fixture = Fixture::rich();
        let request = fixture.inputs().to_request();

        assert!((request.win_rate - 0.6).abs() < 1e-9);
        assert_eq!(request.concept_scores.len(), 3);
        assert_eq!(request.patterns[1].supporting_trades, 3);

        let prompt = request.to_prompt();
        assert!(prompt.contains("- FVG: 80% win rate (5 trades)"));
        assert!(prompt.contains("FAILURE: Common Failure: news"));
    }
}
