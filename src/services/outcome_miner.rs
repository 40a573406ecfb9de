//! Outcome Pattern Miner
//!
//! Mines the labeled trade history for recurring success and failure patterns
//! and for the setup qualities that separate winners from losers.

use std::collections::{BTreeSet, HashMap};

use crate::config::MiningConfig;
use crate::models::entity::{Entity, EntityType, RelationshipType};
use crate::models::metadata::TradeOutcome;
use crate::models::training::{QualityFactor, TrainingPattern, TrainingPatternType};
use crate::services::graph_index::GraphIndex;
use crate::services::labeler::TradeLabeler;
use crate::services::usage_analyzer::mean;

/// Trades split by outcome; unlabeled trades are only counted
#[derive(Debug, Clone, Default)]
pub struct LabeledTrades<'a> {
    pub winning: Vec<&'a Entity>,
    pub losing: Vec<&'a Entity>,
    pub unlabeled: usize,
}

impl LabeledTrades<'_> {
    pub fn labeled_count(&self) -> usize {
        self.winning.len() + self.losing.len()
    }

    pub fn total_count(&self) -> usize {
        self.labeled_count() + self.unlabeled
    }
}

/// Output of one mining run over the trade history
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutcomeReport {
    pub trades_analyzed: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub training_patterns: Vec<TrainingPattern>,
    pub quality_factors: Vec<QualityFactor>,
}

/// Groups keyed by label, iterated in first-seen order
struct Groups<'a> {
    order: Vec<String>,
    members: HashMap<String, Vec<&'a Entity>>,
}

impl<'a> Groups<'a> {
    fn new() -> Self {
        Self {
            order: Vec::new(),
            members: HashMap::new(),
        }
    }

    fn push(&mut self, key: String, trade: &'a Entity) {
        if !self.members.contains_key(&key) {
            self.order.push(key.clone());
        }
        self.members.entry(key).or_default().push(trade);
    }

    fn iter(&self) -> impl Iterator<Item = (&str, &[&'a Entity])> + '_ {
        self.order.iter().filter_map(|key| {
            self.members
                .get(key)
                .map(|trades| (key.as_str(), trades.as_slice()))
        })
    }
}

/// Win/loss tallies for one session or instrument label
#[derive(Default)]
struct GroupStats<'a> {
    wins: Vec<&'a Entity>,
    losses: Vec<&'a Entity>,
}

impl GroupStats<'_> {
    fn total(&self) -> usize {
        self.wins.len() + self.losses.len()
    }

    fn win_rate(&self) -> f64 {
        self.wins.len() as f64 / self.total() as f64
    }
}

/// Outcome pattern miner
pub struct OutcomeMiner<'c, 'l> {
    config: &'c MiningConfig,
    labeler: &'l dyn TradeLabeler,
}

impl<'c, 'l> OutcomeMiner<'c, 'l> {
    pub fn new(config: &'c MiningConfig, labeler: &'l dyn TradeLabeler) -> Self {
        Self { config, labeler }
    }

    /// Split trade entities by outcome, in entity order
    pub fn partition<'a>(&self, index: &GraphIndex<'a>) -> LabeledTrades<'a> {
        let mut trades = LabeledTrades::default();
        for trade in index.entities_of(EntityType::Trade) {
            match self.labeler.outcome(trade) {
                Some(TradeOutcome::Win) => trades.winning.push(trade),
                Some(TradeOutcome::Loss) => trades.losing.push(trade),
                None => trades.unlabeled += 1,
            }
        }
        trades
    }

    /// Sorted distinct names of the concepts a trade uses
    pub fn concept_names(&self, index: &GraphIndex<'_>, trade: &Entity) -> BTreeSet<String> {
        index
            .outgoing(&trade.id, RelationshipType::TradeUsesConcept)
            .into_iter()
            .filter(|c| c.is(EntityType::Concept))
            .map(|c| c.name.clone())
            .collect()
    }

    pub fn mine(&self, index: &GraphIndex<'_>) -> OutcomeReport {
        let trades = self.partition(index);
        tracing::debug!(
            "Outcome mining over {} winning, {} losing, {} unlabeled trades",
            trades.winning.len(),
            trades.losing.len(),
            trades.unlabeled
        );

        let mut patterns = self.success_combinations(index, &trades);
        patterns.extend(self.session_patterns(&trades));
        patterns.extend(self.instrument_patterns(&trades));
        patterns.extend(self.root_cause_patterns(index, &trades));

        OutcomeReport {
            trades_analyzed: trades.total_count(),
            winning_trades: trades.winning.len(),
            losing_trades: trades.losing.len(),
            training_patterns: patterns,
            quality_factors: self.quality_factors(index, &trades),
        }
    }

    /// Concept combinations shared by winning trades
    pub fn success_combinations(
        &self,
        index: &GraphIndex<'_>,
        trades: &LabeledTrades<'_>,
    ) -> Vec<TrainingPattern> {
        let mut combos = Groups::new();
        let mut combo_concepts: HashMap<String, Vec<String>> = HashMap::new();
        for &trade in &trades.winning {
            let names = self.concept_names(index, trade);
            if names.len() >= 2 {
                let key = combination_key(&names);
                combo_concepts
                    .entry(key.clone())
                    .or_insert_with(|| names.into_iter().collect());
                combos.push(key, trade);
            }
        }

        let losing_sets: Vec<BTreeSet<String>> = trades
            .losing
            .iter()
            .map(|t| self.concept_names(index, t))
            .collect();

        let mut patterns = Vec::new();
        for (key, supporting) in combos.iter() {
            if supporting.len() < 2 {
                continue;
            }

            let concepts = combo_concepts.get(key).cloned().unwrap_or_default();
            let losses = losing_sets
                .iter()
                .filter(|set| concepts.iter().all(|c| set.contains(c)))
                .count();
            let win_rate = combination_win_rate(supporting.len(), losses);
            if win_rate < self.config.success_win_rate {
                continue;
            }

            patterns.push(TrainingPattern {
                id: format!("success-{}", slug(key)),
                pattern_type: TrainingPatternType::Success,
                name: format!("High Win Rate: {}", key),
                description: format!(
                    "The combination of {} has produced {} winning trades with a {:.0}% win rate",
                    key,
                    supporting.len(),
                    win_rate * 100.0
                ),
                confidence: win_rate,
                supporting_trade_ids: ids(supporting),
                conditions: self.common_conditions(supporting),
                recommendations: vec![
                    format!(
                        "Prioritize setups that combine {}",
                        concepts.iter().take(2).cloned().collect::<Vec<_>>().join(" and ")
                    ),
                    format!("This pattern has proven reliable across {} trades", supporting.len()),
                    "Look for these concepts forming together during optimal market conditions"
                        .to_string(),
                ],
                concepts,
                models: Vec::new(),
            });
        }

        patterns
    }

    /// Sessions with a strong record. Weak sessions produce no failure pattern.
    pub fn session_patterns(&self, trades: &LabeledTrades<'_>) -> Vec<TrainingPattern> {
        let mut patterns = Vec::new();
        for (session, stats) in self.group_stats(trades, |t| self.labeler.session(t)) {
            let total = stats.total();
            if total < self.config.specialization_min_trades {
                continue;
            }
            let win_rate = stats.win_rate();
            if win_rate < self.config.specialization_win_rate {
                continue;
            }

            patterns.push(TrainingPattern {
                id: format!("session-success-{}", slug(&session)),
                pattern_type: TrainingPatternType::Success,
                name: format!("Strong {} Session Performance", session),
                description: format!(
                    "You have a {:.0}% win rate during {} sessions across {} trades",
                    win_rate * 100.0,
                    session,
                    total
                ),
                confidence: win_rate,
                supporting_trade_ids: ids(&stats.wins),
                concepts: Vec::new(),
                models: Vec::new(),
                conditions: vec![format!("Trades during {} session", session)],
                recommendations: vec![
                    format!(
                        "Focus your trading activity on {} sessions where you perform best",
                        session
                    ),
                    format!("Your edge is strongest during {} market conditions", session),
                    format!(
                        "Consider increasing position size during confirmed {} setups",
                        session
                    ),
                ],
            });
        }
        patterns
    }

    /// Instruments with a strong record, and instruments with a weak one
    pub fn instrument_patterns(&self, trades: &LabeledTrades<'_>) -> Vec<TrainingPattern> {
        let mut patterns = Vec::new();
        for (pair, stats) in self.group_stats(trades, |t| self.labeler.instrument(t)) {
            let total = stats.total();
            if total < self.config.specialization_min_trades {
                continue;
            }
            let win_rate = stats.win_rate();
            let percent = win_rate * 100.0;

            if win_rate >= self.config.specialization_win_rate {
                patterns.push(TrainingPattern {
                    id: format!("pair-success-{}", slug(&pair)),
                    pattern_type: TrainingPatternType::Success,
                    name: format!("{} Excellence", pair),
                    description: format!(
                        "You excel at trading {} with {:.0}% win rate over {} trades",
                        pair, percent, total
                    ),
                    confidence: win_rate,
                    supporting_trade_ids: ids(&stats.wins),
                    concepts: Vec::new(),
                    models: Vec::new(),
                    conditions: vec![format!("Trading {}", pair)],
                    recommendations: vec![
                        format!("Prioritize {} setups in your watchlist", pair),
                        format!(
                            "You've demonstrated strong understanding of {} price action",
                            pair
                        ),
                        format!("Consider specializing in {} to deepen your edge", pair),
                    ],
                });
            } else if win_rate < self.config.instrument_failure_win_rate {
                patterns.push(TrainingPattern {
                    id: format!("pair-failure-{}", slug(&pair)),
                    pattern_type: TrainingPatternType::Failure,
                    name: format!("{} Weakness", pair),
                    description: format!(
                        "{} shows only {:.0}% win rate across {} trades",
                        pair, percent, total
                    ),
                    confidence: 1.0 - win_rate,
                    supporting_trade_ids: ids(&stats.losses),
                    concepts: Vec::new(),
                    models: Vec::new(),
                    conditions: vec![format!("Trading {}", pair)],
                    recommendations: vec![
                        format!(
                            "Avoid or reduce exposure to {} until you improve your analysis",
                            pair
                        ),
                        format!("Study {} price action more deeply before taking trades", pair),
                        format!("Consider paper trading {} to build confidence", pair),
                    ],
                });
            }
        }
        patterns
    }

    /// Losing trades grouped by recorded root cause
    pub fn root_cause_patterns(
        &self,
        index: &GraphIndex<'_>,
        trades: &LabeledTrades<'_>,
    ) -> Vec<TrainingPattern> {
        let mut causes = Groups::new();
        for &trade in &trades.losing {
            if let Some(cause) = self.labeler.root_cause(trade) {
                causes.push(cause, trade);
            }
        }

        let total_losses = trades.losing.len() as f64;
        let mut patterns = Vec::new();
        for (reason, group) in causes.iter() {
            if group.len() < 2 {
                continue;
            }

            let mut concepts: Vec<String> = Vec::new();
            let mut models: Vec<String> = Vec::new();
            for trade in group {
                for name in self.concept_names(index, trade) {
                    if !concepts.contains(&name) {
                        concepts.push(name);
                    }
                }
                if let Some(model) = self.labeler.model_name(trade) {
                    if !models.contains(&model) {
                        models.push(model);
                    }
                }
            }

            patterns.push(TrainingPattern {
                id: format!("failure-{}", slug(reason)),
                pattern_type: TrainingPatternType::Failure,
                name: format!("Common Failure: {}", reason),
                description: format!("{} trades failed due to: {}", group.len(), reason),
                confidence: group.len() as f64 / total_losses,
                supporting_trade_ids: ids(group),
                concepts,
                models,
                conditions: self.common_conditions(group),
                recommendations: vec![
                    format!("Avoid setups when {}", reason.to_lowercase()),
                    format!("This failure mode has occurred in {} trades", group.len()),
                    "Implement pre-trade checklist to screen for this condition".to_string(),
                ],
            });
        }

        patterns
    }

    /// Confluence, grade and timing factors; each check is independent
    pub fn quality_factors(
        &self,
        index: &GraphIndex<'_>,
        trades: &LabeledTrades<'_>,
    ) -> Vec<QualityFactor> {
        let mut factors = Vec::new();

        let has_confluence = |trade: &Entity| {
            self.concept_names(index, trade).len() >= self.config.confluence_min_concepts
        };
        let confluent_wins = trades.winning.iter().filter(|&&t| has_confluence(t)).count();
        let confluent_losses = trades.losing.iter().filter(|&&t| has_confluence(t)).count();
        let confluence_rate = ratio(confluent_wins, confluent_wins + confluent_losses);
        let baseline_rate = ratio(trades.winning.len(), trades.labeled_count());

        if confluence_rate > baseline_rate {
            factors.push(QualityFactor {
                factor: "High Concept Confluence".to_string(),
                impact: (confluence_rate - baseline_rate) * 100.0,
                description: format!(
                    "Trades with {}+ concepts have {:.0}% win rate vs {:.0}% baseline",
                    self.config.confluence_min_concepts,
                    confluence_rate * 100.0,
                    baseline_rate * 100.0
                ),
            });
        }

        let winning_grades: Vec<f64> = trades
            .winning
            .iter()
            .filter_map(|t| self.labeler.quality_grade(t))
            .collect();
        if let Some(avg_winning) = mean(&winning_grades) {
            let losing_grades: Vec<f64> = trades
                .losing
                .iter()
                .filter_map(|t| self.labeler.quality_grade(t))
                .collect();
            let avg_losing = mean(&losing_grades).unwrap_or(0.0);

            if avg_winning > avg_losing + 1.0 {
                factors.push(QualityFactor {
                    factor: "Setup Quality Score".to_string(),
                    impact: avg_winning - avg_losing,
                    description: format!(
                        "Winning trades average {:.1}/10 vs losing trades at {:.1}/10",
                        avg_winning, avg_losing
                    ),
                });
            }
        }

        if !trades.winning.is_empty() {
            let timed = trades
                .winning
                .iter()
                .filter(|t| self.labeler.killzone(t).is_some() || self.labeler.session(t).is_some())
                .count();
            let share = timed as f64 / trades.winning.len() as f64;
            if share >= self.config.timing_share {
                factors.push(QualityFactor {
                    factor: "Optimal Time Entry".to_string(),
                    impact: self.config.timing_impact,
                    description: format!(
                        "{:.0}% of winning trades occurred during identified killzones",
                        share * 100.0
                    ),
                });
            }
        }

        factors
    }

    /// Dominant session (60%+) and instrument (50%+) among `trades`
    pub fn common_conditions(&self, trades: &[&Entity]) -> Vec<String> {
        let mut conditions = Vec::new();
        let total = trades.len() as f64;

        let sessions: Vec<String> = trades.iter().filter_map(|t| self.labeler.session(t)).collect();
        if let Some((session, count)) = dominant(&sessions) {
            if count as f64 >= total * 0.6 {
                conditions.push(format!("Occurs primarily during {} session", session));
            }
        }

        let pairs: Vec<String> = trades
            .iter()
            .filter_map(|t| self.labeler.instrument(t))
            .collect();
        if let Some((pair, count)) = dominant(&pairs) {
            if count as f64 >= total * 0.5 {
                conditions.push(format!("Most common on {}", pair));
            }
        }

        conditions
    }

    fn group_stats<'a, F>(
        &self,
        trades: &LabeledTrades<'a>,
        label: F,
    ) -> Vec<(String, GroupStats<'a>)>
    where
        F: Fn(&Entity) -> Option<String>,
    {
        let mut order: Vec<String> = Vec::new();
        let mut stats: HashMap<String, GroupStats<'a>> = HashMap::new();

        let tagged = trades
            .winning
            .iter()
            .map(|t| (*t, true))
            .chain(trades.losing.iter().map(|t| (*t, false)));
        for (trade, won) in tagged {
            let Some(key) = label(trade) else {
                continue;
            };
            let entry = stats.entry(key.clone()).or_insert_with(|| {
                order.push(key);
                GroupStats::default()
            });
            if won {
                entry.wins.push(trade);
            } else {
                entry.losses.push(trade);
            }
        }

        order
            .into_iter()
            .filter_map(|key| stats.remove(&key).map(|s| (key, s)))
            .collect()
    }
}

/// Winning share of trades that carry a combination
pub fn combination_win_rate(wins: usize, losses: usize) -> f64 {
    ratio(wins, wins + losses)
}

/// Sorted distinct concept names joined with " + "
pub fn combination_key(names: &BTreeSet<String>) -> String {
    names.iter().map(String::as_str).collect::<Vec<_>>().join(" + ")
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

fn ids(trades: &[&Entity]) -> Vec<String> {
    trades.iter().map(|t| t.id.clone()).collect()
}

/// Most frequent value; ties go to the value seen first
fn dominant(values: &[String]) -> Option<(&str, usize)> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for value in values {
        match counts.iter_mut().find(|(v, _)| *v == value.as_str()) {
            Some((_, count)) => *count += 1,
            None => counts.push((value.as_str(), 1)),
        }
    }
    counts
        .into_iter()
        .fold(None, |best: Option<(&str, usize)>, current| match best {
            Some(b) if b.1 >= current.1 => Some(b),
            _ => Some(current),
        })
}

fn slug(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    for ch in value.chars() {
        if ch.is_alphanumeric() {
            slug.extend(ch.to_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_matches('-').to_string()
}
