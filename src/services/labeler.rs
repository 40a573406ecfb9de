//! Trade labeling strategy
//!
//! The engine has no built-in notion of which metadata keys record a trade's
//! outcome. Callers inject a [`TradeLabeler`]; the mining code only asks it
//! questions.

use crate::models::entity::Entity;
use crate::models::metadata::TradeOutcome;

/// Caller-supplied view of trade outcomes and grouping labels
///
/// Only `outcome` is required. The remaining accessors default to the host
/// application's metadata conventions (see [`crate::models::TradeMetadata`]).
pub trait TradeLabeler: Send + Sync {
    /// `None` means the trade is unlabeled and is excluded from statistics
    fn outcome(&self, trade: &Entity) -> Option<TradeOutcome>;

    fn session(&self, trade: &Entity) -> Option<String> {
        trade.trade_metadata().session().map(str::to_string)
    }

    fn killzone(&self, trade: &Entity) -> Option<String> {
        trade.trade_metadata().killzone().map(str::to_string)
    }

    fn instrument(&self, trade: &Entity) -> Option<String> {
        trade.trade_metadata().instrument().map(str::to_string)
    }

    fn quality_grade(&self, trade: &Entity) -> Option<f64> {
        trade.trade_metadata().quality_grade()
    }

    fn root_cause(&self, trade: &Entity) -> Option<String> {
        trade.trade_metadata().root_cause().map(str::to_string)
    }

    fn model_name(&self, trade: &Entity) -> Option<String> {
        trade.trade_metadata().model_name().map(str::to_string)
    }

    fn is_win(&self, trade: &Entity) -> bool {
        self.outcome(trade) == Some(TradeOutcome::Win)
    }
}

impl<F> TradeLabeler for F
where
    F: Fn(&Entity) -> Option<TradeOutcome> + Send + Sync,
{
    fn outcome(&self, trade: &Entity) -> Option<TradeOutcome> {
        self(trade)
    }
}

/// Labels trades using the host application's metadata convention
#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataLabeler;

impl TradeLabeler for MetadataLabeler {
    fn outcome(&self, trade: &Entity) -> Option<TradeOutcome> {
        trade.trade_metadata().outcome()
    }
}

/// Adapts a plain win predicate; every trade counts as labeled
pub struct PredicateLabeler<F> {
    is_winning: F,
}

impl<F> PredicateLabeler<F>
where
    F: Fn(&Entity) -> bool + Send + Sync,
{
    pub fn new(is_winning: F) -> Self {
        Self { is_winning }
    }
}

impl<F> TradeLabeler for PredicateLabeler<F>
where
    F: Fn(&Entity) -> bool + Send + Sync,
{
    fn outcome(&self, trade: &Entity) -> Option<TradeOutcome> {
        if (self.is_winning)(trade) {
            Some(TradeOutcome::Win)
        } else {
            Some(TradeOutcome::Loss)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::entity::EntityType;
    use serde_json::json;

    fn trade_with(key: &str, value: serde_json::Value) -> Entity {
        let mut trade = Entity::with_id("t", "T", EntityType::Trade);
        trade.set_metadata(key, value);
        trade
    }

    #[test]
    fn test_metadata_labeler() {
        let win = trade_with("execution", json!({"result": "WIN"}));
        let loss = trade_with("meta", json!({"example_type": "negative"}));
        let unknown = trade_with("notes", json!("no outcome"));

        assert_eq!(MetadataLabeler.outcome(&win), Some(TradeOutcome::Win));
        assert_eq!(MetadataLabeler.outcome(&loss), Some(TradeOutcome::Loss));
        assert_eq!(MetadataLabeler.outcome(&unknown), None);
        assert!(MetadataLabeler.is_win(&win));
    }

    #[test]
    fn test_closure_labeler() {
        let labeler = |trade: &Entity| {
            trade
                .tags
                .iter()
                .any(|t| t == "win")
                .then_some(TradeOutcome::Win)
        };
        let mut trade = Entity::with_id("t", "T", EntityType::Trade);
        assert_eq!(labeler.outcome(&trade), None);
        trade.add_tag("win");
        assert_eq!(labeler.outcome(&trade), Some(TradeOutcome::Win));
    }

    #[test]
    fn test_predicate_labeler_labels_everything() {
        let labeler = PredicateLabeler::new(|trade: &Entity| trade.name.contains("Winner"));
        let winner = Entity::with_id("a", "GBPUSD Winner", EntityType::Trade);
        let other = Entity::with_id("b", "EURUSD", EntityType::Trade);
        assert_eq!(labeler.outcome(&winner), Some(TradeOutcome::Win));
        assert_eq!(labeler.outcome(&other), Some(TradeOutcome::Loss));
    }

    #[test]
    fn test_default_accessors() {
        let trade = trade_with("market", json!({"pair": "EURUSD"}));
        assert_eq!(MetadataLabeler.instrument(&trade).as_deref(), Some("EURUSD"));
        assert_eq!(MetadataLabeler.session(&trade), None);
    }
}
