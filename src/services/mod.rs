//! 服务模块

pub mod graph_index;
pub mod insight_synthesizer;
pub mod knowledge_miner;
pub mod labeler;
pub mod outcome_miner;
pub mod structure_detector;
pub mod trade_scorer;
pub mod usage_analyzer;

pub use graph_index::GraphIndex;
pub use insight_synthesizer::{
    InsightGenerator, InsightInputs, InsightRequest, InsightSynthesizer, PatternDigest, Synthesis,
    parse_insights,
};
pub use knowledge_miner::{KnowledgeMiner, MiningPass, create_knowledge_miner};
pub use labeler::{MetadataLabeler, PredicateLabeler, TradeLabeler};
pub use outcome_miner::{LabeledTrades, OutcomeMiner, OutcomeReport};
pub use structure_detector::StructureDetector;
pub use trade_scorer::TradeScorer;
pub use usage_analyzer::{UsageAnalyzer, UsageReport};
