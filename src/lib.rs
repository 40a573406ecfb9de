//! Tradegraph - 知识图谱模式挖掘引擎
//!
//! 从交易方法论知识库（概念、模型、交易及其关系）中挖掘结构模式、
//! 使用统计与成功/失败模式，并生成可操作的训练洞察。

pub mod config;
pub mod error;
pub mod generation;
pub mod models;
pub mod observability;
pub mod services;

pub use error::{AppError, Result};
pub use models::{GraphSnapshot, MiningReport};
pub use services::{KnowledgeMiner, MetadataLabeler, TradeLabeler, create_knowledge_miner};
