//! 核心数据模型模块
//!
//! 定义知识图谱的输入结构（Entity, Relationship, GraphSnapshot）
//! 以及挖掘输出（Pattern, UsageScore, TrainingPattern, TrainingInsight 等）。

pub mod entity;
pub mod metadata;
pub mod pattern;
pub mod report;
pub mod snapshot;
pub mod training;

pub use entity::*;
pub use metadata::*;
pub use pattern::*;
pub use report::*;
pub use snapshot::*;
pub use training::*;
