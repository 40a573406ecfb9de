//! 训练结果数据模型
//!
//! 使用统计、成功/失败模式、质量因子与洞察。全部在每次挖掘时从头计算。

use serde::{Deserialize, Serialize};

use crate::models::entity::Entity;

/// 概念或模型的使用评分
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageScore {
    /// 概念或模型名称
    pub subject_name: String,
    /// 胜率 [0, 1]
    pub win_rate: f64,
    /// 已标注交易数
    pub sample_size: usize,
    /// 平均质量评分（仅统计带数值评分的交易）
    pub avg_quality: Option<f64>,
}

/// 概念共现
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptPairing {
    pub concept_id: String,
    pub concept_name: String,
    /// 两个概念之间 CONCEPT_RELATED_TO 边的数量（双向各计一次）
    pub count: usize,
}

/// 概念使用画像
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptUsage {
    /// 概念实体
    pub concept: Entity,
    /// 使用该概念的模型
    pub related_models: Vec<Entity>,
    /// 关联交易（直接或经模型）
    pub related_trades: Vec<Entity>,
    /// 使用频率（关联交易数）
    pub usage_frequency: usize,
    /// 成功率（无已标注交易时为空）
    pub success_rate: Option<f64>,
    /// 共现概念
    pub common_pairings: Vec<ConceptPairing>,
}

/// 训练模式类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainingPatternType {
    /// 成功模式
    Success,
    /// 失败模式
    Failure,
}

impl std::fmt::Display for TrainingPatternType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrainingPatternType::Success => write!(f, "success"),
            TrainingPatternType::Failure => write!(f, "failure"),
        }
    }
}

/// 从交易历史中挖掘出的成功/失败模式
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingPattern {
    /// 模式标识（确定性）
    pub id: String,
    /// 模式类型
    pub pattern_type: TrainingPatternType,
    /// 模式名称
    pub name: String,
    /// 模式描述
    pub description: String,
    /// 置信度 [0, 1]
    pub confidence: f64,
    /// 支撑交易 ID
    pub supporting_trade_ids: Vec<String>,
    /// 涉及概念名称
    pub concepts: Vec<String>,
    /// 涉及模型名称
    pub models: Vec<String>,
    /// 共同条件
    pub conditions: Vec<String>,
    /// 建议
    pub recommendations: Vec<String>,
}

/// 洞察类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightCategory {
    ConceptEffectiveness,
    ModelPerformance,
    SetupQuality,
    Execution,
    MarketConditions,
}

/// 洞察优先级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightPriority {
    High,
    Medium,
    Low,
}

/// 训练洞察
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingInsight {
    /// 类别
    pub category: InsightCategory,
    /// 洞察陈述
    pub statement: String,
    /// 证据
    pub evidence: Vec<String>,
    /// 建议操作
    pub action: String,
    /// 优先级
    pub priority: InsightPriority,
}

/// 设置质量因子
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityFactor {
    /// 因子名称
    pub factor: String,
    /// 影响值
    pub impact: f64,
    /// 描述
    pub description: String,
}

/// 交易设置评分
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeSetupScore {
    /// 评分 [0, 10]
    pub score: f64,
    /// 正面反馈
    pub feedback: Vec<String>,
    /// 警告
    pub warnings: Vec<String>,
}
