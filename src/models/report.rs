//! 挖掘报告数据模型
//!
//! 单次挖掘的完整输出信封，由调用方序列化、展示或丢弃。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::pattern::Pattern;
use crate::models::training::{
    ConceptUsage, QualityFactor, TrainingInsight, TrainingPattern, UsageScore,
};

/// 洞察来源
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InsightSource {
    /// 外部文本生成服务
    Generator { name: String },
    /// 本地确定性回退（附原因）
    Fallback { reason: String },
}

impl InsightSource {
    pub fn is_fallback(&self) -> bool {
        matches!(self, InsightSource::Fallback { .. })
    }
}

/// 挖掘报告
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiningReport {
    /// 报告版本（`v1-<毫秒时间戳>`）
    pub version: String,
    /// 生成时间
    pub generated_at: DateTime<Utc>,
    /// 分析的交易数（含未标注）
    pub trades_analyzed: usize,
    /// 盈利交易数
    pub winning_trades: usize,
    /// 亏损交易数
    pub losing_trades: usize,
    /// 结构模式
    pub structural_patterns: Vec<Pattern>,
    /// 概念使用画像
    pub concept_usage: Vec<ConceptUsage>,
    /// 概念评分（按名称）
    pub concept_scores: BTreeMap<String, UsageScore>,
    /// 模型评分（按名称）
    pub model_scores: BTreeMap<String, UsageScore>,
    /// 成功/失败模式
    pub training_patterns: Vec<TrainingPattern>,
    /// 质量因子
    pub quality_factors: Vec<QualityFactor>,
    /// 洞察
    pub insights: Vec<TrainingInsight>,
    /// 洞察来源
    pub insight_source: InsightSource,
}

impl MiningReport {
    /// 已标注交易的整体胜率
    pub fn win_rate(&self) -> Option<f64> {
        let labeled = self.winning_trades + self.losing_trades;
        (labeled > 0).then(|| self.winning_trades as f64 / labeled as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insight_source_serde() {
        let source = InsightSource::Fallback {
            reason: "TIMEOUT".to_string(),
        };
        let json = serde_json::to_value(&source).unwrap();
        assert_eq!(json["kind"], "fallback");
        assert_eq!(json["reason"], "TIMEOUT");
        assert!(source.is_fallback());

        let generator: InsightSource =
            serde_json::from_str(r#"{"kind": "generator", "name": "ollama:llama3.1"}"#).unwrap();
        assert!(!generator.is_fallback());
    }
}
