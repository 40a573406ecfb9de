//! 结构模式数据模型
//!
//! 每次挖掘重新生成的值对象，由调用方决定是否持久化。

use serde::{Deserialize, Serialize};

use crate::models::entity::{Entity, Relationship};

/// 结构模式类型枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatternType {
    /// 概念 → 模型 → 交易链
    #[serde(rename = "chain")]
    Chain,

    /// 枢纽实体
    #[serde(rename = "hub")]
    Hub,

    /// 聚类
    #[serde(rename = "cluster")]
    Cluster,

    /// 桥接实体
    #[serde(rename = "bridge")]
    Bridge,
}

impl std::fmt::Display for PatternType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PatternType::Chain => write!(f, "chain"),
            PatternType::Hub => write!(f, "hub"),
            PatternType::Cluster => write!(f, "cluster"),
            PatternType::Bridge => write!(f, "bridge"),
        }
    }
}

/// 结构模式
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    /// 模式标识（由成员实体 ID 派生，同一输入得到同一 ID）
    pub id: String,

    /// 模式类型
    pub pattern_type: PatternType,

    /// 模式名称
    pub name: String,

    /// 模式描述
    pub description: String,

    /// 成员实体（有序）
    pub member_entities: Vec<Entity>,

    /// 成员关系
    pub member_relationships: Vec<Relationship>,

    /// 强度（≥ 0，未截断）
    pub strength: f64,

    /// 洞察
    pub insights: Vec<String>,
}

impl Pattern {
    /// 成员实体 ID 列表
    pub fn member_ids(&self) -> Vec<&str> {
        self.member_entities.iter().map(|e| e.id.as_str()).collect()
    }

    /// 是否包含指定实体
    pub fn contains(&self, entity_id: &str) -> bool {
        self.member_entities.iter().any(|e| e.id == entity_id)
    }

    /// 截断到 [0, 1] 的强度，供展示使用
    pub fn clamped_strength(&self) -> f64 {
        self.strength.clamp(0.0, 1.0)
    }
}

/// 模式摘要（不含成员实体内容）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternSummary {
    pub pattern_type: PatternType,
    pub name: String,
    pub description: String,
    pub entity_count: usize,
    pub relationship_count: usize,
    pub strength: f64,
}

impl From<&Pattern> for PatternSummary {
    fn from(pattern: &Pattern) -> Self {
        Self {
            pattern_type: pattern.pattern_type,
            name: pattern.name.clone(),
            description: pattern.description.clone(),
            entity_count: pattern.member_entities.len(),
            relationship_count: pattern.member_relationships.len(),
            strength: pattern.strength,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::entity::EntityType;

    #[test]
    fn test_pattern_helpers() {
        let pattern = Pattern {
            id: "hub-x".to_string(),
            pattern_type: PatternType::Hub,
            name: "X Hub".to_string(),
            description: String::new(),
            member_entities: vec![
                Entity::with_id("x", "X", EntityType::Concept),
                Entity::with_id("y", "Y", EntityType::Model),
            ],
            member_relationships: vec![],
            strength: 1.6,
            insights: vec![],
        };

        assert_eq!(pattern.member_ids(), vec!["x", "y"]);
        assert!(pattern.contains("y"));
        assert_eq!(pattern.clamped_strength(), 1.0);

        let summary = PatternSummary::from(&pattern);
        assert_eq!(summary.entity_count, 2);
        assert_eq!(summary.pattern_type.to_string(), "hub");
    }
}
