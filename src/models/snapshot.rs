//! 图快照
//!
//! 单次挖掘的输入边界：持有实体和关系数组，并在任何计算开始前校验公共契约。

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{AppError, Result};
use crate::models::entity::{Entity, Relationship};

/// 宿主应用导出的原始快照
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotData {
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

/// 已校验的图快照
#[derive(Debug, Clone)]
pub struct GraphSnapshot {
    entities: Vec<Entity>,
    relationships: Vec<Relationship>,
}

impl GraphSnapshot {
    /// 校验并创建快照
    ///
    /// 实体 ID 必须非空且唯一，关系 ID 必须非空。悬空引用不在此处拒绝，
    /// 由图索引在遍历时跳过。
    pub fn new(entities: Vec<Entity>, relationships: Vec<Relationship>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(entities.len());
        for entity in &entities {
            if entity.id.trim().is_empty() {
                return Err(AppError::Validation(format!(
                    "entity '{}' has an empty id",
                    entity.name
                )));
            }
            if !seen.insert(entity.id.as_str()) {
                return Err(AppError::Validation(format!(
                    "duplicate entity id: {}",
                    entity.id
                )));
            }
        }

        if let Some(relationship) = relationships.iter().find(|r| r.id.trim().is_empty()) {
            return Err(AppError::Validation(format!(
                "relationship {} -> {} has an empty id",
                relationship.source_id, relationship.target_id
            )));
        }

        Ok(Self {
            entities,
            relationships,
        })
    }

    /// 从 JSON 文本解析并校验
    pub fn from_json(json: &str) -> Result<Self> {
        let data: SnapshotData = serde_json::from_str(json)?;
        Self::new(data.entities, data.relationships)
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl TryFrom<SnapshotData> for GraphSnapshot {
    type Error = AppError;

    fn try_from(data: SnapshotData) -> Result<Self> {
        Self::new(data.entities, data.relationships)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::entity::{EntityType, RelationshipType};

    #[test]
    fn test_valid_snapshot_keeps_dangling_edges() {
        let entities = vec![Entity::with_id("a", "A", EntityType::Concept)];
        let relationships = vec![Relationship::new(
            "a",
            "ghost",
            RelationshipType::ConceptRelatedTo,
        )];

        let snapshot = GraphSnapshot::new(entities, relationships).unwrap();
        assert_eq!(snapshot.entities().len(), 1);
        assert_eq!(snapshot.relationships().len(), 1);
    }

    #[test]
    fn test_duplicate_entity_id_rejected() {
        let entities = vec![
            Entity::with_id("a", "A", EntityType::Concept),
            Entity::with_id("a", "A2", EntityType::Model),
        ];
        let err = GraphSnapshot::new(entities, vec![]).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_empty_ids_rejected() {
        let err = GraphSnapshot::new(vec![Entity::with_id(" ", "A", EntityType::Concept)], vec![])
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let mut relationship = Relationship::new("a", "b", RelationshipType::Other);
        relationship.id = String::new();
        let err = GraphSnapshot::new(vec![], vec![relationship]).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_from_json() {
        let snapshot = GraphSnapshot::from_json(
            r#"{
                "entities": [{"id": "c", "type": "concept", "name": "FVG"}],
                "relationships": []
            }"#,
        )
        .unwrap();
        assert!(!snapshot.is_empty());

        assert!(matches!(
            GraphSnapshot::from_json("[1, 2]"),
            Err(AppError::Serialization(_))
        ));
    }
}
