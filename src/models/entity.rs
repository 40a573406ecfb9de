//! 实体和关系数据模型
//!
//! 知识图谱的节点（概念、模型、交易等）与有向边。实体由外部持久化层拥有，
//! 挖掘引擎在单次挖掘中只读。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::metadata::TradeMetadata;

/// 实体类型枚举
///
/// 类型集合是开放的：未知类型以原始字符串保存在 `Other` 中，序列化时原样输出。
/// 比较与排序按类型名称进行。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EntityType {
    /// 交易概念（FVG、订单块等）
    Concept,

    /// 交易模型
    Model,

    /// 交易记录
    Trade,

    /// 数据校验模式
    Schema,

    /// 代码模块
    CodeModule,

    /// 文档
    Document,

    /// 其他（保留宿主应用的原始类型名）
    Other(String),
}

impl EntityType {
    /// 类型名称
    pub fn as_str(&self) -> &str {
        match self {
            EntityType::Concept => "concept",
            EntityType::Model => "model",
            EntityType::Trade => "trade",
            EntityType::Schema => "schema",
            EntityType::CodeModule => "code_module",
            EntityType::Document => "document",
            EntityType::Other(kind) => kind,
        }
    }
}

impl From<String> for EntityType {
    fn from(kind: String) -> Self {
        match kind.as_str() {
            "concept" => EntityType::Concept,
            "model" => EntityType::Model,
            "trade" => EntityType::Trade,
            "schema" => EntityType::Schema,
            "code_module" => EntityType::CodeModule,
            "document" => EntityType::Document,
            _ => EntityType::Other(kind),
        }
    }
}

impl From<&str> for EntityType {
    fn from(kind: &str) -> Self {
        EntityType::from(kind.to_string())
    }
}

impl From<EntityType> for String {
    fn from(kind: EntityType) -> Self {
        match kind {
            EntityType::Other(kind) => kind,
            known => known.as_str().to_string(),
        }
    }
}

impl PartialOrd for EntityType {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EntityType {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 实体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// 实体唯一标识
    pub id: String,

    /// 实体类型
    #[serde(alias = "type", alias = "kind")]
    pub entity_type: EntityType,

    /// 实体名称
    pub name: String,

    /// 描述
    #[serde(default)]
    pub description: Option<String>,

    /// 开放式元数据（不同类型的实体携带不同结构）
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,

    /// 标签
    #[serde(default)]
    pub tags: Vec<String>,

    /// 创建时间（缺省为 Unix 纪元）
    #[serde(alias = "createdAt", default)]
    pub created_at: DateTime<Utc>,

    /// 更新时间
    #[serde(alias = "updatedAt", default)]
    pub updated_at: DateTime<Utc>,
}

impl Entity {
    /// 创建新实体
    pub fn new(name: &str, entity_type: EntityType) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            entity_type,
            name: name.to_string(),
            description: None,
            metadata: HashMap::new(),
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// 使用指定 ID 创建实体
    pub fn with_id(id: &str, name: &str, entity_type: EntityType) -> Self {
        let mut entity = Self::new(name, entity_type);
        entity.id = id.to_string();
        entity
    }

    /// 更新实体
    pub fn update(&mut self, name: Option<&str>, description: Option<&str>) {
        if let Some(name) = name {
            self.name = name.to_string();
        }
        if let Some(description) = description {
            self.description = Some(description.to_string());
        }
        self.updated_at = Utc::now();
    }

    /// 设置元数据
    pub fn set_metadata(&mut self, key: &str, value: serde_json::Value) {
        self.metadata.insert(key.to_string(), value);
        self.updated_at = Utc::now();
    }

    /// 添加标签
    pub fn add_tag(&mut self, tag: &str) {
        let tag = tag.to_lowercase();
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
            self.updated_at = Utc::now();
        }
    }

    /// 是否为指定类型
    pub fn is(&self, entity_type: EntityType) -> bool {
        self.entity_type == entity_type
    }

    /// 交易元数据视图
    pub fn trade_metadata(&self) -> TradeMetadata<'_> {
        TradeMetadata::new(&self.metadata)
    }
}

/// 关系类型枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationshipType {
    /// 概念被模型使用
    ConceptUsedInModel,

    /// 模型产生交易
    ModelProducesTrade,

    /// 交易使用概念
    TradeUsesConcept,

    /// 概念相关
    ConceptRelatedTo,

    /// 文档定义概念
    DocumentDefines,

    /// 概念由代码模块检测
    ConceptDetectedBy,

    /// 模式校验
    SchemaValidates,

    /// 概念前置依赖
    ConceptPrerequisite,

    /// 其他
    #[serde(other)]
    Other,
}

impl std::fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RelationshipType::ConceptUsedInModel => write!(f, "CONCEPT_USED_IN_MODEL"),
            RelationshipType::ModelProducesTrade => write!(f, "MODEL_PRODUCES_TRADE"),
            RelationshipType::TradeUsesConcept => write!(f, "TRADE_USES_CONCEPT"),
            RelationshipType::ConceptRelatedTo => write!(f, "CONCEPT_RELATED_TO"),
            RelationshipType::DocumentDefines => write!(f, "DOCUMENT_DEFINES"),
            RelationshipType::ConceptDetectedBy => write!(f, "CONCEPT_DETECTED_BY"),
            RelationshipType::SchemaValidates => write!(f, "SCHEMA_VALIDATES"),
            RelationshipType::ConceptPrerequisite => write!(f, "CONCEPT_PREREQUISITE"),
            RelationshipType::Other => write!(f, "OTHER"),
        }
    }
}

/// 关系（有向边）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    /// 关系唯一标识
    pub id: String,

    /// 关系类型
    #[serde(alias = "type", alias = "kind")]
    pub relationship_type: RelationshipType,

    /// 源实体 ID
    #[serde(alias = "sourceId")]
    pub source_id: String,

    /// 目标实体 ID
    #[serde(alias = "targetId")]
    pub target_id: String,

    /// 元数据
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Relationship {
    /// 创建新关系
    pub fn new(source_id: &str, target_id: &str, relationship_type: RelationshipType) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            relationship_type,
            source_id: source_id.to_string(),
            target_id: target_id.to_string(),
            metadata: HashMap::new(),
        }
    }

    /// 关系是否连接指定实体
    pub fn touches(&self, entity_id: &str) -> bool {
        self.source_id == entity_id || self.target_id == entity_id
    }

    /// 返回另一端实体 ID
    pub fn other_end(&self, entity_id: &str) -> Option<&str> {
        if self.source_id == entity_id {
            Some(&self.target_id)
        } else if self.target_id == entity_id {
            Some(&self.source_id)
        } else {
            None
        }
    }
}
