use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 挖掘阈值配置
///
/// 默认值即知识图谱挖掘的标准参数，一般无需修改。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MiningConfig {
    /// 聚类成员上限（BFS 达到上限即停止扩展）
    pub cluster_max_size: usize,
    /// 聚类成员下限
    pub cluster_min_size: usize,
    /// 最多输出的聚类数
    pub max_clusters: usize,
    /// 最多输出的桥接实体数
    pub max_bridges: usize,
    /// 枢纽度数阈值下限
    pub hub_min_degree: f64,
    /// 桥接实体所需的最少邻居类型数
    pub min_bridge_kinds: usize,
    /// 概念组合成功模式的最低胜率
    pub success_win_rate: f64,
    /// 时段/品种分组的最少交易数
    pub specialization_min_trades: usize,
    /// 时段/品种成功模式的最低胜率
    pub specialization_win_rate: f64,
    /// 品种失败模式的胜率上限（低于该值）
    pub instrument_failure_win_rate: f64,
    /// 高汇合交易所需的最少概念数
    pub confluence_min_concepts: usize,
    /// 最佳时段因子所需的盈利交易占比
    pub timing_share: f64,
    /// 最佳时段因子的固定影响值
    pub timing_impact: f64,
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self {
            cluster_max_size: 8,
            cluster_min_size: 3,
            max_clusters: 5,
            max_bridges: 5,
            hub_min_degree: 5.0,
            min_bridge_kinds: 2,
            success_win_rate: 0.6,
            specialization_min_trades: 3,
            specialization_win_rate: 0.7,
            instrument_failure_win_rate: 0.4,
            confluence_min_concepts: 3,
            timing_share: 0.7,
            timing_impact: 15.0,
        }
    }
}

/// 洞察生成配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InsightConfig {
    /// 生成后端: "none" 或 "ollama"
    pub backend: String,
    /// Ollama 服务器地址
    pub ollama_url: String,
    /// 模型名称
    pub model_name: String,
    /// 请求超时（秒）
    pub timeout_secs: u64,
    /// 回退路径最多生成的洞察数
    pub max_fallback_insights: usize,
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            backend: "none".into(),
            ollama_url: "http://localhost:11434".into(),
            model_name: "llama3.1".into(),
            timeout_secs: 30,
            max_fallback_insights: 5,
        }
    }
}

impl InsightConfig {
    /// 是否启用外部生成服务
    pub fn generator_enabled(&self) -> bool {
        !matches!(self.backend.as_str(), "" | "none" | "disabled")
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: String,
    /// 结构化日志格式
    pub structured: bool,
    /// 日志文件目录
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            structured: false,
            log_dir: None,
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// 挖掘阈值配置
    pub mining: MiningConfig,
    /// 洞察生成配置
    pub insight: InsightConfig,
    /// 日志配置
    pub logging: LoggingConfig,
    /// 应用名称
    pub app_name: String,
    /// 环境
    pub environment: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::development()
    }
}

impl AppConfig {
    /// 创建开发环境配置
    pub fn development() -> Self {
        Self {
            mining: MiningConfig::default(),
            insight: InsightConfig::default(),
            logging: LoggingConfig {
                level: "debug".into(),
                structured: false,
                log_dir: None,
            },
            app_name: "tradegraph".into(),
            environment: "development".into(),
        }
    }

    /// 创建生产环境配置
    pub fn production() -> Self {
        let mut config = Self::development();
        config.environment = "production".into();
        config.logging.level = "info".into();
        config.logging.structured = true;
        config.logging.log_dir = Some(PathBuf::from("./logs"));
        config.insight.backend = "ollama".into();
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mining_defaults() {
        let mining = MiningConfig::default();
        assert_eq!(mining.cluster_max_size, 8);
        assert_eq!(mining.cluster_min_size, 3);
        assert_eq!(mining.max_clusters, 5);
        assert_eq!(mining.max_bridges, 5);
        assert_eq!(mining.hub_min_degree, 5.0);
        assert_eq!(mining.timing_impact, 15.0);
    }

    #[test]
    fn test_production_overrides() {
        let config = AppConfig::production();
        assert_eq!(config.environment, "production");
        assert_eq!(config.logging.level, "info");
        assert!(config.insight.generator_enabled());
        assert!(!AppConfig::development().insight.generator_enabled());
    }

    #[test]
    fn test_partial_deserialize_uses_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"mining": {"cluster_max_size": 6}}"#).unwrap();
        assert_eq!(config.mining.cluster_max_size, 6);
        assert_eq!(config.mining.max_bridges, 5);
        assert_eq!(config.insight.backend, "none");
    }
}
