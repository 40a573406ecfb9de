use crate::config::config::{AppConfig, InsightConfig, MiningConfig};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml, Yaml},
};
use std::path::PathBuf;

/// 配置加载器
pub struct ConfigLoader;

impl ConfigLoader {
    /// 从默认路径加载配置
    ///
    /// 搜索路径：
    /// 1. 内置默认值
    /// 2. ./config.toml
    /// 3. 环境变量（TRADEGRAPH_ 前缀）
    pub fn load() -> Result<AppConfig, figment::Error> {
        Self::load_from(default_config_path())
    }

    /// 从指定路径加载配置
    pub fn load_from(path: PathBuf) -> Result<AppConfig, figment::Error> {
        Self::figment(path).extract()
    }

    /// 构建分层配置源：默认值 < 配置文件 < 环境变量
    ///
    /// 嵌套字段用双下划线分隔，例如 `TRADEGRAPH_MINING__CLUSTER_MAX_SIZE=6`。
    /// `.yaml`/`.yml` 后缀的文件按 YAML 解析，其余按 TOML。
    fn figment(path: PathBuf) -> Figment {
        let figment = Figment::from(Serialized::defaults(AppConfig::default()));
        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml" | "yml")
        );
        let figment = if is_yaml {
            figment.merge(Yaml::file(path))
        } else {
            figment.merge(Toml::file(path))
        };
        figment.merge(Env::prefixed("TRADEGRAPH_").split("__"))
    }

    /// 加载挖掘阈值配置
    pub fn load_mining_config() -> Result<MiningConfig, figment::Error> {
        Self::figment(default_config_path()).extract_inner("mining")
    }

    /// 加载洞察生成配置
    pub fn load_insight_config() -> Result<InsightConfig, figment::Error> {
        Self::figment(default_config_path()).extract_inner("insight")
    }

    /// 验证配置
    pub fn validate(config: &AppConfig) -> Result<(), ConfigValidationError> {
        let mining = &config.mining;

        if mining.cluster_max_size == 0 {
            return Err(ConfigValidationError::InvalidClusterSize);
        }

        if mining.cluster_min_size > mining.cluster_max_size {
            return Err(ConfigValidationError::ClusterBoundsInverted {
                min: mining.cluster_min_size,
                max: mining.cluster_max_size,
            });
        }

        let rates = [
            ("success_win_rate", mining.success_win_rate),
            ("specialization_win_rate", mining.specialization_win_rate),
            ("instrument_failure_win_rate", mining.instrument_failure_win_rate),
            ("timing_share", mining.timing_share),
        ];
        for (name, rate) in rates {
            if !(0.0..=1.0).contains(&rate) {
                return Err(ConfigValidationError::RateOutOfRange(name.to_string(), rate));
            }
        }

        if config.insight.generator_enabled() && config.insight.timeout_secs == 0 {
            return Err(ConfigValidationError::InvalidTimeout);
        }

        if config.insight.max_fallback_insights == 0 {
            return Err(ConfigValidationError::InvalidFallbackLimit);
        }

        Ok(())
    }
}

/// 配置验证错误
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ConfigValidationError {
    #[error("聚类上限无效，必须大于 0")]
    InvalidClusterSize,

    #[error("聚类下限 {min} 大于上限 {max}")]
    ClusterBoundsInverted { min: usize, max: usize },

    #[error("比率 {0} 超出 [0, 1] 范围: {1}")]
    RateOutOfRange(String, f64),

    #[error("启用生成服务时超时必须大于 0")]
    InvalidTimeout,

    #[error("回退洞察上限必须大于 0")]
    InvalidFallbackLimit,
}

/// 获取默认配置文件路径
pub fn default_config_path() -> PathBuf {
    PathBuf::from("config.toml")
}

/// 检查配置文件是否存在
pub fn config_exists() -> bool {
    default_config_path().exists()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_development() {
        assert!(ConfigLoader::validate(&AppConfig::development()).is_ok());
        assert!(ConfigLoader::validate(&AppConfig::production()).is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_cluster() {
        let mut config = AppConfig::development();
        config.mining.cluster_max_size = 0;
        assert_eq!(
            ConfigLoader::validate(&config),
            Err(ConfigValidationError::InvalidClusterSize)
        );
    }

    #[test]
    fn test_validate_rejects_inverted_bounds() {
        let mut config = AppConfig::development();
        config.mining.cluster_min_size = 9;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigValidationError::ClusterBoundsInverted { min: 9, max: 8 })
        ));
    }

    #[test]
    fn test_validate_rejects_bad_rate() {
        let mut config = AppConfig::development();
        config.mining.success_win_rate = 1.5;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigValidationError::RateOutOfRange(_, _))
        ));
    }

    #[test]
    fn test_validate_rejects_zero_timeout_with_backend() {
        let mut config = AppConfig::development();
        config.insight.timeout_secs = 0;
        assert!(ConfigLoader::validate(&config).is_ok());

        config.insight.backend = "ollama".into();
        assert_eq!(
            ConfigLoader::validate(&config),
            Err(ConfigValidationError::InvalidTimeout)
        );
    }

    #[test]
    fn test_validate_rejects_zero_fallback_limit() {
        let mut config = AppConfig::development();
        config.insight.max_fallback_insights = 0;
        assert_eq!(
            ConfigLoader::validate(&config),
            Err(ConfigValidationError::InvalidFallbackLimit)
        );
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let config =
            ConfigLoader::load_from(PathBuf::from("does-not-exist/tradegraph.toml")).unwrap();
        assert_eq!(config.mining, MiningConfig::default());
    }

    #[test]
    fn test_load_yaml_file() {
        let path =
            std::env::temp_dir().join(format!("tradegraph-{}.yaml", uuid::Uuid::new_v4()));
        let yaml = "mining:\n  cluster_max_size: 6\ninsight:\n  model_name: qwen2\n";
        std::fs::write(&path, yaml).unwrap();

        let config = ConfigLoader::load_from(path.clone()).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.mining.cluster_max_size, 6);
        assert_eq!(config.mining.max_bridges, 5);
        assert_eq!(config.insight.model_name, "qwen2");
    }
}
