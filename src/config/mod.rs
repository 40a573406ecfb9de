//! 配置管理模块
//!
//! 提供挖掘阈值、洞察生成和日志配置的加载与校验，支持 TOML 配置文件和环境变量覆盖。

pub mod config;
pub mod loader;

pub use config::{AppConfig, InsightConfig, LoggingConfig, MiningConfig};
pub use loader::{ConfigLoader, ConfigValidationError};
