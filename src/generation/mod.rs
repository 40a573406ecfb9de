//! 文本生成后端
//!
//! 洞察合成器的外部协作者实现。默认不启用，挖掘结果不依赖它。

pub mod ollama;

pub use ollama::OllamaInsightGenerator;

use std::sync::Arc;

use crate::config::InsightConfig;
use crate::error::{AppError, Result};
use crate::services::insight_synthesizer::InsightGenerator;

/// 按配置创建文本生成后端；未启用时返回 `None`
pub fn create_insight_generator(
    config: &InsightConfig,
) -> Result<Option<Arc<dyn InsightGenerator>>> {
    if !config.generator_enabled() {
        return Ok(None);
    }

    match config.backend.as_str() {
        "ollama" => {
            let generator = OllamaInsightGenerator::new(
                &config.ollama_url,
                &config.model_name,
                config.timeout_secs,
            )?;
            Ok(Some(Arc::new(generator)))
        }
        other => Err(AppError::Config(format!(
            "unknown insight backend: {}",
            other
        ))),
    }
}
