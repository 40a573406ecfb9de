use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::services::insight_synthesizer::{InsightGenerator, InsightRequest};

/// Ollama 文本生成客户端
pub struct OllamaInsightGenerator {
    client: reqwest::Client,
    model_name: String,
    base_url: String,
}

#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

impl OllamaInsightGenerator {
    pub fn new(base_url: &str, model_name: &str, timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs.max(1)))
            .build()?;

        Ok(Self {
            client,
            model_name: model_name.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl InsightGenerator for OllamaInsightGenerator {
    async fn generate(&self, request: &InsightRequest) -> Result<String> {
        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&serde_json::json!({
                "model": self.model_name,
                "prompt": request.to_prompt(),
                "format": "json",
                "stream": false
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::Generation(format!(
                "Ollama generation failed ({}): {}",
                status, error_text
            )));
        }

        let generated: OllamaGenerateResponse = response
            .json()
            .await
            .map_err(|e| AppError::MalformedResponse(e.to_string()))?;
        Ok(generated.response)
    }

    fn name(&self) -> String {
        format!("ollama:{}", self.model_name)
    }
}
