use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use super::executor::{ToolContext, ToolExecutor, ToolOutcome};
use super::path;
use crate::domain::model::AiAgentConfig;
use crate::engine::StepResults;
use crate::error::ToolError;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Provider error: {0}")]
    ProviderError(String),
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),
}

impl From<LlmError> for ToolError {
    fn from(e: LlmError) -> Self {
        ToolError::ProviderError(e.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub model: String,
    pub system_prompt: String,
    pub prompt: String,
}

/// Seam to the language-model provider. The engine never talks to a vendor
/// SDK directly; implementations are injected at registry construction.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: LlmRequest) -> Result<String, LlmError>;
}

/// Echoes the prompt back. Default client for tests and dry runs.
pub struct EchoLlmClient;

#[async_trait]
impl LlmClient for EchoLlmClient {
    async fn complete(&self, request: LlmRequest) -> Result<String, LlmError> {
        Ok(request.prompt)
    }
}

/// AI agent capability: resolves its input prompt against the most recent
/// step result and calls the injected [`LlmClient`].
pub struct AiAgentToolExecutor {
    client: Arc<dyn LlmClient>,
}

impl AiAgentToolExecutor {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self { client }
    }

    fn resolve_prompt(cfg: &AiAgentConfig, results: &StepResults) -> String {
        let latest = results.latest().map(|r| &r.result);
        if cfg.input_prompt.starts_with("$json") {
            let resolved = latest
                .map(|r| path::resolve(r, &cfg.input_prompt))
                .unwrap_or(Value::Null);
            return path::as_text(&resolved);
        }
        if !cfg.input_prompt.is_empty() {
            return cfg.input_prompt.clone();
        }
        latest
            .map(|r| path::as_text(&path::conventional_output(r)))
            .unwrap_or_default()
    }
}

#[async_trait]
impl ToolExecutor for AiAgentToolExecutor {
    async fn execute(
        &self,
        config: &Value,
        results: &StepResults,
        _ctx: &ToolContext,
    ) -> Result<ToolOutcome, ToolError> {
        let cfg: AiAgentConfig = serde_json::from_value(config.clone())
            .map_err(|e| ToolError::ConfigError(format!("invalid ai_agent config: {e}")))?;

        let prompt = Self::resolve_prompt(&cfg, results);
        let reply = self
            .client
            .complete(LlmRequest {
                model: cfg.model.clone(),
                system_prompt: cfg.system_prompt.clone(),
                prompt,
            })
            .await?;

        Ok(ToolOutcome::success(serde_json::json!({
            "aiOutput": reply,
            "content": reply,
            "output": reply,
            "model": cfg.model,
        })))
    }
}
