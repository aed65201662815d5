use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::executor::{OutcomeStatus, ToolContext, ToolExecutor, ToolOutcome};
use crate::domain::model::{HttpMethod, HttpRequestConfig};
use crate::engine::StepResults;
use crate::error::ToolError;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// HTTP request capability backed by a shared reqwest client.
///
/// Non-2xx responses are reported as `PartialSuccess` with the response
/// payload attached; only transport-level failures are errors.
pub struct HttpRequestToolExecutor {
    client: reqwest::Client,
}

impl HttpRequestToolExecutor {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpRequestToolExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ToolExecutor for HttpRequestToolExecutor {
    async fn execute(
        &self,
        config: &Value,
        _results: &StepResults,
        _ctx: &ToolContext,
    ) -> Result<ToolOutcome, ToolError> {
        let cfg: HttpRequestConfig = serde_json::from_value(config.clone())
            .map_err(|e| ToolError::ConfigError(format!("invalid http_request config: {e}")))?;

        let mut request = match cfg.method {
            HttpMethod::Get => self.client.get(&cfg.url),
            HttpMethod::Post => self.client.post(&cfg.url),
            HttpMethod::Put => self.client.put(&cfg.url),
            HttpMethod::Delete => self.client.delete(&cfg.url),
            HttpMethod::Patch => self.client.patch(&cfg.url),
        };
        for (key, value) in &cfg.headers {
            request = request.header(key, value);
        }
        if let Some(body) = &cfg.body {
            request = request.json(body);
        }
        let timeout = Duration::from_secs(cfg.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS));

        let response = request.timeout(timeout).send().await?;
        let status_code = response.status().as_u16();
        let ok = response.status().is_success();
        let text = response.text().await?;
        let content: Value =
            serde_json::from_str(&text).unwrap_or_else(|_| Value::String(text));

        let result = serde_json::json!({
            "statusCode": status_code,
            "content": content,
            "output": content,
        });
        let status = if ok {
            OutcomeStatus::Success
        } else {
            OutcomeStatus::PartialSuccess
        };
        Ok(ToolOutcome { status, result })
    }
}
