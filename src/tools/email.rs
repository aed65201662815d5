use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::Mutex;

use super::executor::{ToolContext, ToolExecutor, ToolOutcome};
use super::path;
use crate::domain::model::EmailConfig;
use crate::engine::StepResults;
use crate::error::ToolError;

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Send failed: {0}")]
    SendFailed(String),
}

impl From<EmailError> for ToolError {
    fn from(e: EmailError) -> Self {
        ToolError::TransportError(e.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
}

/// Seam to the outgoing-mail system.
#[async_trait]
pub trait EmailTransport: Send + Sync {
    async fn send(&self, message: EmailMessage) -> Result<(), EmailError>;
}

/// Transport that records messages instead of sending them. Used in tests
/// and anywhere a dry-run registry is needed.
#[derive(Default)]
pub struct BufferingTransport {
    sent: Mutex<Vec<EmailMessage>>,
}

impl BufferingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl EmailTransport for BufferingTransport {
    async fn send(&self, message: EmailMessage) -> Result<(), EmailError> {
        self.sent.lock().await.push(message);
        Ok(())
    }
}

/// Email capability: delivers the previous step's output to the configured
/// recipients through the injected transport.
pub struct EmailToolExecutor {
    transport: Arc<dyn EmailTransport>,
}

impl EmailToolExecutor {
    pub fn new(transport: Arc<dyn EmailTransport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl ToolExecutor for EmailToolExecutor {
    async fn execute(
        &self,
        config: &Value,
        results: &StepResults,
        ctx: &ToolContext,
    ) -> Result<ToolOutcome, ToolError> {
        let cfg: EmailConfig = serde_json::from_value(config.clone())
            .map_err(|e| ToolError::ConfigError(format!("invalid email config: {e}")))?;
        if cfg.email_addresses.is_empty() {
            return Err(ToolError::ConfigError("no recipients configured".into()));
        }

        let body = results
            .latest()
            .map(|r| path::as_text(&path::conventional_output(&r.result)))
            .unwrap_or_default();
        let subject = cfg
            .subject
            .clone()
            .unwrap_or_else(|| format!("Workflow update: {}", ctx.step_name));

        self.transport
            .send(EmailMessage {
                from: cfg.sending_from.clone(),
                to: cfg.email_addresses.clone(),
                subject: subject.clone(),
                body: body.clone(),
            })
            .await?;

        Ok(ToolOutcome::success(serde_json::json!({
            "from": cfg.sending_from,
            "recipients": cfg.email_addresses,
            "subject": subject,
            "content": body,
            "output": body,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::execution::TriggerType;
    use crate::domain::model::ToolKind;
    use crate::tools::OutcomeStatus;
    use serde_json::json;

    fn ctx() -> ToolContext {
        ToolContext {
            workflow_execution_id: "we-1".into(),
            step_execution_id: "se-3".into(),
            step_name: "Email".into(),
            trigger_type: TriggerType::Manual,
            webhook_request: None,
            submitted_input: None,
        }
    }

    #[tokio::test]
    async fn test_email_sends_latest_output() {
        let transport = Arc::new(BufferingTransport::new());
        let executor = EmailToolExecutor::new(transport.clone());
        let config = json!({
            "sendingFrom": "ops@example.com",
            "emailAddresses": ["a@example.com", "b@example.com"]
        });
        let mut results = StepResults::new();
        results.push(crate::engine::StepResult {
            step_execution_id: "se-2".into(),
            step_name: "agent".into(),
            tool_kind: Some(ToolKind::AiAgent),
            status: OutcomeStatus::Success,
            result: json!({"aiOutput": "summary text"}),
        });

        let outcome = executor.execute(&config, &results, &ctx()).await.unwrap();
        assert_eq!(outcome.status, OutcomeStatus::Success);

        let sent = transport.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, vec!["a@example.com", "b@example.com"]);
        assert_eq!(sent[0].body, "summary text");
        assert!(sent[0].subject.contains("Email"));
    }

    #[tokio::test]
    async fn test_email_requires_recipients() {
        let executor = EmailToolExecutor::new(Arc::new(BufferingTransport::new()));
        let config = json!({ "sendingFrom": "ops@example.com", "emailAddresses": [] });
        let err = executor
            .execute(&config, &StepResults::new(), &ctx())
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::ConfigError(_)));
    }

    #[tokio::test]
    async fn test_email_transport_failure() {
        struct DownTransport;
        #[async_trait]
        impl EmailTransport for DownTransport {
            async fn send(&self, _message: EmailMessage) -> Result<(), EmailError> {
                Err(EmailError::SendFailed("smtp unreachable".into()))
            }
        }

        let executor = EmailToolExecutor::new(Arc::new(DownTransport));
        let config = json!({
            "sendingFrom": "ops@example.com",
            "emailAddresses": ["a@example.com"]
        });
        let err = executor
            .execute(&config, &StepResults::new(), &ctx())
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::TransportError(_)));
    }
}
