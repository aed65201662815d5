use async_trait::async_trait;
use serde_json::Value;

use super::executor::{ToolContext, ToolExecutor, ToolOutcome};
use crate::engine::StepResults;
use crate::error::ToolError;

/// Webhook capability: surfaces the captured inbound request as the step's
/// result so downstream steps receive the payload as their input.
pub struct WebhookToolExecutor;

#[async_trait]
impl ToolExecutor for WebhookToolExecutor {
    async fn execute(
        &self,
        _config: &Value,
        _results: &StepResults,
        ctx: &ToolContext,
    ) -> Result<ToolOutcome, ToolError> {
        match &ctx.webhook_request {
            Some(request) => Ok(ToolOutcome::success(serde_json::json!({
                "method": request.method,
                "headers": request.headers,
                "content": request.body,
                "output": request.body,
            }))),
            None => {
                // An execution can reach a webhook step without a captured
                // request if the record was lost; keep the chain alive with
                // a well-formed empty result.
                tracing::warn!(
                    step_execution_id = %ctx.step_execution_id,
                    "webhook step executed without a captured request"
                );
                Ok(ToolOutcome::success(serde_json::json!({
                    "content": null,
                    "output": null,
                })))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::execution::{CapturedRequest, TriggerType};
    use serde_json::json;
    use std::collections::HashMap;

    #[tokio::test]
    async fn test_webhook_surfaces_captured_request() {
        let ctx = ToolContext {
            workflow_execution_id: "we-1".into(),
            step_execution_id: "se-1".into(),
            step_name: "webhook".into(),
            trigger_type: TriggerType::Webhook,
            webhook_request: Some(CapturedRequest {
                method: "POST".into(),
                headers: HashMap::from([("x-source".into(), "ci".into())]),
                body: json!({"event": "push", "ref": "main"}),
            }),
            submitted_input: None,
        };
        let outcome = WebhookToolExecutor
            .execute(&Value::Null, &StepResults::new(), &ctx)
            .await
            .unwrap();
        assert_eq!(outcome.result["output"]["event"], json!("push"));
        assert_eq!(outcome.result["method"], json!("POST"));
    }

    #[tokio::test]
    async fn test_webhook_without_request_yields_nulls() {
        let ctx = ToolContext {
            workflow_execution_id: "we-1".into(),
            step_execution_id: "se-1".into(),
            step_name: "webhook".into(),
            trigger_type: TriggerType::Manual,
            webhook_request: None,
            submitted_input: None,
        };
        let outcome = WebhookToolExecutor
            .execute(&Value::Null, &StepResults::new(), &ctx)
            .await
            .unwrap();
        assert_eq!(outcome.result["output"], Value::Null);
    }
}
