use async_trait::async_trait;
use serde_json::Value;

use super::executor::{OutcomeStatus, ToolContext, ToolExecutor, ToolOutcome};
use crate::domain::model::FormConfig;
use crate::engine::StepResults;
use crate::error::ToolError;

/// Form capability.
///
/// With submitted input present the form validates and completes; without it
/// the step is waiting on a human, reported as `AwaitingUserInput` so the
/// orchestrator halts rather than fails.
pub struct FormToolExecutor;

#[async_trait]
impl ToolExecutor for FormToolExecutor {
    async fn execute(
        &self,
        config: &Value,
        _results: &StepResults,
        ctx: &ToolContext,
    ) -> Result<ToolOutcome, ToolError> {
        let cfg: FormConfig = serde_json::from_value(config.clone())
            .map_err(|e| ToolError::ConfigError(format!("invalid form config: {e}")))?;

        let submitted = match &ctx.submitted_input {
            Some(input) => input,
            None => {
                return Ok(ToolOutcome {
                    status: OutcomeStatus::AwaitingUserInput,
                    result: serde_json::json!({
                        "title": cfg.title,
                        "formSchema": serde_json::to_value(&cfg.fields)?,
                    }),
                });
            }
        };

        for field in cfg.fields.iter().filter(|f| f.required) {
            let present = submitted
                .get(&field.name)
                .map(|v| !v.is_null())
                .unwrap_or(false);
            if !present {
                return Err(ToolError::InputValidationError(format!(
                    "missing required field: {}",
                    field.name
                )));
            }
        }

        Ok(ToolOutcome::success(serde_json::json!({
            "title": cfg.title,
            "content": submitted,
            "output": submitted,
        })))
    }
}
