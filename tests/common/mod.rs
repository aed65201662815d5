//! Shared helpers for the integration tests: template seeding and scripted
//! tool executors.
#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use stepchain::{
    ExecutionStore, MemoryExecutionStore, OutcomeStatus, StepKind, StepResults, StepTemplate,
    Tool, ToolContext, ToolError, ToolExecutor, ToolKind, ToolOutcome, WorkflowTemplate,
};

pub struct StepSpec {
    pub id: &'static str,
    pub name: &'static str,
    pub kind: StepKind,
    pub tool: Option<Tool>,
    pub prev: Vec<&'static str>,
    pub next: Vec<&'static str>,
}

pub async fn seed_template(
    store: &MemoryExecutionStore,
    template_id: &str,
    root: &str,
    specs: Vec<StepSpec>,
) {
    store
        .insert_template(&WorkflowTemplate {
            id: template_id.to_string(),
            name: format!("template {}", template_id),
            description: String::new(),
            root_step_template_id: root.to_string(),
            config: Value::Null,
        })
        .await
        .unwrap();

    for spec in specs {
        let tool_ids = match &spec.tool {
            Some(tool) => {
                store.insert_tool(tool).await.unwrap();
                vec![tool.id.clone()]
            }
            None => vec![],
        };
        store
            .insert_step_template(&StepTemplate {
                id: spec.id.to_string(),
                template_id: template_id.to_string(),
                name: spec.name.to_string(),
                kind: spec.kind,
                tool_ids,
                prev_step_ids: spec.prev.iter().map(|s| s.to_string()).collect(),
                next_step_ids: spec.next.iter().map(|s| s.to_string()).collect(),
                metadata: Value::Null,
            })
            .await
            .unwrap();
    }
}

pub fn form_tool(id: &str, required_field: &str) -> Tool {
    Tool {
        id: id.to_string(),
        kind: ToolKind::Form,
        config: json!({
            "title": "Intake",
            "fields": [
                { "id": format!("{id}-f1"), "name": required_field, "type": "text", "required": true }
            ]
        }),
    }
}

pub fn agent_tool(id: &str) -> Tool {
    Tool {
        id: id.to_string(),
        kind: ToolKind::AiAgent,
        config: json!({
            "model": "gemini-1.5-pro",
            "systemPrompt": "Summarise",
            "inputPrompt": ""
        }),
    }
}

pub fn email_tool(id: &str) -> Tool {
    Tool {
        id: id.to_string(),
        kind: ToolKind::Email,
        config: json!({
            "sendingFrom": "ops@example.com",
            "emailAddresses": ["dest@example.com"]
        }),
    }
}

pub fn webhook_tool(id: &str) -> Tool {
    Tool {
        id: id.to_string(),
        kind: ToolKind::Webhook,
        config: Value::Null,
    }
}

/// Executor that always reports the same outcome.
pub struct ScriptedExecutor {
    pub status: OutcomeStatus,
    pub result: Value,
}

#[async_trait]
impl ToolExecutor for ScriptedExecutor {
    async fn execute(
        &self,
        _config: &Value,
        _results: &StepResults,
        _ctx: &ToolContext,
    ) -> Result<ToolOutcome, ToolError> {
        Ok(ToolOutcome {
            status: self.status,
            result: self.result.clone(),
        })
    }
}

/// Executor that fails at the transport level.
pub struct FailingExecutor;

#[async_trait]
impl ToolExecutor for FailingExecutor {
    async fn execute(
        &self,
        _config: &Value,
        _results: &StepResults,
        _ctx: &ToolContext,
    ) -> Result<ToolOutcome, ToolError> {
        Err(ToolError::HttpError("connection refused".to_string()))
    }
}

pub fn http_tool(id: &str) -> Tool {
    Tool {
        id: id.to_string(),
        kind: ToolKind::HttpRequest,
        config: json!({ "method": "get", "url": "http://example.invalid/" }),
    }
}

/// Convenience: a registry with scripted defaults plus an override for one
/// kind.
pub fn registry_with_override(
    kind: ToolKind,
    executor: Arc<dyn ToolExecutor>,
) -> Arc<stepchain::ToolRegistry> {
    let mut registry = stepchain::ToolRegistry::with_defaults(
        Arc::new(stepchain::EchoLlmClient),
        Arc::new(stepchain::BufferingTransport::new()),
    );
    registry.register(kind, executor);
    Arc::new(registry)
}
