use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::execution::{CapturedRequest, TriggerType};
use crate::domain::model::{Tool, ToolKind};
use crate::engine::StepResults;
use crate::error::ToolError;

/// Status a capability reports back to the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Success,
    PartialSuccess,
    Error,
    AwaitingUserInput,
}

/// What one tool invocation produced.
///
/// `result` is capability-specific, but every capability populates the
/// conventional `content`/`output` fields (and `aiOutput` for AI-like ones)
/// so downstream bodies can locate prior output via [`crate::tools::path`].
#[derive(Debug, Clone)]
pub struct ToolOutcome {
    pub status: OutcomeStatus,
    pub result: Value,
}

impl ToolOutcome {
    pub fn success(result: Value) -> Self {
        ToolOutcome {
            status: OutcomeStatus::Success,
            result,
        }
    }
}

/// Per-invocation context handed to a capability.
#[derive(Debug, Clone)]
pub struct ToolContext {
    pub workflow_execution_id: String,
    pub step_execution_id: String,
    pub step_name: String,
    pub trigger_type: TriggerType,
    /// The captured request for webhook-triggered executions.
    pub webhook_request: Option<CapturedRequest>,
    /// Form payload when a human (or the webhook synthetic path) supplied
    /// input for this step.
    pub submitted_input: Option<Value>,
}

/// Trait for tool execution. Each capability implements this.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn execute(
        &self,
        config: &Value,
        results: &StepResults,
        ctx: &ToolContext,
    ) -> Result<ToolOutcome, ToolError>;
}

/// Registry of tool executors keyed by [`ToolKind`].
pub struct ToolRegistry {
    executors: HashMap<ToolKind, Arc<dyn ToolExecutor>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        ToolRegistry {
            executors: HashMap::new(),
        }
    }

    /// Registry with all five built-in capabilities. The AI and email bodies
    /// need their provider seams injected; form, webhook, and HTTP are
    /// self-contained.
    pub fn with_defaults(
        llm: Arc<dyn super::LlmClient>,
        mailer: Arc<dyn super::EmailTransport>,
    ) -> Self {
        let mut registry = ToolRegistry::new();
        registry.register(ToolKind::Form, Arc::new(super::FormToolExecutor));
        registry.register(ToolKind::Webhook, Arc::new(super::WebhookToolExecutor));
        registry.register(ToolKind::Email, Arc::new(super::EmailToolExecutor::new(mailer)));
        registry.register(ToolKind::AiAgent, Arc::new(super::AiAgentToolExecutor::new(llm)));
        registry.register(
            ToolKind::HttpRequest,
            Arc::new(super::HttpRequestToolExecutor::new()),
        );
        registry
    }

    pub fn register(&mut self, kind: ToolKind, executor: Arc<dyn ToolExecutor>) {
        self.executors.insert(kind, executor);
    }

    pub fn get(&self, kind: ToolKind) -> Option<Arc<dyn ToolExecutor>> {
        self.executors.get(&kind).cloned()
    }

    /// Dispatch a configured tool to its executor.
    pub async fn invoke(
        &self,
        tool: &Tool,
        results: &StepResults,
        ctx: &ToolContext,
    ) -> Result<ToolOutcome, ToolError> {
        let executor = self
            .get(tool.kind)
            .ok_or_else(|| ToolError::ExecutorNotRegistered(tool.kind.to_string()))?;
        executor.execute(&tool.config, results, ctx).await
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
