use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{ExecutionStore, StoreError};
use crate::domain::execution::{RunStatus, StepExecution, ToolExecution, WorkflowExecution};
use crate::domain::model::{StepTemplate, Tool, WorkflowTemplate};

/// In-memory execution store.
///
/// Mirrors the behavior of the SQL-backed store closely enough for tests and
/// embedded use, including rejecting result payloads that contain NUL
/// characters (a jsonb column refuses them), which exercises the engine's
/// sanitize-and-retry path.
#[derive(Default)]
pub struct MemoryExecutionStore {
    templates: RwLock<HashMap<String, WorkflowTemplate>>,
    step_templates: RwLock<HashMap<String, StepTemplate>>,
    tools: RwLock<HashMap<String, Tool>>,
    executions: RwLock<HashMap<String, WorkflowExecution>>,
    step_executions: RwLock<HashMap<String, StepExecution>>,
    tool_executions: RwLock<HashMap<String, ToolExecution>>,
}

impl MemoryExecutionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn contains_nul(value: &Value) -> bool {
    match value {
        Value::String(s) => s.contains('\u{0}'),
        Value::Array(items) => items.iter().any(contains_nul),
        Value::Object(map) => map.values().any(contains_nul),
        _ => false,
    }
}

#[async_trait]
impl ExecutionStore for MemoryExecutionStore {
    async fn insert_template(&self, template: &WorkflowTemplate) -> Result<(), StoreError> {
        self.templates
            .write()
            .await
            .insert(template.id.clone(), template.clone());
        Ok(())
    }

    async fn get_template(&self, id: &str) -> Result<Option<WorkflowTemplate>, StoreError> {
        Ok(self.templates.read().await.get(id).cloned())
    }

    async fn insert_step_template(&self, step: &StepTemplate) -> Result<(), StoreError> {
        self.step_templates
            .write()
            .await
            .insert(step.id.clone(), step.clone());
        Ok(())
    }

    async fn get_step_template(&self, id: &str) -> Result<Option<StepTemplate>, StoreError> {
        Ok(self.step_templates.read().await.get(id).cloned())
    }

    async fn list_step_templates(
        &self,
        template_id: &str,
    ) -> Result<Vec<StepTemplate>, StoreError> {
        Ok(self
            .step_templates
            .read()
            .await
            .values()
            .filter(|s| s.template_id == template_id)
            .cloned()
            .collect())
    }

    async fn insert_tool(&self, tool: &Tool) -> Result<(), StoreError> {
        self.tools.write().await.insert(tool.id.clone(), tool.clone());
        Ok(())
    }

    async fn get_tool(&self, id: &str) -> Result<Option<Tool>, StoreError> {
        Ok(self.tools.read().await.get(id).cloned())
    }

    async fn create_execution(
        &self,
        execution: &WorkflowExecution,
        steps: &[StepExecution],
    ) -> Result<(), StoreError> {
        let mut executions = self.executions.write().await;
        if executions.contains_key(&execution.id) {
            return Err(StoreError::Conflict(format!(
                "execution {} already exists",
                execution.id
            )));
        }
        let mut step_executions = self.step_executions.write().await;
        executions.insert(execution.id.clone(), execution.clone());
        for step in steps {
            step_executions.insert(step.id.clone(), step.clone());
        }
        Ok(())
    }

    async fn get_execution(&self, id: &str) -> Result<Option<WorkflowExecution>, StoreError> {
        Ok(self.executions.read().await.get(id).cloned())
    }

    async fn update_execution_status(
        &self,
        id: &str,
        status: RunStatus,
    ) -> Result<(), StoreError> {
        let mut executions = self.executions.write().await;
        let execution = executions
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(format!("execution {}", id)))?;
        execution.status = status;
        execution.updated_at = chrono::Utc::now();
        Ok(())
    }

    async fn get_step_execution(&self, id: &str) -> Result<Option<StepExecution>, StoreError> {
        Ok(self.step_executions.read().await.get(id).cloned())
    }

    async fn list_step_executions(
        &self,
        execution_id: &str,
    ) -> Result<Vec<StepExecution>, StoreError> {
        Ok(self
            .step_executions
            .read()
            .await
            .values()
            .filter(|s| s.workflow_execution_id == execution_id)
            .cloned()
            .collect())
    }

    async fn update_step_execution(&self, step: &StepExecution) -> Result<(), StoreError> {
        let mut steps = self.step_executions.write().await;
        if !steps.contains_key(&step.id) {
            return Err(StoreError::NotFound(format!("step execution {}", step.id)));
        }
        steps.insert(step.id.clone(), step.clone());
        Ok(())
    }

    async fn insert_tool_execution(&self, record: &ToolExecution) -> Result<(), StoreError> {
        if contains_nul(&record.result) {
            return Err(StoreError::RejectedPayload(
                "result contains NUL characters".to_string(),
            ));
        }
        self.tool_executions
            .write()
            .await
            .insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn get_tool_execution(&self, id: &str) -> Result<Option<ToolExecution>, StoreError> {
        Ok(self.tool_executions.read().await.get(id).cloned())
    }

    async fn list_tool_executions_for_step(
        &self,
        step_execution_id: &str,
    ) -> Result<Vec<ToolExecution>, StoreError> {
        let mut records: Vec<ToolExecution> = self
            .tool_executions
            .read()
            .await
            .values()
            .filter(|t| t.step_execution_id == step_execution_id)
            .cloned()
            .collect();
        records.sort_by_key(|t| t.started_at);
        Ok(records)
    }
}
