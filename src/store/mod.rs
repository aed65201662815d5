//! Execution store boundary.
//!
//! Durability is delegated to an [`ExecutionStore`] implementation injected
//! into the engine; nothing in the crate holds state outside this trait.
//! [`MemoryExecutionStore`] backs tests and embedded use.

mod memory;

use async_trait::async_trait;

use crate::domain::execution::{RunStatus, StepExecution, ToolExecution, WorkflowExecution};
use crate::domain::model::{StepTemplate, Tool, WorkflowTemplate};

pub use memory::MemoryExecutionStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Rejected payload: {0}")]
    RejectedPayload(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Backend error: {0}")]
    BackendError(String),
}

/// Durable CRUD over templates, tools, and execution records, plus the one
/// transactional write the engine needs: materializing an execution together
/// with all of its step executions.
#[async_trait]
pub trait ExecutionStore: Send + Sync {
    // -- template side (authored elsewhere, read by the engine) --
    async fn insert_template(&self, template: &WorkflowTemplate) -> Result<(), StoreError>;
    async fn get_template(&self, id: &str) -> Result<Option<WorkflowTemplate>, StoreError>;
    async fn insert_step_template(&self, step: &StepTemplate) -> Result<(), StoreError>;
    async fn get_step_template(&self, id: &str) -> Result<Option<StepTemplate>, StoreError>;
    async fn list_step_templates(&self, template_id: &str)
        -> Result<Vec<StepTemplate>, StoreError>;
    async fn insert_tool(&self, tool: &Tool) -> Result<(), StoreError>;
    async fn get_tool(&self, id: &str) -> Result<Option<Tool>, StoreError>;

    // -- execution side --
    /// Insert the execution and every step execution in one transaction.
    async fn create_execution(
        &self,
        execution: &WorkflowExecution,
        steps: &[StepExecution],
    ) -> Result<(), StoreError>;
    async fn get_execution(&self, id: &str) -> Result<Option<WorkflowExecution>, StoreError>;
    async fn update_execution_status(&self, id: &str, status: RunStatus)
        -> Result<(), StoreError>;

    async fn get_step_execution(&self, id: &str) -> Result<Option<StepExecution>, StoreError>;
    async fn list_step_executions(
        &self,
        execution_id: &str,
    ) -> Result<Vec<StepExecution>, StoreError>;
    async fn update_step_execution(&self, step: &StepExecution) -> Result<(), StoreError>;

    async fn insert_tool_execution(&self, record: &ToolExecution) -> Result<(), StoreError>;
    async fn get_tool_execution(&self, id: &str) -> Result<Option<ToolExecution>, StoreError>;
    async fn list_tool_executions_for_step(
        &self,
        step_execution_id: &str,
    ) -> Result<Vec<ToolExecution>, StoreError>;
}
