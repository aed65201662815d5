//! Orchestration-level error types.

use thiserror::Error;

use crate::store::StoreError;

/// Errors raised while driving a workflow execution
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("Graph build error: {0}")]
    GraphBuildError(String),
    #[error("Graph validation error: {0}")]
    GraphValidationError(String),
    #[error("Execution not found: {0}")]
    ExecutionNotFound(String),
    #[error("Step execution not found: {0}")]
    StepExecutionNotFound(String),
    #[error("Template not found: {0}")]
    TemplateNotFound(String),
    #[error("Step not resumable: {0}")]
    NotResumable(String),
    #[error("Input validation error: {0}")]
    InvalidInput(String),
    #[error("Step failed: step={step_execution_id}, error={message}")]
    StepFailed {
        step_execution_id: String,
        message: String,
    },
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Internal error: {0}")]
    InternalError(String),
}
