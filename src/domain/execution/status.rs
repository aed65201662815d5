//! Execution status — the canonical definition of run states.
//!
//! Workflow executions and step executions share the same lifecycle:
//! `Draft → Active → {Completed | Failed}`, no backward transitions. A step
//! is Active only during the synchronous call that executes it.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a workflow execution or step execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Draft,
    Active,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Failed)
    }
}

/// Outcome of one tool invocation as persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ToolRunStatus {
    Completed,
    Failed,
    AwaitingUserInput,
}

/// How an execution was started. A webhook trigger relaxes the manual-step
/// barrier: the captured payload stands in for form input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    Manual,
    Webhook,
    Api,
}
