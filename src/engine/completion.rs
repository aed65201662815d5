//! The completion evaluator: an idempotent scan deciding whether an
//! execution has reached a terminal state.
//!
//! Only **reached** steps count: the root, any step that left Draft, and any
//! step with a recorded tool execution. Branches a trigger never visits stay
//! Draft forever and do not block completion — a DAG may legitimately
//! contain dead ends.

use std::sync::Arc;

use crate::domain::execution::RunStatus;
use crate::error::ChainError;
use crate::store::ExecutionStore;

pub struct CompletionEvaluator {
    store: Arc<dyn ExecutionStore>,
}

impl CompletionEvaluator {
    pub fn new(store: Arc<dyn ExecutionStore>) -> Self {
        CompletionEvaluator { store }
    }

    /// Evaluate the execution; returns whether a terminal transition
    /// happened. Safe to call redundantly — an already-terminal execution is
    /// never re-transitioned.
    pub async fn evaluate(&self, execution_id: &str) -> Result<bool, ChainError> {
        let Some(execution) = self.store.get_execution(execution_id).await? else {
            tracing::warn!(execution_id, "execution missing; nothing to evaluate");
            return Ok(false);
        };
        if execution.status.is_terminal() {
            return Ok(false);
        }

        let steps = self.store.list_step_executions(execution_id).await?;
        let reached: Vec<_> = steps
            .iter()
            .filter(|s| {
                s.id == execution.root_step_execution_id
                    || s.status != RunStatus::Draft
                    || !s.tool_exec_ids.is_empty()
            })
            .collect();

        if reached.iter().any(|s| s.status == RunStatus::Failed) {
            self.store
                .update_execution_status(execution_id, RunStatus::Failed)
                .await?;
            return Ok(true);
        }

        if !reached.is_empty() && reached.iter().all(|s| s.status == RunStatus::Completed) {
            self.store
                .update_execution_status(execution_id, RunStatus::Completed)
                .await?;
            return Ok(true);
        }

        Ok(false)
    }
}
