//! The chain orchestrator: a recursive walk over one execution's step DAG.
//!
//! `advance` drives one step execution and then its downstream steps, in
//! array order, one at a time. Failure policy is uniform fail-fast: a tool
//! error marks the step and the workflow Failed and aborts the remaining
//! traversal, sibling branches included.

use std::sync::Arc;

use chrono::Utc;
use futures::future::BoxFuture;
use serde_json::Value;

use super::completion::CompletionEvaluator;
use super::results::{StepResult, StepResults};
use crate::domain::execution::{
    RunStatus, StepExecution, ToolExecution, ToolRunStatus, TriggerType, WorkflowExecution,
};
use crate::domain::model::StepKind;
use crate::error::{ChainError, ToolError};
use crate::store::{ExecutionStore, StoreError};
use crate::tools::{OutcomeStatus, ToolContext, ToolOutcome, ToolRegistry};

/// What executing one step amounted to.
pub(crate) enum StepRun {
    /// Tool ran (or was skipped as a no-op) and the step is now Completed.
    Completed(StepExecution),
    /// The tool reported `AwaitingUserInput`; the step stays open.
    AwaitingInput(StepExecution),
    /// Nothing to execute (no template, no tool attached).
    Skipped(StepExecution),
}

pub struct ChainRunner {
    store: Arc<dyn ExecutionStore>,
    registry: Arc<ToolRegistry>,
    completion: CompletionEvaluator,
}

impl ChainRunner {
    pub fn new(store: Arc<dyn ExecutionStore>, registry: Arc<ToolRegistry>) -> Self {
        let completion = CompletionEvaluator::new(Arc::clone(&store));
        ChainRunner {
            store,
            registry,
            completion,
        }
    }

    pub fn completion(&self) -> &CompletionEvaluator {
        &self.completion
    }

    /// Advance the chain at one step execution, then walk its downstream
    /// steps. Re-entrant: an already-Completed step merges its stored result
    /// and continues downstream without re-invoking its tool.
    pub fn advance<'a>(
        &'a self,
        execution_id: &'a str,
        step_execution_id: &'a str,
        results: &'a mut StepResults,
    ) -> BoxFuture<'a, Result<(), ChainError>> {
        Box::pin(async move {
            let Some(step) = self.store.get_step_execution(step_execution_id).await? else {
                tracing::warn!(step_execution_id, "step execution missing; skipping");
                return Ok(());
            };
            let Some(execution) = self.store.get_execution(execution_id).await? else {
                tracing::warn!(execution_id, "execution missing; skipping");
                return Ok(());
            };

            let next_step_ids = step.next_step_ids.clone();

            if step.status == RunStatus::Completed {
                self.merge_stored_result(&step, results).await?;
            } else {
                // Manual barrier: the chain resumes later through the
                // form-submission entry point. A webhook trigger drives the
                // step automatically with the captured payload as input.
                if step.kind == StepKind::Manual
                    && execution.metadata.trigger_type != TriggerType::Webhook
                {
                    tracing::debug!(step_name = %step.name, "halting at manual step");
                    return Ok(());
                }

                match self
                    .execute_step(&execution, step, results, None, "system")
                    .await?
                {
                    StepRun::Completed(_) => {}
                    StepRun::AwaitingInput(_) => {
                        self.completion.evaluate(execution_id).await?;
                        return Ok(());
                    }
                    StepRun::Skipped(_) => return Ok(()),
                }
            }

            self.run_downstream(&execution, &next_step_ids, results)
                .await?;
            self.completion.evaluate(execution_id).await?;
            Ok(())
        })
    }

    /// Execute the downstream steps of one frame, sequentially in array
    /// order. Only automated steps run unless the execution is
    /// webhook-triggered.
    async fn run_downstream(
        &self,
        execution: &WorkflowExecution,
        next_step_ids: &[String],
        results: &mut StepResults,
    ) -> Result<(), ChainError> {
        for next_id in next_step_ids {
            let Some(next) = self.store.get_step_execution(next_id).await? else {
                tracing::warn!(step_execution_id = %next_id, "downstream step missing; skipping");
                continue;
            };
            let eligible = next.kind == StepKind::Automated
                || execution.metadata.trigger_type == TriggerType::Webhook;
            if !eligible {
                continue;
            }
            self.advance(&execution.id, next_id, results).await?;
        }
        Ok(())
    }

    /// Run one step's tool and persist the outcome.
    ///
    /// `submitted_input` carries form data on the resume path; a Manual step
    /// under a webhook trigger substitutes the captured payload when no
    /// input was supplied.
    pub(crate) async fn execute_step(
        &self,
        execution: &WorkflowExecution,
        mut step: StepExecution,
        results: &mut StepResults,
        submitted_input: Option<Value>,
        actor: &str,
    ) -> Result<StepRun, ChainError> {
        let Some(template) = self.store.get_step_template(&step.step_template_id).await? else {
            tracing::warn!(
                step_template_id = %step.step_template_id,
                "step template missing; nothing to execute"
            );
            return Ok(StepRun::Skipped(step));
        };
        let Some(tool_id) = template.tool_ids.first() else {
            return Ok(StepRun::Skipped(step));
        };
        let Some(tool) = self.store.get_tool(tool_id).await? else {
            tracing::warn!(tool_id = %tool_id, "tool missing; nothing to execute");
            return Ok(StepRun::Skipped(step));
        };

        let submitted_input = submitted_input.or_else(|| {
            if step.kind == StepKind::Manual
                && execution.metadata.trigger_type == TriggerType::Webhook
            {
                execution
                    .metadata
                    .webhook_request
                    .as_ref()
                    .map(|r| r.body.clone())
            } else {
                None
            }
        });

        let ctx = ToolContext {
            workflow_execution_id: execution.id.clone(),
            step_execution_id: step.id.clone(),
            step_name: step.name.clone(),
            trigger_type: execution.metadata.trigger_type,
            webhook_request: execution.metadata.webhook_request.clone(),
            submitted_input,
        };

        let started_at = Utc::now();
        let outcome = match self.registry.invoke(&tool, results, &ctx).await {
            Ok(outcome) => outcome,
            // Bad submitted input aborts the submit call, not the workflow:
            // nothing has been persisted for this step yet.
            Err(ToolError::InputValidationError(message)) => {
                return Err(ChainError::InvalidInput(message));
            }
            Err(err) => ToolOutcome {
                status: OutcomeStatus::Error,
                result: serde_json::json!({ "error": err.to_string() }),
            },
        };

        let mut record = ToolExecution {
            id: uuid::Uuid::new_v4().to_string(),
            tool_id: tool.id.clone(),
            step_execution_id: step.id.clone(),
            workflow_execution_id: execution.id.clone(),
            status: tool_run_status(outcome.status),
            result: outcome.result.clone(),
            started_at,
            finished_at: Utc::now(),
        };
        self.persist_tool_execution(&mut record).await?;
        step.tool_exec_ids.push(record.id.clone());

        match outcome.status {
            OutcomeStatus::Error => {
                let message = outcome
                    .result
                    .get("error")
                    .and_then(|v| v.as_str())
                    .unwrap_or("tool reported an error")
                    .to_string();
                tracing::error!(
                    step_name = %step.name,
                    error = %message,
                    "tool failed; failing step and workflow"
                );
                step.status = RunStatus::Failed;
                self.store.update_step_execution(&step).await?;
                self.store
                    .update_execution_status(&execution.id, RunStatus::Failed)
                    .await?;
                Err(ChainError::StepFailed {
                    step_execution_id: step.id,
                    message,
                })
            }
            OutcomeStatus::AwaitingUserInput => {
                self.store.update_step_execution(&step).await?;
                Ok(StepRun::AwaitingInput(step))
            }
            OutcomeStatus::Success | OutcomeStatus::PartialSuccess => {
                step.status = RunStatus::Completed;
                step.completed_by = Some(actor.to_string());
                step.completed_at = Some(Utc::now());
                self.store.update_step_execution(&step).await?;
                results.push(StepResult {
                    step_execution_id: step.id.clone(),
                    step_name: step.name.clone(),
                    tool_kind: Some(tool.kind),
                    status: outcome.status,
                    result: record.result,
                });
                Ok(StepRun::Completed(step))
            }
        }
    }

    /// Rebuild the accumulator from the store, in completion order. Used
    /// when the chain re-enters through a trigger after a halt.
    pub async fn hydrate_results(&self, execution_id: &str) -> Result<StepResults, ChainError> {
        let mut steps: Vec<StepExecution> = self
            .store
            .list_step_executions(execution_id)
            .await?
            .into_iter()
            .filter(|s| s.status == RunStatus::Completed)
            .collect();
        steps.sort_by_key(|s| s.completed_at);

        let mut results = StepResults::new();
        for step in &steps {
            self.merge_stored_result(step, &mut results).await?;
        }
        Ok(results)
    }

    /// Merge an already-Completed step's stored result into the
    /// accumulator. A completed step with no surviving tool execution (a
    /// webhook-origin step whose record was lost) gets a placeholder so
    /// downstream steps still see a well-formed shape.
    async fn merge_stored_result(
        &self,
        step: &StepExecution,
        results: &mut StepResults,
    ) -> Result<(), ChainError> {
        let records = self.store.list_tool_executions_for_step(&step.id).await?;
        match records.last() {
            Some(record) => results.push(StepResult {
                step_execution_id: step.id.clone(),
                step_name: step.name.clone(),
                tool_kind: None,
                status: match record.status {
                    ToolRunStatus::Failed => OutcomeStatus::Error,
                    _ => OutcomeStatus::Success,
                },
                result: record.result.clone(),
            }),
            None => {
                tracing::warn!(
                    step_name = %step.name,
                    "completed step has no tool execution; synthesizing placeholder result"
                );
                results.push(StepResult::synthesized(&step.id, &step.name));
            }
        }
        Ok(())
    }

    /// Insert a tool execution, degrading gracefully when the store rejects
    /// the payload: sanitize and retry once, then fall back to a minimal
    /// marker record. The fact that the step ran is never dropped.
    async fn persist_tool_execution(&self, record: &mut ToolExecution) -> Result<(), ChainError> {
        match self.store.insert_tool_execution(record).await {
            Ok(()) => Ok(()),
            Err(StoreError::RejectedPayload(reason)) => {
                tracing::warn!(%reason, "tool result rejected by store; sanitizing and retrying");
                record.result = sanitize_value(&record.result);
                match self.store.insert_tool_execution(record).await {
                    Ok(()) => Ok(()),
                    Err(err) => {
                        tracing::error!(
                            error = %err,
                            "sanitized result still rejected; persisting storage-failure marker"
                        );
                        record.result = serde_json::json!({
                            "storageFailure": true,
                            "error": err.to_string(),
                        });
                        Ok(self.store.insert_tool_execution(record).await?)
                    }
                }
            }
            Err(err) => Err(err.into()),
        }
    }
}

fn tool_run_status(status: OutcomeStatus) -> ToolRunStatus {
    match status {
        OutcomeStatus::Success | OutcomeStatus::PartialSuccess => ToolRunStatus::Completed,
        OutcomeStatus::Error => ToolRunStatus::Failed,
        OutcomeStatus::AwaitingUserInput => ToolRunStatus::AwaitingUserInput,
    }
}

/// Strip characters a jsonb column refuses (NUL) from every string in the
/// payload.
fn sanitize_value(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(s.replace('\u{0}', "")),
        Value::Array(items) => Value::Array(items.iter().map(sanitize_value).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.replace('\u{0}', ""), sanitize_value(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}
