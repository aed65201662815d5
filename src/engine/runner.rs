//! Fire-and-forget driver for the automated part of a chain.
//!
//! Triggers return to their caller as soon as their own step is done; the
//! rest of the traversal runs on a spawned task. Errors never propagate to
//! the caller — they are logged, fed to the completion evaluator, and
//! followed by a best-effort Failed mark.

use std::sync::Arc;

use tokio::sync::watch;

use super::chain::ChainRunner;
use super::results::StepResults;
use crate::domain::execution::RunStatus;
use crate::store::ExecutionStore;

/// Handle to a background chain run.
///
/// The final status is whatever the execution's persisted status is when the
/// task finishes — which may still be Active if the chain halted at a manual
/// step.
#[derive(Debug)]
pub struct RunHandle {
    status_rx: watch::Receiver<Option<RunStatus>>,
}

impl RunHandle {
    /// Block until the background task has finished and report the
    /// execution's status at that point.
    pub async fn wait(&self) -> RunStatus {
        let mut rx = self.status_rx.clone();
        loop {
            let current = *rx.borrow();
            if let Some(status) = current {
                return status;
            }
            if rx.changed().await.is_err() {
                // Sender dropped without reporting; the store remains the
                // source of truth, report the conservative answer.
                return RunStatus::Failed;
            }
        }
    }

    /// Non-blocking: the reported status, if the task already finished.
    pub fn try_status(&self) -> Option<RunStatus> {
        *self.status_rx.borrow()
    }
}

pub struct BackgroundRunner {
    chain: Arc<ChainRunner>,
    store: Arc<dyn ExecutionStore>,
}

impl BackgroundRunner {
    pub fn new(chain: Arc<ChainRunner>, store: Arc<dyn ExecutionStore>) -> Self {
        BackgroundRunner { chain, store }
    }

    /// Drive the chain from each of `start_step_ids`, in order, on a
    /// spawned task.
    pub fn spawn_chain(
        &self,
        execution_id: String,
        start_step_ids: Vec<String>,
        seed_results: StepResults,
    ) -> RunHandle {
        let (status_tx, status_rx) = watch::channel::<Option<RunStatus>>(None);
        let chain = Arc::clone(&self.chain);
        let store = Arc::clone(&self.store);

        tokio::spawn(async move {
            let mut results = seed_results;
            let mut run_result = Ok(());
            for step_id in &start_step_ids {
                run_result = chain.advance(&execution_id, step_id, &mut results).await;
                if run_result.is_err() {
                    break;
                }
            }

            if let Err(err) = run_result {
                tracing::error!(
                    execution_id = %execution_id,
                    error = %err,
                    "background chain aborted"
                );
                // The evaluator may record a more specific failure than the
                // blanket mark below.
                if let Err(eval_err) = chain.completion().evaluate(&execution_id).await {
                    tracing::error!(error = %eval_err, "completion evaluation failed");
                }
                match store.get_execution(&execution_id).await {
                    Ok(Some(execution)) if !execution.status.is_terminal() => {
                        if let Err(mark_err) = store
                            .update_execution_status(&execution_id, RunStatus::Failed)
                            .await
                        {
                            tracing::error!(
                                error = %mark_err,
                                "failed to mark execution as failed"
                            );
                        }
                    }
                    Ok(_) => {}
                    Err(load_err) => {
                        tracing::error!(error = %load_err, "failed to load execution status");
                    }
                }
            }

            let final_status = match store.get_execution(&execution_id).await {
                Ok(Some(execution)) => execution.status,
                _ => RunStatus::Failed,
            };
            let _ = status_tx.send(Some(final_status));
        });

        RunHandle { status_rx }
    }
}
