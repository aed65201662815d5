//! High-level service wrapping the engine.
//!
//! [`WorkflowService`] (constructed via [`WorkflowServiceBuilder`]) owns the
//! store, the tool registry, and the background runner, and exposes the
//! trigger entry points: create an execution, submit root input, submit a
//! form for a halted manual step, receive a webhook, and poll status.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;

use crate::domain::execution::{
    CapturedRequest, ExecutionMetadata, RunStatus, StepExecution, WorkflowExecution,
};
use crate::engine::{BackgroundRunner, ChainRunner, RunHandle, StepResults, StepRun};
use crate::error::ChainError;
use crate::graph::validate_template;
use crate::store::ExecutionStore;
use crate::tools::{BufferingTransport, EchoLlmClient, EmailTransport, LlmClient, ToolRegistry};

pub struct WorkflowService {
    store: Arc<dyn ExecutionStore>,
    chain: Arc<ChainRunner>,
    runner: BackgroundRunner,
}

impl WorkflowService {
    /// Create a new builder.
    pub fn builder() -> WorkflowServiceBuilder {
        WorkflowServiceBuilder {
            store: None,
            tool_registry: None,
            llm_client: None,
            email_transport: None,
        }
    }

    /// Validate the template's DAG and materialize an execution: one
    /// workflow execution row plus a Draft step execution for every template
    /// step, written in a single transaction.
    pub async fn create_execution(
        &self,
        template_id: &str,
        metadata: ExecutionMetadata,
    ) -> Result<WorkflowExecution, ChainError> {
        let template = self
            .store
            .get_template(template_id)
            .await?
            .ok_or_else(|| ChainError::TemplateNotFound(template_id.to_string()))?;
        let step_templates = self.store.list_step_templates(template_id).await?;
        validate_template(&template, &step_templates)?;

        let sibling_ids: HashMap<String, String> = step_templates
            .iter()
            .map(|s| (s.id.clone(), uuid::Uuid::new_v4().to_string()))
            .collect();
        let execution = WorkflowExecution {
            id: uuid::Uuid::new_v4().to_string(),
            template_id: template.id.clone(),
            status: RunStatus::Active,
            // Present after validation: the root is one of the steps
            root_step_execution_id: sibling_ids[&template.root_step_template_id].clone(),
            metadata,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let steps: Vec<StepExecution> = step_templates
            .iter()
            .map(|t| StepExecution::materialize(t, &execution.id, &sibling_ids))
            .collect();

        self.store.create_execution(&execution, &steps).await?;
        tracing::info!(
            execution_id = %execution.id,
            template_id = %template.id,
            steps = steps.len(),
            "execution created"
        );
        Ok(execution)
    }

    /// Synchronously complete the root step with the submitted form data,
    /// then hand the rest of the chain to the background runner.
    pub async fn submit_root_input(
        &self,
        execution_id: &str,
        input: Value,
        actor: &str,
    ) -> Result<RunHandle, ChainError> {
        let execution = self.load_open_execution(execution_id).await?;
        let root_id = execution.root_step_execution_id.clone();
        self.submit_step(execution, &root_id, input, actor).await
    }

    /// Resume a chain halted at a manual step: complete that one step with
    /// the submitted data, then drive its downstream steps in the
    /// background.
    pub async fn submit_step_form(
        &self,
        execution_id: &str,
        step_execution_id: &str,
        input: Value,
        actor: &str,
    ) -> Result<RunHandle, ChainError> {
        let execution = self.load_open_execution(execution_id).await?;
        self.submit_step(execution, step_execution_id, input, actor)
            .await
    }

    /// Webhook receipt: create an execution carrying the captured request,
    /// pre-complete the webhook step, and hand off. Downstream manual steps
    /// run automatically with the payload as synthetic input.
    pub async fn receive_webhook(
        &self,
        template_id: &str,
        request: CapturedRequest,
    ) -> Result<(WorkflowExecution, RunHandle), ChainError> {
        let execution = self
            .create_execution(template_id, ExecutionMetadata::webhook(request))
            .await?;

        let root = self
            .store
            .get_step_execution(&execution.root_step_execution_id)
            .await?
            .ok_or_else(|| {
                ChainError::StepExecutionNotFound(execution.root_step_execution_id.clone())
            })?;
        let mut results = StepResults::new();
        self.chain
            .execute_step(&execution, root, &mut results, None, "webhook")
            .await?;

        // Hand off at the pre-completed step: the walker's re-entrancy
        // short-circuit merges its result and continues downstream.
        let handle = self.runner.spawn_chain(
            execution.id.clone(),
            vec![execution.root_step_execution_id.clone()],
            results,
        );
        Ok((execution, handle))
    }

    /// Read-only status projection for polling.
    pub async fn execution_status(&self, execution_id: &str) -> Result<RunStatus, ChainError> {
        let execution = self
            .store
            .get_execution(execution_id)
            .await?
            .ok_or_else(|| ChainError::ExecutionNotFound(execution_id.to_string()))?;
        Ok(execution.status)
    }

    async fn load_open_execution(
        &self,
        execution_id: &str,
    ) -> Result<WorkflowExecution, ChainError> {
        let execution = self
            .store
            .get_execution(execution_id)
            .await?
            .ok_or_else(|| ChainError::ExecutionNotFound(execution_id.to_string()))?;
        if execution.status.is_terminal() {
            return Err(ChainError::NotResumable(format!(
                "execution {} is already terminal",
                execution_id
            )));
        }
        Ok(execution)
    }

    async fn submit_step(
        &self,
        execution: WorkflowExecution,
        step_execution_id: &str,
        input: Value,
        actor: &str,
    ) -> Result<RunHandle, ChainError> {
        let step = self
            .store
            .get_step_execution(step_execution_id)
            .await?
            .ok_or_else(|| ChainError::StepExecutionNotFound(step_execution_id.to_string()))?;
        if step.workflow_execution_id != execution.id {
            return Err(ChainError::NotResumable(format!(
                "step {} does not belong to execution {}",
                step_execution_id, execution.id
            )));
        }
        if step.status.is_terminal() {
            return Err(ChainError::NotResumable(format!(
                "step {} already ran",
                step_execution_id
            )));
        }

        let mut results = self.chain.hydrate_results(&execution.id).await?;
        let run = self
            .chain
            .execute_step(&execution, step, &mut results, Some(input), actor)
            .await?;

        let next_step_ids = match run {
            StepRun::Completed(step) => {
                // A leaf step has no downstream frame to run the completion
                // scan; run it here so the execution can terminate.
                if step.next_step_ids.is_empty() {
                    self.chain.completion().evaluate(&execution.id).await?;
                }
                step.next_step_ids
            }
            StepRun::AwaitingInput(_) => Vec::new(),
            StepRun::Skipped(step) => {
                return Err(ChainError::NotResumable(format!(
                    "step {} has no tool attached",
                    step.id
                )));
            }
        };
        let handle = self
            .runner
            .spawn_chain(execution.id.clone(), next_step_ids, results);
        Ok(handle)
    }
}

pub struct WorkflowServiceBuilder {
    store: Option<Arc<dyn ExecutionStore>>,
    tool_registry: Option<Arc<ToolRegistry>>,
    llm_client: Option<Arc<dyn LlmClient>>,
    email_transport: Option<Arc<dyn EmailTransport>>,
}

impl WorkflowServiceBuilder {
    pub fn store(mut self, store: Arc<dyn ExecutionStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Use a fully custom registry. Wins over the seam setters below.
    pub fn tool_registry(mut self, registry: Arc<ToolRegistry>) -> Self {
        self.tool_registry = Some(registry);
        self
    }

    pub fn llm_client(mut self, client: Arc<dyn LlmClient>) -> Self {
        self.llm_client = Some(client);
        self
    }

    pub fn email_transport(mut self, transport: Arc<dyn EmailTransport>) -> Self {
        self.email_transport = Some(transport);
        self
    }

    pub fn build(self) -> Result<WorkflowService, ChainError> {
        let store = self
            .store
            .ok_or_else(|| ChainError::InternalError("builder requires a store".to_string()))?;
        let registry = match self.tool_registry {
            Some(registry) => registry,
            None => Arc::new(ToolRegistry::with_defaults(
                self.llm_client.unwrap_or_else(|| Arc::new(EchoLlmClient)),
                self.email_transport
                    .unwrap_or_else(|| Arc::new(BufferingTransport::new())),
            )),
        };
        let chain = Arc::new(ChainRunner::new(Arc::clone(&store), registry));
        let runner = BackgroundRunner::new(Arc::clone(&chain), Arc::clone(&store));
        Ok(WorkflowService {
            store,
            chain,
            runner,
        })
    }
}
