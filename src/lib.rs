//! # Stepchain — a workflow execution engine
//!
//! `stepchain` walks a directed-acyclic-graph (DAG) of configured workflow
//! steps, dispatches each step's attached tool, persists results through an
//! injected store, and decides when a run is complete or has failed. It is
//! the orchestration core of a no-code workflow product:
//!
//! - **Chain orchestration**: recursive traversal over `nextStepIds`, one
//!   step at a time, with re-entrant handling of pre-completed steps and a
//!   uniform fail-fast policy on tool errors.
//! - **Manual barriers**: a Manual step halts the chain until a form is
//!   submitted for it — unless the execution was webhook-triggered, in which
//!   case the captured payload stands in as synthetic input.
//! - **Completion policy**: an idempotent evaluator that only considers
//!   *reached* steps, so branches a trigger never visits don't block
//!   completion.
//! - **Tool capabilities**: form, email, AI agent, HTTP request, and webhook
//!   executors behind a registry keyed by a closed enum; provider seams
//!   (LLM, mail) are injected traits.
//! - **Background execution**: triggers return after completing their own
//!   step; the rest of the chain runs on a spawned task that never
//!   propagates errors to the caller.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use stepchain::{MemoryExecutionStore, WorkflowService};
//! use stepchain::ExecutionMetadata;
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = Arc::new(MemoryExecutionStore::new());
//!     // ... seed the store with a template, step templates, and tools ...
//!     let service = WorkflowService::builder()
//!         .store(store)
//!         .build()
//!         .unwrap();
//!
//!     let execution = service
//!         .create_execution("template-id", ExecutionMetadata::manual())
//!         .await
//!         .unwrap();
//!     let handle = service
//!         .submit_root_input(&execution.id, serde_json::json!({"field": "value"}), "user")
//!         .await
//!         .unwrap();
//!     let status = handle.wait().await;
//!     println!("{:?}", status);
//! }
//! ```

pub mod api;
pub mod domain;
pub mod engine;
pub mod error;
pub mod graph;
pub mod store;
pub mod tools;

pub use crate::api::{WorkflowService, WorkflowServiceBuilder};
pub use crate::domain::execution::{
    CapturedRequest, ExecutionMetadata, RunStatus, StepExecution, ToolExecution, ToolRunStatus,
    TriggerType, WorkflowExecution,
};
pub use crate::domain::model::{StepKind, StepTemplate, Tool, ToolKind, WorkflowTemplate};
pub use crate::engine::{
    BackgroundRunner, ChainRunner, CompletionEvaluator, RunHandle, StepResult, StepResults,
};
pub use crate::error::{ChainError, ToolError};
pub use crate::store::{ExecutionStore, MemoryExecutionStore, StoreError};
pub use crate::tools::{
    BufferingTransport, EchoLlmClient, EmailMessage, EmailTransport, LlmClient, LlmRequest,
    OutcomeStatus, ToolContext, ToolExecutor, ToolOutcome, ToolRegistry,
};
