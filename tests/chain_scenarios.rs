//! End-to-end traversal scenarios over the in-memory store.

mod common;

use std::sync::Arc;

use serde_json::json;

use common::*;
use stepchain::{
    ChainRunner, ExecutionMetadata, ExecutionStore, MemoryExecutionStore, OutcomeStatus,
    RunStatus, StepExecution, StepKind, StepResults, ToolKind, ToolRunStatus, WorkflowService,
};

async fn step_by_name(
    store: &MemoryExecutionStore,
    execution_id: &str,
    name: &str,
) -> StepExecution {
    store
        .list_step_executions(execution_id)
        .await
        .unwrap()
        .into_iter()
        .find(|s| s.name == name)
        .unwrap_or_else(|| panic!("no step execution named {name}"))
}

async fn tool_exec_count(store: &MemoryExecutionStore, execution_id: &str) -> usize {
    let mut count = 0;
    for step in store.list_step_executions(execution_id).await.unwrap() {
        count += store
            .list_tool_executions_for_step(&step.id)
            .await
            .unwrap()
            .len();
    }
    count
}

#[tokio::test]
async fn scenario_a_linear_chain_completes() {
    let store = Arc::new(MemoryExecutionStore::new());
    seed_template(
        &store,
        "t1",
        "root",
        vec![
            StepSpec {
                id: "root",
                name: "Intake Form",
                kind: StepKind::Automated,
                tool: Some(form_tool("tool-root", "document")),
                prev: vec![],
                next: vec!["a"],
            },
            StepSpec {
                id: "a",
                name: "Summarise",
                kind: StepKind::Automated,
                tool: Some(agent_tool("tool-a")),
                prev: vec!["root"],
                next: vec!["b"],
            },
            StepSpec {
                id: "b",
                name: "Notify",
                kind: StepKind::Automated,
                tool: Some(email_tool("tool-b")),
                prev: vec!["a"],
                next: vec![],
            },
        ],
    )
    .await;

    let mailer = Arc::new(stepchain::BufferingTransport::new());
    let service = WorkflowService::builder()
        .store(store.clone())
        .email_transport(mailer.clone())
        .build()
        .unwrap();

    let execution = service
        .create_execution("t1", ExecutionMetadata::manual())
        .await
        .unwrap();
    let handle = service
        .submit_root_input(&execution.id, json!({"document": "report.pdf"}), "alice")
        .await
        .unwrap();

    assert_eq!(handle.wait().await, RunStatus::Completed);
    assert_eq!(
        service.execution_status(&execution.id).await.unwrap(),
        RunStatus::Completed
    );

    // Every step completed and recorded a tool execution
    for name in ["Intake Form", "Summarise", "Notify"] {
        let step = step_by_name(&store, &execution.id, name).await;
        assert_eq!(step.status, RunStatus::Completed, "step {name}");
        assert_eq!(step.tool_exec_ids.len(), 1, "step {name}");
    }
    let root = step_by_name(&store, &execution.id, "Intake Form").await;
    assert_eq!(root.completed_by.as_deref(), Some("alice"));

    // The email carried the agent's output, which echoed the form data
    let sent = mailer.sent().await;
    assert_eq!(sent.len(), 1);
    assert!(sent[0].body.contains("report.pdf"));
}

#[tokio::test]
async fn scenario_b_tool_error_fails_execution_and_skips_downstream() {
    let store = Arc::new(MemoryExecutionStore::new());
    seed_template(
        &store,
        "t1",
        "root",
        vec![
            StepSpec {
                id: "root",
                name: "Intake Form",
                kind: StepKind::Automated,
                tool: Some(form_tool("tool-root", "document")),
                prev: vec![],
                next: vec!["a"],
            },
            StepSpec {
                id: "a",
                name: "Fetch",
                kind: StepKind::Automated,
                tool: Some(http_tool("tool-a")),
                prev: vec!["root"],
                next: vec!["b"],
            },
            StepSpec {
                id: "b",
                name: "Summarise",
                kind: StepKind::Automated,
                tool: Some(agent_tool("tool-b")),
                prev: vec!["a"],
                next: vec![],
            },
        ],
    )
    .await;

    let service = WorkflowService::builder()
        .store(store.clone())
        .tool_registry(registry_with_override(
            ToolKind::HttpRequest,
            Arc::new(FailingExecutor),
        ))
        .build()
        .unwrap();

    let execution = service
        .create_execution("t1", ExecutionMetadata::manual())
        .await
        .unwrap();
    let handle = service
        .submit_root_input(&execution.id, json!({"document": "x"}), "alice")
        .await
        .unwrap();

    assert_eq!(handle.wait().await, RunStatus::Failed);

    let failed = step_by_name(&store, &execution.id, "Fetch").await;
    assert_eq!(failed.status, RunStatus::Failed);
    let record = store
        .get_tool_execution(&failed.tool_exec_ids[0])
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.status, ToolRunStatus::Failed);
    assert!(record.result["error"]
        .as_str()
        .unwrap()
        .contains("connection refused"));

    // Never reached: stays Draft and is excluded from the completion check
    let unreached = step_by_name(&store, &execution.id, "Summarise").await;
    assert_eq!(unreached.status, RunStatus::Draft);
    assert!(unreached.tool_exec_ids.is_empty());
}

#[tokio::test]
async fn scenario_c_manual_step_halts_then_resumes() {
    let store = Arc::new(MemoryExecutionStore::new());
    seed_template(
        &store,
        "t1",
        "root",
        vec![
            StepSpec {
                id: "root",
                name: "Intake Form",
                kind: StepKind::Automated,
                tool: Some(form_tool("tool-root", "document")),
                prev: vec![],
                next: vec!["m"],
            },
            StepSpec {
                id: "m",
                name: "Approval",
                kind: StepKind::Manual,
                tool: Some(form_tool("tool-m", "approved")),
                prev: vec!["root"],
                next: vec!["c"],
            },
            StepSpec {
                id: "c",
                name: "Summarise",
                kind: StepKind::Automated,
                tool: Some(agent_tool("tool-c")),
                prev: vec!["m"],
                next: vec![],
            },
        ],
    )
    .await;

    let service = WorkflowService::builder()
        .store(store.clone())
        .build()
        .unwrap();

    let execution = service
        .create_execution("t1", ExecutionMetadata::manual())
        .await
        .unwrap();
    let handle = service
        .submit_root_input(&execution.id, json!({"document": "x"}), "alice")
        .await
        .unwrap();

    // The chain halts at the manual step: no further steps touched
    assert_eq!(handle.wait().await, RunStatus::Active);
    let manual = step_by_name(&store, &execution.id, "Approval").await;
    assert_eq!(manual.status, RunStatus::Draft);
    assert!(manual.tool_exec_ids.is_empty());
    assert_eq!(
        step_by_name(&store, &execution.id, "Summarise").await.status,
        RunStatus::Draft
    );

    // Resuming through the form-submission entry point finishes the run
    let handle = service
        .submit_step_form(&execution.id, &manual.id, json!({"approved": "yes"}), "bob")
        .await
        .unwrap();
    assert_eq!(handle.wait().await, RunStatus::Completed);

    let manual = step_by_name(&store, &execution.id, "Approval").await;
    assert_eq!(manual.status, RunStatus::Completed);
    assert_eq!(manual.completed_by.as_deref(), Some("bob"));
    assert_eq!(
        step_by_name(&store, &execution.id, "Summarise").await.status,
        RunStatus::Completed
    );
}

#[tokio::test]
async fn scenario_d_webhook_trigger_drives_manual_step() {
    let store = Arc::new(MemoryExecutionStore::new());
    seed_template(
        &store,
        "t1",
        "root",
        vec![
            StepSpec {
                id: "root",
                name: "Webhook",
                kind: StepKind::Automated,
                tool: Some(webhook_tool("tool-root")),
                prev: vec![],
                next: vec!["m"],
            },
            StepSpec {
                id: "m",
                name: "Approval",
                kind: StepKind::Manual,
                tool: Some(form_tool("tool-m", "city")),
                prev: vec!["root"],
                next: vec!["c"],
            },
            StepSpec {
                id: "c",
                name: "Summarise",
                kind: StepKind::Automated,
                tool: Some(agent_tool("tool-c")),
                prev: vec!["m"],
                next: vec![],
            },
        ],
    )
    .await;

    let service = WorkflowService::builder()
        .store(store.clone())
        .build()
        .unwrap();

    let (execution, handle) = service
        .receive_webhook(
            "t1",
            stepchain::CapturedRequest {
                method: "POST".to_string(),
                headers: Default::default(),
                body: json!({"city": "Shanghai", "event": "signup"}),
            },
        )
        .await
        .unwrap();

    // No form submission anywhere: the payload stood in as synthetic input
    assert_eq!(handle.wait().await, RunStatus::Completed);

    let manual = step_by_name(&store, &execution.id, "Approval").await;
    assert_eq!(manual.status, RunStatus::Completed);
    assert_eq!(manual.completed_by.as_deref(), Some("system"));
    let record = store
        .get_tool_execution(&manual.tool_exec_ids[0])
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.result["output"]["city"], json!("Shanghai"));

    let webhook_step = step_by_name(&store, &execution.id, "Webhook").await;
    let record = store
        .get_tool_execution(&webhook_step.tool_exec_ids[0])
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.result["output"]["event"], json!("signup"));
}

#[tokio::test]
async fn scenario_e_reentrant_advance_is_idempotent() {
    let store = Arc::new(MemoryExecutionStore::new());
    seed_template(
        &store,
        "t1",
        "root",
        vec![
            StepSpec {
                id: "root",
                name: "Intake Form",
                kind: StepKind::Automated,
                tool: Some(form_tool("tool-root", "document")),
                prev: vec![],
                next: vec!["a"],
            },
            StepSpec {
                id: "a",
                name: "Summarise",
                kind: StepKind::Automated,
                tool: Some(agent_tool("tool-a")),
                prev: vec!["root"],
                next: vec![],
            },
        ],
    )
    .await;

    let registry = Arc::new(stepchain::ToolRegistry::with_defaults(
        Arc::new(stepchain::EchoLlmClient),
        Arc::new(stepchain::BufferingTransport::new()),
    ));
    let service = WorkflowService::builder()
        .store(store.clone())
        .tool_registry(registry.clone())
        .build()
        .unwrap();

    let execution = service
        .create_execution("t1", ExecutionMetadata::manual())
        .await
        .unwrap();
    let handle = service
        .submit_root_input(&execution.id, json!({"document": "x"}), "alice")
        .await
        .unwrap();
    assert_eq!(handle.wait().await, RunStatus::Completed);

    let before = tool_exec_count(&store, &execution.id).await;
    assert_eq!(before, 2);

    // Re-entering at the completed root must merge stored results, not
    // re-invoke tools
    let chain = ChainRunner::new(store.clone(), registry);
    let mut results = StepResults::new();
    chain
        .advance(&execution.id, &execution.root_step_execution_id, &mut results)
        .await
        .unwrap();

    assert_eq!(tool_exec_count(&store, &execution.id).await, before);
    assert_eq!(results.len(), 2);
    let merged = results.get_by_name("Intake Form").unwrap();
    assert_eq!(merged.result["output"]["document"], json!("x"));
    assert_eq!(
        service.execution_status(&execution.id).await.unwrap(),
        RunStatus::Completed
    );
}

#[tokio::test]
async fn automated_form_step_awaits_input_mid_chain() {
    let store = Arc::new(MemoryExecutionStore::new());
    seed_template(
        &store,
        "t1",
        "root",
        vec![
            StepSpec {
                id: "root",
                name: "Intake Form",
                kind: StepKind::Automated,
                tool: Some(form_tool("tool-root", "document")),
                prev: vec![],
                next: vec!["f"],
            },
            StepSpec {
                id: "f",
                name: "Follow-up Form",
                kind: StepKind::Automated,
                tool: Some(form_tool("tool-f", "details")),
                prev: vec!["root"],
                next: vec!["c"],
            },
            StepSpec {
                id: "c",
                name: "Summarise",
                kind: StepKind::Automated,
                tool: Some(agent_tool("tool-c")),
                prev: vec!["f"],
                next: vec![],
            },
        ],
    )
    .await;

    let service = WorkflowService::builder()
        .store(store.clone())
        .build()
        .unwrap();

    let execution = service
        .create_execution("t1", ExecutionMetadata::manual())
        .await
        .unwrap();
    let handle = service
        .submit_root_input(&execution.id, json!({"document": "x"}), "alice")
        .await
        .unwrap();

    // The follow-up form ran without input and is now waiting on a human
    assert_eq!(handle.wait().await, RunStatus::Active);
    let waiting = step_by_name(&store, &execution.id, "Follow-up Form").await;
    assert_eq!(waiting.status, RunStatus::Draft);
    assert_eq!(waiting.tool_exec_ids.len(), 1);
    let record = store
        .get_tool_execution(&waiting.tool_exec_ids[0])
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.status, ToolRunStatus::AwaitingUserInput);
    assert!(record.result["formSchema"].is_array());

    let handle = service
        .submit_step_form(&execution.id, &waiting.id, json!({"details": "ok"}), "bob")
        .await
        .unwrap();
    assert_eq!(handle.wait().await, RunStatus::Completed);

    let resumed = step_by_name(&store, &execution.id, "Follow-up Form").await;
    assert_eq!(resumed.status, RunStatus::Completed);
    // Both the waiting record and the completing record survive
    assert_eq!(resumed.tool_exec_ids.len(), 2);
}

#[tokio::test]
async fn rejected_payload_is_sanitized_and_retried() {
    let store = Arc::new(MemoryExecutionStore::new());
    seed_template(
        &store,
        "t1",
        "root",
        vec![
            StepSpec {
                id: "root",
                name: "Intake Form",
                kind: StepKind::Automated,
                tool: Some(form_tool("tool-root", "document")),
                prev: vec![],
                next: vec!["s"],
            },
            StepSpec {
                id: "s",
                name: "Extract",
                kind: StepKind::Automated,
                tool: Some(http_tool("tool-s")),
                prev: vec!["root"],
                next: vec![],
            },
        ],
    )
    .await;

    let service = WorkflowService::builder()
        .store(store.clone())
        .tool_registry(registry_with_override(
            ToolKind::HttpRequest,
            Arc::new(ScriptedExecutor {
                status: OutcomeStatus::Success,
                result: json!({ "content": "bad\u{0}text", "output": "clean" }),
            }),
        ))
        .build()
        .unwrap();

    let execution = service
        .create_execution("t1", ExecutionMetadata::manual())
        .await
        .unwrap();
    let handle = service
        .submit_root_input(&execution.id, json!({"document": "x"}), "alice")
        .await
        .unwrap();

    // The dirty payload was rejected once, sanitized, and persisted; the
    // step is not lost
    assert_eq!(handle.wait().await, RunStatus::Completed);
    let step = step_by_name(&store, &execution.id, "Extract").await;
    assert_eq!(step.status, RunStatus::Completed);
    let record = store
        .get_tool_execution(&step.tool_exec_ids[0])
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.result["content"], json!("badtext"));
}

#[tokio::test]
async fn dead_end_branches_do_not_block_completion() {
    let store = Arc::new(MemoryExecutionStore::new());
    // root fans out to an automated branch and a manual dead end
    seed_template(
        &store,
        "t1",
        "root",
        vec![
            StepSpec {
                id: "root",
                name: "Intake Form",
                kind: StepKind::Automated,
                tool: Some(form_tool("tool-root", "document")),
                prev: vec![],
                next: vec!["m", "a"],
            },
            StepSpec {
                id: "m",
                name: "Optional Review",
                kind: StepKind::Manual,
                tool: Some(form_tool("tool-m", "comment")),
                prev: vec!["root"],
                next: vec![],
            },
            StepSpec {
                id: "a",
                name: "Summarise",
                kind: StepKind::Automated,
                tool: Some(agent_tool("tool-a")),
                prev: vec!["root"],
                next: vec![],
            },
        ],
    )
    .await;

    let service = WorkflowService::builder()
        .store(store.clone())
        .build()
        .unwrap();

    let execution = service
        .create_execution("t1", ExecutionMetadata::manual())
        .await
        .unwrap();
    let handle = service
        .submit_root_input(&execution.id, json!({"document": "x"}), "alice")
        .await
        .unwrap();

    // The manual branch was never visited; the reached subset completes
    assert_eq!(handle.wait().await, RunStatus::Completed);
    assert_eq!(
        step_by_name(&store, &execution.id, "Optional Review")
            .await
            .status,
        RunStatus::Draft
    );
}
