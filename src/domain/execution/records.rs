use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::status::{RunStatus, ToolRunStatus, TriggerType};
use crate::domain::model::{StepKind, StepTemplate};

/// The inbound HTTP request captured when a webhook starts an execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapturedRequest {
    pub method: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub body: Value,
}

/// Trigger provenance attached to a workflow execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionMetadata {
    pub trigger_type: TriggerType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_request: Option<CapturedRequest>,
}

impl ExecutionMetadata {
    pub fn manual() -> Self {
        Self {
            trigger_type: TriggerType::Manual,
            webhook_request: None,
        }
    }

    pub fn webhook(request: CapturedRequest) -> Self {
        Self {
            trigger_type: TriggerType::Webhook,
            webhook_request: Some(request),
        }
    }
}

/// One run of a workflow template.
///
/// Status is monotonic; the completion scan may run many times but only ever
/// transitions forward.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowExecution {
    pub id: String,
    pub template_id: String,
    pub status: RunStatus,
    pub root_step_execution_id: String,
    pub metadata: ExecutionMetadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One step of one run, materialized for every template step at
/// execution-creation time. Edges are duplicated from the template so the
/// walker never needs the template again once a run is underway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepExecution {
    pub id: String,
    pub workflow_execution_id: String,
    pub step_template_id: String,
    pub name: String,
    pub kind: StepKind,
    pub status: RunStatus,
    #[serde(default)]
    pub tool_exec_ids: Vec<String>,
    #[serde(default)]
    pub prev_step_ids: Vec<String>,
    #[serde(default)]
    pub next_step_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl StepExecution {
    /// Materialize a draft step execution from its template.
    ///
    /// `sibling_ids` maps step template ids to the step execution ids minted
    /// for this run, so the duplicated edges point at executions, not
    /// templates.
    pub fn materialize(
        template: &StepTemplate,
        workflow_execution_id: &str,
        sibling_ids: &HashMap<String, String>,
    ) -> Self {
        let map_edge = |ids: &[String]| {
            ids.iter()
                .filter_map(|id| sibling_ids.get(id).cloned())
                .collect()
        };
        StepExecution {
            id: sibling_ids
                .get(&template.id)
                .cloned()
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            workflow_execution_id: workflow_execution_id.to_string(),
            step_template_id: template.id.clone(),
            name: template.name.clone(),
            kind: template.kind,
            status: RunStatus::Draft,
            tool_exec_ids: Vec::new(),
            prev_step_ids: map_edge(&template.prev_step_ids),
            next_step_ids: map_edge(&template.next_step_ids),
            completed_by: None,
            completed_at: None,
        }
    }
}

/// Record of one tool invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolExecution {
    pub id: String,
    pub tool_id: String,
    pub step_execution_id: String,
    pub workflow_execution_id: String,
    pub status: ToolRunStatus,
    pub result: Value,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}
