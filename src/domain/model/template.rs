use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How a step is driven: by a human submitting input, or by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepKind {
    Manual,
    Automated,
}

/// Static node in a workflow's DAG.
///
/// Immutable once an execution references it — template edits affect future
/// executions only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepTemplate {
    pub id: String,
    pub template_id: String,
    /// Human label. Assumed unique within a template; the engine keys its
    /// name-based result view on this and warns on collision.
    pub name: String,
    pub kind: StepKind,
    /// Ordered list of attached tool ids. Current workflows attach exactly
    /// one; only the first is executed.
    #[serde(default)]
    pub tool_ids: Vec<String>,
    #[serde(default)]
    pub prev_step_ids: Vec<String>,
    #[serde(default)]
    pub next_step_ids: Vec<String>,
    #[serde(default)]
    pub metadata: Value,
}

/// A workflow definition: a set of step templates and a designated root.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowTemplate {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub root_step_template_id: String,
    #[serde(default)]
    pub config: Value,
}
