//! The accumulator threaded through a traversal.
//!
//! Entries are keyed internally by step execution id — names are a
//! convenience view for tool bodies, since nothing stops a template from
//! reusing a label. Insertion order is preserved; the dotted-path resolver
//! only ever looks at the most recently produced entry.

use std::collections::HashMap;

use serde_json::Value;

use crate::domain::model::ToolKind;
use crate::tools::OutcomeStatus;

/// One step's contribution to the accumulator.
#[derive(Debug, Clone)]
pub struct StepResult {
    pub step_execution_id: String,
    pub step_name: String,
    pub tool_kind: Option<ToolKind>,
    pub status: OutcomeStatus,
    pub result: Value,
}

impl StepResult {
    /// Placeholder for a completed step whose tool execution record was lost
    /// (or never written, as with some webhook-origin steps). Downstream
    /// lookups resolve to null instead of erroring.
    pub fn synthesized(step_execution_id: &str, step_name: &str) -> Self {
        StepResult {
            step_execution_id: step_execution_id.to_string(),
            step_name: step_name.to_string(),
            tool_kind: None,
            status: OutcomeStatus::Success,
            result: serde_json::json!({
                "content": null,
                "output": null,
                "synthesized": true,
            }),
        }
    }
}

/// Ordered, doubly-indexed collection of [`StepResult`]s.
#[derive(Debug, Clone, Default)]
pub struct StepResults {
    entries: Vec<StepResult>,
    by_id: HashMap<String, usize>,
    by_name: HashMap<String, usize>,
}

impl StepResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry. A re-pushed step execution id replaces the previous
    /// entry in place; a colliding step name is logged and the name view
    /// keeps the latest entry.
    pub fn push(&mut self, entry: StepResult) {
        if let Some(&idx) = self.by_id.get(&entry.step_execution_id) {
            self.by_name.insert(entry.step_name.clone(), idx);
            self.entries[idx] = entry;
            return;
        }
        let idx = self.entries.len();
        if self.by_name.contains_key(&entry.step_name) {
            tracing::warn!(
                step_name = %entry.step_name,
                "duplicate step name in results; name lookup now resolves to the newer step"
            );
        }
        self.by_id.insert(entry.step_execution_id.clone(), idx);
        self.by_name.insert(entry.step_name.clone(), idx);
        self.entries.push(entry);
    }

    /// The most recently produced entry.
    pub fn latest(&self) -> Option<&StepResult> {
        self.entries.last()
    }

    pub fn get(&self, step_execution_id: &str) -> Option<&StepResult> {
        self.by_id.get(step_execution_id).map(|&i| &self.entries[i])
    }

    /// Name-based lookup, best effort (see the collision caveat on `push`).
    pub fn get_by_name(&self, step_name: &str) -> Option<&StepResult> {
        self.by_name.get(step_name).map(|&i| &self.entries[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &StepResult> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
