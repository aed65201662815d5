use std::collections::HashMap;

use petgraph::algo::is_cyclic_directed;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::domain::model::{StepTemplate, WorkflowTemplate};
use crate::error::ChainError;

/// Build a directed graph over step template ids from `next_step_ids` edges.
pub fn build_step_graph(
    steps: &[StepTemplate],
) -> Result<(DiGraph<String, ()>, HashMap<String, NodeIndex>), ChainError> {
    let mut graph = DiGraph::new();
    let mut index_map = HashMap::new();

    for step in steps {
        let idx = graph.add_node(step.id.clone());
        if index_map.insert(step.id.clone(), idx).is_some() {
            return Err(ChainError::GraphBuildError(format!(
                "duplicate step template id: {}",
                step.id
            )));
        }
    }

    for step in steps {
        let from = index_map[&step.id];
        for next_id in &step.next_step_ids {
            let to = *index_map.get(next_id).ok_or_else(|| {
                ChainError::GraphBuildError(format!(
                    "step {} points at unknown step {}",
                    step.id, next_id
                ))
            })?;
            graph.add_edge(from, to, ());
        }
    }

    Ok((graph, index_map))
}

/// Validate a template's step graph before materializing an execution.
///
/// Checks: the designated root exists, every edge resolves, `prev`/`next`
/// sides agree, and the graph is acyclic. Unreachable steps are legal (dead
/// branches stay Draft forever by design) and are not rejected here.
pub fn validate_template(
    template: &WorkflowTemplate,
    steps: &[StepTemplate],
) -> Result<(), ChainError> {
    if steps.is_empty() {
        return Err(ChainError::GraphValidationError(format!(
            "template {} has no steps",
            template.id
        )));
    }

    if !steps.iter().any(|s| s.id == template.root_step_template_id) {
        return Err(ChainError::GraphValidationError(format!(
            "root step {} is not among the template's steps",
            template.root_step_template_id
        )));
    }

    let by_id: HashMap<&str, &StepTemplate> =
        steps.iter().map(|s| (s.id.as_str(), s)).collect();
    for step in steps {
        for next_id in &step.next_step_ids {
            let next = by_id.get(next_id.as_str()).ok_or_else(|| {
                ChainError::GraphValidationError(format!(
                    "step {} points at unknown step {}",
                    step.id, next_id
                ))
            })?;
            if !next.prev_step_ids.contains(&step.id) {
                return Err(ChainError::GraphValidationError(format!(
                    "edge {} -> {} is not mirrored in prevStepIds",
                    step.id, next_id
                )));
            }
        }
        for prev_id in &step.prev_step_ids {
            if !by_id.contains_key(prev_id.as_str()) {
                return Err(ChainError::GraphValidationError(format!(
                    "step {} lists unknown predecessor {}",
                    step.id, prev_id
                )));
            }
        }
    }

    let (graph, _) = build_step_graph(steps)?;
    if is_cyclic_directed(&graph) {
        return Err(ChainError::GraphValidationError(
            "cycle detected in step graph".to_string(),
        ));
    }

    Ok(())
}
