//! Template DAG construction and validation.
//!
//! Runs once per execution creation: a template whose steps do not form a
//! rooted DAG never gets an execution materialized for it.

mod validator;

pub use validator::{build_step_graph, validate_template};
