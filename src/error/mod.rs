//! Error types for the execution engine.
//!
//! Errors are layered: [`ToolError`] for capability-level failures,
//! [`ChainError`] for orchestration-level failures. Store errors live in
//! [`crate::store`] next to the trait they belong to.

mod chain_error;
mod tool_error;

pub use chain_error::ChainError;
pub use tool_error::ToolError;
