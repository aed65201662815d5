//! Service façade: trigger entry points and the status query.

mod service;

pub use service::{WorkflowService, WorkflowServiceBuilder};
