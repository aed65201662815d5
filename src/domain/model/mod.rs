//! Static workflow definitions: templates, steps, and configured tools.

mod template;
mod tool;

pub use template::{StepKind, StepTemplate, WorkflowTemplate};
pub use tool::{
    AiAgentConfig, EmailConfig, FormConfig, FormField, HttpMethod, HttpRequestConfig, Tool,
    ToolKind,
};
