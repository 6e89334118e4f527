// Planwise library entry point

pub mod internal {
    pub mod plan {
        pub mod ir;
        pub mod normalize;
    }
    pub mod tools {
        pub mod builtin;
        pub mod spec;
    }
    pub mod exec {
        pub mod executor;
        pub mod resolve;
        pub mod sanitize;
    }
    pub mod model {
        pub mod client;
    }
    pub mod api;
    pub mod assistant;
    pub mod format;
}

// Re-export key types for external use
pub use internal::assistant::{Assistant, AssistantRegistry, StepHook};
pub use internal::exec::executor::{execute_plan, ExecutionError, PlanRun, TOOL_NOT_AVAILABLE};
pub use internal::exec::resolve::resolve;
pub use internal::exec::sanitize::sanitize;
pub use internal::format::format_result;
pub use internal::model::client::{ChatMessage, ModelClient, ModelConfig, ModelError};
pub use internal::plan::ir::{Plan, Step};
pub use internal::plan::normalize::{normalize, PlanParseError};
pub use internal::tools::spec::{ToolDefinition, ToolEntry, ToolError, ToolHandler, ToolRegistry};
