use serde_json::{json, Map, Value};

use crate::internal::assistant::Assistant;
use crate::internal::exec::resolve::resolve;
use crate::internal::exec::sanitize::sanitize;
use crate::internal::plan::ir::Plan;

/// Reserved tool name the model emits when no registered tool fits the
/// request. Seeing it anywhere in a plan aborts execution before lookup.
pub const TOOL_NOT_AVAILABLE: &str = "TOOL_NOT_AVAILABLE";

/// Outcome of a completed plan: the result history (one entry per step, in
/// step order) and the names of the tools that produced each entry.
#[derive(Debug)]
pub struct PlanRun {
    pub history: Vec<Value>,
    pub executed: Vec<String>,
}

impl PlanRun {
    /// The last step's result together with its tool name, when any step ran.
    pub fn last(&self) -> Option<(&str, &Value)> {
        match (self.executed.last(), self.history.last()) {
            (Some(tool), Some(value)) => Some((tool.as_str(), value)),
            _ => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error("no suitable tool is available for this request")]
    NoToolAvailable,
    #[error("tool not found: {0}")]
    UnknownTool(String),
    #[error("missing required argument `{key}` for tool {tool}")]
    MissingArgument { tool: String, key: String },
}

/// Drive a plan step by step against the assistant's tool registry.
///
/// Steps run strictly in order and one at a time: a later step's arguments
/// may reference an earlier step's result, so ordering is a correctness
/// requirement. Handler failures are recorded as `{"error": ...}` entries
/// and do not abort the plan; the sentinel tool, an unregistered tool, or a
/// required argument resolving to nothing all abort it immediately. Nothing
/// recorded before an abort is rolled back, the whole request is discarded
/// together.
pub async fn execute_plan(assistant: &Assistant, plan: &Plan) -> Result<PlanRun, ExecutionError> {
    let mut history: Vec<Value> = Vec::with_capacity(plan.len());
    let mut executed: Vec<String> = Vec::with_capacity(plan.len());

    for (index, step) in plan.steps.iter().enumerate() {
        if step.tool.trim() == TOOL_NOT_AVAILABLE {
            return Err(ExecutionError::NoToolAvailable);
        }

        let name = step.tool_name();
        let entry = assistant
            .tools
            .get(name)
            .ok_or_else(|| ExecutionError::UnknownTool(name.to_string()))?;

        // Only strictly earlier steps are visible to references.
        let raw_args = Value::Object(step.args.clone().unwrap_or_default());
        let resolved = match resolve(&raw_args, &history) {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        let args = sanitize(&entry.definition, resolved);

        for key in entry.definition.required_keys() {
            let missing = !matches!(args.get(key), Some(value) if !value.is_null());
            if missing {
                return Err(ExecutionError::MissingArgument {
                    tool: name.to_string(),
                    key: key.to_string(),
                });
            }
        }

        tracing::debug!(step = index, tool = name, "invoking tool");
        let result = match entry.handler.call(args).await {
            Ok(value) => value,
            Err(error) => {
                // Error-as-data: the next step sees what happened, the
                // model decides what a tool failure means.
                tracing::warn!(step = index, tool = name, %error, "tool reported failure");
                json!({ "error": error.to_string() })
            }
        };

        let result = match &assistant.hook {
            Some(hook) => hook.after_step(name, result).await,
            None => result,
        };

        history.push(result);
        executed.push(name.to_string());
    }

    Ok(PlanRun { history, executed })
}
