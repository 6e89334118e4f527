use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A tool's declared interface, mirroring the function-calling schema
/// convention: `parameters` is a JSON schema object whose `properties` keys
/// are the only argument names the tool accepts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl ToolDefinition {
    pub fn new(name: &str, description: &str, parameters: Value) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            parameters,
        }
    }

    /// Keys the schema marks as required, empty when the schema declares
    /// none or cannot be introspected.
    pub fn required_keys(&self) -> Vec<&str> {
        self.parameters
            .get("required")
            .and_then(Value::as_array)
            .map(|keys| keys.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("communication error: {0}")]
    Communication(String),
    #[error("invocation error: {0}")]
    Invocation(String),
}

/// The invocation contract every tool implements. Handlers receive already
/// sanitized arguments and report failure through the error channel; the
/// executor records failures as data rather than aborting the plan.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, args: Map<String, Value>) -> Result<Value, ToolError>;
}

/// A registered capability: the schema plus the handler that honors it.
#[derive(Clone)]
pub struct ToolEntry {
    pub definition: ToolDefinition,
    pub handler: Arc<dyn ToolHandler>,
    /// When set, the response shaping layer passes this tool's output
    /// through verbatim instead of running it through the formatter.
    pub return_raw: bool,
}

impl ToolEntry {
    pub fn new(definition: ToolDefinition, handler: Arc<dyn ToolHandler>) -> Self {
        Self {
            definition,
            handler,
            return_raw: false,
        }
    }

    pub fn with_raw_output(mut self) -> Self {
        self.return_raw = true;
        self
    }
}

/// Capability registry mapping tool names to entries. Read-only during plan
/// execution; unknown names are rejected explicitly, never defaulted.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, ToolEntry>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, entry: ToolEntry) {
        self.tools.insert(entry.definition.name.clone(), entry);
    }

    pub fn get(&self, name: &str) -> Option<&ToolEntry> {
        self.tools.get(name)
    }

    pub fn definitions(&self) -> Vec<&ToolDefinition> {
        let mut definitions: Vec<&ToolDefinition> =
            self.tools.values().map(|entry| &entry.definition).collect();
        definitions.sort_by_key(|definition| definition.name.as_str());
        definitions
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
