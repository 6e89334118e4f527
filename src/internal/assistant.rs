use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::internal::model::client::ChatMessage;
use crate::internal::tools::spec::ToolRegistry;

/// Extra behavior an assistant can attach after each recorded step.
///
/// The executor calls the hook only when one is present; an assistant
/// without a hook gets plain recording. The hook may return a replacement
/// value, which is what lands in the result history.
#[async_trait]
pub trait StepHook: Send + Sync {
    async fn after_step(&self, tool: &str, result: Value) -> Value;
}

/// A named bundle of system prompt and tool registry. The engine only ever
/// sees the assistant that was routed for the current request.
pub struct Assistant {
    pub name: String,
    pub system_prompt: String,
    pub tools: ToolRegistry,
    pub hook: Option<Arc<dyn StepHook>>,
}

impl Assistant {
    pub fn new(name: &str, system_prompt: &str, tools: ToolRegistry) -> Self {
        Self {
            name: name.to_string(),
            system_prompt: system_prompt.to_string(),
            tools,
            hook: None,
        }
    }

    pub fn with_hook(mut self, hook: Arc<dyn StepHook>) -> Self {
        self.hook = Some(hook);
        self
    }

    /// Compose the planning prompt: the assistant's own instructions, the
    /// serialized tool schemas, and the plan wire format contract.
    pub fn planning_prompt(&self) -> String {
        let definitions: Vec<Value> = self
            .tools
            .definitions()
            .into_iter()
            .map(|definition| serde_json::to_value(definition).unwrap_or(Value::Null))
            .collect();
        let tools_json = serde_json::to_string_pretty(&Value::Array(definitions))
            .unwrap_or_else(|_| "[]".to_string());

        format!(
            "{system_prompt}\n\n\
             Respond with a JSON array of steps and nothing else. Each step is\n\
             {{\"tool\": \"<name>\", \"args\": {{...}}}}. Steps run in order. To use an\n\
             earlier step's output in an argument, write the whole value as\n\
             \"{{{{prev:<N>.<path>}}}}\" where N is the zero-based step index and path\n\
             selects a field, e.g. \"{{{{prev:0.meetings[0].meetingId}}}}\". If none of\n\
             the tools fit the request, respond with\n\
             [{{\"tool\": \"TOOL_NOT_AVAILABLE\"}}].\n\n\
             Available tools:\n{tools_json}",
            system_prompt = self.system_prompt,
            tools_json = tools_json,
        )
    }
}

/// Name to assistant mapping with a designated default. Routing picks the
/// handling assistant for a conversation; with a single registered
/// assistant it degenerates to the default.
pub struct AssistantRegistry {
    assistants: HashMap<String, Arc<Assistant>>,
    default: Arc<Assistant>,
}

impl AssistantRegistry {
    pub fn new(default_assistant: Assistant) -> Self {
        let default = Arc::new(default_assistant);
        let mut assistants = HashMap::new();
        assistants.insert(default.name.clone(), default.clone());
        Self {
            assistants,
            default,
        }
    }

    pub fn register(&mut self, assistant: Assistant) {
        self.assistants
            .insert(assistant.name.clone(), Arc::new(assistant));
    }

    pub fn get(&self, name: &str) -> Option<Arc<Assistant>> {
        self.assistants.get(name).cloned()
    }

    /// Pick the assistant for a conversation. Explicit mentions of a
    /// registered assistant name win; everything else goes to the default.
    pub fn route(&self, messages: &[ChatMessage]) -> Arc<Assistant> {
        if let Some(last) = messages.iter().rev().find(|message| message.role == "user") {
            let content = last.content.to_lowercase();
            for (name, assistant) in &self.assistants {
                if *name != self.default.name && content.contains(&name.to_lowercase()) {
                    return assistant.clone();
                }
            }
        }

        self.default.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assistant(name: &str) -> Assistant {
        Assistant::new(name, "You schedule meetings.", ToolRegistry::new())
    }

    #[test]
    fn routes_to_default_when_nothing_matches() {
        let registry = AssistantRegistry::new(assistant("scheduler"));
        let routed = registry.route(&[ChatMessage::user("what's on my calendar?")]);
        assert_eq!(routed.name, "scheduler");
    }

    #[test]
    fn routes_to_named_assistant_on_mention() {
        let mut registry = AssistantRegistry::new(assistant("scheduler"));
        registry.register(assistant("notetaker"));
        let routed = registry.route(&[ChatMessage::user("ask the notetaker to summarize")]);
        assert_eq!(routed.name, "notetaker");
    }

    #[test]
    fn planning_prompt_includes_tool_schemas_and_sentinel() {
        let prompt = assistant("scheduler").planning_prompt();
        assert!(prompt.contains("TOOL_NOT_AVAILABLE"));
        assert!(prompt.contains("{{prev:<N>.<path>}}"));
        assert!(prompt.contains("You schedule meetings."));
    }
}
