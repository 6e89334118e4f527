use axum::{
    extract::{Json, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::internal::{
    assistant::AssistantRegistry,
    exec::executor::{execute_plan, ExecutionError},
    format::format_result,
    model::client::{ChatMessage, ModelClient},
    plan::normalize::normalize,
    tools::spec::ToolDefinition,
};

const PARSE_APOLOGY: &str =
    "Sorry, I couldn't put together a plan for that request. Could you rephrase it?";
const MODEL_APOLOGY: &str =
    "Sorry, something went wrong while talking to the language model. Please try again.";
const NO_TOOL_REFUSAL: &str = "I don't have a tool that can help with that request.";

#[derive(Clone)]
pub struct AppState {
    pub assistants: Arc<AssistantRegistry>,
    pub model: Arc<ModelClient>,
}

impl AppState {
    pub fn new(assistants: Arc<AssistantRegistry>, model: Arc<ModelClient>) -> Self {
        Self { assistants, model }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/chat", post(chat))
        .route("/v1/tools", get(list_tools))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub choices: Vec<Choice>,
}

#[derive(Debug, Serialize)]
pub struct Choice {
    pub message: ChatMessage,
}

fn reply(content: String) -> Json<ChatResponse> {
    Json(ChatResponse {
        choices: vec![Choice {
            message: ChatMessage::assistant(content),
        }],
    })
}

// Graceful failures stay HTTP 200 with an explanatory assistant message so
// the chat client renders every outcome through the same path.
async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, (StatusCode, Json<serde_json::Value>)> {
    let request_id = Uuid::new_v4();
    let assistant = state.assistants.route(&request.messages);
    tracing::info!(%request_id, assistant = %assistant.name, "handling chat request");

    let mut messages = vec![ChatMessage::system(assistant.planning_prompt())];
    messages.extend(request.messages.iter().cloned());

    let raw_plan = match state.model.complete(&messages).await {
        Ok(text) => text,
        Err(error) => {
            tracing::error!(%request_id, %error, "plan generation failed");
            return Ok(reply(MODEL_APOLOGY.to_string()));
        }
    };

    let plan = match normalize(&raw_plan) {
        Ok(plan) => plan,
        Err(error) => {
            tracing::warn!(%request_id, %error, "model output was not a plan");
            return Ok(reply(PARSE_APOLOGY.to_string()));
        }
    };

    tracing::debug!(%request_id, steps = plan.len(), "executing plan");
    match execute_plan(&assistant, &plan).await {
        Ok(run) => {
            let content = match run.last() {
                Some((tool, value)) => {
                    let raw = assistant
                        .tools
                        .get(tool)
                        .map(|entry| entry.return_raw)
                        .unwrap_or(false);
                    if raw {
                        match value.as_str() {
                            Some(text) => text.to_string(),
                            None => value.to_string(),
                        }
                    } else {
                        format_result(value)
                    }
                }
                None => String::new(),
            };
            Ok(reply(content))
        }
        Err(error) => {
            tracing::warn!(%request_id, %error, "plan aborted");
            Ok(reply(abort_message(&error)))
        }
    }
}

fn abort_message(error: &ExecutionError) -> String {
    match error {
        ExecutionError::NoToolAvailable => NO_TOOL_REFUSAL.to_string(),
        ExecutionError::UnknownTool(name) => {
            format!("The plan referenced a tool I don't recognize: {}.", name)
        }
        ExecutionError::MissingArgument { tool, key } => {
            format!("I couldn't work out the `{}` value needed by {}.", key, tool)
        }
    }
}

async fn list_tools(State(state): State<AppState>) -> Json<Vec<ToolDefinition>> {
    let assistant = state.assistants.route(&[]);
    let definitions = assistant
        .tools
        .definitions()
        .into_iter()
        .cloned()
        .collect();
    Json(definitions)
}
