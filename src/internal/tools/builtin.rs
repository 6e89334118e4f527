use std::env;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use serde_json::{json, Map, Value};

use crate::internal::assistant::Assistant;
use crate::internal::model::client::{ChatMessage, ModelClient};
use crate::internal::tools::spec::{ToolDefinition, ToolEntry, ToolError, ToolHandler, ToolRegistry};

const MEETINGS_URL_VAR: &str = "MEETINGS_API_URL";
const DEFAULT_MEETINGS_URL: &str = "http://localhost:7410";

fn date_payload(date: NaiveDate) -> Value {
    json!({
        "date": date.format("%Y-%m-%d").to_string(),
        "day": date.format("%A").to_string(),
    })
}

/// Today's date in UTC. Takes no arguments.
pub struct CurrentDateTool;

#[async_trait]
impl ToolHandler for CurrentDateTool {
    async fn call(&self, _args: Map<String, Value>) -> Result<Value, ToolError> {
        Ok(date_payload(Utc::now().date_naive()))
    }
}

impl CurrentDateTool {
    pub fn definition() -> ToolDefinition {
        ToolDefinition::new(
            "getCurrentDate",
            "Get the current date and day of the week.",
            json!({ "type": "object", "properties": {} }),
        )
    }
}

/// Date arithmetic: a base date shifted by a signed number of days.
pub struct DateOffsetTool;

#[async_trait]
impl ToolHandler for DateOffsetTool {
    async fn call(&self, args: Map<String, Value>) -> Result<Value, ToolError> {
        let base = args
            .get("baseDate")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::Invocation("baseDate must be a string".to_string()))?;
        let days = args
            .get("days")
            .and_then(Value::as_i64)
            .ok_or_else(|| ToolError::Invocation("days must be an integer".to_string()))?;

        let base = NaiveDate::parse_from_str(base, "%Y-%m-%d")
            .map_err(|e| ToolError::Invocation(format!("invalid baseDate: {}", e)))?;
        let shifted = base
            .checked_add_signed(Duration::days(days))
            .ok_or_else(|| ToolError::Invocation("date offset out of range".to_string()))?;

        Ok(date_payload(shifted))
    }
}

impl DateOffsetTool {
    pub fn definition() -> ToolDefinition {
        ToolDefinition::new(
            "dateOffset",
            "Shift a date by a number of days; negative values go backwards.",
            json!({
                "type": "object",
                "properties": {
                    "baseDate": { "type": "string", "description": "Start date, YYYY-MM-DD" },
                    "days": { "type": "integer", "description": "Days to add, may be negative" }
                },
                "required": ["baseDate", "days"]
            }),
        )
    }
}

/// Fetch meetings from the remote calendar service.
pub struct FetchMeetingsTool {
    client: reqwest::Client,
    base_url: String,
}

impl FetchMeetingsTool {
    pub fn new() -> Self {
        let base_url =
            env::var(MEETINGS_URL_VAR).unwrap_or_else(|_| DEFAULT_MEETINGS_URL.to_string());
        Self::with_base_url(&base_url)
    }

    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn definition() -> ToolDefinition {
        ToolDefinition::new(
            "fetchMeetings",
            "Fetch the meetings scheduled for a date, optionally one meeting by id.",
            json!({
                "type": "object",
                "properties": {
                    "date": { "type": "string", "description": "Date to query, YYYY-MM-DD" },
                    "meetingId": { "type": "string", "description": "Restrict to one meeting" }
                },
                "required": ["date"]
            }),
        )
    }
}

impl Default for FetchMeetingsTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ToolHandler for FetchMeetingsTool {
    async fn call(&self, args: Map<String, Value>) -> Result<Value, ToolError> {
        let date = args.get("date").and_then(Value::as_str).unwrap_or_default();
        let mut query: Vec<(&str, &str)> = vec![("date", date)];
        if let Some(meeting_id) = args.get("meetingId").and_then(Value::as_str) {
            query.push(("meetingId", meeting_id));
        }

        let response = self
            .client
            .get(format!("{}/meetings", self.base_url))
            .query(&query)
            .send()
            .await
            .map_err(|e| ToolError::Communication(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ToolError::Communication(format!(
                "meetings service responded with status {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| ToolError::Communication(e.to_string()))
    }
}

/// Draft follow-up actions for a meeting with the model. Output is already
/// user-facing prose, so the entry is registered with raw output.
pub struct GenerateActionsTool {
    model: Arc<ModelClient>,
}

impl GenerateActionsTool {
    pub fn new(model: Arc<ModelClient>) -> Self {
        Self { model }
    }

    pub fn definition() -> ToolDefinition {
        ToolDefinition::new(
            "generateActions",
            "Draft follow-up action items from a meeting summary.",
            json!({
                "type": "object",
                "properties": {
                    "summary": { "type": "string", "description": "What the meeting covered" }
                },
                "required": ["summary"]
            }),
        )
    }
}

#[async_trait]
impl ToolHandler for GenerateActionsTool {
    async fn call(&self, args: Map<String, Value>) -> Result<Value, ToolError> {
        let summary = args
            .get("summary")
            .and_then(Value::as_str)
            .unwrap_or_default();

        let messages = [
            ChatMessage::system(
                "You turn meeting summaries into a short numbered list of \
                 concrete follow-up actions. Respond with the list only.",
            ),
            ChatMessage::user(summary),
        ];

        let text = self
            .model
            .complete(&messages)
            .await
            .map_err(|e| ToolError::Invocation(e.to_string()))?;

        Ok(Value::String(text))
    }
}

/// The tool set of the scheduling assistant.
pub fn scheduling_registry(model: Arc<ModelClient>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(ToolEntry::new(
        CurrentDateTool::definition(),
        Arc::new(CurrentDateTool),
    ));
    registry.register(ToolEntry::new(
        DateOffsetTool::definition(),
        Arc::new(DateOffsetTool),
    ));
    registry.register(ToolEntry::new(
        FetchMeetingsTool::definition(),
        Arc::new(FetchMeetingsTool::new()),
    ));
    registry.register(
        ToolEntry::new(
            GenerateActionsTool::definition(),
            Arc::new(GenerateActionsTool::new(model)),
        )
        .with_raw_output(),
    );
    registry
}

/// The default assistant shipped with the server.
pub fn scheduling_assistant(model: Arc<ModelClient>) -> Assistant {
    Assistant::new(
        "scheduler",
        "You are a scheduling assistant. You answer questions about dates \
         and the user's meetings, and you draft follow-up actions for them.",
        scheduling_registry(model),
    )
}
