//! End-to-end tests for the chat endpoint: stub model and calendar servers
//! on ephemeral ports, the real router in front of them.

use std::collections::VecDeque;
use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use planwise::internal::{
    api::{create_router, AppState},
    assistant::{Assistant, AssistantRegistry},
    model::client::{ModelClient, ModelConfig},
    tools::builtin::{
        CurrentDateTool, FetchMeetingsTool, GenerateActionsTool,
    },
    tools::spec::{ToolEntry, ToolRegistry},
};

type ModelReplies = Arc<Mutex<VecDeque<String>>>;

async fn spawn_model_server(replies: Vec<&str>) -> (String, JoinHandle<()>) {
    async fn handler(State(replies): State<ModelReplies>, Json(_body): Json<Value>) -> Json<Value> {
        let content = replies
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| "[]".to_string());
        Json(json!({
            "choices": [{ "message": { "role": "assistant", "content": content } }]
        }))
    }

    let replies: ModelReplies = Arc::new(Mutex::new(
        replies.into_iter().map(str::to_string).collect(),
    ));
    let app = Router::new()
        .route(
            "/openai/deployments/:deployment/chat/completions",
            post(handler),
        )
        .with_state(replies);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, app.into_make_service())
            .await
            .expect("model stub server error");
    });
    (format!("http://{}", addr), handle)
}

async fn spawn_meetings_server() -> (String, JoinHandle<()>) {
    async fn handler() -> Json<Value> {
        Json(json!({
            "meetings": [
                { "meetingId": "m1", "subject": "Standup", "startTime": "09:00", "endTime": "09:15" },
                { "meetingId": "m2", "subject": "Retro", "startTime": "15:00", "endTime": "16:00" }
            ]
        }))
    }

    let app = Router::new().route("/meetings", get(handler));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, app.into_make_service())
            .await
            .expect("meetings stub server error");
    });
    (format!("http://{}", addr), handle)
}

fn test_model(base_url: &str) -> Arc<ModelClient> {
    Arc::new(ModelClient::new(ModelConfig {
        base_url: base_url.to_string(),
        api_key: "test-key".to_string(),
        deployment: "gpt-test".to_string(),
        api_version: "2024-06-01".to_string(),
    }))
}

fn test_assistant(model: Arc<ModelClient>, meetings_url: &str) -> Assistant {
    let mut registry = ToolRegistry::new();
    registry.register(ToolEntry::new(
        CurrentDateTool::definition(),
        Arc::new(CurrentDateTool),
    ));
    registry.register(ToolEntry::new(
        FetchMeetingsTool::definition(),
        Arc::new(FetchMeetingsTool::with_base_url(meetings_url)),
    ));
    registry.register(
        ToolEntry::new(
            GenerateActionsTool::definition(),
            Arc::new(GenerateActionsTool::new(model)),
        )
        .with_raw_output(),
    );
    Assistant::new("scheduler", "You are a scheduling assistant.", registry)
}

async fn spawn_app(model_replies: Vec<&str>) -> (String, Vec<JoinHandle<()>>) {
    let (model_url, model_handle) = spawn_model_server(model_replies).await;
    let (meetings_url, meetings_handle) = spawn_meetings_server().await;

    let model = test_model(&model_url);
    let assistants = Arc::new(AssistantRegistry::new(test_assistant(
        model.clone(),
        &meetings_url,
    )));

    let app = create_router(AppState::new(assistants, model));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app_handle = tokio::spawn(async move {
        axum::serve(listener, app.into_make_service())
            .await
            .expect("api server error");
    });

    (
        format!("http://{}", addr),
        vec![model_handle, meetings_handle, app_handle],
    )
}

async fn post_chat(base_url: &str, message: &str) -> (u16, String) {
    let client = reqwest::Client::new();
    let response = client
        .post(format!("{}/v1/chat", base_url))
        .json(&json!({ "messages": [{ "role": "user", "content": message }] }))
        .send()
        .await
        .expect("chat request failed");

    let status = response.status().as_u16();
    let body: Value = response.json().await.expect("invalid response body");
    let content = body["choices"][0]["message"]["content"]
        .as_str()
        .expect("missing assistant content")
        .to_string();
    (status, content)
}

#[tokio::test]
async fn chat_executes_a_two_step_plan_and_formats_meetings() {
    let plan_text = concat!(
        "Here is the plan:\n```json\n",
        r#"[{"tool":"getCurrentDate","args":{}},"#,
        r#"{"tool":"fetchMeetings","args":{"date":"{{prev:0.date}}"}}]"#,
        "\n```",
    );
    let (base_url, handles) = spawn_app(vec![plan_text]).await;

    let (status, content) = post_chat(&base_url, "what's on my calendar today?").await;

    assert_eq!(status, 200);
    assert_eq!(content, "1. Standup, 09:00, 09:15\n2. Retro, 15:00, 16:00");

    for handle in handles {
        handle.abort();
    }
}

#[tokio::test]
async fn unstructured_model_output_returns_the_apology() {
    let (base_url, handles) = spawn_app(vec!["I'd love to help but I am just prose."]).await;

    let (status, content) = post_chat(&base_url, "hello").await;

    assert_eq!(status, 200);
    assert!(content.contains("couldn't put together a plan"));

    for handle in handles {
        handle.abort();
    }
}

#[tokio::test]
async fn sentinel_plan_returns_the_refusal() {
    let (base_url, handles) = spawn_app(vec![r#"[{"tool":"TOOL_NOT_AVAILABLE"}]"#]).await;

    let (status, content) = post_chat(&base_url, "paint my house").await;

    assert_eq!(status, 200);
    assert!(content.contains("don't have a tool"));

    for handle in handles {
        handle.abort();
    }
}

#[tokio::test]
async fn unknown_tool_is_named_in_the_reply() {
    let (base_url, handles) = spawn_app(vec![r#"[{"tool":"sendEmail","args":{}}]"#]).await;

    let (status, content) = post_chat(&base_url, "email the team").await;

    assert_eq!(status, 200);
    assert!(content.contains("sendEmail"));

    for handle in handles {
        handle.abort();
    }
}

#[tokio::test]
async fn raw_tool_output_passes_through_unformatted() {
    // First model call returns the plan, second one the drafted actions.
    let actions = "1. Send the minutes\n2. Book the follow-up";
    let (base_url, handles) = spawn_app(vec![
        r#"[{"tool":"generateActions","args":{"summary":"sprint review"}}]"#,
        actions,
    ])
    .await;

    let (status, content) = post_chat(&base_url, "draft follow-ups for the sprint review").await;

    assert_eq!(status, 200);
    assert_eq!(content, actions);

    for handle in handles {
        handle.abort();
    }
}

#[tokio::test]
async fn tools_listing_exposes_the_registered_definitions() {
    let (base_url, handles) = spawn_app(vec![]).await;

    let client = reqwest::Client::new();
    let response = client
        .get(format!("{}/v1/tools", base_url))
        .send()
        .await
        .expect("tools request failed");
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("invalid response body");
    let names: Vec<&str> = body
        .as_array()
        .expect("tools response is an array")
        .iter()
        .filter_map(|definition| definition["name"].as_str())
        .collect();
    assert!(names.contains(&"getCurrentDate"));
    assert!(names.contains(&"fetchMeetings"));

    for handle in handles {
        handle.abort();
    }
}
