use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::env;

const DEFAULT_DEPLOYMENT: &str = "gpt-4o";
const DEFAULT_API_VERSION: &str = "2024-06-01";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub base_url: String,
    pub api_key: String,
    pub deployment: String,
    pub api_version: String,
}

impl ModelConfig {
    pub fn from_env() -> Result<Self, ModelError> {
        Ok(Self {
            base_url: require_env("MODEL_BASE_URL")?,
            api_key: require_env("MODEL_API_KEY")?,
            deployment: env::var("MODEL_DEPLOYMENT")
                .unwrap_or_else(|_| DEFAULT_DEPLOYMENT.to_string()),
            api_version: env::var("MODEL_API_VERSION")
                .unwrap_or_else(|_| DEFAULT_API_VERSION.to_string()),
        })
    }
}

fn require_env(name: &str) -> Result<String, ModelError> {
    env::var(name).map_err(|_| ModelError::Config(name.to_string()))
}

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("missing environment variable: {0}")]
    Config(String),
    #[error("model request failed: {0}")]
    Transport(String),
    #[error("model responded with status {0}")]
    Status(u16),
    #[error("model response had no message content")]
    MalformedResponse,
}

/// Chat-completions client for the deployment-addressed model endpoint.
/// One call per request, awaited to completion, never retried.
#[derive(Debug, Clone)]
pub struct ModelClient {
    client: reqwest::Client,
    config: ModelConfig,
}

impl ModelClient {
    pub fn new(config: ModelConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub fn from_env() -> Result<Self, ModelError> {
        Ok(Self::new(ModelConfig::from_env()?))
    }

    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<String, ModelError> {
        let url = format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.config.base_url.trim_end_matches('/'),
            self.config.deployment,
            self.config.api_version,
        );

        let response = self
            .client
            .post(url)
            .header("api-key", &self.config.api_key)
            .json(&json!({
                "messages": messages,
                "temperature": 0.0,
            }))
            .send()
            .await
            .map_err(|e| ModelError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ModelError::Status(response.status().as_u16()));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ModelError::Transport(e.to_string()))?;

        body.get("choices")
            .and_then(|choices| choices.get(0))
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or(ModelError::MalformedResponse)
    }
}
