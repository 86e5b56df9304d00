//! OpenAI-compatible endpoint implementation.
//!
//! Works with: OpenAI, OpenRouter, Ollama, vLLM, Together AI, and any
//! other server exposing the `/v1/chat/completions` shape.
//!
//! Tool invocation in Ironquill is textual — the catalogue travels in the
//! system prompt and requests come back as plain content — so the wire
//! body carries no function-calling fields.

use async_trait::async_trait;
use ironquill_core::{
    ChatRequest, ChatResponse, EndpointError, Message, ModelEndpoint, Role, TokenUsage,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// An OpenAI-compatible model endpoint.
pub struct OpenAiCompatEndpoint {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiCompatEndpoint {
    /// Create a new OpenAI-compatible endpoint.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        }
    }

    /// Create an OpenRouter endpoint (convenience constructor).
    pub fn openrouter(api_key: impl Into<String>) -> Self {
        Self::new("openrouter", "https://openrouter.ai/api/v1", api_key)
    }

    /// Create an OpenAI endpoint (convenience constructor).
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self::new("openai", "https://api.openai.com/v1", api_key)
    }

    /// Create an Ollama endpoint (convenience constructor).
    pub fn ollama(base_url: Option<&str>) -> Self {
        Self::new(
            "ollama",
            base_url.unwrap_or("http://localhost:11434/v1"),
            "ollama", // Ollama doesn't need a real key
        )
    }

    /// Convert our Message types to the wire format.
    fn to_api_messages(messages: &[Message]) -> Vec<ApiMessage> {
        messages
            .iter()
            .map(|m| ApiMessage {
                role: match m.role {
                    Role::System => "system".into(),
                    Role::User => "user".into(),
                    Role::Assistant => "assistant".into(),
                },
                content: m.content.clone(),
            })
            .collect()
    }

    fn build_body(request: &ChatRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": request.model,
            "messages": Self::to_api_messages(&request.messages),
            "temperature": request.temperature,
            "stream": false,
        });

        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        // Some gateways accept this switch to suppress server-side web
        // search; pass it through when any message asks for it.
        if request.messages.iter().any(|m| m.disable_search) {
            body["disable_search"] = serde_json::json!(true);
        }

        body
    }
}

#[async_trait]
impl ModelEndpoint for OpenAiCompatEndpoint {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send_request(
        &self,
        request: ChatRequest,
    ) -> std::result::Result<ChatResponse, EndpointError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = Self::build_body(&request);

        debug!(endpoint = %self.name, model = %request.model, "sending completion request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| EndpointError::RequestFailed(e.to_string()))?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "endpoint returned error");
            return Err(EndpointError::RequestFailed(format!(
                "status {status}: {error_body}"
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| EndpointError::RequestFailed(e.to_string()))?;

        let api_response: ApiResponse = serde_json::from_str(&text)
            .map_err(|e| EndpointError::InvalidResponse(format!("{e}")))?;

        let content = api_response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.map(|m| m.content))
            .filter(|content| !content.is_empty())
            .ok_or(EndpointError::EmptyResponse)?;

        Ok(ChatResponse {
            content,
            usage: api_response.usage,
        })
    }

    async fn health_check(&self) -> std::result::Result<bool, EndpointError> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(|e| EndpointError::RequestFailed(e.to_string()))?;

        Ok(response.status().is_success())
    }
}

// --- Wire types (internal) ---

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    choices: Vec<ApiChoice>,

    /// Usage flows straight into [`TokenUsage`]; counters beyond the
    /// standard three land in its `extra` map.
    #[serde(default)]
    usage: Option<TokenUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    #[serde(default)]
    message: Option<ApiResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ApiResponseMessage {
    #[serde(default)]
    content: String,
}
