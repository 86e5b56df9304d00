//! ModelEndpoint trait — the abstraction over LLM backends.
//!
//! An endpoint knows how to send one conversation to a language model and
//! return the complete response. Implementations: OpenAI-compatible HTTP
//! servers, custom gateways, mock endpoints in tests.

use crate::error::EndpointError;
use crate::message::Message;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A single chat request.
///
/// Constructed fresh per call and never mutated after send.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The model to use (e.g. "gpt-4o", "anthropic/claude-sonnet-4")
    pub model: String,

    /// The ordered conversation messages, replayed verbatim
    pub messages: Vec<Message>,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Temperature in [0.0, 2.0]
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_temperature() -> f32 {
    0.7
}

/// Token usage statistics reported by the provider.
///
/// A trigger signal for summarization and a cost display — never required
/// for correctness. Counters the provider reports beyond the standard
/// three are preserved in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,

    #[serde(flatten, default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A complete response from a model endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// The generated text
    pub content: String,

    /// Token usage, when the provider reports it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
}

/// The core ModelEndpoint trait.
///
/// Every LLM backend implements this trait. The orchestration loop calls
/// `send_request()` without knowing which provider is in play — new
/// providers are added by implementing this capability, not by branching
/// inside the loop.
#[async_trait]
pub trait ModelEndpoint: Send + Sync {
    /// A human-readable name for this endpoint (e.g. "openrouter").
    fn name(&self) -> &str;

    /// Send a request and get the complete response.
    async fn send_request(
        &self,
        request: ChatRequest,
    ) -> std::result::Result<ChatResponse, EndpointError>;

    /// Health check — can we reach the endpoint?
    async fn health_check(&self) -> std::result::Result<bool, EndpointError> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_request_serializes_without_max_tokens() {
        let req = ChatRequest {
            model: "gpt-4o".into(),
            messages: vec![Message::user("hi")],
            max_tokens: None,
            temperature: 0.7,
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(!json.contains("max_tokens"));
    }

    #[test]
    fn usage_preserves_provider_specific_counters() {
        let json = r#"{
            "prompt_tokens": 10,
            "completion_tokens": 5,
            "total_tokens": 15,
            "reasoning_tokens": 3
        }"#;
        let usage: TokenUsage = serde_json::from_str(json).unwrap();
        assert_eq!(usage.total_tokens, 15);
        assert_eq!(usage.extra["reasoning_tokens"], 3);
    }

    #[test]
    fn usage_default_is_zeroed() {
        let usage = TokenUsage::default();
        assert_eq!(usage.total_tokens, 0);
        assert!(usage.extra.is_empty());
    }
}
