//! Conversation summarization — condensing history once it grows too big.
//!
//! The summarizer decides *when* (accumulated token usage crosses a
//! threshold) and produces the condensed text; the conversation manager
//! is the one that actually replaces history. Summarization runs through
//! the same endpoint abstraction as the main loop but with its own model,
//! budget, temperature and prompts, all independent of the main
//! conversation's configuration.

use ironquill_core::{ChatRequest, ChatResponse, EndpointError, Message, ModelEndpoint, TokenUsage};
use std::sync::Arc;
use tracing::debug;

/// Configuration for the summarization request.
#[derive(Debug, Clone)]
pub struct SummarizerConfig {
    /// Total-token count above which summarization triggers (strictly
    /// greater than).
    pub threshold: u32,

    /// Model used for the summarization request.
    pub model: String,

    /// Max tokens for the summary itself.
    pub max_tokens: Option<u32>,

    /// Temperature for the summarization request.
    pub temperature: f32,

    /// System prompt for the summarization request.
    pub system_prompt: String,

    /// The trailing user instruction appended after the history.
    pub instruction: String,
}

impl SummarizerConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            threshold: 4000,
            model: model.into(),
            max_tokens: Some(1024),
            temperature: 0.3,
            system_prompt: "You condense conversations. Produce a compact summary that \
                            preserves facts, decisions, names, and any unresolved questions."
                .into(),
            instruction: "Summarize the conversation above.".into(),
        }
    }

    pub fn with_threshold(mut self, threshold: u32) -> Self {
        self.threshold = threshold;
        self
    }
}

/// Decides when history is too large and produces its replacement text.
pub struct Summarizer {
    endpoint: Arc<dyn ModelEndpoint>,
    config: SummarizerConfig,
}

impl Summarizer {
    pub fn new(endpoint: Arc<dyn ModelEndpoint>, config: SummarizerConfig) -> Self {
        Self { endpoint, config }
    }

    /// True iff usage is present and its total strictly exceeds the
    /// threshold. Absent usage never triggers — the conversation keeps
    /// going uncompressed rather than blocking on a missing counter.
    pub fn should_summarize(&self, usage: Option<&TokenUsage>) -> bool {
        usage.is_some_and(|u| u.total_tokens > self.config.threshold)
    }

    /// Produce a condensed summary of the given history.
    ///
    /// Never mutates history — replacing it is the caller's job.
    pub async fn summarize(&self, history: &[Message]) -> Result<String, EndpointError> {
        debug!(
            messages = history.len(),
            model = %self.config.model,
            "requesting conversation summary"
        );

        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(Message::system(&self.config.system_prompt));
        messages.extend_from_slice(history);
        messages.push(Message::user(&self.config.instruction));

        let request = ChatRequest {
            model: self.config.model.clone(),
            messages,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let ChatResponse { content, .. } = self.endpoint.send_request(request).await?;
        Ok(content.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ironquill_core::Role;
    use std::sync::Mutex;

    struct RecordingEndpoint {
        reply: String,
        seen: Mutex<Vec<ChatRequest>>,
    }

    impl RecordingEndpoint {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl ModelEndpoint for RecordingEndpoint {
        fn name(&self) -> &str {
            "recording"
        }

        async fn send_request(
            &self,
            request: ChatRequest,
        ) -> Result<ChatResponse, EndpointError> {
            self.seen.lock().unwrap().push(request);
            Ok(ChatResponse {
                content: self.reply.clone(),
                usage: None,
            })
        }
    }

    fn usage(total: u32) -> TokenUsage {
        TokenUsage {
            prompt_tokens: 0,
            completion_tokens: 0,
            total_tokens: total,
            extra: serde_json::Map::new(),
        }
    }

    fn summarizer(threshold: u32) -> (Arc<RecordingEndpoint>, Summarizer) {
        let endpoint = Arc::new(RecordingEndpoint::new("  the summary  "));
        let config = SummarizerConfig::new("summary-model").with_threshold(threshold);
        (endpoint.clone(), Summarizer::new(endpoint, config))
    }

    #[test]
    fn absent_usage_never_triggers() {
        let (_, s) = summarizer(4000);
        assert!(!s.should_summarize(None));
    }

    #[test]
    fn threshold_is_strictly_greater_than() {
        let (_, s) = summarizer(4000);
        assert!(!s.should_summarize(Some(&usage(4000))));
        assert!(s.should_summarize(Some(&usage(4001))));
        assert!(!s.should_summarize(Some(&usage(0))));
    }

    #[tokio::test]
    async fn summarize_builds_the_dedicated_request() {
        let (endpoint, s) = summarizer(4000);
        let history = vec![
            Message::system("main system prompt"),
            Message::user("hello"),
            Message::assistant("hi there"),
        ];

        let summary = s.summarize(&history).await.unwrap();
        assert_eq!(summary, "the summary");

        let seen = endpoint.seen.lock().unwrap();
        let request = &seen[0];
        assert_eq!(request.model, "summary-model");

        // [summary system prompt] + [history verbatim] + [instruction]
        assert_eq!(request.messages.len(), 5);
        assert_eq!(request.messages[0].role, Role::System);
        assert!(request.messages[0].content.contains("condense"));
        assert_eq!(request.messages[1].content, "main system prompt");
        assert_eq!(request.messages[3].content, "hi there");
        assert_eq!(request.messages[4].role, Role::User);
        assert_eq!(request.messages[4].content, "Summarize the conversation above.");
    }
}
