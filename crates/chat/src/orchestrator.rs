//! The tool-orchestration loop — one instance run per user turn.
//!
//! States: `Start → SendToModel → ParseOutput → {done | ExecuteTools →
//! AppendResults → SendToModel}`, with a hard round ceiling (default 10).
//! Hitting the ceiling returns the last response as-is — a degraded
//! success, never an error.
//!
//! The loop borrows the caller's [`History`] mutably for the duration of
//! the turn and leaves it appendable on every exit path: committed
//! messages from earlier rounds survive endpoint failures and
//! cancellation alike.

use ironquill_core::{
    ChatRequest, ChatResponse, Error, History, Message, ModelEndpoint, ToolOutcome, ToolRequest,
    ToolService, ToolServiceError, ToolSpec,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::parser::parse_tool_requests;

/// Default hard ceiling on rounds per turn.
pub const DEFAULT_MAX_ROUNDS: u32 = 10;

/// Drives request/response/tool-execution rounds for a single turn.
pub struct ToolOrchestrator {
    /// The model endpoint
    endpoint: Arc<dyn ModelEndpoint>,

    /// The tool-execution collaborator; may be entirely absent
    tool_service: Option<Arc<dyn ToolService>>,

    /// The model to use
    model: String,

    /// Temperature setting
    temperature: f32,

    /// Default max tokens per response
    max_tokens: Option<u32>,

    /// Maximum rounds per turn
    max_rounds: u32,
}

impl ToolOrchestrator {
    /// Create a new orchestrator against an endpoint.
    pub fn new(endpoint: Arc<dyn ModelEndpoint>, model: impl Into<String>) -> Self {
        Self {
            endpoint,
            tool_service: None,
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
            max_rounds: DEFAULT_MAX_ROUNDS,
        }
    }

    /// Attach a tool-execution service.
    pub fn with_tool_service(mut self, service: Arc<dyn ToolService>) -> Self {
        self.tool_service = Some(service);
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the max tokens per model response.
    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Set the round ceiling.
    pub fn with_max_rounds(mut self, max: u32) -> Self {
        self.max_rounds = max;
        self
    }

    /// Run one user turn.
    ///
    /// Appends the user message, drives rounds until the model replies
    /// without tool requests or the ceiling is hit, and returns the final
    /// response. `history` ends with that assistant message.
    pub async fn run(
        &self,
        user_text: &str,
        system_prompt: &str,
        history: &mut History,
        temperature_override: Option<f32>,
    ) -> Result<ChatResponse, Error> {
        let temperature = temperature_override.unwrap_or(self.temperature);

        // Fetch the tool catalogue once per turn. An absent or failing
        // service means no catalogue — the turn degrades to a single-shot
        // request, though the parser still runs on every reply.
        let tools = match &self.tool_service {
            Some(service) => match service.available_tools().await {
                Ok(tools) => tools,
                Err(e) => {
                    warn!(error = %e, "tool catalogue unavailable, continuing without tools");
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        history.set_system_prompt(compose_system_prompt(system_prompt, &tools));

        let mut pending = Message::user(user_text);
        let mut round = 0u32;

        loop {
            round += 1;
            debug!(round, history_len = history.len(), "conversation round");

            history.push(pending);

            let request = ChatRequest {
                model: self.model.clone(),
                messages: history.snapshot(),
                max_tokens: self.max_tokens,
                temperature,
            };
            let response = self.endpoint.send_request(request).await?;

            // Appended unconditionally — the model must see its own
            // tool-call utterances on the next round.
            history.push(Message::assistant(&response.content));

            let requests = parse_tool_requests(&response.content);
            if requests.is_empty() {
                debug!(round, "turn complete");
                return Ok(response);
            }

            if round >= self.max_rounds {
                // Deliberate best-effort degradation: the reply may still
                // carry unexecuted tool syntax, but the turn must end.
                warn!(
                    rounds = round,
                    "round ceiling reached, returning last response as-is"
                );
                return Ok(response);
            }

            info!(count = requests.len(), round, "executing tool requests");
            let outcomes = self.execute_all(&requests).await;
            pending = Message::user(format_tool_results(&requests, &outcomes));
        }
    }

    /// Build and send an ephemeral two-message request that never touches
    /// any history. Used for independent-mode queries.
    pub async fn run_detached(
        &self,
        system_prompt: &str,
        user_text: &str,
    ) -> Result<ChatResponse, Error> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![Message::system(system_prompt), Message::user(user_text)],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };
        Ok(self.endpoint.send_request(request).await?)
    }

    /// Execute parsed requests strictly in order, one completion observed
    /// before the next begins, so the formatted result block is
    /// deterministic.
    async fn execute_all(&self, requests: &[ToolRequest]) -> Vec<ToolOutcome> {
        let mut outcomes = Vec::with_capacity(requests.len());
        for request in requests {
            let outcome = match &self.tool_service {
                Some(service) => {
                    debug!(tool = %request.tool_name, "calling tool");
                    ToolOutcome::from_result(
                        service
                            .call_tool(&request.tool_name, &request.arguments)
                            .await,
                    )
                }
                // The model emitted tool syntax with no service
                // configured — resolve visibly instead of dropping it.
                None => ToolOutcome::from_result(Err(ToolServiceError::NotConfigured)),
            };
            if let ToolOutcome::Error { kind, message } = &outcome {
                warn!(tool = %request.tool_name, kind, %message, "tool call failed");
            }
            outcomes.push(outcome);
        }
        outcomes
    }
}

/// Append the tool catalogue and the two accepted invocation syntaxes to
/// the base system prompt. With no tools, the base passes through.
fn compose_system_prompt(base: &str, tools: &[ToolSpec]) -> String {
    if tools.is_empty() {
        return base.to_string();
    }

    let mut prompt = String::from(base);
    prompt.push_str("\n\n## Available tools\n\n");
    for tool in tools {
        prompt.push_str("- ");
        prompt.push_str(&tool.name);
        if let Some(description) = &tool.description {
            prompt.push_str(": ");
            prompt.push_str(description);
        }
        prompt.push('\n');
        if let Some(schema) = &tool.input_schema {
            prompt.push_str("  parameters: ");
            prompt.push_str(&schema.to_string());
            prompt.push('\n');
        }
    }
    prompt.push_str(
        "\nTo invoke a tool, reply with only a JSON object:\n\
         {\"tool\": \"<name>\", \"arguments\": { ... }}\n\
         To invoke several tools in one reply, use a JSON array of such objects.",
    );
    prompt
}

/// Format (request, outcome) pairs into the single synthetic user message
/// that feeds results back to the model.
fn format_tool_results(requests: &[ToolRequest], outcomes: &[ToolOutcome]) -> String {
    let mut block = String::from("Tool results:\n");
    for (i, (request, outcome)) in requests.iter().zip(outcomes).enumerate() {
        block.push_str(&format!(
            "\n{}. {}({})\n",
            i + 1,
            request.tool_name,
            request.arguments
        ));
        match outcome {
            ToolOutcome::Success(output) => {
                block.push_str(&format!("   => {output}\n"));
            }
            ToolOutcome::Error { kind, message } => {
                block.push_str(&format!("   => Error ({kind}): {message}\n"));
            }
        }
    }
    block.push_str(
        "\nUse these results to answer the original question. \
         Reply with the final answer unless more information is required.",
    );
    block
}
