//! ToolService trait — the abstraction over tool execution.
//!
//! Tools are external capabilities the model may request by name with a
//! JSON argument payload. The service is optional: a conversation without
//! one degrades to plain single-shot requests.

use crate::error::ToolServiceError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A tool the service advertises, described to the model in the system
/// prompt so its output stays parseable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    /// The tool name
    pub name: String,

    /// What the tool does
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// JSON Schema describing the tool's parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<serde_json::Value>,
}

/// A single tool invocation parsed out of model output.
///
/// Ephemeral — lives for one loop round and is never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolRequest {
    /// Name of the tool to invoke
    pub tool_name: String,

    /// Arguments as serialized JSON (possibly `{}`)
    pub arguments: String,
}

impl ToolRequest {
    pub fn new(tool_name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            arguments: arguments.into(),
        }
    }
}

/// The outcome of one tool invocation, order-correlated with its request.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    Success(String),
    Error {
        kind: &'static str,
        message: String,
    },
}

impl ToolOutcome {
    /// Fold a service call result into an outcome.
    pub fn from_result(result: std::result::Result<String, ToolServiceError>) -> Self {
        match result {
            Ok(output) => Self::Success(output),
            Err(e) => Self::Error {
                kind: e.kind(),
                message: e.to_string(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// The tool-execution service contract.
///
/// May be entirely absent. Implementations: an in-process registry of
/// built-in tools, an HTTP client for a remote tool server.
#[async_trait]
pub trait ToolService: Send + Sync {
    /// A human-readable name for this service.
    fn name(&self) -> &str;

    /// The tools currently available for invocation.
    async fn available_tools(&self)
    -> std::result::Result<Vec<ToolSpec>, ToolServiceError>;

    /// Execute one tool by name with a serialized JSON argument payload.
    async fn call_tool(
        &self,
        name: &str,
        arguments: &str,
    ) -> std::result::Result<String, ToolServiceError>;
}
