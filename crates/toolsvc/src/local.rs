//! In-process tool execution — a registry of built-in tools.

use async_trait::async_trait;
use ironquill_core::{ToolService, ToolServiceError, ToolSpec};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// A tool that runs inside the process.
///
/// Each built-in (calculator, clock, ...) implements this trait and is
/// registered in a [`LocalToolService`].
#[async_trait]
pub trait BuiltinTool: Send + Sync {
    /// The unique name of this tool (e.g. "calculator").
    fn name(&self) -> &str;

    /// A description of what this tool does (shown to the model).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters, if it has any.
    fn input_schema(&self) -> Option<serde_json::Value> {
        None
    }

    /// Execute with the parsed argument object.
    async fn invoke(
        &self,
        arguments: serde_json::Value,
    ) -> std::result::Result<String, ToolServiceError>;
}

/// Default per-call timeout.
const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// An in-process [`ToolService`] backed by registered built-in tools.
pub struct LocalToolService {
    tools: HashMap<String, Box<dyn BuiltinTool>>,
    call_timeout: Duration,
}

impl LocalToolService {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    /// Set the per-call timeout.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Box<dyn BuiltinTool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }
}

impl Default for LocalToolService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ToolService for LocalToolService {
    fn name(&self) -> &str {
        "local"
    }

    async fn available_tools(
        &self,
    ) -> std::result::Result<Vec<ToolSpec>, ToolServiceError> {
        // Sorted so the catalogue in the system prompt is deterministic.
        let mut specs: Vec<ToolSpec> = self
            .tools
            .values()
            .map(|tool| ToolSpec {
                name: tool.name().to_string(),
                description: Some(tool.description().to_string()),
                input_schema: tool.input_schema(),
            })
            .collect();
        specs.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(specs)
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: &str,
    ) -> std::result::Result<String, ToolServiceError> {
        let tool = self.tools.get(name).ok_or_else(|| {
            ToolServiceError::ServerError(format!("unknown tool '{name}'"))
        })?;

        let arguments: serde_json::Value = if arguments.trim().is_empty() {
            serde_json::json!({})
        } else {
            serde_json::from_str(arguments).map_err(|e| {
                ToolServiceError::ServerError(format!("arguments are not valid JSON: {e}"))
            })?
        };

        debug!(tool = name, "invoking built-in tool");
        match tokio::time::timeout(self.call_timeout, tool.invoke(arguments)).await {
            Ok(result) => result,
            Err(_) => Err(ToolServiceError::Timeout(self.call_timeout.as_secs())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoTool;

    #[async_trait]
    impl BuiltinTool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echoes back the input"
        }

        async fn invoke(
            &self,
            arguments: serde_json::Value,
        ) -> Result<String, ToolServiceError> {
            Ok(arguments["text"].as_str().unwrap_or("").to_string())
        }
    }

    struct SlowTool;

    #[async_trait]
    impl BuiltinTool for SlowTool {
        fn name(&self) -> &str {
            "slow"
        }

        fn description(&self) -> &str {
            "Sleeps forever"
        }

        async fn invoke(
            &self,
            _arguments: serde_json::Value,
        ) -> Result<String, ToolServiceError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok("never".into())
        }
    }

    fn service() -> LocalToolService {
        let mut service = LocalToolService::new();
        service.register(Box::new(EchoTool));
        service
    }

    #[tokio::test]
    async fn catalogue_lists_registered_tools() {
        let specs = service().available_tools().await.unwrap();
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].name, "echo");
        assert_eq!(specs[0].description.as_deref(), Some("Echoes back the input"));
    }

    #[tokio::test]
    async fn call_dispatches_to_the_tool() {
        let output = service()
            .call_tool("echo", r#"{"text":"hello world"}"#)
            .await
            .unwrap();
        assert_eq!(output, "hello world");
    }

    #[tokio::test]
    async fn empty_arguments_become_empty_object() {
        let output = service().call_tool("echo", "").await.unwrap();
        assert_eq!(output, "");
    }

    #[tokio::test]
    async fn unknown_tool_is_a_server_error() {
        let err = service().call_tool("nonexistent", "{}").await.unwrap_err();
        assert!(matches!(err, ToolServiceError::ServerError(_)));
        assert!(err.to_string().contains("nonexistent"));
    }

    #[tokio::test]
    async fn invalid_arguments_are_rejected() {
        let err = service().call_tool("echo", "{ not json").await.unwrap_err();
        assert!(matches!(err, ToolServiceError::ServerError(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_tool_times_out() {
        let mut service = LocalToolService::new().with_call_timeout(Duration::from_secs(5));
        service.register(Box::new(SlowTool));

        let err = service.call_tool("slow", "{}").await.unwrap_err();
        assert!(matches!(err, ToolServiceError::Timeout(5)));
    }
}
