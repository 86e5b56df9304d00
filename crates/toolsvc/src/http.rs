//! HTTP tool service client — executes tools on a remote tool server.
//!
//! Wire shape:
//! - `GET  {base}/tools`        → `{"tools": [{name, description?, input_schema?}, ...]}`
//! - `POST {base}/tools/call`   → `{"output": "..."}` or `{"error": "..."}`

use async_trait::async_trait;
use ironquill_core::{ToolService, ToolServiceError, ToolSpec};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// A [`ToolService`] backed by a remote HTTP tool server.
pub struct HttpToolService {
    base_url: String,
    client: reqwest::Client,
    timeout_secs: u64,
}

impl HttpToolService {
    /// Create a client for the given base URL.
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            timeout_secs,
        }
    }

    fn map_transport_error(&self, e: reqwest::Error) -> ToolServiceError {
        if e.is_timeout() {
            ToolServiceError::Timeout(self.timeout_secs)
        } else {
            ToolServiceError::ConnectionFailed(e.to_string())
        }
    }
}

#[async_trait]
impl ToolService for HttpToolService {
    fn name(&self) -> &str {
        "http"
    }

    async fn available_tools(
        &self,
    ) -> std::result::Result<Vec<ToolSpec>, ToolServiceError> {
        let url = format!("{}/tools", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let body = response.text().await.unwrap_or_default();
            return Err(ToolServiceError::ServerError(format!(
                "status {status}: {body}"
            )));
        }

        let envelope: ToolsEnvelope = response
            .json()
            .await
            .map_err(|e| ToolServiceError::InvalidResponse(e.to_string()))?;

        debug!(count = envelope.tools.len(), "fetched remote tool catalogue");
        Ok(envelope.tools)
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: &str,
    ) -> std::result::Result<String, ToolServiceError> {
        let arguments: serde_json::Value = if arguments.trim().is_empty() {
            serde_json::json!({})
        } else {
            serde_json::from_str(arguments).unwrap_or_else(|_| {
                // Ship unparseable arguments as a raw string and let the
                // server decide what to make of them.
                serde_json::Value::String(arguments.to_string())
            })
        };

        let url = format!("{}/tools/call", self.base_url);
        let body = CallRequest {
            name: name.to_string(),
            arguments,
        };

        debug!(tool = name, "calling remote tool");
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let body = response.text().await.unwrap_or_default();
            warn!(tool = name, status, "remote tool call failed");
            return Err(ToolServiceError::ServerError(format!(
                "status {status}: {body}"
            )));
        }

        let envelope: CallResponse = response
            .json()
            .await
            .map_err(|e| ToolServiceError::InvalidResponse(e.to_string()))?;

        match envelope {
            CallResponse {
                output: Some(output),
                ..
            } => Ok(output),
            CallResponse {
                error: Some(error), ..
            } => Err(ToolServiceError::ServerError(error)),
            _ => Err(ToolServiceError::InvalidResponse(
                "response carried neither output nor error".into(),
            )),
        }
    }
}

// --- Wire types (internal) ---

#[derive(Debug, Deserialize)]
struct ToolsEnvelope {
    #[serde(default)]
    tools: Vec<ToolSpec>,
}

#[derive(Debug, Serialize)]
struct CallRequest {
    name: String,
    arguments: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct CallResponse {
    #[serde(default)]
    output: Option<String>,
    #[serde(default)]
    error: Option<String>,
}
