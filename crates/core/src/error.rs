//! Error types for the Ironquill domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each collaborator has its own error enum; the loop inspects failure
//! kinds instead of unwinding, so these are sum types, not panics.

use thiserror::Error;

/// The top-level error type for all Ironquill operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Model endpoint errors ---
    #[error("Endpoint error: {0}")]
    Endpoint(#[from] EndpointError),

    // --- Tool-execution service errors ---
    #[error("Tool service error: {0}")]
    ToolService(#[from] ToolServiceError),

    // --- Persistence errors ---
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Collaborator errors ---

/// Failures from the model endpoint.
#[derive(Debug, Clone, Error)]
pub enum EndpointError {
    /// Transport/HTTP-level failure: the request never produced a usable
    /// 2xx response.
    #[error("request failed: {0}")]
    RequestFailed(String),

    /// 2xx but no usable content in the response envelope.
    #[error("provider returned an empty response")]
    EmptyResponse,

    /// Content present but not parseable into the expected envelope.
    #[error("invalid response payload: {0}")]
    InvalidResponse(String),
}

/// Failures from the tool-execution service.
///
/// These never abort a turn — the orchestration loop folds them into the
/// tool-results block so the model can react to them.
#[derive(Debug, Clone, Error)]
pub enum ToolServiceError {
    #[error("no tool service is configured")]
    NotConfigured,

    #[error("connection to tool service failed: {0}")]
    ConnectionFailed(String),

    #[error("tool call timed out after {0}s")]
    Timeout(u64),

    #[error("tool service error: {0}")]
    ServerError(String),

    #[error("invalid tool service response: {0}")]
    InvalidResponse(String),
}

impl ToolServiceError {
    /// A stable short name for this failure kind, used when formatting
    /// tool outcomes back to the model.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotConfigured => "NotConfigured",
            Self::ConnectionFailed(_) => "ConnectionFailed",
            Self::Timeout(_) => "Timeout",
            Self::ServerError(_) => "ServerError",
            Self::InvalidResponse(_) => "InvalidResponse",
        }
    }
}

/// Failures from a history store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Corrupt saved session: {0}")]
    Corrupt(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_error_displays_correctly() {
        let err = Error::Endpoint(EndpointError::RequestFailed(
            "status 503: upstream unavailable".into(),
        ));
        assert!(err.to_string().contains("503"));
        assert!(err.to_string().contains("upstream unavailable"));
    }

    #[test]
    fn tool_service_error_kinds_are_stable() {
        assert_eq!(ToolServiceError::NotConfigured.kind(), "NotConfigured");
        assert_eq!(ToolServiceError::Timeout(30).kind(), "Timeout");
        assert_eq!(
            ToolServiceError::ServerError("boom".into()).kind(),
            "ServerError"
        );
    }

    #[test]
    fn store_error_displays_correctly() {
        let err = Error::Store(StoreError::Corrupt("truncated JSON".into()));
        assert!(err.to_string().contains("truncated JSON"));
    }
}
