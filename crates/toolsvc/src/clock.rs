//! Clock tool — reports the current date and time.

use async_trait::async_trait;
use chrono::Utc;
use chrono::format::{Item, StrftimeItems};
use ironquill_core::ToolServiceError;

use crate::local::BuiltinTool;

pub struct ClockTool;

#[async_trait]
impl BuiltinTool for ClockTool {
    fn name(&self) -> &str {
        "clock"
    }

    fn description(&self) -> &str {
        "Get the current UTC date and time."
    }

    fn input_schema(&self) -> Option<serde_json::Value> {
        Some(serde_json::json!({
            "type": "object",
            "properties": {
                "format": {
                    "type": "string",
                    "description": "Optional strftime format, e.g. '%Y-%m-%d'. Defaults to RFC 3339."
                }
            }
        }))
    }

    async fn invoke(
        &self,
        arguments: serde_json::Value,
    ) -> std::result::Result<String, ToolServiceError> {
        let now = Utc::now();
        match arguments["format"].as_str() {
            Some(format) => {
                // Chrono surfaces bad format strings at display time, so
                // validate the items up front instead of panicking later.
                let items: Vec<Item<'_>> = StrftimeItems::new(format).collect();
                if items.iter().any(|item| matches!(item, Item::Error)) {
                    return Err(ToolServiceError::ServerError(format!(
                        "invalid time format '{format}'"
                    )));
                }
                Ok(now.format_with_items(items.into_iter()).to_string())
            }
            None => Ok(now.to_rfc3339()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn default_format_is_rfc3339() {
        let output = ClockTool.invoke(serde_json::json!({})).await.unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(&output).is_ok());
    }

    #[tokio::test]
    async fn custom_format_applies() {
        let output = ClockTool
            .invoke(serde_json::json!({"format": "%Y"}))
            .await
            .unwrap();
        assert_eq!(output.len(), 4);
        assert!(output.chars().all(|c| c.is_ascii_digit()));
    }

    #[tokio::test]
    async fn invalid_format_is_rejected() {
        let err = ClockTool
            .invoke(serde_json::json!({"format": "%Q-nonsense"}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("invalid time format"));
    }
}
