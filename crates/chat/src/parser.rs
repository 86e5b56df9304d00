//! Tool-request extraction from free-form model output.
//!
//! The model is not guaranteed to emit clean JSON, so extraction runs an
//! ordered chain of independent strategies, from most-structured to
//! most-permissive — the first one that yields requests wins, so a sloppy
//! fallback match can never override a well-formed earlier one:
//!
//! 1. A fenced code block (```json or unlabeled) is stripped, if present,
//!    and its content becomes the candidate text
//! 2. The candidate as a single JSON object: tool name under `tool`,
//!    `tool_name` or `name`; arguments under `arguments`, `args` or
//!    `params` (empty object when absent)
//! 3. The candidate as a JSON array of such objects, or an object whose
//!    `tools` / `tool_calls` key holds one or an array of them
//! 4. The *original* text scanned for inline `CALL_TOOL: name(args)`
//!    markers, case-insensitive
//!
//! Extraction never fails: unparseable input is simply zero requests.

use ironquill_core::ToolRequest;
use serde_json::Value;
use tracing::trace;

/// Keys a tool name may hide under.
const NAME_KEYS: &[&str] = &["tool", "tool_name", "name"];

/// Keys an argument payload may hide under.
const ARG_KEYS: &[&str] = &["arguments", "args", "params"];

/// The inline invocation marker, matched case-insensitively.
const INLINE_MARKER: &[u8] = b"call_tool:";

/// Extract zero or more tool requests from a model reply.
pub fn parse_tool_requests(text: &str) -> Vec<ToolRequest> {
    let candidate = fenced_json_block(text).unwrap_or_else(|| text.trim());

    let requests = parse_single_object(candidate);
    if !requests.is_empty() {
        return requests;
    }

    let requests = parse_collection(candidate);
    if !requests.is_empty() {
        return requests;
    }

    // Inline markers are scanned over the original, unstripped text — the
    // marker may sit outside the code fence.
    scan_inline_calls(text)
}

/// Find the content of the first ```json (or unlabeled) fenced block.
fn fenced_json_block(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let after = &text[start + 3..];
    let label_end = after.find('\n')?;
    let label = after[..label_end].trim();
    if !label.is_empty() && !label.eq_ignore_ascii_case("json") {
        return None;
    }
    let body = &after[label_end + 1..];
    let end = body.find("```")?;
    Some(body[..end].trim())
}

/// Strategy 2: the candidate is exactly one tool-call object.
fn parse_single_object(candidate: &str) -> Vec<ToolRequest> {
    let Ok(value) = serde_json::from_str::<Value>(candidate) else {
        return Vec::new();
    };
    request_from_object(&value).into_iter().collect()
}

/// Strategy 3: an array of tool-call objects, or a wrapper object whose
/// `tools` / `tool_calls` key holds one object or an array of them.
fn parse_collection(candidate: &str) -> Vec<ToolRequest> {
    let Ok(value) = serde_json::from_str::<Value>(candidate) else {
        return Vec::new();
    };

    match &value {
        Value::Array(items) => items.iter().filter_map(request_from_object).collect(),
        Value::Object(obj) => {
            for key in ["tools", "tool_calls"] {
                match obj.get(key) {
                    Some(Value::Array(items)) => {
                        return items.iter().filter_map(request_from_object).collect();
                    }
                    Some(single) => return request_from_object(single).into_iter().collect(),
                    None => {}
                }
            }
            Vec::new()
        }
        _ => Vec::new(),
    }
}

/// Interpret one JSON value as a tool-call object.
fn request_from_object(value: &Value) -> Option<ToolRequest> {
    let obj = value.as_object()?;

    let name = NAME_KEYS
        .iter()
        .find_map(|key| obj.get(*key).and_then(Value::as_str))?
        .trim();
    if name.is_empty() {
        return None;
    }

    let arguments = match ARG_KEYS.iter().find_map(|key| obj.get(*key)) {
        // Already-serialized arguments arrive as a JSON string; pass the
        // inner text through instead of double-encoding it.
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => "{}".to_string(),
    };

    Some(ToolRequest::new(name, arguments))
}

/// Strategy 4: scan for `CALL_TOOL: name(args)` markers.
fn scan_inline_calls(text: &str) -> Vec<ToolRequest> {
    let mut requests = Vec::new();
    let mut cursor = 0;

    while let Some(at) = find_marker(text, cursor) {
        let after = at + INLINE_MARKER.len();
        match inline_call_at(&text[after..]) {
            Some((request, consumed)) => {
                trace!(tool = %request.tool_name, "matched inline tool call");
                requests.push(request);
                cursor = after + consumed;
            }
            None => cursor = after,
        }
    }

    requests
}

/// Case-insensitive search for the inline marker. The marker is pure
/// ASCII, so the returned byte offsets are always char boundaries.
fn find_marker(text: &str, from: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    if bytes.len() < INLINE_MARKER.len() {
        return None;
    }
    (from..=bytes.len() - INLINE_MARKER.len())
        .find(|&i| bytes[i..i + INLINE_MARKER.len()].eq_ignore_ascii_case(INLINE_MARKER))
}

/// Parse `name(args)` immediately after a marker. Returns the request and
/// the number of bytes consumed, or `None` if the shape doesn't match.
fn inline_call_at(rest: &str) -> Option<(ToolRequest, usize)> {
    let skipped = rest.len() - rest.trim_start().len();
    let rest = rest.trim_start();

    let open = rest.find('(')?;
    let name = rest[..open].trim_end();
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return None;
    }

    // Balanced-paren scan so JSON arguments containing parentheses
    // survive intact.
    let mut depth = 0usize;
    let mut close = None;
    for (i, c) in rest[open..].char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    close = Some(open + i);
                    break;
                }
            }
            _ => {}
        }
    }
    let close = close?;

    let raw = rest[open + 1..close].trim();
    let arguments = if raw.is_empty() {
        "{}".to_string()
    } else if serde_json::from_str::<Value>(raw).is_ok() {
        raw.to_string()
    } else {
        // Not JSON — wrap the raw text so the tool still gets something.
        Value::Object(
            [("input".to_string(), Value::String(raw.to_string()))]
                .into_iter()
                .collect(),
        )
        .to_string()
    };

    Some((ToolRequest::new(name, arguments), skipped + close + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(request: &ToolRequest) -> Value {
        serde_json::from_str(&request.arguments).unwrap()
    }

    #[test]
    fn plain_prose_yields_nothing() {
        assert!(parse_tool_requests("The answer is 4.").is_empty());
        assert!(parse_tool_requests("").is_empty());
        assert!(parse_tool_requests("a sentence with (parentheses) and: colons").is_empty());
    }

    #[test]
    fn single_object_with_tool_key() {
        let requests = parse_tool_requests(r#"{"tool":"calc","arguments":{"expr":"2+2"}}"#);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].tool_name, "calc");
        assert_eq!(args(&requests[0]), serde_json::json!({"expr":"2+2"}));
    }

    #[test]
    fn single_object_alternate_keys() {
        for text in [
            r#"{"tool_name":"calc","args":{"a":1}}"#,
            r#"{"name":"calc","params":{"a":1}}"#,
        ] {
            let requests = parse_tool_requests(text);
            assert_eq!(requests.len(), 1, "failed for {text}");
            assert_eq!(requests[0].tool_name, "calc");
            assert_eq!(args(&requests[0]), serde_json::json!({"a":1}));
        }
    }

    #[test]
    fn missing_arguments_default_to_empty_object() {
        let requests = parse_tool_requests(r#"{"tool":"clock"}"#);
        assert_eq!(requests.len(), 1);
        assert_eq!(args(&requests[0]), serde_json::json!({}));
    }

    #[test]
    fn string_encoded_arguments_pass_through() {
        let requests =
            parse_tool_requests(r#"{"tool":"calc","arguments":"{\"expr\":\"2+2\"}"}"#);
        assert_eq!(requests.len(), 1);
        assert_eq!(args(&requests[0]), serde_json::json!({"expr":"2+2"}));
    }

    #[test]
    fn fenced_block_same_as_unwrapped() {
        let bare = parse_tool_requests(r#"{"tool":"calc","arguments":{"expr":"2+2"}}"#);
        let fenced = parse_tool_requests(
            "```json\n{\"tool\":\"calc\",\"arguments\":{\"expr\":\"2+2\"}}\n```",
        );
        let unlabeled =
            parse_tool_requests("```\n{\"tool\":\"calc\",\"arguments\":{\"expr\":\"2+2\"}}\n```");
        assert_eq!(bare, fenced);
        assert_eq!(bare, unlabeled);
    }

    #[test]
    fn fenced_block_with_surrounding_prose() {
        let text = "I'll calculate that for you.\n```json\n{\"tool\":\"calc\",\"arguments\":{}}\n```\nOne moment.";
        let requests = parse_tool_requests(text);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].tool_name, "calc");
    }

    #[test]
    fn non_json_fence_label_is_not_stripped() {
        // A ```python fence isn't a JSON candidate; no inline marker either.
        let requests = parse_tool_requests("```python\nprint('hi')\n```");
        assert!(requests.is_empty());
    }

    #[test]
    fn array_preserves_order() {
        let requests = parse_tool_requests(
            r#"[{"tool":"first","arguments":{}},{"tool":"second","arguments":{}}]"#,
        );
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].tool_name, "first");
        assert_eq!(requests[1].tool_name, "second");
    }

    #[test]
    fn tools_wrapper_object() {
        let requests = parse_tool_requests(
            r#"{"tools":[{"tool":"a","arguments":{}},{"name":"b"}]}"#,
        );
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].tool_name, "a");
        assert_eq!(requests[1].tool_name, "b");
    }

    #[test]
    fn tool_calls_wrapper_with_single_object() {
        let requests =
            parse_tool_requests(r#"{"tool_calls":{"name":"calc","args":{"x":1}}}"#);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].tool_name, "calc");
    }

    #[test]
    fn inline_call_with_json_args() {
        let requests =
            parse_tool_requests(r#"Let me check. CALL_TOOL: weather({"city": "Oslo"})"#);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].tool_name, "weather");
        assert_eq!(args(&requests[0]), serde_json::json!({"city": "Oslo"}));
    }

    #[test]
    fn inline_call_is_case_insensitive() {
        let requests = parse_tool_requests("call_tool: clock()");
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].tool_name, "clock");
        assert_eq!(args(&requests[0]), serde_json::json!({}));
    }

    #[test]
    fn inline_call_with_raw_text_args() {
        let requests = parse_tool_requests("CALL_TOOL: search(rust error handling)");
        assert_eq!(requests.len(), 1);
        assert_eq!(
            args(&requests[0]),
            serde_json::json!({"input": "rust error handling"})
        );
    }

    #[test]
    fn multiple_inline_calls_in_order() {
        let text = "CALL_TOOL: a({\"n\":1}) and then CALL_TOOL: b({\"n\":2})";
        let requests = parse_tool_requests(text);
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].tool_name, "a");
        assert_eq!(requests[1].tool_name, "b");
    }

    #[test]
    fn structured_match_beats_inline_fallback() {
        // Both conventions present — the fenced JSON object wins and the
        // inline marker outside the fence is never consulted.
        let text = "```json\n{\"tool\":\"primary\",\"arguments\":{}}\n```\nor maybe CALL_TOOL: other()";
        let requests = parse_tool_requests(text);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].tool_name, "primary");
    }

    #[test]
    fn malformed_json_falls_through_to_inline() {
        let text = "{\"tool\": broken json... CALL_TOOL: rescue({})";
        let requests = parse_tool_requests(text);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].tool_name, "rescue");
    }

    #[test]
    fn object_without_name_key_yields_nothing() {
        assert!(parse_tool_requests(r#"{"arguments":{"a":1}}"#).is_empty());
        assert!(parse_tool_requests(r#"{"temperature": 0.7}"#).is_empty());
    }

    #[test]
    fn unterminated_inline_call_is_skipped() {
        assert!(parse_tool_requests("CALL_TOOL: calc(1+1").is_empty());
        assert!(parse_tool_requests("CALL_TOOL:").is_empty());
    }

    #[test]
    fn inline_name_with_invalid_chars_is_skipped() {
        assert!(parse_tool_requests("CALL_TOOL: not a tool(x)").is_empty());
    }
}
