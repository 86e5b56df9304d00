//! Calculator tool — evaluates arithmetic expressions.
//!
//! Supports `+`, `-`, `*`, `/`, `%`, parentheses, unary negation, and
//! decimal numbers. A small recursive-descent evaluator over the raw
//! input; no dependencies beyond std.

use async_trait::async_trait;
use ironquill_core::ToolServiceError;

use crate::local::BuiltinTool;

pub struct CalculatorTool;

#[async_trait]
impl BuiltinTool for CalculatorTool {
    fn name(&self) -> &str {
        "calculator"
    }

    fn description(&self) -> &str {
        "Evaluate an arithmetic expression. Supports +, -, *, /, %, parentheses, and decimal numbers."
    }

    fn input_schema(&self) -> Option<serde_json::Value> {
        Some(serde_json::json!({
            "type": "object",
            "properties": {
                "expression": {
                    "type": "string",
                    "description": "The expression to evaluate, e.g. '(2 + 3) * 4'"
                }
            },
            "required": ["expression"]
        }))
    }

    async fn invoke(
        &self,
        arguments: serde_json::Value,
    ) -> std::result::Result<String, ToolServiceError> {
        let expression = arguments["expression"]
            .as_str()
            // The inline CALL_TOOL fallback wraps raw text under "input".
            .or_else(|| arguments["input"].as_str())
            .ok_or_else(|| {
                ToolServiceError::ServerError("missing 'expression' argument".into())
            })?;

        let value = evaluate(expression).map_err(ToolServiceError::ServerError)?;

        // Integers print without a trailing .0
        if value.fract() == 0.0 && value.abs() < 1e15 {
            Ok(format!("{}", value as i64))
        } else {
            Ok(format!("{value}"))
        }
    }
}

/// Evaluate an arithmetic expression string.
pub fn evaluate(expression: &str) -> Result<f64, String> {
    let mut cursor = Cursor::new(expression);
    let value = cursor.expr()?;
    cursor.skip_whitespace();
    if !cursor.at_end() {
        return Err(format!(
            "unexpected input at byte {}: '{}'",
            cursor.pos,
            cursor.remainder()
        ));
    }
    Ok(value)
}

/// A byte cursor over the expression.
///
/// Grammar:
/// ```text
/// expr   = term (('+' | '-') term)*
/// term   = factor (('*' | '/' | '%') factor)*
/// factor = '-' factor | '(' expr ')' | NUMBER
/// ```
struct Cursor<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input: input.as_bytes(),
            pos: 0,
        }
    }

    fn expr(&mut self) -> Result<f64, String> {
        let mut value = self.term()?;
        loop {
            match self.peek_op() {
                Some(b'+') => {
                    self.pos += 1;
                    value += self.term()?;
                }
                Some(b'-') => {
                    self.pos += 1;
                    value -= self.term()?;
                }
                _ => return Ok(value),
            }
        }
    }

    fn term(&mut self) -> Result<f64, String> {
        let mut value = self.factor()?;
        loop {
            match self.peek_op() {
                Some(b'*') => {
                    self.pos += 1;
                    value *= self.factor()?;
                }
                Some(b'/') => {
                    self.pos += 1;
                    let divisor = self.factor()?;
                    if divisor == 0.0 {
                        return Err("division by zero".into());
                    }
                    value /= divisor;
                }
                Some(b'%') => {
                    self.pos += 1;
                    let divisor = self.factor()?;
                    if divisor == 0.0 {
                        return Err("division by zero".into());
                    }
                    value %= divisor;
                }
                _ => return Ok(value),
            }
        }
    }

    fn factor(&mut self) -> Result<f64, String> {
        self.skip_whitespace();
        match self.input.get(self.pos) {
            Some(b'-') => {
                self.pos += 1;
                Ok(-self.factor()?)
            }
            Some(b'(') => {
                self.pos += 1;
                let value = self.expr()?;
                self.skip_whitespace();
                if self.input.get(self.pos) != Some(&b')') {
                    return Err("missing closing parenthesis".into());
                }
                self.pos += 1;
                Ok(value)
            }
            Some(c) if c.is_ascii_digit() || *c == b'.' => self.number(),
            Some(c) => Err(format!("unexpected character '{}'", *c as char)),
            None => Err("unexpected end of expression".into()),
        }
    }

    fn number(&mut self) -> Result<f64, String> {
        let start = self.pos;
        while self
            .input
            .get(self.pos)
            .is_some_and(|c| c.is_ascii_digit() || *c == b'.')
        {
            self.pos += 1;
        }
        let text = std::str::from_utf8(&self.input[start..self.pos]).expect("ascii digits");
        text.parse::<f64>()
            .map_err(|_| format!("invalid number '{text}'"))
    }

    fn peek_op(&mut self) -> Option<u8> {
        self.skip_whitespace();
        self.input.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while self
            .input
            .get(self.pos)
            .is_some_and(|c| c.is_ascii_whitespace())
        {
            self.pos += 1;
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn remainder(&self) -> &str {
        std::str::from_utf8(&self.input[self.pos..]).unwrap_or("<non-utf8>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_arithmetic() {
        assert_eq!(evaluate("2 + 2").unwrap(), 4.0);
        assert_eq!(evaluate("10 - 3 - 2").unwrap(), 5.0);
        assert_eq!(evaluate("6 * 7").unwrap(), 42.0);
        assert_eq!(evaluate("9 / 2").unwrap(), 4.5);
        assert_eq!(evaluate("10 % 3").unwrap(), 1.0);
    }

    #[test]
    fn precedence_and_parens() {
        assert_eq!(evaluate("2 + 3 * 4").unwrap(), 14.0);
        assert_eq!(evaluate("(2 + 3) * 4").unwrap(), 20.0);
        assert_eq!(evaluate("((1))").unwrap(), 1.0);
    }

    #[test]
    fn unary_negation() {
        assert_eq!(evaluate("-5 + 3").unwrap(), -2.0);
        assert_eq!(evaluate("2 * -3").unwrap(), -6.0);
        assert_eq!(evaluate("--4").unwrap(), 4.0);
    }

    #[test]
    fn decimals() {
        assert_eq!(evaluate("0.1 + 0.2").unwrap(), 0.1 + 0.2);
        assert_eq!(evaluate(".5 * 4").unwrap(), 2.0);
    }

    #[test]
    fn division_by_zero_rejected() {
        assert!(evaluate("1 / 0").is_err());
        assert!(evaluate("1 % 0").is_err());
    }

    #[test]
    fn malformed_expressions_rejected() {
        assert!(evaluate("").is_err());
        assert!(evaluate("2 +").is_err());
        assert!(evaluate("(2 + 3").is_err());
        assert!(evaluate("2 2").is_err());
        assert!(evaluate("hello").is_err());
        assert!(evaluate("1.2.3").is_err());
    }

    #[tokio::test]
    async fn invoke_with_expression_argument() {
        let output = CalculatorTool
            .invoke(serde_json::json!({"expression": "(2 + 3) * 4"}))
            .await
            .unwrap();
        assert_eq!(output, "20");
    }

    #[tokio::test]
    async fn invoke_accepts_inline_input_fallback() {
        let output = CalculatorTool
            .invoke(serde_json::json!({"input": "2+2"}))
            .await
            .unwrap();
        assert_eq!(output, "4");
    }

    #[tokio::test]
    async fn invoke_formats_fractions() {
        let output = CalculatorTool
            .invoke(serde_json::json!({"expression": "9 / 2"}))
            .await
            .unwrap();
        assert_eq!(output, "4.5");
    }

    #[tokio::test]
    async fn invoke_without_expression_fails() {
        let err = CalculatorTool
            .invoke(serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("expression"));
    }
}
