//! `get_time`, `calculate`, `list_tools`, `get_weather` — the `SAFE_TOOLS`
//! set (spec section 3): no capability access, always callable regardless
//! of an agent's tool allow-list.

use serde::Deserialize;
use serde_json::{Value, json};

use crate::ctx::ToolCtx;
use crate::registry::{ToolError, ToolExecutor, ToolFut};

#[derive(Debug, Default)]
pub struct GetTimeTool;

impl ToolExecutor for GetTimeTool {
    fn name(&self) -> &'static str {
        "get_time"
    }

    fn description(&self) -> &'static str {
        "Return the current unix timestamp."
    }

    fn schema(&self) -> Value {
        json!({"type": "object", "additionalProperties": false})
    }

    fn execute<'a>(&'a self, _args: Value, ctx: &'a ToolCtx<'a>) -> ToolFut<'a> {
        Box::pin(async move { Ok(json!({"unix_ts": ctx.now_unix})) })
    }
}

#[derive(Debug, Default)]
pub struct CalculateTool;

#[derive(Debug, Deserialize)]
struct CalculateArgs {
    expression: String,
}

impl ToolExecutor for CalculateTool {
    fn name(&self) -> &'static str {
        "calculate"
    }

    fn description(&self) -> &'static str {
        "Evaluate a basic arithmetic expression (+, -, *, /, parentheses)."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {"expression": {"type": "string", "minLength": 1}},
            "required": ["expression"],
            "additionalProperties": false
        })
    }

    fn execute<'a>(&'a self, args: Value, _ctx: &'a ToolCtx<'a>) -> ToolFut<'a> {
        Box::pin(async move {
            let typed: CalculateArgs = serde_json::from_value(args)
                .map_err(|e| ToolError::BadArgs { message: e.to_string() })?;
            let value = eval_expression(&typed.expression).map_err(|message| ToolError::BadArgs { message })?;
            Ok(json!({"result": value}))
        })
    }
}

#[derive(Debug, Default)]
pub struct ListToolsTool;

impl ToolExecutor for ListToolsTool {
    fn name(&self) -> &'static str {
        "list_tools"
    }

    fn description(&self) -> &'static str {
        "List the tools visible to the calling agent."
    }

    fn schema(&self) -> Value {
        json!({"type": "object", "additionalProperties": false})
    }

    fn execute<'a>(&'a self, _args: Value, ctx: &'a ToolCtx<'a>) -> ToolFut<'a> {
        Box::pin(async move { Ok(serde_json::to_value(&ctx.visible_tools).expect("tool definitions serialize")) })
    }
}

#[derive(Debug, Default)]
pub struct GetWeatherTool;

#[derive(Debug, Deserialize)]
struct GetWeatherArgs {
    location: String,
}

/// No weather data source is named anywhere in this crate; a `SAFE_TOOLS`
/// member must still exist and stay side-effect-free, so this reports that
/// no provider is configured rather than silently fabricating a forecast.
/// Unlike `read_url`, it does not go through `ctx.fetch` at all.
impl ToolExecutor for GetWeatherTool {
    fn name(&self) -> &'static str {
        "get_weather"
    }

    fn description(&self) -> &'static str {
        "Report current weather for a location. No provider is configured in this build."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {"location": {"type": "string", "minLength": 1}},
            "required": ["location"],
            "additionalProperties": false
        })
    }

    fn execute<'a>(&'a self, args: Value, _ctx: &'a ToolCtx<'a>) -> ToolFut<'a> {
        Box::pin(async move {
            let typed: GetWeatherArgs = serde_json::from_value(args)
                .map_err(|e| ToolError::BadArgs { message: e.to_string() })?;
            Err(ToolError::ExecutionFailed {
                tool: "get_weather".to_string(),
                message: format!("no weather provider configured for `{}`", typed.location),
            })
        })
    }
}

/// Recursive-descent evaluator over `+ - * / ( )` and signed floats. No
/// variables, no functions: just enough to back a `SAFE_TOOLS` calculator.
fn eval_expression(expr: &str) -> Result<f64, String> {
    let tokens = tokenize(expr)?;
    let mut parser = Parser { tokens: &tokens, pos: 0 };
    let value = parser.parse_expr()?;
    if parser.pos != parser.tokens.len() {
        return Err("unexpected trailing input".to_string());
    }
    Ok(value)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Num(f64),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

fn tokenize(expr: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = expr.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' => i += 1,
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            '/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                let num = text.parse::<f64>().map_err(|_| format!("invalid number `{text}`"))?;
                tokens.push(Token::Num(num));
            }
            other => return Err(format!("unexpected character `{other}`")),
        }
    }
    Ok(tokens)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl Parser<'_> {
    fn parse_expr(&mut self) -> Result<f64, String> {
        let mut value = self.parse_term()?;
        loop {
            match self.tokens.get(self.pos) {
                Some(Token::Plus) => {
                    self.pos += 1;
                    value += self.parse_term()?;
                }
                Some(Token::Minus) => {
                    self.pos += 1;
                    value -= self.parse_term()?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn parse_term(&mut self) -> Result<f64, String> {
        let mut value = self.parse_factor()?;
        loop {
            match self.tokens.get(self.pos) {
                Some(Token::Star) => {
                    self.pos += 1;
                    value *= self.parse_factor()?;
                }
                Some(Token::Slash) => {
                    self.pos += 1;
                    let divisor = self.parse_factor()?;
                    if divisor == 0.0 {
                        return Err("division by zero".to_string());
                    }
                    value /= divisor;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn parse_factor(&mut self) -> Result<f64, String> {
        match self.tokens.get(self.pos) {
            Some(Token::Minus) => {
                self.pos += 1;
                Ok(-self.parse_factor()?)
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.parse_factor()
            }
            Some(Token::Num(n)) => {
                self.pos += 1;
                Ok(*n)
            }
            Some(Token::LParen) => {
                self.pos += 1;
                let value = self.parse_expr()?;
                match self.tokens.get(self.pos) {
                    Some(Token::RParen) => {
                        self.pos += 1;
                        Ok(value)
                    }
                    _ => Err("expected closing parenthesis".to_string()),
                }
            }
            _ => Err("expected a number or `(`".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluates_operator_precedence() {
        assert_eq!(eval_expression("2 + 3 * 4").unwrap(), 14.0);
    }

    #[test]
    fn evaluates_parentheses() {
        assert_eq!(eval_expression("(2 + 3) * 4").unwrap(), 20.0);
    }

    #[test]
    fn rejects_division_by_zero() {
        assert!(eval_expression("1 / 0").is_err());
    }
}
