//! Tool descriptors for tool-selection turns.

use crate::errors::ToolError;
use crate::message::{Message, Role};
use futures::future::BoxFuture;
use rig_guard_structured::{SchemaDescriptor, SchemaError};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Future returned by a tool callback.
pub type ToolFuture = BoxFuture<'static, Result<Value, ToolError>>;

/// Async callback invoked with the arguments the model selected.
pub type ToolCallback = Arc<dyn Fn(Map<String, Value>) -> ToolFuture + Send + Sync>;

/// A callable tool the model may select.
#[derive(Clone)]
pub struct Tool {
    name: String,
    description: String,
    props: Vec<String>,
    callback: ToolCallback,
}

impl Tool {
    /// Registers an async callback under `name`.
    ///
    /// `props` lists the argument names shown to the model.
    pub fn new<F, Fut>(
        name: impl Into<String>,
        description: impl Into<String>,
        props: impl IntoIterator<Item = impl Into<String>>,
        callback: F,
    ) -> Self
    where
        F: Fn(Map<String, Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, ToolError>> + Send + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            props: props.into_iter().map(Into::into).collect(),
            callback: Arc::new(move |args| -> ToolFuture { Box::pin(callback(args)) }),
        }
    }

    /// Wraps a Rig tool. Name, description and argument names come from its
    /// [`ToolDefinition`](rig::completion::ToolDefinition).
    pub async fn from_rig<T>(tool: T) -> Self
    where
        T: rig::tool::Tool + 'static,
    {
        let definition = tool.definition(String::new()).await;
        let props: Vec<String> = definition
            .parameters
            .get("properties")
            .and_then(Value::as_object)
            .map(|properties| properties.keys().cloned().collect())
            .unwrap_or_default();

        let tool = Arc::new(tool);
        let callback: ToolCallback = Arc::new(move |args: Map<String, Value>| -> ToolFuture {
            let tool = Arc::clone(&tool);
            Box::pin(async move {
                let args: T::Args = serde_json::from_value(Value::Object(args))
                    .map_err(|e| ToolError::InvalidArgs(e.to_string()))?;
                let output = tool
                    .call(args)
                    .await
                    .map_err(|e| ToolError::Execution(e.to_string()))?;
                serde_json::to_value(output).map_err(|e| ToolError::Execution(e.to_string()))
            })
        });

        Self {
            name: definition.name,
            description: definition.description,
            props,
            callback,
        }
    }

    /// Built-in arithmetic tool named `calculator`.
    ///
    /// Evaluates `+ - * / %`, parentheses, unary minus and decimals.
    /// Integral results come back as JSON integers.
    #[must_use]
    pub fn calculator() -> Self {
        Self::new(
            "calculator",
            "Calculate the result of an arithmetic expression - pass in the expression as a string",
            ["expression"],
            |args: Map<String, Value>| async move {
                let expression = args
                    .get("expression")
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        ToolError::InvalidArgs("expected a string 'expression'".to_string())
                    })?;
                let result = evaluate(expression).map_err(ToolError::Execution)?;
                number_value(result)
            },
        )
    }

    /// Name the model selects the tool by.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Description shown to the model.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Argument names shown to the model.
    #[must_use]
    pub fn props(&self) -> &[String] {
        &self.props
    }

    /// Line embedded in the tool-selection prompt:
    /// `name: description - props a, b`.
    #[must_use]
    pub fn as_prompt_line(&self) -> String {
        format!(
            "{}: {} - props {}",
            self.name,
            self.description,
            self.props.join(", ")
        )
    }

    /// Runs the callback.
    pub async fn call(&self, args: Map<String, Value>) -> Result<Value, ToolError> {
        (self.callback)(args).await
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_prompt_line())
    }
}

impl fmt::Debug for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("props", &self.props)
            .finish_non_exhaustive()
    }
}

/// One entry of the model's tool selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ToolSelection {
    /// Name of the tool to run.
    pub tool: String,
    /// Optional restatement of what the tool does.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Arguments for the tool.
    pub props: Map<String, Value>,
}

/// Result of one dispatched tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutcome {
    /// Tool name.
    pub tool: String,
    /// Arguments it was called with.
    pub props: Map<String, Value>,
    /// Callback result.
    pub result: Value,
}

/// Schema every tool-selection answer must satisfy: an array of
/// `{tool, description?, props}` objects.
pub fn tool_selection_schema() -> Result<SchemaDescriptor, SchemaError> {
    SchemaDescriptor::for_type::<Vec<ToolSelection>>()
}

/// System message listing every registered tool and the selection schema.
#[must_use]
pub fn tool_selection_prompt(tools: &[Tool], schema: &SchemaDescriptor) -> Message {
    let listing = tools
        .iter()
        .map(|tool| format!("   - {}", tool.as_prompt_line()))
        .collect::<Vec<_>>()
        .join("\n");

    Message::from_lines(
        Role::System,
        [
            "You are a tool extraction AI. You only output JSON as a list of tools. \
             You are given a list of tools and a user prompt, and need to determine \
             which tools to use to answer the question."
                .to_string(),
            "Here are the list of available tools:".to_string(),
            listing,
            format!(
                "Please! Output which relevant tools (if any) should be used in the JSON \
                 format following the provided JSON SCHEMA EXACTLY: {schema}"
            ),
            "JSON examples based on the above JSON Schema: ".to_string(),
            r#"[{"tool": "toolName1", "props": {"propName": "propValue"}}, {"tool": "toolName2", "props": {"propName": "propValue"}}]"#
                .to_string(),
        ],
    )
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn number_value(result: f64) -> Result<Value, ToolError> {
    if result.fract() == 0.0 && result.abs() < i64::MAX as f64 {
        return Ok(Value::from(result as i64));
    }
    Number::from_f64(result)
        .map(Value::Number)
        .ok_or_else(|| ToolError::Execution(format!("result is not a finite number: {result}")))
}

/// Evaluates an arithmetic expression.
fn evaluate(expression: &str) -> Result<f64, String> {
    let mut parser = Parser {
        bytes: expression.as_bytes(),
        pos: 0,
    };
    let value = parser.expr()?;
    parser.skip_ws();
    if parser.pos < parser.bytes.len() {
        return Err(format!(
            "unexpected '{}' at position {}",
            char::from(parser.bytes[parser.pos]),
            parser.pos
        ));
    }
    Ok(value)
}

struct Parser<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl Parser<'_> {
    fn skip_ws(&mut self) {
        while self.bytes.get(self.pos).is_some_and(u8::is_ascii_whitespace) {
            self.pos += 1;
        }
    }

    fn peek(&mut self) -> Option<u8> {
        self.skip_ws();
        self.bytes.get(self.pos).copied()
    }

    fn expr(&mut self) -> Result<f64, String> {
        let mut value = self.term()?;
        while let Some(op @ (b'+' | b'-')) = self.peek() {
            self.pos += 1;
            let rhs = self.term()?;
            value = if op == b'+' { value + rhs } else { value - rhs };
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<f64, String> {
        let mut value = self.unary()?;
        while let Some(op @ (b'*' | b'/' | b'%')) = self.peek() {
            self.pos += 1;
            let rhs = self.unary()?;
            value = match op {
                b'*' => value * rhs,
                _ if rhs == 0.0 => return Err("division by zero".to_string()),
                b'/' => value / rhs,
                _ => value % rhs,
            };
        }
        Ok(value)
    }

    fn unary(&mut self) -> Result<f64, String> {
        match self.peek() {
            Some(b'-') => {
                self.pos += 1;
                Ok(-self.unary()?)
            }
            Some(b'+') => {
                self.pos += 1;
                self.unary()
            }
            _ => self.primary(),
        }
    }

    fn primary(&mut self) -> Result<f64, String> {
        match self.peek() {
            Some(b'(') => {
                self.pos += 1;
                let value = self.expr()?;
                if self.peek() != Some(b')') {
                    return Err(format!("expected ')' at position {}", self.pos));
                }
                self.pos += 1;
                Ok(value)
            }
            Some(c) if c.is_ascii_digit() || c == b'.' => {
                let start = self.pos;
                while self
                    .bytes
                    .get(self.pos)
                    .is_some_and(|b| b.is_ascii_digit() || *b == b'.')
                {
                    self.pos += 1;
                }
                let literal = std::str::from_utf8(&self.bytes[start..self.pos])
                    .map_err(|e| e.to_string())?;
                literal
                    .parse::<f64>()
                    .map_err(|_| format!("invalid number '{literal}'"))
            }
            Some(c) => Err(format!(
                "unexpected '{}' at position {}",
                char::from(c),
                self.pos
            )),
            None => Err("unexpected end of expression".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(expression: &str) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("expression".to_string(), json!(expression));
        map
    }

    #[test]
    fn test_evaluate() {
        assert_eq!(evaluate("2 + 2").unwrap(), 4.0);
        assert_eq!(evaluate("2 + 3 * 4").unwrap(), 14.0);
        assert_eq!(evaluate("(2 + 3) * 4").unwrap(), 20.0);
        assert_eq!(evaluate("-3 + 10 % 4").unwrap(), -1.0);
        assert_eq!(evaluate("1.5 * 2").unwrap(), 3.0);
        assert_eq!(evaluate("-(2 - 5)").unwrap(), 3.0);
        assert_eq!(evaluate("7 / 2").unwrap(), 3.5);
    }

    #[test]
    fn test_evaluate_errors() {
        assert!(evaluate("").is_err());
        assert!(evaluate("2 +").is_err());
        assert!(evaluate("(1 + 2").is_err());
        assert!(evaluate("1 / 0").unwrap_err().contains("division by zero"));
        assert!(evaluate("2 2").is_err());
        assert!(evaluate("process.exit()").is_err());
    }

    #[tokio::test]
    async fn test_calculator_integral_result() {
        let calc = Tool::calculator();
        assert_eq!(calc.call(args("2 + 2")).await.unwrap(), json!(4));
        assert_eq!(calc.call(args("7 / 2")).await.unwrap(), json!(3.5));
    }

    #[tokio::test]
    async fn test_calculator_bad_args() {
        let calc = Tool::calculator();
        let err = calc.call(Map::new()).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArgs(_)));
    }

    #[test]
    fn test_prompt_line() {
        let tool = Tool::new(
            "weather",
            "Look up the weather",
            ["city", "unit"],
            |_| async { Ok(Value::Null) },
        );
        assert_eq!(tool.as_prompt_line(), "weather: Look up the weather - props city, unit");
        assert_eq!(tool.to_string(), tool.as_prompt_line());
    }

    #[test]
    fn test_tool_selection_schema() {
        use rig_guard_structured::{Shape, StructuredSchema};

        let schema = tool_selection_schema().unwrap();
        assert_eq!(schema.kind(), Shape::Array);

        let ok = json!([
            {"tool": "calculator", "props": {"expression": "2 + 2"}},
            {"tool": "weather", "description": "look it up", "props": {}, "extra": true}
        ]);
        assert!(schema.validate(&ok).valid);

        let missing_props = json!([{"tool": "calculator"}]);
        assert!(!schema.validate(&missing_props).valid);

        let wrong_type = json!([{"tool": 7, "props": {}}]);
        assert!(!schema.validate(&wrong_type).valid);

        assert!(!schema.validate(&json!({"tool": "calculator", "props": {}})).valid);
    }

    #[test]
    fn test_tool_selection_prompt_lists_tools() {
        let schema = tool_selection_schema().unwrap();
        let prompt = tool_selection_prompt(&[Tool::calculator()], &schema);

        assert_eq!(prompt.role, Role::System);
        assert!(prompt.content.contains(
            "   - calculator: Calculate the result of an arithmetic expression - pass in the expression as a string - props expression"
        ));
        assert!(prompt.content.contains(&schema.to_string()));
    }

    #[test]
    fn test_outcome_serializes() {
        let outcome = ToolOutcome {
            tool: "calculator".to_string(),
            props: args("2 + 2"),
            result: json!(4),
        };
        assert_eq!(
            serde_json::to_value(outcome).unwrap(),
            json!({"tool": "calculator", "props": {"expression": "2 + 2"}, "result": 4})
        );
    }
}
