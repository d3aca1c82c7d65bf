//! The Response Orchestrator: one model turn from caller input to answer.
//!
//! | Operation | Returns | Extra steps |
//! |-----------|---------|-------------|
//! | [`chat`](ResponseOrchestrator::chat) | assistant [`Message`] | none |
//! | [`json`](ResponseOrchestrator::json) | `serde_json::Value` | schema prompt, extraction, advisory validation |
//! | [`json_typed`](ResponseOrchestrator::json_typed) | `T` | as `json`, then deserialization |
//! | [`tools`](ResponseOrchestrator::tools) | `Vec<ToolOutcome>` | tool-selection prompt, extraction, strict validation, dispatch |
//!
//! Every call owns a fresh [`RedactionSession`]; sessions are never shared
//! between calls.

use crate::config::ClientConfig;
use crate::errors::Error;
use crate::message::{ChatInput, Message, Role};
use crate::tools::{Tool, ToolOutcome, ToolSelection, tool_selection_prompt, tool_selection_schema};
use crate::transport::{FlatTransport, Provider, StructuredTransport};
use futures::StreamExt;
use rig_guard_redact::RedactionSession;
use rig_guard_structured::{SchemaDescriptor, Shape, StructuredSchema, extract};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Callback fired with every raw (not yet refilled) answer fragment.
pub type TokenCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Per-call options.
#[derive(Clone, Default)]
pub struct ChatOptions {
    /// Model for this call (None = client default, then transport default).
    pub model: Option<String>,
    /// Fragment callback.
    pub on_token: Option<TokenCallback>,
    /// Redact outbound content and refill the answer.
    pub redact: bool,
    /// Expected answer shape. Required by [`ResponseOrchestrator::json`].
    pub schema: Option<SchemaDescriptor>,
}

impl ChatOptions {
    /// Options with every field unset.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the model for this call.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Registers a callback fired once per streamed fragment.
    #[must_use]
    pub fn on_token<F>(mut self, callback: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.on_token = Some(Arc::new(callback));
        self
    }

    /// Turns reversible redaction on or off.
    #[must_use]
    pub const fn with_redaction(mut self, redact: bool) -> Self {
        self.redact = redact;
        self
    }

    /// Sets the expected answer schema.
    #[must_use]
    pub fn with_schema(mut self, schema: SchemaDescriptor) -> Self {
        self.schema = Some(schema);
        self
    }
}

impl fmt::Debug for ChatOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatOptions")
            .field("model", &self.model)
            .field("on_token", &self.on_token.is_some())
            .field("redact", &self.redact)
            .field("schema", &self.schema)
            .finish()
    }
}

/// Metrics for one streamed turn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnMetrics {
    /// Non-empty fragments received.
    pub fragments: usize,
    /// Characters in the assembled (pre-refill) answer.
    pub chars: usize,
    /// Estimated output tokens.
    pub estimated_tokens: usize,
    /// Wall-clock time from opening the stream to its end.
    pub wall_time: Duration,
}

/// Estimate token count from text using the 4-chars-per-token heuristic.
///
/// Counts chars, not bytes, and rounds up.
///
/// ```
/// use rig_guard::orchestrator::estimate_tokens;
///
/// assert_eq!(estimate_tokens("hello"), 2);
/// assert_eq!(estimate_tokens("hello world"), 3);
/// ```
#[must_use]
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

/// Drives chat, JSON and tool-selection turns against one provider.
#[derive(Debug, Clone)]
pub struct ResponseOrchestrator {
    provider: Provider,
    config: ClientConfig,
}

impl ResponseOrchestrator {
    /// Orchestrator with the default [`ClientConfig`].
    #[must_use]
    pub fn new(provider: Provider) -> Self {
        Self {
            provider,
            config: ClientConfig::default(),
        }
    }

    /// Orchestrator over a role-structured provider.
    #[must_use]
    pub fn structured(transport: impl StructuredTransport + 'static) -> Self {
        Self::new(Provider::Structured(Arc::new(transport)))
    }

    /// Orchestrator over a flat-prompt provider.
    #[must_use]
    pub fn flat(transport: impl FlatTransport + 'static) -> Self {
        Self::new(Provider::Flat(Arc::new(transport)))
    }

    /// Replaces the client configuration.
    #[must_use]
    pub fn with_config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// The wrapped provider.
    #[must_use]
    pub const fn provider(&self) -> &Provider {
        &self.provider
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Runs a plain chat turn.
    ///
    /// A bare string becomes one user message. With `options.schema` set the
    /// two JSON instruction messages are prepended, but the answer is
    /// returned as text.
    ///
    /// # Errors
    ///
    /// `StreamFailure` if the transport fails, `GenerationCollision` if
    /// redaction cannot mint a unique mock value.
    pub async fn chat(
        &self,
        input: impl Into<ChatInput>,
        options: ChatOptions,
    ) -> Result<Message, Error> {
        let (answer, _) = self.run_turn(input.into().into_messages(), &options).await?;
        Ok(answer)
    }

    /// Runs a JSON-typed turn and returns the first recoverable JSON value.
    ///
    /// Schema validation of the result is advisory: a parseable but
    /// non-conforming value is logged and still returned.
    ///
    /// # Errors
    ///
    /// `MissingSchema` without `options.schema`, `ExtractionFailed` when no
    /// JSON of the schema's shape can be recovered, plus everything
    /// [`chat`](Self::chat) returns.
    pub async fn json(
        &self,
        input: impl Into<ChatInput>,
        options: ChatOptions,
    ) -> Result<Value, Error> {
        let schema = options.schema.clone().ok_or(Error::MissingSchema)?;
        let answer = self.chat(input, options).await?;
        let shape = schema.kind();

        let Some(value) = extract(&answer.content, shape) else {
            tracing::warn!(
                target: "rig_guard",
                event = "extraction_failed",
                shape = %shape,
                chars = answer.content.chars().count(),
                "No JSON recovered from answer"
            );
            return Err(Error::ExtractionFailed {
                shape,
                reason: format!("no parseable JSON {shape} in the response"),
            });
        };

        let outcome = schema.validate(&value);
        if !outcome.valid {
            tracing::warn!(
                target: "rig_guard",
                event = "advisory_validation_failed",
                shape = %shape,
                "Recovered JSON does not match the schema"
            );
        }

        Ok(value)
    }

    /// Runs a JSON-typed turn and deserializes the result into `T`.
    ///
    /// When `options.schema` is unset the schema is derived from `T`.
    ///
    /// # Errors
    ///
    /// As [`json`](Self::json); a value that does not deserialize into `T` is
    /// reported as `ExtractionFailed`.
    pub async fn json_typed<T>(
        &self,
        input: impl Into<ChatInput>,
        mut options: ChatOptions,
    ) -> Result<T, Error>
    where
        T: JsonSchema + DeserializeOwned,
    {
        if options.schema.is_none() {
            options.schema = Some(SchemaDescriptor::for_type::<T>()?);
        }
        let shape = options.schema.as_ref().map_or(Shape::Object, StructuredSchema::kind);

        let value = self.json(input, options).await?;
        serde_json::from_value(value).map_err(|e| Error::ExtractionFailed {
            shape,
            reason: format!("Deserialization to target type failed: {e}"),
        })
    }

    /// Runs a tool-selection turn with default options.
    ///
    /// # Errors
    ///
    /// See [`tools_with_options`](Self::tools_with_options).
    pub async fn tools(
        &self,
        tools: &[Tool],
        input: impl Into<ChatInput>,
    ) -> Result<Vec<ToolOutcome>, Error> {
        self.tools_with_options(tools, input, ChatOptions::default())
            .await
    }

    /// Asks the model which tools to run, validates the selection and runs
    /// the matching tools sequentially in selection order.
    ///
    /// Entries naming an unregistered tool are skipped. `options.schema` is
    /// ignored.
    ///
    /// # Errors
    ///
    /// `InvalidToolSelection` if no array can be recovered or it fails the
    /// tool-selection schema (no tool runs in that case), `Tool` for the first
    /// failing callback (later tools do not run), plus everything
    /// [`chat`](Self::chat) returns.
    pub async fn tools_with_options(
        &self,
        tools: &[Tool],
        input: impl Into<ChatInput>,
        mut options: ChatOptions,
    ) -> Result<Vec<ToolOutcome>, Error> {
        options.schema = None;
        let schema = tool_selection_schema()?;

        let mut messages = vec![tool_selection_prompt(tools, &schema)];
        messages.extend(input.into().into_messages());
        let (answer, _) = self.run_turn(messages, &options).await?;

        let value = extract(&answer.content, Shape::Array).ok_or_else(|| {
            tracing::warn!(
                target: "rig_guard",
                event = "invalid_tool_selection",
                reason = "no_array",
                "No tool selection recovered from answer"
            );
            Error::InvalidToolSelection("no JSON array found in the response".to_string())
        })?;

        let outcome = schema.validate(&value);
        if !outcome.valid {
            tracing::warn!(
                target: "rig_guard",
                event = "invalid_tool_selection",
                reason = "schema",
                "Tool selection does not match the tool-selection schema"
            );
            return Err(Error::InvalidToolSelection(
                outcome.errors.unwrap_or_default(),
            ));
        }

        let selections: Vec<ToolSelection> = serde_json::from_value(value)
            .map_err(|e| Error::InvalidToolSelection(e.to_string()))?;

        let mut outcomes = Vec::with_capacity(selections.len());
        for selection in selections {
            let Some(tool) = tools.iter().find(|t| t.name() == selection.tool) else {
                tracing::info!(
                    target: "rig_guard",
                    event = "unregistered_tool_skipped",
                    tool = %selection.tool,
                    "Skipping unregistered tool"
                );
                continue;
            };

            tracing::debug!(
                target: "rig_guard",
                event = "tool_invoked",
                tool = %selection.tool,
                "Calling tool"
            );
            let result = tool
                .call(selection.props.clone())
                .await
                .map_err(|source| Error::Tool {
                    tool: selection.tool.clone(),
                    source,
                })?;

            outcomes.push(ToolOutcome {
                tool: selection.tool,
                props: selection.props,
                result,
            });
        }

        Ok(outcomes)
    }

    fn resolve_model<'a>(&'a self, options: &'a ChatOptions) -> &'a str {
        options
            .model
            .as_deref()
            .or(self.config.default_model.as_deref())
            .unwrap_or_else(|| self.provider.default_model())
    }

    /// One streamed turn: schema prompt, redaction, streaming, refill.
    async fn run_turn(
        &self,
        messages: Vec<Message>,
        options: &ChatOptions,
    ) -> Result<(Message, TurnMetrics), Error> {
        let mut outbound = options
            .schema
            .as_ref()
            .map(json_instructions)
            .unwrap_or_default();
        outbound.extend(messages);

        let mut session = options
            .redact
            .then(|| RedactionSession::with_config(self.config.redaction));
        if let Some(session) = session.as_mut() {
            for message in &mut outbound {
                message.content = session.redact(&message.content)?;
            }
            tracing::debug!(
                target: "rig_guard",
                event = "outbound_redacted",
                redactions = session.count(),
                messages = outbound.len(),
                "Redacted outbound messages"
            );
        }

        let model = self.resolve_model(options);
        let start = Instant::now();
        let mut stream = self
            .provider
            .open(&outbound, model)
            .await
            .map_err(Error::StreamFailure)?;

        tracing::debug!(
            target: "rig_guard",
            event = "transport_opened",
            provider = self.provider.kind(),
            model,
            "Streaming answer"
        );

        let mut answer = String::new();
        let mut metrics = TurnMetrics::default();
        while let Some(fragment) = stream.next().await {
            let fragment = fragment.map_err(Error::StreamFailure)?;
            if fragment.is_empty() {
                continue;
            }
            metrics.fragments += 1;
            if let Some(on_token) = &options.on_token {
                on_token(&fragment);
            }
            answer.push_str(&fragment);
        }

        metrics.chars = answer.chars().count();
        metrics.estimated_tokens = estimate_tokens(&answer);
        metrics.wall_time = start.elapsed();

        tracing::debug!(
            target: "rig_guard",
            event = "turn_completed",
            provider = self.provider.kind(),
            fragments = metrics.fragments,
            chars = metrics.chars,
            estimated_tokens = metrics.estimated_tokens,
            wall_time_ms = u64::try_from(metrics.wall_time.as_millis()).unwrap_or(u64::MAX),
            "Turn completed"
        );

        let content = match &session {
            Some(session) => session.refill(&answer),
            None => answer,
        };

        Ok((Message::new(Role::Assistant, content), metrics))
    }
}

/// The two system messages prepended to JSON-typed turns.
fn json_instructions(schema: &SchemaDescriptor) -> Vec<Message> {
    vec![
        Message::from_lines(
            Role::System,
            [
                "You are a helpful assistant that can answer questions and return data in JSON format.",
                "Output only JSON - MAKE SURE the JSON follows the provided JSON Schema exactly.",
            ],
        ),
        Message::system(format!(
            "Output JSON that follows this JSON SCHEMA: {schema}"
        )),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::ScriptedTransport;
    use serde_json::json;

    #[test]
    fn test_estimate_tokens() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
        assert_eq!(estimate_tokens("你好"), 1);
    }

    #[test]
    fn test_json_instructions() {
        let schema = SchemaDescriptor::new(json!({"type": "object"})).unwrap();
        let messages = json_instructions(&schema);
        assert_eq!(messages.len(), 2);
        assert!(messages.iter().all(|m| m.role == Role::System));
        assert_eq!(
            messages[1].content,
            r#"Output JSON that follows this JSON SCHEMA: {"type":"object"}"#
        );
    }

    #[test]
    fn test_model_resolution_order() {
        let orchestrator = ResponseOrchestrator::flat(ScriptedTransport::new(["x"]));
        let options = ChatOptions::new();
        assert_eq!(orchestrator.resolve_model(&options), "llama3.2");

        let orchestrator = orchestrator
            .with_config(ClientConfig::default().with_default_model("mistral"));
        assert_eq!(orchestrator.resolve_model(&options), "mistral");

        let options = options.with_model("qwen2.5");
        assert_eq!(orchestrator.resolve_model(&options), "qwen2.5");
    }

    #[tokio::test]
    async fn test_metrics_count_non_empty_fragments() {
        let orchestrator =
            ResponseOrchestrator::structured(ScriptedTransport::new(["ab", "", "cde"]));
        let (answer, metrics) = orchestrator
            .run_turn(vec![Message::user("hi")], &ChatOptions::new())
            .await
            .unwrap();

        assert_eq!(answer.content, "abcde");
        assert_eq!(metrics.fragments, 2);
        assert_eq!(metrics.chars, 5);
        assert_eq!(metrics.estimated_tokens, 2);
    }
}
