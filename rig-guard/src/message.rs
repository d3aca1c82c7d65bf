//! Role-tagged chat messages and prompt placeholders.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

#[allow(clippy::expect_used)]
static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(\w+)\}").expect("valid placeholder regex"));

/// Author of a [`Message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions for the model.
    System,
    /// Caller input.
    User,
    /// Model output.
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        })
    }
}

/// One chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Who wrote it.
    pub role: Role,
    /// Text content.
    pub content: String,
    /// Free-form caller metadata. Never sent to the model.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub meta: Map<String, Value>,
}

impl Message {
    /// Creates a message with empty metadata.
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            meta: Map::new(),
        }
    }

    /// Creates a message whose content is `lines` joined with `\n`.
    #[must_use]
    pub fn from_lines<I, S>(role: Role, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let content = lines
            .into_iter()
            .map(|line| line.as_ref().to_string())
            .collect::<Vec<_>>()
            .join("\n");
        Self::new(role, content)
    }

    /// System message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// User message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Assistant message.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Attaches one metadata entry.
    #[must_use]
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    /// `{word}` placeholder names in order of appearance, repeats included.
    #[must_use]
    pub fn variables(&self) -> Vec<String> {
        PLACEHOLDER
            .captures_iter(&self.content)
            .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
            .collect()
    }

    /// Returns a new message with every provided placeholder replaced.
    ///
    /// Replacement is a single pass, so substituted values are never
    /// themselves expanded. Placeholders without a value are left verbatim.
    #[must_use]
    pub fn render<K, V>(&self, vars: &HashMap<K, V>) -> Self
    where
        K: std::borrow::Borrow<str> + std::hash::Hash + Eq,
        V: AsRef<str>,
    {
        let content = PLACEHOLDER.replace_all(&self.content, |caps: &Captures<'_>| {
            let whole = caps.get(0).map_or("", |m| m.as_str());
            caps.get(1)
                .and_then(|name| vars.get(name.as_str()))
                .map_or_else(|| whole.to_string(), |value| value.as_ref().to_string())
        });

        Self {
            role: self.role,
            content: content.into_owned(),
            meta: self.meta.clone(),
        }
    }
}

impl From<Message> for rig::completion::Message {
    /// System messages have no rig message form and become user messages;
    /// transports lift them into the preamble before converting.
    fn from(message: Message) -> Self {
        match message.role {
            Role::Assistant => Self::assistant(message.content),
            Role::System | Role::User => Self::user(message.content),
        }
    }
}

/// Caller input for a turn: a bare string or one or more messages.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatInput(Vec<Message>);

impl ChatInput {
    /// The normalized message list.
    #[must_use]
    pub fn into_messages(self) -> Vec<Message> {
        self.0
    }

    /// Borrow the message list.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.0
    }
}

impl From<&str> for ChatInput {
    fn from(text: &str) -> Self {
        Self(vec![Message::user(text)])
    }
}

impl From<String> for ChatInput {
    fn from(text: String) -> Self {
        Self(vec![Message::user(text)])
    }
}

impl From<Message> for ChatInput {
    fn from(message: Message) -> Self {
        Self(vec![message])
    }
}

impl From<Vec<Message>> for ChatInput {
    fn from(messages: Vec<Message>) -> Self {
        Self(messages)
    }
}

impl From<&[Message]> for ChatInput {
    fn from(messages: &[Message]) -> Self {
        Self(messages.to_vec())
    }
}
