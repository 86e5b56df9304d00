//! Message and History domain types.
//!
//! These are the core value objects that flow through the entire system:
//! the user sends a message → the orchestration loop drives the model →
//! the assistant reply lands back in History.

use serde::{Deserialize, Serialize};

/// The role of a message sender in a conversation.
///
/// A closed set — the wire protocol knows exactly these three. Tool
/// results travel as synthetic user messages, not as a separate role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions (identity, rules, tool catalogue)
    System,
    /// The end user
    User,
    /// The AI assistant
    Assistant,
}

/// A single message in a conversation.
///
/// Immutable once created; a message's identity is its position in
/// [`History`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Who sent this message
    pub role: Role,

    /// The text content
    pub content: String,

    /// Ask the provider not to run its built-in web search for this
    /// message. Passed through to the wire body verbatim.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub disable_search: bool,
}

impl Message {
    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
            disable_search: false,
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            disable_search: false,
        }
    }

    /// Create a user message with provider-side search disabled.
    pub fn user_no_search(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            disable_search: true,
        }
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            disable_search: false,
        }
    }
}

/// The ordered record of a conversation.
///
/// Insertion order is the conversation order and is replayed verbatim to
/// the model on every request. When history mode is enabled, index 0 is
/// always the current system prompt — it may be rewritten in place (e.g.
/// when the tool catalogue changes) but never reordered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History {
    messages: Vec<Message>,
}

impl History {
    /// Create a new empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a history seeded with a system prompt at index 0.
    pub fn with_system_prompt(content: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(content)],
        }
    }

    /// Append a message.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Borrow the ordered messages.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The most recently appended message, if any.
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// A defensive copy of the ordered messages. Callers get their own
    /// `Vec` — mutating it cannot invalidate the index-0 invariant.
    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.clone()
    }

    /// Drop everything, optionally re-seeding with a single message.
    pub fn reset(&mut self, seed: Option<Message>) {
        self.messages.clear();
        if let Some(message) = seed {
            self.messages.push(message);
        }
    }

    /// The current system prompt (content of index 0), if present.
    pub fn system_prompt(&self) -> Option<&str> {
        match self.messages.first() {
            Some(m) if m.role == Role::System => Some(&m.content),
            _ => None,
        }
    }

    /// Rewrite the system prompt in place, or insert it at index 0 if the
    /// history has none yet. Never reorders existing messages.
    pub fn set_system_prompt(&mut self, content: impl Into<String>) {
        let prompt = Message::system(content);
        match self.messages.first() {
            Some(m) if m.role == Role::System => self.messages[0] = prompt,
            _ => self.messages.insert(0, prompt),
        }
    }
}
