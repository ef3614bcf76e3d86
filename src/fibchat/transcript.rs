//! Conversation transcript owned by the group chat.
//!
//! A [`Transcript`] is append-only. Messages are never edited or removed one by one; the
//! whole transcript is cleared between user questions when automatic reset is enabled.

use chrono::{DateTime, Utc};

/// Who produced a [`ChatMessage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorRole {
    User,
    Agent,
}

/// A single entry in the transcript.
///
/// ```
/// use fibchat::transcript::{AuthorRole, ChatMessage};
///
/// let question = ChatMessage::user("Generate 5 Fibonacci numbers");
/// assert_eq!(question.role, AuthorRole::User);
/// assert!(question.author.is_none());
///
/// let reply = ChatMessage::agent("FibonacciGenerator", "0, 1, 1, 2, 3");
/// assert_eq!(reply.author.as_deref(), Some("FibonacciGenerator"));
/// ```
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: AuthorRole,
    /// Agent name. Always `None` for user messages.
    pub author: Option<String>,
    pub content: String,
    /// UTC timestamp recorded when the message was created.
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: AuthorRole::User,
            author: None,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn agent(author: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: AuthorRole::Agent,
            author: Some(author.into()),
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn is_agent(&self) -> bool {
        self.role == AuthorRole::Agent
    }
}

/// Ordered message history for one exchange (or the whole session without auto reset).
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Agent-authored messages in transcript order.
    pub fn agent_messages(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter().filter(|m| m.is_agent())
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn reset(&mut self) {
        self.messages.clear();
    }
}
