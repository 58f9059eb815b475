//! AI chat sessions
//!
//! A session pairs one user with one form. Assistant messages carry the
//! mutation tool calls the model proposed as raw JSON; the editor applies
//! them on request and records that it did so in `actions_applied`.

use chrono::{DateTime, Utc};
use form_model::FormId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate new random id
            #[inline]
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_id!(
    /// Chat session identifier
    ChatSessionId
);
uuid_id!(
    /// Chat message identifier
    MessageId
);

/// Authenticated user identifier (issued by the auth provider)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity on whose behalf an operation runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: UserId,
}

impl Caller {
    #[inline]
    #[must_use]
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: UserId::new(user_id),
        }
    }
}

/// Author of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One message in a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: MessageId,
    pub role: ChatRole,
    pub content: String,
    /// Raw mutation tool calls (assistant messages only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<Value>,
    #[serde(default)]
    pub actions_applied: bool,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    fn new(role: ChatRole, content: String, tool_calls: Vec<Value>) -> Self {
        Self {
            id: MessageId::new(),
            role,
            content,
            tool_calls,
            actions_applied: false,
            created_at: Utc::now(),
        }
    }

    /// True for assistant messages with unapplied tool calls
    #[inline]
    #[must_use]
    pub fn has_pending_actions(&self) -> bool {
        self.role == ChatRole::Assistant && !self.actions_applied && !self.tool_calls.is_empty()
    }
}

/// Conversation between one user and the assistant about one form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: ChatSessionId,
    pub user_id: UserId,
    pub form_id: FormId,
    pub messages: Vec<ChatMessage>,
    pub created_at: DateTime<Utc>,
}

impl ChatSession {
    /// Empty session for `user_id` on `form_id`
    #[must_use]
    pub fn new(user_id: UserId, form_id: FormId) -> Self {
        Self {
            id: ChatSessionId::new(),
            user_id,
            form_id,
            messages: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Append a user message
    pub fn push_user(&mut self, content: impl Into<String>) -> MessageId {
        self.push(ChatMessage::new(ChatRole::User, content.into(), Vec::new()))
    }

    /// Append an assistant message with its proposed tool calls
    pub fn push_assistant(&mut self, content: impl Into<String>, tool_calls: Vec<Value>) -> MessageId {
        self.push(ChatMessage::new(ChatRole::Assistant, content.into(), tool_calls))
    }

    #[must_use]
    pub fn message(&self, id: MessageId) -> Option<&ChatMessage> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn message_mut(&mut self, id: MessageId) -> Option<&mut ChatMessage> {
        self.messages.iter_mut().find(|m| m.id == id)
    }

    fn push(&mut self, message: ChatMessage) -> MessageId {
        let id = message.id;
        self.messages.push(message);
        id
    }
}
