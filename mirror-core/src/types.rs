//! Core types: conversation and session identifiers, message roles, messages and snapshots.

use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Milliseconds since the Unix epoch, used as the producer-assigned message timestamp.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Who produced a message: the person typing or the scripted mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Mirror,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Mirror => "mirror",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "mirror" => Ok(Role::Mirror),
            other => Err(StoreError::InvalidMessage(format!("unknown role: {}", other))),
        }
    }
}

/// Opaque conversation identifier. Maps to the store namespace `chats/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(String);

impl ConversationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Store-level namespace for this conversation.
    pub fn path(&self) -> String {
        format!("chats/{}", self.0)
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Client-side user/session identifier. Generated as `user_<n>` when none is configured.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub const PREFIX: &'static str = "user_";
    pub const SUFFIX_RANGE: u32 = 1_000_000;

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Random numeric suffix in `0..1_000_000`.
    pub fn generate() -> Self {
        let n = rand::thread_rng().gen_range(0..Self::SUFFIX_RANGE);
        Self(format!("{}{}", Self::PREFIX, n))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Each session owns exactly one conversation, keyed by the session id.
    pub fn conversation(&self) -> ConversationId {
        ConversationId::new(self.0.clone())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A stored utterance. Immutable once the store has assigned its `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub content: String,
    /// Milliseconds since epoch, assigned by the producer at send time.
    pub timestamp: i64,
}

/// A message about to be appended; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMessage {
    pub role: Role,
    pub content: String,
    pub timestamp: i64,
}

impl NewMessage {
    pub fn new(role: Role, content: impl Into<String>, timestamp: i64) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp,
        }
    }

    /// User message stamped with the current time.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content, now_millis())
    }

    /// Mirror reply stamped with the current time.
    pub fn mirror(content: impl Into<String>) -> Self {
        Self::new(Role::Mirror, content, now_millis())
    }

    /// Rejects empty or whitespace-only content.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.content.trim().is_empty() {
            return Err(StoreError::InvalidMessage(format!(
                "{} message has empty content",
                self.role
            )));
        }
        Ok(())
    }

    pub fn into_message(self, id: impl Into<String>) -> Message {
        Message {
            id: id.into(),
            role: self.role,
            content: self.content,
            timestamp: self.timestamp,
        }
    }
}

/// One snapshot of the most recent messages of a conversation, in whatever order the store delivered them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageList(Vec<Message>);

impl MessageList {
    pub fn new(messages: Vec<Message>) -> Self {
        Self(messages)
    }

    /// Stable sort by `timestamp`; equal timestamps keep delivery order.
    pub fn sort_by_timestamp(&mut self) {
        self.0.sort_by_key(|m| m.timestamp);
    }

    pub fn into_sorted(mut self) -> Self {
        self.sort_by_timestamp();
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Message] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<Message> {
        self.0
    }
}

impl From<Vec<Message>> for MessageList {
    fn from(messages: Vec<Message>) -> Self {
        Self(messages)
    }
}

impl IntoIterator for MessageList {
    type Item = Message;
    type IntoIter = std::vec::IntoIter<Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a MessageList {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
