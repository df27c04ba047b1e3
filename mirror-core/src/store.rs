//! Conversation store abstraction: append-only ordered log per conversation with live last-N snapshots.
//!
//! [`ConversationStore`] is backend-agnostic; mirror-storage provides SQLite and in-memory implementations.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::subscription::Subscription;
use crate::types::{ConversationId, Message, NewMessage};

/// Default bound for live subscriptions (the last 50 entries).
pub const DEFAULT_RECENT_LIMIT: usize = 50;

/// Narrow interface the chat needs from the backing store.
///
/// Appends are atomic per call; no ordering is promised to subscribers, so consumers
/// sort snapshots by `timestamp` before display.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Durably records `message` under `conversation` and returns it with its store-assigned id.
    ///
    /// Fails with [`StoreError::InvalidMessage`] for empty content and
    /// [`StoreError::StoreUnavailable`] when the backing service cannot be reached.
    async fn append(
        &self,
        conversation: &ConversationId,
        message: NewMessage,
    ) -> Result<Message, StoreError>;

    /// Opens a live view of the most recent `limit` messages. The first snapshot is
    /// delivered right away, then one per change until the subscription is dropped
    /// or [`Subscription::unsubscribe`] is called.
    async fn subscribe_recent(
        &self,
        conversation: &ConversationId,
        limit: usize,
    ) -> Result<Subscription, StoreError>;
}
