//! # In-Memory Conversation Store
//!
//! In-memory implementation of [`ConversationStore`] for tests, demos and offline runs.
//!
//! **Limitations**: data is lost on restart and bounded by available memory.
//!
//! [`InMemoryConversationStore::set_available`] simulates connectivity loss: while unavailable,
//! appends and new subscriptions fail with [`StoreError::StoreUnavailable`].
//!
//! ## Thread Safety
//!
//! Entries sit behind `Arc<RwLock<>>`; clones share the same data and change feed.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use mirror_core::{ConversationId, ConversationStore, Message, MessageList, NewMessage, StoreError, Subscription};
use tokio::sync::RwLock;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::feed::{spawn_snapshots, ChangeFeed};

type Entries = Arc<RwLock<HashMap<String, Vec<Message>>>>;

#[derive(Debug, Clone)]
pub struct InMemoryConversationStore {
    entries: Entries,
    available: Arc<AtomicBool>,
    feed: ChangeFeed,
}

impl Default for InMemoryConversationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            available: Arc::new(AtomicBool::new(true)),
            feed: ChangeFeed::new(),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    /// Number of messages stored for a conversation.
    pub async fn len(&self, conversation: &ConversationId) -> usize {
        self.entries
            .read()
            .await
            .get(&conversation.path())
            .map_or(0, Vec::len)
    }

    /// The most recent `limit` messages of a conversation, oldest first.
    pub async fn recent(&self, conversation: &ConversationId, limit: usize) -> MessageList {
        recent_from(&self.entries, &conversation.path(), limit).await
    }

    fn ensure_available(&self) -> Result<(), StoreError> {
        if self.is_available() {
            Ok(())
        } else {
            Err(StoreError::StoreUnavailable(
                "in-memory store marked unavailable".to_string(),
            ))
        }
    }
}

async fn recent_from(entries: &Entries, namespace: &str, limit: usize) -> MessageList {
    let entries = entries.read().await;
    let mut messages = entries.get(namespace).cloned().unwrap_or_default();
    // Stable sort keeps append order among equal timestamps, like `seq` in the SQLite store.
    messages.sort_by_key(|m| m.timestamp);
    let skip = messages.len().saturating_sub(limit);
    MessageList::new(messages.into_iter().skip(skip).collect())
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    #[instrument(skip(self, message), fields(conversation = %conversation, role = %message.role))]
    async fn append(
        &self,
        conversation: &ConversationId,
        message: NewMessage,
    ) -> Result<Message, StoreError> {
        self.ensure_available()?;
        message.validate()?;

        let namespace = conversation.path();
        let stored = message.into_message(Uuid::new_v4().to_string());
        self.entries
            .write()
            .await
            .entry(namespace.clone())
            .or_default()
            .push(stored.clone());

        debug!(id = %stored.id, namespace = %namespace, "Saved message");
        self.feed.notify(&namespace);
        Ok(stored)
    }

    #[instrument(skip(self), fields(conversation = %conversation))]
    async fn subscribe_recent(
        &self,
        conversation: &ConversationId,
        limit: usize,
    ) -> Result<Subscription, StoreError> {
        self.ensure_available()?;

        let changes = self.feed.listen();
        let initial = self.recent(conversation, limit).await;

        let entries = self.entries.clone();
        let available = self.available.clone();
        let namespace = conversation.path();
        Ok(spawn_snapshots(
            conversation.clone(),
            initial,
            changes,
            move || {
                let entries = entries.clone();
                let available = available.clone();
                let namespace = namespace.clone();
                async move {
                    if !available.load(Ordering::SeqCst) {
                        return Err(StoreError::StoreUnavailable(
                            "in-memory store marked unavailable".to_string(),
                        ));
                    }
                    Ok(recent_from(&entries, &namespace, limit).await)
                }
            },
        ))
    }
}
