//! Chat session: the send flow and the live transcript of one conversation.
//!
//! Sending is two steps: append the user's message, then, after the reply delay, append the
//! mirror reply. The delay is a scheduling hint only. Overlapping sends are independent since
//! each append is atomic in the store. Failed appends are reported, never retried.

use std::sync::Arc;
use std::time::Duration;

use mirror_core::{
    ConversationId, ConversationStore, Message, MessageList, MirrorError, NewMessage, Result,
    StoreError, DEFAULT_RECENT_LIMIT,
};
use mirror_reply::{ReplyKind, ReplySelector};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument};

use crate::config::ChatConfig;
use crate::transcript::Transcript;

/// "Thinking time" before the mirror reply is appended.
pub const DEFAULT_REPLY_DELAY: Duration = Duration::from_millis(1200);

/// Result of a successful send: the stored user message and the scheduled mirror reply.
#[derive(Debug)]
pub struct SentMessage {
    pub message: Message,
    pub reply: PendingReply,
}

/// Mirror reply waiting for its delay. Dropping it leaves the append scheduled.
#[derive(Debug)]
pub struct PendingReply {
    kind: ReplyKind,
    content: String,
    handle: JoinHandle<std::result::Result<Message, StoreError>>,
}

impl PendingReply {
    pub fn kind(&self) -> ReplyKind {
        self.kind
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the delayed append and returns the stored reply.
    pub async fn wait(self) -> Result<Message> {
        match self.handle.await {
            Ok(appended) => Ok(appended?),
            Err(e) => Err(MirrorError::Unknown(format!(
                "mirror reply task failed: {}",
                e
            ))),
        }
    }
}

/// One conversation bound to a store and a reply table. Cheap to clone.
#[derive(Clone)]
pub struct ChatSession {
    store: Arc<dyn ConversationStore>,
    conversation: ConversationId,
    selector: Arc<ReplySelector>,
    reply_delay: Duration,
    recent_limit: usize,
}

impl ChatSession {
    /// Session with the default reply table, delay and subscription bound.
    pub fn new(store: Arc<dyn ConversationStore>, conversation: ConversationId) -> Self {
        Self {
            store,
            conversation,
            selector: Arc::new(ReplySelector::default()),
            reply_delay: DEFAULT_REPLY_DELAY,
            recent_limit: DEFAULT_RECENT_LIMIT,
        }
    }

    pub fn from_config(
        store: Arc<dyn ConversationStore>,
        config: &ChatConfig,
        selector: Arc<ReplySelector>,
    ) -> Self {
        Self::new(store, config.conversation())
            .with_selector(selector)
            .with_reply_delay(config.reply_delay)
            .with_recent_limit(config.recent_limit)
    }

    pub fn with_selector(mut self, selector: Arc<ReplySelector>) -> Self {
        self.selector = selector;
        self
    }

    pub fn with_reply_delay(mut self, reply_delay: Duration) -> Self {
        self.reply_delay = reply_delay;
        self
    }

    pub fn with_recent_limit(mut self, recent_limit: usize) -> Self {
        self.recent_limit = recent_limit;
        self
    }

    pub fn conversation(&self) -> &ConversationId {
        &self.conversation
    }

    pub fn reply_delay(&self) -> Duration {
        self.reply_delay
    }

    pub fn recent_limit(&self) -> usize {
        self.recent_limit
    }

    /// Appends the user's text and schedules the mirror reply.
    ///
    /// Surrounding whitespace is trimmed; blank text is a no-op and returns `Ok(None)`.
    /// If the user append fails nothing is scheduled and the store error is returned.
    #[instrument(skip(self, text), fields(conversation = %self.conversation))]
    pub async fn send(&self, text: &str) -> Result<Option<SentMessage>> {
        let content = text.trim();
        if content.is_empty() {
            debug!("step: blank message ignored");
            return Ok(None);
        }

        let message = self
            .store
            .append(&self.conversation, NewMessage::user(content))
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to append user message");
                MirrorError::from(e)
            })?;
        info!(message_id = %message.id, "step: user message appended");

        let kind = self.selector.classify(content);
        let reply = self.selector.select(content);
        info!(
            reply_kind = %kind,
            delay_ms = self.reply_delay.as_millis() as u64,
            "step: mirror reply scheduled"
        );

        Ok(Some(SentMessage {
            message,
            reply: self.schedule_reply(kind, reply),
        }))
    }

    fn schedule_reply(&self, kind: ReplyKind, content: String) -> PendingReply {
        let store = self.store.clone();
        let conversation = self.conversation.clone();
        let delay = self.reply_delay;
        let reply = content.clone();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match store.append(&conversation, NewMessage::mirror(reply)).await {
                Ok(message) => {
                    info!(
                        conversation = %conversation,
                        message_id = %message.id,
                        "step: mirror reply appended"
                    );
                    Ok(message)
                }
                Err(e) => {
                    error!(conversation = %conversation, error = %e, "Failed to append mirror reply");
                    Err(e)
                }
            }
        });

        PendingReply {
            kind,
            content,
            handle,
        }
    }

    /// Live view of the last `recent_limit` messages, each snapshot sorted by timestamp.
    pub async fn transcript(&self) -> Result<Transcript> {
        let subscription = self
            .store
            .subscribe_recent(&self.conversation, self.recent_limit)
            .await?;
        Ok(Transcript::new(subscription))
    }

    /// The current last-N messages, sorted. Subscribes for one snapshot and unsubscribes.
    pub async fn history(&self) -> Result<MessageList> {
        let mut transcript = self.transcript().await?;
        let snapshot = transcript.next().await.unwrap_or_default();
        transcript.close();
        Ok(snapshot)
    }
}
