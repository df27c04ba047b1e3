//! Cancellable snapshot stream handed out by [`crate::ConversationStore::subscribe_recent`].
//!
//! A subscription is a bounded `mpsc` channel of [`MessageList`] snapshots plus a `watch`
//! cancel flag. The store side holds a [`SnapshotSender`]; the caller holds the [`Subscription`].
//! Unsubscribing (or dropping the handle) is terminal and tells the producer to release its resources.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::{mpsc, watch};

use crate::types::{ConversationId, MessageList};

/// Snapshots buffered between the store task and a slow subscriber.
pub const SNAPSHOT_BUFFER: usize = 8;

/// Creates a connected producer/consumer pair for one conversation.
pub fn channel(conversation: ConversationId, buffer: usize) -> (SnapshotSender, Subscription) {
    let (tx, rx) = mpsc::channel(buffer.max(1));
    let (cancel_tx, cancel_rx) = watch::channel(false);
    (
        SnapshotSender { tx, cancel_rx },
        Subscription {
            conversation,
            rx,
            cancel_tx,
            active: true,
        },
    )
}

/// Producer half, owned by the store's snapshot task.
pub struct SnapshotSender {
    tx: mpsc::Sender<MessageList>,
    cancel_rx: watch::Receiver<bool>,
}

impl SnapshotSender {
    /// Delivers one snapshot. Returns false once the subscriber has unsubscribed or gone away.
    pub async fn send(&mut self, snapshot: MessageList) -> bool {
        if self.is_cancelled() {
            return false;
        }
        tokio::select! {
            sent = self.tx.send(snapshot) => sent.is_ok(),
            _ = wait_cancelled(&mut self.cancel_rx) => false,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel_rx.borrow() || self.tx.is_closed()
    }

    /// Resolves when the subscriber unsubscribes or drops its handle.
    pub async fn cancelled(&mut self) {
        tokio::select! {
            _ = self.tx.closed() => {}
            _ = wait_cancelled(&mut self.cancel_rx) => {}
        }
    }
}

async fn wait_cancelled(cancel_rx: &mut watch::Receiver<bool>) {
    // Err means the Subscription (and its sender) is gone, which is cancellation too.
    let _ = cancel_rx.wait_for(|cancelled| *cancelled).await;
}

/// Consumer half: a lazy, infinite, non-restartable sequence of snapshots.
///
/// States are `subscribed` and `unsubscribed`; the latter is terminal.
pub struct Subscription {
    conversation: ConversationId,
    rx: mpsc::Receiver<MessageList>,
    cancel_tx: watch::Sender<bool>,
    active: bool,
}

impl Subscription {
    pub fn conversation(&self) -> &ConversationId {
        &self.conversation
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Waits for the next snapshot. `None` after unsubscribe or when the store side shut down.
    pub async fn next(&mut self) -> Option<MessageList> {
        if !self.active {
            return None;
        }
        let snapshot = self.rx.recv().await;
        if snapshot.is_none() {
            self.active = false;
        }
        snapshot
    }

    /// Returns an already buffered snapshot without waiting.
    pub fn try_next(&mut self) -> Option<MessageList> {
        if !self.active {
            return None;
        }
        self.rx.try_recv().ok()
    }

    /// Stops delivery and releases the store-side task. No snapshot is observed afterwards.
    pub fn unsubscribe(mut self) {
        self.cancel();
    }

    fn cancel(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        let _ = self.cancel_tx.send(true);
        self.rx.close();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl Stream for Subscription {
    type Item = MessageList;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if !self.active {
            return Poll::Ready(None);
        }
        let polled = self.rx.poll_recv(cx);
        if let Poll::Ready(None) = polled {
            self.active = false;
        }
        polled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NewMessage, Role};
    use futures::StreamExt;
    use std::time::Duration;

    fn snapshot(content: &str) -> MessageList {
        MessageList::new(vec![NewMessage::new(Role::User, content, 1).into_message("m1")])
    }

    #[tokio::test]
    async fn test_snapshots_are_delivered_in_send_order() {
        let (mut sender, mut subscription) = channel(ConversationId::new("c1"), 4);
        assert!(sender.send(snapshot("first")).await);
        assert!(sender.send(snapshot("second")).await);

        assert_eq!(subscription.next().await.unwrap(), snapshot("first"));
        assert_eq!(subscription.next().await.unwrap(), snapshot("second"));
        assert!(subscription.is_active());
        assert_eq!(subscription.conversation().as_str(), "c1");
    }

    #[tokio::test]
    async fn test_unsubscribe_cancels_producer() {
        let (mut sender, subscription) = channel(ConversationId::new("c1"), 4);
        subscription.unsubscribe();

        tokio::time::timeout(Duration::from_secs(1), sender.cancelled())
            .await
            .expect("producer should observe cancellation");
        assert!(sender.is_cancelled());
        assert!(!sender.send(snapshot("late")).await);
    }

    #[tokio::test]
    async fn test_drop_cancels_producer() {
        let (mut sender, subscription) = channel(ConversationId::new("c1"), 4);
        drop(subscription);

        tokio::time::timeout(Duration::from_secs(1), sender.cancelled())
            .await
            .expect("producer should observe drop");
        assert!(!sender.send(snapshot("late")).await);
    }

    #[tokio::test]
    async fn test_stream_ends_when_producer_is_gone() {
        let (mut sender, mut subscription) = channel(ConversationId::new("c1"), 4);
        assert!(sender.send(snapshot("only")).await);
        drop(sender);

        assert_eq!(subscription.next().await, Some(snapshot("only")));
        assert_eq!(StreamExt::next(&mut subscription).await, None);
        assert!(!subscription.is_active());
    }

    #[tokio::test]
    async fn test_send_blocked_on_full_buffer_returns_false_after_unsubscribe() {
        let (mut sender, subscription) = channel(ConversationId::new("c1"), 1);
        assert!(sender.send(snapshot("fills buffer")).await);

        let producer = tokio::spawn(async move { sender.send(snapshot("blocked")).await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        subscription.unsubscribe();

        let sent = tokio::time::timeout(Duration::from_secs(1), producer)
            .await
            .expect("send should unblock")
            .expect("task should not panic");
        assert!(!sent);
    }
}
