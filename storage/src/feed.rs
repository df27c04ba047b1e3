//! Change feed shared by the store implementations.
//!
//! Every append publishes its namespace on a `broadcast` channel. Each subscription runs one
//! tokio task that pushes the current last-N snapshot, then waits for a change to its own
//! namespace (or for cancellation) before re-reading.

use std::future::Future;

use mirror_core::subscription::{self, SnapshotSender, SNAPSHOT_BUFFER};
use mirror_core::{ConversationId, MessageList, StoreError, Subscription};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};

const FEED_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub(crate) struct ChangeFeed {
    tx: broadcast::Sender<String>,
}

impl ChangeFeed {
    pub(crate) fn new() -> Self {
        let (tx, _) = broadcast::channel(FEED_CAPACITY);
        Self { tx }
    }

    /// Publishes a change to `namespace`. No listeners is not an error.
    pub(crate) fn notify(&self, namespace: &str) {
        let _ = self.tx.send(namespace.to_string());
    }

    /// Must be taken before reading the initial snapshot so no append slips in between.
    pub(crate) fn listen(&self) -> broadcast::Receiver<String> {
        self.tx.subscribe()
    }
}

/// Starts the snapshot task for one subscription and returns the caller's handle.
///
/// `initial` is delivered first; afterwards `fetch` re-reads the last-N set on every change.
pub(crate) fn spawn_snapshots<F, Fut>(
    conversation: ConversationId,
    initial: MessageList,
    mut changes: broadcast::Receiver<String>,
    fetch: F,
) -> Subscription
where
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = Result<MessageList, StoreError>> + Send + 'static,
{
    let namespace = conversation.path();
    let (mut sender, subscription) = subscription::channel(conversation, SNAPSHOT_BUFFER);

    tokio::spawn(async move {
        let mut next = Some(initial);
        loop {
            if let Some(snapshot) = next.take() {
                let count = snapshot.len();
                if !sender.send(snapshot).await {
                    break;
                }
                debug!(namespace = %namespace, count, "step: snapshot delivered");
            }

            if !wait_for_change(&mut sender, &mut changes, &namespace).await {
                break;
            }

            match fetch().await {
                Ok(snapshot) => next = Some(snapshot),
                Err(e) => {
                    warn!(namespace = %namespace, error = %e, "Failed to refresh snapshot, waiting for next change");
                }
            }
        }
        debug!(namespace = %namespace, "step: subscription closed, snapshot task stopped");
    });

    subscription
}

/// Returns false when the task should stop (unsubscribed or feed closed).
async fn wait_for_change(
    sender: &mut SnapshotSender,
    changes: &mut broadcast::Receiver<String>,
    namespace: &str,
) -> bool {
    loop {
        tokio::select! {
            _ = sender.cancelled() => return false,
            change = changes.recv() => match change {
                Ok(changed) if changed == namespace => return true,
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(namespace = %namespace, skipped, "Change feed lagged, refreshing snapshot");
                    return true;
                }
                Err(RecvError::Closed) => return false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirror_core::{NewMessage, Role};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn list(n: usize) -> MessageList {
        MessageList::new(
            (0..n)
                .map(|i| NewMessage::new(Role::User, format!("m{}", i), i as i64).into_message(format!("id{}", i)))
                .collect(),
        )
    }

    #[tokio::test]
    async fn test_refreshes_only_on_own_namespace() {
        let feed = ChangeFeed::new();
        let conversation = ConversationId::new("a");
        let fetches = Arc::new(AtomicUsize::new(0));
        let counter = fetches.clone();

        let mut subscription = spawn_snapshots(conversation, list(0), feed.listen(), move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            async move { Ok(list(n)) }
        });

        assert_eq!(subscription.next().await.unwrap().len(), 0);

        feed.notify("chats/b");
        feed.notify("chats/a");
        let refreshed = tokio::time::timeout(Duration::from_secs(1), subscription.next())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(refreshed.len(), 1);
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_refresh_is_skipped() {
        let feed = ChangeFeed::new();
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();

        let mut subscription =
            spawn_snapshots(ConversationId::new("a"), list(1), feed.listen(), move || {
                let attempt = counter.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt == 0 {
                        Err(StoreError::StoreUnavailable("offline".to_string()))
                    } else {
                        Ok(list(2))
                    }
                }
            });

        assert_eq!(subscription.next().await.unwrap().len(), 1);
        feed.notify("chats/a");
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(subscription.try_next().is_none());

        feed.notify("chats/a");
        let refreshed = tokio::time::timeout(Duration::from_secs(1), subscription.next())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(refreshed.len(), 2);
    }

    /// **Test: Unsubscribing stops the snapshot task and drops its change-feed receiver.**
    #[tokio::test]
    async fn test_unsubscribe_releases_feed_receiver() {
        let feed = ChangeFeed::new();
        let mut subscription =
            spawn_snapshots(ConversationId::new("a"), list(0), feed.listen(), || async {
                Ok(list(0))
            });

        assert!(subscription.next().await.is_some());
        assert_eq!(feed.tx.receiver_count(), 1);

        subscription.unsubscribe();
        tokio::time::timeout(Duration::from_secs(1), async {
            while feed.tx.receiver_count() > 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("snapshot task kept its receiver after unsubscribe");

        feed.notify("chats/a");
        assert_eq!(feed.tx.receiver_count(), 0);
    }

    /// **Test: Dropping the handle releases the task like an explicit unsubscribe.**
    #[tokio::test]
    async fn test_drop_releases_feed_receiver() {
        let feed = ChangeFeed::new();
        let subscription =
            spawn_snapshots(ConversationId::new("a"), list(1), feed.listen(), || async {
                Ok(list(1))
            });
        drop(subscription);

        tokio::time::timeout(Duration::from_secs(1), async {
            while feed.tx.receiver_count() > 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("snapshot task kept its receiver after drop");
    }
}
