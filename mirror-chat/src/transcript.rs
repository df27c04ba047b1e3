//! Display-ready view over a store subscription.
//!
//! The store delivers snapshots in no particular order; every snapshot coming out of a
//! [`Transcript`] is stably sorted by `timestamp`.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use mirror_core::{ConversationId, MessageList, Subscription};

pub struct Transcript {
    subscription: Subscription,
}

impl Transcript {
    pub fn new(subscription: Subscription) -> Self {
        Self { subscription }
    }

    pub fn conversation(&self) -> &ConversationId {
        self.subscription.conversation()
    }

    pub fn is_active(&self) -> bool {
        self.subscription.is_active()
    }

    pub async fn next(&mut self) -> Option<MessageList> {
        self.subscription.next().await.map(MessageList::into_sorted)
    }

    /// Unsubscribes; no snapshot is delivered afterwards.
    pub fn close(self) {
        self.subscription.unsubscribe();
    }
}

impl Stream for Transcript {
    type Item = MessageList;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.subscription)
            .poll_next(cx)
            .map(|snapshot| snapshot.map(MessageList::into_sorted))
    }
}
