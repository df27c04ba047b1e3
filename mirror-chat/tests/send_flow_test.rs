//! Tests for the send flow's edge cases: blank input, trimming and store failures.

use std::sync::Arc;
use std::time::Duration;

use mirror_chat::ChatSession;
use mirror_core::{ConversationId, MirrorError, StoreError};
use mirror_reply::{Personality, ReplyKind, ReplySelector, RuleSpec};
use mirror_storage::InMemoryConversationStore;

fn session(store: &Arc<InMemoryConversationStore>, delay: Duration) -> ChatSession {
    ChatSession::new(store.clone(), ConversationId::new("user_9")).with_reply_delay(delay)
}

/// **Test: Blank input is a no-op.**
///
/// **Expected:** `Ok(None)`, nothing appended, even after the reply delay.
#[tokio::test]
async fn test_blank_input_is_ignored() {
    let store = Arc::new(InMemoryConversationStore::new());
    let session = session(&store, Duration::from_millis(10));

    for text in ["", "   ", "\n\t"] {
        assert!(session.send(text).await.unwrap().is_none());
    }
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(store.len(session.conversation()).await, 0);
}

/// **Test: Surrounding whitespace is trimmed before storing and selecting.**
#[tokio::test]
async fn test_text_is_trimmed() {
    let store = Arc::new(InMemoryConversationStore::new());
    let session = session(&store, Duration::ZERO);

    let sent = session.send("   hello mirror \n").await.unwrap().unwrap();
    assert_eq!(sent.message.content, "hello mirror");
    let reply = sent.reply.wait().await.unwrap();
    assert!(reply.content.contains("\"hello mirror\""));
}

/// **Test: An unavailable store fails the send and schedules no reply.**
#[tokio::test]
async fn test_unavailable_store_fails_send() {
    let store = Arc::new(InMemoryConversationStore::new());
    store.set_available(false);
    let session = session(&store, Duration::ZERO);

    let result = session.send("hello").await;
    assert!(matches!(
        result,
        Err(MirrorError::Store(StoreError::StoreUnavailable(_)))
    ));

    store.set_available(true);
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(store.len(session.conversation()).await, 0);
}

/// **Test: Losing the store during the delay surfaces through the pending reply, without retry.**
#[tokio::test]
async fn test_failed_reply_append_is_reported() {
    let store = Arc::new(InMemoryConversationStore::new());
    let session = session(&store, Duration::from_millis(100));

    let sent = session.send("I am tired").await.unwrap().unwrap();
    assert_eq!(sent.reply.kind(), ReplyKind::Negative);
    store.set_available(false);

    let result = sent.reply.wait().await;
    assert!(matches!(
        result,
        Err(MirrorError::Store(StoreError::StoreUnavailable(_)))
    ));

    store.set_available(true);
    assert_eq!(store.len(session.conversation()).await, 1);
}

/// **Test: A custom personality drives the mirror reply.**
#[tokio::test]
async fn test_custom_selector_is_used() {
    let store = Arc::new(InMemoryConversationStore::new());
    let selector = Personality {
        name: Some("coach".to_string()),
        echo_template: Some("Tell me more about {input}".to_string()),
        rules: vec![RuleSpec {
            kind: ReplyKind::Positive,
            pattern: "win".to_string(),
            response: "Proud of you.".to_string(),
        }],
    }
    .into_selector()
    .unwrap();
    let session = session(&store, Duration::ZERO).with_selector(Arc::new(selector));

    let win = session.send("We WIN").await.unwrap().unwrap();
    assert_eq!(win.reply.wait().await.unwrap().content, "Proud of you.");

    let other = session.send("my day").await.unwrap().unwrap();
    assert_eq!(other.reply.wait().await.unwrap().content, "Tell me more about my day");

    assert!(ReplySelector::default().rules().len() == 3);
}
