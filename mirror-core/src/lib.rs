//! # mirror-core
//!
//! Core types and traits for the mirror chat: [`Message`], [`Role`], [`ConversationId`],
//! the [`ConversationStore`] boundary with its [`Subscription`] handle, error types,
//! and tracing initialization. Storage-agnostic; used by mirror-storage and mirror-chat.

pub mod error;
pub mod logger;
pub mod store;
pub mod subscription;
pub mod types;

pub use error::{MirrorError, Result, StoreError};
pub use logger::init_tracing;
pub use store::{ConversationStore, DEFAULT_RECENT_LIMIT};
pub use subscription::{SnapshotSender, Subscription};
pub use types::{now_millis, ConversationId, Message, MessageList, NewMessage, Role, SessionId};
