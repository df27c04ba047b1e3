//! # mirror-chat
//!
//! One chat flow per conversation: append the user's message, pick the mirror reply, append it
//! after a short "thinking" delay, and expose the conversation as a timestamp-sorted live transcript.
//! Configuration comes from env via [`ChatConfig`].

pub mod config;
pub mod session;
pub mod transcript;

pub use config::{ChatConfig, ConfigOverrides};
pub use session::{ChatSession, PendingReply, SentMessage, DEFAULT_REPLY_DELAY};
pub use transcript::Transcript;
