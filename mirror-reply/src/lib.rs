//! # mirror-reply
//!
//! The scripted "mirror": maps a user utterance to a canned response by an ordered table of
//! case-insensitive pattern rules, first match wins. Pure and synchronous; never fails.
//!
//! - [`rules`] – [`ReplyKind`], [`ReplyRule`] and the default table
//! - [`selector`] – [`ReplySelector`] and the free function [`select_reply`]
//! - [`personality`] – custom rule tables loaded from JSON

pub mod error;
pub mod personality;
pub mod rules;
pub mod selector;

pub use error::ReplyError;
pub use personality::{Personality, RuleSpec};
pub use rules::{ReplyKind, ReplyRule, PLACEHOLDER};
pub use selector::{select_reply, ReplySelector};
