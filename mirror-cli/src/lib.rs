//! # mirror-cli
//!
//! Command-line front end: argument parsing, config loading and the chat loop.

pub mod app;
pub mod cli;

pub use app::{
    load_selector, open_session, unseen_lines, render_message, run_chat, run_history, run_reply,
};
pub use cli::{Cli, Commands, SessionArgs};
