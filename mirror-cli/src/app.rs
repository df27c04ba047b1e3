//! Command handlers: build the store and session from [`ChatConfig`], then run the chat loop.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use mirror_chat::{ChatConfig, ChatSession, PendingReply};
use mirror_core::{Message, MessageList, Role};
use mirror_reply::ReplySelector;
use mirror_storage::SqliteConversationStore;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

const QUIT_COMMAND: &str = "/quit";

/// Personality from `rules_file`, or the built-in rule table.
pub fn load_selector(rules_file: Option<&str>) -> Result<ReplySelector> {
    match rules_file {
        Some(path) => ReplySelector::from_file(path)
            .with_context(|| format!("Load personality from {}", path)),
        None => Ok(ReplySelector::default()),
    }
}

/// Connects the SQLite store and binds a session to the configured conversation.
pub async fn open_session(config: &ChatConfig) -> Result<ChatSession> {
    let store = SqliteConversationStore::new(&config.database_url)
        .await
        .with_context(|| format!("Open store at {}", config.database_url))?;
    let selector = load_selector(config.rules_file.as_deref())?;
    info!(
        conversation = %config.conversation(),
        delay_ms = config.reply_delay.as_millis() as u64,
        limit = config.recent_limit,
        "step: session opened"
    );
    Ok(ChatSession::from_config(
        Arc::new(store),
        config,
        Arc::new(selector),
    ))
}

pub fn render_message(message: &Message) -> String {
    let speaker = match message.role {
        Role::User => "you",
        Role::Mirror => "mirror",
    };
    format!("[{}] {}", speaker, message.content)
}

/// Lines for messages in `snapshot` not printed yet, in timestamp order.
pub fn unseen_lines(snapshot: &MessageList, seen: &mut HashSet<String>) -> Vec<String> {
    snapshot
        .iter()
        .filter(|m| seen.insert(m.id.clone()))
        .map(render_message)
        .collect()
}

pub fn run_reply(text: &str, rules_file: Option<&str>) -> Result<()> {
    let selector = load_selector(rules_file)?;
    println!("{}", selector.select(text));
    Ok(())
}

pub async fn run_history(config: ChatConfig) -> Result<()> {
    let session = open_session(&config).await?;
    let history = session.history().await?;
    if history.is_empty() {
        println!("No messages in {}.", session.conversation());
        return Ok(());
    }
    for message in &history {
        println!("{}", render_message(message));
    }
    Ok(())
}

/// Reads lines from stdin until EOF or `/quit`; the live transcript is printed as it changes.
/// Replies still pending on exit are awaited so they land in the store.
pub async fn run_chat(config: ChatConfig) -> Result<()> {
    let session = open_session(&config).await?;
    let mut transcript = session.transcript().await?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut seen = HashSet::new();
    let mut pending: Vec<PendingReply> = Vec::new();

    println!(
        "Session {}. Type a message, {} to leave.",
        session.conversation(),
        QUIT_COMMAND
    );

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim() == QUIT_COMMAND {
                    break;
                }
                match session.send(&line).await {
                    Ok(Some(sent)) => pending.push(sent.reply),
                    Ok(None) => {}
                    Err(e) => eprintln!("Could not send message: {}", e),
                }
                pending.retain(|reply| !reply.is_finished());
            }
            snapshot = transcript.next() => {
                let Some(snapshot) = snapshot else { break };
                for line in unseen_lines(&snapshot, &mut seen) {
                    println!("{}", line);
                }
            }
        }
    }
    transcript.close();

    for reply in pending {
        if let Err(e) = reply.wait().await {
            warn!(error = %e, "Mirror reply was not stored");
        }
    }
    for line in unseen_lines(&session.history().await?, &mut seen) {
        println!("{}", line);
    }
    Ok(())
}
