//! CLI parser. Flags map onto [`ConfigOverrides`] and win over env values.

use clap::{Args, Parser, Subcommand};
use mirror_chat::ConfigOverrides;

#[derive(Parser, Debug)]
#[command(name = "mirror")]
#[command(about = "MirrorChat: a reflective chat that mirrors your words back", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the mirror reply for one message; touches no store.
    Reply {
        text: String,
        /// Personality JSON replacing the default rule table.
        #[arg(long)]
        rules: Option<String>,
    },
    /// Interactive chat: read lines from stdin, show the live transcript.
    Chat {
        #[command(flatten)]
        session: SessionArgs,
    },
    /// Print the recent messages of a session and exit.
    History {
        #[command(flatten)]
        session: SessionArgs,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct SessionArgs {
    /// Overrides DATABASE_URL.
    #[arg(long)]
    pub database_url: Option<String>,
    /// Session id such as `user_123456`; overrides MIRROR_SESSION_ID.
    #[arg(short, long)]
    pub session: Option<String>,
    /// Overrides MIRROR_REPLY_DELAY_MS.
    #[arg(long)]
    pub delay_ms: Option<u64>,
    /// Overrides MIRROR_RECENT_LIMIT.
    #[arg(short, long)]
    pub limit: Option<usize>,
    /// Overrides MIRROR_RULES_FILE.
    #[arg(long)]
    pub rules: Option<String>,
}

impl From<SessionArgs> for ConfigOverrides {
    fn from(args: SessionArgs) -> Self {
        Self {
            database_url: args.database_url,
            session_id: args.session,
            reply_delay_ms: args.delay_ms,
            recent_limit: args.limit,
            rules_file: args.rules,
        }
    }
}
