//! Chat config: store endpoint, session identity, reply pacing, logging. Loaded from env.
//!
//! `DATABASE_URL` is required and has no default; everything else is optional.
//! CLI flags arrive as [`ConfigOverrides`] and win over env values.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use mirror_core::{ConversationId, MirrorError, Result, SessionId, DEFAULT_RECENT_LIMIT};

use crate::session::DEFAULT_REPLY_DELAY;


pub const DEFAULT_LOG_FILE: &str = "logs/mirror-chat.log";

/// Values supplied on the command line; `None` falls back to env, then to defaults.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub session_id: Option<String>,
    pub reply_delay_ms: Option<u64>,
    pub recent_limit: Option<usize>,
    pub rules_file: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// DATABASE_URL (SQLite file path or `sqlite:` URL)
    pub database_url: String,
    /// MIRROR_SESSION_ID, generated as `user_<n>` when unset
    pub session_id: SessionId,
    /// MIRROR_REPLY_DELAY_MS
    pub reply_delay: Duration,
    /// MIRROR_RECENT_LIMIT
    pub recent_limit: usize,
    /// LOG_FILE
    pub log_file: String,
    /// MIRROR_RULES_FILE, a personality JSON replacing the default rule table
    pub rules_file: Option<String>,
}

impl ChatConfig {
    pub fn load(overrides: ConfigOverrides) -> Result<Self> {
        let database_url = overrides
            .database_url
            .or_else(|| env_var("DATABASE_URL"))
            .ok_or_else(|| MirrorError::Config("DATABASE_URL not set".to_string()))?;
        let session_id = overrides
            .session_id
            .or_else(|| env_var("MIRROR_SESSION_ID"))
            .map(SessionId::new)
            .unwrap_or_else(SessionId::generate);
        let reply_delay_ms = match overrides.reply_delay_ms {
            Some(ms) => ms,
            None => parse_env("MIRROR_REPLY_DELAY_MS")?
                .unwrap_or(DEFAULT_REPLY_DELAY.as_millis() as u64),
        };
        let recent_limit = match overrides.recent_limit {
            Some(limit) => limit,
            None => parse_env("MIRROR_RECENT_LIMIT")?.unwrap_or(DEFAULT_RECENT_LIMIT),
        };
        let log_file = env_var("LOG_FILE").unwrap_or_else(|| DEFAULT_LOG_FILE.to_string());
        let rules_file = overrides
            .rules_file
            .or_else(|| env_var("MIRROR_RULES_FILE"));

        let config = Self {
            database_url,
            session_id,
            reply_delay: Duration::from_millis(reply_delay_ms),
            recent_limit,
            log_file,
            rules_file,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.database_url.trim().is_empty() {
            return Err(MirrorError::Config("DATABASE_URL is empty".to_string()));
        }
        if self.session_id.as_str().trim().is_empty() {
            return Err(MirrorError::Config("MIRROR_SESSION_ID is empty".to_string()));
        }
        if self.recent_limit == 0 {
            return Err(MirrorError::Config(
                "MIRROR_RECENT_LIMIT must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn conversation(&self) -> ConversationId {
        self.session_id.conversation()
    }
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T: FromStr>(name: &str) -> Result<Option<T>> {
    match env_var(name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| MirrorError::Config(format!("{} is not a valid number: {}", name, raw))),
    }
}
