use thiserror::Error;

/// Errors surfaced by a [`crate::ConversationStore`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backing service could not be reached (connection lost, pool closed, query failed).
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// A required field is missing, e.g. empty content.
    #[error("Invalid message: {0}")]
    InvalidMessage(String),
}

#[derive(Error, Debug)]
pub enum MirrorError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

pub type Result<T> = std::result::Result<T, MirrorError>;
