use thiserror::Error;

use crate::rules::ReplyKind;

/// Errors from building a custom rule table. Selecting a reply never fails.
#[derive(Error, Debug)]
pub enum ReplyError {
    #[error("Invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Echo template must contain {{input}}: {0:?}")]
    InvalidTemplate(String),

    #[error("Rule kind {0} is reserved")]
    ReservedKind(ReplyKind),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
