//! Reply selection over an ordered rule table.

use once_cell::sync::Lazy;
use tracing::debug;

use crate::error::ReplyError;
use crate::rules::{default_rules, render_echo, ReplyKind, ReplyRule, ECHO_TEMPLATE, INPUT_MARKER, PLACEHOLDER};

static DEFAULT_SELECTOR: Lazy<ReplySelector> = Lazy::new(ReplySelector::default);

/// Maps an utterance to a canned response with the default table.
///
/// Order: blank input → `"..."`; departure; positive; negative; otherwise the echo template
/// with the input embedded verbatim.
pub fn select_reply(input: &str) -> String {
    DEFAULT_SELECTOR.select(input)
}

/// Ordered (predicate, response) table plus the echo fallback. Immutable once built.
#[derive(Debug, Clone)]
pub struct ReplySelector {
    rules: Vec<ReplyRule>,
    echo_template: String,
}

impl Default for ReplySelector {
    fn default() -> Self {
        Self {
            rules: default_rules(),
            echo_template: ECHO_TEMPLATE.to_string(),
        }
    }
}

impl ReplySelector {
    /// Builds a selector from rules in precedence order and an echo template containing `{input}`.
    pub fn new(rules: Vec<ReplyRule>, echo_template: impl Into<String>) -> Result<Self, ReplyError> {
        let echo_template = echo_template.into();
        if !echo_template.contains(INPUT_MARKER) {
            return Err(ReplyError::InvalidTemplate(echo_template));
        }
        Ok(Self {
            rules,
            echo_template,
        })
    }

    pub fn rules(&self) -> &[ReplyRule] {
        &self.rules
    }

    pub fn echo_template(&self) -> &str {
        &self.echo_template
    }

    /// Which rule fires for `input`.
    pub fn classify(&self, input: &str) -> ReplyKind {
        match self.matching_rule(input) {
            Ok(rule) => rule.kind(),
            Err(kind) => kind,
        }
    }

    pub fn select(&self, input: &str) -> String {
        let (kind, reply) = match self.matching_rule(input) {
            Ok(rule) => (rule.kind(), rule.response().to_string()),
            Err(ReplyKind::Placeholder) => (ReplyKind::Placeholder, PLACEHOLDER.to_string()),
            Err(kind) => (kind, render_echo(&self.echo_template, input)),
        };
        debug!(kind = %kind, "Selected mirror reply");
        reply
    }

    /// `Ok(rule)` for a table hit, otherwise `Err` with the built-in kind (placeholder or echo).
    fn matching_rule(&self, input: &str) -> Result<&ReplyRule, ReplyKind> {
        if input.trim().is_empty() {
            return Err(ReplyKind::Placeholder);
        }
        self.rules
            .iter()
            .find(|rule| rule.matches(input))
            .ok_or(ReplyKind::Echo)
    }
}
