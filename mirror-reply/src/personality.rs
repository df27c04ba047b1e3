//! Custom mirror personalities: rule tables loaded from JSON.
//!
//! ```json
//! {
//!   "name": "coach",
//!   "echo_template": "Mirror: you said \"{input}\". Why?",
//!   "rules": [
//!     { "kind": "departure", "pattern": "give up|quit", "response": "Mirror: one more try?" },
//!     { "kind": "positive", "pattern": "win|proud", "response": "Mirror: keep going." }
//!   ]
//! }
//! ```
//!
//! Rules keep file order as precedence. The placeholder check always runs first;
//! `placeholder` and `echo` are not valid rule kinds.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ReplyError;
use crate::rules::{ReplyKind, ReplyRule, ECHO_TEMPLATE};
use crate::selector::ReplySelector;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSpec {
    pub kind: ReplyKind,
    pub pattern: String,
    pub response: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Personality {
    #[serde(default)]
    pub name: Option<String>,
    /// Falls back to the default echo template when absent.
    #[serde(default)]
    pub echo_template: Option<String>,
    pub rules: Vec<RuleSpec>,
}

impl Personality {
    pub fn from_json(json: &str) -> Result<Self, ReplyError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ReplyError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Compiles every rule; the first invalid pattern or reserved kind aborts.
    pub fn into_selector(self) -> Result<ReplySelector, ReplyError> {
        let rules = self
            .rules
            .iter()
            .map(|spec| ReplyRule::new(spec.kind, &spec.pattern, spec.response.clone()))
            .collect::<Result<Vec<_>, _>>()?;
        let selector = ReplySelector::new(
            rules,
            self.echo_template.unwrap_or_else(|| ECHO_TEMPLATE.to_string()),
        )?;
        info!(
            personality = self.name.as_deref().unwrap_or("unnamed"),
            rules = selector.rules().len(),
            "Loaded mirror personality"
        );
        Ok(selector)
    }
}

impl ReplySelector {
    /// Loads and compiles a personality file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ReplyError> {
        Personality::from_file(path)?.into_selector()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COACH: &str = r#"{
        "name": "coach",
        "echo_template": "You said {input}",
        "rules": [
            { "kind": "positive", "pattern": "win", "response": "Keep going." },
            { "kind": "departure", "pattern": "give up", "response": "One more try?" }
        ]
    }"#;

    #[test]
    fn test_personality_rules_keep_file_order() {
        let selector = Personality::from_json(COACH).unwrap().into_selector().unwrap();

        assert_eq!(selector.select("I will WIN or give up"), "Keep going.");
        assert_eq!(selector.select("I give up"), "One more try?");
        assert_eq!(selector.select("hello"), "You said hello");
        assert_eq!(selector.select("   "), "...");
        assert_eq!(selector.classify("win"), ReplyKind::Positive);
    }

    #[test]
    fn test_missing_echo_template_uses_default() {
        let personality = Personality::from_json(r#"{ "rules": [] }"#).unwrap();
        assert!(personality.name.is_none());
        let selector = personality.into_selector().unwrap();
        assert_eq!(selector.echo_template(), ECHO_TEMPLATE);
    }

    #[test]
    fn test_invalid_personalities_are_rejected() {
        let bad_regex = r#"{ "rules": [ { "kind": "negative", "pattern": "(sad", "response": "x" } ] }"#;
        assert!(matches!(
            Personality::from_json(bad_regex).unwrap().into_selector(),
            Err(ReplyError::InvalidPattern { .. })
        ));

        let reserved = r#"{ "rules": [ { "kind": "echo", "pattern": "x", "response": "x" } ] }"#;
        assert!(matches!(
            Personality::from_json(reserved).unwrap().into_selector(),
            Err(ReplyError::ReservedKind(ReplyKind::Echo))
        ));

        let bad_template = r#"{ "echo_template": "static", "rules": [] }"#;
        assert!(matches!(
            Personality::from_json(bad_template).unwrap().into_selector(),
            Err(ReplyError::InvalidTemplate(_))
        ));

        assert!(matches!(
            Personality::from_json(r#"{ "rules": [ { "kind": "angry" } ] }"#),
            Err(ReplyError::Parse(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("coach.json");
        fs::write(&path, COACH).unwrap();

        let selector = ReplySelector::from_file(&path).unwrap();
        assert_eq!(selector.rules().len(), 2);

        assert!(matches!(
            ReplySelector::from_file(dir.path().join("missing.json")),
            Err(ReplyError::Io(_))
        ));
    }
}
