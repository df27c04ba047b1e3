//! Rule table: lexical classes and their fixed responses.
//!
//! Rules are evaluated top to bottom; the placeholder check always runs first and the echo
//! template is the fallback when nothing matches.

use std::fmt;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::ReplyError;

/// Returned for empty or whitespace-only input.
pub const PLACEHOLDER: &str = "...";

pub const DEPARTURE_PATTERN: &str = "leave|quit|stop|resign";
pub const POSITIVE_PATTERN: &str = "happy|love|great|good|wonderful";
pub const NEGATIVE_PATTERN: &str = "sad|lonely|tired|depress";

pub const DEPARTURE_REPLY: &str = "Mirror: هل أنت متأكد؟ ماذا لو غيرت فقط طريقة التجربة؟";
pub const POSITIVE_REPLY: &str = "Mirror: هذا جميل — استمتع بكل لحظة من نجاحك.";
pub const NEGATIVE_REPLY: &str = "Mirror: أحزنني هذا. تذكر أن الألم مؤقت وربما تجربة جديدة قادمة.";

/// Marker replaced by the user's text in echo templates.
pub const INPUT_MARKER: &str = "{input}";
pub const ECHO_TEMPLATE: &str = "Mirror: سمعتك تقول \"{input}\" — لكن ما الذي كنت تقصده بقلبك؟";

/// Which rule produced a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyKind {
    Placeholder,
    Departure,
    Positive,
    Negative,
    Echo,
}

impl ReplyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReplyKind::Placeholder => "placeholder",
            ReplyKind::Departure => "departure",
            ReplyKind::Positive => "positive",
            ReplyKind::Negative => "negative",
            ReplyKind::Echo => "echo",
        }
    }

    /// Placeholder and echo are built into every selector and cannot be table rules.
    pub fn is_reserved(&self) -> bool {
        matches!(self, ReplyKind::Placeholder | ReplyKind::Echo)
    }
}

impl fmt::Display for ReplyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One (predicate, response) entry of the table.
#[derive(Debug, Clone)]
pub struct ReplyRule {
    kind: ReplyKind,
    pattern: Regex,
    response: String,
}

impl ReplyRule {
    /// Compiles `pattern` case-insensitively. Matching is a search anywhere in the input.
    ///
    /// Case folding is Unicode simple folding, so `ſ` (long s) matches `s` and `K` (Kelvin sign)
    /// matches `k`. Patterns that must stay ASCII-only can opt out inline with `(?-u:...)`.
    pub fn new(
        kind: ReplyKind,
        pattern: &str,
        response: impl Into<String>,
    ) -> Result<Self, ReplyError> {
        if kind.is_reserved() {
            return Err(ReplyError::ReservedKind(kind));
        }
        let pattern = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|source| ReplyError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })?;
        Ok(Self {
            kind,
            pattern,
            response: response.into(),
        })
    }

    pub fn kind(&self) -> ReplyKind {
        self.kind
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn response(&self) -> &str {
        &self.response
    }

    pub fn matches(&self, input: &str) -> bool {
        self.pattern.is_match(input)
    }
}

/// Departure, then positive, then negative.
pub fn default_rules() -> Vec<ReplyRule> {
    vec![
        ReplyRule::new(ReplyKind::Departure, DEPARTURE_PATTERN, DEPARTURE_REPLY)
            .expect("valid departure regex"),
        ReplyRule::new(ReplyKind::Positive, POSITIVE_PATTERN, POSITIVE_REPLY)
            .expect("valid positive regex"),
        ReplyRule::new(ReplyKind::Negative, NEGATIVE_PATTERN, NEGATIVE_REPLY)
            .expect("valid negative regex"),
    ]
}

/// Substitutes every `{input}` in `template` with `input`, verbatim.
pub fn render_echo(template: &str, input: &str) -> String {
    template.replace(INPUT_MARKER, input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_folding_is_unicode_aware() {
        let sad = ReplyRule::new(ReplyKind::Negative, "sad", "...").unwrap();
        assert!(sad.matches("SAD"));
        assert!(sad.matches("\u{17F}ad"));

        let ascii_only = ReplyRule::new(ReplyKind::Negative, "(?i-u:sad)", "...").unwrap();
        assert!(ascii_only.matches("SaD"));
        assert!(!ascii_only.matches("\u{17F}ad"));
    }

    #[test]
    fn test_rule_matches_case_insensitively() {
        let rule = ReplyRule::new(ReplyKind::Positive, POSITIVE_PATTERN, "yay").unwrap();
        assert!(rule.matches("I feel GREAT"));
        assert!(rule.matches("Goodbye"));
        assert!(!rule.matches("meh"));
        assert_eq!(rule.kind(), ReplyKind::Positive);
        assert_eq!(rule.response(), "yay");
    }

    #[test]
    fn test_reserved_kinds_are_rejected() {
        assert!(matches!(
            ReplyRule::new(ReplyKind::Echo, "x", "y"),
            Err(ReplyError::ReservedKind(ReplyKind::Echo))
        ));
        assert!(matches!(
            ReplyRule::new(ReplyKind::Placeholder, "x", "y"),
            Err(ReplyError::ReservedKind(ReplyKind::Placeholder))
        ));
    }

    #[test]
    fn test_invalid_pattern_reports_pattern() {
        let err = ReplyRule::new(ReplyKind::Negative, "(sad", "z").unwrap_err();
        match err {
            ReplyError::InvalidPattern { pattern, .. } => assert_eq!(pattern, "(sad"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_default_rules_order() {
        let kinds: Vec<_> = default_rules().iter().map(ReplyRule::kind).collect();
        assert_eq!(
            kinds,
            vec![ReplyKind::Departure, ReplyKind::Positive, ReplyKind::Negative]
        );
    }

    #[test]
    fn test_render_echo_inserts_input_verbatim() {
        assert_eq!(render_echo("<{input}>", "a {input} b"), "<a {input} b>");
        assert!(render_echo(ECHO_TEMPLATE, "hi").contains("\"hi\""));
    }
}
