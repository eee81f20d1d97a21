use std::fmt;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Default issue identifier: project key, hyphen, number (`ABC-123`).
pub const DEFAULT_PATTERN: &str = r"([A-Z]+-\d+)";

/// An issue identifier found in a commit message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueReference(String);

impl IssueReference {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IssueReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compiled matcher for issue references.
///
/// When the pattern has a capture group, the first group is the reference;
/// otherwise the whole match is. `^` and `$` match at line boundaries.
#[derive(Debug, Clone)]
pub struct ReferencePattern {
    regex: Regex,
    group: usize,
}

impl ReferencePattern {
    pub fn new(pattern: &str) -> Result<Self, CoreError> {
        let regex = RegexBuilder::new(pattern).multi_line(true).build()?;
        let group = if regex.captures_len() > 1 { 1 } else { 0 };
        Ok(Self { regex, group })
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Every non-overlapping match in document order, duplicates included.
    /// Empty matches name no issue and are left out.
    pub fn extract(&self, message: &str) -> Vec<IssueReference> {
        self.regex
            .captures_iter(message)
            .filter_map(|caps| caps.get(self.group))
            .filter(|m| !m.as_str().is_empty())
            .map(|m| IssueReference::new(m.as_str()))
            .collect()
    }
}

impl Default for ReferencePattern {
    fn default() -> Self {
        Self::new(DEFAULT_PATTERN).expect("default reference pattern compiles")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(refs: &[IssueReference]) -> Vec<&str> {
        refs.iter().map(IssueReference::as_str).collect()
    }

    #[test]
    fn empty_message_has_no_references() {
        assert!(ReferencePattern::default().extract("").is_empty());
    }

    #[test]
    fn message_without_match_has_no_references() {
        let pattern = ReferencePattern::default();
        assert!(pattern.extract("fix typo in readme").is_empty());
        assert!(pattern.extract("abc-123 lowercase keys do not count").is_empty());
    }

    #[test]
    fn keeps_document_order_and_duplicates() {
        let refs = ReferencePattern::default()
            .extract("Fixes ABC-123 and related to ABC-999\n\nSee also ABC-123, XY-7");
        assert_eq!(ids(&refs), ["ABC-123", "ABC-999", "ABC-123", "XY-7"]);
    }

    #[test]
    fn pattern_without_group_uses_whole_match() {
        let pattern = ReferencePattern::new(r"#\d+").unwrap();
        assert_eq!(ids(&pattern.extract("closes #4 and #15")), ["#4", "#15"]);
    }

    #[test]
    fn first_group_is_the_reference() {
        let pattern = ReferencePattern::new(r"refs (PROJ-\d+)").unwrap();
        assert_eq!(ids(&pattern.extract("refs PROJ-2, PROJ-3")), ["PROJ-2"]);
    }

    #[test]
    fn anchors_match_per_line() {
        let pattern = ReferencePattern::new(r"^([A-Z]+-\d+):").unwrap();
        let refs = pattern.extract("OPS-1: first line\nbody mentions OPS-2:\nOPS-3: trailer");
        assert_eq!(ids(&refs), ["OPS-1", "OPS-3"]);
    }

    #[test]
    fn unmatched_optional_group_yields_nothing() {
        let pattern = ReferencePattern::new(r"fixes:? ?([A-Z]+-\d+)?").unwrap();
        let refs = pattern.extract("fixes: OPS-9\nfixes later\nfixes OPS-10");
        assert_eq!(ids(&refs), ["OPS-9", "OPS-10"]);
    }

    #[test]
    fn empty_matches_are_dropped() {
        let pattern = ReferencePattern::new(r"[A-Z]*").unwrap();
        assert_eq!(ids(&pattern.extract("ab CD ef")), ["CD"]);
    }

    #[test]
    fn non_ascii_text_around_references() {
        let refs = ReferencePattern::default().extract("Überarbeitet ÄÖ-1 für ABC-42 ✓");
        assert_eq!(ids(&refs), ["ABC-42"]);
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        let err = ReferencePattern::new("([A-Z]+").unwrap_err();
        assert!(matches!(err, CoreError::InvalidPattern(_)));
    }

    #[test]
    fn default_pattern_round_trips() {
        assert_eq!(ReferencePattern::default().as_str(), DEFAULT_PATTERN);
    }
}
