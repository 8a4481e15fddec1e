//! Schema rules
//!
//! A [`NodeRule`] constrains one node-kind: what its title and body may look
//! like, at which depth it sits, and which rules are legal as its parent,
//! first child, previous sibling and next sibling. Rules are described by a
//! plain [`RuleSpec`] value and validated in one step by [`RuleSpec::build`],
//! which aggregates every violation into a single [`RuleErrors`] list instead
//! of failing on the first.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{RuleError, RuleErrors};
use crate::pattern;

/// Reserved candidate name meaning "absence of a node is valid here"
pub const NULL_NAME: &str = "<null>";

// =============================================================================
// Rule Spec
// =============================================================================

/// Unvalidated description of a rule.
///
/// Fields are public and the value round-trips through serde; the fluent
/// setters exist for convenience only. Title and data each accept either a
/// pattern string (compiled via [`crate::pattern::to_regex`]) or a raw regex,
/// never both. Neighbor lists left empty default to `["<null>"]` at build
/// time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSpec {
    pub name: Option<String>,
    pub level: Option<usize>,
    pub title_pattern: Option<String>,
    pub title_regex: Option<String>,
    pub data_pattern: Option<String>,
    pub data_regex: Option<String>,
    #[serde(default)]
    pub parent_names: Vec<String>,
    #[serde(default)]
    pub child_names: Vec<String>,
    #[serde(default)]
    pub prev_sibling_names: Vec<String>,
    #[serde(default)]
    pub next_sibling_names: Vec<String>,
}

impl RuleSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn with_level(mut self, level: usize) -> Self {
        self.level = Some(level);
        self
    }

    pub fn with_title_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.title_pattern = Some(pattern.into());
        self
    }

    pub fn with_title_regex(mut self, regex: impl Into<String>) -> Self {
        self.title_regex = Some(regex.into());
        self
    }

    pub fn with_data_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.data_pattern = Some(pattern.into());
        self
    }

    pub fn with_data_regex(mut self, regex: impl Into<String>) -> Self {
        self.data_regex = Some(regex.into());
        self
    }

    /// Append one name to the parent list
    pub fn add_parent(mut self, name: impl Into<String>) -> Self {
        self.parent_names.push(name.into());
        self
    }

    pub fn with_parents<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parent_names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_children<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.child_names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_prev_siblings<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prev_sibling_names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_next_siblings<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.next_sibling_names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Validate and compile into an immutable [`NodeRule`].
    ///
    /// All violations are collected before returning; a spec missing both
    /// name and level reports both.
    pub fn build(self) -> Result<NodeRule, RuleErrors> {
        let mut errors = Vec::new();

        let name = match self.name.as_deref() {
            None | Some("") => {
                errors.push(RuleError::MissingName);
                None
            }
            Some(NULL_NAME) => {
                errors.push(RuleError::ReservedName(NULL_NAME.to_string()));
                None
            }
            Some(n) => Some(n.to_string()),
        };

        if self.level.is_none() {
            errors.push(RuleError::MissingLevel);
        }

        let title = FieldMatcher::build(
            self.title_pattern,
            self.title_regex,
            RuleError::TitleConflict,
            |regex, message| RuleError::InvalidTitleRegex { regex, message },
            &mut errors,
        );
        let data = FieldMatcher::build(
            self.data_pattern,
            self.data_regex,
            RuleError::DataConflict,
            |regex, message| RuleError::InvalidDataRegex { regex, message },
            &mut errors,
        );

        if !errors.is_empty() {
            return Err(RuleErrors::new(
                name.unwrap_or_else(|| "<unnamed>".to_string()),
                errors,
            ));
        }

        Ok(NodeRule {
            // errors is empty, so name and level were both validated present
            name: name.unwrap_or_default(),
            level: self.level.unwrap_or_default(),
            title,
            data,
            parent_names: defaulted(self.parent_names),
            child_names: defaulted(self.child_names),
            prev_sibling_names: defaulted(self.prev_sibling_names),
            next_sibling_names: defaulted(self.next_sibling_names),
        })
    }
}

fn defaulted(names: Vec<String>) -> Vec<String> {
    if names.is_empty() {
        vec![NULL_NAME.to_string()]
    } else {
        names
    }
}

// =============================================================================
// Field Matcher
// =============================================================================

/// Compiled constraint on one text field (title or data)
#[derive(Debug, Clone)]
struct FieldMatcher {
    /// Original pattern string, when the constraint was pattern-derived
    pattern: Option<String>,
    /// Unanchored regex text, present whenever the field is constrained
    regex_text: Option<String>,
    /// Whole-string matcher compiled from `regex_text`
    matcher: Option<Regex>,
}

impl FieldMatcher {
    fn build(
        pattern: Option<String>,
        regex: Option<String>,
        conflict: RuleError,
        invalid: impl Fn(String, String) -> RuleError,
        errors: &mut Vec<RuleError>,
    ) -> Self {
        let unconstrained = Self {
            pattern: None,
            regex_text: None,
            matcher: None,
        };

        let (pattern, regex_text) = match (pattern, regex) {
            (Some(_), Some(_)) => {
                errors.push(conflict);
                return unconstrained;
            }
            (Some(p), None) => {
                let derived = pattern::to_regex(&p);
                (Some(p), derived)
            }
            (None, Some(r)) => (None, r),
            (None, None) => return unconstrained,
        };

        match pattern::compile(&regex_text) {
            Ok(matcher) => Self {
                pattern,
                regex_text: Some(regex_text),
                matcher: Some(matcher),
            },
            Err(e) => {
                errors.push(invalid(regex_text, e.to_string()));
                unconstrained
            }
        }
    }

    fn matches(&self, text: &str) -> bool {
        match &self.matcher {
            Some(matcher) => matcher.is_match(text),
            None => true,
        }
    }
}

// =============================================================================
// Node Rule
// =============================================================================

/// One validated, immutable schema rule
#[derive(Debug, Clone)]
pub struct NodeRule {
    name: String,
    level: usize,
    title: FieldMatcher,
    data: FieldMatcher,
    parent_names: Vec<String>,
    child_names: Vec<String>,
    prev_sibling_names: Vec<String>,
    next_sibling_names: Vec<String>,
}

impl NodeRule {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn level(&self) -> usize {
        self.level
    }

    /// Test a title against this rule; an unconstrained field matches anything
    pub fn matches_title(&self, title: &str) -> bool {
        self.title.matches(title)
    }

    pub fn matches_data(&self, data: &str) -> bool {
        self.data.matches(data)
    }

    /// Original title pattern string, if the title was pattern-derived
    pub fn title_pattern(&self) -> Option<&str> {
        self.title.pattern.as_deref()
    }

    /// Unanchored title regex text, present whenever the title is constrained
    pub fn title_regex(&self) -> Option<&str> {
        self.title.regex_text.as_deref()
    }

    pub fn data_pattern(&self) -> Option<&str> {
        self.data.pattern.as_deref()
    }

    pub fn data_regex(&self) -> Option<&str> {
        self.data.regex_text.as_deref()
    }

    /// Legal parent rule names; never empty, `["<null>"]` when unspecified
    pub fn parent_names(&self) -> &[String] {
        &self.parent_names
    }

    pub fn child_names(&self) -> &[String] {
        &self.child_names
    }

    pub fn prev_sibling_names(&self) -> &[String] {
        &self.prev_sibling_names
    }

    pub fn next_sibling_names(&self) -> &[String] {
        &self.next_sibling_names
    }

    /// Reconstruct the spec this rule was built from
    pub fn to_spec(&self) -> RuleSpec {
        RuleSpec {
            name: Some(self.name.clone()),
            level: Some(self.level),
            title_pattern: self.title.pattern.clone(),
            title_regex: if self.title.pattern.is_none() {
                self.title.regex_text.clone()
            } else {
                None
            },
            data_pattern: self.data.pattern.clone(),
            data_regex: if self.data.pattern.is_none() {
                self.data.regex_text.clone()
            } else {
                None
            },
            parent_names: self.parent_names.clone(),
            child_names: self.child_names.clone(),
            prev_sibling_names: self.prev_sibling_names.clone(),
            next_sibling_names: self.next_sibling_names.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_rule_builds() {
        let rule = RuleSpec::new("photo").with_level(1).build().unwrap();
        assert_eq!(rule.name(), "photo");
        assert_eq!(rule.level(), 1);
        assert!(rule.matches_title("anything at all"));
        assert!(rule.matches_data(""));
    }

    #[test]
    fn test_unspecified_neighbors_default_to_null() {
        let rule = RuleSpec::new("photo").with_level(1).build().unwrap();
        assert_eq!(rule.parent_names(), [NULL_NAME]);
        assert_eq!(rule.child_names(), [NULL_NAME]);
        assert_eq!(rule.prev_sibling_names(), [NULL_NAME]);
        assert_eq!(rule.next_sibling_names(), [NULL_NAME]);
    }

    #[test]
    fn test_missing_name_and_level_aggregate() {
        let err = RuleSpec::default().build().unwrap_err();
        assert_eq!(err.len(), 2);
        assert!(err.errors.contains(&RuleError::MissingName));
        assert!(err.errors.contains(&RuleError::MissingLevel));
    }

    #[test]
    fn test_pattern_regex_conflict_per_field() {
        let err = RuleSpec::new("photo")
            .with_level(1)
            .with_title_pattern("<text>")
            .with_title_regex(".*")
            .with_data_pattern("<#>")
            .with_data_regex(r"\d+")
            .build()
            .unwrap_err();

        assert_eq!(err.len(), 2);
        assert!(err.errors.contains(&RuleError::TitleConflict));
        assert!(err.errors.contains(&RuleError::DataConflict));
    }

    #[test]
    fn test_invalid_raw_regex_is_collected() {
        let err = RuleSpec::new("photo")
            .with_level(1)
            .with_title_regex("(unclosed")
            .build()
            .unwrap_err();

        assert_eq!(err.len(), 1);
        assert!(matches!(err.errors[0], RuleError::InvalidTitleRegex { .. }));
    }

    #[test]
    fn test_reserved_name_rejected() {
        let err = RuleSpec::new(NULL_NAME).with_level(0).build().unwrap_err();
        assert!(err
            .errors
            .contains(&RuleError::ReservedName(NULL_NAME.to_string())));
    }

    #[test]
    fn test_pattern_derived_matcher() {
        let rule = RuleSpec::new("photo")
            .with_level(1)
            .with_title_pattern("<imagefile>")
            .with_data_pattern("<#>")
            .build()
            .unwrap();

        assert!(rule.matches_title("beach.jpg"));
        assert!(!rule.matches_title("beach.png"));
        assert!(rule.matches_data("123"));
        assert!(!rule.matches_data("12x"));

        assert_eq!(rule.title_pattern(), Some("<imagefile>"));
        assert_eq!(rule.title_regex(), Some(r".*\.jpg"));
    }

    #[test]
    fn test_raw_regex_matcher_is_anchored() {
        let rule = RuleSpec::new("photo")
            .with_level(1)
            .with_title_regex(r"\d+")
            .build()
            .unwrap();

        assert!(rule.matches_title("42"));
        assert!(!rule.matches_title("42x"));
        assert_eq!(rule.title_pattern(), None);
        assert_eq!(rule.title_regex(), Some(r"\d+"));
    }

    #[test]
    fn test_single_name_parent_append() {
        let rule = RuleSpec::new("caption")
            .with_level(2)
            .add_parent("photo")
            .add_parent("scan")
            .build()
            .unwrap();

        assert_eq!(rule.parent_names(), ["photo", "scan"]);
    }

    #[test]
    fn test_spec_round_trip() {
        let spec = RuleSpec::new("photo")
            .with_level(1)
            .with_title_pattern("<imagefile>")
            .with_data_regex(r"\d+")
            .with_children(["caption"])
            .with_next_siblings(["photo", NULL_NAME]);

        let rebuilt = spec.clone().build().unwrap().to_spec();
        let mut expected = spec;
        expected.parent_names = vec![NULL_NAME.to_string()];
        expected.prev_sibling_names = vec![NULL_NAME.to_string()];
        assert_eq!(rebuilt, expected);
    }
}
