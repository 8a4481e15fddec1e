//! File format schemas
//!
//! A [`FormatSchema`] is an immutable, ordered collection of [`NodeRule`]s
//! plus the file extension it applies to. Rule names are unique within a
//! schema and indexed for lookup during verification.

use std::collections::HashMap;

use crate::error::{FormatError, Result};
use crate::rule::{NodeRule, NULL_NAME};

/// An immutable schema: file extension plus ordered rules
#[derive(Debug, Clone)]
pub struct FormatSchema {
    extension: String,
    rules: Vec<NodeRule>,
    by_name: HashMap<String, usize>,
    head_candidates: Vec<String>,
}

impl FormatSchema {
    /// Build a schema from an extension and a non-empty rule list.
    ///
    /// The extension is normalized to carry a leading period. The head
    /// candidate set defaults to the first rule's name; schemas that follow
    /// the convention of naming their entry rule `head` keep the original
    /// behavior of verifying documents against `{"head"}`.
    pub fn new(extension: impl Into<String>, rules: Vec<NodeRule>) -> Result<Self> {
        if rules.is_empty() {
            return Err(FormatError::EmptySchema);
        }

        let mut by_name = HashMap::with_capacity(rules.len());
        for (index, rule) in rules.iter().enumerate() {
            if by_name.insert(rule.name().to_string(), index).is_some() {
                return Err(FormatError::DuplicateRule {
                    name: rule.name().to_string(),
                });
            }
        }

        let head_candidates = vec![rules[0].name().to_string()];

        Ok(Self {
            extension: normalize_extension(extension.into()),
            rules,
            by_name,
            head_candidates,
        })
    }

    /// Replace the head candidate set.
    ///
    /// Every non-sentinel name must be a rule in this schema.
    pub fn with_head_candidates<I, S>(mut self, names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        for name in &names {
            if name != NULL_NAME && !self.by_name.contains_key(name) {
                return Err(FormatError::UnknownHeadCandidate { name: name.clone() });
            }
        }
        self.head_candidates = names;
        Ok(self)
    }

    /// The applicable file extension, with its leading period
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// All rules in declaration order
    pub fn rules(&self) -> &[NodeRule] {
        &self.rules
    }

    /// Look up a rule by name
    pub fn rule(&self, name: &str) -> Option<&NodeRule> {
        self.by_name.get(name).map(|&index| &self.rules[index])
    }

    /// Candidate names a document's head node is verified against
    pub fn head_candidates(&self) -> &[String] {
        &self.head_candidates
    }

    /// Case-insensitive extension comparison
    pub fn matches_extension(&self, actual: &str) -> bool {
        self.extension.eq_ignore_ascii_case(actual)
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}

fn normalize_extension(extension: String) -> String {
    if extension.starts_with('.') {
        extension
    } else {
        format!(".{}", extension)
    }
}
