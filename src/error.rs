//! Error types for the treeform validator

use std::fmt;

use thiserror::Error;

use crate::tree::NodeId;

/// Result type for format operations
pub type Result<T> = std::result::Result<T, FormatError>;

/// Format and document errors
#[derive(Error, Debug)]
pub enum FormatError {
    #[error("Rule construction failed: {0}")]
    Rule(#[from] RuleErrors),

    #[error("Duplicate rule name in schema: {name}")]
    DuplicateRule { name: String },

    #[error("Schema has no rules")]
    EmptySchema,

    #[error("Head candidate {name:?} is not a rule in this schema")]
    UnknownHeadCandidate { name: String },

    #[error("Version already registered: {format} v{version}")]
    AlreadyRegistered { format: String, version: String },

    #[error("No migration from {from} to {to} registered for format {format}")]
    MigrationUnsupported {
        format: String,
        from: String,
        to: String,
    },

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Node {node} has no line form: empty title with non-empty data")]
    Unrenderable { node: NodeId },

    #[error("Malformed rule encoding: {0}")]
    RuleEncoding(String),

    #[error("Malformed schema encoding: {0}")]
    SchemaEncoding(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A single rule construction violation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    #[error("rule name is required")]
    MissingName,

    #[error("rule name {0:?} is reserved")]
    ReservedName(String),

    #[error("level is required")]
    MissingLevel,

    #[error("title accepts a pattern or a regex, not both")]
    TitleConflict,

    #[error("data accepts a pattern or a regex, not both")]
    DataConflict,

    #[error("invalid title regex {regex:?}: {message}")]
    InvalidTitleRegex { regex: String, message: String },

    #[error("invalid data regex {regex:?}: {message}")]
    InvalidDataRegex { regex: String, message: String },
}

/// All violations found while building one rule, reported as a single list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleErrors {
    pub rule: String,
    pub errors: Vec<RuleError>,
}

impl RuleErrors {
    pub fn new(rule: impl Into<String>, errors: Vec<RuleError>) -> Self {
        Self {
            rule: rule.into(),
            errors,
        }
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl fmt::Display for RuleErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reasons: Vec<String> = self.errors.iter().map(|e| e.to_string()).collect();
        write!(f, "rule {:?}: {}", self.rule, reasons.join("; "))
    }
}

impl std::error::Error for RuleErrors {}
