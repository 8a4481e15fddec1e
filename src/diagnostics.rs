//! Diagnostics
//!
//! Verification and schema analysis never abort on a bad document; every
//! finding becomes a structured item emitted into a pluggable sink. The
//! default sink is the ordered [`Diagnostics`] collection, which preserves
//! emission order so coarse findings ("node could not be identified") follow
//! the fine-grained attempts that explain them.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::tree::NodeId;

// =============================================================================
// Diagnostic Codes
// =============================================================================

/// Diagnostic code for categorizing findings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticCode {
    // === Verification progress ===
    /// A file check started
    CheckStarted,
    /// A file check completed with a verdict
    CheckCompleted,

    // === Verification findings ===
    /// Actual file extension differs from the schema's
    ExtensionMismatch,
    /// No candidate rule matched a present node
    NodeUnidentified,
    /// A node is absent where the candidate set does not allow absence
    MissingNode,
    /// A candidate name has no rule in the schema (skipped)
    UnknownCandidate,

    // === Per-candidate attempts ===
    /// Candidate rejected: title did not match
    TitleMismatch,
    /// Candidate rejected: data did not match
    DataMismatch,
    /// Candidate rejected: node depth differs from declared level
    LevelMismatch,
    /// Candidate accepted for a node
    CandidateSelected,

    // === Static schema analysis ===
    /// A neighbor list references a name that is no rule in the schema
    UnknownRuleName,
    /// A declared level contradicts the referring rule's level
    LevelConflict,
    /// Rule can never be reached from the head candidates
    UnreachableRule,
}

impl DiagnosticCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CheckStarted => "I001",
            Self::CheckCompleted => "I002",
            Self::ExtensionMismatch => "W001",
            Self::NodeUnidentified => "W002",
            Self::MissingNode => "W003",
            Self::UnknownCandidate => "W004",
            Self::TitleMismatch => "T001",
            Self::DataMismatch => "T002",
            Self::LevelMismatch => "T003",
            Self::CandidateSelected => "T004",
            Self::UnknownRuleName => "E001",
            Self::LevelConflict => "E002",
            Self::UnreachableRule => "W005",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::CheckStarted | Self::CheckCompleted => Severity::Info,

            Self::ExtensionMismatch
            | Self::NodeUnidentified
            | Self::MissingNode
            | Self::UnknownCandidate
            | Self::UnreachableRule => Severity::Warning,

            Self::TitleMismatch
            | Self::DataMismatch
            | Self::LevelMismatch
            | Self::CandidateSelected => Severity::Trace,

            Self::UnknownRuleName | Self::LevelConflict => Severity::Error,
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Severity
// =============================================================================

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Trace,
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Trace => write!(f, "trace"),
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

// =============================================================================
// Diagnostic Item
// =============================================================================

/// A single diagnostic item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticItem {
    /// What the finding is about: a node title, rule name or file path
    pub subject: String,
    /// Diagnostic code
    pub code: DiagnosticCode,
    /// Human-readable message
    pub message: String,
    /// Tree position, when the finding concerns a concrete node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<NodeId>,
    /// Additional context (e.g. the candidate list, a suggestion)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub context: Vec<String>,
}

impl DiagnosticItem {
    pub fn new(subject: impl Into<String>, code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            code,
            message: message.into(),
            node: None,
            context: Vec::new(),
        }
    }

    pub fn at_node(mut self, node: NodeId) -> Self {
        self.node = Some(node);
        self
    }

    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        self.context.push(ctx.into());
        self
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }
}

impl fmt::Display for DiagnosticItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {} ({})",
            self.code,
            self.code.severity(),
            self.message,
            self.subject
        )?;

        if let Some(node) = self.node {
            write!(f, " at node {}", node)?;
        }

        for ctx in &self.context {
            write!(f, "\n  - {}", ctx)?;
        }

        Ok(())
    }
}

// =============================================================================
// Sink
// =============================================================================

/// Receiver for diagnostic items.
///
/// The verifier and the schema analyzer emit into a sink instead of logging;
/// [`Diagnostics`] is the collecting implementation, callers with streaming
/// needs plug in their own.
pub trait DiagnosticSink {
    fn emit(&mut self, item: DiagnosticItem);
}

impl DiagnosticSink for Diagnostics {
    fn emit(&mut self, item: DiagnosticItem) {
        self.push(item);
    }
}

// =============================================================================
// Diagnostics Collection
// =============================================================================

/// Ordered collection of diagnostics from one verification or analysis run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    items: Vec<DiagnosticItem>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a diagnostic item
    pub fn push(&mut self, item: DiagnosticItem) {
        self.items.push(item);
    }

    /// Shorthand for pushing a context-free item
    pub fn add(&mut self, subject: impl Into<String>, code: DiagnosticCode, message: impl Into<String>) {
        self.push(DiagnosticItem::new(subject, code, message));
    }

    /// Check if there are any errors
    pub fn has_errors(&self) -> bool {
        self.items.iter().any(|i| i.severity() == Severity::Error)
    }

    /// Check if there are any warnings
    pub fn has_warnings(&self) -> bool {
        self.items.iter().any(|i| i.severity() == Severity::Warning)
    }

    /// Get all errors
    pub fn errors(&self) -> impl Iterator<Item = &DiagnosticItem> {
        self.items.iter().filter(|i| i.severity() == Severity::Error)
    }

    /// Get all warnings
    pub fn warnings(&self) -> impl Iterator<Item = &DiagnosticItem> {
        self.items.iter().filter(|i| i.severity() == Severity::Warning)
    }

    /// Get all items in emission order
    pub fn all(&self) -> &[DiagnosticItem] {
        &self.items
    }

    /// Get total count
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Count errors
    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    /// Count warnings
    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }

    /// Merge another Diagnostics into this one
    pub fn merge(&mut self, other: Diagnostics) {
        self.items.extend(other.items);
    }

    /// Format all diagnostics at or above a severity for display
    pub fn format_filtered(&self, min: Severity) -> String {
        let mut output = String::new();

        for item in self.items.iter().filter(|i| i.severity() >= min) {
            output.push_str(&format!("{}\n", item));
        }

        output
    }

    /// Format all diagnostics for display, with a summary line
    pub fn format_all(&self) -> String {
        let mut output = self.format_filtered(Severity::Trace);

        if self.has_errors() {
            output.push_str(&format!(
                "\n{} error(s), {} warning(s)\n",
                self.error_count(),
                self.warning_count()
            ));
        } else if self.has_warnings() {
            output.push_str(&format!("\n{} warning(s)\n", self.warning_count()));
        }

        output
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_all())
    }
}

impl IntoIterator for Diagnostics {
    type Item = DiagnosticItem;
    type IntoIter = std::vec::IntoIter<DiagnosticItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a DiagnosticItem;
    type IntoIter = std::slice::Iter<'a, DiagnosticItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
