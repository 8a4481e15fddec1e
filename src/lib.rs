//! Treeform
//!
//! A schema-driven verifier for hierarchical, tab-indented text file formats.
//! A format schema names the node kinds a file may contain and constrains each
//! one by title, data, level, and neighborhood; the verifier walks a parsed
//! document and reports, with structured diagnostics, whether it conforms.
//!
//! ## Features
//!
//! - **Readable schemas**: format schemas are themselves tab-indented text files
//! - **Total pattern language**: wildcard patterns compile to anchored regular
//!   expressions and back, so schemas never carry raw regex syntax
//! - **First-match classification**: each node is identified against an ordered
//!   candidate list with no backtracking
//! - **Structured diagnostics**: every sub-check emits a coded item, from trace
//!   mismatch detail up to errors
//! - **Versioned formats**: a registry holds one schema per version and applies
//!   registered migrations to bring files forward
//!
//! ## Document model
//!
//! ```text
//! album	Summer 2019
//! 	date	2019-07-04
//! 	photo	beach.jpg
//! 		caption	Low tide
//! 	photo	dunes.jpg
//! ```
//!
//! Each line is one node: leading tabs give the level, the text up to the next
//! tab is the title, and the remainder is the data. A schema assigns every node
//! a rule, and the rules say which titles, data, and neighbors are admissible.

pub mod tree;
pub mod pattern;
pub mod rule;
pub mod schema;
pub mod loader;
pub mod encoding;
pub mod verify;
pub mod registry;
pub mod analysis;
pub mod diagnostics;
pub mod checksum;
pub mod config;
pub mod error;

pub use tree::{Node, NodeId, Tree};
pub use rule::{NodeRule, RuleSpec, NULL_NAME};
pub use schema::FormatSchema;
pub use loader::{TextTreeLoader, TreeLoader};
pub use encoding::meta_schema;
pub use verify::{Verifier, VerifyReport};
pub use registry::FormatRegistry;
pub use analysis::{analyze_schema, RuleGraph};
pub use diagnostics::{DiagnosticCode, DiagnosticItem, DiagnosticSink, Diagnostics, Severity};
pub use checksum::Checksum;
pub use config::ValidatorConfig;
pub use error::{FormatError, Result};
