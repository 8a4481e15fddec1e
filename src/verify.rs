//! Schema conformance checking
//!
//! A [`Verifier`] walks a document tree and classifies every node against
//! the schema's rules. At each position an ordered candidate list says which
//! rules are legal; the node is tested against each candidate in turn
//! (title, data and level independently, so every mismatch surfaces as its
//! own diagnostic) and the first candidate passing all three is selected.
//! There is no backtracking: schemas are authored so that title, data and
//! level alone disambiguate the node kind at each position, which keeps the
//! walk linear. When two candidates overlap, order them from most to least
//! specific.
//!
//! A failed check is never an error. Every sub-check folds into the boolean
//! verdict and leaves a diagnostic behind; the walk always completes.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::diagnostics::{DiagnosticCode, DiagnosticItem, DiagnosticSink, Diagnostics};
use crate::error::Result;
use crate::loader::TreeLoader;
use crate::rule::{NodeRule, NULL_NAME};
use crate::schema::FormatSchema;
use crate::tree::{NodeId, Tree};

// =============================================================================
// Report
// =============================================================================

/// Outcome of one verification run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyReport {
    pub passed: bool,
    pub diagnostics: Diagnostics,
}

// =============================================================================
// Extension Derivation
// =============================================================================

/// Extension of a file name: everything from the *first* period of the last
/// path segment onward, period included.
///
/// `a.b.txt` therefore yields `.b.txt`, and a name without a period yields
/// the empty string.
pub fn file_extension(path: &Path) -> String {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    match name.find('.') {
        Some(idx) => name[idx..].to_string(),
        None => String::new(),
    }
}

// =============================================================================
// Verifier
// =============================================================================

/// Checks document trees against one schema
#[derive(Debug, Clone, Copy)]
pub struct Verifier<'a> {
    schema: &'a FormatSchema,
}

impl<'a> Verifier<'a> {
    pub fn new(schema: &'a FormatSchema) -> Self {
        Self { schema }
    }

    /// Load `path` with `loader` and check it end to end.
    ///
    /// The verdict is the extension check AND the tree check; an extension
    /// mismatch is recorded but never stops the tree from being checked.
    /// Only loading itself can fail.
    pub fn verify_file(&self, path: &Path, loader: &dyn TreeLoader) -> Result<VerifyReport> {
        let subject = path.display().to_string();
        let mut diagnostics = Diagnostics::new();
        diagnostics.push(DiagnosticItem::new(
            &subject,
            DiagnosticCode::CheckStarted,
            format!("checking against the {:?} schema", self.schema.extension()),
        ));
        tracing::info!(
            "verifying {:?} against the {:?} schema",
            path,
            self.schema.extension()
        );

        let actual = file_extension(path);
        let extension_ok = self.schema.matches_extension(&actual);
        if !extension_ok {
            diagnostics.push(DiagnosticItem::new(
                &subject,
                DiagnosticCode::ExtensionMismatch,
                format!(
                    "file extension {:?} does not match schema extension {:?}",
                    actual,
                    self.schema.extension()
                ),
            ));
        }

        let tree = loader.load(path)?;
        let tree_ok = self.verify_tree_into(&tree, &mut diagnostics);

        let passed = extension_ok && tree_ok;
        diagnostics.push(DiagnosticItem::new(
            &subject,
            DiagnosticCode::CheckCompleted,
            format!("check {}", if passed { "passed" } else { "failed" }),
        ));
        tracing::info!("verification of {:?} {}", path, if passed { "passed" } else { "failed" });

        Ok(VerifyReport {
            passed,
            diagnostics,
        })
    }

    /// Check an already-loaded tree, collecting diagnostics into a fresh report
    pub fn verify_tree(&self, tree: &Tree) -> VerifyReport {
        let mut diagnostics = Diagnostics::new();
        let passed = self.verify_tree_into(tree, &mut diagnostics);
        VerifyReport {
            passed,
            diagnostics,
        }
    }

    /// Check an already-loaded tree against an injected diagnostic sink.
    ///
    /// The head node is verified against the schema's head candidates; the
    /// walk proceeds first-child/next-sibling from there.
    pub fn verify_tree_into(&self, tree: &Tree, sink: &mut dyn DiagnosticSink) -> bool {
        self.verify_chain(tree, Some(tree.head()), self.schema.head_candidates(), None, sink)
    }

    /// Verify one sibling chain, recursing into children.
    ///
    /// Siblings are walked iteratively, so stack depth grows with tree depth
    /// only. The chain's verdict is the AND of every node and child verdict,
    /// and all of them are evaluated; a failed child never hides its
    /// siblings' diagnostics.
    fn verify_chain(
        &self,
        tree: &Tree,
        start: Option<NodeId>,
        candidates: &[String],
        origin: Option<NodeId>,
        sink: &mut dyn DiagnosticSink,
    ) -> bool {
        let mut node = start;
        let mut candidates = candidates;
        let mut origin = origin;
        let mut ok = true;

        loop {
            let id = match node {
                Some(id) => id,
                None => {
                    if !candidates.iter().any(|name| name == NULL_NAME) {
                        let mut item = DiagnosticItem::new(
                            candidates.join(", "),
                            DiagnosticCode::MissingNode,
                            format!(
                                "a node is required here; expected one of: {}",
                                candidates.join(", ")
                            ),
                        );
                        if let Some(from) = origin {
                            item = item.at_node(from);
                        }
                        sink.emit(item);
                        ok = false;
                    }
                    return ok;
                }
            };

            match self.identify(tree, id, candidates, sink) {
                Some(rule) => {
                    let children_ok =
                        self.verify_chain(tree, tree.first_child(id), rule.child_names(), Some(id), sink);
                    ok = children_ok && ok;

                    node = tree.next_sibling(id);
                    candidates = rule.next_sibling_names();
                    origin = Some(id);
                }
                None => {
                    // without an identity there is no candidate list to
                    // continue the chain with
                    return false;
                }
            }
        }
    }

    /// Scan the candidate list in order and return the first rule the node
    /// satisfies. Title, data and level are each tested on every attempted
    /// candidate, one trace diagnostic per mismatch.
    fn identify(
        &self,
        tree: &Tree,
        id: NodeId,
        candidates: &[String],
        sink: &mut dyn DiagnosticSink,
    ) -> Option<&'a NodeRule> {
        for name in candidates {
            if name == NULL_NAME {
                continue;
            }
            let rule = match self.schema.rule(name) {
                Some(rule) => rule,
                None => {
                    sink.emit(
                        DiagnosticItem::new(
                            name,
                            DiagnosticCode::UnknownCandidate,
                            format!("candidate {:?} names no rule in the schema", name),
                        )
                        .at_node(id),
                    );
                    continue;
                }
            };

            tracing::trace!("testing node {} against candidate {:?}", id, name);
            let title_ok = rule.matches_title(tree.title(id));
            let data_ok = rule.matches_data(tree.data(id));
            let level_ok = rule.level() == tree.level(id);

            if !title_ok {
                sink.emit(
                    DiagnosticItem::new(
                        name,
                        DiagnosticCode::TitleMismatch,
                        format!(
                            "title {:?} does not match {}",
                            tree.title(id),
                            expectation(rule.title_pattern(), rule.title_regex())
                        ),
                    )
                    .at_node(id),
                );
            }
            if !data_ok {
                sink.emit(
                    DiagnosticItem::new(
                        name,
                        DiagnosticCode::DataMismatch,
                        format!(
                            "data {:?} does not match {}",
                            tree.data(id),
                            expectation(rule.data_pattern(), rule.data_regex())
                        ),
                    )
                    .at_node(id),
                );
            }
            if !level_ok {
                sink.emit(
                    DiagnosticItem::new(
                        name,
                        DiagnosticCode::LevelMismatch,
                        format!(
                            "node sits at level {} but rule {:?} declares level {}",
                            tree.level(id),
                            name,
                            rule.level()
                        ),
                    )
                    .at_node(id),
                );
            }

            if title_ok && data_ok && level_ok {
                sink.emit(
                    DiagnosticItem::new(
                        name,
                        DiagnosticCode::CandidateSelected,
                        format!("node identified as {:?}", name),
                    )
                    .at_node(id),
                );
                return Some(rule);
            }
        }

        sink.emit(
            DiagnosticItem::new(
                tree.title(id),
                DiagnosticCode::NodeUnidentified,
                format!(
                    "node could not be identified; candidates: {}",
                    candidates.join(", ")
                ),
            )
            .at_node(id),
        );
        None
    }
}

fn expectation(pattern: Option<&str>, regex: Option<&str>) -> String {
    match (pattern, regex) {
        (Some(p), _) => format!("pattern {:?}", p),
        (None, Some(r)) => format!("regex {:?}", r),
        (None, None) => "any text".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::RuleSpec;

    fn single_root_schema() -> FormatSchema {
        let root = RuleSpec::new("root")
            .with_level(0)
            .with_title_pattern("<text>")
            .with_data_pattern("<text>")
            .build()
            .unwrap();
        FormatSchema::new(".txt", vec![root]).unwrap()
    }

    fn album_schema() -> FormatSchema {
        let album = RuleSpec::new("album")
            .with_level(0)
            .with_title_pattern("album")
            .with_data_pattern("<text>")
            .with_children(["photo"])
            .build()
            .unwrap();
        let photo = RuleSpec::new("photo")
            .with_level(1)
            .with_title_pattern("<imagefile>")
            .with_data_pattern("<text>")
            .with_next_siblings(["photo", NULL_NAME])
            .build()
            .unwrap();
        FormatSchema::new(".alb", vec![album, photo]).unwrap()
    }

    fn codes(report: &VerifyReport) -> Vec<DiagnosticCode> {
        report.diagnostics.all().iter().map(|d| d.code).collect()
    }

    #[test]
    fn test_single_head_node_passes() {
        let schema = single_root_schema();
        let tree = Tree::new("anything", "whatsoever");
        assert!(Verifier::new(&schema).verify_tree(&tree).passed);
    }

    #[test]
    fn test_unexpected_child_fails() {
        let schema = single_root_schema();
        let mut tree = Tree::new("anything", "");
        tree.add_child(tree.head(), "extra", "");

        let report = Verifier::new(&schema).verify_tree(&tree);
        assert!(!report.passed);
        assert!(codes(&report).contains(&DiagnosticCode::NodeUnidentified));
    }

    #[test]
    fn test_missing_required_child_fails() {
        let schema = album_schema();
        let tree = Tree::new("album", "summer");

        let report = Verifier::new(&schema).verify_tree(&tree);
        assert!(!report.passed);
        assert!(codes(&report).contains(&DiagnosticCode::MissingNode));
    }

    #[test]
    fn test_album_with_photos_passes() {
        let schema = album_schema();
        let mut tree = Tree::new("album", "summer");
        let head = tree.head();
        tree.add_child(head, "beach.jpg", "low tide");
        tree.add_child(head, "dunes.jpg", "");

        let report = Verifier::new(&schema).verify_tree(&tree);
        assert!(report.passed, "{}", report.diagnostics);
    }

    #[test]
    fn test_level_mismatch_is_diagnosed() {
        let root = RuleSpec::new("root")
            .with_level(0)
            .with_children(["inner"])
            .build()
            .unwrap();
        let inner = RuleSpec::new("inner")
            .with_level(2)
            .build()
            .unwrap();
        let schema = FormatSchema::new(".txt", vec![root, inner]).unwrap();

        // actual child sits at level 1, rule declares 2
        let mut tree = Tree::new("root", "");
        tree.add_child(tree.head(), "inner", "");

        let report = Verifier::new(&schema).verify_tree(&tree);
        assert!(!report.passed);
        assert!(codes(&report).contains(&DiagnosticCode::LevelMismatch));
    }

    #[test]
    fn test_first_match_wins() {
        // both rules accept the node; order [first, second] must pick first
        let root = RuleSpec::new("root")
            .with_level(0)
            .with_children(["first", "second"])
            .build()
            .unwrap();
        let first = RuleSpec::new("first")
            .with_level(1)
            .with_title_pattern("<text>")
            .build()
            .unwrap();
        let second = RuleSpec::new("second")
            .with_level(1)
            .with_title_pattern("<text>")
            .build()
            .unwrap();
        let schema = FormatSchema::new(".txt", vec![root, first, second]).unwrap();

        let mut tree = Tree::new("root", "");
        tree.add_child(tree.head(), "ambiguous", "");

        let report = Verifier::new(&schema).verify_tree(&tree);
        assert!(report.passed);

        let selected: Vec<&str> = report
            .diagnostics
            .all()
            .iter()
            .filter(|d| d.code == DiagnosticCode::CandidateSelected)
            .map(|d| d.subject.as_str())
            .collect();
        assert_eq!(selected, ["root", "first"]);
    }

    #[test]
    fn test_unidentified_node_ends_its_chain() {
        let schema = album_schema();
        let mut tree = Tree::new("album", "summer");
        let head = tree.head();
        let bad = tree.add_child(head, "notes.txt", "");
        tree.add_sibling(bad, "also-bad.png", "");

        let report = Verifier::new(&schema).verify_tree(&tree);
        assert!(!report.passed);
        assert!(codes(&report).contains(&DiagnosticCode::NodeUnidentified));
        // without an identity there is no candidate list for the rest of the
        // chain; the second sibling is never examined
        assert!(!report
            .diagnostics
            .all()
            .iter()
            .any(|d| d.message.contains("also-bad")));
    }

    #[test]
    fn test_unknown_candidate_is_warned_and_skipped() {
        let root = RuleSpec::new("root")
            .with_level(0)
            .with_children(["ghost", NULL_NAME])
            .build()
            .unwrap();
        let schema = FormatSchema::new(".txt", vec![root]).unwrap();

        let mut tree = Tree::new("root", "");
        tree.add_child(tree.head(), "child", "");

        let report = Verifier::new(&schema).verify_tree(&tree);
        assert!(!report.passed);
        assert!(codes(&report).contains(&DiagnosticCode::UnknownCandidate));
        assert!(codes(&report).contains(&DiagnosticCode::NodeUnidentified));
    }

    #[test]
    fn test_verification_is_idempotent() {
        let schema = album_schema();
        let mut tree = Tree::new("album", "summer");
        tree.add_child(tree.head(), "beach.jpg", "");

        let verifier = Verifier::new(&schema);
        let first = verifier.verify_tree(&tree);
        let second = verifier.verify_tree(&tree);
        assert_eq!(first.passed, second.passed);
        assert_eq!(codes(&first), codes(&second));
    }

    #[test]
    fn test_extension_from_first_period() {
        assert_eq!(file_extension(Path::new("photos/a.b.txt")), ".b.txt");
        assert_eq!(file_extension(Path::new("album.alb")), ".alb");
        assert_eq!(file_extension(Path::new("README")), "");
        assert_eq!(file_extension(Path::new("dir.d/README")), "");
    }

    #[test]
    fn test_child_failure_does_not_stop_sibling_walk() {
        let schema = album_schema();
        let mut tree = Tree::new("album", "summer");
        let head = tree.head();
        let first = tree.add_child(head, "beach.jpg", "");
        tree.add_child(first, "unexpected", "");
        tree.add_child(head, "dunes.jpg", "");

        let report = Verifier::new(&schema).verify_tree(&tree);
        assert!(!report.passed);
        assert!(codes(&report).contains(&DiagnosticCode::NodeUnidentified));

        // the second photo is still classified after the first one's
        // subtree failed
        let photos = report
            .diagnostics
            .all()
            .iter()
            .filter(|d| d.code == DiagnosticCode::CandidateSelected)
            .filter(|d| d.subject == "photo")
            .count();
        assert_eq!(photos, 2);
    }
}
