//! Static schema analysis
//!
//! Builds a rule relationship graph with petgraph and checks it for
//! authoring mistakes that verification alone would only surface once a
//! document happens to hit them: candidate names that spell no rule, level
//! declarations that contradict the referring rule, and rules the verifier
//! can never select. Provides a GraphViz export for inspecting a schema's
//! shape.

use std::collections::{HashMap, HashSet};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};

use crate::diagnostics::{DiagnosticCode, DiagnosticItem, Diagnostics};
use crate::rule::{NodeRule, NULL_NAME};
use crate::schema::FormatSchema;

/// Relationship one rule declares toward another
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    /// Entry edge from the document head to a head candidate
    Head,
    /// Referenced as a legal first child
    Child,
    /// Referenced as a legal next sibling
    NextSibling,
    /// Referenced as a legal parent
    Parent,
    /// Referenced as a legal previous sibling
    PrevSibling,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Head => "head",
            Self::Child => "child",
            Self::NextSibling => "next-sibling",
            Self::Parent => "parent",
            Self::PrevSibling => "prev-sibling",
        }
    }
}

/// Convenience wrapper: build the graph and run every check
pub fn analyze_schema(schema: &FormatSchema) -> Diagnostics {
    RuleGraph::new(schema).analyze()
}

/// Rule relationship graph of one schema
pub struct RuleGraph<'a> {
    schema: &'a FormatSchema,
    graph: DiGraph<String, EdgeKind>,
    node_indices: HashMap<String, NodeIndex>,
    /// Synthetic node standing for the document head position
    entry: NodeIndex,
}

impl<'a> RuleGraph<'a> {
    /// One node per rule plus a synthetic entry node; a typed edge for every
    /// named relationship. Names that spell no rule get no edge and are
    /// reported by [`RuleGraph::analyze`] instead.
    pub fn new(schema: &'a FormatSchema) -> Self {
        let mut graph = DiGraph::new();
        let mut node_indices = HashMap::new();

        for rule in schema.rules() {
            let idx = graph.add_node(rule.name().to_string());
            node_indices.insert(rule.name().to_string(), idx);
        }
        let entry = graph.add_node("document head".to_string());

        for name in schema.head_candidates() {
            if let Some(&target) = node_indices.get(name) {
                graph.add_edge(entry, target, EdgeKind::Head);
            }
        }

        for rule in schema.rules() {
            let source = node_indices[rule.name()];
            for (names, kind) in [
                (rule.child_names(), EdgeKind::Child),
                (rule.next_sibling_names(), EdgeKind::NextSibling),
                (rule.parent_names(), EdgeKind::Parent),
                (rule.prev_sibling_names(), EdgeKind::PrevSibling),
            ] {
                for name in names {
                    if name == NULL_NAME {
                        continue;
                    }
                    if let Some(&target) = node_indices.get(name.as_str()) {
                        graph.add_edge(source, target, kind);
                    }
                }
            }
        }

        Self {
            schema,
            graph,
            node_indices,
            entry,
        }
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Run every check
    pub fn analyze(&self) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();
        self.check_unknown_names(&mut diagnostics);
        self.check_level_conflicts(&mut diagnostics);
        self.check_reachability(&mut diagnostics);
        tracing::debug!(
            "analysis of the {:?} schema produced {} finding(s)",
            self.schema.extension(),
            diagnostics.len()
        );
        diagnostics
    }

    fn check_unknown_names(&self, diagnostics: &mut Diagnostics) {
        for rule in self.schema.rules() {
            for (names, place) in [
                (rule.child_names(), "child"),
                (rule.next_sibling_names(), "next-sibling"),
                (rule.parent_names(), "parent"),
                (rule.prev_sibling_names(), "prev-sibling"),
            ] {
                for name in names {
                    if name == NULL_NAME || self.schema.rule(name).is_some() {
                        continue;
                    }
                    let mut item = DiagnosticItem::new(
                        rule.name(),
                        DiagnosticCode::UnknownRuleName,
                        format!("{} candidate {:?} names no rule in the schema", place, name),
                    );
                    if let Some(suggestion) = self.closest_rule_name(name) {
                        item = item.with_context(format!("did you mean {:?}?", suggestion));
                    }
                    diagnostics.push(item);
                }
            }
        }
    }

    /// Closest existing rule name, for "did you mean" hints
    fn closest_rule_name(&self, name: &str) -> Option<&str> {
        use fuzzy_matcher::skim::SkimMatcherV2;
        use fuzzy_matcher::FuzzyMatcher;

        let matcher = SkimMatcherV2::default();
        self.schema
            .rules()
            .iter()
            .filter_map(|rule| {
                // a typo may add or drop characters, so match both ways
                let score = matcher
                    .fuzzy_match(rule.name(), name)
                    .max(matcher.fuzzy_match(name, rule.name()));
                score.map(|s| (s, rule.name()))
            })
            .max_by_key(|(score, _)| *score)
            .map(|(_, best)| best)
    }

    /// A child candidate must sit one level below the referrer, a sibling at
    /// the same level, a parent one above.
    fn check_level_conflicts(&self, diagnostics: &mut Diagnostics) {
        for rule in self.schema.rules() {
            let level = rule.level();

            for name in rule.child_names() {
                if let Some(child) = self.known(name) {
                    if child.level() != level + 1 {
                        diagnostics.push(DiagnosticItem::new(
                            rule.name(),
                            DiagnosticCode::LevelConflict,
                            format!(
                                "child candidate {:?} declares level {}, expected {}",
                                name,
                                child.level(),
                                level + 1
                            ),
                        ));
                    }
                }
            }

            for (names, place) in [
                (rule.next_sibling_names(), "next-sibling"),
                (rule.prev_sibling_names(), "prev-sibling"),
            ] {
                for name in names {
                    if let Some(sibling) = self.known(name) {
                        if sibling.level() != level {
                            diagnostics.push(DiagnosticItem::new(
                                rule.name(),
                                DiagnosticCode::LevelConflict,
                                format!(
                                    "{} candidate {:?} declares level {}, expected {}",
                                    place,
                                    name,
                                    sibling.level(),
                                    level
                                ),
                            ));
                        }
                    }
                }
            }

            for name in rule.parent_names() {
                if let Some(parent) = self.known(name) {
                    match level.checked_sub(1) {
                        Some(expected) if parent.level() == expected => {}
                        Some(expected) => diagnostics.push(DiagnosticItem::new(
                            rule.name(),
                            DiagnosticCode::LevelConflict,
                            format!(
                                "parent candidate {:?} declares level {}, expected {}",
                                name,
                                parent.level(),
                                expected
                            ),
                        )),
                        None => diagnostics.push(DiagnosticItem::new(
                            rule.name(),
                            DiagnosticCode::LevelConflict,
                            format!("a rule at level 0 cannot have parent candidate {:?}", name),
                        )),
                    }
                }
            }
        }
    }

    /// The verifier only ever reaches a rule through head, child and
    /// next-sibling candidate lists; a rule outside that cone is dead.
    fn check_reachability(&self, diagnostics: &mut Diagnostics) {
        let mut visited = HashSet::new();
        let mut stack = vec![self.entry];

        while let Some(idx) = stack.pop() {
            if !visited.insert(idx) {
                continue;
            }
            for edge in self.graph.edges_directed(idx, Direction::Outgoing) {
                if matches!(
                    edge.weight(),
                    EdgeKind::Head | EdgeKind::Child | EdgeKind::NextSibling
                ) {
                    stack.push(edge.target());
                }
            }
        }

        for rule in self.schema.rules() {
            if !visited.contains(&self.node_indices[rule.name()]) {
                diagnostics.push(DiagnosticItem::new(
                    rule.name(),
                    DiagnosticCode::UnreachableRule,
                    format!(
                        "rule {:?} can never be selected from the head candidates",
                        rule.name()
                    ),
                ));
            }
        }
    }

    /// Export the rule graph to GraphViz DOT format
    pub fn to_dot(&self) -> String {
        let mut output = String::new();
        output.push_str("digraph RuleGraph {\n");
        output.push_str("  rankdir=LR;\n");
        output.push_str(
            "  node [shape=box, style=rounded, fontname=\"Helvetica\", fontsize=10];\n",
        );
        output.push_str("  edge [fontname=\"Helvetica\", fontsize=8];\n\n");

        output.push_str("  \"document_head\" [label=\"document head\", shape=ellipse];\n");
        for rule in self.schema.rules() {
            output.push_str(&format!(
                "  \"{}\" [label=\"{}\\nlevel {}\"];\n",
                dot_id(rule.name()),
                rule.name(),
                rule.level()
            ));
        }

        output.push('\n');
        for edge in self.graph.edge_references() {
            if let (Some(source), Some(target)) = (
                self.graph.node_weight(edge.source()),
                self.graph.node_weight(edge.target()),
            ) {
                let source_id = if edge.source() == self.entry {
                    "document_head".to_string()
                } else {
                    dot_id(source)
                };
                output.push_str(&format!(
                    "  \"{}\" -> \"{}\" [label=\"{}\"];\n",
                    source_id,
                    dot_id(target),
                    edge.weight().as_str()
                ));
            }
        }

        output.push_str("}\n");
        output
    }

    fn known(&self, name: &str) -> Option<&NodeRule> {
        if name == NULL_NAME {
            None
        } else {
            self.schema.rule(name)
        }
    }
}

fn dot_id(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}
