//! Self-hosting schema encoding
//!
//! Rules and schemas render into the same tree format they validate, so a
//! schema can be stored as an ordinary document and read back. The mapping
//! is deliberately a set of pure functions between [`Tree`] and the schema
//! types rather than methods on either, keeping the two layers decoupled.
//!
//! A rule renders as a head node titled [`RULE_TITLE`] (rule name as data)
//! with six children: one node carrying the raw title/data pattern strings,
//! then `level:`, `parents:`, `children:`, `prevSiblings:` and
//! `nextSiblings:` nodes, the lists comma-joined. A whole schema renders as
//! a head titled [`SCHEMA_TITLE`] (extension as data) with one rule subtree
//! per child. [`meta_schema`] returns the built-in schema these documents
//! themselves verify against.

use crate::error::{FormatError, Result};
use crate::pattern;
use crate::rule::{NodeRule, RuleSpec};
use crate::schema::FormatSchema;
use crate::tree::{NodeId, Tree};

/// Head title of an encoded rule
pub const RULE_TITLE: &str = "formatNode";
/// Head title of an encoded schema
pub const SCHEMA_TITLE: &str = "fileFormatSchema";
/// File extension of schema documents
pub const SCHEMA_EXTENSION: &str = ".tfs";

const LEVEL_TITLE: &str = "level:";
const PARENTS_TITLE: &str = "parents:";
const CHILDREN_TITLE: &str = "children:";
const PREV_SIBLINGS_TITLE: &str = "prevSiblings:";
const NEXT_SIBLINGS_TITLE: &str = "nextSiblings:";

// =============================================================================
// Rule Encoding
// =============================================================================

/// Render one rule as a standalone tree
pub fn rule_to_tree(rule: &NodeRule) -> Tree {
    let mut tree = Tree::new(RULE_TITLE, rule.name());
    let head = tree.head();
    append_rule_fields(&mut tree, head, rule);
    tree
}

/// Reconstruct a rule from a tree produced by [`rule_to_tree`]
pub fn rule_from_tree(tree: &Tree) -> Result<NodeRule> {
    let head = tree.head();
    if tree.next_sibling(head).is_some() {
        return Err(FormatError::RuleEncoding(
            "unexpected content after the rule head".to_string(),
        ));
    }
    rule_from_node(tree, head)
}

fn append_rule_fields(tree: &mut Tree, head: NodeId, rule: &NodeRule) {
    tree.add_child(
        head,
        field_pattern(rule.title_pattern(), rule.title_regex()),
        field_pattern(rule.data_pattern(), rule.data_regex()),
    );
    tree.add_child(head, LEVEL_TITLE, rule.level().to_string());
    tree.add_child(head, PARENTS_TITLE, rule.parent_names().join(", "));
    tree.add_child(head, CHILDREN_TITLE, rule.child_names().join(", "));
    tree.add_child(head, PREV_SIBLINGS_TITLE, rule.prev_sibling_names().join(", "));
    tree.add_child(head, NEXT_SIBLINGS_TITLE, rule.next_sibling_names().join(", "));
}

/// Pattern string stored for one field. Rules built from a raw regex store
/// the best-effort reverse translation; unconstrained fields store `<text>`,
/// which accepts the same inputs.
fn field_pattern(pattern: Option<&str>, regex: Option<&str>) -> String {
    match (pattern, regex) {
        (Some(p), _) => p.to_string(),
        (None, Some(r)) => pattern::to_pattern(r),
        (None, None) => "<text>".to_string(),
    }
}

/// Decode one rule whose head sits at `head` within a larger document.
///
/// The first child is the pattern node whatever its title says; the
/// remaining children are recognized by title, in any order.
fn rule_from_node(tree: &Tree, head: NodeId) -> Result<NodeRule> {
    if tree.title(head) != RULE_TITLE {
        return Err(FormatError::RuleEncoding(format!(
            "expected a node titled {:?}, found {:?}",
            RULE_TITLE,
            tree.title(head)
        )));
    }

    let mut spec = RuleSpec::new(tree.data(head));
    let mut children = tree.children(head);

    let patterns = children.next().ok_or_else(|| {
        FormatError::RuleEncoding(format!("rule {:?} has no pattern node", tree.data(head)))
    })?;
    spec.title_pattern = Some(tree.title(patterns).to_string());
    spec.data_pattern = Some(tree.data(patterns).to_string());

    for child in children {
        let value = tree.data(child);
        match tree.title(child) {
            LEVEL_TITLE => {
                spec.level = Some(value.trim().parse().map_err(|_| {
                    FormatError::RuleEncoding(format!("level {:?} is not a number", value))
                })?);
            }
            PARENTS_TITLE => spec.parent_names = split_names(value),
            CHILDREN_TITLE => spec.child_names = split_names(value),
            PREV_SIBLINGS_TITLE => spec.prev_sibling_names = split_names(value),
            NEXT_SIBLINGS_TITLE => spec.next_sibling_names = split_names(value),
            other => {
                return Err(FormatError::RuleEncoding(format!(
                    "unexpected node {:?} in rule {:?}",
                    other,
                    tree.data(head)
                )));
            }
        }
    }

    Ok(spec.build()?)
}

fn split_names(data: &str) -> Vec<String> {
    data.split(',')
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

// =============================================================================
// Schema Encoding
// =============================================================================

/// Render a whole schema as a document tree
pub fn schema_to_tree(schema: &FormatSchema) -> Tree {
    let mut tree = Tree::new(SCHEMA_TITLE, schema.extension());
    let doc_head = tree.head();
    for rule in schema.rules() {
        let rule_head = tree.add_child(doc_head, RULE_TITLE, rule.name());
        append_rule_fields(&mut tree, rule_head, rule);
    }
    tree
}

/// Reconstruct a schema from a tree produced by [`schema_to_tree`].
///
/// The head candidate set is not persisted; the decoded schema falls back to
/// the default, its first rule.
pub fn schema_from_tree(tree: &Tree) -> Result<FormatSchema> {
    let head = tree.head();
    if tree.title(head) != SCHEMA_TITLE {
        return Err(FormatError::SchemaEncoding(format!(
            "expected a head titled {:?}, found {:?}",
            SCHEMA_TITLE,
            tree.title(head)
        )));
    }
    if tree.next_sibling(head).is_some() {
        return Err(FormatError::SchemaEncoding(
            "unexpected content after the schema head".to_string(),
        ));
    }

    let extension = tree.data(head);
    if extension.is_empty() {
        return Err(FormatError::SchemaEncoding(
            "schema document carries no extension".to_string(),
        ));
    }

    let mut rules = Vec::new();
    for child in tree.children(head) {
        rules.push(rule_from_node(tree, child)?);
    }
    FormatSchema::new(extension, rules)
}

// =============================================================================
// Meta-Schema
// =============================================================================

/// The built-in schema for schema documents themselves.
///
/// Extension `.tfs`; its first rule is named `head`, so decoded documents
/// verify from their `fileFormatSchema` node down through each `formatNode`
/// subtree. [`schema_to_tree`] output always conforms to it.
pub fn meta_schema() -> FormatSchema {
    let specs = vec![
        RuleSpec::new("head")
            .with_level(0)
            .with_title_pattern(SCHEMA_TITLE)
            .with_data_pattern("<text>")
            .with_children([RULE_TITLE]),
        RuleSpec::new(RULE_TITLE)
            .with_level(1)
            .with_title_pattern(RULE_TITLE)
            .with_data_pattern("<text>")
            .with_parents(["head"])
            .with_children(["patterns"])
            .with_prev_siblings(["<null>", RULE_TITLE])
            .with_next_siblings([RULE_TITLE, "<null>"]),
        RuleSpec::new("patterns")
            .with_level(2)
            .with_title_pattern("<text>")
            .with_data_pattern("<text>")
            .with_parents([RULE_TITLE])
            .with_next_siblings(["level"]),
        RuleSpec::new("level")
            .with_level(2)
            .with_title_pattern(LEVEL_TITLE)
            .with_data_pattern("<#>")
            .with_parents([RULE_TITLE])
            .with_prev_siblings(["patterns"])
            .with_next_siblings(["parents"]),
        RuleSpec::new("parents")
            .with_level(2)
            .with_title_pattern(PARENTS_TITLE)
            .with_data_pattern("<text>")
            .with_parents([RULE_TITLE])
            .with_prev_siblings(["level"])
            .with_next_siblings(["children"]),
        RuleSpec::new("children")
            .with_level(2)
            .with_title_pattern(CHILDREN_TITLE)
            .with_data_pattern("<text>")
            .with_parents([RULE_TITLE])
            .with_prev_siblings(["parents"])
            .with_next_siblings(["prevSiblings"]),
        RuleSpec::new("prevSiblings")
            .with_level(2)
            .with_title_pattern(PREV_SIBLINGS_TITLE)
            .with_data_pattern("<text>")
            .with_parents([RULE_TITLE])
            .with_prev_siblings(["children"])
            .with_next_siblings(["nextSiblings"]),
        RuleSpec::new("nextSiblings")
            .with_level(2)
            .with_title_pattern(NEXT_SIBLINGS_TITLE)
            .with_data_pattern("<text>")
            .with_parents([RULE_TITLE])
            .with_prev_siblings(["prevSiblings"]),
    ];

    let rules = specs
        .into_iter()
        .map(RuleSpec::build)
        .collect::<std::result::Result<Vec<_>, _>>()
        .expect("meta-schema rules are statically valid");
    FormatSchema::new(SCHEMA_EXTENSION, rules).expect("meta-schema is statically valid")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::NULL_NAME;

    fn photo_rule() -> NodeRule {
        RuleSpec::new("photo")
            .with_level(1)
            .with_title_pattern("<imagefile>")
            .with_data_pattern("taken on <#>")
            .with_parents(["album"])
            .with_children(["caption", NULL_NAME])
            .with_next_siblings(["photo", NULL_NAME])
            .build()
            .unwrap()
    }

    #[test]
    fn test_rule_tree_shape() {
        let tree = rule_to_tree(&photo_rule());
        let head = tree.head();

        assert_eq!(tree.title(head), "formatNode");
        assert_eq!(tree.data(head), "photo");

        let children: Vec<NodeId> = tree.children(head).collect();
        assert_eq!(children.len(), 6);
        assert_eq!(tree.title(children[0]), "<imagefile>");
        assert_eq!(tree.data(children[0]), "taken on <#>");
        assert_eq!(tree.title(children[1]), "level:");
        assert_eq!(tree.data(children[1]), "1");
        assert_eq!(tree.title(children[2]), "parents:");
        assert_eq!(tree.data(children[2]), "album");
        assert_eq!(tree.title(children[3]), "children:");
        assert_eq!(tree.data(children[3]), "caption, <null>");
        assert_eq!(tree.title(children[4]), "prevSiblings:");
        assert_eq!(tree.data(children[4]), "<null>");
        assert_eq!(tree.title(children[5]), "nextSiblings:");
        assert_eq!(tree.data(children[5]), "photo, <null>");

        for child in children {
            assert_eq!(tree.level(child), 1);
        }
    }

    #[test]
    fn test_rule_round_trip() {
        let rule = photo_rule();
        let rebuilt = rule_from_tree(&rule_to_tree(&rule)).unwrap();
        assert_eq!(rebuilt.to_spec(), rule.to_spec());
    }

    #[test]
    fn test_regex_rule_encodes_reverse_translation() {
        let rule = RuleSpec::new("photo")
            .with_level(1)
            .with_title_regex(r"(\d)*\.jpg")
            .build()
            .unwrap();

        let tree = rule_to_tree(&rule);
        let patterns = tree.first_child(tree.head()).unwrap();
        assert_eq!(tree.title(patterns), "<#>.jpg");
        // unconstrained data field encodes as the accept-anything pattern
        assert_eq!(tree.data(patterns), "<text>");
    }

    #[test]
    fn test_rule_from_malformed_trees() {
        let wrong_head = Tree::new("somethingElse", "photo");
        assert!(matches!(
            rule_from_tree(&wrong_head),
            Err(FormatError::RuleEncoding(_))
        ));

        let childless = Tree::new("formatNode", "photo");
        assert!(matches!(
            rule_from_tree(&childless),
            Err(FormatError::RuleEncoding(_))
        ));

        let mut bad_level = Tree::new("formatNode", "photo");
        let head = bad_level.head();
        bad_level.add_child(head, "<text>", "<text>");
        bad_level.add_child(head, "level:", "one");
        assert!(matches!(
            rule_from_tree(&bad_level),
            Err(FormatError::RuleEncoding(_))
        ));

        let mut stray = Tree::new("formatNode", "photo");
        let head = stray.head();
        stray.add_child(head, "<text>", "<text>");
        stray.add_child(head, "level:", "1");
        stray.add_child(head, "colour:", "blue");
        assert!(matches!(
            rule_from_tree(&stray),
            Err(FormatError::RuleEncoding(_))
        ));
    }

    #[test]
    fn test_missing_list_nodes_default_to_null() {
        let mut tree = Tree::new("formatNode", "photo");
        let head = tree.head();
        tree.add_child(head, "<text>", "<text>");
        tree.add_child(head, "level:", "1");

        let rule = rule_from_tree(&tree).unwrap();
        assert_eq!(rule.parent_names(), [NULL_NAME]);
        assert_eq!(rule.next_sibling_names(), [NULL_NAME]);
    }

    #[test]
    fn test_schema_round_trip() {
        let album = RuleSpec::new("album")
            .with_level(0)
            .with_title_pattern("album")
            .with_data_pattern("<text>")
            .with_children(["photo"])
            .build()
            .unwrap();
        let schema = FormatSchema::new(".alb", vec![album, photo_rule()]).unwrap();

        let tree = schema_to_tree(&schema);
        assert_eq!(tree.title(tree.head()), "fileFormatSchema");
        assert_eq!(tree.data(tree.head()), ".alb");

        let rebuilt = schema_from_tree(&tree).unwrap();
        assert_eq!(rebuilt.extension(), ".alb");
        assert_eq!(rebuilt.rule_count(), 2);
        assert_eq!(rebuilt.rules()[0].name(), "album");
        assert_eq!(rebuilt.rules()[1].name(), "photo");
        assert_eq!(rebuilt.head_candidates(), ["album"]);
    }

    #[test]
    fn test_schema_from_malformed_trees() {
        let wrong_head = Tree::new("album", "x");
        assert!(matches!(
            schema_from_tree(&wrong_head),
            Err(FormatError::SchemaEncoding(_))
        ));

        let no_extension = Tree::new("fileFormatSchema", "");
        assert!(matches!(
            schema_from_tree(&no_extension),
            Err(FormatError::SchemaEncoding(_))
        ));

        let mut stray = Tree::new("fileFormatSchema", ".alb");
        stray.add_sibling(stray.head(), "leftover", "");
        assert!(matches!(
            schema_from_tree(&stray),
            Err(FormatError::SchemaEncoding(_))
        ));

        // no rule subtrees at all
        let empty = Tree::new("fileFormatSchema", ".alb");
        assert!(matches!(
            schema_from_tree(&empty),
            Err(FormatError::EmptySchema)
        ));
    }

    #[test]
    fn test_meta_schema_basics() {
        let meta = meta_schema();
        assert_eq!(meta.extension(), ".tfs");
        assert_eq!(meta.head_candidates(), ["head"]);
        assert_eq!(meta.rule_count(), 8);
        assert!(meta.rule("formatNode").is_some());
        assert!(meta.rule("patterns").is_some());
    }

    #[test]
    fn test_meta_schema_round_trips_through_its_own_encoding() {
        let meta = meta_schema();
        let rebuilt = schema_from_tree(&schema_to_tree(&meta)).unwrap();
        assert_eq!(rebuilt.extension(), meta.extension());

        let names: Vec<&str> = rebuilt.rules().iter().map(|r| r.name()).collect();
        assert_eq!(
            names,
            [
                "head",
                "formatNode",
                "patterns",
                "level",
                "parents",
                "children",
                "prevSiblings",
                "nextSiblings"
            ]
        );
    }
}
