//! Document loading
//!
//! Verification consumes an in-memory [`Tree`]; producing one from disk is
//! the job of a [`TreeLoader`]. The shipped [`TextTreeLoader`] reads the
//! reference line syntax: one node per line, nesting expressed by leading
//! tabs, the title separated from the body by the first tab after the
//! indent. The body may contain further tabs; titles may not, and neither
//! side may contain newlines. Blank lines are skipped.
//!
//! ```text
//! album\tsummer 2019
//! \tphoto\tbeach.jpg
//! \t\tcaption\tlow tide
//! \tphoto\tdunes.jpg
//! ```

use std::path::Path;

use crate::encoding;
use crate::error::{FormatError, Result};
use crate::schema::FormatSchema;
use crate::tree::Tree;

/// Produces a document tree from a file path
pub trait TreeLoader {
    fn load(&self, path: &Path) -> Result<Tree>;
}

/// Loader for the reference tab-indented line syntax
#[derive(Debug, Clone, Copy, Default)]
pub struct TextTreeLoader;

impl TreeLoader for TextTreeLoader {
    fn load(&self, path: &Path) -> Result<Tree> {
        let content = std::fs::read_to_string(path)?;
        tracing::debug!("loaded {} bytes from {:?}", content.len(), path);
        parse_tree(&content)
    }
}

/// Parse the reference line syntax into a tree.
///
/// The first node must sit at level 0; every later line may nest at most one
/// level deeper than its predecessor. Further level-0 lines continue the
/// head's sibling chain.
pub fn parse_tree(text: &str) -> Result<Tree> {
    let mut tree: Option<Tree> = None;
    // most recent node per level, valid attach points for the next line
    let mut open = Vec::new();

    for (index, line) in text.lines().enumerate() {
        let number = index + 1;
        if line.is_empty() {
            continue;
        }

        let level = line.bytes().take_while(|b| *b == b'\t').count();
        let rest = &line[level..];
        let (title, data) = match rest.split_once('\t') {
            Some((title, data)) => (title, data),
            None => (rest, ""),
        };

        match tree.as_mut() {
            None => {
                if level != 0 {
                    return Err(FormatError::Parse {
                        line: number,
                        message: format!("first node must be at level 0, found level {}", level),
                    });
                }
                let t = Tree::new(title, data);
                open.push(t.head());
                tree = Some(t);
            }
            Some(t) => {
                if level > open.len() {
                    return Err(FormatError::Parse {
                        line: number,
                        message: format!(
                            "level jumps from {} to {}; children may nest one level at a time",
                            open.len() - 1,
                            level
                        ),
                    });
                }
                if level == open.len() {
                    let id = t.add_child(open[level - 1], title, data);
                    open.push(id);
                } else {
                    let id = t.add_sibling(open[level], title, data);
                    open.truncate(level + 1);
                    open[level] = id;
                }
            }
        }
    }

    tree.ok_or_else(|| FormatError::Parse {
        line: 1,
        message: "document contains no nodes".to_string(),
    })
}

/// Render a tree back into the reference line syntax.
///
/// The trailing tab-and-body part is omitted for nodes with an empty body.
/// A node with an empty title and non-empty data has no line form (its
/// separator tab would read back as indentation) and is refused with
/// [`FormatError::Unrenderable`]. For rendered trees whose titles are
/// tab-free, `parse_tree` reproduces the input.
pub fn tree_to_string(tree: &Tree) -> Result<String> {
    let mut out = String::new();
    for id in tree.depth_first() {
        let node = tree.get(id);
        if node.title.is_empty() && !node.data.is_empty() {
            return Err(FormatError::Unrenderable { node: id });
        }
        for _ in 0..node.level {
            out.push('\t');
        }
        out.push_str(&node.title);
        if !node.data.is_empty() {
            out.push('\t');
            out.push_str(&node.data);
        }
        out.push('\n');
    }
    Ok(out)
}

/// Write a tree to disk in the reference line syntax.
///
/// Nothing is written when the tree is not renderable.
pub fn write_tree(tree: &Tree, path: &Path) -> Result<()> {
    std::fs::write(path, tree_to_string(tree)?)?;
    Ok(())
}

/// Load a schema document and decode it into a [`FormatSchema`]
pub fn load_schema_file(path: &Path) -> Result<FormatSchema> {
    let tree = TextTreeLoader.load(path)?;
    encoding::schema_from_tree(&tree)
}
