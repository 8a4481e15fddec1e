//! Arena-backed document tree
//!
//! A parsed document is an ordered tree of nodes, each carrying a `title`,
//! a `data` body and a nesting `level`. Nodes live in a flat arena and refer
//! to each other through optional integer ids in the classic
//! first-child/next-sibling encoding, with parent and previous-sibling
//! back-references. The construction API keeps the structural invariants:
//! a child sits one level below its parent, siblings share level and parent.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a node within its [`Tree`] arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One tree element: title, body text, depth and structural links
#[derive(Debug, Clone, Serialize)]
pub struct Node {
    pub title: String,
    pub data: String,
    pub level: usize,
    pub parent: Option<NodeId>,
    pub first_child: Option<NodeId>,
    pub next_sibling: Option<NodeId>,
    pub prev_sibling: Option<NodeId>,
}

/// A non-empty document tree; the head node always exists at level 0
#[derive(Debug, Clone, Serialize)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    /// Create a tree containing only its head node
    pub fn new(title: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            nodes: vec![Node {
                title: title.into(),
                data: data.into(),
                level: 0,
                parent: None,
                first_child: None,
                next_sibling: None,
                prev_sibling: None,
            }],
        }
    }

    /// Id of the head node
    pub fn head(&self) -> NodeId {
        NodeId(0)
    }

    /// Number of nodes in the arena
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn title(&self, id: NodeId) -> &str {
        &self.nodes[id.0].title
    }

    pub fn data(&self, id: NodeId) -> &str {
        &self.nodes[id.0].data
    }

    pub fn level(&self, id: NodeId) -> usize {
        self.nodes[id.0].level
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].first_child
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].next_sibling
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].prev_sibling
    }

    pub fn set_title(&mut self, id: NodeId, title: impl Into<String>) {
        self.nodes[id.0].title = title.into();
    }

    pub fn set_data(&mut self, id: NodeId, data: impl Into<String>) {
        self.nodes[id.0].data = data.into();
    }

    /// Append a child to the end of `parent`'s child list.
    ///
    /// The new node's level is the parent's plus one.
    pub fn add_child(&mut self, parent: NodeId, title: impl Into<String>, data: impl Into<String>) -> NodeId {
        match self.last_child(parent) {
            Some(last) => self.add_sibling(last, title, data),
            None => {
                let id = self.push(Node {
                    title: title.into(),
                    data: data.into(),
                    level: self.nodes[parent.0].level + 1,
                    parent: Some(parent),
                    first_child: None,
                    next_sibling: None,
                    prev_sibling: None,
                });
                self.nodes[parent.0].first_child = Some(id);
                id
            }
        }
    }

    /// Splice a new sibling in directly after `after`.
    ///
    /// Level and parent are taken from `after`; an existing next sibling is
    /// relinked behind the new node.
    pub fn add_sibling(&mut self, after: NodeId, title: impl Into<String>, data: impl Into<String>) -> NodeId {
        let follower = self.nodes[after.0].next_sibling;
        let id = self.push(Node {
            title: title.into(),
            data: data.into(),
            level: self.nodes[after.0].level,
            parent: self.nodes[after.0].parent,
            first_child: None,
            next_sibling: follower,
            prev_sibling: Some(after),
        });
        self.nodes[after.0].next_sibling = Some(id);
        if let Some(next) = follower {
            self.nodes[next.0].prev_sibling = Some(id);
        }
        id
    }

    /// Iterate a node's direct children in order
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            tree: self,
            cursor: self.nodes[id.0].first_child,
        }
    }

    /// Pre-order walk over the whole document, head's sibling chain included
    pub fn depth_first(&self) -> DepthFirst<'_> {
        DepthFirst {
            tree: self,
            stack: vec![self.head()],
        }
    }

    fn last_child(&self, parent: NodeId) -> Option<NodeId> {
        let mut cursor = self.nodes[parent.0].first_child?;
        while let Some(next) = self.nodes[cursor.0].next_sibling {
            cursor = next;
        }
        Some(cursor)
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }
}

/// Iterator over direct children
pub struct Children<'a> {
    tree: &'a Tree,
    cursor: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.cursor?;
        self.cursor = self.tree.next_sibling(current);
        Some(current)
    }
}

/// Pre-order iterator in document order
pub struct DepthFirst<'a> {
    tree: &'a Tree,
    stack: Vec<NodeId>,
}

impl Iterator for DepthFirst<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.stack.pop()?;
        if let Some(sibling) = self.tree.next_sibling(current) {
            self.stack.push(sibling);
        }
        if let Some(child) = self.tree.first_child(current) {
            self.stack.push(child);
        }
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_head_is_level_zero() {
        let tree = Tree::new("album", "holiday 2019");
        assert_eq!(tree.level(tree.head()), 0);
        assert_eq!(tree.title(tree.head()), "album");
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_child_level_is_parent_plus_one() {
        let mut tree = Tree::new("album", "");
        let photo = tree.add_child(tree.head(), "photo", "beach.jpg");
        assert_eq!(tree.level(photo), 1);
        assert_eq!(tree.parent(photo), Some(tree.head()));
        assert_eq!(tree.first_child(tree.head()), Some(photo));

        let caption = tree.add_child(photo, "caption", "low tide");
        assert_eq!(tree.level(caption), 2);
    }

    #[test]
    fn test_siblings_share_level_and_parent() {
        let mut tree = Tree::new("album", "");
        let first = tree.add_child(tree.head(), "photo", "a.jpg");
        let second = tree.add_child(tree.head(), "photo", "b.jpg");
        assert_eq!(tree.next_sibling(first), Some(second));
        assert_eq!(tree.prev_sibling(second), Some(first));
        assert_eq!(tree.level(second), tree.level(first));
        assert_eq!(tree.parent(second), tree.parent(first));
    }

    #[test]
    fn test_add_sibling_splices_between_existing() {
        let mut tree = Tree::new("album", "");
        let a = tree.add_child(tree.head(), "a", "");
        let c = tree.add_child(tree.head(), "c", "");
        let b = tree.add_sibling(a, "b", "");

        let titles: Vec<&str> = tree.children(tree.head()).map(|id| tree.title(id)).collect();
        assert_eq!(titles, vec!["a", "b", "c"]);
        assert_eq!(tree.prev_sibling(b), Some(a));
        assert_eq!(tree.prev_sibling(c), Some(b));
    }

    #[test]
    fn test_depth_first_is_document_order() {
        let mut tree = Tree::new("album", "");
        let photo = tree.add_child(tree.head(), "photo", "");
        tree.add_child(photo, "caption", "");
        tree.add_child(tree.head(), "photo2", "");

        let titles: Vec<&str> = tree.depth_first().map(|id| tree.title(id)).collect();
        assert_eq!(titles, vec!["album", "photo", "caption", "photo2"]);
    }

    #[test]
    fn test_head_sibling_chain_is_walked() {
        let mut tree = Tree::new("first", "");
        tree.add_sibling(tree.head(), "second", "");

        let titles: Vec<&str> = tree.depth_first().map(|id| tree.title(id)).collect();
        assert_eq!(titles, vec!["first", "second"]);
    }
}
