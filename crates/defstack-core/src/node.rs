//! Differential tree model
//!
//! A definition body is stored as a tree of named nodes. A node is either a
//! leaf carrying the canonical text of one value, or an interior node with an
//! ordered list of children. List and array elements are all named
//! [`LIST_ELEMENT`] and are positional; every other child is unique by name.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Name shared by every list/array element node
pub const LIST_ELEMENT: &str = "lv";

/// Payload of a tree node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    /// Canonical text form of a single value
    Leaf(String),
    /// Ordered child nodes
    Interior(Vec<Node>),
}

/// A named node of the differential tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Field name, type name for a body root, or [`LIST_ELEMENT`]
    pub name: String,
    /// Leaf text or children
    pub kind: NodeKind,
}

impl Node {
    /// Create a leaf node
    pub fn leaf(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: NodeKind::Leaf(text.into()),
        }
    }

    /// Create an interior node
    pub fn interior(name: impl Into<String>, children: Vec<Node>) -> Self {
        Self {
            name: name.into(),
            kind: NodeKind::Interior(children),
        }
    }

    /// Create an interior node, or nothing when there are no children
    ///
    /// An interior node without children means "absent" and is never emitted.
    pub fn interior_or_absent(name: impl Into<String>, children: Vec<Node>) -> Option<Self> {
        if children.is_empty() {
            None
        } else {
            Some(Self::interior(name, children))
        }
    }

    /// Create an empty body root
    pub fn empty(name: impl Into<String>) -> Self {
        Self::interior(name, Vec::new())
    }

    /// Check if this is a leaf
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf(_))
    }

    /// Interior with zero children, equivalent to the node not existing
    pub fn is_absent(&self) -> bool {
        matches!(&self.kind, NodeKind::Interior(children) if children.is_empty())
    }

    /// Leaf text, if this is a leaf
    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Leaf(text) => Some(text),
            NodeKind::Interior(_) => None,
        }
    }

    /// Children of an interior node (empty for leaves)
    pub fn children(&self) -> &[Node] {
        match &self.kind {
            NodeKind::Leaf(_) => &[],
            NodeKind::Interior(children) => children,
        }
    }

    /// Get a named child
    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children().iter().find(|c| c.name == name)
    }

    /// Follow a path of child names
    pub fn get_path(&self, path: &[&str]) -> Option<&Node> {
        path.iter().try_fold(self, |node, name| node.child(name))
    }

    /// Iterate list element children in order
    pub fn elements(&self) -> impl Iterator<Item = &Node> {
        self.children().iter().filter(|c| c.name == LIST_ELEMENT)
    }

    /// Insert a child, replacing any existing child with the same name
    ///
    /// Turns a leaf into an interior node.
    pub fn set_child(&mut self, node: Node) {
        if let NodeKind::Leaf(_) = self.kind {
            self.kind = NodeKind::Interior(Vec::new());
        }
        if let NodeKind::Interior(children) = &mut self.kind {
            match children.iter_mut().find(|c| c.name == node.name) {
                Some(existing) => *existing = node,
                None => children.push(node),
            }
        }
    }

    /// Remove a named child
    pub fn remove_child(&mut self, name: &str) -> Option<Node> {
        match &mut self.kind {
            NodeKind::Leaf(_) => None,
            NodeKind::Interior(children) => {
                let pos = children.iter().position(|c| c.name == name)?;
                Some(children.remove(pos))
            }
        }
    }

    /// Total number of nodes in this subtree
    pub fn count(&self) -> usize {
        1 + self.children().iter().map(Node::count).sum::<usize>()
    }

    fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let pad = "  ".repeat(depth);
        match &self.kind {
            NodeKind::Leaf(text) => writeln!(f, "{}{} = {:?}", pad, self.name, text),
            NodeKind::Interior(children) => {
                writeln!(f, "{}{}", pad, self.name)?;
                for child in children {
                    child.fmt_indented(f, depth + 1)?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indented(f, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Node {
        Node::interior(
            "ThingDef",
            vec![
                Node::leaf("label", "steel"),
                Node::interior(
                    "stats",
                    vec![Node::leaf("mass", "0.5"), Node::leaf("beauty", "-2")],
                ),
                Node::interior(
                    "tags",
                    vec![Node::leaf(LIST_ELEMENT, "metal"), Node::leaf(LIST_ELEMENT, "raw")],
                ),
            ],
        )
    }

    #[test]
    fn test_lookup() {
        let node = sample();
        assert_eq!(node.child("label").and_then(Node::text), Some("steel"));
        assert_eq!(
            node.get_path(&["stats", "mass"]).and_then(Node::text),
            Some("0.5")
        );
        assert!(node.get_path(&["stats", "missing"]).is_none());
        let tags: Vec<_> = node
            .child("tags")
            .map(|t| t.elements().filter_map(Node::text).collect())
            .unwrap_or_default();
        assert_eq!(tags, vec!["metal", "raw"]);
        assert_eq!(node.count(), 8);
    }

    #[test]
    fn test_absent() {
        assert!(Node::interior_or_absent("x", Vec::new()).is_none());
        assert!(Node::empty("x").is_absent());
        assert!(!Node::leaf("x", "").is_absent());
    }

    #[test]
    fn test_set_and_remove_child() {
        let mut node = sample();
        node.set_child(Node::leaf("label", "plasteel"));
        assert_eq!(node.child("label").and_then(Node::text), Some("plasteel"));
        assert_eq!(node.children().len(), 3);

        node.set_child(Node::leaf("color", "grey"));
        assert_eq!(node.children().len(), 4);

        assert!(node.remove_child("stats").is_some());
        assert!(node.child("stats").is_none());

        let mut leaf = Node::leaf("x", "1");
        leaf.set_child(Node::leaf("y", "2"));
        assert!(!leaf.is_leaf());
    }

    #[test]
    fn test_node_ron() {
        let node = sample();
        let text = ron::to_string(&node).unwrap();
        let back: Node = ron::from_str(&text).unwrap();
        assert_eq!(back, node);
    }

    #[test]
    fn test_display() {
        let rendered = Node::interior("root", vec![Node::leaf("a", "1")]).to_string();
        assert_eq!(rendered, "root\n  a = \"1\"\n");
    }
}
