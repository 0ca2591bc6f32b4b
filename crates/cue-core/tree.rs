//! Arena-backed node tree
//!
//! Header blocks (`<styling>`, `<layout>`) and cue paragraphs are collected
//! into a [`NodeTree`] while tokens stream in. Nodes live in one vector;
//! parent links are indices, so the tree has no ownership cycles and
//! dropping the tree drops every node at once.

/// Handle to a node inside a [`NodeTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in arena order (insertion order)
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
struct NodeEntry<T> {
    content: T,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Ordered tree with index parent handles
#[derive(Debug, Clone)]
pub struct NodeTree<T> {
    nodes: Vec<NodeEntry<T>>,
    roots: Vec<NodeId>,
    current: Option<NodeId>,
}

impl<T> Default for NodeTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> NodeTree<T> {
    /// Create an empty tree
    #[must_use]
    pub const fn new() -> Self {
        Self {
            nodes: Vec::new(),
            roots: Vec::new(),
            current: None,
        }
    }

    /// Append `content` as the last child of `parent` (or as a new root)
    pub fn push(&mut self, parent: Option<NodeId>, content: T) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeEntry {
            content,
            parent,
            children: Vec::new(),
        });
        match parent {
            Some(parent) => self.nodes[parent.0].children.push(id),
            None => self.roots.push(id),
        }
        id
    }

    /// Append under the cursor and move the cursor onto the new node
    ///
    /// Used for start tags while tracking a block.
    pub fn open(&mut self, content: T) -> NodeId {
        let id = self.push(self.current, content);
        self.current = Some(id);
        id
    }

    /// Append under the cursor without moving it
    ///
    /// Used for self-closing tags and text.
    pub fn append(&mut self, content: T) -> NodeId {
        self.push(self.current, content)
    }

    /// Move the cursor to the parent of the current node
    ///
    /// Returns the node that was closed.
    pub fn close(&mut self) -> Option<NodeId> {
        let closed = self.current?;
        self.current = self.nodes[closed.0].parent;
        Some(closed)
    }

    /// Node under the cursor
    #[must_use]
    pub const fn current(&self) -> Option<NodeId> {
        self.current
    }

    /// Content of a node
    #[must_use]
    pub fn get(&self, id: NodeId) -> &T {
        &self.nodes[id.0].content
    }

    /// Parent of a node
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// Children of a node in document order
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Top-level nodes in document order
    #[must_use]
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Ancestors of a node, nearest first
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        core::iter::successors(self.parent(id), move |&node| self.parent(node))
    }

    /// Depth-first pre-order walk starting at `id`, `id` included
    #[must_use]
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    /// Number of nodes
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the tree holds no nodes
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_append_close() {
        let mut tree = NodeTree::new();
        let layout = tree.open("layout");
        let region = tree.open("region");
        let style = tree.append("style");
        assert_eq!(tree.close(), Some(region));
        let second = tree.append("region");
        assert_eq!(tree.close(), Some(layout));
        assert_eq!(tree.close(), None);

        assert_eq!(tree.children(layout), [region, second]);
        assert_eq!(tree.parent(style), Some(region));
        assert_eq!(tree.ancestors(style).collect::<Vec<_>>(), [region, layout]);
        assert_eq!(tree.roots(), [layout]);
    }

    #[test]
    fn descendants_are_pre_order() {
        let mut tree = NodeTree::new();
        let p = tree.open("p");
        let span = tree.open("span");
        let text = tree.append("text");
        tree.close();
        let br = tree.append("br");
        let names: Vec<_> = tree.descendants(p).into_iter().map(|id| *tree.get(id)).collect();
        assert_eq!(names, ["p", "span", "text", "br"]);
        assert_eq!(tree.len(), 4);
        assert!(text.index() < br.index());
        assert_eq!(tree.parent(span), Some(p));
    }
}
