//! Read-only depth-first traversal of the tree structure.

use crate::node::{Leaf, Node, NonLeaf};

/// Callbacks invoked for every node during a depth-first pre-order walk.
///
/// Non-leaves are reported before their children; children are visited left
/// to right. Intended for diagnostics such as per-node aggregate summaries.
pub trait Visitor<T> {
    /// Called for every leaf.
    fn leaf(&mut self, leaf: &Leaf<T>);

    /// Called for every internal node, before its children.
    fn non_leaf(&mut self, non_leaf: &NonLeaf<T>);
}

pub(crate) fn visit<T, V: Visitor<T> + ?Sized>(node: &Node<T>, visitor: &mut V) {
    match node {
        Node::Leaf(leaf) => visitor.leaf(leaf),
        Node::NonLeaf(non_leaf) => {
            visitor.non_leaf(non_leaf);
            for child in non_leaf.children() {
                visit(child, visitor);
            }
        }
    }
}
