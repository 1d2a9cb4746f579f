//! Immutable configuration threaded through every tree operation.

use std::fmt;
use std::sync::Arc;

use crate::entry::Entry;
use crate::geometry::Geometry;
use crate::node::{Leaf, Node, NonLeaf};
use crate::selector::Selector;
use crate::splitter::Splitter;

/// Creates the nodes and entries of a tree.
///
/// The default factory builds the plain [`Leaf`]/[`NonLeaf`] types; hosts
/// can substitute their own to wrap or instrument node construction.
pub trait Factory<T>: Send + Sync {
    /// Creates a leaf from the given entries.
    fn create_leaf(&self, entries: Vec<Entry<T>>, context: &Context<T>) -> Leaf<T>;

    /// Creates a non-leaf from the given child nodes.
    fn create_non_leaf(&self, children: Vec<Arc<Node<T>>>, context: &Context<T>) -> NonLeaf<T>;

    /// Creates an entry pairing `value` with `geometry`.
    fn create_entry(&self, value: T, geometry: Geometry) -> Entry<T>;
}

/// The factory used unless a host installs its own.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultFactory;

impl<T> Factory<T> for DefaultFactory {
    fn create_leaf(&self, entries: Vec<Entry<T>>, context: &Context<T>) -> Leaf<T> {
        Leaf::new(entries, context.clone())
    }

    fn create_non_leaf(&self, children: Vec<Arc<Node<T>>>, context: &Context<T>) -> NonLeaf<T> {
        NonLeaf::new(children, context.clone())
    }

    fn create_entry(&self, value: T, geometry: Geometry) -> Entry<T> {
        Entry::new(value, geometry)
    }
}

/// Immutable tree configuration: dimensionality, node capacity bounds and
/// the selection/splitting heuristics.
///
/// A `Context` is built once by the [`RTreeBuilder`](crate::RTreeBuilder)
/// and shared by every node of every tree value derived from it. Cloning is
/// cheap (the configuration lives behind an `Arc`).
pub struct Context<T> {
    inner: Arc<ContextInner<T>>,
}

struct ContextInner<T> {
    dimensions: usize,
    min_children: usize,
    max_children: usize,
    selector: Arc<dyn Selector>,
    splitter: Arc<dyn Splitter>,
    factory: Arc<dyn Factory<T>>,
    star: bool,
}

impl<T> Clone for Context<T> {
    fn clone(&self) -> Self {
        Context {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Context<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("dimensions", &self.inner.dimensions)
            .field("min_children", &self.inner.min_children)
            .field("max_children", &self.inner.max_children)
            .field("selector", &self.inner.selector)
            .field("splitter", &self.inner.splitter)
            .field("star", &self.inner.star)
            .finish()
    }
}

impl<T> Context<T> {
    pub(crate) fn new(
        dimensions: usize,
        min_children: usize,
        max_children: usize,
        selector: Arc<dyn Selector>,
        splitter: Arc<dyn Splitter>,
        factory: Arc<dyn Factory<T>>,
        star: bool,
    ) -> Context<T> {
        Context {
            inner: Arc::new(ContextInner {
                dimensions,
                min_children,
                max_children,
                selector,
                splitter,
                factory,
                star,
            }),
        }
    }

    /// Returns the dimensionality of every geometry in the tree.
    pub fn dimensions(&self) -> usize {
        self.inner.dimensions
    }

    /// Returns the minimum number of children of a non-root node.
    pub fn min_children(&self) -> usize {
        self.inner.min_children
    }

    /// Returns the maximum number of children of a node.
    pub fn max_children(&self) -> usize {
        self.inner.max_children
    }

    /// Returns the heuristic choosing the subtree to descend on insertion.
    pub fn selector(&self) -> &dyn Selector {
        &*self.inner.selector
    }

    /// Returns the heuristic partitioning an overflowed node.
    pub fn splitter(&self) -> &dyn Splitter {
        &*self.inner.splitter
    }

    /// Returns the node factory.
    pub fn factory(&self) -> &dyn Factory<T> {
        &*self.inner.factory
    }

    /// Whether R*-tree behaviour (forced reinsertion) is enabled.
    pub fn is_star(&self) -> bool {
        self.inner.star
    }

    /// Number of items removed for forced reinsertion on overflow.
    pub(crate) fn reinsert_count(&self) -> usize {
        (self.inner.max_children as f64 * 0.3).round() as usize
    }
}
