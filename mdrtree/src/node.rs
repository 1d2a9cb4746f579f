//! Tree nodes and the copy-on-write mutation engines.
//!
//! A [`Node`] is either a [`Leaf`] holding entries or a [`NonLeaf`] holding
//! child nodes; both cache the minimum bounding rectangle of their members.
//! Nodes are immutable: insertion and deletion rebuild only the path from
//! the root to the touched leaf and share every untouched subtree through
//! its `Arc` handle.

use std::cmp::Ordering;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::context::Context;
use crate::entry::Entry;
use crate::geometry::Rectangle;

/// A node of the tree: a leaf of entries or an internal node of children.
#[derive(Debug)]
pub enum Node<T> {
    /// A leaf node holding entries.
    Leaf(Leaf<T>),
    /// An internal node holding child nodes.
    NonLeaf(NonLeaf<T>),
}

/// A leaf node: a non-empty list of entries plus their cached bounding
/// rectangle.
#[derive(Debug)]
pub struct Leaf<T> {
    entries: Vec<Entry<T>>,
    mbr: Rectangle,
    context: Context<T>,
}

/// An internal node: a non-empty list of child nodes plus their cached
/// bounding rectangle.
#[derive(Debug)]
pub struct NonLeaf<T> {
    children: Vec<Arc<Node<T>>>,
    mbr: Rectangle,
    context: Context<T>,
}

impl<T> Leaf<T> {
    /// Creates a leaf from its entries, computing the cached bounding
    /// rectangle.
    ///
    /// # Panics
    ///
    /// If `entries` is empty.
    pub fn new(entries: Vec<Entry<T>>, context: Context<T>) -> Leaf<T> {
        assert!(!entries.is_empty(), "leaf must hold at least one entry");
        let mbr = entries
            .iter()
            .map(|e| e.geometry().mbr().clone())
            .reduce(|a, b| a.add(&b))
            .expect("non-empty entries");
        Leaf {
            entries,
            mbr,
            context,
        }
    }

    /// Returns the entries of this leaf.
    pub fn entries(&self) -> &[Entry<T>] {
        &self.entries
    }

    /// Returns the entry at position `i`.
    pub fn entry(&self, i: usize) -> &Entry<T> {
        &self.entries[i]
    }

    /// Returns the number of entries.
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// Returns the cached bounding rectangle of all entries.
    pub fn mbr(&self) -> &Rectangle {
        &self.mbr
    }

    /// Returns the tree configuration.
    pub fn context(&self) -> &Context<T> {
        &self.context
    }
}

impl<T> NonLeaf<T> {
    /// Creates an internal node from its children, computing the cached
    /// bounding rectangle.
    ///
    /// # Panics
    ///
    /// If `children` is empty.
    pub fn new(children: Vec<Arc<Node<T>>>, context: Context<T>) -> NonLeaf<T> {
        assert!(!children.is_empty(), "non-leaf must hold at least one child");
        let mbr = children
            .iter()
            .map(|c| c.mbr().clone())
            .reduce(|a, b| a.add(&b))
            .expect("non-empty children");
        NonLeaf {
            children,
            mbr,
            context,
        }
    }

    /// Returns the children of this node.
    pub fn children(&self) -> &[Arc<Node<T>>] {
        &self.children
    }

    /// Returns the child at position `i`.
    pub fn child(&self, i: usize) -> &Node<T> {
        &self.children[i]
    }

    /// Returns the number of children.
    pub fn count(&self) -> usize {
        self.children.len()
    }

    /// Returns the cached bounding rectangle of all children.
    pub fn mbr(&self) -> &Rectangle {
        &self.mbr
    }

    /// Returns the tree configuration.
    pub fn context(&self) -> &Context<T> {
        &self.context
    }
}

impl<T> Node<T> {
    /// Returns the cached bounding rectangle of this node.
    pub fn mbr(&self) -> &Rectangle {
        match self {
            Node::Leaf(leaf) => leaf.mbr(),
            Node::NonLeaf(non_leaf) => non_leaf.mbr(),
        }
    }

    /// Returns the number of immediate entries or children.
    pub fn count(&self) -> usize {
        match self {
            Node::Leaf(leaf) => leaf.count(),
            Node::NonLeaf(non_leaf) => non_leaf.count(),
        }
    }

    /// Whether this node is a leaf.
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf(_))
    }

    /// Returns the tree configuration.
    pub fn context(&self) -> &Context<T> {
        match self {
            Node::Leaf(leaf) => leaf.context(),
            Node::NonLeaf(non_leaf) => non_leaf.context(),
        }
    }

    /// Height of this node above the leaf level (leaves are level 0).
    pub(crate) fn level(&self) -> usize {
        match self {
            Node::Leaf(_) => 0,
            Node::NonLeaf(non_leaf) => 1 + non_leaf.child(0).level(),
        }
    }
}

impl<T: Clone> Node<T> {
    /// Clones every entry under this node into `out`.
    pub(crate) fn collect_entries(&self, out: &mut Vec<Entry<T>>) {
        match self {
            Node::Leaf(leaf) => out.extend_from_slice(&leaf.entries),
            Node::NonLeaf(non_leaf) => {
                for child in &non_leaf.children {
                    child.collect_entries(out);
                }
            }
        }
    }
}

// ============================================================================
// Insertion engine
// ============================================================================

/// Result of adding an entry to a subtree.
pub(crate) enum AddOutcome<T> {
    /// The subtree absorbed the entry.
    One(Arc<Node<T>>),
    /// The subtree overflowed and split into two siblings.
    Split(Arc<Node<T>>, Arc<Node<T>>),
    /// Forced reinsertion: the rebuilt subtree plus entries that must
    /// descend afresh from the root.
    Reinsert(Arc<Node<T>>, Vec<Entry<T>>),
}

/// Tracks which levels have already used forced reinsertion during a single
/// top-level insertion. Levels at or above 64 fall back to splitting.
#[derive(Debug, Default)]
pub(crate) struct ReinsertedLevels {
    bits: u64,
}

impl ReinsertedLevels {
    /// Marks `level` as reinserted, returning false if it already was (or is
    /// out of range).
    fn try_mark(&mut self, level: usize) -> bool {
        if level >= u64::BITS as usize {
            return false;
        }
        let mask = 1u64 << level;
        if self.bits & mask != 0 {
            return false;
        }
        self.bits |= mask;
        true
    }
}

impl<T: Clone> Node<T> {
    /// Adds `entry` to this subtree, rebuilding the path it descends.
    ///
    /// `level` is this node's height above the leaves; `is_root` exempts the
    /// root from forced reinsertion (it splits directly).
    pub(crate) fn add(
        &self,
        entry: Entry<T>,
        level: usize,
        is_root: bool,
        reinserted: &mut ReinsertedLevels,
    ) -> AddOutcome<T> {
        match self {
            Node::Leaf(leaf) => leaf.add(entry, level, is_root, reinserted),
            Node::NonLeaf(non_leaf) => non_leaf.add(entry, level, is_root, reinserted),
        }
    }
}

impl<T: Clone> Leaf<T> {
    fn add(
        &self,
        entry: Entry<T>,
        level: usize,
        is_root: bool,
        reinserted: &mut ReinsertedLevels,
    ) -> AddOutcome<T> {
        let context = &self.context;
        let mut entries = self.entries.clone();
        entries.push(entry);

        if entries.len() <= context.max_children() {
            return AddOutcome::One(make_leaf(context, entries));
        }

        if wants_reinsertion(context, entries.len(), is_root)
            && reinserted.try_mark(level)
        {
            let removed = strip_farthest(&mut entries, context.reinsert_count(), |e| {
                e.geometry().mbr()
            });
            log::trace!(
                "forced reinsertion of {} entries at leaf level",
                removed.len()
            );
            return AddOutcome::Reinsert(make_leaf(context, entries), removed);
        }

        let mbrs: SmallVec<[&Rectangle; 8]> =
            entries.iter().map(|e| e.geometry().mbr()).collect();
        let groups = context.splitter().split(&mbrs, context.min_children());
        let first: Vec<Entry<T>> = groups.group1.iter().map(|&i| entries[i].clone()).collect();
        let second: Vec<Entry<T>> = groups.group2.iter().map(|&i| entries[i].clone()).collect();
        AddOutcome::Split(make_leaf(context, first), make_leaf(context, second))
    }
}

impl<T: Clone> NonLeaf<T> {
    fn add(
        &self,
        entry: Entry<T>,
        level: usize,
        is_root: bool,
        reinserted: &mut ReinsertedLevels,
    ) -> AddOutcome<T> {
        let context = &self.context;
        let mbrs: SmallVec<[&Rectangle; 8]> = self.children.iter().map(|c| c.mbr()).collect();
        let leaf_children = self.children[0].is_leaf();
        let index = context
            .selector()
            .select(entry.geometry().mbr(), &mbrs, leaf_children);

        match self.children[index].add(entry, level - 1, false, reinserted) {
            AddOutcome::One(node) => {
                let mut children = self.children.clone();
                children[index] = node;
                AddOutcome::One(make_non_leaf(context, children))
            }
            AddOutcome::Reinsert(node, orphans) => {
                let mut children = self.children.clone();
                children[index] = node;
                AddOutcome::Reinsert(make_non_leaf(context, children), orphans)
            }
            AddOutcome::Split(first, second) => {
                let mut children = self.children.clone();
                children.remove(index);
                children.push(first);
                children.push(second);

                if children.len() <= context.max_children() {
                    return AddOutcome::One(make_non_leaf(context, children));
                }

                if wants_reinsertion(context, children.len(), is_root)
                    && reinserted.try_mark(level)
                {
                    let removed = strip_farthest(&mut children, context.reinsert_count(), |c| {
                        c.mbr()
                    });
                    let mut orphans = Vec::new();
                    for node in &removed {
                        node.collect_entries(&mut orphans);
                    }
                    log::trace!(
                        "forced reinsertion of {} subtrees ({} entries) at level {}",
                        removed.len(),
                        orphans.len(),
                        level
                    );
                    return AddOutcome::Reinsert(make_non_leaf(context, children), orphans);
                }

                let mbrs: SmallVec<[&Rectangle; 8]> = children.iter().map(|c| c.mbr()).collect();
                let groups = context.splitter().split(&mbrs, context.min_children());
                let first: Vec<Arc<Node<T>>> = groups
                    .group1
                    .iter()
                    .map(|&i| Arc::clone(&children[i]))
                    .collect();
                let second: Vec<Arc<Node<T>>> = groups
                    .group2
                    .iter()
                    .map(|&i| Arc::clone(&children[i]))
                    .collect();
                AddOutcome::Split(make_non_leaf(context, first), make_non_leaf(context, second))
            }
        }
    }
}

pub(crate) fn make_leaf<T>(context: &Context<T>, entries: Vec<Entry<T>>) -> Arc<Node<T>> {
    Arc::new(Node::Leaf(context.factory().create_leaf(entries, context)))
}

pub(crate) fn make_non_leaf<T>(context: &Context<T>, children: Vec<Arc<Node<T>>>) -> Arc<Node<T>> {
    Arc::new(Node::NonLeaf(
        context.factory().create_non_leaf(children, context),
    ))
}

/// Whether an overflowed node of `count` items should shed items for
/// reinsertion instead of splitting. Never at the root, and never when
/// removal would underflow the node.
fn wants_reinsertion<T>(context: &Context<T>, count: usize, is_root: bool) -> bool {
    let p = context.reinsert_count();
    context.is_star()
        && !is_root
        && p >= 1
        && count.saturating_sub(p) >= context.min_children()
}

/// Removes the `p` items whose bounding-rectangle centres lie farthest from
/// the centre of the group's own bounding rectangle, returning them farthest
/// first.
fn strip_farthest<I>(items: &mut Vec<I>, p: usize, mbr_of: impl Fn(&I) -> &Rectangle) -> Vec<I> {
    let group_mbr = items
        .iter()
        .map(|i| mbr_of(i).clone())
        .reduce(|a, b| a.add(&b))
        .expect("non-empty items");

    let mut decorated: Vec<(f64, I)> = items
        .drain(..)
        .map(|item| (centre_distance_sq(mbr_of(&item), &group_mbr), item))
        .collect();
    decorated.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));

    let keep = decorated.split_off(p);
    items.extend(keep.into_iter().map(|(_, item)| item));
    decorated.into_iter().map(|(_, item)| item).collect()
}

fn centre_distance_sq(a: &Rectangle, b: &Rectangle) -> f64 {
    (0..a.dimensions())
        .map(|i| {
            let d = a.mid(i) - b.mid(i);
            d * d
        })
        .sum()
}

// ============================================================================
// Deletion engine
// ============================================================================

/// Result of deleting from a subtree: the surviving node (if any), orphaned
/// entries to reinsert and the number of entries actually deleted.
///
/// `count_deleted == 0` means the subtree is unchanged and the caller keeps
/// its original handle.
pub(crate) struct NodeAndEntries<T> {
    pub node: Option<Arc<Node<T>>>,
    pub entries_to_add: Vec<Entry<T>>,
    pub count_deleted: usize,
}

impl<T> NodeAndEntries<T> {
    fn unchanged() -> NodeAndEntries<T> {
        NodeAndEntries {
            node: None,
            entries_to_add: Vec::new(),
            count_deleted: 0,
        }
    }
}

impl<T: Clone + PartialEq> Node<T> {
    /// Deletes entries matching `entry` on both value and geometry. With
    /// `all` false at most one match is removed.
    pub(crate) fn delete(&self, entry: &Entry<T>, all: bool) -> NodeAndEntries<T> {
        match self {
            Node::Leaf(leaf) => leaf.delete(entry, all),
            Node::NonLeaf(non_leaf) => non_leaf.delete(entry, all),
        }
    }
}

impl<T: Clone + PartialEq> Leaf<T> {
    fn delete(&self, entry: &Entry<T>, all: bool) -> NodeAndEntries<T> {
        let context = &self.context;
        let mut keep: Vec<Entry<T>> = Vec::with_capacity(self.entries.len());
        let mut count_deleted = 0;
        for e in &self.entries {
            if e == entry && (all || count_deleted == 0) {
                count_deleted += 1;
            } else {
                keep.push(e.clone());
            }
        }

        if count_deleted == 0 {
            return NodeAndEntries::unchanged();
        }
        if keep.len() >= context.min_children() {
            NodeAndEntries {
                node: Some(make_leaf(context, keep)),
                entries_to_add: Vec::new(),
                count_deleted,
            }
        } else {
            // underflow: the leaf dissolves and its survivors reinsert
            NodeAndEntries {
                node: None,
                entries_to_add: keep,
                count_deleted,
            }
        }
    }
}

impl<T: Clone + PartialEq> NonLeaf<T> {
    fn delete(&self, entry: &Entry<T>, all: bool) -> NodeAndEntries<T> {
        let context = &self.context;
        let mut children: Vec<Arc<Node<T>>> = Vec::with_capacity(self.children.len());
        let mut entries_to_add = Vec::new();
        let mut count_deleted = 0;

        for child in &self.children {
            let done = count_deleted > 0 && !all;
            if done || !entry.geometry().intersects(child.mbr()) {
                children.push(Arc::clone(child));
                continue;
            }
            let result = child.delete(entry, all);
            if result.count_deleted == 0 {
                children.push(Arc::clone(child));
            } else {
                count_deleted += result.count_deleted;
                entries_to_add.extend(result.entries_to_add);
                if let Some(node) = result.node {
                    children.push(node);
                }
            }
        }

        if count_deleted == 0 {
            return NodeAndEntries::unchanged();
        }
        if children.is_empty() {
            return NodeAndEntries {
                node: None,
                entries_to_add,
                count_deleted,
            };
        }
        if children.len() < context.min_children() {
            // underflow: dissolve this node, reinserting every entry of the
            // surviving subtrees at the leaf level
            for child in &children {
                child.collect_entries(&mut entries_to_add);
            }
            return NodeAndEntries {
                node: None,
                entries_to_add,
                count_deleted,
            };
        }
        NodeAndEntries {
            node: Some(make_non_leaf(context, children)),
            entries_to_add,
            count_deleted,
        }
    }
}
