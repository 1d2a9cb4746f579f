//! The public R-tree facade, its builder and the STR bulk loader.

use std::cmp::Ordering;
use std::sync::Arc;

use itertools::Itertools;

use crate::context::{Context, DefaultFactory};
use crate::entry::Entry;
use crate::errors::{ConfigError, ConfigResult};
use crate::geometry::{Geometry, Rectangle};
use crate::node::{make_leaf, make_non_leaf, AddOutcome, Node, ReinsertedLevels};
use crate::search::{intersects, within, BoundedPriorityQueue, Search};
use crate::selector::{Selector, SelectorMinimalVolumeIncrease, SelectorRStar};
use crate::splitter::{Splitter, SplitterQuadratic, SplitterRStar};
use crate::visitor::{self, Visitor};

/// An immutable, in-memory, multi-dimensional R-tree.
///
/// Every mutating operation returns a new tree value; the previous value
/// stays valid and shares all untouched subtrees with the new one. Any
/// number of threads may therefore read the same tree value concurrently
/// without locking.
///
/// # Examples
///
/// ```rust
/// use mdrtree::{Point, RTree, Rectangle};
///
/// let tree = RTree::builder().create::<&str>().unwrap();
/// let tree = tree
///     .add("sydney", Point::create(vec![151.2, -33.9]))
///     .add("canberra", Point::create(vec![149.1, -35.3]));
///
/// let query = Rectangle::create(vec![150.0, -35.0], vec![152.0, -33.0]);
/// let found: Vec<_> = tree.search(&query).map(|e| *e.value()).collect();
/// assert_eq!(found, vec!["sydney"]);
/// ```
#[derive(Debug)]
pub struct RTree<T> {
    root: Option<Arc<Node<T>>>,
    size: usize,
    context: Context<T>,
}

impl<T> Clone for RTree<T> {
    fn clone(&self) -> Self {
        RTree {
            root: self.root.clone(),
            size: self.size,
            context: self.context.clone(),
        }
    }
}

impl RTree<()> {
    /// Returns a builder for configuring a new tree.
    pub fn builder() -> RTreeBuilder {
        RTreeBuilder::new()
    }
}

impl<T> RTree<T> {
    pub(crate) fn with_root(
        root: Option<Arc<Node<T>>>,
        size: usize,
        context: Context<T>,
    ) -> RTree<T> {
        RTree {
            root,
            size,
            context,
        }
    }

    /// Returns the root node, if the tree is non-empty.
    ///
    /// Read-only introspection for hosts walking the structure directly,
    /// e.g. to aggregate statistics per node rectangle.
    pub fn root(&self) -> Option<&Node<T>> {
        self.root.as_deref()
    }

    /// Returns the number of entries in the tree.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Whether the tree holds no entries.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Returns the minimum bounding rectangle of all entries, or `None` for
    /// an empty tree.
    pub fn mbr(&self) -> Option<Rectangle> {
        self.root.as_ref().map(|node| node.mbr().clone())
    }

    /// Returns the configuration of this tree.
    pub fn context(&self) -> &Context<T> {
        &self.context
    }

    /// Returns the dimensionality of the tree.
    pub fn dimensions(&self) -> usize {
        self.context.dimensions()
    }

    /// Returns the depth of the tree: 0 when empty, 1 for a single leaf.
    ///
    /// Scans down to the leaf level, so this is `O(log n)`.
    pub fn depth(&self) -> usize {
        match &self.root {
            None => 0,
            Some(node) => node.level() + 1,
        }
    }

    /// Returns the entries whose geometry satisfies `condition`, evaluated
    /// on minimum bounding rectangles.
    ///
    /// The sequence is lazy and single-pass; re-traversal requires calling
    /// `search_with` again.
    ///
    /// `condition` must be MBR-monotone: if it holds for a geometry it must
    /// hold for every rectangle containing that geometry (as
    /// [`intersects`](crate::search::intersects) and
    /// [`within`](crate::search::within) do). Conditions without this
    /// property silently miss matches; they never cause a crash.
    pub fn search_with<P>(&self, condition: P) -> Search<'_, T, P>
    where
        P: Fn(&Rectangle) -> bool,
    {
        Search::new(self.root(), condition)
    }

    /// Returns the entries whose geometry intersects `r`.
    pub fn search(&self, r: &Rectangle) -> Search<'_, T, impl Fn(&Rectangle) -> bool> {
        self.search_with(intersects(r.clone()))
    }

    /// Returns the entries whose geometry lies strictly closer than
    /// `max_distance` to `r`.
    pub fn search_within(
        &self,
        r: &Rectangle,
        max_distance: f64,
    ) -> Search<'_, T, impl Fn(&Rectangle) -> bool> {
        self.search_with(within(r.clone(), max_distance))
    }

    /// Returns all entries of the tree as a lazy sequence.
    pub fn entries(&self) -> Search<'_, T, impl Fn(&Rectangle) -> bool> {
        self.search_with(|_: &Rectangle| true)
    }

    /// Returns up to `max_count` entries nearest to `r` among those strictly
    /// closer than `max_distance`, in ascending distance order. Distance
    /// ties keep the earlier-encountered entry.
    pub fn nearest(
        &self,
        r: &Rectangle,
        max_distance: f64,
        max_count: usize,
    ) -> Vec<&Entry<T>> {
        let mut queue = BoundedPriorityQueue::new(max_count);
        for entry in self.search_within(r, max_distance) {
            queue.add(entry.geometry().distance(r), entry);
        }
        queue.into_ordered_vec()
    }

    /// Walks every node depth-first in pre-order, children left to right.
    pub fn visit<V: Visitor<T> + ?Sized>(&self, visitor: &mut V) {
        if let Some(root) = &self.root {
            visitor::visit(root, visitor);
        }
    }

    fn check_entry_dimensions(&self, geometry: &Geometry) {
        if geometry.dimensions() != self.context.dimensions() {
            log::error!(
                "entry has {} dimensions, tree expects {}",
                geometry.dimensions(),
                self.context.dimensions()
            );
            panic!(
                "entry has {} dimensions, expected {}",
                geometry.dimensions(),
                self.context.dimensions()
            );
        }
    }
}

impl<T: Clone> RTree<T> {
    /// Returns a new tree containing the given value under the given
    /// geometry, in addition to everything already present.
    ///
    /// # Panics
    ///
    /// If the geometry's dimensionality differs from the tree's.
    pub fn add(&self, value: T, geometry: impl Into<Geometry>) -> RTree<T> {
        let entry = self.context.factory().create_entry(value, geometry.into());
        self.add_entry(entry)
    }

    /// Returns a new tree with `entry` added.
    ///
    /// # Panics
    ///
    /// If the entry's dimensionality differs from the tree's.
    pub fn add_entry(&self, entry: Entry<T>) -> RTree<T> {
        self.check_entry_dimensions(entry.geometry());

        let mut reinserted = ReinsertedLevels::default();
        let mut pending = vec![entry];
        let mut root = self.root.clone();
        while let Some(next) = pending.pop() {
            root = Some(insert(
                root,
                next,
                &self.context,
                &mut reinserted,
                &mut pending,
            ));
        }
        RTree {
            root,
            size: self.size + 1,
            context: self.context.clone(),
        }
    }

    /// Returns a new tree with every entry of `entries` added.
    pub fn add_all(&self, entries: impl IntoIterator<Item = Entry<T>>) -> RTree<T> {
        let mut tree = self.clone();
        for entry in entries {
            tree = tree.add_entry(entry);
        }
        tree
    }
}

impl<T: Clone + PartialEq> RTree<T> {
    /// Returns a new tree without entries matching the given value and
    /// geometry. With `all` false at most one match is removed; the entry
    /// must match on both value and geometry. Without a match the tree is
    /// returned unchanged.
    pub fn delete(&self, value: T, geometry: impl Into<Geometry>, all: bool) -> RTree<T> {
        let entry = self.context.factory().create_entry(value, geometry.into());
        self.delete_entry(&entry, all)
    }

    /// Returns a new tree with matches of `entry` removed (one match, or
    /// every match when `all` is true).
    pub fn delete_entry(&self, entry: &Entry<T>, all: bool) -> RTree<T> {
        self.check_entry_dimensions(entry.geometry());
        let Some(root) = &self.root else {
            return self.clone();
        };
        let result = root.delete(entry, all);
        if result.count_deleted == 0 {
            return self.clone();
        }
        // orphans re-enter through the normal insertion path, which lands
        // them back at the leaf level
        let tree = RTree {
            root: result.node,
            size: self.size - result.count_deleted - result.entries_to_add.len(),
            context: self.context.clone(),
        };
        tree.add_all(result.entries_to_add)
    }

    /// Returns a new tree with matches of every entry in `entries` removed.
    pub fn delete_all(
        &self,
        entries: impl IntoIterator<Item = Entry<T>>,
        all: bool,
    ) -> RTree<T> {
        let mut tree = self.clone();
        for entry in entries {
            tree = tree.delete_entry(&entry, all);
        }
        tree
    }
}

fn insert<T: Clone>(
    root: Option<Arc<Node<T>>>,
    entry: Entry<T>,
    context: &Context<T>,
    reinserted: &mut ReinsertedLevels,
    pending: &mut Vec<Entry<T>>,
) -> Arc<Node<T>> {
    match root {
        None => make_leaf(context, vec![entry]),
        Some(node) => {
            let level = node.level();
            match node.add(entry, level, true, reinserted) {
                AddOutcome::One(node) => node,
                AddOutcome::Split(first, second) => {
                    // root split: the tree grows one level
                    make_non_leaf(context, vec![first, second])
                }
                AddOutcome::Reinsert(node, orphans) => {
                    pending.extend(orphans);
                    node
                }
            }
        }
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Best filling ratio per the R*-tree paper, for quadratic and R* splits
/// alike.
const DEFAULT_FILLING_FACTOR: f64 = 0.4;
const DEFAULT_LOADING_FACTOR: f64 = 0.7;
const DEFAULT_MAX_CHILDREN: usize = 4;

/// Configures and creates [`RTree`] values.
///
/// # Examples
///
/// ```rust
/// use mdrtree::RTree;
///
/// let tree = RTree::builder()
///     .star()
///     .dimensions(3)
///     .max_children(16)
///     .create::<u64>()
///     .unwrap();
/// assert_eq!(tree.dimensions(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct RTreeBuilder {
    dimensions: usize,
    min_children: Option<usize>,
    max_children: Option<usize>,
    selector: Arc<dyn Selector>,
    splitter: Arc<dyn Splitter>,
    loading_factor: f64,
    star: bool,
}

impl Default for RTreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RTreeBuilder {
    /// Creates a builder with Guttman defaults: 2 dimensions, quadratic
    /// splitter, minimal-volume-increase selector.
    pub fn new() -> RTreeBuilder {
        RTreeBuilder {
            dimensions: 2,
            min_children: None,
            max_children: None,
            selector: Arc::new(SelectorMinimalVolumeIncrease),
            splitter: Arc::new(SplitterQuadratic),
            loading_factor: DEFAULT_LOADING_FACTOR,
            star: false,
        }
    }

    /// Sets the number of dimensions. Must be at least 2.
    pub fn dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = dimensions;
        self
    }

    /// Sets the minimum number of children of a non-root node. A node
    /// falling below this count is dissolved and its members redistributed.
    ///
    /// Defaults to `round(0.4 × maxChildren)`, floored at 2.
    pub fn min_children(mut self, min_children: usize) -> Self {
        self.min_children = Some(min_children);
        self
    }

    /// Sets the maximum number of children of a node. Defaults to 4.
    pub fn max_children(mut self, max_children: usize) -> Self {
        self.max_children = Some(max_children);
        self
    }

    /// Sets the splitter applied when a node overflows.
    pub fn splitter(mut self, splitter: impl Splitter + 'static) -> Self {
        self.splitter = Arc::new(splitter);
        self
    }

    /// Sets the selector choosing the subtree to descend on insertion.
    pub fn selector(mut self, selector: impl Selector + 'static) -> Self {
        self.selector = Arc::new(selector);
        self
    }

    /// Switches to R*-tree heuristics: R* splitter, R* selector and forced
    /// reinsertion on overflow.
    pub fn star(mut self) -> Self {
        self.selector = Arc::new(SelectorRStar);
        self.splitter = Arc::new(SplitterRStar);
        self.star = true;
        self
    }

    /// Sets the fill ratio used by STR bulk loading. Defaults to 0.7.
    pub fn loading_factor(mut self, loading_factor: f64) -> Self {
        self.loading_factor = loading_factor;
        self
    }

    /// Creates an empty tree with this configuration.
    pub fn create<T>(&self) -> ConfigResult<RTree<T>> {
        let context = self.build_context()?;
        Ok(RTree::with_root(None, 0, context))
    }

    /// Creates a tree over `entries` by STR bulk loading.
    ///
    /// Sorts and tiles the entries along the first two axes and packs nodes
    /// bottom-up; far better balanced than repeated insertion for large
    /// inputs. The input order is consumed (and effectively reordered).
    ///
    /// # Panics
    ///
    /// If an entry's dimensionality differs from the configured one.
    pub fn bulk_load<T: Clone>(&self, entries: Vec<Entry<T>>) -> ConfigResult<RTree<T>> {
        let context = self.build_context::<T>()?;
        for entry in &entries {
            assert_eq!(
                entry.geometry().dimensions(),
                context.dimensions(),
                "entry dimensionality must match the configured dimensions"
            );
        }

        let size = entries.len();
        if entries.is_empty() {
            return Ok(RTree::with_root(None, 0, context));
        }

        let capacity = ((context.max_children() as f64) * self.loading_factor)
            .round()
            .max(1.0) as usize;
        log::debug!(
            "bulk loading {} entries with leaf capacity {}",
            size,
            capacity
        );

        let root = if size <= capacity {
            make_leaf(&context, entries)
        } else {
            let groups = str_groups(
                entries,
                capacity,
                context.min_children(),
                context.max_children(),
                |e, axis| e.geometry().mbr().mid(axis),
            );
            let mut nodes: Vec<Arc<Node<T>>> = groups
                .into_iter()
                .map(|group| make_leaf(&context, group))
                .collect();

            while nodes.len() > 1 {
                if nodes.len() <= context.max_children() {
                    nodes = vec![make_non_leaf(&context, nodes)];
                } else {
                    let groups = str_groups(
                        nodes,
                        context.max_children(),
                        context.min_children(),
                        context.max_children(),
                        |n, axis| n.mbr().mid(axis),
                    );
                    nodes = groups
                        .into_iter()
                        .map(|group| make_non_leaf(&context, group))
                        .collect();
                }
            }
            nodes.pop().expect("a single root remains")
        };
        Ok(RTree::with_root(Some(root), size, context))
    }

    fn build_context<T>(&self) -> ConfigResult<Context<T>> {
        if self.dimensions < 2 {
            return Err(ConfigError::Dimensions(self.dimensions));
        }
        let max_children = self.max_children.unwrap_or(DEFAULT_MAX_CHILDREN);
        let min_children = self.min_children.unwrap_or_else(|| {
            ((max_children as f64 * DEFAULT_FILLING_FACTOR).round() as usize).max(2)
        });
        if min_children < 2 {
            return Err(ConfigError::MinChildren(min_children));
        }
        if max_children <= min_children {
            return Err(ConfigError::MaxChildren {
                min: min_children,
                max: max_children,
            });
        }
        if !(self.loading_factor > 0.0 && self.loading_factor <= 1.0) {
            return Err(ConfigError::LoadingFactor(self.loading_factor));
        }
        Ok(Context::new(
            self.dimensions,
            min_children,
            max_children,
            Arc::clone(&self.selector),
            Arc::clone(&self.splitter),
            Arc::new(DefaultFactory),
            self.star,
        ))
    }
}

// ============================================================================
// STR packing
// ============================================================================

/// Sorts `items` by midpoint along axis 0, partitions them into vertical
/// slices, sorts each slice along axis 1 and packs runs of `capacity`.
///
/// Axes beyond the first two are never consulted, matching the reference
/// packing even in higher dimensions.
fn str_groups<I>(
    mut items: Vec<I>,
    capacity: usize,
    min_children: usize,
    max_children: usize,
    mid: impl Fn(&I, usize) -> f64,
) -> Vec<Vec<I>> {
    let count = items.len();
    let node_count = count.div_ceil(capacity);
    let nodes_per_slice = (node_count as f64).sqrt().ceil() as usize;
    let slice_capacity = nodes_per_slice * capacity;

    items.sort_by(|a, b| cmp_f64(mid(a, 0), mid(b, 0)));

    let mut groups = Vec::with_capacity(node_count);
    for chunk in &items.into_iter().chunks(slice_capacity) {
        let mut slice: Vec<I> = chunk.collect();
        slice.sort_by(|a, b| cmp_f64(mid(a, 1), mid(b, 1)));

        let sizes = run_sizes(slice.len(), capacity, min_children, max_children);
        let mut rest = slice.into_iter();
        for size in sizes {
            groups.push(rest.by_ref().take(size).collect());
        }
    }

    // a final slice shorter than the minimum leaves an underfull trailing
    // group; rebalance it with its predecessor
    if groups.len() >= 2 && groups.last().is_some_and(|g: &Vec<I>| g.len() < min_children) {
        let last = groups.pop().expect("checked above");
        let mut combined = groups.pop().expect("checked above");
        combined.extend(last);
        let n = combined.len();
        if n <= max_children {
            groups.push(combined);
        } else {
            let second_len = (n / 2).max(min_children);
            let second = combined.split_off(n - second_len);
            groups.push(combined);
            groups.push(second);
        }
    }
    groups
}

/// Run lengths for packing `n` items at `capacity` per node.
///
/// A trailing run shorter than `min_children` is rebalanced with its
/// predecessor: split evenly when both halves reach `min_children`,
/// otherwise merged when the sum fits `max_children`. Failing both, the
/// short run is kept as produced.
fn run_sizes(n: usize, capacity: usize, min_children: usize, max_children: usize) -> Vec<usize> {
    let full = n / capacity;
    let remainder = n % capacity;
    let mut sizes = vec![capacity; full];
    if remainder == 0 {
        return sizes;
    }
    if remainder >= min_children || full == 0 {
        sizes.push(remainder);
        return sizes;
    }
    let combined = capacity + remainder;
    let half = combined / 2;
    if half >= min_children {
        sizes.pop();
        sizes.push(combined - half);
        sizes.push(half);
    } else if combined <= max_children {
        sizes.pop();
        sizes.push(combined);
    } else {
        sizes.push(remainder);
    }
    sizes
}

fn cmp_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    fn point(x: f64, y: f64) -> Point {
        Point::create(vec![x, y])
    }

    fn rect(mins: [f64; 2], maxes: [f64; 2]) -> Rectangle {
        Rectangle::create(mins.to_vec(), maxes.to_vec())
    }

    #[test]
    fn test_empty_tree() {
        let tree = RTree::builder().create::<i32>().unwrap();
        assert!(tree.is_empty());
        assert_eq!(tree.size(), 0);
        assert_eq!(tree.depth(), 0);
        assert!(tree.mbr().is_none());
        assert_eq!(tree.entries().count(), 0);
    }

    #[test]
    fn test_single_add() {
        let tree = RTree::builder().create::<i32>().unwrap();
        let tree = tree.add(1, point(29.0, 4.0));
        assert_eq!(tree.size(), 1);
        assert_eq!(tree.depth(), 1);
        let entries: Vec<_> = tree.entries().collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(*entries[0].value(), 1);
        assert_eq!(tree.mbr().unwrap(), rect([29.0, 4.0], [29.0, 4.0]));
    }

    #[test]
    fn test_star_five_points_depth_and_search() {
        let tree = RTree::builder()
            .star()
            .max_children(4)
            .min_children(2)
            .create::<i32>()
            .unwrap();
        let tree = tree
            .add(1, point(28.0, 19.0))
            .add(2, point(29.0, 4.0))
            .add(3, point(10.0, 63.0))
            .add(4, point(34.0, 85.0))
            .add(5, point(62.0, 45.0));

        assert_eq!(tree.size(), 5);
        assert_eq!(tree.depth(), 2);

        let mut found: Vec<i32> = tree
            .search(&rect([0.0, 0.0], [40.0, 50.0]))
            .map(|e| *e.value())
            .collect();
        found.sort();
        assert_eq!(found, vec![1, 2]);
    }

    #[test]
    fn test_nearest_orders_by_distance() {
        let tree = RTree::builder()
            .star()
            .max_children(4)
            .min_children(2)
            .create::<i32>()
            .unwrap();
        let tree = tree
            .add(1, point(28.0, 19.0))
            .add(2, point(29.0, 4.0))
            .add(3, point(10.0, 63.0))
            .add(4, point(34.0, 85.0))
            .add(5, point(62.0, 45.0));

        let from = point(30.0, 20.0);
        let nearest: Vec<i32> = tree
            .nearest(from.mbr(), f64::INFINITY, 2)
            .into_iter()
            .map(|e| *e.value())
            .collect();
        assert_eq!(nearest, vec![1, 2]);
    }

    #[test]
    fn test_three_dimensional_search() {
        let tree = RTree::builder().dimensions(3).create::<i32>().unwrap();
        let tree = tree
            .add(0, Point::create(vec![0.0, 0.0, 0.0]))
            .add(1, Point::create(vec![1.0, 1.0, 1.0]))
            .add(2, Point::create(vec![2.0, 2.0, 2.0]));

        let query = Rectangle::create(vec![0.5, 0.5, 0.5], vec![1.5, 1.5, 1.5]);
        let found: Vec<i32> = tree.search(&query).map(|e| *e.value()).collect();
        assert_eq!(found, vec![1]);
    }

    #[test]
    fn test_delete_one_and_all() {
        let tree = RTree::builder().create::<i32>().unwrap();
        let tree = tree
            .add(1, point(1.0, 1.0))
            .add(1, point(1.0, 1.0))
            .add(2, point(2.0, 2.0));

        let one = tree.delete(1, point(1.0, 1.0), false);
        assert_eq!(one.size(), 2);

        let all = tree.delete(1, point(1.0, 1.0), true);
        assert_eq!(all.size(), 1);
        assert_eq!(*all.entries().next().unwrap().value(), 2);
    }

    #[test]
    fn test_delete_missing_returns_unchanged_tree() {
        let tree = RTree::builder().create::<i32>().unwrap().add(1, point(1.0, 1.0));
        let same = tree.delete(9, point(9.0, 9.0), false);
        assert_eq!(same.size(), 1);
        // unchanged means structurally shared, not rebuilt
        assert!(Arc::ptr_eq(
            tree.root.as_ref().unwrap(),
            same.root.as_ref().unwrap()
        ));
    }

    #[test]
    fn test_delete_to_empty() {
        let tree = RTree::builder().create::<i32>().unwrap().add(1, point(1.0, 1.0));
        let empty = tree.delete(1, point(1.0, 1.0), false);
        assert!(empty.is_empty());
        assert!(empty.mbr().is_none());
    }

    #[test]
    fn test_older_value_untouched_by_add() {
        let tree = RTree::builder().create::<i32>().unwrap();
        let before = tree.add(1, point(1.0, 1.0)).add(2, point(2.0, 2.0));
        let after = before.add(3, point(3.0, 3.0));

        assert_eq!(before.size(), 2);
        assert_eq!(after.size(), 3);
        let old: Vec<i32> = before.entries().map(|e| *e.value()).collect();
        assert_eq!(old.len(), 2);
        assert!(!old.contains(&3));
    }

    #[test]
    fn test_add_all_and_entry_count() {
        let entries: Vec<Entry<usize>> = (0..40)
            .map(|i| Entry::new(i, point(i as f64, (i % 7) as f64)))
            .collect();
        let tree = RTree::builder().create::<usize>().unwrap().add_all(entries);
        assert_eq!(tree.size(), 40);
        assert_eq!(tree.entries().count(), 40);
    }

    #[test]
    #[should_panic]
    fn test_dimension_mismatch_panics() {
        let tree = RTree::builder().create::<i32>().unwrap();
        tree.add(1, Point::create(vec![1.0, 2.0, 3.0]));
    }

    #[test]
    fn test_builder_validation() {
        assert_eq!(
            RTree::builder().dimensions(1).create::<i32>().unwrap_err(),
            ConfigError::Dimensions(1)
        );
        assert_eq!(
            RTree::builder().min_children(1).create::<i32>().unwrap_err(),
            ConfigError::MinChildren(1)
        );
        assert_eq!(
            RTree::builder()
                .min_children(8)
                .max_children(8)
                .create::<i32>()
                .unwrap_err(),
            ConfigError::MaxChildren { min: 8, max: 8 }
        );
        assert!(matches!(
            RTree::builder()
                .loading_factor(0.0)
                .create::<i32>()
                .unwrap_err(),
            ConfigError::LoadingFactor(_)
        ));
    }

    #[test]
    fn test_builder_defaults() {
        let tree = RTree::builder().create::<i32>().unwrap();
        assert_eq!(tree.context().max_children(), 4);
        assert_eq!(tree.context().min_children(), 2);
        assert!(!tree.context().is_star());

        let star = RTree::builder().star().create::<i32>().unwrap();
        assert!(star.context().is_star());
    }

    #[test]
    fn test_bulk_load_small_fits_single_leaf() {
        let entries: Vec<Entry<i32>> = (0..3)
            .map(|i| Entry::new(i, point(i as f64, i as f64)))
            .collect();
        let tree = RTree::builder().bulk_load(entries).unwrap();
        assert_eq!(tree.size(), 3);
        assert_eq!(tree.depth(), 1);
    }

    #[test]
    fn test_bulk_load_empty() {
        let tree = RTree::builder().bulk_load(Vec::<Entry<i32>>::new()).unwrap();
        assert!(tree.is_empty());
    }

    #[test]
    fn test_bulk_load_contains_all_entries() {
        let entries: Vec<Entry<usize>> = (0..200)
            .map(|i| Entry::new(i, point((i % 20) as f64, (i / 20) as f64)))
            .collect();
        let tree = RTree::builder()
            .max_children(10)
            .min_children(4)
            .bulk_load(entries)
            .unwrap();
        assert_eq!(tree.size(), 200);
        let mut values: Vec<usize> = tree.entries().map(|e| *e.value()).collect();
        values.sort();
        assert_eq!(values, (0..200).collect::<Vec<_>>());
    }

    #[test]
    fn test_search_within_is_strict() {
        let tree = RTree::builder()
            .create::<i32>()
            .unwrap()
            .add(1, point(0.0, 0.0))
            .add(2, point(3.0, 4.0));
        let from = rect([0.0, 0.0], [0.0, 0.0]);
        // (3,4) is exactly 5 away: excluded by the strict bound
        let found: Vec<i32> = tree.search_within(&from, 5.0).map(|e| *e.value()).collect();
        assert_eq!(found, vec![1]);
        let found: Vec<i32> = tree.search_within(&from, 5.1).map(|e| *e.value()).collect();
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_visit_walks_all_nodes() {
        use crate::node::{Leaf, NonLeaf};

        struct Counter {
            leaves: usize,
            non_leaves: usize,
            entries: usize,
        }
        impl Visitor<i32> for Counter {
            fn leaf(&mut self, leaf: &Leaf<i32>) {
                self.leaves += 1;
                self.entries += leaf.count();
            }
            fn non_leaf(&mut self, _non_leaf: &NonLeaf<i32>) {
                self.non_leaves += 1;
            }
        }

        let mut tree = RTree::builder().create::<i32>().unwrap();
        for i in 0..30 {
            tree = tree.add(i, point((i * 7 % 13) as f64, (i * 3 % 11) as f64));
        }
        let mut counter = Counter {
            leaves: 0,
            non_leaves: 0,
            entries: 0,
        };
        tree.visit(&mut counter);
        assert_eq!(counter.entries, 30);
        assert!(counter.leaves > 1);
        assert!(counter.non_leaves >= 1);
    }

    #[test]
    fn test_run_sizes() {
        assert_eq!(run_sizes(21, 7, 4, 10), vec![7, 7, 7]);
        // remainder above the minimum is kept as its own run
        assert_eq!(run_sizes(20, 7, 4, 10), vec![7, 7, 6]);
        // short remainder: split the combined tail evenly
        assert_eq!(run_sizes(23, 10, 4, 10), vec![10, 7, 6]);
        // halves would underflow: merge instead
        assert_eq!(run_sizes(11, 10, 6, 12), vec![11]);
        // fewer items than capacity: single run
        assert_eq!(run_sizes(3, 10, 4, 10), vec![3]);
    }

    #[test]
    fn test_search_is_lazy_and_single_pass() {
        let mut tree = RTree::builder().create::<i32>().unwrap();
        for i in 0..20 {
            tree = tree.add(i, point(i as f64, i as f64));
        }
        let mut results = tree.entries();
        assert!(results.next().is_some());
        let rest: Vec<_> = results.collect();
        assert_eq!(rest.len(), 19);
    }
}
