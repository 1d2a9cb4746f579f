//! # mdrtree - Immutable multi-dimensional R-tree
//!
//! An immutable, in-memory R-tree over points and axis-aligned rectangles in
//! k-dimensional Euclidean space (k ≥ 2), with pluggable node-selection and
//! node-splitting heuristics including the R*-tree variant and STR bulk
//! loading.
//!
//! ## Features
//!
//! - **Persistent values**: every `add`/`delete` returns a new tree sharing
//!   untouched subtrees with the old one; older values stay valid
//! - **Lock-free reads**: tree values are deeply immutable, so any number of
//!   threads may traverse one concurrently
//! - **Heuristics**: Guttman quadratic split and minimal-volume-increase
//!   selection, or R*-tree split/selection with forced reinsertion
//! - **STR bulk loading**: sort-tile-recursive packing for well-balanced
//!   trees over large inputs
//! - **Lazy queries**: range, within-distance and custom predicate searches
//!   as pull-based iterators; bounded-queue k-nearest-neighbour search
//!
//! ## Quick Start
//!
//! ```rust
//! use mdrtree::{Point, RTree, Rectangle};
//!
//! let tree = RTree::builder().star().create::<u32>().unwrap();
//! let tree = tree
//!     .add(1, Point::create(vec![28.0, 19.0]))
//!     .add(2, Point::create(vec![29.0, 4.0]))
//!     .add(3, Point::create(vec![62.0, 45.0]));
//!
//! // range query
//! let query = Rectangle::create(vec![0.0, 0.0], vec![40.0, 50.0]);
//! assert_eq!(tree.search(&query).count(), 2);
//!
//! // two nearest neighbours of a point
//! let from = Point::create(vec![30.0, 20.0]);
//! let nearest = tree.nearest(from.mbr(), f64::INFINITY, 2);
//! assert_eq!(*nearest[0].value(), 1);
//! ```
//!
//! ## Bulk loading
//!
//! ```rust
//! use mdrtree::{Entry, Point, RTree};
//!
//! let entries: Vec<Entry<usize>> = (0..1000)
//!     .map(|i| Entry::new(i, Point::create(vec![(i % 31) as f64, (i % 17) as f64])))
//!     .collect();
//!
//! let tree = RTree::builder()
//!     .max_children(10)
//!     .min_children(4)
//!     .bulk_load(entries)
//!     .unwrap();
//! assert_eq!(tree.size(), 1000);
//! ```

pub mod context;
pub mod entry;
pub mod errors;
pub mod geometry;
pub mod node;
pub mod rtree;
pub mod search;
pub mod selector;
pub mod splitter;
pub mod visitor;

// Re-export the core surface
pub use context::{Context, DefaultFactory, Factory};
pub use entry::Entry;
pub use errors::{ConfigError, ConfigResult};
pub use geometry::{Geometry, Point, Rectangle};
pub use node::{Leaf, Node, NonLeaf};
pub use rtree::{RTree, RTreeBuilder};
pub use search::{intersects, within, Search};
pub use selector::{Selector, SelectorMinimalVolumeIncrease, SelectorRStar};
pub use splitter::{SplitGroups, Splitter, SplitterQuadratic, SplitterRStar};
pub use visitor::Visitor;
