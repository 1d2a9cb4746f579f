//! Geometry value types used by the R-tree.
//!
//! A [`Rectangle`] is an axis-aligned box in k-dimensional space described by
//! its minimum and maximum corner coordinates. A [`Point`] is the degenerate
//! rectangle whose minimum and maximum corners coincide. [`Geometry`] is the
//! tagged union of the two and is what entries carry.
//!
//! All binary operations require both operands to have the same number of
//! dimensions; a mismatch is a caller bug and panics.

use std::fmt;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle in k-dimensional space.
///
/// `mins[i] <= maxes[i]` holds for every dimension `i`.
///
/// # Examples
///
/// ```rust
/// use mdrtree::Rectangle;
///
/// let r = Rectangle::create(vec![0.0, 0.0], vec![10.0, 5.0]);
/// assert_eq!(r.dimensions(), 2);
/// assert_eq!(r.volume(), 50.0);
/// ```
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Rectangle {
    mins: Vec<f64>,
    maxes: Vec<f64>,
}

impl Eq for Rectangle {}

impl Hash for Rectangle {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        for v in &self.mins {
            v.to_bits().hash(state);
        }
        for v in &self.maxes {
            v.to_bits().hash(state);
        }
    }
}

impl fmt::Display for Rectangle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rectangle [mins={:?}, maxes={:?}]", self.mins, self.maxes)
    }
}

impl Rectangle {
    /// Creates a new rectangle from its minimum and maximum corners.
    ///
    /// # Panics
    ///
    /// If `mins` and `maxes` differ in length, are empty, or if
    /// `mins[i] > maxes[i]` for some dimension.
    pub fn create(mins: impl Into<Vec<f64>>, maxes: impl Into<Vec<f64>>) -> Rectangle {
        let mins = mins.into();
        let maxes = maxes.into();
        assert_eq!(
            mins.len(),
            maxes.len(),
            "mins and maxes must have the same number of dimensions"
        );
        assert!(!mins.is_empty(), "rectangle must have at least one dimension");
        for i in 0..mins.len() {
            assert!(
                mins[i] <= maxes[i],
                "mins[{}] = {} exceeds maxes[{}] = {}",
                i,
                mins[i],
                i,
                maxes[i]
            );
        }
        Rectangle { mins, maxes }
    }

    /// Returns the number of dimensions of this rectangle.
    pub fn dimensions(&self) -> usize {
        self.mins.len()
    }

    /// Returns the minimum corner coordinates.
    pub fn mins(&self) -> &[f64] {
        &self.mins
    }

    /// Returns the maximum corner coordinates.
    pub fn maxes(&self) -> &[f64] {
        &self.maxes
    }

    /// Returns the minimum coordinate in dimension `i`.
    pub fn min(&self, i: usize) -> f64 {
        self.mins[i]
    }

    /// Returns the maximum coordinate in dimension `i`.
    pub fn max(&self, i: usize) -> f64 {
        self.maxes[i]
    }

    /// Returns the midpoint of this rectangle in dimension `i`.
    pub fn mid(&self, i: usize) -> f64 {
        (self.mins[i] + self.maxes[i]) / 2.0
    }

    /// Checks whether this rectangle intersects `other`.
    ///
    /// Touching boundaries count as intersection.
    pub fn intersects(&self, other: &Rectangle) -> bool {
        intersects(&self.mins, &self.maxes, &other.mins, &other.maxes)
    }

    /// Returns the minimum Euclidean distance between this rectangle and
    /// `other`, zero if they intersect.
    pub fn distance(&self, other: &Rectangle) -> f64 {
        distance(&self.mins, &self.maxes, &other.mins, &other.maxes)
    }

    /// Returns the volume (area in 2-D) of this rectangle. Zero for points.
    ///
    /// Only meaningful for relative comparison.
    pub fn volume(&self) -> f64 {
        self.mins
            .iter()
            .zip(&self.maxes)
            .map(|(lo, hi)| hi - lo)
            .product()
    }

    /// Returns the minimum bounding rectangle of this rectangle and `other`.
    pub fn add(&self, other: &Rectangle) -> Rectangle {
        check_dimensions(self.dimensions(), other.dimensions());
        let mins = self
            .mins
            .iter()
            .zip(&other.mins)
            .map(|(a, b)| a.min(*b))
            .collect();
        let maxes = self
            .maxes
            .iter()
            .zip(&other.maxes)
            .map(|(a, b)| a.max(*b))
            .collect();
        Rectangle { mins, maxes }
    }

    /// Returns the sum of the side lengths, the generalised perimeter used by
    /// the R* split heuristic.
    pub fn perimeter(&self) -> f64 {
        2.0 * self
            .mins
            .iter()
            .zip(&self.maxes)
            .map(|(lo, hi)| hi - lo)
            .sum::<f64>()
    }

    /// Returns the volume of the overlap between this rectangle and `other`,
    /// zero when they are disjoint.
    pub fn intersection_volume(&self, other: &Rectangle) -> f64 {
        if !self.intersects(other) {
            return 0.0;
        }
        self.mins
            .iter()
            .zip(&self.maxes)
            .zip(other.mins.iter().zip(&other.maxes))
            .map(|((alo, ahi), (blo, bhi))| ahi.min(*bhi) - alo.max(*blo))
            .product()
    }

    /// Checks whether this rectangle is a point (mins equal to maxes).
    pub fn is_point(&self) -> bool {
        self.mins == self.maxes
    }
}

/// A point in k-dimensional space, the degenerate rectangle with
/// `mins == maxes`.
///
/// # Examples
///
/// ```rust
/// use mdrtree::Point;
///
/// let p = Point::create(vec![29.0, 4.0]);
/// assert_eq!(p.values(), &[29.0, 4.0]);
/// assert_eq!(p.mbr().volume(), 0.0);
/// ```
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Point(Rectangle);

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Point {:?}", self.0.mins)
    }
}

impl Point {
    /// Creates a new point from its coordinates.
    ///
    /// # Panics
    ///
    /// If `values` is empty.
    pub fn create(values: impl Into<Vec<f64>>) -> Point {
        let values = values.into();
        Point(Rectangle::create(values.clone(), values))
    }

    /// Returns the coordinates of this point.
    pub fn values(&self) -> &[f64] {
        &self.0.mins
    }

    /// Returns the number of dimensions of this point.
    pub fn dimensions(&self) -> usize {
        self.0.dimensions()
    }

    /// Returns this point as its (degenerate) minimum bounding rectangle.
    pub fn mbr(&self) -> &Rectangle {
        &self.0
    }

    /// Returns the coordinates, as the minimum corner of the degenerate
    /// rectangle.
    pub fn mins(&self) -> &[f64] {
        self.0.mins()
    }

    /// Returns the coordinates, as the maximum corner of the degenerate
    /// rectangle.
    pub fn maxes(&self) -> &[f64] {
        self.0.maxes()
    }

    /// Returns the coordinate in dimension `i`.
    pub fn min(&self, i: usize) -> f64 {
        self.0.min(i)
    }

    /// Returns the coordinate in dimension `i`.
    pub fn max(&self, i: usize) -> f64 {
        self.0.max(i)
    }

    /// Returns the volume of this point, which is always zero.
    pub fn volume(&self) -> f64 {
        0.0
    }

    /// Returns the minimum bounding rectangle of this point and `r`.
    pub fn add(&self, r: &Rectangle) -> Rectangle {
        self.0.add(r)
    }

    /// Checks whether this point lies inside `r` (boundaries inclusive).
    pub fn intersects(&self, r: &Rectangle) -> bool {
        self.0.intersects(r)
    }

    /// Returns the minimum Euclidean distance from this point to `r`, zero
    /// if the point lies inside.
    pub fn distance(&self, r: &Rectangle) -> f64 {
        self.0.distance(r)
    }
}

/// A geometry indexable by the R-tree: a point or a rectangle.
///
/// Equality compares the extents exactly: a point equals the degenerate
/// rectangle with the same coordinates. Deletion relies on this.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Geometry {
    /// A point.
    Point(Point),
    /// An axis-aligned rectangle.
    Rectangle(Rectangle),
}

impl PartialEq for Geometry {
    fn eq(&self, other: &Geometry) -> bool {
        self.mins() == other.mins() && self.maxes() == other.maxes()
    }
}

impl Eq for Geometry {}

impl From<Point> for Geometry {
    fn from(p: Point) -> Geometry {
        Geometry::Point(p)
    }
}

impl From<Rectangle> for Geometry {
    fn from(r: Rectangle) -> Geometry {
        Geometry::Rectangle(r)
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Geometry::Point(p) => p.fmt(f),
            Geometry::Rectangle(r) => r.fmt(f),
        }
    }
}

impl Geometry {
    /// Returns the minimum bounding rectangle of this geometry.
    pub fn mbr(&self) -> &Rectangle {
        match self {
            Geometry::Point(p) => p.mbr(),
            Geometry::Rectangle(r) => r,
        }
    }

    /// Returns the number of dimensions of this geometry.
    pub fn dimensions(&self) -> usize {
        self.mbr().dimensions()
    }

    /// Returns the minimum corner coordinates.
    pub fn mins(&self) -> &[f64] {
        self.mbr().mins()
    }

    /// Returns the maximum corner coordinates.
    pub fn maxes(&self) -> &[f64] {
        self.mbr().maxes()
    }

    /// Checks whether this geometry intersects `r`.
    pub fn intersects(&self, r: &Rectangle) -> bool {
        self.mbr().intersects(r)
    }

    /// Returns the minimum Euclidean distance between this geometry and `r`.
    pub fn distance(&self, r: &Rectangle) -> f64 {
        self.mbr().distance(r)
    }

    /// Returns the volume of this geometry's bounding rectangle.
    pub fn volume(&self) -> f64 {
        self.mbr().volume()
    }
}

fn check_dimensions(a: usize, b: usize) {
    assert_eq!(a, b, "operands must have the same number of dimensions");
}

fn intersects(mins: &[f64], maxes: &[f64], other_mins: &[f64], other_maxes: &[f64]) -> bool {
    check_dimensions(mins.len(), other_mins.len());
    for i in 0..mins.len() {
        if mins[i] > other_maxes[i] || maxes[i] < other_mins[i] {
            return false;
        }
    }
    true
}

fn distance(mins: &[f64], maxes: &[f64], other_mins: &[f64], other_maxes: &[f64]) -> f64 {
    if intersects(mins, maxes, other_mins, other_maxes) {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..mins.len() {
        let gap = (mins[i].max(other_mins[i]) - maxes[i].min(other_maxes[i])).max(0.0);
        sum += gap * gap;
    }
    sum.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn rect(mins: [f64; 2], maxes: [f64; 2]) -> Rectangle {
        Rectangle::create(mins.to_vec(), maxes.to_vec())
    }

    #[test]
    fn test_create() {
        let r = rect([1.0, 2.0], [3.0, 4.0]);
        assert_eq!(r.mins(), &[1.0, 2.0]);
        assert_eq!(r.maxes(), &[3.0, 4.0]);
        assert_eq!(r.min(0), 1.0);
        assert_eq!(r.max(1), 4.0);
        assert_eq!(r.dimensions(), 2);
    }

    #[test]
    #[should_panic]
    fn test_create_mismatched_lengths_panics() {
        Rectangle::create(vec![0.0, 0.0], vec![1.0]);
    }

    #[test]
    #[should_panic]
    fn test_create_inverted_corners_panics() {
        Rectangle::create(vec![2.0, 0.0], vec![1.0, 1.0]);
    }

    #[test]
    fn test_intersects() {
        let a = rect([0.0, 0.0], [10.0, 10.0]);
        let b = rect([5.0, 5.0], [15.0, 15.0]);
        let c = rect([20.0, 20.0], [30.0, 30.0]);
        let touching = rect([10.0, 10.0], [20.0, 20.0]);

        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
        assert!(!a.intersects(&c));
        assert!(a.intersects(&touching));
        assert!(a.intersects(&a));
    }

    #[test]
    #[should_panic]
    fn test_intersects_dimension_mismatch_panics() {
        let a = rect([0.0, 0.0], [1.0, 1.0]);
        let b = Rectangle::create(vec![0.0, 0.0, 0.0], vec![1.0, 1.0, 1.0]);
        a.intersects(&b);
    }

    #[test]
    fn test_distance_zero_when_intersecting() {
        let a = rect([0.0, 0.0], [10.0, 10.0]);
        let b = rect([5.0, 5.0], [15.0, 15.0]);
        assert_eq!(a.distance(&b), 0.0);
    }

    #[test]
    fn test_distance_axis_gap() {
        let a = rect([0.0, 0.0], [1.0, 1.0]);
        let b = rect([4.0, 0.0], [5.0, 1.0]);
        assert_eq!(a.distance(&b), 3.0);
    }

    #[test]
    fn test_distance_diagonal_gap() {
        let a = rect([0.0, 0.0], [1.0, 1.0]);
        let b = rect([4.0, 5.0], [6.0, 7.0]);
        assert_eq!(a.distance(&b), 5.0); // 3-4-5 triangle
    }

    #[test]
    fn test_volume() {
        assert_eq!(rect([0.0, 0.0], [10.0, 5.0]).volume(), 50.0);
        assert_eq!(rect([3.0, 3.0], [3.0, 3.0]).volume(), 0.0);
        let cube = Rectangle::create(vec![0.0, 0.0, 0.0], vec![2.0, 2.0, 2.0]);
        assert_eq!(cube.volume(), 8.0);
    }

    #[test]
    fn test_add_union() {
        let a = rect([0.0, 0.0], [5.0, 5.0]);
        let b = rect([3.0, -1.0], [10.0, 4.0]);
        let u = a.add(&b);
        assert_eq!(u.mins(), &[0.0, -1.0]);
        assert_eq!(u.maxes(), &[10.0, 5.0]);
    }

    #[test]
    fn test_perimeter() {
        assert_eq!(rect([0.0, 0.0], [3.0, 4.0]).perimeter(), 14.0);
    }

    #[test]
    fn test_intersection_volume() {
        let a = rect([0.0, 0.0], [10.0, 10.0]);
        let b = rect([5.0, 5.0], [15.0, 15.0]);
        let c = rect([20.0, 20.0], [30.0, 30.0]);
        assert_eq!(a.intersection_volume(&b), 25.0);
        assert_eq!(a.intersection_volume(&c), 0.0);
    }

    #[test]
    fn test_point_is_degenerate_rectangle() {
        let p = Point::create(vec![2.0, 3.0]);
        assert!(p.mbr().is_point());
        assert_eq!(p.mbr().mins(), p.mbr().maxes());
        assert_eq!(p.values(), &[2.0, 3.0]);
    }

    #[test]
    fn test_point_distance() {
        let p = Point::create(vec![0.0, 0.0]);
        let r = Rectangle::create(vec![3.0, 4.0], vec![5.0, 6.0]);
        assert_eq!(p.distance(&r), 5.0);
    }

    #[test]
    fn test_geometry_equality_across_variants() {
        let p: Geometry = Point::create(vec![2.0, 3.0]).into();
        let r: Geometry = Rectangle::create(vec![2.0, 3.0], vec![2.0, 3.0]).into();
        let other: Geometry = Point::create(vec![2.0, 4.0]).into();
        assert_eq!(p, r);
        assert_ne!(p, other);
    }

    #[test]
    fn test_rectangle_hash() {
        let a = rect([1.0, 2.0], [3.0, 4.0]);
        let b = rect([1.0, 2.0], [3.0, 4.0]);
        let c = rect([5.0, 6.0], [7.0, 8.0]);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
        assert!(!set.contains(&c));
    }

    #[test]
    fn test_mid() {
        let r = rect([0.0, 10.0], [10.0, 20.0]);
        assert_eq!(r.mid(0), 5.0);
        assert_eq!(r.mid(1), 15.0);
    }

    #[test]
    fn test_serialization() {
        let r = rect([1.5, 2.5], [3.5, 4.5]);
        let json = serde_json::to_string(&r).unwrap();
        let back: Rectangle = serde_json::from_str(&json).unwrap();
        assert_eq!(r, back);

        let g: Geometry = Point::create(vec![1.0, 2.0]).into();
        let json = serde_json::to_string(&g).unwrap();
        let back: Geometry = serde_json::from_str(&json).unwrap();
        assert_eq!(g, back);
    }

    #[test]
    fn test_three_dimensions() {
        let a = Rectangle::create(vec![0.0, 0.0, 0.0], vec![1.0, 1.0, 1.0]);
        let b = Rectangle::create(vec![0.5, 0.5, 0.5], vec![1.5, 1.5, 1.5]);
        assert!(a.intersects(&b));
        assert_eq!(a.intersection_volume(&b), 0.125);
        let p = Point::create(vec![2.0, 2.0, 2.0]);
        assert!(!p.intersects(&a));
    }
}
