//! Heuristics partitioning an overflowed node into two groups.

use std::cmp::Ordering;
use std::fmt;

use itertools::Itertools;

use crate::geometry::Rectangle;

/// The two index groups produced by a split.
///
/// Indices refer to positions in the slice handed to
/// [`Splitter::split`]; together the groups cover every position exactly
/// once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitGroups {
    /// Indices of the items assigned to the first group.
    pub group1: Vec<usize>,
    /// Indices of the items assigned to the second group.
    pub group2: Vec<usize>,
}

/// Partitions the items of an overflowed node into two groups.
pub trait Splitter: fmt::Debug + Send + Sync {
    /// Splits items with the given bounding rectangles into two groups of at
    /// least `min_size` members each.
    ///
    /// `mbrs` has more than the node capacity of elements; each group of the
    /// result indexes into it.
    fn split(&self, mbrs: &[&Rectangle], min_size: usize) -> SplitGroups;
}

/// Guttman's quadratic split.
///
/// Seeds the two groups with the pair of items whose combined bounding
/// rectangle wastes the most space, then repeatedly assigns the item with
/// the strongest preference to the group it enlarges least.
#[derive(Debug, Default, Clone, Copy)]
pub struct SplitterQuadratic;

impl Splitter for SplitterQuadratic {
    fn split(&self, mbrs: &[&Rectangle], min_size: usize) -> SplitGroups {
        assert!(mbrs.len() >= 2, "cannot split fewer than two items");

        let (seed1, seed2) = worst_combination(mbrs);
        let mut group1 = vec![seed1];
        let mut group2 = vec![seed2];
        let mut mbr1 = mbrs[seed1].clone();
        let mut mbr2 = mbrs[seed2].clone();

        let mut remaining: Vec<usize> =
            (0..mbrs.len()).filter(|&i| i != seed1 && i != seed2).collect();

        while !remaining.is_empty() {
            // flush when one group needs every remaining item to reach the
            // minimum size
            if group1.len() >= min_size && group2.len() + remaining.len() == min_size {
                group2.append(&mut remaining);
                break;
            }
            if group2.len() >= min_size && group1.len() + remaining.len() == min_size {
                group1.append(&mut remaining);
                break;
            }

            let pos = next_candidate(&remaining, mbrs, &mbr1, &mbr2);
            let item = remaining.swap_remove(pos);
            let enlargement1 = enlargement(&mbr1, mbrs[item]);
            let enlargement2 = enlargement(&mbr2, mbrs[item]);

            let to_first = match total_cmp(enlargement1, enlargement2) {
                Ordering::Less => true,
                Ordering::Greater => false,
                Ordering::Equal => match total_cmp(mbr1.volume(), mbr2.volume()) {
                    Ordering::Less => true,
                    Ordering::Greater => false,
                    Ordering::Equal => group1.len() <= group2.len(),
                },
            };
            if to_first {
                mbr1 = mbr1.add(mbrs[item]);
                group1.push(item);
            } else {
                mbr2 = mbr2.add(mbrs[item]);
                group2.push(item);
            }
        }

        SplitGroups { group1, group2 }
    }
}

/// The R*-tree split.
///
/// Chooses the axis (and sort order) whose candidate distributions have the
/// smallest summed perimeter, then the distribution along it with the least
/// overlap between the two resulting rectangles, ties broken by the smaller
/// combined volume.
#[derive(Debug, Default, Clone, Copy)]
pub struct SplitterRStar;

impl Splitter for SplitterRStar {
    fn split(&self, mbrs: &[&Rectangle], min_size: usize) -> SplitGroups {
        assert!(mbrs.len() >= 2, "cannot split fewer than two items");

        let n = mbrs.len();
        let dimensions = mbrs[0].dimensions();
        let (lo, hi) = distribution_bounds(n, min_size);

        let mut best_order: Option<Vec<usize>> = None;
        let mut best_margin = f64::INFINITY;

        for axis in 0..dimensions {
            for sort_by_max in [false, true] {
                let mut order: Vec<usize> = (0..n).collect();
                order.sort_by(|&a, &b| {
                    let ka = if sort_by_max { mbrs[a].max(axis) } else { mbrs[a].min(axis) };
                    let kb = if sort_by_max { mbrs[b].max(axis) } else { mbrs[b].min(axis) };
                    total_cmp(ka, kb)
                });

                let prefixes = prefix_unions(&order, mbrs);
                let suffixes = suffix_unions(&order, mbrs);
                let margin: f64 = (lo..=hi)
                    .map(|k| prefixes[k - 1].perimeter() + suffixes[k].perimeter())
                    .sum();

                if margin < best_margin {
                    best_margin = margin;
                    best_order = Some(order);
                }
            }
        }

        let order = best_order.expect("at least one axis evaluated");
        let prefixes = prefix_unions(&order, mbrs);
        let suffixes = suffix_unions(&order, mbrs);

        let mut best_split = lo;
        let mut best_overlap = f64::INFINITY;
        let mut best_volume = f64::INFINITY;
        for k in lo..=hi {
            let overlap = prefixes[k - 1].intersection_volume(&suffixes[k]);
            let volume = prefixes[k - 1].volume() + suffixes[k].volume();
            if overlap < best_overlap || (overlap == best_overlap && volume < best_volume) {
                best_overlap = overlap;
                best_volume = volume;
                best_split = k;
            }
        }

        SplitGroups {
            group1: order[..best_split].to_vec(),
            group2: order[best_split..].to_vec(),
        }
    }
}

/// Candidate split positions `lo..=hi` along a sorted order.
///
/// Clamped so a position always exists even when `min_size` cannot be
/// honoured on both sides (`2 * min_size > n`).
fn distribution_bounds(n: usize, min_size: usize) -> (usize, usize) {
    let lo = min_size.clamp(1, n - 1);
    let hi = n.saturating_sub(min_size).clamp(lo, n - 1);
    (lo, hi)
}

fn prefix_unions(order: &[usize], mbrs: &[&Rectangle]) -> Vec<Rectangle> {
    let mut out = Vec::with_capacity(order.len());
    let mut acc = mbrs[order[0]].clone();
    out.push(acc.clone());
    for &i in &order[1..] {
        acc = acc.add(mbrs[i]);
        out.push(acc.clone());
    }
    out
}

fn suffix_unions(order: &[usize], mbrs: &[&Rectangle]) -> Vec<Rectangle> {
    let mut out = vec![mbrs[*order.last().expect("non-empty order")].clone(); order.len()];
    for pos in (0..order.len() - 1).rev() {
        out[pos] = out[pos + 1].add(mbrs[order[pos]]);
    }
    out
}

/// The pair whose combined rectangle wastes the most space.
fn worst_combination(mbrs: &[&Rectangle]) -> (usize, usize) {
    (0..mbrs.len())
        .tuple_combinations()
        .max_by(|&(a1, b1), &(a2, b2)| {
            total_cmp(waste(mbrs[a1], mbrs[b1]), waste(mbrs[a2], mbrs[b2]))
        })
        .expect("at least two items")
}

fn waste(a: &Rectangle, b: &Rectangle) -> f64 {
    a.add(b).volume() - a.volume() - b.volume()
}

fn enlargement(group_mbr: &Rectangle, item: &Rectangle) -> f64 {
    group_mbr.add(item).volume() - group_mbr.volume()
}

/// Position in `remaining` of the item with the strongest preference for
/// one group over the other.
fn next_candidate(
    remaining: &[usize],
    mbrs: &[&Rectangle],
    mbr1: &Rectangle,
    mbr2: &Rectangle,
) -> usize {
    let mut best_pos = 0;
    let mut best_preference = f64::NEG_INFINITY;
    for (pos, &item) in remaining.iter().enumerate() {
        let preference = (enlargement(mbr1, mbrs[item]) - enlargement(mbr2, mbrs[item])).abs();
        if preference > best_preference {
            best_preference = preference;
            best_pos = pos;
        }
    }
    best_pos
}

fn total_cmp(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}
