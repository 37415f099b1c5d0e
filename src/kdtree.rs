// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The OrthoIndex Authors

//! 2-D KD-tree for orthogonal range reporting.
//!
//! The tree is built once from a static point set and never mutated.
//! Construction recursively splits at the median, alternating between the x
//! axis (even depth) and the y axis (odd depth), so the tree is balanced by
//! construction: height is `ceil(log2(n + 1))`.
//!
//! Range queries prune whole subtrees using the split coordinate: a subtree
//! is descended only if its side of the split can intersect the query
//! rectangle, which bounds the visited nodes at O(sqrt(n) + k) for k
//! reported points.

use std::cmp::Ordering;

use deepsize::DeepSizeOf;
use log::debug;
use num_traits::Bounded;

use crate::geom::{bounding_rect, Point, Rect};
use crate::metrics::MetricsCollector;
use crate::Result;

/// A single tree node. Nodes are stored in an arena `Vec` and reference
/// their children by index; `None` marks an absent child.
#[derive(Debug, Clone, DeepSizeOf)]
struct KdNode<T> {
    point: Point<T, 2>,
    left: Option<u32>,
    right: Option<u32>,
}

/// A balanced 2-D KD-tree over an immutable point set.
#[derive(Debug, DeepSizeOf)]
pub struct KdTree<T> {
    nodes: Vec<KdNode<T>>,
    root: Option<u32>,
}

impl<T: Copy + PartialOrd> KdTree<T> {
    /// Build a KD-tree from `points`.
    ///
    /// Median ties: the sort by the split coordinate is stable and the
    /// lower median is stored at the node, so elements strictly before the
    /// median index go left and elements strictly after go right. Every
    /// input point ends up in exactly one node.
    ///
    /// An empty input yields an empty tree, not an error.
    pub fn build(mut points: Vec<Point<T, 2>>) -> Self {
        let num_points = points.len();
        let mut nodes = Vec::with_capacity(num_points);
        let root = Self::build_recursive(&mut points, 0, &mut nodes);
        debug!("built KD-tree: {} points, {} nodes", num_points, nodes.len());
        Self { nodes, root }
    }

    fn build_recursive(
        points: &mut [Point<T, 2>],
        depth: usize,
        nodes: &mut Vec<KdNode<T>>,
    ) -> Option<u32> {
        if points.is_empty() {
            return None;
        }

        let axis = depth % 2;
        points.sort_by(|a, b| {
            a.coords[axis]
                .partial_cmp(&b.coords[axis])
                .unwrap_or(Ordering::Equal)
        });
        let mid = points.len() / 2;

        // Reserve the node before recursing so the arena stays in
        // depth-first order; children are patched in afterwards.
        let node_id = nodes.len() as u32;
        nodes.push(KdNode {
            point: points[mid],
            left: None,
            right: None,
        });

        let (left_half, rest) = points.split_at_mut(mid);
        let right_half = &mut rest[1..];
        let left = Self::build_recursive(left_half, depth + 1, nodes);
        let right = Self::build_recursive(right_half, depth + 1, nodes);

        let node = &mut nodes[node_id as usize];
        node.left = left;
        node.right = right;
        Some(node_id)
    }

    /// Report every point inside the closed rectangle `rect`.
    ///
    /// Fails fast with an invalid-input error if `rect` has an inverted
    /// interval on either axis. Result order is unspecified; no point is
    /// reported twice.
    pub fn range_query(
        &self,
        rect: &Rect<T, 2>,
        metrics: &dyn MetricsCollector,
    ) -> Result<Vec<Point<T, 2>>> {
        rect.validate()?;

        let mut results = Vec::new();
        let mut stack = Vec::new();
        if let Some(root) = self.root {
            stack.push((root, 0usize));
        }

        let mut nodes_visited = 0usize;
        while let Some((node_id, depth)) = stack.pop() {
            nodes_visited += 1;
            let node = &self.nodes[node_id as usize];
            let axis = depth % 2;
            let split = node.point.coords[axis];
            let (lo, hi) = rect.interval(axis);

            if split < lo {
                // Left subtree lies entirely below the interval on this axis.
                if let Some(right) = node.right {
                    stack.push((right, depth + 1));
                }
            } else if split > hi {
                if let Some(left) = node.left {
                    stack.push((left, depth + 1));
                }
            } else {
                // Split value inside the interval: both subtrees may hold
                // in-range points, and the node itself needs the full test.
                if let Some(left) = node.left {
                    stack.push((left, depth + 1));
                }
                if let Some(right) = node.right {
                    stack.push((right, depth + 1));
                }
                if rect.contains(&node.point) {
                    results.push(node.point);
                }
            }
        }

        metrics.record_nodes_visited(nodes_visited);
        metrics.record_comparisons(nodes_visited * 2);
        debug!(
            "KD-tree range query: visited {} of {} nodes, reported {}",
            nodes_visited,
            self.nodes.len(),
            results.len()
        );
        Ok(results)
    }

    /// Number of indexed points.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Height of the tree: the number of nodes on the longest root-to-leaf
    /// path. An empty tree has height 0.
    pub fn height(&self) -> usize {
        let mut height = 0;
        let mut stack = Vec::new();
        if let Some(root) = self.root {
            stack.push((root, 1usize));
        }
        while let Some((node_id, depth)) = stack.pop() {
            height = height.max(depth);
            let node = &self.nodes[node_id as usize];
            if let Some(left) = node.left {
                stack.push((left, depth + 1));
            }
            if let Some(right) = node.right {
                stack.push((right, depth + 1));
            }
        }
        height
    }
}

impl<T: Copy + PartialOrd + Bounded> KdTree<T> {
    /// Bounding rectangle of the indexed points, or `None` if empty.
    pub fn bounds(&self) -> Option<Rect<T, 2>> {
        let points: Vec<_> = self.nodes.iter().map(|n| n.point).collect();
        bounding_rect(&points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{LocalMetricsCollector, NoOpMetricsCollector};
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn sample_points() -> Vec<Point<i64, 2>> {
        vec![
            Point::new([7, 2]),
            Point::new([5, 4]),
            Point::new([9, 6]),
            Point::new([4, 7]),
            Point::new([8, 1]),
            Point::new([2, 3]),
        ]
    }

    fn sorted(mut points: Vec<Point<i64, 2>>) -> Vec<Point<i64, 2>> {
        points.sort_by_key(|p| p.coords);
        points
    }

    fn brute_force(points: &[Point<i64, 2>], rect: &Rect<i64, 2>) -> Vec<Point<i64, 2>> {
        sorted(points.iter().filter(|p| rect.contains(p)).copied().collect())
    }

    #[test]
    fn test_full_containment_scenario() {
        let tree = KdTree::build(sample_points());
        let rect = Rect::from_corners(Point::new([1, 0]), Point::new([8, 5]));
        let results = tree.range_query(&rect, &NoOpMetricsCollector).unwrap();
        assert_eq!(
            sorted(results),
            sorted(vec![
                Point::new([2, 3]),
                Point::new([5, 4]),
                Point::new([7, 2]),
                Point::new([8, 1]),
            ])
        );
    }

    #[test]
    fn test_empty_tree() {
        let tree: KdTree<i64> = KdTree::build(vec![]);
        assert!(tree.is_empty());
        assert_eq!(tree.height(), 0);
        assert!(tree.bounds().is_none());
        let rect = Rect::new([0, 0], [10, 10]);
        let results = tree.range_query(&rect, &NoOpMetricsCollector).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_singleton_tree() {
        let tree = KdTree::build(vec![Point::new([3i64, 4])]);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.height(), 1);

        let inside = Rect::new([0, 0], [10, 10]);
        let outside = Rect::new([5, 5], [10, 10]);
        assert_eq!(
            tree.range_query(&inside, &NoOpMetricsCollector).unwrap(),
            vec![Point::new([3, 4])]
        );
        assert!(tree
            .range_query(&outside, &NoOpMetricsCollector)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_inverted_rect_fails_fast() {
        let tree = KdTree::build(sample_points());
        let rect = Rect::new([8, 0], [1, 5]);
        assert!(tree.range_query(&rect, &NoOpMetricsCollector).is_err());
    }

    #[test]
    fn test_no_duplicates_with_ties() {
        // Many points sharing the split coordinate, with the rectangle
        // boundary sitting exactly on it.
        let points: Vec<Point<i64, 2>> = (0..20).map(|y| Point::new([5, y])).collect();
        let tree = KdTree::build(points.clone());
        let rect = Rect::new([5, 3], [5, 11]);
        let results = tree.range_query(&rect, &NoOpMetricsCollector).unwrap();
        assert_eq!(sorted(results), brute_force(&points, &rect));
    }

    #[test]
    fn test_balance_height_bound() {
        let mut rng = StdRng::seed_from_u64(42);
        for n in 1..=64usize {
            let points: Vec<Point<i64, 2>> = (0..n)
                .map(|_| Point::new([rng.gen_range(0..1000), rng.gen_range(0..1000)]))
                .collect();
            let tree = KdTree::build(points);
            let bound = ((n + 1) as f64).log2().ceil() as usize;
            assert!(
                tree.height() <= bound,
                "n={}: height {} exceeds {}",
                n,
                tree.height(),
                bound
            );
        }
    }

    #[test]
    fn test_disjoint_rect_prunes() {
        // 32x32 grid; the rectangle is disjoint from the points on x only,
        // so pruning happens at every even depth.
        let points: Vec<Point<i64, 2>> = (0..32)
            .flat_map(|x| (0..32).map(move |y| Point::new([x, y])))
            .collect();
        let n = points.len();
        let tree = KdTree::build(points);

        let rect = Rect::new([100, 0], [200, 32]);
        let metrics = LocalMetricsCollector::new();
        let results = tree.range_query(&rect, &metrics).unwrap();
        assert!(results.is_empty());
        assert!(metrics.nodes_visited() > 0);
        // O(sqrt(n)) bound, with generous slack; the point is that the
        // traversal never degenerates to a full scan.
        assert!(
            metrics.nodes_visited() <= 200,
            "visited {} of {} nodes",
            metrics.nodes_visited(),
            n
        );
    }

    #[test]
    fn test_build_order_independent() {
        let forward = sample_points();
        let mut reversed = sample_points();
        reversed.reverse();

        let tree_a = KdTree::build(forward.clone());
        let tree_b = KdTree::build(reversed);

        for rect in [
            Rect::new([1, 0], [8, 5]),
            Rect::new([0, 0], [10, 10]),
            Rect::new([5, 2], [9, 7]),
        ] {
            let a = tree_a.range_query(&rect, &NoOpMetricsCollector).unwrap();
            let b = tree_b.range_query(&rect, &NoOpMetricsCollector).unwrap();
            assert_eq!(sorted(a), sorted(b));
        }
    }

    proptest! {
        #[test]
        fn test_query_matches_linear_scan(
            raw in prop::collection::vec((0i64..50, 0i64..50), 0..128),
            x0 in 0i64..50, x1 in 0i64..50,
            y0 in 0i64..50, y1 in 0i64..50,
        ) {
            let points: Vec<Point<i64, 2>> =
                raw.iter().map(|&(x, y)| Point::new([x, y])).collect();
            let rect = Rect::new(
                [x0.min(x1), y0.min(y1)],
                [x0.max(x1), y0.max(y1)],
            );

            let tree = KdTree::build(points.clone());
            let results = tree.range_query(&rect, &NoOpMetricsCollector).unwrap();
            prop_assert_eq!(sorted(results), brute_force(&points, &rect));
        }
    }
}
