// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The OrthoIndex Authors

//! N-dimensional layered range tree.
//!
//! The primary tree partitions points by median on dimension 0. Every node
//! additionally owns an associated structure: a range tree over the node's
//! entire subtree subset, built on dimension 1, and so on through dimension
//! `D - 1`. Total size is O(n log^(D-1) n); each point is stored once per
//! dimension layer it participates in.
//!
//! Queries locate, per dimension, the split node where the search paths for
//! the interval endpoints diverge, then walk the two spines. Every off-path
//! subtree that lies fully inside the interval is a canonical subtree: its
//! remaining dimensions are resolved through its associated structure (or
//! reported wholesale at the last dimension). Spine points themselves are
//! tested against the full rectangle. This yields O(log^D n + k) query time
//! without visiting every node.
//!
//! Construction keeps, for every subset, an index list per remaining
//! dimension, presorted once up front and partitioned stably at each split.
//! No node ever re-sorts its subset from scratch.

use std::cmp::Ordering;

use deepsize::DeepSizeOf;
use log::debug;
use snafu::location;

use crate::geom::{Point, Rect};
use crate::metrics::MetricsCollector;
use crate::{Error, Result};

/// A node of the primary tree or of any associated structure. All nodes of
/// all layers live in one arena; `point` indexes the shared point table.
#[derive(Debug, Clone, DeepSizeOf)]
struct RangeNode {
    point: u32,
    left: Option<u32>,
    right: Option<u32>,
    /// Root of the associated structure over this node's whole subtree,
    /// built on the next dimension. `None` at the last dimension.
    assoc: Option<u32>,
}

/// A static layered range tree over `D`-dimensional points.
#[derive(Debug)]
pub struct RangeTree<T, const D: usize> {
    points: Vec<Point<T, D>>,
    nodes: Vec<RangeNode>,
    root: Option<u32>,
}

impl<T: DeepSizeOf, const D: usize> DeepSizeOf for RangeTree<T, D> {
    fn deep_size_of_children(&self, context: &mut deepsize::Context) -> usize {
        self.points.deep_size_of_children(context)
            + self.nodes.deep_size_of_children(context)
            + self.root.deep_size_of_children(context)
    }
}

/// Which side of a median split a point landed on. Scratch state during
/// construction, indexed by point id.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Side {
    Left,
    Median,
    Right,
}

struct RangeTreeBuilder {
    nodes: Vec<RangeNode>,
    side: Vec<Side>,
}

impl RangeTreeBuilder {
    /// Build the tree for one subset.
    ///
    /// `lists[j]` holds the subset's point ids sorted by dimension `d + j`;
    /// an empty `lists` means `d` has reached `D` (the designed terminal
    /// condition), and an empty primary list means an empty subset.
    fn build_node(&mut self, lists: &[Vec<u32>], d: usize) -> Option<u32> {
        let primary = lists.first()?;
        if primary.is_empty() {
            return None;
        }

        let mid = primary.len() / 2;
        let point_id = primary[mid];
        let node_id = self.nodes.len() as u32;
        self.nodes.push(RangeNode {
            point: point_id,
            left: None,
            right: None,
            assoc: None,
        });

        // Mark the split, then partition every remaining dimension's list
        // stably. The side buffer is reused by recursive calls, so all
        // reads happen before any recursion.
        for &id in &primary[..mid] {
            self.side[id as usize] = Side::Left;
        }
        self.side[point_id as usize] = Side::Median;
        for &id in &primary[mid + 1..] {
            self.side[id as usize] = Side::Right;
        }

        let mut left_lists = Vec::with_capacity(lists.len());
        let mut right_lists = Vec::with_capacity(lists.len());
        left_lists.push(primary[..mid].to_vec());
        right_lists.push(primary[mid + 1..].to_vec());
        for list in &lists[1..] {
            let mut left = Vec::new();
            let mut right = Vec::new();
            for &id in list {
                match self.side[id as usize] {
                    Side::Left => left.push(id),
                    Side::Right => right.push(id),
                    Side::Median => {}
                }
            }
            left_lists.push(left);
            right_lists.push(right);
        }

        // The associated structure covers the whole current subset (median
        // included), re-expressed on the next dimension.
        let assoc = self.build_node(&lists[1..], d + 1);
        let left = self.build_node(&left_lists, d);
        let right = self.build_node(&right_lists, d);

        let node = &mut self.nodes[node_id as usize];
        node.assoc = assoc;
        node.left = left;
        node.right = right;
        Some(node_id)
    }
}

impl<T: Copy + PartialOrd, const D: usize> RangeTree<T, D> {
    /// Build a layered range tree from `points`.
    ///
    /// Median ties follow the KD-tree rule: stable sort per dimension,
    /// lower median at the node, strict halves left and right.
    ///
    /// An empty input yields an empty tree; `D == 0` is rejected.
    pub fn build(points: Vec<Point<T, D>>) -> Result<Self> {
        if D == 0 {
            return Err(Error::invalid_input(
                "range tree requires at least one dimension",
                location!(),
            ));
        }

        let lists: Vec<Vec<u32>> = (0..D)
            .map(|d| {
                let mut ids: Vec<u32> = (0..points.len() as u32).collect();
                ids.sort_by(|&a, &b| {
                    points[a as usize].coords[d]
                        .partial_cmp(&points[b as usize].coords[d])
                        .unwrap_or(Ordering::Equal)
                });
                ids
            })
            .collect();

        let mut builder = RangeTreeBuilder {
            nodes: Vec::new(),
            side: vec![Side::Left; points.len()],
        };
        let root = builder.build_node(&lists, 0);
        let nodes = builder.nodes;
        debug!(
            "built {}-d range tree: {} points, {} nodes across all layers",
            D,
            points.len(),
            nodes.len()
        );

        Ok(Self {
            points,
            nodes,
            root,
        })
    }

    /// Report every point inside the closed rectangle `rect`.
    ///
    /// Fails fast with an invalid-input error if `rect` has an inverted
    /// interval on any axis. Result order is unspecified; no point is
    /// reported twice.
    pub fn range_query(
        &self,
        rect: &Rect<T, D>,
        metrics: &dyn MetricsCollector,
    ) -> Result<Vec<Point<T, D>>> {
        rect.validate()?;

        let mut results = Vec::new();
        let mut visited = 0usize;
        self.query_dim(self.root, rect, 0, &mut results, &mut visited);

        metrics.record_nodes_visited(visited);
        metrics.record_comparisons(visited * 2);
        debug!(
            "range tree query: visited {} of {} nodes, reported {}",
            visited,
            self.nodes.len(),
            results.len()
        );
        Ok(results)
    }

    /// Restrict one dimension: find the split node for `rect`'s interval on
    /// dimension `d`, then walk both spines, resolving canonical subtrees
    /// through their associated structures.
    ///
    /// Invariant: every point reachable from `root` already satisfies the
    /// rectangle on dimensions `0..d`.
    fn query_dim(
        &self,
        root: Option<u32>,
        rect: &Rect<T, D>,
        d: usize,
        out: &mut Vec<Point<T, D>>,
        visited: &mut usize,
    ) {
        let (lo, hi) = rect.interval(d);

        // Descend while the interval lies strictly on one side of the split
        // value. The descent is strict on both ends: with a point stored at
        // every node, a node whose coordinate equals an endpoint is itself
        // in range and must not be skipped.
        let mut v = match root {
            Some(v) => v,
            None => return,
        };
        let split = loop {
            *visited += 1;
            let node = &self.nodes[v as usize];
            let s = self.coord(node.point, d);
            if hi < s {
                match node.left {
                    Some(left) => v = left,
                    None => return,
                }
            } else if s < lo {
                match node.right {
                    Some(right) => v = right,
                    None => return,
                }
            } else {
                break v;
            }
        };

        let split_node = &self.nodes[split as usize];
        self.report_point(split_node.point, rect, out);

        // Left spine: the path of `lo` through the split node's left
        // subtree, where every coordinate is already <= hi. Whenever the
        // spine stays left, the right child's subtree is fully inside the
        // interval on this dimension.
        let mut cur = split_node.left;
        while let Some(u) = cur {
            *visited += 1;
            let node = &self.nodes[u as usize];
            let x = self.coord(node.point, d);
            if x >= lo {
                self.report_point(node.point, rect, out);
                self.report_canonical(node.right, rect, d, out, visited);
                cur = node.left;
            } else {
                cur = node.right;
            }
        }

        // Right spine: the path of `hi`, mirrored.
        let mut cur = split_node.right;
        while let Some(u) = cur {
            *visited += 1;
            let node = &self.nodes[u as usize];
            let x = self.coord(node.point, d);
            if x <= hi {
                self.report_point(node.point, rect, out);
                self.report_canonical(node.left, rect, d, out, visited);
                cur = node.right;
            } else {
                cur = node.left;
            }
        }
    }

    /// Handle a canonical subtree: fully inside the interval on dimension
    /// `d`. Remaining dimensions go through the associated structure; at the
    /// last dimension the whole subtree is reported.
    fn report_canonical(
        &self,
        subtree: Option<u32>,
        rect: &Rect<T, D>,
        d: usize,
        out: &mut Vec<Point<T, D>>,
        visited: &mut usize,
    ) {
        let root = match subtree {
            Some(root) => root,
            None => return,
        };
        if d + 1 < D {
            self.query_dim(self.nodes[root as usize].assoc, rect, d + 1, out, visited);
        } else {
            let mut stack = vec![root];
            while let Some(node_id) = stack.pop() {
                *visited += 1;
                let node = &self.nodes[node_id as usize];
                out.push(self.points[node.point as usize]);
                if let Some(left) = node.left {
                    stack.push(left);
                }
                if let Some(right) = node.right {
                    stack.push(right);
                }
            }
        }
    }

    fn report_point(&self, point_id: u32, rect: &Rect<T, D>, out: &mut Vec<Point<T, D>>) {
        let point = self.points[point_id as usize];
        if rect.contains(&point) {
            out.push(point);
        }
    }

    #[inline]
    fn coord(&self, point_id: u32, d: usize) -> T {
        self.points[point_id as usize].coords[d]
    }

    /// Number of indexed points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Total node count across the primary tree and all associated
    /// structures: O(n log^(D-1) n).
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }
}
