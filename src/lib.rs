// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The OrthoIndex Authors

//! Orthogonal range searching over static multi-dimensional point sets.
//!
//! Two index families, built once from an immutable point set and then
//! queried with axis-aligned closed rectangles:
//!
//! - [`KdTree`]: a balanced 2-D k-d tree splitting alternately on x and y,
//!   with subtree pruning for O(sqrt(n) + k) range reporting.
//! - [`RangeTree`]: an N-dimensional layered range tree where every node
//!   owns an associated structure on the next dimension, for
//!   O(log^D n + k) range reporting.
//!
//! Neither structure supports insertion or deletion after construction;
//! rebuild from scratch for a new point set.
//!
//! # Example
//!
//! ```
//! use ortho_index::{KdTree, NoOpMetricsCollector, Point, Rect};
//!
//! let tree = KdTree::build(vec![
//!     Point::new([7, 2]),
//!     Point::new([5, 4]),
//!     Point::new([9, 6]),
//! ]);
//! let rect = Rect::new([1, 0], [8, 5]);
//! let hits = tree.range_query(&rect, &NoOpMetricsCollector).unwrap();
//! assert_eq!(hits.len(), 2);
//! ```

pub mod arrow;
pub mod error;
pub mod geom;
pub mod kdtree;
pub mod metrics;
pub mod rangetree;

pub use error::{Error, Result};
pub use geom::{bounding_rect, Point, Rect};
pub use kdtree::KdTree;
pub use metrics::{LocalMetricsCollector, MetricsCollector, NoOpMetricsCollector};
pub use rangetree::RangeTree;
