// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The OrthoIndex Authors

//! Points and axis-aligned query rectangles.
//!
//! Coordinates are generic over `Copy + PartialOrd` scalars (integers or
//! floats). Incomparable values (NaN) are treated as equal, matching the
//! comparator convention used throughout the query paths.

use deepsize::{Context, DeepSizeOf};
use num_traits::Bounded;
use snafu::location;

use crate::{Error, Result};

/// A fixed-dimension point. Immutable once created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Point<T, const D: usize> {
    pub coords: [T; D],
}

impl<T: Copy, const D: usize> Point<T, D> {
    pub fn new(coords: [T; D]) -> Self {
        Self { coords }
    }

    /// Coordinate along `axis`. Panics if `axis >= D`.
    #[inline]
    pub fn coord(&self, axis: usize) -> T {
        self.coords[axis]
    }
}

impl<T, const D: usize> From<[T; D]> for Point<T, D> {
    fn from(coords: [T; D]) -> Self {
        Self { coords }
    }
}

impl<T: DeepSizeOf, const D: usize> DeepSizeOf for Point<T, D> {
    fn deep_size_of_children(&self, context: &mut Context) -> usize {
        self.coords
            .iter()
            .map(|c| c.deep_size_of_children(context))
            .sum()
    }
}

/// An axis-aligned closed rectangle: `[min[i], max[i]]` on every axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect<T, const D: usize> {
    pub min: [T; D],
    pub max: [T; D],
}

impl<T: Copy + PartialOrd, const D: usize> Rect<T, D> {
    pub fn new(min: [T; D], max: [T; D]) -> Self {
        Self { min, max }
    }

    /// Build from two diagonal corner points, `lo` and `hi`.
    pub fn from_corners(lo: Point<T, D>, hi: Point<T, D>) -> Self {
        Self {
            min: lo.coords,
            max: hi.coords,
        }
    }

    /// The closed interval covered on `axis`.
    #[inline]
    pub fn interval(&self, axis: usize) -> (T, T) {
        (self.min[axis], self.max[axis])
    }

    /// Check that `min[i] <= max[i]` holds on every axis.
    ///
    /// Queries fail fast on inverted intervals rather than silently
    /// returning an empty result.
    pub fn validate(&self) -> Result<()> {
        for axis in 0..D {
            if self.min[axis] > self.max[axis] {
                return Err(Error::invalid_input(
                    format!("query interval inverted on axis {}", axis),
                    location!(),
                ));
            }
        }
        Ok(())
    }

    /// Whether `point` lies inside the rectangle on every axis.
    #[inline]
    pub fn contains(&self, point: &Point<T, D>) -> bool {
        for axis in 0..D {
            let c = point.coords[axis];
            if c < self.min[axis] || c > self.max[axis] {
                return false;
            }
        }
        true
    }
}

impl<T: DeepSizeOf, const D: usize> DeepSizeOf for Rect<T, D> {
    fn deep_size_of_children(&self, context: &mut Context) -> usize {
        self.min
            .iter()
            .chain(self.max.iter())
            .map(|c| c.deep_size_of_children(context))
            .sum()
    }
}

/// Smallest rectangle enclosing `points`, or `None` for an empty slice.
pub fn bounding_rect<T, const D: usize>(points: &[Point<T, D>]) -> Option<Rect<T, D>>
where
    T: Copy + PartialOrd + Bounded,
{
    if points.is_empty() {
        return None;
    }

    let mut min = [T::max_value(); D];
    let mut max = [T::min_value(); D];
    for point in points {
        for axis in 0..D {
            let c = point.coords[axis];
            if c < min[axis] {
                min[axis] = c;
            }
            if c > max[axis] {
                max[axis] = c;
            }
        }
    }

    Some(Rect { min, max })
}
