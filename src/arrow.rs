// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The OrthoIndex Authors

//! Arrow interop: point sets as `RecordBatch`es of Float64 coordinate
//! columns.
//!
//! The first `D` columns of a batch are the coordinates, in dimension
//! order. This is an ingestion boundary only; the trees themselves are not
//! serialized.

use std::sync::Arc;

use arrow_array::cast::AsArray;
use arrow_array::types::Float64Type;
use arrow_array::{Array, ArrayRef, Float64Array, RecordBatch};
use arrow_schema::{DataType, Field, Schema};
use snafu::location;

use crate::geom::Point;
use crate::{Error, Result};

/// Schema with `D` non-null Float64 columns named `dim_0 .. dim_{D-1}`.
pub fn coordinate_schema<const D: usize>() -> Arc<Schema> {
    let fields: Vec<Field> = (0..D)
        .map(|d| Field::new(format!("dim_{}", d), DataType::Float64, false))
        .collect();
    Arc::new(Schema::new(fields))
}

/// Convert points into a coordinate batch.
pub fn points_to_batch<const D: usize>(points: &[Point<f64, D>]) -> Result<RecordBatch> {
    let columns: Vec<ArrayRef> = (0..D)
        .map(|d| {
            let values: Vec<f64> = points.iter().map(|p| p.coords[d]).collect();
            Arc::new(Float64Array::from(values)) as ArrayRef
        })
        .collect();
    let batch = RecordBatch::try_new(coordinate_schema::<D>(), columns)?;
    Ok(batch)
}

/// Extract points from the first `D` columns of `batch`.
///
/// Every coordinate column must be non-nullable Float64; anything else is
/// rejected as invalid input.
pub fn points_from_batch<const D: usize>(batch: &RecordBatch) -> Result<Vec<Point<f64, D>>> {
    if batch.num_columns() < D {
        return Err(Error::invalid_input(
            format!(
                "expected at least {} coordinate columns, got {}",
                D,
                batch.num_columns()
            ),
            location!(),
        ));
    }

    let mut columns = Vec::with_capacity(D);
    for d in 0..D {
        let column = batch.column(d);
        let values = column.as_primitive_opt::<Float64Type>().ok_or_else(|| {
            Error::invalid_input(
                format!(
                    "coordinate column {} has type {}, expected Float64",
                    d,
                    column.data_type()
                ),
                location!(),
            )
        })?;
        if values.null_count() > 0 {
            return Err(Error::invalid_input(
                format!("coordinate column {} contains nulls", d),
                location!(),
            ));
        }
        columns.push(values);
    }

    let mut points = Vec::with_capacity(batch.num_rows());
    for row in 0..batch.num_rows() {
        let mut coords = [0.0; D];
        for (d, column) in columns.iter().enumerate() {
            coords[d] = column.value(row);
        }
        points.push(Point::new(coords));
    }
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kdtree::KdTree;
    use crate::metrics::NoOpMetricsCollector;
    use crate::Rect;
    use arrow_array::Int32Array;

    #[test]
    fn test_build_index_from_batch() {
        let points: Vec<Point<f64, 2>> = vec![
            Point::new([7.0, 2.0]),
            Point::new([5.0, 4.0]),
            Point::new([9.0, 6.0]),
            Point::new([8.0, 1.0]),
        ];
        let batch = points_to_batch(&points).unwrap();
        assert_eq!(batch.num_rows(), 4);

        let decoded = points_from_batch::<2>(&batch).unwrap();
        let tree = KdTree::build(decoded);
        let rect = Rect::new([1.0, 0.0], [8.0, 5.0]);
        let results = tree.range_query(&rect, &NoOpMetricsCollector).unwrap();
        assert_eq!(results.len(), 3);
    }

    #[test]
    fn test_rejects_missing_columns() {
        let points: Vec<Point<f64, 2>> = vec![Point::new([1.0, 2.0])];
        let batch = points_to_batch(&points).unwrap();
        assert!(points_from_batch::<3>(&batch).is_err());
    }

    #[test]
    fn test_rejects_non_float_column() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("dim_0", DataType::Int32, false),
            Field::new("dim_1", DataType::Float64, false),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int32Array::from(vec![1, 2])) as ArrayRef,
                Arc::new(Float64Array::from(vec![1.0, 2.0])) as ArrayRef,
            ],
        )
        .unwrap();
        assert!(points_from_batch::<2>(&batch).is_err());
    }
}
