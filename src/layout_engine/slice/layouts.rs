//! Ready-made area descriptions.

use super::area::{Area, OverflowArea, ParentArea, SliceArea};

/// One window on the left half, the rest stacked on the right half.
pub fn primary_stack_area() -> ParentArea {
    ParentArea::new(
        true,
        [(0.5, SliceArea::new(0, 1).into()), (0.5, OverflowArea::new(false).into())],
    )
}

/// Equal-width columns with the given capacities. A capacity of zero makes
/// the column the overflow area; only the last such column keeps that role.
pub fn multi_column_area(capacities: &[usize]) -> ParentArea {
    let weight = 1.0 / capacities.len().max(1) as f64;
    let mut areas: Vec<(f64, Area)> = Vec::with_capacity(capacities.len());
    let mut overflow_index = None;

    for (index, &capacity) in capacities.iter().enumerate() {
        if capacity == 0 {
            if let Some(previous) = overflow_index.replace(index) {
                areas[previous] = (weight, SliceArea::new(previous, 0).into());
            }
            areas.push((weight, OverflowArea::new(false).into()));
        } else {
            areas.push((weight, SliceArea::new(index, capacity).into()));
        }
    }

    ParentArea::new(true, areas)
}

/// A wide primary column in the middle, a secondary column on the left and
/// the overflow column on the right.
pub fn secondary_primary_area(primary_capacity: usize, secondary_capacity: usize) -> ParentArea {
    ParentArea::new(
        true,
        [
            (0.25, SliceArea::new(1, secondary_capacity).into()),
            (0.5, SliceArea::new(0, primary_capacity).into()),
            (0.25, OverflowArea::new(false).into()),
        ],
    )
}

/// Every window in one column, top to bottom.
pub fn column_area() -> ParentArea { ParentArea::new(false, [(1.0, OverflowArea::new(false).into())]) }

/// Every window in one row, left to right.
pub fn row_area() -> ParentArea { ParentArea::new(true, [(1.0, OverflowArea::new(true).into())]) }
