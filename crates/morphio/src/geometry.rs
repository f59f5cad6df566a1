use crate::error::Result;
use crate::layout::POINT_COLUMNS;
use crate::store::TabularStore;
use crate::table::{read_f64_table, Shape};
use crate::types::{FloatType, Point, RepairStage};

/// Reads the `[N, 4]` point table at `path` into coordinates and diameters.
pub(crate) fn read_points<S: TabularStore + ?Sized>(
    store: &S,
    path: &str,
    stage: Option<RepairStage>,
) -> Result<(Vec<Point>, Vec<FloatType>)> {
    let table = read_f64_table(store, path, Shape::Columns(POINT_COLUMNS))
        .map_err(|e| e.into_required(store.location(), path, stage))?;

    let mut points = Vec::with_capacity(table.len());
    let mut diameters = Vec::with_capacity(table.len());
    for row in table.rows() {
        points.push([row[0] as FloatType, row[1] as FloatType, row[2] as FloatType]);
        diameters.push(row[3] as FloatType);
    }
    tracing::trace!(file = store.location(), path, points = points.len(), "decoded points");
    Ok((points, diameters))
}
