//! Shape-checked reads of rectangular datasets.

use std::fmt;

use crate::error::Error;
use crate::store::{StoreError, TabularStore};
use crate::types::RepairStage;

/// Expected shape of a dataset, row count free.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Shape {
    /// Rank 1.
    Vector,
    /// Rank 2 with exactly this many columns.
    Columns(u64),
}

impl Shape {
    fn matches(&self, actual: &[u64]) -> bool {
        match self {
            Shape::Vector => actual.len() == 1,
            Shape::Columns(c) => actual.len() == 2 && actual[1] == *c,
        }
    }

    fn width(&self) -> usize {
        match self {
            Shape::Vector => 1,
            Shape::Columns(c) => *c as usize,
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Vector => f.write_str("[N]"),
            Shape::Columns(c) => write!(f, "[N, {c}]"),
        }
    }
}

/// Row-major values of a dataset that passed its shape check.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Table<T> {
    columns: usize,
    values: Vec<T>,
}

impl<T: Copy> Table<T> {
    pub fn len(&self) -> usize {
        self.values.len() / self.columns
    }

    pub fn rows(&self) -> impl Iterator<Item = &[T]> + '_ {
        self.values.chunks_exact(self.columns)
    }

    pub fn column(&self, index: usize) -> impl Iterator<Item = T> + '_ {
        self.rows().map(move |row| row[index])
    }
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum TableError {
    #[error("dataset is absent")]
    Absent,
    #[error("shape {actual:?}, expected {expected}")]
    Shape { expected: Shape, actual: Vec<u64> },
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl TableError {
    /// Turns a failed read of a table the decode cannot do without into an
    /// [`Error`].
    pub fn into_required(self, file: &str, path: &str, stage: Option<RepairStage>) -> Error {
        match self {
            TableError::Absent => Error::MissingDataset {
                file: file.to_string(),
                dataset: path.to_string(),
                stage,
            },
            TableError::Shape { expected, actual } => Error::ShapeMismatch {
                file: file.to_string(),
                dataset: path.to_string(),
                expected: expected.to_string(),
                actual,
            },
            TableError::Store(source) => Error::store(file, path, source),
        }
    }
}

fn read_table<S, T>(
    store: &S,
    path: &str,
    shape: Shape,
    read: impl FnOnce(&S, &str) -> Result<Vec<T>, StoreError>,
) -> Result<Table<T>, TableError>
where
    S: TabularStore + ?Sized,
{
    let info = store.dataset(path)?.ok_or(TableError::Absent)?;
    if !shape.matches(&info.shape) {
        return Err(TableError::Shape {
            expected: shape,
            actual: info.shape,
        });
    }
    let columns = shape.width();
    if columns == 0 {
        return Ok(Table {
            columns: 1,
            values: Vec::new(),
        });
    }
    let values = read(store, path)?;
    if values.len() % columns != 0 {
        return Err(TableError::Store(StoreError::Data {
            path: path.to_string(),
            reason: format!("{} values do not fill {columns} columns", values.len()),
        }));
    }
    Ok(Table { columns, values })
}

pub(crate) fn read_f64_table<S: TabularStore + ?Sized>(
    store: &S,
    path: &str,
    shape: Shape,
) -> Result<Table<f64>, TableError> {
    read_table(store, path, shape, |s, p| s.read_f64(p))
}

pub(crate) fn read_i64_table<S: TabularStore + ?Sized>(
    store: &S,
    path: &str,
    shape: Shape,
) -> Result<Table<i64>, TableError> {
    read_table(store, path, shape, |s, p| s.read_i64(p))
}
