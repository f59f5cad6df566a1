//! Backend-agnostic access to the groups, attributes and datasets of a
//! morphology container.
//!
//! The decoder only ever talks to a [`TabularStore`]. Two backends ship with
//! the crate:
//!
//! ```text
//! ┌───────────────────────────┐
//! │ resolver + decoders       │
//! ├───────────────────────────┤
//! │   TabularStore            │  ← trait defined here
//! ├─────────────┬─────────────┤
//! │  H5Store    │ MemoryStore │
//! └─────────────┴─────────────┘
//! ```
//!
//! Absence is never an error: a missing group is `Ok(false)`, a missing
//! attribute or dataset is `Ok(None)`. Everything else that goes wrong is a
//! [`StoreError`].

mod hdf5;
mod memory;

pub use hdf5::H5Store;
pub use memory::MemoryStore;

use morphio_format::FormatError;

/// Broad element class of a dataset, enough to pick a reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementClass {
    Integer,
    Float,
    Other,
}

/// Shape and element class of a dataset, without reading its data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetInfo {
    pub shape: Vec<u64>,
    pub class: ElementClass,
}

impl DatasetInfo {
    pub fn rank(&self) -> usize {
        self.shape.len()
    }
}

/// Decoded value of an attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Int(Vec<i64>),
    Float(Vec<f64>),
    Text(Vec<String>),
}

impl AttrValue {
    /// Integer view; floats qualify only when every value is integral.
    pub fn as_ints(&self) -> Option<Vec<i64>> {
        match self {
            AttrValue::Int(v) => Some(v.clone()),
            AttrValue::Float(v) if v.iter().all(|x| x.fract() == 0.0) => {
                Some(v.iter().map(|x| *x as i64).collect())
            }
            _ => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HDF5 format error: {0}")]
    Format(#[from] FormatError),

    /// A read was issued for something that does not exist.
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("bad data in '{path}': {reason}")]
    Data { path: String, reason: String },
}

/// Read-only view of a hierarchical container of numeric tables.
///
/// Paths are absolute and `/`-separated. Datasets are returned flattened in
/// row-major order; callers pair them with [`DatasetInfo::shape`].
pub trait TabularStore: Send + Sync {
    /// Human-readable location used in error messages, usually the file path.
    fn location(&self) -> &str;

    fn has_group(&self, path: &str) -> Result<bool, StoreError>;

    /// Reads attribute `name` attached to the group at `group`.
    fn attribute(&self, group: &str, name: &str) -> Result<Option<AttrValue>, StoreError>;

    /// Shape and class of the dataset at `path`, or `None` when there is no
    /// dataset there.
    fn dataset(&self, path: &str) -> Result<Option<DatasetInfo>, StoreError>;

    fn read_f64(&self, path: &str) -> Result<Vec<f64>, StoreError>;

    /// Reads integer data. Float datasets holding integral values are accepted.
    fn read_i64(&self, path: &str) -> Result<Vec<i64>, StoreError>;
}

impl<T: TabularStore + ?Sized> TabularStore for &T {
    fn location(&self) -> &str {
        (**self).location()
    }

    fn has_group(&self, path: &str) -> Result<bool, StoreError> {
        (**self).has_group(path)
    }

    fn attribute(&self, group: &str, name: &str) -> Result<Option<AttrValue>, StoreError> {
        (**self).attribute(group, name)
    }

    fn dataset(&self, path: &str) -> Result<Option<DatasetInfo>, StoreError> {
        (**self).dataset(path)
    }

    fn read_f64(&self, path: &str) -> Result<Vec<f64>, StoreError> {
        (**self).read_f64(path)
    }

    fn read_i64(&self, path: &str) -> Result<Vec<i64>, StoreError> {
        (**self).read_i64(path)
    }
}

/// Strips duplicate and trailing separators; the root is `/`.
pub(crate) fn normalize_path(path: &str) -> String {
    let parts: Vec<&str> = path.split('/').filter(|c| !c.is_empty()).collect();
    format!("/{}", parts.join("/"))
}
