//! Version-aware decoder for HDF5 neuron and glia morphology files.
//!
//! Morphology files store a reconstructed cell as flat tables: a point table
//! (x, y, z, diameter), a section table (start point, parent section), one
//! type per section, and for newer files perimeters and mitochondria. Three
//! incompatible layouts exist on disk:
//!
//! | Version | Detected by | Points |
//! |---|---|---|
//! | h5 v1 | `/points` and `/structure` | `/points` |
//! | h5 v1.1 | `/metadata` with `version = [1, 1]` | `/points` |
//! | h5 v2 | a `/neuron1` group | `/neuron1/<stage>/points` |
//!
//! [`load`] detects the layout, reads the tables, checks that they agree with
//! each other and returns a [`Properties`].
//!
//! ```no_run
//! let cell = morphio::load("cell.h5").unwrap();
//! println!("{}: {} sections", cell.version(), cell.sections().len());
//! ```
//!
//! Any [`TabularStore`] can be decoded, not only HDF5 files:
//!
//! ```
//! use morphio::{decode, AttrValue, MemoryStore, SectionType};
//!
//! let mut store = MemoryStore::new("in-memory");
//! store
//!     .set_attr("/neuron1", "version", AttrValue::Int(vec![2, 0]))
//!     .put_f64("/neuron1/repaired/points", &[2, 4], vec![0., 0., 0., 1., 1., 0., 0., 1.])
//!     .put_i64("/neuron1/structure/repaired", &[1, 2], vec![0, -1])
//!     .put_i64("/neuron1/structure/type", &[1, 1], vec![2]);
//! let cell = decode(&store).unwrap();
//! assert_eq!(cell.section_types(), &[SectionType::Axon]);
//! ```
//!
//! # Features
//!
//! - `mmap` (default): map files read-only instead of reading them whole.
//! - `parallel`: [`load_many`] decodes several files on the rayon pool.
//! - `double`: decode coordinates as `f64` instead of `f32`.

mod decode;
pub mod error;
mod geometry;
pub mod layout;
pub mod options;
#[cfg(feature = "parallel")]
mod parallel;
pub mod properties;
pub mod resolver;
pub mod store;
mod structure;
mod substructure;
mod table;
pub mod types;

use std::path::Path;

pub use decode::{decode, decode_with_options};
pub use error::{Error, Result};
pub use options::LoadOptions;
#[cfg(feature = "parallel")]
pub use parallel::load_many;
pub use properties::{
    CellLevel, MitochondriaPointLevel, MitochondriaSectionLevel, PointLevel, Properties,
    SectionLevel,
};
pub use store::{AttrValue, DatasetInfo, ElementClass, H5Store, MemoryStore, StoreError, TabularStore};
pub use types::{
    CellFamily, FloatType, MorphologyVersion, Point, RepairStage, SectionRecord, SectionType,
    SubstructureKind,
};

/// Opens the HDF5 file at `path` and decodes it with default options.
pub fn load<P: AsRef<Path>>(path: P) -> Result<Properties> {
    load_with_options(path, &LoadOptions::default())
}

pub fn load_with_options<P: AsRef<Path>>(path: P, options: &LoadOptions) -> Result<Properties> {
    let path = path.as_ref();
    let store = H5Store::open_with(path, options.mmap)
        .map_err(|e| Error::from_open(path.display().to_string(), e))?;
    decode_with_options(&store, options)
}
