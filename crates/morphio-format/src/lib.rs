//! Pure-Rust parsing of the HDF5 structures found in morphology files.
//!
//! The crate reads superblocks v0 to v3, version 1 and 2 object headers,
//! symbol-table groups and compact link-message groups, compact and
//! contiguous datasets of integer or IEEE float elements, and compact
//! attributes. Anything outside that subset (chunked or filtered storage,
//! dense link or attribute storage, committed datatypes) is reported as
//! [`FormatError::Unsupported`] rather than misread.
//!
//! With the `writer` feature, the `writer` module builds small HDF5 images in
//! either the legacy layout (superblock v0, symbol-table groups) or the
//! latest layout (superblock v2, link messages) so tests can exercise real
//! bytes. It is a test fixture, not a general HDF5 writer.

pub mod attribute;
pub mod btree_v1;
pub mod checksum;
pub mod data_layout;
pub mod data_read;
pub mod dataset;
pub mod dataspace;
pub mod datatype;
pub mod error;
pub mod group;
pub mod link;
pub mod local_heap;
pub mod message_type;
pub mod object_header;
pub mod signature;
pub mod superblock;
pub mod symbol_table;
#[cfg(any(test, feature = "writer"))]
pub mod writer;

mod util;

pub use error::FormatError;
