use std::path::Path;

use morphio_format::attribute::find_attribute;
use morphio_format::data_read::{decode_f64, decode_i64, read_raw};
use morphio_format::dataset::DatasetHeader;
use morphio_format::datatype::Datatype;
use morphio_format::group::{object_kind, resolve_path, ObjectKind};
use morphio_format::object_header::ObjectHeader;
use morphio_format::signature::find_signature;
use morphio_format::superblock::Superblock;
use morphio_format::FormatError;

use super::{normalize_path, AttrValue, DatasetInfo, ElementClass, StoreError, TabularStore};

/// Either an owned buffer or a read-only mapping of the file.
enum FileData {
    Owned(Vec<u8>),
    #[cfg(feature = "mmap")]
    Mapped(memmap2::Mmap),
}

impl FileData {
    fn as_bytes(&self) -> &[u8] {
        match self {
            FileData::Owned(v) => v,
            #[cfg(feature = "mmap")]
            FileData::Mapped(m) => m,
        }
    }
}

/// A [`TabularStore`] over an HDF5 file, parsed with `morphio-format`.
///
/// When the `mmap` feature is enabled (the default), [`H5Store::open`] maps
/// the file so dataset reads are served from the page cache without an
/// up-front copy. Use [`H5Store::open_buffered`] to read the whole file into
/// memory instead, or [`H5Store::from_bytes`] for an image already in memory.
pub struct H5Store {
    data: FileData,
    /// Offset of the format signature; all file addresses are relative to it.
    base: usize,
    superblock: Superblock,
    location: String,
}

impl H5Store {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        Self::open_with(path.as_ref(), true)
    }

    pub fn open_buffered<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        Self::open_with(path.as_ref(), false)
    }

    /// Parses an in-memory image. `location` is only used in messages.
    pub fn from_bytes(bytes: Vec<u8>, location: impl Into<String>) -> Result<Self, StoreError> {
        Self::with_data(FileData::Owned(bytes), location.into())
    }

    pub(crate) fn open_with(path: &Path, mmap: bool) -> Result<Self, StoreError> {
        let location = path.display().to_string();
        #[cfg(feature = "mmap")]
        {
            if mmap {
                let file = std::fs::File::open(path)?;
                // SAFETY: the mapping is read-only; the file must not be
                // truncated by another process while the store is alive.
                let map = unsafe { memmap2::Mmap::map(&file)? };
                return Self::with_data(FileData::Mapped(map), location);
            }
        }
        #[cfg(not(feature = "mmap"))]
        let _ = mmap;
        let bytes = std::fs::read(path)?;
        Self::with_data(FileData::Owned(bytes), location)
    }

    fn with_data(data: FileData, location: String) -> Result<Self, StoreError> {
        let bytes = data.as_bytes();
        let base = find_signature(bytes)?;
        let superblock = Superblock::parse(bytes, base)?;
        tracing::debug!(
            file = %location,
            superblock_version = superblock.version,
            base,
            "opened HDF5 container"
        );
        Ok(Self {
            data,
            base,
            superblock,
            location,
        })
    }

    pub fn superblock(&self) -> &Superblock {
        &self.superblock
    }

    /// Returns `true` when the file is backed by a memory mapping.
    pub fn is_mmap(&self) -> bool {
        match &self.data {
            FileData::Owned(_) => false,
            #[cfg(feature = "mmap")]
            FileData::Mapped(_) => true,
        }
    }

    /// The file image starting at the signature.
    fn file(&self) -> &[u8] {
        self.data.as_bytes().get(self.base..).unwrap_or(&[])
    }

    fn lookup(&self, path: &str) -> Result<Option<ObjectHeader>, FormatError> {
        Ok(resolve_path(
            self.file(),
            self.superblock.root_group_address,
            path,
            self.superblock.offset_size,
            self.superblock.length_size,
        )?
        .map(|(_, header)| header))
    }

    fn dataset_header(&self, path: &str) -> Result<Option<DatasetHeader>, FormatError> {
        match self.lookup(path)? {
            Some(header) if object_kind(&header) == ObjectKind::Dataset => {
                DatasetHeader::from_object_header(
                    &header,
                    self.superblock.offset_size,
                    self.superblock.length_size,
                )
                .map(Some)
            }
            _ => Ok(None),
        }
    }

    fn read_with<T>(
        &self,
        path: &str,
        decode: impl FnOnce(&[u8], &Datatype) -> Result<Vec<T>, FormatError>,
    ) -> Result<Vec<T>, StoreError> {
        let header = self
            .dataset_header(path)?
            .ok_or_else(|| StoreError::NotFound(normalize_path(path)))?;
        let raw = read_raw(self.file(), &header)?;
        tracing::trace!(path, shape = ?header.shape(), bytes = raw.len(), "read dataset");
        Ok(decode(&raw, &header.datatype)?)
    }
}

fn element_class(datatype: &Datatype) -> ElementClass {
    match datatype {
        Datatype::FixedPoint { .. } => ElementClass::Integer,
        Datatype::FloatingPoint { .. } => ElementClass::Float,
        _ => ElementClass::Other,
    }
}

impl TabularStore for H5Store {
    fn location(&self) -> &str {
        &self.location
    }

    fn has_group(&self, path: &str) -> Result<bool, StoreError> {
        Ok(matches!(
            self.lookup(path)?,
            Some(header) if object_kind(&header) == ObjectKind::Group
        ))
    }

    fn attribute(&self, group: &str, name: &str) -> Result<Option<AttrValue>, StoreError> {
        let Some(header) = self.lookup(group)? else {
            return Ok(None);
        };
        let Some(attr) = find_attribute(
            &header,
            name,
            self.superblock.offset_size,
            self.superblock.length_size,
        )?
        else {
            return Ok(None);
        };
        let value = match &attr.datatype {
            Datatype::FixedPoint { .. } => AttrValue::Int(attr.read_i64()?),
            Datatype::FloatingPoint { .. } => AttrValue::Float(attr.read_f64()?),
            Datatype::String { .. } => AttrValue::Text(attr.read_strings()?),
            other => {
                return Err(StoreError::Data {
                    path: format!("{}@{name}", normalize_path(group)),
                    reason: format!("unsupported attribute type {}", other.describe()),
                })
            }
        };
        Ok(Some(value))
    }

    fn dataset(&self, path: &str) -> Result<Option<DatasetInfo>, StoreError> {
        Ok(self.dataset_header(path)?.map(|header| DatasetInfo {
            shape: header.shape().to_vec(),
            class: element_class(&header.datatype),
        }))
    }

    fn read_f64(&self, path: &str) -> Result<Vec<f64>, StoreError> {
        self.read_with(path, decode_f64)
    }

    fn read_i64(&self, path: &str) -> Result<Vec<i64>, StoreError> {
        self.read_with(path, decode_i64)
    }
}

impl std::fmt::Debug for H5Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("H5Store")
            .field("location", &self.location)
            .field("size", &self.data.as_bytes().len())
            .field("superblock_version", &self.superblock.version)
            .field("mmap", &self.is_mmap())
            .finish()
    }
}
