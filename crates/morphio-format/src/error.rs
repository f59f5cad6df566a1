//! Error types for HDF5 format parsing.

/// Errors raised while decoding HDF5 binary structures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    /// The HDF5 magic signature was not found at any valid offset.
    #[error("HDF5 signature not found at any valid offset")]
    SignatureNotFound,
    /// Unexpected end of data.
    #[error("unexpected EOF: need {expected} bytes, have {available}")]
    UnexpectedEof {
        /// Number of bytes expected.
        expected: usize,
        /// Number of bytes actually available.
        available: usize,
    },
    /// Offset size outside 2, 4 or 8.
    #[error("invalid offset size: {0} (must be 2, 4, or 8)")]
    InvalidOffsetSize(u8),
    /// Length size outside 2, 4 or 8.
    #[error("invalid length size: {0} (must be 2, 4, or 8)")]
    InvalidLengthSize(u8),
    /// An integer field width no reader supports.
    #[error("invalid field width: {0}")]
    InvalidFieldWidth(u8),
    /// A structure did not start with its expected signature.
    #[error("invalid {structure} signature at address {address:#x}")]
    InvalidSignature {
        structure: &'static str,
        address: usize,
    },
    /// A structure carries a version this crate cannot decode.
    #[error("unsupported {structure} version: {version}")]
    UnsupportedVersion {
        structure: &'static str,
        version: u8,
    },
    /// Unknown message type that is marked as must-understand.
    #[error("unsupported message type {0:#06x} marked as must-understand")]
    UnsupportedMessage(u16),
    /// An object header lacks a message the object kind requires.
    #[error("missing required {0} message")]
    MissingMessage(&'static str),
    /// A field holds a value outside its defined range.
    #[error("invalid {field}: {value}")]
    InvalidValue { field: &'static str, value: u64 },
    /// Stored and computed metadata checksums disagree.
    #[error("{structure} checksum mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    ChecksumMismatch {
        structure: &'static str,
        stored: u32,
        computed: u32,
    },
    /// A valid HDF5 feature outside the supported subset.
    #[error("unsupported HDF5 feature: {0}")]
    Unsupported(String),
    /// Element data cannot be represented in the requested type.
    #[error("cannot convert {from} data to {to}")]
    TypeMismatch { from: String, to: &'static str },
    /// Raw data is shorter than the dataspace and datatype imply.
    #[error("data size mismatch: expected {expected} bytes, got {actual}")]
    DataSizeMismatch { expected: usize, actual: usize },
}
