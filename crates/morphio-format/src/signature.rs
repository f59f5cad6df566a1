//! Locating the HDF5 format signature.

use crate::error::FormatError;

/// The 8-byte HDF5 magic signature.
pub const HDF5_SIGNATURE: [u8; 8] = [0x89, b'H', b'D', b'F', b'\r', b'\n', 0x1A, b'\n'];

/// Returns the byte offset of the signature.
///
/// The signature sits at offset 0 or, when the file carries a user block,
/// at 512, 1024, 2048 and so on.
pub fn find_signature(data: &[u8]) -> Result<usize, FormatError> {
    let mut offset = 0usize;
    while offset.saturating_add(8) <= data.len() {
        if data[offset..offset + 8] == HDF5_SIGNATURE {
            return Ok(offset);
        }
        offset = if offset == 0 { 512 } else { offset * 2 };
    }
    Err(FormatError::SignatureNotFound)
}
