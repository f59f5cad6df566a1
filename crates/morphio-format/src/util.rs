//! Little-endian field access shared by the parsers and the writer.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::FormatError;

/// All-ones address marking "no storage allocated".
pub(crate) const UNDEFINED_ADDRESS: u64 = u64::MAX;

pub(crate) fn ensure_len(data: &[u8], offset: usize, needed: usize) -> Result<(), FormatError> {
    match offset.checked_add(needed) {
        Some(end) if end <= data.len() => Ok(()),
        _ => Err(FormatError::UnexpectedEof {
            expected: offset.saturating_add(needed),
            available: data.len(),
        }),
    }
}

/// Reads an unsigned little-endian integer of `size` bytes at `pos`.
pub(crate) fn read_uint(data: &[u8], pos: usize, size: u8) -> Result<u64, FormatError> {
    ensure_len(data, pos, size as usize)?;
    let field = &data[pos..pos + size as usize];
    Ok(match size {
        1 => u64::from(field[0]),
        2 => u64::from(LittleEndian::read_u16(field)),
        4 => u64::from(LittleEndian::read_u32(field)),
        8 => LittleEndian::read_u64(field),
        other => return Err(FormatError::InvalidFieldWidth(other)),
    })
}

/// Reads a file address; the undefined address comes back as `None`.
pub(crate) fn read_address(data: &[u8], pos: usize, size: u8) -> Result<Option<u64>, FormatError> {
    ensure_len(data, pos, size as usize)?;
    if data[pos..pos + size as usize].iter().all(|&b| b == 0xFF) {
        return Ok(None);
    }
    read_uint(data, pos, size).map(Some)
}

/// Reads a NUL-terminated string starting at `pos`.
pub(crate) fn read_cstr(data: &[u8], pos: usize) -> Result<String, FormatError> {
    ensure_len(data, pos, 1)?;
    let rest = &data[pos..];
    let end = rest.iter().position(|&b| b == 0).ok_or(FormatError::UnexpectedEof {
        expected: data.len() + 1,
        available: data.len(),
    })?;
    Ok(String::from_utf8_lossy(&rest[..end]).into_owned())
}

pub(crate) fn write_uint(buf: &mut Vec<u8>, value: u64, size: u8) {
    let bytes = value.to_le_bytes();
    buf.extend_from_slice(&bytes[..size as usize]);
}

pub(crate) fn write_address(buf: &mut Vec<u8>, address: Option<u64>, size: u8) {
    write_uint(buf, address.unwrap_or(UNDEFINED_ADDRESS), size);
}

/// Rounds `n` up to the next multiple of eight.
pub(crate) fn pad8(n: usize) -> usize {
    (n + 7) & !7
}

#[cfg(any(test, feature = "writer"))]
pub(crate) fn pad_to_8(buf: &mut Vec<u8>) {
    buf.resize(pad8(buf.len()), 0);
}
