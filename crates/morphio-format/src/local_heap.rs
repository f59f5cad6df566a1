//! Local heaps: the name storage of symbol-table groups.

use crate::error::FormatError;
use crate::util::{ensure_len, pad8, read_address, read_cstr, read_uint, write_address, write_uint};

const SIGNATURE: &[u8; 4] = b"HEAP";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalHeap {
    pub data_segment_size: u64,
    /// Offset of the first free block, `None` when the heap is full.
    pub free_list_offset: Option<u64>,
    pub data_segment_address: u64,
}

impl LocalHeap {
    /// Size of the heap header for the given field widths.
    pub fn header_len(offset_size: u8, length_size: u8) -> usize {
        8 + 2 * length_size as usize + offset_size as usize
    }

    pub fn parse(
        file: &[u8],
        offset: usize,
        offset_size: u8,
        length_size: u8,
    ) -> Result<LocalHeap, FormatError> {
        ensure_len(file, offset, Self::header_len(offset_size, length_size))?;
        if &file[offset..offset + 4] != SIGNATURE {
            return Err(FormatError::InvalidSignature {
                structure: "HEAP",
                address: offset,
            });
        }
        if file[offset + 4] != 0 {
            return Err(FormatError::UnsupportedVersion {
                structure: "local heap",
                version: file[offset + 4],
            });
        }
        let ls = length_size as usize;
        Ok(LocalHeap {
            data_segment_size: read_uint(file, offset + 8, length_size)?,
            free_list_offset: read_address(file, offset + 8 + ls, length_size)?,
            data_segment_address: read_uint(file, offset + 8 + 2 * ls, offset_size)?,
        })
    }

    /// Reads the NUL-terminated name stored at `name_offset`.
    pub fn read_name(&self, file: &[u8], name_offset: u64) -> Result<String, FormatError> {
        if name_offset >= self.data_segment_size {
            return Err(FormatError::InvalidValue {
                field: "local heap name offset",
                value: name_offset,
            });
        }
        let start = self.data_segment_address as usize;
        let end = start.saturating_add(self.data_segment_size as usize);
        ensure_len(file, start, self.data_segment_size as usize)?;
        read_cstr(&file[..end], start + name_offset as usize)
    }

    pub fn serialize(&self, offset_size: u8, length_size: u8) -> Vec<u8> {
        let mut buf = Vec::with_capacity(Self::header_len(offset_size, length_size));
        buf.extend_from_slice(SIGNATURE);
        buf.extend_from_slice(&[0, 0, 0, 0]);
        write_uint(&mut buf, self.data_segment_size, length_size);
        write_address(&mut buf, self.free_list_offset, length_size);
        write_uint(&mut buf, self.data_segment_address, offset_size);
        buf
    }
}

/// Lays out a heap data segment holding `names`.
///
/// Offset 0 holds the empty string; every name is NUL-terminated and padded
/// to eight bytes. Returns the segment and the offset of each name.
pub fn build_data_segment<S: AsRef<str>>(names: &[S]) -> (Vec<u8>, Vec<u64>) {
    let mut segment = vec![0u8; 8];
    let mut offsets = Vec::with_capacity(names.len());
    for name in names {
        offsets.push(segment.len() as u64);
        segment.extend_from_slice(name.as_ref().as_bytes());
        segment.push(0);
        segment.resize(pad8(segment.len()), 0);
    }
    (segment, offsets)
}
