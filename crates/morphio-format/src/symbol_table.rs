//! Symbol table messages and symbol table nodes (SNOD).

use crate::error::FormatError;
use crate::util::{ensure_len, read_uint, write_uint};

const SNOD: &[u8; 4] = b"SNOD";

/// Symbol table message (type 0x0011) of a legacy group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolTableMessage {
    pub btree_address: u64,
    pub local_heap_address: u64,
}

impl SymbolTableMessage {
    pub fn parse(data: &[u8], offset_size: u8) -> Result<SymbolTableMessage, FormatError> {
        Ok(SymbolTableMessage {
            btree_address: read_uint(data, 0, offset_size)?,
            local_heap_address: read_uint(data, offset_size as usize, offset_size)?,
        })
    }

    pub fn serialize(&self, offset_size: u8) -> Vec<u8> {
        let mut buf = Vec::with_capacity(2 * offset_size as usize);
        write_uint(&mut buf, self.btree_address, offset_size);
        write_uint(&mut buf, self.local_heap_address, offset_size);
        buf
    }
}

/// One member of a symbol table node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolTableEntry {
    /// Offset of the member name in the group's local heap.
    pub name_offset: u64,
    pub object_header_address: u64,
    pub cache_type: u32,
}

impl SymbolTableEntry {
    /// Encoded size: two offsets, cache type, reserved word and 16 scratch bytes.
    pub fn encoded_len(offset_size: u8) -> usize {
        2 * offset_size as usize + 24
    }
}

/// A symbol table node: a leaf of the group B-tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolTableNode {
    pub entries: Vec<SymbolTableEntry>,
}

impl SymbolTableNode {
    pub fn parse(file: &[u8], offset: usize, offset_size: u8) -> Result<SymbolTableNode, FormatError> {
        ensure_len(file, offset, 8)?;
        if &file[offset..offset + 4] != SNOD {
            return Err(FormatError::InvalidSignature {
                structure: "SNOD",
                address: offset,
            });
        }
        if file[offset + 4] != 1 {
            return Err(FormatError::UnsupportedVersion {
                structure: "symbol table node",
                version: file[offset + 4],
            });
        }
        let count = read_uint(file, offset + 6, 2)? as usize;
        let entry_len = SymbolTableEntry::encoded_len(offset_size);
        let os = offset_size as usize;
        ensure_len(file, offset + 8, count * entry_len)?;

        let entries = (0..count)
            .map(|i| {
                let pos = offset + 8 + i * entry_len;
                Ok(SymbolTableEntry {
                    name_offset: read_uint(file, pos, offset_size)?,
                    object_header_address: read_uint(file, pos + os, offset_size)?,
                    cache_type: read_uint(file, pos + 2 * os, 4)? as u32,
                })
            })
            .collect::<Result<Vec<_>, FormatError>>()?;
        Ok(SymbolTableNode { entries })
    }

    /// Encodes the node with room for `capacity` entries (at least the used ones).
    pub fn serialize(&self, offset_size: u8, capacity: usize) -> Vec<u8> {
        let entry_len = SymbolTableEntry::encoded_len(offset_size);
        let slots = capacity.max(self.entries.len());
        let mut buf = Vec::with_capacity(8 + slots * entry_len);
        buf.extend_from_slice(SNOD);
        buf.extend_from_slice(&[1, 0]);
        buf.extend_from_slice(&(self.entries.len() as u16).to_le_bytes());
        for entry in &self.entries {
            write_uint(&mut buf, entry.name_offset, offset_size);
            write_uint(&mut buf, entry.object_header_address, offset_size);
            buf.extend_from_slice(&entry.cache_type.to_le_bytes());
            buf.extend_from_slice(&[0u8; 20]);
        }
        buf.resize(8 + slots * entry_len, 0);
        buf
    }
}
