//! Link and link-info messages, the group representation of the latest layout.

use crate::error::FormatError;
use crate::util::{ensure_len, read_address, read_uint, write_address, write_uint};

const FLAG_CREATION_ORDER: u8 = 0x04;
const FLAG_LINK_TYPE: u8 = 0x08;
const FLAG_CHARSET: u8 = 0x10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkTarget {
    /// Object header address of the target.
    Hard(u64),
    /// Path of the target inside the same file.
    Soft(String),
    /// Link into another file; never followed.
    External,
}

/// A parsed link message (type 0x0006).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkMessage {
    pub name: String,
    pub target: LinkTarget,
}

impl LinkMessage {
    pub fn hard(name: impl Into<String>, address: u64) -> Self {
        LinkMessage {
            name: name.into(),
            target: LinkTarget::Hard(address),
        }
    }

    pub fn parse(data: &[u8], offset_size: u8) -> Result<LinkMessage, FormatError> {
        ensure_len(data, 0, 2)?;
        if data[0] != 1 {
            return Err(FormatError::UnsupportedVersion {
                structure: "link",
                version: data[0],
            });
        }
        let flags = data[1];
        let mut pos = 2;

        let link_type = if flags & FLAG_LINK_TYPE != 0 {
            ensure_len(data, pos, 1)?;
            pos += 1;
            data[pos - 1]
        } else {
            0
        };
        if flags & FLAG_CREATION_ORDER != 0 {
            pos += 8;
        }
        if flags & FLAG_CHARSET != 0 {
            pos += 1;
        }

        let width = 1u8 << (flags & 0x03);
        let name_len = read_uint(data, pos, width)? as usize;
        pos += width as usize;
        ensure_len(data, pos, name_len)?;
        let name = String::from_utf8_lossy(&data[pos..pos + name_len]).into_owned();
        pos += name_len;

        let target = match link_type {
            0 => LinkTarget::Hard(read_uint(data, pos, offset_size)?),
            1 => {
                let len = read_uint(data, pos, 2)? as usize;
                ensure_len(data, pos + 2, len)?;
                LinkTarget::Soft(String::from_utf8_lossy(&data[pos + 2..pos + 2 + len]).into_owned())
            }
            64 => LinkTarget::External,
            other => {
                return Err(FormatError::InvalidValue {
                    field: "link type",
                    value: u64::from(other),
                })
            }
        };
        Ok(LinkMessage { name, target })
    }

    /// Encodes a hard or soft link with the narrowest name-length field.
    pub fn serialize(&self, offset_size: u8) -> Result<Vec<u8>, FormatError> {
        let name = self.name.as_bytes();
        let (size_flag, width) = match name.len() {
            n if n <= 0xFF => (0u8, 1u8),
            n if n <= 0xFFFF => (1, 2),
            _ => (2, 4),
        };
        let mut buf = Vec::with_capacity(4 + name.len() + offset_size as usize);
        match &self.target {
            LinkTarget::Hard(address) => {
                buf.extend_from_slice(&[1, size_flag]);
                write_uint(&mut buf, name.len() as u64, width);
                buf.extend_from_slice(name);
                write_uint(&mut buf, *address, offset_size);
            }
            LinkTarget::Soft(path) => {
                buf.extend_from_slice(&[1, size_flag | FLAG_LINK_TYPE, 1]);
                write_uint(&mut buf, name.len() as u64, width);
                buf.extend_from_slice(name);
                buf.extend_from_slice(&(path.len() as u16).to_le_bytes());
                buf.extend_from_slice(path.as_bytes());
            }
            LinkTarget::External => {
                return Err(FormatError::Unsupported("writing external links".into()))
            }
        }
        Ok(buf)
    }
}

/// A link-info message (type 0x0002): where dense link storage lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkInfo {
    /// Fractal heap holding dense links, `None` for compact groups.
    pub fractal_heap_address: Option<u64>,
    pub name_index_address: Option<u64>,
}

impl LinkInfo {
    pub fn compact() -> Self {
        LinkInfo {
            fractal_heap_address: None,
            name_index_address: None,
        }
    }

    pub fn parse(data: &[u8], offset_size: u8) -> Result<LinkInfo, FormatError> {
        ensure_len(data, 0, 2)?;
        if data[0] != 0 {
            return Err(FormatError::UnsupportedVersion {
                structure: "link info",
                version: data[0],
            });
        }
        // flags bit 0: the maximum creation index is stored
        let pos = if data[1] & 0x01 != 0 { 10 } else { 2 };
        Ok(LinkInfo {
            fractal_heap_address: read_address(data, pos, offset_size)?,
            name_index_address: read_address(data, pos + offset_size as usize, offset_size)?,
        })
    }

    pub fn serialize(&self, offset_size: u8) -> Vec<u8> {
        let mut buf = vec![0, 0];
        write_address(&mut buf, self.fractal_heap_address, offset_size);
        write_address(&mut buf, self.name_index_address, offset_size);
        buf
    }

    pub fn is_dense(&self) -> bool {
        self.fractal_heap_address.is_some()
    }
}
