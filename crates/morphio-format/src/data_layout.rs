//! Data layout messages (versions 1 to 4).

use byteorder::{ByteOrder, LittleEndian};

use crate::error::FormatError;
use crate::util::{ensure_len, read_address, read_uint, write_address, write_uint};

/// Where a dataset keeps its raw data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataLayout {
    /// Raw data stored inside the object header.
    Compact { data: Vec<u8> },
    /// One contiguous block; `address` is `None` when never written.
    Contiguous {
        address: Option<u64>,
        size: Option<u64>,
    },
    Chunked,
    Virtual,
}

impl DataLayout {
    pub fn parse(data: &[u8], offset_size: u8, length_size: u8) -> Result<DataLayout, FormatError> {
        ensure_len(data, 0, 2)?;
        match data[0] {
            1 | 2 => Self::parse_v1v2(data, offset_size),
            version @ (3 | 4) => {
                let class = data[1];
                match class {
                    0 => {
                        let size = read_uint(data, 2, 2)? as usize;
                        ensure_len(data, 4, size)?;
                        Ok(DataLayout::Compact {
                            data: data[4..4 + size].to_vec(),
                        })
                    }
                    1 => Ok(DataLayout::Contiguous {
                        address: read_address(data, 2, offset_size)?,
                        size: Some(read_uint(data, 2 + offset_size as usize, length_size)?),
                    }),
                    2 => Ok(DataLayout::Chunked),
                    3 if version == 4 => Ok(DataLayout::Virtual),
                    other => Err(FormatError::InvalidValue {
                        field: "layout class",
                        value: u64::from(other),
                    }),
                }
            }
            version => Err(FormatError::UnsupportedVersion {
                structure: "data layout",
                version,
            }),
        }
    }

    fn parse_v1v2(data: &[u8], offset_size: u8) -> Result<DataLayout, FormatError> {
        ensure_len(data, 0, 8)?;
        let dimensionality = data[1] as usize;
        let class = data[2];
        let mut pos = 8;
        match class {
            0 => {
                pos += dimensionality * 4;
                ensure_len(data, pos, 4)?;
                let size = LittleEndian::read_u32(&data[pos..pos + 4]) as usize;
                pos += 4;
                ensure_len(data, pos, size)?;
                Ok(DataLayout::Compact {
                    data: data[pos..pos + size].to_vec(),
                })
            }
            // the size follows from dataspace and datatype
            1 => Ok(DataLayout::Contiguous {
                address: read_address(data, pos, offset_size)?,
                size: None,
            }),
            2 => Ok(DataLayout::Chunked),
            other => Err(FormatError::InvalidValue {
                field: "layout class",
                value: u64::from(other),
            }),
        }
    }

    /// Encodes a version 3 message. Only compact and contiguous layouts can be written.
    pub fn serialize(&self, offset_size: u8, length_size: u8) -> Result<Vec<u8>, FormatError> {
        match self {
            DataLayout::Compact { data } => {
                let size = u16::try_from(data.len()).map_err(|_| FormatError::InvalidValue {
                    field: "compact data size",
                    value: data.len() as u64,
                })?;
                let mut buf = vec![3, 0];
                buf.extend_from_slice(&size.to_le_bytes());
                buf.extend_from_slice(data);
                Ok(buf)
            }
            DataLayout::Contiguous { address, size } => {
                let mut buf = vec![3, 1];
                write_address(&mut buf, *address, offset_size);
                write_uint(&mut buf, size.unwrap_or(0), length_size);
                Ok(buf)
            }
            DataLayout::Chunked | DataLayout::Virtual => Err(FormatError::Unsupported(
                "writing chunked or virtual layouts".into(),
            )),
        }
    }
}
