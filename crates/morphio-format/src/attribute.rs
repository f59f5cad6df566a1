//! Attribute messages (versions 1 to 3) and compact attribute lookup.

use byteorder::{ByteOrder, LittleEndian};

use crate::data_read;
use crate::dataspace::Dataspace;
use crate::datatype::Datatype;
use crate::error::FormatError;
use crate::message_type::MessageType;
use crate::object_header::ObjectHeader;
use crate::util::{ensure_len, pad8, read_address};

/// A parsed attribute message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeMessage {
    pub name: String,
    pub datatype: Datatype,
    pub dataspace: Dataspace,
    /// Raw element bytes, `num_elements * element size` long.
    pub raw_data: Vec<u8>,
}

impl AttributeMessage {
    pub fn parse(data: &[u8], length_size: u8) -> Result<AttributeMessage, FormatError> {
        ensure_len(data, 0, 8)?;
        let version = data[0];
        // v1 pads each part to eight bytes; v3 adds a name encoding byte
        let (padded, mut pos) = match version {
            1 => (true, 8),
            2 => (false, 8),
            3 => (false, 9),
            version => {
                return Err(FormatError::UnsupportedVersion {
                    structure: "attribute",
                    version,
                })
            }
        };
        // flags bits 0 and 1 mark a shared datatype or dataspace
        if version > 1 && data[1] & 0x03 != 0 {
            return Err(FormatError::Unsupported("shared attribute datatype".into()));
        }
        let name_size = LittleEndian::read_u16(&data[2..4]) as usize;
        let datatype_size = LittleEndian::read_u16(&data[4..6]) as usize;
        let dataspace_size = LittleEndian::read_u16(&data[6..8]) as usize;
        let step = |n: usize| if padded { pad8(n) } else { n };

        ensure_len(data, pos, name_size)?;
        let name_bytes = &data[pos..pos + name_size];
        let name_end = name_bytes.iter().position(|&b| b == 0).unwrap_or(name_size);
        let name = String::from_utf8_lossy(&name_bytes[..name_end]).into_owned();
        pos += step(name_size);

        ensure_len(data, pos, datatype_size)?;
        let datatype = Datatype::parse(&data[pos..pos + datatype_size])?;
        pos += step(datatype_size);

        ensure_len(data, pos, dataspace_size)?;
        let dataspace = Dataspace::parse(&data[pos..pos + dataspace_size], length_size)?;
        pos += step(dataspace_size);

        let raw_len = dataspace
            .num_elements()
            .checked_mul(u64::from(datatype.size()))
            .and_then(|n| usize::try_from(n).ok())
            .ok_or(FormatError::InvalidValue {
                field: "attribute size",
                value: dataspace.num_elements(),
            })?;
        ensure_len(data, pos, raw_len)?;
        let raw_data = data[pos..pos + raw_len].to_vec();

        Ok(AttributeMessage {
            name,
            datatype,
            dataspace,
            raw_data,
        })
    }

    /// Encodes the attribute as a version 1 (padded) or version 2 message.
    pub fn serialize(&self, version: u8, length_size: u8) -> Result<Vec<u8>, FormatError> {
        let padded = match version {
            1 => true,
            2 => false,
            version => {
                return Err(FormatError::UnsupportedVersion {
                    structure: "attribute",
                    version,
                })
            }
        };
        let dataspace_version = if padded { 1 } else { 2 };
        let mut name = self.name.as_bytes().to_vec();
        name.push(0);
        let datatype = self.datatype.serialize()?;
        let dataspace = self.dataspace.serialize(dataspace_version, length_size)?;

        let mut buf = vec![version, 0];
        for part in [&name, &datatype, &dataspace] {
            buf.extend_from_slice(&(part.len() as u16).to_le_bytes());
        }
        for part in [&name, &datatype, &dataspace] {
            buf.extend_from_slice(part);
            if padded {
                buf.resize(buf.len() + pad8(part.len()) - part.len(), 0);
            }
        }
        buf.extend_from_slice(&self.raw_data);
        Ok(buf)
    }

    pub fn read_i64(&self) -> Result<Vec<i64>, FormatError> {
        data_read::decode_i64(&self.raw_data, &self.datatype)
    }

    pub fn read_f64(&self) -> Result<Vec<f64>, FormatError> {
        data_read::decode_f64(&self.raw_data, &self.datatype)
    }

    pub fn read_strings(&self) -> Result<Vec<String>, FormatError> {
        data_read::decode_strings(&self.raw_data, &self.datatype)
    }
}

/// Looks up a compact attribute by name on an object header.
///
/// Returns `Ok(None)` when no attribute of that name exists. Objects that
/// keep their attributes in dense storage are reported as unsupported when
/// the name is not found among the compact messages.
pub fn find_attribute(
    header: &ObjectHeader,
    name: &str,
    offset_size: u8,
    length_size: u8,
) -> Result<Option<AttributeMessage>, FormatError> {
    for msg in header.find_all(MessageType::Attribute) {
        let attr = AttributeMessage::parse(&msg.data, length_size)?;
        if attr.name == name {
            return Ok(Some(attr));
        }
    }

    if let Some(info) = header.find(MessageType::AttributeInfo) {
        // version, flags, optional max creation index, then the fractal heap address
        ensure_len(&info.data, 0, 2)?;
        let heap_pos = if info.data[1] & 0x01 != 0 { 4 } else { 2 };
        if read_address(&info.data, heap_pos, offset_size)?.is_some() {
            return Err(FormatError::Unsupported(format!(
                "dense attribute storage (looking up '{name}')"
            )));
        }
    }
    Ok(None)
}
