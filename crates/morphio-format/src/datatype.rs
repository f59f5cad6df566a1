//! Datatype messages for the element types morphology files use.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::FormatError;
use crate::util::ensure_len;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatatypeByteOrder {
    LittleEndian,
    BigEndian,
}

/// Parsed datatype.
///
/// Integer and IEEE float classes are fully described; strings keep their
/// size so attribute text can be read; everything else is kept as its class
/// code and size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Datatype {
    FixedPoint {
        size: u32,
        byte_order: DatatypeByteOrder,
        signed: bool,
    },
    FloatingPoint {
        size: u32,
        byte_order: DatatypeByteOrder,
    },
    /// Fixed-length string.
    String { size: u32 },
    /// Variable-length data (class 9), including variable-length strings.
    VariableLength { is_string: bool },
    Other { class: u8, size: u32 },
}

impl Datatype {
    pub fn parse(data: &[u8]) -> Result<Datatype, FormatError> {
        ensure_len(data, 0, 8)?;
        let class = data[0] & 0x0F;
        let version = data[0] >> 4;
        if !(1..=5).contains(&version) {
            return Err(FormatError::UnsupportedVersion {
                structure: "datatype",
                version,
            });
        }
        let bf0 = data[1];
        let size = LittleEndian::read_u32(&data[4..8]);
        let byte_order = if bf0 & 0x01 != 0 {
            DatatypeByteOrder::BigEndian
        } else {
            DatatypeByteOrder::LittleEndian
        };

        Ok(match class {
            0 => Datatype::FixedPoint {
                size,
                byte_order,
                signed: bf0 & 0x08 != 0,
            },
            1 => {
                // bits 0 and 6 together select VAX order
                if bf0 & 0x40 != 0 {
                    return Err(FormatError::Unsupported("VAX floating-point order".into()));
                }
                Datatype::FloatingPoint { size, byte_order }
            }
            3 => Datatype::String { size },
            9 => Datatype::VariableLength {
                is_string: bf0 & 0x0F == 1,
            },
            class => Datatype::Other { class, size },
        })
    }

    /// Size of one element in bytes.
    pub fn size(&self) -> u32 {
        match self {
            Datatype::FixedPoint { size, .. }
            | Datatype::FloatingPoint { size, .. }
            | Datatype::String { size }
            | Datatype::Other { size, .. } => *size,
            // global heap id: collection address + index
            Datatype::VariableLength { .. } => 16,
        }
    }

    /// Short human-readable description used in errors.
    pub fn describe(&self) -> String {
        match self {
            Datatype::FixedPoint { size, signed, .. } => {
                format!("{}{}", if *signed { "int" } else { "uint" }, size * 8)
            }
            Datatype::FloatingPoint { size, .. } => format!("float{}", size * 8),
            Datatype::String { size } => format!("string[{size}]"),
            Datatype::VariableLength { is_string: true } => "variable-length string".into(),
            Datatype::VariableLength { is_string: false } => "variable-length sequence".into(),
            Datatype::Other { class, .. } => format!("class {class}"),
        }
    }

    pub fn little_endian_int(size: u32, signed: bool) -> Self {
        Datatype::FixedPoint {
            size,
            byte_order: DatatypeByteOrder::LittleEndian,
            signed,
        }
    }

    pub fn little_endian_float(size: u32) -> Self {
        Datatype::FloatingPoint {
            size,
            byte_order: DatatypeByteOrder::LittleEndian,
        }
    }

    /// Encodes a version 1 datatype message.
    pub fn serialize(&self) -> Result<Vec<u8>, FormatError> {
        let header = |class: u8, bf0: u8, bf1: u8, size: u32| {
            let mut buf = vec![0x10 | class, bf0, bf1, 0];
            buf.extend_from_slice(&size.to_le_bytes());
            buf
        };
        let order_bit = |order: &DatatypeByteOrder| u8::from(*order == DatatypeByteOrder::BigEndian);

        match self {
            Datatype::FixedPoint {
                size,
                byte_order,
                signed,
            } => {
                let bf0 = order_bit(byte_order) | if *signed { 0x08 } else { 0 };
                let mut buf = header(0, bf0, 0, *size);
                buf.extend_from_slice(&0u16.to_le_bytes());
                buf.extend_from_slice(&((size * 8) as u16).to_le_bytes());
                Ok(buf)
            }
            Datatype::FloatingPoint { size, byte_order } => {
                let (exp_loc, exp_size, mant_size, bias): (u8, u8, u8, u32) = match size {
                    4 => (23, 8, 23, 127),
                    8 => (52, 11, 52, 1023),
                    other => {
                        return Err(FormatError::Unsupported(format!(
                            "{other}-byte floating-point type"
                        )))
                    }
                };
                // implied leading mantissa bit; sign in the top bit
                let bf0 = order_bit(byte_order) | 0x20;
                let mut buf = header(1, bf0, (size * 8 - 1) as u8, *size);
                buf.extend_from_slice(&0u16.to_le_bytes());
                buf.extend_from_slice(&((size * 8) as u16).to_le_bytes());
                buf.extend_from_slice(&[exp_loc, exp_size, 0, mant_size]);
                buf.extend_from_slice(&bias.to_le_bytes());
                Ok(buf)
            }
            // null-padded ASCII
            Datatype::String { size } => Ok(header(3, 0x01, 0, *size)),
            other => Err(FormatError::Unsupported(format!(
                "writing {} datatypes",
                other.describe()
            ))),
        }
    }
}
