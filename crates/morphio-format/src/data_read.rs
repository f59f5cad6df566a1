//! Raw data access and element conversion for datasets and attributes.

use std::borrow::Cow;

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::data_layout::DataLayout;
use crate::dataset::DatasetHeader;
use crate::datatype::{Datatype, DatatypeByteOrder};
use crate::error::FormatError;
use crate::util::ensure_len;

/// Returns the raw bytes of a dataset, borrowing from `file` when contiguous.
///
/// Storage that was never allocated reads as zeros, which is the default
/// fill value.
pub fn read_raw<'a>(file: &'a [u8], dataset: &DatasetHeader) -> Result<Cow<'a, [u8]>, FormatError> {
    if dataset.filtered {
        return Err(FormatError::Unsupported("filtered dataset storage".into()));
    }
    let expected = dataset.byte_len()?;
    match &dataset.layout {
        DataLayout::Compact { data } => {
            if data.len() < expected {
                return Err(FormatError::DataSizeMismatch {
                    expected,
                    actual: data.len(),
                });
            }
            Ok(Cow::Owned(data[..expected].to_vec()))
        }
        DataLayout::Contiguous { address: None, .. } => Ok(Cow::Owned(vec![0u8; expected])),
        DataLayout::Contiguous {
            address: Some(address),
            size,
        } => {
            if let Some(size) = size {
                if (*size as usize) < expected {
                    return Err(FormatError::DataSizeMismatch {
                        expected,
                        actual: *size as usize,
                    });
                }
            }
            let start = *address as usize;
            ensure_len(file, start, expected)?;
            Ok(Cow::Borrowed(&file[start..start + expected]))
        }
        DataLayout::Chunked => Err(FormatError::Unsupported("chunked dataset storage".into())),
        DataLayout::Virtual => Err(FormatError::Unsupported("virtual dataset storage".into())),
    }
}

fn elements(raw: &[u8], datatype: &Datatype) -> Result<usize, FormatError> {
    let size = datatype.size() as usize;
    if size == 0 || raw.len() % size != 0 {
        return Err(FormatError::DataSizeMismatch {
            expected: raw.len().next_multiple_of(size.max(1)),
            actual: raw.len(),
        });
    }
    Ok(size)
}

fn read_int(chunk: &[u8], order: DatatypeByteOrder, signed: bool) -> i128 {
    let n = chunk.len();
    match (order, signed) {
        (DatatypeByteOrder::LittleEndian, true) => LittleEndian::read_int128(chunk, n),
        (DatatypeByteOrder::LittleEndian, false) => LittleEndian::read_uint128(chunk, n) as i128,
        (DatatypeByteOrder::BigEndian, true) => BigEndian::read_int128(chunk, n),
        (DatatypeByteOrder::BigEndian, false) => BigEndian::read_uint128(chunk, n) as i128,
    }
}

fn read_float(chunk: &[u8], order: DatatypeByteOrder) -> f64 {
    match (order, chunk.len()) {
        (DatatypeByteOrder::LittleEndian, 4) => f64::from(LittleEndian::read_f32(chunk)),
        (DatatypeByteOrder::BigEndian, 4) => f64::from(BigEndian::read_f32(chunk)),
        (DatatypeByteOrder::LittleEndian, _) => LittleEndian::read_f64(chunk),
        (DatatypeByteOrder::BigEndian, _) => BigEndian::read_f64(chunk),
    }
}

/// Converts integer or float elements to `f64`.
pub fn decode_f64(raw: &[u8], datatype: &Datatype) -> Result<Vec<f64>, FormatError> {
    match datatype {
        Datatype::FloatingPoint { size, byte_order } if matches!(size, 4 | 8) => {
            let size = elements(raw, datatype)?;
            Ok(raw.chunks_exact(size).map(|c| read_float(c, *byte_order)).collect())
        }
        Datatype::FixedPoint {
            size,
            byte_order,
            signed,
        } if (1..=8).contains(size) => {
            let size = elements(raw, datatype)?;
            Ok(raw
                .chunks_exact(size)
                .map(|c| read_int(c, *byte_order, *signed) as f64)
                .collect())
        }
        other => Err(FormatError::TypeMismatch {
            from: other.describe(),
            to: "f64",
        }),
    }
}

/// Converts integer elements, or floats holding integral values, to `i64`.
pub fn decode_i64(raw: &[u8], datatype: &Datatype) -> Result<Vec<i64>, FormatError> {
    let out_of_range = |value: String| FormatError::TypeMismatch {
        from: format!("{} value {value}", datatype.describe()),
        to: "i64",
    };
    match datatype {
        Datatype::FixedPoint {
            size,
            byte_order,
            signed,
        } if (1..=8).contains(size) => {
            let size = elements(raw, datatype)?;
            raw.chunks_exact(size)
                .map(|c| {
                    let v = read_int(c, *byte_order, *signed);
                    i64::try_from(v).map_err(|_| out_of_range(v.to_string()))
                })
                .collect()
        }
        Datatype::FloatingPoint { size, byte_order } if matches!(size, 4 | 8) => {
            let size = elements(raw, datatype)?;
            raw.chunks_exact(size)
                .map(|c| {
                    let v = read_float(c, *byte_order);
                    if v.fract() == 0.0 && v >= i64::MIN as f64 && v < i64::MAX as f64 {
                        Ok(v as i64)
                    } else {
                        Err(out_of_range(v.to_string()))
                    }
                })
                .collect()
        }
        other => Err(FormatError::TypeMismatch {
            from: other.describe(),
            to: "i64",
        }),
    }
}

/// Decodes fixed-length strings, trimming NUL and space padding.
pub fn decode_strings(raw: &[u8], datatype: &Datatype) -> Result<Vec<String>, FormatError> {
    match datatype {
        Datatype::String { .. } => {
            let size = elements(raw, datatype)?;
            Ok(raw
                .chunks_exact(size)
                .map(|c| {
                    let end = c.iter().position(|&b| b == 0).unwrap_or(c.len());
                    String::from_utf8_lossy(&c[..end]).trim_end().to_string()
                })
                .collect())
        }
        Datatype::VariableLength { is_string: true } => {
            Err(FormatError::Unsupported("variable-length strings".into()))
        }
        other => Err(FormatError::TypeMismatch {
            from: other.describe(),
            to: "string",
        }),
    }
}
