//! Dataspace messages (versions 1 and 2).

use crate::error::FormatError;
use crate::util::{ensure_len, read_uint, write_uint};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataspaceKind {
    Scalar,
    Simple,
    Null,
}

/// Parsed dataspace: kind plus current dimensions.
///
/// Maximum dimensions are skipped; morphology data never grows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataspace {
    pub kind: DataspaceKind,
    pub dimensions: Vec<u64>,
}

impl Dataspace {
    pub fn scalar() -> Self {
        Dataspace {
            kind: DataspaceKind::Scalar,
            dimensions: Vec::new(),
        }
    }

    pub fn simple(dimensions: &[u64]) -> Self {
        Dataspace {
            kind: DataspaceKind::Simple,
            dimensions: dimensions.to_vec(),
        }
    }

    pub fn rank(&self) -> usize {
        self.dimensions.len()
    }

    /// Number of elements: 1 for scalar, 0 for null, the product otherwise.
    ///
    /// Saturates instead of overflowing on corrupt dimensions.
    pub fn num_elements(&self) -> u64 {
        match self.kind {
            DataspaceKind::Scalar => 1,
            DataspaceKind::Null => 0,
            DataspaceKind::Simple => self
                .dimensions
                .iter()
                .fold(1u64, |n, &d| n.saturating_mul(d)),
        }
    }

    pub fn parse(data: &[u8], length_size: u8) -> Result<Dataspace, FormatError> {
        ensure_len(data, 0, 4)?;
        let version = data[0];
        let rank = data[1] as usize;
        let (kind, dims_start) = match version {
            // v1: reserved byte and four reserved bytes after the flags
            1 => {
                let kind = if rank == 0 {
                    DataspaceKind::Scalar
                } else {
                    DataspaceKind::Simple
                };
                (kind, 8)
            }
            2 => {
                let kind = match data[3] {
                    0 => DataspaceKind::Scalar,
                    1 => DataspaceKind::Simple,
                    2 => DataspaceKind::Null,
                    other => {
                        return Err(FormatError::InvalidValue {
                            field: "dataspace type",
                            value: u64::from(other),
                        })
                    }
                };
                (kind, 4)
            }
            version => {
                return Err(FormatError::UnsupportedVersion {
                    structure: "dataspace",
                    version,
                })
            }
        };

        let ls = length_size as usize;
        let mut dimensions = Vec::with_capacity(rank);
        for i in 0..rank {
            dimensions.push(read_uint(data, dims_start + i * ls, length_size)?);
        }
        // max dimensions (flags bit 0) follow and are not needed
        Ok(Dataspace { kind, dimensions })
    }

    /// Encodes the dataspace in message version 1 or 2.
    pub fn serialize(&self, version: u8, length_size: u8) -> Result<Vec<u8>, FormatError> {
        let mut buf = Vec::new();
        match version {
            1 => {
                if self.kind == DataspaceKind::Null {
                    return Err(FormatError::Unsupported(
                        "null dataspace in a version 1 message".into(),
                    ));
                }
                buf.extend_from_slice(&[1, self.rank() as u8, 0, 0, 0, 0, 0, 0]);
            }
            2 => {
                let kind = match self.kind {
                    DataspaceKind::Scalar => 0,
                    DataspaceKind::Simple => 1,
                    DataspaceKind::Null => 2,
                };
                buf.extend_from_slice(&[2, self.rank() as u8, 0, kind]);
            }
            version => {
                return Err(FormatError::UnsupportedVersion {
                    structure: "dataspace",
                    version,
                })
            }
        }
        for &dim in &self.dimensions {
            write_uint(&mut buf, dim, length_size);
        }
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_2d_v1() {
        let ds = Dataspace::simple(&[12, 4]);
        let bytes = ds.serialize(1, 8).unwrap();
        assert_eq!(bytes.len(), 8 + 16);
        let parsed = Dataspace::parse(&bytes, 8).unwrap();
        assert_eq!(parsed, ds);
        assert_eq!(parsed.num_elements(), 48);
    }

    #[test]
    fn scalar_and_null_v2() {
        let scalar = Dataspace::parse(&Dataspace::scalar().serialize(2, 8).unwrap(), 8).unwrap();
        assert_eq!(scalar.kind, DataspaceKind::Scalar);
        assert_eq!(scalar.num_elements(), 1);

        let null = Dataspace::parse(&[2, 0, 0, 2], 8).unwrap();
        assert_eq!(null.kind, DataspaceKind::Null);
        assert_eq!(null.num_elements(), 0);
        assert!(null.serialize(1, 8).is_err());
    }

    #[test]
    fn v1_rank_zero_is_scalar() {
        let parsed = Dataspace::parse(&[1, 0, 0, 0, 0, 0, 0, 0], 8).unwrap();
        assert_eq!(parsed, Dataspace::scalar());
    }

    #[test]
    fn max_dims_are_ignored() {
        let mut bytes = vec![2, 1, 0x01, 1];
        bytes.extend_from_slice(&5u64.to_le_bytes());
        bytes.extend_from_slice(&u64::MAX.to_le_bytes());
        let parsed = Dataspace::parse(&bytes, 8).unwrap();
        assert_eq!(parsed.dimensions, vec![5]);
    }

    #[test]
    fn errors() {
        assert!(matches!(
            Dataspace::parse(&[2, 0, 0, 9], 8),
            Err(FormatError::InvalidValue { .. })
        ));
        assert!(matches!(
            Dataspace::parse(&[3, 0, 0, 0], 8),
            Err(FormatError::UnsupportedVersion { version: 3, .. })
        ));
        // rank 2 with only one dimension present
        let mut bytes = vec![2, 2, 0, 1];
        bytes.extend_from_slice(&5u64.to_le_bytes());
        assert!(matches!(
            Dataspace::parse(&bytes, 8),
            Err(FormatError::UnexpectedEof { .. })
        ));
    }
}
