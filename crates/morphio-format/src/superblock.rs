//! Superblock parsing (versions 0 to 3) and serialization (versions 0 and 2).

use byteorder::{ByteOrder, LittleEndian};

use crate::checksum::jenkins_lookup3;
use crate::error::FormatError;
use crate::signature::{find_signature, HDF5_SIGNATURE};
use crate::util::{ensure_len, read_address, read_uint, write_address, write_uint};

/// Group B-tree K values the legacy layout writes (leaf, internal).
pub const DEFAULT_GROUP_NODE_K: (u16, u16) = (4, 16);

/// Parsed HDF5 superblock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Superblock {
    /// Superblock version (0 to 3).
    pub version: u8,
    /// Size of file addresses in bytes.
    pub offset_size: u8,
    /// Size of lengths in bytes.
    pub length_size: u8,
    /// Absolute position every other address is relative to.
    pub base_address: u64,
    pub eof_address: u64,
    /// Object header address of the root group.
    pub root_group_address: u64,
    /// Superblock extension (v2/v3), `None` when undefined.
    pub extension_address: Option<u64>,
    /// Group B-tree K values (v0/v1 only).
    pub group_node_k: Option<(u16, u16)>,
}

fn validate_sizes(offset_size: u8, length_size: u8) -> Result<(), FormatError> {
    if !matches!(offset_size, 2 | 4 | 8) {
        return Err(FormatError::InvalidOffsetSize(offset_size));
    }
    if !matches!(length_size, 2 | 4 | 8) {
        return Err(FormatError::InvalidLengthSize(length_size));
    }
    Ok(())
}

impl Superblock {
    /// Finds the signature in `data` and parses the superblock behind it.
    pub fn locate(data: &[u8]) -> Result<Superblock, FormatError> {
        let offset = find_signature(data)?;
        Self::parse(data, offset)
    }

    /// Parses a superblock whose signature starts at `signature_offset`.
    pub fn parse(data: &[u8], signature_offset: usize) -> Result<Superblock, FormatError> {
        ensure_len(data, signature_offset, 9)?;
        let d = &data[signature_offset..];
        if d[..8] != HDF5_SIGNATURE {
            return Err(FormatError::SignatureNotFound);
        }
        match d[8] {
            0 => Self::parse_legacy(d, 0),
            1 => Self::parse_legacy(d, 1),
            2 | 3 => Self::parse_latest(d, d[8]),
            version => Err(FormatError::UnsupportedVersion {
                structure: "superblock",
                version,
            }),
        }
    }

    fn parse_legacy(d: &[u8], version: u8) -> Result<Superblock, FormatError> {
        ensure_len(d, 0, 24)?;
        let offset_size = d[13];
        let length_size = d[14];
        validate_sizes(offset_size, length_size)?;
        let leaf_k = LittleEndian::read_u16(&d[16..18]);
        let internal_k = LittleEndian::read_u16(&d[18..20]);

        // v1 inserts the indexed storage K and two reserved bytes
        let os = offset_size as usize;
        let mut pos = if version == 1 { 28 } else { 24 };
        ensure_len(d, pos, 4 * os + 2 * os + 24)?;

        let base_address = read_uint(d, pos, offset_size)?;
        pos += 2 * os; // free-space address is reserved
        let eof_address = read_uint(d, pos, offset_size)?;
        pos += 2 * os; // driver info block is not used

        // root group symbol table entry: link name offset, then header address
        pos += os;
        let root_group_address = read_uint(d, pos, offset_size)?;

        Ok(Superblock {
            version,
            offset_size,
            length_size,
            base_address,
            eof_address,
            root_group_address,
            extension_address: None,
            group_node_k: Some((leaf_k, internal_k)),
        })
    }

    fn parse_latest(d: &[u8], version: u8) -> Result<Superblock, FormatError> {
        ensure_len(d, 0, 12)?;
        let offset_size = d[9];
        let length_size = d[10];
        validate_sizes(offset_size, length_size)?;

        let os = offset_size as usize;
        let checksum_pos = 12 + 4 * os;
        ensure_len(d, checksum_pos, 4)?;
        let stored = LittleEndian::read_u32(&d[checksum_pos..checksum_pos + 4]);
        let computed = jenkins_lookup3(&d[..checksum_pos]);
        if stored != computed {
            return Err(FormatError::ChecksumMismatch {
                structure: "superblock",
                stored,
                computed,
            });
        }

        Ok(Superblock {
            version,
            offset_size,
            length_size,
            base_address: read_uint(d, 12, offset_size)?,
            extension_address: read_address(d, 12 + os, offset_size)?,
            eof_address: read_uint(d, 12 + 2 * os, offset_size)?,
            root_group_address: read_uint(d, 12 + 3 * os, offset_size)?,
            group_node_k: None,
        })
    }

    /// Encoded size of this superblock.
    pub fn encoded_len(&self) -> usize {
        let os = self.offset_size as usize;
        match self.version {
            0 => 24 + 4 * os + (2 * os + 24),
            1 => 28 + 4 * os + (2 * os + 24),
            _ => 12 + 4 * os + 4,
        }
    }

    /// Encodes the superblock. Versions 0 and 2 are supported.
    ///
    /// A v0 root symbol table entry is written without cached scratch data,
    /// so readers locate the root group through its object header.
    pub fn serialize(&self) -> Result<Vec<u8>, FormatError> {
        let os = self.offset_size;
        let mut buf = Vec::with_capacity(self.encoded_len());
        buf.extend_from_slice(&HDF5_SIGNATURE);
        match self.version {
            0 => {
                let (leaf_k, internal_k) = self.group_node_k.unwrap_or(DEFAULT_GROUP_NODE_K);
                // free-space, root group, reserved and shared header versions
                buf.extend_from_slice(&[0, 0, 0, 0, 0]);
                buf.extend_from_slice(&[os, self.length_size, 0]);
                buf.extend_from_slice(&leaf_k.to_le_bytes());
                buf.extend_from_slice(&internal_k.to_le_bytes());
                buf.extend_from_slice(&0u32.to_le_bytes());
                write_uint(&mut buf, self.base_address, os);
                write_address(&mut buf, None, os);
                write_uint(&mut buf, self.eof_address, os);
                write_address(&mut buf, None, os);
                // root symbol table entry
                write_uint(&mut buf, 0, os);
                write_uint(&mut buf, self.root_group_address, os);
                buf.extend_from_slice(&0u32.to_le_bytes());
                buf.extend_from_slice(&0u32.to_le_bytes());
                buf.extend_from_slice(&[0u8; 16]);
            }
            2 => {
                buf.extend_from_slice(&[2, os, self.length_size, 0]);
                write_uint(&mut buf, self.base_address, os);
                write_address(&mut buf, self.extension_address, os);
                write_uint(&mut buf, self.eof_address, os);
                write_uint(&mut buf, self.root_group_address, os);
                let checksum = jenkins_lookup3(&buf);
                buf.extend_from_slice(&checksum.to_le_bytes());
            }
            version => {
                return Err(FormatError::UnsupportedVersion {
                    structure: "superblock",
                    version,
                })
            }
        }
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(version: u8) -> Superblock {
        Superblock {
            version,
            offset_size: 8,
            length_size: 8,
            base_address: 0,
            eof_address: 4096,
            root_group_address: 96,
            extension_address: None,
            group_node_k: (version < 2).then_some(DEFAULT_GROUP_NODE_K),
        }
    }

    #[test]
    fn legacy_superblock() {
        let sb = sample(0);
        let bytes = sb.serialize().unwrap();
        assert_eq!(bytes.len(), 96);
        assert_eq!(bytes.len(), sb.encoded_len());
        assert_eq!(Superblock::locate(&bytes).unwrap(), sb);
    }

    #[test]
    fn latest_superblock() {
        let sb = sample(2);
        let bytes = sb.serialize().unwrap();
        assert_eq!(bytes.len(), 48);
        assert_eq!(Superblock::parse(&bytes, 0).unwrap(), sb);
    }

    #[test]
    fn corrupted_checksum() {
        let mut bytes = sample(2).serialize().unwrap();
        bytes[20] ^= 0x01;
        assert!(matches!(
            Superblock::parse(&bytes, 0),
            Err(FormatError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn superblock_behind_user_block() {
        let mut data = vec![0u8; 512];
        data.extend_from_slice(&sample(2).serialize().unwrap());
        let sb = Superblock::locate(&data).unwrap();
        assert_eq!(sb.root_group_address, 96);
    }

    #[test]
    fn rejects_bad_sizes_and_versions() {
        let mut bytes = sample(0).serialize().unwrap();
        bytes[13] = 3;
        assert_eq!(
            Superblock::parse(&bytes, 0),
            Err(FormatError::InvalidOffsetSize(3))
        );
        bytes[8] = 7;
        assert!(matches!(
            Superblock::parse(&bytes, 0),
            Err(FormatError::UnsupportedVersion { version: 7, .. })
        ));
    }

    #[test]
    fn truncated() {
        let bytes = sample(0).serialize().unwrap();
        assert!(matches!(
            Superblock::parse(&bytes[..40], 0),
            Err(FormatError::UnexpectedEof { .. })
        ));
    }
}
