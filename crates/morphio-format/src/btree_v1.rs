//! Version 1 B-trees of type 0, which index symbol-table group members.

use crate::error::FormatError;
use crate::util::{ensure_len, read_address, read_uint, write_address, write_uint};

const SIGNATURE: &[u8; 4] = b"TREE";
const GROUP_NODE: u8 = 0;

/// One parsed group B-tree node.
///
/// Keys are local-heap name offsets; a leaf's children are SNOD addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupBTreeNode {
    pub level: u8,
    pub left_sibling: Option<u64>,
    pub right_sibling: Option<u64>,
    /// `children.len() + 1` keys.
    pub keys: Vec<u64>,
    pub children: Vec<u64>,
}

impl GroupBTreeNode {
    pub fn parse(
        file: &[u8],
        offset: usize,
        offset_size: u8,
        length_size: u8,
    ) -> Result<GroupBTreeNode, FormatError> {
        let os = offset_size as usize;
        let ks = length_size as usize;
        ensure_len(file, offset, 8 + 2 * os)?;
        if &file[offset..offset + 4] != SIGNATURE {
            return Err(FormatError::InvalidSignature {
                structure: "TREE",
                address: offset,
            });
        }
        let node_type = file[offset + 4];
        if node_type != GROUP_NODE {
            return Err(FormatError::InvalidValue {
                field: "group B-tree node type",
                value: u64::from(node_type),
            });
        }
        let level = file[offset + 5];
        let entries = read_uint(file, offset + 6, 2)? as usize;
        let left_sibling = read_address(file, offset + 8, offset_size)?;
        let right_sibling = read_address(file, offset + 8 + os, offset_size)?;

        // key0, child0, key1, child1, ..., keyN
        let mut pos = offset + 8 + 2 * os;
        ensure_len(file, pos, entries * (ks + os) + ks)?;
        let mut keys = Vec::with_capacity(entries + 1);
        let mut children = Vec::with_capacity(entries);
        for _ in 0..entries {
            keys.push(read_uint(file, pos, length_size)?);
            children.push(read_uint(file, pos + ks, offset_size)?);
            pos += ks + os;
        }
        keys.push(read_uint(file, pos, length_size)?);

        Ok(GroupBTreeNode {
            level,
            left_sibling,
            right_sibling,
            keys,
            children,
        })
    }

    pub fn serialize(&self, offset_size: u8, length_size: u8) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(SIGNATURE);
        buf.extend_from_slice(&[GROUP_NODE, self.level]);
        buf.extend_from_slice(&(self.children.len() as u16).to_le_bytes());
        write_address(&mut buf, self.left_sibling, offset_size);
        write_address(&mut buf, self.right_sibling, offset_size);
        for (key, child) in self.keys.iter().zip(&self.children) {
            write_uint(&mut buf, *key, length_size);
            write_uint(&mut buf, *child, offset_size);
        }
        write_uint(&mut buf, self.keys.last().copied().unwrap_or(0), length_size);
        buf
    }
}

/// Walks the tree rooted at `root` and returns every SNOD address in key order.
pub fn collect_symbol_nodes(
    file: &[u8],
    root: u64,
    offset_size: u8,
    length_size: u8,
) -> Result<Vec<u64>, FormatError> {
    let mut snods = Vec::new();
    let mut stack = vec![(root, None::<u8>)];
    while let Some((address, expected_level)) = stack.pop() {
        let node = GroupBTreeNode::parse(file, address as usize, offset_size, length_size)?;
        // levels strictly decrease toward the leaves, which rules out cycles
        if let Some(expected) = expected_level {
            if node.level != expected {
                return Err(FormatError::InvalidValue {
                    field: "group B-tree node level",
                    value: u64::from(node.level),
                });
            }
        }
        if node.level == 0 {
            snods.extend_from_slice(&node.children);
        } else {
            for &child in node.children.iter().rev() {
                stack.push((child, Some(node.level - 1)));
            }
        }
    }
    Ok(snods)
}
