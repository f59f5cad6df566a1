//! Group membership and path resolution for both group representations.

use crate::btree_v1::collect_symbol_nodes;
use crate::error::FormatError;
use crate::link::{LinkInfo, LinkMessage, LinkTarget};
use crate::local_heap::LocalHeap;
use crate::message_type::MessageType;
use crate::object_header::ObjectHeader;
use crate::symbol_table::{SymbolTableMessage, SymbolTableNode};

/// A named member of a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupEntry {
    pub name: String,
    pub object_header_address: u64,
}

/// What an object header describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Group,
    Dataset,
    Other,
}

pub fn object_kind(header: &ObjectHeader) -> ObjectKind {
    if header.has(MessageType::SymbolTable)
        || header.has(MessageType::LinkInfo)
        || header.has(MessageType::Link)
    {
        ObjectKind::Group
    } else if header.has(MessageType::DataLayout) {
        ObjectKind::Dataset
    } else {
        ObjectKind::Other
    }
}

/// Lists the hard-linked members of a group.
///
/// Legacy groups are read through their B-tree, SNODs and local heap;
/// latest-layout groups through their link messages. Soft and external
/// links are not members for this purpose.
pub fn group_entries(
    file: &[u8],
    header: &ObjectHeader,
    offset_size: u8,
    length_size: u8,
) -> Result<Vec<GroupEntry>, FormatError> {
    if let Some(msg) = header.find(MessageType::SymbolTable) {
        let table = SymbolTableMessage::parse(&msg.data, offset_size)?;
        let heap = LocalHeap::parse(
            file,
            table.local_heap_address as usize,
            offset_size,
            length_size,
        )?;
        let mut entries = Vec::new();
        for snod in collect_symbol_nodes(file, table.btree_address, offset_size, length_size)? {
            let node = SymbolTableNode::parse(file, snod as usize, offset_size)?;
            for entry in node.entries {
                entries.push(GroupEntry {
                    name: heap.read_name(file, entry.name_offset)?,
                    object_header_address: entry.object_header_address,
                });
            }
        }
        return Ok(entries);
    }

    if let Some(msg) = header.find(MessageType::LinkInfo) {
        if LinkInfo::parse(&msg.data, offset_size)?.is_dense() {
            return Err(FormatError::Unsupported("dense link storage".into()));
        }
    }
    let mut entries = Vec::new();
    for msg in header.find_all(MessageType::Link) {
        let link = LinkMessage::parse(&msg.data, offset_size)?;
        if let LinkTarget::Hard(address) = link.target {
            entries.push(GroupEntry {
                name: link.name,
                object_header_address: address,
            });
        }
    }
    Ok(entries)
}

/// Resolves an absolute or root-relative path to an object header.
///
/// A missing component, or a component that is not a group while more of
/// the path remains, resolves to `Ok(None)`. Only structural corruption is
/// an error.
pub fn resolve_path(
    file: &[u8],
    root_address: u64,
    path: &str,
    offset_size: u8,
    length_size: u8,
) -> Result<Option<(u64, ObjectHeader)>, FormatError> {
    let mut address = root_address;
    let mut header = ObjectHeader::parse(file, address as usize, offset_size, length_size)?;
    for component in path.split('/').filter(|c| !c.is_empty() && *c != ".") {
        if object_kind(&header) != ObjectKind::Group {
            return Ok(None);
        }
        let entries = group_entries(file, &header, offset_size, length_size)?;
        match entries.into_iter().find(|e| e.name == component) {
            Some(entry) => {
                address = entry.object_header_address;
                header = ObjectHeader::parse(file, address as usize, offset_size, length_size)?;
            }
            None => return Ok(None),
        }
    }
    Ok(Some((address, header)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object_header::HeaderMessage;
    use crate::writer::{FileWriter, WriterLayout};

    #[test]
    fn object_kinds() {
        let group = ObjectHeader {
            version: 2,
            messages: vec![HeaderMessage::new(
                MessageType::LinkInfo,
                0,
                LinkInfo::compact().serialize(8),
            )],
        };
        assert_eq!(object_kind(&group), ObjectKind::Group);
        let other = ObjectHeader {
            version: 2,
            messages: vec![],
        };
        assert_eq!(object_kind(&other), ObjectKind::Other);
    }

    #[test]
    fn resolve_in_both_layouts() {
        for layout in [WriterLayout::Legacy, WriterLayout::Latest] {
            let mut writer = FileWriter::new(layout);
            writer.add_group("/neuron1/repaired");
            writer.add_dataset("/neuron1/repaired/points", &[1, 4], vec![0.0f32, 1.0, 2.0, 3.0]);
            let file = writer.finish().unwrap();
            let sb = crate::superblock::Superblock::locate(&file).unwrap();

            let resolve = |p: &str| resolve_path(&file, sb.root_group_address, p, 8, 8).unwrap();
            let (_, points) = resolve("/neuron1/repaired/points").unwrap();
            assert_eq!(object_kind(&points), ObjectKind::Dataset);
            let (_, group) = resolve("neuron1/repaired/").unwrap();
            assert_eq!(object_kind(&group), ObjectKind::Group);
            assert!(resolve("/").is_some());
            assert!(resolve("/neuron1/raw").is_none());
            // a dataset has no members
            assert!(resolve("/neuron1/repaired/points/x").is_none());
        }
    }

    #[test]
    fn dense_links_unsupported() {
        let mut info = vec![0, 0];
        info.extend_from_slice(&0x600u64.to_le_bytes());
        info.extend_from_slice(&0x680u64.to_le_bytes());
        let header = ObjectHeader {
            version: 2,
            messages: vec![HeaderMessage::new(MessageType::LinkInfo, 0, info)],
        };
        assert!(matches!(
            group_entries(&[], &header, 8, 8),
            Err(FormatError::Unsupported(_))
        ));
    }
}
