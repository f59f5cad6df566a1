//! Builds small HDF5 images from an in-memory tree of groups and datasets.
//!
//! Objects are emitted children first, so every address a header refers
//! to is already known when the header is encoded, and the superblock is
//! patched in at the end. [`WriterLayout::Legacy`] produces what older
//! HDF5 libraries write by default (superblock v0, v1 object headers,
//! symbol-table groups); [`WriterLayout::Latest`] produces superblock v2,
//! v2 object headers and link-message groups.

use crate::attribute::AttributeMessage;
use crate::btree_v1::GroupBTreeNode;
use crate::data_layout::DataLayout;
use crate::dataspace::Dataspace;
use crate::datatype::Datatype;
use crate::error::FormatError;
use crate::link::{LinkInfo, LinkMessage};
use crate::local_heap::{build_data_segment, LocalHeap};
use crate::message_type::MessageType;
use crate::object_header::{HeaderMessage, ObjectHeader, MSG_FLAG_CONSTANT};
use crate::superblock::{Superblock, DEFAULT_GROUP_NODE_K};
use crate::symbol_table::{SymbolTableEntry, SymbolTableMessage, SymbolTableNode};
use crate::util::pad_to_8;

const OFFSET_SIZE: u8 = 8;
const LENGTH_SIZE: u8 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterLayout {
    Legacy,
    Latest,
}

/// Typed element data for datasets and attributes, written little-endian.
#[derive(Debug, Clone, PartialEq)]
pub enum NumericData {
    F32(Vec<f32>),
    F64(Vec<f64>),
    I32(Vec<i32>),
    I64(Vec<i64>),
    U32(Vec<u32>),
}

impl NumericData {
    pub fn len(&self) -> usize {
        match self {
            NumericData::F32(v) => v.len(),
            NumericData::F64(v) => v.len(),
            NumericData::I32(v) => v.len(),
            NumericData::I64(v) => v.len(),
            NumericData::U32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn datatype(&self) -> Datatype {
        match self {
            NumericData::F32(_) => Datatype::little_endian_float(4),
            NumericData::F64(_) => Datatype::little_endian_float(8),
            NumericData::I32(_) => Datatype::little_endian_int(4, true),
            NumericData::I64(_) => Datatype::little_endian_int(8, true),
            NumericData::U32(_) => Datatype::little_endian_int(4, false),
        }
    }

    pub fn to_le_bytes(&self) -> Vec<u8> {
        match self {
            NumericData::F32(v) => v.iter().flat_map(|x| x.to_le_bytes()).collect(),
            NumericData::F64(v) => v.iter().flat_map(|x| x.to_le_bytes()).collect(),
            NumericData::I32(v) => v.iter().flat_map(|x| x.to_le_bytes()).collect(),
            NumericData::I64(v) => v.iter().flat_map(|x| x.to_le_bytes()).collect(),
            NumericData::U32(v) => v.iter().flat_map(|x| x.to_le_bytes()).collect(),
        }
    }
}

macro_rules! numeric_from {
    ($($t:ty => $variant:ident),*) => {
        $(
            impl From<Vec<$t>> for NumericData {
                fn from(v: Vec<$t>) -> Self {
                    NumericData::$variant(v)
                }
            }

            impl From<&[$t]> for NumericData {
                fn from(v: &[$t]) -> Self {
                    NumericData::$variant(v.to_vec())
                }
            }
        )*
    };
}

numeric_from!(f32 => F32, f64 => F64, i32 => I32, i64 => I64, u32 => U32);

#[derive(Debug, Clone)]
struct DatasetNode {
    shape: Vec<u64>,
    data: NumericData,
    compact: bool,
}

#[derive(Debug, Clone, Default)]
struct GroupNode {
    attributes: Vec<(String, NumericData)>,
    groups: Vec<(String, GroupNode)>,
    datasets: Vec<(String, DatasetNode)>,
}

fn components(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|c| !c.is_empty())
}

/// Splits `/a/b/c` into (`/a/b`, `c`).
fn split_parent(path: &str) -> (&str, &str) {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(i) => (&trimmed[..i], &trimmed[i + 1..]),
        None => ("", trimmed),
    }
}

impl GroupNode {
    /// The group at `path`, creating missing groups along the way.
    fn group_mut(&mut self, path: &str) -> &mut GroupNode {
        let mut group = self;
        for name in components(path) {
            group.datasets.retain(|(n, _)| n != name);
            let index = match group.groups.iter().position(|(n, _)| n == name) {
                Some(i) => i,
                None => {
                    group.groups.push((name.to_string(), GroupNode::default()));
                    group.groups.len() - 1
                }
            };
            group = &mut group.groups[index].1;
        }
        group
    }
}

/// In-memory HDF5 file under construction.
#[derive(Debug, Clone)]
pub struct FileWriter {
    layout: WriterLayout,
    root: GroupNode,
}

impl FileWriter {
    pub fn new(layout: WriterLayout) -> Self {
        FileWriter {
            layout,
            root: GroupNode::default(),
        }
    }

    pub fn layout(&self) -> WriterLayout {
        self.layout
    }

    /// Creates the group at `path` and any missing parents.
    pub fn add_group(&mut self, path: &str) -> &mut Self {
        self.root.group_mut(path);
        self
    }

    /// Adds a contiguous dataset, replacing any member of the same name.
    pub fn add_dataset(
        &mut self,
        path: &str,
        shape: &[u64],
        data: impl Into<NumericData>,
    ) -> &mut Self {
        self.insert_dataset(path, shape, data.into(), false)
    }

    /// Adds a dataset whose raw data lives inside its object header.
    pub fn add_compact_dataset(
        &mut self,
        path: &str,
        shape: &[u64],
        data: impl Into<NumericData>,
    ) -> &mut Self {
        self.insert_dataset(path, shape, data.into(), true)
    }

    fn insert_dataset(
        &mut self,
        path: &str,
        shape: &[u64],
        data: NumericData,
        compact: bool,
    ) -> &mut Self {
        let (parent, name) = split_parent(path);
        let group = self.root.group_mut(parent);
        group.groups.retain(|(n, _)| n != name);
        group.datasets.retain(|(n, _)| n != name);
        group.datasets.push((
            name.to_string(),
            DatasetNode {
                shape: shape.to_vec(),
                data,
                compact,
            },
        ));
        self
    }

    /// Attaches a one-dimensional attribute to the group at `group_path`.
    pub fn add_attribute(
        &mut self,
        group_path: &str,
        name: &str,
        data: impl Into<NumericData>,
    ) -> &mut Self {
        let group = self.root.group_mut(group_path);
        group.attributes.retain(|(n, _)| n != name);
        group.attributes.push((name.to_string(), data.into()));
        self
    }

    /// Encodes the whole file.
    pub fn finish(&self) -> Result<Vec<u8>, FormatError> {
        let mut superblock = Superblock {
            version: match self.layout {
                WriterLayout::Legacy => 0,
                WriterLayout::Latest => 2,
            },
            offset_size: OFFSET_SIZE,
            length_size: LENGTH_SIZE,
            base_address: 0,
            eof_address: 0,
            root_group_address: 0,
            extension_address: None,
            group_node_k: match self.layout {
                WriterLayout::Legacy => Some(DEFAULT_GROUP_NODE_K),
                WriterLayout::Latest => None,
            },
        };
        let reserved = superblock.encoded_len();
        let mut emitter = Emitter {
            layout: self.layout,
            buf: vec![0u8; reserved],
        };
        superblock.root_group_address = emitter.group(&self.root)?;
        pad_to_8(&mut emitter.buf);
        superblock.eof_address = emitter.buf.len() as u64;

        let mut file = emitter.buf;
        file[..reserved].copy_from_slice(&superblock.serialize()?);
        Ok(file)
    }
}

struct Emitter {
    layout: WriterLayout,
    buf: Vec<u8>,
}

impl Emitter {
    /// Appends `bytes` at the next 8-byte boundary and returns their address.
    fn append(&mut self, bytes: &[u8]) -> u64 {
        pad_to_8(&mut self.buf);
        let address = self.buf.len() as u64;
        self.buf.extend_from_slice(bytes);
        address
    }

    fn header_version(&self) -> u8 {
        match self.layout {
            WriterLayout::Legacy => 1,
            WriterLayout::Latest => 2,
        }
    }

    fn dataset(&mut self, node: &DatasetNode) -> Result<u64, FormatError> {
        let raw = node.data.to_le_bytes();
        let layout = if node.compact {
            DataLayout::Compact { data: raw }
        } else if raw.is_empty() {
            DataLayout::Contiguous {
                address: None,
                size: Some(0),
            }
        } else {
            let address = self.append(&raw);
            DataLayout::Contiguous {
                address: Some(address),
                size: Some(raw.len() as u64),
            }
        };

        let version = self.header_version();
        // fill value: allocated late, written if set, no value defined
        let fill = match self.layout {
            WriterLayout::Legacy => vec![2, 2, 2, 0],
            WriterLayout::Latest => vec![3, 0x0a],
        };
        let messages = vec![
            HeaderMessage::new(
                MessageType::Dataspace,
                0,
                Dataspace::simple(&node.shape).serialize(version, LENGTH_SIZE)?,
            ),
            HeaderMessage::new(
                MessageType::Datatype,
                MSG_FLAG_CONSTANT,
                node.data.datatype().serialize()?,
            ),
            HeaderMessage::new(MessageType::FillValue, MSG_FLAG_CONSTANT, fill),
            HeaderMessage::new(
                MessageType::DataLayout,
                0,
                layout.serialize(OFFSET_SIZE, LENGTH_SIZE)?,
            ),
        ];
        let header = ObjectHeader { version, messages };
        Ok(self.append(&header.serialize()?))
    }

    fn group(&mut self, node: &GroupNode) -> Result<u64, FormatError> {
        let mut members: Vec<(&str, u64)> = Vec::new();
        for (name, child) in &node.groups {
            members.push((name.as_str(), self.group(child)?));
        }
        for (name, child) in &node.datasets {
            members.push((name.as_str(), self.dataset(child)?));
        }
        members.sort_by(|a, b| a.0.cmp(b.0));

        let version = self.header_version();
        let mut messages = match self.layout {
            WriterLayout::Latest => {
                let mut messages = vec![
                    HeaderMessage::new(MessageType::LinkInfo, 0, LinkInfo::compact().serialize(OFFSET_SIZE)),
                    HeaderMessage::new(MessageType::GroupInfo, 0, vec![0, 0]),
                ];
                for (name, address) in &members {
                    messages.push(HeaderMessage::new(
                        MessageType::Link,
                        0,
                        LinkMessage::hard(*name, *address).serialize(OFFSET_SIZE)?,
                    ));
                }
                messages
            }
            WriterLayout::Legacy => {
                let table = self.symbol_table(&members)?;
                vec![HeaderMessage::new(
                    MessageType::SymbolTable,
                    0,
                    table.serialize(OFFSET_SIZE),
                )]
            }
        };

        for (name, data) in &node.attributes {
            let attribute = AttributeMessage {
                name: name.clone(),
                datatype: data.datatype(),
                dataspace: Dataspace::simple(&[data.len() as u64]),
                raw_data: data.to_le_bytes(),
            };
            messages.push(HeaderMessage::new(
                MessageType::Attribute,
                0,
                attribute.serialize(version, LENGTH_SIZE)?,
            ));
        }

        let header = ObjectHeader { version, messages };
        Ok(self.append(&header.serialize()?))
    }

    /// Writes the local heap, SNODs and B-tree of a legacy group.
    fn symbol_table(&mut self, members: &[(&str, u64)]) -> Result<SymbolTableMessage, FormatError> {
        let (leaf_k, internal_k) = DEFAULT_GROUP_NODE_K;
        let per_node = 2 * leaf_k as usize;
        let max_nodes = 2 * internal_k as usize;
        if members.len() > per_node * max_nodes {
            return Err(FormatError::Unsupported(format!(
                "legacy group with {} members",
                members.len()
            )));
        }

        let names: Vec<&str> = members.iter().map(|(n, _)| *n).collect();
        let (segment, offsets) = build_data_segment(&names);
        let heap_header_len = LocalHeap::header_len(OFFSET_SIZE, LENGTH_SIZE);
        pad_to_8(&mut self.buf);
        let heap = LocalHeap {
            data_segment_size: segment.len() as u64,
            free_list_offset: None,
            data_segment_address: (self.buf.len() + heap_header_len) as u64,
        };
        let mut heap_bytes = heap.serialize(OFFSET_SIZE, LENGTH_SIZE);
        heap_bytes.extend_from_slice(&segment);
        let heap_address = self.append(&heap_bytes);

        let mut keys = vec![0u64];
        let mut children = Vec::new();
        let entries: Vec<SymbolTableEntry> = members
            .iter()
            .zip(&offsets)
            .map(|((_, address), offset)| SymbolTableEntry {
                name_offset: *offset,
                object_header_address: *address,
                cache_type: 0,
            })
            .collect();
        for chunk in entries.chunks(per_node) {
            let node = SymbolTableNode {
                entries: chunk.to_vec(),
            };
            children.push(self.append(&node.serialize(OFFSET_SIZE, per_node)));
            keys.push(chunk.last().map_or(0, |e| e.name_offset));
        }

        let btree = GroupBTreeNode {
            level: 0,
            left_sibling: None,
            right_sibling: None,
            keys,
            children,
        };
        let btree_address = self.append(&btree.serialize(OFFSET_SIZE, LENGTH_SIZE));
        Ok(SymbolTableMessage {
            btree_address,
            local_heap_address: heap_address,
        })
    }
}
