//! Object headers (versions 1 and 2), including continuation chunks.

use byteorder::{ByteOrder, LittleEndian};

use crate::checksum::jenkins_lookup3;
use crate::error::FormatError;
use crate::message_type::MessageType;
use crate::util::{ensure_len, pad8, read_uint, write_uint};

const OHDR: &[u8; 4] = b"OHDR";
const OCHK: &[u8; 4] = b"OCHK";

/// Message flag: the message data is a reference into the shared message table.
pub const MSG_FLAG_SHARED: u8 = 0x02;
/// Message flag: readers that do not know the type must fail.
pub const MSG_FLAG_MUST_UNDERSTAND: u8 = 0x08;
/// Message flag: the message is constant for the object's lifetime.
pub const MSG_FLAG_CONSTANT: u8 = 0x01;

// v2 header flags
const FLAG_CREATION_ORDER_TRACKED: u8 = 0x04;
const FLAG_PHASE_CHANGE_STORED: u8 = 0x10;
const FLAG_TIMES_STORED: u8 = 0x20;

/// Upper bound on continuation chunks followed for one header.
const MAX_CHUNKS: usize = 4096;

/// One message out of an object header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderMessage {
    pub msg_type: MessageType,
    pub flags: u8,
    pub data: Vec<u8>,
}

impl HeaderMessage {
    pub fn new(msg_type: MessageType, flags: u8, data: Vec<u8>) -> Self {
        HeaderMessage {
            msg_type,
            flags,
            data,
        }
    }

    pub fn is_shared(&self) -> bool {
        self.flags & MSG_FLAG_SHARED != 0
    }
}

/// A parsed object header: its version and all messages across chunks.
///
/// Nil and continuation messages are consumed during parsing and do not
/// appear in `messages`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectHeader {
    pub version: u8,
    pub messages: Vec<HeaderMessage>,
}

#[derive(Debug, Clone, Copy)]
struct Chunk {
    start: usize,
    end: usize,
}

/// Message-header geometry that differs between the two versions.
#[derive(Debug, Clone, Copy)]
enum Framing {
    V1,
    V2 { creation_order: bool },
}

impl Framing {
    fn header_len(self) -> usize {
        match self {
            Framing::V1 => 8,
            Framing::V2 { creation_order } => {
                if creation_order {
                    6
                } else {
                    4
                }
            }
        }
    }
}

impl ObjectHeader {
    /// Parses the object header at `offset`.
    pub fn parse(
        data: &[u8],
        offset: usize,
        offset_size: u8,
        length_size: u8,
    ) -> Result<ObjectHeader, FormatError> {
        ensure_len(data, offset, 4)?;
        let (version, framing, first) = if &data[offset..offset + 4] == OHDR {
            Self::v2_prefix(data, offset)?
        } else {
            Self::v1_prefix(data, offset)?
        };

        let mut chunks = vec![first];
        let mut messages = Vec::new();
        let mut index = 0;
        while index < chunks.len() {
            let chunk = chunks[index];
            index += 1;
            let hl = framing.header_len();
            let mut pos = chunk.start;
            while pos + hl <= chunk.end {
                let (raw_type, size, flags) = match framing {
                    Framing::V1 => (
                        LittleEndian::read_u16(&data[pos..pos + 2]),
                        LittleEndian::read_u16(&data[pos + 2..pos + 4]) as usize,
                        data[pos + 4],
                    ),
                    Framing::V2 { .. } => (
                        u16::from(data[pos]),
                        LittleEndian::read_u16(&data[pos + 1..pos + 3]) as usize,
                        data[pos + 3],
                    ),
                };
                pos += hl;
                if pos + size > chunk.end {
                    return Err(FormatError::UnexpectedEof {
                        expected: pos + size,
                        available: chunk.end,
                    });
                }
                let body = &data[pos..pos + size];
                pos += size;

                match MessageType::from_u16(raw_type) {
                    MessageType::Nil => {}
                    MessageType::ObjectHeaderContinuation => {
                        if chunks.len() >= MAX_CHUNKS {
                            return Err(FormatError::Unsupported(
                                "object header continuation chain too long".into(),
                            ));
                        }
                        let address = read_uint(body, 0, offset_size)? as usize;
                        let length = read_uint(body, offset_size as usize, length_size)? as usize;
                        chunks.push(Self::continuation(data, framing, address, length)?);
                    }
                    MessageType::Unknown(id) if flags & MSG_FLAG_MUST_UNDERSTAND != 0 => {
                        return Err(FormatError::UnsupportedMessage(id));
                    }
                    msg_type => messages.push(HeaderMessage::new(msg_type, flags, body.to_vec())),
                }
            }
        }

        Ok(ObjectHeader { version, messages })
    }

    fn v1_prefix(data: &[u8], offset: usize) -> Result<(u8, Framing, Chunk), FormatError> {
        ensure_len(data, offset, 16)?;
        let version = data[offset];
        if version != 1 {
            return Err(FormatError::UnsupportedVersion {
                structure: "object header",
                version,
            });
        }
        let size = LittleEndian::read_u32(&data[offset + 8..offset + 12]) as usize;
        // the 12-byte prefix is padded to 16 so messages stay 8-byte aligned
        let start = offset + 16;
        ensure_len(data, start, size)?;
        Ok((1, Framing::V1, Chunk { start, end: start + size }))
    }

    fn v2_prefix(data: &[u8], offset: usize) -> Result<(u8, Framing, Chunk), FormatError> {
        ensure_len(data, offset, 6)?;
        let version = data[offset + 4];
        if version != 2 {
            return Err(FormatError::UnsupportedVersion {
                structure: "object header",
                version,
            });
        }
        let flags = data[offset + 5];
        let mut pos = offset + 6;
        if flags & FLAG_TIMES_STORED != 0 {
            pos += 16;
        }
        if flags & FLAG_PHASE_CHANGE_STORED != 0 {
            pos += 4;
        }
        let width = 1u8 << (flags & 0x03);
        let size = read_uint(data, pos, width)? as usize;
        pos += width as usize;
        // chunk data is followed by its checksum
        ensure_len(data, pos, size + 4)?;
        let framing = Framing::V2 {
            creation_order: flags & FLAG_CREATION_ORDER_TRACKED != 0,
        };
        Ok((2, framing, Chunk { start: pos, end: pos + size }))
    }

    fn continuation(
        data: &[u8],
        framing: Framing,
        address: usize,
        length: usize,
    ) -> Result<Chunk, FormatError> {
        ensure_len(data, address, length)?;
        match framing {
            Framing::V1 => Ok(Chunk {
                start: address,
                end: address + length,
            }),
            Framing::V2 { .. } => {
                if length < 8 || &data[address..address + 4] != OCHK {
                    return Err(FormatError::InvalidSignature {
                        structure: "OCHK",
                        address,
                    });
                }
                Ok(Chunk {
                    start: address + 4,
                    end: address + length - 4,
                })
            }
        }
    }

    /// First message of the given type.
    pub fn find(&self, msg_type: MessageType) -> Option<&HeaderMessage> {
        self.messages.iter().find(|m| m.msg_type == msg_type)
    }

    /// All messages of the given type, in header order.
    pub fn find_all(&self, msg_type: MessageType) -> impl Iterator<Item = &HeaderMessage> {
        self.messages.iter().filter(move |m| m.msg_type == msg_type)
    }

    pub fn has(&self, msg_type: MessageType) -> bool {
        self.find(msg_type).is_some()
    }

    /// Encodes the header as a single chunk in its own version's framing.
    pub fn serialize(&self) -> Result<Vec<u8>, FormatError> {
        match self.version {
            1 => Ok(self.serialize_v1()),
            2 => Ok(self.serialize_v2()),
            version => Err(FormatError::UnsupportedVersion {
                structure: "object header",
                version,
            }),
        }
    }

    fn serialize_v1(&self) -> Vec<u8> {
        let mut body = Vec::new();
        for msg in &self.messages {
            let padded = pad8(msg.data.len());
            body.extend_from_slice(&msg.msg_type.to_u16().to_le_bytes());
            body.extend_from_slice(&(padded as u16).to_le_bytes());
            body.extend_from_slice(&[msg.flags, 0, 0, 0]);
            body.extend_from_slice(&msg.data);
            body.resize(body.len() + padded - msg.data.len(), 0);
        }

        let mut buf = Vec::with_capacity(16 + body.len());
        buf.extend_from_slice(&[1, 0]);
        buf.extend_from_slice(&(self.messages.len() as u16).to_le_bytes());
        buf.extend_from_slice(&1u32.to_le_bytes()); // reference count
        buf.extend_from_slice(&(body.len() as u32).to_le_bytes());
        buf.extend_from_slice(&[0u8; 4]);
        buf.extend_from_slice(&body);
        buf
    }

    fn serialize_v2(&self) -> Vec<u8> {
        let mut body = Vec::new();
        for msg in &self.messages {
            body.push(msg.msg_type.to_u16() as u8);
            body.extend_from_slice(&(msg.data.len() as u16).to_le_bytes());
            body.push(msg.flags);
            body.extend_from_slice(&msg.data);
        }

        let (size_flags, width) = match body.len() {
            n if n <= 0xFF => (0u8, 1u8),
            n if n <= 0xFFFF => (1, 2),
            n if n <= 0xFFFF_FFFF => (2, 4),
            _ => (3, 8),
        };
        let mut buf = Vec::with_capacity(6 + width as usize + body.len() + 4);
        buf.extend_from_slice(OHDR);
        buf.push(2);
        buf.push(size_flags);
        write_uint(&mut buf, body.len() as u64, width);
        buf.extend_from_slice(&body);
        let checksum = jenkins_lookup3(&buf);
        buf.extend_from_slice(&checksum.to_le_bytes());
        buf
    }
}
