//! Object header message type identifiers.

/// Header message types the decoder distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    Nil,
    Dataspace,
    LinkInfo,
    Datatype,
    FillValueOld,
    FillValue,
    Link,
    DataLayout,
    GroupInfo,
    FilterPipeline,
    Attribute,
    ObjectHeaderContinuation,
    SymbolTable,
    AttributeInfo,
    /// Any other message, carried by raw id.
    Unknown(u16),
}

impl MessageType {
    pub fn from_u16(id: u16) -> MessageType {
        match id {
            0x00 => MessageType::Nil,
            0x01 => MessageType::Dataspace,
            0x02 => MessageType::LinkInfo,
            0x03 => MessageType::Datatype,
            0x04 => MessageType::FillValueOld,
            0x05 => MessageType::FillValue,
            0x06 => MessageType::Link,
            0x08 => MessageType::DataLayout,
            0x0A => MessageType::GroupInfo,
            0x0B => MessageType::FilterPipeline,
            0x0C => MessageType::Attribute,
            0x10 => MessageType::ObjectHeaderContinuation,
            0x11 => MessageType::SymbolTable,
            0x15 => MessageType::AttributeInfo,
            other => MessageType::Unknown(other),
        }
    }

    pub fn to_u16(self) -> u16 {
        match self {
            MessageType::Nil => 0x00,
            MessageType::Dataspace => 0x01,
            MessageType::LinkInfo => 0x02,
            MessageType::Datatype => 0x03,
            MessageType::FillValueOld => 0x04,
            MessageType::FillValue => 0x05,
            MessageType::Link => 0x06,
            MessageType::DataLayout => 0x08,
            MessageType::GroupInfo => 0x0A,
            MessageType::FilterPipeline => 0x0B,
            MessageType::Attribute => 0x0C,
            MessageType::ObjectHeaderContinuation => 0x10,
            MessageType::SymbolTable => 0x11,
            MessageType::AttributeInfo => 0x15,
            MessageType::Unknown(id) => id,
        }
    }
}
