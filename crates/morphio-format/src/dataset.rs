//! The messages that describe a dataset, gathered from its object header.

use crate::data_layout::DataLayout;
use crate::dataspace::Dataspace;
use crate::datatype::Datatype;
use crate::error::FormatError;
use crate::message_type::MessageType;
use crate::object_header::ObjectHeader;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetHeader {
    pub datatype: Datatype,
    pub dataspace: Dataspace,
    pub layout: DataLayout,
    /// A filter pipeline (compression, shuffle, ...) is attached.
    pub filtered: bool,
}

impl DatasetHeader {
    pub fn from_object_header(
        header: &ObjectHeader,
        offset_size: u8,
        length_size: u8,
    ) -> Result<DatasetHeader, FormatError> {
        let datatype = header
            .find(MessageType::Datatype)
            .ok_or(FormatError::MissingMessage("datatype"))?;
        if datatype.is_shared() {
            return Err(FormatError::Unsupported("committed datatype".into()));
        }
        let dataspace = header
            .find(MessageType::Dataspace)
            .ok_or(FormatError::MissingMessage("dataspace"))?;
        let layout = header
            .find(MessageType::DataLayout)
            .ok_or(FormatError::MissingMessage("data layout"))?;

        Ok(DatasetHeader {
            datatype: Datatype::parse(&datatype.data)?,
            dataspace: Dataspace::parse(&dataspace.data, length_size)?,
            layout: DataLayout::parse(&layout.data, offset_size, length_size)?,
            filtered: header.has(MessageType::FilterPipeline),
        })
    }

    pub fn shape(&self) -> &[u64] {
        &self.dataspace.dimensions
    }

    /// Total raw byte size implied by dataspace and datatype.
    pub fn byte_len(&self) -> Result<usize, FormatError> {
        self.dataspace
            .num_elements()
            .checked_mul(u64::from(self.datatype.size()))
            .and_then(|n| usize::try_from(n).ok())
            .ok_or(FormatError::InvalidValue {
                field: "dataset size",
                value: self.dataspace.num_elements(),
            })
    }
}
