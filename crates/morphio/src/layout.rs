//! Where each schema version keeps its tables.

use crate::types::{MorphologyVersion, RepairStage};

pub const METADATA_GROUP: &str = "/metadata";
pub const NEURON1_GROUP: &str = "/neuron1";
pub const VERSION_ATTR: &str = "version";
pub const CELL_FAMILY_ATTR: &str = "cell_family";

pub const V1_POINTS: &str = "/points";
pub const V1_STRUCTURE: &str = "/structure";
pub const PERIMETERS: &str = "/perimeters";
pub const MITOCHONDRIA_GROUP: &str = "/organelles/mitochondria";
pub const MITOCHONDRIA_POINTS: &str = "/organelles/mitochondria/points";
pub const MITOCHONDRIA_STRUCTURE: &str = "/organelles/mitochondria/structure";

/// Section type tables of v2 files, current name first.
pub const V2_TYPE_CANDIDATES: [&str; 2] =
    ["/neuron1/structure/type", "/neuron1/structure/sectiontype"];

/// x, y, z, diameter.
pub const POINT_COLUMNS: u64 = 4;
/// start, type, parent.
pub const V1_STRUCTURE_COLUMNS: u64 = 3;
/// start, parent.
pub const V2_STRUCTURE_COLUMNS: u64 = 2;
/// section id, relative path length, diameter.
pub const MITOCHONDRIA_POINT_COLUMNS: u64 = 3;
/// start, parent.
pub const MITOCHONDRIA_STRUCTURE_COLUMNS: u64 = 2;

pub fn v2_points(stage: RepairStage) -> String {
    format!("{NEURON1_GROUP}/{}/points", stage.name())
}

pub fn v2_structure(stage: RepairStage) -> String {
    format!("{NEURON1_GROUP}/structure/{}", stage.name())
}

/// Where the section table and its types live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionSource {
    /// One table with start, type and parent columns.
    Packed { path: &'static str },
    /// A start/parent table and a separate single-column type table, found
    /// by probing the candidates in order.
    Split {
        structure: String,
        types: &'static [&'static str],
    },
}

/// Resolved dataset paths for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub points: String,
    pub sections: SectionSource,
    /// Perimeters and mitochondria may be present.
    pub substructures: bool,
}

impl Layout {
    pub fn for_version(version: MorphologyVersion, stage: Option<RepairStage>) -> Layout {
        match version {
            MorphologyVersion::V1 | MorphologyVersion::V1_1 => Layout {
                points: V1_POINTS.to_string(),
                sections: SectionSource::Packed { path: V1_STRUCTURE },
                substructures: version == MorphologyVersion::V1_1,
            },
            MorphologyVersion::V2 => {
                let stage = stage.unwrap_or_default();
                Layout {
                    points: v2_points(stage),
                    sections: SectionSource::Split {
                        structure: v2_structure(stage),
                        types: &V2_TYPE_CANDIDATES,
                    },
                    substructures: false,
                }
            }
        }
    }
}
