//! Closed vocabularies shared by the resolver, the decoders and
//! [`Properties`](crate::Properties).

use std::fmt;

/// Scalar used for every decoded coordinate, diameter and perimeter.
#[cfg(not(feature = "double"))]
pub type FloatType = f32;
/// Scalar used for every decoded coordinate, diameter and perimeter.
#[cfg(feature = "double")]
pub type FloatType = f64;

/// `[x, y, z]` in file units.
pub type Point = [FloatType; 3];

/// On-disk schema revision of a morphology file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MorphologyVersion {
    /// Flat `/points` + `/structure`, no metadata.
    V1,
    /// v1 plus a `/metadata` group, perimeters and mitochondria.
    V1_1,
    /// Datasets nested under `/neuron1`, with repair stages.
    V2,
}

impl MorphologyVersion {
    /// `(schema name, major, minor)`.
    pub fn as_tuple(&self) -> (&'static str, u32, u32) {
        match self {
            MorphologyVersion::V1 => ("h5", 1, 0),
            MorphologyVersion::V1_1 => ("h5", 1, 1),
            MorphologyVersion::V2 => ("h5", 2, 0),
        }
    }
}

impl fmt::Display for MorphologyVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (name, major, minor) = self.as_tuple();
        write!(f, "{name} v{major}.{minor}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CellFamily {
    #[default]
    Neuron,
    Glia,
    Spine,
}

impl CellFamily {
    /// Maps the integer stored in the `cell_family` attribute.
    pub fn from_code(code: i64) -> Option<CellFamily> {
        match code {
            0 => Some(CellFamily::Neuron),
            1 => Some(CellFamily::Glia),
            2 => Some(CellFamily::Spine),
            _ => None,
        }
    }

    pub fn code(&self) -> i64 {
        match self {
            CellFamily::Neuron => 0,
            CellFamily::Glia => 1,
            CellFamily::Spine => 2,
        }
    }
}

impl fmt::Display for CellFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CellFamily::Neuron => "neuron",
            CellFamily::Glia => "glia",
            CellFamily::Spine => "spine",
        })
    }
}

/// Reconstruction pass a v2 file stores its geometry for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RepairStage {
    Raw,
    Unraveled,
    #[default]
    Repaired,
}

impl RepairStage {
    /// Order in which stages are probed when none is forced.
    pub const PROBE_ORDER: [RepairStage; 3] =
        [RepairStage::Repaired, RepairStage::Unraveled, RepairStage::Raw];

    /// Path component used under `/neuron1`.
    pub fn name(&self) -> &'static str {
        match self {
            RepairStage::Raw => "raw",
            RepairStage::Unraveled => "unraveled",
            RepairStage::Repaired => "repaired",
        }
    }
}

impl fmt::Display for RepairStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Neurite type of a section.
///
/// Glial cells reuse codes 2 and 3, see [`SectionType::PERIVASCULAR_PROCESS`]
/// and [`SectionType::GLIA_PROCESS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionType {
    Undefined,
    Soma,
    Axon,
    BasalDendrite,
    ApicalDendrite,
    /// User-defined type, code 5 to 19.
    Custom(u8),
}

impl SectionType {
    pub const PERIVASCULAR_PROCESS: SectionType = SectionType::Axon;
    pub const GLIA_PROCESS: SectionType = SectionType::BasalDendrite;

    const LAST_CUSTOM: i64 = 19;

    pub fn from_code(code: i64) -> Option<SectionType> {
        match code {
            0 => Some(SectionType::Undefined),
            1 => Some(SectionType::Soma),
            2 => Some(SectionType::Axon),
            3 => Some(SectionType::BasalDendrite),
            4 => Some(SectionType::ApicalDendrite),
            5..=Self::LAST_CUSTOM => Some(SectionType::Custom(code as u8)),
            _ => None,
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            SectionType::Undefined => 0,
            SectionType::Soma => 1,
            SectionType::Axon => 2,
            SectionType::BasalDendrite => 3,
            SectionType::ApicalDendrite => 4,
            SectionType::Custom(code) => *code,
        }
    }
}

/// One row of a section table: where the section's points start and which
/// section it hangs from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SectionRecord {
    pub start: i32,
    /// `-1` for a root.
    pub parent: i32,
}

impl SectionRecord {
    pub fn new(start: i32, parent: i32) -> Self {
        Self { start, parent }
    }

    pub fn is_root(&self) -> bool {
        self.parent == -1
    }

    /// Parent index, `None` for roots.
    pub fn parent_index(&self) -> Option<usize> {
        usize::try_from(self.parent).ok()
    }
}

/// Optional per-file tables that are gated by version and cell family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubstructureKind {
    Perimeters,
    Mitochondria,
}

impl fmt::Display for SubstructureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SubstructureKind::Perimeters => "perimeters",
            SubstructureKind::Mitochondria => "mitochondria",
        })
    }
}
