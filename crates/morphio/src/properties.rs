//! The decoded morphology, grouped into levels.
//!
//! [`Properties`] can only be obtained from a finished decode. The crate
//! fills a [`PropertiesBuilder`] step by step and [`PropertiesBuilder::finish`]
//! checks every cross-reference before handing out the frozen value, so a
//! `Properties` never holds a dangling parent, a start index past the end of
//! its point table, or mismatched column lengths.

use crate::error::{Error, Result};
use crate::resolver::Resolution;
use crate::types::{
    CellFamily, FloatType, MorphologyVersion, Point, RepairStage, SectionRecord, SectionType,
};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PointLevel {
    pub points: Vec<Point>,
    pub diameters: Vec<FloatType>,
    /// Empty, or one value per point.
    pub perimeters: Vec<FloatType>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SectionLevel {
    pub sections: Vec<SectionRecord>,
    pub section_types: Vec<SectionType>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MitochondriaPointLevel {
    /// Neurite section each mitochondrion point lies on.
    pub section_ids: Vec<u32>,
    pub relative_path_lengths: Vec<FloatType>,
    pub diameters: Vec<FloatType>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MitochondriaSectionLevel {
    /// Start indices refer to [`MitochondriaPointLevel`] rows.
    pub sections: Vec<SectionRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellLevel {
    pub version: MorphologyVersion,
    pub cell_family: CellFamily,
    /// Stage the geometry was read from; `None` for v1 files.
    pub repair_stage: Option<RepairStage>,
}

/// Everything read from one morphology file.
#[derive(Debug, Clone, PartialEq)]
pub struct Properties {
    point_level: PointLevel,
    section_level: SectionLevel,
    mito_point_level: MitochondriaPointLevel,
    mito_section_level: MitochondriaSectionLevel,
    cell_level: CellLevel,
}

impl Properties {
    pub fn point_level(&self) -> &PointLevel {
        &self.point_level
    }

    pub fn section_level(&self) -> &SectionLevel {
        &self.section_level
    }

    pub fn mitochondria_point_level(&self) -> &MitochondriaPointLevel {
        &self.mito_point_level
    }

    pub fn mitochondria_section_level(&self) -> &MitochondriaSectionLevel {
        &self.mito_section_level
    }

    pub fn cell_level(&self) -> &CellLevel {
        &self.cell_level
    }

    pub fn points(&self) -> &[Point] {
        &self.point_level.points
    }

    pub fn diameters(&self) -> &[FloatType] {
        &self.point_level.diameters
    }

    pub fn perimeters(&self) -> &[FloatType] {
        &self.point_level.perimeters
    }

    pub fn sections(&self) -> &[SectionRecord] {
        &self.section_level.sections
    }

    pub fn section_types(&self) -> &[SectionType] {
        &self.section_level.section_types
    }

    pub fn version(&self) -> MorphologyVersion {
        self.cell_level.version
    }

    pub fn cell_family(&self) -> CellFamily {
        self.cell_level.cell_family
    }

    pub fn repair_stage(&self) -> Option<RepairStage> {
        self.cell_level.repair_stage
    }

    /// `true` when either mitochondria table decoded to at least one row.
    pub fn has_mitochondria(&self) -> bool {
        !self.mito_point_level.section_ids.is_empty()
            || !self.mito_section_level.sections.is_empty()
    }

    /// Splits into the level structs.
    pub fn into_levels(
        self,
    ) -> (
        PointLevel,
        SectionLevel,
        MitochondriaPointLevel,
        MitochondriaSectionLevel,
        CellLevel,
    ) {
        (
            self.point_level,
            self.section_level,
            self.mito_point_level,
            self.mito_section_level,
            self.cell_level,
        )
    }
}

/// Single-owner accumulator for one decode pass.
#[derive(Debug)]
pub(crate) struct PropertiesBuilder {
    pub point_level: PointLevel,
    pub section_level: SectionLevel,
    pub mito_point_level: MitochondriaPointLevel,
    pub mito_section_level: MitochondriaSectionLevel,
    cell_level: CellLevel,
}

impl PropertiesBuilder {
    pub fn new(resolution: &Resolution) -> Self {
        Self {
            point_level: PointLevel::default(),
            section_level: SectionLevel::default(),
            mito_point_level: MitochondriaPointLevel::default(),
            mito_section_level: MitochondriaSectionLevel::default(),
            cell_level: CellLevel {
                version: resolution.version,
                cell_family: resolution.family,
                repair_stage: resolution.stage,
            },
        }
    }

    /// Validates every cross-reference and freezes the result.
    pub fn finish(self, file: &str) -> Result<Properties> {
        let invalid = |table: &'static str, row: usize, reason: String| Error::InvalidStructure {
            file: file.to_string(),
            table,
            row,
            reason,
        };

        let points = &self.point_level;
        let n_points = points.points.len();
        if points.diameters.len() != n_points {
            return Err(invalid(
                "diameters",
                points.diameters.len().min(n_points),
                format!("{} diameters for {n_points} points", points.diameters.len()),
            ));
        }
        if !points.perimeters.is_empty() && points.perimeters.len() != n_points {
            return Err(invalid(
                "perimeters",
                points.perimeters.len().min(n_points),
                format!("{} perimeters for {n_points} points", points.perimeters.len()),
            ));
        }

        let sections = &self.section_level;
        if sections.section_types.len() != sections.sections.len() {
            return Err(invalid(
                "section types",
                sections.section_types.len().min(sections.sections.len()),
                format!(
                    "{} types for {} sections",
                    sections.section_types.len(),
                    sections.sections.len()
                ),
            ));
        }
        check_forest(&sections.sections, n_points)
            .map_err(|(row, reason)| invalid("section structure", row, reason))?;

        let mito = &self.mito_point_level;
        let n_mito = mito.section_ids.len();
        if mito.relative_path_lengths.len() != n_mito || mito.diameters.len() != n_mito {
            return Err(invalid(
                "mitochondria points",
                0,
                "columns have different lengths".to_string(),
            ));
        }
        if let Some((row, id)) = mito
            .section_ids
            .iter()
            .enumerate()
            .find(|(_, id)| **id as usize >= sections.sections.len())
        {
            return Err(invalid(
                "mitochondria points",
                row,
                format!(
                    "section id {id} out of range for {} sections",
                    sections.sections.len()
                ),
            ));
        }
        check_forest(&self.mito_section_level.sections, n_mito)
            .map_err(|(row, reason)| invalid("mitochondria structure", row, reason))?;

        Ok(Properties {
            point_level: self.point_level,
            section_level: self.section_level,
            mito_point_level: self.mito_point_level,
            mito_section_level: self.mito_section_level,
            cell_level: self.cell_level,
        })
    }
}

/// Every start lies within `0..=point_count` and every parent is a root
/// marker or an earlier row.
fn check_forest(
    records: &[SectionRecord],
    point_count: usize,
) -> std::result::Result<(), (usize, String)> {
    for (row, record) in records.iter().enumerate() {
        if record.start < 0 || record.start as usize > point_count {
            return Err((
                row,
                format!("start {} outside 0..={point_count}", record.start),
            ));
        }
        match record.parent_index() {
            None if record.parent != -1 => {
                return Err((row, format!("invalid parent {}", record.parent)))
            }
            Some(parent) if parent >= row => {
                return Err((row, format!("parent {parent} does not precede its child")))
            }
            _ => {}
        }
    }
    Ok(())
}
