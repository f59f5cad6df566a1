//! Section table and section types.
//!
//! v1 files pack `start, type, parent` into one table. v2 files keep
//! `start, parent` per stage and a single type column shared by all stages.

use crate::error::{Error, Result};
use crate::layout::{SectionSource, V1_STRUCTURE_COLUMNS, V2_STRUCTURE_COLUMNS};
use crate::properties::SectionLevel;
use crate::store::TabularStore;
use crate::table::{read_i64_table, Shape};
use crate::types::{RepairStage, SectionRecord, SectionType};

pub(crate) fn read_sections<S: TabularStore + ?Sized>(
    store: &S,
    source: &SectionSource,
    stage: Option<RepairStage>,
) -> Result<SectionLevel> {
    let file = store.location();
    let level = match source {
        SectionSource::Packed { path } => {
            let table = read_i64_table(store, path, Shape::Columns(V1_STRUCTURE_COLUMNS))
                .map_err(|e| e.into_required(file, path, None))?;
            let mut level = SectionLevel {
                sections: Vec::with_capacity(table.len()),
                section_types: Vec::with_capacity(table.len()),
            };
            for (i, row) in table.rows().enumerate() {
                level.sections.push(SectionRecord::new(
                    index(file, "section structure", i, row[0])?,
                    index(file, "section structure", i, row[2])?,
                ));
                level.section_types.push(section_type(file, i, row[1])?);
            }
            level
        }
        SectionSource::Split { structure, types } => {
            let table = read_i64_table(store, structure, Shape::Columns(V2_STRUCTURE_COLUMNS))
                .map_err(|e| e.into_required(file, structure, stage))?;
            let sections = table
                .rows()
                .enumerate()
                .map(|(i, row)| {
                    Ok(SectionRecord::new(
                        index(file, "section structure", i, row[0])?,
                        index(file, "section structure", i, row[1])?,
                    ))
                })
                .collect::<Result<Vec<_>>>()?;
            let section_types = read_type_column(store, types, sections.len(), stage)?;
            SectionLevel {
                sections,
                section_types,
            }
        }
    };
    tracing::trace!(file, sections = level.sections.len(), "decoded sections");
    Ok(level)
}

/// Reads the first type table among `candidates` that exists; it must be
/// `[count, 1]`.
fn read_type_column<S: TabularStore + ?Sized>(
    store: &S,
    candidates: &[&str],
    count: usize,
    stage: Option<RepairStage>,
) -> Result<Vec<SectionType>> {
    let file = store.location();
    let mut found = None;
    for path in candidates {
        let info = store
            .dataset(path)
            .map_err(|e| Error::store(file, path, e))?;
        if info.is_some() {
            found = Some(*path);
            break;
        }
    }
    let path = found.ok_or_else(|| Error::MissingDataset {
        file: file.to_string(),
        dataset: candidates.first().copied().unwrap_or_default().to_string(),
        stage,
    })?;

    let table = read_i64_table(store, path, Shape::Columns(1))
        .map_err(|e| e.into_required(file, path, stage))?;
    if table.len() != count {
        return Err(Error::ShapeMismatch {
            file: file.to_string(),
            dataset: path.to_string(),
            expected: format!("[{count}, 1]"),
            actual: vec![table.len() as u64, 1],
        });
    }
    table
        .column(0)
        .enumerate()
        .map(|(i, code)| section_type(file, i, code))
        .collect()
}

fn index(file: &str, table: &'static str, row: usize, value: i64) -> Result<i32> {
    i32::try_from(value).map_err(|_| Error::InvalidStructure {
        file: file.to_string(),
        table,
        row,
        reason: format!("{value} does not fit a 32-bit index"),
    })
}

fn section_type(file: &str, section: usize, code: i64) -> Result<SectionType> {
    SectionType::from_code(code).ok_or_else(|| Error::UnsupportedSectionType {
        file: file.to_string(),
        section,
        code,
    })
}
