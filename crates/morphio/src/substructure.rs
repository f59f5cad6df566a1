//! Perimeters and mitochondria, present only in v1.1 files.
//!
//! Each table is optional for neurons and mandatory for glia; that rule lives
//! in [`apply_family_policy`] and nowhere else.

use crate::error::{Error, Result};
use crate::layout::{
    MITOCHONDRIA_GROUP, MITOCHONDRIA_POINTS, MITOCHONDRIA_POINT_COLUMNS, MITOCHONDRIA_STRUCTURE,
    MITOCHONDRIA_STRUCTURE_COLUMNS, PERIMETERS,
};
use crate::properties::{MitochondriaPointLevel, MitochondriaSectionLevel};
use crate::store::TabularStore;
use crate::table::{read_f64_table, read_i64_table, Shape, Table, TableError};
use crate::types::{CellFamily, FloatType, SectionRecord, SubstructureKind};

/// Glia cannot do without a sub-structure table; for other families a
/// failed read just leaves it empty.
pub(crate) fn apply_family_policy<T>(
    outcome: std::result::Result<T, TableError>,
    family: CellFamily,
    kind: SubstructureKind,
    path: &str,
    file: &str,
) -> Result<Option<T>> {
    match outcome {
        Ok(value) => Ok(Some(value)),
        Err(reason) if family == CellFamily::Glia => Err(Error::MissingMandatorySubstructure {
            file: file.to_string(),
            kind,
            reason: format!("{path}: {reason}"),
        }),
        Err(reason) => {
            tracing::debug!(file, path, %kind, %reason, %family, "sub-structure unavailable");
            Ok(None)
        }
    }
}

pub(crate) fn read_perimeters<S: TabularStore + ?Sized>(
    store: &S,
    family: CellFamily,
) -> Result<Vec<FloatType>> {
    let outcome = read_f64_table(store, PERIMETERS, Shape::Vector);
    let table = apply_family_policy(
        outcome,
        family,
        SubstructureKind::Perimeters,
        PERIMETERS,
        store.location(),
    )?;
    Ok(table
        .map(|t| t.column(0).map(|v| v as FloatType).collect())
        .unwrap_or_default())
}

pub(crate) fn read_mitochondria<S: TabularStore + ?Sized>(
    store: &S,
    family: CellFamily,
) -> Result<(MitochondriaPointLevel, MitochondriaSectionLevel)> {
    let file = store.location();
    let points = in_mitochondria_group(store, || {
        read_f64_table(store, MITOCHONDRIA_POINTS, Shape::Columns(MITOCHONDRIA_POINT_COLUMNS))
    });
    let points = apply_family_policy(
        points,
        family,
        SubstructureKind::Mitochondria,
        MITOCHONDRIA_POINTS,
        file,
    )?;

    let structure = in_mitochondria_group(store, || {
        read_i64_table(
            store,
            MITOCHONDRIA_STRUCTURE,
            Shape::Columns(MITOCHONDRIA_STRUCTURE_COLUMNS),
        )
    });
    let structure = apply_family_policy(
        structure,
        family,
        SubstructureKind::Mitochondria,
        MITOCHONDRIA_STRUCTURE,
        file,
    )?;

    // Structure rows index the point table; without it they are orphans.
    let structure = match (&points, structure) {
        (None, Some(table)) => {
            tracing::debug!(
                file,
                path = MITOCHONDRIA_STRUCTURE,
                rows = table.len(),
                "dropping mitochondria structure without points"
            );
            None
        }
        (_, structure) => structure,
    };

    let point_level = match points {
        Some(table) => mitochondria_points(file, &table)?,
        None => MitochondriaPointLevel::default(),
    };
    let section_level = match structure {
        Some(table) => MitochondriaSectionLevel {
            sections: table
                .rows()
                .enumerate()
                .map(|(row, r)| {
                    Ok(SectionRecord::new(
                        mito_index(file, row, r[0])?,
                        mito_index(file, row, r[1])?,
                    ))
                })
                .collect::<Result<Vec<_>>>()?,
        },
        None => MitochondriaSectionLevel::default(),
    };
    Ok((point_level, section_level))
}

/// A missing organelles group reads as an absent table.
fn in_mitochondria_group<S, T>(
    store: &S,
    read: impl FnOnce() -> std::result::Result<T, TableError>,
) -> std::result::Result<T, TableError>
where
    S: TabularStore + ?Sized,
{
    if !store.has_group(MITOCHONDRIA_GROUP)? {
        return Err(TableError::Absent);
    }
    read()
}

fn mitochondria_points(file: &str, table: &Table<f64>) -> Result<MitochondriaPointLevel> {
    let mut level = MitochondriaPointLevel {
        section_ids: Vec::with_capacity(table.len()),
        relative_path_lengths: Vec::with_capacity(table.len()),
        diameters: Vec::with_capacity(table.len()),
    };
    for (row, r) in table.rows().enumerate() {
        let id = r[0];
        if id.fract() != 0.0 || id < 0.0 || id > f64::from(u32::MAX) {
            return Err(Error::InvalidStructure {
                file: file.to_string(),
                table: "mitochondria points",
                row,
                reason: format!("section id {id} is not a section index"),
            });
        }
        level.section_ids.push(id as u32);
        level.relative_path_lengths.push(r[1] as FloatType);
        level.diameters.push(r[2] as FloatType);
    }
    Ok(level)
}

fn mito_index(file: &str, row: usize, value: i64) -> Result<i32> {
    i32::try_from(value).map_err(|_| Error::InvalidStructure {
        file: file.to_string(),
        table: "mitochondria structure",
        row,
        reason: format!("{value} does not fit a 32-bit index"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn with_mitochondria() -> MemoryStore {
        let mut store = MemoryStore::new("mito.h5");
        store
            .put_f64(
                "/organelles/mitochondria/points",
                &[3, 3],
                vec![0.0, 0.1, 0.5, 0.0, 0.2, 0.5, 1.0, 0.3, 0.4],
            )
            .put_i64("/organelles/mitochondria/structure", &[2, 2], vec![0, -1, 2, 0]);
        store
    }

    #[test]
    fn policy_by_family() {
        let absent = || Err::<(), _>(TableError::Absent);
        assert!(matches!(
            apply_family_policy(absent(), CellFamily::Neuron, SubstructureKind::Perimeters, "/p", "f"),
            Ok(None)
        ));
        assert!(matches!(
            apply_family_policy(absent(), CellFamily::Spine, SubstructureKind::Perimeters, "/p", "f"),
            Ok(None)
        ));
        assert!(matches!(
            apply_family_policy(absent(), CellFamily::Glia, SubstructureKind::Perimeters, "/p", "f"),
            Err(Error::MissingMandatorySubstructure { kind: SubstructureKind::Perimeters, .. })
        ));
        assert!(matches!(
            apply_family_policy(Ok(7), CellFamily::Glia, SubstructureKind::Mitochondria, "/m", "f"),
            Ok(Some(7))
        ));
    }

    #[test]
    fn perimeters() {
        let mut store = MemoryStore::new("p.h5");
        assert!(read_perimeters(&store, CellFamily::Neuron).unwrap().is_empty());
        assert!(read_perimeters(&store, CellFamily::Glia).is_err());

        store.put_f64("/perimeters", &[2], vec![1.0, 2.0]);
        assert_eq!(read_perimeters(&store, CellFamily::Glia).unwrap(), vec![1.0, 2.0]);
    }

    #[test]
    fn wrong_rank_perimeters() {
        let mut store = MemoryStore::new("p.h5");
        store.put_f64("/perimeters", &[2, 1], vec![1.0, 2.0]);
        assert!(read_perimeters(&store, CellFamily::Neuron).unwrap().is_empty());
        assert!(matches!(
            read_perimeters(&store, CellFamily::Glia),
            Err(Error::MissingMandatorySubstructure { reason, .. }) if reason.starts_with("/perimeters")
        ));
    }

    #[test]
    fn mitochondria_tables() {
        let (points, sections) = read_mitochondria(&with_mitochondria(), CellFamily::Glia).unwrap();
        assert_eq!(points.section_ids, vec![0, 0, 1]);
        assert_eq!(points.diameters.len(), 3);
        assert_eq!(
            sections.sections,
            vec![SectionRecord::new(0, -1), SectionRecord::new(2, 0)]
        );
    }

    #[test]
    fn absent_group() {
        let store = MemoryStore::new("none.h5");
        let (points, sections) = read_mitochondria(&store, CellFamily::Neuron).unwrap();
        assert!(points.section_ids.is_empty());
        assert!(sections.sections.is_empty());
        assert!(matches!(
            read_mitochondria(&store, CellFamily::Glia),
            Err(Error::MissingMandatorySubstructure { kind: SubstructureKind::Mitochondria, .. })
        ));
    }

    #[test]
    fn reads_are_independent() {
        let mut store = MemoryStore::new("half.h5");
        store.put_f64("/organelles/mitochondria/points", &[1, 3], vec![0.0, 0.1, 0.5]);
        let (points, sections) = read_mitochondria(&store, CellFamily::Neuron).unwrap();
        assert_eq!(points.section_ids, vec![0]);
        assert!(sections.sections.is_empty());
    }

    #[test]
    fn structure_without_points_is_dropped() {
        let mut store = MemoryStore::new("orphan.h5");
        store
            .put_f64("/organelles/mitochondria/points", &[1, 2], vec![0.0, 0.1])
            .put_i64("/organelles/mitochondria/structure", &[2, 2], vec![0, -1, 3, 0]);
        let (points, sections) = read_mitochondria(&store, CellFamily::Neuron).unwrap();
        assert!(points.section_ids.is_empty());
        assert!(sections.sections.is_empty());
        assert!(matches!(
            read_mitochondria(&store, CellFamily::Glia),
            Err(Error::MissingMandatorySubstructure { reason, .. })
                if reason.starts_with("/organelles/mitochondria/points")
        ));
    }

    #[test]
    fn fractional_section_id() {
        let mut store = MemoryStore::new("bad.h5");
        store
            .put_f64("/organelles/mitochondria/points", &[1, 3], vec![0.5, 0.1, 0.5])
            .put_i64("/organelles/mitochondria/structure", &[1, 2], vec![0, -1]);
        assert!(matches!(
            read_mitochondria(&store, CellFamily::Neuron),
            Err(Error::InvalidStructure { table: "mitochondria points", row: 0, .. })
        ));
    }
}
