//! End-to-end loads of morphology files written to disk.

mod common;

use common::*;
use morphio::{
    load, load_with_options, CellFamily, Error, LoadOptions, MorphologyVersion, RepairStage,
    SectionRecord, SectionType, SubstructureKind,
};
use morphio_format::writer::WriterLayout;

// ---------------------------------------------------------------------------
// Opening
// ---------------------------------------------------------------------------

#[test]
fn nonexistent_path_is_io() {
    let err = load("/definitely/not/here/cell.h5").unwrap_err();
    assert!(matches!(err, Error::Io { .. }));
    assert_eq!(err.file(), "/definitely/not/here/cell.h5");
}

#[test]
fn text_file_is_not_a_container() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cell.swc");
    std::fs::write(&path, "1 1 0 0 0 1 -1\n".repeat(100)).unwrap();
    assert!(matches!(load(&path), Err(Error::Container { .. })));
}

#[test]
fn truncated_file_errors_without_panicking() {
    for layout in LAYOUTS {
        let mut bytes = v1_writer(layout).finish().unwrap();
        bytes.truncate(bytes.len() / 2);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cut.h5");
        std::fs::write(&path, bytes).unwrap();
        assert!(load(&path).is_err());
    }
}

#[test]
fn mmap_and_buffered_agree() {
    let (_dir, path) = write_temp(&v1_1_writer(WriterLayout::Legacy, 0), "cell.h5");
    let mapped = load_with_options(&path, &LoadOptions::new().with_mmap(true)).unwrap();
    let buffered = load_with_options(&path, &LoadOptions::new().with_mmap(false)).unwrap();
    assert_eq!(mapped, buffered);
}

// ---------------------------------------------------------------------------
// v1
// ---------------------------------------------------------------------------

#[test]
fn v1_columns_line_up() {
    for layout in LAYOUTS {
        let (_dir, path) = write_temp(&v1_writer(layout), "v1.h5");
        let cell = load(&path).unwrap();
        assert_eq!(cell.version(), MorphologyVersion::V1);
        assert_eq!(cell.cell_family(), CellFamily::Neuron);
        assert_eq!(cell.repair_stage(), None);
        assert_eq!(cell.points().len(), cell.diameters().len());
        assert_eq!(cell.sections().len(), cell.section_types().len());
        assert_eq!(cell.points()[2], [2.0, 0.0, 0.0]);
        assert_eq!(cell.diameters(), &[2.0, 2.0, 2.0]);
        assert_eq!(
            cell.sections(),
            &[SectionRecord::new(0, -1), SectionRecord::new(1, 0)]
        );
        assert_eq!(
            cell.section_types(),
            &[SectionType::Soma, SectionType::BasalDendrite]
        );
        assert!(cell.perimeters().is_empty());
    }
}

#[test]
fn parents_precede_children() {
    let (_dir, path) = write_temp(&v1_writer(WriterLayout::Latest), "v1.h5");
    let cell = load(&path).unwrap();
    for (i, section) in cell.sections().iter().enumerate() {
        if let Some(parent) = section.parent_index() {
            assert!(parent < i);
        }
    }
}

#[test]
fn two_column_structure_is_a_shape_mismatch() {
    let mut writer = v1_writer(WriterLayout::Legacy);
    writer.add_dataset("/structure", &[2, 2], vec![0i32, -1, 1, 0]);
    let (_dir, path) = write_temp(&writer, "bad.h5");
    match load(&path) {
        Err(Error::ShapeMismatch { dataset, file, actual, .. }) => {
            assert_eq!(dataset, "/structure");
            assert_eq!(file, path.display().to_string());
            assert_eq!(actual, vec![2, 2]);
        }
        other => panic!("expected a shape mismatch, got {other:?}"),
    }
}

#[test]
fn unrecognised_layout() {
    let mut writer = morphio_format::writer::FileWriter::new(WriterLayout::Latest);
    writer.add_dataset("/data", &[2], vec![1.0f64, 2.0]);
    let (_dir, path) = write_temp(&writer, "other.h5");
    assert!(matches!(load(&path), Err(Error::UnknownFormat { .. })));
}

// ---------------------------------------------------------------------------
// v1.1
// ---------------------------------------------------------------------------

#[test]
fn glia_with_all_substructures() {
    for layout in LAYOUTS {
        let mut writer = v1_1_writer(layout, 1);
        add_perimeters(&mut writer);
        add_mitochondria(&mut writer);
        let (_dir, path) = write_temp(&writer, "glia.h5");
        let cell = load(&path).unwrap();
        assert_eq!(cell.version(), MorphologyVersion::V1_1);
        assert_eq!(cell.cell_family(), CellFamily::Glia);
        assert_eq!(cell.perimeters(), &[1.0, 1.5, 2.0]);
        let mito = cell.mitochondria_point_level();
        assert_eq!(mito.section_ids, vec![1, 1]);
        assert_eq!(mito.relative_path_lengths, vec![0.25, 0.75]);
        assert_eq!(
            cell.mitochondria_section_level().sections,
            vec![SectionRecord::new(0, -1)]
        );
    }
}

#[test]
fn glia_without_perimeters_fails() {
    let mut writer = v1_1_writer(WriterLayout::Legacy, 1);
    add_mitochondria(&mut writer);
    let (_dir, path) = write_temp(&writer, "glia.h5");
    assert!(matches!(
        load(&path),
        Err(Error::MissingMandatorySubstructure { kind: SubstructureKind::Perimeters, .. })
    ));
}

#[test]
fn glia_without_mitochondria_fails() {
    let mut writer = v1_1_writer(WriterLayout::Latest, 1);
    add_perimeters(&mut writer);
    let (_dir, path) = write_temp(&writer, "glia.h5");
    assert!(matches!(
        load(&path),
        Err(Error::MissingMandatorySubstructure { kind: SubstructureKind::Mitochondria, .. })
    ));
}

#[test]
fn neuron_without_substructures_decodes() {
    let (_dir, path) = write_temp(&v1_1_writer(WriterLayout::Legacy, 0), "neuron.h5");
    let cell = load(&path).unwrap();
    assert_eq!(cell.version(), MorphologyVersion::V1_1);
    assert_eq!(cell.cell_family(), CellFamily::Neuron);
    assert!(cell.perimeters().is_empty());
    assert!(!cell.has_mitochondria());
}

#[test]
fn unknown_family_code() {
    let (_dir, path) = write_temp(&v1_1_writer(WriterLayout::Latest, 5), "odd.h5");
    assert!(matches!(load(&path), Err(Error::Metadata { .. })));
}

#[test]
fn mitochondria_on_missing_section() {
    let mut writer = v1_1_writer(WriterLayout::Legacy, 0);
    writer
        .add_dataset("/organelles/mitochondria/points", &[1, 3], vec![7.0f32, 0.5, 0.5])
        .add_dataset("/organelles/mitochondria/structure", &[1, 2], vec![0i32, -1]);
    let (_dir, path) = write_temp(&writer, "mito.h5");
    assert!(matches!(
        load(&path),
        Err(Error::InvalidStructure { table: "mitochondria points", row: 0, .. })
    ));
}

#[test]
fn neuron_with_misshaped_mitochondria_points_decodes() {
    let mut writer = v1_1_writer(WriterLayout::Latest, 0);
    writer
        .add_dataset("/organelles/mitochondria/points", &[1, 2], vec![0.0f32, 0.5])
        .add_dataset("/organelles/mitochondria/structure", &[2, 2], vec![0i32, -1, 3, 0]);
    let (_dir, path) = write_temp(&writer, "half_mito.h5");
    let cell = load(&path).unwrap();
    assert!(!cell.has_mitochondria());
    assert!(cell.mitochondria_section_level().sections.is_empty());
    assert_eq!(cell.sections().len(), 2);
}

#[test]
fn mitochondria_parent_must_precede_child() {
    let mut writer = v1_1_writer(WriterLayout::Legacy, 1);
    add_perimeters(&mut writer);
    writer
        .add_dataset("/organelles/mitochondria/points", &[2, 3], &MITO_POINTS[..])
        .add_dataset("/organelles/mitochondria/structure", &[2, 2], vec![0i32, 1, 1, -1]);
    let (_dir, path) = write_temp(&writer, "mito_forward.h5");
    assert!(matches!(
        load(&path),
        Err(Error::InvalidStructure { table: "mitochondria structure", row: 0, .. })
    ));
}

#[test]
fn mitochondria_start_past_points() {
    let mut writer = v1_1_writer(WriterLayout::Latest, 1);
    add_perimeters(&mut writer);
    writer
        .add_dataset("/organelles/mitochondria/points", &[2, 3], &MITO_POINTS[..])
        .add_dataset("/organelles/mitochondria/structure", &[2, 2], vec![0i32, -1, 3, 0]);
    let (_dir, path) = write_temp(&writer, "mito_start.h5");
    assert!(matches!(
        load(&path),
        Err(Error::InvalidStructure { table: "mitochondria structure", row: 1, .. })
    ));
}

// ---------------------------------------------------------------------------
// v2
// ---------------------------------------------------------------------------

#[test]
fn v2_round_trip() {
    for layout in LAYOUTS {
        let (_dir, path) = write_temp(&v2_writer(layout, "repaired"), "v2.h5");
        let cell = load(&path).unwrap();
        assert_eq!(cell.version(), MorphologyVersion::V2);
        assert_eq!(cell.version().as_tuple(), ("h5", 2, 0));
        assert_eq!(cell.repair_stage(), Some(RepairStage::Repaired));
        assert_eq!(cell.points(), &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]]);
        assert_eq!(cell.diameters(), &[1.0, 1.0, 1.0]);
        assert_eq!(cell.sections(), &[SectionRecord::new(0, -1)]);
        assert_eq!(cell.section_types(), &[SectionType::Axon]);
        assert!(cell.perimeters().is_empty());
        assert!(!cell.has_mitochondria());
    }
}

#[test]
fn v2_raw_only_selects_raw() {
    let (_dir, path) = write_temp(&v2_writer(WriterLayout::Latest, "raw"), "raw.h5");
    let cell = load(&path).unwrap();
    assert_eq!(cell.repair_stage(), Some(RepairStage::Raw));
    assert_eq!(cell.points().len(), 3);
}

#[test]
fn v2_prefers_repaired_over_raw() {
    let mut writer = v2_writer(WriterLayout::Legacy, "raw");
    writer
        .add_dataset("/neuron1/repaired/points", &[1, 4], vec![5.0f32, 5.0, 5.0, 3.0])
        .add_dataset("/neuron1/structure/repaired", &[1, 2], vec![0i32, -1]);
    let (_dir, path) = write_temp(&writer, "both.h5");
    let cell = load(&path).unwrap();
    assert_eq!(cell.repair_stage(), Some(RepairStage::Repaired));
    assert_eq!(cell.points(), &[[5.0, 5.0, 5.0]]);

    let forced = load_with_options(&path, &LoadOptions::new().with_repair_stage(RepairStage::Raw))
        .unwrap();
    assert_eq!(forced.repair_stage(), Some(RepairStage::Raw));
    assert_eq!(forced.points().len(), 3);
}

#[test]
fn v2_without_version_attribute() {
    let mut writer = morphio_format::writer::FileWriter::new(WriterLayout::Latest);
    writer
        .add_dataset("/neuron1/unraveled/points", &[1, 4], vec![0.0f32, 0.0, 0.0, 1.0])
        .add_dataset("/neuron1/structure/unraveled", &[1, 2], vec![0i32, -1])
        .add_dataset("/neuron1/structure/type", &[1, 1], vec![1i32]);
    let (_dir, path) = write_temp(&writer, "legacy_v2.h5");
    let cell = load(&path).unwrap();
    assert_eq!(cell.version(), MorphologyVersion::V2);
    assert_eq!(cell.repair_stage(), Some(RepairStage::Unraveled));
    assert_eq!(cell.section_types(), &[SectionType::Soma]);
}

#[test]
fn v2_historical_sectiontype_name() {
    let mut writer = morphio_format::writer::FileWriter::new(WriterLayout::Legacy);
    writer
        .add_attribute("/neuron1", "version", vec![2u32, 0])
        .add_dataset("/neuron1/repaired/points", &[2, 4], vec![0.0f32, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0])
        .add_dataset("/neuron1/structure/repaired", &[1, 2], vec![0i32, -1])
        .add_dataset("/neuron1/structure/sectiontype", &[1, 1], vec![4i32]);
    let (_dir, path) = write_temp(&writer, "sectiontype.h5");
    let cell = load(&path).unwrap();
    assert_eq!(cell.section_types(), &[SectionType::ApicalDendrite]);
}

#[test]
fn v2_forced_missing_stage() {
    let (_dir, path) = write_temp(&v2_writer(WriterLayout::Latest, "repaired"), "v2.h5");
    let opts = LoadOptions::new().with_repair_stage(RepairStage::Unraveled);
    match load_with_options(&path, &opts) {
        Err(Error::MissingDataset { dataset, stage, .. }) => {
            assert_eq!(dataset, "/neuron1/unraveled/points");
            assert_eq!(stage, Some(RepairStage::Unraveled));
        }
        other => panic!("expected a missing dataset, got {other:?}"),
    }
}

#[test]
fn v2_custom_section_type() {
    let mut writer = v2_writer(WriterLayout::Latest, "repaired");
    writer.add_dataset("/neuron1/structure/type", &[1, 1], vec![12i32]);
    let (_dir, path) = write_temp(&writer, "custom.h5");
    assert_eq!(load(&path).unwrap().section_types(), &[SectionType::Custom(12)]);

    writer.add_dataset("/neuron1/structure/type", &[1, 1], vec![20i32]);
    let (_dir, path) = write_temp(&writer, "unsupported.h5");
    assert!(matches!(
        load(&path),
        Err(Error::UnsupportedSectionType { section: 0, code: 20, .. })
    ));
}
