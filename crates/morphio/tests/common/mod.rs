//! Morphology fixtures written with the format crate's image builder.
#![allow(dead_code)]

use std::path::PathBuf;

use morphio::{AttrValue, MemoryStore};
use morphio_format::writer::{FileWriter, WriterLayout};
use tempfile::TempDir;

pub const LAYOUTS: [WriterLayout; 2] = [WriterLayout::Legacy, WriterLayout::Latest];

/// Three points along x with diameter 2.
pub const POINTS: [f32; 12] = [0.0, 0.0, 0.0, 2.0, 1.0, 0.0, 0.0, 2.0, 2.0, 0.0, 0.0, 2.0];
/// Soma at 0, a basal dendrite starting at point 1.
pub const V1_STRUCTURE: [i32; 6] = [0, 1, -1, 1, 3, 0];
pub const PERIMETERS: [f32; 3] = [1.0, 1.5, 2.0];
/// Two mitochondrion points on section 1, one mitochondrial section.
pub const MITO_POINTS: [f32; 6] = [1.0, 0.25, 0.5, 1.0, 0.75, 0.5];
pub const MITO_STRUCTURE: [i32; 2] = [0, -1];

pub fn v1_writer(layout: WriterLayout) -> FileWriter {
    let mut writer = FileWriter::new(layout);
    writer
        .add_dataset("/points", &[3, 4], &POINTS[..])
        .add_dataset("/structure", &[2, 3], &V1_STRUCTURE[..]);
    writer
}

pub fn v1_1_writer(layout: WriterLayout, family: u32) -> FileWriter {
    let mut writer = v1_writer(layout);
    writer
        .add_attribute("/metadata", "version", vec![1u32, 1])
        .add_attribute("/metadata", "cell_family", vec![family]);
    writer
}

pub fn add_perimeters(writer: &mut FileWriter) {
    writer.add_dataset("/perimeters", &[3], &PERIMETERS[..]);
}

pub fn add_mitochondria(writer: &mut FileWriter) {
    writer
        .add_dataset("/organelles/mitochondria/points", &[2, 3], &MITO_POINTS[..])
        .add_compact_dataset("/organelles/mitochondria/structure", &[1, 2], &MITO_STRUCTURE[..]);
}

/// The single-axon v2 cell: three points along x with diameter 1, one root
/// section of type 2, all under `stage`.
pub fn v2_writer(layout: WriterLayout, stage: &str) -> FileWriter {
    let mut writer = FileWriter::new(layout);
    writer
        .add_attribute("/neuron1", "version", vec![2u32, 0])
        .add_dataset(
            &format!("/neuron1/{stage}/points"),
            &[3, 4],
            vec![0.0f64, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 2.0, 0.0, 0.0, 1.0],
        )
        .add_dataset(&format!("/neuron1/structure/{stage}"), &[1, 2], vec![0i32, -1])
        .add_dataset("/neuron1/structure/type", &[1, 1], vec![2i32]);
    writer
}

/// A v1.1 glia cell with every optional table, as a [`MemoryStore`].
pub fn glia_memory_store() -> MemoryStore {
    let widen = |v: &[f32]| v.iter().map(|x| f64::from(*x)).collect::<Vec<_>>();
    let ints = |v: &[i32]| v.iter().map(|x| i64::from(*x)).collect::<Vec<_>>();
    let mut store = MemoryStore::new("memory");
    store
        .set_attr("/metadata", "version", AttrValue::Int(vec![1, 1]))
        .set_attr("/metadata", "cell_family", AttrValue::Int(vec![1]))
        .put_f64("/points", &[3, 4], widen(&POINTS))
        .put_i64("/structure", &[2, 3], ints(&V1_STRUCTURE))
        .put_f64("/perimeters", &[3], widen(&PERIMETERS))
        .put_f64("/organelles/mitochondria/points", &[2, 3], widen(&MITO_POINTS))
        .put_i64("/organelles/mitochondria/structure", &[1, 2], ints(&MITO_STRUCTURE));
    store
}

/// Writes the image into a fresh temporary directory.
pub fn write_temp(writer: &FileWriter, name: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(name);
    std::fs::write(&path, writer.finish().unwrap()).unwrap();
    (dir, path)
}
