//! Benchmarks for decoding morphologies from the two HDF5 layouts and from memory.

use criterion::{criterion_group, criterion_main, Criterion};
use morphio::{decode, load_with_options, AttrValue, H5Store, LoadOptions, MemoryStore};
use morphio_format::writer::{FileWriter, WriterLayout};

const SECTIONS: usize = 2_000;
const POINTS_PER_SECTION: usize = 20;

/// A v2 cell: one soma section and a chain of dendrite sections.
fn cell_tables() -> (Vec<f64>, Vec<i32>, Vec<i32>) {
    let n_points = SECTIONS * POINTS_PER_SECTION;
    let points = (0..n_points)
        .flat_map(|i| [i as f64 * 0.1, (i % 7) as f64, (i % 11) as f64, 0.5])
        .collect();
    let structure = (0..SECTIONS)
        .flat_map(|s| [(s * POINTS_PER_SECTION) as i32, s as i32 - 1])
        .collect();
    let types = (0..SECTIONS).map(|s| if s == 0 { 1 } else { 3 }).collect();
    (points, structure, types)
}

fn v2_image(layout: WriterLayout) -> Vec<u8> {
    let (points, structure, types) = cell_tables();
    let n_points = (SECTIONS * POINTS_PER_SECTION) as u64;
    let mut writer = FileWriter::new(layout);
    writer
        .add_attribute("/neuron1", "version", vec![2u32, 0])
        .add_dataset("/neuron1/repaired/points", &[n_points, 4], points)
        .add_dataset("/neuron1/structure/repaired", &[SECTIONS as u64, 2], structure)
        .add_dataset("/neuron1/structure/type", &[SECTIONS as u64, 1], types);
    writer.finish().unwrap()
}

fn bench_decode_bytes(c: &mut Criterion) {
    let legacy = H5Store::from_bytes(v2_image(WriterLayout::Legacy), "legacy.h5").unwrap();
    let latest = H5Store::from_bytes(v2_image(WriterLayout::Latest), "latest.h5").unwrap();

    c.bench_function("decode_v2_legacy_layout", |b| b.iter(|| decode(&legacy).unwrap()));
    c.bench_function("decode_v2_latest_layout", |b| b.iter(|| decode(&latest).unwrap()));
}

fn bench_decode_memory(c: &mut Criterion) {
    let (points, structure, types) = cell_tables();
    let mut store = MemoryStore::new("memory");
    store
        .set_attr("/neuron1", "version", AttrValue::Int(vec![2, 0]))
        .put_f64(
            "/neuron1/repaired/points",
            &[(SECTIONS * POINTS_PER_SECTION) as u64, 4],
            points,
        )
        .put_i64(
            "/neuron1/structure/repaired",
            &[SECTIONS as u64, 2],
            structure.into_iter().map(i64::from).collect(),
        )
        .put_i64(
            "/neuron1/structure/type",
            &[SECTIONS as u64, 1],
            types.into_iter().map(i64::from).collect(),
        );

    c.bench_function("decode_v2_memory_store", |b| b.iter(|| decode(&store).unwrap()));
}

fn bench_load_file(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bench_cell.h5");
    std::fs::write(&path, v2_image(WriterLayout::Latest)).unwrap();

    let mapped = LoadOptions::new().with_mmap(true);
    let buffered = LoadOptions::new().with_mmap(false);
    c.bench_function("load_v2_mmap", |b| {
        b.iter(|| load_with_options(&path, &mapped).unwrap())
    });
    c.bench_function("load_v2_buffered", |b| {
        b.iter(|| load_with_options(&path, &buffered).unwrap())
    });
}

criterion_group!(benches, bench_decode_bytes, bench_decode_memory, bench_load_file);
criterion_main!(benches);
