//! Morphology files written by h5py decode the same as the in-memory store.
//!
//! Tests are skipped if python3 or h5py are not available.

mod common;

use std::fmt::Display;
use std::path::Path;
use std::process::Command;

use common::*;
use morphio::{decode, load, AttrValue, MemoryStore, MorphologyVersion, RepairStage};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// h5py's default file layout first, then the newest one.
const LIBVERS: [&str; 2] = ["earliest", "latest"];

fn python_available() -> bool {
    Command::new("python3")
        .args(["-c", "import h5py, numpy; print(h5py.__version__)"])
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

macro_rules! skip_if_no_python {
    () => {
        if !python_available() {
            eprintln!("SKIP: python3 with h5py not available");
            return;
        }
    };
}

/// Runs `body` inside `with h5py.File(path, "w", libver=...) as f:`.
fn write_with_h5py(path: &Path, libver: &str, body: &str) {
    let indented: String = body
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| format!("    {}\n", l.trim()))
        .collect();
    let script = format!(
        "import h5py, numpy as np\nwith h5py.File(r\"{}\", \"w\", libver=\"{libver}\") as f:\n{indented}",
        path.display()
    );
    let output = Command::new("python3")
        .args(["-c", &script])
        .output()
        .expect("failed to run python3");
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!("Python script failed:\nSCRIPT:\n{script}\nSTDERR: {stderr}");
    }
}

fn py_list<T: Display>(values: &[T]) -> String {
    let items: Vec<String> = values.iter().map(|v| v.to_string()).collect();
    format!("[{}]", items.join(", "))
}

const V2_POINTS: [f32; 12] = [0.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 2.0, 0.0, 0.0, 1.0];

fn widen(values: &[f32]) -> Vec<f64> {
    values.iter().map(|v| f64::from(*v)).collect()
}

// ---------------------------------------------------------------------------
// v1
// ---------------------------------------------------------------------------

#[test]
fn h5py_v1_matches_memory() {
    skip_if_no_python!();
    let mut memory = MemoryStore::new("memory");
    memory
        .put_f64("/points", &[3, 4], widen(&POINTS))
        .put_i64("/structure", &[2, 3], V1_STRUCTURE.iter().map(|v| i64::from(*v)).collect());
    let expected = decode(&memory).unwrap();

    for libver in LIBVERS {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("v1.h5");
        write_with_h5py(
            &path,
            libver,
            &format!(
                r#"
                f.create_dataset("points", data=np.array({}, dtype=np.float32).reshape(3, 4))
                f.create_dataset("structure", data=np.array({}, dtype=np.int32).reshape(2, 3))
                "#,
                py_list(&POINTS),
                py_list(&V1_STRUCTURE)
            ),
        );
        let cell = load(&path).unwrap();
        assert_eq!(cell.version(), MorphologyVersion::V1, "{libver}");
        assert_eq!(cell, expected, "{libver}");
    }
}

// ---------------------------------------------------------------------------
// v1.1
// ---------------------------------------------------------------------------

#[test]
fn h5py_glia_matches_memory() {
    skip_if_no_python!();
    let expected = decode(&glia_memory_store()).unwrap();
    assert!(expected.has_mitochondria());

    for libver in LIBVERS {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("glia.h5");
        write_with_h5py(
            &path,
            libver,
            &format!(
                r#"
                f.create_dataset("points", data=np.array({}, dtype=np.float32).reshape(3, 4))
                f.create_dataset("structure", data=np.array({}, dtype=np.int32).reshape(2, 3))
                f.create_dataset("perimeters", data=np.array({}, dtype=np.float32))
                meta = f.create_group("metadata")
                meta.attrs.create("version", np.array([1, 1], dtype=np.uint32))
                meta.attrs.create("cell_family", np.array([1], dtype=np.uint32))
                mito = f.create_group("organelles/mitochondria")
                mito.create_dataset("points", data=np.array({}, dtype=np.float32).reshape(2, 3))
                mito.create_dataset("structure", data=np.array({}, dtype=np.int32).reshape(1, 2))
                "#,
                py_list(&POINTS),
                py_list(&V1_STRUCTURE),
                py_list(&PERIMETERS),
                py_list(&MITO_POINTS),
                py_list(&MITO_STRUCTURE)
            ),
        );
        let cell = load(&path).unwrap();
        assert_eq!(cell.version(), MorphologyVersion::V1_1, "{libver}");
        assert_eq!(cell, expected, "{libver}");
    }
}

// ---------------------------------------------------------------------------
// v2
// ---------------------------------------------------------------------------

#[test]
fn h5py_v2_raw_only_matches_memory() {
    skip_if_no_python!();
    let mut memory = MemoryStore::new("memory");
    memory
        .set_attr("/neuron1", "version", AttrValue::Int(vec![2, 0]))
        .put_f64("/neuron1/raw/points", &[3, 4], widen(&V2_POINTS))
        .put_i64("/neuron1/structure/raw", &[1, 2], vec![0, -1])
        .put_i64("/neuron1/structure/sectiontype", &[1, 1], vec![2]);
    let expected = decode(&memory).unwrap();

    for libver in LIBVERS {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("v2.h5");
        write_with_h5py(
            &path,
            libver,
            &format!(
                r#"
                neuron = f.create_group("neuron1")
                neuron.attrs.create("version", np.array([2, 0], dtype=np.uint32))
                neuron.create_dataset("raw/points", data=np.array({}, dtype=np.float32).reshape(3, 4))
                neuron.create_dataset("structure/raw", data=np.array([[0, -1]], dtype=np.int32))
                neuron.create_dataset("structure/sectiontype", data=np.array([[2]], dtype=np.int32))
                "#,
                py_list(&V2_POINTS)
            ),
        );
        let cell = load(&path).unwrap();
        assert_eq!(cell.repair_stage(), Some(RepairStage::Raw), "{libver}");
        assert_eq!(cell, expected, "{libver}");
    }
}
