//! Decides which schema a file follows and, for v2 files, which repair
//! stage to decode.
//!
//! Detection order matters: a `/metadata` group claiming v1.1 wins, then a
//! `/neuron1` group means v2, and only then is the file fingerprinted as
//! plain v1 by its `/points` and `/structure` datasets.

use crate::error::{Error, Result};
use crate::layout::{
    v2_points, CELL_FAMILY_ATTR, METADATA_GROUP, NEURON1_GROUP, POINT_COLUMNS, V1_POINTS,
    V1_STRUCTURE, V1_STRUCTURE_COLUMNS, VERSION_ATTR,
};
use crate::options::LoadOptions;
use crate::store::{AttrValue, DatasetInfo, TabularStore};
use crate::types::{CellFamily, MorphologyVersion, RepairStage};

/// Outcome of resolution; `stage` is set only for v2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub version: MorphologyVersion,
    pub family: CellFamily,
    pub stage: Option<RepairStage>,
}

pub fn resolve<S: TabularStore + ?Sized>(store: &S, options: &LoadOptions) -> Result<Resolution> {
    let file = store.location();

    if let Some(family) = probe_v1_1(store)? {
        check_v1_datasets(store, true)?;
        tracing::debug!(file, %family, "resolved h5 v1.1");
        return Ok(unstaged(MorphologyVersion::V1_1, family, options, file));
    }

    if has_group(store, NEURON1_GROUP)? {
        log_v2_version(store);
        let stage = select_stage(store, options.repair_stage)?;
        tracing::debug!(file, %stage, "resolved h5 v2");
        return Ok(Resolution {
            version: MorphologyVersion::V2,
            family: CellFamily::Neuron,
            stage: Some(stage),
        });
    }

    check_v1_datasets(store, false)?;
    tracing::debug!(file, "resolved h5 v1");
    Ok(unstaged(MorphologyVersion::V1, CellFamily::Neuron, options, file))
}

fn unstaged(
    version: MorphologyVersion,
    family: CellFamily,
    options: &LoadOptions,
    file: &str,
) -> Resolution {
    if let Some(stage) = options.repair_stage {
        tracing::debug!(file, %stage, %version, "ignoring repair stage for a file without stages");
    }
    Resolution {
        version,
        family,
        stage: None,
    }
}

fn has_group<S: TabularStore + ?Sized>(store: &S, path: &str) -> Result<bool> {
    store
        .has_group(path)
        .map_err(|e| Error::store(store.location(), path, e))
}

fn attribute<S: TabularStore + ?Sized>(
    store: &S,
    group: &str,
    name: &str,
) -> Result<Option<AttrValue>> {
    store
        .attribute(group, name)
        .map_err(|e| Error::store(store.location(), &format!("{group}@{name}"), e))
}

/// Returns the cell family when `/metadata` declares version 1.1.
///
/// A metadata group without a readable version is corrupt. A version other
/// than 1.1 is not ours to judge and falls through to the next probe.
fn probe_v1_1<S: TabularStore + ?Sized>(store: &S) -> Result<Option<CellFamily>> {
    if !has_group(store, METADATA_GROUP)? {
        return Ok(None);
    }
    let metadata = |reason: String| Error::Metadata {
        file: store.location().to_string(),
        reason,
    };

    let version = attribute(store, METADATA_GROUP, VERSION_ATTR)?
        .ok_or_else(|| metadata(format!("{METADATA_GROUP} has no '{VERSION_ATTR}' attribute")))?;
    let version = match version.as_ints() {
        Some(v) if v.len() == 2 => (v[0], v[1]),
        _ => {
            return Err(metadata(format!(
                "'{VERSION_ATTR}' must hold two integers, found {version:?}"
            )))
        }
    };
    if version != (1, 1) {
        tracing::debug!(
            file = store.location(),
            major = version.0,
            minor = version.1,
            "metadata version is not 1.1, probing further"
        );
        return Ok(None);
    }

    let family = attribute(store, METADATA_GROUP, CELL_FAMILY_ATTR)?.ok_or_else(|| {
        metadata(format!("{METADATA_GROUP} has no '{CELL_FAMILY_ATTR}' attribute"))
    })?;
    let code = match family.as_ints().as_deref() {
        Some([code]) => *code,
        _ => {
            return Err(metadata(format!(
                "'{CELL_FAMILY_ATTR}' must hold one integer, found {family:?}"
            )))
        }
    };
    CellFamily::from_code(code)
        .map(Some)
        .ok_or_else(|| metadata(format!("unknown cell family code {code}")))
}

/// The `/neuron1` version attribute is informational; writers of early v2
/// files left it out.
fn log_v2_version<S: TabularStore + ?Sized>(store: &S) {
    let file = store.location();
    match store.attribute(NEURON1_GROUP, VERSION_ATTR) {
        Ok(Some(value)) => match value.as_ints().as_deref() {
            Some([2, 0]) => tracing::debug!(file, "neuron1 declares version 2.0"),
            _ => tracing::warn!(file, ?value, "unexpected neuron1 version, decoding as v2"),
        },
        Ok(None) => tracing::debug!(file, "neuron1 has no version attribute, assuming v2"),
        Err(error) => tracing::warn!(file, %error, "unreadable neuron1 version, decoding as v2"),
    }
}

fn select_stage<S: TabularStore + ?Sized>(
    store: &S,
    forced: Option<RepairStage>,
) -> Result<RepairStage> {
    if let Some(stage) = forced {
        tracing::debug!(file = store.location(), %stage, "using requested repair stage");
        return Ok(stage);
    }
    for stage in RepairStage::PROBE_ORDER {
        let path = v2_points(stage);
        let found = store
            .dataset(&path)
            .map_err(|e| Error::store(store.location(), &path, e))?;
        if found.is_some() {
            return Ok(stage);
        }
    }
    let stage = RepairStage::default();
    tracing::debug!(file = store.location(), %stage, "no stage has points, using default");
    Ok(stage)
}

/// Checks `/points` and `/structure`.
///
/// For plain v1 these are the only fingerprint, so their absence means the
/// format is unknown. A v1.1 file already identified itself, so absence
/// there is a missing dataset.
fn check_v1_datasets<S: TabularStore + ?Sized>(store: &S, identified: bool) -> Result<()> {
    let file = store.location();
    let lookup = |path: &str| {
        store
            .dataset(path)
            .map_err(|e| Error::store(file, path, e))
    };
    let points = lookup(V1_POINTS)?;
    let structure = lookup(V1_STRUCTURE)?;

    let (points, structure) = match (points, structure) {
        (Some(p), Some(s)) => (p, s),
        (points, _) if identified => {
            let missing = if points.is_none() { V1_POINTS } else { V1_STRUCTURE };
            return Err(Error::MissingDataset {
                file: file.to_string(),
                dataset: missing.to_string(),
                stage: None,
            });
        }
        _ => {
            return Err(Error::UnknownFormat {
                file: file.to_string(),
            })
        }
    };
    check_columns(file, V1_POINTS, &points, POINT_COLUMNS)?;
    check_columns(file, V1_STRUCTURE, &structure, V1_STRUCTURE_COLUMNS)
}

fn check_columns(file: &str, path: &str, info: &DatasetInfo, columns: u64) -> Result<()> {
    if info.rank() == 2 && info.shape[1] == columns {
        return Ok(());
    }
    Err(Error::ShapeMismatch {
        file: file.to_string(),
        dataset: path.to_string(),
        expected: format!("[N, {columns}]"),
        actual: info.shape.clone(),
    })
}
