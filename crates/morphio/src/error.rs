use crate::store::StoreError;
use crate::types::{RepairStage, SubstructureKind};
use morphio_format::FormatError;

/// Why a morphology could not be loaded. Every variant names the file.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{file}: cannot open file: {source}")]
    Io {
        file: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{file}: not a readable HDF5 container: {source}")]
    Container {
        file: String,
        #[source]
        source: FormatError,
    },

    #[error("{file}: unknown morphology format, no known layout matched")]
    UnknownFormat { file: String },

    #[error("{file}: dataset '{dataset}' has shape {actual:?}, expected {expected}")]
    ShapeMismatch {
        file: String,
        dataset: String,
        expected: String,
        actual: Vec<u64>,
    },

    #[error("{file}: {kind} are mandatory for glia cells: {reason}")]
    MissingMandatorySubstructure {
        file: String,
        kind: SubstructureKind,
        reason: String,
    },

    #[error("{file}: invalid metadata: {reason}")]
    Metadata { file: String, reason: String },

    #[error("{file}: missing dataset '{dataset}'{}", stage_note(.stage))]
    MissingDataset {
        file: String,
        dataset: String,
        stage: Option<RepairStage>,
    },

    #[error("{file}: section {section} has unsupported section type {code}")]
    UnsupportedSectionType { file: String, section: usize, code: i64 },

    #[error("{file}: invalid {table} at row {row}: {reason}")]
    InvalidStructure {
        file: String,
        table: &'static str,
        row: usize,
        reason: String,
    },

    #[error("{file}: failed to read '{dataset}': {source}")]
    Store {
        file: String,
        dataset: String,
        #[source]
        source: StoreError,
    },
}

fn stage_note(stage: &Option<RepairStage>) -> String {
    match stage {
        Some(stage) => format!(" (repair stage {stage})"),
        None => String::new(),
    }
}

impl Error {
    /// Classifies a failure to open a store, before any decoding happened.
    pub(crate) fn from_open(file: impl Into<String>, err: StoreError) -> Error {
        let file = file.into();
        match err {
            StoreError::Io(source) => Error::Io { file, source },
            StoreError::Format(source) => Error::Container { file, source },
            other => Error::Store {
                file,
                dataset: "/".into(),
                source: other,
            },
        }
    }

    pub(crate) fn store(file: &str, dataset: &str, source: StoreError) -> Error {
        Error::Store {
            file: file.to_string(),
            dataset: dataset.to_string(),
            source,
        }
    }

    /// The file the error refers to.
    pub fn file(&self) -> &str {
        match self {
            Error::Io { file, .. }
            | Error::Container { file, .. }
            | Error::UnknownFormat { file }
            | Error::ShapeMismatch { file, .. }
            | Error::MissingMandatorySubstructure { file, .. }
            | Error::Metadata { file, .. }
            | Error::MissingDataset { file, .. }
            | Error::UnsupportedSectionType { file, .. }
            | Error::InvalidStructure { file, .. }
            | Error::Store { file, .. } => file,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
