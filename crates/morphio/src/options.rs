use crate::types::RepairStage;

/// Knobs for [`load_with_options`](crate::load_with_options) and
/// [`decode_with_options`](crate::decode_with_options).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    /// Use this stage for v2 files instead of probing. Ignored for v1 files.
    pub repair_stage: Option<RepairStage>,
    /// Memory-map files when the `mmap` feature is enabled.
    pub mmap: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            repair_stage: None,
            mmap: true,
        }
    }
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_repair_stage(mut self, stage: RepairStage) -> Self {
        self.repair_stage = Some(stage);
        self
    }

    pub fn with_mmap(mut self, mmap: bool) -> Self {
        self.mmap = mmap;
        self
    }
}
