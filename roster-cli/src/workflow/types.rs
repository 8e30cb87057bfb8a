//! Core data types for the roster workflow

use crate::api::Target;
use crate::validation::RowNumbered;

/// The step the workflow is on. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WorkflowStep {
    #[default]
    Select,
    Upload,
    Review,
    Confirmation,
}

impl WorkflowStep {
    pub fn number(&self) -> u8 {
        match self {
            Self::Select => 1,
            Self::Upload => 2,
            Self::Review => 3,
            Self::Confirmation => 4,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Select => "Select Target",
            Self::Upload => "Upload File",
            Self::Review => "Review",
            Self::Confirmation => "Done",
        }
    }
}

/// Records that passed every local validator, bound to the chosen target.
///
/// Exactly what gets submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedBatch<R> {
    pub target: Target,
    pub records: Vec<RowNumbered<R>>,
}

impl<R> ValidatedBatch<R> {
    pub fn len(&self) -> usize {
        self.records.len()
    }
}

/// One upload attempt: a single file, read fully into memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

/// The single asynchronous operation a workflow may have outstanding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingOp {
    ListTargets,
    CreateTarget,
    FetchReference { target_id: u64 },
    Submit,
}

/// What the confirmation step shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationReport {
    pub target_name: String,
    pub submitted: usize,
    pub created: Vec<Target>,
}
