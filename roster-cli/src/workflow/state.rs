//! State types for the roster workflow
//!
//! The main state plus one sub-state per step. Everything derived from an
//! uploaded file lives in `upload`, `review` and `confirmation`, and is cleared
//! together by [`State::clear_derived`].

use std::collections::HashMap;

use crate::api::Target;
use crate::submitter::SubmitError;
use crate::validation::{Invalidation, ReferenceSet};

use super::resource::Resource;
use super::types::{ConfirmationReport, PendingOp, ValidatedBatch, WorkflowStep};

/// Main workflow state, generic over the feature's record type
#[derive(Debug, Clone)]
pub struct State<R> {
    /// Current step
    pub step: WorkflowStep,

    /// Course the workflow operates in
    pub course_id: u64,

    /// Step 1: target selection
    pub select: SelectState,

    /// Step 2: file upload and local validation
    pub upload: UploadState,

    /// Step 3: remote checks and commit
    pub review: ReviewState<R>,

    /// Step 4: what was submitted
    pub confirmation: Option<ConfirmationReport>,

    /// Reference values per target id, kept for the life of the workflow
    pub references: HashMap<u64, ReferenceSet>,

    /// The one outstanding async operation, if any
    pub pending: Option<PendingOp>,
}

impl<R> State<R> {
    pub fn new(course_id: u64) -> Self {
        Self {
            step: WorkflowStep::Select,
            course_id,
            select: SelectState::default(),
            upload: UploadState::default(),
            review: ReviewState::default(),
            confirmation: None,
            references: HashMap::new(),
            pending: None,
        }
    }

    /// Drop the file and everything computed from it, in one step
    pub fn clear_derived(&mut self) {
        self.upload = UploadState::default();
        self.review = ReviewState::default();
        self.confirmation = None;
    }

    pub fn is_submitting(&self) -> bool {
        self.pending == Some(PendingOp::Submit)
    }

    /// True while any remote call is outstanding
    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }
}

/// State for step 1: choosing the target
#[derive(Debug, Clone, Default)]
pub struct SelectState {
    /// Targets available in the course
    pub targets: Resource<Vec<Target>>,

    /// Id of the chosen target
    pub selected: Option<u64>,

    /// Inline error from the last create attempt
    pub create_error: Option<String>,
}

impl SelectState {
    pub fn selected_target(&self) -> Option<&Target> {
        let id = self.selected?;
        self.targets.as_ref()?.iter().find(|t| t.id == id)
    }

    pub fn can_proceed(&self) -> bool {
        self.selected_target().is_some()
    }
}

/// State for step 2: the uploaded file and its local invalidations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadState {
    pub file_name: Option<String>,

    /// Parse or schema problems; when present no row checks ran
    pub schema_invalidations: Vec<Invalidation>,

    /// Row problems, local or remote, sorted by row number
    pub row_invalidations: Vec<Invalidation>,

    /// Rows dropped for not matching the record shape
    pub skipped_rows: Vec<usize>,
}

/// Where review is at
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ReviewPhase {
    #[default]
    Idle,
    /// Waiting for reference data
    FetchingReference,
    /// Reference fetch failed; retry keeps the batch
    FetchFailed(String),
    /// Remote checks passed; commit is available
    Ready,
    /// Submit in flight; nothing else is allowed
    Submitting,
    /// Submit failed; the only way on is a fresh upload
    SubmitFailed(SubmitError),
}

/// State for step 3
#[derive(Debug, Clone)]
pub struct ReviewState<R> {
    pub batch: Option<ValidatedBatch<R>>,

    /// Non-blocking remote findings shown with the confirmation table
    pub warnings: Vec<Invalidation>,

    pub phase: ReviewPhase,

    /// Targets created by a submission that was only partially accepted
    pub created: Vec<Target>,
}

impl<R> Default for ReviewState<R> {
    fn default() -> Self {
        Self {
            batch: None,
            warnings: Vec::new(),
            phase: ReviewPhase::Idle,
            created: Vec::new(),
        }
    }
}

impl<R> ReviewState<R> {
    pub fn can_commit(&self) -> bool {
        self.phase == ReviewPhase::Ready && self.batch.is_some()
    }
}
