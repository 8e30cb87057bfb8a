//! Message types for the roster workflow
//!
//! Every user action and every async result enters the state machine as one
//! of these.

use crate::api::{AuthToken, Target};
use crate::submitter::SubmitOutcome;

use super::types::UploadedFile;

/// All messages for the roster workflow
#[derive(Debug, Clone)]
pub enum Msg {
    // === Step 1: Select ===
    /// (Re)load the selectable targets
    LoadTargets,
    /// Targets loaded from the remote
    TargetsLoaded(Result<Vec<Target>, String>),
    /// Choose a target by id
    SelectTarget(u64),
    /// Create a new target inline
    CreateTarget { name: String, auth: AuthToken },
    /// Result of an inline create
    TargetCreated(Result<Target, String>),
    /// Proceed to upload with the chosen target
    ConfirmSelection,

    // === Step 2: Upload ===
    /// A file was chosen
    FileUploaded(UploadedFile),
    /// Clear the file and everything derived from it (also "cancel" and "try again")
    ResetUpload,
    /// Go back to target selection
    BackToSelect,

    // === Step 3: Review ===
    /// Reference data for a target arrived
    ReferenceLoaded {
        target_id: u64,
        result: Result<Vec<String>, String>,
    },
    /// Fetch the reference data again after a failure
    RetryReference,
    /// Submit the batch
    Commit(AuthToken),
    /// The submitter finished
    SubmitFinished(SubmitOutcome),

    // === Step 4: Confirmation ===
    /// Reset everything and go back to Select
    StartAgain,
}
