//! Roster workflow - transition function
//!
//! `update(state, msg) -> command`, Elm style. All parsing and validation run
//! inside a single `update` call; only the commands it returns are async.

use std::marker::PhantomData;

use crate::api::{Target, TargetScope};
use crate::features::{self, Feature, LocalOutcome};
use crate::submitter::SubmitOutcome;
use crate::validation::{self, ReferenceSet};

use super::command::Command;
use super::msg::Msg;
use super::resource::Resource;
use super::state::{ReviewPhase, State};
use super::types::{ConfirmationReport, PendingOp, UploadedFile, ValidatedBatch, WorkflowStep};

/// The workflow for one feature
pub struct Workflow<F>(PhantomData<F>);

type FeatureState<F> = State<<F as Feature>::Record>;
type FeatureCommand<F> = Command<<F as Feature>::Record>;

impl<F: Feature> Workflow<F> {
    /// Initial `Select` state plus the command that lists targets
    pub fn init(course_id: u64) -> (FeatureState<F>, FeatureCommand<F>) {
        let mut state = State::new(course_id);
        let cmd = Self::update(&mut state, Msg::LoadTargets);
        (state, cmd)
    }

    pub fn update(state: &mut FeatureState<F>, msg: Msg) -> FeatureCommand<F> {
        match msg {
            // === Step 1: Select ===
            Msg::LoadTargets => handle_load_targets::<F>(state),
            Msg::TargetsLoaded(result) => {
                if !take_pending(state, PendingOp::ListTargets) {
                    return Command::None;
                }
                if let Err(e) = &result {
                    log::error!("Failed to load targets: {}", e);
                }
                state.select.targets = Resource::from(result);

                // The course is the only target when creating sections
                if F::TARGET_SCOPE == TargetScope::Course {
                    if let Some([only]) = state.select.targets.as_ref().map(Vec::as_slice) {
                        state.select.selected = Some(only.id);
                    }
                }
                Command::None
            }
            Msg::SelectTarget(id) => {
                if state.step != WorkflowStep::Select {
                    log::warn!("Ignoring target selection outside the Select step");
                    return Command::None;
                }
                let known = state
                    .select
                    .targets
                    .as_ref()
                    .is_some_and(|targets| targets.iter().any(|t| t.id == id));
                if known {
                    state.select.selected = Some(id);
                } else {
                    log::warn!("Ignoring selection of unknown target {}", id);
                }
                Command::None
            }
            Msg::CreateTarget { name, auth } => {
                if state.step != WorkflowStep::Select
                    || F::TARGET_SCOPE != TargetScope::CourseSections
                {
                    log::warn!("Ignoring create request: not available here");
                    return Command::None;
                }
                if state.is_busy() {
                    log::warn!("Ignoring create request while {:?} is pending", state.pending);
                    return Command::None;
                }
                let name = name.trim().to_string();
                if name.is_empty() {
                    state.select.create_error =
                        Some("Enter a name for the new section.".to_string());
                    return Command::None;
                }
                state.select.create_error = None;
                state.pending = Some(PendingOp::CreateTarget);
                Command::CreateTarget {
                    course_id: state.course_id,
                    name,
                    auth,
                }
            }
            Msg::TargetCreated(result) => {
                if !take_pending(state, PendingOp::CreateTarget) {
                    return Command::None;
                }
                match result {
                    Ok(target) => {
                        log::info!("Created target {} ({})", target.name, target.id);
                        state.select.selected = Some(target.id);
                        state.select.create_error = None;
                        match state.select.targets.as_mut() {
                            Some(targets) => targets.push(target),
                            None => state.select.targets = Resource::Success(vec![target]),
                        }
                    }
                    Err(e) => {
                        log::error!("Failed to create target: {}", e);
                        state.select.create_error = Some(e);
                    }
                }
                Command::None
            }
            Msg::ConfirmSelection => {
                if state.step != WorkflowStep::Select || state.is_busy() {
                    log::warn!("Ignoring confirm outside an idle Select step");
                    return Command::None;
                }
                if !state.select.can_proceed() {
                    log::warn!("Ignoring confirm without a selected target");
                    return Command::None;
                }
                state.clear_derived();
                state.step = WorkflowStep::Upload;
                log::info!("Step {}: {}", state.step.number(), state.step.label());
                Command::None
            }

            // === Step 2: Upload ===
            Msg::FileUploaded(file) => handle_file_uploaded::<F>(state, file),
            Msg::ResetUpload => {
                if !matches!(state.step, WorkflowStep::Upload | WorkflowStep::Review) {
                    log::warn!("Ignoring reset on the {} step", state.step.label());
                    return Command::None;
                }
                if !abandon_pending(state) {
                    return Command::None;
                }
                state.clear_derived();
                state.step = WorkflowStep::Upload;
                Command::None
            }
            Msg::BackToSelect => {
                if !matches!(state.step, WorkflowStep::Upload | WorkflowStep::Review) {
                    return Command::None;
                }
                if !abandon_pending(state) {
                    return Command::None;
                }
                state.clear_derived();
                state.step = WorkflowStep::Select;
                Command::None
            }

            // === Step 3: Review ===
            Msg::ReferenceLoaded { target_id, result } => {
                if !take_pending(state, PendingOp::FetchReference { target_id }) {
                    return Command::None;
                }
                match result {
                    Ok(values) => {
                        log::info!(
                            "Loaded {} reference values for target {}",
                            values.len(),
                            target_id
                        );
                        state
                            .references
                            .insert(target_id, ReferenceSet::from_names(values));
                        apply_remote_checks::<F>(state);
                    }
                    Err(e) => {
                        log::error!("Failed to load reference data: {}", e);
                        state.review.phase = ReviewPhase::FetchFailed(e);
                    }
                }
                Command::None
            }
            Msg::RetryReference => {
                if state.step != WorkflowStep::Review
                    || !matches!(state.review.phase, ReviewPhase::FetchFailed(_))
                {
                    log::warn!("Ignoring retry: no failed fetch to retry");
                    return Command::None;
                }
                let Some(target) = state.review.batch.as_ref().map(|b| b.target.clone()) else {
                    return Command::None;
                };
                state.references.remove(&target.id);
                fetch_reference::<F>(state, target)
            }
            Msg::Commit(auth) => {
                if let Some(pending) = state.pending {
                    log::warn!("Ignoring commit while {:?} is pending", pending);
                    return Command::None;
                }
                if state.step != WorkflowStep::Review || !state.review.can_commit() {
                    log::warn!("Ignoring commit: review is not ready");
                    return Command::None;
                }
                let Some(batch) = state.review.batch.clone() else {
                    return Command::None;
                };
                state.review.phase = ReviewPhase::Submitting;
                state.pending = Some(PendingOp::Submit);
                Command::Submit { batch, auth }
            }
            Msg::SubmitFinished(outcome) => {
                if !take_pending(state, PendingOp::Submit) {
                    return Command::None;
                }
                handle_submit_finished::<F>(state, outcome)
            }

            // === Step 4: Confirmation ===
            Msg::StartAgain => {
                if state.is_submitting() {
                    log::warn!("Ignoring start again while submitting");
                    return Command::None;
                }
                state.pending = None;
                state.clear_derived();
                state.select.selected = None;
                state.select.create_error = None;
                state.step = WorkflowStep::Select;
                handle_load_targets::<F>(state)
            }
        }
    }
}

/// Clear `pending` if it matches; otherwise the result is stale
fn take_pending<R>(state: &mut State<R>, op: PendingOp) -> bool {
    if state.pending == Some(op) {
        state.pending = None;
        true
    } else {
        log::debug!(
            "Dropping stale result for {:?} (pending: {:?})",
            op,
            state.pending
        );
        false
    }
}

/// Abandon a pending fetch before leaving the step. Submits cannot be abandoned.
fn abandon_pending<R>(state: &mut State<R>) -> bool {
    match state.pending {
        Some(PendingOp::Submit) => {
            log::warn!("Refusing to leave review while a submit is in flight");
            false
        }
        Some(op) => {
            log::debug!("Abandoning pending {:?}", op);
            state.pending = None;
            true
        }
        None => true,
    }
}

fn handle_load_targets<F: Feature>(state: &mut FeatureState<F>) -> FeatureCommand<F> {
    if state.step != WorkflowStep::Select {
        return Command::None;
    }
    if let Some(pending) = state.pending {
        log::warn!("Ignoring target reload while {:?} is pending", pending);
        return Command::None;
    }
    state.select.targets = Resource::Loading;
    state.pending = Some(PendingOp::ListTargets);
    Command::ListTargets {
        scope: F::TARGET_SCOPE,
        course_id: state.course_id,
    }
}

fn handle_file_uploaded<F: Feature>(
    state: &mut FeatureState<F>,
    file: UploadedFile,
) -> FeatureCommand<F> {
    if state.step != WorkflowStep::Upload {
        log::warn!("Ignoring file upload on the {} step", state.step.label());
        return Command::None;
    }
    let Some(target) = state.select.selected_target().cloned() else {
        log::warn!("Ignoring file upload without a selected target");
        return Command::None;
    };

    state.clear_derived();
    state.upload.file_name = Some(file.name.clone());
    log::info!("Validating {} ({} bytes)", file.name, file.bytes.len());

    match features::validate_file::<F>(&file.bytes) {
        LocalOutcome::SchemaInvalid(invalidations) => {
            state.upload.schema_invalidations = invalidations;
            Command::None
        }
        LocalOutcome::RowInvalid {
            invalidations,
            skipped_rows,
        } => {
            state.upload.row_invalidations = invalidations;
            state.upload.skipped_rows = skipped_rows;
            Command::None
        }
        LocalOutcome::Valid {
            records,
            skipped_rows,
        } => {
            state.upload.skipped_rows = skipped_rows;
            state.review.batch = Some(ValidatedBatch {
                target: target.clone(),
                records,
            });
            state.step = WorkflowStep::Review;
            log::info!("Step {}: {}", state.step.number(), state.step.label());

            if F::REFERENCE.is_none() {
                state.review.phase = ReviewPhase::Ready;
                Command::None
            } else if state.references.contains_key(&target.id) {
                apply_remote_checks::<F>(state);
                Command::None
            } else {
                fetch_reference::<F>(state, target)
            }
        }
    }
}

fn fetch_reference<F: Feature>(state: &mut FeatureState<F>, target: Target) -> FeatureCommand<F> {
    let Some(source) = F::REFERENCE else {
        state.review.phase = ReviewPhase::Ready;
        return Command::None;
    };
    state.review.phase = ReviewPhase::FetchingReference;
    state.pending = Some(PendingOp::FetchReference {
        target_id: target.id,
    });
    Command::FetchReference { source, target }
}

/// Run the remote validators against the cached reference data. Errors send
/// the workflow back to Upload with the batch discarded.
fn apply_remote_checks<F: Feature>(state: &mut FeatureState<F>) {
    let Some(batch) = state.review.batch.as_ref() else {
        return;
    };
    let empty = ReferenceSet::new();
    let reference = state.references.get(&batch.target.id).unwrap_or(&empty);
    let invalidations = features::validate_remote::<F>(&batch.records, reference);

    if validation::has_errors(&invalidations) {
        log::info!(
            "Remote checks found {} conflicts; returning to upload",
            invalidations.iter().filter(|i| i.is_error()).count()
        );
        let file_name = state.upload.file_name.clone();
        let skipped_rows = std::mem::take(&mut state.upload.skipped_rows);
        state.clear_derived();
        state.upload.file_name = file_name;
        state.upload.skipped_rows = skipped_rows;
        state.upload.row_invalidations = invalidations;
        state.step = WorkflowStep::Upload;
    } else {
        state.review.warnings = invalidations;
        state.review.phase = ReviewPhase::Ready;
    }
}

fn handle_submit_finished<F: Feature>(
    state: &mut FeatureState<F>,
    outcome: SubmitOutcome,
) -> FeatureCommand<F> {
    let Some(batch) = state.review.batch.as_ref() else {
        log::warn!("Submit finished without a batch in review");
        return Command::None;
    };
    let target = batch.target.clone();

    match outcome {
        SubmitOutcome::Success { submitted, created } => {
            // Submitted values now exist remotely
            let records: Vec<F::Record> = batch.records.iter().map(|r| r.record.clone()).collect();
            let wire = F::to_wire(&records);
            if let Some(reference) = state.references.get_mut(&target.id) {
                reference.merge(wire.keys());
            }

            state.clear_derived();
            state.confirmation = Some(ConfirmationReport {
                target_name: target.name,
                submitted,
                created,
            });
            state.step = WorkflowStep::Confirmation;
            log::info!("Step {}: {}", state.step.number(), state.step.label());
        }
        SubmitOutcome::PartialFailure { created, error } => {
            state
                .references
                .entry(target.id)
                .or_default()
                .merge(created.iter().map(|t| t.name.as_str()));
            state.review.created = created;
            state.review.phase = ReviewPhase::SubmitFailed(error);
        }
        SubmitOutcome::Failure(error) => {
            // Remote state may have changed; refetch next time
            state.references.remove(&target.id);
            state.review.phase = ReviewPhase::SubmitFailed(error);
        }
    }
    Command::None
}
