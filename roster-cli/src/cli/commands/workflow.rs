//! `enroll` and `sections`: drive the full workflow against the server

use anyhow::{Context, Result};
use colored::*;
use dialoguer::{Confirm, Select};
use std::path::Path;

use crate::api::{AuthToken, CanvasClient, CourseApi, TargetScope};
use crate::cli::render;
use crate::config::Config;
use crate::features::{self, Enrollments, Feature, LocalOutcome, Sections};
use crate::workflow::{Msg, ReviewPhase, Runner, State, UploadedFile, Workflow, WorkflowStep};

/// How the enrollment target is chosen
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetChoice {
    Existing(u64),
    Create(String),
    Prompt,
}

/// Where to go after a pass through review
enum Next {
    Done,
    AnotherTarget,
}

#[derive(Debug, Clone, Copy)]
enum ReviewAction {
    Submit,
    OtherTarget,
    Cancel,
}

pub async fn handle_enroll(
    config: &Config,
    course_id: u64,
    file: &Path,
    choice: TargetChoice,
    yes: bool,
) -> Result<()> {
    run::<Enrollments>(config, course_id, file, choice, yes).await
}

pub async fn handle_sections(
    config: &Config,
    course_id: u64,
    file: &Path,
    yes: bool,
) -> Result<()> {
    // The course itself is the target; it is selected as soon as it loads
    run::<Sections>(config, course_id, file, TargetChoice::Prompt, yes).await
}

async fn run<F: Feature>(
    config: &Config,
    course_id: u64,
    file: &Path,
    choice: TargetChoice,
    yes: bool,
) -> Result<()> {
    let client = CanvasClient::new(
        config.api.require_base_url()?,
        config.api.api_token.clone(),
        config.api.timeout(),
    )?;
    let auth = AuthToken::new(config.api.require_csrf_token()?);
    let bytes = std::fs::read(file)
        .with_context(|| format!("Failed to read file: {}", file.display()))?;
    let file_name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.display().to_string());

    let upload = UploadedFile::new(file_name, bytes);
    drive::<F>(&client, course_id, &upload, choice, &auth, yes).await
}

async fn drive<F: Feature>(
    api: &dyn CourseApi,
    course_id: u64,
    upload: &UploadedFile,
    mut choice: TargetChoice,
    auth: &AuthToken,
    yes: bool,
) -> Result<()> {
    // Creating a section is not undone by a later validation failure
    if matches!(choice, TargetChoice::Create(_)) {
        check_before_create::<F>(upload)?;
    }

    let runner = Runner::<F>::new(api);
    let (mut state, cmd) = Workflow::<F>::init(course_id);

    render::render_step(state.step);
    runner.run(&mut state, cmd).await;

    loop {
        load_targets(&runner, &mut state).await?;
        choose_target(&runner, &mut state, choice, auth).await?;

        runner.dispatch(&mut state, Msg::ConfirmSelection).await;
        if state.step != WorkflowStep::Upload {
            anyhow::bail!("Could not continue with the selected target");
        }

        render::render_step(state.step);
        runner
            .dispatch(&mut state, Msg::FileUploaded(upload.clone()))
            .await;

        match review(&runner, &mut state, &upload.name, auth, yes).await? {
            Next::Done => return Ok(()),
            Next::AnotherTarget => choice = TargetChoice::Prompt,
        }
    }
}

/// Validate locally so an unusable file never leaves an empty section behind
fn check_before_create<F: Feature>(upload: &UploadedFile) -> Result<()> {
    match features::validate_file::<F>(&upload.bytes) {
        LocalOutcome::Valid { .. } => Ok(()),
        LocalOutcome::SchemaInvalid(invalidations)
        | LocalOutcome::RowInvalid { invalidations, .. } => {
            render::render_invalidations(&invalidations);
            anyhow::bail!(
                "{} problems in {}; no section was created",
                invalidations.len(),
                upload.name
            );
        }
    }
}

async fn review<F: Feature>(
    runner: &Runner<'_, F>,
    state: &mut State<F::Record>,
    file_name: &str,
    auth: &AuthToken,
    yes: bool,
) -> Result<Next> {
    loop {
        match state.step {
            WorkflowStep::Select => anyhow::bail!("The workflow returned to target selection"),
            WorkflowStep::Upload => {
                render::render_upload(&state.upload);
                let count = state.upload.schema_invalidations.len()
                    + state.upload.row_invalidations.len();
                anyhow::bail!("{} problems in {}", count, file_name);
            }
            WorkflowStep::Confirmation => {
                render::render_step(state.step);
                if let Some(report) = &state.confirmation {
                    render::render_confirmation(report);
                }
                if !yes && picks_section::<F>() && prompt_another_section()? {
                    runner.dispatch(state, Msg::StartAgain).await;
                    return Ok(Next::AnotherTarget);
                }
                return Ok(Next::Done);
            }
            WorkflowStep::Review => {}
        }

        match state.review.phase.clone() {
            ReviewPhase::FetchFailed(error) => {
                println!("{} {}", "Could not load data from the server:".red(), error);
                if !prompt_retry()? {
                    anyhow::bail!("Cancelled");
                }
                runner.dispatch(state, Msg::RetryReference).await;
            }
            ReviewPhase::Ready => {
                render::render_step(state.step);
                render::render_skipped(&state.upload.skipped_rows);
                if let Some(batch) = &state.review.batch {
                    render::render_review::<F>(batch, &state.review.warnings);
                }
                let action = if yes {
                    ReviewAction::Submit
                } else {
                    prompt_review::<F>()?
                };
                match action {
                    ReviewAction::Submit => {
                        runner.dispatch(state, Msg::Commit(auth.clone())).await;
                    }
                    ReviewAction::OtherTarget => {
                        runner.dispatch(state, Msg::BackToSelect).await;
                        return Ok(Next::AnotherTarget);
                    }
                    ReviewAction::Cancel => {
                        runner.dispatch(state, Msg::ResetUpload).await;
                        println!("Cancelled; nothing was submitted.");
                        return Ok(Next::Done);
                    }
                }
            }
            ReviewPhase::SubmitFailed(error) => {
                render::render_submit_error(F::TITLE, &error, &state.review.created);
                runner.dispatch(state, Msg::ResetUpload).await;
                anyhow::bail!("Submission failed");
            }
            ReviewPhase::Idle | ReviewPhase::FetchingReference | ReviewPhase::Submitting => {
                anyhow::bail!("Workflow stopped in an unexpected state: {:?}", state.review.phase);
            }
        }
    }
}

/// Whether the user chooses among the course's sections
fn picks_section<F: Feature>() -> bool {
    F::TARGET_SCOPE == TargetScope::CourseSections
}

/// Keep offering a retry until the target list loads or the user gives up
async fn load_targets<F: Feature>(
    runner: &Runner<'_, F>,
    state: &mut State<F::Record>,
) -> Result<()> {
    while let Some(error) = state.select.targets.error().map(str::to_string) {
        println!("{} {}", "Could not load targets:".red(), error);
        if !prompt_retry()? {
            anyhow::bail!("Could not load targets: {}", error);
        }
        runner.dispatch(state, Msg::LoadTargets).await;
    }
    Ok(())
}

async fn choose_target<F: Feature>(
    runner: &Runner<'_, F>,
    state: &mut State<F::Record>,
    choice: TargetChoice,
    auth: &AuthToken,
) -> Result<()> {
    match choice {
        TargetChoice::Existing(id) => {
            runner.dispatch(state, Msg::SelectTarget(id)).await;
            if state.select.selected != Some(id) {
                anyhow::bail!("Section {} was not found in course {}", id, state.course_id);
            }
        }
        TargetChoice::Create(name) => {
            runner
                .dispatch(
                    state,
                    Msg::CreateTarget {
                        name,
                        auth: auth.clone(),
                    },
                )
                .await;
            if let Some(error) = &state.select.create_error {
                anyhow::bail!("Could not create section: {}", error);
            }
        }
        TargetChoice::Prompt if picks_section::<F>() => {
            let targets = state.select.targets.as_ref().cloned().unwrap_or_default();
            if targets.is_empty() {
                anyhow::bail!(
                    "Course {} has no sections; use --create-section to add one",
                    state.course_id
                );
            }
            let current = targets
                .iter()
                .position(|t| Some(t.id) == state.select.selected)
                .unwrap_or(0);
            let labels: Vec<String> = targets.iter().map(render::target_label).collect();
            let index = Select::new()
                .with_prompt(format!("{}: choose a target", F::TITLE))
                .items(&labels)
                .default(current)
                .interact()
                .context("Target selection cancelled")?;
            runner
                .dispatch(state, Msg::SelectTarget(targets[index].id))
                .await;
        }
        TargetChoice::Prompt => {}
    }

    match state.select.selected_target() {
        Some(target) => {
            println!("Target: {}", target.name.bright_green());
            Ok(())
        }
        None => anyhow::bail!("No target selected"),
    }
}

fn prompt_retry() -> Result<bool> {
    Confirm::new()
        .with_prompt("Retry?")
        .default(true)
        .interact()
        .context("Prompt failed")
}

fn prompt_review<F: Feature>() -> Result<ReviewAction> {
    let mut actions = vec![("Submit", ReviewAction::Submit)];
    if picks_section::<F>() {
        actions.push(("Choose a different section", ReviewAction::OtherTarget));
    }
    actions.push(("Cancel", ReviewAction::Cancel));

    let labels: Vec<&str> = actions.iter().map(|(label, _)| *label).collect();
    let index = Select::new()
        .with_prompt(format!("{}: submit these records?", F::TITLE))
        .items(&labels)
        .default(actions.len() - 1)
        .interact()
        .context("Prompt failed")?;
    Ok(actions[index].1)
}

fn prompt_another_section() -> Result<bool> {
    Confirm::new()
        .with_prompt("Use the same file for another section?")
        .default(false)
        .interact()
        .context("Prompt failed")
}
