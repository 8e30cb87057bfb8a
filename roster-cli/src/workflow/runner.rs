//! Executes workflow commands against a [`CourseApi`]

use std::marker::PhantomData;

use crate::api::CourseApi;
use crate::features::Feature;
use crate::submitter;

use super::app::Workflow;
use super::command::Command;
use super::msg::Msg;
use super::state::State;

/// Drives a workflow: performs each command and feeds the result back in
pub struct Runner<'a, F> {
    api: &'a dyn CourseApi,
    _feature: PhantomData<F>,
}

impl<'a, F: Feature> Runner<'a, F> {
    pub fn new(api: &'a dyn CourseApi) -> Self {
        Self {
            api,
            _feature: PhantomData,
        }
    }

    /// Perform one command, returning the message it produced
    pub async fn perform(&self, cmd: Command<F::Record>) -> Option<Msg> {
        match cmd {
            Command::None => None,
            Command::ListTargets { scope, course_id } => {
                let result = self
                    .api
                    .list_targets(scope, course_id)
                    .await
                    .map_err(|e| e.to_string());
                Some(Msg::TargetsLoaded(result))
            }
            Command::CreateTarget {
                course_id,
                name,
                auth,
            } => {
                let result = self
                    .api
                    .create_target(course_id, &name, &auth)
                    .await
                    .map_err(|e| e.to_string());
                Some(Msg::TargetCreated(result))
            }
            Command::FetchReference { source, target } => {
                let result = self
                    .api
                    .fetch_reference(source, &target)
                    .await
                    .map_err(|e| e.to_string());
                Some(Msg::ReferenceLoaded {
                    target_id: target.id,
                    result,
                })
            }
            Command::Submit { batch, auth } => {
                let outcome = submitter::submit::<F>(self.api, &batch, &auth).await;
                Some(Msg::SubmitFinished(outcome))
            }
        }
    }

    /// Run commands until the workflow has nothing left to do
    pub async fn run(&self, state: &mut State<F::Record>, mut cmd: Command<F::Record>) {
        while let Some(msg) = self.perform(cmd).await {
            cmd = Workflow::<F>::update(state, msg);
        }
    }

    /// Deliver a message and run whatever it triggers
    pub async fn dispatch(&self, state: &mut State<F::Record>, msg: Msg) {
        let cmd = Workflow::<F>::update(state, msg);
        self.run(state, cmd).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::{MockApi, target};
    use crate::api::{ApiError, AuthToken, WireBatch};
    use crate::features::{Enrollments, Sections};
    use crate::workflow::{ReviewPhase, UploadedFile, WorkflowStep};

    #[tokio::test]
    async fn test_end_to_end_enrollment() {
        let api = MockApi::with_targets(vec![target(7, "Section A")]);
        let runner = Runner::<Enrollments>::new(&api);

        let (mut state, cmd) = Workflow::<Enrollments>::init(1);
        runner.run(&mut state, cmd).await;
        assert_eq!(state.select.targets.as_ref().map(Vec::len), Some(1));

        runner.dispatch(&mut state, Msg::SelectTarget(7)).await;
        runner.dispatch(&mut state, Msg::ConfirmSelection).await;
        runner
            .dispatch(
                &mut state,
                Msg::FileUploaded(UploadedFile::new(
                    "add_users.csv",
                    "LOGIN_ID,ROLE\nstudentone,student\n",
                )),
            )
            .await;
        assert_eq!(state.step, WorkflowStep::Review);
        assert_eq!(state.review.phase, ReviewPhase::Ready);

        runner
            .dispatch(&mut state, Msg::Commit(AuthToken::new("csrf")))
            .await;

        assert_eq!(state.step, WorkflowStep::Confirmation);
        assert_eq!(api.mutation_count(), 1);
        let mutations = api.mutations.lock().unwrap();
        match &mutations[0].1 {
            WireBatch::Enrollments(records) => {
                assert_eq!(records.len(), 1);
                assert_eq!(records[0].login_id, "studentone");
            }
            other => panic!("unexpected batch {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_remote_conflict_never_submits() {
        let api = MockApi {
            targets: vec![target(5, "Bio 101")],
            reference: vec!["SECTION 001".to_string()],
            ..MockApi::default()
        };
        let runner = Runner::<Sections>::new(&api);

        let (mut state, cmd) = Workflow::<Sections>::init(5);
        runner.run(&mut state, cmd).await;
        runner.dispatch(&mut state, Msg::ConfirmSelection).await;
        runner
            .dispatch(
                &mut state,
                Msg::FileUploaded(UploadedFile::new("sections.csv", "SECTION_NAME\nSection 001\n")),
            )
            .await;

        assert_eq!(state.step, WorkflowStep::Upload);
        assert_eq!(state.upload.row_invalidations.len(), 1);
        runner
            .dispatch(&mut state, Msg::Commit(AuthToken::new("csrf")))
            .await;
        assert_eq!(api.mutation_count(), 0);
    }

    #[tokio::test]
    async fn test_reference_failure_surfaces_in_review() {
        let api = MockApi {
            targets: vec![target(7, "Section A")],
            reference_error: Some(ApiError::status(503, "Service unavailable")),
            ..MockApi::default()
        };
        let runner = Runner::<Enrollments>::new(&api);

        let (mut state, cmd) = Workflow::<Enrollments>::init(1);
        runner.run(&mut state, cmd).await;
        runner.dispatch(&mut state, Msg::SelectTarget(7)).await;
        runner.dispatch(&mut state, Msg::ConfirmSelection).await;
        runner
            .dispatch(
                &mut state,
                Msg::FileUploaded(UploadedFile::new("f.csv", "LOGIN_ID,ROLE\na,student\n")),
            )
            .await;

        assert_eq!(state.step, WorkflowStep::Review);
        assert_eq!(
            state.review.phase,
            ReviewPhase::FetchFailed("Service unavailable".to_string())
        );
        assert!(state.review.batch.is_some());
    }
}
