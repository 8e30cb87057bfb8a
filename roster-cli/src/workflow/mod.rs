//! Roster workflow
//!
//! Select a target, upload a file, review, confirm. The state machine is pure
//! ([`Workflow::update`]); the [`Runner`] performs the remote calls it asks for.

pub mod app;
pub mod command;
pub mod msg;
pub mod resource;
pub mod runner;
pub mod state;
pub mod types;

pub use app::Workflow;
pub use msg::Msg;
pub use runner::Runner;
pub use state::{ReviewPhase, State, UploadState};
pub use types::{ConfirmationReport, UploadedFile, ValidatedBatch, WorkflowStep};
