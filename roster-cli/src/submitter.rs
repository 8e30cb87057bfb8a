//! Batch submitter
//!
//! Sends a validated batch to the remote and classifies what came back. It
//! never retries; retrying is a user decision made in the workflow.

use std::collections::HashMap;
use std::fmt;

use crate::api::{ApiError, AuthToken, CourseApi, RemoteRowError, Target};
use crate::features::Feature;
use crate::workflow::ValidatedBatch;

/// A rejected row, mapped back to the file when possible
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowFailure {
    /// `None` when the remote's input could not be matched to a row
    pub row_number: Option<usize>,
    pub input: Option<String>,
    pub message: String,
}

/// Why a submission failed, with any row-level detail
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitError {
    pub message: String,
    pub status_code: Option<u16>,
    pub rows: Vec<RowFailure>,
}

impl fmt::Display for SubmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status_code {
            Some(code) => write!(f, "{} (status {})", self.message, code),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Classified result of one submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The remote accepted every record
    Success {
        submitted: usize,
        created: Vec<Target>,
    },
    /// Some records were applied, the rest rejected
    PartialFailure {
        created: Vec<Target>,
        error: SubmitError,
    },
    /// Nothing was applied, or the request never completed
    Failure(SubmitError),
}

/// Submit a batch to its target
pub async fn submit<F: Feature>(
    api: &dyn CourseApi,
    batch: &ValidatedBatch<F::Record>,
    auth: &AuthToken,
) -> SubmitOutcome {
    let records: Vec<F::Record> = batch.records.iter().map(|r| r.record.clone()).collect();
    let wire = F::to_wire(&records);
    let row_index = row_index(&wire.keys(), batch.records.iter().map(|r| r.row_number));

    log::info!(
        "Submitting {} records to {} ({})",
        wire.len(),
        batch.target.name,
        batch.target.id
    );

    match api.mutate(&batch.target, &wire, auth).await {
        Ok(result) if result.failures.is_empty() => {
            log::info!("Submission accepted ({} created)", result.created.len());
            SubmitOutcome::Success {
                submitted: wire.len(),
                created: result.created,
            }
        }
        Ok(result) => {
            log::warn!(
                "Submission partially rejected: {} created, {} rejected",
                result.created.len(),
                result.failures.len()
            );
            let api_error = ApiError::from_row_errors(result.failures);
            SubmitOutcome::PartialFailure {
                created: result.created,
                error: submit_error(api_error, &row_index),
            }
        }
        Err(api_error) => {
            log::error!("Submission failed: {}", api_error);
            SubmitOutcome::Failure(submit_error(api_error, &row_index))
        }
    }
}

/// Upper-cased submitted value to its row number
fn row_index(
    keys: &[&str],
    row_numbers: impl Iterator<Item = usize>,
) -> HashMap<String, usize> {
    keys.iter()
        .zip(row_numbers)
        .map(|(key, row)| (key.to_uppercase(), row))
        .collect()
}

fn submit_error(api_error: ApiError, row_index: &HashMap<String, usize>) -> SubmitError {
    let mut rows: Vec<RowFailure> = api_error
        .errors
        .into_iter()
        .map(|e| row_failure(e, row_index))
        .collect();
    rows.sort_by_key(|r| r.row_number.unwrap_or(0));

    SubmitError {
        message: api_error.message,
        status_code: api_error.status_code,
        rows,
    }
}

fn row_failure(error: RemoteRowError, row_index: &HashMap<String, usize>) -> RowFailure {
    let row_number = error
        .failed_input
        .as_deref()
        .and_then(|input| row_index.get(&input.trim().to_uppercase()).copied());
    RowFailure {
        row_number,
        input: error.failed_input,
        message: error.message,
    }
}
