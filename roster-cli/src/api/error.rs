//! Errors returned by the course-management API

use super::models::{ErrorBody, RemoteRowError};

/// A remote or transport failure.
///
/// `status_code` is `None` when the request never got a response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    pub status_code: Option<u16>,
    pub message: String,
    /// Row-level detail, when the remote reported any
    pub errors: Vec<RemoteRowError>,
}

impl ApiError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            status_code: None,
            message: message.into(),
            errors: Vec::new(),
        }
    }

    pub fn status(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            status_code: Some(status_code),
            message: message.into(),
            errors: Vec::new(),
        }
    }

    /// Build from row errors. The aggregate status is the single code they
    /// share, or 500 when they disagree.
    pub fn from_row_errors(errors: Vec<RemoteRowError>) -> Self {
        let status_code = aggregate_status(&errors);
        let message = match errors.as_slice() {
            [single] => single.message.clone(),
            _ => format!("The remote rejected {} rows.", errors.len()),
        };
        Self {
            status_code: Some(status_code),
            message,
            errors,
        }
    }

    /// Interpret an error response body, falling back to the raw text when it
    /// is not the expected JSON.
    pub fn from_response(status_code: u16, body: &str) -> Self {
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) if !parsed.errors.is_empty() => {
                let mut error = Self::from_row_errors(parsed.errors);
                error.status_code = Some(parsed.status_code);
                error
            }
            Ok(parsed) => Self::status(
                parsed.status_code,
                format!("Request failed with status {}", parsed.status_code),
            ),
            Err(_) => {
                let text: String = body.trim().chars().take(200).collect();
                let message = if text.is_empty() {
                    format!("Request failed with status {}", status_code)
                } else {
                    format!("Request failed with status {}: {}", status_code, text)
                };
                Self::status(status_code, message)
            }
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(error: reqwest::Error) -> Self {
        match error.status() {
            Some(status) => Self::status(status.as_u16(), error.to_string()),
            None => Self::transport(error.to_string()),
        }
    }
}

fn aggregate_status(errors: &[RemoteRowError]) -> u16 {
    let mut codes = errors.iter().map(|e| e.canvas_status_code);
    match codes.next() {
        Some(first) if codes.all(|c| c == first) => first,
        _ => 500,
    }
}
