//! Row-level content validators
//!
//! Each validator receives one column across all rows at once, since some
//! checks (duplicates) only make sense across rows. Validators never stop each
//! other: the caller runs every check in its list and concatenates the results.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

use super::{Cell, Invalidation};

/// Login names: an ASCII letter or digit, then letters, digits or `._-@+`
static LOGIN_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._@+\-]*$").expect("valid login id regex"));

/// Longest login ID the remote accepts
pub const MAX_LOGIN_ID_LENGTH: usize = 255;

/// The fixed set of row validators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowValidator {
    /// Value must be one of the accepted tags (case-insensitive)
    Role { accepted: &'static [&'static str] },
    /// Value must be a well-formed login ID
    LoginId,
    /// Value must not be longer than `max` characters
    MaxLength { label: &'static str, max: usize },
    /// Values must be unique within the file (case-insensitive)
    DuplicateInFile { label: &'static str },
}

/// A validator bound to the column it checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnCheck {
    pub header: &'static str,
    pub validator: RowValidator,
}

impl ColumnCheck {
    pub const fn new(header: &'static str, validator: RowValidator) -> Self {
        Self { header, validator }
    }
}

impl RowValidator {
    pub fn validate(&self, column: &[Cell<'_>]) -> Vec<Invalidation> {
        match self {
            Self::Role { accepted } => validate_role(column, accepted),
            Self::LoginId => validate_login_id(column),
            Self::MaxLength { label, max } => validate_max_length(column, label, *max),
            Self::DuplicateInFile { label } => validate_unique(column, label),
        }
    }
}

fn validate_role(column: &[Cell<'_>], accepted: &[&str]) -> Vec<Invalidation> {
    column
        .iter()
        .filter(|cell| !accepted.iter().any(|a| a.eq_ignore_ascii_case(cell.value)))
        .map(|cell| {
            Invalidation::row_error(
                cell.row_number,
                format!(
                    "Invalid role \"{}\". Accepted roles: {}.",
                    cell.value,
                    accepted.join(", ")
                ),
            )
        })
        .collect()
}

fn validate_login_id(column: &[Cell<'_>]) -> Vec<Invalidation> {
    column
        .iter()
        .filter_map(|cell| {
            if cell.value.chars().count() > MAX_LOGIN_ID_LENGTH {
                Some(Invalidation::row_error(
                    cell.row_number,
                    format!(
                        "Login ID \"{}\" is longer than {} characters.",
                        cell.value, MAX_LOGIN_ID_LENGTH
                    ),
                ))
            } else if !LOGIN_ID_RE.is_match(cell.value) {
                Some(Invalidation::row_error(
                    cell.row_number,
                    format!(
                        "Invalid login ID \"{}\". Login IDs must start with a letter or digit and contain only letters, digits, '.', '_', '-', '@' or '+'.",
                        cell.value
                    ),
                ))
            } else {
                None
            }
        })
        .collect()
}

fn validate_max_length(column: &[Cell<'_>], label: &str, max: usize) -> Vec<Invalidation> {
    column
        .iter()
        .filter_map(|cell| {
            let length = cell.value.chars().count();
            (length > max).then(|| {
                Invalidation::row_error(
                    cell.row_number,
                    format!(
                        "{} \"{}\" is {} characters long; the maximum is {}.",
                        label, cell.value, length, max
                    ),
                )
            })
        })
        .collect()
}

// Every row holding a repeated value is flagged, not just the later ones
fn validate_unique(column: &[Cell<'_>], label: &str) -> Vec<Invalidation> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for cell in column {
        *counts.entry(cell.value.to_uppercase()).or_default() += 1;
    }

    column
        .iter()
        .filter(|cell| counts.get(&cell.value.to_uppercase()).copied().unwrap_or(0) > 1)
        .map(|cell| {
            Invalidation::row_error(
                cell.row_number,
                format!("Duplicate {} in file: \"{}\"", label, cell.value),
            )
        })
        .collect()
}
