//! Validation of uploaded roster files
//!
//! Validation runs in tiers, each strictly after the previous one:
//!
//! 1. Schema - required headers, row limit, record shape ([`schema`])
//! 2. Rows - per-column content checks across all rows ([`rows`])
//! 3. Remote - checks against reference data fetched from the remote ([`remote`])
//!
//! A schema invalidation stops everything after it. Row and remote validators
//! all run so the user sees every problem in one pass.

pub mod remote;
pub mod rows;
pub mod schema;

pub use remote::{ReferenceSet, RemoteCheck, RemoteValidator};
pub use rows::{ColumnCheck, RowValidator};
pub use schema::{RecordShape, SchemaResult, SchemaValidator};

use std::fmt;

/// Severity of an invalidation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidationType {
    /// Blocks submission
    Error,
    /// Shown to the user, does not block
    Warning,
}

impl InvalidationType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Error => "Error",
            Self::Warning => "Warning",
        }
    }
}

/// A single validation problem, file-level or tied to a row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invalidation {
    pub message: String,
    pub row_number: Option<usize>,
    pub kind: InvalidationType,
}

impl Invalidation {
    /// File- or column-level error with no row number
    pub fn schema(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            row_number: None,
            kind: InvalidationType::Error,
        }
    }

    pub fn row_error(row_number: usize, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            row_number: Some(row_number),
            kind: InvalidationType::Error,
        }
    }

    pub fn row_warning(row_number: usize, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            row_number: Some(row_number),
            kind: InvalidationType::Warning,
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == InvalidationType::Error
    }
}

impl fmt::Display for Invalidation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.row_number {
            Some(row) => write!(f, "Row {}: {}", row, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// A typed record tagged with its display row number in the original file.
///
/// The number is assigned once, before any filtering, and never changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowNumbered<T> {
    pub row_number: usize,
    pub record: T,
}

/// One value of a column under test, with the row it came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell<'a> {
    pub row_number: usize,
    pub value: &'a str,
}

/// Extract one column across all records
pub fn column<'a, T: RecordShape>(records: &'a [RowNumbered<T>], header: &str) -> Vec<Cell<'a>> {
    records
        .iter()
        .map(|r| Cell {
            row_number: r.row_number,
            value: r.record.field(header).unwrap_or(""),
        })
        .collect()
}

/// True when any invalidation blocks progress
pub fn has_errors(invalidations: &[Invalidation]) -> bool {
    invalidations.iter().any(Invalidation::is_error)
}

/// Order invalidations for display: file-level first, then by row number.
///
/// The sort is stable, so validator order is kept within a row.
pub fn sort_for_display(invalidations: &mut [Invalidation]) {
    invalidations.sort_by_key(|i| i.row_number.unwrap_or(0));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_row_number() {
        let inv = Invalidation::row_error(4, "Invalid role \"prof\"");
        assert_eq!(inv.to_string(), "Row 4: Invalid role \"prof\"");
        assert_eq!(Invalidation::schema("Missing header").to_string(), "Missing header");
    }

    #[test]
    fn test_warnings_do_not_count_as_errors() {
        let invalidations = vec![Invalidation::row_warning(2, "already enrolled")];
        assert!(!has_errors(&invalidations));

        let invalidations = vec![
            Invalidation::row_warning(2, "already enrolled"),
            Invalidation::row_error(3, "bad"),
        ];
        assert!(has_errors(&invalidations));
    }

    #[test]
    fn test_sort_is_stable_within_a_row() {
        let mut invalidations = vec![
            Invalidation::row_error(5, "first for 5"),
            Invalidation::row_error(2, "only for 2"),
            Invalidation::row_error(5, "second for 5"),
        ];
        sort_for_display(&mut invalidations);

        let messages: Vec<_> = invalidations.iter().map(|i| i.message.as_str()).collect();
        assert_eq!(messages, vec!["only for 2", "first for 5", "second for 5"]);
    }
}
