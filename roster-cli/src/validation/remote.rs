//! Remote-reference validators
//!
//! These compare a column against a set of values fetched from the remote
//! (existing section names, already-enrolled login IDs). Comparison is
//! case-insensitive: the set stores upper-cased values.

use std::collections::HashSet;

use super::{Cell, Invalidation};

/// Upper-cased reference values for one target
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceSet {
    values: HashSet<String>,
}

impl ReferenceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            values: names
                .into_iter()
                .map(|n| n.as_ref().trim().to_uppercase())
                .collect(),
        }
    }

    pub fn contains(&self, value: &str) -> bool {
        self.values.contains(&value.trim().to_uppercase())
    }

    /// Add values learned after a successful (or partially successful) submit
    pub fn merge<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.values
            .extend(names.into_iter().map(|n| n.as_ref().trim().to_uppercase()));
    }
}

/// The fixed set of remote validators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteValidator {
    /// Value already exists remotely; blocks submission
    ExistingName { label: &'static str },
    /// Login ID is already enrolled; shown as a warning only
    AlreadyEnrolled,
}

/// A remote validator bound to the column it checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteCheck {
    pub header: &'static str,
    pub validator: RemoteValidator,
}

impl RemoteCheck {
    pub const fn new(header: &'static str, validator: RemoteValidator) -> Self {
        Self { header, validator }
    }
}

impl RemoteValidator {
    pub fn validate(&self, column: &[Cell<'_>], reference: &ReferenceSet) -> Vec<Invalidation> {
        column
            .iter()
            .filter(|cell| reference.contains(cell.value))
            .map(|cell| match self {
                Self::ExistingName { label } => Invalidation::row_error(
                    cell.row_number,
                    format!("{} already used in this course: \"{}\"", label, cell.value),
                ),
                Self::AlreadyEnrolled => Invalidation::row_warning(
                    cell.row_number,
                    format!(
                        "\"{}\" is already enrolled in this section and will be updated.",
                        cell.value
                    ),
                ),
            })
            .collect()
    }
}
