//! Roster features
//!
//! A feature fixes everything that differs between bulk operations: the record
//! shape, the required headers and row limit, the ordered validator lists, the
//! target it applies to and the wire mapping. The pipeline functions below run
//! the shared validation tiers for any feature.

pub mod enrollment;
pub mod sections;

pub use enrollment::Enrollments;
pub use sections::Sections;

use std::fmt::Debug;

use crate::api::{ReferenceSource, TargetScope, WireBatch};
use crate::csv_parser::CsvParser;
use crate::validation::{
    self, ColumnCheck, Invalidation, RecordShape, ReferenceSet, RemoteCheck, RowNumbered,
    SchemaResult, SchemaValidator,
};

/// A bulk roster operation
pub trait Feature: Send + Sync + 'static {
    type Record: RecordShape + Clone + Debug + PartialEq + Send + Sync + 'static;

    /// Human-readable name, used in prompts and logs
    const TITLE: &'static str;
    /// Template header row and schema contract
    const REQUIRED_HEADERS: &'static [&'static str];
    const MAX_ROWS: usize;
    /// Example row written to the template, one value per required header
    const SAMPLE_ROW: &'static [&'static str];
    const TEMPLATE_FILE_NAME: &'static str;
    const TARGET_SCOPE: TargetScope;
    /// Reference data to fetch in review, if any
    const REFERENCE: Option<ReferenceSource>;

    /// Row validators, in the order they run
    fn row_checks() -> Vec<ColumnCheck>;

    /// Remote validators, run once the reference data is available
    fn remote_checks() -> Vec<RemoteCheck>;

    /// Strip row numbers and map records to the wire shape
    fn to_wire(records: &[Self::Record]) -> WireBatch;
}

/// Result of the local tiers (parse, schema, rows) for one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalOutcome<R> {
    /// Unreadable file or failed schema; no row checks ran
    SchemaInvalid(Vec<Invalidation>),
    /// At least one row check failed
    RowInvalid {
        invalidations: Vec<Invalidation>,
        skipped_rows: Vec<usize>,
    },
    Valid {
        records: Vec<RowNumbered<R>>,
        skipped_rows: Vec<usize>,
    },
}

/// Parse a file and run the schema and row validators for a feature
pub fn validate_file<F: Feature>(bytes: &[u8]) -> LocalOutcome<F::Record> {
    let parsed = match CsvParser::default().parse(bytes) {
        Ok(parsed) => parsed,
        Err(failure) => {
            log::debug!("{} file could not be parsed: {}", F::TITLE, failure);
            return LocalOutcome::SchemaInvalid(vec![Invalidation::schema(failure.reason)]);
        }
    };

    let schema = SchemaValidator::<F::Record>::new(F::REQUIRED_HEADERS, F::MAX_ROWS);
    let (records, skipped_rows) = match schema.validate(&parsed) {
        SchemaResult::Valid {
            records,
            skipped_rows,
        } => (records, skipped_rows),
        SchemaResult::Invalid(invalidations) => return LocalOutcome::SchemaInvalid(invalidations),
    };

    let invalidations = validate_rows::<F>(&records);
    if validation::has_errors(&invalidations) {
        log::debug!(
            "{} file has {} row invalidations",
            F::TITLE,
            invalidations.len()
        );
        return LocalOutcome::RowInvalid {
            invalidations,
            skipped_rows,
        };
    }

    LocalOutcome::Valid {
        records,
        skipped_rows,
    }
}

/// Run every row validator of a feature and collect the results in display order
pub fn validate_rows<F: Feature>(records: &[RowNumbered<F::Record>]) -> Vec<Invalidation> {
    let mut invalidations: Vec<Invalidation> = F::row_checks()
        .iter()
        .flat_map(|check| {
            let column = validation::column(records, check.header);
            check.validator.validate(&column)
        })
        .collect();
    validation::sort_for_display(&mut invalidations);
    invalidations
}

/// Run every remote validator of a feature against fetched reference data
pub fn validate_remote<F: Feature>(
    records: &[RowNumbered<F::Record>],
    reference: &ReferenceSet,
) -> Vec<Invalidation> {
    let mut invalidations: Vec<Invalidation> = F::remote_checks()
        .iter()
        .flat_map(|check| {
            let column = validation::column(records, check.header);
            check.validator.validate(&column, reference)
        })
        .collect();
    validation::sort_for_display(&mut invalidations);
    invalidations
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema_invalidations<R: Debug>(outcome: LocalOutcome<R>) -> Vec<Invalidation> {
        match outcome {
            LocalOutcome::SchemaInvalid(invalidations) => invalidations,
            other => panic!("expected schema invalidation, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_header_produces_no_row_invalidations() {
        // Bad role and bad login ID would both fire if row checks ran
        let outcome = validate_file::<Enrollments>(b"LOGIN_ID\nbad id!\nbad id!\n");
        let invalidations = schema_invalidations(outcome);

        assert_eq!(invalidations.len(), 1);
        assert!(invalidations[0].message.contains("ROLE"));
        assert!(invalidations.iter().all(|i| i.row_number.is_none()));
    }

    #[test]
    fn test_parse_failure_is_schema_invalidation() {
        let invalidations = schema_invalidations(validate_file::<Sections>(&[0xff, 0xfe, 0x00]));
        assert_eq!(invalidations.len(), 1);
        assert!(invalidations[0].row_number.is_none());
    }

    #[test]
    fn test_row_numbers_are_stable_under_filtering() {
        let input = "LOGIN_ID,ROLE\na,student\n,student\nb,teacher\nc,ta\n";
        match validate_file::<Enrollments>(input.as_bytes()) {
            LocalOutcome::Valid {
                records,
                skipped_rows,
            } => {
                let numbers: Vec<_> = records.iter().map(|r| r.row_number).collect();
                assert_eq!(numbers, vec![2, 4, 5]);
                assert_eq!(skipped_rows, vec![3]);
            }
            other => panic!("expected valid outcome, got {:?}", other),
        }
    }

    #[test]
    fn test_all_row_validators_run_and_sort_by_row() {
        let input = "LOGIN_ID,ROLE\nok,student\nbad id,professor\nok,ta\n";
        match validate_file::<Enrollments>(input.as_bytes()) {
            LocalOutcome::RowInvalid { invalidations, .. } => {
                let rows: Vec<_> = invalidations.iter().filter_map(|i| i.row_number).collect();
                // Role and login ID on row 3, duplicate on rows 2 and 4
                assert_eq!(rows, vec![2, 3, 3, 4]);
                assert!(invalidations[1].message.contains("professor"));
                assert!(invalidations[2].message.contains("bad id"));
            }
            other => panic!("expected row invalidations, got {:?}", other),
        }
    }

    #[test]
    fn test_row_numbers_point_at_file_lines() {
        match validate_file::<Sections>(b"SECTION_NAME\nLab\n\nLab\n") {
            LocalOutcome::RowInvalid { invalidations, .. } => {
                let rows: Vec<_> = invalidations.iter().filter_map(|i| i.row_number).collect();
                assert_eq!(rows, vec![2, 4]);
            }
            other => panic!("expected row invalidations, got {:?}", other),
        }

        let input = "LOGIN_ID,ROLE\nok,\"stu\ndent\"\nbad id,student\n";
        match validate_file::<Enrollments>(input.as_bytes()) {
            LocalOutcome::RowInvalid { invalidations, .. } => {
                let bad_id = invalidations
                    .iter()
                    .find(|i| i.message.contains("bad id"))
                    .expect("login ID invalidation");
                assert_eq!(bad_id.row_number, Some(4));
            }
            other => panic!("expected row invalidations, got {:?}", other),
        }
    }

    #[test]
    fn test_max_rows_boundary_for_sections() {
        let rows_at_limit: String = (1..=Sections::MAX_ROWS)
            .map(|i| format!("Section {:03}\n", i))
            .collect();
        let at_limit = format!("SECTION_NAME\n{}", rows_at_limit);
        assert!(matches!(
            validate_file::<Sections>(at_limit.as_bytes()),
            LocalOutcome::Valid { .. }
        ));

        // One over the limit, with a duplicate that would otherwise be reported
        let over_limit = format!("{}Section 001\n", at_limit);
        let invalidations = schema_invalidations(validate_file::<Sections>(over_limit.as_bytes()));
        assert_eq!(invalidations.len(), 1);
        assert!(invalidations[0].message.contains("maximum allowed is 60"));
    }

    #[test]
    fn test_remote_conflict_for_sections() {
        let records = match validate_file::<Sections>(b"SECTION_NAME\nSection 001\nLab\n") {
            LocalOutcome::Valid { records, .. } => records,
            other => panic!("expected valid outcome, got {:?}", other),
        };
        let reference = ReferenceSet::from_names(["SECTION 001"]);

        let invalidations = validate_remote::<Sections>(&records, &reference);
        assert_eq!(invalidations.len(), 1);
        assert_eq!(invalidations[0].row_number, Some(2));
        assert!(invalidations[0].is_error());
    }
}
