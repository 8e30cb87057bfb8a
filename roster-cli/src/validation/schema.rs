//! Schema validation
//!
//! Checks a parsed file against a required-header contract, a maximum row
//! count and a record shape. Generic over the record type; it knows nothing
//! about what the columns mean.

use std::marker::PhantomData;

use super::{Invalidation, RowNumbered};
use crate::csv_parser::{ParsedFile, RawRow};

/// A record shape that raw rows can be checked against
pub trait RecordShape: Sized {
    /// Build the typed record if the row has the required shape
    fn from_row(row: &RawRow) -> Option<Self>;

    /// Value of a column by normalized header name
    fn field(&self, header: &str) -> Option<&str>;
}

/// Outcome of schema validation. Never carries both records and invalidations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaResult<T> {
    Valid {
        records: Vec<RowNumbered<T>>,
        /// Row numbers dropped because they did not match the record shape
        skipped_rows: Vec<usize>,
    },
    Invalid(Vec<Invalidation>),
}

/// Validator for one record shape
#[derive(Debug, Clone)]
pub struct SchemaValidator<T> {
    required_headers: &'static [&'static str],
    max_rows: usize,
    _shape: PhantomData<T>,
}

impl<T: RecordShape> SchemaValidator<T> {
    pub fn new(required_headers: &'static [&'static str], max_rows: usize) -> Self {
        Self {
            required_headers,
            max_rows,
            _shape: PhantomData,
        }
    }

    /// Validate a parsed file.
    ///
    /// Checks run in order and stop at the first failing stage: headers
    /// present, required headers present, row limit, record shape. Rows that
    /// do not match the shape are skipped; it is only an error when none match.
    pub fn validate(&self, file: &ParsedFile) -> SchemaResult<T> {
        let headers = match &file.headers {
            Some(headers) if headers.iter().any(|h| !h.is_empty()) => headers,
            _ => {
                return SchemaResult::Invalid(vec![Invalidation::schema(format!(
                    "The file has no header row. Expected columns: {}.",
                    self.required_headers.join(", ")
                ))]);
            }
        };

        let missing: Vec<Invalidation> = self
            .required_headers
            .iter()
            .filter(|required| !headers.iter().any(|h| h == *required))
            .map(|required| {
                Invalidation::schema(format!("Missing required column header: {}", required))
            })
            .collect();
        if !missing.is_empty() {
            log::debug!("Schema check failed: {} missing headers", missing.len());
            return SchemaResult::Invalid(missing);
        }

        if file.rows.len() > self.max_rows {
            return SchemaResult::Invalid(vec![Invalidation::schema(format!(
                "The file contains {} rows; the maximum allowed is {}.",
                file.rows.len(),
                self.max_rows
            ))]);
        }

        if file.rows.is_empty() {
            return SchemaResult::Invalid(vec![Invalidation::schema(
                "The file contains no data rows.",
            )]);
        }

        let mut records = Vec::with_capacity(file.rows.len());
        let mut skipped_rows = Vec::new();
        for (row_number, row) in &file.rows {
            let row_number = *row_number;
            match T::from_row(row) {
                Some(record) => records.push(RowNumbered { row_number, record }),
                None => skipped_rows.push(row_number),
            }
        }

        if records.is_empty() {
            return SchemaResult::Invalid(vec![Invalidation::schema(format!(
                "No rows in the file have values for all required columns ({}).",
                self.required_headers.join(", ")
            ))]);
        }

        if !skipped_rows.is_empty() {
            log::warn!(
                "Skipping {} rows missing required values: {:?}",
                skipped_rows.len(),
                skipped_rows
            );
        }

        SchemaResult::Valid {
            records,
            skipped_rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csv_parser::CsvParser;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Pair {
        a: String,
        b: String,
    }

    impl RecordShape for Pair {
        fn from_row(row: &RawRow) -> Option<Self> {
            Some(Self {
                a: row.get("A")?.to_string(),
                b: row.get("B")?.to_string(),
            })
        }

        fn field(&self, header: &str) -> Option<&str> {
            match header {
                "A" => Some(self.a.as_str()),
                "B" => Some(self.b.as_str()),
                _ => None,
            }
        }
    }

    const HEADERS: &[&str] = &["A", "B"];

    fn validate(input: &str, max_rows: usize) -> SchemaResult<Pair> {
        let parsed = CsvParser::default().parse(input.as_bytes()).unwrap();
        SchemaValidator::<Pair>::new(HEADERS, max_rows).validate(&parsed)
    }

    fn row_numbers(result: SchemaResult<Pair>) -> Vec<usize> {
        match result {
            SchemaResult::Valid { records, .. } => records.iter().map(|r| r.row_number).collect(),
            SchemaResult::Invalid(i) => panic!("unexpected invalidations: {:?}", i),
        }
    }

    fn invalidations(result: SchemaResult<Pair>) -> Vec<Invalidation> {
        match result {
            SchemaResult::Invalid(invalidations) => invalidations,
            SchemaResult::Valid { .. } => panic!("expected invalid result"),
        }
    }

    #[test]
    fn test_valid_file() {
        match validate("A,B\n1,2\n3,4\n", 10) {
            SchemaResult::Valid {
                records,
                skipped_rows,
            } => {
                assert_eq!(records.len(), 2);
                assert_eq!(records[0].row_number, 2);
                assert_eq!(records[1].row_number, 3);
                assert_eq!(records[1].record.a, "3");
                assert!(skipped_rows.is_empty());
            }
            SchemaResult::Invalid(i) => panic!("unexpected invalidations: {:?}", i),
        }
    }

    #[test]
    fn test_no_headers() {
        let parsed = CsvParser::default().parse(b"").unwrap();
        let result = SchemaValidator::<Pair>::new(HEADERS, 10).validate(&parsed);
        let invalidations = invalidations(result);
        assert_eq!(invalidations.len(), 1);
        assert!(invalidations[0].message.contains("no header row"));
    }

    #[test]
    fn test_one_invalidation_per_missing_header() {
        let invalidations = invalidations(validate("C,D\n1,2\n", 10));
        assert_eq!(invalidations.len(), 2);
        assert!(invalidations[0].message.ends_with(": A"));
        assert!(invalidations[1].message.ends_with(": B"));
        assert!(invalidations.iter().all(|i| i.row_number.is_none()));
    }

    #[test]
    fn test_max_rows_boundary() {
        assert_eq!(row_numbers(validate("A,B\n1,2\n3,4\n", 2)), vec![2, 3]);

        let invalidations = invalidations(validate("A,B\n1,2\n3,4\n5,6\n", 2));
        assert_eq!(invalidations.len(), 1);
        assert!(invalidations[0].message.contains("maximum allowed is 2"));
    }

    #[test]
    fn test_too_many_rows_skips_shape_check() {
        // Every row is malformed, but only the row limit is reported
        let invalidations = invalidations(validate("A,B\n1\n2\n3\n", 2));
        assert_eq!(invalidations.len(), 1);
        assert!(invalidations[0].message.contains("3 rows"));
    }

    #[test]
    fn test_header_only_file() {
        let invalidations = invalidations(validate("A,B\n", 10));
        assert_eq!(invalidations.len(), 1);
        assert!(invalidations[0].message.contains("no data rows"));
    }

    // Rows missing a required value are dropped, not fatal, and keep their numbers
    #[test]
    fn test_malformed_rows_are_skipped_permissively() {
        match validate("A,B\n1,2\n3\n5,6\n", 10) {
            SchemaResult::Valid {
                records,
                skipped_rows,
            } => {
                let numbers: Vec<_> = records.iter().map(|r| r.row_number).collect();
                assert_eq!(numbers, vec![2, 4]);
                assert_eq!(skipped_rows, vec![3]);
            }
            SchemaResult::Invalid(i) => panic!("unexpected invalidations: {:?}", i),
        }
    }

    #[test]
    fn test_row_numbers_follow_file_lines() {
        let numbers = row_numbers(validate("A,B\n1,2\n\n3,\"x\ny\"\n5,6\n", 10));
        assert_eq!(numbers, vec![2, 4, 6]);
    }

    #[test]
    fn test_no_matching_rows_is_wrong_file() {
        let invalidations = invalidations(validate("A,B\n1\n3\n", 10));
        assert_eq!(invalidations.len(), 1);
        assert!(invalidations[0].message.contains("No rows"));
    }
}
