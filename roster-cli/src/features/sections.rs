//! Bulk section creation

use super::Feature;
use crate::api::{ReferenceSource, TargetScope, WireBatch};
use crate::csv_parser::RawRow;
use crate::validation::{ColumnCheck, RecordShape, RemoteCheck, RemoteValidator, RowValidator};

pub const SECTION_NAME: &str = "SECTION_NAME";

pub const MAX_SECTION_NAME_LENGTH: usize = 255;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionRecord {
    pub name: String,
}

impl RecordShape for SectionRecord {
    fn from_row(row: &RawRow) -> Option<Self> {
        row.get(SECTION_NAME).map(|name| Self {
            name: name.to_string(),
        })
    }

    fn field(&self, header: &str) -> Option<&str> {
        (header == SECTION_NAME).then_some(self.name.as_str())
    }
}

/// Section-creation feature marker
#[derive(Debug, Clone, Copy, Default)]
pub struct Sections;

impl Feature for Sections {
    type Record = SectionRecord;

    const TITLE: &'static str = "Create sections";
    const REQUIRED_HEADERS: &'static [&'static str] = &[SECTION_NAME];
    const MAX_ROWS: usize = 60;
    const SAMPLE_ROW: &'static [&'static str] = &["Section 001"];
    const TEMPLATE_FILE_NAME: &'static str = "sections.csv";
    const TARGET_SCOPE: TargetScope = TargetScope::Course;
    const REFERENCE: Option<ReferenceSource> = Some(ReferenceSource::ExistingSectionNames);

    fn row_checks() -> Vec<ColumnCheck> {
        vec![
            ColumnCheck::new(
                SECTION_NAME,
                RowValidator::DuplicateInFile {
                    label: "section name",
                },
            ),
            ColumnCheck::new(
                SECTION_NAME,
                RowValidator::MaxLength {
                    label: "Section name",
                    max: MAX_SECTION_NAME_LENGTH,
                },
            ),
        ]
    }

    fn remote_checks() -> Vec<RemoteCheck> {
        vec![RemoteCheck::new(
            SECTION_NAME,
            RemoteValidator::ExistingName {
                label: "Section name",
            },
        )]
    }

    fn to_wire(records: &[SectionRecord]) -> WireBatch {
        WireBatch::Sections(records.iter().map(|r| r.name.clone()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{LocalOutcome, validate_file};

    #[test]
    fn test_long_section_name() {
        let input = format!("SECTION_NAME\nok\n{}\n", "n".repeat(MAX_SECTION_NAME_LENGTH + 1));
        match validate_file::<Sections>(input.as_bytes()) {
            LocalOutcome::RowInvalid { invalidations, .. } => {
                assert_eq!(invalidations.len(), 1);
                assert_eq!(invalidations[0].row_number, Some(3));
                assert!(invalidations[0].message.contains("maximum is 255"));
            }
            other => panic!("expected row invalidations, got {:?}", other),
        }
    }

    #[test]
    fn test_wire_is_names_only() {
        let records = vec![
            SectionRecord {
                name: "Lab A".to_string(),
            },
            SectionRecord {
                name: "Lab B".to_string(),
            },
        ];
        assert_eq!(
            Sections::to_wire(&records),
            WireBatch::Sections(vec!["Lab A".to_string(), "Lab B".to_string()])
        );
    }
}
