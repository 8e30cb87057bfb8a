//! Add users to a single section

use std::fmt;
use std::str::FromStr;

use super::Feature;
use crate::api::{EnrollmentWire, ReferenceSource, TargetScope, WireBatch};
use crate::csv_parser::RawRow;
use crate::validation::{ColumnCheck, RecordShape, RemoteCheck, RemoteValidator, RowValidator};

pub const LOGIN_ID: &str = "LOGIN_ID";
pub const ROLE: &str = "ROLE";

/// Course role a user can be enrolled with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Student,
    Teacher,
    Ta,
    Observer,
    Designer,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Student,
        Role::Teacher,
        Role::Ta,
        Role::Observer,
        Role::Designer,
    ];

    /// Tags accepted in the `ROLE` column, in display order
    pub const TAGS: &'static [&'static str] = &["student", "teacher", "ta", "observer", "designer"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Teacher => "teacher",
            Role::Ta => "ta",
            Role::Observer => "observer",
            Role::Designer => "designer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown role: {}", s))
    }
}

/// One enrollment row. The role is kept as typed in the file until the
/// role validator has looked at it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrollmentRecord {
    pub login_id: String,
    pub role: String,
}

impl RecordShape for EnrollmentRecord {
    fn from_row(row: &RawRow) -> Option<Self> {
        Some(Self {
            login_id: row.get(LOGIN_ID)?.to_string(),
            role: row.get(ROLE)?.to_string(),
        })
    }

    fn field(&self, header: &str) -> Option<&str> {
        match header {
            LOGIN_ID => Some(self.login_id.as_str()),
            ROLE => Some(self.role.as_str()),
            _ => None,
        }
    }
}

/// Enrollment feature marker
#[derive(Debug, Clone, Copy, Default)]
pub struct Enrollments;

impl Feature for Enrollments {
    type Record = EnrollmentRecord;

    const TITLE: &'static str = "Add users";
    const REQUIRED_HEADERS: &'static [&'static str] = &[LOGIN_ID, ROLE];
    const MAX_ROWS: usize = 400;
    const SAMPLE_ROW: &'static [&'static str] = &["studentone", "student"];
    const TEMPLATE_FILE_NAME: &'static str = "add_users.csv";
    const TARGET_SCOPE: TargetScope = TargetScope::CourseSections;
    const REFERENCE: Option<ReferenceSource> = Some(ReferenceSource::EnrolledLoginIds);

    fn row_checks() -> Vec<ColumnCheck> {
        vec![
            ColumnCheck::new(ROLE, RowValidator::Role { accepted: Role::TAGS }),
            ColumnCheck::new(LOGIN_ID, RowValidator::LoginId),
            ColumnCheck::new(LOGIN_ID, RowValidator::DuplicateInFile { label: "login ID" }),
        ]
    }

    fn remote_checks() -> Vec<RemoteCheck> {
        vec![RemoteCheck::new(LOGIN_ID, RemoteValidator::AlreadyEnrolled)]
    }

    fn to_wire(records: &[EnrollmentRecord]) -> WireBatch {
        WireBatch::Enrollments(
            records
                .iter()
                .map(|r| EnrollmentWire {
                    login_id: r.login_id.clone(),
                    role: r
                        .role
                        .parse::<Role>()
                        .map(|role| role.as_str().to_string())
                        .unwrap_or_else(|_| r.role.to_lowercase()),
                })
                .collect(),
        )
    }
}
