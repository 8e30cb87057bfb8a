//! Wire and domain models for the course-management API

use serde::{Deserialize, Serialize};
use std::fmt;

/// A remote container a batch is applied to: a course section, or the course
/// itself when creating sections.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Target {
    pub id: u64,
    pub name: String,
    /// Only reported for sections
    #[serde(default)]
    pub total_students: Option<u32>,
}

/// Course as returned by `GET /api/course/{id}/`
#[derive(Debug, Clone, Deserialize)]
pub struct Course {
    pub id: u64,
    pub name: String,
}

impl From<Course> for Target {
    fn from(course: Course) -> Self {
        Self {
            id: course.id,
            name: course.name,
            total_students: None,
        }
    }
}

/// What kind of targets a feature is applied to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetScope {
    /// The sections of a course
    CourseSections,
    /// The course itself
    Course,
}

/// Reference data a feature checks its records against before submitting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceSource {
    /// Names of the sections that already exist in the course
    ExistingSectionNames,
    /// Login IDs already enrolled in the section
    EnrolledLoginIds,
}

/// Per-mutation auth token, sent as `X-CSRFToken`
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(***)")
    }
}

/// Enrollment as the add-enrollments endpoint expects it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrollmentWire {
    #[serde(rename = "loginId")]
    pub login_id: String,
    pub role: String,
}

/// The stripped records of a batch, in the shape the remote mutation expects.
///
/// Row numbers and other local-only data are gone at this point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireBatch {
    Enrollments(Vec<EnrollmentWire>),
    Sections(Vec<String>),
}

impl WireBatch {
    pub fn len(&self) -> usize {
        match self {
            Self::Enrollments(records) => records.len(),
            Self::Sections(names) => names.len(),
        }
    }

    /// The value of each record that the remote echoes back as `failedInput`
    pub fn keys(&self) -> Vec<&str> {
        match self {
            Self::Enrollments(records) => records.iter().map(|r| r.login_id.as_str()).collect(),
            Self::Sections(names) => names.iter().map(|n| n.as_str()).collect(),
        }
    }
}

/// One rejected row reported by the remote
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteRowError {
    pub canvas_status_code: u16,
    pub message: String,
    #[serde(default)]
    pub failed_input: Option<String>,
}

/// JSON error body: `{"statusCode": n, "errors": [...]}`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub status_code: u16,
    #[serde(default)]
    pub errors: Vec<RemoteRowError>,
}

/// Item of the create-sections response
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CreateSectionItem {
    Failed(RemoteRowError),
    Created(Target),
}

/// What the remote did with a batch that was not rejected outright
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationResult {
    /// Targets the remote created, when the mutation creates any
    pub created: Vec<Target>,
    /// Rows the remote rejected while accepting the rest
    pub failures: Vec<RemoteRowError>,
}

impl MutationResult {
    pub fn from_items(items: Vec<CreateSectionItem>) -> Self {
        let mut result = Self::default();
        for item in items {
            match item {
                CreateSectionItem::Created(target) => result.created.push(target),
                CreateSectionItem::Failed(error) => result.failures.push(error),
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_token_debug_is_redacted() {
        let token = AuthToken::new("secret-value");
        assert_eq!(format!("{:?}", token), "AuthToken(***)");
        assert_eq!(token.as_str(), "secret-value");
    }

    #[test]
    fn test_enrollment_wire_shape() {
        let wire = EnrollmentWire {
            login_id: "studentone".to_string(),
            role: "student".to_string(),
        };
        let json = serde_json::to_value(&wire).unwrap();
        assert_eq!(json, serde_json::json!({"loginId": "studentone", "role": "student"}));
    }

    #[test]
    fn test_mixed_create_response() {
        let body = r#"[
            {"id": 11, "name": "Section 001", "course_id": 5, "total_students": 0},
            {"canvasStatusCode": 400, "message": "Name taken", "failedInput": "Section 002"}
        ]"#;
        let items: Vec<CreateSectionItem> = serde_json::from_str(body).unwrap();
        let result = MutationResult::from_items(items);

        assert_eq!(result.created.len(), 1);
        assert_eq!(result.created[0].name, "Section 001");
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].failed_input.as_deref(), Some("Section 002"));
    }
}
