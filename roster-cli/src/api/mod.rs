//! Course-management API
//!
//! The workflow only talks to the remote through [`CourseApi`]. [`CanvasClient`]
//! implements it over HTTP; tests use an in-memory mock.

pub mod client;
pub mod error;
pub mod models;

#[cfg(test)]
pub mod mock;

pub use client::CanvasClient;
pub use error::ApiError;
pub use models::{
    AuthToken, EnrollmentWire, MutationResult, ReferenceSource, RemoteRowError, Target,
    TargetScope, WireBatch,
};

use async_trait::async_trait;

/// Remote operations the workflow depends on
#[async_trait]
pub trait CourseApi: Send + Sync {
    /// List the targets of a course for the given scope
    async fn list_targets(&self, scope: TargetScope, course_id: u64)
    -> Result<Vec<Target>, ApiError>;

    /// Create a new section in the course
    async fn create_target(
        &self,
        course_id: u64,
        name: &str,
        auth: &AuthToken,
    ) -> Result<Target, ApiError>;

    /// Fetch the raw reference values for a target (not yet normalized)
    async fn fetch_reference(
        &self,
        source: ReferenceSource,
        target: &Target,
    ) -> Result<Vec<String>, ApiError>;

    /// Apply a batch to a target.
    ///
    /// `Err` means the whole batch was rejected or never reached the remote.
    /// Row rejections alongside accepted rows come back in
    /// [`MutationResult::failures`].
    async fn mutate(
        &self,
        target: &Target,
        batch: &WireBatch,
        auth: &AuthToken,
    ) -> Result<MutationResult, ApiError>;
}
