//! In-memory [`CourseApi`] for tests

use async_trait::async_trait;
use std::sync::Mutex;

use super::{
    ApiError, AuthToken, CourseApi, MutationResult, ReferenceSource, Target, TargetScope,
    WireBatch,
};

/// Scripted responses plus a record of every mutation received
#[derive(Default)]
pub struct MockApi {
    pub targets: Vec<Target>,
    pub list_error: Option<ApiError>,
    pub reference: Vec<String>,
    pub reference_error: Option<ApiError>,
    pub mutate_result: Option<Result<MutationResult, ApiError>>,
    pub mutations: Mutex<Vec<(u64, WireBatch, AuthToken)>>,
    /// Names passed to `create_target`
    pub created: Mutex<Vec<String>>,
}

impl MockApi {
    pub fn with_targets(targets: Vec<Target>) -> Self {
        Self {
            targets,
            ..Self::default()
        }
    }

    pub fn mutation_count(&self) -> usize {
        self.mutations.lock().unwrap().len()
    }
}

pub fn target(id: u64, name: &str) -> Target {
    Target {
        id,
        name: name.to_string(),
        total_students: Some(0),
    }
}

#[async_trait]
impl CourseApi for MockApi {
    async fn list_targets(
        &self,
        _scope: TargetScope,
        _course_id: u64,
    ) -> Result<Vec<Target>, ApiError> {
        match &self.list_error {
            Some(error) => Err(error.clone()),
            None => Ok(self.targets.clone()),
        }
    }

    async fn create_target(
        &self,
        _course_id: u64,
        name: &str,
        _auth: &AuthToken,
    ) -> Result<Target, ApiError> {
        self.created.lock().unwrap().push(name.to_string());
        Ok(target(900, name))
    }

    async fn fetch_reference(
        &self,
        _source: ReferenceSource,
        _target: &Target,
    ) -> Result<Vec<String>, ApiError> {
        match &self.reference_error {
            Some(error) => Err(error.clone()),
            None => Ok(self.reference.clone()),
        }
    }

    async fn mutate(
        &self,
        target: &Target,
        batch: &WireBatch,
        auth: &AuthToken,
    ) -> Result<MutationResult, ApiError> {
        self.mutations
            .lock()
            .unwrap()
            .push((target.id, batch.clone(), auth.clone()));
        self.mutate_result
            .clone()
            .unwrap_or_else(|| Ok(MutationResult::default()))
    }
}
