//! HTTP implementation of [`CourseApi`]

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;

use super::error::ApiError;
use super::models::{
    AuthToken, Course, CreateSectionItem, MutationResult, ReferenceSource, Target, TargetScope,
    WireBatch,
};
use super::CourseApi;

const CSRF_HEADER: &str = "X-CSRFToken";

/// Client for the course-management backend
pub struct CanvasClient {
    http: Client,
    base_url: String,
    api_token: Option<String>,
}

impl CanvasClient {
    pub fn new(base_url: &str, api_token: Option<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("roster-cli/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let response = self.authorize(request).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let error = ApiError::from_response(status.as_u16(), &body);
        log::error!("Remote request failed ({}): {}", status, error.message);
        Err(error)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = self.send(request).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::transport(format!("Could not read the remote response: {}", e)))
    }

    async fn list_sections(&self, course_id: u64) -> Result<Vec<Target>, ApiError> {
        let url = self.url(&format!("/api/course/{}/sections/", course_id));
        log::info!("Listing sections of course {}", course_id);
        self.send_json(self.http.get(&url)).await
    }

    async fn create_sections(
        &self,
        course_id: u64,
        names: &[String],
        auth: &AuthToken,
    ) -> Result<MutationResult, ApiError> {
        let url = self.url(&format!("/api/course/{}/sections/", course_id));
        log::info!("Creating {} sections in course {}", names.len(), course_id);

        let request = self
            .http
            .post(&url)
            .header(CSRF_HEADER, auth.as_str())
            .json(&json!({ "sections": names }));
        let items: Vec<CreateSectionItem> = self.send_json(request).await?;
        let result = MutationResult::from_items(items);

        if result.created.is_empty() && !result.failures.is_empty() {
            return Err(ApiError::from_row_errors(result.failures));
        }
        Ok(result)
    }
}

#[async_trait]
impl CourseApi for CanvasClient {
    async fn list_targets(
        &self,
        scope: TargetScope,
        course_id: u64,
    ) -> Result<Vec<Target>, ApiError> {
        match scope {
            TargetScope::CourseSections => self.list_sections(course_id).await,
            TargetScope::Course => {
                let url = self.url(&format!("/api/course/{}/", course_id));
                let course: Course = self.send_json(self.http.get(&url)).await?;
                Ok(vec![course.into()])
            }
        }
    }

    async fn create_target(
        &self,
        course_id: u64,
        name: &str,
        auth: &AuthToken,
    ) -> Result<Target, ApiError> {
        let mut result = self
            .create_sections(course_id, &[name.to_string()], auth)
            .await?;
        if let Some(error) = result.failures.pop() {
            return Err(ApiError::from_row_errors(vec![error]));
        }
        result
            .created
            .pop()
            .ok_or_else(|| ApiError::transport("The remote did not return the created section."))
    }

    async fn fetch_reference(
        &self,
        source: ReferenceSource,
        target: &Target,
    ) -> Result<Vec<String>, ApiError> {
        match source {
            ReferenceSource::ExistingSectionNames => {
                let sections = self.list_sections(target.id).await?;
                Ok(sections.into_iter().map(|s| s.name).collect())
            }
            ReferenceSource::EnrolledLoginIds => {
                let url = self.url("/api/sections/students/");
                log::info!("Fetching enrolled login IDs of section {}", target.id);
                let request = self
                    .http
                    .get(&url)
                    .query(&[("section_ids", target.id.to_string())]);
                self.send_json(request).await
            }
        }
    }

    async fn mutate(
        &self,
        target: &Target,
        batch: &WireBatch,
        auth: &AuthToken,
    ) -> Result<MutationResult, ApiError> {
        match batch {
            WireBatch::Sections(names) => self.create_sections(target.id, names, auth).await,
            WireBatch::Enrollments(enrollments) => {
                let url = self.url(&format!("/api/sections/{}/enrollments/", target.id));
                log::info!(
                    "Adding {} enrollments to section {}",
                    enrollments.len(),
                    target.id
                );
                let request = self
                    .http
                    .post(&url)
                    .header(CSRF_HEADER, auth.as_str())
                    .json(&json!({ "enrollments": enrollments }));
                self.send(request).await?;
                Ok(MutationResult::default())
            }
        }
    }
}
