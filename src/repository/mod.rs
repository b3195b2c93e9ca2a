pub mod postgres;

#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{
    application::{
        Application, ApplicationStatus, DemoResult, InterviewResult, RescheduleReason,
    },
    rubric::Rubric,
    score::{RatedCriterion, Score},
    user::User,
};

/// Storage failures as seen by the lifecycle and scoring engines. The two
/// conflict variants carry the constraint semantics the engines rely on;
/// everything else is an opaque backend failure.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Conditional update found a different row version than expected.
    #[error("row was modified concurrently")]
    VersionConflict,
    /// Insert violated a uniqueness constraint.
    #[error("uniqueness constraint violated")]
    UniqueViolation,
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

#[derive(Debug, Clone)]
pub struct NewApplication {
    pub applicant_id: i32,
    pub attempt_number: i32,
    pub documents: Option<serde_json::Value>,
}

/// Partial update applied to an application row. `None` leaves the column
/// untouched; no lifecycle operation ever clears a field back to null.
#[derive(Debug, Clone, Default)]
pub struct ApplicationChanges {
    pub status: Option<ApplicationStatus>,
    pub result: Option<DemoResult>,
    pub interview_result: Option<InterviewResult>,
    pub total_score: Option<f64>,
    pub interview_eligible: Option<bool>,
    pub demo_schedule: Option<DateTime<Utc>>,
    pub demo_location: Option<String>,
    pub demo_duration: Option<i32>,
    pub demo_notes: Option<String>,
    pub demo_reschedule_count: Option<i32>,
    pub demo_reschedule_reason: Option<RescheduleReason>,
    pub interview_schedule: Option<DateTime<Utc>>,
    pub interview_reschedule_count: Option<i32>,
    pub interview_reschedule_reason: Option<RescheduleReason>,
    pub interview_score: Option<f64>,
    pub hr_notes: Option<String>,
    pub interview_notes: Option<String>,
}

/// Durable store behind the lifecycle and scoring engines. Implementations
/// must make `update_application` a compare-and-swap on `updated_at` so that
/// read-check-write sequences on the same application cannot interleave.
#[async_trait]
pub trait Repository: Send + Sync {
    async fn find_application(&self, id: i32) -> Result<Option<Application>, StoreError>;

    async fn find_active_by_applicant(
        &self,
        applicant_id: i32,
    ) -> Result<Option<Application>, StoreError>;

    async fn last_attempt_number(&self, applicant_id: i32) -> Result<Option<i32>, StoreError>;

    async fn insert_application(&self, new: NewApplication) -> Result<Application, StoreError>;

    async fn update_application(
        &self,
        id: i32,
        expected_updated_at: DateTime<Utc>,
        changes: ApplicationChanges,
    ) -> Result<Application, StoreError>;

    /// Returns false when no row with the given id existed.
    async fn delete_application(&self, id: i32) -> Result<bool, StoreError>;

    async fn list_applications(&self) -> Result<Vec<Application>, StoreError>;

    async fn list_applications_for_applicant(
        &self,
        applicant_id: i32,
    ) -> Result<Vec<Application>, StoreError>;

    async fn find_user(&self, id: i32) -> Result<Option<User>, StoreError>;

    async fn list_hr_users(&self) -> Result<Vec<User>, StoreError>;

    async fn insert_rubric(
        &self,
        name: &str,
        max_score: f64,
        weight: f64,
    ) -> Result<Rubric, StoreError>;

    async fn find_rubric(&self, id: i32) -> Result<Option<Rubric>, StoreError>;

    async fn list_rubrics(&self, include_retired: bool) -> Result<Vec<Rubric>, StoreError>;

    async fn retire_rubric(&self, id: i32) -> Result<Rubric, StoreError>;

    async fn delete_rubric(&self, id: i32) -> Result<(), StoreError>;

    async fn rubric_has_scores(&self, rubric_id: i32) -> Result<bool, StoreError>;

    async fn upsert_score(
        &self,
        application_id: i32,
        rubric_id: i32,
        score_value: f64,
        comments: Option<&str>,
    ) -> Result<Score, StoreError>;

    /// Scores for one application joined with their rubric's weight and
    /// maximum, in rubric id order.
    async fn rated_criteria(
        &self,
        application_id: i32,
    ) -> Result<Vec<RatedCriterion>, StoreError>;
}
