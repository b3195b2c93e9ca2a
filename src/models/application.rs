use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Application {
    pub id: i32,
    pub applicant_id: i32,
    pub attempt_number: i32,
    pub status: ApplicationStatus,
    pub result: Option<DemoResult>,
    pub interview_result: Option<InterviewResult>,
    pub total_score: Option<f64>,
    pub interview_eligible: bool,
    pub demo_schedule: Option<DateTime<Utc>>,
    pub demo_location: Option<String>,
    pub demo_duration: Option<i32>,
    pub demo_notes: Option<String>,
    pub demo_reschedule_count: i32,
    pub demo_reschedule_reason: Option<RescheduleReason>,
    pub interview_schedule: Option<DateTime<Utc>>,
    pub interview_reschedule_count: i32,
    pub interview_reschedule_reason: Option<RescheduleReason>,
    pub interview_score: Option<f64>,
    pub hr_notes: Option<String>,
    pub interview_notes: Option<String>,
    pub documents: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Application {
    /// Pending and approved applications block the applicant from submitting
    /// a new attempt.
    pub fn is_active(&self) -> bool {
        matches!(
            self.status,
            ApplicationStatus::Pending | ApplicationStatus::Approved
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "application_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "demo_result", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DemoResult {
    Passed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "interview_result", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InterviewResult {
    Passed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "reschedule_reason", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RescheduleReason {
    ApplicantNoShow,
    School,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CreateApplicationRequest {
    pub documents: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct DecisionRequest {
    #[validate(length(max = 4000))]
    pub hr_notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ScheduleDemoRequest {
    pub demo_schedule: DateTime<Utc>,
    #[validate(length(max = 255))]
    pub demo_location: Option<String>,
    pub demo_duration: Option<i32>,
    #[validate(length(max = 4000))]
    pub demo_notes: Option<String>,
    pub reschedule_reason: Option<RescheduleReason>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleInterviewRequest {
    pub interview_schedule: DateTime<Utc>,
    pub reschedule_reason: Option<RescheduleReason>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RateInterviewRequest {
    pub interview_score: Option<f64>,
    pub interview_result: InterviewResult,
    #[validate(length(max = 4000))]
    pub interview_notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ApplicationResponse {
    pub id: i32,
    pub applicant_id: i32,
    pub attempt_number: i32,
    pub status: ApplicationStatus,
    pub result: Option<DemoResult>,
    pub interview_result: Option<InterviewResult>,
    pub total_score: Option<f64>,
    pub interview_eligible: bool,
    pub demo_schedule: Option<DateTime<Utc>>,
    pub demo_location: Option<String>,
    pub demo_duration: Option<i32>,
    pub demo_notes: Option<String>,
    pub demo_reschedule_count: i32,
    pub demo_reschedule_reason: Option<RescheduleReason>,
    pub interview_schedule: Option<DateTime<Utc>>,
    pub interview_reschedule_count: i32,
    pub interview_reschedule_reason: Option<RescheduleReason>,
    pub interview_score: Option<f64>,
    pub hr_notes: Option<String>,
    pub interview_notes: Option<String>,
    pub documents: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Application> for ApplicationResponse {
    fn from(app: Application) -> Self {
        Self {
            id: app.id,
            applicant_id: app.applicant_id,
            attempt_number: app.attempt_number,
            status: app.status,
            result: app.result,
            interview_result: app.interview_result,
            total_score: app.total_score,
            interview_eligible: app.interview_eligible,
            demo_schedule: app.demo_schedule,
            demo_location: app.demo_location,
            demo_duration: app.demo_duration,
            demo_notes: app.demo_notes,
            demo_reschedule_count: app.demo_reschedule_count,
            demo_reschedule_reason: app.demo_reschedule_reason,
            interview_schedule: app.interview_schedule,
            interview_reschedule_count: app.interview_reschedule_count,
            interview_reschedule_reason: app.interview_reschedule_reason,
            interview_score: app.interview_score,
            hr_notes: app.hr_notes,
            interview_notes: app.interview_notes,
            documents: app.documents,
            created_at: app.created_at,
            updated_at: app.updated_at,
        }
    }
}
