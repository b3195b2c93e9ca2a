//! Application lifecycle engine: owns every legality check and transition for
//! a single hiring application. All writes go through the repository's
//! conditional update, so a stale read can never silently overwrite a
//! concurrent transition on the same application.

use std::sync::Arc;

use chrono::Utc;

use crate::models::application::{
    Application, ApplicationStatus, CreateApplicationRequest, DemoResult, InterviewResult,
    RateInterviewRequest, ScheduleDemoRequest, ScheduleInterviewRequest,
};
use crate::models::score::ScoreSummary;
use crate::repository::{ApplicationChanges, NewApplication, Repository, StoreError};
use crate::services::notifier::{EventSender, NotificationEvent};
use crate::services::DomainError;
use crate::utils::dates;
use crate::utils::logger::LOGGER;

/// Demo slots are always booked for one hour, whatever the request asked for.
pub const DEMO_DURATION_MINUTES: i32 = 60;

/// Demo percentage that unlocks interview scheduling. Fixed, and deliberately
/// independent of the configurable passing threshold used by the scoring
/// engine.
pub const INTERVIEW_ELIGIBILITY_THRESHOLD: f64 = 75.0;

pub struct LifecycleService<R> {
    repo: Arc<R>,
    events: EventSender,
}

impl<R: Repository> LifecycleService<R> {
    pub fn new(repo: Arc<R>, events: EventSender) -> Self {
        Self { repo, events }
    }

    async fn load(&self, id: i32) -> Result<Application, DomainError> {
        self.repo
            .find_application(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("application {id} not found")))
    }

    pub async fn get_application(&self, id: i32) -> Result<Application, DomainError> {
        self.load(id).await
    }

    pub async fn list_applications(&self) -> Result<Vec<Application>, DomainError> {
        Ok(self.repo.list_applications().await?)
    }

    pub async fn list_for_applicant(
        &self,
        applicant_id: i32,
    ) -> Result<Vec<Application>, DomainError> {
        Ok(self
            .repo
            .list_applications_for_applicant(applicant_id)
            .await?)
    }

    /// Submits a new attempt. An applicant may only ever hold one active
    /// (pending or approved) application; the pre-check here gives the
    /// friendly error and the store's unique constraint closes the race.
    pub async fn create_application(
        &self,
        applicant_id: i32,
        req: CreateApplicationRequest,
    ) -> Result<Application, DomainError> {
        if let Some(active) = self.repo.find_active_by_applicant(applicant_id).await? {
            return Err(DomainError::Conflict(format!(
                "applicant {applicant_id} already has an active application (attempt {})",
                active.attempt_number
            )));
        }

        let attempt_number = self.repo.last_attempt_number(applicant_id).await?.unwrap_or(0) + 1;
        let application = self
            .repo
            .insert_application(NewApplication {
                applicant_id,
                attempt_number,
                documents: req.documents,
            })
            .await
            .map_err(|e| match e {
                StoreError::UniqueViolation => DomainError::Conflict(format!(
                    "applicant {applicant_id} already has an active application"
                )),
                other => other.into(),
            })?;

        LOGGER.log_business_event(
            "application_submitted",
            Some(applicant_id),
            [(
                "attempt_number".to_string(),
                serde_json::Value::from(attempt_number),
            )]
            .into_iter()
            .collect(),
        );

        self.events.emit(NotificationEvent::Submission {
            application: application.clone(),
        });
        self.events.emit(NotificationEvent::HrAlert {
            application: application.clone(),
        });
        Ok(application)
    }

    /// HR approval. Deliberately guarded only on existence: HR may override
    /// the decision on an application in any state.
    pub async fn approve(
        &self,
        id: i32,
        hr_notes: Option<String>,
    ) -> Result<Application, DomainError> {
        self.decide(id, ApplicationStatus::Approved, hr_notes).await
    }

    /// HR rejection; same permissiveness as [`approve`](Self::approve).
    pub async fn reject(
        &self,
        id: i32,
        hr_notes: Option<String>,
    ) -> Result<Application, DomainError> {
        self.decide(id, ApplicationStatus::Rejected, hr_notes).await
    }

    async fn decide(
        &self,
        id: i32,
        status: ApplicationStatus,
        hr_notes: Option<String>,
    ) -> Result<Application, DomainError> {
        let app = self.load(id).await?;
        let updated = self
            .repo
            .update_application(
                id,
                app.updated_at,
                ApplicationChanges {
                    status: Some(status),
                    hr_notes,
                    ..Default::default()
                },
            )
            .await?;

        let event = match status {
            ApplicationStatus::Approved => NotificationEvent::Approval {
                application: updated.clone(),
            },
            _ => NotificationEvent::Rejection {
                application: updated.clone(),
            },
        };
        self.events.emit(event);
        Ok(updated)
    }

    /// Schedules or reschedules the teaching demo. Guard order matters: each
    /// failure below is a distinct caller-visible condition.
    pub async fn schedule_demo(
        &self,
        id: i32,
        req: ScheduleDemoRequest,
    ) -> Result<Application, DomainError> {
        let app = self.load(id).await?;

        if app.status != ApplicationStatus::Approved {
            return Err(DomainError::InvalidState(
                "demo scheduling requires an approved application".to_string(),
            ));
        }
        if !dates::is_at_least_one_day_ahead(req.demo_schedule, Utc::now()) {
            return Err(DomainError::Validation(
                "demo date must be at least one day ahead".to_string(),
            ));
        }
        if app.result.is_some() {
            return Err(DomainError::InvalidState(
                "demo result already recorded, scheduling is closed".to_string(),
            ));
        }

        let rescheduling = app.demo_schedule.is_some();
        let mut changes = ApplicationChanges {
            demo_schedule: Some(req.demo_schedule),
            demo_location: req.demo_location,
            // requested duration is ignored on purpose
            demo_duration: Some(DEMO_DURATION_MINUTES),
            demo_notes: req.demo_notes,
            ..Default::default()
        };
        if rescheduling {
            let reason = req.reschedule_reason.ok_or_else(|| {
                DomainError::Validation(
                    "a reschedule reason is required when moving an existing demo".to_string(),
                )
            })?;
            if app.demo_reschedule_count > 0 {
                return Err(DomainError::RescheduleLimit(
                    "demo has already been rescheduled once".to_string(),
                ));
            }
            changes.demo_reschedule_count = Some(app.demo_reschedule_count + 1);
            changes.demo_reschedule_reason = Some(reason);
        }

        let updated = self
            .repo
            .update_application(id, app.updated_at, changes)
            .await?;

        self.events.emit(if rescheduling {
            NotificationEvent::Reschedule {
                application: updated.clone(),
            }
        } else {
            NotificationEvent::Schedule {
                application: updated.clone(),
            }
        });
        Ok(updated)
    }

    /// Records the demo scoring outcome computed by the scoring engine. A
    /// failed demo rejects the application; a passed one unlocks interview
    /// scheduling but leaves the status untouched.
    pub async fn complete_scoring(
        &self,
        id: i32,
        summary: &ScoreSummary,
    ) -> Result<Application, DomainError> {
        let app = self.load(id).await?;

        let mut changes = ApplicationChanges {
            total_score: Some(summary.percentage),
            result: Some(summary.result),
            ..Default::default()
        };
        match summary.result {
            DemoResult::Failed => changes.status = Some(ApplicationStatus::Rejected),
            DemoResult::Passed => changes.interview_eligible = Some(true),
        }

        let updated = self
            .repo
            .update_application(id, app.updated_at, changes)
            .await?;

        LOGGER.log_business_event(
            "demo_scoring_completed",
            Some(updated.applicant_id),
            [
                (
                    "percentage".to_string(),
                    serde_json::Value::from(summary.percentage),
                ),
                (
                    "result".to_string(),
                    serde_json::Value::from(match summary.result {
                        DemoResult::Passed => "passed",
                        DemoResult::Failed => "failed",
                    }),
                ),
            ]
            .into_iter()
            .collect(),
        );

        self.events.emit(NotificationEvent::Results {
            application: updated.clone(),
            summary: summary.clone(),
        });
        Ok(updated)
    }

    pub async fn schedule_interview(
        &self,
        id: i32,
        req: ScheduleInterviewRequest,
    ) -> Result<Application, DomainError> {
        let app = self.load(id).await?;

        if app.interview_result.is_some() {
            return Err(DomainError::InvalidState(
                "interview result already recorded, scheduling is closed".to_string(),
            ));
        }
        let score_qualifies = app
            .total_score
            .is_some_and(|s| s >= INTERVIEW_ELIGIBILITY_THRESHOLD);
        if !app.interview_eligible && !score_qualifies {
            return Err(DomainError::InvalidState(
                "application is not eligible for an interview".to_string(),
            ));
        }
        if !dates::is_at_least_one_day_ahead(req.interview_schedule, Utc::now()) {
            return Err(DomainError::Validation(
                "interview date must be at least one day ahead".to_string(),
            ));
        }
        if let Some(demo) = app.demo_schedule {
            if !dates::is_on_or_after(req.interview_schedule, demo) {
                return Err(DomainError::Validation(
                    "interview cannot be scheduled before the demo".to_string(),
                ));
            }
        }

        let rescheduling = app.interview_schedule.is_some();
        let mut changes = ApplicationChanges {
            interview_schedule: Some(req.interview_schedule),
            ..Default::default()
        };
        if rescheduling {
            let reason = req.reschedule_reason.ok_or_else(|| {
                DomainError::Validation(
                    "a reschedule reason is required when moving an existing interview"
                        .to_string(),
                )
            })?;
            if app.interview_reschedule_count > 0 {
                return Err(DomainError::RescheduleLimit(
                    "interview has already been rescheduled once".to_string(),
                ));
            }
            changes.interview_reschedule_count = Some(app.interview_reschedule_count + 1);
            changes.interview_reschedule_reason = Some(reason);
        }

        let updated = self
            .repo
            .update_application(id, app.updated_at, changes)
            .await?;

        self.events.emit(NotificationEvent::InterviewSchedule {
            application: updated.clone(),
        });
        Ok(updated)
    }

    /// Final interview rating. A passed interview completes the application,
    /// a failed one rejects it. No notification goes out here; only demo
    /// scoring notifies the applicant of results.
    pub async fn rate_interview(
        &self,
        id: i32,
        req: RateInterviewRequest,
    ) -> Result<Application, DomainError> {
        let app = self.load(id).await?;

        if app.interview_schedule.is_none() {
            return Err(DomainError::InvalidState(
                "cannot rate an interview that was never scheduled".to_string(),
            ));
        }
        if let Some(score) = req.interview_score {
            if !(0.0..=100.0).contains(&score) {
                return Err(DomainError::Validation(
                    "interview score must be between 0 and 100".to_string(),
                ));
            }
        }

        let status = match req.interview_result {
            InterviewResult::Passed => ApplicationStatus::Completed,
            InterviewResult::Failed => ApplicationStatus::Rejected,
        };
        let updated = self
            .repo
            .update_application(
                id,
                app.updated_at,
                ApplicationChanges {
                    interview_score: req.interview_score,
                    interview_result: Some(req.interview_result),
                    interview_notes: req.interview_notes,
                    status: Some(status),
                    ..Default::default()
                },
            )
            .await?;

        LOGGER.log_business_event(
            "interview_rated",
            Some(updated.applicant_id),
            [(
                "result".to_string(),
                serde_json::Value::from(match req.interview_result {
                    InterviewResult::Passed => "passed",
                    InterviewResult::Failed => "failed",
                }),
            )]
            .into_iter()
            .collect(),
        );
        Ok(updated)
    }

    /// Administrative removal, allowed at any status.
    pub async fn delete_application(&self, id: i32) -> Result<(), DomainError> {
        if !self.repo.delete_application(id).await? {
            return Err(DomainError::NotFound(format!(
                "application {id} not found"
            )));
        }
        Ok(())
    }
}
