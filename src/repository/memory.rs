//! In-memory `Repository` used by the engine tests. Mirrors the conditional
//! update semantics of the Postgres implementation, including the
//! version-conflict and unique-violation failure modes.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::models::{
    application::{Application, ApplicationStatus},
    rubric::Rubric,
    score::{RatedCriterion, Score},
    user::{User, UserRole},
};
use crate::repository::{ApplicationChanges, NewApplication, Repository, StoreError};

#[derive(Default)]
struct Inner {
    applications: HashMap<i32, Application>,
    rubrics: HashMap<i32, Rubric>,
    scores: HashMap<(i32, i32), Score>,
    users: HashMap<i32, User>,
    next_application_id: i32,
    next_rubric_id: i32,
    next_score_id: i32,
    clock_ticks: i64,
}

pub struct MemoryRepository {
    inner: Mutex<Inner>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn with_user(self, id: i32, role: UserRole) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.users.insert(
                id,
                User {
                    id,
                    email: format!("user{id}@example.com"),
                    first_name: "Test".into(),
                    last_name: format!("User{id}"),
                    role,
                    created_at: Utc::now(),
                    updated_at: Utc::now(),
                },
            );
        }
        self
    }
}

impl Inner {
    // Monotonic stand-in for clock_timestamp(); consecutive writes in the
    // same test must produce distinct updated_at values for CAS to work.
    fn tick(&mut self) -> DateTime<Utc> {
        self.clock_ticks += 1;
        Utc::now() + Duration::microseconds(self.clock_ticks)
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn find_application(&self, id: i32) -> Result<Option<Application>, StoreError> {
        Ok(self.inner.lock().unwrap().applications.get(&id).cloned())
    }

    async fn find_active_by_applicant(
        &self,
        applicant_id: i32,
    ) -> Result<Option<Application>, StoreError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .applications
            .values()
            .find(|a| a.applicant_id == applicant_id && a.is_active())
            .cloned())
    }

    async fn last_attempt_number(&self, applicant_id: i32) -> Result<Option<i32>, StoreError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .applications
            .values()
            .filter(|a| a.applicant_id == applicant_id)
            .map(|a| a.attempt_number)
            .max())
    }

    async fn insert_application(&self, new: NewApplication) -> Result<Application, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let has_active = inner
            .applications
            .values()
            .any(|a| a.applicant_id == new.applicant_id && a.is_active());
        if has_active {
            return Err(StoreError::UniqueViolation);
        }
        inner.next_application_id += 1;
        let id = inner.next_application_id;
        let now = inner.tick();
        let app = Application {
            id,
            applicant_id: new.applicant_id,
            attempt_number: new.attempt_number,
            status: ApplicationStatus::Pending,
            result: None,
            interview_result: None,
            total_score: None,
            interview_eligible: false,
            demo_schedule: None,
            demo_location: None,
            demo_duration: None,
            demo_notes: None,
            demo_reschedule_count: 0,
            demo_reschedule_reason: None,
            interview_schedule: None,
            interview_reschedule_count: 0,
            interview_reschedule_reason: None,
            interview_score: None,
            hr_notes: None,
            interview_notes: None,
            documents: new.documents,
            created_at: now,
            updated_at: now,
        };
        inner.applications.insert(id, app.clone());
        Ok(app)
    }

    async fn update_application(
        &self,
        id: i32,
        expected_updated_at: DateTime<Utc>,
        changes: ApplicationChanges,
    ) -> Result<Application, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let now = inner.tick();
        let app = inner
            .applications
            .get_mut(&id)
            .ok_or(StoreError::VersionConflict)?;
        if app.updated_at != expected_updated_at {
            return Err(StoreError::VersionConflict);
        }
        if let Some(status) = changes.status {
            app.status = status;
        }
        if let Some(result) = changes.result {
            app.result = Some(result);
        }
        if let Some(interview_result) = changes.interview_result {
            app.interview_result = Some(interview_result);
        }
        if let Some(total_score) = changes.total_score {
            app.total_score = Some(total_score);
        }
        if let Some(eligible) = changes.interview_eligible {
            app.interview_eligible = eligible;
        }
        if let Some(schedule) = changes.demo_schedule {
            app.demo_schedule = Some(schedule);
        }
        if let Some(location) = changes.demo_location {
            app.demo_location = Some(location);
        }
        if let Some(duration) = changes.demo_duration {
            app.demo_duration = Some(duration);
        }
        if let Some(notes) = changes.demo_notes {
            app.demo_notes = Some(notes);
        }
        if let Some(count) = changes.demo_reschedule_count {
            app.demo_reschedule_count = count;
        }
        if let Some(reason) = changes.demo_reschedule_reason {
            app.demo_reschedule_reason = Some(reason);
        }
        if let Some(schedule) = changes.interview_schedule {
            app.interview_schedule = Some(schedule);
        }
        if let Some(count) = changes.interview_reschedule_count {
            app.interview_reschedule_count = count;
        }
        if let Some(reason) = changes.interview_reschedule_reason {
            app.interview_reschedule_reason = Some(reason);
        }
        if let Some(score) = changes.interview_score {
            app.interview_score = Some(score);
        }
        if let Some(notes) = changes.hr_notes {
            app.hr_notes = Some(notes);
        }
        if let Some(notes) = changes.interview_notes {
            app.interview_notes = Some(notes);
        }
        app.updated_at = now;
        Ok(app.clone())
    }

    async fn delete_application(&self, id: i32) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.scores.retain(|(app_id, _), _| *app_id != id);
        Ok(inner.applications.remove(&id).is_some())
    }

    async fn list_applications(&self) -> Result<Vec<Application>, StoreError> {
        let mut apps: Vec<_> = self
            .inner
            .lock()
            .unwrap()
            .applications
            .values()
            .cloned()
            .collect();
        apps.sort_by_key(|a| a.id);
        Ok(apps)
    }

    async fn list_applications_for_applicant(
        &self,
        applicant_id: i32,
    ) -> Result<Vec<Application>, StoreError> {
        let mut apps: Vec<_> = self
            .inner
            .lock()
            .unwrap()
            .applications
            .values()
            .filter(|a| a.applicant_id == applicant_id)
            .cloned()
            .collect();
        apps.sort_by_key(|a| std::cmp::Reverse(a.attempt_number));
        Ok(apps)
    }

    async fn find_user(&self, id: i32) -> Result<Option<User>, StoreError> {
        Ok(self.inner.lock().unwrap().users.get(&id).cloned())
    }

    async fn list_hr_users(&self) -> Result<Vec<User>, StoreError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .users
            .values()
            .filter(|u| matches!(u.role, UserRole::Hr | UserRole::Admin))
            .cloned()
            .collect())
    }

    async fn insert_rubric(
        &self,
        name: &str,
        max_score: f64,
        weight: f64,
    ) -> Result<Rubric, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.next_rubric_id += 1;
        let id = inner.next_rubric_id;
        let now = inner.tick();
        let rubric = Rubric {
            id,
            name: name.to_string(),
            max_score,
            weight,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        inner.rubrics.insert(id, rubric.clone());
        Ok(rubric)
    }

    async fn find_rubric(&self, id: i32) -> Result<Option<Rubric>, StoreError> {
        Ok(self.inner.lock().unwrap().rubrics.get(&id).cloned())
    }

    async fn list_rubrics(&self, include_retired: bool) -> Result<Vec<Rubric>, StoreError> {
        let mut rubrics: Vec<_> = self
            .inner
            .lock()
            .unwrap()
            .rubrics
            .values()
            .filter(|r| include_retired || r.is_active)
            .cloned()
            .collect();
        rubrics.sort_by_key(|r| r.id);
        Ok(rubrics)
    }

    async fn retire_rubric(&self, id: i32) -> Result<Rubric, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let now = inner.tick();
        let rubric = inner
            .rubrics
            .get_mut(&id)
            .ok_or_else(|| StoreError::Backend(anyhow::anyhow!("rubric {id} not found")))?;
        rubric.is_active = false;
        rubric.updated_at = now;
        Ok(rubric.clone())
    }

    async fn delete_rubric(&self, id: i32) -> Result<(), StoreError> {
        self.inner.lock().unwrap().rubrics.remove(&id);
        Ok(())
    }

    async fn rubric_has_scores(&self, rubric_id: i32) -> Result<bool, StoreError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .scores
            .keys()
            .any(|(_, r)| *r == rubric_id))
    }

    async fn upsert_score(
        &self,
        application_id: i32,
        rubric_id: i32,
        score_value: f64,
        comments: Option<&str>,
    ) -> Result<Score, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let now = inner.tick();
        if let Some(existing) = inner.scores.get_mut(&(application_id, rubric_id)) {
            existing.score_value = score_value;
            if let Some(comments) = comments {
                existing.comments = Some(comments.to_string());
            }
            existing.updated_at = now;
            return Ok(existing.clone());
        }
        inner.next_score_id += 1;
        let score = Score {
            id: inner.next_score_id,
            application_id,
            rubric_id,
            score_value,
            comments: comments.map(str::to_string),
            created_at: now,
            updated_at: now,
        };
        inner
            .scores
            .insert((application_id, rubric_id), score.clone());
        Ok(score)
    }

    async fn rated_criteria(
        &self,
        application_id: i32,
    ) -> Result<Vec<RatedCriterion>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut criteria: Vec<_> = inner
            .scores
            .values()
            .filter(|s| s.application_id == application_id)
            .map(|s| {
                let rubric = &inner.rubrics[&s.rubric_id];
                RatedCriterion {
                    rubric_id: rubric.id,
                    rubric_name: rubric.name.clone(),
                    score_value: s.score_value,
                    max_score: rubric.max_score,
                    weight: rubric.weight,
                }
            })
            .collect();
        criteria.sort_by_key(|c| c.rubric_id);
        Ok(criteria)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stale_version_update_is_rejected() {
        let repo = MemoryRepository::new();
        let app = repo
            .insert_application(NewApplication {
                applicant_id: 1,
                attempt_number: 1,
                documents: None,
            })
            .await
            .unwrap();

        let first = repo
            .update_application(
                app.id,
                app.updated_at,
                ApplicationChanges {
                    status: Some(ApplicationStatus::Approved),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(first.status, ApplicationStatus::Approved);

        // Second writer still holds the pre-update row version.
        let err = repo
            .update_application(
                app.id,
                app.updated_at,
                ApplicationChanges {
                    status: Some(ApplicationStatus::Rejected),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::VersionConflict));
    }

    #[tokio::test]
    async fn second_active_insert_is_a_unique_violation() {
        let repo = MemoryRepository::new();
        repo.insert_application(NewApplication {
            applicant_id: 7,
            attempt_number: 1,
            documents: None,
        })
        .await
        .unwrap();

        let err = repo
            .insert_application(NewApplication {
                applicant_id: 7,
                attempt_number: 2,
                documents: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation));
    }
}
