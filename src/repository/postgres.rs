use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::models::{
    application::Application,
    rubric::Rubric,
    score::{RatedCriterion, Score},
    user::{User, UserRole},
};
use crate::repository::{ApplicationChanges, NewApplication, Repository, StoreError};

/// sqlx-backed store. Conditional updates compare `updated_at` so a stale
/// read cannot clobber a concurrent write on the same application.
#[derive(Debug, Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_sqlx(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return StoreError::UniqueViolation;
        }
    }
    StoreError::Backend(anyhow::Error::new(err).context("database error"))
}

#[async_trait]
impl Repository for PgRepository {
    async fn find_application(&self, id: i32) -> Result<Option<Application>, StoreError> {
        sqlx::query_as::<_, Application>("SELECT * FROM applications WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)
    }

    async fn find_active_by_applicant(
        &self,
        applicant_id: i32,
    ) -> Result<Option<Application>, StoreError> {
        sqlx::query_as::<_, Application>(
            r#"
            SELECT * FROM applications
            WHERE applicant_id = $1 AND status IN ('pending', 'approved')
            "#,
        )
        .bind(applicant_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)
    }

    async fn last_attempt_number(&self, applicant_id: i32) -> Result<Option<i32>, StoreError> {
        sqlx::query_scalar::<_, Option<i32>>(
            "SELECT MAX(attempt_number) FROM applications WHERE applicant_id = $1",
        )
        .bind(applicant_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx)
    }

    async fn insert_application(&self, new: NewApplication) -> Result<Application, StoreError> {
        sqlx::query_as::<_, Application>(
            r#"
            INSERT INTO applications (applicant_id, attempt_number, documents)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(new.applicant_id)
        .bind(new.attempt_number)
        .bind(new.documents)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx)
    }

    async fn update_application(
        &self,
        id: i32,
        expected_updated_at: DateTime<Utc>,
        changes: ApplicationChanges,
    ) -> Result<Application, StoreError> {
        let updated = sqlx::query_as::<_, Application>(
            r#"
            UPDATE applications
            SET status = COALESCE($1, status),
                result = COALESCE($2, result),
                interview_result = COALESCE($3, interview_result),
                total_score = COALESCE($4, total_score),
                interview_eligible = COALESCE($5, interview_eligible),
                demo_schedule = COALESCE($6, demo_schedule),
                demo_location = COALESCE($7, demo_location),
                demo_duration = COALESCE($8, demo_duration),
                demo_notes = COALESCE($9, demo_notes),
                demo_reschedule_count = COALESCE($10, demo_reschedule_count),
                demo_reschedule_reason = COALESCE($11, demo_reschedule_reason),
                interview_schedule = COALESCE($12, interview_schedule),
                interview_reschedule_count = COALESCE($13, interview_reschedule_count),
                interview_reschedule_reason = COALESCE($14, interview_reschedule_reason),
                interview_score = COALESCE($15, interview_score),
                hr_notes = COALESCE($16, hr_notes),
                interview_notes = COALESCE($17, interview_notes),
                updated_at = clock_timestamp()
            WHERE id = $18 AND updated_at = $19
            RETURNING *
            "#,
        )
        .bind(changes.status)
        .bind(changes.result)
        .bind(changes.interview_result)
        .bind(changes.total_score)
        .bind(changes.interview_eligible)
        .bind(changes.demo_schedule)
        .bind(changes.demo_location)
        .bind(changes.demo_duration)
        .bind(changes.demo_notes)
        .bind(changes.demo_reschedule_count)
        .bind(changes.demo_reschedule_reason)
        .bind(changes.interview_schedule)
        .bind(changes.interview_reschedule_count)
        .bind(changes.interview_reschedule_reason)
        .bind(changes.interview_score)
        .bind(changes.hr_notes)
        .bind(changes.interview_notes)
        .bind(id)
        .bind(expected_updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;

        updated.ok_or(StoreError::VersionConflict)
    }

    async fn delete_application(&self, id: i32) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM applications WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_applications(&self) -> Result<Vec<Application>, StoreError> {
        sqlx::query_as::<_, Application>("SELECT * FROM applications ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)
    }

    async fn list_applications_for_applicant(
        &self,
        applicant_id: i32,
    ) -> Result<Vec<Application>, StoreError> {
        sqlx::query_as::<_, Application>(
            "SELECT * FROM applications WHERE applicant_id = $1 ORDER BY attempt_number DESC",
        )
        .bind(applicant_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)
    }

    async fn find_user(&self, id: i32) -> Result<Option<User>, StoreError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)
    }

    async fn list_hr_users(&self) -> Result<Vec<User>, StoreError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE role IN ($1, $2)")
            .bind(UserRole::Hr)
            .bind(UserRole::Admin)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)
    }

    async fn insert_rubric(
        &self,
        name: &str,
        max_score: f64,
        weight: f64,
    ) -> Result<Rubric, StoreError> {
        sqlx::query_as::<_, Rubric>(
            r#"
            INSERT INTO rubrics (name, max_score, weight)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(max_score)
        .bind(weight)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx)
    }

    async fn find_rubric(&self, id: i32) -> Result<Option<Rubric>, StoreError> {
        sqlx::query_as::<_, Rubric>("SELECT * FROM rubrics WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)
    }

    async fn list_rubrics(&self, include_retired: bool) -> Result<Vec<Rubric>, StoreError> {
        let query = if include_retired {
            "SELECT * FROM rubrics ORDER BY id"
        } else {
            "SELECT * FROM rubrics WHERE is_active ORDER BY id"
        };
        sqlx::query_as::<_, Rubric>(query)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)
    }

    async fn retire_rubric(&self, id: i32) -> Result<Rubric, StoreError> {
        sqlx::query_as::<_, Rubric>(
            r#"
            UPDATE rubrics
            SET is_active = FALSE, updated_at = clock_timestamp()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?
        .ok_or_else(|| {
            StoreError::Backend(anyhow::anyhow!("rubric {id} vanished during retirement"))
        })
    }

    async fn delete_rubric(&self, id: i32) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM rubrics WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(())
    }

    async fn rubric_has_scores(&self, rubric_id: i32) -> Result<bool, StoreError> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM scores WHERE rubric_id = $1)",
        )
        .bind(rubric_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx)
    }

    async fn upsert_score(
        &self,
        application_id: i32,
        rubric_id: i32,
        score_value: f64,
        comments: Option<&str>,
    ) -> Result<Score, StoreError> {
        sqlx::query_as::<_, Score>(
            r#"
            INSERT INTO scores (application_id, rubric_id, score_value, comments)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (application_id, rubric_id)
            DO UPDATE SET
                score_value = $3,
                comments = COALESCE($4, scores.comments),
                updated_at = clock_timestamp()
            RETURNING *
            "#,
        )
        .bind(application_id)
        .bind(rubric_id)
        .bind(score_value)
        .bind(comments)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx)
    }

    async fn rated_criteria(
        &self,
        application_id: i32,
    ) -> Result<Vec<RatedCriterion>, StoreError> {
        sqlx::query_as::<_, RatedCriterion>(
            r#"
            SELECT s.rubric_id, r.name AS rubric_name, s.score_value, r.max_score, r.weight
            FROM scores s
            JOIN rubrics r ON r.id = s.rubric_id
            WHERE s.application_id = $1
            ORDER BY s.rubric_id
            "#,
        )
        .bind(application_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)
    }
}

pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    PgPool::connect(database_url)
        .await
        .context("failed to connect to database")
}
