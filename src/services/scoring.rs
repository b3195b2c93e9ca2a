//! Scoring engine: rubric management and the weighted demo-score calculation
//! whose outcome feeds back into the lifecycle engine.

use std::sync::Arc;

use crate::models::application::{ApplicationStatus, DemoResult};
use crate::models::rubric::{CreateRubricRequest, Rubric, RubricRemoval};
use crate::models::score::{CreateScoreRequest, Score, ScoreSummary};
use crate::repository::Repository;
use crate::services::DomainError;

pub const DEFAULT_MAX_SCORE: f64 = 10.0;
pub const DEFAULT_WEIGHT: f64 = 1.0;

/// Demo pass threshold, percent. Configurable per deployment and not to be
/// confused with the fixed interview-eligibility threshold.
#[derive(Debug, Clone, Copy)]
pub struct ScoringConfig {
    pub passing_score_percentage: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            passing_score_percentage: 70.0,
        }
    }
}

pub struct ScoringService<R> {
    repo: Arc<R>,
    config: ScoringConfig,
}

impl<R: Repository> ScoringService<R> {
    pub fn new(repo: Arc<R>, config: ScoringConfig) -> Self {
        Self { repo, config }
    }

    pub async fn create_rubric(&self, req: CreateRubricRequest) -> Result<Rubric, DomainError> {
        let max_score = req.max_score.unwrap_or(DEFAULT_MAX_SCORE);
        if max_score <= 0.0 {
            return Err(DomainError::Validation(
                "rubric max score must be positive".to_string(),
            ));
        }
        let weight = req.weight.unwrap_or(DEFAULT_WEIGHT);
        if weight < 0.0 {
            return Err(DomainError::Validation(
                "rubric weight cannot be negative".to_string(),
            ));
        }
        Ok(self.repo.insert_rubric(&req.name, max_score, weight).await?)
    }

    pub async fn list_rubrics(
        &self,
        include_retired: bool,
    ) -> Result<Vec<Rubric>, DomainError> {
        Ok(self.repo.list_rubrics(include_retired).await?)
    }

    /// Rubrics referenced by recorded scores are retired rather than removed,
    /// so historical calculations stay reproducible. Retirement is one-way.
    pub async fn delete_rubric(&self, id: i32) -> Result<RubricRemoval, DomainError> {
        let rubric = self
            .repo
            .find_rubric(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("rubric {id} not found")))?;

        if self.repo.rubric_has_scores(id).await? {
            let retired = self.repo.retire_rubric(rubric.id).await?;
            tracing::info!(rubric_id = id, "rubric retired, scores reference it");
            return Ok(RubricRemoval::Retired { rubric: retired });
        }
        self.repo.delete_rubric(id).await?;
        Ok(RubricRemoval::Deleted { id })
    }

    /// Records one rubric score for an application, overwriting any score
    /// already recorded against the same rubric.
    pub async fn create_score(
        &self,
        application_id: i32,
        req: CreateScoreRequest,
    ) -> Result<Score, DomainError> {
        let application = self
            .repo
            .find_application(application_id)
            .await?
            .ok_or_else(|| {
                DomainError::NotFound(format!("application {application_id} not found"))
            })?;
        if application.status != ApplicationStatus::Approved {
            return Err(DomainError::InvalidState(
                "scoring is only permitted on approved applications".to_string(),
            ));
        }

        let rubric = self
            .repo
            .find_rubric(req.rubric_id)
            .await?
            .filter(|r| r.is_active)
            .ok_or_else(|| {
                DomainError::NotFound(format!("rubric {} not found", req.rubric_id))
            })?;

        if req.score_value < 0.0 || req.score_value > rubric.max_score {
            return Err(DomainError::Validation(format!(
                "score must be between 0 and {}",
                rubric.max_score
            )));
        }

        Ok(self
            .repo
            .upsert_score(
                application_id,
                req.rubric_id,
                req.score_value,
                req.comments.as_deref(),
            )
            .await?)
    }

    /// Weighted percentage across every score recorded for the application:
    /// `100 * Σ(value·weight) / Σ(max·weight)`, rounded to two decimals.
    pub async fn calculate_application_score(
        &self,
        application_id: i32,
    ) -> Result<ScoreSummary, DomainError> {
        let breakdown = self.repo.rated_criteria(application_id).await?;
        if breakdown.is_empty() {
            return Err(DomainError::Validation(format!(
                "no scores recorded for application {application_id}"
            )));
        }

        let total_score: f64 = breakdown.iter().map(|c| c.score_value * c.weight).sum();
        let max_possible_score: f64 = breakdown.iter().map(|c| c.max_score * c.weight).sum();
        if max_possible_score <= 0.0 {
            // All weights zero; a percentage would be 0/0.
            return Err(DomainError::Validation(
                "rubric weights for this application sum to zero".to_string(),
            ));
        }

        let percentage = round2(100.0 * total_score / max_possible_score);
        let result = if percentage >= self.config.passing_score_percentage {
            DemoResult::Passed
        } else {
            DemoResult::Failed
        };

        Ok(ScoreSummary {
            total_score,
            max_possible_score,
            percentage,
            result,
            breakdown,
        })
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
