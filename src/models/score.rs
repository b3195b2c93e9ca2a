use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::models::application::DemoResult;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Score {
    pub id: i32,
    pub application_id: i32,
    pub rubric_id: i32,
    pub score_value: f64,
    pub comments: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateScoreRequest {
    pub rubric_id: i32,
    pub score_value: f64,
    #[validate(length(max = 4000))]
    pub comments: Option<String>,
}

/// One score joined with the rubric it was recorded against.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RatedCriterion {
    pub rubric_id: i32,
    pub rubric_name: String,
    pub score_value: f64,
    pub max_score: f64,
    pub weight: f64,
}

/// Result of the weighted rubric calculation for one application.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreSummary {
    pub total_score: f64,
    pub max_possible_score: f64,
    pub percentage: f64,
    pub result: DemoResult,
    pub breakdown: Vec<RatedCriterion>,
}
