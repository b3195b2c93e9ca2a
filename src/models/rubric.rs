use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Rubric {
    pub id: i32,
    pub name: String,
    pub max_score: f64,
    pub weight: f64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateRubricRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(range(min = 0.01))]
    pub max_score: Option<f64>,
    #[validate(range(min = 0.0))]
    pub weight: Option<f64>,
}

/// Outcome of a rubric deletion. Rubrics with recorded scores are retired
/// instead of removed so historical calculations stay reproducible.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RubricRemoval {
    Retired { rubric: Rubric },
    Deleted { id: i32 },
}
