use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::{
    middleware::auth::AuthUser,
    models::{
        application::ApplicationResponse,
        rubric::{CreateRubricRequest, Rubric, RubricRemoval},
        score::{CreateScoreRequest, Score, ScoreSummary},
    },
    repository::postgres::PgRepository,
    services::{lifecycle::LifecycleService, scoring::ScoringService},
    utils::errors::AppError,
    AppState,
};

fn scoring(state: &AppState) -> ScoringService<PgRepository> {
    ScoringService::new(
        Arc::new(PgRepository::new(state.db.clone())),
        state.scoring_config,
    )
}

fn require_hr(auth_user: &AuthUser) -> Result<(), AppError> {
    if auth_user.is_hr_staff() {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "only HR staff may perform this operation".to_string(),
        ))
    }
}

#[derive(Debug, Deserialize)]
pub struct ListRubricsQuery {
    #[serde(default)]
    pub include_retired: bool,
}

pub async fn create_rubric(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<CreateRubricRequest>,
) -> Result<(StatusCode, Json<Rubric>), AppError> {
    require_hr(&auth_user)?;
    payload.validate()?;
    let rubric = scoring(&state).create_rubric(payload).await?;
    Ok((StatusCode::CREATED, Json(rubric)))
}

pub async fn list_rubrics(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<ListRubricsQuery>,
) -> Result<Json<Vec<Rubric>>, AppError> {
    require_hr(&auth_user)?;
    let rubrics = scoring(&state).list_rubrics(query.include_retired).await?;
    Ok(Json(rubrics))
}

pub async fn delete_rubric(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> Result<Json<RubricRemoval>, AppError> {
    require_hr(&auth_user)?;
    let removal = scoring(&state).delete_rubric(id).await?;
    Ok(Json(removal))
}

pub async fn create_score(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(application_id): Path<i32>,
    Json(payload): Json<CreateScoreRequest>,
) -> Result<Json<Score>, AppError> {
    require_hr(&auth_user)?;
    payload.validate()?;
    let score = scoring(&state).create_score(application_id, payload).await?;
    Ok(Json(score))
}

pub async fn get_score_summary(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(application_id): Path<i32>,
) -> Result<Json<ScoreSummary>, AppError> {
    require_hr(&auth_user)?;
    let summary = scoring(&state)
        .calculate_application_score(application_id)
        .await?;
    Ok(Json(summary))
}

#[derive(Debug, Serialize)]
pub struct ScoringCompletionResponse {
    pub application: ApplicationResponse,
    pub summary: ScoreSummary,
}

/// Runs the weighted calculation and records the outcome on the application
/// in one call. The scoring engine produces the summary, the lifecycle
/// engine applies the transition.
pub async fn complete_scoring(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(application_id): Path<i32>,
) -> Result<Json<ScoringCompletionResponse>, AppError> {
    require_hr(&auth_user)?;
    let summary = scoring(&state)
        .calculate_application_score(application_id)
        .await?;
    let lifecycle = LifecycleService::new(
        Arc::new(PgRepository::new(state.db.clone())),
        state.events.clone(),
    );
    let application = lifecycle.complete_scoring(application_id, &summary).await?;
    Ok(Json(ScoringCompletionResponse {
        application: ApplicationResponse::from(application),
        summary,
    }))
}
