use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::Json,
};
use std::sync::Arc;
use validator::Validate;

use crate::{
    middleware::auth::AuthUser,
    models::application::{
        ApplicationResponse, CreateApplicationRequest, DecisionRequest, RateInterviewRequest,
        ScheduleDemoRequest, ScheduleInterviewRequest,
    },
    repository::postgres::PgRepository,
    services::lifecycle::LifecycleService,
    utils::errors::AppError,
    AppState,
};

fn lifecycle(state: &AppState) -> LifecycleService<PgRepository> {
    LifecycleService::new(
        Arc::new(PgRepository::new(state.db.clone())),
        state.events.clone(),
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

pub async fn get_applications(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<Vec<ApplicationResponse>>, AppError> {
    let service = lifecycle(&state);
    let applications = if auth_user.is_hr_staff() {
        service.list_applications().await?
    } else {
        service.list_for_applicant(auth_user.user_id).await?
    };
    Ok(Json(
        applications.into_iter().map(ApplicationResponse::from).collect(),
    ))
}

pub async fn get_application(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> Result<Json<ApplicationResponse>, AppError> {
    let application = lifecycle(&state).get_application(id).await?;
    if !auth_user.is_hr_staff() && application.applicant_id != auth_user.user_id {
        return Err(AppError::NotFound(format!("application {id} not found")));
    }
    Ok(Json(ApplicationResponse::from(application)))
}

pub async fn create_application(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<CreateApplicationRequest>,
) -> Result<(StatusCode, Json<ApplicationResponse>), AppError> {
    payload.validate()?;
    let application = lifecycle(&state)
        .create_application(auth_user.user_id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(ApplicationResponse::from(application))))
}

pub async fn approve_application(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i32>,
    Json(payload): Json<DecisionRequest>,
) -> Result<Json<ApplicationResponse>, AppError> {
    require_hr(&auth_user)?;
    payload.validate()?;
    let application = lifecycle(&state).approve(id, payload.hr_notes).await?;
    Ok(Json(ApplicationResponse::from(application)))
}

pub async fn reject_application(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i32>,
    Json(payload): Json<DecisionRequest>,
) -> Result<Json<ApplicationResponse>, AppError> {
    require_hr(&auth_user)?;
    payload.validate()?;
    let application = lifecycle(&state).reject(id, payload.hr_notes).await?;
    Ok(Json(ApplicationResponse::from(application)))
}

pub async fn schedule_demo(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i32>,
    Json(payload): Json<ScheduleDemoRequest>,
) -> Result<Json<ApplicationResponse>, AppError> {
    require_hr(&auth_user)?;
    payload.validate()?;
    let application = lifecycle(&state).schedule_demo(id, payload).await?;
    Ok(Json(ApplicationResponse::from(application)))
}

pub async fn schedule_interview(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i32>,
    Json(payload): Json<ScheduleInterviewRequest>,
) -> Result<Json<ApplicationResponse>, AppError> {
    require_hr(&auth_user)?;
    let application = lifecycle(&state).schedule_interview(id, payload).await?;
    Ok(Json(ApplicationResponse::from(application)))
}

pub async fn rate_interview(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i32>,
    Json(payload): Json<RateInterviewRequest>,
) -> Result<Json<ApplicationResponse>, AppError> {
    require_hr(&auth_user)?;
    payload.validate()?;
    let application = lifecycle(&state).rate_interview(id, payload).await?;
    Ok(Json(ApplicationResponse::from(application)))
}

pub async fn delete_application(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    require_hr(&auth_user)?;
    lifecycle(&state).delete_application(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
