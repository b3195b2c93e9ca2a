mod handlers;
mod middleware;
mod models;
mod repository;
mod services;
mod utils;

use std::env;
use std::sync::Arc;

use axum::{
    http::{HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{delete, get, post},
    Router,
};
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    handlers::{applications, scoring},
    middleware::auth::auth_middleware,
    repository::postgres::{create_pool, PgRepository},
    services::notifier::{EventSender, LogGateway, Notifier},
    services::scoring::ScoringConfig,
};

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub jwt_secret: String,
    pub events: EventSender,
    pub scoring_config: ScoringConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hiring_tracker_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");

    let scoring_config = ScoringConfig {
        passing_score_percentage: env::var("PASSING_SCORE_PERCENTAGE")
            .ok()
            .and_then(|v| v.parse::<f64>().ok())
            .unwrap_or_else(|| ScoringConfig::default().passing_score_percentage),
    };

    let db = create_pool(&database_url).await?;

    sqlx::migrate!("./migrations").run(&db).await?;

    let (events, event_rx) = EventSender::channel();

    let state = AppState {
        db: db.clone(),
        jwt_secret,
        events,
        scoring_config,
    };

    // Notifications are dispatched outside the request path; a failed
    // delivery never fails the lifecycle operation that triggered it.
    let notifier = Notifier::new(Arc::new(PgRepository::new(db)), Arc::new(LogGateway));
    tokio::spawn(notifier.run(event_rx));

    let cors_origin =
        env::var("CORS_ALLOWED_ORIGIN").unwrap_or_else(|_| "http://localhost:3000".to_string());

    let cors = if cors_origin == "*" {
        CorsLayer::new()
            .allow_origin(HeaderValue::from_static("*"))
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([
                axum::http::header::CONTENT_TYPE,
                axum::http::header::AUTHORIZATION,
            ])
    } else {
        CorsLayer::new()
            .allow_origin(cors_origin.parse::<HeaderValue>()?)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([
                axum::http::header::CONTENT_TYPE,
                axum::http::header::AUTHORIZATION,
            ])
    };

    let protected_routes = Router::new()
        .route("/applications", get(applications::get_applications))
        .route("/applications", post(applications::create_application))
        .route("/applications/:id", get(applications::get_application))
        .route(
            "/applications/:id",
            delete(applications::delete_application),
        )
        .route(
            "/applications/:id/approve",
            post(applications::approve_application),
        )
        .route(
            "/applications/:id/reject",
            post(applications::reject_application),
        )
        .route("/applications/:id/demo", post(applications::schedule_demo))
        .route(
            "/applications/:id/interview",
            post(applications::schedule_interview),
        )
        .route(
            "/applications/:id/interview/rating",
            post(applications::rate_interview),
        )
        .route("/applications/:id/scores", post(scoring::create_score))
        .route(
            "/applications/:id/scores/summary",
            get(scoring::get_score_summary),
        )
        .route(
            "/applications/:id/scores/complete",
            post(scoring::complete_scoring),
        )
        .route("/rubrics", post(scoring::create_rubric))
        .route("/rubrics", get(scoring::list_rubrics))
        .route("/rubrics/:id", delete(scoring::delete_rubric))
        .layer(from_fn_with_state(state.clone(), auth_middleware));

    let app = Router::new()
        .route("/health", get(|| async { "OK" }))
        .merge(protected_routes)
        .layer(cors)
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await?;
    tracing::info!("Server running on http://0.0.0.0:8000");

    axum::serve(listener, app).await?;

    Ok(())
}
