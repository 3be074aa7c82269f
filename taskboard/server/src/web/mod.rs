use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use migration::MigratorTrait;
use sea_orm::Database;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::sync::Arc;
use std::time::Instant;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::Config;
use crate::task::TaskState;
use crate::web::api::{ApiDoc, create_api_router};
use crate::web::error::{ApiError, ErrorResponse};

pub mod api;
pub mod error;

/// Process-level facts reported by the health check.
#[derive(Clone, Debug)]
pub struct HealthState {
    pub started_at: Instant,
}

impl HealthState {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
        }
    }
}

impl Default for HealthState {
    fn default() -> Self {
        Self::new()
    }
}

/// Liveness report. Never touches the store.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    /// Seconds since the server started
    pub uptime: f64,
}

/// Builds the complete application: the JSON API, its OpenAPI docs, the
/// fallback for unknown routes and the cross-cutting layers.
pub fn create_app(task_state: Arc<TaskState>, health_state: Arc<HealthState>) -> Router {
    Router::new()
        .merge(create_api_router(task_state, health_state))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .fallback(fallback_handler)
        .method_not_allowed_fallback(fallback_handler)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(CatchPanicLayer::custom(handle_panic)),
        )
}

#[tracing::instrument(skip(config))]
pub async fn start_web_server(config: Config) -> anyhow::Result<()> {
    let health_state = Arc::new(HealthState::new());

    let server_address = format!("0.0.0.0:{}", &config.port);
    let listener = tokio::net::TcpListener::bind(&server_address).await?;
    tracing::info!("Web server running on http://{}", server_address);

    let db = Database::connect(&config.db_url).await?;
    migration::Migrator::up(&db, None).await?;
    tracing::info!("Database migrations applied successfully");

    let task_state = Arc::new(TaskState { db: Arc::new(db) });
    let app = create_app(task_state, health_state);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("Web server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", err);
    }
}

#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    ),
    tag = "Health"
)]
pub async fn health_check_handler(State(state): State<Arc<HealthState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK".to_string(),
        timestamp: Utc::now(),
        uptime: state.started_at.elapsed().as_secs_f64(),
    })
}

#[tracing::instrument]
pub async fn fallback_handler(uri: Uri) -> ApiError {
    tracing::debug!("No route for {}", uri);
    ApiError::RouteNotFound
}

fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else {
        "Unknown panic".to_string()
    };
    tracing::error!("Handler panicked: {}", detail);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new(
            "Internal server error".to_string(),
            Some(detail),
        )),
    )
        .into_response()
}
