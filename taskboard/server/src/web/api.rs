use std::sync::Arc;

use axum::{Router, routing::get};
use utoipa::OpenApi;

use crate::task::TaskState;
use crate::task::api::v1;
use crate::web::error::ErrorResponse;
use crate::web::{HealthResponse, HealthState, health_check_handler};

#[derive(OpenApi)]
#[openapi(
    paths(
        v1::list_tasks_handler,
        v1::get_task_handler,
        v1::create_task_handler,
        v1::update_task_handler,
        v1::delete_task_handler,
        v1::clear_completed_handler,
        v1::stats_handler,
        crate::web::health_check_handler,
    ),
    components(schemas(
        v1::TaskJson,
        v1::CreateTaskRequest,
        v1::UpdateTaskRequest,
        v1::DeleteTaskResponse,
        v1::ClearCompletedResponse,
        v1::StatsResponse,
        HealthResponse,
        ErrorResponse,
    )),
    tags(
        (name = "Tasks", description = "Task list management"),
        (name = "Health", description = "Service liveness")
    )
)]
pub struct ApiDoc;

/// Creates the API routes for JSON API endpoints, all under `/api`.
pub fn create_api_router(task_state: Arc<TaskState>, health_state: Arc<HealthState>) -> Router {
    let health_router = Router::new()
        .route("/health", get(health_check_handler))
        .with_state(health_state);
    let api_routes = v1::create_api_router(task_state).merge(health_router);
    Router::new().nest("/api", api_routes)
}
