use crate::entities::task::Priority;
use crate::task::{Task, TaskFilter, TaskPatch, TaskService, TaskState, TaskStats, parse_task_id};
use crate::web::error::{ApiError, ErrorResponse};
use axum::{
    Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::Json,
    routing::get,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// JSON representation of a Task for API responses.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaskJson {
    /// Unique identifier assigned at creation
    pub id: Uuid,
    /// The task text
    pub text: String,
    /// Whether the task is done
    pub completed: bool,
    /// Priority tag
    pub priority: Priority,
    /// When the task was created
    pub created_at: DateTime<Utc>,
    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

impl From<Task> for TaskJson {
    fn from(task: Task) -> Self {
        Self {
            id: task.id(),
            text: task.text().to_string(),
            completed: task.completed(),
            priority: task.priority(),
            created_at: task.created_at(),
            updated_at: task.updated_at(),
        }
    }
}

/// Query parameters for listing tasks.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListTasksQuery {
    /// `active`, `completed`, or anything else for all tasks
    #[serde(default)]
    filter: Option<String>,
}

/// Request body for creating a task.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateTaskRequest {
    /// Task text; must contain something other than whitespace
    #[serde(default)]
    pub text: String,
    /// Priority tag, `medium` when omitted
    #[serde(default)]
    pub priority: Option<Priority>,
}

/// Request body for updating a task. Omitted fields are left unchanged.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateTaskRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub completed: Option<bool>,
    #[serde(default)]
    pub priority: Option<Priority>,
}

impl From<UpdateTaskRequest> for TaskPatch {
    fn from(request: UpdateTaskRequest) -> Self {
        TaskPatch {
            text: request.text,
            completed: request.completed,
            priority: request.priority,
        }
    }
}

/// Response for deleting a single task.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteTaskResponse {
    pub message: String,
    /// The removed task
    pub task: TaskJson,
}

/// Response for clearing completed tasks.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClearCompletedResponse {
    pub message: String,
    /// Number of tasks removed
    pub deleted_count: u64,
}

/// Aggregate task counts.
#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct StatsResponse {
    pub total: u64,
    pub completed: u64,
    pub active: u64,
}

impl From<TaskStats> for StatsResponse {
    fn from(stats: TaskStats) -> Self {
        Self {
            total: stats.total,
            completed: stats.completed,
            active: stats.active,
        }
    }
}

/// Handler for GET /api/tasks - Returns tasks newest first, optionally filtered.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/tasks",
    params(ListTasksQuery),
    responses(
        (status = 200, description = "Successfully retrieved tasks", body = [TaskJson]),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn list_tasks_handler(
    State(state): State<Arc<TaskState>>,
    query: Result<Query<ListTasksQuery>, QueryRejection>,
) -> Result<Json<Vec<TaskJson>>, ApiError> {
    let filter = list_filter(query);
    let tasks = TaskService::new(&state.db)
        .list_tasks(filter)
        .await
        .map_err(|err| ApiError::from_service(err, "Failed to fetch tasks"))?;
    Ok(Json(tasks.into_iter().map(TaskJson::from).collect()))
}

/// A query string that cannot be read, such as a repeated `filter`, places no
/// restriction on the listing.
fn list_filter(query: Result<Query<ListTasksQuery>, QueryRejection>) -> TaskFilter {
    match query {
        Ok(Query(query)) => TaskFilter::from_query_value(query.filter.as_deref()),
        Err(rejection) => {
            tracing::debug!("Listing all tasks for unreadable query: {}", rejection);
            TaskFilter::All
        }
    }
}

/// Handler for GET /api/tasks/{id} - Returns a single task.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/tasks/{id}",
    params(("id" = String, Path, description = "ID of the task")),
    responses(
        (status = 200, description = "Successfully retrieved task", body = TaskJson),
        (status = 404, description = "Task not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn get_task_handler(
    State(state): State<Arc<TaskState>>,
    Path(id): Path<String>,
) -> Result<Json<TaskJson>, ApiError> {
    let context = "Failed to fetch task";
    let id = parse_task_id(&id).map_err(|err| ApiError::from_service(err, context))?;
    let task = TaskService::new(&state.db)
        .get_task(id)
        .await
        .map_err(|err| ApiError::from_service(err, context))?;
    Ok(Json(TaskJson::from(task)))
}

/// Handler for POST /api/tasks - Creates a task.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    post,
    path = "/api/tasks",
    request_body = CreateTaskRequest,
    responses(
        (status = 201, description = "Task created", body = TaskJson),
        (status = 400, description = "Empty text or malformed body", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn create_task_handler(
    State(state): State<Arc<TaskState>>,
    payload: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TaskJson>), ApiError> {
    let Json(request) = payload.map_err(ApiError::invalid_body)?;
    let task = TaskService::new(&state.db)
        .create_task(&request.text, request.priority)
        .await
        .map_err(|err| ApiError::from_service(err, "Failed to create task"))?;
    Ok((StatusCode::CREATED, Json(TaskJson::from(task))))
}

/// Handler for PUT /api/tasks/{id} - Replaces the supplied fields of a task.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    put,
    path = "/api/tasks/{id}",
    params(("id" = String, Path, description = "ID of the task")),
    request_body = UpdateTaskRequest,
    responses(
        (status = 200, description = "Task updated", body = TaskJson),
        (status = 400, description = "Malformed body", body = ErrorResponse),
        (status = 404, description = "Task not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn update_task_handler(
    State(state): State<Arc<TaskState>>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateTaskRequest>, JsonRejection>,
) -> Result<Json<TaskJson>, ApiError> {
    let context = "Failed to update task";
    let id = parse_task_id(&id).map_err(|err| ApiError::from_service(err, context))?;
    let Json(request) = payload.map_err(ApiError::invalid_body)?;
    let task = TaskService::new(&state.db)
        .update_task(id, request.into())
        .await
        .map_err(|err| ApiError::from_service(err, context))?;
    Ok(Json(TaskJson::from(task)))
}

/// Handler for DELETE /api/tasks/{id} - Deletes a task.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    delete,
    path = "/api/tasks/{id}",
    params(("id" = String, Path, description = "ID of the task")),
    responses(
        (status = 200, description = "Task deleted", body = DeleteTaskResponse),
        (status = 404, description = "Task not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn delete_task_handler(
    State(state): State<Arc<TaskState>>,
    Path(id): Path<String>,
) -> Result<Json<DeleteTaskResponse>, ApiError> {
    let context = "Failed to delete task";
    let id = parse_task_id(&id).map_err(|err| ApiError::from_service(err, context))?;
    let task = TaskService::new(&state.db)
        .delete_task(id)
        .await
        .map_err(|err| ApiError::from_service(err, context))?;
    Ok(Json(DeleteTaskResponse {
        message: "Task deleted".to_string(),
        task: TaskJson::from(task),
    }))
}

/// Handler for DELETE /api/tasks - Removes every completed task.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    delete,
    path = "/api/tasks",
    responses(
        (status = 200, description = "Completed tasks cleared", body = ClearCompletedResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn clear_completed_handler(
    State(state): State<Arc<TaskState>>,
) -> Result<Json<ClearCompletedResponse>, ApiError> {
    let deleted_count = TaskService::new(&state.db)
        .clear_completed()
        .await
        .map_err(|err| ApiError::from_service(err, "Failed to clear tasks"))?;
    Ok(Json(ClearCompletedResponse {
        message: format!("Cleared {} completed tasks", deleted_count),
        deleted_count,
    }))
}

/// Handler for GET /api/stats - Returns task counts.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/stats",
    responses(
        (status = 200, description = "Successfully computed stats", body = StatsResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn stats_handler(
    State(state): State<Arc<TaskState>>,
) -> Result<Json<StatsResponse>, ApiError> {
    let stats = TaskService::new(&state.db)
        .stats()
        .await
        .map_err(|err| ApiError::from_service(err, "Failed to fetch stats"))?;
    Ok(Json(StatsResponse::from(stats)))
}

/// Creates and returns the tasks API router.
pub fn create_api_router(state: Arc<TaskState>) -> Router {
    Router::new()
        .route(
            "/tasks",
            get(list_tasks_handler)
                .post(create_task_handler)
                .delete(clear_completed_handler),
        )
        .route(
            "/tasks/{id}",
            get(get_task_handler)
                .put(update_task_handler)
                .delete(delete_task_handler),
        )
        .route("/stats", get(stats_handler))
        .with_state(state)
}
