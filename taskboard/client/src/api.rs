//! Client side of the task REST API.
//!
//! This module provides:
//! - The wire types exchanged with the server (tasks, priorities, stats)
//! - The [`TaskApi`] trait every client-side operation goes through
//! - [`HttpTaskApi`], the reqwest implementation talking to a running server

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ClientError;

/// Priority tag of a task.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        };
        f.write_str(name)
    }
}

/// Three-way view selector shared with the server's `filter` query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Filter {
    #[default]
    All,
    Active,
    Completed,
}

impl Filter {
    /// Value sent as the `filter` query parameter.
    pub fn as_query(self) -> &'static str {
        match self {
            Filter::All => "all",
            Filter::Active => "active",
            Filter::Completed => "completed",
        }
    }

    /// Whether `task` belongs in this view.
    pub fn matches(self, task: &Task) -> bool {
        match self {
            Filter::All => true,
            Filter::Active => !task.completed,
            Filter::Completed => task.completed,
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_query())
    }
}

/// A task as returned by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub text: String,
    pub completed: bool,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Aggregate counts reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub total: u64,
    pub completed: u64,
    pub active: u64,
}

/// Fields to change on a task. Unset fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
}

#[derive(Debug, Serialize)]
struct CreateTaskBody<'a> {
    text: &'a str,
    priority: Priority,
}

#[derive(Debug, Deserialize)]
struct DeleteTaskBody {
    task: Task,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClearCompletedBody {
    deleted_count: u64,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
    #[serde(default)]
    error: Option<String>,
}

/// Operations the client performs against the task service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskApi {
    /// Lists tasks matching `filter`, newest first.
    async fn list_tasks(&self, filter: Filter) -> Result<Vec<Task>, ClientError>;
    /// Creates a task and returns the stored record.
    async fn create_task(&self, text: &str, priority: Priority) -> Result<Task, ClientError>;
    /// Applies `update` to the task with `id`.
    async fn update_task(&self, id: &str, update: TaskUpdate) -> Result<Task, ClientError>;
    /// Deletes the task with `id` and returns it.
    async fn delete_task(&self, id: &str) -> Result<Task, ClientError>;
    /// Removes every completed task, returning how many went away.
    async fn clear_completed(&self) -> Result<u64, ClientError>;
    /// Fetches aggregate counts.
    async fn stats(&self) -> Result<Stats, ClientError>;
}

/// [`TaskApi`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTaskApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTaskApi {
    /// Creates a client for the API rooted at `base_url`, e.g.
    /// `http://localhost:5000/api`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl TaskApi for HttpTaskApi {
    #[tracing::instrument(skip(self))]
    async fn list_tasks(&self, filter: Filter) -> Result<Vec<Task>, ClientError> {
        let response = self
            .client
            .get(self.url("/tasks"))
            .query(&[("filter", filter.as_query())])
            .send()
            .await?;
        parse_response(response).await
    }

    #[tracing::instrument(skip(self))]
    async fn create_task(&self, text: &str, priority: Priority) -> Result<Task, ClientError> {
        let response = self
            .client
            .post(self.url("/tasks"))
            .json(&CreateTaskBody { text, priority })
            .send()
            .await?;
        parse_response(response).await
    }

    #[tracing::instrument(skip(self))]
    async fn update_task(&self, id: &str, update: TaskUpdate) -> Result<Task, ClientError> {
        let response = self
            .client
            .put(self.url(&format!("/tasks/{}", id)))
            .json(&update)
            .send()
            .await?;
        parse_response(response).await
    }

    #[tracing::instrument(skip(self))]
    async fn delete_task(&self, id: &str) -> Result<Task, ClientError> {
        let response = self
            .client
            .delete(self.url(&format!("/tasks/{}", id)))
            .send()
            .await?;
        let body: DeleteTaskBody = parse_response(response).await?;
        Ok(body.task)
    }

    #[tracing::instrument(skip(self))]
    async fn clear_completed(&self) -> Result<u64, ClientError> {
        let response = self.client.delete(self.url("/tasks")).send().await?;
        let body: ClearCompletedBody = parse_response(response).await?;
        Ok(body.deleted_count)
    }

    #[tracing::instrument(skip(self))]
    async fn stats(&self) -> Result<Stats, ClientError> {
        let response = self.client.get(self.url("/stats")).send().await?;
        parse_response(response).await
    }
}

async fn parse_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }
    let body = response.text().await.unwrap_or_default();
    tracing::debug!(%status, "Request failed: {}", body);
    Err(error_from_body(status, &body))
}

/// Builds the error for a non-success response, preferring the server's own
/// message over the bare status text.
fn error_from_body(status: StatusCode, body: &str) -> ClientError {
    let message = match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            message,
            error: Some(detail),
        }) => format!("{} ({})", message, detail),
        Ok(ErrorBody { message, .. }) => message,
        Err(_) => status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string(),
    };
    ClientError::Api {
        status: status.as_u16(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn can_build_urls_without_double_slashes() {
        let api = HttpTaskApi::new("http://localhost:5000/api/");
        assert_eq!(api.url("/tasks"), "http://localhost:5000/api/tasks");
    }

    #[test]
    fn can_read_server_error_message_with_detail() {
        let err = error_from_body(
            StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"message": "Failed to fetch tasks", "error": "connection refused"}"#,
        );
        assert_eq!(
            err.to_string(),
            "server responded 500: Failed to fetch tasks (connection refused)"
        );
    }

    #[test]
    fn can_read_server_error_message_without_detail() {
        let err = error_from_body(StatusCode::NOT_FOUND, r#"{"message": "Task not found"}"#);
        assert!(matches!(
            err,
            ClientError::Api { status: 404, ref message } if message == "Task not found"
        ));
    }

    #[test]
    fn can_fall_back_to_status_text_for_unreadable_bodies() {
        let err = error_from_body(StatusCode::BAD_GATEWAY, "<html>oops</html>");
        assert!(matches!(
            err,
            ClientError::Api { status: 502, ref message } if message == "Bad Gateway"
        ));
    }

    #[test]
    fn can_read_task_from_server_json() {
        let json = r#"{
            "id": "5b0f6a4e-4c3e-4d7a-9d8f-2f1f1b6c9a10",
            "text": "buy milk",
            "completed": false,
            "priority": "medium",
            "createdAt": "2025-10-18T09:00:00Z",
            "updatedAt": "2025-10-18T09:00:00Z"
        }"#;

        let task: Task = serde_json::from_str(json).unwrap();

        assert_eq!(task.text, "buy milk");
        assert_eq!(task.priority, Priority::Medium);
        assert!(!task.completed);
    }

    #[test]
    fn update_only_sends_supplied_fields() {
        let update = TaskUpdate {
            completed: Some(true),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(update).unwrap(),
            serde_json::json!({ "completed": true })
        );
    }
}
