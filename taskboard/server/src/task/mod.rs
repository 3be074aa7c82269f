use crate::entities::task::{self, Priority};
use chrono::{DateTime, Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder,
};
use std::sync::Arc;
use uuid::Uuid;

pub mod api;

#[derive(Clone, Debug)]
pub struct TaskState {
    pub db: Arc<DatabaseConnection>,
}

#[derive(Debug, PartialEq, Clone, Eq)]
pub struct Task {
    id: Uuid,
    text: String,
    completed: bool,
    priority: Priority,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Task {
    pub fn new(
        id: Uuid,
        text: String,
        completed: bool,
        priority: Priority,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            text,
            completed,
            priority,
            created_at,
            updated_at,
        }
    }

    /// Returns the ID of the task.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns the text of the task.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns whether the task is completed.
    pub fn completed(&self) -> bool {
        self.completed
    }

    /// Returns the priority of the task.
    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// Returns when the task was created.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns when the task was last updated.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

impl From<task::Model> for Task {
    fn from(model: task::Model) -> Self {
        Task::new(
            model.id,
            model.text,
            model.completed,
            model.priority,
            model.created_at,
            model.updated_at,
        )
    }
}

/// Which tasks a listing should include.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TaskFilter {
    #[default]
    All,
    Active,
    Completed,
}

impl TaskFilter {
    /// Interprets the `filter` query value. Anything other than `active` or
    /// `completed` lists every task.
    pub fn from_query_value(value: Option<&str>) -> Self {
        match value {
            Some("active") => TaskFilter::Active,
            Some("completed") => TaskFilter::Completed,
            _ => TaskFilter::All,
        }
    }

    fn completed_flag(self) -> Option<bool> {
        match self {
            TaskFilter::All => None,
            TaskFilter::Active => Some(false),
            TaskFilter::Completed => Some(true),
        }
    }
}

/// Fields to replace on an existing task. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub text: Option<String>,
    pub completed: Option<bool>,
    pub priority: Option<Priority>,
}

/// Aggregate counts over the whole collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskStats {
    pub total: u64,
    pub completed: u64,
    pub active: u64,
}

/// Error type for TaskService operations.
#[derive(Debug, thiserror::Error)]
pub enum TaskServiceError {
    /// Input was rejected before touching the store.
    #[error("{0}")]
    Validation(String),
    /// No task exists with the given ID.
    #[error("Task with ID {0} not found")]
    TaskNotFound(String),
    /// The store could not complete the operation.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

/// Parses a raw path segment into a task ID. A malformed ID cannot name any
/// stored task, so it is reported as not found.
pub fn parse_task_id(raw: &str) -> Result<Uuid, TaskServiceError> {
    Uuid::parse_str(raw).map_err(|_| TaskServiceError::TaskNotFound(raw.to_string()))
}

pub struct TaskService<'a> {
    db: &'a DatabaseConnection,
}

impl TaskService<'_> {
    pub fn new(db: &DatabaseConnection) -> TaskService<'_> {
        TaskService { db }
    }

    /// Lists tasks matching `filter`, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn list_tasks(&self, filter: TaskFilter) -> Result<Vec<Task>, TaskServiceError> {
        let mut query = task::Entity::find();
        if let Some(completed) = filter.completed_flag() {
            query = query.filter(task::Column::Completed.eq(completed));
        }
        let tasks = query
            .order_by_desc(task::Column::CreatedAt)
            .all(self.db)
            .await?
            .into_iter()
            .map(Task::from)
            .collect();
        Ok(tasks)
    }

    /// Retrieves a task by its ID.
    #[tracing::instrument(skip(self))]
    pub async fn get_task(&self, id: Uuid) -> Result<Task, TaskServiceError> {
        let model = task::Entity::find_by_id(id)
            .one(self.db)
            .await?
            .ok_or_else(|| TaskServiceError::TaskNotFound(id.to_string()))?;
        Ok(Task::from(model))
    }

    /// Creates a new task.
    ///
    /// # Arguments
    ///
    /// * `text` - The task text. Surrounding whitespace is trimmed and the
    ///   remainder must not be empty.
    /// * `priority` - The priority tag, `medium` when omitted.
    ///
    /// # Returns
    ///
    /// The stored task including its generated ID and timestamps.
    #[tracing::instrument(skip(self))]
    pub async fn create_task(
        &self,
        text: &str,
        priority: Option<Priority>,
    ) -> Result<Task, TaskServiceError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(TaskServiceError::Validation(
                "Task text must not be empty".to_string(),
            ));
        }

        let now = Utc::now();
        let active_model = task::ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4()),
            text: ActiveValue::Set(text.to_string()),
            completed: ActiveValue::Set(false),
            priority: ActiveValue::Set(priority.unwrap_or_default()),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
        };
        let created_model = active_model.insert(self.db).await?;
        tracing::info!(task_id = %created_model.id, "Created task");
        Ok(Task::from(created_model))
    }

    /// Applies the supplied fields of `patch` to a task and refreshes its
    /// update timestamp. The text is stored as given.
    #[tracing::instrument(skip(self))]
    pub async fn update_task(&self, id: Uuid, patch: TaskPatch) -> Result<Task, TaskServiceError> {
        let existing = task::Entity::find_by_id(id)
            .one(self.db)
            .await?
            .ok_or_else(|| TaskServiceError::TaskNotFound(id.to_string()))?;

        // The store keeps microseconds; never let updated_at stand still.
        let updated_at = Utc::now().max(existing.updated_at + Duration::microseconds(1));

        let mut active_model: task::ActiveModel = existing.into();
        if let Some(text) = patch.text {
            active_model.text = ActiveValue::Set(text);
        }
        if let Some(completed) = patch.completed {
            active_model.completed = ActiveValue::Set(completed);
        }
        if let Some(priority) = patch.priority {
            active_model.priority = ActiveValue::Set(priority);
        }
        active_model.updated_at = ActiveValue::Set(updated_at);

        let updated_model = active_model.update(self.db).await?;
        Ok(Task::from(updated_model))
    }

    /// Deletes a task by its ID and returns the removed record.
    #[tracing::instrument(skip(self))]
    pub async fn delete_task(&self, id: Uuid) -> Result<Task, TaskServiceError> {
        let task_to_delete = self.get_task(id).await?;
        let result = task::Entity::delete_by_id(id).exec(self.db).await?;
        if result.rows_affected == 0 {
            return Err(TaskServiceError::TaskNotFound(id.to_string()));
        }
        tracing::info!(task_id = %id, "Deleted task");
        Ok(task_to_delete)
    }

    /// Removes every completed task and returns how many were removed.
    #[tracing::instrument(skip(self))]
    pub async fn clear_completed(&self) -> Result<u64, TaskServiceError> {
        let result = task::Entity::delete_many()
            .filter(task::Column::Completed.eq(true))
            .exec(self.db)
            .await?;
        tracing::info!("Cleared {} completed tasks", result.rows_affected);
        Ok(result.rows_affected)
    }

    /// Counts tasks in the collection as it is right now.
    #[tracing::instrument(skip(self))]
    pub async fn stats(&self) -> Result<TaskStats, TaskServiceError> {
        let total = task::Entity::find().count(self.db).await?;
        let completed = task::Entity::find()
            .filter(task::Column::Completed.eq(true))
            .count(self.db)
            .await?;
        Ok(TaskStats {
            total,
            completed,
            active: total.saturating_sub(completed),
        })
    }
}
