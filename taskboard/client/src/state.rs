//! Client-side task state.
//!
//! A [`TaskBoard`] owns the list last received from the server together with
//! the selected creation priority and list filter. Every mutation is sent to
//! the server and followed by a full reload of the filtered list, so the held
//! list only ever reflects what the server confirmed. A failed call leaves the
//! held list as it was.

use std::convert::Infallible;
use std::str::FromStr;

use crate::ClientError;
use crate::api::{Filter, Priority, Task, TaskApi, TaskUpdate};
use crate::render::{Summary, SummarySource, visible_tasks};

/// How the user points at a task: by its row in the visible list (1-based) or
/// by its ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskRef {
    Position(usize),
    Id(String),
}

impl FromStr for TaskRef {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.parse::<usize>() {
            Ok(position) => TaskRef::Position(position),
            Err(_) => TaskRef::Id(s.to_string()),
        })
    }
}

pub struct TaskBoard<A> {
    api: A,
    tasks: Vec<Task>,
    priority: Priority,
    filter: Filter,
}

impl<A: TaskApi> TaskBoard<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            tasks: Vec::new(),
            priority: Priority::default(),
            filter: Filter::default(),
        }
    }

    /// The list last received from the server.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn filter(&self) -> Filter {
        self.filter
    }

    /// Held tasks that belong in the current filter view.
    pub fn visible(&self) -> Vec<&Task> {
        visible_tasks(&self.tasks, self.filter)
    }

    /// Selects the priority used for tasks added from now on.
    pub fn set_priority(&mut self, priority: Priority) {
        self.priority = priority;
    }

    /// Switches the list view and reloads it from the server.
    pub async fn set_filter(&mut self, filter: Filter) -> Result<(), ClientError> {
        self.filter = filter;
        self.load().await
    }

    /// Replaces the held list with the server's current filtered list.
    #[tracing::instrument(skip(self))]
    pub async fn load(&mut self) -> Result<(), ClientError> {
        let tasks = self.api.list_tasks(self.filter).await?;
        tracing::debug!("Loaded {} tasks", tasks.len());
        self.tasks = tasks;
        Ok(())
    }

    /// Adds a task with the selected priority.
    #[tracing::instrument(skip(self))]
    pub async fn add(&mut self, text: &str) -> Result<Task, ClientError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ClientError::EmptyText);
        }
        let created = self.api.create_task(text, self.priority).await?;
        self.load().await?;
        Ok(created)
    }

    /// Flips the completion flag of a held task.
    #[tracing::instrument(skip(self))]
    pub async fn toggle(&mut self, task: &TaskRef) -> Result<(), ClientError> {
        let held = self.resolve(task)?;
        let id = held.id.clone();
        let update = TaskUpdate {
            completed: Some(!held.completed),
            ..Default::default()
        };
        self.api.update_task(&id, update).await?;
        self.load().await
    }

    /// Replaces a task's text. Returns `false` without contacting the server
    /// when the new text is empty after trimming.
    #[tracing::instrument(skip(self))]
    pub async fn edit(&mut self, task: &TaskRef, new_text: &str) -> Result<bool, ClientError> {
        let new_text = new_text.trim();
        if new_text.is_empty() {
            return Ok(false);
        }
        let id = self.id_of(task)?;
        let update = TaskUpdate {
            text: Some(new_text.to_string()),
            ..Default::default()
        };
        self.api.update_task(&id, update).await?;
        self.load().await?;
        Ok(true)
    }

    /// Deletes a task and returns the removed record.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&mut self, task: &TaskRef) -> Result<Task, ClientError> {
        let id = self.id_of(task)?;
        let removed = self.api.delete_task(&id).await?;
        self.load().await?;
        Ok(removed)
    }

    /// Removes every completed task on the server.
    #[tracing::instrument(skip(self))]
    pub async fn clear_completed(&mut self) -> Result<u64, ClientError> {
        let removed = self.api.clear_completed().await?;
        self.load().await?;
        Ok(removed)
    }

    /// Totals from the server, or counted from the held list if the server
    /// cannot provide them.
    pub async fn summary(&self) -> Summary {
        match self.api.stats().await {
            Ok(stats) => Summary {
                total: stats.total,
                completed: stats.completed,
                source: SummarySource::Server,
            },
            Err(err) => {
                tracing::warn!("Falling back to local counts: {}", err);
                Summary::from_tasks(&self.tasks)
            }
        }
    }

    /// Finds the held task `task` points at.
    pub fn resolve(&self, task: &TaskRef) -> Result<&Task, ClientError> {
        match task {
            TaskRef::Position(position) => position
                .checked_sub(1)
                .and_then(|index| self.visible().get(index).copied())
                .ok_or(ClientError::NoSuchRow(*position)),
            TaskRef::Id(id) => self
                .tasks
                .iter()
                .find(|held| &held.id == id)
                .ok_or_else(|| ClientError::TaskNotLoaded(id.clone())),
        }
    }

    /// IDs are passed through as given; only row positions need the held list.
    fn id_of(&self, task: &TaskRef) -> Result<String, ClientError> {
        match task {
            TaskRef::Position(_) => self.resolve(task).map(|held| held.id.clone()),
            TaskRef::Id(id) => Ok(id.clone()),
        }
    }
}
