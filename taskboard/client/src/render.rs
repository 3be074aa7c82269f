//! Pure text projection of the client's task list.

use crate::api::{Filter, Task};

/// Where summary counts came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummarySource {
    /// Reported by the server's stats endpoint.
    Server,
    /// Counted from the locally held list because the server could not answer.
    Local,
}

/// Totals shown under the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub total: u64,
    pub completed: u64,
    pub source: SummarySource,
}

impl Summary {
    /// Counts `tasks` directly.
    pub fn from_tasks(tasks: &[Task]) -> Self {
        Self {
            total: tasks.len() as u64,
            completed: tasks.iter().filter(|task| task.completed).count() as u64,
            source: SummarySource::Local,
        }
    }
}

/// Tasks from `tasks` that belong in the `filter` view, in their held order.
pub fn visible_tasks(tasks: &[Task], filter: Filter) -> Vec<&Task> {
    tasks.iter().filter(|task| filter.matches(task)).collect()
}

/// Message shown in place of an empty list.
pub fn empty_message(filter: Filter) -> &'static str {
    match filter {
        Filter::All => "No tasks yet. Add one to get started!",
        Filter::Active => "No active tasks.",
        Filter::Completed => "No completed tasks yet.",
    }
}

/// Renders the visible tasks as numbered rows. Row numbers are what the
/// toggle/edit/delete commands accept.
pub fn render_list(tasks: &[Task], filter: Filter) -> String {
    let visible = visible_tasks(tasks, filter);
    if visible.is_empty() {
        return empty_message(filter).to_string();
    }
    visible
        .iter()
        .enumerate()
        .map(|(index, task)| render_row(index + 1, task))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_row(position: usize, task: &Task) -> String {
    let mark = if task.completed { 'x' } else { ' ' };
    format!(
        "{}. [{}] {}  ({})  {}",
        position, mark, task.text, task.priority, task.id
    )
}

pub fn render_summary(summary: &Summary) -> String {
    let counts = format!("{} total, {} completed", summary.total, summary.completed);
    match summary.source {
        SummarySource::Server => counts,
        SummarySource::Local => format!("{} (local count)", counts),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Priority;
    use chrono::{TimeZone, Utc};
    use insta::assert_snapshot;

    fn task(id: &str, text: &str, completed: bool, priority: Priority) -> Task {
        let at = Utc.with_ymd_and_hms(2025, 10, 18, 9, 0, 0).unwrap();
        Task {
            id: id.to_string(),
            text: text.to_string(),
            completed,
            priority,
            created_at: at,
            updated_at: at,
        }
    }

    fn sample_tasks() -> Vec<Task> {
        vec![
            task("t3", "walk the dog", false, Priority::High),
            task("t2", "buy milk", true, Priority::Medium),
            task("t1", "file taxes", false, Priority::Low),
        ]
    }

    #[test]
    fn can_render_all_tasks() {
        assert_snapshot!(render_list(&sample_tasks(), Filter::All), @r"
        1. [ ] walk the dog  (high)  t3
        2. [x] buy milk  (medium)  t2
        3. [ ] file taxes  (low)  t1
        ");
    }

    #[test]
    fn can_render_only_active_tasks() {
        assert_snapshot!(render_list(&sample_tasks(), Filter::Active), @r"
        1. [ ] walk the dog  (high)  t3
        2. [ ] file taxes  (low)  t1
        ");
    }

    #[test]
    fn can_render_only_completed_tasks() {
        assert_snapshot!(
            render_list(&sample_tasks(), Filter::Completed),
            @"1. [x] buy milk  (medium)  t2"
        );
    }

    #[test]
    fn can_render_filter_specific_empty_states() {
        let only_done = vec![task("t1", "done already", true, Priority::Low)];

        assert_eq!(render_list(&[], Filter::All), empty_message(Filter::All));
        assert_eq!(
            render_list(&only_done, Filter::Active),
            "No active tasks."
        );
        assert_eq!(
            render_list(&[], Filter::Completed),
            "No completed tasks yet."
        );
    }

    #[test]
    fn visible_tasks_keep_held_order() {
        let tasks = sample_tasks();

        let visible: Vec<&str> = visible_tasks(&tasks, Filter::Active)
            .iter()
            .map(|task| task.id.as_str())
            .collect();

        assert_eq!(visible, vec!["t3", "t1"]);
    }

    #[test]
    fn can_count_locally_held_tasks() {
        let summary = Summary::from_tasks(&sample_tasks());

        assert_eq!(summary.total, 3);
        assert_eq!(summary.completed, 1);
        assert_eq!(render_summary(&summary), "3 total, 1 completed (local count)");
    }

    #[test]
    fn can_render_server_summary() {
        let summary = Summary {
            total: 5,
            completed: 2,
            source: SummarySource::Server,
        };
        assert_eq!(render_summary(&summary), "5 total, 2 completed");
    }
}
