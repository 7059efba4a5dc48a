//! Task management commands for CLI.

use chrono::{NaiveDate, Utc};
use clap::Subcommand;
use serde_json::json;
use taskmaster_core::{sort_tasks, NewTask, Priority, Task, TaskFilter, TaskId, TaskSort};

use super::{find_user, open_service, print_json, CliResult};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Create a new task
    Add {
        /// Owner's username
        #[arg(long)]
        user: String,
        /// Task title (1-100 characters)
        title: String,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<NaiveDate>,
        /// Priority: low, medium or high (default: medium)
        #[arg(long, default_value = "medium")]
        priority: Priority,
    },
    /// List a user's tasks
    List {
        #[arg(long)]
        user: String,
        /// all, active or completed
        #[arg(long, default_value = "all")]
        filter: TaskFilter,
        /// due-date or priority
        #[arg(long, default_value = "due-date")]
        sort: TaskSort,
        /// Only tasks due on this date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<NaiveDate>,
    },
    /// Get task details
    Get {
        id: TaskId,
    },
    /// Mark a task complete
    Complete {
        id: TaskId,
    },
    /// Mark a task incomplete
    Uncomplete {
        id: TaskId,
    },
    /// Flip a task's completion
    Toggle {
        id: TaskId,
    },
    /// Delete a task
    Delete {
        id: TaskId,
    },
    /// Delete all completed tasks of a user
    ClearCompleted {
        #[arg(long)]
        user: String,
    },
    /// List open tasks that are past due
    Overdue {
        #[arg(long)]
        user: String,
    },
}

pub fn run(action: TaskAction, today: NaiveDate) -> CliResult {
    let mut service = open_service()?;
    match action {
        TaskAction::Add {
            user,
            title,
            due,
            priority,
        } => {
            let user = find_user(&service, &user)?;
            let mut new_task = NewTask::new(title).with_priority(priority);
            if let Some(due) = due {
                new_task = new_task.with_due_date(due);
            }
            let task = service.add_task(user.id, &new_task, Utc::now())?;
            print_json(&task)?;
        }
        TaskAction::List {
            user,
            filter,
            sort,
            due,
        } => {
            let user = find_user(&service, &user)?;
            let tasks = match due {
                Some(date) => {
                    let mut tasks: Vec<Task> = service
                        .tasks_due_on(user.id, date)?
                        .into_iter()
                        .filter(|t| filter.matches(t))
                        .collect();
                    sort_tasks(&mut tasks, sort);
                    tasks
                }
                None => service.tasks(user.id, filter, sort)?,
            };
            print_json(&tasks)?;
        }
        TaskAction::Get { id } => {
            let task = service.task(id)?;
            print_json(&json!({
                "task": task,
                "overdue": task.is_overdue(today),
            }))?;
        }
        TaskAction::Complete { id } => {
            print_json(&service.set_completed(id, true, today)?)?;
        }
        TaskAction::Uncomplete { id } => {
            print_json(&service.set_completed(id, false, today)?)?;
        }
        TaskAction::Toggle { id } => {
            print_json(&service.toggle_task(id, today)?)?;
        }
        TaskAction::Delete { id } => {
            print_json(&service.delete_task(id, today)?)?;
        }
        TaskAction::ClearCompleted { user } => {
            let user = find_user(&service, &user)?;
            let removed = service.clear_completed(user.id)?;
            print_json(&json!({ "removed": removed }))?;
        }
        TaskAction::Overdue { user } => {
            let user = find_user(&service, &user)?;
            let tasks = service.overdue_tasks(user.id, today)?;
            print_json(&tasks)?;
        }
    }
    Ok(())
}
