mod config;
pub mod database;
pub mod memory;
pub mod migrations;

pub use config::{Config, MessagesConfig, ScoringConfig, UserConfig, DEFAULT_RESET_BASELINE};
pub use database::SqliteStore;
pub use memory::MemoryStore;

use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::error::{ConfigError, CoreError, Result};
use crate::model::{NewTask, NewUser, Task, TaskId, User, UserId};

/// Flat CRUD interface over users and tasks.
///
/// Implementations assign ids and hold no scoring logic; the orchestrator in
/// [`crate::service`] decides what to write.
pub trait Store {
    fn get_user(&self, id: UserId) -> Result<Option<User>>;
    fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;
    /// Insert a user with default respect and empty streak fields.
    fn create_user(&mut self, new_user: &NewUser) -> Result<User>;
    /// Overwrite every mutable field. Returns false if the user is unknown.
    fn update_user(&mut self, user: &User) -> Result<bool>;

    /// Tasks owned by `user_id`, in creation order.
    fn list_tasks(&self, user_id: UserId) -> Result<Vec<Task>>;
    fn get_task(&self, id: TaskId) -> Result<Option<Task>>;
    fn create_task(
        &mut self,
        user_id: UserId,
        new_task: &NewTask,
        created_at: DateTime<Utc>,
    ) -> Result<Task>;
    /// Overwrite every mutable field. Returns false if the task is unknown.
    fn update_task(&mut self, task: &Task) -> Result<bool>;
    /// Returns false if the task did not exist.
    fn delete_task(&mut self, id: TaskId) -> Result<bool>;

    /// Write a task change and the scored user as one unit.
    ///
    /// Either both writes land or neither does. A missing task or user is
    /// reported as [`CoreError::NotFound`] and leaves the store untouched.
    fn commit_event(&mut self, write: TaskWrite<'_>, user: &User) -> Result<()>;

    /// Overwrite the user and delete every task they own as one unit.
    /// Returns the number of deleted tasks.
    fn reset_user(&mut self, user: &User) -> Result<usize>;
}

/// Task side of a scoring event.
#[derive(Debug, Clone, Copy)]
pub enum TaskWrite<'a> {
    Update(&'a Task),
    Delete(TaskId),
}

impl TaskWrite<'_> {
    pub fn task_id(&self) -> TaskId {
        match self {
            TaskWrite::Update(task) => task.id,
            TaskWrite::Delete(id) => *id,
        }
    }
}

/// Returns `~/.config/taskmaster[-dev]/` based on TASKMASTER_ENV.
///
/// Set TASKMASTER_ENV=dev to use development data directory, or
/// TASKMASTER_DATA_DIR to point somewhere else entirely.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("TASKMASTER_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("TASKMASTER_ENV").unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("taskmaster-dev")
            } else {
                base_dir.join("taskmaster")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
