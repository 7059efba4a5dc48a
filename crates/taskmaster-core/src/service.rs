//! Task orchestration.
//!
//! [`TaskService`] turns task changes into scoring events and persists the
//! results: every toggle or deletion is mapped to at most one
//! [`TaskEvent`], applied to the owning [`User`], and answered with a fresh
//! AI message for the new respect level.
//!
//! The service never reads the clock. Callers pass `today` (a calendar date in
//! the user's local time) and `created_at` explicitly.
//!
//! One writer per user is assumed; the service does no locking of its own.

use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use rand_pcg::Mcg128Xsl64;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{CoreError, Result};
use crate::events::TaskEvent;
use crate::messages::{MessageSelector, Personality};
use crate::model::{
    sort_tasks, EventEffect, NewTask, NewUser, Task, TaskFilter, TaskId, TaskSort, User, UserId,
};
use crate::respect::{RespectLevel, Tier};
use crate::storage::{Config, Store, TaskWrite};

/// Result of a task change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskOutcome {
    /// The task after the change (or as it was, for deletions)
    pub task: Task,
    pub user: User,
    /// None when the change was respect-neutral
    pub effect: Option<EventEffect>,
    pub tier: Tier,
    pub message: String,
}

/// Result of a progress reset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetSummary {
    pub user: User,
    pub deleted_tasks: usize,
}

pub struct TaskService<S, R = Mcg128Xsl64> {
    store: S,
    selector: MessageSelector<R>,
    reset_baseline: RespectLevel,
}

impl<S: Store> TaskService<S> {
    /// Build a service using the reset baseline and message settings in `config`.
    pub fn from_config(store: S, config: &Config) -> Result<Self> {
        let reset_baseline = config.reset_baseline()?;
        Ok(Self::new(store, config.message_selector()?, reset_baseline))
    }
}

impl<S: Store, R: Rng> TaskService<S, R> {
    pub fn new(store: S, selector: MessageSelector<R>, reset_baseline: RespectLevel) -> Self {
        Self {
            store,
            selector,
            reset_baseline,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn reset_baseline(&self) -> RespectLevel {
        self.reset_baseline
    }

    /// Register a new user with default respect and no streak.
    ///
    /// # Errors
    /// Returns [`CoreError::Conflict`] if the username is taken.
    pub fn register_user(&mut self, new_user: &NewUser) -> Result<User> {
        let new_user = new_user.validate()?;
        if self.store.get_user_by_username(&new_user.username)?.is_some() {
            return Err(CoreError::Conflict(format!(
                "Username already exists: {}",
                new_user.username
            )));
        }
        let user = self.store.create_user(&new_user)?;
        info!(user_id = user.id, username = %user.username, "registered user");
        Ok(user)
    }

    pub fn user(&self, user_id: UserId) -> Result<User> {
        self.store
            .get_user(user_id)?
            .ok_or_else(|| CoreError::user_not_found(user_id))
    }

    pub fn user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.store.get_user_by_username(username)
    }

    pub fn task(&self, task_id: TaskId) -> Result<Task> {
        self.store
            .get_task(task_id)?
            .ok_or_else(|| CoreError::task_not_found(task_id))
    }

    pub fn add_task(
        &mut self,
        user_id: UserId,
        new_task: &NewTask,
        created_at: DateTime<Utc>,
    ) -> Result<Task> {
        let new_task = new_task.validate()?;
        self.user(user_id)?;
        let task = self.store.create_task(user_id, &new_task, created_at)?;
        debug!(user_id, task_id = task.id, "created task");
        Ok(task)
    }

    pub fn tasks(&self, user_id: UserId, filter: TaskFilter, sort: TaskSort) -> Result<Vec<Task>> {
        self.user(user_id)?;
        let mut tasks: Vec<Task> = self
            .store
            .list_tasks(user_id)?
            .into_iter()
            .filter(|t| filter.matches(t))
            .collect();
        sort_tasks(&mut tasks, sort);
        Ok(tasks)
    }

    /// Open tasks due before `today`, earliest first.
    pub fn overdue_tasks(&self, user_id: UserId, today: NaiveDate) -> Result<Vec<Task>> {
        Ok(self
            .tasks(user_id, TaskFilter::Active, TaskSort::DueDate)?
            .into_iter()
            .filter(|t| t.is_overdue(today))
            .collect())
    }

    /// Tasks due exactly on `date`, completed or not, highest priority first.
    pub fn tasks_due_on(&self, user_id: UserId, date: NaiveDate) -> Result<Vec<Task>> {
        Ok(self
            .tasks(user_id, TaskFilter::All, TaskSort::Priority)?
            .into_iter()
            .filter(|t| t.due_date == Some(date))
            .collect())
    }

    /// Set a task's completion flag and score the transition, if any.
    ///
    /// Setting the flag to its current value is a no-op for scoring.
    pub fn set_completed(
        &mut self,
        task_id: TaskId,
        completed: bool,
        today: NaiveDate,
    ) -> Result<TaskOutcome> {
        let mut task = self.task(task_id)?;
        let mut user = self.user(task.user_id)?;

        let Some(event) = TaskEvent::from_toggle(task.completed, completed) else {
            return Ok(self.outcome(task, user, None));
        };

        task.completed = completed;
        let effect = self.apply(&mut user, event, today);
        self.store.commit_event(TaskWrite::Update(&task), &user)?;

        Ok(self.outcome(task, user, Some(effect)))
    }

    /// Flip a task's completion flag.
    pub fn toggle_task(&mut self, task_id: TaskId, today: NaiveDate) -> Result<TaskOutcome> {
        let task = self.task(task_id)?;
        self.set_completed(task_id, !task.completed, today)
    }

    /// Delete a task. Only deleting an incomplete task costs respect.
    pub fn delete_task(&mut self, task_id: TaskId, today: NaiveDate) -> Result<TaskOutcome> {
        let task = self.task(task_id)?;
        let mut user = self.user(task.user_id)?;

        let effect = TaskEvent::from_deletion(&task).map(|event| self.apply(&mut user, event, today));
        if effect.is_some() {
            self.store.commit_event(TaskWrite::Delete(task_id), &user)?;
        } else if !self.store.delete_task(task_id)? {
            return Err(CoreError::task_not_found(task_id));
        }

        Ok(self.outcome(task, user, effect))
    }

    /// Delete all completed tasks of a user. Respect-neutral.
    pub fn clear_completed(&mut self, user_id: UserId) -> Result<usize> {
        let completed = self.tasks(user_id, TaskFilter::Completed, TaskSort::DueDate)?;
        let mut removed = 0;
        for task in completed {
            if self.store.delete_task(task.id)? {
                removed += 1;
            }
        }
        debug!(user_id, removed, "cleared completed tasks");
        Ok(removed)
    }

    /// Change the AI personality. No scoring happens.
    pub fn set_personality(&mut self, user_id: UserId, personality: Personality) -> Result<User> {
        let mut user = self.user(user_id)?;
        user.ai_personality = personality;
        self.store.update_user(&user)?;
        Ok(user)
    }

    /// Reset respect to the configured baseline, clear the streak and delete
    /// every task the user owns. Personality is kept.
    pub fn reset_progress(&mut self, user_id: UserId) -> Result<ResetSummary> {
        let mut user = self.user(user_id)?;
        user.reset(self.reset_baseline);
        let deleted_tasks = self.store.reset_user(&user)?;

        info!(
            user_id,
            baseline = %self.reset_baseline,
            deleted_tasks,
            "reset progress"
        );
        Ok(ResetSummary {
            user,
            deleted_tasks,
        })
    }

    /// Pick a message for the user's current respect level and personality.
    pub fn message_for(&mut self, user_id: UserId) -> Result<String> {
        let user = self.user(user_id)?;
        Ok(self
            .selector
            .select(user.respect_level, user.ai_personality)
            .to_string())
    }

    fn apply(&self, user: &mut User, event: TaskEvent, today: NaiveDate) -> EventEffect {
        if event.advances_streak() && user.streak.is_future_dated(today) {
            warn!(
                user_id = user.id,
                last_completed_date = ?user.streak.last_completed_date,
                %today,
                "last completion is dated after today; resetting streak"
            );
        }
        let effect = user.apply_event(event, today);
        debug!(
            user_id = user.id,
            ?event,
            respect_before = %effect.respect_before,
            respect_after = %effect.respect_after,
            streak_change = ?effect.streak_change,
            "applied task event"
        );
        effect
    }

    fn outcome(&mut self, task: Task, user: User, effect: Option<EventEffect>) -> TaskOutcome {
        let message = self
            .selector
            .select(user.respect_level, user.ai_personality)
            .to_string();
        TaskOutcome {
            tier: user.tier(),
            task,
            user,
            effect,
            message,
        }
    }
}
