//! User and task aggregates.
//!
//! A [`User`] owns zero or more [`Task`]s; tasks point back at their owner by
//! id only. Scoring fields on the user change only through
//! [`User::apply_event`] and [`User::reset`].

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::events::TaskEvent;
use crate::messages::Personality;
use crate::respect::streak::StreakChange;
use crate::respect::{RespectLevel, StreakState, Tier};

pub type UserId = i64;
pub type TaskId = i64;

/// Maximum task title length, in characters.
pub const MAX_TITLE_LEN: usize = 100;
/// Maximum username length, in characters.
pub const MAX_USERNAME_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub respect_level: RespectLevel,
    #[serde(flatten)]
    pub streak: StreakState,
    pub ai_personality: Personality,
}

/// What one event did to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEffect {
    pub event: TaskEvent,
    pub respect_before: RespectLevel,
    pub respect_after: RespectLevel,
    /// Set only for completions.
    pub streak_change: Option<StreakChange>,
}

impl User {
    /// Apply a scoring event. `today` is only consulted for completions.
    pub fn apply_event(&mut self, event: TaskEvent, today: NaiveDate) -> EventEffect {
        let respect_before = self.respect_level;
        self.respect_level = event.apply(respect_before);

        let streak_change = if event.advances_streak() {
            let (next, change) = self.streak.advance(today);
            self.streak = next;
            Some(change)
        } else {
            None
        };

        EventEffect {
            event,
            respect_before,
            respect_after: self.respect_level,
            streak_change,
        }
    }

    /// Restore `baseline` respect and clear streak history. Personality is kept.
    pub fn reset(&mut self, baseline: RespectLevel) {
        self.respect_level = baseline;
        self.streak = StreakState::default();
    }

    pub fn tier(&self) -> Tier {
        self.respect_level.tier()
    }
}

/// Input for registering a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    #[serde(default)]
    pub ai_personality: Personality,
}

impl NewUser {
    pub fn new(username: impl Into<String>, ai_personality: Personality) -> Self {
        Self {
            username: username.into(),
            ai_personality,
        }
    }

    /// Trim and check the username.
    pub fn validate(&self) -> Result<NewUser, ValidationError> {
        let username = self.username.trim();
        if username.is_empty() {
            return Err(ValidationError::invalid("username", "must not be empty"));
        }
        if username.chars().count() > MAX_USERNAME_LEN {
            return Err(ValidationError::invalid(
                "username",
                format!("must be at most {MAX_USERNAME_LEN} characters"),
            ));
        }
        Ok(NewUser {
            username: username.to_string(),
            ai_personality: self.ai_personality,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    /// Sort rank: high first.
    fn rank(self) -> u8 {
        match self {
            Priority::High => 0,
            Priority::Medium => 1,
            Priority::Low => 2,
        }
    }
}

impl FromStr for Priority {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(ValidationError::invalid(
                "priority",
                format!("'{other}' is not one of low, medium, high"),
            )),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub user_id: UserId,
    pub title: String,
    pub completed: bool,
    pub due_date: Option<NaiveDate>,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Due strictly before `today` and still open.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.completed && self.due_date.is_some_and(|due| due < today)
    }
}

/// Input for creating a task.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub priority: Priority,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    /// Trim and check the title.
    pub fn validate(&self) -> Result<NewTask, ValidationError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(ValidationError::invalid("title", "Task title is required"));
        }
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(ValidationError::invalid(
                "title",
                format!("Task title is too long (max {MAX_TITLE_LEN} characters)"),
            ));
        }
        Ok(NewTask {
            title: title.to_string(),
            due_date: self.due_date,
            priority: self.priority,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskFilter {
    #[default]
    All,
    Active,
    Completed,
}

impl TaskFilter {
    pub fn matches(self, task: &Task) -> bool {
        match self {
            TaskFilter::All => true,
            TaskFilter::Active => !task.completed,
            TaskFilter::Completed => task.completed,
        }
    }
}

impl FromStr for TaskFilter {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(TaskFilter::All),
            "active" => Ok(TaskFilter::Active),
            "completed" => Ok(TaskFilter::Completed),
            other => Err(ValidationError::invalid(
                "filter",
                format!("'{other}' is not one of all, active, completed"),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskSort {
    /// Earliest due date first; undated tasks last
    #[default]
    DueDate,
    /// High, then medium, then low
    Priority,
}

impl FromStr for TaskSort {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "due-date" | "due_date" => Ok(TaskSort::DueDate),
            "priority" => Ok(TaskSort::Priority),
            other => Err(ValidationError::invalid(
                "sort",
                format!("'{other}' is not one of due-date, priority"),
            )),
        }
    }
}

/// Stable sort in place.
pub fn sort_tasks(tasks: &mut [Task], sort: TaskSort) {
    match sort {
        TaskSort::DueDate => tasks.sort_by(|a, b| match (a.due_date, b.due_date) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }),
        TaskSort::Priority => tasks.sort_by_key(|t| t.priority.rank()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn user() -> User {
        User {
            id: 1,
            username: "ada".into(),
            respect_level: RespectLevel::DEFAULT,
            streak: StreakState::default(),
            ai_personality: Personality::Savage,
        }
    }

    fn task(id: TaskId, due: Option<NaiveDate>, priority: Priority) -> Task {
        Task {
            id,
            user_id: 1,
            title: format!("task {id}"),
            completed: false,
            due_date: due,
            priority,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_completion_moves_respect_and_streak() {
        let mut u = user();
        let today = date(2024, 5, 2);
        let effect = u.apply_event(TaskEvent::Completed, today);
        assert_eq!(effect.respect_after.value(), 55);
        assert_eq!(effect.streak_change, Some(StreakChange::Started));
        assert_eq!(u.streak.streak, 1);
        assert_eq!(u.streak.last_completed_date, Some(today));
    }

    #[test]
    fn test_uncompletion_leaves_streak_alone() {
        let mut u = user();
        let today = date(2024, 5, 2);
        u.apply_event(TaskEvent::Completed, today);
        let before = u.streak;
        let effect = u.apply_event(TaskEvent::Uncompleted, today);
        assert_eq!(effect.streak_change, None);
        assert_eq!(u.streak, before);
        assert_eq!(u.respect_level.value(), 52);
    }

    #[test]
    fn test_reset_keeps_personality() {
        let mut u = user();
        u.apply_event(TaskEvent::Completed, date(2024, 5, 2));
        u.reset(RespectLevel::MAX);
        assert_eq!(u.respect_level, RespectLevel::MAX);
        assert_eq!(u.streak, StreakState::default());
        assert_eq!(u.ai_personality, Personality::Savage);
    }

    #[test]
    fn test_user_json_flattens_streak() {
        let json = serde_json::to_value(user()).unwrap();
        assert_eq!(json["respect_level"], 50);
        assert_eq!(json["streak"], 0);
        assert_eq!(json["best_streak"], 0);
        assert!(json["last_completed_date"].is_null());
        assert_eq!(json["ai_personality"], "savage");
    }

    #[test]
    fn test_title_validation() {
        assert!(NewTask::new("   ").validate().is_err());
        assert!(NewTask::new("x".repeat(MAX_TITLE_LEN + 1)).validate().is_err());
        let ok = NewTask::new("  Buy milk ").validate().unwrap();
        assert_eq!(ok.title, "Buy milk");
        assert_eq!(ok.priority, Priority::Medium);
    }

    #[test]
    fn test_username_validation() {
        assert!(NewUser::new("", Personality::Balanced).validate().is_err());
        assert_eq!(
            NewUser::new(" ada ", Personality::Balanced).validate().unwrap().username,
            "ada"
        );
    }

    #[test]
    fn test_overdue_excludes_today_and_completed() {
        let today = date(2024, 5, 2);
        assert!(task(1, Some(date(2024, 5, 1)), Priority::Low).is_overdue(today));
        assert!(!task(2, Some(today), Priority::Low).is_overdue(today));
        assert!(!task(3, None, Priority::Low).is_overdue(today));
        let mut done = task(4, Some(date(2024, 4, 1)), Priority::Low);
        done.completed = true;
        assert!(!done.is_overdue(today));
    }

    #[test]
    fn test_sort_by_due_date_puts_undated_last() {
        let mut tasks = vec![
            task(1, None, Priority::High),
            task(2, Some(date(2024, 5, 9)), Priority::Low),
            task(3, Some(date(2024, 5, 3)), Priority::Medium),
        ];
        sort_tasks(&mut tasks, TaskSort::DueDate);
        let ids: Vec<_> = tasks.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[test]
    fn test_sort_by_priority_is_stable() {
        let mut tasks = vec![
            task(1, None, Priority::Low),
            task(2, None, Priority::High),
            task(3, None, Priority::Medium),
            task(4, None, Priority::High),
        ];
        sort_tasks(&mut tasks, TaskSort::Priority);
        let ids: Vec<_> = tasks.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![2, 4, 3, 1]);
    }

    #[test]
    fn test_filters() {
        let mut done = task(1, None, Priority::Low);
        done.completed = true;
        let open = task(2, None, Priority::Low);
        assert!(TaskFilter::Completed.matches(&done));
        assert!(!TaskFilter::Completed.matches(&open));
        assert!(TaskFilter::Active.matches(&open));
        assert!(TaskFilter::All.matches(&done));
    }
}
