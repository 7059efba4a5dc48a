use serde::{Deserialize, Serialize};

use crate::model::Task;
use crate::respect::{
    apply_completion, apply_incomplete_deletion, apply_uncompletion, RespectLevel,
    COMPLETION_REWARD, INCOMPLETE_DELETION_PENALTY, UNCOMPLETION_PENALTY,
};

/// A task state change that moves the respect level.
///
/// Derived by the orchestrator from each toggle or deletion; changes that map
/// to `None` (re-completing a completed task, deleting a completed task,
/// personality edits) never reach the scoring rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskEvent {
    /// Incomplete -> complete. Also the only event that advances the streak.
    Completed,
    /// Complete -> incomplete.
    Uncompleted,
    /// An incomplete task was deleted.
    DeletedIncomplete,
}

impl TaskEvent {
    pub fn from_toggle(was_completed: bool, now_completed: bool) -> Option<TaskEvent> {
        match (was_completed, now_completed) {
            (false, true) => Some(TaskEvent::Completed),
            (true, false) => Some(TaskEvent::Uncompleted),
            _ => None,
        }
    }

    /// Deleting a completed task is respect-neutral.
    pub fn from_deletion(task: &Task) -> Option<TaskEvent> {
        (!task.completed).then_some(TaskEvent::DeletedIncomplete)
    }

    pub fn apply(self, level: RespectLevel) -> RespectLevel {
        match self {
            TaskEvent::Completed => apply_completion(level),
            TaskEvent::Uncompleted => apply_uncompletion(level),
            TaskEvent::DeletedIncomplete => apply_incomplete_deletion(level),
        }
    }

    /// Nominal change before clamping.
    pub fn respect_delta(self) -> i8 {
        match self {
            TaskEvent::Completed => COMPLETION_REWARD as i8,
            TaskEvent::Uncompleted => -(UNCOMPLETION_PENALTY as i8),
            TaskEvent::DeletedIncomplete => -(INCOMPLETE_DELETION_PENALTY as i8),
        }
    }

    pub fn advances_streak(self) -> bool {
        matches!(self, TaskEvent::Completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Priority, Task};
    use chrono::Utc;

    fn task(completed: bool) -> Task {
        Task {
            id: 1,
            user_id: 1,
            title: "Write report".into(),
            completed,
            due_date: None,
            priority: Priority::Medium,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_toggle_derivation() {
        assert_eq!(TaskEvent::from_toggle(false, true), Some(TaskEvent::Completed));
        assert_eq!(TaskEvent::from_toggle(true, false), Some(TaskEvent::Uncompleted));
        assert_eq!(TaskEvent::from_toggle(true, true), None);
        assert_eq!(TaskEvent::from_toggle(false, false), None);
    }

    #[test]
    fn test_only_incomplete_deletion_scores() {
        assert_eq!(TaskEvent::from_deletion(&task(false)), Some(TaskEvent::DeletedIncomplete));
        assert_eq!(TaskEvent::from_deletion(&task(true)), None);
    }

    #[test]
    fn test_apply_matches_deltas_away_from_bounds() {
        let mid = RespectLevel::new(50).unwrap();
        for event in [TaskEvent::Completed, TaskEvent::Uncompleted, TaskEvent::DeletedIncomplete] {
            let expected = 50 + event.respect_delta() as i64;
            assert_eq!(event.apply(mid).value() as i64, expected);
        }
    }

    #[test]
    fn test_only_completion_advances_streak() {
        assert!(TaskEvent::Completed.advances_streak());
        assert!(!TaskEvent::Uncompleted.advances_streak());
        assert!(!TaskEvent::DeletedIncomplete.advances_streak());
    }
}
