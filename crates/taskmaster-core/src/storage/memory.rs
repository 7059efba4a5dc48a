//! In-process store backed by flat maps.
//!
//! Nothing is persisted; ids come from per-table counters starting at 1.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use super::{Store, TaskWrite};
use crate::error::{CoreError, Result};
use crate::model::{NewTask, NewUser, Task, TaskId, User, UserId};
use crate::respect::{RespectLevel, StreakState};

#[derive(Debug, Clone)]
pub struct MemoryStore {
    users: BTreeMap<UserId, User>,
    tasks: BTreeMap<TaskId, Task>,
    next_user_id: UserId,
    next_task_id: TaskId,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            users: BTreeMap::new(),
            tasks: BTreeMap::new(),
            next_user_id: 1,
            next_task_id: 1,
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Store for MemoryStore {
    fn get_user(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.users.get(&id).cloned())
    }

    fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self.users.values().find(|u| u.username == username).cloned())
    }

    fn create_user(&mut self, new_user: &NewUser) -> Result<User> {
        let id = self.next_user_id;
        self.next_user_id += 1;
        let user = User {
            id,
            username: new_user.username.clone(),
            respect_level: RespectLevel::DEFAULT,
            streak: StreakState::default(),
            ai_personality: new_user.ai_personality,
        };
        self.users.insert(id, user.clone());
        Ok(user)
    }

    fn update_user(&mut self, user: &User) -> Result<bool> {
        match self.users.get_mut(&user.id) {
            Some(existing) => {
                *existing = user.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn list_tasks(&self, user_id: UserId) -> Result<Vec<Task>> {
        Ok(self
            .tasks
            .values()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect())
    }

    fn get_task(&self, id: TaskId) -> Result<Option<Task>> {
        Ok(self.tasks.get(&id).cloned())
    }

    fn create_task(
        &mut self,
        user_id: UserId,
        new_task: &NewTask,
        created_at: DateTime<Utc>,
    ) -> Result<Task> {
        let id = self.next_task_id;
        self.next_task_id += 1;
        let task = Task {
            id,
            user_id,
            title: new_task.title.clone(),
            completed: false,
            due_date: new_task.due_date,
            priority: new_task.priority,
            created_at,
        };
        self.tasks.insert(id, task.clone());
        Ok(task)
    }

    fn update_task(&mut self, task: &Task) -> Result<bool> {
        match self.tasks.get_mut(&task.id) {
            Some(existing) => {
                // Owner and creation time never change.
                existing.title = task.title.clone();
                existing.completed = task.completed;
                existing.due_date = task.due_date;
                existing.priority = task.priority;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn delete_task(&mut self, id: TaskId) -> Result<bool> {
        Ok(self.tasks.remove(&id).is_some())
    }

    fn commit_event(&mut self, write: TaskWrite<'_>, user: &User) -> Result<()> {
        // Check both rows before touching either.
        if !self.tasks.contains_key(&write.task_id()) {
            return Err(CoreError::task_not_found(write.task_id()));
        }
        if !self.users.contains_key(&user.id) {
            return Err(CoreError::user_not_found(user.id));
        }
        match write {
            TaskWrite::Update(task) => {
                self.update_task(task)?;
            }
            TaskWrite::Delete(id) => {
                self.tasks.remove(&id);
            }
        }
        self.users.insert(user.id, user.clone());
        Ok(())
    }

    fn reset_user(&mut self, user: &User) -> Result<usize> {
        if !self.update_user(user)? {
            return Err(CoreError::user_not_found(user.id));
        }
        let before = self.tasks.len();
        self.tasks.retain(|_, t| t.user_id != user.id);
        Ok(before - self.tasks.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::Personality;

    #[test]
    fn test_ids_are_sequential_per_table() {
        let mut store = MemoryStore::new();
        let a = store.create_user(&NewUser::new("a", Personality::Balanced)).unwrap();
        let b = store.create_user(&NewUser::new("b", Personality::Savage)).unwrap();
        assert_eq!((a.id, b.id), (1, 2));
        let t = store.create_task(a.id, &NewTask::new("x"), Utc::now()).unwrap();
        assert_eq!(t.id, 1);
    }

    #[test]
    fn test_new_user_has_defaults() {
        let mut store = MemoryStore::new();
        let user = store.create_user(&NewUser::new("ada", Personality::Supportive)).unwrap();
        assert_eq!(user.respect_level, RespectLevel::DEFAULT);
        assert_eq!(user.streak, StreakState::default());
        assert_eq!(user.ai_personality, Personality::Supportive);
        assert_eq!(store.get_user_by_username("ada").unwrap(), Some(user));
    }

    #[test]
    fn test_tasks_are_scoped_to_owner() {
        let mut store = MemoryStore::new();
        store.create_task(1, &NewTask::new("mine"), Utc::now()).unwrap();
        store.create_task(2, &NewTask::new("theirs"), Utc::now()).unwrap();
        let mine = store.list_tasks(1).unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].title, "mine");
    }

    #[test]
    fn test_update_and_delete_report_missing_rows() {
        let mut store = MemoryStore::new();
        let mut task = store.create_task(1, &NewTask::new("x"), Utc::now()).unwrap();
        task.completed = true;
        assert!(store.update_task(&task).unwrap());
        assert!(store.get_task(task.id).unwrap().unwrap().completed);
        assert!(store.delete_task(task.id).unwrap());
        assert!(!store.delete_task(task.id).unwrap());
        assert!(!store.update_task(&task).unwrap());
    }

    #[test]
    fn test_commit_event_checks_both_rows_first() {
        let mut store = MemoryStore::new();
        let user = store.create_user(&NewUser::new("ada", Personality::Balanced)).unwrap();
        let mut task = store.create_task(user.id, &NewTask::new("x"), Utc::now()).unwrap();
        task.completed = true;

        let mut ghost = user.clone();
        ghost.id = 99;
        ghost.respect_level = RespectLevel::MAX;
        assert!(store.commit_event(TaskWrite::Update(&task), &ghost).is_err());
        assert!(!store.get_task(task.id).unwrap().unwrap().completed);

        let mut scored = user.clone();
        scored.respect_level = RespectLevel::new(55).unwrap();
        store.commit_event(TaskWrite::Update(&task), &scored).unwrap();
        assert!(store.get_task(task.id).unwrap().unwrap().completed);
        assert_eq!(store.get_user(user.id).unwrap(), Some(scored.clone()));

        store.commit_event(TaskWrite::Delete(task.id), &scored).unwrap();
        assert!(store.get_task(task.id).unwrap().is_none());
        assert!(store.commit_event(TaskWrite::Delete(task.id), &scored).is_err());
    }

    #[test]
    fn test_reset_user_only_removes_own_tasks() {
        let mut store = MemoryStore::new();
        let a = store.create_user(&NewUser::new("a", Personality::Balanced)).unwrap();
        let b = store.create_user(&NewUser::new("b", Personality::Balanced)).unwrap();
        store.create_task(a.id, &NewTask::new("a1"), Utc::now()).unwrap();
        store.create_task(a.id, &NewTask::new("a2"), Utc::now()).unwrap();
        store.create_task(b.id, &NewTask::new("b1"), Utc::now()).unwrap();

        assert_eq!(store.reset_user(&a).unwrap(), 2);
        assert!(store.list_tasks(a.id).unwrap().is_empty());
        assert_eq!(store.list_tasks(b.id).unwrap().len(), 1);
    }
}
