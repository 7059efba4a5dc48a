//! SQLite-backed user and task storage.
//!
//! Dates are stored as `YYYY-MM-DD` text and timestamps as RFC 3339 so the
//! file stays readable with the sqlite3 shell.

use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{data_dir, migrations, Store, TaskWrite};
use crate::error::{CoreError, DatabaseError, Result};
use crate::messages::Personality;
use crate::model::{NewTask, NewUser, Priority, Task, TaskId, User, UserId};
use crate::respect::{RespectLevel, StreakState};

const DATE_FORMAT: &str = "%Y-%m-%d";

const USER_COLUMNS: &str =
    "id, username, respect_level, streak, best_streak, last_completed_date, ai_personality";
const TASK_COLUMNS: &str = "id, user_id, title, completed, due_date, priority, created_at";

/// SQLite store for users and tasks.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `~/.config/taskmaster/taskmaster.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("taskmaster.db");
        Self::open_path(&path)
    }

    /// Open (or create) a database file at `path`.
    pub fn open_path(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_connection(conn)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        migrations::migrate(&conn)
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(Self { conn })
    }
}

struct UserRow {
    id: i64,
    username: String,
    respect_level: i64,
    streak: i64,
    best_streak: i64,
    last_completed_date: Option<String>,
    ai_personality: String,
}

impl UserRow {
    fn read(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            username: row.get(1)?,
            respect_level: row.get(2)?,
            streak: row.get(3)?,
            best_streak: row.get(4)?,
            last_completed_date: row.get(5)?,
            ai_personality: row.get(6)?,
        })
    }

    fn into_user(self) -> Result<User, DatabaseError> {
        let corrupt = |message: String| DatabaseError::CorruptRow {
            table: "users",
            message,
        };
        let respect_level =
            RespectLevel::new(self.respect_level).map_err(|e| corrupt(e.to_string()))?;
        let streak = u32::try_from(self.streak)
            .map_err(|_| corrupt(format!("streak {} out of range", self.streak)))?;
        let best_streak = u32::try_from(self.best_streak)
            .map_err(|_| corrupt(format!("best_streak {} out of range", self.best_streak)))?;
        let last_completed_date = self
            .last_completed_date
            .as_deref()
            .map(parse_date)
            .transpose()
            .map_err(corrupt)?;
        let ai_personality = self
            .ai_personality
            .parse::<Personality>()
            .map_err(|e| corrupt(e.to_string()))?;

        Ok(User {
            id: self.id,
            username: self.username,
            respect_level,
            streak: StreakState {
                streak,
                best_streak,
                last_completed_date,
            },
            ai_personality,
        })
    }
}

struct TaskRow {
    id: i64,
    user_id: i64,
    title: String,
    completed: bool,
    due_date: Option<String>,
    priority: String,
    created_at: String,
}

impl TaskRow {
    fn read(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            title: row.get(2)?,
            completed: row.get(3)?,
            due_date: row.get(4)?,
            priority: row.get(5)?,
            created_at: row.get(6)?,
        })
    }

    fn into_task(self) -> Result<Task, DatabaseError> {
        let corrupt = |message: String| DatabaseError::CorruptRow {
            table: "tasks",
            message,
        };
        let due_date = self
            .due_date
            .as_deref()
            .map(parse_date)
            .transpose()
            .map_err(corrupt)?;
        let priority = self
            .priority
            .parse::<Priority>()
            .map_err(|e| corrupt(e.to_string()))?;
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map_err(|e| corrupt(format!("created_at '{}': {e}", self.created_at)))?
            .with_timezone(&Utc);

        Ok(Task {
            id: self.id,
            user_id: self.user_id,
            title: self.title,
            completed: self.completed,
            due_date,
            priority,
            created_at,
        })
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|e| format!("date '{s}': {e}"))
}

fn format_date(date: Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.format(DATE_FORMAT).to_string())
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

impl Store for SqliteStore {
    fn get_user(&self, id: UserId) -> Result<Option<User>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![id],
                UserRow::read,
            )
            .optional()?;
        Ok(row.map(UserRow::into_user).transpose()?)
    }

    fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"),
                params![username],
                UserRow::read,
            )
            .optional()?;
        Ok(row.map(UserRow::into_user).transpose()?)
    }

    fn create_user(&mut self, new_user: &NewUser) -> Result<User> {
        let inserted = self.conn.execute(
            "INSERT INTO users (username, respect_level, ai_personality) VALUES (?1, ?2, ?3)",
            params![
                new_user.username,
                RespectLevel::DEFAULT.value(),
                new_user.ai_personality.as_str(),
            ],
        );
        match inserted {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                return Err(CoreError::Conflict(format!(
                    "Username already exists: {}",
                    new_user.username
                )))
            }
            Err(e) => return Err(e.into()),
        }

        let id = self.conn.last_insert_rowid();
        self.get_user(id)?.ok_or_else(|| CoreError::user_not_found(id))
    }

    fn update_user(&mut self, user: &User) -> Result<bool> {
        Ok(update_user_row(&self.conn, user)? > 0)
    }

    fn list_tasks(&self, user_id: UserId) -> Result<Vec<Task>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE user_id = ?1 ORDER BY id"
        ))?;
        let rows = stmt.query_map(params![user_id], TaskRow::read)?;

        let mut tasks = Vec::new();
        for row in rows {
            tasks.push(row?.into_task()?);
        }
        Ok(tasks)
    }

    fn get_task(&self, id: TaskId) -> Result<Option<Task>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"),
                params![id],
                TaskRow::read,
            )
            .optional()?;
        Ok(row.map(TaskRow::into_task).transpose()?)
    }

    fn create_task(
        &mut self,
        user_id: UserId,
        new_task: &NewTask,
        created_at: DateTime<Utc>,
    ) -> Result<Task> {
        self.conn.execute(
            "INSERT INTO tasks (user_id, title, completed, due_date, priority, created_at)
             VALUES (?1, ?2, 0, ?3, ?4, ?5)",
            params![
                user_id,
                new_task.title,
                format_date(new_task.due_date),
                new_task.priority.as_str(),
                created_at.to_rfc3339(),
            ],
        )?;
        Ok(Task {
            id: self.conn.last_insert_rowid(),
            user_id,
            title: new_task.title.clone(),
            completed: false,
            due_date: new_task.due_date,
            priority: new_task.priority,
            created_at,
        })
    }

    fn update_task(&mut self, task: &Task) -> Result<bool> {
        Ok(update_task_row(&self.conn, task)? > 0)
    }

    fn delete_task(&mut self, id: TaskId) -> Result<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    fn commit_event(&mut self, write: TaskWrite<'_>, user: &User) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;

        let task_changed = match write {
            TaskWrite::Update(task) => update_task_row(&tx, task)?,
            TaskWrite::Delete(id) => tx.execute("DELETE FROM tasks WHERE id = ?1", params![id])?,
        };
        if task_changed == 0 {
            return Err(CoreError::task_not_found(write.task_id()));
        }
        if update_user_row(&tx, user)? == 0 {
            return Err(CoreError::user_not_found(user.id));
        }

        tx.commit()?;
        Ok(())
    }

    fn reset_user(&mut self, user: &User) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;

        if update_user_row(&tx, user)? == 0 {
            return Err(CoreError::user_not_found(user.id));
        }
        let deleted = tx.execute("DELETE FROM tasks WHERE user_id = ?1", params![user.id])?;

        tx.commit()?;
        Ok(deleted)
    }
}

fn update_user_row(conn: &Connection, user: &User) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE users
         SET respect_level = ?2, streak = ?3, best_streak = ?4,
             last_completed_date = ?5, ai_personality = ?6
         WHERE id = ?1",
        params![
            user.id,
            user.respect_level.value(),
            user.streak.streak,
            user.streak.best_streak,
            format_date(user.streak.last_completed_date),
            user.ai_personality.as_str(),
        ],
    )
}

fn update_task_row(conn: &Connection, task: &Task) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE tasks SET title = ?2, completed = ?3, due_date = ?4, priority = ?5
         WHERE id = ?1",
        params![
            task.id,
            task.title,
            task.completed,
            format_date(task.due_date),
            task.priority.as_str(),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn store() -> SqliteStore {
        SqliteStore::open_memory().unwrap()
    }

    #[test]
    fn test_user_roundtrip_with_streak() {
        let mut db = store();
        let mut user = db
            .create_user(&NewUser::new("ada", Personality::Savage))
            .unwrap();
        assert_eq!(user.respect_level, RespectLevel::DEFAULT);

        user.respect_level = RespectLevel::new(83).unwrap();
        user.streak = StreakState {
            streak: 3,
            best_streak: 8,
            last_completed_date: NaiveDate::from_ymd_opt(2024, 2, 29),
        };
        assert!(db.update_user(&user).unwrap());

        assert_eq!(db.get_user(user.id).unwrap(), Some(user.clone()));
        assert_eq!(db.get_user_by_username("ada").unwrap(), Some(user));
        assert_eq!(db.get_user(999).unwrap(), None);
    }

    #[test]
    fn test_duplicate_username_is_a_conflict() {
        let mut db = store();
        db.create_user(&NewUser::new("ada", Personality::Balanced))
            .unwrap();
        let err = db
            .create_user(&NewUser::new("ada", Personality::Balanced))
            .unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
    }

    #[test]
    fn test_task_roundtrip() {
        let mut db = store();
        let created_at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
        let new_task = NewTask::new("File taxes")
            .with_priority(Priority::High)
            .with_due_date(NaiveDate::from_ymd_opt(2024, 4, 15).unwrap());
        let mut task = db.create_task(1, &new_task, created_at).unwrap();

        let loaded = db.get_task(task.id).unwrap().unwrap();
        assert_eq!(loaded, task);

        task.completed = true;
        assert!(db.update_task(&task).unwrap());
        assert!(db.get_task(task.id).unwrap().unwrap().completed);

        assert_eq!(db.list_tasks(1).unwrap().len(), 1);
        assert!(db.list_tasks(2).unwrap().is_empty());

        assert!(db.delete_task(task.id).unwrap());
        assert!(!db.delete_task(task.id).unwrap());
    }

    #[test]
    fn test_corrupt_personality_is_reported() {
        let mut db = store();
        let user = db
            .create_user(&NewUser::new("ada", Personality::Balanced))
            .unwrap();
        db.conn()
            .execute(
                "UPDATE users SET ai_personality = 'grumpy' WHERE id = ?1",
                params![user.id],
            )
            .unwrap();
        let err = db.get_user(user.id).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Database(DatabaseError::CorruptRow { table: "users", .. })
        ));
    }

    #[test]
    fn test_file_database_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("taskmaster.db");
        {
            let mut db = SqliteStore::open_path(&path).unwrap();
            db.create_user(&NewUser::new("ada", Personality::Balanced))
                .unwrap();
        }
        let db = SqliteStore::open_path(&path).unwrap();
        assert!(db.get_user_by_username("ada").unwrap().is_some());
    }

    #[test]
    fn test_commit_event_rolls_back_when_user_write_fails() {
        let mut db = store();
        let user = db
            .create_user(&NewUser::new("ada", Personality::Balanced))
            .unwrap();
        let mut task = db
            .create_task(user.id, &NewTask::new("x"), Utc::now())
            .unwrap();
        db.conn()
            .execute("DELETE FROM users WHERE id = ?1", params![user.id])
            .unwrap();

        task.completed = true;
        let err = db.commit_event(TaskWrite::Update(&task), &user).unwrap_err();
        assert!(matches!(err, CoreError::NotFound { entity: "User", .. }));
        assert!(!db.get_task(task.id).unwrap().unwrap().completed);

        let err = db.commit_event(TaskWrite::Delete(task.id), &user).unwrap_err();
        assert!(matches!(err, CoreError::NotFound { entity: "User", .. }));
        assert!(db.get_task(task.id).unwrap().is_some());
    }

    #[test]
    fn test_commit_event_writes_task_and_user_together() {
        let mut db = store();
        let mut user = db
            .create_user(&NewUser::new("ada", Personality::Balanced))
            .unwrap();
        let mut task = db
            .create_task(user.id, &NewTask::new("x"), Utc::now())
            .unwrap();

        task.completed = true;
        user.respect_level = RespectLevel::new(55).unwrap();
        db.commit_event(TaskWrite::Update(&task), &user).unwrap();
        assert!(db.get_task(task.id).unwrap().unwrap().completed);
        assert_eq!(db.get_user(user.id).unwrap(), Some(user));
    }

    #[test]
    fn test_reset_user_deletes_only_own_tasks() {
        let mut db = store();
        let mut a = db
            .create_user(&NewUser::new("a", Personality::Balanced))
            .unwrap();
        let b = db
            .create_user(&NewUser::new("b", Personality::Balanced))
            .unwrap();
        db.create_task(a.id, &NewTask::new("a1"), Utc::now()).unwrap();
        db.create_task(a.id, &NewTask::new("a2"), Utc::now()).unwrap();
        db.create_task(b.id, &NewTask::new("b1"), Utc::now()).unwrap();

        a.respect_level = RespectLevel::MAX;
        assert_eq!(db.reset_user(&a).unwrap(), 2);
        assert_eq!(db.get_user(a.id).unwrap().unwrap().respect_level, RespectLevel::MAX);
        assert!(db.list_tasks(a.id).unwrap().is_empty());
        assert_eq!(db.list_tasks(b.id).unwrap().len(), 1);

        let mut ghost = a.clone();
        ghost.id = 99;
        assert!(db.reset_user(&ghost).is_err());
        assert_eq!(db.list_tasks(b.id).unwrap().len(), 1);
    }
}
