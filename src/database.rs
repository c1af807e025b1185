use rusqlite::Connection;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

use crate::models::{Habit, HabitLog, Subtask, Task};

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    SqliteError(#[from] rusqlite::Error),
    #[error("Failed to create database directory: {0}")]
    DirectoryError(String),
}

pub struct Database {
    conn: Connection,
}

impl Database {
    /// Create a new database connection and initialize the schema
    pub fn new(path: &str) -> Result<Self, DatabaseError> {
        let db_path = PathBuf::from(path);

        // Create parent directory if it doesn't exist (":memory:" has none)
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| DatabaseError::DirectoryError(e.to_string()))?;
            }
        }

        // Open or create the database
        let conn = Connection::open(&db_path)?;
        conn.pragma_update(None, "foreign_keys", true)?;

        let db = Database { conn };
        db.initialize_schema()?;
        debug!(path, "database opened");

        Ok(db)
    }

    /// Initialize the database schema (tables and indexes)
    fn initialize_schema(&self) -> Result<(), DatabaseError> {
        // Create tasks table
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS tasks (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                name            TEXT NOT NULL,
                deadline        INTEGER,
                difficulty      TEXT NOT NULL DEFAULT 'easy',
                priority        TEXT NOT NULL DEFAULT 'normal',
                completed       INTEGER NOT NULL DEFAULT 0,
                completed_at    INTEGER,
                started         INTEGER NOT NULL DEFAULT 0,
                quick           INTEGER NOT NULL DEFAULT 0,
                time_worked_ms  INTEGER NOT NULL DEFAULT 0,
                created_at      INTEGER NOT NULL,
                last_modified   INTEGER NOT NULL,
                remote_id       TEXT
            )",
            [],
        )?;

        // Create subtasks table
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS subtasks (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                task_id         INTEGER NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
                name            TEXT NOT NULL,
                completed       INTEGER NOT NULL DEFAULT 0,
                sort_order      INTEGER NOT NULL DEFAULT 0
            )",
            [],
        )?;

        // Create habits table
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS habits (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                name            TEXT NOT NULL,
                emoji           TEXT NOT NULL DEFAULT '✅',
                created_at      INTEGER NOT NULL,
                archived        INTEGER NOT NULL DEFAULT 0,
                last_modified   INTEGER NOT NULL
            )",
            [],
        )?;

        // Create habit_logs table; at most one log per (habit, day)
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS habit_logs (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                habit_id        INTEGER NOT NULL REFERENCES habits(id) ON DELETE CASCADE,
                day             INTEGER NOT NULL,
                completed_at    INTEGER NOT NULL
            )",
            [],
        )?;

        // Create indexes
        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_tasks_completed ON tasks(completed)",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_tasks_deadline ON tasks(deadline)",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_tasks_remote_id ON tasks(remote_id)",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_subtasks_task_id ON subtasks(task_id)",
            [],
        )?;

        self.conn.execute(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_habit_logs_habit_day ON habit_logs(habit_id, day)",
            [],
        )?;

        Ok(())
    }

    /// Insert a task into the database and return its ID
    pub fn insert_task(&self, task: &Task) -> Result<i64, DatabaseError> {
        self.conn.execute(
            "INSERT INTO tasks (name, deadline, difficulty, priority, completed, completed_at,
                                started, quick, time_worked_ms, created_at, last_modified, remote_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            rusqlite::params![
                task.name,
                task.deadline,
                task.difficulty.as_str(),
                task.priority.as_str(),
                if task.completed { 1 } else { 0 },
                task.completed_at,
                if task.started { 1 } else { 0 },
                if task.quick { 1 } else { 0 },
                task.time_worked_ms,
                task.created_at,
                task.last_modified,
                task.remote_id
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Insert a task together with its subtasks in one transaction,
    /// preserving the given name order as the sort order
    pub fn create_task_with_subtasks(
        &self,
        task: &Task,
        subtasks: &[String],
    ) -> Result<i64, DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO tasks (name, deadline, difficulty, priority, completed, completed_at,
                                started, quick, time_worked_ms, created_at, last_modified, remote_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            rusqlite::params![
                task.name,
                task.deadline,
                task.difficulty.as_str(),
                task.priority.as_str(),
                if task.completed { 1 } else { 0 },
                task.completed_at,
                if task.started { 1 } else { 0 },
                if task.quick { 1 } else { 0 },
                task.time_worked_ms,
                task.created_at,
                task.last_modified,
                task.remote_id
            ],
        )?;
        let task_id = tx.last_insert_rowid();
        for (index, name) in subtasks.iter().enumerate() {
            tx.execute(
                "INSERT INTO subtasks (task_id, name, completed, sort_order)
                 VALUES (?1, ?2, 0, ?3)",
                rusqlite::params![task_id, name, index as i64],
            )?;
        }
        tx.commit()?;
        Ok(task_id)
    }

    /// Helper function to map a row to a Task
    fn row_to_task(row: &rusqlite::Row) -> Result<Task, rusqlite::Error> {
        let difficulty: String = row.get(3)?;
        let priority: String = row.get(4)?;
        Ok(Task {
            id: Some(row.get(0)?),
            name: row.get(1)?,
            deadline: row.get(2)?,
            difficulty: difficulty.parse().map_err(|_| bad_column(3, "difficulty"))?,
            priority: priority.parse().map_err(|_| bad_column(4, "priority"))?,
            completed: row.get::<_, i64>(5)? != 0,
            completed_at: row.get(6)?,
            started: row.get::<_, i64>(7)? != 0,
            quick: row.get::<_, i64>(8)? != 0,
            time_worked_ms: row.get(9)?,
            created_at: row.get(10)?,
            last_modified: row.get(11)?,
            remote_id: row.get(12)?,
        })
    }

    /// Get all tasks ordered by creation time, newest first
    pub fn get_all_tasks(&self) -> Result<Vec<Task>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, deadline, difficulty, priority, completed, completed_at,
                    started, quick, time_worked_ms, created_at, last_modified, remote_id
             FROM tasks ORDER BY created_at DESC",
        )?;
        let tasks = stmt
            .query_map([], Self::row_to_task)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(tasks)
    }

    /// Get all incomplete tasks ordered by creation time, newest first
    pub fn get_pending_tasks(&self) -> Result<Vec<Task>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, deadline, difficulty, priority, completed, completed_at,
                    started, quick, time_worked_ms, created_at, last_modified, remote_id
             FROM tasks WHERE completed = 0 ORDER BY created_at DESC",
        )?;
        let tasks = stmt
            .query_map([], Self::row_to_task)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(tasks)
    }

    /// Get all completed tasks, most recently completed first
    pub fn get_completed_tasks(&self) -> Result<Vec<Task>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, deadline, difficulty, priority, completed, completed_at,
                    started, quick, time_worked_ms, created_at, last_modified, remote_id
             FROM tasks WHERE completed = 1 ORDER BY completed_at DESC",
        )?;
        let tasks = stmt
            .query_map([], Self::row_to_task)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(tasks)
    }

    /// Count incomplete tasks
    pub fn pending_count(&self) -> Result<i64, DatabaseError> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM tasks WHERE completed = 0", [], |row| {
                row.get(0)
            })?;
        Ok(count)
    }

    /// Incomplete tasks whose deadline falls inside [start, end]
    pub fn tasks_due_between(&self, start: i64, end: i64) -> Result<Vec<Task>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, deadline, difficulty, priority, completed, completed_at,
                    started, quick, time_worked_ms, created_at, last_modified, remote_id
             FROM tasks
             WHERE completed = 0 AND deadline IS NOT NULL AND deadline >= ?1 AND deadline <= ?2
             ORDER BY deadline ASC",
        )?;
        let tasks = stmt
            .query_map(rusqlite::params![start, end], Self::row_to_task)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(tasks)
    }

    /// Get a single task by ID
    pub fn get_task(&self, id: i64) -> Result<Option<Task>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, deadline, difficulty, priority, completed, completed_at,
                    started, quick, time_worked_ms, created_at, last_modified, remote_id
             FROM tasks WHERE id = ?1",
        )?;

        let result = stmt.query_row(rusqlite::params![id], Self::row_to_task);

        match result {
            Ok(task) => Ok(Some(task)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(DatabaseError::from(e)),
        }
    }

    /// Get a single task by its mirror identifier
    pub fn task_by_remote_id(&self, remote_id: &str) -> Result<Option<Task>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, deadline, difficulty, priority, completed, completed_at,
                    started, quick, time_worked_ms, created_at, last_modified, remote_id
             FROM tasks WHERE remote_id = ?1",
        )?;

        let result = stmt.query_row(rusqlite::params![remote_id], Self::row_to_task);

        match result {
            Ok(task) => Ok(Some(task)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(DatabaseError::from(e)),
        }
    }

    /// Update an existing task, every column included
    pub fn update_task(&self, task: &Task) -> Result<(), DatabaseError> {
        let id = task.id.ok_or_else(|| {
            DatabaseError::SqliteError(rusqlite::Error::InvalidColumnType(
                0,
                "id".to_string(),
                rusqlite::types::Type::Null,
            ))
        })?;

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "UPDATE tasks SET name = ?1, deadline = ?2, difficulty = ?3, priority = ?4,
             completed = ?5, completed_at = ?6, started = ?7, quick = ?8,
             time_worked_ms = ?9, created_at = ?10, last_modified = ?11, remote_id = ?12
             WHERE id = ?13",
            rusqlite::params![
                task.name,
                task.deadline,
                task.difficulty.as_str(),
                task.priority.as_str(),
                if task.completed { 1 } else { 0 },
                task.completed_at,
                if task.started { 1 } else { 0 },
                if task.quick { 1 } else { 0 },
                task.time_worked_ms,
                task.created_at,
                task.last_modified,
                task.remote_id,
                id
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Flag a task as started. Returns false when no incomplete task
    /// with this ID exists
    pub fn mark_started(&self, id: i64, now: i64) -> Result<bool, DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        let rows = tx.execute(
            "UPDATE tasks SET started = 1, last_modified = ?1 WHERE id = ?2 AND completed = 0",
            rusqlite::params![now, id],
        )?;
        tx.commit()?;
        Ok(rows > 0)
    }

    /// Complete a task, recording the completion instant. Returns false
    /// when no incomplete task with this ID exists
    pub fn mark_completed(&self, id: i64, now: i64) -> Result<bool, DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        let rows = tx.execute(
            "UPDATE tasks SET completed = 1, completed_at = ?1, last_modified = ?1
             WHERE id = ?2 AND completed = 0",
            rusqlite::params![now, id],
        )?;
        tx.commit()?;
        Ok(rows > 0)
    }

    /// Put a completed task back among the pending ones
    pub fn undo_complete(&self, id: i64, now: i64) -> Result<bool, DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        let rows = tx.execute(
            "UPDATE tasks SET completed = 0, completed_at = NULL, last_modified = ?1
             WHERE id = ?2 AND completed = 1",
            rusqlite::params![now, id],
        )?;
        tx.commit()?;
        Ok(rows > 0)
    }

    /// Add focus-session credit to a task's accumulated work time
    pub fn add_time_worked(&self, id: i64, delta_ms: i64, now: i64) -> Result<bool, DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        let rows = tx.execute(
            "UPDATE tasks SET time_worked_ms = time_worked_ms + ?1, last_modified = ?2
             WHERE id = ?3",
            rusqlite::params![delta_ms, now, id],
        )?;
        tx.commit()?;
        Ok(rows > 0)
    }

    /// Record the mirror identifier assigned to a task. Deliberately
    /// leaves last_modified alone so a push does not look like an edit
    pub fn set_remote_id(&self, id: i64, remote_id: &str) -> Result<(), DatabaseError> {
        self.conn.execute(
            "UPDATE tasks SET remote_id = ?1 WHERE id = ?2",
            rusqlite::params![remote_id, id],
        )?;
        Ok(())
    }

    /// Bump a task's last_modified, used when a subtask flips
    pub fn touch_task_last_modified(&self, id: i64, now: i64) -> Result<(), DatabaseError> {
        self.conn.execute(
            "UPDATE tasks SET last_modified = ?1 WHERE id = ?2",
            rusqlite::params![now, id],
        )?;
        Ok(())
    }

    /// Delete a task by ID; subtasks go with it
    pub fn delete_task(&self, id: i64) -> Result<bool, DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        let rows = tx.execute("DELETE FROM tasks WHERE id = ?1", rusqlite::params![id])?;
        tx.commit()?;
        Ok(rows > 0)
    }

    /// Delete every completed task, returning how many were removed
    pub fn delete_completed_tasks(&self) -> Result<usize, DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        let rows = tx.execute("DELETE FROM tasks WHERE completed = 1", [])?;
        tx.commit()?;
        Ok(rows)
    }

    /// Helper function to map a row to a Subtask
    fn row_to_subtask(row: &rusqlite::Row) -> Result<Subtask, rusqlite::Error> {
        Ok(Subtask {
            id: Some(row.get(0)?),
            task_id: row.get(1)?,
            name: row.get(2)?,
            completed: row.get::<_, i64>(3)? != 0,
            sort_order: row.get(4)?,
        })
    }

    /// Insert a subtask and return its ID
    pub fn insert_subtask(&self, subtask: &Subtask) -> Result<i64, DatabaseError> {
        self.conn.execute(
            "INSERT INTO subtasks (task_id, name, completed, sort_order)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![
                subtask.task_id,
                subtask.name,
                if subtask.completed { 1 } else { 0 },
                subtask.sort_order
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Get a single subtask by ID
    pub fn get_subtask(&self, id: i64) -> Result<Option<Subtask>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, task_id, name, completed, sort_order FROM subtasks WHERE id = ?1",
        )?;

        let result = stmt.query_row(rusqlite::params![id], Self::row_to_subtask);

        match result {
            Ok(subtask) => Ok(Some(subtask)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(DatabaseError::from(e)),
        }
    }

    /// Get a task's subtasks in their explicit sort order
    pub fn subtasks_for_task(&self, task_id: i64) -> Result<Vec<Subtask>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, task_id, name, completed, sort_order
             FROM subtasks WHERE task_id = ?1 ORDER BY sort_order ASC, id ASC",
        )?;
        let subtasks = stmt
            .query_map(rusqlite::params![task_id], Self::row_to_subtask)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(subtasks)
    }

    /// Check or uncheck a single subtask
    pub fn set_subtask_completed(&self, id: i64, completed: bool) -> Result<bool, DatabaseError> {
        let rows = self.conn.execute(
            "UPDATE subtasks SET completed = ?1 WHERE id = ?2",
            rusqlite::params![if completed { 1 } else { 0 }, id],
        )?;
        Ok(rows > 0)
    }

    /// Replace a task's subtasks wholesale, keeping the slice order
    pub fn replace_subtasks(&self, task_id: i64, subtasks: &[Subtask]) -> Result<(), DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM subtasks WHERE task_id = ?1",
            rusqlite::params![task_id],
        )?;
        for (index, subtask) in subtasks.iter().enumerate() {
            tx.execute(
                "INSERT INTO subtasks (task_id, name, completed, sort_order)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![
                    task_id,
                    subtask.name,
                    if subtask.completed { 1 } else { 0 },
                    index as i64
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Completed and total subtask counts for a task
    pub fn subtask_progress(&self, task_id: i64) -> Result<(i64, i64), DatabaseError> {
        let (done, total) = self.conn.query_row(
            "SELECT COALESCE(SUM(completed), 0), COUNT(*) FROM subtasks WHERE task_id = ?1",
            rusqlite::params![task_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok((done, total))
    }

    /// Helper function to map a row to a Habit
    fn row_to_habit(row: &rusqlite::Row) -> Result<Habit, rusqlite::Error> {
        Ok(Habit {
            id: Some(row.get(0)?),
            name: row.get(1)?,
            emoji: row.get(2)?,
            created_at: row.get(3)?,
            archived: row.get::<_, i64>(4)? != 0,
            last_modified: row.get(5)?,
        })
    }

    /// Insert a habit and return its ID
    pub fn insert_habit(&self, habit: &Habit) -> Result<i64, DatabaseError> {
        self.conn.execute(
            "INSERT INTO habits (name, emoji, created_at, archived, last_modified)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                habit.name,
                habit.emoji,
                habit.created_at,
                if habit.archived { 1 } else { 0 },
                habit.last_modified
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Get a single habit by ID
    pub fn get_habit(&self, id: i64) -> Result<Option<Habit>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, emoji, created_at, archived, last_modified
             FROM habits WHERE id = ?1",
        )?;

        let result = stmt.query_row(rusqlite::params![id], Self::row_to_habit);

        match result {
            Ok(habit) => Ok(Some(habit)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(DatabaseError::from(e)),
        }
    }

    /// Get all non-archived habits, oldest first
    pub fn get_active_habits(&self) -> Result<Vec<Habit>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, emoji, created_at, archived, last_modified
             FROM habits WHERE archived = 0 ORDER BY created_at ASC",
        )?;
        let habits = stmt
            .query_map([], Self::row_to_habit)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(habits)
    }

    /// Get all habits including archived ones, oldest first
    pub fn get_all_habits(&self) -> Result<Vec<Habit>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, emoji, created_at, archived, last_modified
             FROM habits ORDER BY created_at ASC",
        )?;
        let habits = stmt
            .query_map([], Self::row_to_habit)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(habits)
    }

    /// Soft-delete a habit, keeping its log history
    pub fn archive_habit(&self, id: i64, now: i64) -> Result<bool, DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        let rows = tx.execute(
            "UPDATE habits SET archived = 1, last_modified = ?1 WHERE id = ?2",
            rusqlite::params![now, id],
        )?;
        tx.commit()?;
        Ok(rows > 0)
    }

    /// Hard-delete a habit; its logs go with it
    pub fn delete_habit(&self, id: i64) -> Result<bool, DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        let rows = tx.execute("DELETE FROM habits WHERE id = ?1", rusqlite::params![id])?;
        tx.commit()?;
        Ok(rows > 0)
    }

    /// Helper function to map a row to a HabitLog
    fn row_to_habit_log(row: &rusqlite::Row) -> Result<HabitLog, rusqlite::Error> {
        Ok(HabitLog {
            id: Some(row.get(0)?),
            habit_id: row.get(1)?,
            day: row.get(2)?,
            completed_at: row.get(3)?,
        })
    }

    /// Flip a habit's completion for a day. Returns true when the
    /// toggle created a log, false when it removed one
    pub fn toggle_habit_log(&self, habit_id: i64, day: i64, now: i64) -> Result<bool, DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        let removed = tx.execute(
            "DELETE FROM habit_logs WHERE habit_id = ?1 AND day = ?2",
            rusqlite::params![habit_id, day],
        )?;
        let completed = if removed == 0 {
            tx.execute(
                "INSERT INTO habit_logs (habit_id, day, completed_at) VALUES (?1, ?2, ?3)",
                rusqlite::params![habit_id, day, now],
            )?;
            true
        } else {
            false
        };
        tx.execute(
            "UPDATE habits SET last_modified = ?1 WHERE id = ?2",
            rusqlite::params![now, habit_id],
        )?;
        tx.commit()?;
        Ok(completed)
    }

    /// Get the log for a (habit, day) pair, if any
    pub fn get_log(&self, habit_id: i64, day: i64) -> Result<Option<HabitLog>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, habit_id, day, completed_at
             FROM habit_logs WHERE habit_id = ?1 AND day = ?2",
        )?;

        let result = stmt.query_row(rusqlite::params![habit_id, day], Self::row_to_habit_log);

        match result {
            Ok(log) => Ok(Some(log)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(DatabaseError::from(e)),
        }
    }

    /// All logs of a habit, oldest day first
    pub fn logs_for_habit(&self, habit_id: i64) -> Result<Vec<HabitLog>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, habit_id, day, completed_at
             FROM habit_logs WHERE habit_id = ?1 ORDER BY day ASC",
        )?;
        let logs = stmt
            .query_map(rusqlite::params![habit_id], Self::row_to_habit_log)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(logs)
    }
}

fn bad_column(index: usize, name: &str) -> rusqlite::Error {
    rusqlite::Error::InvalidColumnType(index, name.to_string(), rusqlite::types::Type::Text)
}
