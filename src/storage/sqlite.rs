//! SQLite task and dependency store
//!
//! Lives in `.taskchain/tasks.db`. Tasks carry their owner; dependency rows
//! reference tasks by ID and are unique per
//! `(task_id, depends_on_task_id, dependency_type)`, so a racing duplicate
//! insert is refused by the database itself.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use super::adapter::{DependencyStore, EdgeSource, StoreError};
use crate::domain::{
    DependencyEdge, DependencyType, EdgeId, NewDependency, TaskId, TaskPriority, TaskStatus,
    TaskSummary,
};

const TASK_COLUMNS: &str = "id, title, status, priority, due_date";
const EDGE_COLUMNS: &str = "id, task_id, depends_on_task_id, dependency_type, created_at";

/// Raw task columns, converted after the row is read
type TaskRow = (i64, String, String, String, Option<String>);

/// Raw dependency columns
type EdgeRow = (i64, i64, i64, String, String);

/// SQLite-backed store
pub struct SqliteStore {
    /// Path to the database, `None` for in-memory databases
    db_path: Option<PathBuf>,

    conn: Connection,
}

impl SqliteStore {
    /// Schema version - bump when schema changes
    const SCHEMA_VERSION: i32 = 1;

    /// Opens or creates the database at `path`
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open task database: {}", path.display()))?;

        // WAL for concurrent readers
        conn.execute_batch(
            "PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL; PRAGMA foreign_keys=ON;",
        )?;

        let store = Self {
            db_path: Some(path.to_path_buf()),
            conn,
        };
        store.ensure_schema()?;
        Ok(store)
    }

    /// Opens a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;

        let store = Self {
            db_path: None,
            conn,
        };
        store.ensure_schema()?;
        Ok(store)
    }

    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    fn ensure_schema(&self) -> Result<()> {
        let version: i32 = self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .optional()?
            .unwrap_or(0);

        match version {
            0 => self.create_schema(),
            Self::SCHEMA_VERSION => Ok(()),
            other => anyhow::bail!(
                "Task database schema version {} is newer than supported version {}",
                other,
                Self::SCHEMA_VERSION
            ),
        }
    }

    fn create_schema(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "
            CREATE TABLE IF NOT EXISTS tasks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                owner TEXT NOT NULL,
                title TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'todo',
                priority TEXT NOT NULL DEFAULT 'medium',
                due_date TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS task_dependencies (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                task_id INTEGER NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
                depends_on_task_id INTEGER NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
                dependency_type TEXT NOT NULL
                    CHECK (dependency_type IN ('blocks', 'blocked_by', 'relates_to')),
                created_at TEXT NOT NULL,
                UNIQUE (task_id, depends_on_task_id, dependency_type)
            );

            CREATE INDEX IF NOT EXISTS idx_tasks_owner ON tasks(owner);
            CREATE INDEX IF NOT EXISTS idx_deps_task ON task_dependencies(task_id);
            CREATE INDEX IF NOT EXISTS idx_deps_depends_on ON task_dependencies(depends_on_task_id);
            ",
            )
            .context("Failed to create task database schema")?;

        self.conn.execute(
            &format!("PRAGMA user_version = {}", Self::SCHEMA_VERSION),
            [],
        )?;

        Ok(())
    }

    /// Creates a task for `owner`
    pub fn create_task(
        &self,
        owner: &str,
        title: &str,
        priority: TaskPriority,
        due_date: Option<NaiveDate>,
    ) -> Result<TaskSummary, StoreError> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO tasks (owner, title, status, priority, due_date, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            params![
                owner,
                title,
                TaskStatus::Todo.as_str(),
                priority.as_str(),
                due_date.map(|d| d.to_string()),
                now,
            ],
        )?;

        let raw = self.conn.last_insert_rowid();
        Ok(TaskSummary {
            id: task_id(raw, "tasks", raw)?,
            title: title.to_string(),
            status: TaskStatus::Todo,
            priority,
            due_date,
        })
    }

    /// Returns one of the owner's tasks
    pub fn get_task(&self, owner: &str, id: TaskId) -> Result<Option<TaskSummary>, StoreError> {
        let row: Option<TaskRow> = self
            .conn
            .query_row(
                &format!("SELECT {} FROM tasks WHERE id = ?1 AND owner = ?2", TASK_COLUMNS),
                params![id.get(), owner],
                read_task_row,
            )
            .optional()?;

        row.map(task_from_row).transpose()
    }

    /// Returns all of the owner's tasks ordered by ID
    pub fn list_tasks(&self, owner: &str) -> Result<Vec<TaskSummary>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM tasks WHERE owner = ?1 ORDER BY id",
            TASK_COLUMNS
        ))?;
        let rows = stmt
            .query_map(params![owner], read_task_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(task_from_row).collect()
    }

    /// Updates a task's status, returning false if the owner has no such task
    pub fn set_status(
        &self,
        owner: &str,
        id: TaskId,
        status: TaskStatus,
    ) -> Result<bool, StoreError> {
        let changed = self.conn.execute(
            "UPDATE tasks SET status = ?1, updated_at = ?2 WHERE id = ?3 AND owner = ?4",
            params![status.as_str(), Utc::now().to_rfc3339(), id.get(), owner],
        )?;
        Ok(changed > 0)
    }

    fn query_edges(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<DependencyEdge>, StoreError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map(params, read_edge_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(edge_from_row).collect()
    }
}

impl EdgeSource for SqliteStore {
    fn edges_for_task(&self, task: TaskId) -> Result<Vec<DependencyEdge>, StoreError> {
        self.query_edges(
            &format!(
                "SELECT {} FROM task_dependencies
                 WHERE task_id = ?1 OR depends_on_task_id = ?1
                 ORDER BY id",
                EDGE_COLUMNS
            ),
            params![task.get()],
        )
    }

    fn tasks_by_ids(&self, ids: &[TaskId], owner: &str) -> Result<Vec<TaskSummary>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT {} FROM tasks WHERE owner = ? AND id IN ({}) ORDER BY id",
            TASK_COLUMNS, placeholders
        );

        let values: Vec<Value> = std::iter::once(Value::from(owner.to_string()))
            .chain(ids.iter().map(|id| Value::from(id.get())))
            .collect();

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(values), read_task_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(task_from_row).collect()
    }
}

impl DependencyStore for SqliteStore {
    fn insert_edge(&mut self, new: NewDependency) -> Result<DependencyEdge, StoreError> {
        let created_at = Utc::now();
        let inserted = self.conn.execute(
            "INSERT INTO task_dependencies (task_id, depends_on_task_id, dependency_type, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                new.task_id.get(),
                new.depends_on_task_id.get(),
                new.dependency_type.as_str(),
                created_at.to_rfc3339(),
            ],
        );

        match inserted {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                return Err(StoreError::Conflict {
                    task_id: new.task_id,
                    depends_on_task_id: new.depends_on_task_id,
                    dependency_type: new.dependency_type,
                });
            }
            Err(err) => return Err(err.into()),
        }

        let raw = self.conn.last_insert_rowid();
        Ok(DependencyEdge {
            id: edge_id(raw)?,
            task_id: new.task_id,
            depends_on_task_id: new.depends_on_task_id,
            dependency_type: new.dependency_type,
            created_at,
        })
    }

    fn find_edge(&self, id: EdgeId) -> Result<Option<DependencyEdge>, StoreError> {
        let row: Option<EdgeRow> = self
            .conn
            .query_row(
                &format!("SELECT {} FROM task_dependencies WHERE id = ?1", EDGE_COLUMNS),
                params![id.get()],
                read_edge_row,
            )
            .optional()?;

        row.map(edge_from_row).transpose()
    }

    fn delete_edge(&mut self, id: EdgeId) -> Result<bool, StoreError> {
        let removed = self
            .conn
            .execute("DELETE FROM task_dependencies WHERE id = ?1", params![id.get()])?;
        Ok(removed > 0)
    }

    fn edges_for_owner(&self, owner: &str) -> Result<Vec<DependencyEdge>, StoreError> {
        self.query_edges(
            "SELECT d.id, d.task_id, d.depends_on_task_id, d.dependency_type, d.created_at
             FROM task_dependencies d
             JOIN tasks t ON t.id = d.task_id
             WHERE t.owner = ?1
             ORDER BY d.id",
            params![owner],
        )
    }
}

fn read_task_row(row: &Row<'_>) -> rusqlite::Result<TaskRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
}

fn read_edge_row(row: &Row<'_>) -> rusqlite::Result<EdgeRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
}

fn corrupt(table: &'static str, row: i64, message: impl Into<String>) -> StoreError {
    StoreError::Corrupt {
        table,
        row,
        message: message.into(),
    }
}

fn task_id(raw: i64, table: &'static str, row: i64) -> Result<TaskId, StoreError> {
    TaskId::new(raw).map_err(|e| corrupt(table, row, e.to_string()))
}

fn edge_id(raw: i64) -> Result<EdgeId, StoreError> {
    EdgeId::new(raw).map_err(|e| corrupt("task_dependencies", raw, e.to_string()))
}

fn task_from_row((id, title, status, priority, due_date): TaskRow) -> Result<TaskSummary, StoreError> {
    let due_date = due_date
        .map(|d| d.parse::<NaiveDate>())
        .transpose()
        .map_err(|e| corrupt("tasks", id, format!("bad due_date: {}", e)))?;

    Ok(TaskSummary {
        id: task_id(id, "tasks", id)?,
        title,
        status: status.parse().map_err(|e: String| corrupt("tasks", id, e))?,
        priority: priority.parse().map_err(|e: String| corrupt("tasks", id, e))?,
        due_date,
    })
}

fn edge_from_row(
    (id, task, depends_on, dependency_type, created_at): EdgeRow,
) -> Result<DependencyEdge, StoreError> {
    let table = "task_dependencies";
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| corrupt(table, id, format!("bad created_at: {}", e)))?
        .with_timezone(&Utc);

    Ok(DependencyEdge {
        id: edge_id(id)?,
        task_id: task_id(task, table, id)?,
        depends_on_task_id: task_id(depends_on, table, id)?,
        dependency_type: dependency_type
            .parse::<DependencyType>()
            .map_err(|e| corrupt(table, id, e.to_string()))?,
        created_at,
    })
}
