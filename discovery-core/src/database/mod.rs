pub mod migrations;

mod evidence;
mod questions;
mod sow;
mod status;

#[cfg(test)]
mod migrations_test;

pub use evidence::{DocumentOutcome, NewInformation};

use crate::error::StorageError;
use crate::types::Project;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

pub type DbConnection = Arc<Mutex<Connection>>;

/// SQLite-backed store for the discovery graph.
///
/// Every write is its own statement (or a single transaction for multi-row
/// replacements), so a failure on one record never rolls back another.
/// Write methods that operate on batches log and skip failures instead of
/// returning them.
pub struct Database {
    pub(crate) connection: DbConnection,
}

impl Database {
    pub fn new(db_path: &Path) -> Result<Self, StorageError> {
        // Ensure directory exists
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    StorageError::OperationFailed(format!(
                        "Failed to create database directory {}: {e}",
                        parent.display()
                    ))
                })?;
            }
        }

        Self::from_connection(Connection::open(db_path)?)
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(mut conn: Connection) -> Result<Self, StorageError> {
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        migrations::run_discovery_migrations(&mut conn)?;

        Ok(Database {
            connection: Arc::new(Mutex::new(conn)),
        })
    }

    pub(crate) fn conn(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.connection
            .lock()
            .map_err(|e| StorageError::Lock(e.to_string()))
    }

    // Projects

    pub fn create_project(&self, name: &str, sow_path: &str) -> Result<i64, StorageError> {
        let conn = self.conn()?;
        let now = now();

        conn.execute(
            "INSERT INTO projects (name, sow_path, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
            params![name, sow_path, now],
        )?;

        let id = conn.last_insert_rowid();
        tracing::info!(project_id = id, name, "Created project");
        Ok(id)
    }

    pub fn get_project(&self, project_id: i64) -> Result<Option<Project>, StorageError> {
        let conn = self.conn()?;
        let project = conn
            .query_row(
                "SELECT id, name, sow_path, created_at, updated_at FROM projects WHERE id = ?1",
                params![project_id],
                project_from_row,
            )
            .optional()?;
        Ok(project)
    }

    /// Most recently created project with this exact name
    pub fn find_project_by_name(&self, name: &str) -> Result<Option<Project>, StorageError> {
        let conn = self.conn()?;
        let project = conn
            .query_row(
                "SELECT id, name, sow_path, created_at, updated_at FROM projects
                    WHERE name = ?1 ORDER BY id DESC LIMIT 1",
                params![name],
                project_from_row,
            )
            .optional()?;
        Ok(project)
    }

    pub fn list_projects(&self) -> Result<Vec<Project>, StorageError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, sow_path, created_at, updated_at FROM projects ORDER BY id",
        )?;
        let projects = stmt
            .query_map([], project_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(projects)
    }
}

/// Bump a project's updated_at after a child row changed
pub(crate) fn touch_project(conn: &Connection, project_id: i64) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE projects SET updated_at = ?1 WHERE id = ?2",
        params![now(), project_id],
    )?;
    Ok(())
}

fn project_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        sow_path: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

pub(crate) fn now() -> i64 {
    chrono::Utc::now().timestamp()
}
