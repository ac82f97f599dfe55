//! SQLite-backed primary secret backend.
//!
//! One `secrets` table keyed by name, versioned through `PRAGMA user_version`.
//! Opening a database whose version is older than the requested one drops the
//! table and recreates it empty: a stored token does not survive a version
//! bump.

use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use super::{SECRET_NAME, SecretBackend};
use crate::error::{StoreError, StoreResult};

pub const BACKEND_NAME: &str = "sqlite";
pub const SCHEMA_VERSION: i32 = 1;

const SCHEMA_SQL: &str = "
DROP TABLE IF EXISTS secrets;
CREATE TABLE secrets (
    name TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
";

pub struct SqliteBackend {
    conn: Mutex<Connection>,
}

impl SqliteBackend {
    pub fn open(db_path: &Path) -> StoreResult<Self> {
        Self::open_versioned(db_path, SCHEMA_VERSION)
    }

    pub fn open_versioned(db_path: &Path, version: i32) -> StoreResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut conn = Connection::open(db_path)?;
        conn.execute_batch("PRAGMA busy_timeout = 5000;")?;
        migrate(&mut conn, version)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Unavailable("Lock poisoned".to_string()))
    }
}

fn schema_version(conn: &Connection) -> StoreResult<i32> {
    Ok(conn.query_row("PRAGMA user_version", [], |row| row.get(0))?)
}

fn migrate(conn: &mut Connection, target: i32) -> StoreResult<()> {
    let current = schema_version(conn)?;
    if current >= target {
        if current > target {
            tracing::warn!(
                "Secret database is at version {}, newer than {}; leaving it as is",
                current,
                target
            );
        }
        return Ok(());
    }

    tracing::info!("Upgrading secret database from version {} to {}", current, target);
    let tx = conn.transaction()?;
    tx.execute_batch(SCHEMA_SQL)?;
    tx.pragma_update(None, "user_version", target)?;
    tx.commit()?;
    Ok(())
}

impl SecretBackend for SqliteBackend {
    fn name(&self) -> &'static str {
        BACKEND_NAME
    }

    fn save(&self, value: &str) -> StoreResult<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT OR REPLACE INTO secrets (name, value) VALUES (?1, ?2)",
            params![SECRET_NAME, value],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn get(&self) -> StoreResult<Option<String>> {
        let conn = self.lock()?;
        let value = conn
            .query_row(
                "SELECT value FROM secrets WHERE name = ?1",
                params![SECRET_NAME],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn delete(&self) -> StoreResult<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM secrets WHERE name = ?1", params![SECRET_NAME])?;
        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_save_get_delete() {
        let dir = TempDir::new().unwrap();
        let backend = SqliteBackend::open(&dir.path().join("secrets.db")).unwrap();

        assert_eq!(backend.get().unwrap(), None);
        backend.save("one").unwrap();
        backend.save("two").unwrap();
        assert_eq!(backend.get().unwrap(), Some("two".to_string()));

        let count: i64 = backend
            .lock()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM secrets", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);

        backend.delete().unwrap();
        assert_eq!(backend.get().unwrap(), None);
        // Deleting an absent record is fine
        backend.delete().unwrap();
    }

    #[test]
    fn test_value_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("secrets.db");
        SqliteBackend::open(&path).unwrap().save("kept").unwrap();

        let reopened = SqliteBackend::open(&path).unwrap();
        assert_eq!(reopened.get().unwrap(), Some("kept".to_string()));
    }

    #[test]
    fn test_version_bump_drops_secret() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("secrets.db");
        SqliteBackend::open_versioned(&path, 1).unwrap().save("old").unwrap();

        let upgraded = SqliteBackend::open_versioned(&path, 2).unwrap();
        assert_eq!(upgraded.get().unwrap(), None);
        assert_eq!(schema_version(&upgraded.lock().unwrap()).unwrap(), 2);

        upgraded.save("new").unwrap();
        assert_eq!(upgraded.get().unwrap(), Some("new".to_string()));
    }

    #[test]
    fn test_older_version_request_keeps_data() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("secrets.db");
        SqliteBackend::open_versioned(&path, 3).unwrap().save("kept").unwrap();

        let backend = SqliteBackend::open_versioned(&path, 1).unwrap();
        assert_eq!(backend.get().unwrap(), Some("kept".to_string()));
    }
}
