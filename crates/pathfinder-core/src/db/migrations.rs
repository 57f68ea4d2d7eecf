//! Database schema initialization and versioning.
//!
//! The schema version lives in SQLite's `user_version` pragma. A database
//! stamped with a newer version than this build knows is refused rather
//! than written to.

use crate::error::{DatabaseResultExt, PipelineError, Result};

/// Version of `assets/schema.sql`.
pub const SCHEMA_VERSION: i64 = 1;

impl super::Database {
    /// Initializes the database schema using the embedded SQL file.
    pub(super) fn initialize_schema(&self) -> Result<()> {
        let version = self.schema_version()?;
        if version > SCHEMA_VERSION {
            return Err(PipelineError::Configuration {
                message: format!(
                    "Database schema version {version} is newer than supported {SCHEMA_VERSION}"
                ),
            });
        }

        // WAL lets pollers read while the queue worker writes
        self.connection
            .query_row("PRAGMA journal_mode = WAL", [], |_| Ok(()))
            .db_context("Failed to enable WAL journal")?;

        self.connection
            .execute("PRAGMA foreign_keys = ON", [])
            .db_context("Failed to enable foreign keys")?;

        let schema_sql = include_str!("../../assets/schema.sql");
        self.connection
            .execute_batch(schema_sql)
            .db_context("Failed to initialize database schema")?;

        if version < SCHEMA_VERSION {
            self.connection
                .pragma_update(None, "user_version", SCHEMA_VERSION)
                .db_context("Failed to record schema version")?;
        }

        Ok(())
    }

    /// Schema version stamped on the database; 0 for a new file.
    pub fn schema_version(&self) -> Result<i64> {
        self.connection
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .db_context("Failed to read schema version")
    }
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use tempfile::TempDir;

    use super::*;
    use crate::db::Database;

    #[test]
    fn test_new_database_is_stamped() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("fresh.db");

        let db = Database::new(&path).unwrap();
        assert_eq!(db.schema_version().unwrap(), SCHEMA_VERSION);
        drop(db);

        let reopened = Database::new(&path).unwrap();
        assert_eq!(reopened.schema_version().unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn test_newer_schema_is_refused() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("future.db");
        Connection::open(&path)
            .unwrap()
            .pragma_update(None, "user_version", SCHEMA_VERSION + 1)
            .unwrap();

        let err = Database::new(&path).err().expect("newer schema should be refused");
        assert!(matches!(err, PipelineError::Configuration { .. }));
        assert!(err.to_string().contains("newer than supported"));
    }
}
