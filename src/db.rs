use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, params};
use time::OffsetDateTime;

/// One forward-only schema change, identified by its version.
struct SchemaStep {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const SCHEMA_STEPS: &[SchemaStep] = &[
    SchemaStep {
        version: 1,
        name: "records, tags and record_tags",
        sql: include_str!("db/migrations/001_initial_schema.sql"),
    },
    SchemaStep {
        version: 2,
        name: "date and folder indexes",
        sql: include_str!("db/migrations/002_calendar_indexes.sql"),
    },
    SchemaStep {
        version: 3,
        name: "search history",
        sql: include_str!("db/migrations/003_search_history.sql"),
    },
];

/// Schema version a freshly opened database ends up at.
pub const SCHEMA_VERSION: u32 = SCHEMA_STEPS[SCHEMA_STEPS.len() - 1].version;

/// Database wrapper providing connection management and schema upgrades.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens an in-memory SQLite database.
    ///
    /// Automatically upgrades the schema on connection open.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::initialize(conn)
    }

    /// Opens a file-based SQLite database at the given path.
    ///
    /// Creates the database file if it does not exist.
    /// Automatically upgrades the schema on connection open.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database at {}", path.display()))?;
        log::debug!("event=db_open path={}", path.display());
        Self::initialize(conn)
    }

    fn initialize(mut conn: Connection) -> Result<Self> {
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        upgrade_schema(&mut conn).context("Failed to upgrade database schema")?;
        Ok(Self { conn })
    }

    /// Returns a reference to the underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Highest schema version recorded in this database.
    pub fn schema_version(&self) -> Result<u32> {
        Ok(recorded_version(&self.conn)?)
    }
}

/// Applies every step newer than the recorded version, each in its own
/// transaction. Returns how many steps ran.
fn upgrade_schema(conn: &mut Connection) -> rusqlite::Result<usize> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL,
            description TEXT
        )",
    )?;

    let current = recorded_version(conn)?;
    let pending = SCHEMA_STEPS.iter().filter(|step| step.version > current);

    let mut ran = 0;
    for step in pending {
        let tx = conn.transaction()?;
        tx.execute_batch(step.sql)?;
        tx.execute(
            "INSERT INTO schema_migrations (version, applied_at, description)
             VALUES (?1, ?2, ?3)",
            params![
                step.version,
                OffsetDateTime::now_utc().unix_timestamp(),
                step.name
            ],
        )?;
        tx.commit()?;

        log::info!(
            "event=schema_upgraded from={} to={} step=\"{}\"",
            current,
            step.version,
            step.name
        );
        ran += 1;
    }
    Ok(ran)
}

fn recorded_version(conn: &Connection) -> rusqlite::Result<u32> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn names(db: &Database, sql: &str) -> Vec<String> {
        db.connection()
            .prepare(sql)
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect()
    }

    #[test]
    fn in_memory_opens_successfully() {
        let result = Database::in_memory();
        assert!(result.is_ok());
    }

    #[test]
    fn schema_tables_exist() {
        let db = Database::in_memory().unwrap();
        let tables = names(
            &db,
            "SELECT name FROM sqlite_master WHERE type='table' ORDER BY name",
        );

        assert!(tables.contains(&"records".to_string()));
        assert!(tables.contains(&"tags".to_string()));
        assert!(tables.contains(&"record_tags".to_string()));
        assert!(tables.contains(&"search_history".to_string()));
        assert!(tables.contains(&"schema_migrations".to_string()));
    }

    #[test]
    fn schema_indexes_exist() {
        let db = Database::in_memory().unwrap();
        let indexes = names(
            &db,
            "SELECT name FROM sqlite_master WHERE type='index' AND name LIKE 'idx_%' ORDER BY name",
        );

        assert!(indexes.contains(&"idx_records_updated".to_string()));
        assert!(indexes.contains(&"idx_records_date".to_string()));
        assert!(indexes.contains(&"idx_record_tags_record".to_string()));
        assert!(indexes.contains(&"idx_record_tags_tag".to_string()));
    }

    #[test]
    fn foreign_keys_enabled() {
        let db = Database::in_memory().unwrap();

        let fk_enabled: i32 = db
            .connection()
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();

        assert_eq!(fk_enabled, 1);
    }

    #[test]
    fn schema_rejects_completed_notes() {
        let db = Database::in_memory().unwrap();
        let result = db.connection().execute(
            "INSERT INTO records (title, kind, completed, created_at, updated_at)
             VALUES ('x', 'note', 1, 0, 0)",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn schema_rejects_blank_titles() {
        let db = Database::in_memory().unwrap();
        let result = db.connection().execute(
            "INSERT INTO records (title, created_at, updated_at) VALUES ('   ', 0, 0)",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn open_creates_database_file() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");

        let result = Database::open(&db_path);
        assert!(result.is_ok());
        assert!(db_path.exists());
    }

    #[test]
    fn reopen_is_idempotent() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");

        {
            let db = Database::open(&db_path).unwrap();
            db.connection()
                .execute(
                    "INSERT INTO records (title, created_at, updated_at) VALUES ('test', 0, 0)",
                    [],
                )
                .unwrap();
        }

        let db2 = Database::open(&db_path);
        assert!(db2.is_ok());

        let count: i32 = db2
            .unwrap()
            .connection()
            .query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn schema_steps_are_strictly_increasing() {
        for pair in SCHEMA_STEPS.windows(2) {
            assert!(pair[0].version < pair[1].version);
        }
        assert_eq!(SCHEMA_VERSION, 3);
    }

    #[test]
    fn fresh_database_is_at_latest_version() {
        let db = Database::in_memory().unwrap();
        assert_eq!(db.schema_version().unwrap(), SCHEMA_VERSION);

        let steps: i64 = db
            .connection()
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(steps, SCHEMA_STEPS.len() as i64);
    }

    #[test]
    fn upgrade_runs_only_newer_steps() {
        let mut conn = Connection::open_in_memory().unwrap();
        assert_eq!(upgrade_schema(&mut conn).unwrap(), SCHEMA_STEPS.len());
        assert_eq!(upgrade_schema(&mut conn).unwrap(), 0);
    }

    #[test]
    fn older_database_is_upgraded_on_open() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("old.db");

        // Leave a database at version 1, as an older build would.
        {
            let conn = Connection::open(&db_path).unwrap();
            conn.execute_batch(
                "CREATE TABLE schema_migrations (
                    version INTEGER PRIMARY KEY,
                    applied_at INTEGER NOT NULL,
                    description TEXT
                )",
            )
            .unwrap();
            conn.execute_batch(SCHEMA_STEPS[0].sql).unwrap();
            conn.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (1, 0)",
                [],
            )
            .unwrap();
        }

        let db = Database::open(&db_path).unwrap();

        assert_eq!(db.schema_version().unwrap(), SCHEMA_VERSION);
        let tables = names(&db, "SELECT name FROM sqlite_master WHERE type='table'");
        assert!(tables.contains(&"search_history".to_string()));
    }
}
