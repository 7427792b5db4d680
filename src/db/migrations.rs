// Database migrations
// Migrations are forward-only. Never edit or delete a migration after it ships.

use rusqlite::Connection;

use crate::error::{DvrError, Result};

/// All migrations in order. Each migration is a SQL string.
const MIGRATIONS: &[&str] = &[
    // Migration 1: recording cache
    r#"
    CREATE TABLE IF NOT EXISTS recordings (
        file_basename TEXT PRIMARY KEY,
        groupkey TEXT NOT NULL,
        timestamp TEXT NOT NULL,
        file_size INTEGER NOT NULL,
        epg_channel TEXT NOT NULL,
        epg_title TEXT NOT NULL,
        epg_description TEXT NOT NULL,
        video_duration INTEGER NOT NULL,
        video_height INTEGER NOT NULL,
        video_width INTEGER NOT NULL,
        video_fps INTEGER NOT NULL,
        is_good INTEGER NOT NULL DEFAULT 0,
        is_dropped INTEGER NOT NULL DEFAULT 0,
        is_mastered INTEGER NOT NULL DEFAULT 0,
        comment TEXT NOT NULL DEFAULT ''
    );
    "#,
    // Migration 2: group lookups for aggregate ranking
    r#"
    CREATE INDEX IF NOT EXISTS idx_recordings_groupkey ON recordings(groupkey);
    "#,
];

/// Get current schema version from database
fn get_schema_version(conn: &Connection) -> Result<u32> {
    let version: u32 = conn.query_row(
        "PRAGMA user_version",
        [],
        |row| row.get(0)
    )?;
    Ok(version)
}

/// Run all pending migrations, each in its own transaction
pub fn run_migrations(conn: &Connection) -> Result<()> {
    let current_version = get_schema_version(conn)?;
    let target_version = MIGRATIONS.len() as u32;

    if current_version > target_version {
        return Err(DvrError::Other(format!(
            "Store schema version {} is newer than this build supports (max {})",
            current_version,
            target_version
        )));
    }

    for (i, migration) in MIGRATIONS.iter().enumerate() {
        let migration_version = (i + 1) as u32;
        if migration_version <= current_version {
            continue;
        }

        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(migration)?;
        tx.execute_batch(&format!("PRAGMA user_version = {}", migration_version))?;
        tx.commit()?;

        log::info!("Applied store migration {}", migration_version);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_reach_target_version() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), MIGRATIONS.len() as u32);

        // Second run is a no-op
        run_migrations(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), MIGRATIONS.len() as u32);
    }

    #[test]
    fn test_refuses_newer_schema() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA user_version = 99").unwrap();
        assert!(run_migrations(&conn).is_err());
    }
}
