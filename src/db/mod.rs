// Database module: the record store

pub mod migrations;
pub mod rank;
pub mod schema;

use rusqlite::Connection;
use std::path::Path;

use crate::error::Result;

/// Open or create the recording store at the given path
pub fn open_db(db_path: &Path) -> Result<Connection> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let conn = Connection::open(db_path)?;
    configure(&conn)?;
    migrations::run_migrations(&conn)?;

    Ok(conn)
}

/// In-memory store with the schema applied (tests and dry runs)
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    migrations::run_migrations(&conn)?;
    Ok(conn)
}

fn configure(conn: &Connection) -> Result<()> {
    // WAL for crash safety; FULL so every commit is on disk before returning
    conn.execute_batch("PRAGMA journal_mode = WAL;")?;
    conn.execute_batch("PRAGMA synchronous = FULL;")?;
    Ok(())
}
