// Recording rows: load, upsert and delete by primary key

use std::path::PathBuf;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::{DvrError, Result};
use crate::recording::Recording;

const RECORDING_COLUMNS: &str = "file_basename, groupkey, timestamp, file_size,
    epg_channel, epg_title, epg_description,
    video_duration, video_height, video_width, video_fps,
    is_good, is_dropped, is_mastered, comment";

fn row_to_recording(row: &Row) -> rusqlite::Result<Recording> {
    Ok(Recording {
        basepath: PathBuf::new(),
        file_basename: row.get(0)?,
        groupkey: row.get(1)?,
        timestamp: row.get(2)?,
        file_size: row.get(3)?,
        epg_channel: row.get(4)?,
        epg_title: row.get(5)?,
        epg_description: row.get(6)?,
        video_duration: row.get(7)?,
        video_height: row.get(8)?,
        video_width: row.get(9)?,
        video_fps: row.get(10)?,
        is_good: row.get(11)?,
        is_dropped: row.get(12)?,
        is_mastered: row.get(13)?,
        comment: row.get(14)?,
        sortkey: 0,
    })
}

/// Load a cached row. The caller must check `file_size` against the live file.
pub fn load_recording(conn: &Connection, basename: &str) -> Result<Option<Recording>> {
    let sql = format!("SELECT {} FROM recordings WHERE file_basename = ?1", RECORDING_COLUMNS);
    let result = conn.query_row(&sql, params![basename], row_to_recording).optional()?;
    Ok(result)
}

/// Replace the row for `rec.file_basename` with the current state, atomically.
pub fn save_recording(conn: &Connection, rec: &Recording) -> Result<()> {
    let tx = conn.unchecked_transaction()?;

    delete_rows(&tx, &rec.file_basename)?;
    tx.execute(
        &format!(
            "INSERT INTO recordings ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            RECORDING_COLUMNS
        ),
        params![
            rec.file_basename,
            rec.groupkey,
            rec.timestamp,
            rec.file_size,
            rec.epg_channel,
            rec.epg_title,
            rec.epg_description,
            rec.video_duration,
            rec.video_height,
            rec.video_width,
            rec.video_fps,
            rec.is_good,
            rec.is_dropped,
            rec.is_mastered,
            rec.comment,
        ],
    )?;

    tx.commit()?;
    Ok(())
}

/// Remove the row for `basename`. Absent keys are a no-op; returns whether a row existed.
pub fn delete_recording(conn: &Connection, basename: &str) -> Result<bool> {
    let tx = conn.unchecked_transaction()?;
    let removed = delete_rows(&tx, basename)?;
    tx.commit()?;
    Ok(removed == 1)
}

// More than one row for a key means the store is corrupt; the open
// transaction is rolled back when the caller drops it.
fn delete_rows(conn: &Connection, basename: &str) -> Result<usize> {
    let removed = conn.execute(
        "DELETE FROM recordings WHERE file_basename = ?1",
        params![basename],
    )?;
    if removed > 1 {
        return Err(DvrError::DuplicateRows {
            basename: basename.to_string(),
            count: removed,
        });
    }
    Ok(removed)
}

pub fn count_recordings(conn: &Connection) -> Result<i64> {
    let count = conn.query_row("SELECT COUNT(*) FROM recordings", [], |row| row.get(0))?;
    Ok(count)
}

/// Basenames of every cached row, sorted
pub fn list_basenames(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT file_basename FROM recordings ORDER BY file_basename")?;
    let rows = stmt.query_map([], |row| row.get(0))?;
    let mut basenames = Vec::new();
    for row in rows {
        basenames.push(row?);
    }
    Ok(basenames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;
    use crate::recording::tests::sample;

    #[test]
    fn test_save_load_round_trip() {
        let conn = open_in_memory().unwrap();
        let mut rec = sample("20230501 2000 - Das Erste HD - Tagesschau", "Tagesschau", 4_000_000);
        rec.is_good = true;
        rec.comment = "keep: intro intact".to_string();
        rec.video_duration = -1;
        rec.sortkey = 17;

        save_recording(&conn, &rec).unwrap();
        let loaded = load_recording(&conn, &rec.file_basename).unwrap().unwrap();

        // basepath and sortkey are not persisted
        let expected = Recording { basepath: PathBuf::new(), sortkey: 0, ..rec };
        assert_eq!(loaded, expected);
    }

    #[test]
    fn test_load_missing_is_none() {
        let conn = open_in_memory().unwrap();
        assert!(load_recording(&conn, "nope").unwrap().is_none());
    }

    #[test]
    fn test_save_replaces_existing_row() {
        let conn = open_in_memory().unwrap();
        let mut rec = sample("a", "Tagesschau", 100);
        save_recording(&conn, &rec).unwrap();

        rec.is_dropped = true;
        rec.comment = "duplicate".to_string();
        save_recording(&conn, &rec).unwrap();

        assert_eq!(count_recordings(&conn).unwrap(), 1);
        let loaded = load_recording(&conn, "a").unwrap().unwrap();
        assert!(loaded.is_dropped);
        assert_eq!(loaded.comment, "duplicate");
    }

    #[test]
    fn test_delete_is_noop_for_absent_key() {
        let conn = open_in_memory().unwrap();
        assert!(!delete_recording(&conn, "ghost").unwrap());

        save_recording(&conn, &sample("a", "Tagesschau", 1)).unwrap();
        assert!(delete_recording(&conn, "a").unwrap());
        assert!(load_recording(&conn, "a").unwrap().is_none());
        assert!(!delete_recording(&conn, "a").unwrap());
    }

    #[test]
    fn test_duplicate_rows_are_fatal_and_rolled_back() {
        // A legacy table without the key constraint can hold duplicates
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE recordings (file_basename TEXT, groupkey TEXT, timestamp TEXT,
                file_size INTEGER, epg_channel TEXT, epg_title TEXT, epg_description TEXT,
                video_duration INTEGER, video_height INTEGER, video_width INTEGER, video_fps INTEGER,
                is_good INTEGER, is_dropped INTEGER, is_mastered INTEGER, comment TEXT);",
        )
        .unwrap();
        let rec = sample("twin", "Tagesschau", 1);
        for _ in 0..2 {
            conn.execute(
                "INSERT INTO recordings (file_basename, groupkey, file_size) VALUES (?1, ?2, ?3)",
                params![rec.file_basename, rec.groupkey, rec.file_size],
            )
            .unwrap();
        }

        let err = delete_recording(&conn, "twin").unwrap_err();
        assert!(matches!(err, DvrError::DuplicateRows { count: 2, .. }));
        assert!(err.is_fatal());

        // Rolled back: both rows still there
        assert_eq!(count_recordings(&conn).unwrap(), 2);

        // Upsert hits the same guard
        assert!(matches!(save_recording(&conn, &rec), Err(DvrError::DuplicateRows { .. })));
        assert_eq!(count_recordings(&conn).unwrap(), 2);
    }

    #[test]
    fn test_list_basenames_sorted() {
        let conn = open_in_memory().unwrap();
        for name in ["c", "a", "b"] {
            save_recording(&conn, &sample(name, "Tagesschau", 1)).unwrap();
        }
        assert_eq!(list_basenames(&conn).unwrap(), vec!["a", "b", "c"]);
    }
}
