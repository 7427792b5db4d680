// Rank queries over the loaded rows of the recordings table

use std::collections::HashMap;
use rusqlite::{params, Connection};

use crate::error::Result;
use crate::ranking::{Scope, SortSpec};

/// Build the rank statement for a sort spec, restricted to the staged basenames.
///
/// Only `&'static str` fragments from the sort keys are interpolated.
fn rank_sql(spec: &SortSpec) -> String {
    let expression = spec.key.sql_expression();
    let order = spec.order.sql_keyword();

    match spec.scope() {
        Scope::Attribute => format!(
            "SELECT file_basename,
                    ROW_NUMBER() OVER (ORDER BY {} {}, groupkey ASC, timestamp ASC, file_basename ASC)
             FROM recordings
             WHERE file_basename IN (SELECT file_basename FROM temp.loaded_recordings)",
            expression, order
        ),
        Scope::Aggregate => format!(
            "SELECT groupkey,
                    ROW_NUMBER() OVER (ORDER BY {} {}, groupkey ASC)
             FROM recordings
             WHERE file_basename IN (SELECT file_basename FROM temp.loaded_recordings)
             GROUP BY groupkey",
            expression, order
        ),
    }
}

// Per-connection scratch table naming the rows currently loaded
fn stage_loaded(conn: &Connection, basenames: &[String]) -> Result<()> {
    conn.execute_batch(
        "CREATE TEMP TABLE IF NOT EXISTS loaded_recordings (file_basename TEXT PRIMARY KEY);
         DELETE FROM temp.loaded_recordings;",
    )?;
    let mut stmt = conn.prepare("INSERT OR IGNORE INTO temp.loaded_recordings (file_basename) VALUES (?1)")?;
    for basename in basenames {
        stmt.execute(params![basename])?;
    }
    Ok(())
}

/// Rank the rows of the loaded basenames. Keys are basenames or groupkeys,
/// depending on scope; ranks are 1-based. Rows not in `loaded` take no part.
pub fn rank_query(conn: &Connection, spec: &SortSpec, loaded: &[String]) -> Result<HashMap<String, i64>> {
    let tx = conn.unchecked_transaction()?;
    stage_loaded(&tx, loaded)?;

    let mut ranks = HashMap::new();
    {
        let sql = rank_sql(spec);
        let mut stmt = tx.prepare(&sql)?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?;
        for row in rows {
            let (key, rank) = row?;
            ranks.insert(key, rank);
        }
    }
    tx.commit()?;

    log::debug!("Ranked {} keys by {} {}", ranks.len(), spec.key, spec.order.sql_keyword());
    Ok(ranks)
}
