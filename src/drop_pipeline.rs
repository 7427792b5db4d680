// Drop pipeline
//
// For every record flagged dropped:
// 1. Append each existing backing file to the ledger and fsync it
// 2. Delete those files (unless the config keeps them)
// 3. Delete the store row
// 4. Evict the record from the working set

use std::io::Write;
use std::path::{Path, PathBuf};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::db::schema::delete_recording;
use crate::error::Result;
use crate::recording::Recording;
use crate::working_set::WorkingSet;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropReport {
    pub dropped: Vec<String>,
    pub ledgered: Vec<PathBuf>,
    pub files_deleted: usize,
}

/// Backing files of a record that exist right now, as absolute paths
pub fn existing_backing_files(rec: &Recording) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in rec.backing_paths() {
        if path.is_file() {
            files.push(absolute(&path)?);
        }
    }
    Ok(files)
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    Ok(std::env::current_dir()?.join(path))
}

/// Raw path bytes, so non-UTF-8 names are ledgered exactly
#[cfg(unix)]
fn path_bytes(path: &Path) -> Vec<u8> {
    use std::os::unix::ffi::OsStrExt;
    path.as_os_str().as_bytes().to_vec()
}

#[cfg(not(unix))]
fn path_bytes(path: &Path) -> Vec<u8> {
    path.to_string_lossy().into_owned().into_bytes()
}

/// Append one path per line. The ledger is never truncated or read back.
pub fn append_to_ledger(ledger: &Path, paths: &[PathBuf]) -> Result<()> {
    if paths.is_empty() {
        return Ok(());
    }
    if let Some(parent) = ledger.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(ledger)?;
    let mut buf = Vec::new();
    for path in paths {
        buf.extend_from_slice(&path_bytes(path));
        buf.push(b'\n');
    }
    file.write_all(&buf)?;
    // Durable before anything is deleted
    file.sync_all()?;
    Ok(())
}

/// Ledger, delete and unstore one record. Returns the ledgered paths and the number deleted.
pub fn drop_recording(
    conn: &Connection,
    ledger: &Path,
    rec: &Recording,
    delete_files: bool,
) -> Result<(Vec<PathBuf>, usize)> {
    rec.check_invariants()?;

    let files = existing_backing_files(rec)?;
    append_to_ledger(ledger, &files)?;

    let mut deleted = 0;
    if delete_files {
        for path in &files {
            match std::fs::remove_file(path) {
                Ok(()) => {
                    deleted += 1;
                    log::info!("Deleted {}", path.display());
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    log::debug!("Already gone: {}", path.display());
                }
                Err(e) => return Err(e.into()),
            }
        }
    } else {
        for path in &files {
            log::info!("Ledgered {}", path.display());
        }
    }

    delete_recording(conn, &rec.file_basename)?;
    Ok((files, deleted))
}

/// Drop every record flagged at call time and evict it from the working set
pub fn run(conn: &Connection, working: &mut WorkingSet, ledger: &Path, delete_files: bool) -> Result<DropReport> {
    let mut report = DropReport::default();

    for basename in working.dropped_basenames() {
        let Some(rec) = working.get(&basename) else { continue };
        let (files, deleted) = drop_recording(conn, ledger, rec, delete_files)?;
        working.remove(&basename);

        report.ledgered.extend(files);
        report.files_deleted += deleted;
        report.dropped.push(basename);
    }

    log::info!(
        "Dropped {} recordings ({} files ledgered, {} deleted)",
        report.dropped.len(),
        report.ledgered.len(),
        report.files_deleted
    );
    Ok(report)
}
