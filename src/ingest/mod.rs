// Ingest: resolve discovered recordings against the store
//
// Cache hit: reuse the stored row after checking its size against the file.
// Cache miss: parse the .ts.meta sidecar, probe the video, persist the new row.

pub mod discover;
pub mod meta_file;

use std::path::{Path, PathBuf};
use chrono::NaiveDateTime;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::constants::{BASENAME_SEPARATOR, BASENAME_TIME_FORMAT, META_EXTENSION, TIMESTAMP_FORMAT};
use crate::db::schema::{load_recording, save_recording};
use crate::error::{DvrError, Result};
use crate::metadata::{VideoProbe, VideoProperties};
use crate::ranking::groupkey::make_groupkey;
use crate::recording::Recording;
use self::discover::{basename_of, basepath_of, sidecar_of};
use self::meta_file::{read_meta_file, EpgInfo};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestResult {
    pub total_files: usize,
    pub cached: usize,
    pub created: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    Cached(Recording),
    Created(Recording),
}

impl Resolved {
    pub fn into_recording(self) -> Recording {
        match self {
            Resolved::Cached(rec) | Resolved::Created(rec) => rec,
        }
    }
}

/// Resolve every candidate video; returns the records in candidate order.
///
/// Integrity and database errors abort the pass. A missing or malformed
/// sidecar, an unparsable name or an unreadable file only skips that candidate.
pub fn resolve_candidates(
    conn: &Connection,
    candidates: &[PathBuf],
    probe: &dyn VideoProbe,
    table: &[(String, String)],
) -> Result<(Vec<Recording>, IngestResult)> {
    let mut result = IngestResult {
        total_files: candidates.len(),
        ..Default::default()
    };
    let mut recordings = Vec::with_capacity(candidates.len());

    for (idx, video_path) in candidates.iter().enumerate() {
        log::debug!("Processing recording {} of {}", idx + 1, candidates.len());

        match resolve_candidate(conn, video_path, probe, table) {
            Ok(Resolved::Cached(rec)) => {
                result.cached += 1;
                recordings.push(rec);
            }
            Ok(Resolved::Created(rec)) => {
                result.created += 1;
                recordings.push(rec);
            }
            Err(e) if e.is_fatal() || matches!(e, DvrError::Database(_)) => return Err(e),
            Err(DvrError::MetaFileMissing(meta)) => {
                result.skipped += 1;
                log::warn!("{} not found, skipping", meta.display());
            }
            Err(e) => {
                result.skipped += 1;
                log::warn!("Skipping {}: {}", video_path.display(), e);
            }
        }
    }

    log::info!(
        "Processed {} recordings ({} in cache, {} new, {} skipped)",
        result.total_files,
        result.cached,
        result.created,
        result.skipped
    );

    Ok((recordings, result))
}

/// Resolve one "<basepath>.ts" against the store
pub fn resolve_candidate(
    conn: &Connection,
    video_path: &Path,
    probe: &dyn VideoProbe,
    table: &[(String, String)],
) -> Result<Resolved> {
    let basepath = basepath_of(video_path)
        .ok_or_else(|| DvrError::InvalidName(video_path.display().to_string()))?;
    let basename = basename_of(&basepath)
        .ok_or_else(|| DvrError::InvalidName(video_path.display().to_string()))?;
    let live_size = std::fs::metadata(video_path)?.len() as i64;

    if let Some(mut rec) = load_recording(conn, &basename)? {
        if rec.file_size != live_size {
            return Err(DvrError::SizeMismatch {
                basename,
                cached: rec.file_size,
                live: live_size,
            });
        }
        rec.check_invariants()?;
        rec.basepath = basepath;

        // The stored groupkey is derived data; keep it in line with the current table
        let groupkey = make_groupkey(&rec.epg_title, table);
        if groupkey != rec.groupkey {
            log::debug!("Regrouping '{}': '{}' -> '{}'", rec.file_basename, rec.groupkey, groupkey);
            rec.groupkey = groupkey;
            save_recording(conn, &rec)?;
        }

        log::debug!("Cache hit: {}", rec.file_basename);
        return Ok(Resolved::Cached(rec));
    }

    let epg = read_meta_file(&sidecar_of(&basepath, META_EXTENSION))?;
    let video = probe.probe(video_path).unwrap_or_else(|e| {
        log::warn!("Could not probe {}: {}", video_path.display(), e);
        VideoProperties::unknown()
    });

    let rec = build_recording(basepath, basename, live_size, epg, video, table)?;
    save_recording(conn, &rec)?;

    log::debug!("New recording: {}", rec.file_basename);
    Ok(Resolved::Created(rec))
}

/// Build a fresh record from the basename, sidecar fields and probe result.
///
/// The basename is "YYYYMMDD HHMM - <channel> - <title>"; channel and title
/// from the name fill in when the sidecar leaves them empty.
pub fn build_recording(
    basepath: PathBuf,
    basename: String,
    file_size: i64,
    epg: EpgInfo,
    video: VideoProperties,
    table: &[(String, String)],
) -> Result<Recording> {
    let tokens: Vec<&str> = basename.split(BASENAME_SEPARATOR).collect();

    let start = NaiveDateTime::parse_from_str(tokens[0], BASENAME_TIME_FORMAT)
        .map_err(|e| DvrError::InvalidName(format!("'{}': {}", basename, e)))?;
    let timestamp = start.format(TIMESTAMP_FORMAT).to_string();

    let mut channel = epg.channel;
    if channel.is_empty() {
        channel = tokens.get(1).map(|s| s.to_string()).unwrap_or_default();
    }
    let mut title = epg.title;
    if title.is_empty() {
        title = tokens.get(2).map(|s| s.to_string()).unwrap_or_default();
    }

    let groupkey = make_groupkey(&title, table);

    Ok(Recording {
        basepath,
        file_basename: basename,
        file_size,
        epg_channel: channel,
        epg_title: title,
        epg_description: epg.description,
        timestamp,
        video_duration: video.duration,
        video_height: video.height,
        video_width: video.width,
        video_fps: video.fps,
        groupkey,
        is_good: false,
        is_dropped: false,
        is_mastered: false,
        comment: String::new(),
        sortkey: 0,
    })
}
