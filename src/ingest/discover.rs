// Recording discovery

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::constants::VIDEO_EXTENSION;
use crate::recording::with_extension_suffix;

/// Discover every recording video (*.ts) below the given roots.
///
/// Unreadable directories contribute nothing; they are skipped, not reported.
pub fn discover_recordings(roots: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for (i, root) in roots.iter().enumerate() {
        log::info!("Scanning directory {} of {}: {}", i + 1, roots.len(), root.display());
        let root = root.canonicalize().unwrap_or_else(|_| root.clone());

        for entry in WalkDir::new(&root)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| match e {
                Ok(entry) => Some(entry),
                Err(err) => {
                    log::debug!("Skipping unreadable entry: {}", err);
                    None
                }
            })
        {
            let path = entry.path();
            if entry.file_type().is_file() && is_recording_video(path) {
                files.push(path.to_path_buf());
            }
        }
    }

    // Sort by path for consistent ordering
    files.sort();
    files.dedup();

    log::info!("Found {} recordings in {} directories", files.len(), roots.len());
    files
}

/// True for "<basepath>.ts", matched case-sensitively like the receiver writes it
pub fn is_recording_video(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.len() > VIDEO_EXTENSION.len() && n.ends_with(VIDEO_EXTENSION))
        .unwrap_or(false)
}

/// Strip the video extension: "/dir/name.ts" -> "/dir/name"
pub fn basepath_of(video_path: &Path) -> Option<PathBuf> {
    let name = video_path.file_name()?.to_str()?;
    let stem = name.strip_suffix(VIDEO_EXTENSION)?;
    if stem.is_empty() {
        return None;
    }
    Some(video_path.with_file_name(stem))
}

/// Basename (primary key) of a basepath
pub fn basename_of(basepath: &Path) -> Option<String> {
    basepath.file_name().and_then(|n| n.to_str()).map(String::from)
}

/// Sidecar path for a basepath and extension
pub fn sidecar_of(basepath: &Path, extension: &str) -> PathBuf {
    with_extension_suffix(basepath, extension)
}
