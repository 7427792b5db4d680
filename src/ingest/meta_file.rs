// Enigma2 .ts.meta sidecar parsing
//
// Line 1: service reference, channel name after the last ':'
// Line 2: title
// Line 3: description, usually prefixed with the title

use std::path::Path;

use crate::error::{DvrError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpgInfo {
    pub channel: String,
    pub title: String,
    pub description: String,
}

/// Read and parse a sidecar. A missing file maps to `MetaFileMissing`.
pub fn read_meta_file(path: &Path) -> Result<EpgInfo> {
    let raw = match std::fs::read(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(DvrError::MetaFileMissing(path.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    };
    // Receivers occasionally write latin-1 EPG text
    let text = String::from_utf8_lossy(&raw);
    parse_meta(&text).map_err(|e| match e {
        DvrError::MetaFile(msg) => DvrError::MetaFile(format!("{}: {}", path.display(), msg)),
        other => other,
    })
}

pub fn parse_meta(text: &str) -> Result<EpgInfo> {
    let lines: Vec<&str> = text.lines().collect();
    if lines.len() < 3 {
        return Err(DvrError::MetaFile(format!("expected at least 3 lines, found {}", lines.len())));
    }

    let channel = lines[0].rsplit(':').next().unwrap_or_default().trim().to_string();
    let title = lines[1].trim().to_string();
    let description = remove_prefix(lines[2].trim(), &title).trim().to_string();

    Ok(EpgInfo { channel, title, description })
}

/// Strip a literal prefix once; an empty prefix leaves the line untouched
pub fn remove_prefix<'a>(line: &'a str, prefix: &str) -> &'a str {
    line.strip_prefix(prefix).unwrap_or(line)
}
