// Recording entity
// One Enigma2 recording: a family of files sharing a basepath.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};

use crate::constants::{
    BYTES_PER_GIB, LIST_CHANNEL_WIDTH, LIST_TITLE_WIDTH, META_EXTENSION, RECORDING_EXTENSIONS, VIDEO_EXTENSION,
};
use crate::error::{DvrError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recording {
    /// Location without extension; recomputed on every scan, never persisted
    #[serde(skip)]
    pub basepath: PathBuf,
    pub file_basename: String,
    pub file_size: i64,
    pub epg_channel: String,
    pub epg_title: String,
    pub epg_description: String,
    /// Start time, "YYYY-MM-DD HH:MM"
    pub timestamp: String,
    /// Seconds, -1 when unknown
    pub video_duration: i64,
    pub video_height: i64,
    pub video_width: i64,
    pub video_fps: i64,
    pub groupkey: String,
    pub is_good: bool,
    pub is_dropped: bool,
    pub is_mastered: bool,
    pub comment: String,
    /// Current display rank; never persisted
    #[serde(skip)]
    pub sortkey: i64,
}

/// Append an extension such as ".ts.meta" to a basepath without touching existing dots.
pub fn with_extension_suffix(basepath: &Path, extension: &str) -> PathBuf {
    let mut s: OsString = basepath.as_os_str().to_owned();
    s.push(extension);
    PathBuf::from(s)
}

impl Recording {
    pub fn video_path(&self) -> PathBuf {
        with_extension_suffix(&self.basepath, VIDEO_EXTENSION)
    }

    pub fn meta_path(&self) -> PathBuf {
        with_extension_suffix(&self.basepath, META_EXTENSION)
    }

    /// Every file the receiver may have written for this recording, existing or not.
    pub fn backing_paths(&self) -> Vec<PathBuf> {
        RECORDING_EXTENSIONS
            .iter()
            .map(|ext| with_extension_suffix(&self.basepath, ext))
            .collect()
    }

    pub fn has_comment(&self) -> bool {
        !self.comment.is_empty()
    }

    /// Dropped and mastered are mutually exclusive.
    pub fn check_invariants(&self) -> Result<()> {
        if self.is_dropped && self.is_mastered {
            return Err(DvrError::InvariantViolation(format!(
                "'{}' is both dropped and mastered",
                self.file_basename
            )));
        }
        Ok(())
    }

    /// Four-character flag badge, e.g. "D..C"
    pub fn attribute_badge(&self) -> String {
        let mut badge = String::with_capacity(4);
        badge.push(if self.is_dropped { 'D' } else { '.' });
        badge.push(if self.is_good { 'G' } else { '.' });
        badge.push(if self.is_mastered { 'M' } else { '.' });
        badge.push(if self.has_comment() { 'C' } else { '.' });
        badge
    }

    pub fn size_gib(&self) -> f64 {
        to_gib(self.file_size)
    }

    /// Whole minutes; the unknown sentinel stays negative
    pub fn duration_minutes(&self) -> i64 {
        self.video_duration.div_euclid(60)
    }

    /// Resolution line for the detail view, e.g. "1920x1080 @ 50 fps"
    pub fn detail_line(&self) -> String {
        format!("{:4}x{:4} @ {} fps", self.video_width, self.video_height, self.video_fps)
    }
}

pub fn to_gib(bytes: i64) -> f64 {
    bytes as f64 / BYTES_PER_GIB
}

fn clip(text: &str, width: usize) -> String {
    let clipped: String = text.chars().take(width).collect();
    format!("{:<width$}", clipped, width = width)
}

impl fmt::Display for Recording {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {} | {:4.1} GiB | {:3} min | {} | {} | {}",
            self.attribute_badge(),
            self.timestamp,
            self.size_gib(),
            self.duration_minutes(),
            clip(&self.epg_channel, LIST_CHANNEL_WIDTH),
            clip(&self.epg_title, LIST_TITLE_WIDTH),
            self.epg_description
        )
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample(basename: &str, title: &str, size: i64) -> Recording {
        Recording {
            basepath: PathBuf::from("/srv/movie").join(basename),
            file_basename: basename.to_string(),
            file_size: size,
            epg_channel: "Das Erste HD".to_string(),
            epg_title: title.to_string(),
            epg_description: "Nachrichten".to_string(),
            timestamp: "2023-05-01 20:00".to_string(),
            video_duration: 900,
            video_height: 1080,
            video_width: 1920,
            video_fps: 50,
            groupkey: crate::ranking::groupkey::make_groupkey(title, &crate::ranking::groupkey::default_table()),
            is_good: false,
            is_dropped: false,
            is_mastered: false,
            comment: String::new(),
            sortkey: 0,
        }
    }

    #[test]
    fn test_paths_keep_basename_dots() {
        let mut rec = sample("20230501 2000 - Das Erste HD - Tagesschau", "Tagesschau", 1);
        rec.basepath = PathBuf::from("/srv/movie/20230501 2000 - Das Erste HD - Dr. No");

        assert_eq!(rec.video_path(), PathBuf::from("/srv/movie/20230501 2000 - Das Erste HD - Dr. No.ts"));
        assert_eq!(rec.meta_path(), PathBuf::from("/srv/movie/20230501 2000 - Das Erste HD - Dr. No.ts.meta"));
        let paths = rec.backing_paths();
        assert_eq!(paths.len(), 6);
        assert!(paths[0].to_string_lossy().ends_with("Dr. No.eit"));
    }

    #[test]
    fn test_attribute_badge() {
        let mut rec = sample("a", "Tagesschau", 1);
        assert_eq!(rec.attribute_badge(), "....");
        rec.is_dropped = true;
        rec.comment = "bad start".to_string();
        assert_eq!(rec.attribute_badge(), "D..C");
        rec.is_dropped = false;
        rec.is_good = true;
        rec.is_mastered = true;
        assert_eq!(rec.attribute_badge(), ".GMC");
        rec.comment.clear();
        assert_eq!(rec.attribute_badge(), ".GM.");
    }

    #[test]
    fn test_invariant_check() {
        let mut rec = sample("a", "Tagesschau", 1);
        rec.is_dropped = true;
        assert!(rec.check_invariants().is_ok());
        rec.is_mastered = true;
        assert!(matches!(rec.check_invariants(), Err(DvrError::InvariantViolation(_))));
    }

    #[test]
    fn test_list_line() {
        let mut rec = sample("a", "Tagesschau", 2 * 1_073_741_824);
        rec.video_duration = -1;
        let line = rec.to_string();
        assert!(line.starts_with("...."));
        assert!(line.contains(" 2.0 GiB"));
        assert!(line.contains(" -1 min"));
        assert!(line.contains("| Das Erste  |"));
        assert!(line.ends_with("| Nachrichten"));
    }
}
