// DVR Manager Error Types

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DvrError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Cached row no longer describes the file on disk.
    #[error("Cache integrity error for '{basename}': cached size {cached} bytes, file has {live} bytes")]
    SizeMismatch { basename: String, cached: i64, live: i64 },

    #[error("Store corruption: {count} rows share primary key '{basename}'")]
    DuplicateRows { basename: String, count: usize },

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Meta file error: {0}")]
    MetaFile(String),

    #[error("Meta file not found: {}", .0.display())]
    MetaFileMissing(PathBuf),

    #[error("FFprobe error: {0}")]
    FFprobe(String),

    #[error("Invalid recording name: {0}")]
    InvalidName(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Player error: {0}")]
    Player(String),

    #[error("{0}")]
    Other(String),
}

impl DvrError {
    /// Integrity errors stop processing; everything else only affects one candidate.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            DvrError::SizeMismatch { .. } | DvrError::DuplicateRows { .. } | DvrError::InvariantViolation(_)
        )
    }
}

impl From<anyhow::Error> for DvrError {
    fn from(err: anyhow::Error) -> Self {
        DvrError::Other(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DvrError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        let mismatch = DvrError::SizeMismatch { basename: "a".into(), cached: 2000, live: 1000 };
        assert!(mismatch.is_fatal());
        assert!(DvrError::DuplicateRows { basename: "a".into(), count: 2 }.is_fatal());
        assert!(DvrError::InvariantViolation("x".into()).is_fatal());

        assert!(!DvrError::MetaFileMissing(PathBuf::from("/tmp/x.ts.meta")).is_fatal());
        assert!(!DvrError::InvalidName("x".into()).is_fatal());
    }

    #[test]
    fn test_size_mismatch_message() {
        let err = DvrError::SizeMismatch { basename: "rec".into(), cached: 2000, live: 1000 };
        let msg = err.to_string();
        assert!(msg.contains("rec"));
        assert!(msg.contains("2000"));
        assert!(msg.contains("1000"));
    }
}
