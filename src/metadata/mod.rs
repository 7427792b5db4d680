// Video metadata extraction

pub mod ffprobe;

use std::path::Path;
use serde::{Deserialize, Serialize};

use crate::constants::UNKNOWN_DURATION;
use crate::error::Result;

/// Technical properties of a recording's video stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoProperties {
    /// Whole seconds, -1 when the frame rate is zero or unknown
    pub duration: i64,
    pub height: i64,
    pub width: i64,
    pub fps: i64,
}

impl VideoProperties {
    pub fn unknown() -> Self {
        Self {
            duration: UNKNOWN_DURATION,
            height: 0,
            width: 0,
            fps: 0,
        }
    }

    /// Derive duration from a frame count; a zero frame rate leaves it unknown.
    pub fn from_frames(frames: i64, fps: i64, height: i64, width: i64) -> Self {
        let duration = if fps != 0 { frames / fps } else { UNKNOWN_DURATION };
        Self { duration, height, width, fps }
    }
}

/// Probes a video file for its technical properties.
pub trait VideoProbe {
    fn probe(&self, path: &Path) -> Result<VideoProperties>;
}

/// Probe that never touches the file; every field stays unknown.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProbe;

impl VideoProbe for NoProbe {
    fn probe(&self, _path: &Path) -> Result<VideoProperties> {
        Ok(VideoProperties::unknown())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_from_frames() {
        let props = VideoProperties::from_frames(45_000, 50, 1080, 1920);
        assert_eq!(props.duration, 900);
        assert_eq!((props.width, props.height, props.fps), (1920, 1080, 50));
    }

    #[test]
    fn test_zero_fps_is_unknown() {
        let props = VideoProperties::from_frames(45_000, 0, 576, 720);
        assert_eq!(props.duration, -1);
    }

    #[test]
    fn test_no_probe() {
        let props = NoProbe.probe(Path::new("/nonexistent.ts")).unwrap();
        assert_eq!(props, VideoProperties::unknown());
    }
}
