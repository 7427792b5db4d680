// FFprobe wrapper for video stream properties

use std::path::Path;
use std::process::Command;
use serde::Deserialize;

use crate::error::{DvrError, Result};
use crate::metadata::{VideoProbe, VideoProperties};

#[derive(Debug, Deserialize)]
struct FFprobeOutput {
    streams: Option<Vec<FFprobeStream>>,
    format: Option<FFprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FFprobeStream {
    codec_type: Option<String>,
    width: Option<i64>,
    height: Option<i64>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    nb_frames: Option<String>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FFprobeFormat {
    duration: Option<String>,
}

/// Probe backed by the ffprobe binary
#[derive(Debug, Default, Clone, Copy)]
pub struct FfprobeProbe;

impl VideoProbe for FfprobeProbe {
    fn probe(&self, path: &Path) -> Result<VideoProperties> {
        probe(path)
    }
}

/// Run ffprobe on a file and extract the first video stream's properties
pub fn probe(path: &Path) -> Result<VideoProperties> {
    let output = Command::new(crate::tools::ffprobe_path())
        .args([
            "-v", "quiet",
            "-print_format", "json",
            "-show_format",
            "-show_streams",
            "-select_streams", "v:0",
        ])
        .arg(path)
        .output()
        .map_err(|e| DvrError::FFprobe(format!("Failed to run ffprobe: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(DvrError::FFprobe(format!("ffprobe failed: {}", stderr)));
    }

    parse_output(&output.stdout)
}

fn parse_output(stdout: &[u8]) -> Result<VideoProperties> {
    let probe_output: FFprobeOutput = serde_json::from_slice(stdout)
        .map_err(|e| DvrError::FFprobe(format!("Failed to parse ffprobe output: {}", e)))?;

    let stream = probe_output
        .streams
        .unwrap_or_default()
        .into_iter()
        .find(|s| s.codec_type.as_deref() == Some("video"));

    let Some(stream) = stream else {
        return Ok(VideoProperties::unknown());
    };

    let rate = parse_frame_rate(stream.r_frame_rate.as_deref())
        .filter(|r| *r > 0.0)
        .or_else(|| parse_frame_rate(stream.avg_frame_rate.as_deref()))
        .unwrap_or(0.0);
    let fps = rate as i64;

    // Transport streams rarely carry nb_frames; fall back to duration x rate
    let seconds = parse_seconds(stream.duration.as_deref())
        .or_else(|| parse_seconds(probe_output.format.as_ref().and_then(|f| f.duration.as_deref())));
    let frames = stream
        .nb_frames
        .as_deref()
        .and_then(|n| n.parse::<i64>().ok())
        .or_else(|| seconds.map(|s| (s * rate) as i64))
        .unwrap_or(0);

    Ok(VideoProperties::from_frames(
        frames,
        fps,
        stream.height.unwrap_or(0),
        stream.width.unwrap_or(0),
    ))
}

/// Parse frame rate string like "30000/1001" to f64
fn parse_frame_rate(rate_str: Option<&str>) -> Option<f64> {
    let rate_str = rate_str?;
    if let Some((num, den)) = rate_str.split_once('/') {
        let num: f64 = num.parse().ok()?;
        let den: f64 = den.parse().ok()?;
        if den > 0.0 {
            return Some(num / den);
        }
        return None;
    }
    rate_str.parse().ok()
}

fn parse_seconds(duration_str: Option<&str>) -> Option<f64> {
    duration_str?.parse().ok()
}

/// Check if ffprobe is available
pub fn is_available() -> bool {
    crate::tools::is_ffprobe_available()
}
