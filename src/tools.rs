// External tool resolver for ffprobe and the media player
//
// Resolution order, first hit wins:
// 1) Configured value naming an existing file (absolute, or containing a separator)
// 2) Environment override (DVRMAN_FFPROBE_PATH, DVRMAN_PLAYER_PATH), if the file exists
// 3) Binary next to the executable
// 4) First match on PATH
// 5) The bare name, left to the OS
//
// A bare configured name such as "vlc" is a lookup key, so the environment
// override still applies to it. An explicit configured path is never
// overridden.

use std::env;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

pub const FFPROBE_ENV: &str = "DVRMAN_FFPROBE_PATH";
pub const PLAYER_ENV: &str = "DVRMAN_PLAYER_PATH";

/// Which step of the resolution order produced a path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolSource {
    Configured,
    Environment,
    BesideExecutable,
    SearchPath,
    BareName,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTool {
    pub path: PathBuf,
    pub source: ToolSource,
}

/// Get the directory containing the current executable
fn exe_dir() -> Option<PathBuf> {
    env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|d| d.to_path_buf()))
}

fn executable_name(name: &str) -> String {
    let mut filename = name.to_string();
    if cfg!(windows) && !filename.to_lowercase().ends_with(".exe") {
        filename.push_str(".exe");
    }
    filename
}

/// True when the value is a path rather than a name to look up
fn names_a_path(value: &str) -> bool {
    let path = Path::new(value);
    path.is_absolute() || path.components().count() > 1
}

/// First directory holding a file called `name`
pub fn find_in_dirs<I>(name: &str, dirs: I) -> Option<PathBuf>
where
    I: IntoIterator<Item = PathBuf>,
{
    let filename = executable_name(name);
    dirs.into_iter()
        .map(|dir| dir.join(&filename))
        .find(|candidate| candidate.is_file())
}

fn search_path(name: &str) -> Option<PathBuf> {
    let paths = env::var_os("PATH")?;
    find_in_dirs(name, env::split_paths(&paths))
}

fn from_env(env_key: &str) -> Option<PathBuf> {
    let value = env::var_os(env_key).filter(|v| !v.is_empty())?;
    let path = PathBuf::from(value);
    if path.exists() {
        Some(path)
    } else {
        log::warn!("{} points to missing file {}, ignoring it", env_key, path.display());
        None
    }
}

fn resolve_tool(configured: &str, env_key: &str) -> ResolvedTool {
    let found = |path, source| ResolvedTool { path, source };

    if names_a_path(configured) {
        let path = PathBuf::from(configured);
        if path.exists() {
            return found(path, ToolSource::Configured);
        }
        log::warn!("Configured tool {} does not exist", path.display());
    }

    if let Some(path) = from_env(env_key) {
        return found(path, ToolSource::Environment);
    }

    // A missing configured path is still looked up by its file name
    let name = Path::new(configured)
        .file_name()
        .and_then(OsStr::to_str)
        .unwrap_or(configured);

    if let Some(path) = exe_dir().and_then(|dir| find_in_dirs(name, [dir])) {
        return found(path, ToolSource::BesideExecutable);
    }

    if let Some(path) = search_path(name) {
        return found(path, ToolSource::SearchPath);
    }

    found(PathBuf::from(configured), ToolSource::BareName)
}

/// Resolve ffprobe; it has no config entry, so the lookup starts at the environment.
pub fn ffprobe() -> ResolvedTool {
    resolve_tool("ffprobe", FFPROBE_ENV)
}

/// Get path to ffprobe binary
pub fn ffprobe_path() -> PathBuf {
    ffprobe().path
}

/// Resolve the configured player
pub fn player(configured: &str) -> ResolvedTool {
    let resolved = resolve_tool(configured, PLAYER_ENV);
    log::debug!("Player {:?} resolved to {} ({:?})", configured, resolved.path.display(), resolved.source);
    resolved
}

/// Check if ffprobe can be run
pub fn is_ffprobe_available() -> bool {
    let resolved = ffprobe();
    if resolved.source != ToolSource::BareName {
        return true;
    }

    std::process::Command::new(&resolved.path)
        .arg("-version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}
