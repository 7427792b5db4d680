// External media player launch

use std::path::Path;
use std::process::{Command, Stdio};

use crate::error::{DvrError, Result};
use crate::tools;

/// Start the player on one media file and return without waiting for it.
pub fn launch(player: &str, media: &Path) -> Result<()> {
    let program = tools::player(player).path;
    let child = Command::new(&program)
        .arg(media)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| DvrError::Player(format!("Failed to launch {}: {}", program.display(), e)))?;

    log::info!("Started {} (pid {}) for {}", program.display(), child.id(), media.display());
    Ok(())
}
