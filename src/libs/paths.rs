// Resolves the managed data directory: where installed tools, release caches,
// installed-version files and the toolchain selection live.

use crate::log_debug;
use anyhow::{Context, Result, bail};
use colored::Colorize;
use std::path::PathBuf;

/// Sub-directory of the platform data directory used when nothing else is configured.
const APP_DIR: &str = "ninja-master";

/// Determines the absolute path of the managed data directory.
///
/// # Arguments
/// * `data_dir`: Directory given with `--data-dir` (or `NINJA_MASTER_DATA_DIR`);
///   `~` is expanded. `None` selects `<local data dir>/ninja-master`.
///
/// # Returns
/// The resolved path. The directory itself is created when the data store is opened.
pub fn resolve_data_dir(data_dir: Option<&str>) -> Result<PathBuf> {
    let resolved = match data_dir {
        Some(raw) if !raw.trim().is_empty() => {
            let expanded = shellexpand::tilde(raw.trim());
            PathBuf::from(expanded.as_ref())
        }
        Some(_) => bail!("the data directory must not be empty"),
        None => dirs::data_local_dir()
            .context("could not determine the local data directory, pass --data-dir")?
            .join(APP_DIR),
    };

    // Relative paths are anchored at the working directory so spawned
    // commands running elsewhere still see the same directory on PATH.
    let absolute = if resolved.is_absolute() {
        resolved
    } else {
        std::env::current_dir()
            .context("could not read the current directory")?
            .join(resolved)
    };

    log_debug!("[Paths] Data directory: {}", absolute.display().to_string().cyan());
    Ok(absolute)
}
