use crate::error::Result;
use crate::log_debug;
use colored::Colorize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Writes `contents` to `path` so that readers only ever see the old or the new file.
///
/// The bytes go to a temporary file in the same directory first, which is then
/// renamed over the target. A crash mid-write leaves the old file in place.
///
/// # Arguments
/// * `path` - Final location of the file
/// * `contents` - Full file contents
pub fn write_atomically(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;

    log_debug!("[Files] Wrote {}", path.display().to_string().dimmed());
    Ok(())
}

/// Serializes `value` as JSON and writes it with [`write_atomically`].
///
/// # Arguments
/// * `path` - Target file
/// * `value` - Anything serde can serialize
/// * `pretty` - Pretty-print for files a user may want to edit by hand
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T, pretty: bool) -> Result<()> {
    let bytes = if pretty {
        serde_json::to_vec_pretty(value)?
    } else {
        serde_json::to_vec(value)?
    };
    write_atomically(path, &bytes)
}

/// Reads and parses a JSON file.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = fs::read(path)?;
    Ok(serde_json::from_slice(&contents)?)
}

/// Removes a file or a whole directory tree.
///
/// # Returns
/// * `Ok(false)` if nothing existed at `path`, `Ok(true)` once it was removed.
pub fn remove_path(path: &Path) -> Result<bool> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => {
            fs::remove_dir_all(path)?;
            Ok(true)
        }
        Ok(_) => {
            fs::remove_file(path)?;
            Ok(true)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Marks a file as executable for everyone (`0o755`). No-op on Windows,
/// where executability comes from the file extension.
#[cfg(unix)]
pub fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut permissions = fs::metadata(path)?.permissions();
    permissions.set_mode(0o755);
    fs::set_permissions(path, permissions)?;
    log_debug!("[Files] Marked {} executable", path.display());
    Ok(())
}

#[cfg(not(unix))]
pub fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}
