//! The vcpkg package manager.
//!
//! vcpkg releases have no uploaded assets, so the installer downloads the
//! release's source archive instead. GitHub names that archive after the
//! commit (`microsoft-vcpkg-2024.02.14-0-gfe1cde6.zip`) and puts everything
//! under a `microsoft-vcpkg-<hash>` directory. The post-install step finds that
//! directory from the downloaded filename, renames it to `vcpkg`, and runs the
//! bootstrap script which fetches the actual `vcpkg` executable.

use crate::error::{Error, Result};
use crate::schemas::tools::{PostInstall, ToolDescriptor};
use crate::{log_debug, log_info};
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

pub const NAME: &str = "vcpkg";

/// Directory the tool owns inside the managed directory.
const INSTALL_DIR: &str = "vcpkg";
const SOURCE_DIR_PREFIX: &str = "microsoft-vcpkg-";

#[cfg(windows)]
const EXECUTABLE: &str = "vcpkg/vcpkg.exe";
#[cfg(not(windows))]
const EXECUTABLE: &str = "vcpkg/vcpkg";

pub fn descriptor() -> ToolDescriptor {
    ToolDescriptor {
        name: NAME,
        executable: EXECUTABLE,
        repository: "microsoft/vcpkg",
        asset_pattern: None,
        requires_extraction: true,
        source_archive_fallback: true,
        post_install,
    }
}

fn post_install(ctx: &PostInstall) -> Result<()> {
    let install_dir = promote_source_directory(ctx.staging_dir, ctx.downloaded_filename)?;
    bootstrap(&install_dir)
}

/// Directory names the archive may have unpacked to, most likely first.
///
/// The commit hash is the last `-` separated segment of the archive name,
/// which GitHub prefixes with `g` in the file name but not in the directory.
fn source_directory_candidates(downloaded_filename: &str) -> Vec<String> {
    let stem = downloaded_filename
        .trim_end_matches(".zip")
        .trim_end_matches(".tar.gz")
        .trim_end_matches(".tgz");
    let hash = stem.rsplit('-').next().unwrap_or(stem);

    let mut candidates = vec![format!("{}{}", SOURCE_DIR_PREFIX, hash)];
    if let Some(short) = hash.strip_prefix('g').filter(|s| !s.is_empty()) {
        candidates.push(format!("{}{}", SOURCE_DIR_PREFIX, short));
    }
    candidates
}

/// Renames the unpacked `microsoft-vcpkg-<hash>` directory to `vcpkg`.
///
/// # Returns
/// * The renamed directory, or `PostInstallFailed` naming every directory tried.
fn promote_source_directory(staging_dir: &Path, downloaded_filename: &str) -> Result<PathBuf> {
    let candidates = source_directory_candidates(downloaded_filename);
    let found = candidates
        .iter()
        .map(|name| staging_dir.join(name))
        .find(|path| path.is_dir());

    let Some(source_dir) = found else {
        return Err(Error::PostInstallFailed {
            tool: NAME.to_string(),
            reason: format!(
                "none of {} was found after unpacking {}",
                candidates.join(", "),
                downloaded_filename
            ),
        });
    };

    let install_dir = staging_dir.join(INSTALL_DIR);
    log_debug!(
        "[vcpkg] Renaming {} to {}",
        source_dir.display(),
        install_dir.display()
    );
    fs::rename(&source_dir, &install_dir)?;
    Ok(install_dir)
}

/// Runs the bootstrap script shipped in the source tree.
fn bootstrap(install_dir: &Path) -> Result<()> {
    log_info!("[vcpkg] Bootstrapping in {}...", install_dir.display().to_string().cyan());

    let mut command = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.args(["/d", "/c", "bootstrap-vcpkg.bat", "-disableMetrics"]);
        c
    } else {
        // Unpacked zips lose the executable bit, so go through the shell.
        let mut c = Command::new("sh");
        c.args(["bootstrap-vcpkg.sh", "-disableMetrics"]);
        c
    };

    let output = command
        .current_dir(install_dir)
        .output()
        .map_err(|e| Error::PostInstallFailed {
            tool: NAME.to_string(),
            reason: format!("could not start the bootstrap script: {}", e),
        })?;

    if !output.stdout.is_empty() {
        log_debug!("[vcpkg] Bootstrap stdout: {}", String::from_utf8_lossy(&output.stdout));
    }
    if !output.status.success() {
        return Err(Error::PostInstallFailed {
            tool: NAME.to_string(),
            reason: format!(
                "bootstrap exited with code {}: {}",
                output.status.code().unwrap_or(-1),
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn candidates_with_and_without_the_g_prefix() {
        assert_eq!(
            source_directory_candidates("microsoft-vcpkg-2024.02.14-0-gfe1cde6.zip"),
            vec!["microsoft-vcpkg-gfe1cde6", "microsoft-vcpkg-fe1cde6"]
        );
        assert_eq!(
            source_directory_candidates("microsoft-vcpkg-abc1234.zip"),
            vec!["microsoft-vcpkg-abc1234"]
        );
    }

    #[test]
    fn promotes_the_hash_named_directory() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("microsoft-vcpkg-fe1cde6/scripts")).unwrap();

        let installed =
            promote_source_directory(dir.path(), "microsoft-vcpkg-2024.02.14-0-gfe1cde6.zip").unwrap();
        assert_eq!(installed, dir.path().join("vcpkg"));
        assert!(installed.join("scripts").is_dir());
        assert!(!dir.path().join("microsoft-vcpkg-fe1cde6").exists());
    }

    #[test]
    fn missing_directory_fails_with_the_names_tried() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("microsoft-vcpkg-0000000")).unwrap();

        match promote_source_directory(dir.path(), "microsoft-vcpkg-2024.02.14-0-gfe1cde6.zip") {
            Err(Error::PostInstallFailed { reason, .. }) => {
                assert!(reason.contains("microsoft-vcpkg-gfe1cde6"));
                assert!(reason.contains("microsoft-vcpkg-fe1cde6"));
            }
            other => panic!("expected PostInstallFailed, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn hook_renames_then_bootstraps() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("microsoft-vcpkg-fe1cde6");
        fs::create_dir_all(&source).unwrap();
        fs::write(
            source.join("bootstrap-vcpkg.sh"),
            "[ \"$1\" = \"-disableMetrics\" ] || exit 7\necho built > vcpkg\n",
        )
        .unwrap();

        let tool = descriptor();
        post_install(&PostInstall {
            tool: &tool,
            staging_dir: dir.path(),
            downloaded_filename: "microsoft-vcpkg-2024.02.14-0-gfe1cde6.zip",
        })
        .unwrap();
        assert!(dir.path().join(EXECUTABLE).is_file());
    }

    #[cfg(unix)]
    #[test]
    fn failing_bootstrap_is_a_post_install_failure() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("microsoft-vcpkg-fe1cde6")).unwrap();
        fs::write(
            dir.path().join("microsoft-vcpkg-fe1cde6/bootstrap-vcpkg.sh"),
            "echo 'no compiler' >&2\nexit 2\n",
        )
        .unwrap();

        let err = promote_source_directory(dir.path(), "microsoft-vcpkg-fe1cde6.zip")
            .and_then(|installed| bootstrap(&installed))
            .unwrap_err();
        match err {
            Error::PostInstallFailed { reason, .. } => assert!(reason.contains("no compiler")),
            other => panic!("expected PostInstallFailed, got {:?}", other),
        }
    }
}
