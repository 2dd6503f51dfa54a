// This module installs, lists and removes the versioned tools described by a
// `ToolDescriptor`. It is generic over the tool: everything tool specific is in
// the descriptor (registry id, asset pattern, extraction, post-install hook).
//
// An installation runs through these steps:
// 1. resolve the release (explicit tag or newest usable release)
// 2. select the asset and download it to a private temp directory
// 3. stage it: unpack (or copy) into a staging directory inside the data directory
// 4. run the tool's post-install hook against the staging directory
// 5. place the staged entry into the managed directory, replacing the old one
// 6. verify the executable and commit the installed version
//
// The installed version is only ever written in step 6 (or cleared when
// step 5 fails half way), so it never names a version whose files are absent.

use crate::error::{Error, Result};
use crate::libs::registry::{Downloader, ReleaseRegistry};
use crate::libs::release_cache::ReleaseCache;
use crate::libs::state_management::DataStore;
use crate::libs::utilities::assets::select_asset;
use crate::libs::utilities::compression::{ArchiveKind, extract_archive};
use crate::libs::utilities::file_operations::{make_executable, remove_path};
use crate::schemas::release::Release;
use crate::schemas::tools::{PostInstall, ToolDescriptor};
use crate::{log_debug, log_error, log_info, log_warn};
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};

/// How strictly `remove` treats a tool that is not (fully) installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveMode {
    /// Removing an uninstalled tool, or one whose files are gone, is an error.
    Strict,
    /// Both cases are accepted silently (cleanup before install, `--silent`).
    Silent,
}

/// Result of a successful `install` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    /// The requested version was already installed; nothing was downloaded.
    AlreadyInstalled(String),
    /// The given version is now installed.
    Installed(String),
}

/// Installer for one tool, bound to the data directory and the registry/transport seams.
pub struct ToolInstaller<'a> {
    tool: &'a ToolDescriptor,
    store: &'a DataStore,
    registry: &'a dyn ReleaseRegistry,
    downloader: &'a dyn Downloader,
}

impl<'a> ToolInstaller<'a> {
    pub fn new(
        tool: &'a ToolDescriptor,
        store: &'a DataStore,
        registry: &'a dyn ReleaseRegistry,
        downloader: &'a dyn Downloader,
    ) -> Self {
        ToolInstaller {
            tool,
            store,
            registry,
            downloader,
        }
    }

    pub fn tool(&self) -> &ToolDescriptor {
        self.tool
    }

    /// The version recorded as installed, `None` when the tool is not installed.
    pub fn installed_version(&self) -> Option<String> {
        self.store.installed_version(self.tool.name)
    }

    /// Where the executable lives once installed.
    pub fn executable_path(&self) -> PathBuf {
        self.store.root().join(self.tool.executable)
    }

    /// Path of the installed executable.
    ///
    /// The recorded version and the file on disk have to agree: both absent
    /// is `NotInstalled`, only one of them present is `CorruptInstall`.
    pub fn installed_path(&self) -> Result<PathBuf> {
        let path = self.executable_path();
        match (self.installed_version(), path.is_file()) {
            (Some(_), true) => Ok(path),
            (None, false) => Err(Error::NotInstalled {
                tool: self.tool.name.to_string(),
            }),
            (Some(version), false) => Err(Error::CorruptInstall {
                tool: self.tool.name.to_string(),
                reason: format!("version {} is recorded but the executable is missing", version),
                path,
            }),
            (None, true) => Err(Error::CorruptInstall {
                tool: self.tool.name.to_string(),
                reason: "the executable exists but no installed version is recorded".to_string(),
                path,
            }),
        }
    }

    /// Refreshes the release cache from the registry.
    ///
    /// # Returns
    /// * Number of usable releases now cached.
    pub fn fetch(&self) -> Result<usize> {
        let releases = ReleaseCache::new(self.store).refresh(self.tool, self.registry)?;
        Ok(releases.len())
    }

    /// Usable releases, newest first, served from the cache when possible.
    pub fn releases(&self) -> Result<Vec<Release>> {
        ReleaseCache::new(self.store).usable_releases(self.tool, self.registry)
    }

    /// Human readable listing of all usable releases, the installed one marked with `X`.
    pub fn versions(&self) -> Result<String> {
        let installed = self.installed_version();
        let lines: Vec<String> = self
            .releases()?
            .iter()
            .map(|release| {
                let mark = if installed.as_deref() == Some(release.tag.as_str()) { "X" } else { " " };
                let date = release
                    .published_at
                    .map(|d| d.format("%-d %B %Y").to_string())
                    .unwrap_or_else(|| "-".to_string());
                format!("   {} {}\t{}", mark, release.tag, date)
            })
            .collect();
        Ok(lines.join("\n"))
    }

    /// Installs `version`, or the newest usable release when `version` is `None`.
    ///
    /// Installing the version that is already recorded is a no-op and does not
    /// touch the network beyond (at most) a release cache refresh.
    pub fn install(&self, version: Option<&str>) -> Result<InstallOutcome> {
        let name = self.tool.name;
        let installed = self.installed_version();

        if let (Some(wanted), Some(current)) = (version, installed.as_deref()) {
            if wanted == current {
                return self.already_installed(current);
            }
        }

        let releases = self.releases()?;
        let release = match version {
            Some(wanted) => releases.iter().find(|r| r.tag == wanted).ok_or_else(|| {
                Error::VersionNotFound {
                    tool: name.to_string(),
                    version: wanted.to_string(),
                    known: releases.iter().map(|r| r.tag.clone()).collect(),
                }
            })?,
            None => {
                let latest = releases.first().ok_or_else(|| Error::RegistryUnavailable {
                    tool: name.to_string(),
                    reason: "the registry lists no usable releases".to_string(),
                })?;
                if installed.as_deref() == Some(latest.tag.as_str()) {
                    return self.already_installed(&latest.tag);
                }
                log_info!("[Installer] Latest {} release: {}", name.bold(), latest.tag.cyan());
                latest
            }
        };

        let asset = select_asset(release, self.tool.asset_pattern)?;

        // Private download location, gone when this function returns.
        let download_dir = tempfile::Builder::new().prefix("ninja-master-dl-").tempdir()?;
        let download_path = download_dir.path().join(&asset.name);
        let advisory = self.downloader.download(&asset.download_url, &download_path)?;
        let downloaded_filename = advisory.unwrap_or_else(|| asset.name.clone());
        log_debug!(
            "[Installer] {} downloaded to {} as {}",
            asset.name,
            download_path.display(),
            downloaded_filename
        );

        // The staging directory shares the data directory's filesystem so placing is a rename.
        let staging = tempfile::Builder::new()
            .prefix(".staging-")
            .tempdir_in(self.store.root())?;
        self.stage(&download_path, &downloaded_filename, staging.path())?;

        (self.tool.post_install)(&PostInstall {
            tool: self.tool,
            staging_dir: staging.path(),
            downloaded_filename: &downloaded_filename,
        })?;

        let staged_executable = staging.path().join(self.tool.executable);
        if !staged_executable.is_file() {
            return Err(Error::ExecutableMissing {
                tool: name.to_string(),
                path: staged_executable,
            });
        }
        make_executable(&staged_executable)?;

        self.place(staging.path(), installed.as_deref())?;

        self.store.set_installed_version(name, &release.tag)?;
        log_info!(
            "[Installer] {} {} installed to {}",
            name.bold(),
            release.tag.green(),
            self.executable_path().display().to_string().cyan()
        );
        Ok(InstallOutcome::Installed(release.tag.clone()))
    }

    /// No-op outcome for a version that is already recorded, as long as its
    /// executable is really there. A missing executable is `CorruptInstall`.
    fn already_installed(&self, version: &str) -> Result<InstallOutcome> {
        self.installed_path()?;
        log_info!(
            "[Installer] {} version {} already installed!",
            self.tool.name.bold(),
            version.green()
        );
        Ok(InstallOutcome::AlreadyInstalled(version.to_string()))
    }

    /// Unpacks (or copies) the download into the staging directory.
    fn stage(&self, download: &Path, downloaded_filename: &str, staging: &Path) -> Result<()> {
        if self.tool.requires_extraction {
            extract_archive(download, staging, ArchiveKind::from_file_name(downloaded_filename))
        } else {
            let target = staging.join(self.tool.executable);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(download, &target)?;
            Ok(())
        }
    }

    /// Swaps the staged entry into the managed directory.
    fn place(&self, staging: &Path, previous: Option<&str>) -> Result<()> {
        let entry = self.tool.managed_entry();
        let staged = staging.join(entry);
        let target = self.store.root().join(entry);

        let placed = remove_path(&target)
            .and_then(|removed| {
                if removed {
                    log_debug!("[Installer] Removed previous {}", target.display());
                }
                fs::rename(&staged, &target).map_err(Error::from)
            })
            .and_then(|_| {
                if self.executable_path().is_file() {
                    Ok(())
                } else {
                    Err(Error::ExecutableMissing {
                        tool: self.tool.name.to_string(),
                        path: self.executable_path(),
                    })
                }
            });

        if let Err(e) = placed {
            log_error!(
                "[Installer] Failed to place {} into {}: {}",
                self.tool.name.red(),
                target.display(),
                e
            );
            if let Some(previous) = previous {
                // The old files may be partly or fully gone; stop claiming the old version.
                log_warn!("[Installer] {} {} is no longer installed", self.tool.name, previous);
                self.store.set_installed_version(self.tool.name, "")?;
            }
            return Err(e);
        }
        Ok(())
    }

    /// Removes the installed tool.
    ///
    /// # Returns
    /// * `Ok(true)` if something was uninstalled, `Ok(false)` if there was
    ///   nothing to do in `Silent` mode.
    pub fn remove(&self, mode: RemoveMode) -> Result<bool> {
        let name = self.tool.name;
        let Some(version) = self.installed_version() else {
            return match mode {
                RemoveMode::Strict => Err(Error::NotInstalled {
                    tool: name.to_string(),
                }),
                RemoveMode::Silent => {
                    log_debug!("[Installer] {} is not installed, nothing to remove", name);
                    Ok(false)
                }
            };
        };

        let target = self.store.root().join(self.tool.managed_entry());
        log_debug!(
            "[Installer] Deleting {} {}",
            if self.tool.is_directory_install() { "directory" } else { "file" },
            target.display()
        );
        let removed = remove_path(&target)?;
        if !removed && mode == RemoveMode::Strict {
            return Err(Error::CorruptInstall {
                tool: name.to_string(),
                reason: format!("version {} is recorded but nothing is installed", version),
                path: target,
            });
        }

        self.store.set_installed_version(name, "")?;
        log_info!("[Installer] {} {} removed", name.bold(), version.yellow());
        Ok(true)
    }
}
