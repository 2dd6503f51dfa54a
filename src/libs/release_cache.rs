// Persists the release list of every tool in the managed directory
// (`<tool>-releases.json`) and serves it back, refreshing from the registry
// when the cache is missing or unreadable.

use crate::error::{Error, Result};
use crate::libs::registry::ReleaseRegistry;
use crate::libs::state_management::DataStore;
use crate::libs::utilities::file_operations::{read_json, write_json};
use crate::schemas::release::{RawRelease, Release};
use crate::schemas::tools::ToolDescriptor;
use crate::{log_debug, log_info, log_warn};
use colored::Colorize;

/// Release list cache backed by the data directory.
pub struct ReleaseCache<'a> {
    store: &'a DataStore,
}

impl<'a> ReleaseCache<'a> {
    pub fn new(store: &'a DataStore) -> Self {
        ReleaseCache { store }
    }

    fn cache_file(&self, tool: &str) -> std::path::PathBuf {
        self.store.file(&format!("{}-releases.json", tool))
    }

    /// Replaces the cached release list of `tool`.
    pub fn write(&self, tool: &str, releases: &[RawRelease]) -> Result<()> {
        write_json(&self.cache_file(tool), releases, false)
    }

    /// Reads the cached release list of `tool`.
    ///
    /// # Returns
    /// * `CacheMiss` if nothing was ever written, or the file cannot be parsed.
    pub fn read(&self, tool: &str) -> Result<Vec<RawRelease>> {
        let path = self.cache_file(tool);
        read_json(&path).map_err(|e| {
            log_debug!("[ReleaseCache] {} unusable: {}", path.display(), e);
            Error::CacheMiss {
                tool: tool.to_string(),
            }
        })
    }

    /// Fetches the registry's release list for `tool`, keeps the usable
    /// entries and stores them, replacing any previous cache content.
    ///
    /// # Returns
    /// * The stored entries, or `RegistryUnavailable` when the registry cannot be reached.
    pub fn refresh(&self, tool: &ToolDescriptor, registry: &dyn ReleaseRegistry) -> Result<Vec<RawRelease>> {
        log_info!("[ReleaseCache] Fetching {} releases from {}...", tool.name.bold(), tool.repository.cyan());

        let fetched = registry
            .list_releases(tool.repository)
            .map_err(|e| Error::RegistryUnavailable {
                tool: tool.name.to_string(),
                reason: e.to_string(),
            })?;
        let total = fetched.len();

        let usable: Vec<RawRelease> = fetched
            .into_iter()
            .filter(|raw| Release::from_raw(raw, tool.repository, tool.source_archive_fallback).is_some())
            .collect();
        log_debug!("[ReleaseCache] {} of {} {} releases are usable", usable.len(), total, tool.name);

        self.write(tool.name, &usable)?;
        Ok(usable)
    }

    /// Returns the usable releases of `tool`, newest first.
    ///
    /// A cache miss triggers exactly one refresh; if the cache is still
    /// unusable afterwards the registry is reported unavailable.
    pub fn usable_releases(&self, tool: &ToolDescriptor, registry: &dyn ReleaseRegistry) -> Result<Vec<Release>> {
        let raw = match self.read(tool.name) {
            Ok(raw) => raw,
            Err(Error::CacheMiss { .. }) => {
                log_warn!("[ReleaseCache] No readable {} release cache, fetching...", tool.name.yellow());
                self.refresh(tool, registry)?;
                self.read(tool.name).map_err(|_| Error::RegistryUnavailable {
                    tool: tool.name.to_string(),
                    reason: "release cache still unreadable after refresh".to_string(),
                })?
            }
            Err(e) => return Err(e),
        };

        Ok(raw
            .iter()
            .filter_map(|r| Release::from_raw(r, tool.repository, tool.source_archive_fallback))
            .collect())
    }
}
