// This module owns the managed data directory and every small state file in it:
// - `<tool>-installed.json`: the installed version tag of a tool (`""` = none)
// - `config.json`: the persisted toolchain selection
// The release lists live next to them and are handled by `release_cache`.
//
// All writes are temp-file-then-rename, so a concurrent reader never sees a
// half written file. There is no locking: one invocation at a time is assumed.

use crate::error::Result;
use crate::libs::utilities::file_operations::{read_json, write_json};
use crate::schemas::toolchain::SelectionConfig;
use crate::{log_debug, log_warn};
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};

const SELECTION_FILE: &str = "config.json";

/// Handle on the managed data directory.
#[derive(Debug, Clone)]
pub struct DataStore {
    root: PathBuf,
}

impl DataStore {
    /// Opens the data directory, creating it if it does not exist yet.
    ///
    /// # Arguments
    /// * `root`: Absolute path of the managed directory.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        log_debug!("[State] Using data directory {}", root.display().to_string().cyan());
        Ok(DataStore { root })
    }

    /// The managed directory itself.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of a file inside the managed directory.
    pub fn file(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    fn installed_file(&self, tool: &str) -> PathBuf {
        self.file(&format!("{}-installed.json", tool))
    }

    /// Reads the installed version of `tool`.
    ///
    /// # Returns
    /// * `None` when nothing is recorded (missing file, empty string, or a file we cannot parse).
    pub fn installed_version(&self, tool: &str) -> Option<String> {
        let path = self.installed_file(tool);
        if !path.exists() {
            return None;
        }
        match read_json::<String>(&path) {
            Ok(version) if !version.is_empty() => Some(version),
            Ok(_) => None,
            Err(e) => {
                log_warn!(
                    "[State] Ignoring unreadable {}: {}",
                    path.display().to_string().yellow(),
                    e
                );
                None
            }
        }
    }

    /// Records `version` as installed for `tool`; an empty string clears the record.
    pub fn set_installed_version(&self, tool: &str, version: &str) -> Result<()> {
        log_debug!("[State] {} installed version := {:?}", tool, version);
        write_json(&self.installed_file(tool), version, false)
    }

    /// Loads the toolchain selection; a missing or broken file counts as "nothing selected".
    pub fn load_selection(&self) -> SelectionConfig {
        let path = self.file(SELECTION_FILE);
        if !path.exists() {
            return SelectionConfig::default();
        }
        read_json(&path).unwrap_or_else(|e| {
            log_warn!(
                "[State] {} is not valid JSON ({}), treating it as empty",
                path.display().to_string().yellow(),
                e
            );
            SelectionConfig::default()
        })
    }

    /// Persists the toolchain selection, pretty-printed for hand editing.
    pub fn save_selection(&self, config: &SelectionConfig) -> Result<()> {
        write_json(&self.file(SELECTION_FILE), config, true)
    }
}
