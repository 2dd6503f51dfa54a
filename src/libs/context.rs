// The per-invocation context: built once in `main`, handed to every command.
//
// It owns the data store, the registry/download client and the ambient
// environment snapshot, and hands out the installers, the toolchain locator
// and the environment bridge wired up against them.

use crate::error::{Error, Result};
use crate::installers::vswhere;
use crate::libs::env_bridge::{AmbientEnvironment, EnvironmentBridge};
use crate::libs::product_locator::{ProductLocator, VsWhere, known_fixed_installations};
use crate::libs::registry::GitHubClient;
use crate::libs::state_management::DataStore;
use crate::libs::tool_installer::ToolInstaller;
use crate::schemas::toolchain::ToolchainProduct;
use crate::schemas::tools::ToolDescriptor;
use crate::log_info;
use colored::Colorize;
use std::path::{Path, PathBuf};

pub struct AppContext {
    pub store: DataStore,
    pub client: GitHubClient,
    pub ambient: AmbientEnvironment,
}

impl AppContext {
    /// Opens the data directory and snapshots the ambient environment.
    pub fn new(data_dir: &Path) -> Result<Self> {
        Ok(AppContext {
            store: DataStore::open(data_dir)?,
            client: GitHubClient::new(),
            ambient: AmbientEnvironment::capture(),
        })
    }

    pub fn data_dir(&self) -> &Path {
        self.store.root()
    }

    pub fn installer<'a>(&'a self, tool: &'a ToolDescriptor) -> ToolInstaller<'a> {
        ToolInstaller::new(tool, &self.store, &self.client, &self.client)
    }

    /// Path of `tool`'s executable, installing the newest release first if the tool is not installed.
    pub fn ensure_installed(&self, tool: &ToolDescriptor) -> Result<PathBuf> {
        let installer = self.installer(tool);
        match installer.installed_path() {
            Err(Error::NotInstalled { .. }) => {
                log_info!("[Context] {} is required but not installed, installing it...", tool.name.bold());
                installer.install(None)?;
                installer.installed_path()
            }
            other => other,
        }
    }

    /// Probe backed by the managed vswhere, installed on demand.
    pub fn probe(&self) -> Result<VsWhere> {
        Ok(VsWhere::new(self.ensure_installed(&vswhere::descriptor())?))
    }

    pub fn locator<'a>(&'a self, probe: &'a VsWhere) -> ProductLocator<'a> {
        let fixed = known_fixed_installations(self.ambient.get("ProgramFiles(x86)"));
        ProductLocator::new(probe, &self.store, fixed)
    }

    /// The selected toolchain product.
    pub fn selected_product(&self) -> Result<ToolchainProduct> {
        let probe = self.probe()?;
        self.locator(&probe).selected()
    }

    /// Bridge into the selected toolchain's environment.
    pub fn bridge(&self) -> Result<EnvironmentBridge<'_>> {
        let product = self.selected_product()?;
        EnvironmentBridge::for_product(&product, self.data_dir(), &self.ambient)
    }
}
