//! # Tool descriptors
//!
//! Static description of every tool `ninja-master` can provision. A descriptor
//! is all the generic installer needs to know about a tool: where its releases
//! live, which asset to pick, how the download becomes an executable on disk,
//! and an optional post-install step for tools that need more than unpacking.

use crate::error::Result;
use std::path::{Component, Path};

/// Everything a post-install step gets to work with.
///
/// The step runs after the download has been unpacked (or copied) into the
/// staging directory and before anything is moved into the managed directory.
pub struct PostInstall<'a> {
    /// The tool being installed.
    pub tool: &'a ToolDescriptor,
    /// Directory holding the staged files; same layout the managed directory will get.
    pub staging_dir: &'a Path,
    /// Name of the downloaded file: the server's advisory filename when it
    /// sent one, otherwise the asset name.
    pub downloaded_filename: &'a str,
}

/// Signature of a per-tool post-install step.
pub type PostInstallHook = fn(&PostInstall) -> Result<()>;

/// Default post-install step: nothing to do.
pub fn no_post_install(_ctx: &PostInstall) -> Result<()> {
    Ok(())
}

/// Static configuration of one provisioned tool.
#[derive(Clone, Copy)]
pub struct ToolDescriptor {
    /// Short name, used on the command line and to name the state files.
    pub name: &'static str,
    /// Path of the executable relative to the managed directory.
    pub executable: &'static str,
    /// `owner/repo` id on the release registry.
    pub repository: &'static str,
    /// Regex the chosen asset's name must match; `None` means the release must have exactly one asset.
    pub asset_pattern: Option<&'static str>,
    /// Whether the asset is an archive to unpack (otherwise it is the executable itself).
    pub requires_extraction: bool,
    /// Whether releases without uploaded assets may use their source archive instead.
    pub source_archive_fallback: bool,
    /// Tool specific step run against the staging directory.
    pub post_install: PostInstallHook,
}

impl ToolDescriptor {
    /// The top level entry of the managed directory owned by this tool:
    /// the executable itself, or the directory it lives in.
    pub fn managed_entry(&self) -> &Path {
        let executable = Path::new(self.executable);
        executable
            .components()
            .find_map(|c| match c {
                Component::Normal(name) => Some(Path::new(name)),
                _ => None,
            })
            .unwrap_or(executable)
    }

    /// `true` when the tool owns a whole directory rather than a single file.
    pub fn is_directory_install(&self) -> bool {
        self.managed_entry() != Path::new(self.executable)
    }
}

impl std::fmt::Debug for ToolDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolDescriptor")
            .field("name", &self.name)
            .field("executable", &self.executable)
            .field("repository", &self.repository)
            .field("asset_pattern", &self.asset_pattern)
            .field("requires_extraction", &self.requires_extraction)
            .field("source_archive_fallback", &self.source_archive_fallback)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(executable: &'static str) -> ToolDescriptor {
        ToolDescriptor {
            name: "sample",
            executable,
            repository: "owner/sample",
            asset_pattern: None,
            requires_extraction: false,
            source_archive_fallback: false,
            post_install: no_post_install,
        }
    }

    #[test]
    fn single_file_tool_owns_its_executable() {
        let tool = descriptor("ninja.exe");
        assert_eq!(tool.managed_entry(), Path::new("ninja.exe"));
        assert!(!tool.is_directory_install());
    }

    #[test]
    fn nested_executable_owns_its_top_directory() {
        let tool = descriptor("vcpkg/vcpkg.exe");
        assert_eq!(tool.managed_entry(), Path::new("vcpkg"));
        assert!(tool.is_directory_install());
    }
}
