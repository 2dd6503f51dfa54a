//! The ninja build executor.
//!
//! Releases ship one zip per platform holding just the `ninja` executable,
//! so a plain extraction is all it takes.

use crate::libs::utilities::platform::ninja_asset_pattern;
use crate::schemas::tools::{ToolDescriptor, no_post_install};

pub const NAME: &str = "ninja";

#[cfg(windows)]
const EXECUTABLE: &str = "ninja.exe";
#[cfg(not(windows))]
const EXECUTABLE: &str = "ninja";

pub fn descriptor() -> ToolDescriptor {
    ToolDescriptor {
        name: NAME,
        executable: EXECUTABLE,
        repository: "ninja-build/ninja",
        asset_pattern: Some(ninja_asset_pattern()),
        requires_extraction: true,
        source_archive_fallback: false,
        post_install: no_post_install,
    }
}
