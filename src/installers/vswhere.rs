//! The vswhere toolchain locator. Releases carry the bare `vswhere.exe`
//! (plus checksums and friends), nothing to unpack.

use crate::schemas::tools::{ToolDescriptor, no_post_install};

pub const NAME: &str = "vswhere";

pub fn descriptor() -> ToolDescriptor {
    ToolDescriptor {
        name: NAME,
        executable: "vswhere.exe",
        repository: "microsoft/vswhere",
        asset_pattern: Some(r"^vswhere\.exe$"),
        requires_extraction: false,
        source_archive_fallback: false,
        post_install: no_post_install,
    }
}
