// This module is the registry of every tool `ninja-master` provisions.
//
// Each submodule owns one `ToolDescriptor` (where the releases live, which
// asset to pick, how the download becomes an executable) and, if the tool
// needs one, its post-install step. The generic `ToolInstaller` does the rest.

use crate::schemas::tools::ToolDescriptor;

/// The ninja build executor, installed as a single executable.
pub(crate) mod ninja;

/// The vcpkg package manager: a source tree that bootstraps its own executable.
pub(crate) mod vcpkg;

/// The vswhere toolchain locator, downloaded as a bare executable.
pub(crate) mod vswhere;

/// All supported tools, in the order `info` and `fetch` report them.
pub fn all() -> Vec<ToolDescriptor> {
    vec![ninja::descriptor(), vswhere::descriptor(), vcpkg::descriptor()]
}

/// Looks a tool up by its command line name (case-insensitive).
pub fn find(name: &str) -> Option<ToolDescriptor> {
    all().into_iter().find(|tool| tool.name.eq_ignore_ascii_case(name))
}

/// Names of all supported tools, for error messages and completions.
pub fn names() -> Vec<&'static str> {
    all().iter().map(|tool| tool.name).collect()
}
