// Helpers for the install pipeline: asset selection, archive extraction,
// file writes and platform facts. Nothing in here knows about a specific tool.

// Picks the one asset of a release that matches a tool's pattern.
pub mod assets;
// Unpacks `.zip` and `.tar.gz` downloads.
pub mod compression;
// Atomic writes, JSON state files, removal and permissions.
pub mod file_operations;
pub mod platform;
