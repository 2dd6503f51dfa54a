// Core engines of `ninja-master`.

// The per-invocation context handed to every command.
pub mod context;
// Captures a toolchain's init script environment and runs commands under it.
pub mod env_bridge;
// Colours and reformats build output line by line.
pub mod output_classifier;
// Data directory resolution.
pub mod paths;
// Finds toolchain installations and resolves the user's selection.
pub mod product_locator;
// Release registry client and asset downloads.
pub mod registry;
// On-disk cache of each tool's release list.
pub mod release_cache;
// The data directory and the small state files in it.
pub mod state_management;
// Install, list and remove versions of a tool.
pub mod tool_installer;
pub mod utilities;
