// Register application subcommands.
// Each module corresponds to a specific `ninja-master` command-line action.

// Prints the captured toolchain environment.
pub mod env;
// Refreshes release caches.
pub mod fetch;
// Shows data directory, installed tools and selection.
pub mod info;
// Installs a tool release.
pub mod install;
// Removes an installed tool.
pub mod remove;
// Runs commands, ninja and cmake inside the toolchain environment.
pub mod run;
// Lists and selects toolchains.
pub mod toolchains;
// Displays the version of ninja-master
pub mod version;
// Lists a tool's releases.
pub mod versions;
