use crate::cli::type_enums::ToolArg;
use clap::{Parser, Subcommand};

/// Defines the command-line interface (CLI) for 'ninja-master'.
/// `#[derive(Parser)]` automatically generates argument parsing code via `clap`.
#[derive(Parser)]
#[command(name = "ninja-master")]
#[command(version, about = "Provision ninja, vswhere and vcpkg, and run builds inside the MSVC developer environment")]
pub struct Cli {
    /// Enables detailed debug output for troubleshooting.
    #[arg(short, long, global = true)]
    pub(crate) debug: bool,

    /// Directory holding installed tools, release caches and the toolchain selection.
    #[arg(long, global = true, env = "NINJA_MASTER_DATA_DIR", value_name = "DIR")]
    pub(crate) data_dir: Option<String>,

    /// Defines available subcommands for 'ninja-master'.
    #[command(subcommand)]
    pub(crate) command: Commands,
}

/// Enumerates all supported subcommands with their specific arguments and options.
#[derive(Subcommand)]
pub enum Commands {
    /// Show the data directory, installed tools and the selected toolchain.
    Info,
    /// Refresh the release cache of one tool, or of all tools.
    Fetch {
        /// Tool to refresh [ninja, vswhere, vcpkg]; all tools when omitted.
        tool: Option<ToolArg>,
    },
    /// Install a tool release (the newest one when no version is given).
    #[command(alias = "i")]
    Install {
        /// Tool to install [ninja, vswhere, vcpkg].
        tool: ToolArg,
        /// Release tag, as listed by `versions`.
        version: Option<String>,
    },
    /// Remove an installed tool.
    Remove {
        /// Tool to remove [ninja, vswhere, vcpkg].
        tool: ToolArg,
        /// Succeed quietly when the tool is not installed.
        #[arg(long)]
        silent: bool,
    },
    /// List the usable releases of a tool, the installed one marked with X.
    Versions {
        /// Tool to list [ninja, vswhere, vcpkg].
        tool: ToolArg,
    },
    /// List the toolchain installations found on this machine.
    Toolchains,
    /// Choose the toolchain builds run under (interactive when no id is given).
    SelectToolchain {
        /// Instance id, as listed by `toolchains`.
        id: Option<String>,
    },
    /// Print the environment variables the selected toolchain sets.
    Env,
    /// Run a command inside the toolchain environment.
    Run {
        /// The command and its arguments. A single argument is run as a complete
        /// command line, so `"cmake --build . && ctest"` works as typed.
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },
    /// Run the installed ninja inside the toolchain environment.
    Build {
        /// Arguments passed to ninja.
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Run `cmake -G Ninja` inside the toolchain environment, using the installed ninja.
    Configure {
        /// Arguments passed to cmake.
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Show the current version of ninja-master.
    Version,
}
