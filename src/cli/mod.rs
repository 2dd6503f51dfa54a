// Command line definition: subcommands and typed arguments.

pub mod cmd_enums;
pub mod type_enums;
