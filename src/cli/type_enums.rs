use crate::installers;
use crate::schemas::tools::ToolDescriptor;
use std::fmt;
use std::str::FromStr;

/// A tool named on the command line, resolved to its descriptor.
#[derive(Debug, Clone, Copy)]
pub struct ToolArg(pub ToolDescriptor);

/// Implementation of string parsing for ToolArg.
/// Allows clap to turn `ninja-master install NINJA` into the ninja descriptor.
impl FromStr for ToolArg {
    type Err = String;

    /// Looks the tool up by name (case-insensitive).
    ///
    /// # Returns
    /// * `Ok(ToolArg)` for a supported tool
    /// * `Err(String)` listing the supported tools otherwise
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        installers::find(s).map(ToolArg).ok_or_else(|| {
            format!(
                "Unknown tool '{s}'. Must be one of: {}",
                installers::names().join(", ")
            )
        })
    }
}

impl fmt::Display for ToolArg {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0.name)
    }
}
