// `install TOOL [VERSION]`

use crate::cli::type_enums::ToolArg;
use crate::libs::context::AppContext;
use crate::libs::tool_installer::InstallOutcome;
use crate::log_info;
use anyhow::Context;
use colored::Colorize;

pub fn run(ctx: &AppContext, ToolArg(tool): ToolArg, version: Option<String>) -> anyhow::Result<()> {
    match &version {
        Some(v) => log_info!("[Install] Installing {} release {}...", tool.name.bold(), v.cyan()),
        None => log_info!("[Install] Installing the latest {} release...", tool.name.bold()),
    }

    let outcome = ctx
        .installer(&tool)
        .install(version.as_deref())
        .with_context(|| match &version {
            Some(v) => format!("failed to install {} {}", tool.name, v),
            None => format!("failed to install {}", tool.name),
        })?;

    if let InstallOutcome::AlreadyInstalled(version) = outcome {
        log_info!("[Install] Nothing to do, {} {} is already installed", tool.name, version);
    }
    Ok(())
}
