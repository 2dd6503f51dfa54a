// `fetch [TOOL]`: refresh release caches from the registry.

use crate::cli::type_enums::ToolArg;
use crate::installers;
use crate::libs::context::AppContext;
use crate::log_info;
use anyhow::Context;
use colored::Colorize;

pub fn run(ctx: &AppContext, tool: Option<ToolArg>) -> anyhow::Result<()> {
    let tools = match tool {
        Some(ToolArg(tool)) => vec![tool],
        None => installers::all(),
    };

    for tool in &tools {
        let count = ctx
            .installer(tool)
            .fetch()
            .with_context(|| format!("failed to fetch {} releases", tool.name))?;
        log_info!("[Fetch] {} usable {} releases cached", count.to_string().bold(), tool.name);
    }
    Ok(())
}
