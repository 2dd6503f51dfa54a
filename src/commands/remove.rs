// `remove TOOL [--silent]`

use crate::cli::type_enums::ToolArg;
use crate::libs::context::AppContext;
use crate::libs::tool_installer::RemoveMode;
use anyhow::Context;

pub fn run(ctx: &AppContext, ToolArg(tool): ToolArg, silent: bool) -> anyhow::Result<()> {
    let mode = if silent { RemoveMode::Silent } else { RemoveMode::Strict };
    ctx.installer(&tool)
        .remove(mode)
        .with_context(|| format!("failed to remove {}", tool.name))?;
    Ok(())
}
