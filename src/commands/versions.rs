// `versions TOOL`: the release listing, newest first.

use crate::cli::type_enums::ToolArg;
use crate::libs::context::AppContext;
use anyhow::Context;

pub fn run(ctx: &AppContext, ToolArg(tool): ToolArg) -> anyhow::Result<()> {
    let listing = ctx
        .installer(&tool)
        .versions()
        .with_context(|| format!("failed to list {} releases", tool.name))?;
    println!("available {} versions:", tool.name);
    println!("{}", listing);
    Ok(())
}
