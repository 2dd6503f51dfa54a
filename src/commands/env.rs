// `env`: the variables the selected toolchain's init script sets, as NAME=value lines.

use crate::libs::context::AppContext;
use anyhow::Context;

pub fn run(ctx: &AppContext) -> anyhow::Result<()> {
    let bridge = ctx.bridge().context("failed to resolve the build environment")?;
    let delta = bridge
        .delta()
        .with_context(|| format!("failed to capture the environment of {}", bridge.init_script().display()))?;
    for (name, value) in delta.iter() {
        println!("{}={}", name, value);
    }
    Ok(())
}
