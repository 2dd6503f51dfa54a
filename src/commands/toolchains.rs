// `toolchains` and `select-toolchain [ID]`.

use crate::libs::context::AppContext;
use anyhow::{Context, bail};
use dialoguer::Select;
use std::io::IsTerminal;

pub fn list(ctx: &AppContext) -> anyhow::Result<()> {
    let probe = ctx.probe().context("toolchain discovery needs vswhere")?;
    let listing = ctx
        .locator(&probe)
        .listing()
        .context("failed to enumerate toolchains")?;
    println!("available toolchains:");
    println!("{}", listing);
    Ok(())
}

pub fn select(ctx: &AppContext, id: Option<String>) -> anyhow::Result<()> {
    let probe = ctx.probe().context("toolchain discovery needs vswhere")?;
    let locator = ctx.locator(&probe);

    let id = match id {
        Some(id) => id,
        None => {
            if !std::io::stdin().is_terminal() {
                bail!("no toolchain id given; run `ninja-master toolchains` to list them");
            }
            let products = locator.products().context("failed to enumerate toolchains")?;
            if products.is_empty() {
                bail!("no toolchain installations found");
            }
            let items: Vec<String> = products
                .iter()
                .map(|p| format!("{}  ({})", p.instance_id, p.display_name))
                .collect();
            let current = ctx.store.load_selection().instance_id;
            let default = products
                .iter()
                .position(|p| current.as_deref() == Some(p.instance_id.as_str()))
                .unwrap_or(0);
            let Some(choice) = Select::new()
                .with_prompt("Which toolchain should builds use?")
                .items(&items)
                .default(default)
                .interact_opt()?
            else {
                return Ok(());
            };
            products[choice].instance_id.clone()
        }
    };

    locator
        .select(&id)
        .with_context(|| format!("failed to select toolchain {}", id))?;
    Ok(())
}
