// `info`: where things live and what is installed. Works offline and never
// probes for toolchains, so it is safe to run on any machine.

use crate::installers;
use crate::libs::context::AppContext;
use colored::Colorize;

pub fn run(ctx: &AppContext) -> anyhow::Result<()> {
    println!("ninja-master environment info:");
    println!("  data directory: {}", ctx.data_dir().display().to_string().cyan());

    println!("  tools:");
    for tool in installers::all() {
        let installer = ctx.installer(&tool);
        let status = match installer.installed_version() {
            Some(version) => match installer.installed_path() {
                Ok(path) => format!("{} ({})", version.green(), path.display()),
                Err(e) => format!("{} ({})", version.yellow(), e.to_string().red()),
            },
            None => "not installed".dimmed().to_string(),
        };
        println!("    {:<8} {}", tool.name, status);
    }

    let selection = ctx.store.load_selection();
    println!(
        "  selected toolchain: {}",
        selection
            .instance_id
            .map(|id| id.green().to_string())
            .unwrap_or_else(|| "(latest)".dimmed().to_string())
    );
    Ok(())
}
