// `version`: the ninja-master version and the installed tool versions.

use crate::installers;
use crate::libs::context::AppContext;

pub fn run(ctx: &AppContext) {
    println!("ninja-master {}", env!("CARGO_PKG_VERSION"));
    for tool in installers::all() {
        if let Some(version) = ctx.installer(&tool).installed_version() {
            println!("  {} {}", tool.name, version);
        }
    }
}
