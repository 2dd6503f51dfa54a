// `run`, `build` and `configure`: commands executed inside the toolchain
// environment, with their stdout classified and coloured as it streams.

use crate::installers::ninja;
use crate::libs::context::AppContext;
use crate::libs::env_bridge::{OutputSink, OutputStream};
use crate::libs::output_classifier::classify;
use crate::{log_info, log_warn};
use anyhow::Context;
use colored::Colorize;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Prints streamed output: stdout classified, stderr verbatim. Counts what it saw.
#[derive(Default)]
struct BuildOutput {
    warnings: AtomicUsize,
    errors: AtomicUsize,
}

impl OutputSink for BuildOutput {
    fn line(&self, stream: OutputStream, line: &str) {
        match stream {
            OutputStream::Stdout => {
                let classified = classify(line);
                if classified.kind.is_error() {
                    self.errors.fetch_add(1, Ordering::Relaxed);
                } else if classified.kind.is_warning() {
                    self.warnings.fetch_add(1, Ordering::Relaxed);
                }
                println!("{}", classified.text);
            }
            OutputStream::Stderr => eprintln!("{}", line),
        }
    }
}

impl BuildOutput {
    fn summary(&self) {
        let (warnings, errors) = (
            self.warnings.load(Ordering::Relaxed),
            self.errors.load(Ordering::Relaxed),
        );
        if errors > 0 || warnings > 0 {
            log_warn!(
                "[Run] {} error line(s), {} warning line(s)",
                errors.to_string().red(),
                warnings.to_string().yellow()
            );
        }
    }
}

/// Quotes an argument for the interpreter command line when it needs it.
fn quote(arg: &str) -> String {
    if !arg.is_empty() && !arg.contains(|c: char| c.is_whitespace() || c == '"') {
        return arg.to_string();
    }
    format!("\"{}\"", arg.replace('"', "\\\""))
}

/// Joins already split arguments back into one command line.
fn join_command(args: &[String]) -> String {
    args.iter().map(|a| quote(a)).collect::<Vec<_>>().join(" ")
}

fn execute(ctx: &AppContext, command: &str) -> anyhow::Result<()> {
    let bridge = ctx.bridge().context("failed to resolve the build environment")?;
    let cwd = std::env::current_dir().context("could not read the current directory")?;
    let output = BuildOutput::default();

    log_info!("[Run] {}", command.cyan());
    let result = bridge.run(command, &cwd, &output);
    output.summary();
    result.with_context(|| format!("`{}` did not succeed", command))
}

/// Command line for `run`: a single argument is taken as a complete command
/// line (`run "cmake --build . && ctest"`), several are quoted and joined.
fn user_command(command: &[String]) -> String {
    match command {
        [line] => line.clone(),
        args => join_command(args),
    }
}

pub fn run(ctx: &AppContext, command: &[String]) -> anyhow::Result<()> {
    execute(ctx, &user_command(command))
}

pub fn build(ctx: &AppContext, args: &[String]) -> anyhow::Result<()> {
    let ninja = ctx
        .ensure_installed(&ninja::descriptor())
        .context("ninja is not available")?;

    let mut command = vec![ninja.display().to_string()];
    command.extend(args.iter().cloned());
    execute(ctx, &join_command(&command))
}

pub fn configure(ctx: &AppContext, args: &[String]) -> anyhow::Result<()> {
    let ninja = ctx
        .ensure_installed(&ninja::descriptor())
        .context("ninja is not available")?;

    let mut command = vec![
        "cmake".to_string(),
        "-G".to_string(),
        "Ninja".to_string(),
        format!("-DCMAKE_MAKE_PROGRAM={}", ninja.display()),
    ];
    command.extend(args.iter().cloned());
    execute(ctx, &join_command(&command))
}
