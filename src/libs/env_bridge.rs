// Bridges commands into the environment a toolchain's init script sets up.
//
// `capture` sources the init script in a command interpreter, dumps the
// resulting environment and diffs it against the ambient environment of this
// process. Only the variables the script added or changed make up the delta,
// plus the search path with the managed directory prepended so the installed
// tools are found first. The ambient environment is a snapshot taken once at
// startup; it is never modified, the delta only ever goes into child processes.
//
// `run` spawns a command under that environment and streams its stdout and
// stderr line by line to an `OutputSink` while the command runs.

use crate::error::{Error, Result};
use crate::libs::utilities::platform::{PATH_SEPARATOR, PATH_VAR};
use crate::schemas::toolchain::ToolchainProduct;
use crate::{log_debug, log_error, log_warn};
use colored::Colorize;
use once_cell::unsync::OnceCell;
use std::collections::BTreeMap;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Immutable snapshot of the environment this process was started with.
///
/// Names are matched case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct AmbientEnvironment {
    vars: BTreeMap<String, (String, String)>,
}

impl AmbientEnvironment {
    /// Snapshot of the current process environment. Non UTF-8 entries are decoded lossily.
    pub fn capture() -> Self {
        Self::from_pairs(
            std::env::vars_os()
                .map(|(k, v)| (k.to_string_lossy().into_owned(), v.to_string_lossy().into_owned())),
        )
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars = pairs
            .into_iter()
            .map(|(k, v)| {
                let name: String = k.into();
                (name.to_lowercase(), (name, v.into()))
            })
            .collect();
        AmbientEnvironment { vars }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(&name.to_lowercase()).map(|(_, v)| v.as_str())
    }

    /// The name as spelled in the environment (`Path` vs `PATH` on Windows).
    fn spelling(&self, name: &str) -> Option<&str> {
        self.vars.get(&name.to_lowercase()).map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.values().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

/// Variables an init script set or changed, keyed case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentDelta {
    entries: BTreeMap<String, (String, String)>,
}

impl EnvironmentDelta {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(&name.to_lowercase()).map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(name, value)` pairs, ordered by lowercased name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.values().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

/// Parses `NAME=VALUE` lines as printed by `set` / `env`.
///
/// Lines without `=` and entries with an empty name (cmd's `=C:=C:\` drive
/// entries) are skipped.
pub fn parse_env_dump(output: &str) -> Vec<(String, String)> {
    output
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter_map(|line| line.split_once('='))
        .filter(|(name, _)| !name.is_empty())
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}

/// Builds the delta between a captured environment and the ambient one.
///
/// # Arguments
/// * `captured`: Variables as dumped after the init script ran; later duplicates win.
/// * `ambient`: The environment to compare against.
/// * `managed_dir`: Directory prepended to the search path.
pub fn compute_delta(
    captured: Vec<(String, String)>,
    ambient: &AmbientEnvironment,
    managed_dir: &Path,
) -> EnvironmentDelta {
    let captured: BTreeMap<String, (String, String)> = captured
        .into_iter()
        .map(|(name, value)| (name.to_lowercase(), (name, value)))
        .collect();

    let path_key = PATH_VAR.to_lowercase();
    let path_entry = captured.get(&path_key).cloned();

    let mut entries: BTreeMap<String, (String, String)> = captured
        .into_iter()
        .filter(|(_, (name, value))| ambient.get(name) != Some(value.as_str()))
        .collect();

    let (path_name, base) = match path_entry {
        Some((name, value)) => (name, Some(value)),
        None => (
            ambient.spelling(PATH_VAR).unwrap_or(PATH_VAR).to_string(),
            ambient.get(PATH_VAR).map(str::to_string),
        ),
    };
    let managed = managed_dir.display().to_string();
    let path_value = match base {
        Some(base) if !base.is_empty() => format!("{}{}{}", managed, PATH_SEPARATOR, base),
        _ => managed,
    };
    entries.insert(path_key, (path_name, path_value));

    EnvironmentDelta { entries }
}

/// Which stream of the child a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// Receives the output of `run` line by line.
///
/// Called from two reader threads at once, one per stream, so there is no
/// ordering between stdout and stderr lines.
pub trait OutputSink: Sync {
    fn line(&self, stream: OutputStream, line: &str);
}

impl<F> OutputSink for F
where
    F: Fn(OutputStream, &str) + Sync,
{
    fn line(&self, stream: OutputStream, line: &str) {
        self(stream, line)
    }
}

/// Runs commands in the environment of one toolchain's init script.
pub struct EnvironmentBridge<'a> {
    init_script: PathBuf,
    managed_dir: PathBuf,
    ambient: &'a AmbientEnvironment,
    delta: OnceCell<EnvironmentDelta>,
}

impl<'a> EnvironmentBridge<'a> {
    /// Bridge for `product`; fails if the product has no init script.
    pub fn for_product(
        product: &ToolchainProduct,
        managed_dir: &Path,
        ambient: &'a AmbientEnvironment,
    ) -> Result<Self> {
        let init_script = product.init_script.clone().ok_or_else(|| Error::MissingInitScript {
            instance_id: product.instance_id.clone(),
        })?;
        Ok(Self::new(init_script, managed_dir, ambient))
    }

    pub fn new(init_script: impl Into<PathBuf>, managed_dir: &Path, ambient: &'a AmbientEnvironment) -> Self {
        EnvironmentBridge {
            init_script: init_script.into(),
            managed_dir: managed_dir.to_path_buf(),
            ambient,
            delta: OnceCell::new(),
        }
    }

    pub fn init_script(&self) -> &Path {
        &self.init_script
    }

    /// Interpreter command line: source the init script quietly, optionally
    /// change directory, then run `command`.
    #[cfg(windows)]
    fn interpreter(&self, command: &str, cwd: Option<&Path>) -> Command {
        use std::os::windows::process::CommandExt;

        let mut composite = format!("call \"{}\" >nul & ", self.init_script.display());
        if let Some(dir) = cwd {
            composite.push_str(&format!("cd /d \"{}\" && ", dir.display()));
        }
        composite.push_str(command);

        let mut cmd = Command::new("cmd.exe");
        cmd.args(["/d", "/s", "/c"]).raw_arg(format!("\"{}\"", composite));
        cmd
    }

    #[cfg(not(windows))]
    fn interpreter(&self, command: &str, cwd: Option<&Path>) -> Command {
        let mut composite = format!(". {} >/dev/null && ", sh_quote(&self.init_script.display().to_string()));
        if let Some(dir) = cwd {
            composite.push_str(&format!("cd {} && ", sh_quote(&dir.display().to_string())));
        }
        composite.push_str(command);

        let mut cmd = Command::new("/bin/sh");
        cmd.arg("-c").arg(composite);
        cmd
    }

    /// Runs the init script and computes the delta. Always spawns; see `delta` for the cached form.
    pub fn capture(&self) -> Result<EnvironmentDelta> {
        let dump_command = if cfg!(windows) { "set" } else { "env" };
        log_debug!("[EnvBridge] Capturing environment of {}", self.init_script.display());

        let output = self
            .interpreter(dump_command, None)
            .env_clear()
            .envs(self.ambient.iter())
            .stdin(Stdio::null())
            .output()?;

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            log_error!(
                "[EnvBridge] {} failed with code {}: {}",
                self.init_script.display().to_string().red(),
                code,
                String::from_utf8_lossy(&output.stderr).trim()
            );
            return Err(Error::CommandFailed { code });
        }

        let captured = parse_env_dump(&String::from_utf8_lossy(&output.stdout));
        let delta = compute_delta(captured, self.ambient, &self.managed_dir);
        log_debug!("[EnvBridge] {} variables differ from the ambient environment", delta.len());
        Ok(delta)
    }

    /// The delta, captured on first use and reused for the lifetime of the bridge.
    pub fn delta(&self) -> Result<&EnvironmentDelta> {
        self.delta.get_or_try_init(|| self.capture())
    }

    /// Runs `command` in `cwd` under the captured environment, streaming output to `sink`.
    ///
    /// stdin is inherited. A non-zero exit is `CommandFailed` with the child's
    /// exit code (`-1` if it was killed by a signal).
    pub fn run(&self, command: &str, cwd: &Path, sink: &dyn OutputSink) -> Result<()> {
        let delta = self.delta()?;
        log_debug!("[EnvBridge] Running `{}` in {}", command, cwd.display());

        let mut child = self
            .interpreter(command, Some(cwd))
            .env_clear()
            .envs(self.ambient.iter())
            .envs(delta.iter())
            .current_dir(cwd)
            .stdin(Stdio::inherit())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        std::thread::scope(|scope| {
            if let Some(out) = stdout {
                scope.spawn(move || forward_lines(out, OutputStream::Stdout, sink));
            }
            if let Some(err) = stderr {
                scope.spawn(move || forward_lines(err, OutputStream::Stderr, sink));
            }
        });

        let status = child.wait()?;
        if status.success() {
            Ok(())
        } else {
            Err(Error::CommandFailed {
                code: status.code().unwrap_or(-1),
            })
        }
    }
}

/// Reads `reader` to the end, handing each line (without `\n` / `\r\n`) to `sink`.
fn forward_lines(reader: impl Read, stream: OutputStream, sink: &dyn OutputSink) {
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {
                if buf.last() == Some(&b'\n') {
                    buf.pop();
                }
                if buf.last() == Some(&b'\r') {
                    buf.pop();
                }
                sink.line(stream, &String::from_utf8_lossy(&buf));
            }
            Err(e) => {
                log_warn!("[EnvBridge] Stopped reading {:?}: {}", stream, e);
                break;
            }
        }
    }
}

#[cfg(not(windows))]
fn sh_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dump_parsing_skips_noise() {
        let dump = "=C:=C:\\work\r\nPath=C:\\bin;C:\\tools\r\nINCLUDE=a=b\r\nnot a variable\r\n\r\nINCLUDE=c\r\n";
        assert_eq!(
            parse_env_dump(dump),
            vec![
                ("Path".to_string(), "C:\\bin;C:\\tools".to_string()),
                ("INCLUDE".to_string(), "a=b".to_string()),
                ("INCLUDE".to_string(), "c".to_string()),
            ]
        );
    }

    fn pairs(list: &[(&str, &str)]) -> Vec<(String, String)> {
        list.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn delta_keeps_only_changes_and_prepends_managed_dir() {
        let ambient = AmbientEnvironment::from_pairs(pairs(&[
            ("PATH", "/usr/bin"),
            ("HOME", "/home/dev"),
            ("Lib", "old"),
        ]));
        let captured = pairs(&[
            ("PATH", "/usr/bin"),
            ("HOME", "/home/dev"),
            ("LIB", "new"),
            ("INCLUDE", "/vc/include"),
            ("INCLUDE", "/vc/include2"),
        ]);

        let delta = compute_delta(captured, &ambient, Path::new("/data"));
        assert_eq!(delta.get("home"), None);
        assert_eq!(delta.get("lib"), Some("new"));
        assert_eq!(delta.get("Include"), Some("/vc/include2"));
        assert_eq!(delta.get("path"), Some(format!("/data{}/usr/bin", PATH_SEPARATOR).as_str()));
        assert_eq!(delta.len(), 3);
    }

    #[test]
    fn delta_path_uses_script_value_and_ambient_spelling() {
        let ambient = AmbientEnvironment::from_pairs(pairs(&[("Path", "C:\\Windows")]));

        let changed = compute_delta(pairs(&[("Path", "C:\\VC\\bin;C:\\Windows")]), &ambient, Path::new("D"));
        assert_eq!(changed.get("PATH"), Some(format!("D{}C:\\VC\\bin;C:\\Windows", PATH_SEPARATOR).as_str()));

        let missing = compute_delta(Vec::new(), &ambient, Path::new("D"));
        assert_eq!(missing.iter().next(), Some(("Path", format!("D{}C:\\Windows", PATH_SEPARATOR).as_str())));

        let empty = compute_delta(Vec::new(), &AmbientEnvironment::default(), Path::new("D"));
        assert_eq!(empty.get("PATH"), Some("D"));
    }

    #[cfg(unix)]
    mod unix {
        use super::super::*;
        use std::fs;
        use std::sync::Mutex;
        use tempfile::{TempDir, tempdir};

        /// Init script exporting a variable and counting how often it was sourced.
        fn init_script(dir: &TempDir) -> PathBuf {
            let counter = dir.path().join("sourced.log");
            let script = dir.path().join("vcvars it's.sh");
            fs::write(
                &script,
                format!(
                    "echo 'banner from the init script'\necho x >> '{}'\nexport NM_BRIDGE_TEST=from-script\n",
                    counter.display()
                ),
            )
            .unwrap();
            script
        }

        fn times_sourced(dir: &TempDir) -> usize {
            fs::read_to_string(dir.path().join("sourced.log"))
                .map(|s| s.lines().count())
                .unwrap_or(0)
        }

        #[test]
        fn capture_reports_script_variables_once_per_bridge() {
            let dir = tempdir().unwrap();
            let ambient = AmbientEnvironment::capture();
            let bridge = EnvironmentBridge::new(init_script(&dir), Path::new("/managed"), &ambient);

            let delta = bridge.delta().unwrap();
            assert_eq!(delta.get("NM_BRIDGE_TEST"), Some("from-script"));
            assert!(delta.get("PATH").unwrap().starts_with("/managed:"));
            if let Some(home) = ambient.get("HOME") {
                assert_ne!(delta.get("HOME"), Some(home));
            }

            bridge.delta().unwrap();
            assert_eq!(times_sourced(&dir), 1);
        }

        #[test]
        fn run_streams_exactly_the_command_output() {
            let dir = tempdir().unwrap();
            let ambient = AmbientEnvironment::capture();
            let bridge = EnvironmentBridge::new(init_script(&dir), dir.path(), &ambient);
            let lines = Mutex::new(Vec::new());
            let sink = |stream: OutputStream, line: &str| lines.lock().unwrap().push((stream, line.to_string()));

            bridge.run("echo hi", dir.path(), &sink).unwrap();
            assert_eq!(*lines.lock().unwrap(), vec![(OutputStream::Stdout, "hi".to_string())]);
            // once for the capture, once re-sourced by the run itself
            assert_eq!(times_sourced(&dir), 2);
        }

        #[test]
        fn run_sees_the_delta_and_the_working_directory() {
            let dir = tempdir().unwrap();
            let work = dir.path().join("build dir");
            fs::create_dir_all(&work).unwrap();
            fs::write(work.join("marker.txt"), "").unwrap();
            let ambient = AmbientEnvironment::capture();
            let bridge = EnvironmentBridge::new(init_script(&dir), dir.path(), &ambient);
            let lines = Mutex::new(Vec::new());
            let sink = |stream: OutputStream, line: &str| lines.lock().unwrap().push((stream, line.to_string()));

            bridge
                .run("echo \"$NM_BRIDGE_TEST\"; ls; echo oops >&2", &work, &sink)
                .unwrap();
            let lines = lines.into_inner().unwrap();
            assert!(lines.contains(&(OutputStream::Stdout, "from-script".to_string())));
            assert!(lines.contains(&(OutputStream::Stdout, "marker.txt".to_string())));
            assert!(lines.contains(&(OutputStream::Stderr, "oops".to_string())));
        }

        #[test]
        fn non_zero_exit_is_command_failed_with_the_code() {
            let dir = tempdir().unwrap();
            let ambient = AmbientEnvironment::capture();
            let bridge = EnvironmentBridge::new(init_script(&dir), dir.path(), &ambient);
            let sink = |_: OutputStream, _: &str| {};

            match bridge.run("exit 3", dir.path(), &sink) {
                Err(Error::CommandFailed { code }) => assert_eq!(code, 3),
                other => panic!("expected CommandFailed, got {:?}", other),
            }
        }

        #[test]
        fn broken_init_script_fails_the_capture() {
            let dir = tempdir().unwrap();
            let ambient = AmbientEnvironment::capture();
            let bridge = EnvironmentBridge::new(dir.path().join("missing.sh"), dir.path(), &ambient);
            assert!(matches!(bridge.capture(), Err(Error::CommandFailed { .. })));
        }

        #[test]
        fn product_without_init_script_has_no_bridge() {
            let ambient = AmbientEnvironment::default();
            let product = ToolchainProduct {
                instance_id: "abc".to_string(),
                display_name: "Build Tools".to_string(),
                installation_root: PathBuf::from("/opt/vs"),
                init_script: None,
            };
            assert!(matches!(
                EnvironmentBridge::for_product(&product, Path::new("/managed"), &ambient),
                Err(Error::MissingInitScript { .. })
            ));
        }
    }
}
