// Finds the C++ toolchain installations (Visual Studio products) on the host and
// resolves which one the build environment should come from.
//
// Discovery goes through the `Probe` seam, implemented by the installed
// `vswhere` executable. Two queries are merged: the current one, which only
// reports products with the x86/x64 C++ tools, and the legacy one which also
// sees pre-2017 installations. A short list of fixed-path installations the
// probe never reports is appended at the end.

use crate::error::{Error, Result};
use crate::libs::state_management::DataStore;
use crate::schemas::toolchain::{FixedInstallation, ProbeRecord, ToolchainProduct};
use crate::{log_debug, log_info, log_warn};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Component a product must have to be usable for C++ builds.
const REQUIRED_COMPONENT: &str = "Microsoft.VisualStudio.Component.VC.Tools.x86.x64";

/// Developer environment scripts, relative to the installation root, in order of preference.
pub const INIT_SCRIPTS: [&str; 4] = [
    "Common7/Tools/VsDevCmd.bat",
    "VC/Auxiliary/Build/vcvars64.bat",
    "VC/vcvarsall.bat",
    "Common7/Tools/vsvars32.bat",
];

/// Source of product records: runs the probe with `args` and returns its stdout.
pub trait Probe {
    fn query(&self, args: &[&str]) -> Result<String>;
}

/// `Probe` backed by an installed vswhere executable.
pub struct VsWhere {
    executable: PathBuf,
}

impl VsWhere {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        VsWhere {
            executable: executable.into(),
        }
    }
}

impl Probe for VsWhere {
    fn query(&self, args: &[&str]) -> Result<String> {
        log_debug!("[Locator] {} {}", self.executable.display(), args.join(" "));
        let output = Command::new(&self.executable)
            .args(args)
            .output()
            .map_err(|e| Error::ProbeFailed(format!("could not run {}: {}", self.executable.display(), e)))?;

        if !output.status.success() {
            return Err(Error::ProbeFailed(format!(
                "{} exited with code {}: {}",
                self.executable.display(),
                output.status.code().unwrap_or(-1),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

fn current_query() -> Vec<&'static str> {
    vec!["-products", "*", "-format", "json", "-utf8", "-requires", REQUIRED_COMPONENT]
}

fn legacy_query() -> Vec<&'static str> {
    vec!["-legacy", "-format", "json", "-utf8"]
}

fn latest_query() -> Vec<&'static str> {
    let mut args = vec!["-latest"];
    args.extend(current_query());
    args
}

/// Installations that predate the probe's registration mechanism.
///
/// # Arguments
/// * `program_files_x86`: Value of `ProgramFiles(x86)` in the ambient environment, if any.
pub fn known_fixed_installations(program_files_x86: Option<&str>) -> Vec<FixedInstallation> {
    let Some(root) = program_files_x86 else {
        return Vec::new();
    };
    let root = Path::new(root);
    vec![
        FixedInstallation {
            instance_id: "VisualCppBuildTools14.0".to_string(),
            display_name: "Visual C++ 2015 Build Tools".to_string(),
            installation_root: root.join("Microsoft Visual C++ Build Tools"),
            init_script: PathBuf::from("vcbuildtools.bat"),
        },
        FixedInstallation {
            instance_id: "VisualStudio14.0".to_string(),
            display_name: "Visual Studio 2015".to_string(),
            installation_root: root.join("Microsoft Visual Studio 14.0"),
            init_script: PathBuf::from("VC/vcvarsall.bat"),
        },
    ]
}

/// First existing developer environment script under `root`.
pub fn find_init_script(root: &Path) -> Option<PathBuf> {
    INIT_SCRIPTS.iter().map(|rel| root.join(rel)).find(|p| p.is_file())
}

fn product_from_record(record: ProbeRecord) -> ToolchainProduct {
    let init_script = find_init_script(&record.installation_path);
    if init_script.is_none() {
        log_warn!(
            "[Locator] No developer environment script found in {} ({})",
            record.installation_path.display().to_string().yellow(),
            record.instance_id
        );
    }
    ToolchainProduct {
        instance_id: record.instance_id,
        display_name: record.display_name,
        installation_root: record.installation_path,
        init_script,
    }
}

/// Resolves toolchain products and the user's selection.
pub struct ProductLocator<'a> {
    probe: &'a dyn Probe,
    store: &'a DataStore,
    fixed: Vec<FixedInstallation>,
}

impl<'a> ProductLocator<'a> {
    /// # Arguments
    /// * `probe`: Where product records come from.
    /// * `store`: Data directory holding the selection config.
    /// * `fixed`: Fixed-path installations to consider besides the probe's results.
    pub fn new(probe: &'a dyn Probe, store: &'a DataStore, fixed: Vec<FixedInstallation>) -> Self {
        ProductLocator { probe, store, fixed }
    }

    fn records(&self, args: &[&str]) -> Result<Vec<ProbeRecord>> {
        let output = self.probe.query(args)?;
        serde_json::from_str(&output)
            .map_err(|e| Error::ProbeFailed(format!("unexpected probe output ({}): {}", e, output.trim())))
    }

    /// Every usable product on the host, current probe results first.
    ///
    /// An instance id reported by more than one source is kept once, from the first source.
    pub fn products(&self) -> Result<Vec<ToolchainProduct>> {
        let mut products: Vec<ToolchainProduct> = Vec::new();

        for args in [current_query(), legacy_query()] {
            for record in self.records(&args)? {
                if products.iter().any(|p| p.instance_id == record.instance_id) {
                    log_debug!("[Locator] Skipping duplicate instance {}", record.instance_id);
                    continue;
                }
                products.push(product_from_record(record));
            }
        }

        for fixed in &self.fixed {
            let script = fixed.installation_root.join(&fixed.init_script);
            if !script.is_file() || products.iter().any(|p| p.instance_id == fixed.instance_id) {
                continue;
            }
            products.push(ToolchainProduct {
                instance_id: fixed.instance_id.clone(),
                display_name: fixed.display_name.clone(),
                installation_root: fixed.installation_root.clone(),
                init_script: Some(script),
            });
        }

        log_debug!("[Locator] Found {} toolchain products", products.len());
        Ok(products)
    }

    /// The probe's own pick of the newest product with the C++ tools.
    pub fn latest(&self) -> Result<ToolchainProduct> {
        let mut records = self.records(&latest_query())?;
        if records.is_empty() {
            return Err(Error::NoToolchainFound);
        }
        if records.len() > 1 {
            log_warn!(
                "[Locator] The probe reported {} latest products, using {}",
                records.len(),
                records[0].instance_id.yellow()
            );
        }
        Ok(product_from_record(records.swap_remove(0)))
    }

    /// The product builds should use: the persisted selection, or `latest()` when none is set.
    pub fn selected(&self) -> Result<ToolchainProduct> {
        let Some(instance_id) = self.store.load_selection().instance_id else {
            return self.latest();
        };
        let mut products = self.products()?;
        match products.iter().position(|p| p.instance_id == instance_id) {
            Some(index) => Ok(products.swap_remove(index)),
            None => Err(Error::ToolchainNotFound {
                instance_id,
                choices: products.iter().map(|p| p.instance_id.clone()).collect(),
            }),
        }
    }

    /// Persists `instance_id` as the selection, after checking the product exists.
    pub fn select(&self, instance_id: &str) -> Result<ToolchainProduct> {
        let products = self.products()?;
        let Some(product) = products.iter().find(|p| p.instance_id == instance_id) else {
            return Err(Error::ToolchainNotFound {
                instance_id: instance_id.to_string(),
                choices: products.iter().map(|p| p.instance_id.clone()).collect(),
            });
        };

        let mut selection = self.store.load_selection();
        selection.instance_id = Some(instance_id.to_string());
        self.store.save_selection(&selection)?;
        log_info!(
            "[Locator] Selected {} ({})",
            product.instance_id.green(),
            product.display_name
        );
        Ok(product.clone())
    }

    /// One line per product, `X` marking the product `selected()` resolves to.
    ///
    /// Without a persisted selection that is the probe's latest product; an
    /// empty latest query just leaves every line unmarked.
    pub fn listing(&self) -> Result<String> {
        let selected = match self.store.load_selection().instance_id {
            Some(instance_id) => Some(instance_id),
            None => match self.latest() {
                Ok(product) => Some(product.instance_id),
                Err(Error::NoToolchainFound) => None,
                Err(e) => return Err(e),
            },
        };
        let lines: Vec<String> = self
            .products()?
            .iter()
            .map(|p| {
                let mark = if selected.as_deref() == Some(p.instance_id.as_str()) { "X" } else { " " };
                let script = p
                    .init_script
                    .as_ref()
                    .map(|s| s.display().to_string())
                    .unwrap_or_else(|| "(no init script)".to_string());
                format!("   {} id: {}  ({})\n       {}", mark, p.instance_id, p.display_name, script)
            })
            .collect();
        Ok(lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;
    use std::fs;
    use tempfile::{TempDir, tempdir};

    /// Answers the three queries with canned JSON and records what was asked.
    struct FakeProbe {
        current: String,
        legacy: String,
        latest: String,
        queries: RefCell<Vec<String>>,
    }

    impl FakeProbe {
        fn new(current: serde_json::Value, legacy: serde_json::Value, latest: serde_json::Value) -> Self {
            FakeProbe {
                current: current.to_string(),
                legacy: legacy.to_string(),
                latest: latest.to_string(),
                queries: RefCell::new(Vec::new()),
            }
        }
    }

    impl Probe for FakeProbe {
        fn query(&self, args: &[&str]) -> Result<String> {
            self.queries.borrow_mut().push(args.join(" "));
            Ok(match args.first().copied() {
                Some("-legacy") => self.legacy.clone(),
                Some("-latest") => self.latest.clone(),
                _ => self.current.clone(),
            })
        }
    }

    fn record(id: &str, name: &str, root: &Path) -> serde_json::Value {
        json!({
            "instanceId": id,
            "displayName": name,
            "installationPath": root,
            "installationVersion": "17.9.34607.119"
        })
    }

    /// Installation root with the given scripts present.
    fn install_root(parent: &TempDir, name: &str, scripts: &[&str]) -> PathBuf {
        let root = parent.path().join(name);
        for script in scripts {
            let path = root.join(script);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "@echo off\n").unwrap();
        }
        fs::create_dir_all(&root).unwrap();
        root
    }

    #[test]
    fn current_results_win_over_legacy_duplicates() {
        let hosts = tempdir().unwrap();
        let a = install_root(&hosts, "a", &["Common7/Tools/VsDevCmd.bat"]);
        let b = install_root(&hosts, "b", &["Common7/Tools/VsDevCmd.bat"]);
        let c = install_root(&hosts, "c", &["VC/vcvarsall.bat"]);
        let probe = FakeProbe::new(
            json!([record("a1", "Build Tools 2022", &a), record("b2", "Community 2019", &b)]),
            json!([record("a1", "Legacy name", &a), record("c3", "Visual Studio 2015", &c)]),
            json!([]),
        );
        let data = tempdir().unwrap();
        let store = DataStore::open(data.path()).unwrap();

        let products = ProductLocator::new(&probe, &store, Vec::new()).products().unwrap();
        let ids: Vec<&str> = products.iter().map(|p| p.instance_id.as_str()).collect();
        assert_eq!(ids, vec!["a1", "b2", "c3"]);
        assert_eq!(products[0].display_name, "Build Tools 2022");
        assert_eq!(products[2].init_script, Some(c.join("VC/vcvarsall.bat")));
        assert_eq!(
            probe.queries.borrow()[0],
            "-products * -format json -utf8 -requires Microsoft.VisualStudio.Component.VC.Tools.x86.x64"
        );
    }

    #[test]
    fn init_script_follows_preference_order() {
        let hosts = tempdir().unwrap();
        let both = install_root(&hosts, "both", &["VC/vcvarsall.bat", "VC/Auxiliary/Build/vcvars64.bat"]);
        let none = install_root(&hosts, "none", &[]);

        assert_eq!(find_init_script(&both), Some(both.join("VC/Auxiliary/Build/vcvars64.bat")));
        assert_eq!(find_init_script(&none), None);
    }

    #[test]
    fn fixed_installations_are_appended_only_when_present_and_new() {
        let hosts = tempdir().unwrap();
        let a = install_root(&hosts, "a", &["Common7/Tools/VsDevCmd.bat"]);
        let old = install_root(&hosts, "Microsoft Visual Studio 14.0", &["VC/vcvarsall.bat"]);
        let probe = FakeProbe::new(json!([record("a1", "Build Tools 2022", &a)]), json!([]), json!([]));
        let data = tempdir().unwrap();
        let store = DataStore::open(data.path()).unwrap();

        let fixed = known_fixed_installations(hosts.path().to_str());
        let mut duplicate = fixed[1].clone();
        duplicate.instance_id = "a1".to_string();
        let products = ProductLocator::new(&probe, &store, vec![fixed[0].clone(), fixed[1].clone(), duplicate])
            .products()
            .unwrap();

        let ids: Vec<&str> = products.iter().map(|p| p.instance_id.as_str()).collect();
        assert_eq!(ids, vec!["a1", "VisualStudio14.0"]);
        assert_eq!(products[1].init_script, Some(old.join("VC/vcvarsall.bat")));
    }

    #[test]
    fn latest_requires_at_least_one_product() {
        let hosts = tempdir().unwrap();
        let a = install_root(&hosts, "a", &["Common7/Tools/VsDevCmd.bat"]);
        let b = install_root(&hosts, "b", &[]);
        let data = tempdir().unwrap();
        let store = DataStore::open(data.path()).unwrap();

        let empty = FakeProbe::new(json!([]), json!([]), json!([]));
        assert!(matches!(
            ProductLocator::new(&empty, &store, Vec::new()).latest(),
            Err(Error::NoToolchainFound)
        ));

        let two = FakeProbe::new(
            json!([]),
            json!([]),
            json!([record("a1", "Build Tools 2022", &a), record("b2", "Community 2019", &b)]),
        );
        assert_eq!(ProductLocator::new(&two, &store, Vec::new()).latest().unwrap().instance_id, "a1");
    }

    #[test]
    fn selected_defaults_to_latest_and_honours_the_config() {
        let hosts = tempdir().unwrap();
        let a = install_root(&hosts, "a", &["Common7/Tools/VsDevCmd.bat"]);
        let b = install_root(&hosts, "b", &["Common7/Tools/VsDevCmd.bat"]);
        let probe = FakeProbe::new(
            json!([record("a1", "Build Tools 2022", &a), record("b2", "Community 2019", &b)]),
            json!([]),
            json!([record("a1", "Build Tools 2022", &a)]),
        );
        let data = tempdir().unwrap();
        let store = DataStore::open(data.path()).unwrap();
        let locator = ProductLocator::new(&probe, &store, Vec::new());

        assert_eq!(locator.selected().unwrap().instance_id, "a1");
        locator.select("b2").unwrap();
        assert_eq!(locator.selected().unwrap().instance_id, "b2");
        assert_eq!(store.load_selection().instance_id.as_deref(), Some("b2"));
    }

    #[test]
    fn unknown_selection_fails_and_leaves_config_alone() {
        let hosts = tempdir().unwrap();
        let a = install_root(&hosts, "a", &["Common7/Tools/VsDevCmd.bat"]);
        let probe = FakeProbe::new(json!([record("a1", "Build Tools 2022", &a)]), json!([]), json!([]));
        let data = tempdir().unwrap();
        let store = DataStore::open(data.path()).unwrap();
        let locator = ProductLocator::new(&probe, &store, Vec::new());
        locator.select("a1").unwrap();

        match locator.select("zz9") {
            Err(Error::ToolchainNotFound { instance_id, choices }) => {
                assert_eq!(instance_id, "zz9");
                assert_eq!(choices, vec!["a1"]);
            }
            other => panic!("expected ToolchainNotFound, got {:?}", other),
        }
        assert_eq!(store.load_selection().instance_id.as_deref(), Some("a1"));

        // a stale id in the config surfaces the same way
        let mut selection = store.load_selection();
        selection.instance_id = Some("gone".to_string());
        store.save_selection(&selection).unwrap();
        assert!(matches!(locator.selected(), Err(Error::ToolchainNotFound { .. })));
    }

    #[test]
    fn listing_marks_the_selection() {
        let hosts = tempdir().unwrap();
        let a = install_root(&hosts, "a", &["Common7/Tools/VsDevCmd.bat"]);
        let b = install_root(&hosts, "b", &[]);
        let probe = FakeProbe::new(
            json!([record("a1", "Build Tools 2022", &a), record("b2", "Community 2019", &b)]),
            json!([]),
            json!([]),
        );
        let data = tempdir().unwrap();
        let store = DataStore::open(data.path()).unwrap();
        let locator = ProductLocator::new(&probe, &store, Vec::new());
        locator.select("a1").unwrap();

        let listing = locator.listing().unwrap();
        let lines: Vec<&str> = listing.lines().collect();
        assert_eq!(lines[0], "   X id: a1  (Build Tools 2022)");
        assert_eq!(lines[2], "     id: b2  (Community 2019)");
        assert_eq!(lines[3], "       (no init script)");
    }

    #[test]
    fn listing_without_a_selection_marks_the_latest_product() {
        let hosts = tempdir().unwrap();
        let a = install_root(&hosts, "a", &["Common7/Tools/VsDevCmd.bat"]);
        let b = install_root(&hosts, "b", &["Common7/Tools/VsDevCmd.bat"]);
        let probe = FakeProbe::new(
            json!([record("a1", "Build Tools 2022", &a), record("b2", "Community 2019", &b)]),
            json!([]),
            json!([record("b2", "Community 2019", &b)]),
        );
        let data = tempdir().unwrap();
        let store = DataStore::open(data.path()).unwrap();

        let listing = ProductLocator::new(&probe, &store, Vec::new()).listing().unwrap();
        let lines: Vec<&str> = listing.lines().collect();
        assert_eq!(lines[0], "     id: a1  (Build Tools 2022)");
        assert_eq!(lines[2], "   X id: b2  (Community 2019)");
        assert_eq!(store.load_selection().instance_id, None);

        let none = FakeProbe::new(json!([record("a1", "Build Tools 2022", &a)]), json!([]), json!([]));
        let listing = ProductLocator::new(&none, &store, Vec::new()).listing().unwrap();
        assert!(listing.starts_with("     id: a1"));
    }

    #[test]
    fn garbage_probe_output_is_a_probe_failure() {
        let data = tempdir().unwrap();
        let store = DataStore::open(data.path()).unwrap();
        let probe = FakeProbe {
            current: "Visual Studio Locator version 3.1.7".to_string(),
            legacy: "[]".to_string(),
            latest: "[]".to_string(),
            queries: RefCell::new(Vec::new()),
        };
        assert!(matches!(
            ProductLocator::new(&probe, &store, Vec::new()).products(),
            Err(Error::ProbeFailed(_))
        ));
    }
}
